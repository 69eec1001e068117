//! Request/callback broker bridging parked HTTP requests to Server-Sent
//! Events subscribers.
//!
//! # Architecture
//!
//! - **Subscriber registry**: every connected agent holds one push channel,
//!   registered in a [`subscriber::SubscriberRegistry`] keyed by a
//!   server-generated id. Broadcast fans one instruction out to all of them.
//! - **Pending-request table**: each accepted work item parks its HTTP
//!   response behind a oneshot channel in a [`pending::PendingTable`] keyed
//!   by correlation id. Removing the entry is the single consumption point,
//!   so the report path and the timeout path can never both complete the
//!   same response.
//! - **Ephemeral state**: both registries live in process memory only. A
//!   subscriber that reconnects starts fresh; a pending request that times
//!   out is gone.
//!
//! # Message flow
//!
//! 1. An agent opens the push channel and is registered as a subscriber.
//! 2. An HTTP caller submits a work item; the broker assigns a correlation
//!    id, broadcasts the instruction (including a callback URL) to every
//!    subscriber, and parks the caller.
//! 3. Whichever agent handles the instruction POSTs a [`message::WorkReport`]
//!    to the callback URL, which resolves the parked caller by correlation
//!    id.
//! 4. If no report arrives before the deadline, the caller is completed
//!    with a timeout error instead; a late report is acknowledged but inert.
//!
//! # Modules
//!
//! - `subscriber`: SubscriberRegistry with server-generated SubscriberIds
//! - `pending`: correlation ids and the single-consumption PendingTable
//! - `message`: typed instructions, wire envelopes, and subscriber reports
//! - `manager`: the Broker facade tying registry and table together

pub mod manager;
pub mod message;
pub mod pending;
pub mod subscriber;

pub use manager::{Broker, DispatchError};
