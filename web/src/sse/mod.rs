//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for the subscriber endpoint.
//! The core broker infrastructure (SubscriberRegistry, PendingTable,
//! message types) lives in the `broker` crate.

pub mod handler;
