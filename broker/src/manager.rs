use crate::message::{Envelope, EventKind, Instruction, WorkReport};
use crate::pending::{PendingTable, RequestId};
use crate::subscriber::{SubscriberId, SubscriberRegistry};
use log::*;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tokio::time::{timeout, Duration};

/// Why a dispatched instruction failed to produce a subscriber report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No channel accepted the broadcast; nothing is waiting to answer.
    NoSubscribers,
    /// No report arrived before the deadline.
    TimedOut,
    /// The instruction could not be serialized for broadcast.
    Serialization(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::NoSubscribers => {
                write!(f, "no connected subscribers to receive the instruction")
            }
            DispatchError::TimedOut => {
                write!(f, "request timed out waiting for a subscriber report")
            }
            DispatchError::Serialization(message) => {
                write!(f, "failed to serialize instruction: {message}")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

/// One request/callback broker instance.
///
/// Owns the subscriber registry and the pending-request table so that
/// multiple independent brokers can coexist in one process (each with its
/// own state), rather than routing through module-level globals.
pub struct Broker {
    registry: Arc<SubscriberRegistry>,
    pending: PendingTable,
}

impl Broker {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(SubscriberRegistry::new()),
            pending: PendingTable::new(),
        }
    }

    /// Register a new push channel and immediately acknowledge it with a
    /// `connection` event.
    pub fn subscribe(&self, sender: UnboundedSender<Envelope>) -> SubscriberId {
        let subscriber_id = self.registry.register(sender);
        info!(
            "Subscriber {} connected ({} total)",
            subscriber_id.as_str(),
            self.registry.count()
        );

        let ack = Instruction::Connection {
            message: "Connected to SSE server".to_string(),
        };
        match Envelope::from_instruction(&ack) {
            Ok(envelope) => self.registry.send_to(&subscriber_id, envelope),
            Err(e) => error!("Failed to serialize connection acknowledgment: {e}"),
        }

        subscriber_id
    }

    /// Remove a push channel. Safe to call more than once for the same id.
    pub fn unsubscribe(&self, subscriber_id: &SubscriberId) {
        self.registry.unregister(subscriber_id);
        info!(
            "Subscriber {} disconnected ({} remaining)",
            subscriber_id.as_str(),
            self.registry.count()
        );
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.count()
    }

    /// Broadcast an instruction and park until a report arrives for its
    /// correlation id or the deadline passes.
    ///
    /// The pending entry is registered before the broadcast so a reporter
    /// can never observe its own id missing; if the broadcast reaches zero
    /// channels the entry is removed again and the dispatch fails fast.
    /// Exactly one of {report, timeout} resolves the dispatch: whichever
    /// path removes the pending entry first wins.
    pub async fn dispatch(
        &self,
        request_id: RequestId,
        instruction: &Instruction,
        deadline: Duration,
    ) -> Result<WorkReport, DispatchError> {
        let envelope = Envelope::from_instruction(instruction).map_err(|e| {
            error!(
                "Failed to serialize {} instruction: {e}",
                instruction.event_kind()
            );
            DispatchError::Serialization(e.to_string())
        })?;

        let (responder, mut parked) = oneshot::channel();
        self.pending.insert(request_id.clone(), responder);

        let delivered = self.registry.broadcast(envelope);
        if delivered == 0 {
            self.pending.remove(&request_id);
            warn!("No subscribers available for request {request_id}");
            return Err(DispatchError::NoSubscribers);
        }
        debug!(
            "Broadcast {} to {delivered} subscriber(s) for request {request_id}",
            instruction.event_kind()
        );

        match timeout(deadline, &mut parked).await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(_)) => {
                // The responder was dropped without sending; nothing can
                // resolve this request anymore.
                self.pending.remove(&request_id);
                Err(DispatchError::TimedOut)
            }
            Err(_elapsed) => {
                if self.pending.remove(&request_id).is_some() {
                    debug!("Request {request_id} timed out after {deadline:?}");
                    Err(DispatchError::TimedOut)
                } else {
                    // A reporter consumed the entry right at the deadline;
                    // its report is already on the channel or about to be.
                    match parked.await {
                        Ok(report) => Ok(report),
                        Err(_) => Err(DispatchError::TimedOut),
                    }
                }
            }
        }
    }

    /// Complete the parked response for `request_id` with a report.
    ///
    /// Returns `true` when a pending entry was consumed. An unknown or
    /// already-consumed id returns `false` and has no other effect, so a
    /// late reporter is never treated as an error.
    pub fn resolve(&self, request_id: &RequestId, report: WorkReport) -> bool {
        match self.pending.remove(request_id) {
            Some(responder) => {
                if responder.send(report).is_err() {
                    debug!(
                        "Report for {request_id} arrived after the dispatcher stopped waiting"
                    );
                }
                true
            }
            None => {
                debug!("Ignoring report for unknown or already-resolved request {request_id}");
                false
            }
        }
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tokio::sync::mpsc;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn email_instruction(request_id: &RequestId) -> Instruction {
        Instruction::EmailInstruction {
            to: "a@b.com".to_string(),
            subject: "S".to_string(),
            body: "B".to_string(),
            request_id: request_id.to_string(),
            callback_url: "http://localhost:3000/email-result".to_string(),
        }
    }

    /// Receives past the connection acknowledgment to the next work item.
    async fn next_work_item(rx: &mut UnboundedReceiver<Envelope>) -> Envelope {
        loop {
            let envelope = rx.recv().await.expect("channel closed unexpectedly");
            if envelope.event != "connection" {
                return envelope;
            }
        }
    }

    #[tokio::test]
    async fn subscribe_pushes_a_connection_acknowledgment_first() {
        let broker = Broker::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        broker.subscribe(tx);

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.event, "connection");
        let data: Value = serde_json::from_str(&envelope.data).unwrap();
        assert_eq!(data["message"], "Connected to SSE server");
    }

    #[tokio::test]
    async fn dispatch_with_no_subscribers_fails_fast_and_leaves_no_pending_entry() {
        let broker = Broker::new();
        let request_id = RequestId::generate("email");
        let instruction = email_instruction(&request_id);

        let result = broker
            .dispatch(request_id.clone(), &instruction, Duration::from_secs(5))
            .await;

        assert_eq!(result.unwrap_err(), DispatchError::NoSubscribers);
        assert!(!broker.resolve(&request_id, WorkReport::success()));
    }

    #[tokio::test]
    async fn a_report_resolves_the_parked_dispatch() {
        let broker = Arc::new(Broker::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        broker.subscribe(tx);

        let request_id = RequestId::generate("email");
        let instruction = email_instruction(&request_id);
        let dispatcher = {
            let broker = Arc::clone(&broker);
            let request_id = request_id.clone();
            tokio::spawn(async move {
                broker
                    .dispatch(request_id, &instruction, Duration::from_secs(5))
                    .await
            })
        };

        let envelope = next_work_item(&mut rx).await;
        assert_eq!(envelope.event, "email-instruction");
        let data: Value = serde_json::from_str(&envelope.data).unwrap();
        assert_eq!(data["requestId"], request_id.as_str());
        assert_eq!(data["to"], "a@b.com");

        assert!(broker.resolve(&request_id, WorkReport::success()));

        let report = dispatcher.await.unwrap().unwrap();
        assert!(report.success);
    }

    #[tokio::test]
    async fn a_failure_report_is_returned_as_is() {
        let broker = Arc::new(Broker::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        broker.subscribe(tx);

        let request_id = RequestId::generate("email");
        let instruction = email_instruction(&request_id);
        let dispatcher = {
            let broker = Arc::clone(&broker);
            let request_id = request_id.clone();
            tokio::spawn(async move {
                broker
                    .dispatch(request_id, &instruction, Duration::from_secs(5))
                    .await
            })
        };

        next_work_item(&mut rx).await;
        assert!(broker.resolve(&request_id, WorkReport::failure("mailbox unavailable")));

        let report = dispatcher.await.unwrap().unwrap();
        assert!(!report.success);
        assert_eq!(report.error.as_deref(), Some("mailbox unavailable"));
    }

    #[tokio::test]
    async fn timeout_resolves_when_no_report_arrives_and_a_late_report_is_inert() {
        let broker = Broker::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        broker.subscribe(tx);

        let request_id = RequestId::generate("email");
        let instruction = email_instruction(&request_id);
        let result = broker
            .dispatch(request_id.clone(), &instruction, Duration::from_millis(20))
            .await;

        assert_eq!(result.unwrap_err(), DispatchError::TimedOut);

        // The instruction was still broadcast before the deadline.
        assert_eq!(next_work_item(&mut rx).await.event, "email-instruction");

        // The late report finds nothing to resolve and is a harmless no-op.
        assert!(!broker.resolve(&request_id, WorkReport::success()));
    }

    #[tokio::test]
    async fn resolving_an_unknown_id_is_a_no_op() {
        let broker = Broker::new();
        let unknown = RequestId::from("email_does-not-exist".to_string());
        assert!(!broker.resolve(&unknown, WorkReport::success()));
    }

    #[tokio::test]
    async fn concurrent_dispatches_get_distinct_ids_and_resolve_independently() {
        let broker = Arc::new(Broker::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        broker.subscribe(tx);

        let first_id = RequestId::generate("email");
        let second_id = RequestId::generate("email");
        assert_ne!(first_id, second_id);

        let first = {
            let broker = Arc::clone(&broker);
            let instruction = email_instruction(&first_id);
            let request_id = first_id.clone();
            tokio::spawn(async move {
                broker
                    .dispatch(request_id, &instruction, Duration::from_secs(5))
                    .await
            })
        };
        let second = {
            let broker = Arc::clone(&broker);
            let instruction = email_instruction(&second_id);
            let request_id = second_id.clone();
            tokio::spawn(async move {
                broker
                    .dispatch(request_id, &instruction, Duration::from_secs(5))
                    .await
            })
        };

        next_work_item(&mut rx).await;
        next_work_item(&mut rx).await;

        // Resolve in reverse submission order; correlation, not arrival
        // order, decides which dispatch each report completes.
        assert!(broker.resolve(&second_id, WorkReport::failure("nope")));
        assert!(broker.resolve(&first_id, WorkReport::success()));

        assert!(first.await.unwrap().unwrap().success);
        assert!(!second.await.unwrap().unwrap().success);
    }
}
