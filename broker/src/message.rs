use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Trait for getting the SSE event name an instruction travels under.
pub trait EventKind {
    fn event_kind(&self) -> &'static str;
}

/// A work item (or acknowledgment) pushed to subscribers.
///
/// Field names are serialized in camelCase to match what the extension-side
/// agents expect on the wire (`requestId`, `callbackUrl`, `eventId`).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Instruction {
    /// Acknowledgment pushed on a freshly opened channel.
    Connection { message: String },

    /// Ask a connected agent to compose and send an email.
    #[serde(rename_all = "camelCase")]
    EmailInstruction {
        to: String,
        subject: String,
        body: String,
        request_id: String,
        callback_url: String,
    },

    /// Ask a connected agent to read an event's attendee list.
    #[serde(rename_all = "camelCase")]
    GetEventAttendees {
        event_id: String,
        request_id: String,
        callback_url: String,
    },
}

impl EventKind for Instruction {
    fn event_kind(&self) -> &'static str {
        match self {
            Instruction::Connection { .. } => "connection",
            Instruction::EmailInstruction { .. } => "email-instruction",
            Instruction::GetEventAttendees { .. } => "get-event-attendees",
        }
    }
}

/// One framed event ready to be written to a subscriber channel: the SSE
/// event name plus its serialized JSON data.
///
/// Serialization happens once per broadcast, not once per subscriber.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub event: &'static str,
    pub data: String,
}

impl Envelope {
    pub fn from_instruction(instruction: &Instruction) -> serde_json::Result<Self> {
        Ok(Self {
            event: instruction.event_kind(),
            data: serde_json::to_string(instruction)?,
        })
    }
}

/// Result reported back by a subscriber for one dispatched instruction.
///
/// `extra` carries kind-specific result fields (e.g. `attendees`, `count`)
/// so the broker stays agnostic of individual work kinds. A report that
/// omits the `success` flag still deserializes, as a failure; reporters are
/// never bounced over a malformed body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkReport {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkReport {
    /// A plain success report with no extra fields.
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
            extra: Map::new(),
        }
    }

    /// A failure report carrying the agent's error description.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn email_instruction_serializes_with_camel_case_wire_names() {
        let instruction = Instruction::EmailInstruction {
            to: "a@b.com".to_string(),
            subject: "S".to_string(),
            body: "B".to_string(),
            request_id: "email_123".to_string(),
            callback_url: "http://localhost:3000/email-result".to_string(),
        };

        assert_eq!(instruction.event_kind(), "email-instruction");

        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&instruction).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "to": "a@b.com",
                "subject": "S",
                "body": "B",
                "requestId": "email_123",
                "callbackUrl": "http://localhost:3000/email-result",
            })
        );
    }

    #[test]
    fn attendees_instruction_uses_its_own_event_name() {
        let instruction = Instruction::GetEventAttendees {
            event_id: "evt-9".to_string(),
            request_id: "req_456".to_string(),
            callback_url: "http://localhost:3000/event-attendees-result".to_string(),
        };

        let envelope = Envelope::from_instruction(&instruction).unwrap();
        assert_eq!(envelope.event, "get-event-attendees");

        let value: serde_json::Value = serde_json::from_str(&envelope.data).unwrap();
        assert_eq!(value["eventId"], "evt-9");
        assert_eq!(value["requestId"], "req_456");
    }

    #[test]
    fn work_report_round_trips_kind_specific_fields() {
        let report: WorkReport = serde_json::from_value(json!({
            "success": true,
            "attendees": ["x@y.com"],
            "count": 1,
        }))
        .unwrap();

        assert!(report.success);
        assert!(report.error.is_none());
        assert_eq!(report.extra["attendees"], json!(["x@y.com"]));
        assert_eq!(report.extra["count"], json!(1));
    }

    #[test]
    fn a_report_without_a_success_flag_is_a_failure_report() {
        let report: WorkReport =
            serde_json::from_value(json!({ "error": "agent crashed" })).unwrap();

        assert!(!report.success);
        assert_eq!(report.error.as_deref(), Some("agent crashed"));
    }
}
