use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

/// Form fields for an event-attendees lookup.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub(crate) struct GetAttendeesParams {
    #[serde(rename = "eventId", default)]
    pub event_id: String,
}

impl GetAttendeesParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.event_id.trim().is_empty() {
            return Err("Event ID is required".to_string());
        }
        Ok(())
    }

    pub fn form_data(&self) -> Value {
        json!({ "eventId": self.event_id })
    }
}
