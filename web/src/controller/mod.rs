use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use service::config::Config;

pub(crate) mod attendees_controller;
pub(crate) mod email_controller;
pub(crate) mod health_check_controller;

/// Body returned to a caller whose parked submission resolved successfully.
#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub success: bool,
    pub message: String,
    /// Number of subscriber channels connected when the response was built.
    pub connected: usize,
    #[serde(rename = "formData")]
    pub form_data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// Acknowledgment returned to a reporting subscriber, regardless of whether
/// its correlation id matched a pending request. Reporters are never made
/// to retry over a race they cannot observe.
pub(crate) fn report_ack() -> Json<Value> {
    Json(json!({ "success": true }))
}

/// Builds the absolute callback URL a subscriber must POST its report to.
///
/// Prefers the configured public base URL; otherwise derives it from the
/// submitting request's Host header.
pub(crate) fn callback_url(config: &Config, host: &str, path: &str) -> String {
    match config.public_base_url() {
        Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
        None => format!("http://{host}{path}"),
    }
}
