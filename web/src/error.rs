use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use broker::DispatchError;
use serde_json::{json, Value};

pub type Result<T> = core::result::Result<T, Error>;

/// A failed submission, carrying the caller's original field values so the
/// response can echo them back for a retry, plus the subscriber count at
/// the time of failure.
#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub form_data: Value,
    pub connected: usize,
}

#[derive(Debug)]
pub enum ErrorKind {
    /// A required field was missing or blank; nothing was broadcast.
    Validation(String),
    /// The broadcast reached zero subscriber channels. The message names
    /// the work kind nobody was around to handle.
    NoSubscribers(String),
    /// No subscriber report arrived before the deadline.
    Timeout,
    /// A subscriber answered but reported a failure.
    Reported(String),
    /// The instruction could not be serialized for broadcast.
    Internal(String),
}

impl Error {
    pub fn validation(message: impl Into<String>, form_data: Value, connected: usize) -> Self {
        Self {
            kind: ErrorKind::Validation(message.into()),
            form_data,
            connected,
        }
    }

    pub fn reported(message: impl Into<String>, form_data: Value, connected: usize) -> Self {
        Self {
            kind: ErrorKind::Reported(message.into()),
            form_data,
            connected,
        }
    }

    pub fn from_dispatch(
        err: DispatchError,
        form_data: Value,
        connected: usize,
        no_subscribers_message: impl Into<String>,
    ) -> Self {
        let kind = match err {
            DispatchError::NoSubscribers => ErrorKind::NoSubscribers(no_subscribers_message.into()),
            DispatchError::TimedOut => ErrorKind::Timeout,
            DispatchError::Serialization(message) => ErrorKind::Internal(message),
        };
        Self {
            kind,
            form_data,
            connected,
        }
    }

    fn message(&self) -> String {
        match &self.kind {
            ErrorKind::Validation(message) => message.clone(),
            ErrorKind::NoSubscribers(message) => message.clone(),
            ErrorKind::Timeout => "Request timed out. Please try again.".to_string(),
            ErrorKind::Reported(message) => message.clone(),
            ErrorKind::Internal(message) => message.clone(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.kind {
            ErrorKind::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NoSubscribers(_) => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Reported(_) => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.message(),
            "connected": self.connected,
            "formData": self.form_data,
        });
        (self.status_code(), Json(body)).into_response()
    }
}
