use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

/// Form fields for a send-email submission.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub(crate) struct SendEmailParams {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

impl SendEmailParams {
    /// All three fields are required and must be non-blank.
    pub fn validate(&self) -> Result<(), String> {
        if self.to.trim().is_empty()
            || self.subject.trim().is_empty()
            || self.body.trim().is_empty()
        {
            return Err("All fields are required".to_string());
        }
        Ok(())
    }

    /// The submitted values, echoed back in failure responses so the caller
    /// can retry without retyping.
    pub fn form_data(&self) -> Value {
        json!({
            "to": self.to,
            "subject": self.subject,
            "body": self.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(to: &str, subject: &str, body: &str) -> SendEmailParams {
        SendEmailParams {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn complete_params_validate() {
        assert!(params("a@b.com", "S", "B").validate().is_ok());
    }

    #[test]
    fn blank_or_missing_fields_are_rejected() {
        assert!(params("", "S", "B").validate().is_err());
        assert!(params("a@b.com", "   ", "B").validate().is_err());
        assert!(params("a@b.com", "S", "").validate().is_err());
    }

    #[test]
    fn form_data_echoes_every_submitted_field() {
        let form = params("a@b.com", "S", "B").form_data();
        assert_eq!(form["to"], "a@b.com");
        assert_eq!(form["subject"], "S");
        assert_eq!(form["body"], "B");
    }
}
