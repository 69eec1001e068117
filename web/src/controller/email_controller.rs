use axum::extract::{Host, State};
use axum::response::IntoResponse;
use axum::{Form, Json};
use broker::message::Instruction;
use broker::pending::RequestId;
use log::*;
use serde_json::json;
use tokio::time::Duration;

use crate::controller::{callback_url, report_ack, SubmissionResponse};
use crate::params::email::SendEmailParams;
use crate::params::report::ReportParams;
use crate::{AppState, Error};

/// POST an email instruction to every connected subscriber and park the
/// caller until one of them reports the outcome (or the deadline passes).
#[utoipa::path(
    post,
    path = "/send-email",
    request_body(content = SendEmailParams, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "A subscriber reported the email as sent"),
        (status = 422, description = "A required field was missing or blank"),
        (status = 502, description = "A subscriber reported a send failure"),
        (status = 503, description = "No subscribers connected to receive the instruction"),
        (status = 504, description = "No report arrived before the deadline")
    )
)]
pub async fn submit(
    State(app_state): State<AppState>,
    Host(host): Host,
    Form(params): Form<SendEmailParams>,
) -> crate::Result<impl IntoResponse> {
    let broker = app_state.broker_ref();

    params.validate().map_err(|message| {
        Error::validation(message, params.form_data(), broker.subscriber_count())
    })?;

    let request_id = RequestId::generate("email");
    let instruction = Instruction::EmailInstruction {
        to: params.to.clone(),
        subject: params.subject.clone(),
        body: params.body.clone(),
        request_id: request_id.to_string(),
        callback_url: callback_url(&app_state.config, &host, "/email-result"),
    };

    let deadline = Duration::from_secs(app_state.config.email_timeout_secs);
    let report = broker
        .dispatch(request_id, &instruction, deadline)
        .await
        .map_err(|e| {
            Error::from_dispatch(
                e,
                params.form_data(),
                broker.subscriber_count(),
                "No connected clients to receive the email instruction",
            )
        })?;

    if report.success {
        Ok(Json(SubmissionResponse {
            success: true,
            message: format!("Email sent successfully to {}", params.to),
            connected: broker.subscriber_count(),
            form_data: json!({}),
            attendees: None,
            count: None,
        }))
    } else {
        Err(Error::reported(
            report
                .error
                .unwrap_or_else(|| "Failed to send email".to_string()),
            params.form_data(),
            broker.subscriber_count(),
        ))
    }
}

/// POST endpoint where subscribers report the outcome of an email
/// instruction. Always acknowledges the reporter, even when the id no
/// longer matches a pending request.
#[utoipa::path(
    post,
    path = "/email-result",
    request_body = ReportParams,
    responses(
        (status = 200, description = "Report acknowledged")
    )
)]
pub async fn result(
    State(app_state): State<AppState>,
    Json(params): Json<ReportParams>,
) -> impl IntoResponse {
    debug!("Received email result for request {}", params.request_id);

    let request_id = RequestId::from(params.request_id);
    app_state.broker.resolve(&request_id, params.report);

    report_ack()
}
