use axum::extract::{Host, State};
use axum::response::IntoResponse;
use axum::{Form, Json};
use broker::message::Instruction;
use broker::pending::RequestId;
use log::*;
use serde_json::{json, Value};
use tokio::time::Duration;

use crate::controller::{callback_url, report_ack, SubmissionResponse};
use crate::params::attendees::GetAttendeesParams;
use crate::params::report::ReportParams;
use crate::{AppState, Error};

/// POST an attendee-lookup instruction to every connected subscriber and
/// park the caller until one of them reports back. Lookups are read-style
/// work, so the deadline is much shorter than for email sends.
#[utoipa::path(
    post,
    path = "/get-event-attendees",
    request_body(content = GetAttendeesParams, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "A subscriber reported the attendee list"),
        (status = 422, description = "The event id was missing or blank"),
        (status = 502, description = "A subscriber reported a lookup failure"),
        (status = 503, description = "No subscribers connected to receive the instruction"),
        (status = 504, description = "No report arrived before the deadline")
    )
)]
pub async fn submit(
    State(app_state): State<AppState>,
    Host(host): Host,
    Form(params): Form<GetAttendeesParams>,
) -> crate::Result<impl IntoResponse> {
    let broker = app_state.broker_ref();

    params.validate().map_err(|message| {
        Error::validation(message, params.form_data(), broker.subscriber_count())
    })?;

    let request_id = RequestId::generate("req");
    let instruction = Instruction::GetEventAttendees {
        event_id: params.event_id.clone(),
        request_id: request_id.to_string(),
        callback_url: callback_url(&app_state.config, &host, "/event-attendees-result"),
    };

    let deadline = Duration::from_secs(app_state.config.attendees_timeout_secs);
    let report = broker
        .dispatch(request_id, &instruction, deadline)
        .await
        .map_err(|e| {
            Error::from_dispatch(
                e,
                params.form_data(),
                broker.subscriber_count(),
                "No connected clients to process the request",
            )
        })?;

    if report.success {
        let attendees = report.extra.get("attendees").cloned();
        let count = report
            .extra
            .get("count")
            .and_then(Value::as_u64)
            .or_else(|| attendees.as_ref().and_then(|a| a.as_array().map(|a| a.len() as u64)))
            .unwrap_or(0);

        Ok(Json(SubmissionResponse {
            success: true,
            message: format!(
                "Retrieved {count} attendee(s) for event: {}",
                params.event_id
            ),
            connected: broker.subscriber_count(),
            form_data: json!({}),
            attendees,
            count: Some(count),
        }))
    } else {
        Err(Error::reported(
            report
                .error
                .unwrap_or_else(|| "Failed to retrieve attendees".to_string()),
            params.form_data(),
            broker.subscriber_count(),
        ))
    }
}

/// POST endpoint where subscribers report the outcome of an attendee
/// lookup. Always acknowledges the reporter.
#[utoipa::path(
    post,
    path = "/event-attendees-result",
    request_body = ReportParams,
    responses(
        (status = 200, description = "Report acknowledged")
    )
)]
pub async fn result(
    State(app_state): State<AppState>,
    Json(params): Json<ReportParams>,
) -> impl IntoResponse {
    debug!("Received attendees result for request {}", params.request_id);

    let request_id = RequestId::from(params.request_id);
    app_state.broker.resolve(&request_id, params.report);

    report_ack()
}
