use crate::controller::{attendees_controller, email_controller, health_check_controller};
use crate::sse::handler::sse_handler;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use service::AppState;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Email Relay API"
        ),
        paths(
            email_controller::submit,
            email_controller::result,
            attendees_controller::submit,
            attendees_controller::result,
            health_check_controller::health_check,
        ),
        components(
            schemas(
                crate::params::email::SendEmailParams,
                crate::params::attendees::GetAttendeesParams,
                crate::params::report::ReportParams,
            )
        ),
        tags(
            (name = "email_relay", description = "HTTP-to-SSE request/callback relay")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state);
    Router::new()
        .merge(email_routes(app_state.clone()))
        .merge(attendees_routes(app_state.clone()))
        .merge(event_stream_routes(app_state))
        .merge(health_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
        .layer(cors)
}

fn email_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/send-email", post(email_controller::submit))
        .route("/email-result", post(email_controller::result))
        .with_state(app_state)
}

fn attendees_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/get-event-attendees", post(attendees_controller::submit))
        .route(
            "/event-attendees-result",
            post(attendees_controller::result),
        )
        .with_state(app_state)
}

fn event_stream_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/events", get(sse_handler))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn cors_layer(app_state: &AppState) -> CorsLayer {
    let origins = &app_state.config.allowed_origins;
    if origins.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
