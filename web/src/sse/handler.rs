use async_stream::stream;
use axum::extract::State;
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use broker::subscriber::SubscriberId;
use broker::Broker;
use log::*;
use service::AppState;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Unregisters the subscriber when its stream is dropped, whether the
/// channel drained normally or the client disconnected mid-await.
struct SubscriberGuard {
    broker: Arc<Broker>,
    subscriber_id: SubscriberId,
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        debug!(
            "SSE connection closed for subscriber {}, cleaning up",
            self.subscriber_id.as_str()
        );
        self.broker.unsubscribe(&self.subscriber_id);
    }
}

/// SSE handler that establishes a long-lived subscriber connection.
/// Instructions arrive on the channel as pre-serialized envelopes and are
/// framed into named SSE events here; the first event on every connection
/// is the broker's `connection` acknowledgment.
pub(crate) async fn sse_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let subscriber_id = app_state.broker.subscribe(tx);
    debug!(
        "Establishing SSE connection for subscriber {}",
        subscriber_id.as_str()
    );

    let guard = SubscriberGuard {
        broker: app_state.broker.clone(),
        subscriber_id,
    };

    let stream = stream! {
        let _guard = guard;
        // No-op comment flushes the connection before the first named event;
        // keep-alive comments only start after their interval.
        yield Ok::<Event, Infallible>(Event::default().comment(""));
        while let Some(envelope) = rx.recv().await {
            yield Ok::<Event, Infallible>(
                Event::default().event(envelope.event).data(envelope.data),
            );
        }
    };

    (
        [(header::CACHE_CONTROL, "no-cache")],
        Sse::new(stream).keep_alive(KeepAlive::default()),
    )
}
