//! Inbound HTTP boundary: the LINE webhook endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::channels::line_types::WebhookBody;
use crate::pipeline::{EventDispatcher, handle_batch};

/// Shared state for webhook routes.
#[derive(Clone)]
pub struct WebhookState {
    pub dispatcher: Arc<EventDispatcher>,
}

/// Fixed acknowledgement returned for every delivery.
#[derive(Debug, Serialize)]
struct Ack {
    message: &'static str,
}

/// POST /api/webhook
///
/// Dispatches every event and answers once all of them have settled. The
/// response is the same whatever the individual outcomes were.
async fn receive_webhook(
    State(state): State<WebhookState>,
    Json(body): Json<WebhookBody>,
) -> impl IntoResponse {
    let delivery_id = Uuid::new_v4();

    async {
        info!(
            destination = body.destination.as_deref().unwrap_or("-"),
            events = body.events.len(),
            "Webhook received"
        );
        let summary = handle_batch(&state.dispatcher, body.events).await;
        info!(
            total = summary.total,
            handled = summary.handled,
            failed = summary.failed,
            undecodable = summary.undecodable,
            "Webhook batch settled"
        );
    }
    .instrument(info_span!("webhook", %delivery_id))
    .await;

    Json(Ack { message: "ok" })
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "polite-relay"
    }))
}

async fn hello() -> &'static str {
    "Hello World!"
}

/// Build the webhook router.
pub fn webhook_routes(state: WebhookState) -> Router {
    Router::new()
        .route("/api/webhook", post(receive_webhook))
        .route("/health", get(health))
        .fallback(get(hello))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
