//! HTTP surface for Telegram webhook deliveries.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::{error, warn};

use crate::expenses::{HandlerError, Messenger, RequestHandler, SummaryStore};

pub fn router<S, M>(handler: Arc<RequestHandler<S, M>>) -> Router
where
    S: SummaryStore + 'static,
    M: Messenger + 'static,
{
    Router::new()
        .route("/", post(webhook::<S, M>))
        .route("/webhook", post(webhook::<S, M>))
        .route("/health", get(health))
        .with_state(handler)
}

/// The body is taken whole as text and dropped when the handler returns.
async fn webhook<S, M>(
    State(handler): State<Arc<RequestHandler<S, M>>>,
    body: String,
) -> impl IntoResponse
where
    S: SummaryStore + 'static,
    M: Messenger + 'static,
{
    match handler.handle(&body).await {
        Ok(_) => (StatusCode::OK, "OK").into_response(),
        Err(e @ HandlerError::Parse(_)) => {
            warn!("Rejected webhook: {e}");
            (StatusCode::BAD_REQUEST, "Invalid update").into_response()
        }
        Err(e) => {
            error!("Webhook failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Update not processed").into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}
