//! API Router and Application State
//!
//! Central routing configuration and shared state.

mod docs;
pub mod error;
pub mod extract;
pub mod messages;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    broadcast::SessionEventBroadcaster,
    config::Config,
    delivery::{DeliveryQueue, QueueSnapshot},
    session::SessionCapability,
    ws,
};

pub use docs::ApiDoc;
pub use error::ApiError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Messaging session, used directly only for number checks
    pub session: Arc<dyn SessionCapability>,
    /// Outbound delivery queue
    pub queue: DeliveryQueue,
    /// Session lifecycle fan-out
    pub broadcaster: SessionEventBroadcaster,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        config: Config,
        session: Arc<dyn SessionCapability>,
        queue: DeliveryQueue,
        broadcaster: SessionEventBroadcaster,
    ) -> Self {
        Self {
            config: Arc::new(config),
            session,
            queue,
            broadcaster,
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Producer endpoints
        .route("/api/check-number/{number}", get(messages::check_number))
        .route("/api/send-otp", post(messages::send_otp))
        .route("/api/send-reset-password", post(messages::send_reset_password))
        .route("/api/send-notification", post(messages::send_notification))
        .route("/api/send-message", post(messages::send_message))
        // Queue introspection
        .route("/api/queue", get(queue_status))
        // Session event subscribers
        .route("/ws", get(ws::handler))
        // API documentation
        .merge(api_docs())
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Connected session event subscribers
    pub subscribers: usize,
    /// Messages waiting in the delivery queue
    pub queue_pending: usize,
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        subscribers: state.broadcaster.subscriber_count(),
        queue_pending: state.queue.pending(),
    })
}

/// Delivery queue status.
#[utoipa::path(
    get,
    path = "/api/queue",
    tag = "system",
    responses((status = 200, description = "Queue snapshot", body = QueueSnapshot)),
)]
pub async fn queue_status(State(state): State<AppState>) -> Json<QueueSnapshot> {
    Json(state.queue.snapshot())
}

/// API documentation routes.
fn api_docs() -> Router<AppState> {
    SwaggerUi::new("/api-docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
