//! WA Gateway Server - Main Entry Point

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use wa_gateway::{
    api, broadcast,
    broadcast::SessionEventBroadcaster,
    config,
    delivery::DeliveryQueue,
    session::{BridgeSession, SessionCapability},
    ws,
};

/// How long shutdown waits for queued messages to drain.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wa_gateway=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        send_interval_ms = config.send_interval.as_millis() as u64,
        "Starting WA Gateway"
    );

    let shutdown = CancellationToken::new();

    // Session bridge and its lifecycle stream
    let bridge = Arc::new(BridgeSession::new(
        &config.session_bridge_url,
        config.session_bridge_token.clone(),
    )?);
    let (event_tx, event_rx) = mpsc::channel(16);
    let event_stream = bridge.spawn_event_stream(event_tx, shutdown.child_token());
    info!(bridge = %config.session_bridge_url, "Session bridge configured");

    let broadcaster = SessionEventBroadcaster::new();
    let relay = tokio::spawn(broadcast::relay_session_events(
        event_rx,
        broadcaster.clone(),
    ));

    let session: Arc<dyn SessionCapability> = bridge;
    let queue = DeliveryQueue::new(Arc::clone(&session), config.queue_config());

    // Build application state
    let state = api::AppState::new(config.clone(), session, queue.clone(), broadcaster);

    // Standalone subscriber listener
    let ws_listener = tokio::net::TcpListener::bind(&config.ws_bind_address).await?;
    info!(address = %config.ws_bind_address, "WebSocket subscribers listening");
    let ws_app = ws::router().with_state(state.clone());
    let ws_shutdown = shutdown.clone();
    let ws_server = tokio::spawn(async move {
        axum::serve(ws_listener, ws_app)
            .with_graceful_shutdown(async move { ws_shutdown.cancelled().await })
            .await
    });

    // Start server
    let app = api::create_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Server listening");
    info!("Swagger UI available at /api-docs");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    // Queued work is not persisted; give it a chance to go out.
    if !queue.is_draining() {
        info!("Delivery queue idle");
    } else if tokio::time::timeout(SHUTDOWN_GRACE, queue.idle()).await.is_err() {
        warn!(
            pending = queue.pending(),
            "Shutdown grace elapsed, dropping undelivered messages"
        );
    }

    if let Err(e) = event_stream.await {
        error!("Session event stream task failed: {}", e);
    }
    if let Err(e) = relay.await {
        error!("Session event relay task failed: {}", e);
    }
    ws_server.await??;

    info!("Server shutdown complete");

    Ok(())
}

/// Resolve on Ctrl-C and cancel background tasks.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal, cleaning up...");
    shutdown.cancel();
}
