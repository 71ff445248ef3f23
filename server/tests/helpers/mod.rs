//! Reusable test helpers for HTTP and WebSocket integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full
//! axum router, backed by a [`RecordingSession`] in place of the real
//! session bridge.
//!
//! ## Test Servers
//!
//! Use [`spawn_test_server()`] when a test needs real sockets (WebSocket
//! subscribers, bridge clients).

#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{request, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use wa_gateway::api::{create_router, AppState};
use wa_gateway::broadcast::SessionEventBroadcaster;
use wa_gateway::config::Config;
use wa_gateway::delivery::DeliveryQueue;
use wa_gateway::session::{SessionCapability, SessionError};

// ============================================================================
// Recording session
// ============================================================================

/// In-memory session that records every send.
#[derive(Default)]
pub struct RecordingSession {
    sent: Mutex<Vec<(String, String)>>,
    registered: HashSet<String>,
    offline: AtomicBool,
}

impl RecordingSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Session that reports the given addresses as registered.
    pub fn with_registered(addresses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            registered: addresses.iter().map(ToString::to_string).collect(),
            ..Self::default()
        })
    }

    /// Make every call fail as if the bridge had no live session.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Sends recorded so far, in delivery order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    fn check_online(&self) -> Result<(), SessionError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SessionError::Rejected {
                status: 503,
                body: "session not ready".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SessionCapability for RecordingSession {
    async fn is_valid_address(&self, address: &str) -> Result<bool, SessionError> {
        self.check_online()?;
        Ok(self.registered.contains(address))
    }

    async fn send(&self, address: &str, payload: &str) -> Result<(), SessionError> {
        self.check_online()?;
        self.sent
            .lock()
            .unwrap()
            .push((address.to_string(), payload.to_string()));
        Ok(())
    }
}

// ============================================================================
// TestApp
// ============================================================================

/// Full application wired to a [`RecordingSession`].
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub session: Arc<RecordingSession>,
    pub queue: DeliveryQueue,
    pub broadcaster: SessionEventBroadcaster,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_session(RecordingSession::new())
    }

    pub fn with_session(session: Arc<RecordingSession>) -> Self {
        let config = Config::default_for_test();
        let dyn_session: Arc<dyn SessionCapability> = session.clone();
        let queue = DeliveryQueue::new(Arc::clone(&dyn_session), config.queue_config());
        let broadcaster = SessionEventBroadcaster::new();
        let state = AppState::new(config, dyn_session, queue.clone(), broadcaster.clone());
        let router = create_router(state.clone());

        Self {
            router,
            state,
            session,
            queue,
            broadcaster,
        }
    }

    /// Start building a request.
    pub fn request(method: Method, uri: &str) -> request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router.
    pub async fn oneshot(&self, req: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("Router failed to handle request")
    }

    /// POST a JSON body and return status plus parsed JSON response.
    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> (u16, serde_json::Value) {
        let req = Self::request(Method::POST, uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = self.oneshot(req).await;
        let status = resp.status().as_u16();
        (status, body_to_json(resp).await)
    }

    /// GET a path and return status plus parsed JSON response.
    pub async fn get_json(&self, uri: &str) -> (u16, serde_json::Value) {
        let req = Self::request(Method::GET, uri)
            .body(Body::empty())
            .unwrap();
        let resp = self.oneshot(req).await;
        let status = resp.status().as_u16();
        (status, body_to_json(resp).await)
    }

    /// Wait for the delivery queue to go idle.
    pub async fn drain(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.queue.idle())
            .await
            .expect("Delivery queue did not drain");
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}

// ============================================================================
// Test Server
// ============================================================================

/// A running test server bound to a random port.
pub struct TestServer {
    /// Server address (127.0.0.1:PORT).
    pub addr: SocketAddr,
    /// Base URL for HTTP requests (e.g., `http://127.0.0.1:12345`).
    pub url: String,
    /// Handle to the server task for cleanup.
    _handle: JoinHandle<()>,
}

/// Spawn a real HTTP server on a random port.
pub async fn spawn_test_server(router: Router) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to get local addr");
    let url = format!("http://{addr}");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server failed");
    });

    TestServer {
        addr,
        url,
        _handle: handle,
    }
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "Condition not met within 2s"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
