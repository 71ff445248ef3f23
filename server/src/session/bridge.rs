//! Session Bridge Client
//!
//! Talks to the sidecar process that owns the WhatsApp Web session.
//!
//! Bridge contract:
//! - `GET  {base}/contacts/{address}/registered` -> `{"registered": bool}`
//! - `POST {base}/messages` with `{"to": address, "body": payload}`; any 2xx is a send
//! - `WS   {base}/events` streams lifecycle frames (`qr`, `ready`, `auth_failure`)
//!
//! The event stream reconnects with capped exponential backoff until cancelled.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::events::parse_bridge_event;
use super::{SessionCapability, SessionError, SessionEvent};

/// Connect timeout for bridge HTTP calls. Sends themselves are unbounded here.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on the event stream reconnect delay.
const MAX_RECONNECT_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    to: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegisteredResponse {
    registered: bool,
}

/// [`SessionCapability`] backed by the HTTP/WebSocket session bridge.
#[derive(Debug, Clone)]
pub struct BridgeSession {
    base_url: Url,
    token: Option<String>,
    client: reqwest::Client,
}

impl BridgeSession {
    /// Create a client for the bridge at `base_url` (e.g. `http://127.0.0.1:3001`).
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, SessionError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SessionError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(SessionError::InvalidUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url,
            token,
            client,
        })
    }

    /// Bridge URL for `segments`, each percent-encoded as a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL can take path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Spawn the lifecycle event stream.
    ///
    /// Parsed events are forwarded to `events`. The task ends when `cancel`
    /// fires or the receiving side of `events` is dropped.
    pub fn spawn_event_stream(
        &self,
        events: mpsc::Sender<SessionEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let url = events_url(self.base_url.as_str());
        let token = self.token.clone();
        tokio::spawn(async move {
            event_stream_loop(url, token, events, cancel).await;
        })
    }
}

async fn rejection(response: reqwest::Response) -> SessionError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    SessionError::Rejected { status, body }
}

#[async_trait]
impl SessionCapability for BridgeSession {
    async fn is_valid_address(&self, address: &str) -> Result<bool, SessionError> {
        let response = self
            .authorize(
                self.client
                    .get(self.endpoint(&["contacts", address, "registered"])),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body: RegisteredResponse = response.json().await?;
        Ok(body.registered)
    }

    async fn send(&self, address: &str, payload: &str) -> Result<(), SessionError> {
        let response = self
            .authorize(self.client.post(self.endpoint(&["messages"])))
            .json(&SendMessageRequest {
                to: address,
                body: payload,
            })
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(rejection(response).await)
        }
    }
}

/// Derive the event stream URL from the bridge's HTTP base URL.
fn events_url(base_url: &str) -> String {
    let base = base_url
        .replacen("https://", "wss://", 1)
        .replacen("http://", "ws://", 1);
    format!("{}/events", base.trim_end_matches('/'))
}

/// Delay before reconnect attempt `attempt` (1-based): 2, 4, 8, 16, 30, 30, ...
fn reconnect_delay(attempt: u32) -> Duration {
    std::cmp::min(
        Duration::from_secs(2u64.pow(attempt.clamp(1, 5))),
        MAX_RECONNECT_BACKOFF,
    )
}

fn build_request(
    url: &str,
    token: Option<&str>,
) -> Result<Request, tokio_tungstenite::tungstenite::Error> {
    let mut request = url.into_client_request()?;
    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(tokio_tungstenite::tungstenite::http::Error::from)?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }
    Ok(request)
}

async fn event_stream_loop(
    url: String,
    token: Option<String>,
    events: mpsc::Sender<SessionEvent>,
    cancel: CancellationToken,
) {
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            return;
        }

        let request = match build_request(&url, token.as_deref()) {
            Ok(request) => request,
            Err(e) => {
                error!(url = %url, error = %e, "Invalid session event stream request");
                return;
            }
        };

        match connect_async(request).await {
            Ok((stream, _)) => {
                info!(url = %url, "Session event stream connected");
                attempt = 0;
                let (mut write, mut read) = stream.split();

                loop {
                    tokio::select! {
                        msg = read.next() => {
                            match msg {
                                Some(Ok(Message::Text(text))) => {
                                    match parse_bridge_event(text.as_str()) {
                                        Ok(event) => {
                                            if events.send(event).await.is_err() {
                                                debug!("Session event receiver dropped");
                                                return;
                                            }
                                        }
                                        Err(e) => {
                                            warn!(error = %e, frame = %text.as_str(), "Ignoring unrecognized session event");
                                        }
                                    }
                                }
                                Some(Ok(Message::Ping(data))) => {
                                    if let Err(e) = write.send(Message::Pong(data)).await {
                                        warn!("Failed to send pong: {}", e);
                                    }
                                }
                                Some(Ok(Message::Close(_))) => {
                                    info!("Session bridge closed event stream");
                                    break;
                                }
                                Some(Err(e)) => {
                                    warn!(error = %e, "Session event stream error");
                                    break;
                                }
                                None => break,
                                _ => {}
                            }
                        }
                        () = cancel.cancelled() => {
                            let _ = write.send(Message::Close(None)).await;
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to connect session event stream");
            }
        }

        attempt += 1;
        let backoff = reconnect_delay(attempt);
        info!(attempt, backoff_secs = backoff.as_secs(), "Reconnecting session event stream");

        tokio::select! {
            () = tokio::time::sleep(backoff) => {}
            () = cancel.cancelled() => return,
        }
    }
}
