//! Message Endpoints
//!
//! Producer side of the delivery queue. Every send endpoint normalizes the
//! number, renders its template and enqueues; the response only confirms the
//! message was queued.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::ApiError;
use super::extract::{scalar_text, JsonBody};
use super::AppState;
use crate::{address, templates};

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SendOtpRequest {
    /// Phone number (e.g. 08123456789)
    #[serde(default, deserialize_with = "scalar_text")]
    pub number: Option<String>,
    /// OTP code to send
    #[serde(default, deserialize_with = "scalar_text")]
    pub otp: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendResetPasswordRequest {
    /// Phone number (e.g. 08123456789)
    #[serde(default, deserialize_with = "scalar_text")]
    pub number: Option<String>,
    /// Password reset link
    #[serde(default, deserialize_with = "scalar_text")]
    pub reset_link: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// Phone number (e.g. 08123456789)
    #[serde(default, deserialize_with = "scalar_text")]
    pub number: Option<String>,
    /// Message text
    #[serde(default, deserialize_with = "scalar_text")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueuedResponse {
    pub status: String,
    pub message: String,
}

impl QueuedResponse {
    fn queued(message: &str) -> Json<Self> {
        Json(Self {
            status: "success".to_string(),
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckNumberResponse {
    pub status: String,
    /// Whether the number has a WhatsApp account
    pub registered: bool,
    /// The number as given in the path
    pub number: String,
}

/// Non-empty value of an optional field.
fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

/// Check whether a number is registered on WhatsApp.
#[utoipa::path(
    get,
    path = "/api/check-number/{number}",
    tag = "messages",
    params(("number" = String, Path, description = "Phone number to check (e.g. 08123456789)")),
    responses(
        (status = 200, description = "Number checked", body = CheckNumberResponse),
        (status = 500, description = "Session error"),
    ),
)]
#[tracing::instrument(skip(state))]
pub async fn check_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<CheckNumberResponse>, ApiError> {
    let registered = state
        .session
        .is_valid_address(&address::normalize(&number))
        .await?;

    Ok(Json(CheckNumberResponse {
        status: "success".to_string(),
        registered,
        number,
    }))
}

/// Queue an OTP code for a number.
#[utoipa::path(
    post,
    path = "/api/send-otp",
    tag = "messages",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "OTP queued", body = QueuedResponse),
        (status = 400, description = "Number or OTP missing"),
    ),
)]
#[tracing::instrument(skip(state, body))]
pub async fn send_otp(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SendOtpRequest>,
) -> Result<Json<QueuedResponse>, ApiError> {
    let (Some(number), Some(otp)) = (present(body.number.as_ref()), present(body.otp.as_ref()))
    else {
        return Err(ApiError::MissingFields("Number and OTP required"));
    };

    state
        .queue
        .enqueue(address::normalize(number), templates::otp(otp));
    Ok(QueuedResponse::queued("OTP queued for sending"))
}

/// Queue a password reset link for a number.
#[utoipa::path(
    post,
    path = "/api/send-reset-password",
    tag = "messages",
    request_body = SendResetPasswordRequest,
    responses(
        (status = 200, description = "Reset link queued", body = QueuedResponse),
        (status = 400, description = "Number or reset link missing"),
    ),
)]
#[tracing::instrument(skip(state, body))]
pub async fn send_reset_password(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SendResetPasswordRequest>,
) -> Result<Json<QueuedResponse>, ApiError> {
    let (Some(number), Some(link)) = (
        present(body.number.as_ref()),
        present(body.reset_link.as_ref()),
    ) else {
        return Err(ApiError::MissingFields("Number and reset link required"));
    };

    state
        .queue
        .enqueue(address::normalize(number), templates::reset_password(link));
    Ok(QueuedResponse::queued("Reset password link queued for sending"))
}

/// Queue a notification for a number.
#[utoipa::path(
    post,
    path = "/api/send-notification",
    tag = "messages",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Notification queued", body = QueuedResponse),
        (status = 400, description = "Number or message missing"),
    ),
)]
#[tracing::instrument(skip(state, body))]
pub async fn send_notification(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SendMessageRequest>,
) -> Result<Json<QueuedResponse>, ApiError> {
    let (Some(number), Some(message)) = (
        present(body.number.as_ref()),
        present(body.message.as_ref()),
    ) else {
        return Err(ApiError::MissingFields("Number and message required"));
    };

    state
        .queue
        .enqueue(address::normalize(number), templates::notification(message));
    Ok(QueuedResponse::queued("Notification queued for sending"))
}

/// Queue a raw message for a number.
#[utoipa::path(
    post,
    path = "/api/send-message",
    tag = "messages",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message queued", body = QueuedResponse),
        (status = 400, description = "Number or message missing"),
    ),
)]
#[tracing::instrument(skip(state, body))]
pub async fn send_message(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SendMessageRequest>,
) -> Result<Json<QueuedResponse>, ApiError> {
    let (Some(number), Some(message)) = (
        present(body.number.as_ref()),
        present(body.message.as_ref()),
    ) else {
        return Err(ApiError::MissingFields("Number and message required"));
    };

    state
        .queue
        .enqueue(address::normalize(number), message.to_string());
    Ok(QueuedResponse::queued("Message queued for sending"))
}
