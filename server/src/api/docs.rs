//! OpenAPI document.

use utoipa::OpenApi;

use super::messages::{
    CheckNumberResponse, QueuedResponse, SendMessageRequest, SendOtpRequest,
    SendResetPasswordRequest,
};
use super::HealthResponse;
use crate::delivery::QueueSnapshot;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "WA Gateway API",
        description = "Queue WhatsApp messages for paced delivery through a single session"
    ),
    paths(
        super::messages::check_number,
        super::messages::send_otp,
        super::messages::send_reset_password,
        super::messages::send_notification,
        super::messages::send_message,
        super::health_check,
        super::queue_status,
    ),
    components(schemas(
        SendOtpRequest,
        SendResetPasswordRequest,
        SendMessageRequest,
        QueuedResponse,
        CheckNumberResponse,
        HealthResponse,
        QueueSnapshot,
    )),
    tags(
        (name = "messages", description = "Outbound message producers"),
        (name = "system", description = "Health and queue status"),
    )
)]
pub struct ApiDoc;
