//! Session Error Types

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session bridge unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Session bridge rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Send timed out after {0:?}")]
    Timeout(Duration),

    #[error("Send aborted: {0}")]
    Aborted(String),

    #[error("Invalid session bridge URL: {0}")]
    InvalidUrl(String),
}

impl SessionError {
    /// Short stable label for log fields.
    #[must_use]
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Rejected { .. } => "rejected",
            Self::Timeout(_) => "timeout",
            Self::Aborted(_) => "aborted",
            Self::InvalidUrl(_) => "invalid_url",
        }
    }
}
