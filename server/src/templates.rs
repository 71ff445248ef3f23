//! Message Templates
//!
//! Bodies for the templated send endpoints. Output text is user-facing and
//! must stay byte-for-byte stable.

/// One-time password message.
#[must_use]
pub fn otp(code: &str) -> String {
    format!(
        "Kode OTP Anda adalah *{code}*. Kode ini berlaku selama 5 menit. Jangan bagikan kode ini kepada siapa pun."
    )
}

/// Password reset link message.
#[must_use]
pub fn reset_password(link: &str) -> String {
    format!(
        "Untuk mereset kata sandi Anda, klik link berikut: {link}\nLink ini berlaku selama 1 jam."
    )
}

/// Generic notification message.
#[must_use]
pub fn notification(message: &str) -> String {
    format!("Notifikasi: {message}")
}
