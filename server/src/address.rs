//! Recipient Address Normalization
//!
//! Producers accept local-format phone numbers and convert them to session
//! contact ids before validity checks or enqueueing.

/// Country calling code substituted for a leading trunk `0`.
pub const COUNTRY_CODE: &str = "62";

/// Domain tag appended to every contact id.
pub const CONTACT_SUFFIX: &str = "@c.us";

/// Convert a phone number to a session contact id.
///
/// `"0<rest>"` becomes `"62<rest>@c.us"`; anything else is suffixed as-is.
/// No trimming or digit validation is performed.
#[must_use]
pub fn normalize(number: &str) -> String {
    match number.strip_prefix('0') {
        Some(rest) => format!("{COUNTRY_CODE}{rest}{CONTACT_SUFFIX}"),
        None => format!("{number}{CONTACT_SUFFIX}"),
    }
}
