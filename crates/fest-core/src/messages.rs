//! User-facing messages for authentication failures.
//!
//! Error codes are stable identifiers returned in API error envelopes; this
//! table maps them to the strings shown to end users. Unknown codes fall
//! back to a generic message rather than leaking internals.

/// Fallback for codes with no mapped message.
pub const GENERIC_AUTH_MESSAGE: &str = "An error occurred. Please try again.";

/// Map an authentication error code to its user-facing message.
pub fn auth_error_message(code: &str) -> &'static str {
    match code {
        "invalid-credentials" => "Invalid email or password.",
        "wrong-password" => "Invalid email or password.",
        "user-not-found" => "No account found with this email.",
        "email-already-in-use" => "An account already exists with this email.",
        "invalid-email" => "Please enter a valid email address.",
        "weak-password" => "Password is too weak. Please choose a stronger password.",
        "user-disabled" => "This account has been disabled. Contact the organizers.",
        "too-many-requests" => "Too many attempts. Please try again later.",
        "network-request-failed" => "Network error. Check your connection and try again.",
        "session-expired" => "Your session has expired. Please sign in again.",
        _ => GENERIC_AUTH_MESSAGE,
    }
}
