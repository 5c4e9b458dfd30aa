//! Error sanitization utilities
//!
//! Tokenizer and filesystem errors can carry local paths. These helpers log the
//! detailed error and hand back a message that is safe to show to API callers.

use tracing::error;

/// Sanitize an error message for external consumption
///
/// Logs the detailed error internally and returns a generic message
pub fn sanitize_error<E: std::fmt::Display>(error: E, context: &str) -> String {
    let reference = uuid::Uuid::new_v4();
    error!(
        reference = %reference,
        error = %error,
        context = %context,
        "Internal error occurred"
    );

    format!("Operation failed (ref: {reference})")
}

/// Sanitize an error with a user-friendly message
///
/// Logs the detailed error internally and returns a safe user message
pub fn sanitize_with_message<E: std::fmt::Display>(
    error: E,
    context: &str,
    user_message: &str,
) -> String {
    let reference = uuid::Uuid::new_v4();
    error!(
        reference = %reference,
        error = %error,
        context = %context,
        "Internal error occurred"
    );

    format!("{user_message} (ref: {reference})")
}
