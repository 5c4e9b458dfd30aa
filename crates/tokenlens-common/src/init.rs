//! Global initialization utilities for the application

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the application environment
///
/// Loads variables from a `.env` file in the current directory or any parent.
/// Safe to call multiple times; only the first call does anything.
pub fn initialize_environment() {
    INIT.call_once(|| {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded environment file");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_environment_is_idempotent() {
        initialize_environment();
        initialize_environment();
        assert!(INIT.is_completed());
    }
}
