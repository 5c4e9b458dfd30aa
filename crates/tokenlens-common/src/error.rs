//! Shared error helpers
//!
//! Crates keep their own `thiserror` enums. This module gives them a common
//! constructor vocabulary and the `From` conversions that follow from it.

/// Constructor vocabulary shared by crate error enums
///
/// Implementing this lets `impl_common_conversions!` derive `From` impls for
/// I/O, `anyhow` and (optionally) `serde_json` errors.
pub trait CommonError: std::error::Error + Send + Sync + 'static {
    /// Create an I/O error variant
    fn io_error(msg: impl Into<String>) -> Self
    where
        Self: Sized;

    /// Create a configuration error variant
    fn config_error(msg: impl Into<String>) -> Self
    where
        Self: Sized;

    /// Create a parsing error variant
    fn parse_error(msg: impl Into<String>) -> Self
    where
        Self: Sized;

    /// Create a generic "other" error variant
    fn other_error(msg: impl Into<String>) -> Self
    where
        Self: Sized;
}

/// Implement `From` conversions for an error type that implements [`CommonError`]
///
/// - `From<std::io::Error>` routes to `io_error`
/// - `From<anyhow::Error>` routes to `other_error`
/// - with `with_serde`, `From<serde_json::Error>` routes to `parse_error`
///
/// The calling crate must depend on `anyhow` (and `serde_json` for `with_serde`).
#[macro_export]
macro_rules! impl_common_conversions {
    ($error_type:ident) => {
        impl From<std::io::Error> for $error_type {
            fn from(e: std::io::Error) -> Self {
                <$error_type as $crate::CommonError>::io_error(e.to_string())
            }
        }

        impl From<anyhow::Error> for $error_type {
            fn from(e: anyhow::Error) -> Self {
                <$error_type as $crate::CommonError>::other_error(e.to_string())
            }
        }
    };

    ($error_type:ident, with_serde) => {
        $crate::impl_common_conversions!($error_type);

        impl From<serde_json::Error> for $error_type {
            fn from(e: serde_json::Error) -> Self {
                <$error_type as $crate::CommonError>::parse_error(format!("JSON: {e}"))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    enum TestError {
        #[error("IO error: {0}")]
        Io(String),
        #[error("Configuration error: {0}")]
        Configuration(String),
        #[error("Parse error: {0}")]
        Parse(String),
        #[error("Other error: {0}")]
        Other(String),
    }

    impl CommonError for TestError {
        fn io_error(msg: impl Into<String>) -> Self {
            Self::Io(msg.into())
        }

        fn config_error(msg: impl Into<String>) -> Self {
            Self::Configuration(msg.into())
        }

        fn parse_error(msg: impl Into<String>) -> Self {
            Self::Parse(msg.into())
        }

        fn other_error(msg: impl Into<String>) -> Self {
            Self::Other(msg.into())
        }
    }

    impl_common_conversions!(TestError, with_serde);

    #[test]
    fn test_common_error_trait() {
        let io_err = TestError::io_error("file not found");
        assert_eq!(io_err.to_string(), "IO error: file not found");

        let config_err = TestError::config_error("missing directory");
        assert_eq!(
            config_err.to_string(),
            "Configuration error: missing directory"
        );
    }

    #[test]
    fn test_conversions_route_to_constructors() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(TestError::from(io), TestError::Io(_)));

        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(TestError::from(json_err), TestError::Parse(msg) if msg.starts_with("JSON: ")));

        let other = anyhow::anyhow!("boom");
        assert!(matches!(TestError::from(other), TestError::Other(_)));
    }
}
