//! Common utilities and patterns shared across tokenlens crates
//!
//! Holds the small set of types every layer agrees on (correlation IDs and
//! tokenizer tiers) plus shared error helpers and environment bootstrap.

pub mod error;
pub mod error_sanitizer;
pub mod init;
pub mod tier;

pub use error::CommonError;
pub use init::initialize_environment;
pub use tier::{ParseTierError, TokenizerTier};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation ID type for tracking a request across the HTTP layer and logs
///
/// Uses UUID v4 for uniqueness
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(value_type = String))]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a new correlation ID using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a correlation ID supplied by a caller, rejecting anything that is not a UUID
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::try_parse(value.trim()).ok().map(Self)
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Self::parse(id).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_parse_accepts_uuid() {
        let id = Uuid::new_v4();
        let parsed = CorrelationId::parse(&id.to_string());
        assert_eq!(parsed, Some(CorrelationId::from(id)));
    }

    #[test]
    fn test_correlation_id_parse_rejects_garbage() {
        assert!(CorrelationId::parse("not-a-uuid").is_none());
        assert!(CorrelationId::parse("").is_none());
    }

    #[test]
    fn test_correlation_id_from_str_generates_fresh_on_invalid() {
        let a = CorrelationId::from("nope");
        let b = CorrelationId::from("nope");
        assert_ne!(a, b);
    }
}
