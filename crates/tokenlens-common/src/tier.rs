//! Tokenizer tiers
//!
//! Callers always name the tier they want. Nothing in tokenlens drops from
//! `Precise` to `Approximate` on its own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which class of tokenizer a count was (or should be) produced with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum TokenizerTier {
    /// Provider-faithful tokenizer (tiktoken or a HuggingFace tokenizer.json)
    #[default]
    Precise,
    /// Reversible heuristic segmentation, available for every provider
    Approximate,
}

impl TokenizerTier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Precise => "precise",
            Self::Approximate => "approximate",
        }
    }
}

impl fmt::Display for TokenizerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known tier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tokenizer tier '{0}' (expected 'precise' or 'approximate')")]
pub struct ParseTierError(pub String);

impl FromStr for TokenizerTier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "precise" => Ok(Self::Precise),
            "approximate" | "approx" => Ok(Self::Approximate),
            other => Err(ParseTierError(other.to_string())),
        }
    }
}
