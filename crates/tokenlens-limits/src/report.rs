//! Check results

use crate::planner::Batch;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokenlens_catalog::{ContentType, ModelLimits};
use tokenlens_common::TokenizerTier;

/// Outcome of a token-limit check
///
/// `recommended_batch_size` and `batches` are present only when the text is
/// over the limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LimitCheckResult {
    pub provider: String,
    pub model: String,
    /// Name of the tokenizer that produced `total_tokens`
    pub tokenizer: String,
    pub tier: TokenizerTier,
    pub total_tokens: usize,
    pub is_within_limit: bool,
    pub model_max_tokens: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_batch_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batches: Option<Vec<Batch>>,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub model_additional_constraints: Map<String, Value>,
}

/// One way a media request breaks the model's limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Violation {
    /// Request field at fault, e.g. `duration`
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Outcome of an image, video, voice or avatar check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MediaCheckResult {
    pub provider: String,
    pub model: String,
    pub content_type: ContentType,
    pub is_within_limit: bool,
    pub violations: Vec<Violation>,
    pub limits: ModelLimits,
}

/// Result of [`crate::LimitChecker::check`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(untagged)]
pub enum CheckReport {
    Text(LimitCheckResult),
    Media(MediaCheckResult),
}

impl CheckReport {
    pub const fn is_within_limit(&self) -> bool {
        match self {
            Self::Text(result) => result.is_within_limit,
            Self::Media(result) => result.is_within_limit,
        }
    }
}

/// What a provider offers, for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProviderSummary {
    pub name: String,
    pub display_name: String,
    pub aliases: Vec<String>,
    pub content_types: Vec<ContentType>,
    pub model_count: usize,
    /// Whether a local precise tokenizer is registered (some models may still lack one)
    pub precise_tokenizer: bool,
}
