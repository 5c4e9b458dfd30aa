//! Model limit records

use crate::resolution::{ParseResolutionError, Resolution};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// What kind of content a model accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Embedding,
    Rerank,
    Image,
    Video,
    Voice,
    Avatar,
}

impl ContentType {
    pub const ALL: [Self; 7] = [
        Self::Text,
        Self::Embedding,
        Self::Rerank,
        Self::Image,
        Self::Video,
        Self::Voice,
        Self::Avatar,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Embedding => "embedding",
            Self::Rerank => "rerank",
            Self::Image => "image",
            Self::Video => "video",
            Self::Voice => "voice",
            Self::Avatar => "avatar",
        }
    }

    /// Content measured in tokens rather than media dimensions
    pub const fn is_token_limited(self) -> bool {
        matches!(self, Self::Text | Self::Embedding | Self::Rerank)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown content type '{0}': expected text, embedding, rerank, image, video, voice or avatar")]
pub struct ParseContentTypeError(pub String);

impl FromStr for ContentType {
    type Err = ParseContentTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ParseContentTypeError(s.to_string()))
    }
}

/// Declared limits for one model
///
/// Everything except `type` is optional because each content type uses a
/// different subset. `additional_constraints` is passed through untouched;
/// the limit checker reads a few well-known keys from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ModelLimits {
    #[serde(rename = "type")]
    pub content_type: ContentType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_limit: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<usize>,

    /// `WxH` or a preset such as `1080p`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_resolution: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_resolutions: Vec<String>,

    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_script_chars: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_text_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size_mb: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_formats: Vec<String>,

    /// HuggingFace Hub repository holding this model's `tokenizer.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer_repo: Option<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub additional_constraints: Map<String, Value>,
}

impl ModelLimits {
    /// Minimal record for a content type; fill in the limits that apply
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            token_limit: None,
            max_output_tokens: None,
            max_resolution: None,
            supported_resolutions: Vec::new(),
            max_duration: None,
            max_script_chars: None,
            max_text_length: None,
            max_file_size_mb: None,
            supported_formats: Vec::new(),
            tokenizer_repo: None,
            additional_constraints: Map::new(),
        }
    }

    /// Shorthand for a token-limited text model
    pub fn text(token_limit: usize) -> Self {
        Self {
            token_limit: Some(token_limit),
            ..Self::new(ContentType::Text)
        }
    }

    pub fn constraint(&self, key: &str) -> Option<&Value> {
        self.additional_constraints.get(key)
    }

    /// A positive integer constraint such as `batch_size` or `prompt_length`
    pub fn constraint_usize(&self, key: &str) -> Option<usize> {
        self.constraint(key)
            .and_then(Value::as_u64)
            .and_then(|value| usize::try_from(value).ok())
            .filter(|&value| value > 0)
    }

    /// String options listed under `key`, lowercased
    ///
    /// A single string is treated as a one-element list.
    pub fn constraint_options(&self, key: &str) -> Option<Vec<String>> {
        match self.constraint(key)? {
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_ascii_lowercase)
                    .collect(),
            ),
            Value::String(single) => Some(vec![single.to_ascii_lowercase()]),
            _ => None,
        }
    }

    /// A `[min, max]` numeric pair
    pub fn constraint_range(&self, key: &str) -> Option<(f64, f64)> {
        let Value::Array(items) = self.constraint(key)? else {
            return None;
        };
        match items.as_slice() {
            [min, max] => Some((min.as_f64()?, max.as_f64()?)),
            _ => None,
        }
    }

    /// # Errors
    /// Returns `ParseResolutionError` if the declared maximum is malformed
    pub fn parsed_max_resolution(&self) -> Result<Option<Resolution>, ParseResolutionError> {
        self.max_resolution
            .as_deref()
            .map(str::parse)
            .transpose()
    }

    /// Whether `format` appears in `supported_formats` (case-insensitive)
    ///
    /// Models that declare no formats accept any.
    pub fn supports_format(&self, format: &str) -> bool {
        self.supported_formats.is_empty()
            || self
                .supported_formats
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(format.trim()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_type_parsing() {
        assert_eq!("Image".parse::<ContentType>().unwrap(), ContentType::Image);
        assert!("audio".parse::<ContentType>().is_err());
        assert!(ContentType::Rerank.is_token_limited());
        assert!(!ContentType::Avatar.is_token_limited());
    }

    #[test]
    fn test_serializes_type_field() {
        let limits = ModelLimits::text(8192);
        let value = serde_json::to_value(&limits).unwrap();
        assert_eq!(value, json!({"type": "text", "token_limit": 8192}));
    }

    #[test]
    fn test_constraint_accessors() {
        let mut limits = ModelLimits::new(ContentType::Image);
        limits.additional_constraints = json!({
            "batch_size": 96,
            "quality": ["Standard", "HD"],
            "style": "vivid",
            "duration_range": [2, 16.5],
            "zero": 0
        })
        .as_object()
        .cloned()
        .unwrap();

        assert_eq!(limits.constraint_usize("batch_size"), Some(96));
        assert_eq!(limits.constraint_usize("zero"), None);
        assert_eq!(
            limits.constraint_options("quality").unwrap(),
            vec!["standard", "hd"]
        );
        assert_eq!(limits.constraint_options("style").unwrap(), vec!["vivid"]);
        assert_eq!(limits.constraint_range("duration_range"), Some((2.0, 16.5)));
        assert_eq!(limits.constraint_range("quality"), None);
    }

    #[test]
    fn test_format_support() {
        let mut limits = ModelLimits::new(ContentType::Voice);
        assert!(limits.supports_format("anything"));

        limits.supported_formats = vec!["mp3".into(), "wav".into()];
        assert!(limits.supports_format("MP3"));
        assert!(!limits.supports_format("ogg"));
    }
}
