//! Tokenizer error types

use thiserror::Error;

/// Errors raised while resolving, loading or running a tokenizer
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// Encoding text failed inside the tokenizer backend
    #[error("Tokenizer '{tokenizer}' failed to encode: {message}")]
    Encode { tokenizer: String, message: String },

    /// Decoding a token sequence failed inside the tokenizer backend
    #[error("Tokenizer '{tokenizer}' failed to decode: {message}")]
    Decode { tokenizer: String, message: String },

    /// No tokenizer is registered for this provider at any tier
    #[error("Unknown provider '{provider}': no tokenizer is registered")]
    UnknownProvider { provider: String },

    /// The provider only offers remote token counting, or this model has no local tokenizer
    #[error(
        "No precise tokenizer is available for {provider}/{model}; request the approximate tier explicitly"
    )]
    PreciseTokenizerUnavailable { provider: String, model: String },

    /// A tokenizer definition could not be loaded (missing or corrupt file, unknown encoding)
    #[error("Failed to load tokenizer '{tokenizer}': {message}")]
    LoadFailed { tokenizer: String, message: String },

    /// Fetching a tokenizer from the HuggingFace Hub failed
    #[error("Failed to download tokenizer from '{repo}': {message}")]
    Download { repo: String, message: String },

    /// A provider or model name cannot be used as a store directory
    #[error("'{name}' is not a valid tokenizer store name")]
    InvalidStoreName { name: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TokenizerError {
    pub fn encode(tokenizer: impl Into<String>, message: impl ToString) -> Self {
        Self::Encode {
            tokenizer: tokenizer.into(),
            message: message.to_string(),
        }
    }

    pub fn decode(tokenizer: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            tokenizer: tokenizer.into(),
            message: message.to_string(),
        }
    }

    pub fn load_failed(tokenizer: impl Into<String>, message: impl ToString) -> Self {
        Self::LoadFailed {
            tokenizer: tokenizer.into(),
            message: message.to_string(),
        }
    }

    /// Whether the caller could succeed by asking for the approximate tier instead
    pub const fn is_tier_unavailable(&self) -> bool {
        matches!(
            self,
            Self::PreciseTokenizerUnavailable { .. } | Self::LoadFailed { .. }
        )
    }
}

/// Result type for tokenizer operations
pub type TokenizerResult<T> = Result<T, TokenizerError>;
