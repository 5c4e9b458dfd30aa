//! The tokenizer capability shared by every backend

use crate::TokenizerResult;
use std::sync::Arc;
use tokenlens_common::TokenizerTier;

/// Opaque token identifier
pub type TokenId = u32;

/// Encode text into token IDs and decode token prefixes back into text
///
/// Implementations must be deterministic for a given input. Limit checking
/// additionally assumes prefix-monotonic decoding: decoding a longer prefix
/// of an encoding never yields a shorter string.
pub trait Tokenizer: Send + Sync {
    /// Get the name/identifier of this tokenizer
    fn name(&self) -> &str;

    /// Tier this tokenizer belongs to
    fn tier(&self) -> TokenizerTier;

    /// Encode text into token IDs without adding special tokens
    ///
    /// # Errors
    /// Returns `TokenizerError::Encode` if the backend rejects the input
    fn encode(&self, text: &str) -> TokenizerResult<Vec<TokenId>>;

    /// Decode token IDs back into text
    ///
    /// # Errors
    /// Returns `TokenizerError::Decode` if the IDs are not valid for this tokenizer
    fn decode(&self, tokens: &[TokenId]) -> TokenizerResult<String>;

    /// Count tokens in the given text
    ///
    /// # Errors
    /// Propagates encoding failures
    fn count(&self, text: &str) -> TokenizerResult<usize> {
        Ok(self.encode(text)?.len())
    }
}

/// Type alias for a shared tokenizer
pub type TokenizerRef = Arc<dyn Tokenizer>;
