//! Deterministic fixture tokenizers
//!
//! Enabled for this crate's tests and, through the `test-utils` feature, for
//! the tests of crates that depend on it.

use crate::traits::{TokenId, Tokenizer};
use crate::{TokenizerError, TokenizerResult};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokenlens_common::TokenizerTier;

/// One token per whitespace-separated word; decoding joins words with single spaces
///
/// `"aaaa bbbb cccc dddd"` encodes to four tokens, and decoding the first two
/// yields `"aaaa bbbb"` (9 characters).
#[derive(Default)]
pub struct WordTokenizer {
    words: Mutex<Vec<String>>,
    encode_calls: AtomicUsize,
}

impl WordTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `encode` has been called
    pub fn encode_calls(&self) -> usize {
        self.encode_calls.load(Ordering::SeqCst)
    }
}

impl Tokenizer for WordTokenizer {
    fn name(&self) -> &'static str {
        "test/words"
    }

    fn tier(&self) -> TokenizerTier {
        TokenizerTier::Precise
    }

    fn encode(&self, text: &str) -> TokenizerResult<Vec<TokenId>> {
        self.encode_calls.fetch_add(1, Ordering::SeqCst);
        let mut words = self
            .words
            .lock()
            .map_err(|_| TokenizerError::encode("test/words", "lock poisoned"))?;

        text.split_whitespace()
            .map(|word| {
                let position = words.iter().position(|known| known == word);
                let index = position.unwrap_or_else(|| {
                    words.push(word.to_string());
                    words.len().saturating_sub(1)
                });
                TokenId::try_from(index).map_err(|e| TokenizerError::encode("test/words", e))
            })
            .collect()
    }

    fn decode(&self, tokens: &[TokenId]) -> TokenizerResult<String> {
        let words = self
            .words
            .lock()
            .map_err(|_| TokenizerError::decode("test/words", "lock poisoned"))?;

        let decoded = tokens
            .iter()
            .map(|&id| {
                usize::try_from(id)
                    .ok()
                    .and_then(|index| words.get(index))
                    .map(String::as_str)
                    .ok_or_else(|| TokenizerError::decode("test/words", format!("unknown id {id}")))
            })
            .collect::<TokenizerResult<Vec<_>>>()?;
        Ok(decoded.join(" "))
    }
}

/// Which operation a [`FailingTokenizer`] rejects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Encode,
    Decode,
}

/// Encodes one token per character, then fails the chosen operation
pub struct FailingTokenizer {
    fail_on: FailOn,
}

impl FailingTokenizer {
    pub const fn new(fail_on: FailOn) -> Self {
        Self { fail_on }
    }
}

impl Tokenizer for FailingTokenizer {
    fn name(&self) -> &'static str {
        "test/failing"
    }

    fn tier(&self) -> TokenizerTier {
        TokenizerTier::Precise
    }

    fn encode(&self, text: &str) -> TokenizerResult<Vec<TokenId>> {
        if self.fail_on == FailOn::Encode {
            return Err(TokenizerError::encode("test/failing", "encode always fails"));
        }
        Ok(text.chars().map(TokenId::from).collect())
    }

    fn decode(&self, _tokens: &[TokenId]) -> TokenizerResult<String> {
        Err(TokenizerError::decode("test/failing", "decode always fails"))
    }
}

/// Breaks prefix-monotonic decoding: longer prefixes decode to shorter strings
pub struct ShrinkingTokenizer;

impl Tokenizer for ShrinkingTokenizer {
    fn name(&self) -> &'static str {
        "test/shrinking"
    }

    fn tier(&self) -> TokenizerTier {
        TokenizerTier::Precise
    }

    fn encode(&self, text: &str) -> TokenizerResult<Vec<TokenId>> {
        Ok(text.chars().map(TokenId::from).collect())
    }

    fn decode(&self, tokens: &[TokenId]) -> TokenizerResult<String> {
        let len = 100usize.checked_div(tokens.len()).unwrap_or(0);
        Ok("x".repeat(len))
    }
}
