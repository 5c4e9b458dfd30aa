//! Batch planning for text that exceeds a token limit
//!
//! The token sequence is cut into windows of `batch_size` tokens (the last
//! window holds the remainder). Each window end is mapped back to a character
//! offset by decoding the whole prefix up to it and counting `char`s, because
//! token boundaries do not line up with character boundaries in general.
//!
//! Decoding must be prefix-monotonic: a longer prefix may never decode to a
//! shorter string. This is checked, not assumed.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokenlens_tokenizers::{TokenId, Tokenizer, TokenizerError};

/// A contiguous slice of the token sequence and the text it covers
///
/// `start_char..end_char` is half-open and counted in Unicode scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Batch {
    /// 1-based position
    pub index: usize,
    pub token_count: usize,
    pub start_char: usize,
    pub end_char: usize,
}

impl Batch {
    pub const fn char_len(&self) -> usize {
        self.end_char.saturating_sub(self.start_char)
    }
}

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Batch size must be at least 1, got {batch_size}")]
    InvalidBatchSize { batch_size: usize },

    #[error("Tokenization failed: {0}")]
    Tokenization(#[from] TokenizerError),

    #[error(
        "Tokenizer '{tokenizer}' is not prefix-monotonic: batch {index} ends at char {current}, before the previous boundary at {previous}"
    )]
    NonMonotonicDecode {
        tokenizer: String,
        index: usize,
        previous: usize,
        current: usize,
    },
}

pub type PlanResult<T> = Result<T, PlanError>;

/// Encode `text` and split it into batches of at most `batch_size` tokens
///
/// Empty text yields no batches. `batch_size` is checked before the tokenizer
/// is touched.
///
/// # Errors
/// - `InvalidBatchSize` if `batch_size` is zero
/// - `Tokenization` if encoding or any prefix decode fails
/// - `NonMonotonicDecode` if a prefix decodes shorter than the one before it
pub fn plan_batches<T>(text: &str, tokenizer: &T, batch_size: usize) -> PlanResult<Vec<Batch>>
where
    T: Tokenizer + ?Sized,
{
    ensure_batch_size(batch_size)?;
    let tokens = tokenizer.encode(text)?;
    plan_token_batches(&tokens, tokenizer, batch_size)
}

/// Split an already encoded sequence; `tokens` must come from `tokenizer`
///
/// # Errors
/// Same as [`plan_batches`], minus encoding failures
pub fn plan_token_batches<T>(
    tokens: &[TokenId],
    tokenizer: &T,
    batch_size: usize,
) -> PlanResult<Vec<Batch>>
where
    T: Tokenizer + ?Sized,
{
    ensure_batch_size(batch_size)?;

    let mut batches = Vec::with_capacity(tokens.len().div_ceil(batch_size));
    let mut prefix_len = 0usize;
    let mut start_char = 0usize;

    for (position, window) in tokens.chunks(batch_size).enumerate() {
        let index = position.saturating_add(1);
        prefix_len = prefix_len.saturating_add(window.len());
        let prefix = tokens.get(..prefix_len).unwrap_or(tokens);
        let end_char = tokenizer.decode(prefix)?.chars().count();

        if end_char < start_char {
            return Err(PlanError::NonMonotonicDecode {
                tokenizer: tokenizer.name().to_string(),
                index,
                previous: start_char,
                current: end_char,
            });
        }

        batches.push(Batch {
            index,
            token_count: window.len(),
            start_char,
            end_char,
        });
        start_char = end_char;
    }

    Ok(batches)
}

fn ensure_batch_size(batch_size: usize) -> PlanResult<()> {
    if batch_size == 0 {
        return Err(PlanError::InvalidBatchSize { batch_size });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use tokenlens_tokenizers::testing::{FailOn, FailingTokenizer, ShrinkingTokenizer, WordTokenizer};

    fn batch(index: usize, token_count: usize, start_char: usize, end_char: usize) -> Batch {
        Batch {
            index,
            token_count,
            start_char,
            end_char,
        }
    }

    #[test]
    fn test_word_scenario() {
        let tokenizer = WordTokenizer::new();
        let batches = plan_batches("aaaa bbbb cccc dddd", &tokenizer, 2).unwrap();
        assert_eq!(batches, vec![batch(1, 2, 0, 9), batch(2, 2, 9, 19)]);
    }

    #[test]
    fn test_remainder_goes_to_last_batch() {
        let tokenizer = WordTokenizer::new();
        let batches = plan_batches("a b c d e", &tokenizer, 2).unwrap();
        let counts: Vec<usize> = batches.iter().map(|b| b.token_count).collect();
        assert_eq!(counts, vec![2, 2, 1]);
        assert_eq!(batches.last().unwrap().end_char, 9);
    }

    #[test]
    fn test_empty_text_has_no_batches() {
        let tokenizer = WordTokenizer::new();
        assert!(plan_batches("", &tokenizer, 3).unwrap().is_empty());
    }

    #[test]
    fn test_batch_size_covering_everything_gives_one_batch() {
        let tokenizer = WordTokenizer::new();
        let batches = plan_batches("aaaa bbbb cccc dddd", &tokenizer, 100).unwrap();
        assert_eq!(batches, vec![batch(1, 4, 0, 19)]);
    }

    #[test]
    fn test_zero_batch_size_never_encodes() {
        let tokenizer = WordTokenizer::new();
        let result = plan_batches("aaaa bbbb", &tokenizer, 0);
        assert!(matches!(
            result,
            Err(PlanError::InvalidBatchSize { batch_size: 0 })
        ));
        assert_eq!(tokenizer.encode_calls(), 0);
    }

    #[test]
    fn test_encode_failure_propagates() {
        let tokenizer = FailingTokenizer::new(FailOn::Encode);
        assert!(matches!(
            plan_batches("abc", &tokenizer, 1),
            Err(PlanError::Tokenization(_))
        ));
    }

    #[test]
    fn test_decode_failure_aborts_whole_plan() {
        let tokenizer = FailingTokenizer::new(FailOn::Decode);
        assert!(matches!(
            plan_batches("abcdef", &tokenizer, 2),
            Err(PlanError::Tokenization(TokenizerError::Decode { .. }))
        ));
    }

    #[test]
    fn test_shrinking_decode_is_rejected() {
        let result = plan_batches("abcd", &ShrinkingTokenizer, 1);
        let Err(PlanError::NonMonotonicDecode {
            index,
            previous,
            current,
            ..
        }) = result
        else {
            panic!("expected NonMonotonicDecode, got {result:?}");
        };
        assert_eq!(index, 2);
        assert_eq!(previous, 100);
        assert_eq!(current, 50);
    }

    #[test]
    fn test_works_through_trait_objects() {
        let tokenizer: std::sync::Arc<dyn Tokenizer> = std::sync::Arc::new(WordTokenizer::new());
        let tokens = tokenizer.encode("aaaa bbbb cccc").unwrap();
        let batches = plan_token_batches(&tokens, tokenizer.as_ref(), 2).unwrap();
        assert_eq!(batches, vec![batch(1, 2, 0, 9), batch(2, 1, 9, 14)]);
        assert_eq!(batches[1].char_len(), 5);
    }
}
