//! Tiktoken-based tokenizer for OpenAI-compatible models

use crate::traits::{TokenId, Tokenizer};
use crate::{TokenizerError, TokenizerResult};
use std::fmt;
use std::str::FromStr;
use tiktoken_rs::{CoreBPE, cl100k_base, o200k_base, p50k_base, p50k_edit, r50k_base};
use tokenlens_common::TokenizerTier;

/// How far back decode searches for a clean UTF-8 boundary
///
/// Byte-level merges can straddle characters, so the incomplete tail of a
/// prefix may cover more tokens than the bytes of a single character.
const MAX_PARTIAL_TAIL_TOKENS: usize = 16;

/// The BPE encodings shipped with `tiktoken-rs`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TiktokenEncoding {
    O200kBase,
    Cl100kBase,
    P50kBase,
    P50kEdit,
    R50kBase,
}

impl TiktokenEncoding {
    /// Pick the encoding a model family was trained with
    pub fn for_model(model: &str) -> Self {
        match model {
            name if name.starts_with("gpt-4o")
                || name.starts_with("gpt-4.1")
                || name.starts_with("gpt-5")
                || name.starts_with("o1")
                || name.starts_with("o3")
                || name.starts_with("o4") =>
            {
                Self::O200kBase
            }
            name if name.starts_with("gpt-4")
                || name.starts_with("gpt-3.5")
                || name.starts_with("text-embedding-") =>
            {
                Self::Cl100kBase
            }
            // Checked before the davinci prefixes: text-davinci-edit-001 is an edit model
            name if name.contains("-edit") => Self::P50kEdit,
            name if name.starts_with("text-davinci-002")
                || name.starts_with("text-davinci-003")
                || name.starts_with("code-") =>
            {
                Self::P50kBase
            }
            name if name.starts_with("text-")
                || name.starts_with("davinci")
                || name.starts_with("curie")
                || name.starts_with("babbage")
                || name.starts_with("ada")
                || name.contains("titan") =>
            {
                Self::R50kBase
            }
            _ => Self::Cl100kBase,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::O200kBase => "o200k_base",
            Self::Cl100kBase => "cl100k_base",
            Self::P50kBase => "p50k_base",
            Self::P50kEdit => "p50k_edit",
            Self::R50kBase => "r50k_base",
        }
    }

    fn load(self) -> anyhow::Result<CoreBPE> {
        match self {
            Self::O200kBase => o200k_base(),
            Self::Cl100kBase => cl100k_base(),
            Self::P50kBase => p50k_base(),
            Self::P50kEdit => p50k_edit(),
            Self::R50kBase => r50k_base(),
        }
    }
}

impl fmt::Display for TiktokenEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TiktokenEncoding {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "o200k_base" => Ok(Self::O200kBase),
            "cl100k_base" => Ok(Self::Cl100kBase),
            "p50k_base" => Ok(Self::P50kBase),
            "p50k_edit" => Ok(Self::P50kEdit),
            "r50k_base" | "gpt2" => Ok(Self::R50kBase),
            other => Err(TokenizerError::load_failed(other, "unknown tiktoken encoding")),
        }
    }
}

/// Precise tokenizer backed by a tiktoken BPE
pub struct TiktokenTokenizer {
    name: String,
    encoding: TiktokenEncoding,
    bpe: CoreBPE,
}

impl TiktokenTokenizer {
    /// Create a tokenizer using the encoding for `model`
    ///
    /// # Errors
    /// Returns `TokenizerError::LoadFailed` if the BPE ranks cannot be loaded
    pub fn for_model(model: &str) -> TokenizerResult<Self> {
        Self::with_encoding(TiktokenEncoding::for_model(model))
    }

    /// Create a tokenizer pinned to one encoding
    ///
    /// # Errors
    /// Returns `TokenizerError::LoadFailed` if the BPE ranks cannot be loaded
    pub fn with_encoding(encoding: TiktokenEncoding) -> TokenizerResult<Self> {
        let bpe = encoding
            .load()
            .map_err(|e| TokenizerError::load_failed(encoding.name(), e))?;

        Ok(Self {
            name: format!("tiktoken/{encoding}"),
            encoding,
            bpe,
        })
    }

    pub const fn encoding(&self) -> TiktokenEncoding {
        self.encoding
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn tier(&self) -> TokenizerTier {
        TokenizerTier::Precise
    }

    fn encode(&self, text: &str) -> TokenizerResult<Vec<TokenId>> {
        Ok(self.bpe.encode_ordinary(text))
    }

    /// Decode, replacing an incomplete trailing UTF-8 sequence with U+FFFD
    ///
    /// A prefix of a valid encoding can end in the middle of a multi-byte
    /// character. The tail back to the last clean boundary is replaced by a
    /// single replacement character, which keeps prefix decoding monotonic.
    fn decode(&self, tokens: &[TokenId]) -> TokenizerResult<String> {
        let floor = tokens.len().saturating_sub(MAX_PARTIAL_TAIL_TOKENS);
        let mut end = tokens.len();

        loop {
            let head = tokens.get(..end).unwrap_or_default();
            match self.bpe.decode(head.to_vec()) {
                Ok(mut text) => {
                    if end < tokens.len() {
                        text.push(char::REPLACEMENT_CHARACTER);
                    }
                    return Ok(text);
                }
                Err(_) if end > floor => end = end.saturating_sub(1),
                Err(e) => return Err(TokenizerError::decode(&self.name, e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_encoding_selection() {
        let cases = [
            ("gpt-4", TiktokenEncoding::Cl100kBase),
            ("gpt-4-1106-preview", TiktokenEncoding::Cl100kBase),
            ("gpt-3.5-turbo-16k", TiktokenEncoding::Cl100kBase),
            ("gpt-4o-mini", TiktokenEncoding::O200kBase),
            ("o1-preview", TiktokenEncoding::O200kBase),
            ("text-embedding-3-large", TiktokenEncoding::Cl100kBase),
            ("text-davinci-003", TiktokenEncoding::P50kBase),
            ("text-davinci-edit-001", TiktokenEncoding::P50kEdit),
            ("code-davinci-002", TiktokenEncoding::P50kBase),
            ("davinci", TiktokenEncoding::R50kBase),
            ("amazon.titan-text-express", TiktokenEncoding::R50kBase),
            ("something-new", TiktokenEncoding::Cl100kBase),
        ];

        for (model, expected) in cases {
            assert_eq!(TiktokenEncoding::for_model(model), expected, "{model}");
        }
    }

    #[test]
    fn test_encoding_from_name() {
        assert_eq!(
            "cl100k_base".parse::<TiktokenEncoding>().unwrap(),
            TiktokenEncoding::Cl100kBase
        );
        assert!("cl200k_base".parse::<TiktokenEncoding>().is_err());
    }

    #[test]
    fn test_token_counting() {
        let tokenizer = TiktokenTokenizer::for_model("gpt-4").expect("Should create tokenizer");
        assert_eq!(tokenizer.name(), "tiktoken/cl100k_base");
        assert_eq!(tokenizer.tier(), TokenizerTier::Precise);

        let count = tokenizer.count("Hello, world!").unwrap();
        assert!(count > 0, "Should count tokens");
        assert!(count <= 5, "Simple text should be ~4 tokens");
    }

    #[test]
    fn test_empty_text() {
        let tokenizer = TiktokenTokenizer::for_model("gpt-4").expect("Should create tokenizer");
        assert!(tokenizer.encode("").unwrap().is_empty());
        assert_eq!(tokenizer.decode(&[]).unwrap(), "");
    }

    #[test]
    fn test_decode_roundtrip_with_unicode() {
        let tokenizer = TiktokenTokenizer::for_model("gpt-4").expect("Should create tokenizer");
        let text = "Hello 👋 World 🌍 你好世界";
        let tokens = tokenizer.encode(text).unwrap();
        assert_eq!(tokenizer.decode(&tokens).unwrap(), text);
    }

    #[test]
    fn test_partial_character_prefix_decodes_with_replacement() {
        let tokenizer = TiktokenTokenizer::for_model("gpt-4").expect("Should create tokenizer");
        let tokens = tokenizer.encode("👋").unwrap();

        if tokens.len() > 1 {
            let prefix = tokenizer.decode(&tokens[..1]).unwrap();
            assert_eq!(prefix, "\u{FFFD}");
        }
    }

    #[test]
    fn test_prefix_decode_is_monotonic() {
        let tokenizer = TiktokenTokenizer::for_model("gpt-4o").expect("Should create tokenizer");
        let tokens = tokenizer.encode("naïve café 🍰 crème brûlée").unwrap();

        let mut previous = 0;
        for end in 0..=tokens.len() {
            let len = tokenizer.decode(&tokens[..end]).unwrap().chars().count();
            assert!(len >= previous, "prefix {end} shrank");
            previous = len;
        }
    }
}
