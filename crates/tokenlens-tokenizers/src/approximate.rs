//! Heuristic tokenizer for providers without a local precise tokenizer
//!
//! Text is cut into pieces the way BPE vocabularies tend to cut English:
//! a run of whitespace attaches to the word that follows it, punctuation and
//! symbols stand alone, and no piece is longer than `chars_per_token`
//! characters. Pieces are interned into a per-instance vocabulary, so token
//! IDs are only meaningful to the instance that produced them and
//! `decode(encode(text)) == text` always holds.

use crate::traits::{TokenId, Tokenizer};
use crate::{TokenizerError, TokenizerResult};
use std::collections::HashMap;
use std::sync::RwLock;
use tokenlens_common::TokenizerTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Word,
    Whitespace,
    Symbol,
}

impl CharClass {
    fn of(ch: char) -> Self {
        if ch.is_alphanumeric() || ch == '_' {
            Self::Word
        } else if ch.is_whitespace() {
            Self::Whitespace
        } else {
            Self::Symbol
        }
    }
}

#[derive(Debug, Default)]
struct Vocabulary {
    ids: HashMap<String, TokenId>,
    pieces: Vec<String>,
}

impl Vocabulary {
    fn intern(&mut self, piece: &str) -> Option<TokenId> {
        if let Some(&id) = self.ids.get(piece) {
            return Some(id);
        }
        let id = TokenId::try_from(self.pieces.len()).ok()?;
        self.pieces.push(piece.to_string());
        self.ids.insert(piece.to_string(), id);
        Some(id)
    }

    fn piece(&self, id: TokenId) -> Option<&str> {
        self.pieces.get(usize::try_from(id).ok()?).map(String::as_str)
    }
}

/// Reversible heuristic tokenizer
pub struct ApproximateTokenizer {
    name: String,
    chars_per_token: usize,
    vocabulary: RwLock<Vocabulary>,
}

impl ApproximateTokenizer {
    /// Create a tokenizer whose pieces hold at most `chars_per_token` characters
    pub fn new(chars_per_token: usize) -> Self {
        let chars_per_token = chars_per_token.max(1);
        Self {
            name: format!("approximate/{chars_per_token}"),
            chars_per_token,
            vocabulary: RwLock::new(Vocabulary::default()),
        }
    }

    fn split_pieces<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut pieces = Vec::new();
        let mut start = 0;
        let mut piece_chars = 0usize;
        let mut previous: Option<CharClass> = None;

        for (idx, ch) in text.char_indices() {
            let class = CharClass::of(ch);
            let boundary = previous.is_some_and(|prev| {
                piece_chars >= self.chars_per_token
                    || class == CharClass::Symbol
                    || prev == CharClass::Symbol
                    || (prev != class
                        && !(prev == CharClass::Whitespace && class == CharClass::Word))
            });

            if boundary {
                if let Some(piece) = text.get(start..idx) {
                    pieces.push(piece);
                }
                start = idx;
                piece_chars = 0;
            }
            piece_chars = piece_chars.saturating_add(1);
            previous = Some(class);
        }

        if let Some(rest) = text.get(start..).filter(|rest| !rest.is_empty()) {
            pieces.push(rest);
        }
        pieces
    }
}

impl Default for ApproximateTokenizer {
    fn default() -> Self {
        Self::new(4)
    }
}

impl Tokenizer for ApproximateTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn tier(&self) -> TokenizerTier {
        TokenizerTier::Approximate
    }

    fn encode(&self, text: &str) -> TokenizerResult<Vec<TokenId>> {
        let pieces = self.split_pieces(text);
        let mut vocabulary = self
            .vocabulary
            .write()
            .map_err(|_| TokenizerError::encode(&self.name, "vocabulary lock poisoned"))?;

        pieces
            .into_iter()
            .map(|piece| {
                vocabulary
                    .intern(piece)
                    .ok_or_else(|| TokenizerError::encode(&self.name, "vocabulary is full"))
            })
            .collect()
    }

    fn decode(&self, tokens: &[TokenId]) -> TokenizerResult<String> {
        let vocabulary = self
            .vocabulary
            .read()
            .map_err(|_| TokenizerError::decode(&self.name, "vocabulary lock poisoned"))?;

        tokens.iter().try_fold(String::new(), |mut text, &id| {
            let piece = vocabulary
                .piece(id)
                .ok_or_else(|| TokenizerError::decode(&self.name, format!("unknown token id {id}")))?;
            text.push_str(piece);
            Ok(text)
        })
    }

    fn count(&self, text: &str) -> TokenizerResult<usize> {
        Ok(self.split_pieces(text).len())
    }
}
