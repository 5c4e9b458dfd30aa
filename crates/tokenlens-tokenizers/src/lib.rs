//! Tokenizers for tokenlens
//!
//! A [`Tokenizer`] turns text into opaque token IDs and decodes prefixes of
//! those IDs back into text. Three backends are provided:
//!
//! - [`TiktokenTokenizer`]: precise, for OpenAI-compatible vocabularies
//! - [`HuggingFaceTokenizer`]: precise, from a locally stored `tokenizer.json`
//! - [`ApproximateTokenizer`]: heuristic, available for every provider
//!
//! [`TokenizerRegistry`] maps providers to backends. Callers always pick the
//! [`TokenizerTier`] explicitly.

pub mod approximate;
pub mod error;
pub mod huggingface;
pub mod registry;
pub mod tiktoken;
pub mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use approximate::ApproximateTokenizer;
pub use error::{TokenizerError, TokenizerResult};
pub use huggingface::{HuggingFaceTokenizer, download_tokenizer, tokenizer_path};
pub use registry::{FactoryContext, TokenizerFactory, TokenizerRegistry};
pub use tiktoken::{TiktokenEncoding, TiktokenTokenizer};
pub use tokenlens_common::TokenizerTier;
pub use traits::{TokenId, Tokenizer, TokenizerRef};
