//! Limit checking error types

use crate::planner::PlanError;
use thiserror::Error;
use tokenlens_catalog::{CatalogError, ContentType};
use tokenlens_tokenizers::TokenizerError;

#[derive(Error, Debug)]
pub enum LimitError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),

    /// The request kind does not match what the model accepts
    #[error("{provider}/{model} is a {actual} model and cannot check {expected} content")]
    UnsupportedContentType {
        provider: String,
        model: String,
        expected: String,
        actual: ContentType,
    },

    /// Splitting the text at this batch size would plan more batches than allowed
    #[error(
        "{total_tokens} tokens at {batch_size} per batch need {batches} batches, more than the {max_batches} allowed; use a larger batch_size"
    )]
    TooManyBatches {
        total_tokens: usize,
        batch_size: usize,
        batches: usize,
        max_batches: usize,
    },

    /// The request content is malformed for its declared type
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl LimitError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }
}

pub type LimitResult<T> = Result<T, LimitError>;
