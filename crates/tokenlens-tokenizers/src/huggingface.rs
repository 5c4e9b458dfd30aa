//! Tokenizers loaded from HuggingFace `tokenizer.json` files
//!
//! Files live in a local store laid out as `<root>/<provider>/<model>/tokenizer.json`.
//! [`download_tokenizer`] fills the store from the HuggingFace Hub; resolving a
//! tokenizer never touches the network.

use crate::traits::{TokenId, Tokenizer};
use crate::{TokenizerError, TokenizerResult};
use hf_hub::api::tokio::ApiBuilder;
use std::path::{Path, PathBuf};
use tokenlens_common::TokenizerTier;
use tokenlens_config::TokenizerConfig;
use tracing::{debug, info};

const TOKENIZER_FILE: &str = "tokenizer.json";
const HUB_CACHE_DIR: &str = ".hub-cache";

/// Precise tokenizer backed by the `tokenizers` crate
pub struct HuggingFaceTokenizer {
    name: String,
    inner: tokenizers::Tokenizer,
}

impl HuggingFaceTokenizer {
    /// Load a tokenizer definition from a `tokenizer.json` file
    ///
    /// # Errors
    /// Returns `TokenizerError::LoadFailed` if the file is missing or malformed
    pub fn from_file(name: impl Into<String>, path: &Path) -> TokenizerResult<Self> {
        let name = name.into();
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| TokenizerError::load_failed(&name, e))?;
        Ok(Self { name, inner })
    }

    /// Load the stored tokenizer for `provider`/`model`
    ///
    /// # Errors
    /// Returns `TokenizerError::LoadFailed` if nothing has been fetched for this model
    pub fn from_store(root: &Path, provider: &str, model: &str) -> TokenizerResult<Self> {
        let path = tokenizer_path(root, provider, model)?;
        let name = format!("huggingface/{provider}/{model}");
        if !path.is_file() {
            return Err(TokenizerError::load_failed(
                name,
                format!(
                    "no tokenizer.json in the local store; run `tokenlens fetch-tokenizer --provider {provider} --model {model}`"
                ),
            ));
        }
        debug!(path = %path.display(), "Loading HuggingFace tokenizer");
        Self::from_file(name, &path)
    }
}

impl Tokenizer for HuggingFaceTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn tier(&self) -> TokenizerTier {
        TokenizerTier::Precise
    }

    fn encode(&self, text: &str) -> TokenizerResult<Vec<TokenId>> {
        self.inner
            .encode(text, false)
            .map(|encoding| encoding.get_ids().to_vec())
            .map_err(|e| TokenizerError::encode(&self.name, e))
    }

    fn decode(&self, tokens: &[TokenId]) -> TokenizerResult<String> {
        self.inner
            .decode(tokens, false)
            .map_err(|e| TokenizerError::decode(&self.name, e))
    }
}

/// Where the store keeps the tokenizer for `provider`/`model`
///
/// Slashes in model names become `--` so hub-style names stay one directory deep.
///
/// # Errors
/// Returns `TokenizerError::InvalidStoreName` for empty, `.` or `..` names
pub fn tokenizer_path(root: &Path, provider: &str, model: &str) -> TokenizerResult<PathBuf> {
    Ok(root
        .join(sanitize_segment(provider)?)
        .join(sanitize_segment(model)?)
        .join(TOKENIZER_FILE))
}

fn sanitize_segment(segment: &str) -> TokenizerResult<String> {
    let sanitized = segment.trim().replace(['/', '\\'], "--");
    match sanitized.as_str() {
        "" | "." | ".." => Err(TokenizerError::InvalidStoreName {
            name: segment.to_string(),
        }),
        _ => Ok(sanitized),
    }
}

/// Download `tokenizer.json` from a Hub repository into the local store
///
/// Uses `HF_TOKEN` from the environment for gated repositories. Returns the
/// path the tokenizer was stored at after checking that it loads.
///
/// # Errors
/// Returns `TokenizerError::InvalidStoreName` before any request for names
/// that would leave the store, `Download` for Hub failures, `Io` for store
/// writes and `LoadFailed` if the downloaded file is not a usable tokenizer
pub async fn download_tokenizer(
    config: &TokenizerConfig,
    provider: &str,
    model: &str,
    repo: &str,
) -> TokenizerResult<PathBuf> {
    let target = tokenizer_path(&config.huggingface_dir, provider, model)?;
    let download_error = |message: String| TokenizerError::Download {
        repo: repo.to_string(),
        message,
    };

    let mut builder = ApiBuilder::new()
        .with_progress(false)
        .with_cache_dir(config.huggingface_dir.join(HUB_CACHE_DIR))
        .with_token(std::env::var("HF_TOKEN").ok());
    if let Some(endpoint) = &config.hub_endpoint {
        builder = builder.with_endpoint(endpoint.clone());
    }

    let api = builder.build().map_err(|e| download_error(e.to_string()))?;

    info!(repo, provider, model, "Downloading tokenizer from HuggingFace Hub");
    let cached = api
        .model(repo.to_string())
        .get(TOKENIZER_FILE)
        .await
        .map_err(|e| download_error(e.to_string()))?;

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(&cached, &target).await?;

    HuggingFaceTokenizer::from_file(format!("huggingface/{provider}/{model}"), &target)?;
    info!(path = %target.display(), "Tokenizer stored");
    Ok(target)
}
