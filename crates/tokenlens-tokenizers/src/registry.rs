//! Explicit provider → tokenizer registry
//!
//! Every provider the registry knows is listed here or registered at
//! construction. Lookups never guess: an unknown provider fails, and a
//! provider without a local precise tokenizer fails at the precise tier
//! instead of quietly handing back an approximation.

use crate::approximate::ApproximateTokenizer;
use crate::huggingface::HuggingFaceTokenizer;
use crate::tiktoken::{TiktokenEncoding, TiktokenTokenizer};
use crate::traits::TokenizerRef;
use crate::{TokenizerError, TokenizerResult};
use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokenlens_common::TokenizerTier;
use tokenlens_config::TokenizerConfig;
use tracing::debug;

/// Inputs a factory needs to build a precise tokenizer
pub struct FactoryContext<'a> {
    pub provider: &'a str,
    pub model: &'a str,
    pub config: &'a TokenizerConfig,
}

/// Builds the precise tokenizer for one model of a provider
pub type TokenizerFactory = fn(&FactoryContext<'_>) -> TokenizerResult<TokenizerRef>;

/// Providers whose models are tokenized by tiktoken, picked per model
const TIKTOKEN_PROVIDERS: &[&str] = &["openai", "microsoft"];

/// Providers that publish HuggingFace `tokenizer.json` files
const HUGGINGFACE_PROVIDERS: &[&str] = &["huggingface", "meta", "mistral", "stanford"];

/// Providers that only count tokens remotely, or have no text models at all
const APPROXIMATE_ONLY_PROVIDERS: &[&str] = &[
    "anthropic",
    "google",
    "cohere",
    "ai21",
    "deepmind",
    "stability",
    "midjourney",
    "adobe",
    "ideogram",
    "runway",
    "nightcafe",
    "openart",
    "realm",
    "starrytars",
    "synthesia",
    "d-id",
    "replika",
    "haygen",
    "fugatto",
];

fn tiktoken_by_model(ctx: &FactoryContext<'_>) -> TokenizerResult<TokenizerRef> {
    Ok(Arc::new(TiktokenTokenizer::for_model(ctx.model)?))
}

fn tiktoken_cl100k(_ctx: &FactoryContext<'_>) -> TokenizerResult<TokenizerRef> {
    Ok(Arc::new(TiktokenTokenizer::with_encoding(
        TiktokenEncoding::Cl100kBase,
    )?))
}

/// Bedrock hosts several families; only Titan shares a tiktoken vocabulary
fn amazon_titan(ctx: &FactoryContext<'_>) -> TokenizerResult<TokenizerRef> {
    if ctx.model.contains("titan") {
        Ok(Arc::new(TiktokenTokenizer::with_encoding(
            TiktokenEncoding::R50kBase,
        )?))
    } else {
        Err(TokenizerError::PreciseTokenizerUnavailable {
            provider: ctx.provider.to_string(),
            model: ctx.model.to_string(),
        })
    }
}

fn huggingface_store(ctx: &FactoryContext<'_>) -> TokenizerResult<TokenizerRef> {
    Ok(Arc::new(HuggingFaceTokenizer::from_store(
        &ctx.config.huggingface_dir,
        ctx.provider,
        ctx.model,
    )?))
}

/// Registry resolving `(provider, model, tier)` to a tokenizer
pub struct TokenizerRegistry {
    config: TokenizerConfig,
    precise: BTreeMap<String, TokenizerFactory>,
    approximate_only: BTreeSet<String>,
    memo: DashMap<(String, String), TokenizerRef>,
}

impl TokenizerRegistry {
    /// Registry with no providers; use the `register_*` methods to populate it
    pub fn empty(config: TokenizerConfig) -> Self {
        Self {
            config,
            precise: BTreeMap::new(),
            approximate_only: BTreeSet::new(),
            memo: DashMap::new(),
        }
    }

    /// Registry populated with every built-in provider
    pub fn new(config: TokenizerConfig) -> Self {
        let mut registry = Self::empty(config);

        for provider in TIKTOKEN_PROVIDERS {
            registry.register_precise(provider, tiktoken_by_model);
        }
        registry.register_precise("qwen", tiktoken_cl100k);
        registry.register_precise("amazon", amazon_titan);
        for provider in HUGGINGFACE_PROVIDERS {
            registry.register_precise(provider, huggingface_store);
        }
        for provider in APPROXIMATE_ONLY_PROVIDERS {
            registry.register_approximate_only(provider);
        }

        registry
    }

    /// Register (or replace) the precise tokenizer factory for a provider
    pub fn register_precise(&mut self, provider: &str, factory: TokenizerFactory) {
        let key = normalize(provider);
        self.approximate_only.remove(&key);
        self.memo.retain(|(memo_provider, _), _| *memo_provider != key);
        self.precise.insert(key, factory);
    }

    /// Make a provider known for approximate counting only
    ///
    /// Does nothing if the provider already has a precise factory.
    pub fn register_approximate_only(&mut self, provider: &str) {
        let key = normalize(provider);
        if !self.precise.contains_key(&key) {
            self.approximate_only.insert(key);
        }
    }

    pub fn is_known(&self, provider: &str) -> bool {
        let key = normalize(provider);
        self.precise.contains_key(&key) || self.approximate_only.contains(&key)
    }

    /// Whether a precise factory is registered (the model may still lack one)
    pub fn has_precise(&self, provider: &str) -> bool {
        self.precise.contains_key(&normalize(provider))
    }

    /// All known providers in name order
    pub fn providers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .precise
            .keys()
            .chain(self.approximate_only.iter())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }

    pub const fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Resolve the tokenizer for `provider`/`model` at exactly `tier`
    ///
    /// Precise tokenizers are built once per model and shared. Approximate
    /// tokenizers are created fresh so their vocabularies stay request-local.
    ///
    /// # Errors
    /// - `UnknownProvider` if the provider is not registered
    /// - `PreciseTokenizerUnavailable` / `LoadFailed` if the precise tier cannot be served
    pub fn resolve(
        &self,
        provider: &str,
        model: &str,
        tier: TokenizerTier,
    ) -> TokenizerResult<TokenizerRef> {
        let key = normalize(provider);
        if !self.is_known(&key) {
            return Err(TokenizerError::UnknownProvider { provider: key });
        }

        match tier {
            TokenizerTier::Approximate => Ok(Arc::new(ApproximateTokenizer::new(
                self.config.chars_per_token,
            ))),
            TokenizerTier::Precise => self.resolve_precise(&key, model),
        }
    }

    fn resolve_precise(&self, provider: &str, model: &str) -> TokenizerResult<TokenizerRef> {
        let Some(factory) = self.precise.get(provider) else {
            return Err(TokenizerError::PreciseTokenizerUnavailable {
                provider: provider.to_string(),
                model: model.to_string(),
            });
        };

        let memo_key = (provider.to_string(), model.to_string());
        if let Some(existing) = self.memo.get(&memo_key) {
            return Ok(Arc::clone(existing.value()));
        }

        let tokenizer = factory(&FactoryContext {
            provider,
            model,
            config: &self.config,
        })?;
        debug!(provider, model, tokenizer = tokenizer.name(), "Built precise tokenizer");

        Ok(Arc::clone(
            self.memo.entry(memo_key).or_insert(tokenizer).value(),
        ))
    }
}

fn normalize(provider: &str) -> String {
    provider.trim().to_ascii_lowercase()
}
