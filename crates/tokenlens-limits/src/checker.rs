//! Limit checking against the model catalog

use crate::error::{LimitError, LimitResult};
use crate::media::{
    AvatarRequest, ContentRequest, ImageRequest, VideoRequest, VoiceRequest, validate_avatar,
    validate_image, validate_video, validate_voice,
};
use crate::planner::{PlanError, plan_token_batches};
use crate::report::{CheckReport, LimitCheckResult, MediaCheckResult, ProviderSummary, Violation};
use tokenlens_catalog::{Catalog, ContentType, ModelLimits};
use tokenlens_common::TokenizerTier;
use tokenlens_config::{ApplicationConfig, LimitsConfig};
use tokenlens_tokenizers::TokenizerRegistry;
use tracing::{debug, info};

/// Per-request options for token-limit checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextCheckOptions {
    /// Tokenizer tier; the configured default when absent
    pub tier: Option<TokenizerTier>,
    /// Batch size for the split plan; must be at least 1
    pub batch_size: Option<usize>,
}

impl TextCheckOptions {
    pub const fn with_tier(mut self, tier: TokenizerTier) -> Self {
        self.tier = Some(tier);
        self
    }

    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}

/// Checks requests against the catalog's declared limits
///
/// Shared behind an `Arc`; every check is synchronous and CPU-bound.
pub struct LimitChecker {
    catalog: Catalog,
    registry: TokenizerRegistry,
    config: LimitsConfig,
}

impl LimitChecker {
    /// Catalog providers the registry does not know are registered for
    /// approximate counting, so every catalog provider can be checked.
    pub fn new(catalog: Catalog, mut registry: TokenizerRegistry, config: LimitsConfig) -> Self {
        for provider in catalog.provider_names() {
            if !registry.is_known(provider) {
                debug!(provider, "Registering catalog provider for approximate counting");
                registry.register_approximate_only(provider);
            }
        }
        Self {
            catalog,
            registry,
            config,
        }
    }

    /// Built-in catalog plus configured overrides, and the built-in registry
    ///
    /// # Errors
    /// Returns `LimitError::Catalog` if the catalog or its overrides fail to load
    pub fn from_config(config: &ApplicationConfig) -> LimitResult<Self> {
        let mut catalog = Catalog::builtin()?;
        if let Some(dir) = &config.catalog.overrides_dir {
            catalog = catalog.with_overrides_from_dir(dir)?;
        }
        let registry = TokenizerRegistry::new(config.tokenizer.clone());
        Ok(Self::new(catalog, registry, config.limits.clone()))
    }

    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub const fn registry(&self) -> &TokenizerRegistry {
        &self.registry
    }

    /// Count `text` in tokens and, when it is over the limit, plan a split
    ///
    /// # Errors
    /// - `Catalog` for an unknown provider or model
    /// - `UnsupportedContentType` if the model is not token-limited
    /// - `Tokenizer` if the tier cannot be served or encoding fails
    /// - `Plan` for an invalid batch size or a failed split
    /// - `TooManyBatches` when the split would exceed `max_batches`
    pub fn check_text(
        &self,
        provider: &str,
        model: &str,
        text: &str,
        options: &TextCheckOptions,
    ) -> LimitResult<LimitCheckResult> {
        if let Some(batch_size @ 0) = options.batch_size {
            return Err(PlanError::InvalidBatchSize { batch_size }.into());
        }

        let provider = self.catalog.resolve_provider(provider)?;
        let (model, limits) = self.catalog.resolve_model(provider, model)?;
        let token_limit = match limits.token_limit {
            Some(limit) if limits.content_type.is_token_limited() => limit,
            _ => {
                return Err(unsupported(provider, model, ContentType::Text, limits));
            }
        };

        let tier = options.tier.unwrap_or(self.config.default_tier);
        let tokenizer = self.registry.resolve(provider, model, tier)?;
        let tokens = tokenizer.encode(text)?;
        let total_tokens = tokens.len();
        let is_within_limit = total_tokens <= token_limit;

        let (recommended_batch_size, batches) = if is_within_limit {
            (None, None)
        } else {
            let batch_size = self.batch_size(limits, token_limit, options.batch_size);
            self.ensure_plannable(total_tokens, batch_size)?;
            let batches = plan_token_batches(&tokens, tokenizer.as_ref(), batch_size)?;
            (Some(batch_size), Some(batches))
        };

        info!(
            provider,
            model,
            tokenizer = tokenizer.name(),
            %tier,
            total_tokens,
            token_limit,
            is_within_limit,
            batches = batches.as_ref().map_or(0, Vec::len),
            "Checked text limits"
        );

        Ok(LimitCheckResult {
            provider: provider.to_string(),
            model: model.to_string(),
            tokenizer: tokenizer.name().to_string(),
            tier,
            total_tokens,
            is_within_limit,
            model_max_tokens: token_limit,
            recommended_batch_size,
            batches,
            model_additional_constraints: limits.additional_constraints.clone(),
        })
    }

    /// Caller override, else the model's own `batch_size` constraint when it
    /// is below the limit, else `token_limit / batch_divisor`; never below one
    fn batch_size(&self, limits: &ModelLimits, token_limit: usize, requested: Option<usize>) -> usize {
        requested
            .or_else(|| {
                limits
                    .constraint_usize("batch_size")
                    .filter(|&size| size < token_limit)
            })
            .unwrap_or_else(|| {
                token_limit
                    .checked_div(self.config.batch_divisor)
                    .unwrap_or(token_limit)
            })
            .max(1)
    }

    /// Each batch costs one prefix decode, so the batch count bounds the work
    fn ensure_plannable(&self, total_tokens: usize, batch_size: usize) -> LimitResult<()> {
        let batches = total_tokens.div_ceil(batch_size);
        if batches > self.config.max_batches {
            return Err(LimitError::TooManyBatches {
                total_tokens,
                batch_size,
                batches,
                max_batches: self.config.max_batches,
            });
        }
        Ok(())
    }

    /// # Errors
    /// `Catalog` for unknown names, `UnsupportedContentType` for a non-image model
    pub fn check_image(
        &self,
        provider: &str,
        model: &str,
        request: &ImageRequest,
    ) -> LimitResult<MediaCheckResult> {
        self.check_media(provider, model, ContentType::Image, |limits| {
            validate_image(limits, request)
        })
    }

    /// # Errors
    /// `Catalog` for unknown names, `UnsupportedContentType` for a non-video model
    pub fn check_video(
        &self,
        provider: &str,
        model: &str,
        request: &VideoRequest,
    ) -> LimitResult<MediaCheckResult> {
        self.check_media(provider, model, ContentType::Video, |limits| {
            validate_video(limits, request)
        })
    }

    /// # Errors
    /// `Catalog` for unknown names, `UnsupportedContentType` for a non-voice model
    pub fn check_voice(
        &self,
        provider: &str,
        model: &str,
        request: &VoiceRequest,
    ) -> LimitResult<MediaCheckResult> {
        self.check_media(provider, model, ContentType::Voice, |limits| {
            validate_voice(limits, request)
        })
    }

    /// # Errors
    /// `Catalog` for unknown names, `UnsupportedContentType` for a non-avatar model
    pub fn check_avatar(
        &self,
        provider: &str,
        model: &str,
        request: &AvatarRequest,
    ) -> LimitResult<MediaCheckResult> {
        self.check_media(provider, model, ContentType::Avatar, |limits| {
            validate_avatar(limits, request)
        })
    }

    fn check_media<F>(
        &self,
        provider: &str,
        model: &str,
        expected: ContentType,
        validate: F,
    ) -> LimitResult<MediaCheckResult>
    where
        F: FnOnce(&ModelLimits) -> Vec<Violation>,
    {
        let provider = self.catalog.resolve_provider(provider)?;
        let (model, limits) = self.catalog.resolve_model(provider, model)?;
        if limits.content_type != expected {
            return Err(unsupported(provider, model, expected, limits));
        }

        let violations = validate(limits);
        info!(
            provider,
            model,
            content_type = %expected,
            violations = violations.len(),
            "Checked media limits"
        );

        Ok(MediaCheckResult {
            provider: provider.to_string(),
            model: model.to_string(),
            content_type: expected,
            is_within_limit: violations.is_empty(),
            violations,
            limits: limits.clone(),
        })
    }

    /// Check any request kind; the model must accept that kind
    ///
    /// # Errors
    /// Whatever the kind-specific check returns
    pub fn check(
        &self,
        provider: &str,
        model: &str,
        request: &ContentRequest,
        options: &TextCheckOptions,
    ) -> LimitResult<CheckReport> {
        match request {
            ContentRequest::Text(text) => self
                .check_text(provider, model, text, options)
                .map(CheckReport::Text),
            ContentRequest::Image(image) => self
                .check_image(provider, model, image)
                .map(CheckReport::Media),
            ContentRequest::Video(video) => self
                .check_video(provider, model, video)
                .map(CheckReport::Media),
            ContentRequest::Voice(voice) => self
                .check_voice(provider, model, voice)
                .map(CheckReport::Media),
            ContentRequest::Avatar(avatar) => self
                .check_avatar(provider, model, avatar)
                .map(CheckReport::Media),
        }
    }

    /// One summary per catalog provider, in name order
    pub fn provider_summaries(&self) -> Vec<ProviderSummary> {
        self.catalog
            .providers()
            .map(|table| ProviderSummary {
                name: table.provider.clone(),
                display_name: table.display_name().to_string(),
                aliases: table.aliases.clone(),
                content_types: table.content_types(),
                model_count: table.models.len(),
                precise_tokenizer: self.registry.has_precise(&table.provider),
            })
            .collect()
    }
}

fn unsupported(
    provider: &str,
    model: &str,
    expected: ContentType,
    limits: &ModelLimits,
) -> LimitError {
    LimitError::UnsupportedContentType {
        provider: provider.to_string(),
        model: model.to_string(),
        expected: expected.to_string(),
        actual: limits.content_type,
    }
}
