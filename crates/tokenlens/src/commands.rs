//! Subcommand implementations
//!
//! Each command writes its result to `out`; logs go to stderr through tracing.

use crate::cli::{CheckArgs, FetchTokenizerArgs, ModelsArgs, OutputArgs, ServeArgs};
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::io::{Read, Write};
use tokenlens_api::AppState;
use tokenlens_catalog::ModelLimits;
use tokenlens_common::TokenizerTier;
use tokenlens_config::{ApplicationConfig, Validate};
use tokenlens_limits::{
    CheckReport, ContentRequest, LimitCheckResult, LimitChecker, LimitError, MediaCheckResult,
    ProviderSummary, TextCheckOptions,
};
use tracing::info;

/// `tokenlens check`; an over-limit result is still a success
///
/// # Errors
/// Unreadable input, malformed `--content`, or any checker error
pub fn check(
    checker: &LimitChecker,
    args: &CheckArgs,
    stdin: impl Read,
    out: &mut impl Write,
) -> Result<()> {
    let content = read_content(args, stdin)?;
    let request = ContentRequest::from_parts(args.content_type, content)?;

    let mut options = TextCheckOptions::default();
    if args.approximate {
        options = options.with_tier(TokenizerTier::Approximate);
    }
    if let Some(batch_size) = args.batch_size {
        options = options.with_batch_size(batch_size);
    }

    let report = checker
        .check(&args.provider, &args.model, &request, &options)
        .map_err(|e| match &e {
            LimitError::Tokenizer(tokenizer) if tokenizer.is_tier_unavailable() => {
                anyhow::Error::new(e).context("Precise counting failed; rerun with --approximate")
            }
            _ => e.into(),
        })?;
    if args.output.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }
    match &report {
        CheckReport::Text(result) => write_text_result(out, result)?,
        CheckReport::Media(result) => write_media_result(out, result)?,
    }
    Ok(())
}

fn read_content(args: &CheckArgs, mut stdin: impl Read) -> Result<Value> {
    if let Some(raw) = &args.content {
        return serde_json::from_str(raw).context("--content is not valid JSON");
    }
    if let Some(text) = &args.text {
        return Ok(Value::String(text.clone()));
    }
    if let Some(path) = &args.file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        return Ok(Value::String(text));
    }

    let mut text = String::new();
    stdin
        .read_to_string(&mut text)
        .context("Failed to read text from stdin")?;
    Ok(Value::String(text))
}

fn write_text_result(out: &mut impl Write, result: &LimitCheckResult) -> std::io::Result<()> {
    writeln!(out, "{}/{}", result.provider, result.model)?;
    writeln!(out, "  tokenizer: {} ({})", result.tokenizer, result.tier)?;
    writeln!(
        out,
        "  tokens:    {} / {}",
        result.total_tokens, result.model_max_tokens
    )?;
    writeln!(out, "  within limit: {}", yes_no(result.is_within_limit))?;

    if let Some(batch_size) = result.recommended_batch_size {
        writeln!(out, "  recommended batch size: {batch_size}")?;
    }
    for batch in result.batches.iter().flatten() {
        writeln!(
            out,
            "    batch {:>3}: {:>6} tokens, chars {}..{}",
            batch.index, batch.token_count, batch.start_char, batch.end_char
        )?;
    }
    Ok(())
}

fn write_media_result(out: &mut impl Write, result: &MediaCheckResult) -> std::io::Result<()> {
    writeln!(
        out,
        "{}/{} ({})",
        result.provider, result.model, result.content_type
    )?;
    writeln!(out, "  within limit: {}", yes_no(result.is_within_limit))?;
    for violation in &result.violations {
        writeln!(out, "  - {}: {}", violation.field, violation.message)?;
    }
    Ok(())
}

const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// `tokenlens models`
///
/// # Errors
/// Unknown provider
pub fn models(checker: &LimitChecker, args: &ModelsArgs, out: &mut impl Write) -> Result<()> {
    let catalog = checker.catalog();
    let provider = catalog.resolve_provider(&args.provider)?;
    let models = catalog.models_by_type(provider, args.content_type)?;

    if args.output.json {
        let map: serde_json::Map<String, Value> = models
            .iter()
            .map(|(name, limits)| Ok(((*name).to_string(), serde_json::to_value(limits)?)))
            .collect::<serde_json::Result<_>>()?;
        writeln!(out, "{}", serde_json::to_string_pretty(&map)?)?;
        return Ok(());
    }

    let width = models.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, limits) in models {
        writeln!(
            out,
            "{name:<width$}  {:<9}  {}",
            limits.content_type.as_str(),
            describe_limits(limits)
        )?;
    }
    Ok(())
}

fn describe_limits(limits: &ModelLimits) -> String {
    let mut parts = Vec::new();
    if let Some(tokens) = limits.token_limit {
        parts.push(format!("{tokens} tokens"));
    }
    if let Some(max_output) = limits.max_output_tokens {
        parts.push(format!("{max_output} output tokens"));
    }
    if let Some(resolution) = &limits.max_resolution {
        parts.push(format!("max {resolution}"));
    }
    if !limits.supported_resolutions.is_empty() {
        parts.push(limits.supported_resolutions.join("/"));
    }
    if let Some(duration) = limits.max_duration {
        parts.push(format!("{duration}s"));
    }
    if let Some(chars) = limits.max_script_chars {
        parts.push(format!("{chars} script chars"));
    }
    if let Some(chars) = limits.max_text_length {
        parts.push(format!("{chars} text chars"));
    }
    if let Some(size) = limits.max_file_size_mb {
        parts.push(format!("{size} MB"));
    }
    if !limits.supported_formats.is_empty() {
        parts.push(format!("formats: {}", limits.supported_formats.join(", ")));
    }
    parts.join(", ")
}

/// `tokenlens providers`
///
/// # Errors
/// Only output failures
pub fn providers(checker: &LimitChecker, output: OutputArgs, out: &mut impl Write) -> Result<()> {
    let summaries = checker.provider_summaries();
    if output.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&summaries)?)?;
        return Ok(());
    }
    for summary in &summaries {
        writeln!(out, "{}", describe_provider(summary))?;
    }
    Ok(())
}

fn describe_provider(summary: &ProviderSummary) -> String {
    let types: Vec<&str> = summary.content_types.iter().map(|t| t.as_str()).collect();
    let tier = if summary.precise_tokenizer {
        "precise"
    } else {
        "approximate"
    };
    let mut line = format!(
        "{:<12} {:<24} {:>2} models  [{}]  {tier}",
        summary.name,
        summary.display_name,
        summary.model_count,
        types.join(", ")
    );
    if !summary.aliases.is_empty() {
        line.push_str(&format!("  (aka {})", summary.aliases.join(", ")));
    }
    line
}

/// `tokenlens serve`
///
/// # Errors
/// Invalid overrides, catalog load failures, or bind errors
pub async fn serve(mut config: ApplicationConfig, args: &ServeArgs) -> Result<()> {
    if let Some(host) = &args.host {
        config.api.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    config.validate()?;

    let state = AppState::from_config(&config)?;
    info!(
        address = %config.api.bind_address(),
        providers = state.checker.catalog().len(),
        "Starting Tokenlens API server"
    );
    tokenlens_api::serve(state).await?;
    Ok(())
}

/// `tokenlens fetch-tokenizer`
///
/// # Errors
/// Unknown provider or model, no repository to fetch from, or a failed download
pub async fn fetch_tokenizer(
    checker: &LimitChecker,
    args: &FetchTokenizerArgs,
    out: &mut impl Write,
) -> Result<()> {
    let catalog = checker.catalog();
    let provider = catalog.resolve_provider(&args.provider)?;
    // Store under the catalog's spelling so checks find the file
    let (model, repo) = match (catalog.resolve_model(provider, &args.model), &args.repo) {
        (Ok((model, _)), Some(repo)) => (model, repo.clone()),
        (Ok((model, limits)), None) => match &limits.tokenizer_repo {
            Some(repo) => (model, repo.clone()),
            None => bail!("{provider}/{model} has no tokenizer_repo in the catalog; pass --repo"),
        },
        (Err(_), Some(repo)) => (args.model.trim(), repo.clone()),
        (Err(e), None) => return Err(e.into()),
    };

    let tokenizer_config = checker.registry().config();
    let path = tokenlens_tokenizers::download_tokenizer(tokenizer_config, provider, model, &repo)
        .await
        .with_context(|| format!("Failed to fetch the tokenizer for {provider}/{model}"))?;
    writeln!(out, "{}", path.display())?;
    Ok(())
}
