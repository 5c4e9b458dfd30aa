//! Local tokenizer store tests
//!
//! Builds a tiny WordLevel `tokenizer.json` on disk so the HuggingFace backend
//! and the registry can be exercised without network access.

use std::path::Path;
use tokenlens_config::TokenizerConfig;
use tokenlens_tokenizers::{
    HuggingFaceTokenizer, Tokenizer, TokenizerError, TokenizerRegistry, TokenizerTier,
    tokenizer_path,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const WORD_LEVEL_TOKENIZER: &str = r#"{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [],
  "normalizer": null,
  "pre_tokenizer": { "type": "Whitespace" },
  "post_processor": null,
  "decoder": null,
  "model": {
    "type": "WordLevel",
    "vocab": { "[UNK]": 0, "hello": 1, "world": 2, "limits": 3, "check": 4 },
    "unk_token": "[UNK]"
  }
}"#;

fn store_tokenizer(root: &Path, provider: &str, model: &str) -> TestResult {
    let path = tokenizer_path(root, provider, model)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, WORD_LEVEL_TOKENIZER)?;
    Ok(())
}

#[test]
fn test_huggingface_tokenizer_encodes_and_decodes_from_store() -> TestResult {
    let dir = tempfile::tempdir()?;
    store_tokenizer(dir.path(), "huggingface", "tiny-words")?;

    let tokenizer = HuggingFaceTokenizer::from_store(dir.path(), "huggingface", "tiny-words")?;
    let tokens = tokenizer.encode("hello world check")?;
    assert_eq!(tokens, vec![1, 2, 4]);

    let prefix = tokenizer.decode(&tokens[..2])?;
    assert_eq!(prefix, "hello world");
    Ok(())
}

#[test]
fn test_registry_serves_stored_tokenizer_and_picks_up_new_files() -> TestResult {
    let dir = tempfile::tempdir()?;
    let registry = TokenizerRegistry::new(TokenizerConfig {
        huggingface_dir: dir.path().to_path_buf(),
        ..TokenizerConfig::default()
    });

    let missing = registry.resolve("mistral", "mistral-tiny", TokenizerTier::Precise);
    assert!(matches!(missing, Err(TokenizerError::LoadFailed { .. })));

    store_tokenizer(dir.path(), "mistral", "mistral-tiny")?;
    let tokenizer = registry.resolve("mistral", "mistral-tiny", TokenizerTier::Precise)?;
    assert_eq!(tokenizer.name(), "huggingface/mistral/mistral-tiny");
    assert_eq!(tokenizer.count("limits check")?, 2);
    Ok(())
}
