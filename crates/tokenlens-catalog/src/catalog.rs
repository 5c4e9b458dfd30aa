//! Provider tables and lookup

use crate::error::{CatalogError, CatalogResult};
use crate::limits::{ContentType, ModelLimits};
use crate::resolution::Resolution;
use crate::tables::BUILTIN_TABLES;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// One provider's limit table, as written in a `<provider>.toml` file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderTable {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub models: BTreeMap<String, ModelLimits>,
}

impl ProviderTable {
    /// Parse and validate a table; `origin` names the source in errors
    ///
    /// # Errors
    /// Returns `CatalogError::InvalidTable` if the TOML is malformed or a model
    /// declares limits that cannot be checked
    pub fn from_toml_str(source: &str, origin: &str) -> CatalogResult<Self> {
        let mut table: Self =
            toml::from_str(source).map_err(|e| CatalogError::invalid_table(origin, e))?;

        table.provider = normalize(&table.provider);
        if table.provider.is_empty() {
            return Err(CatalogError::invalid_table(origin, "provider name is empty"));
        }
        table.aliases = table.aliases.iter().map(|alias| normalize(alias)).collect();
        // '.' separates provider from model in the dotted form
        if table.provider.contains('.') {
            return Err(CatalogError::invalid_table(
                origin,
                format!("provider name '{}' must not contain '.'", table.provider),
            ));
        }

        for (name, limits) in &table.models {
            validate_model(origin, name, limits)?;
        }
        Ok(table)
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.provider)
    }

    /// Content types offered by this provider, without duplicates
    pub fn content_types(&self) -> Vec<ContentType> {
        let mut types: Vec<ContentType> = self
            .models
            .values()
            .map(|limits| limits.content_type)
            .collect();
        types.sort_unstable();
        types.dedup();
        types
    }
}

fn validate_model(origin: &str, name: &str, limits: &ModelLimits) -> CatalogResult<()> {
    let invalid = |message: String| CatalogError::invalid_table(origin, format!("{name}: {message}"));

    if limits.content_type.is_token_limited() && !limits.token_limit.is_some_and(|limit| limit > 0) {
        return Err(invalid(format!(
            "{} models need a positive token_limit",
            limits.content_type
        )));
    }
    limits
        .parsed_max_resolution()
        .map_err(|e| invalid(e.to_string()))?;
    for resolution in &limits.supported_resolutions {
        resolution
            .parse::<Resolution>()
            .map_err(|e| invalid(e.to_string()))?;
    }
    if limits.max_duration.is_some_and(|seconds| seconds.is_nan() || seconds <= 0.0) {
        return Err(invalid("max_duration must be positive".to_string()));
    }
    Ok(())
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Model limit catalog across every provider
///
/// Provider names are case-insensitive. Aliases and the dotted form
/// (`openai.gpt-4`) resolve to the base provider.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    providers: BTreeMap<String, ProviderTable>,
    aliases: HashMap<String, String>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog built from the tables compiled into this crate
    ///
    /// # Errors
    /// Returns `CatalogError::InvalidTable` if an embedded table is broken
    pub fn builtin() -> CatalogResult<Self> {
        let mut catalog = Self::empty();
        for (name, source) in BUILTIN_TABLES {
            let table = ProviderTable::from_toml_str(source, &format!("builtin:{name}"))?;
            catalog.insert_table(table)?;
        }
        debug!(providers = catalog.providers.len(), "Loaded builtin catalog");
        Ok(catalog)
    }

    /// Merge a table into the catalog
    ///
    /// A new provider is added as-is. For a known provider, each model in
    /// `table` replaces the model of the same name and aliases accumulate.
    ///
    /// # Errors
    /// Returns `CatalogError::InvalidTable` if an alias already belongs to another provider
    pub fn insert_table(&mut self, table: ProviderTable) -> CatalogResult<()> {
        let provider = table.provider.clone();
        for alias in &table.aliases {
            let owner = self
                .aliases
                .get(alias)
                .map(String::as_str)
                .or_else(|| self.providers.contains_key(alias).then_some(alias.as_str()));
            if let Some(owner) = owner.filter(|owner| *owner != provider) {
                return Err(CatalogError::invalid_table(
                    &provider,
                    format!("alias '{alias}' already refers to '{owner}'"),
                ));
            }
        }

        for alias in &table.aliases {
            self.aliases.insert(alias.clone(), provider.clone());
        }

        match self.providers.get_mut(&provider) {
            Some(existing) => {
                if table.display_name.is_some() {
                    existing.display_name = table.display_name;
                }
                for alias in table.aliases {
                    if !existing.aliases.contains(&alias) {
                        existing.aliases.push(alias);
                    }
                }
                existing.models.extend(table.models);
            }
            None => {
                self.providers.insert(provider, table);
            }
        }
        Ok(())
    }

    /// Merge every `*.toml` table found directly in `dir`, in file name order
    ///
    /// # Errors
    /// Returns `CatalogError::Io` if the directory cannot be read and
    /// `CatalogError::InvalidTable` for a broken table
    pub fn with_overrides_from_dir(mut self, dir: &Path) -> CatalogResult<Self> {
        let read_error = |e: std::io::Error| CatalogError::Io(format!("{}: {e}", dir.display()));

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(read_error)? {
            let path = entry.map_err(read_error)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let source = std::fs::read_to_string(path)
                .map_err(|e| CatalogError::Io(format!("{}: {e}", path.display())))?;
            let table = ProviderTable::from_toml_str(&source, &path.display().to_string())?;
            debug!(
                path = %path.display(),
                provider = %table.provider,
                models = table.models.len(),
                "Applying catalog override"
            );
            self.insert_table(table)?;
        }

        info!(dir = %dir.display(), tables = paths.len(), "Catalog overrides applied");
        Ok(self)
    }

    /// Canonical provider name for `name`
    ///
    /// # Errors
    /// Returns `CatalogError::UnsupportedProvider` if nothing matches
    pub fn resolve_provider(&self, name: &str) -> CatalogResult<&str> {
        let normalized = normalize(name);
        let base = normalized.split('.').next().unwrap_or_default();

        [normalized.as_str(), base]
            .into_iter()
            .find_map(|candidate| {
                self.providers
                    .get_key_value(candidate)
                    .map(|(key, _)| key.as_str())
                    .or_else(|| self.aliases.get(candidate).map(String::as_str))
            })
            .ok_or_else(|| CatalogError::unsupported_provider(name.trim()))
    }

    /// # Errors
    /// Returns `CatalogError::UnsupportedProvider` if nothing matches
    pub fn provider(&self, name: &str) -> CatalogResult<&ProviderTable> {
        let canonical = self.resolve_provider(name)?;
        self.providers
            .get(canonical)
            .ok_or_else(|| CatalogError::unsupported_provider(canonical))
    }

    /// Limits for one model; exact names win over case-insensitive matches
    ///
    /// # Errors
    /// Returns `UnsupportedProvider` or `ModelNotFound`
    pub fn model(&self, provider: &str, model: &str) -> CatalogResult<&ModelLimits> {
        self.resolve_model(provider, model).map(|(_, limits)| limits)
    }

    /// The catalog's own spelling of `model` together with its limits
    ///
    /// Callers that key anything on the model name (tokenizer choice, store
    /// paths, reports) use the returned name, never the caller's spelling.
    ///
    /// # Errors
    /// Returns `UnsupportedProvider` or `ModelNotFound`
    pub fn resolve_model(
        &self,
        provider: &str,
        model: &str,
    ) -> CatalogResult<(&str, &ModelLimits)> {
        let table = self.provider(provider)?;
        let model = model.trim();
        table
            .models
            .get_key_value(model)
            .or_else(|| {
                table
                    .models
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(model))
            })
            .map(|(name, limits)| (name.as_str(), limits))
            .ok_or_else(|| CatalogError::model_not_found(&table.provider, model))
    }

    /// All providers in name order
    pub fn providers(&self) -> impl Iterator<Item = &ProviderTable> {
        self.providers.values()
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Models of `provider`, optionally restricted to one content type
    ///
    /// # Errors
    /// Returns `CatalogError::UnsupportedProvider` if nothing matches
    pub fn models_by_type(
        &self,
        provider: &str,
        content_type: Option<ContentType>,
    ) -> CatalogResult<Vec<(&str, &ModelLimits)>> {
        let table = self.provider(provider)?;
        Ok(table
            .models
            .iter()
            .filter(|(_, limits)| content_type.is_none_or(|kind| limits.content_type == kind))
            .map(|(name, limits)| (name.as_str(), limits))
            .collect())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const ACME: &str = r#"
provider = "Acme"
display_name = "Acme AI"
aliases = ["acme-ai"]

[models."acme-1"]
type = "text"
token_limit = 1000

[models."acme-paint"]
type = "image"
max_resolution = "512x512"
supported_formats = ["png"]
"#;

    fn acme() -> Catalog {
        let mut catalog = Catalog::empty();
        catalog
            .insert_table(ProviderTable::from_toml_str(ACME, "acme.toml").unwrap())
            .unwrap();
        catalog
    }

    #[test]
    fn test_provider_resolution_forms() {
        let catalog = acme();
        assert_eq!(catalog.resolve_provider("acme").unwrap(), "acme");
        assert_eq!(catalog.resolve_provider(" ACME ").unwrap(), "acme");
        assert_eq!(catalog.resolve_provider("acme-ai").unwrap(), "acme");
        assert_eq!(catalog.resolve_provider("acme.acme-1").unwrap(), "acme");
        assert_eq!(catalog.resolve_provider("acme-ai.acme-1").unwrap(), "acme");
        assert!(matches!(
            catalog.resolve_provider("globex"),
            Err(CatalogError::UnsupportedProvider { .. })
        ));
    }

    #[test]
    fn test_model_lookup() {
        let catalog = acme();
        assert_eq!(catalog.model("acme", "acme-1").unwrap().token_limit, Some(1000));
        assert_eq!(catalog.model("acme", "ACME-1").unwrap().token_limit, Some(1000));
        let (name, _) = catalog.resolve_model("ACME", " Acme-1 ").unwrap();
        assert_eq!(name, "acme-1");
        assert!(matches!(
            catalog.model("acme", "acme-2"),
            Err(CatalogError::ModelNotFound { .. })
        ));
    }

    #[test]
    fn test_models_by_type() {
        let catalog = acme();
        let images = catalog
            .models_by_type("acme", Some(ContentType::Image))
            .unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].0, "acme-paint");
        assert_eq!(catalog.models_by_type("acme", None).unwrap().len(), 2);

        let table = catalog.provider("acme").unwrap();
        assert_eq!(table.display_name(), "Acme AI");
        assert_eq!(table.content_types(), vec![ContentType::Text, ContentType::Image]);
    }

    #[test]
    fn test_text_model_without_token_limit_is_rejected() {
        let source = r#"
provider = "broken"
[models.m]
type = "text"
"#;
        let err = ProviderTable::from_toml_str(source, "broken.toml").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidTable { .. }));
        assert!(err.to_string().contains("token_limit"));
    }

    #[test]
    fn test_bad_resolution_is_rejected() {
        let source = r#"
provider = "broken"
[models.m]
type = "image"
max_resolution = "huge"
"#;
        assert!(ProviderTable::from_toml_str(source, "broken.toml").is_err());
    }

    #[test]
    fn test_alias_conflict_is_rejected() {
        let mut catalog = acme();
        let other = ProviderTable::from_toml_str(
            "provider = \"globex\"\naliases = [\"acme-ai\"]\n",
            "globex.toml",
        )
        .unwrap();
        assert!(catalog.insert_table(other).is_err());
    }

    #[test]
    fn test_merge_replaces_single_models() {
        let mut catalog = acme();
        let patch = ProviderTable::from_toml_str(
            "provider = \"acme\"\n[models.\"acme-1\"]\ntype = \"text\"\ntoken_limit = 4000\n",
            "patch.toml",
        )
        .unwrap();
        catalog.insert_table(patch).unwrap();

        assert_eq!(catalog.model("acme", "acme-1").unwrap().token_limit, Some(4000));
        assert!(catalog.model("acme", "acme-paint").is_ok());
        assert_eq!(catalog.provider("acme").unwrap().display_name(), "Acme AI");
    }
}
