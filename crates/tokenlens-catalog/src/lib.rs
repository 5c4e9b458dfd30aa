//! Model limit catalog for tokenlens
//!
//! Static, per-provider tables of model limits (token counts, resolutions,
//! durations, script lengths). The built-in tables are TOML files compiled
//! into the crate; deployments can merge their own from a directory.

pub mod catalog;
pub mod error;
pub mod limits;
pub mod resolution;
mod tables;

pub use catalog::{Catalog, ProviderTable};
pub use error::{CatalogError, CatalogResult};
pub use limits::{ContentType, ModelLimits, ParseContentTypeError};
pub use resolution::{ParseResolutionError, Resolution};
pub use tables::builtin_provider_names;
