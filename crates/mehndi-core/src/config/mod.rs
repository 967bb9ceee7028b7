//! Catalog configuration
//!
//! YAML configuration naming the catalog endpoints plus the gallery and
//! services presentation settings, with `MEHNDI_*` environment overrides.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;


use crate::errors::CatalogError;
use std::path::Path;

/// Load a configuration from a YAML file
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<CatalogConfig, CatalogError> {
    ConfigLoader::from_file(path).await
}
