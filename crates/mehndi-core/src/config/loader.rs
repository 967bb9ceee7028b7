//! Configuration loader for YAML files, URLs and environment overrides

use crate::config::types::CatalogConfig;
use crate::errors::CatalogError;
use std::env;
use std::path::Path;
use tokio::fs;

pub const IMAGES_URL_VAR: &str = "MEHNDI_IMAGES_URL";
pub const SERVICES_URL_VAR: &str = "MEHNDI_SERVICES_URL";
pub const ASSET_BASE_URL_VAR: &str = "MEHNDI_ASSET_BASE_URL";
pub const LOG_LEVEL_VAR: &str = "MEHNDI_LOG_LEVEL";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file path or an `http(s)://` URL.
    pub async fn from_source(source: &str) -> Result<CatalogConfig, CatalogError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::from_url(source).await
        } else {
            Self::from_file(source).await
        }
    }

    pub async fn from_url(url: &str) -> Result<CatalogConfig, CatalogError> {
        let response = reqwest::Client::new().get(url).send().await.map_err(|e| {
            CatalogError::Config(format!(
                "Failed to fetch configuration from URL {}: {}",
                url, e
            ))
        })?;

        if !response.status().is_success() {
            return Err(CatalogError::Config(format!(
                "Failed to fetch configuration: HTTP {} from URL {}",
                response.status(),
                url
            )));
        }

        let content = response.text().await.map_err(|e| {
            CatalogError::Config(format!(
                "Failed to read configuration response from URL {}: {}",
                url, e
            ))
        })?;

        Self::from_str(&content)
    }

    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<CatalogConfig, CatalogError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            CatalogError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Self::from_str(&content)
    }

    /// Parse YAML, apply environment overrides, then validate.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<CatalogConfig, CatalogError> {
        let mut config: CatalogConfig = serde_yaml::from_str(content)
            .map_err(|e| CatalogError::Config(format!("Failed to parse YAML config: {}", e)))?;

        Self::apply_overrides(&mut config, |name| env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlay the `MEHNDI_*` variables returned by `lookup` onto `config`.
    ///
    /// Empty values are ignored.
    pub fn apply_overrides<F>(config: &mut CatalogConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup(IMAGES_URL_VAR) {
            log::info!("Images endpoint overridden by {}", IMAGES_URL_VAR);
            config.endpoints.images = url;
        }
        if let Some(url) = lookup(SERVICES_URL_VAR) {
            log::info!("Services endpoint overridden by {}", SERVICES_URL_VAR);
            config.endpoints.services = url;
        }
        if let Some(url) = lookup(ASSET_BASE_URL_VAR) {
            config.assets.base_url = url;
        }
        if let Some(level) = lookup(LOG_LEVEL_VAR) {
            config.logging.level = level;
        }
    }
}
