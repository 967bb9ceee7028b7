//! Configuration type definitions
//!
//! Only `endpoints` is required; every other section falls back to the
//! defaults the site ships with, so a minimal YAML file names the two sheet
//! URLs and nothing else.

use crate::errors::CatalogError;
use crate::records::{normalize_key, CatalogKind, ALL_CATEGORIES};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub gallery: GalleryConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where each catalog kind is published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub images: String,
    pub services: String,
}

impl EndpointConfig {
    pub fn url_for(&self, kind: CatalogKind) -> &str {
        match kind {
            CatalogKind::Images => &self.images,
            CatalogKind::Services => &self.services,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Base URL that relative image references are resolved against.
    #[serde(default = "default_asset_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryConfig {
    #[serde(default = "default_gallery_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_carousel_size")]
    pub carousel_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "default_service_types")]
    pub types: Vec<String>,
    #[serde(default)]
    pub default_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("mehndi-catalog/{}", env!("CARGO_PKG_VERSION"))
}

fn default_asset_base_url() -> String {
    "http://localhost/".to_string()
}

fn default_page_size() -> usize {
    12
}

fn default_carousel_size() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_gallery_categories() -> Vec<String> {
    ["bridal", "baby_shower", "engagement", "arabic", "traditional", "leg", "party"]
        .iter()
        .map(|key| key.to_string())
        .collect()
}

fn default_service_types() -> Vec<String> {
    ["bridal", "arabic", "traditional", "baby_shower", "engagement"]
        .iter()
        .map(|key| key.to_string())
        .collect()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            base_url: default_asset_base_url(),
        }
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            categories: default_gallery_categories(),
            page_size: default_page_size(),
            carousel_size: default_carousel_size(),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            types: default_service_types(),
            default_type: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServicesConfig {
    /// Tab shown first: `default_type`, else the first configured type.
    pub fn default_tab(&self) -> String {
        self.default_type
            .as_deref()
            .or_else(|| self.types.first().map(String::as_str))
            .map(normalize_key)
            .unwrap_or_default()
    }

    pub fn tabs(&self) -> Vec<String> {
        self.types.iter().map(|key| normalize_key(key)).collect()
    }
}

impl CatalogConfig {
    /// Config with default sections for the given endpoints.
    pub fn new(images: impl Into<String>, services: impl Into<String>) -> Self {
        Self {
            endpoints: EndpointConfig {
                images: images.into(),
                services: services.into(),
            },
            http: HttpConfig::default(),
            assets: AssetConfig::default(),
            gallery: GalleryConfig::default(),
            services: ServicesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Gallery tabs: the `"all"` sentinel followed by the configured categories.
    pub fn gallery_tabs(&self) -> Vec<String> {
        std::iter::once(ALL_CATEGORIES.to_string())
            .chain(self.gallery.categories.iter().map(|key| normalize_key(key)))
            .collect()
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        validate_endpoint("endpoints.images", &self.endpoints.images)?;
        validate_endpoint("endpoints.services", &self.endpoints.services)?;

        if Url::parse(&self.assets.base_url)
            .map(|url| url.cannot_be_a_base())
            .unwrap_or(true)
        {
            return Err(CatalogError::Config(format!(
                "assets.base_url must be an absolute URL, got '{}'",
                self.assets.base_url
            )));
        }

        if self.http.timeout_seconds == 0 {
            return Err(CatalogError::Config(
                "http.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.gallery.page_size == 0 {
            return Err(CatalogError::Config(
                "gallery.page_size must be greater than 0".to_string(),
            ));
        }

        if self.gallery.carousel_size == 0 {
            return Err(CatalogError::Config(
                "gallery.carousel_size must be greater than 0".to_string(),
            ));
        }

        let categories = unique_keys("gallery.categories", &self.gallery.categories)?;
        if categories.contains(ALL_CATEGORIES) {
            return Err(CatalogError::Config(format!(
                "gallery.categories cannot contain the reserved key '{}'",
                ALL_CATEGORIES
            )));
        }

        let types = unique_keys("services.types", &self.services.types)?;
        if let Some(default_type) = &self.services.default_type {
            if !types.contains(normalize_key(default_type).as_str()) {
                return Err(CatalogError::Config(format!(
                    "services.default_type '{}' is not one of services.types",
                    default_type
                )));
            }
        }

        Ok(())
    }
}

fn validate_endpoint(field: &str, value: &str) -> Result<(), CatalogError> {
    let url = Url::parse(value).map_err(|e| {
        CatalogError::Config(format!("{} must be an absolute URL ('{}'): {}", field, value, e))
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(CatalogError::Config(format!(
            "{} must be an http(s) URL, got '{}'",
            field, value
        )));
    }
    Ok(())
}

fn unique_keys(field: &str, keys: &[String]) -> Result<HashSet<String>, CatalogError> {
    if keys.is_empty() {
        return Err(CatalogError::Config(format!("{} cannot be empty", field)));
    }
    let mut seen = HashSet::new();
    for key in keys {
        let normalized = normalize_key(key);
        if normalized.is_empty() {
            return Err(CatalogError::Config(format!("{} contains an empty key", field)));
        }
        if !seen.insert(normalized) {
            return Err(CatalogError::Config(format!(
                "{} contains duplicate key '{}'",
                field, key
            )));
        }
    }
    Ok(seen)
}
