//! Typed catalog records and the category vocabulary shared by every view.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Pseudo-category selecting the full, unfiltered record list.
pub const ALL_CATEGORIES: &str = "all";

/// Category assigned to image rows whose `category` cell is empty.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Partition of the remote catalog, fetched independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Images,
    Services,
}

impl CatalogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Images => "images",
            CatalogKind::Services => "services",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can be bucketed by a category key.
pub trait Categorized {
    fn category(&self) -> &str;
}

/// A gallery image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogImageRecord {
    pub id: String,
    pub category: String,
    pub image_url: String,
    pub alt_text: String,
}

impl Categorized for CatalogImageRecord {
    fn category(&self) -> &str {
        &self.category
    }
}

/// A bookable service package. `service_type` doubles as its category key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceRecord {
    #[serde(rename = "type")]
    pub service_type: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub image: String,
    pub alt: String,
}

impl Categorized for ServiceRecord {
    fn category(&self) -> &str {
        &self.service_type
    }
}

/// Result of one catalog retrieval, tagged by kind so a single cache can hold both.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogPayload {
    Images(Arc<[CatalogImageRecord]>),
    Services(Arc<[ServiceRecord]>),
}

impl CatalogPayload {
    pub fn kind(&self) -> CatalogKind {
        match self {
            CatalogPayload::Images(_) => CatalogKind::Images,
            CatalogPayload::Services(_) => CatalogKind::Services,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CatalogPayload::Images(records) => records.len(),
            CatalogPayload::Services(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Canonical form of a category or service-type key.
///
/// Lower-cases and folds runs of whitespace and hyphens into a single `_`,
/// so `"Baby Shower"` and `"baby-shower"` both become `"baby_shower"`.
pub fn normalize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut pending_separator = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = true;
            continue;
        }
        if pending_separator && !key.is_empty() {
            key.push('_');
        }
        pending_separator = false;
        key.extend(ch.to_lowercase());
    }
    key
}

/// Display label for a category key: `"baby_shower"` becomes `"Baby Shower"`.
pub fn category_label(key: &str) -> String {
    if key == ALL_CATEGORIES {
        return "All".to_string();
    }
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
