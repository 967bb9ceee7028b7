//! Raw row to typed record conversion
//!
//! Rows arrive as loosely typed key/value maps straight from the spreadsheet.
//! Normalization is pure: it trims and canonicalizes fields, resolves media
//! references against the configured asset base, and rejects rows that lack
//! the fields a view cannot do without.

use crate::errors::{CatalogError, Rejection};
use crate::records::{
    category_label, normalize_key, CatalogImageRecord, CatalogKind, CatalogPayload, Categorized,
    ServiceRecord, UNCATEGORIZED,
};
use reqwest::Url;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// One untyped row as returned by the remote source.
pub type RawRow = Map<String, Value>;

/// A record type the fetcher knows how to produce.
pub trait CatalogRecord: Categorized + Clone + PartialEq + std::hash::Hash + Send + Sync + 'static {
    const KIND: CatalogKind;

    fn normalize(normalizer: &Normalizer, row: &RawRow) -> Result<Self, Rejection>;

    fn into_payload(records: Arc<[Self]>) -> CatalogPayload;

    fn from_payload(payload: &CatalogPayload) -> Option<Arc<[Self]>>;
}

impl CatalogRecord for CatalogImageRecord {
    const KIND: CatalogKind = CatalogKind::Images;

    fn normalize(normalizer: &Normalizer, row: &RawRow) -> Result<Self, Rejection> {
        normalizer.normalize_image(row)
    }

    fn into_payload(records: Arc<[Self]>) -> CatalogPayload {
        CatalogPayload::Images(records)
    }

    fn from_payload(payload: &CatalogPayload) -> Option<Arc<[Self]>> {
        match payload {
            CatalogPayload::Images(records) => Some(records.clone()),
            _ => None,
        }
    }
}

impl CatalogRecord for ServiceRecord {
    const KIND: CatalogKind = CatalogKind::Services;

    fn normalize(normalizer: &Normalizer, row: &RawRow) -> Result<Self, Rejection> {
        normalizer.normalize_service(row)
    }

    fn into_payload(records: Arc<[Self]>) -> CatalogPayload {
        CatalogPayload::Services(records)
    }

    fn from_payload(payload: &CatalogPayload) -> Option<Arc<[Self]>> {
        match payload {
            CatalogPayload::Services(records) => Some(records.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    asset_base: Url,
}

impl Normalizer {
    pub fn new(asset_base: Url) -> Self {
        Self { asset_base }
    }

    /// Build a normalizer from a base URL string, e.g. `assets.base_url`.
    pub fn with_base(asset_base: &str) -> Result<Self, CatalogError> {
        let base = Url::parse(asset_base).map_err(|e| {
            CatalogError::Config(format!("Invalid asset base URL '{}': {}", asset_base, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(CatalogError::Config(format!(
                "Asset base URL '{}' cannot be used as a base",
                asset_base
            )));
        }
        Ok(Self::new(base))
    }

    pub fn asset_base(&self) -> &Url {
        &self.asset_base
    }

    pub fn normalize_image(&self, row: &RawRow) -> Result<CatalogImageRecord, Rejection> {
        let raw_url = cell(row, "image_url").ok_or(Rejection::MissingField("image_url"))?;
        let image_url = self.resolve_url("image_url", &raw_url)?;

        let category = cell(row, "category")
            .map(|c| normalize_key(&c))
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let id = cell(row, "id").unwrap_or_else(|| derived_id(&image_url));
        let alt_text = cell(row, "alt_text")
            .unwrap_or_else(|| format!("{} design", category_label(&category)));

        Ok(CatalogImageRecord {
            id,
            category,
            image_url,
            alt_text,
        })
    }

    pub fn normalize_service(&self, row: &RawRow) -> Result<ServiceRecord, Rejection> {
        let service_type = cell(row, "type")
            .map(|t| normalize_key(&t))
            .filter(|t| !t.is_empty())
            .ok_or(Rejection::MissingField("type"))?;
        let title = cell(row, "title").ok_or(Rejection::MissingField("title"))?;

        // An unusable image reference blanks the image; the row is kept.
        let image = match cell(row, "image") {
            Some(raw) => self.resolve_url("image", &raw).unwrap_or_else(|reason| {
                log::debug!("Ignoring service image for '{}': {}", title, reason);
                String::new()
            }),
            None => String::new(),
        };
        let alt = cell(row, "alt").unwrap_or_else(|| title.clone());

        Ok(ServiceRecord {
            service_type,
            title,
            description: cell(row, "description").unwrap_or_default(),
            price: cell(row, "price").unwrap_or_default(),
            image,
            alt,
        })
    }

    /// Normalize every row, keeping the survivors in source order.
    ///
    /// Returns the records together with the number of rejected rows.
    pub fn normalize_all<R: CatalogRecord>(&self, rows: &[RawRow]) -> (Vec<R>, usize) {
        let mut records = Vec::with_capacity(rows.len());
        let mut rejected = 0;
        for (position, row) in rows.iter().enumerate() {
            match R::normalize(self, row) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    rejected += 1;
                    log::debug!("Dropping {} row {}: {}", R::KIND, position, reason);
                }
            }
        }
        (records, rejected)
    }

    fn resolve_url(&self, field: &'static str, raw: &str) -> Result<String, Rejection> {
        let malformed = || Rejection::MalformedUrl {
            field,
            value: raw.to_string(),
        };
        // Absolute references replace the base, relative ones resolve against it.
        let url = self.asset_base.join(raw).map_err(|_| malformed())?;
        match url.scheme() {
            "http" | "https" if url.host().is_some() => Ok(url.to_string()),
            _ => Err(malformed()),
        }
    }
}

/// Trimmed, non-empty text of a cell.
///
/// Column names are matched exactly first, then by their canonical key so
/// spreadsheet headers such as `"Image URL"` still resolve to `image_url`.
fn cell(row: &RawRow, key: &str) -> Option<String> {
    let value = row.get(key).or_else(|| {
        row.iter()
            .find(|(name, _)| normalize_key(name) == key)
            .map(|(_, value)| value)
    })?;
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn derived_id(image_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image_url.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}
