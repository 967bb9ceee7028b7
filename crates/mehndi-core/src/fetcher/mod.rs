//! Remote catalog retrieval
//!
//! A [`CatalogSource`] performs exactly one network attempt per call and hands
//! back untyped rows. [`CatalogFetcher`] runs those rows through the
//! [`Normalizer`], dropping the ones it rejects: a handful of malformed rows
//! never fails the whole fetch. Nothing here retries or coalesces requests;
//! deduplication is the job of [`crate::cache::CatalogCache`].

pub mod http;
pub mod payload;

pub use http::HttpCatalogSource;

use crate::config::CatalogConfig;
use crate::errors::{CatalogError, FetchError};
use crate::normalizer::{CatalogRecord, Normalizer, RawRow};
use crate::records::{CatalogImageRecord, CatalogKind, CatalogPayload, ServiceRecord};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Retrieve the raw rows for one catalog kind.
    async fn fetch_rows(&self, kind: CatalogKind) -> Result<Vec<RawRow>, FetchError>;
}

#[derive(Clone)]
pub struct CatalogFetcher {
    source: Arc<dyn CatalogSource>,
    normalizer: Arc<Normalizer>,
}

impl CatalogFetcher {
    pub fn new(source: Arc<dyn CatalogSource>, normalizer: Normalizer) -> Self {
        Self {
            source,
            normalizer: Arc::new(normalizer),
        }
    }

    /// HTTP-backed fetcher for the endpoints and asset base in `config`.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let source = HttpCatalogSource::new(config.endpoints.clone(), &config.http)?;
        let normalizer = Normalizer::with_base(&config.assets.base_url)?;
        Ok(Self::new(Arc::new(source), normalizer))
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub async fn fetch<R: CatalogRecord>(&self) -> Result<Vec<R>, FetchError> {
        log::info!("Fetching {} catalog", R::KIND);

        let rows = match self.source.fetch_rows(R::KIND).await {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("Fetching {} catalog failed: {}", R::KIND, e);
                return Err(e);
            }
        };

        let (records, rejected) = self.normalizer.normalize_all::<R>(&rows);
        if rejected > 0 {
            log::warn!(
                "Dropped {} of {} {} rows that failed normalization",
                rejected,
                rows.len(),
                R::KIND
            );
        }
        log::info!("Fetched {} {} records", records.len(), R::KIND);
        Ok(records)
    }

    pub async fn fetch_images(&self) -> Result<Vec<CatalogImageRecord>, FetchError> {
        self.fetch::<CatalogImageRecord>().await
    }

    pub async fn fetch_services(&self) -> Result<Vec<ServiceRecord>, FetchError> {
        self.fetch::<ServiceRecord>().await
    }

    /// Fetch by runtime kind, wrapping the records for the shared cache.
    pub async fn fetch_kind(&self, kind: CatalogKind) -> Result<CatalogPayload, FetchError> {
        match kind {
            CatalogKind::Images => Ok(CatalogImageRecord::into_payload(
                self.fetch_images().await?.into(),
            )),
            CatalogKind::Services => Ok(ServiceRecord::into_payload(
                self.fetch_services().await?.into(),
            )),
        }
    }
}
