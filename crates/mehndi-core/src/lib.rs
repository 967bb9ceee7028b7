//! Catalog retrieval and categorization engine for a mehndi artist's website.
//!
//! The site's design gallery and service packages are maintained in a remote
//! spreadsheet. This crate fetches those rows, normalizes them into typed
//! records, groups them by category, and drives the per-view selection state
//! (active category, carousel position, fetch lifecycle) that the pages render.
//!
//! # Architecture Overview
//!
//! - **Normalization**: raw rows become [`CatalogImageRecord`] / [`ServiceRecord`]
//!   values, or are rejected individually
//! - **Retrieval**: one HTTP request per catalog kind, array or sheet-range payloads
//! - **Caching**: concurrent loads of the same kind share a single request
//! - **Indexing**: memoized grouping by category key
//! - **Selection**: token-guarded state machine published over a watch channel
//! - **Configuration**: YAML with environment overrides

pub mod cache;
pub mod config;
pub mod errors;
pub mod fetcher;
pub mod index;
pub mod normalizer;
pub mod page;
pub mod records;
pub mod selection;
pub mod services;
pub mod view;

pub use cache::{CatalogCache, CatalogSubscription};
pub use config::*;
pub use errors::{CatalogError, FetchError, Rejection};
pub use fetcher::{CatalogFetcher, CatalogSource, HttpCatalogSource};
pub use index::{CategoryIndex, IndexMemo, SharedIndexMemo};
pub use normalizer::{CatalogRecord, Normalizer, RawRow};
pub use page::Page;
pub use records::{
    category_label, normalize_key, CatalogImageRecord, CatalogKind, CatalogPayload, Categorized,
    ServiceRecord, ALL_CATEGORIES, UNCATEGORIZED,
};
pub use selection::{Outcome, Phase, ReadModel, RequestToken, SelectionMachine};
pub use services::{ServiceTabView, ServiceTabs};
pub use view::CatalogView;
