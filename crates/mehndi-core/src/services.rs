//! Tabbed services view: one package per service type plus its gallery images.

use crate::index::CategoryIndex;
use crate::records::{normalize_key, CatalogImageRecord, ServiceRecord};
use std::sync::Arc;

/// What the services page renders for the active tab.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceTabView {
    pub tab: String,
    pub service: Option<ServiceRecord>,
    pub images: Arc<[CatalogImageRecord]>,
}

pub struct ServiceTabs {
    tabs: Vec<String>,
    active_tab: String,
    services: Arc<CategoryIndex<ServiceRecord>>,
    images: Arc<CategoryIndex<CatalogImageRecord>>,
}

impl ServiceTabs {
    pub fn new(
        tabs: Vec<String>,
        default_tab: &str,
        services: Arc<CategoryIndex<ServiceRecord>>,
        images: Arc<CategoryIndex<CatalogImageRecord>>,
    ) -> Self {
        Self {
            tabs,
            active_tab: normalize_key(default_tab),
            services,
            images,
        }
    }

    pub fn tabs(&self) -> &[String] {
        &self.tabs
    }

    pub fn active_tab(&self) -> &str {
        &self.active_tab
    }

    pub fn select_tab(&mut self, tab: &str) {
        self.active_tab = normalize_key(tab);
    }

    /// First service of the active type, else the first service overall.
    pub fn current_service(&self) -> Option<&ServiceRecord> {
        self.services
            .first(&self.active_tab)
            .or_else(|| self.services.records().first())
    }

    pub fn current_images(&self) -> Arc<[CatalogImageRecord]> {
        self.images.filter(&self.active_tab)
    }

    /// The authoritative package for every service type present in the data.
    pub fn packages(&self) -> Vec<&ServiceRecord> {
        self.services.firsts()
    }

    pub fn snapshot(&self) -> ServiceTabView {
        ServiceTabView {
            tab: self.active_tab.clone(),
            service: self.current_service().cloned(),
            images: self.current_images(),
        }
    }
}
