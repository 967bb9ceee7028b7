//! A mounted catalog view
//!
//! [`CatalogView`] ties one [`SelectionMachine`] to the shared
//! [`CatalogCache`]: mounting subscribes to the view's catalog kind,
//! `refresh` runs one token-stamped fetch through the cache, and dropping
//! (or [`CatalogView::detach`]ing) the view abandons whatever is in flight.

use crate::cache::{CatalogCache, CatalogSubscription};
use crate::index::{CategoryIndex, IndexMemo, SharedIndexMemo};
use crate::normalizer::CatalogRecord;
use crate::selection::{Outcome, ReadModel, SelectionMachine};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

pub struct CatalogView<R: CatalogRecord> {
    cache: CatalogCache,
    machine: Mutex<SelectionMachine<R>>,
    subscription: CatalogSubscription,
}

impl<R: CatalogRecord> CatalogView<R> {
    pub fn mount(cache: &CatalogCache, carousel_size: usize) -> Self {
        Self::mount_with_memo(cache, carousel_size, IndexMemo::shared())
    }

    /// Mount a view whose category index is shared with other views of `R`.
    pub fn mount_with_memo(
        cache: &CatalogCache,
        carousel_size: usize,
        memo: SharedIndexMemo<R>,
    ) -> Self {
        log::debug!("Mounting {} view", R::KIND);
        Self {
            cache: cache.clone(),
            machine: Mutex::new(SelectionMachine::with_memo(carousel_size, memo)),
            subscription: cache.subscribe(R::KIND),
        }
    }

    /// Fetch the catalog and apply the result, unless a newer refresh or a
    /// detach got there first.
    pub async fn refresh(&self) -> Outcome {
        let token = {
            let mut machine = self.machine();
            machine.start_fetch()
        };
        let Some(token) = token else {
            return Outcome::Detached;
        };

        let result = self.cache.load_records::<R>().await;

        let mut machine = self.machine();
        match result {
            Ok(records) => machine.fetch_succeeded(token, records),
            Err(cause) => machine.fetch_failed(token, cause),
        }
    }

    pub fn select_category(&self, key: &str) -> Outcome {
        self.machine().select_category(key)
    }

    pub fn advance(&self, delta: i64) -> Outcome {
        self.machine().advance(delta)
    }

    pub fn snapshot(&self) -> ReadModel<R> {
        self.machine().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReadModel<R>> {
        self.machine().subscribe()
    }

    pub fn index(&self) -> Option<Arc<CategoryIndex<R>>> {
        self.machine().index().cloned()
    }

    pub fn subscription(&self) -> &CatalogSubscription {
        &self.subscription
    }

    pub fn detach(&self) {
        self.machine().detach();
    }

    fn machine(&self) -> MutexGuard<'_, SelectionMachine<R>> {
        self.machine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<R: CatalogRecord> Drop for CatalogView<R> {
    fn drop(&mut self) {
        self.detach();
    }
}
