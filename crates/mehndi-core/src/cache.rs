//! Request-deduplicating catalog cache
//!
//! Several views routinely ask for the same catalog kind at the same time (the
//! home page carousel and the gallery grid both want images). [`CatalogCache`]
//! keeps at most one request in flight per [`CatalogKind`]: a `load` issued
//! while another is outstanding joins it instead of hitting the network again.
//!
//! Views register interest with [`CatalogCache::subscribe`]. Each completed
//! load is published to every live subscription of that kind over a
//! `tokio::sync::watch` channel. When the last subscription of a kind is
//! dropped the held result goes with it; nothing outlives the session.

use crate::errors::FetchError;
use crate::fetcher::CatalogFetcher;
use crate::normalizer::CatalogRecord;
use crate::records::{CatalogImageRecord, CatalogKind, CatalogPayload, ServiceRecord};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

pub type LoadResult = Result<CatalogPayload, FetchError>;

type InFlight = Shared<BoxFuture<'static, LoadResult>>;

struct KindSlot {
    subscribers: usize,
    generation: u64,
    in_flight: Option<(u64, InFlight)>,
    latest: watch::Sender<Option<LoadResult>>,
}

impl KindSlot {
    fn new() -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            subscribers: 0,
            generation: 0,
            in_flight: None,
            latest,
        }
    }

    fn is_idle(&self) -> bool {
        self.subscribers == 0 && self.in_flight.is_none()
    }
}

struct CacheInner {
    fetcher: CatalogFetcher,
    slots: Mutex<HashMap<CatalogKind, KindSlot>>,
    network_calls: AtomicUsize,
}

impl CacheInner {
    fn slots(&self) -> MutexGuard<'_, HashMap<CatalogKind, KindSlot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn unsubscribe(&self, kind: CatalogKind) {
        let mut slots = self.slots();
        let idle = match slots.get_mut(&kind) {
            Some(slot) => {
                slot.subscribers = slot.subscribers.saturating_sub(1);
                if slot.subscribers == 0 {
                    log::debug!("Last {} subscriber left, dropping cached result", kind);
                    slot.latest.send_replace(None);
                }
                slot.is_idle()
            }
            None => false,
        };
        if idle {
            slots.remove(&kind);
        }
    }
}

#[derive(Clone)]
pub struct CatalogCache {
    inner: Arc<CacheInner>,
}

impl CatalogCache {
    pub fn new(fetcher: CatalogFetcher) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                fetcher,
                slots: Mutex::new(HashMap::new()),
                network_calls: AtomicUsize::new(0),
            }),
        }
    }

    pub fn subscribe(&self, kind: CatalogKind) -> CatalogSubscription {
        let mut slots = self.inner.slots();
        let slot = slots.entry(kind).or_insert_with(KindSlot::new);
        slot.subscribers += 1;
        log::debug!("{} subscribers for {} catalog", slot.subscribers, kind);
        CatalogSubscription {
            kind,
            receiver: slot.latest.subscribe(),
            cache: self.inner.clone(),
        }
    }

    pub fn subscriber_count(&self, kind: CatalogKind) -> usize {
        self.inner
            .slots()
            .get(&kind)
            .map(|slot| slot.subscribers)
            .unwrap_or(0)
    }

    /// Most recent published result for `kind`, if anyone is subscribed.
    pub fn latest(&self, kind: CatalogKind) -> Option<LoadResult> {
        self.inner
            .slots()
            .get(&kind)
            .and_then(|slot| slot.latest.borrow().clone())
    }

    /// Number of network requests actually issued.
    pub fn network_calls(&self) -> usize {
        self.inner.network_calls.load(Ordering::SeqCst)
    }

    /// Load `kind`, joining an outstanding request for it if there is one.
    pub async fn load(&self, kind: CatalogKind) -> LoadResult {
        let (generation, request) = self.join_or_start(kind);
        let result = request.await;
        self.complete(kind, generation, &result);
        result
    }

    pub async fn load_records<R: CatalogRecord>(&self) -> Result<Arc<[R]>, FetchError> {
        let payload = self.load(R::KIND).await?;
        R::from_payload(&payload).ok_or_else(|| {
            FetchError::Payload(format!(
                "expected {} records, got {}",
                R::KIND,
                payload.kind()
            ))
        })
    }

    pub async fn load_images(&self) -> Result<Arc<[CatalogImageRecord]>, FetchError> {
        self.load_records::<CatalogImageRecord>().await
    }

    pub async fn load_services(&self) -> Result<Arc<[ServiceRecord]>, FetchError> {
        self.load_records::<ServiceRecord>().await
    }

    fn join_or_start(&self, kind: CatalogKind) -> (u64, InFlight) {
        let mut slots = self.inner.slots();
        let slot = slots.entry(kind).or_insert_with(KindSlot::new);

        if let Some((generation, request)) = &slot.in_flight {
            log::debug!("Joining in-flight {} request #{}", kind, generation);
            return (*generation, request.clone());
        }

        slot.generation += 1;
        let generation = slot.generation;
        let fetcher = self.inner.fetcher.clone();
        let request = async move { fetcher.fetch_kind(kind).await }
            .boxed()
            .shared();
        slot.in_flight = Some((generation, request.clone()));
        self.inner.network_calls.fetch_add(1, Ordering::SeqCst);
        (generation, request)
    }

    fn complete(&self, kind: CatalogKind, generation: u64, result: &LoadResult) {
        let mut slots = self.inner.slots();
        let idle = match slots.get_mut(&kind) {
            Some(slot) => {
                let current = matches!(&slot.in_flight, Some((g, _)) if *g == generation);
                if current {
                    slot.in_flight = None;
                    if slot.subscribers > 0 {
                        slot.latest.send_replace(Some(result.clone()));
                    }
                }
                slot.is_idle()
            }
            None => false,
        };
        if idle {
            slots.remove(&kind);
        }
    }
}

/// Interest in one catalog kind; dropping it unsubscribes.
pub struct CatalogSubscription {
    kind: CatalogKind,
    receiver: watch::Receiver<Option<LoadResult>>,
    cache: Arc<CacheInner>,
}

impl CatalogSubscription {
    pub fn kind(&self) -> CatalogKind {
        self.kind
    }

    pub fn latest(&self) -> Option<LoadResult> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published result. Returns `false` once the cache is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}

impl Drop for CatalogSubscription {
    fn drop(&mut self) {
        self.cache.unsubscribe(self.kind);
    }
}
