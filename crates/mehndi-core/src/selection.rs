//! View selection state machine
//!
//! One [`SelectionMachine`] backs one view. It owns the fetch lifecycle
//! (`idle → loading → ready | error`, with `ready`/`error` re-entering
//! `loading` on refresh), the active category, and the carousel position, and
//! publishes a [`ReadModel`] after every transition.
//!
//! Every `start_fetch` stamps a fresh [`RequestToken`]. Completions carrying
//! any other token are stale and are discarded without touching state, which
//! is how a superseded in-flight request is kept from clobbering a newer one.
//! After [`SelectionMachine::detach`] (the view went away) nothing mutates.

use crate::errors::FetchError;
use crate::index::{CategoryIndex, IndexMemo, SharedIndexMemo};
use crate::page::Page;
use crate::records::{normalize_key, Categorized, ALL_CATEGORIES};
use serde::Serialize;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, MutexGuard};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Loading => "loading",
            Phase::Ready => "ready",
            Phase::Error => "error",
        };
        f.write_str(name)
    }
}

/// Identifies one fetch attempt; strictly increasing per machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// What an event did to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Completion for a superseded (or unknown) request token.
    Stale,
    /// Event not valid in the current phase.
    NotReady,
    /// The hosting view has been torn down.
    Detached,
}

/// Snapshot of everything a presentation layer renders.
#[derive(Debug, Clone)]
pub struct ReadModel<R> {
    pub phase: Phase,
    pub filtered_records: Arc<[R]>,
    pub active_category: String,
    pub active_index: usize,
    pub carousel_size: usize,
    pub error: Option<FetchError>,
}

impl<R: Clone> ReadModel<R> {
    /// The bounded carousel window: the first `carousel_size` filtered records.
    pub fn carousel(&self) -> &[R] {
        let len = self.filtered_records.len().min(self.carousel_size);
        &self.filtered_records[..len]
    }

    pub fn current_slide(&self) -> Option<&R> {
        self.carousel().get(self.active_index)
    }

    pub fn page(&self, page: usize, page_size: usize) -> Page<R> {
        Page::of(&self.filtered_records, page, page_size)
    }

    /// Ready but nothing to show; rendered as an empty state, not an error.
    pub fn is_empty_state(&self) -> bool {
        self.phase == Phase::Ready && self.filtered_records.is_empty()
    }
}

pub struct SelectionMachine<R> {
    phase: Phase,
    index: Option<Arc<CategoryIndex<R>>>,
    memo: SharedIndexMemo<R>,
    filtered: Arc<[R]>,
    active_category: String,
    active_index: usize,
    carousel_size: usize,
    error: Option<FetchError>,
    last_token: u64,
    pending: Option<RequestToken>,
    detached: bool,
    publisher: watch::Sender<ReadModel<R>>,
}

impl<R: Categorized + Clone + PartialEq + Hash> SelectionMachine<R> {
    pub fn new(carousel_size: usize) -> Self {
        Self::with_memo(carousel_size, IndexMemo::shared())
    }

    /// Machine whose category index comes from a memo shared with other views.
    pub fn with_memo(carousel_size: usize, memo: SharedIndexMemo<R>) -> Self {
        let empty: Arc<[R]> = Arc::from(Vec::new());
        let initial = ReadModel {
            phase: Phase::Idle,
            filtered_records: empty.clone(),
            active_category: ALL_CATEGORIES.to_string(),
            active_index: 0,
            carousel_size,
            error: None,
        };
        let (publisher, _) = watch::channel(initial);
        Self {
            phase: Phase::Idle,
            index: None,
            memo,
            filtered: empty,
            active_category: ALL_CATEGORIES.to_string(),
            active_index: 0,
            carousel_size,
            error: None,
            last_token: 0,
            pending: None,
            detached: false,
            publisher,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn active_category(&self) -> &str {
        &self.active_category
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn index(&self) -> Option<&Arc<CategoryIndex<R>>> {
        self.index.as_ref()
    }

    pub fn pending(&self) -> Option<RequestToken> {
        self.pending
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Receiver that observes a fresh [`ReadModel`] after every transition.
    pub fn subscribe(&self) -> watch::Receiver<ReadModel<R>> {
        self.publisher.subscribe()
    }

    pub fn snapshot(&self) -> ReadModel<R> {
        let exposed = if self.phase == Phase::Ready {
            self.filtered.clone()
        } else {
            Arc::from(Vec::new())
        };
        ReadModel {
            phase: self.phase,
            filtered_records: exposed,
            active_category: self.active_category.clone(),
            active_index: self.active_index,
            carousel_size: self.carousel_size,
            error: self.error.clone(),
        }
    }

    /// Enter `loading` and return the token the completion must carry.
    ///
    /// Calling this while a fetch is already pending supersedes it.
    pub fn start_fetch(&mut self) -> Option<RequestToken> {
        if self.detached {
            return None;
        }
        self.last_token += 1;
        let token = RequestToken(self.last_token);
        if let Some(previous) = self.pending.replace(token) {
            log::debug!("Fetch {:?} superseded by {:?}", previous, token);
        }
        self.phase = Phase::Loading;
        self.publish();
        Some(token)
    }

    pub fn fetch_succeeded(&mut self, token: RequestToken, records: Arc<[R]>) -> Outcome {
        if let Some(outcome) = self.guard_completion(token) {
            return outcome;
        }

        let index = lock_memo(&self.memo).get(&records);
        if self.active_category != ALL_CATEGORIES && !index.contains(&self.active_category) {
            log::debug!(
                "Category '{}' absent from new data, falling back to '{}'",
                self.active_category,
                ALL_CATEGORIES
            );
            self.active_category = ALL_CATEGORIES.to_string();
        }
        self.filtered = index.filter(&self.active_category);
        self.index = Some(index);
        self.active_index = 0;
        self.error = None;
        self.pending = None;
        self.phase = Phase::Ready;
        self.publish();
        Outcome::Applied
    }

    pub fn fetch_failed(&mut self, token: RequestToken, cause: FetchError) -> Outcome {
        if let Some(outcome) = self.guard_completion(token) {
            return outcome;
        }

        log::error!("Catalog fetch failed: {}", cause);
        self.index = None;
        self.filtered = Arc::from(Vec::new());
        self.active_index = 0;
        self.error = Some(cause);
        self.pending = None;
        self.phase = Phase::Error;
        self.publish();
        Outcome::Applied
    }

    /// Switch the active category; `"all"` selects the full list.
    ///
    /// Accepted in any phase so a choice made while loading sticks; the
    /// filtered list is only materialized once data is ready.
    pub fn select_category(&mut self, key: &str) -> Outcome {
        if self.detached {
            return Outcome::Detached;
        }
        let key = normalize_key(key);
        self.active_category = if key.is_empty() {
            ALL_CATEGORIES.to_string()
        } else {
            key
        };
        if let Some(index) = &self.index {
            self.filtered = index.filter(&self.active_category);
        }
        self.active_index = 0;
        self.publish();
        Outcome::Applied
    }

    /// Move the carousel cyclically by `delta` positions.
    pub fn advance(&mut self, delta: i64) -> Outcome {
        if self.detached {
            return Outcome::Detached;
        }
        if self.phase != Phase::Ready {
            return Outcome::NotReady;
        }
        let len = self.carousel_len();
        self.active_index = if len == 0 {
            0
        } else {
            let step = delta.rem_euclid(len as i64) as usize;
            (self.active_index % len + step) % len
        };
        self.publish();
        Outcome::Applied
    }

    pub fn carousel_len(&self) -> usize {
        self.filtered.len().min(self.carousel_size)
    }

    /// The hosting view is gone: drop any pending request, ignore everything after.
    pub fn detach(&mut self) {
        if let Some(token) = self.pending.take() {
            log::debug!("View detached with fetch {:?} still outstanding", token);
        }
        self.detached = true;
    }

    fn guard_completion(&self, token: RequestToken) -> Option<Outcome> {
        if self.detached {
            return Some(Outcome::Detached);
        }
        if self.pending != Some(token) {
            log::warn!(
                "Discarding stale response for {:?} (current: {:?})",
                token,
                self.pending
            );
            return Some(Outcome::Stale);
        }
        None
    }

    fn publish(&self) {
        self.publisher.send_replace(self.snapshot());
    }
}

fn lock_memo<R>(memo: &SharedIndexMemo<R>) -> MutexGuard<'_, IndexMemo<R>> {
    memo.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CatalogImageRecord, UNCATEGORIZED};

    fn image(id: &str, category: &str) -> CatalogImageRecord {
        CatalogImageRecord {
            id: id.to_string(),
            category: category.to_string(),
            image_url: format!("http://localhost/{}.jpg", id),
            alt_text: String::new(),
        }
    }

    fn records(rows: &[(&str, &str)]) -> Arc<[CatalogImageRecord]> {
        rows.iter().map(|(id, cat)| image(id, cat)).collect::<Vec<_>>().into()
    }

    fn ids(model: &ReadModel<CatalogImageRecord>) -> Vec<String> {
        model.filtered_records.iter().map(|r| r.id.clone()).collect()
    }

    fn ready_machine(data: Arc<[CatalogImageRecord]>) -> SelectionMachine<CatalogImageRecord> {
        let mut machine = SelectionMachine::new(5);
        let token = machine.start_fetch().unwrap();
        assert_eq!(machine.fetch_succeeded(token, data), Outcome::Applied);
        machine
    }

    #[test]
    fn test_lifecycle_idle_loading_ready() {
        let mut machine = SelectionMachine::<CatalogImageRecord>::new(5);
        assert_eq!(machine.phase(), Phase::Idle);

        let token = machine.start_fetch().unwrap();
        assert_eq!(machine.phase(), Phase::Loading);
        assert!(machine.snapshot().filtered_records.is_empty());

        let data = records(&[("1", "bridal"), ("2", "arabic")]);
        machine.fetch_succeeded(token, data.clone());
        let model = machine.snapshot();
        assert_eq!(model.phase, Phase::Ready);
        assert_eq!(model.active_category, ALL_CATEGORIES);
        assert!(Arc::ptr_eq(&model.filtered_records, &data));
        assert!(model.error.is_none());
    }

    #[test]
    fn test_failure_clears_previous_data() {
        let mut machine = ready_machine(records(&[("1", "bridal")]));

        let token = machine.start_fetch().unwrap();
        let cause = FetchError::Status {
            status: 500,
            url: "http://sheets.test/images".to_string(),
        };
        assert_eq!(machine.fetch_failed(token, cause.clone()), Outcome::Applied);

        let model = machine.snapshot();
        assert_eq!(model.phase, Phase::Error);
        assert!(model.filtered_records.is_empty());
        assert_eq!(model.error, Some(cause));
        assert!(machine.index().is_none());

        // An error is recoverable by fetching again.
        let retry = machine.start_fetch().unwrap();
        machine.fetch_succeeded(retry, records(&[("2", "leg")]));
        assert_eq!(machine.phase(), Phase::Ready);
        assert!(machine.snapshot().error.is_none());
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut machine = SelectionMachine::<CatalogImageRecord>::new(5);
        let older = machine.start_fetch().unwrap();
        let newer = machine.start_fetch().unwrap();
        assert!(newer > older);

        let fresh = records(&[("new", "bridal")]);
        assert_eq!(machine.fetch_succeeded(newer, fresh.clone()), Outcome::Applied);
        let before = machine.snapshot();

        assert_eq!(
            machine.fetch_succeeded(older, records(&[("old", "party")])),
            Outcome::Stale
        );
        assert_eq!(
            machine.fetch_failed(older, FetchError::Payload("late".to_string())),
            Outcome::Stale
        );

        let after = machine.snapshot();
        assert_eq!(after.phase, before.phase);
        assert!(Arc::ptr_eq(&after.filtered_records, &fresh));
        assert!(after.error.is_none());
    }

    #[test]
    fn test_stale_failure_during_newer_loading() {
        let mut machine = SelectionMachine::<CatalogImageRecord>::new(5);
        let older = machine.start_fetch().unwrap();
        let _newer = machine.start_fetch().unwrap();

        assert_eq!(
            machine.fetch_failed(older, FetchError::Payload("late".to_string())),
            Outcome::Stale
        );
        assert_eq!(machine.phase(), Phase::Loading);
    }

    #[test]
    fn test_select_category_filters_and_resets_index() {
        let data = records(&[("1", "bridal"), ("2", "arabic"), ("3", "bridal")]);
        let mut machine = ready_machine(data.clone());
        machine.advance(2);
        assert_eq!(machine.active_index(), 2);

        machine.select_category("bridal");
        let model = machine.snapshot();
        assert_eq!(ids(&model), ["1", "3"]);
        assert_eq!(model.active_index, 0);

        machine.select_category(ALL_CATEGORIES);
        assert!(Arc::ptr_eq(&machine.snapshot().filtered_records, &data));
    }

    #[test]
    fn test_select_missing_category_is_empty_not_error() {
        let mut machine = ready_machine(records(&[("1", "bridal")]));
        machine.select_category("arabic");

        let model = machine.snapshot();
        assert_eq!(model.phase, Phase::Ready);
        assert!(model.filtered_records.is_empty());
        assert!(model.is_empty_state());
        assert!(model.error.is_none());
        assert!(model.current_slide().is_none());
    }

    #[test]
    fn test_category_preserved_across_refresh_when_present() {
        let mut machine = ready_machine(records(&[("1", "bridal"), ("2", "arabic")]));
        machine.select_category("Arabic");
        assert_eq!(machine.active_category(), "arabic");

        let token = machine.start_fetch().unwrap();
        machine.fetch_succeeded(token, records(&[("3", "arabic"), ("4", "leg")]));
        assert_eq!(machine.active_category(), "arabic");
        assert_eq!(ids(&machine.snapshot()), ["3"]);

        let token = machine.start_fetch().unwrap();
        machine.fetch_succeeded(token, records(&[("5", "leg")]));
        assert_eq!(machine.active_category(), ALL_CATEGORIES);
        assert_eq!(ids(&machine.snapshot()), ["5"]);
    }

    #[test]
    fn test_advance_wraps_in_both_directions() {
        let data = records(&[
            ("1", "a"),
            ("2", "a"),
            ("3", "a"),
            ("4", "a"),
            ("5", "a"),
            ("6", "a"),
            ("7", "a"),
        ]);
        let mut machine = ready_machine(data);
        assert_eq!(machine.carousel_len(), 5);

        machine.advance(1);
        assert_eq!(machine.active_index(), 1);
        machine.advance(-2);
        assert_eq!(machine.active_index(), 4);
        machine.advance(1);
        assert_eq!(machine.active_index(), 0);
        machine.advance(-11);
        assert_eq!(machine.active_index(), 4);
        machine.advance(i64::from(i32::MAX));
        assert_eq!(machine.active_index(), (4 + i32::MAX as usize) % 5);

        let model = machine.snapshot();
        assert_eq!(model.carousel().len(), 5);
        assert_eq!(
            model.current_slide().map(|r| r.id.clone()),
            Some(model.carousel()[model.active_index].id.clone())
        );
    }

    #[test]
    fn test_advance_matches_delta_mod_length() {
        let data = records(&[("1", "a"), ("2", "a"), ("3", "a")]);
        for delta in -20i64..20 {
            let mut direct = ready_machine(data.clone());
            let mut reduced = ready_machine(data.clone());
            direct.advance(delta);
            reduced.advance(delta.rem_euclid(3));
            assert_eq!(direct.active_index(), reduced.active_index(), "delta {}", delta);
        }
    }

    #[test]
    fn test_advance_handles_extreme_deltas() {
        let mut machine = ready_machine(records(&[("1", "a"), ("2", "a"), ("3", "a")]));
        machine.advance(1);

        assert_eq!(machine.advance(i64::MAX), Outcome::Applied);
        let expected = (1 + i64::MAX.rem_euclid(3) as usize) % 3;
        assert_eq!(machine.active_index(), expected);

        assert_eq!(machine.advance(i64::MIN), Outcome::Applied);
        let expected = (expected + i64::MIN.rem_euclid(3) as usize) % 3;
        assert_eq!(machine.active_index(), expected);
        assert!(machine.snapshot().current_slide().is_some());
    }

    #[test]
    fn test_advance_on_empty_carousel_is_noop() {
        let mut machine = ready_machine(records(&[]));
        assert_eq!(machine.advance(3), Outcome::Applied);
        assert_eq!(machine.active_index(), 0);
        assert_eq!(machine.advance(-7), Outcome::Applied);
        assert_eq!(machine.active_index(), 0);
    }

    #[test]
    fn test_advance_requires_ready() {
        let mut machine = SelectionMachine::<CatalogImageRecord>::new(5);
        assert_eq!(machine.advance(1), Outcome::NotReady);
        machine.start_fetch();
        assert_eq!(machine.advance(1), Outcome::NotReady);
    }

    #[test]
    fn test_detached_machine_ignores_events() {
        let mut machine = SelectionMachine::<CatalogImageRecord>::new(5);
        let token = machine.start_fetch().unwrap();
        machine.detach();

        assert_eq!(
            machine.fetch_succeeded(token, records(&[("1", "bridal")])),
            Outcome::Detached
        );
        assert_eq!(machine.select_category("bridal"), Outcome::Detached);
        assert_eq!(machine.advance(1), Outcome::Detached);
        assert!(machine.start_fetch().is_none());
        assert_eq!(machine.phase(), Phase::Loading);
    }

    #[test]
    fn test_subscribers_observe_transitions() {
        let mut machine = SelectionMachine::<CatalogImageRecord>::new(5);
        let mut rx = machine.subscribe();
        assert_eq!(rx.borrow_and_update().phase, Phase::Idle);

        let token = machine.start_fetch().unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().phase, Phase::Loading);

        machine.fetch_succeeded(token, records(&[("1", UNCATEGORIZED)]));
        let model = rx.borrow_and_update().clone();
        assert_eq!(model.phase, Phase::Ready);
        assert_eq!(model.filtered_records.len(), 1);
    }

    #[test]
    fn test_views_share_memoized_index() {
        let memo = IndexMemo::shared();
        let data = records(&[("1", "bridal"), ("2", "arabic")]);

        let mut grid = SelectionMachine::with_memo(5, memo.clone());
        let mut carousel = SelectionMachine::with_memo(5, memo.clone());
        let t1 = grid.start_fetch().unwrap();
        let t2 = carousel.start_fetch().unwrap();
        grid.fetch_succeeded(t1, data.clone());
        carousel.fetch_succeeded(t2, data);

        assert!(Arc::ptr_eq(grid.index().unwrap(), carousel.index().unwrap()));
        assert_eq!(memo.lock().unwrap().recomputations(), 1);
    }
}
