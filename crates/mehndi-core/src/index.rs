//! Category grouping with memoized derivation
//!
//! [`CategoryIndex`] buckets a record list by category key in one O(n) pass,
//! keeping source order inside each bucket and first-appearance order across
//! keys. The index is immutable once built and is handed out behind an `Arc`,
//! so any number of views over the same fetch can read it.
//!
//! [`IndexMemo`] caches the last index keyed by the identity of the input list
//! (`Arc` pointer), falling back to a content fingerprint when a structurally
//! identical list arrives under a new allocation.

use crate::records::{Categorized, ALL_CATEGORIES};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryIndex<R> {
    records: Arc<[R]>,
    keys: Vec<String>,
    buckets: HashMap<String, Arc<[R]>>,
    empty: Arc<[R]>,
}

impl<R: Categorized + Clone> CategoryIndex<R> {
    pub fn build(records: Arc<[R]>) -> Self {
        let mut keys: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, Vec<R>> = HashMap::new();

        for record in records.iter() {
            match grouped.get_mut(record.category()) {
                Some(bucket) => bucket.push(record.clone()),
                None => {
                    keys.push(record.category().to_string());
                    grouped.insert(record.category().to_string(), vec![record.clone()]);
                }
            }
        }

        let buckets = grouped
            .into_iter()
            .map(|(key, bucket)| (key, Arc::from(bucket)))
            .collect();

        Self {
            records,
            keys,
            buckets,
            empty: Arc::from(Vec::new()),
        }
    }

    /// The full source list, in source order.
    pub fn records(&self) -> &Arc<[R]> {
        &self.records
    }

    /// Category keys in order of first appearance.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn get(&self, key: &str) -> Option<&Arc<[R]>> {
        self.buckets.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.buckets.contains_key(key)
    }

    /// First record of a bucket; the authoritative one when keys repeat.
    pub fn first(&self, key: &str) -> Option<&R> {
        self.buckets.get(key).and_then(|bucket| bucket.first())
    }

    /// One record per key (the first occurrence), in key order.
    pub fn firsts(&self) -> Vec<&R> {
        self.keys.iter().filter_map(|key| self.first(key)).collect()
    }

    /// Records for `key`; the `"all"` sentinel yields the full source list.
    ///
    /// The returned `Arc` is stable for a given key, so callers may compare
    /// results with `Arc::ptr_eq` to detect a change of filtered list.
    pub fn filter(&self, key: &str) -> Arc<[R]> {
        if key == ALL_CATEGORIES {
            return self.records.clone();
        }
        self.buckets
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.empty.clone())
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sum of bucket sizes; always equal to the source length.
    pub fn total(&self) -> usize {
        self.buckets.values().map(|bucket| bucket.len()).sum()
    }

    pub fn count(&self, key: &str) -> usize {
        self.filter(key).len()
    }

    /// `(key, size)` pairs in key order.
    pub fn counts(&self) -> Vec<(String, usize)> {
        self.keys
            .iter()
            .map(|key| (key.clone(), self.count(key)))
            .collect()
    }
}

/// Group `records` by category.
pub fn index<R: Categorized + Clone>(records: &Arc<[R]>) -> CategoryIndex<R> {
    CategoryIndex::build(records.clone())
}

struct CachedIndex<R> {
    input: Arc<[R]>,
    fingerprint: u64,
    index: Arc<CategoryIndex<R>>,
}

pub struct IndexMemo<R> {
    cached: Option<CachedIndex<R>>,
    recomputations: usize,
}

/// Memo shared by every view over the same catalog kind.
pub type SharedIndexMemo<R> = Arc<Mutex<IndexMemo<R>>>;

impl<R: Categorized + Clone + PartialEq + Hash> IndexMemo<R> {
    pub fn new() -> Self {
        Self {
            cached: None,
            recomputations: 0,
        }
    }

    pub fn shared() -> SharedIndexMemo<R> {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Index for `records`, recomputed only when the input changed.
    pub fn get(&mut self, records: &Arc<[R]>) -> Arc<CategoryIndex<R>> {
        if let Some(cached) = &self.cached {
            if Arc::ptr_eq(&cached.input, records) {
                log::debug!("Category index memo hit ({} records)", records.len());
                return cached.index.clone();
            }
        }

        let fingerprint = fingerprint(records);
        if let Some(cached) = &mut self.cached {
            if cached.fingerprint == fingerprint && cached.input[..] == records[..] {
                log::debug!("Category index memo hit by content ({} records)", records.len());
                cached.input = records.clone();
                return cached.index.clone();
            }
        }

        self.recomputations += 1;
        let index = Arc::new(CategoryIndex::build(records.clone()));
        log::debug!(
            "Category index rebuilt: {} records in {} categories",
            records.len(),
            index.len()
        );
        self.cached = Some(CachedIndex {
            input: records.clone(),
            fingerprint,
            index: index.clone(),
        });
        index
    }

    /// Number of times an index was actually built.
    pub fn recomputations(&self) -> usize {
        self.recomputations
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

impl<R: Categorized + Clone + PartialEq + Hash> Default for IndexMemo<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn fingerprint<R: Hash>(records: &[R]) -> u64 {
    let mut hasher = DefaultHasher::new();
    records.hash(&mut hasher);
    hasher.finish()
}
