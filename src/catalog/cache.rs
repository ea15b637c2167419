//! Client-side cache of named query results.
//!
//! Each [`QueryKey`] maps to its last successful result plus a freshness flag.
//! Entries are replaced wholesale; there are no partial updates. Invalidation
//! marks entries stale without dropping their data, so a stale value can still
//! be shown while a refetch is pending (stale-while-revalidate).
//!
//! Every fetch is stamped with a generation number from [`ItemCache::begin_fetch`].
//! A result is only applied if its generation is newer than the one already
//! applied for that key (last writer wins), and a result from a fetch issued
//! before an invalidation is stored as stale, never as fresh.
use std::collections::HashMap;
use std::sync::Arc;

use super::error::CatalogError;
use super::item::Item;
use super::query::QueryKey;

/// Whether a cached value can be trusted without refetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

/// A cached query result as handed to readers.
#[derive(Debug, Clone)]
pub struct CachedResult {
    pub items: Arc<Vec<Item>>,
    pub freshness: Freshness,
}

impl CachedResult {
    pub fn is_fresh(&self) -> bool {
        self.freshness == Freshness::Fresh
    }
}

/// Which entries an invalidation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidate {
    Key(QueryKey),
    All,
}

#[derive(Debug, Default)]
struct CacheEntry {
    items: Option<Arc<Vec<Item>>>,
    fresh: bool,
    error: Option<CatalogError>,
    /// Generation of the last result (success or failure) applied to this entry
    applied_generation: u64,
    /// Fetches issued at or before this generation predate the last invalidation
    invalidated_at: u64,
}

#[derive(Debug, Default)]
pub struct ItemCache {
    entries: HashMap<QueryKey, CacheEntry>,
    generation: u64,
    /// Invalidation mark applied to every key, including ones never fetched
    invalidated_all_at: u64,
}

impl ItemCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last successful result for `key`, only if it is fresh.
    ///
    /// Returns `None` if the key was never fetched or has been invalidated and
    /// not yet refetched. Use [`ItemCache::peek`] for optimistic display of
    /// stale data.
    pub fn get(&self, key: QueryKey) -> Option<Arc<Vec<Item>>> {
        let entry = self.entries.get(&key)?;
        if entry.fresh {
            entry.items.clone()
        } else {
            None
        }
    }

    /// Last successful result for `key` regardless of freshness.
    pub fn peek(&self, key: QueryKey) -> Option<CachedResult> {
        let entry = self.entries.get(&key)?;
        entry.items.as_ref().map(|items| CachedResult {
            items: Arc::clone(items),
            freshness: if entry.fresh {
                Freshness::Fresh
            } else {
                Freshness::Stale
            },
        })
    }

    /// Replace the cached result for `key` and mark it fresh.
    pub fn set(&mut self, key: QueryKey, items: Vec<Item>) {
        let generation = self.begin_fetch();
        self.apply(key, generation, &Ok(Arc::new(items)));
    }

    /// Mark one or all entries stale. Cached values are kept for display.
    pub fn invalidate(&mut self, scope: Invalidate) {
        let mark = self.generation;
        match scope {
            Invalidate::Key(key) => {
                let entry = self.entries.entry(key).or_default();
                entry.fresh = false;
                entry.invalidated_at = mark;
                tracing::debug!(key = %key, generation = mark, "Invalidated query");
            }
            Invalidate::All => {
                self.invalidated_all_at = mark;
                for entry in self.entries.values_mut() {
                    entry.fresh = false;
                    entry.invalidated_at = mark;
                }
                tracing::debug!(generation = mark, "Invalidated all queries");
            }
        }
    }

    /// True if `key` has no trusted value and should be fetched.
    pub fn needs_fetch(&self, key: QueryKey) -> bool {
        self.entries
            .get(&key)
            .map_or(true, |e| !e.fresh || e.items.is_none())
    }

    /// Error from the most recent fetch of `key`, cleared by the next success.
    pub fn error(&self, key: QueryKey) -> Option<&CatalogError> {
        self.entries.get(&key).and_then(|e| e.error.as_ref())
    }

    /// Issue a generation number for a new fetch.
    pub(crate) fn begin_fetch(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Apply the outcome of the fetch stamped `generation`.
    ///
    /// Returns `false` when the outcome was discarded because a newer fetch for
    /// the same key has already been applied. A failure never touches the
    /// cached value; it only records the error.
    pub(crate) fn apply(
        &mut self,
        key: QueryKey,
        generation: u64,
        outcome: &Result<Arc<Vec<Item>>, CatalogError>,
    ) -> bool {
        let invalidated_all_at = self.invalidated_all_at;
        let entry = self.entries.entry(key).or_default();

        if generation <= entry.applied_generation {
            tracing::debug!(
                key = %key,
                generation,
                applied = entry.applied_generation,
                "Discarding superseded fetch result"
            );
            return false;
        }
        entry.applied_generation = generation;

        match outcome {
            Ok(items) => {
                let mark = entry.invalidated_at.max(invalidated_all_at);
                entry.items = Some(Arc::clone(items));
                entry.fresh = generation > mark;
                entry.error = None;
                tracing::debug!(
                    key = %key,
                    generation,
                    count = items.len(),
                    fresh = entry.fresh,
                    "Cached query result"
                );
            }
            Err(e) => {
                entry.error = Some(e.clone());
                tracing::debug!(key = %key, generation, error = %e, "Recorded fetch failure");
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, CategoryTag};

    fn item(id: &str) -> Item {
        Item {
            id: id.to_string(),
            timestamp: 1,
            category: Category::Patch,
            photo: None,
        }
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_get_absent_before_first_fetch() {
        let cache = ItemCache::new();
        assert!(cache.get(QueryKey::AllItems).is_none());
        assert!(cache.peek(QueryKey::AllItems).is_none());
        assert!(cache.needs_fetch(QueryKey::AllItems));
    }

    #[test]
    fn test_set_then_get() {
        let mut cache = ItemCache::new();
        cache.set(QueryKey::AllItems, vec![item("a"), item("b")]);

        let items = cache.get(QueryKey::AllItems).unwrap();
        assert_eq!(ids(&items), vec!["a", "b"]);
        assert!(!cache.needs_fetch(QueryKey::AllItems));
    }

    #[test]
    fn test_set_replaces_wholesale() {
        let mut cache = ItemCache::new();
        cache.set(QueryKey::AllItems, vec![item("a"), item("b")]);
        cache.set(QueryKey::AllItems, vec![item("c")]);

        assert_eq!(ids(&cache.get(QueryKey::AllItems).unwrap()), vec!["c"]);
    }

    #[test]
    fn test_invalidate_key_keeps_stale_value() {
        let mut cache = ItemCache::new();
        let books = QueryKey::ByCategory(CategoryTag::Book);
        cache.set(QueryKey::AllItems, vec![item("a")]);
        cache.set(books, vec![item("b")]);

        cache.invalidate(Invalidate::Key(QueryKey::AllItems));

        assert!(cache.get(QueryKey::AllItems).is_none());
        let stale = cache.peek(QueryKey::AllItems).unwrap();
        assert_eq!(stale.freshness, Freshness::Stale);
        assert_eq!(ids(&stale.items), vec!["a"]);

        // Unrelated keys stay fresh
        assert!(cache.get(books).is_some());
    }

    #[test]
    fn test_invalidate_all_marks_every_entry_stale() {
        let mut cache = ItemCache::new();
        for key in QueryKey::all() {
            cache.set(key, vec![item("x")]);
        }

        cache.invalidate(Invalidate::All);

        for key in QueryKey::all() {
            assert!(cache.get(key).is_none(), "{key} should be stale");
            assert!(cache.needs_fetch(key));
            assert!(cache.peek(key).is_some());
        }
    }

    #[test]
    fn test_refetch_after_invalidate_is_fresh() {
        let mut cache = ItemCache::new();
        cache.set(QueryKey::AllItems, vec![item("a")]);
        cache.invalidate(Invalidate::All);
        cache.set(QueryKey::AllItems, vec![item("a"), item("b")]);

        let fresh = cache.peek(QueryKey::AllItems).unwrap();
        assert!(fresh.is_fresh());
        assert_eq!(ids(&fresh.items), vec!["a", "b"]);
    }

    #[test]
    fn test_failure_keeps_previous_value() {
        let mut cache = ItemCache::new();
        cache.set(QueryKey::AllItems, vec![item("a")]);

        let generation = cache.begin_fetch();
        let applied = cache.apply(
            QueryKey::AllItems,
            generation,
            &Err(CatalogError::RemoteFailure("boom".into())),
        );

        assert!(applied);
        assert_eq!(ids(&cache.get(QueryKey::AllItems).unwrap()), vec!["a"]);
        assert_eq!(
            cache.error(QueryKey::AllItems),
            Some(&CatalogError::RemoteFailure("boom".into()))
        );
    }

    #[test]
    fn test_success_clears_error() {
        let mut cache = ItemCache::new();
        let generation = cache.begin_fetch();
        cache.apply(
            QueryKey::AllItems,
            generation,
            &Err(CatalogError::RemoteFailure("boom".into())),
        );
        assert!(cache.error(QueryKey::AllItems).is_some());
        assert!(cache.peek(QueryKey::AllItems).is_none());

        cache.set(QueryKey::AllItems, vec![item("a")]);
        assert!(cache.error(QueryKey::AllItems).is_none());
    }

    #[test]
    fn test_older_result_resolving_late_is_discarded() {
        let mut cache = ItemCache::new();
        let older = cache.begin_fetch();
        let newer = cache.begin_fetch();

        assert!(cache.apply(QueryKey::AllItems, newer, &Ok(Arc::new(vec![item("new")]))));
        assert!(!cache.apply(QueryKey::AllItems, older, &Ok(Arc::new(vec![item("old")]))));

        assert_eq!(ids(&cache.get(QueryKey::AllItems).unwrap()), vec!["new"]);
    }

    #[test]
    fn test_fetch_issued_before_invalidation_lands_stale() {
        let mut cache = ItemCache::new();
        let in_flight = cache.begin_fetch();
        cache.invalidate(Invalidate::All);

        cache.apply(QueryKey::AllItems, in_flight, &Ok(Arc::new(vec![item("a")])));

        assert!(cache.get(QueryKey::AllItems).is_none());
        assert!(cache.needs_fetch(QueryKey::AllItems));
        assert_eq!(
            cache.peek(QueryKey::AllItems).unwrap().freshness,
            Freshness::Stale
        );
    }
}
