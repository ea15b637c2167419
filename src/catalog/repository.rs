//! Fetch path over the item cache.
//!
//! [`Repository`] is the only writer of the shared [`ItemCache`]. It issues
//! remote queries, joins concurrent requests for the same key onto one
//! in-flight call, applies results with last-writer-wins per key, and derives
//! the visible list for a [`ViewState`].
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::backend::CatalogBackend;
use super::cache::{CachedResult, Invalidate, ItemCache};
use super::category::Category;
use super::error::{CatalogError, CatalogResult};
use super::item::Item;
use super::pipeline::derive_visible;
use super::query::QueryKey;
use super::view::ViewState;

type SharedFetch = Shared<BoxFuture<'static, CatalogResult<Arc<Vec<Item>>>>>;

/// A remote call that later requests for the same key attach to.
struct InFlight {
    generation: u64,
    future: SharedFetch,
}

#[derive(Default)]
struct Inner {
    cache: ItemCache,
    in_flight: HashMap<QueryKey, InFlight>,
}

/// Combined loading/error flags for the collection views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogStatus {
    /// Some collection view has nothing to show yet and a fetch is pending
    pub loading: bool,
    /// Some collection view's latest fetch failed
    pub errored: bool,
}

#[derive(Clone)]
pub struct Repository {
    backend: Arc<dyn CatalogBackend>,
    inner: Arc<Mutex<Inner>>,
}

impl Repository {
    pub fn new(backend: Arc<dyn CatalogBackend>) -> Self {
        Self {
            backend,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn backend(&self) -> &Arc<dyn CatalogBackend> {
        &self.backend
    }

    // The lock is never held across an await, so a poisoned guard still
    // protects consistent data.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ========================================================================
    // Fetching
    // ========================================================================

    /// Fetch `key` from the store and cache the result.
    ///
    /// A request for a key that already has a call in flight joins that call
    /// instead of issuing another. On failure the previously cached value is
    /// left untouched and the error is recorded against the key.
    pub async fn fetch(&self, key: QueryKey) -> CatalogResult<Arc<Vec<Item>>> {
        let (generation, future) = {
            let mut inner = self.lock();
            match inner.in_flight.get(&key) {
                Some(pending) => {
                    tracing::debug!(key = %key, generation = pending.generation, "Joining in-flight fetch");
                    (pending.generation, pending.future.clone())
                }
                None => {
                    let generation = inner.cache.begin_fetch();
                    let future = run_query(Arc::clone(&self.backend), key)
                        .boxed()
                        .shared();
                    inner.in_flight.insert(
                        key,
                        InFlight {
                            generation,
                            future: future.clone(),
                        },
                    );
                    tracing::debug!(key = %key, generation, "Issued fetch");
                    (generation, future)
                }
            }
        };

        let outcome = future.await;

        let mut inner = self.lock();
        if inner
            .in_flight
            .get(&key)
            .is_some_and(|pending| pending.generation == generation)
        {
            inner.in_flight.remove(&key);
        }
        if inner.cache.apply(key, generation, &outcome) {
            if let Err(e) = &outcome {
                tracing::warn!(key = %key, error = %e, "Fetch failed, keeping cached value");
            }
        }
        outcome
    }

    /// Cached result for `key` if fresh, otherwise fetch it.
    pub async fn ensure(&self, key: QueryKey) -> CatalogResult<Arc<Vec<Item>>> {
        if let Some(items) = self.lock().cache.get(key) {
            return Ok(items);
        }
        self.fetch(key).await
    }

    /// Refetch every key without a fresh value, concurrently.
    ///
    /// Returns one outcome per refetched key. Keys that are already fresh are
    /// skipped.
    pub async fn refresh_stale(&self) -> Vec<(QueryKey, CatalogResult<Arc<Vec<Item>>>)> {
        let keys: Vec<QueryKey> = {
            let inner = self.lock();
            QueryKey::all()
                .into_iter()
                .filter(|key| inner.cache.needs_fetch(*key))
                .collect()
        };
        join_all(
            keys.into_iter()
                .map(|key| async move { (key, self.fetch(key).await) }),
        )
        .await
    }

    /// Look up one item. Not cached.
    pub async fn get_item(&self, id: &str) -> CatalogResult<Item> {
        self.backend.get_item(id).await
    }

    // ========================================================================
    // Cache access
    // ========================================================================

    /// Fresh cached result for `key`.
    pub fn get(&self, key: QueryKey) -> Option<Arc<Vec<Item>>> {
        self.lock().cache.get(key)
    }

    /// Last successful result for `key`, fresh or stale.
    pub fn peek(&self, key: QueryKey) -> Option<CachedResult> {
        self.lock().cache.peek(key)
    }

    pub fn error(&self, key: QueryKey) -> Option<CatalogError> {
        self.lock().cache.error(key).cloned()
    }

    /// Mark entries stale. In-flight calls for those keys are detached so the
    /// next fetch issues a new request; if a detached call resolves later its
    /// result lands stale or is discarded.
    pub fn invalidate(&self, scope: Invalidate) {
        let mut inner = self.lock();
        inner.cache.invalidate(scope);
        match scope {
            Invalidate::Key(key) => {
                inner.in_flight.remove(&key);
            }
            Invalidate::All => inner.in_flight.clear(),
        }
    }

    // ========================================================================
    // Derived views
    // ========================================================================

    /// Display list for `view`, built from whatever the cache holds for the
    /// selected tab (stale values included). Empty until the first fetch lands.
    pub fn visible_items(&self, view: &ViewState) -> Vec<Item> {
        match self.peek(view.selected_category().query_key()) {
            Some(cached) => derive_visible(&cached.items, view),
            None => Vec::new(),
        }
    }

    /// Make sure the selected tab has a trusted base collection, then derive
    /// the display list.
    pub async fn load_view(&self, view: &ViewState) -> CatalogResult<Vec<Item>> {
        let base = self.ensure(view.selected_category().query_key()).await?;
        Ok(derive_visible(&base, view))
    }

    pub fn status(&self) -> CatalogStatus {
        let inner = self.lock();
        let mut status = CatalogStatus::default();
        for key in QueryKey::all() {
            if key == QueryKey::BooksSortedByYear {
                continue;
            }
            if inner.cache.peek(key).is_none() && inner.in_flight.contains_key(&key) {
                status.loading = true;
            }
            if inner.cache.error(key).is_some() {
                status.errored = true;
            }
        }
        status
    }
}

async fn run_query(
    backend: Arc<dyn CatalogBackend>,
    key: QueryKey,
) -> CatalogResult<Arc<Vec<Item>>> {
    let items = match key {
        QueryKey::AllItems => backend.list_items().await?,
        QueryKey::ByCategory(tag) => backend.filter_by_category(&Category::probe(tag)).await?,
        QueryKey::BooksSortedByYear => backend.sort_books_by_year().await?,
    };
    Ok(Arc::new(items))
}
