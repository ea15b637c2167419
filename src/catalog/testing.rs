//! In-memory backend with scripted failures and gated responses for unit tests.
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

use super::backend::CatalogBackend;
use super::category::{Category, CategoryTag};
use super::error::{CatalogError, CatalogResult};
use super::item::Item;
use crate::blob::Blob;

type Gate = oneshot::Receiver<CatalogResult<Vec<Item>>>;

#[derive(Default)]
pub(crate) struct ScriptedBackend {
    items: Mutex<Vec<Item>>,
    list_gates: Mutex<VecDeque<Gate>>,
    next_list_error: Mutex<Option<CatalogError>>,
    next_add_error: Mutex<Option<CatalogError>>,
    clock: AtomicUsize,
    list_calls: AtomicUsize,
    filter_calls: AtomicUsize,
    add_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Backend holding one patch per id, oldest first.
    pub(crate) fn with_items<const N: usize>(ids: [&str; N]) -> Self {
        let backend = Self::new();
        for item in Self::items(ids) {
            backend.push(item);
        }
        backend
    }

    pub(crate) fn items<const N: usize>(ids: [&str; N]) -> Vec<Item> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Self::item(id, i as i64 + 1, Category::Patch))
            .collect()
    }

    pub(crate) fn item(id: &str, timestamp: i64, category: Category) -> Item {
        Item {
            id: id.to_string(),
            timestamp,
            category,
            photo: None,
        }
    }

    pub(crate) fn book(id: &str, timestamp: i64, name: &str, year: i64) -> Item {
        Self::item(id, timestamp, Category::book(name, year))
    }

    pub(crate) fn push(&self, item: Item) {
        self.items.lock().unwrap().push(item);
    }

    /// The next `list_items` call waits for `gate` and answers with its value.
    pub(crate) fn gate_list(&self, gate: Gate) {
        self.list_gates.lock().unwrap().push_back(gate);
    }

    pub(crate) fn fail_next_list(&self, err: CatalogError) {
        *self.next_list_error.lock().unwrap() = Some(err);
    }

    pub(crate) fn fail_next_add(&self, err: CatalogError) {
        *self.next_add_error.lock().unwrap() = Some(err);
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn filter_calls(&self) -> usize {
        self.filter_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> Vec<Item> {
        self.items.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogBackend for ScriptedBackend {
    async fn add_item(
        &self,
        id: &str,
        category: &Category,
        photo: Option<&Blob>,
    ) -> CatalogResult<()> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.next_add_error.lock().unwrap().take() {
            return Err(err);
        }
        if let Some(photo) = photo {
            for percent in [25, 50, 75, 100] {
                photo.report_progress(percent);
                tokio::task::yield_now().await;
            }
        }

        let mut items = self.items.lock().unwrap();
        if items.iter().any(|i| i.id == id) {
            return Err(CatalogError::DuplicateId(id.to_string()));
        }
        let timestamp = 1_000 + self.clock.fetch_add(1, Ordering::SeqCst) as i64;
        items.push(Item {
            id: id.to_string(),
            timestamp,
            category: category.clone(),
            photo: photo.map(|p| Blob::stored(p.digest(), p.size())),
        });
        Ok(())
    }

    async fn list_items(&self) -> CatalogResult<Vec<Item>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.next_list_error.lock().unwrap().take() {
            return Err(err);
        }
        let gate = self.list_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            return gate
                .await
                .unwrap_or_else(|_| Err(CatalogError::RemoteFailure("gate dropped".into())));
        }
        tokio::task::yield_now().await;
        Ok(self.snapshot())
    }

    async fn filter_by_category(&self, category: &Category) -> CatalogResult<Vec<Item>> {
        self.filter_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let tag = category.tag();
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|i| i.category.tag() == tag)
            .collect())
    }

    async fn get_item(&self, id: &str) -> CatalogResult<Item> {
        self.snapshot()
            .into_iter()
            .find(|i| i.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    async fn sort_books_by_year(&self) -> CatalogResult<Vec<Item>> {
        let mut books: Vec<Item> = self
            .snapshot()
            .into_iter()
            .filter(|i| i.category.tag() == CategoryTag::Book)
            .collect();
        books.sort_by_key(|i| i.category.book_year());
        Ok(books)
    }

    async fn photo_bytes(&self, photo: &Blob) -> CatalogResult<Vec<u8>> {
        Err(CatalogError::NotFound(photo.digest().to_string()))
    }
}
