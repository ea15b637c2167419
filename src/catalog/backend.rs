use async_trait::async_trait;

use super::category::Category;
use super::error::CatalogResult;
use super::item::Item;
use crate::blob::Blob;

/// The remote store the catalog reads from and writes to.
///
/// One outstanding call per logical operation; each call suspends the caller
/// until the store answers. Implementations report a reused id as
/// [`CatalogError::DuplicateId`](super::CatalogError::DuplicateId), a lookup miss
/// as `NotFound`, and anything else as `RemoteFailure`.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Store a new item. A photo with local bytes is uploaded and reports
    /// progress through its observer.
    async fn add_item(&self, id: &str, category: &Category, photo: Option<&Blob>)
        -> CatalogResult<()>;

    async fn list_items(&self) -> CatalogResult<Vec<Item>>;

    /// Items whose category has the same tag as `category`. Payload fields of
    /// the argument are ignored.
    async fn filter_by_category(&self, category: &Category) -> CatalogResult<Vec<Item>>;

    async fn get_item(&self, id: &str) -> CatalogResult<Item>;

    /// Book items in store-side year order.
    async fn sort_books_by_year(&self) -> CatalogResult<Vec<Item>>;

    /// Bytes of a stored photo.
    async fn photo_bytes(&self, photo: &Blob) -> CatalogResult<Vec<u8>>;
}
