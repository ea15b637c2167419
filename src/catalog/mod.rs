//! Catalog query and view-state engine.
//!
//! - [`category`] / [`item`] - the data model
//! - [`cache`] - cached query results with freshness tracking
//! - [`repository`] - the fetch path: de-duplication, last-writer-wins,
//!   stale-while-revalidate, display derivation
//! - [`view`] / [`pipeline`] - user selection and the filter/sort pipeline
//! - [`mutation`] / [`draft`] - validated add-item submission
//! - [`backend`] - the remote store seam

pub mod backend;
pub mod cache;
pub mod category;
pub mod draft;
pub mod error;
pub mod item;
pub mod mutation;
pub mod pipeline;
pub mod query;
pub mod repository;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::CatalogBackend;
pub use cache::{CachedResult, Freshness, Invalidate, ItemCache};
pub use category::{Category, CategoryTag};
pub use draft::{AddItemRequest, ItemDraft};
pub use error::{CatalogError, CatalogResult};
pub use item::Item;
pub use mutation::{MutationCoordinator, MutationState};
pub use pipeline::derive_visible;
pub use query::QueryKey;
pub use repository::{CatalogStatus, Repository};
pub use view::{CategoryTab, SortMode, ViewState};
