use chrono::{DateTime, Utc};
use serde::Serialize;

use super::category::Category;
use crate::blob::Blob;

/// A catalogued piece of memorabilia.
///
/// Items are immutable once created: there is no update or delete. `id` is
/// unique across all categories (enforced by the store), and `timestamp` is the
/// creation instant in nanoseconds since the Unix epoch as assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: String,
    pub timestamp: i64,
    pub category: Category,
    pub photo: Option<Blob>,
}

impl Item {
    /// Primary display text: the book title for books, the id otherwise.
    pub fn title(&self) -> &str {
        match &self.category {
            Category::Book { name, .. } => name,
            Category::Tin | Category::Patch | Category::Uniform => &self.id,
        }
    }

    /// Secondary display text, only books have one.
    pub fn subtitle(&self) -> Option<String> {
        match &self.category {
            Category::Book { year, .. } => Some(format!("Year: {year}")),
            Category::Tin | Category::Patch | Category::Uniform => None,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.timestamp)
    }
}
