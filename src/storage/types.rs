use thiserror::Error;

use crate::blob::Blob;
use crate::catalog::{CatalogError, Category, CategoryTag, Item};

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process has locked the database
    #[error("Another curio process appears to be using the catalog. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// An item with this id is already stored
    #[error("Item id already exists: {0}")]
    DuplicateId(String),

    /// No item with this id
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// A photo reference points at bytes the store does not hold
    #[error("Photo not found: {0}")]
    PhotoNotFound(String),

    /// A stored row could not be mapped back to an item
    #[error("Corrupt item row: {0}")]
    Corrupt(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_CANTOPEN (14)
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }

    pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
        matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
    }
}

impl From<DatabaseError> for CatalogError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::DuplicateId(id) => CatalogError::DuplicateId(id),
            DatabaseError::ItemNotFound(id) => CatalogError::NotFound(id),
            DatabaseError::PhotoNotFound(digest) => CatalogError::NotFound(digest),
            other => CatalogError::remote(other),
        }
    }
}

// ============================================================================
// Row Types
// ============================================================================

/// Internal row type for item queries (items LEFT JOIN photos)
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ItemRow {
    pub id: String,
    pub timestamp: i64,
    pub kind: String,
    pub book_name: Option<String>,
    pub book_year: Option<i64>,
    pub photo_digest: Option<String>,
    pub photo_size: Option<i64>,
}

impl ItemRow {
    pub(crate) fn into_item(self) -> Result<Item, DatabaseError> {
        let tag: CategoryTag = self
            .kind
            .parse()
            .map_err(|_| DatabaseError::Corrupt(format!("{}: unknown kind '{}'", self.id, self.kind)))?;

        let category = match tag {
            CategoryTag::Book => match (self.book_name, self.book_year) {
                (Some(name), Some(year)) => Category::Book { name, year },
                _ => {
                    return Err(DatabaseError::Corrupt(format!(
                        "{}: book without name or year",
                        self.id
                    )))
                }
            },
            CategoryTag::Tin => Category::Tin,
            CategoryTag::Patch => Category::Patch,
            CategoryTag::Uniform => Category::Uniform,
        };

        let photo = self
            .photo_digest
            .map(|digest| Blob::stored(digest, self.photo_size.unwrap_or(0).max(0) as u64));

        Ok(Item {
            id: self.id,
            timestamp: self.timestamp,
            category,
            photo,
        })
    }
}
