use async_trait::async_trait;
use chrono::Utc;

use super::schema::Database;
use super::types::{DatabaseError, ItemRow};
use crate::blob::Blob;
use crate::catalog::{CatalogBackend, CatalogResult, Category, CategoryTag, Item};

const SELECT_ITEMS: &str = r#"
    SELECT i.id, i.timestamp, i.kind, i.book_name, i.book_year,
           i.photo_digest, p.size_bytes AS photo_size
    FROM items i
    LEFT JOIN photos p ON p.digest = i.photo_digest
"#;

impl Database {
    // ========================================================================
    // Item Operations
    // ========================================================================

    /// Store a new item, uploading its photo first when one is attached.
    ///
    /// The id check, photo upload and insert share one transaction, so a
    /// failed upload leaves no item behind. Timestamps are nanoseconds and
    /// strictly increase across inserts even if the wall clock does not.
    pub async fn add_item(
        &self,
        id: &str,
        category: &Category,
        photo: Option<&Blob>,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM items WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(DatabaseError::DuplicateId(id.to_string()));
        }

        if let Some(photo) = photo {
            self.write_photo(&mut tx, photo).await?;
        }

        let (latest,): (Option<i64>,) = sqlx::query_as("SELECT MAX(timestamp) FROM items")
            .fetch_one(&mut *tx)
            .await?;
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        let timestamp = match latest {
            Some(latest) if latest >= now => latest.saturating_add(1),
            _ => now,
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO items (id, timestamp, kind, book_name, book_year, photo_digest)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(timestamp)
        .bind(category.tag().as_str())
        .bind(category.book_name())
        .bind(category.book_year())
        .bind(photo.map(Blob::digest))
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if DatabaseError::is_unique_violation(&e) {
                return Err(DatabaseError::DuplicateId(id.to_string()));
            }
            return Err(e.into());
        }

        tx.commit().await?;
        tracing::debug!(id = %id, kind = %category.tag(), timestamp, "Inserted item");
        Ok(())
    }

    /// Every item in insertion order.
    pub async fn list_items(&self) -> Result<Vec<Item>, DatabaseError> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!("{SELECT_ITEMS} ORDER BY i.seq"))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(ItemRow::into_item).collect()
    }

    /// Items of the given kind in insertion order.
    pub async fn filter_by_tag(&self, tag: CategoryTag) -> Result<Vec<Item>, DatabaseError> {
        let rows: Vec<ItemRow> =
            sqlx::query_as(&format!("{SELECT_ITEMS} WHERE i.kind = ? ORDER BY i.seq"))
                .bind(tag.as_str())
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(ItemRow::into_item).collect()
    }

    pub async fn get_item(&self, id: &str) -> Result<Item, DatabaseError> {
        let row: Option<ItemRow> = sqlx::query_as(&format!("{SELECT_ITEMS} WHERE i.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or_else(|| DatabaseError::ItemNotFound(id.to_string()))?
            .into_item()
    }

    /// Books ordered by year, then name, then insertion order.
    pub async fn books_by_year(&self) -> Result<Vec<Item>, DatabaseError> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            "{SELECT_ITEMS} WHERE i.kind = 'Book' ORDER BY i.book_year, i.book_name, i.seq"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ItemRow::into_item).collect()
    }
}

#[async_trait]
impl CatalogBackend for Database {
    async fn add_item(
        &self,
        id: &str,
        category: &Category,
        photo: Option<&Blob>,
    ) -> CatalogResult<()> {
        Ok(Database::add_item(self, id, category, photo).await?)
    }

    async fn list_items(&self) -> CatalogResult<Vec<Item>> {
        Ok(Database::list_items(self).await?)
    }

    async fn filter_by_category(&self, category: &Category) -> CatalogResult<Vec<Item>> {
        Ok(self.filter_by_tag(category.tag()).await?)
    }

    async fn get_item(&self, id: &str) -> CatalogResult<Item> {
        Ok(Database::get_item(self, id).await?)
    }

    async fn sort_books_by_year(&self) -> CatalogResult<Vec<Item>> {
        Ok(self.books_by_year().await?)
    }

    async fn photo_bytes(&self, photo: &Blob) -> CatalogResult<Vec<u8>> {
        Ok(self.get_photo_bytes(photo.digest()).await?)
    }
}
