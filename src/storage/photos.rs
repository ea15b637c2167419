use chrono::Utc;
use sqlx::{Sqlite, Transaction};

use super::schema::Database;
use super::types::DatabaseError;
use crate::blob::Blob;

impl Database {
    // ========================================================================
    // Photo Storage
    // ========================================================================

    /// Write a photo's bytes in `upload_chunk_bytes` chunks inside `tx`.
    ///
    /// Photos are content-addressed: if the digest is already stored nothing is
    /// written. Cumulative progress is reported to the blob's observer after
    /// each chunk, ending at 100. A blob without local bytes must reference a
    /// photo the store already holds.
    pub(crate) async fn write_photo(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        photo: &Blob,
    ) -> Result<(), DatabaseError> {
        let existing: Option<(String,)> = sqlx::query_as("SELECT digest FROM photos WHERE digest = ?")
            .bind(photo.digest())
            .fetch_optional(&mut **tx)
            .await?;
        if existing.is_some() {
            tracing::debug!(digest = %photo.digest(), "Photo already stored, skipping upload");
            photo.report_progress(100);
            return Ok(());
        }

        let Some(data) = photo.bytes() else {
            return Err(DatabaseError::PhotoNotFound(photo.digest().to_string()));
        };

        sqlx::query("INSERT INTO photos (digest, size_bytes, created_at) VALUES (?, ?, ?)")
            .bind(photo.digest())
            .bind(data.len() as i64)
            .bind(Utc::now().timestamp())
            .execute(&mut **tx)
            .await?;

        let total = data.len();
        let mut written = 0usize;
        for (seq, chunk) in data.chunks(self.upload_chunk_bytes).enumerate() {
            sqlx::query("INSERT INTO photo_chunks (digest, seq, data) VALUES (?, ?, ?)")
                .bind(photo.digest())
                .bind(seq as i64)
                .bind(chunk)
                .execute(&mut **tx)
                .await?;
            written += chunk.len();
            photo.report_progress((written * 100 / total) as u8);
        }
        if total == 0 {
            photo.report_progress(100);
        }

        tracing::debug!(digest = %photo.digest(), bytes = total, "Stored photo");
        Ok(())
    }

    /// Reassemble a stored photo's bytes.
    pub async fn get_photo_bytes(&self, digest: &str) -> Result<Vec<u8>, DatabaseError> {
        let size: Option<(i64,)> = sqlx::query_as("SELECT size_bytes FROM photos WHERE digest = ?")
            .bind(digest)
            .fetch_optional(&self.pool)
            .await?;
        let Some((size,)) = size else {
            return Err(DatabaseError::PhotoNotFound(digest.to_string()));
        };

        let chunks: Vec<(Vec<u8>,)> =
            sqlx::query_as("SELECT data FROM photo_chunks WHERE digest = ? ORDER BY seq")
                .bind(digest)
                .fetch_all(&self.pool)
                .await?;

        let mut bytes = Vec::with_capacity(size.max(0) as usize);
        for (chunk,) in chunks {
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}
