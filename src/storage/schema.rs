use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;

use super::types::DatabaseError;

/// Default size of one photo upload chunk (64 KiB)
pub const DEFAULT_UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

// ============================================================================
// Database
// ============================================================================

#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
    pub(crate) upload_chunk_bytes: usize,
}

impl Database {
    /// Open a database connection and run migrations
    ///
    /// `":memory:"` opens a private in-memory store on a single connection.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InstanceLocked` if another process holds the
    /// database lock, `DatabaseError::Migration` if the schema could not be
    /// created, and `DatabaseError::Other` for anything else.
    pub async fn open(path: &str) -> Result<Self, DatabaseError> {
        let in_memory = path == ":memory:";
        let url = format!("sqlite:{}?mode=rwc", path);

        // Pre-create the file user-only so it never exists with umask permissions
        #[cfg(unix)]
        if !in_memory {
            use std::os::unix::fs::OpenOptionsExt;
            let db_path = std::path::Path::new(path);
            if !db_path.exists() && db_path.parent().is_some_and(|p| p.exists()) {
                let _file = std::fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .mode(0o600)
                    .open(db_path)
                    .ok(); // If creation fails, SQLite will report the error at connect_with.
            }
        }

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(DatabaseError::from_sqlx)?
            .foreign_keys(true)
            .pragma("busy_timeout", "5000");

        // Every connection to ":memory:" is a separate database, so pin one
        // connection and never let it expire.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        let db = Self {
            pool,
            upload_chunk_bytes: DEFAULT_UPLOAD_CHUNK_BYTES,
        };
        db.migrate().await.map_err(|e| {
            let error_string = e.to_string().to_lowercase();
            if error_string.contains("database is locked")
                || error_string.contains("database table is locked")
            {
                DatabaseError::InstanceLocked
            } else {
                DatabaseError::Migration(e.to_string())
            }
        })?;
        Ok(db)
    }

    /// Use `bytes` per photo chunk (minimum 1).
    pub fn with_upload_chunk_bytes(mut self, bytes: usize) -> Self {
        self.upload_chunk_bytes = bytes.max(1);
        self
    }

    /// Run database migrations atomically within a transaction.
    ///
    /// All statements use `IF NOT EXISTS`, so re-running on an existing
    /// database is a no-op.
    async fn migrate(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Photos are content-addressed; bytes live in ordered chunks
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS photos (
                digest TEXT PRIMARY KEY,
                size_bytes INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS photo_chunks (
                digest TEXT NOT NULL REFERENCES photos(digest) ON DELETE CASCADE,
                seq INTEGER NOT NULL,
                data BLOB NOT NULL,
                PRIMARY KEY (digest, seq)
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        // `seq` records insertion order for list queries
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                seq INTEGER PRIMARY KEY,
                id TEXT UNIQUE NOT NULL,
                timestamp INTEGER NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('Tin', 'Book', 'Patch', 'Uniform')),
                book_name TEXT,
                book_year INTEGER,
                photo_digest TEXT REFERENCES photos(digest)
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_kind ON items(kind)")
            .execute(&mut *tx)
            .await?;

        // Partial index for sortBooksByYear
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_items_book_year ON items(book_year, book_name) WHERE kind = 'Book'",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
