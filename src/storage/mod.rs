mod items;
mod photos;
mod schema;
mod types;

pub use schema::{Database, DEFAULT_UPLOAD_CHUNK_BYTES};
pub use types::DatabaseError;
