//! Binary resources attached to items (photos).
//!
//! A [`Blob`] is an opaque reference to photo bytes. Blobs built from local
//! bytes carry the data for upload; blobs read back from the store carry only
//! the content digest and size. Upload progress is an out-of-band observer
//! attached to the handle, so items themselves never change while a photo is
//! being transferred.
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// Callback receiving upload progress as a percentage in `0..=100`.
pub type ProgressObserver = Arc<dyn Fn(u8) + Send + Sync>;

#[derive(Clone)]
pub struct Blob {
    digest: Arc<str>,
    size: u64,
    bytes: Option<Arc<[u8]>>,
    observer: Option<ProgressObserver>,
}

impl Blob {
    /// Wrap local bytes for upload. The digest is the hex SHA-256 of the data.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        let digest = format!("{:x}", Sha256::digest(&bytes));
        Self {
            digest: Arc::from(digest),
            size: bytes.len() as u64,
            bytes: Some(Arc::from(bytes)),
            observer: None,
        }
    }

    /// Reference to bytes already held by the store.
    pub fn stored(digest: impl Into<String>, size: u64) -> Self {
        Self {
            digest: Arc::from(digest.into()),
            size,
            bytes: None,
            observer: None,
        }
    }

    /// Return a handle that reports upload progress to `observer`.
    pub fn with_progress_observer(mut self, observer: impl Fn(u8) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Local bytes, when this handle was built from data rather than read back.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    /// Stable URL-like reference suitable for display layers.
    pub fn display_url(&self) -> String {
        format!("blob:sha256:{}", self.digest)
    }

    /// Forward progress to the attached observer, if any. Values above 100 are clamped.
    pub fn report_progress(&self, percent: u8) {
        if let Some(observer) = &self.observer {
            observer(percent.min(100));
        }
    }
}

/// Blobs are equal when they reference the same content.
impl PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

impl Eq for Blob {}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("digest", &self.digest)
            .field("size", &self.size)
            .field("local", &self.bytes.is_some())
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

impl Serialize for Blob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Blob", 3)?;
        state.serialize_field("digest", &*self.digest)?;
        state.serialize_field("size", &self.size)?;
        state.serialize_field("url", &self.display_url())?;
        state.end()
    }
}
