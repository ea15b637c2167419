//! Add-item submission.
//!
//! Each attempt moves `Idle -> Submitting -> Succeeded | Failed`. Observers
//! follow the attempt (including photo upload progress) through a
//! `tokio::sync::watch` channel. On success every cached query is invalidated
//! before success is reported; on failure the cache is left alone.
//!
//! One attempt is tracked at a time. Preventing a second submission while one
//! is in flight is the caller's job: a concurrent call simply overwrites the
//! tracked state.
use std::sync::Arc;
use tokio::sync::watch;

use super::cache::Invalidate;
use super::draft::{AddItemRequest, ItemDraft};
use super::error::CatalogResult;
use super::repository::Repository;
use super::CatalogError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationState {
    #[default]
    Idle,
    Submitting {
        id: String,
        /// Upload progress in percent, present only when a photo is attached
        progress: Option<u8>,
    },
    Succeeded {
        id: String,
    },
    Failed {
        id: String,
        error: CatalogError,
    },
}

pub struct MutationCoordinator {
    repository: Repository,
    state: Arc<watch::Sender<MutationState>>,
}

impl MutationCoordinator {
    pub fn new(repository: Repository) -> Self {
        let (state, _) = watch::channel(MutationState::Idle);
        Self {
            repository,
            state: Arc::new(state),
        }
    }

    /// Follow attempt state and upload progress.
    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> MutationState {
        self.state.borrow().clone()
    }

    /// Validate a form draft and submit it. Validation failures are reported
    /// like any other failed attempt.
    pub async fn submit_draft(&self, draft: ItemDraft, max_photo_bytes: u64) -> CatalogResult<()> {
        let id = draft.intended_id();
        match draft.into_request(max_photo_bytes) {
            Ok(request) => self.submit(request).await,
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Rejected add-item draft");
                self.state.send_replace(MutationState::Failed {
                    id,
                    error: e.clone(),
                });
                Err(e)
            }
        }
    }

    /// Send one add-item request to the store. Never retried.
    pub async fn submit(&self, request: AddItemRequest) -> CatalogResult<()> {
        let AddItemRequest {
            id,
            category,
            photo,
        } = request;

        self.state.send_replace(MutationState::Submitting {
            id: id.clone(),
            progress: photo.as_ref().map(|_| 0),
        });

        let photo = photo.map(|blob| {
            let state = Arc::clone(&self.state);
            blob.with_progress_observer(move |percent| {
                state.send_modify(|current| {
                    if let MutationState::Submitting { progress, .. } = current {
                        *progress = Some(percent);
                    }
                });
            })
        });

        let outcome = self
            .repository
            .backend()
            .add_item(&id, &category, photo.as_ref())
            .await;

        match outcome {
            Ok(()) => {
                self.repository.invalidate(Invalidate::All);
                tracing::info!(id = %id, category = %category.tag(), "Item added");
                self.state.send_replace(MutationState::Succeeded { id });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Failed to add item");
                self.state.send_replace(MutationState::Failed {
                    id,
                    error: e.clone(),
                });
                Err(e)
            }
        }
    }
}
