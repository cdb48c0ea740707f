//! Local preview resources backing gallery images while a draft is edited.
//!
//! Every gallery entry owns a [`PreviewHandle`]. The handle releases its
//! resource when dropped, so removing an entry, resetting a draft or dropping
//! a whole form releases each preview exactly once.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Identifier of a live preview.
pub type PreviewId = u64;

/// Source of local preview resources.
pub trait PreviewStore: Send + Sync {
    /// Allocate a preview for the image hosted at `url`.
    fn acquire(&self, url: &str) -> PreviewId;
    /// Free a preview previously returned by [`PreviewStore::acquire`].
    fn release(&self, id: PreviewId);
}

/// Owning handle to a preview; releases it on drop.
pub struct PreviewHandle {
    id: PreviewId,
    store: Arc<dyn PreviewStore>,
}

impl PreviewHandle {
    /// Acquire a new preview for `url` from `store`.
    pub fn acquire(store: &Arc<dyn PreviewStore>, url: &str) -> Self {
        Self {
            id: store.acquire(url),
            store: Arc::clone(store),
        }
    }

    pub fn id(&self) -> PreviewId {
        self.id
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.store.release(self.id);
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle").field("id", &self.id).finish()
    }
}

/// In-memory preview store shared by all console sessions.
///
/// Live previews are served under `/products/form/previews/{id}` until released.
#[derive(Default)]
pub struct PreviewRegistry {
    next_id: AtomicU64,
    live: Mutex<HashMap<PreviewId, String>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hosted URL behind a live preview.
    pub fn resolve(&self, id: PreviewId) -> Option<String> {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Number of previews that have not been released yet.
    pub fn live_count(&self) -> usize {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl PreviewStore for PreviewRegistry {
    fn acquire(&self, url: &str) -> PreviewId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, url.to_string());
        id
    }

    fn release(&self, id: PreviewId) {
        let removed = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if removed.is_none() {
            log::warn!("Preview {id} released twice or never acquired");
        }
    }
}
