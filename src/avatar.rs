//! Participant avatar cache
//!
//! Avatars are resolved lazily by user id and memoized, so a user appearing
//! in many conversations costs one lookup. Concurrent requests for the same
//! uncached id are coalesced: the per-key cell admits a single initializer
//! and every other caller awaits its shared result.

use crate::api::Backend;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

type AvatarCell = Arc<OnceCell<Option<String>>>;

struct Inner {
    backend: Arc<dyn Backend>,
    entries: Mutex<HashMap<String, AvatarCell>>,
}

/// Lazily populated user id → avatar URL cache
///
/// Cloning is cheap and all clones share the same entries.
#[derive(Clone)]
pub struct AvatarCache {
    inner: Arc<Inner>,
}

impl AvatarCache {
    /// Create an empty cache backed by the given backend
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Resolve a user's avatar URL, fetching at most once per user id
    ///
    /// A fetch failure degrades to `None` (the caller renders initials or a
    /// placeholder icon) and is not retried; the surrounding flow is never
    /// interrupted by avatar lookups.
    pub async fn resolve(&self, user_id: &str) -> Option<String> {
        let cell = {
            let mut entries = self.inner.entries.lock().await;
            entries
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let backend = self.inner.backend.clone();
        let uid = user_id.to_string();
        cell.get_or_init(|| async move {
            match backend.fetch_avatar(&uid).await {
                Ok(url) => {
                    debug!("Resolved avatar for {}: {:?}", uid, url);
                    url
                }
                Err(e) => {
                    warn!("Avatar lookup failed for {}: {}, using fallback", uid, e);
                    None
                }
            }
        })
        .await
        .clone()
    }

    /// Avatar URL for a user if already resolved, without fetching
    pub async fn cached(&self, user_id: &str) -> Option<String> {
        let entries = self.inner.entries.lock().await;
        entries
            .get(user_id)
            .and_then(|cell| cell.get().cloned())
            .flatten()
    }

    /// Kick off resolution in the background without awaiting it
    pub fn spawn_resolve(&self, user_id: &str) {
        let cache = self.clone();
        let uid = user_id.to_string();
        tokio::spawn(async move {
            cache.resolve(&uid).await;
        });
    }
}
