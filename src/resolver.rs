//! Sandbox resolver — the single chokepoint for identifier → handle lookup.
//!
//! Every sandbox-scoped operation calls [`SandboxResolver::resolve`] before
//! touching any per-sandbox sub-API. The resolver consults the handle cache
//! and skips the backend entirely while the cached handle is fresh; on a
//! stale or absent entry it fetches the authoritative handle, re-stamps the
//! cache, and returns it. Backend failures propagate untouched and never
//! update the cache.
//!
//! Two concurrent resolutions of the same identifier can both miss and fetch
//! redundantly; both puts carry an equally-valid fresh expiry, so the last
//! writer wins and the map stays consistent.

use crate::backend::{SandboxBackend, SandboxHandle};
use crate::cache::{Freshness, HandleCache};
use crate::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct SandboxResolver {
    backend: Arc<dyn SandboxBackend>,
    cache: HandleCache,
}

impl SandboxResolver {
    pub fn new(backend: Arc<dyn SandboxBackend>, cache_ttl: Duration) -> Self {
        Self {
            backend,
            cache: HandleCache::new(cache_ttl),
        }
    }

    /// Backend capability handed to operations that are not sandbox-scoped
    /// (create, list) or that follow a resolve with a sub-API call.
    pub fn backend(&self) -> &Arc<dyn SandboxBackend> {
        &self.backend
    }

    pub async fn resolve(&self, id: &str) -> Result<SandboxHandle, Error> {
        match self.cache.lookup(id) {
            Freshness::Fresh(handle) => {
                debug!(sandbox_id = %id, "handle cache hit, skipping backend fetch");
                Ok(handle)
            }
            freshness => {
                debug!(sandbox_id = %id, ?freshness, "handle cache miss, fetching from backend");
                let handle = self.backend.get(id).await?;
                self.cache.put(id, handle.clone());
                Ok(handle)
            }
        }
    }
}
