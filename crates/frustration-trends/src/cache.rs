use crate::review::Review;
use anyhow::Result;
use moka::sync::Cache;
use std::sync::Arc;
use tracing::debug;

/// Load-once store for per-app review sets.
///
/// Owned by whoever needs it (pipeline, CLI, tests) rather than living in a
/// global; `invalidate` and `invalidate_all` force the next access to reload.
#[derive(Clone)]
pub struct ReviewCache {
    inner: Cache<String, Arc<Vec<Review>>>,
}

impl ReviewCache {
    pub fn new(max_apps: u64) -> Self {
        Self {
            inner: Cache::builder().max_capacity(max_apps).build(),
        }
    }

    /// Return the cached reviews for `app`, running `loader` on first use.
    ///
    /// A failing loader caches nothing, so the next call retries.
    pub fn get_or_load<F>(&self, app: &str, loader: F) -> Result<Arc<Vec<Review>>>
    where
        F: FnOnce() -> Result<Vec<Review>>,
    {
        self.inner
            .try_get_with(app.to_string(), || {
                debug!("Review cache miss for {}", app);
                loader().map(Arc::new)
            })
            .map_err(|e| anyhow::anyhow!("Failed to load reviews for {}: {:#}", app, e))
    }

    pub fn get(&self, app: &str) -> Option<Arc<Vec<Review>>> {
        self.inner.get(app)
    }

    pub fn insert(&self, app: &str, reviews: Vec<Review>) {
        self.inner.insert(app.to_string(), Arc::new(reviews));
    }

    pub fn invalidate(&self, app: &str) {
        self.inner.invalidate(app);
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

impl Default for ReviewCache {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::parse_timestamp;
    use std::cell::Cell;

    fn sample(n: usize) -> Vec<Review> {
        let ts = parse_timestamp("2023-01-02").unwrap();
        (0..n).map(|_| Review::new("Zoom", ts, "text", "text")).collect()
    }

    #[test]
    fn test_loader_runs_once() {
        let cache = ReviewCache::default();
        let loads = Cell::new(0);

        for _ in 0..3 {
            let reviews = cache
                .get_or_load("Zoom", || {
                    loads.set(loads.get() + 1);
                    Ok(sample(2))
                })
                .unwrap();
            assert_eq!(reviews.len(), 2);
        }
        assert_eq!(loads.get(), 1);
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let cache = ReviewCache::default();
        cache.get_or_load("Zoom", || Ok(sample(1))).unwrap();
        cache.invalidate("Zoom");
        let reloaded = cache.get_or_load("Zoom", || Ok(sample(4))).unwrap();
        assert_eq!(reloaded.len(), 4);

        cache.insert("Webex", sample(1));
        cache.invalidate_all();
        assert!(cache.get("Zoom").is_none());
        assert!(cache.get("Webex").is_none());
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let cache = ReviewCache::default();
        let err = cache
            .get_or_load("Zoom", || Err(anyhow::anyhow!("disk on fire")))
            .unwrap_err();
        assert!(err.to_string().contains("disk on fire"));
        assert_eq!(cache.get_or_load("Zoom", || Ok(sample(1))).unwrap().len(), 1);
    }
}
