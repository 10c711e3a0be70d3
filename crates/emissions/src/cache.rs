//! Read-through LRU cache of fetched series.
//!
//! Series are a pure function of inventory, species, years and the view
//! they were fetched for, so cached entries never go stale.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use fire_common::{FireResult, YearRange};
use lru::LruCache;
use raster::RasterTimeSeries;
use serde::Serialize;
use tracing::debug;

use crate::inventory::Inventory;

/// What a cached series holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SeriesView {
    /// Species band on the comparison grid
    Comparison,
    /// Land-cover breakdown with the named EF table
    Breakdown(String),
    /// Species band with the named EF table
    EfTable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub inventory: Inventory,
    pub species: String,
    pub years: YearRange,
    pub view: SeriesView,
}

impl CacheKey {
    pub fn new(inventory: Inventory, species: &str, years: YearRange, view: SeriesView) -> Self {
        Self {
            inventory,
            species: species.to_string(),
            years,
            view,
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of series; a capacity of 0 disables caching.
pub struct SeriesCache {
    entries: Option<Mutex<LruCache<CacheKey, Arc<RasterTimeSeries>>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl SeriesCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|c| Mutex::new(LruCache::new(c))),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Cached series for `key`, or the result of `fetch` stored under it.
    ///
    /// The lock is not held while fetching, so concurrent misses on the same
    /// key may both fetch; the later insert wins.
    pub fn get_or_try_insert_with<F>(&self, key: CacheKey, fetch: F) -> FireResult<Arc<RasterTimeSeries>>
    where
        F: FnOnce() -> FireResult<RasterTimeSeries>,
    {
        let Some(entries) = &self.entries else {
            return fetch().map(Arc::new);
        };

        if let Ok(mut cache) = entries.lock() {
            if let Some(series) = cache.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(inventory = %key.inventory, species = %key.species, "Series cache hit");
                return Ok(Arc::clone(series));
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let series = Arc::new(fetch()?);
        if let Ok(mut cache) = entries.lock() {
            if let Some((evicted, _)) = cache.push(key.clone(), Arc::clone(&series)) {
                if evicted != key {
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        Ok(series)
    }

    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            if let Ok(mut cache) = entries.lock() {
                cache.clear();
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self
            .entries
            .as_ref()
            .and_then(|e| e.lock().ok().map(|c| c.len()))
            .unwrap_or(0);
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries,
            capacity: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fire_common::grid::grids;
    use fire_common::FireError;

    fn key(year: i32) -> CacheKey {
        CacheKey::new(Inventory::Qfed25, "CO", YearRange::single(year), SeriesView::Comparison)
    }

    fn empty() -> FireResult<RasterTimeSeries> {
        Ok(RasterTimeSeries::new(grids::geographic_0p5(), &["CO"]))
    }

    #[test]
    fn test_hits_and_evictions() {
        let cache = SeriesCache::new(2);
        cache.get_or_try_insert_with(key(2010), empty).unwrap();
        cache.get_or_try_insert_with(key(2010), empty).unwrap();
        cache.get_or_try_insert_with(key(2011), empty).unwrap();
        cache.get_or_try_insert_with(key(2012), empty).unwrap();

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.entries, 2);
        assert!((stats.hit_rate() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = SeriesCache::new(4);
        let err = cache
            .get_or_try_insert_with(key(2010), || Err(FireError::DataRead("offline".into())))
            .unwrap_err();
        assert!(matches!(err, FireError::DataRead(_)));
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_disabled_cache_always_fetches() {
        let cache = SeriesCache::new(0);
        assert!(!cache.is_enabled());
        cache.get_or_try_insert_with(key(2010), empty).unwrap();
        cache.get_or_try_insert_with(key(2010), empty).unwrap();
        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.stats().entries, 0);
    }
}
