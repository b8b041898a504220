//! Field data factory for one field of one index
//!
//! Loads per-segment field data on first use and caches it keyed by segment
//! id. Concurrent first requests for a segment converge on a single build:
//! each cache entry carries a build lock, and the built structure is
//! published through an `ArcSwapOption` so that cached reads never lock.
//!
//! Eviction takes the same lock, so a build in flight finishes and is then
//! unloaded. An entry removed from the map is marked detached; callers that
//! find a detached entry start over with a fresh one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use super::atomic::AtomicFieldData;
use super::loader::load_field_data;
use crate::config::FieldDataFormat;
use crate::error::{FieldDataError, Result};
use crate::segment::{SegmentId, SegmentReader};
use crate::sort::{BytesComparatorSource, SortMode};

/// Hook for external memory accounting
pub trait FieldDataListener: Send + Sync {
    fn on_load(&self, field: &str, segment: SegmentId, memory_size_in_bytes: u64);

    fn on_unload(&self, field: &str, segment: SegmentId, memory_size_in_bytes: u64);
}

/// Point-in-time counters of a factory
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FieldDataStats {
    pub loads: u64,
    pub hits: u64,
    pub evictions: u64,
    pub failures: u64,
    pub cached_segments: usize,
    pub memory_size_in_bytes: u64,
}

#[derive(Default)]
struct Counters {
    loads: AtomicU64,
    hits: AtomicU64,
    evictions: AtomicU64,
    failures: AtomicU64,
}

#[derive(Default)]
struct CacheEntry {
    loaded: ArcSwapOption<Arc<dyn AtomicFieldData>>,
    /// Serializes builds and eviction; true once the entry left the map
    detached: Mutex<bool>,
}

impl CacheEntry {
    fn get(&self) -> Option<Arc<dyn AtomicFieldData>> {
        self.loaded.load_full().map(|data| (*data).clone())
    }
}

pub struct IndexFieldData {
    field: String,
    format: FieldDataFormat,
    page_size: usize,
    cache: DashMap<SegmentId, Arc<CacheEntry>>,
    listener: Option<Arc<dyn FieldDataListener>>,
    counters: Counters,
}

impl IndexFieldData {
    pub fn new(field: impl Into<String>, format: FieldDataFormat, page_size: usize) -> Self {
        Self {
            field: field.into(),
            format,
            page_size,
            cache: DashMap::new(),
            listener: None,
            counters: Counters::default(),
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn FieldDataListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn format(&self) -> FieldDataFormat {
        self.format
    }

    /// Field data for `segment`, built on first request and cached.
    ///
    /// A failed build is reported to every waiting caller in turn and leaves
    /// nothing behind in the cache.
    pub fn load(&self, segment: &SegmentReader) -> Result<Arc<dyn AtomicFieldData>> {
        let id = segment.id();
        loop {
            let entry = self.entry(id);
            if let Some(data) = entry.get() {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(data);
            }

            let mut detached = entry.detached.lock();
            if *detached {
                continue;
            }
            if let Some(data) = entry.get() {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(data);
            }

            return match load_field_data(segment, &self.field, self.format, self.page_size) {
                Ok(data) => {
                    entry.loaded.store(Some(Arc::new(Arc::clone(&data))));
                    self.counters.loads.fetch_add(1, Ordering::Relaxed);
                    let bytes = data.memory_size_in_bytes();
                    debug!(
                        field = %self.field,
                        segment = %id,
                        format = %self.format,
                        bytes,
                        multi_valued = data.is_multi_valued(),
                        "Loaded field data"
                    );
                    if let Some(listener) = &self.listener {
                        listener.on_load(&self.field, id, bytes);
                    }
                    Ok(data)
                }
                Err(e) => {
                    self.counters.failures.fetch_add(1, Ordering::Relaxed);
                    warn!(field = %self.field, segment = %id, error = %e, "Failed to load field data");
                    *detached = true;
                    self.cache.remove_if(&id, |_, v| Arc::ptr_eq(v, &entry));
                    Err(e)
                }
            };
        }
    }

    fn entry(&self, id: SegmentId) -> Arc<CacheEntry> {
        // the read guard must be gone before `entry` takes the shard lock
        let cached = self.cache.get(&id).map(|e| Arc::clone(e.value()));
        match cached {
            Some(entry) => entry,
            None => Arc::clone(self.cache.entry(id).or_default().value()),
        }
    }

    /// Build field data for `segment` without consulting or filling the cache
    pub fn load_direct(&self, segment: &SegmentReader) -> Result<Arc<dyn AtomicFieldData>> {
        load_field_data(segment, &self.field, self.format, self.page_size)
    }

    /// Sort key source over this field.
    ///
    /// `missing` replaces the key of documents without a value.
    pub fn comparator_source(
        self: &Arc<Self>,
        missing: Option<Vec<u8>>,
        mode: SortMode,
    ) -> Result<BytesComparatorSource> {
        if !mode.is_supported_for_bytes() {
            return Err(FieldDataError::UnsupportedSortMode {
                field: self.field.clone(),
                mode: mode.to_string(),
            });
        }
        Ok(BytesComparatorSource::new(Arc::clone(self), missing, mode))
    }

    /// Drop the cached field data of one segment. Holders of the data keep it.
    ///
    /// Waits for a build of the segment in flight and unloads its result.
    pub fn evict(&self, segment: SegmentId) {
        let Some((_, entry)) = self.cache.remove(&segment) else {
            return;
        };
        let mut detached = entry.detached.lock();
        *detached = true;
        if let Some(data) = entry.loaded.swap(None) {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            let bytes = data.memory_size_in_bytes();
            debug!(field = %self.field, segment = %segment, bytes, "Evicted field data");
            if let Some(listener) = &self.listener {
                listener.on_unload(&self.field, segment, bytes);
            }
        }
    }

    pub fn clear(&self) {
        let segments: Vec<SegmentId> = self.cache.iter().map(|e| *e.key()).collect();
        for segment in segments {
            self.evict(segment);
        }
    }

    /// Segments with loaded field data, in id order
    pub fn cached_segments(&self) -> Vec<SegmentId> {
        let mut segments: Vec<SegmentId> = self
            .cache
            .iter()
            .filter(|e| e.value().get().is_some())
            .map(|e| *e.key())
            .collect();
        segments.sort_unstable();
        segments
    }

    /// Sum of the memory held by cached entries
    pub fn memory_size_in_bytes(&self) -> u64 {
        self.cache
            .iter()
            .filter_map(|e| e.value().get())
            .map(|data| data.memory_size_in_bytes())
            .sum()
    }

    pub fn stats(&self) -> FieldDataStats {
        FieldDataStats {
            loads: self.counters.loads.load(Ordering::Relaxed),
            hits: self.counters.hits.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            cached_segments: self.cached_segments().len(),
            memory_size_in_bytes: self.memory_size_in_bytes(),
        }
    }
}
