//! Shared sample cache keyed by source, width bucket, and gap

use crate::types::SampledImage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Cache key. Width is bucketed to the nearest 50 px so minor layout jitter
/// reuses an existing sample; gap is stored in tenths to keep the key hashable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SampleKey {
    pub source: String,
    pub width_bucket: u32,
    pub gap_tenths: u32,
}

impl SampleKey {
    pub fn new(source: &str, target_width: u32, gap: f32) -> Self {
        Self {
            source: source.to_string(),
            width_bucket: ((target_width as f32 / 50.0).round() * 50.0) as u32,
            gap_tenths: (gap * 10.0).round() as u32,
        }
    }
}

/// Process-wide sample cache. Clones share the same underlying map.
///
/// Entries are immutable once inserted. Concurrent writers racing on the same
/// key produce identical content, so last write wins.
#[derive(Clone, Default)]
pub struct SampleCache {
    inner: Arc<Mutex<HashMap<SampleKey, Arc<SampledImage>>>>,
}

impl SampleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &SampleKey) -> Option<Arc<SampledImage>> {
        self.inner.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: SampleKey, image: Arc<SampledImage>) {
        self.inner.lock().unwrap().insert(key, image);
    }

    /// Drop every cached sample. The next request re-samples from source.
    pub fn reset(&self) {
        self.inner.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}
