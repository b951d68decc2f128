use crate::compile::{CompiledConfig, Resolution};
use crate::glob::normalize_path;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Path-keyed memo over a compiled configuration.
///
/// Results are computed outside the map and inserted afterwards, so two
/// callers racing on one path may both compute it; both get equal values.
#[derive(Debug)]
pub struct MemoizedConfig {
    config: Arc<CompiledConfig>,
    entries: DashMap<String, Resolution>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl MemoizedConfig {
    pub fn new(config: Arc<CompiledConfig>) -> Self {
        Self {
            config,
            entries: DashMap::new(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &CompiledConfig {
        &self.config
    }

    pub fn effective_config(&self, path: &str) -> Resolution {
        let key = normalize_path(path);
        if let Some(cached) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return cached.value().clone();
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let resolved = self.config.effective_config(&key);
        self.entries.insert(key, resolved.clone());
        resolved
    }

    /// `(hits, misses)` so far.
    pub fn stats(&self) -> (usize, usize) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
