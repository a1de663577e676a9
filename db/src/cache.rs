//! Path-keyed descriptor cache.
//!
//! A [`DescriptorCache`] parses each metafile at most once for its whole
//! lifetime. Construct one per process (or per resolve session), share it by
//! reference, and every lookup of the same path string returns the same
//! [`Arc<Descriptor>`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use metafile_db::DescriptorCache;
//!
//! let cache = DescriptorCache::new();
//! let first = cache.get_or_load("/pkgs/foo/1.0/package.yaml").unwrap();
//! let again = cache.get_or_load("/pkgs/foo/1.0/package.yaml").unwrap();
//! assert!(Arc::ptr_eq(&first, &again));
//! ```
//!
//! Keys are the literal path strings: `./a/package.yaml` and `a/package.yaml`
//! are different entries. Changes to a file after it was cached are never
//! observed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use metafile_core::{Descriptor, Loader, Result};
use tracing::debug;

type LoadGuard = Arc<Mutex<()>>;

/// Thread-safe, grow-only map from path string to loaded descriptor.
///
/// Failed loads are not remembered, so a path whose file was broken can be
/// retried after the file is fixed.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    loader: Loader,
    entries: Mutex<HashMap<String, Arc<Descriptor>>>,
    // One guard per path with a load in progress.
    in_flight: Mutex<HashMap<String, LoadGuard>>,
}

impl DescriptorCache {
    /// Creates an empty cache backed by the default [`Loader`].
    pub fn new() -> Self {
        Self::with_loader(Loader::new())
    }

    /// Creates an empty cache backed by `loader`.
    pub fn with_loader(loader: Loader) -> Self {
        Self {
            loader,
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Returns the cached descriptor for `path`, loading it on first use.
    ///
    /// Concurrent first requests for the same path wait on a per-path guard,
    /// so the file is loaded once and every caller receives the same [`Arc`].
    /// Loads of different paths run in parallel.
    ///
    /// # Errors
    ///
    /// Returns the loader's error unchanged. Nothing is cached on failure.
    pub fn get_or_load(&self, path: &str) -> Result<Arc<Descriptor>> {
        if let Some(descriptor) = self.get(path) {
            debug!(path, "Metafile cache hit");
            return Ok(descriptor);
        }

        let guard = Arc::clone(
            lock(&self.in_flight)
                .entry(path.to_string())
                .or_default(),
        );
        let _loading = lock(&*guard);

        // Another caller may have finished this path while we waited.
        if let Some(descriptor) = self.get(path) {
            debug!(path, "Metafile cache hit after wait");
            return Ok(descriptor);
        }

        debug!(path, "Metafile cache miss");
        let result = self.loader.load(path).map(Arc::new);
        if let Ok(descriptor) = &result {
            let mut entries = self.entries();
            entries.insert(path.to_string(), Arc::clone(descriptor));
            debug!(path, cached = entries.len(), "Cached package metafile");
        }

        let mut in_flight = lock(&self.in_flight);
        if in_flight.get(path).is_some_and(|g| Arc::ptr_eq(g, &guard)) {
            in_flight.remove(path);
        }
        drop(in_flight);

        if let Err(err) = &result {
            debug!(path, error = %err, "Metafile load failed, not caching");
        }
        result
    }

    /// Returns the descriptor for `path` only if it is already cached.
    pub fn get(&self, path: &str) -> Option<Arc<Descriptor>> {
        self.entries().get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Cached path strings, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.entries().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<Descriptor>>> {
        lock(&self.entries)
    }
}

// Every critical section is a single map operation, so a mutex left behind by
// a panicking holder still guards consistent data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
