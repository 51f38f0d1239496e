//! # File pool
//!
//! The shrinking set of source files the sampling driver draws from.
//!
//! ## Lifecycle
//! -----------------
//! 1. **Discovery** – [`FilePool::discover`] walks the dataset root recursively and keeps
//!    every regular file. An empty result is fatal ([`TngError::EmptyFilePool`]).
//! 2. **Sampling** – [`FilePool::pick`] returns a uniformly random slot index. Files are
//!    drawn with replacement: a file stays eligible until evicted.
//! 3. **Bookkeeping** – [`FilePool::record_hit`] advances the per-file hit counter.
//! 4. **Eviction** – [`FilePool::evict_if_exhausted`] removes a file whose counter reached
//!    `extensions_per_file`, in `O(1)` with `swap_remove`.
//!
//! Slot indices are only stable between two evictions. The driver holds one index while it
//! drains a file and evicts only after the drain, so this is enough.
//!
//! ## Known limitation
//! -----------------
//! A file containing fewer extensions than `extensions_per_file` can only be evicted under
//! [`EvictionPolicy::OnConsumed`](crate::params::EvictionPolicy::OnConsumed) after several
//! visits, and under `OnAccepted` possibly never. The split generator bounds its visits to
//! keep termination in those cases.
use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use rand::Rng;
use tracing::debug;
use walkdir::WalkDir;

use crate::tng_errors::TngError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct PoolEntry {
    path: Utf8PathBuf,
    hits: u32,
}

/// Files not yet exhausted, with their hit counters.
#[derive(Debug, Clone)]
pub struct FilePool {
    entries: Vec<PoolEntry>,
    initial_len: usize,
    extensions_per_file: u32,
}

impl FilePool {
    /// Recursively list every regular file below `root`.
    ///
    /// Paths are sorted so that a seeded generator replays the same sampling order.
    ///
    /// Return
    /// ----------
    /// * `Err(TngError::EmptyFilePool)` if no file is found.
    /// * `Err(TngError::DirectoryWalkError)` if the walk fails (missing root, permissions).
    /// * `Err(TngError::Utf8PathError)` for a non UTF-8 path.
    pub fn discover(root: &Utf8Path, extensions_per_file: u32) -> Result<Self, TngError> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|e| TngError::DirectoryWalkError(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = Utf8PathBuf::from_path_buf(entry.into_path())
                .map_err(|p| TngError::Utf8PathError(p.display().to_string()))?;
            paths.push(path);
        }

        if paths.is_empty() {
            return Err(TngError::EmptyFilePool(root.to_string()));
        }

        debug!(root = %root, files = paths.len(), "file pool populated");
        Self::from_paths(paths.into_iter().sorted().collect(), extensions_per_file)
    }

    /// Build a pool from an explicit list of paths.
    pub fn from_paths(paths: Vec<Utf8PathBuf>, extensions_per_file: u32) -> Result<Self, TngError> {
        if paths.is_empty() {
            return Err(TngError::EmptyFilePool("<explicit path list>".into()));
        }

        let entries: Vec<PoolEntry> = paths
            .into_iter()
            .map(|path| PoolEntry { path, hits: 0 })
            .collect();

        Ok(FilePool {
            initial_len: entries.len(),
            entries,
            extensions_per_file,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of files found at population time.
    pub fn initial_len(&self) -> usize {
        self.initial_len
    }

    pub fn extensions_per_file(&self) -> u32 {
        self.extensions_per_file
    }

    /// Records the whole population is expected to hold: `initial files × extensions_per_file`.
    pub fn expected_records(&self) -> u64 {
        self.initial_len as u64 * self.extensions_per_file as u64
    }

    /// Uniformly random slot index, `None` once the pool is empty.
    pub fn pick(&self, rng: &mut impl Rng) -> Option<usize> {
        if self.entries.is_empty() {
            None
        } else {
            Some(rng.random_range(0..self.entries.len()))
        }
    }

    pub fn path(&self, slot: usize) -> &Utf8Path {
        &self.entries[slot].path
    }

    pub fn hits(&self, slot: usize) -> u32 {
        self.entries[slot].hits
    }

    /// Advance the hit counter of `slot` and return its new value.
    pub fn record_hit(&mut self, slot: usize) -> u32 {
        let entry = &mut self.entries[slot];
        entry.hits += 1;
        entry.hits
    }

    /// Remove `slot` if its counter reached `extensions_per_file`.
    ///
    /// Return
    /// ----------
    /// * `Some(path)` of the evicted file, `None` if the file stays in the pool.
    pub fn evict_if_exhausted(&mut self, slot: usize) -> Option<Utf8PathBuf> {
        if self.entries[slot].hits < self.extensions_per_file {
            return None;
        }
        let evicted = self.entries.swap_remove(slot);
        debug!(
            file = %evicted.path,
            hits = evicted.hits,
            remaining = self.entries.len(),
            "file exhausted, evicted from pool"
        );
        Some(evicted.path)
    }

    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.entries.iter().any(|e| e.path.as_path() == path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Utf8Path> + '_ {
        self.entries.iter().map(|e| e.path.as_path())
    }
}
