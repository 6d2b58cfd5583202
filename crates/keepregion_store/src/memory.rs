//! In-memory region store.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use keepregion_model::Region;

use crate::RegionStore;
use crate::error::StoreError;

/// Holds the last saved snapshot in memory and counts saves.
///
/// Useful for embedders without a filesystem and for observing how often the
/// registry persists.
#[derive(Debug, Default)]
pub struct MemoryRegionStore {
    snapshot: Mutex<Vec<Region>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryRegionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose first load returns `regions`.
    #[must_use]
    pub fn with_regions(regions: Vec<Region>) -> Self {
        Self {
            snapshot: Mutex::new(regions),
            ..Self::default()
        }
    }

    /// Number of successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last saved snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Region> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl RegionStore for MemoryRegionStore {
    fn load(&self) -> Vec<Region> {
        self.snapshot()
    }

    fn save(&self, regions: &[Region]) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::other("saves disabled"),
            });
        }
        let mut snapshot = self
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *snapshot = regions.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
