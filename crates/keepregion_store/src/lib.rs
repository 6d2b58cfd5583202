//! # keepregion_store
//!
//! Persistence gateway for the region set.
//!
//! A store never owns the authoritative region set: it is handed a full
//! snapshot to write, or produces a full snapshot when read. This crate
//! provides:
//!
//! - [`RegionStore`] — the load/save contract.
//! - [`JsonRegionStore`] — a JSON document on disk, written atomically.
//! - [`MemoryRegionStore`] — an in-memory snapshot holder.
//! - [`record`] — the flat record format and its lenient parser.
//! - [`error`] — store and record error types.

pub mod error;
pub mod json;
pub mod memory;
pub mod record;

use std::sync::Arc;

use keepregion_model::Region;

pub use error::{RecordError, StoreError};
pub use json::JsonRegionStore;
pub use memory::MemoryRegionStore;

/// Loads and saves the complete region set.
pub trait RegionStore {
    /// Read every well-formed region from the backing store.
    ///
    /// Never fails: a missing store is initialised empty, unreadable input
    /// yields an empty set, and malformed records are skipped.
    fn load(&self) -> Vec<Region>;

    /// Replace the stored set with `regions`, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the snapshot could not be written.
    fn save(&self, regions: &[Region]) -> Result<(), StoreError>;
}

impl<T: RegionStore + ?Sized> RegionStore for Arc<T> {
    fn load(&self) -> Vec<Region> {
        (**self).load()
    }

    fn save(&self, regions: &[Region]) -> Result<(), StoreError> {
        (**self).save(regions)
    }
}
