//! # keepregion_core
//!
//! Keeps declared regions of a tile grid continuously active in a sharded
//! host runtime.
//!
//! This crate provides:
//!
//! - [`host`] — the collaborator traits a host implements: partition lookup,
//!   activation claims, and per-tile dispatch.
//! - [`ClaimReconciler`] — turns a region into per-tile claim or release work.
//! - [`RegionRegistry`] — the authoritative region set; persists and
//!   reconciles on every change.
//!
//! ## Lifecycle
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use keepregion_core::host::{ClaimOwner, InlineDispatcher};
//! use keepregion_core::{ClaimReconciler, RegionRegistry};
//! # use keepregion_core::host::{ClaimApi, PartitionDirectory};
//! # fn host() -> (Arc<dyn PartitionDirectory>, Arc<dyn ClaimApi>) { unimplemented!() }
//! use keepregion_store::JsonRegionStore;
//!
//! let (partitions, claims) = host();
//! let reconciler = ClaimReconciler::new(
//!     ClaimOwner::new("keepregion"),
//!     partitions,
//!     claims,
//!     Arc::new(InlineDispatcher),
//! );
//! let mut registry = RegionRegistry::new(JsonRegionStore::in_dir("data"), reconciler);
//!
//! // Startup.
//! registry.load_regions();
//! registry.apply_all_tickets();
//!
//! // ... create / remove regions ...
//!
//! // Shutdown.
//! registry.remove_all_tickets();
//! ```

pub mod error;
pub mod host;
pub mod reconciler;
pub mod registry;

#[cfg(test)]
mod testing;

pub use error::ClaimError;
pub use host::{
    ClaimApi, ClaimOwner, InlineDispatcher, PartitionDirectory, PartitionHandle, TileDispatcher,
    TileTask,
};
pub use reconciler::{ClaimAction, ClaimReconciler};
pub use registry::RegionRegistry;
