//! # keepregion_model
//!
//! Value types shared by every keepregion crate.
//!
//! This crate provides:
//!
//! - [`Region`] — an immutable keep-alive declaration (center + radius).
//! - [`RegionId`] — the globally unique region identifier.
//! - [`PartitionRef`] — a partition name with an optional stable identifier.
//! - [`TileCoord`] — an integer tile coordinate on the grid.

pub mod partition;
pub mod region;
pub mod tile;

pub use partition::PartitionRef;
pub use region::{MAX_RADIUS, Region, RegionId};
pub use tile::{TILE_SIZE_BLOCKS, TileCoord};
