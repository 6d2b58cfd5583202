//! Host runtime collaborators.
//!
//! The registry never talks to a simulation runtime directly. Instead the host
//! injects three capabilities:
//!
//! - [`PartitionDirectory`] — resolves a partition to a live handle.
//! - [`ClaimApi`] — places and removes activation claims on tiles.
//! - [`TileDispatcher`] — runs a unit of work under the shard that currently
//!   governs a tile.

use std::sync::Arc;

use keepregion_model::TileCoord;
use uuid::Uuid;

use crate::error::ClaimError;

/// A unit of work to run in a tile's governing context.
pub type TileTask = Box<dyn FnOnce() + Send + 'static>;

/// Identifies the holder of activation claims. The host keys claims by owner,
/// so claims placed by this system never interfere with anyone else's.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClaimOwner(Arc<str>);

impl ClaimOwner {
    /// Create an owner token.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// Returns the owner name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClaimOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A live, currently loaded partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionHandle {
    id: Uuid,
    name: Arc<str>,
}

impl PartitionHandle {
    /// Create a handle for a loaded partition.
    #[must_use]
    pub fn new(id: Uuid, name: &str) -> Self {
        Self {
            id,
            name: Arc::from(name),
        }
    }

    /// Stable partition identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Partition name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Looks up loaded partitions.
pub trait PartitionDirectory: Send + Sync {
    /// Resolve by stable identifier.
    fn by_id(&self, id: Uuid) -> Option<PartitionHandle>;

    /// Resolve by name.
    fn by_name(&self, name: &str) -> Option<PartitionHandle>;
}

/// Places and removes activation claims.
///
/// Both operations must be idempotent: claiming a tile this owner already
/// holds, or releasing one it does not, succeeds without effect.
pub trait ClaimApi: Send + Sync {
    /// Keep `tile` active on behalf of `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError`] if the host cannot place the claim.
    fn claim(
        &self,
        owner: &ClaimOwner,
        partition: &PartitionHandle,
        tile: TileCoord,
    ) -> Result<(), ClaimError>;

    /// Drop `owner`'s claim on `tile`.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError`] if the host cannot remove the claim.
    fn release(
        &self,
        owner: &ClaimOwner,
        partition: &PartitionHandle,
        tile: TileCoord,
    ) -> Result<(), ClaimError>;
}

/// Routes work to the execution shard governing a tile.
///
/// The task runs at some later point; tasks for different tiles may run
/// concurrently and in any order. Nothing is reported back to the caller.
pub trait TileDispatcher: Send + Sync {
    /// Schedule `task` under the governing context of `tile`.
    fn dispatch(
        &self,
        owner: &ClaimOwner,
        partition: &PartitionHandle,
        tile: TileCoord,
        task: TileTask,
    );
}

/// Runs every task immediately on the calling thread.
///
/// Suitable for single-threaded hosts and deterministic tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl TileDispatcher for InlineDispatcher {
    fn dispatch(
        &self,
        _owner: &ClaimOwner,
        _partition: &PartitionHandle,
        _tile: TileCoord,
        task: TileTask,
    ) {
        task();
    }
}
