//! Claim error types.

use keepregion_model::TileCoord;

/// Errors reported by an activation-claim backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    /// The partition is no longer loaded by the host.
    #[error("partition {0} is not loaded")]
    PartitionUnloaded(String),

    /// The host refused to claim or release the tile.
    #[error("partition {partition} rejected tile {tile}: {reason}")]
    Rejected {
        /// Partition name.
        partition: String,
        /// The tile in question.
        tile: TileCoord,
        /// Host-supplied reason.
        reason: String,
    },
}
