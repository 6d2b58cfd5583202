//! Claim reconciliation — turns a region into per-tile claim work.
//!
//! For each region the reconciler:
//!
//! 1. Resolves the governing partition (stable id first, then name).
//! 2. Enumerates every covered tile up front.
//! 3. Dispatches one claim or release per tile to the shard governing it.
//!
//! Every tile is guarded on its own: a failure is logged and the remaining
//! tiles are still processed. Claims are not reference counted here; the host
//! claim API is expected to be idempotent per owner.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use keepregion_model::{MAX_RADIUS, Region, TileCoord};
use tracing::{debug, warn};

use crate::host::{ClaimApi, ClaimOwner, PartitionDirectory, PartitionHandle, TileDispatcher};

/// Whether tiles should gain or lose this system's claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimAction {
    /// Place a claim.
    Claim,
    /// Remove a claim.
    Release,
}

impl std::fmt::Display for ClaimAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Claim => f.write_str("claim"),
            Self::Release => f.write_str("release"),
        }
    }
}

/// Issues and withdraws activation claims for regions.
#[derive(Clone)]
pub struct ClaimReconciler {
    owner: ClaimOwner,
    partitions: Arc<dyn PartitionDirectory>,
    claims: Arc<dyn ClaimApi>,
    dispatcher: Arc<dyn TileDispatcher>,
}

impl ClaimReconciler {
    /// Create a reconciler placing claims as `owner`.
    #[must_use]
    pub fn new(
        owner: ClaimOwner,
        partitions: Arc<dyn PartitionDirectory>,
        claims: Arc<dyn ClaimApi>,
        dispatcher: Arc<dyn TileDispatcher>,
    ) -> Self {
        Self {
            owner,
            partitions,
            claims,
            dispatcher,
        }
    }

    /// Find the live partition a region belongs to.
    ///
    /// The stable identifier wins when it resolves; otherwise the name is
    /// tried, which also covers partitions recreated under a new identifier.
    #[must_use]
    pub fn resolve_partition(&self, region: &Region) -> Option<PartitionHandle> {
        region
            .partition()
            .id()
            .and_then(|id| self.partitions.by_id(id))
            .or_else(|| self.partitions.by_name(region.partition().name()))
    }

    /// Claim every tile of `region`. Returns the number of tiles dispatched.
    pub fn apply(&self, region: &Region) -> usize {
        self.reconcile(region, ClaimAction::Claim)
    }

    /// Release every tile of `region`. Returns the number of tiles dispatched.
    pub fn withdraw(&self, region: &Region) -> usize {
        self.reconcile(region, ClaimAction::Release)
    }

    /// Dispatch `action` for every tile of `region`.
    ///
    /// Returns the number of tiles dispatched, which is `0` when the
    /// partition cannot be resolved or the radius exceeds [`MAX_RADIUS`].
    pub fn reconcile(&self, region: &Region, action: ClaimAction) -> usize {
        if !region.is_enumerable() {
            warn!(
                region = %region.id(),
                radius = region.radius(),
                max = MAX_RADIUS,
                %action,
                "radius too large, skipping region"
            );
            return 0;
        }
        let Some(partition) = self.resolve_partition(region) else {
            warn!(
                region = %region.id(),
                partition = region.partition().name(),
                %action,
                "partition not found, skipping region"
            );
            return 0;
        };

        let tiles = region.tiles();
        debug!(
            region = %region.id(),
            partition = partition.name(),
            %action,
            tiles = tiles.len(),
            "dispatching tile claims"
        );

        for &tile in &tiles {
            let claims = Arc::clone(&self.claims);
            let owner = self.owner.clone();
            let target = partition.clone();
            self.dispatcher.dispatch(
                &self.owner,
                &partition,
                tile,
                Box::new(move || run_tile(claims.as_ref(), action, &owner, &target, tile)),
            );
        }
        tiles.len()
    }
}

impl std::fmt::Debug for ClaimReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimReconciler")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// Apply one claim operation, containing both errors and panics to this tile.
fn run_tile(
    claims: &dyn ClaimApi,
    action: ClaimAction,
    owner: &ClaimOwner,
    partition: &PartitionHandle,
    tile: TileCoord,
) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match action {
        ClaimAction::Claim => claims.claim(owner, partition, tile),
        ClaimAction::Release => claims.release(owner, partition, tile),
    }));
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(
            x = tile.x,
            z = tile.z,
            partition = partition.name(),
            %action,
            error = %e,
            "failed to update tile claim"
        ),
        Err(_) => warn!(
            x = tile.x,
            z = tile.z,
            partition = partition.name(),
            %action,
            "tile claim panicked"
        ),
    }
}
