//! Region registry — the authoritative set of keep-alive regions.
//!
//! Every mutation follows the same order: update the in-memory set, persist
//! the full snapshot, then hand claim work to the reconciler. Persistence is
//! synchronous, so the stored document never lags an acknowledged change;
//! claim work is fire-and-forget.
//!
//! The registry is mutated from a single context (`&mut self`) and applies no
//! internal locking.

use keepregion_model::{Region, TileCoord};
use keepregion_store::RegionStore;
use tracing::{debug, error, info};

use crate::host::PartitionHandle;
use crate::reconciler::ClaimReconciler;

/// Owns the region set and keeps storage and claims in step with it.
#[derive(Debug)]
pub struct RegionRegistry<S> {
    store: S,
    reconciler: ClaimReconciler,
    regions: Vec<Region>,
}

impl<S: RegionStore> RegionRegistry<S> {
    /// Create an empty registry. Call [`load_regions`](Self::load_regions)
    /// before use.
    #[must_use]
    pub fn new(store: S, reconciler: ClaimReconciler) -> Self {
        Self {
            store,
            reconciler,
            regions: Vec::new(),
        }
    }

    /// Replace the in-memory set with the stored one.
    pub fn load_regions(&mut self) {
        self.regions = self.store.load();
        info!(regions = self.regions.len(), "regions loaded");
    }

    /// Regions in insertion order.
    #[must_use]
    pub fn list_regions(&self) -> &[Region] {
        &self.regions
    }

    /// Returns `true` if a stored region has the same key as `candidate`.
    #[must_use]
    pub fn has_region(&self, candidate: &Region) -> bool {
        self.regions.iter().any(|region| region.same_key(candidate))
    }

    /// Add a region, persist, and claim its tiles.
    ///
    /// Callers check [`has_region`](Self::has_region) first; duplicates are
    /// not rejected here.
    pub fn add_region(&mut self, region: Region) {
        info!(
            region = %region.id(),
            partition = region.partition().name(),
            center = %region.center(),
            radius = region.radius(),
            "adding region"
        );
        self.regions.push(region);
        self.persist();
        if let Some(added) = self.regions.last() {
            self.reconciler.apply(added);
        }
    }

    /// Remove every region in `partition` centred exactly on `center`,
    /// whatever its radius.
    pub fn remove_by_center(
        &mut self,
        partition: &PartitionHandle,
        center: TileCoord,
    ) -> Vec<Region> {
        let (removed, kept): (Vec<Region>, Vec<Region>) = std::mem::take(&mut self.regions)
            .into_iter()
            .partition(|region| {
                region.center() == center
                    && region
                        .partition()
                        .is_partition(partition.id(), partition.name())
            });
        self.regions = kept;

        if removed.is_empty() {
            debug!(partition = partition.name(), %center, "no region at center");
            return removed;
        }

        info!(
            partition = partition.name(),
            %center,
            removed = removed.len(),
            "removing regions by center"
        );
        self.persist();
        for region in &removed {
            self.reconciler.withdraw(region);
        }
        removed
    }

    /// Remove the single region whose id equals or starts with `id_input`,
    /// ignoring case.
    ///
    /// Blank input, no match and ambiguous prefixes all return `None` without
    /// touching the set.
    pub fn remove_by_id(&mut self, id_input: &str) -> Option<Region> {
        if id_input.trim().is_empty() {
            return None;
        }
        let needle = id_input.to_lowercase();

        let mut found = None;
        for (index, region) in self.regions.iter().enumerate() {
            if region.id().to_string().to_lowercase().starts_with(&needle) {
                if found.is_some() {
                    debug!(prefix = id_input, "ambiguous region id prefix");
                    return None;
                }
                found = Some(index);
            }
        }

        let removed = self.regions.remove(found?);
        info!(region = %removed.id(), "removing region by id");
        self.persist();
        self.reconciler.withdraw(&removed);
        Some(removed)
    }

    /// Number of stored regions.
    #[must_use]
    pub fn total_regions(&self) -> usize {
        self.regions.len()
    }

    /// Claim the tiles of every stored region. Returns the tiles dispatched.
    pub fn apply_all_tickets(&self) -> usize {
        let tiles = self
            .regions
            .iter()
            .map(|region| self.reconciler.apply(region))
            .sum();
        info!(regions = self.regions.len(), tiles, "applied all region claims");
        tiles
    }

    /// Release the tiles of every stored region. Returns the tiles dispatched.
    pub fn remove_all_tickets(&self) -> usize {
        let tiles = self
            .regions
            .iter()
            .map(|region| self.reconciler.withdraw(region))
            .sum();
        info!(regions = self.regions.len(), tiles, "released all region claims");
        tiles
    }

    /// Returns the backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write the full set. Failures are logged; memory stays authoritative.
    fn persist(&self) {
        if let Err(e) = self.store.save(&self.regions) {
            error!(
                error = %e,
                regions = self.regions.len(),
                "failed to persist regions; in-memory set is ahead of storage"
            );
        }
    }
}
