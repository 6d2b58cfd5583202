//! In-process sharded host runtime.
//!
//! Stands in for a region-owning simulation server. Tiles are grouped into
//! square sections of [`SECTION_SIZE`] tiles; each section is governed by
//! one shard worker, chosen by hashing the partition and section coordinates.
//! Each shard is a tokio task draining its own unbounded queue, so tasks for
//! tiles on different shards run concurrently and in no particular order.
//!
//! Activation claims are a concurrent set keyed by partition, tile and owner,
//! which makes claiming and releasing idempotent per owner.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use dashmap::{DashMap, DashSet};
use keepregion_core::{
    ClaimApi, ClaimError, ClaimOwner, PartitionDirectory, PartitionHandle, TileDispatcher, TileTask,
};
use keepregion_model::TileCoord;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Width of a shard section, in tiles.
pub const SECTION_SIZE: i32 = 8;

/// Namespace for deriving stable partition identifiers from names.
const PARTITION_NAMESPACE: Uuid = Uuid::from_u128(0x6b65_6570_7265_6769_6f6e_0000_0000_0001);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClaimKey {
    partition: Uuid,
    tile: TileCoord,
    owner: ClaimOwner,
}

/// A sharded runtime hosting a set of partitions.
#[derive(Debug)]
pub struct ShardedRuntime {
    partitions: DashMap<Uuid, PartitionHandle>,
    claims: DashSet<ClaimKey>,
    queues: RwLock<Vec<mpsc::UnboundedSender<TileTask>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    executed: Vec<AtomicU64>,
    shard_count: usize,
}

impl ShardedRuntime {
    /// Spawn `shard_count` shard workers on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start(shard_count: usize) -> Arc<Self> {
        let shard_count = shard_count.max(1);
        let mut queues = Vec::with_capacity(shard_count);
        let mut receivers = Vec::with_capacity(shard_count);
        for _ in 0..shard_count {
            let (tx, rx) = mpsc::unbounded_channel::<TileTask>();
            queues.push(tx);
            receivers.push(rx);
        }

        let runtime = Arc::new(Self {
            partitions: DashMap::new(),
            claims: DashSet::new(),
            queues: RwLock::new(queues),
            workers: Mutex::new(Vec::with_capacity(shard_count)),
            executed: (0..shard_count).map(|_| AtomicU64::new(0)).collect(),
            shard_count,
        });

        let handles: Vec<JoinHandle<()>> = receivers
            .into_iter()
            .enumerate()
            .map(|(shard, rx)| tokio::spawn(run_shard(Arc::clone(&runtime), shard, rx)))
            .collect();
        runtime
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(handles);

        info!(shards = shard_count, "sharded runtime started");
        runtime
    }

    /// Number of shard workers.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    /// Load a partition. Its identifier is derived from the lowercase name so
    /// it stays stable across restarts.
    pub fn load_partition(&self, name: &str) -> PartitionHandle {
        let id = Uuid::new_v5(&PARTITION_NAMESPACE, name.to_lowercase().as_bytes());
        let handle = PartitionHandle::new(id, name);
        self.partitions.insert(id, handle.clone());
        info!(partition = name, %id, "partition loaded");
        handle
    }

    /// Unload a partition and drop every claim held in it.
    pub fn unload_partition(&self, id: Uuid) -> Option<PartitionHandle> {
        let (_, handle) = self.partitions.remove(&id)?;
        self.claims.retain(|key| key.partition != id);
        info!(partition = handle.name(), %id, "partition unloaded");
        Some(handle)
    }

    /// Loaded partitions, sorted by name.
    #[must_use]
    pub fn partitions(&self) -> Vec<PartitionHandle> {
        let mut all: Vec<PartitionHandle> =
            self.partitions.iter().map(|entry| entry.value().clone()).collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// The shard governing `tile` in `partition`.
    #[must_use]
    pub fn governing_shard(&self, partition: Uuid, tile: TileCoord) -> usize {
        governing_shard(partition, tile, self.shard_count)
    }

    /// Number of distinct tiles in `partition` holding at least one claim.
    #[must_use]
    pub fn claimed_tiles(&self, partition: Uuid) -> usize {
        let tiles: std::collections::HashSet<TileCoord> = self
            .claims
            .iter()
            .filter(|key| key.partition == partition)
            .map(|key| key.tile)
            .collect();
        tiles.len()
    }

    /// Returns `true` if `owner` holds a claim on `tile`.
    #[cfg(test)]
    pub fn is_claimed(&self, owner: &ClaimOwner, partition: Uuid, tile: TileCoord) -> bool {
        self.claims.contains(&ClaimKey {
            partition,
            tile,
            owner: owner.clone(),
        })
    }

    /// Tasks executed so far by each shard.
    #[must_use]
    pub fn executed_per_shard(&self) -> Vec<u64> {
        self.executed
            .iter()
            .map(|count| count.load(Ordering::Relaxed))
            .collect()
    }

    /// Close every shard queue and wait for the workers to drain them.
    pub async fn shutdown(&self) {
        self.queues
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        let workers: Vec<JoinHandle<()>> = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for worker in workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "shard worker failed");
            }
        }
        info!(executed = ?self.executed_per_shard(), "sharded runtime stopped");
    }

    fn check_loaded(&self, partition: &PartitionHandle) -> Result<(), ClaimError> {
        if self.partitions.contains_key(&partition.id()) {
            Ok(())
        } else {
            Err(ClaimError::PartitionUnloaded(partition.name().to_string()))
        }
    }
}

/// Map a tile to a shard via its section.
#[must_use]
pub fn governing_shard(partition: Uuid, tile: TileCoord, shard_count: usize) -> usize {
    let section = (
        tile.x.div_euclid(SECTION_SIZE),
        tile.z.div_euclid(SECTION_SIZE),
    );
    let mut hasher = DefaultHasher::new();
    partition.hash(&mut hasher);
    section.hash(&mut hasher);
    (hasher.finish() % shard_count.max(1) as u64) as usize
}

async fn run_shard(
    runtime: Arc<ShardedRuntime>,
    shard: usize,
    mut queue: mpsc::UnboundedReceiver<TileTask>,
) {
    debug!(shard, "shard worker running");
    while let Some(task) = queue.recv().await {
        task();
        runtime.executed[shard].fetch_add(1, Ordering::Relaxed);
    }
    debug!(shard, "shard worker stopped");
}

impl PartitionDirectory for ShardedRuntime {
    fn by_id(&self, id: Uuid) -> Option<PartitionHandle> {
        self.partitions.get(&id).map(|entry| entry.value().clone())
    }

    fn by_name(&self, name: &str) -> Option<PartitionHandle> {
        self.partitions
            .iter()
            .find(|entry| entry.value().name().eq_ignore_ascii_case(name))
            .map(|entry| entry.value().clone())
    }
}

impl ClaimApi for ShardedRuntime {
    fn claim(
        &self,
        owner: &ClaimOwner,
        partition: &PartitionHandle,
        tile: TileCoord,
    ) -> Result<(), ClaimError> {
        self.check_loaded(partition)?;
        self.claims.insert(ClaimKey {
            partition: partition.id(),
            tile,
            owner: owner.clone(),
        });
        Ok(())
    }

    fn release(
        &self,
        owner: &ClaimOwner,
        partition: &PartitionHandle,
        tile: TileCoord,
    ) -> Result<(), ClaimError> {
        self.check_loaded(partition)?;
        self.claims.remove(&ClaimKey {
            partition: partition.id(),
            tile,
            owner: owner.clone(),
        });
        Ok(())
    }
}

impl TileDispatcher for ShardedRuntime {
    fn dispatch(
        &self,
        _owner: &ClaimOwner,
        partition: &PartitionHandle,
        tile: TileCoord,
        task: TileTask,
    ) {
        let shard = self.governing_shard(partition.id(), tile);
        let queues = self.queues.read().unwrap_or_else(PoisonError::into_inner);
        let sent = queues.get(shard).map(|queue| queue.send(task).is_ok());
        if sent != Some(true) {
            warn!(
                shard,
                x = tile.x,
                z = tile.z,
                partition = partition.name(),
                "runtime is shut down, dropping tile task"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use keepregion_core::{ClaimReconciler, RegionRegistry};
    use keepregion_model::{PartitionRef, Region};
    use keepregion_store::MemoryRegionStore;

    use super::*;

    fn registry_on(runtime: &Arc<ShardedRuntime>) -> RegionRegistry<Arc<MemoryRegionStore>> {
        let reconciler = ClaimReconciler::new(
            ClaimOwner::new("keepregion"),
            runtime.clone(),
            runtime.clone(),
            runtime.clone(),
        );
        RegionRegistry::new(Arc::new(MemoryRegionStore::new()), reconciler)
    }

    #[test]
    fn test_governing_shard_is_per_section() {
        let partition = Uuid::new_v4();
        let a = governing_shard(partition, TileCoord::new(0, 0), 7);
        assert_eq!(a, governing_shard(partition, TileCoord::new(7, 7), 7));
        assert_eq!(
            governing_shard(partition, TileCoord::new(-1, -1), 7),
            governing_shard(partition, TileCoord::new(-8, -8), 7)
        );
        assert!(governing_shard(partition, TileCoord::new(1000, -3), 7) < 7);
        assert_eq!(governing_shard(partition, TileCoord::new(5, 5), 1), 0);
    }

    #[tokio::test]
    async fn test_partition_ids_are_stable() {
        let runtime = ShardedRuntime::start(2);
        let first = runtime.load_partition("World");
        let again = runtime.load_partition("world");
        assert_eq!(first.id(), again.id());
        assert_eq!(runtime.by_name("WORLD").map(|p| p.id()), Some(first.id()));
        assert!(runtime.by_name("nether").is_none());
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_claims_are_idempotent_per_owner() {
        let runtime = ShardedRuntime::start(1);
        let world = runtime.load_partition("world");
        let ours = ClaimOwner::new("keepregion");
        let theirs = ClaimOwner::new("other");
        let tile = TileCoord::new(3, 3);

        runtime.claim(&ours, &world, tile).unwrap();
        runtime.claim(&ours, &world, tile).unwrap();
        runtime.claim(&theirs, &world, tile).unwrap();
        assert_eq!(runtime.claimed_tiles(world.id()), 1);

        runtime.release(&ours, &world, tile).unwrap();
        runtime.release(&ours, &world, tile).unwrap();
        assert!(!runtime.is_claimed(&ours, world.id(), tile));
        assert!(runtime.is_claimed(&theirs, world.id(), tile));
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_unloaded_partition_rejects_claims() {
        let runtime = ShardedRuntime::start(1);
        let world = runtime.load_partition("world");
        let owner = ClaimOwner::new("keepregion");
        runtime.claim(&owner, &world, TileCoord::new(0, 0)).unwrap();
        assert!(runtime.unload_partition(world.id()).is_some());
        assert_eq!(runtime.claimed_tiles(world.id()), 0);
        assert_eq!(
            runtime.claim(&owner, &world, TileCoord::new(0, 0)),
            Err(ClaimError::PartitionUnloaded("world".to_string()))
        );
        runtime.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_registry_claims_through_shards() {
        let runtime = ShardedRuntime::start(4);
        let world = runtime.load_partition("world");
        let mut registry = registry_on(&runtime);

        registry.add_region(Region::declare(
            PartitionRef::identified("world", world.id()),
            TileCoord::new(0, 0),
            10,
            "tester",
        ));
        runtime.shutdown().await;

        assert_eq!(runtime.claimed_tiles(world.id()), 21 * 21);
        let executed: u64 = runtime.executed_per_shard().iter().sum();
        assert_eq!(executed, 21 * 21);
        assert!(runtime.executed_per_shard().iter().filter(|n| **n > 0).count() > 1);
    }

    #[tokio::test]
    async fn test_dispatch_after_shutdown_is_dropped() {
        let runtime = ShardedRuntime::start(2);
        let world = runtime.load_partition("world");
        let mut registry = registry_on(&runtime);
        runtime.shutdown().await;

        registry.add_region(Region::declare(
            PartitionRef::named("world"),
            TileCoord::new(0, 0),
            1,
            "tester",
        ));
        assert_eq!(registry.total_regions(), 1);
        assert_eq!(runtime.claimed_tiles(world.id()), 0);
    }
}
