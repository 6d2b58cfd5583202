//! Test doubles for the host collaborators.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use keepregion_model::TileCoord;
use uuid::Uuid;

use crate::error::ClaimError;
use crate::host::{
    ClaimApi, ClaimOwner, PartitionDirectory, PartitionHandle, TileDispatcher, TileTask,
};

/// A fixed set of loaded partitions.
#[derive(Debug, Default)]
pub struct StaticPartitions {
    partitions: Vec<PartitionHandle>,
}

impl StaticPartitions {
    pub fn new(partitions: Vec<PartitionHandle>) -> Self {
        Self { partitions }
    }
}

impl PartitionDirectory for StaticPartitions {
    fn by_id(&self, id: Uuid) -> Option<PartitionHandle> {
        self.partitions.iter().find(|p| p.id() == id).cloned()
    }

    fn by_name(&self, name: &str) -> Option<PartitionHandle> {
        self.partitions
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .cloned()
    }
}

/// Claim operations observed by [`RecordingClaims`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOp {
    Claim,
    Release,
}

/// Keeps a set of held claims and a log of every call.
#[derive(Debug, Default)]
pub struct RecordingClaims {
    held: Mutex<HashSet<(Uuid, TileCoord)>>,
    log: Mutex<Vec<(ClaimOp, String, TileCoord)>>,
    failing: Mutex<HashSet<TileCoord>>,
}

impl RecordingClaims {
    pub fn fail_on(&self, tile: TileCoord) {
        self.failing.lock().unwrap().insert(tile);
    }

    pub fn held(&self) -> HashSet<(Uuid, TileCoord)> {
        self.held.lock().unwrap().clone()
    }

    pub fn held_in(&self, partition: &PartitionHandle) -> HashSet<TileCoord> {
        self.held()
            .into_iter()
            .filter(|(id, _)| *id == partition.id())
            .map(|(_, tile)| tile)
            .collect()
    }

    pub fn log(&self) -> Vec<(ClaimOp, String, TileCoord)> {
        self.log.lock().unwrap().clone()
    }

    fn record(
        &self,
        op: ClaimOp,
        partition: &PartitionHandle,
        tile: TileCoord,
    ) -> Result<(), ClaimError> {
        self.log
            .lock()
            .unwrap()
            .push((op, partition.name().to_string(), tile));
        if self.failing.lock().unwrap().contains(&tile) {
            return Err(ClaimError::Rejected {
                partition: partition.name().to_string(),
                tile,
                reason: "tile is failing".to_string(),
            });
        }
        let mut held = self.held.lock().unwrap();
        match op {
            ClaimOp::Claim => held.insert((partition.id(), tile)),
            ClaimOp::Release => held.remove(&(partition.id(), tile)),
        };
        Ok(())
    }
}

impl ClaimApi for RecordingClaims {
    fn claim(
        &self,
        _owner: &ClaimOwner,
        partition: &PartitionHandle,
        tile: TileCoord,
    ) -> Result<(), ClaimError> {
        self.record(ClaimOp::Claim, partition, tile)
    }

    fn release(
        &self,
        _owner: &ClaimOwner,
        partition: &PartitionHandle,
        tile: TileCoord,
    ) -> Result<(), ClaimError> {
        self.record(ClaimOp::Release, partition, tile)
    }
}

/// Queues tasks until [`QueuedDispatcher::drain`] is called, running them in
/// reverse order to mimic out-of-order shard execution.
#[derive(Default)]
pub struct QueuedDispatcher {
    queue: Mutex<VecDeque<TileTask>>,
}

impl QueuedDispatcher {
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn drain(&self) {
        let tasks: Vec<TileTask> = self.queue.lock().unwrap().drain(..).rev().collect();
        for task in tasks {
            task();
        }
    }
}

impl TileDispatcher for QueuedDispatcher {
    fn dispatch(
        &self,
        _owner: &ClaimOwner,
        _partition: &PartitionHandle,
        _tile: TileCoord,
        task: TileTask,
    ) {
        self.queue.lock().unwrap().push_back(task);
    }
}
