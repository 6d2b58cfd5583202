//! The keep-alive region entity.
//!
//! A [`Region`] is a pure value: once constructed none of its fields change.
//! Changing a region means removing it and declaring a new one.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::partition::PartitionRef;
use crate::tile::TileCoord;

/// Length of the short identifier shown to users.
const SHORT_ID_LEN: usize = 8;

/// Largest radius whose tiles are ever enumerated, `(2 * 1024 + 1)²` tiles.
pub const MAX_RADIUS: u32 = 1024;

/// Globally unique region identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub Uuid);

impl RegionId {
    /// Allocate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn uuid(self) -> Uuid {
        self.0
    }

    /// The first eight characters of the canonical hyphenated form.
    #[must_use]
    pub fn short(self) -> String {
        let mut value = self.0.hyphenated().to_string();
        value.truncate(SHORT_ID_LEN);
        value
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl std::str::FromStr for RegionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A declared keep-alive area: every tile of the square
/// `[x - radius, x + radius] × [z - radius, z + radius]` around `center`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    id: RegionId,
    partition: PartitionRef,
    center: TileCoord,
    radius: u32,
    created_by: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl Region {
    /// Build a region from all of its parts.
    #[must_use]
    pub fn new(
        id: RegionId,
        partition: PartitionRef,
        center: TileCoord,
        radius: u32,
        created_by: Option<String>,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            partition,
            center,
            radius,
            created_by,
            created_at,
        }
    }

    /// Declare a new region now: assigns a fresh id and the current time.
    #[must_use]
    pub fn declare(
        partition: PartitionRef,
        center: TileCoord,
        radius: u32,
        created_by: impl Into<String>,
    ) -> Self {
        Self::new(
            RegionId::generate(),
            partition,
            center,
            radius,
            Some(created_by.into()),
            Some(Utc::now()),
        )
    }

    #[must_use]
    pub fn id(&self) -> RegionId {
        self.id
    }

    #[must_use]
    pub fn partition(&self) -> &PartitionRef {
        &self.partition
    }

    #[must_use]
    pub fn center(&self) -> TileCoord {
        self.center
    }

    #[must_use]
    pub fn radius(&self) -> u32 {
        self.radius
    }

    #[must_use]
    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Short identifier for display and lookup.
    #[must_use]
    pub fn short_id(&self) -> String {
        self.id.short()
    }

    /// Returns `true` if `other` declares the same area: same partition, same
    /// center and same radius. Identifiers and metadata are ignored.
    #[must_use]
    pub fn same_key(&self, other: &Region) -> bool {
        self.partition.matches(&other.partition)
            && self.center == other.center
            && self.radius == other.radius
    }

    /// Number of tiles covered, `(2r + 1)²`, saturating at `u64::MAX`.
    #[must_use]
    pub fn tile_count(&self) -> u64 {
        tile_count_for_radius(self.radius)
    }

    /// Returns `true` if the radius is within [`MAX_RADIUS`].
    #[must_use]
    pub fn is_enumerable(&self) -> bool {
        self.radius <= MAX_RADIUS
    }

    /// Every covered tile, ordered by x then z.
    ///
    /// Tiles whose coordinates would leave the `i32` range are not
    /// addressable and are left out. Regions that are not
    /// [enumerable](Self::is_enumerable) yield no tiles.
    #[must_use]
    pub fn tiles(&self) -> Vec<TileCoord> {
        if !self.is_enumerable() {
            return Vec::new();
        }
        let (min_x, max_x) = axis_bounds(self.center.x, self.radius);
        let (min_z, max_z) = axis_bounds(self.center.z, self.radius);
        let side_x = (i64::from(max_x) - i64::from(min_x) + 1) as usize;
        let side_z = (i64::from(max_z) - i64::from(min_z) + 1) as usize;

        let mut tiles = Vec::with_capacity(side_x * side_z);
        for x in min_x..=max_x {
            for z in min_z..=max_z {
                tiles.push(TileCoord::new(x, z));
            }
        }
        tiles
    }
}

/// Tile count for a square of the given radius, saturating at `u64::MAX`.
#[must_use]
pub fn tile_count_for_radius(radius: u32) -> u64 {
    let side = 2 * u64::from(radius) + 1;
    side.saturating_mul(side)
}

fn axis_bounds(center: i32, radius: u32) -> (i32, i32) {
    let center = i64::from(center);
    let radius = i64::from(radius);
    let min = (center - radius).max(i64::from(i32::MIN));
    let max = (center + radius).min(i64::from(i32::MAX));
    // Both values were clamped into range above.
    (min as i32, max as i32)
}
