//! Tile coordinates.
//!
//! A tile is the fixed-size grid cell of a partition. Activation claims are
//! issued per tile.

/// Width of one tile measured in blocks.
pub const TILE_SIZE_BLOCKS: i32 = 16;

/// An integer tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Tile column.
    pub x: i32,
    /// Tile row.
    pub z: i32,
}

impl TileCoord {
    /// Create a tile coordinate.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Returns the tile containing the given block position.
    #[must_use]
    pub const fn from_block(block_x: i32, block_z: i32) -> Self {
        Self {
            x: block_x.div_euclid(TILE_SIZE_BLOCKS),
            z: block_z.div_euclid(TILE_SIZE_BLOCKS),
        }
    }

    /// Chessboard distance to another tile, in tiles.
    #[must_use]
    pub fn chebyshev_distance(self, other: TileCoord) -> u64 {
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dz = (i64::from(self.z) - i64::from(other.z)).unsigned_abs();
        dx.max(dz)
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.z)
    }
}
