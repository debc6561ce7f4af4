//! Spatial primitives: integer block coordinates, continuous positions, and
//! the six faces of a block.
//!
//! Block coordinates use saturating arithmetic throughout. The world is far
//! smaller than `i32::MAX` in every direction, so saturation never alters a
//! real coordinate; it only keeps the arithmetic lints satisfied without
//! introducing a panic path.

use core::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// An integer lattice coordinate identifying a single block.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct BlockPos {
    /// East-west axis.
    pub x: i32,
    /// Vertical axis.
    pub y: i32,
    /// North-south axis.
    pub z: i32,
}

impl BlockPos {
    /// Construct a block coordinate.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Translate by the given deltas.
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// The neighbouring block across `face`.
    pub const fn adjacent(self, face: Face) -> Self {
        let (dx, dy, dz) = face.delta();
        self.offset(dx, dy, dz)
    }

    /// The block directly beneath.
    pub const fn below(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// The block directly above.
    pub const fn above(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// The block's minimum corner as a continuous position.
    pub fn as_vec3(self) -> Vec3 {
        Vec3::new(f64::from(self.x), f64::from(self.y), f64::from(self.z))
    }

    /// The centre of the block's bottom face.
    pub fn bottom_center(self) -> Vec3 {
        self.as_vec3().offset(0.5, 0.0, 0.5)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A continuous position in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vec3 {
    /// East-west axis.
    pub x: f64,
    /// Vertical axis.
    pub y: f64,
    /// North-south axis.
    pub z: f64,
}

impl Vec3 {
    /// Construct a position.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Translate by the given deltas.
    pub fn offset(self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dz.mul_add(dz, dx.mul_add(dx, dy * dy)).sqrt()
    }

    /// Distance from this position to the minimum corner of a block.
    pub fn distance_to_block(self, pos: BlockPos) -> f64 {
        self.distance_to(pos.as_vec3())
    }

    /// The block containing this position.
    #[allow(clippy::cast_possible_truncation)]
    pub fn floored(self) -> BlockPos {
        // Values are clamped into i32 range before the cast.
        let clamp = |v: f64| v.floor().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
        BlockPos::new(clamp(self.x), clamp(self.y), clamp(self.z))
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// One of the six faces of a block, named by the direction it points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Face {
    /// Negative Y.
    Down,
    /// Positive Y.
    Up,
    /// Positive X.
    East,
    /// Negative X.
    West,
    /// Positive Z.
    South,
    /// Negative Z.
    North,
}

impl Face {
    /// Neighbours tried, in order, when looking for a block to place against:
    /// below, then +X, -X, +Z, -Z.
    pub const PLACEMENT_ORDER: [Self; 5] =
        [Self::Down, Self::East, Self::West, Self::South, Self::North];

    /// Unit offset from a block to its neighbour across this face.
    pub const fn delta(self) -> (i32, i32, i32) {
        match self {
            Self::Down => (0, -1, 0),
            Self::Up => (0, 1, 0),
            Self::East => (1, 0, 0),
            Self::West => (-1, 0, 0),
            Self::South => (0, 0, 1),
            Self::North => (0, 0, -1),
        }
    }

    /// The face pointing the other way.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
            Self::East => Self::West,
            Self::West => Self::East,
            Self::South => Self::North,
            Self::North => Self::South,
        }
    }
}
