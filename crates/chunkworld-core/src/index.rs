//! Integer addressing of chunks in the world grid.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate of a chunk in the grid.
///
/// Indices are signed so the grid extends in every direction from the
/// origin. Two indices are equal iff both components are equal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridIndex {
    /// Column of the chunk (world x / chunk width, floored)
    pub x: i32,
    /// Row of the chunk (world y / chunk height, floored)
    pub y: i32,
}

impl GridIndex {
    pub const ORIGIN: GridIndex = GridIndex { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset this index by a number of chunks on each axis.
    ///
    /// Saturates at the edges of the `i32` range instead of wrapping.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Chebyshev distance (in chunks) between two indices.
    pub fn chebyshev_distance(self, other: GridIndex) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx.max(dy)
    }
}

impl From<(i32, i32)> for GridIndex {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl From<GridIndex> for (i32, i32) {
    fn from(index: GridIndex) -> Self {
        (index.x, index.y)
    }
}

impl fmt::Display for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
