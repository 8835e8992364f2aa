//! Translation from continuous world coordinates to grid indices.

use crate::config::ChunkDimensions;
use crate::index::GridIndex;

/// Maps world coordinates onto the chunk grid for one set of dimensions.
///
/// Uses floor division so that the mapping is contiguous across the
/// origin: with a chunk width of 10, world x in `[-10, 0)` lands in column
/// -1 and `[0, 10)` in column 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionInterpreter {
    chunk_width: f32,
    chunk_height: f32,
}

impl PositionInterpreter {
    /// Create an interpreter for the given dimensions.
    ///
    /// The dimensions are expected to be validated already; see
    /// [`ChunkDimensions::validate`].
    pub fn new(dimensions: ChunkDimensions) -> Self {
        Self {
            chunk_width: dimensions.width,
            chunk_height: dimensions.height,
        }
    }

    /// Column of the chunk containing world x.
    pub fn translate_x(&self, world_x: f32) -> i32 {
        translate(world_x, self.chunk_width)
    }

    /// Row of the chunk containing world y.
    pub fn translate_y(&self, world_y: f32) -> i32 {
        translate(world_y, self.chunk_height)
    }

    /// Grid index of the chunk containing a world position.
    pub fn translate(&self, world_x: f32, world_y: f32) -> GridIndex {
        GridIndex::new(self.translate_x(world_x), self.translate_y(world_y))
    }

    /// World position of the lower corner of a chunk.
    pub fn chunk_origin(&self, index: GridIndex) -> (f32, f32) {
        (
            index.x as f32 * self.chunk_width,
            index.y as f32 * self.chunk_height,
        )
    }
}

/// `floor(coordinate / dimension)` as a grid coordinate.
///
/// Results beyond the `i32` range saturate.
///
/// # Examples
///
/// ```
/// use chunkworld_core::interpreter::translate;
///
/// assert_eq!(translate(15.0, 10.0), 1);
/// assert_eq!(translate(-1.0, 10.0), -1);
/// assert_eq!(translate(-10.0, 10.0), -1);
/// assert_eq!(translate(-11.0, 10.0), -2);
/// ```
pub fn translate(coordinate: f32, dimension: f32) -> i32 {
    // Divide in f64 so large coordinates keep their fractional part
    (f64::from(coordinate) / f64::from(dimension)).floor() as i32
}
