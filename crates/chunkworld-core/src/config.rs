use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::ChunkError;
use crate::index::GridIndex;
use crate::interpreter::PositionInterpreter;
use crate::target::ChunkTarget;

/// Default viewable radius, in chunks around the focus
pub const DEFAULT_RADIUS: u32 = 1;

/// Largest accepted viewable radius.
///
/// Bounds [`ChunkConfiguration::indices_around`] to about four million
/// indices.
pub const MAX_RADIUS: u32 = 1024;

/// World-space size of a single chunk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkDimensions {
    pub width: f32,
    pub height: f32,
}

impl ChunkDimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Square chunks with the given side length
    pub fn square(size: f32) -> Self {
        Self::new(size, size)
    }

    /// Reject zero, negative and non-finite dimensions.
    pub fn validate(&self) -> Result<(), ChunkError> {
        let valid = |d: f32| d.is_finite() && d > 0.0;
        if valid(self.width) && valid(self.height) {
            Ok(())
        } else {
            Err(ChunkError::InvalidConfiguration {
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// Immutable snapshot of how the world is chunked and who is in focus.
///
/// A chunk system never mutates its configuration; it swaps the whole
/// snapshot. Holders of an older snapshot keep a consistent view of it.
#[derive(Clone)]
pub struct ChunkConfiguration {
    dimensions: ChunkDimensions,
    radius: u32,
    focused: Option<Arc<dyn ChunkTarget>>,
}

impl ChunkConfiguration {
    /// Create a configuration with no focus and the default radius.
    ///
    /// The dimensions are checked when the configuration is handed to a
    /// chunk system, or earlier through [`ChunkConfiguration::validate`].
    pub fn new(chunk_width: f32, chunk_height: f32) -> Self {
        Self::with_dimensions(ChunkDimensions::new(chunk_width, chunk_height))
    }

    pub fn with_dimensions(dimensions: ChunkDimensions) -> Self {
        Self {
            dimensions,
            radius: DEFAULT_RADIUS,
            focused: None,
        }
    }

    /// Return a copy focused on the given target
    pub fn with_focus(mut self, target: Arc<dyn ChunkTarget>) -> Self {
        self.focused = Some(target);
        self
    }

    /// Return a copy without a focus
    pub fn without_focus(mut self) -> Self {
        self.focused = None;
        self
    }

    /// Return a copy with a different viewable radius
    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    /// Reject degenerate dimensions and a radius above [`MAX_RADIUS`].
    pub fn validate(&self) -> Result<(), ChunkError> {
        self.dimensions.validate()?;
        if self.radius > MAX_RADIUS {
            return Err(ChunkError::InvalidRadius {
                radius: self.radius,
                max: MAX_RADIUS,
            });
        }
        Ok(())
    }

    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    pub fn chunk_width(&self) -> f32 {
        self.dimensions.width
    }

    pub fn chunk_height(&self) -> f32 {
        self.dimensions.height
    }

    /// Viewable radius in chunks around the focus
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// The distinguished target whose chunk is the active chunk
    pub fn focused(&self) -> Option<&Arc<dyn ChunkTarget>> {
        self.focused.as_ref()
    }

    /// Interpreter bound to this snapshot's dimensions.
    pub fn interpreter(&self) -> PositionInterpreter {
        PositionInterpreter::new(self.dimensions)
    }

    /// Grid index of the focus, if there is one.
    pub fn focused_index(&self) -> Option<GridIndex> {
        let (x, y) = self.focused.as_ref()?.position();
        Some(self.interpreter().translate(x, y))
    }

    /// All indices within the viewable radius of `center`, row by row.
    ///
    /// Yields `(2 * radius + 1)^2` indices including `center` itself, or
    /// fewer where the square is clipped at the edges of the `i32` range.
    pub fn indices_around(&self, center: GridIndex) -> impl Iterator<Item = GridIndex> {
        let r = i32::try_from(self.radius).unwrap_or(i32::MAX);
        let (y_min, y_max) = (center.y.saturating_sub(r), center.y.saturating_add(r));
        let (x_min, x_max) = (center.x.saturating_sub(r), center.x.saturating_add(r));
        (y_min..=y_max).flat_map(move |y| (x_min..=x_max).map(move |x| GridIndex::new(x, y)))
    }
}

impl fmt::Debug for ChunkConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkConfiguration")
            .field("dimensions", &self.dimensions)
            .field("radius", &self.radius)
            .field("focused", &self.focused.as_ref().map(|t| t.position()))
            .finish()
    }
}
