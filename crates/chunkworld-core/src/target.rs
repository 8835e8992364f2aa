use std::sync::{PoisonError, RwLock};

/// Anything with a position in continuous world space.
///
/// The chunk system reads the position once per tick per tracker and never
/// mutates it. Implementations must be safe to read from the simulation
/// thread while other threads move them.
pub trait ChunkTarget: Send + Sync {
    /// Current world position as `(x, y)`.
    fn position(&self) -> (f32, f32);
}

/// A movable target backed by a lock.
///
/// Reading and writing both components happens under one lock, so a
/// reader never sees `x` from one move and `y` from another.
#[derive(Debug, Default)]
pub struct PositionTarget {
    position: RwLock<(f32, f32)>,
}

impl PositionTarget {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            position: RwLock::new((x, y)),
        }
    }

    /// Move the target to an absolute world position
    pub fn set_position(&self, x: f32, y: f32) {
        *self.position.write().unwrap_or_else(PoisonError::into_inner) = (x, y);
    }

    /// Move the target by a relative amount
    pub fn translate_by(&self, dx: f32, dy: f32) {
        let mut position = self.position.write().unwrap_or_else(PoisonError::into_inner);
        position.0 += dx;
        position.1 += dy;
    }
}

impl ChunkTarget for PositionTarget {
    fn position(&self) -> (f32, f32) {
        *self.position.read().unwrap_or_else(PoisonError::into_inner)
    }
}
