use thiserror::Error;

/// Errors raised by the chunk system core.
///
/// Missing chunks are not errors; lookups that miss return `None`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChunkError {
    /// A chunk dimension was zero, negative or not finite.
    #[error("Invalid configuration: chunk dimensions must be positive and finite (got {width}x{height})")]
    InvalidConfiguration { width: f32, height: f32 },

    /// The viewable radius exceeds [`MAX_RADIUS`](crate::MAX_RADIUS).
    #[error("Invalid configuration: viewable radius {radius} exceeds the maximum of {max}")]
    InvalidRadius { radius: u32, max: u32 },
}
