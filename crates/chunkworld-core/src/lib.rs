pub mod config;
pub mod error;
pub mod index;
pub mod interpreter;
pub mod matrix;
pub mod target;

pub use config::{ChunkConfiguration, ChunkDimensions, DEFAULT_RADIUS, MAX_RADIUS};
pub use error::ChunkError;
pub use index::GridIndex;
pub use interpreter::PositionInterpreter;
pub use matrix::ChunkMatrix;
pub use target::{ChunkTarget, PositionTarget};
