//! Chunk management for effectively unbounded 2D worlds.
//!
//! A [`ChunkSystem`] partitions the world into fixed-size chunks, stores the
//! chunks currently resident in memory and, once per tick, reports which
//! tracked targets crossed a chunk boundary. What happens on a crossing
//! (loading, generating, unloading, saving) is decided by an injected
//! [`ChunkHandler`] and any number of [`ChunkSystemListener`]s.

pub mod handler;
pub mod system;

pub use chunkworld_core::{
    ChunkConfiguration, ChunkDimensions, ChunkError, ChunkMatrix, ChunkTarget, GridIndex,
    PositionInterpreter, PositionTarget,
};
pub use chunkworld_events::{ChunkSystemEvent, ChunkSystemListener, TargetId};
pub use handler::{ChunkHandler, ChunkLoader, ChunkSaver};
pub use system::ChunkSystem;
