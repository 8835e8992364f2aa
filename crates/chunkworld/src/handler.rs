use chunkworld_core::GridIndex;

use crate::system::ChunkSystem;

/// Policy invoked when the focus crosses a chunk boundary.
///
/// The handler decides what entering or leaving a chunk means, typically
/// loading or generating chunks around the new index and saving and
/// removing the ones left behind. It receives the system that reported
/// the crossing and may call back into it freely.
pub trait ChunkHandler<C>: Send + Sync {
    /// The focus now resolves to `index`.
    fn on_enter(&self, system: &ChunkSystem<C>, index: GridIndex);

    /// The focus no longer resolves to `index`.
    fn on_leave(&self, system: &ChunkSystem<C>, index: GridIndex);
}

/// Source of persisted chunks.
///
/// The chunk system only stores the loader; handlers call it.
pub trait ChunkLoader<C>: Send + Sync {
    /// Load the chunk stored for `index`, or `None` if nothing was stored.
    fn load(&self, index: GridIndex) -> anyhow::Result<Option<C>>;
}

/// Sink for chunks leaving memory.
///
/// The chunk system only stores the saver; handlers call it.
pub trait ChunkSaver<C>: Send + Sync {
    fn save(&self, index: GridIndex, chunk: &C) -> anyhow::Result<()>;
}
