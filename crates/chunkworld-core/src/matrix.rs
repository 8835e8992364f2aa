//! Concurrent sparse storage for chunks.
//!
//! The matrix maps signed grid indices to chunks and only allocates for
//! indices that hold one, so it can represent an unbounded world around
//! the origin. Storage is a sharded [`DashMap`]:
//! - reads and writes on indices in different shards never contend
//! - writes to the same index are serialized by the shard lock
//!
//! Chunks are stored behind [`Arc`], so a lookup hands out a clone of the
//! pointer and never a reference into the map. No shard lock outlives a
//! call, which is what makes it safe to mutate the matrix while iterating
//! a snapshot of it.

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use crate::index::GridIndex;

/// Sparse, thread-safe 2D matrix of chunks keyed by [`GridIndex`].
pub struct ChunkMatrix<C> {
    chunks: DashMap<GridIndex, Arc<C>>,
}

impl<C> ChunkMatrix<C> {
    /// Create a new empty matrix.
    pub fn new() -> Self {
        Self {
            chunks: DashMap::new(),
        }
    }

    /// Store a chunk at the given index.
    ///
    /// Returns the chunk previously stored there, if any.
    pub fn put(&self, index: GridIndex, chunk: C) -> Option<Arc<C>> {
        self.put_shared(index, Arc::new(chunk))
    }

    /// Store an already shared chunk at the given index.
    pub fn put_shared(&self, index: GridIndex, chunk: Arc<C>) -> Option<Arc<C>> {
        self.chunks.insert(index, chunk)
    }

    /// Get the chunk at the given index.
    pub fn get(&self, index: GridIndex) -> Option<Arc<C>> {
        self.chunks.get(&index).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove the chunk at the given index.
    ///
    /// Returns the chunk if one was stored there.
    pub fn remove(&self, index: GridIndex) -> Option<Arc<C>> {
        self.chunks.remove(&index).map(|(_, chunk)| chunk)
    }

    /// Check if a chunk exists at the given index.
    pub fn contains(&self, index: GridIndex) -> bool {
        self.chunks.contains_key(&index)
    }

    /// Get the number of stored chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Check if the matrix is empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Point-in-time copy of every stored chunk, in no particular order.
    pub fn snapshot(&self) -> Vec<Arc<C>> {
        self.chunks
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Point-in-time copy of every occupied index, in no particular order.
    pub fn indices(&self) -> Vec<GridIndex> {
        self.chunks.iter().map(|entry| *entry.key()).collect()
    }

    /// Point-in-time copy of every `(index, chunk)` pair.
    pub fn entries(&self) -> Vec<(GridIndex, Arc<C>)> {
        self.chunks
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect()
    }

    /// Remove every chunk.
    pub fn clear(&self) {
        self.chunks.clear();
    }
}

impl<C> Default for ChunkMatrix<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for ChunkMatrix<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkMatrix")
            .field("len", &self.chunks.len())
            .finish()
    }
}
