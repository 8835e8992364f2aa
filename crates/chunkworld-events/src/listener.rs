use chunkworld_core::GridIndex;
use std::fmt;

/// Identity of a tracked target.
///
/// The focus always reports as [`TargetId::FOCUS`]; targets bound through a
/// [`TargetBinder`](crate::TargetBinder) get fresh ids starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u64);

impl TargetId {
    pub const FOCUS: TargetId = TargetId(0);

    pub fn is_focus(self) -> bool {
        self == Self::FOCUS
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_focus() {
            write!(f, "focus")
        } else {
            write!(f, "target#{}", self.0)
        }
    }
}

/// Something that happened in a chunk system
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkSystemEvent {
    /// A chunk was stored at the index
    ChunkCreated(GridIndex),
    /// The chunk at the index was removed
    ChunkRemoved(GridIndex),
    /// A target's resolved index became `index`
    TargetEntered { target: TargetId, index: GridIndex },
    /// A target's resolved index stopped being `index`
    TargetLeft { target: TargetId, index: GridIndex },
}

impl ChunkSystemEvent {
    /// Grid index the event refers to
    pub fn index(&self) -> GridIndex {
        match *self {
            ChunkSystemEvent::ChunkCreated(index)
            | ChunkSystemEvent::ChunkRemoved(index)
            | ChunkSystemEvent::TargetEntered { index, .. }
            | ChunkSystemEvent::TargetLeft { index, .. } => index,
        }
    }

    /// Target the event refers to, for boundary events
    pub fn target(&self) -> Option<TargetId> {
        match *self {
            ChunkSystemEvent::TargetEntered { target, .. }
            | ChunkSystemEvent::TargetLeft { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// Generic sink for chunk system events.
///
/// Listeners are called synchronously on the thread that produced the
/// event. They may register or unregister listeners (themselves included)
/// from inside the callback; that takes effect from the next event on.
pub trait ChunkSystemListener: Send + Sync {
    fn on_event(&self, event: &ChunkSystemEvent);
}
