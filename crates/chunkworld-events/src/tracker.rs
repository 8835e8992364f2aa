//! Per-target chunk boundary detection.

use chunkworld_core::GridIndex;

use crate::listener::{ChunkSystemEvent, TargetId};

/// A change of resolved grid index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Crossing {
    /// Index the target was in, `None` on its first resolution
    pub left: Option<GridIndex>,
    /// Index the target is in now
    pub entered: GridIndex,
}

impl Crossing {
    /// The crossing as events for `target`: left first, then entered.
    pub fn events(&self, target: TargetId) -> impl Iterator<Item = ChunkSystemEvent> {
        let left = self
            .left
            .map(|index| ChunkSystemEvent::TargetLeft { target, index });
        let entered = ChunkSystemEvent::TargetEntered {
            target,
            index: self.entered,
        };
        left.into_iter().chain(std::iter::once(entered))
    }
}

/// Remembers the last index a target resolved to.
///
/// Starts unresolved. Every call to [`BoundaryTracker::resolve`] compares
/// the new index against the cached one and reports a [`Crossing`] only
/// when they differ.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundaryTracker {
    current: Option<GridIndex>,
}

impl BoundaryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last resolved index, `None` while unresolved
    pub fn current(&self) -> Option<GridIndex> {
        self.current
    }

    pub fn is_resolved(&self) -> bool {
        self.current.is_some()
    }

    /// Feed the target's freshly computed index.
    pub fn resolve(&mut self, index: GridIndex) -> Option<Crossing> {
        match self.current {
            Some(current) if current == index => None,
            previous => {
                self.current = Some(index);
                Some(Crossing {
                    left: previous,
                    entered: index,
                })
            }
        }
    }

    /// Forget the cached index; the next resolution reports a fresh entry.
    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_resolution_enters_only() {
        let mut tracker = BoundaryTracker::new();
        assert!(!tracker.is_resolved());

        let crossing = tracker.resolve(GridIndex::new(0, 0)).unwrap();
        assert_eq!(crossing.left, None);
        assert_eq!(crossing.entered, GridIndex::new(0, 0));
        assert_eq!(tracker.current(), Some(GridIndex::new(0, 0)));

        let events: Vec<_> = crossing.events(TargetId::FOCUS).collect();
        assert_eq!(
            events,
            vec![ChunkSystemEvent::TargetEntered {
                target: TargetId::FOCUS,
                index: GridIndex::new(0, 0)
            }]
        );
    }

    #[test]
    fn test_same_index_is_silent() {
        let mut tracker = BoundaryTracker::new();
        tracker.resolve(GridIndex::new(2, 2));
        assert_eq!(tracker.resolve(GridIndex::new(2, 2)), None);
        assert_eq!(tracker.resolve(GridIndex::new(2, 2)), None);
        assert_eq!(tracker.current(), Some(GridIndex::new(2, 2)));
    }

    #[test]
    fn test_crossing_leaves_before_entering() {
        let mut tracker = BoundaryTracker::new();
        tracker.resolve(GridIndex::new(2, 2));

        let crossing = tracker.resolve(GridIndex::new(2, 3)).unwrap();
        let target = TargetId(4);
        let events: Vec<_> = crossing.events(target).collect();
        assert_eq!(
            events,
            vec![
                ChunkSystemEvent::TargetLeft {
                    target,
                    index: GridIndex::new(2, 2)
                },
                ChunkSystemEvent::TargetEntered {
                    target,
                    index: GridIndex::new(2, 3)
                },
            ]
        );
        assert_eq!(tracker.current(), Some(GridIndex::new(2, 3)));
    }

    #[test]
    fn test_reset_starts_over() {
        let mut tracker = BoundaryTracker::new();
        tracker.resolve(GridIndex::new(-1, -1));
        tracker.reset();
        assert!(!tracker.is_resolved());

        let crossing = tracker.resolve(GridIndex::new(-1, -1)).unwrap();
        assert_eq!(crossing.left, None);
    }
}
