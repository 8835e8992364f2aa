//! Binders tie targets to boundary trackers.
//!
//! - [`MovementBinder`] follows whichever target is the focus of the
//!   configuration it is handed each tick.
//! - [`TargetBinder`] follows any number of explicitly bound targets, each
//!   with its own tracker state.
//!
//! Both only resolve and report. Delivering the resulting crossings to
//! handlers and listeners is up to the caller, and no binder lock is held
//! while target positions are read.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chunkworld_core::{ChunkConfiguration, ChunkTarget, GridIndex, PositionInterpreter};
use tracing::debug;

use crate::listener::TargetId;
use crate::tracker::{BoundaryTracker, Crossing};

#[derive(Debug, Default)]
struct FocusState {
    /// Target the tracker state belongs to
    focus: Option<Weak<dyn ChunkTarget>>,
    tracker: BoundaryTracker,
}

/// Boundary tracking for the focus target.
///
/// Tracker state belongs to one target. When the configuration focuses a
/// different target, tracking restarts unresolved and the next crossing
/// only reports "entered".
#[derive(Debug, Default)]
pub struct MovementBinder {
    state: Mutex<FocusState>,
}

impl MovementBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the focus of `configuration` and report a crossing if its
    /// grid index changed since the last call.
    ///
    /// Without a focus nothing is reported and the cached index is kept,
    /// so focusing the same target again resumes where it left off.
    pub fn track(&self, configuration: &ChunkConfiguration) -> Option<Crossing> {
        let focus = configuration.focused()?;
        let (x, y) = focus.position();
        let index = configuration.interpreter().translate(x, y);

        let mut state = lock(&self.state);
        let same_focus = state
            .focus
            .as_ref()
            .is_some_and(|weak| same_target(weak, focus));
        if !same_focus {
            if state.tracker.is_resolved() {
                debug!("focus target changed, tracking restarts");
            }
            state.tracker.reset();
            state.focus = Some(Arc::downgrade(focus));
        }

        let crossing = state.tracker.resolve(index)?;
        debug!(
            left = ?crossing.left,
            entered = %crossing.entered,
            "focus crossed chunk boundary"
        );
        Some(crossing)
    }

    /// Last index the focus resolved to
    pub fn current(&self) -> Option<GridIndex> {
        lock(&self.state).tracker.current()
    }

    /// Forget the focus and its cached index.
    pub fn reset(&self) {
        *lock(&self.state) = FocusState::default();
    }
}

struct BoundTarget {
    target: Weak<dyn ChunkTarget>,
    tracker: BoundaryTracker,
}

/// Boundary tracking for a dynamic set of bound targets.
///
/// Targets are held weakly. A target dropped by its owner is unbound the
/// next time the binder tracks.
pub struct TargetBinder {
    next_id: AtomicU64,
    targets: Mutex<BTreeMap<TargetId, BoundTarget>>,
}

impl TargetBinder {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            targets: Mutex::new(BTreeMap::new()),
        }
    }

    /// Start tracking a target.
    ///
    /// Only a weak reference is kept; the caller keeps the target alive.
    /// Binding a target that is already bound returns its existing id.
    pub fn bind(&self, target: &Arc<dyn ChunkTarget>) -> TargetId {
        let mut targets = lock(&self.targets);

        let existing = targets
            .iter()
            .find(|(_, bound)| same_target(&bound.target, target))
            .map(|(id, _)| *id);
        if let Some(id) = existing {
            return id;
        }

        let id = TargetId(self.next_id.fetch_add(1, Ordering::Relaxed));
        targets.insert(
            id,
            BoundTarget {
                target: Arc::downgrade(target),
                tracker: BoundaryTracker::new(),
            },
        );
        debug!(target_id = %id, "bound target");
        id
    }

    /// Stop tracking a target and discard its cached index.
    pub fn unbind(&self, id: TargetId) -> bool {
        let removed = lock(&self.targets).remove(&id).is_some();
        if removed {
            debug!(target_id = %id, "unbound target");
        }
        removed
    }

    pub fn is_bound(&self, id: TargetId) -> bool {
        lock(&self.targets).contains_key(&id)
    }

    /// Last index a bound target resolved to
    pub fn index_of(&self, id: TargetId) -> Option<GridIndex> {
        lock(&self.targets).get(&id)?.tracker.current()
    }

    /// Ids of all bound targets, ascending
    pub fn ids(&self) -> Vec<TargetId> {
        lock(&self.targets).keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.targets).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.targets).is_empty()
    }

    /// Resolve every bound target and report the ones that crossed a
    /// boundary, in ascending id order.
    pub fn track(&self, interpreter: &PositionInterpreter) -> Vec<(TargetId, Crossing)> {
        let bound: Vec<(TargetId, Weak<dyn ChunkTarget>)> = lock(&self.targets)
            .iter()
            .map(|(id, bound)| (*id, Weak::clone(&bound.target)))
            .collect();

        let mut resolved = Vec::with_capacity(bound.len());
        let mut dropped = Vec::new();
        for (id, target) in bound {
            match target.upgrade() {
                Some(target) => {
                    let (x, y) = target.position();
                    resolved.push((id, interpreter.translate(x, y)));
                }
                None => dropped.push(id),
            }
        }

        let mut targets = lock(&self.targets);
        for id in dropped {
            if targets.remove(&id).is_some() {
                debug!(target_id = %id, "target dropped by owner, unbinding");
            }
        }

        let mut crossings = Vec::new();
        for (id, index) in resolved {
            // Unbound while its position was being read
            let Some(bound) = targets.get_mut(&id) else {
                continue;
            };
            if let Some(crossing) = bound.tracker.resolve(index) {
                debug!(
                    target_id = %id,
                    left = ?crossing.left,
                    entered = %crossing.entered,
                    "target crossed chunk boundary"
                );
                crossings.push((id, crossing));
            }
        }
        crossings
    }
}

impl Default for TargetBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TargetBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetBinder")
            .field("bound", &self.len())
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn same_target(weak: &Weak<dyn ChunkTarget>, target: &Arc<dyn ChunkTarget>) -> bool {
    weak.as_ptr().cast::<()>() == Arc::as_ptr(target).cast::<()>()
}
