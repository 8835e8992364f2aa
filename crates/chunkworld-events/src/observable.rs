//! Registry of weakly held listeners with snapshot dispatch.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

/// Ordered set of listeners of type `L`.
///
/// Listeners are held weakly: the registry never keeps one alive, and a
/// listener whose last `Arc` is dropped disappears from the set. Identity
/// is allocation identity, so the same `Arc` cannot be registered twice.
///
/// [`Observable::notify`] iterates a snapshot taken when it starts, so
/// listeners added or removed during a dispatch only see (or miss) later
/// dispatches.
pub struct Observable<L: ?Sized> {
    listeners: RwLock<Vec<Weak<L>>>,
}

impl<L: ?Sized> Observable<L> {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a listener. Returns false if it was already registered.
    pub fn add_listener(&self, listener: &Arc<L>) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|weak| weak.strong_count() > 0);

        if listeners.iter().any(|weak| same_listener(weak, listener)) {
            return false;
        }

        listeners.push(Arc::downgrade(listener));
        true
    }

    /// Unregister a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, listener: &Arc<L>) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|weak| !same_listener(weak, listener));
        listeners.len() != before
    }

    pub fn has_listener(&self, listener: &Arc<L>) -> bool {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|weak| same_listener(weak, listener))
    }

    /// Live listeners in registration order.
    pub fn listeners(&self) -> Vec<Arc<L>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Number of live listeners
    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call `f` on every listener registered when the call starts.
    ///
    /// No lock is held while `f` runs.
    pub fn notify(&self, mut f: impl FnMut(&L)) {
        for listener in self.listeners() {
            f(&*listener);
        }
    }

    /// Drop entries whose listener no longer exists.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&self) -> usize {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|weak| weak.strong_count() > 0);
        before - listeners.len()
    }
}

impl<L: ?Sized> Default for Observable<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> fmt::Debug for Observable<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("listeners", &self.len())
            .finish()
    }
}

fn same_listener<L: ?Sized>(weak: &Weak<L>, listener: &Arc<L>) -> bool {
    // Data pointers only; vtable addresses are not unique per type
    weak.as_ptr().cast::<()>() == Arc::as_ptr(listener).cast::<()>()
}
