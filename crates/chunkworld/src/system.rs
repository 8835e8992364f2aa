use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chunkworld_core::{
    ChunkConfiguration, ChunkError, ChunkMatrix, ChunkTarget, GridIndex, PositionInterpreter,
};
use chunkworld_events::{
    ChunkSystemEvent, ChunkSystemListener, Crossing, MovementBinder, Observable, TargetBinder,
    TargetId,
};
use tracing::{debug, info, trace, warn};

use crate::handler::{ChunkHandler, ChunkLoader, ChunkSaver};

#[derive(Debug, Default)]
struct Clock {
    ticks: u64,
    elapsed: f64,
}

/// Keeps the chunks of an unbounded 2D world and reports when tracked
/// targets cross chunk boundaries.
///
/// Each [`update`](ChunkSystem::update) resolves the focus and every bound
/// target against the current configuration. A focus crossing is handed to
/// the [`ChunkHandler`] and then published to all listeners; a bound
/// target's crossing is published to listeners only. For each target the
/// "left" event always precedes the "entered" event.
///
/// Every method takes `&self`. Readers may query chunks from other threads
/// while one simulation thread drives `update`, and handlers or listeners
/// may call back into the system from inside their callbacks.
pub struct ChunkSystem<C> {
    configuration: RwLock<Arc<ChunkConfiguration>>,
    chunks: ChunkMatrix<C>,
    listeners: Observable<dyn ChunkSystemListener>,
    movement: MovementBinder,
    targets: TargetBinder,
    handler: RwLock<Option<Arc<dyn ChunkHandler<C>>>>,
    loader: RwLock<Option<Arc<dyn ChunkLoader<C>>>>,
    saver: RwLock<Option<Arc<dyn ChunkSaver<C>>>>,
    clock: Mutex<Clock>,
}

impl<C: Send + Sync + 'static> ChunkSystem<C> {
    /// Create an empty chunk system.
    ///
    /// Fails if the configuration has degenerate chunk dimensions.
    pub fn new(configuration: ChunkConfiguration) -> Result<Self, ChunkError> {
        configuration.validate()?;
        Ok(Self {
            configuration: RwLock::new(Arc::new(configuration)),
            chunks: ChunkMatrix::new(),
            listeners: Observable::new(),
            movement: MovementBinder::new(),
            targets: TargetBinder::new(),
            handler: RwLock::new(None),
            loader: RwLock::new(None),
            saver: RwLock::new(None),
            clock: Mutex::new(Clock::default()),
        })
    }

    // Configuration

    /// Current configuration snapshot
    pub fn configuration(&self) -> Arc<ChunkConfiguration> {
        Arc::clone(&self.configuration.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the configuration.
    ///
    /// Does not report any crossing by itself; the next update re-resolves
    /// every tracked target against the new grid. On error the previous
    /// configuration stays active.
    pub fn set_configuration(&self, configuration: ChunkConfiguration) -> Result<(), ChunkError> {
        if let Err(err) = configuration.validate() {
            warn!(%err, "rejected chunk configuration");
            return Err(err);
        }

        info!(
            width = configuration.chunk_width(),
            height = configuration.chunk_height(),
            radius = configuration.radius(),
            focused = configuration.focused().is_some(),
            "chunk configuration replaced"
        );
        *self.configuration.write().unwrap_or_else(PoisonError::into_inner) =
            Arc::new(configuration);
        Ok(())
    }

    /// Interpreter for the current configuration
    pub fn interpreter(&self) -> PositionInterpreter {
        self.configuration().interpreter()
    }

    // Ticking

    /// Advance by one tick of `delta` seconds and report boundary crossings.
    pub fn update(&self, delta: f32) {
        let tick = {
            let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
            clock.ticks += 1;
            clock.elapsed += f64::from(delta);
            clock.ticks
        };
        trace!(tick, delta, "chunk system update");

        let configuration = self.configuration();

        if let Some(crossing) = self.movement.track(&configuration) {
            self.report_focus(crossing);
        }

        for (target, crossing) in self.targets.track(&configuration.interpreter()) {
            for event in crossing.events(target) {
                self.publish(&event);
            }
        }
    }

    /// Zero-length update, e.g. to pick up a teleported target right away
    pub fn tick(&self) {
        self.update(0.0);
    }

    /// Number of updates so far
    pub fn ticks(&self) -> u64 {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner).ticks
    }

    /// Sum of all update deltas
    pub fn elapsed(&self) -> f64 {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner).elapsed
    }

    fn report_focus(&self, crossing: Crossing) {
        // The handler is looked up per event so a swap made inside a
        // callback applies to the very next event.
        if let Some(index) = crossing.left {
            if let Some(handler) = self.handler() {
                handler.on_leave(self, index);
            }
            self.publish(&ChunkSystemEvent::TargetLeft {
                target: TargetId::FOCUS,
                index,
            });
        }

        if let Some(handler) = self.handler() {
            handler.on_enter(self, crossing.entered);
        }
        self.publish(&ChunkSystemEvent::TargetEntered {
            target: TargetId::FOCUS,
            index: crossing.entered,
        });
    }

    fn publish(&self, event: &ChunkSystemEvent) {
        self.listeners.notify(|listener| listener.on_event(event));
    }

    // Chunks

    /// Grid index the focus currently resolves to
    pub fn active_index(&self) -> Option<GridIndex> {
        self.configuration().focused_index()
    }

    /// The chunk the focus is currently in.
    ///
    /// `None` if there is no focus or no chunk is stored at its index.
    pub fn active_chunk(&self) -> Option<Arc<C>> {
        self.chunks.get(self.active_index()?)
    }

    /// Indices within the viewable radius of the focus, row by row
    pub fn visible_indices(&self) -> Vec<GridIndex> {
        let configuration = self.configuration();
        match configuration.focused_index() {
            Some(center) => configuration.indices_around(center).collect(),
            None => Vec::new(),
        }
    }

    /// The chunk stored at grid index `(x, y)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chunkworld::{ChunkConfiguration, ChunkSystem, GridIndex};
    ///
    /// let system = ChunkSystem::new(ChunkConfiguration::new(10.0, 10.0)).unwrap();
    /// system.insert_chunk(GridIndex::new(-1, 2), "swamp");
    ///
    /// assert_eq!(system.chunk(-1, 2).as_deref(), Some(&"swamp"));
    /// assert!(system.chunk(2, -1).is_none());
    /// ```
    pub fn chunk(&self, x: i32, y: i32) -> Option<Arc<C>> {
        self.chunks.get(GridIndex::new(x, y))
    }

    /// The chunk stored at `index`
    pub fn chunk_at(&self, index: GridIndex) -> Option<Arc<C>> {
        self.chunks.get(index)
    }

    pub fn contains_chunk(&self, index: GridIndex) -> bool {
        self.chunks.contains(index)
    }

    /// Point-in-time copy of all stored chunks, in no particular order
    pub fn chunks(&self) -> Vec<Arc<C>> {
        self.chunks.snapshot()
    }

    /// Point-in-time copy of all occupied indices
    pub fn chunk_indices(&self) -> Vec<GridIndex> {
        self.chunks.indices()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Store a chunk and publish [`ChunkSystemEvent::ChunkCreated`].
    ///
    /// Returns the chunk it replaced, if any.
    pub fn insert_chunk(&self, index: GridIndex, chunk: C) -> Option<Arc<C>> {
        let previous = self.chunks.put(index, chunk);
        debug!(%index, replaced = previous.is_some(), "chunk inserted");
        self.publish(&ChunkSystemEvent::ChunkCreated(index));
        previous
    }

    /// Remove a chunk and publish [`ChunkSystemEvent::ChunkRemoved`].
    ///
    /// Nothing is published if no chunk was stored at `index`.
    pub fn remove_chunk(&self, index: GridIndex) -> Option<Arc<C>> {
        let removed = self.chunks.remove(index)?;
        debug!(%index, "chunk removed");
        self.publish(&ChunkSystemEvent::ChunkRemoved(index));
        Some(removed)
    }

    // Listeners

    /// Register a listener. Registering the same listener twice is a no-op.
    ///
    /// The system holds listeners weakly; keep the `Arc` alive for as long
    /// as the listener should receive events.
    pub fn add_listener(&self, listener: &Arc<dyn ChunkSystemListener>) -> bool {
        self.listeners.add_listener(listener)
    }

    /// Unregister a listener. Returns false if it was not registered.
    ///
    /// Safe to call from inside the listener's own callback.
    pub fn remove_listener(&self, listener: &Arc<dyn ChunkSystemListener>) -> bool {
        self.listeners.remove_listener(listener)
    }

    pub fn has_listener(&self, listener: &Arc<dyn ChunkSystemListener>) -> bool {
        self.listeners.has_listener(listener)
    }

    /// Live listeners in registration order
    pub fn listeners(&self) -> Vec<Arc<dyn ChunkSystemListener>> {
        self.listeners.listeners()
    }

    // Collaborators

    /// Replace the handler that receives focus crossings.
    ///
    /// Every event dispatched after the swap goes to the new handler,
    /// including the rest of a crossing whose "left" half triggered the
    /// swap. An event another thread was already dispatching may still
    /// reach the old handler. Returns the handler that was replaced.
    pub fn set_handler(&self, handler: Arc<dyn ChunkHandler<C>>) -> Option<Arc<dyn ChunkHandler<C>>> {
        debug!("chunk handler replaced");
        self.handler
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handler)
    }

    pub fn handler(&self) -> Option<Arc<dyn ChunkHandler<C>>> {
        self.handler.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Store the loader for handlers to use. Returns the previous one.
    pub fn set_loader(&self, loader: Arc<dyn ChunkLoader<C>>) -> Option<Arc<dyn ChunkLoader<C>>> {
        debug!("chunk loader replaced");
        self.loader
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(loader)
    }

    pub fn loader(&self) -> Option<Arc<dyn ChunkLoader<C>>> {
        self.loader.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Store the saver for handlers to use. Returns the previous one.
    pub fn set_saver(&self, saver: Arc<dyn ChunkSaver<C>>) -> Option<Arc<dyn ChunkSaver<C>>> {
        debug!("chunk saver replaced");
        self.saver
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(saver)
    }

    pub fn saver(&self) -> Option<Arc<dyn ChunkSaver<C>>> {
        self.saver.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    // Bound targets

    /// Track an additional target. Its crossings are published to listeners
    /// under the returned id.
    ///
    /// The target is held weakly, like listeners: it stays bound for as
    /// long as the caller keeps it alive.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use chunkworld::{ChunkConfiguration, ChunkSystem, ChunkTarget, GridIndex, PositionTarget};
    ///
    /// let system: ChunkSystem<()> = ChunkSystem::new(ChunkConfiguration::new(10.0, 10.0)).unwrap();
    /// let npc: Arc<dyn ChunkTarget> = Arc::new(PositionTarget::new(-5.0, 25.0));
    /// let id = system.bind_target(&npc);
    ///
    /// system.tick();
    /// assert_eq!(system.target_index(id), Some(GridIndex::new(-1, 2)));
    /// ```
    pub fn bind_target(&self, target: &Arc<dyn ChunkTarget>) -> TargetId {
        self.targets.bind(target)
    }

    /// Stop tracking a bound target. Returns false if `id` was not bound.
    pub fn unbind_target(&self, id: TargetId) -> bool {
        self.targets.unbind(id)
    }

    pub fn is_target_bound(&self, id: TargetId) -> bool {
        self.targets.is_bound(id)
    }

    /// Number of bound targets, not counting the focus
    pub fn bound_target_count(&self) -> usize {
        self.targets.len()
    }

    /// Last index a bound target resolved to
    pub fn target_index(&self, id: TargetId) -> Option<GridIndex> {
        self.targets.index_of(id)
    }
}

impl<C> fmt::Debug for ChunkSystem<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkSystem")
            .field("chunks", &self.chunks)
            .field("listeners", &self.listeners)
            .field("movement", &self.movement)
            .field("targets", &self.targets)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkworld_core::PositionTarget;

    #[derive(Default)]
    struct EventLog {
        events: Mutex<Vec<ChunkSystemEvent>>,
    }

    impl EventLog {
        fn take(&self) -> Vec<ChunkSystemEvent> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }
    }

    impl ChunkSystemListener for EventLog {
        fn on_event(&self, event: &ChunkSystemEvent) {
            self.events.lock().unwrap().push(*event);
        }
    }

    #[derive(Default)]
    struct HandlerLog {
        calls: Mutex<Vec<(&'static str, GridIndex)>>,
    }

    impl ChunkHandler<String> for HandlerLog {
        fn on_enter(&self, _system: &ChunkSystem<String>, index: GridIndex) {
            self.calls.lock().unwrap().push(("enter", index));
        }

        fn on_leave(&self, _system: &ChunkSystem<String>, index: GridIndex) {
            self.calls.lock().unwrap().push(("leave", index));
        }
    }

    struct NoLoader;

    impl ChunkLoader<String> for NoLoader {
        fn load(&self, _index: GridIndex) -> anyhow::Result<Option<String>> {
            Ok(None)
        }
    }

    struct NoSaver;

    impl ChunkSaver<String> for NoSaver {
        fn save(&self, _index: GridIndex, _chunk: &String) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn focused_system(x: f32, y: f32) -> (ChunkSystem<String>, Arc<PositionTarget>) {
        let focus = Arc::new(PositionTarget::new(x, y));
        let config = ChunkConfiguration::new(10.0, 10.0).with_focus(focus.clone());
        (ChunkSystem::new(config).unwrap(), focus)
    }

    fn as_target(target: &Arc<PositionTarget>) -> Arc<dyn ChunkTarget> {
        target.clone()
    }

    #[test]
    fn test_new_rejects_degenerate_dimensions() {
        let err = ChunkSystem::<String>::new(ChunkConfiguration::new(0.0, 10.0)).unwrap_err();
        assert!(matches!(err, ChunkError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_set_configuration_keeps_previous_on_error() {
        let (system, _focus) = focused_system(5.0, 5.0);

        let result = system.set_configuration(ChunkConfiguration::new(-10.0, 10.0));
        assert_eq!(
            result,
            Err(ChunkError::InvalidConfiguration {
                width: -10.0,
                height: 10.0
            })
        );
        assert_eq!(system.configuration().chunk_width(), 10.0);
        assert_eq!(system.active_index(), Some(GridIndex::new(0, 0)));
    }

    #[test]
    fn test_active_chunk() {
        let (system, focus) = focused_system(5.0, 5.0);
        assert!(system.active_chunk().is_none());

        system.insert_chunk(GridIndex::new(0, 0), "home".to_string());
        assert_eq!(system.active_chunk().as_deref().map(String::as_str), Some("home"));

        focus.set_position(-3.0, 5.0);
        assert_eq!(system.active_index(), Some(GridIndex::new(-1, 0)));
        assert!(system.active_chunk().is_none());
    }

    #[test]
    fn test_no_focus_means_no_active_chunk() {
        let system: ChunkSystem<String> = ChunkSystem::new(ChunkConfiguration::new(10.0, 10.0)).unwrap();
        system.insert_chunk(GridIndex::new(0, 0), "home".to_string());
        assert!(system.active_index().is_none());
        assert!(system.active_chunk().is_none());
        assert!(system.visible_indices().is_empty());
    }

    #[test]
    fn test_grid_accessors() {
        let (system, _focus) = focused_system(0.0, 0.0);
        system.insert_chunk(GridIndex::new(-1, 2), "a".to_string());
        system.insert_chunk(GridIndex::new(3, -4), "b".to_string());

        assert_eq!(system.chunk_count(), 2);
        assert_eq!(system.chunk(-1, 2).as_deref().map(String::as_str), Some("a"));
        assert!(system.chunk(2, -1).is_none());
        assert!(system.contains_chunk(GridIndex::new(3, -4)));
        assert_eq!(system.chunks().len(), 2);

        let mut indices = system.chunk_indices();
        indices.sort();
        assert_eq!(indices, vec![GridIndex::new(-1, 2), GridIndex::new(3, -4)]);

        assert!(system.remove_chunk(GridIndex::new(-1, 2)).is_some());
        assert!(system.chunk_at(GridIndex::new(-1, 2)).is_none());
        assert_eq!(system.chunk_count(), 1);
    }

    #[test]
    fn test_chunk_lifecycle_events() {
        let (system, _focus) = focused_system(0.0, 0.0);
        let log = Arc::new(EventLog::default());
        let listener: Arc<dyn ChunkSystemListener> = log.clone();
        system.add_listener(&listener);

        let index = GridIndex::new(4, -4);
        system.insert_chunk(index, "x".to_string());
        system.insert_chunk(index, "y".to_string());
        system.remove_chunk(index);
        system.remove_chunk(index);

        assert_eq!(
            log.take(),
            vec![
                ChunkSystemEvent::ChunkCreated(index),
                ChunkSystemEvent::ChunkCreated(index),
                ChunkSystemEvent::ChunkRemoved(index),
            ]
        );
    }

    #[test]
    fn test_listener_registration() {
        let (system, _focus) = focused_system(0.0, 0.0);
        let listener: Arc<dyn ChunkSystemListener> = Arc::new(EventLog::default());

        assert!(system.add_listener(&listener));
        assert!(!system.add_listener(&listener));
        assert_eq!(system.listeners().len(), 1);

        assert!(system.remove_listener(&listener));
        assert!(!system.has_listener(&listener));
        assert!(system.listeners().is_empty());
    }

    #[test]
    fn test_update_reports_focus_crossings() {
        let (system, focus) = focused_system(5.0, 5.0);
        let handler = Arc::new(HandlerLog::default());
        system.set_handler(handler.clone());
        let log = Arc::new(EventLog::default());
        let listener: Arc<dyn ChunkSystemListener> = log.clone();
        system.add_listener(&listener);

        system.tick();
        focus.set_position(15.0, 5.0);
        system.tick();
        system.tick();

        assert_eq!(
            *handler.calls.lock().unwrap(),
            vec![
                ("enter", GridIndex::new(0, 0)),
                ("leave", GridIndex::new(0, 0)),
                ("enter", GridIndex::new(1, 0)),
            ]
        );
        assert_eq!(
            log.take(),
            vec![
                ChunkSystemEvent::TargetEntered {
                    target: TargetId::FOCUS,
                    index: GridIndex::new(0, 0)
                },
                ChunkSystemEvent::TargetLeft {
                    target: TargetId::FOCUS,
                    index: GridIndex::new(0, 0)
                },
                ChunkSystemEvent::TargetEntered {
                    target: TargetId::FOCUS,
                    index: GridIndex::new(1, 0)
                },
            ]
        );
    }

    #[test]
    fn test_clock() {
        let (system, _focus) = focused_system(0.0, 0.0);
        system.update(0.5);
        system.update(0.25);
        system.tick();
        assert_eq!(system.ticks(), 3);
        assert_eq!(system.elapsed(), 0.75);
    }

    #[test]
    fn test_collaborators() {
        let (system, _focus) = focused_system(0.0, 0.0);
        assert!(system.handler().is_none());
        assert!(system.loader().is_none());
        assert!(system.saver().is_none());

        let first: Arc<dyn ChunkHandler<String>> = Arc::new(HandlerLog::default());
        let second: Arc<dyn ChunkHandler<String>> = Arc::new(HandlerLog::default());
        assert!(system.set_handler(first.clone()).is_none());
        let replaced = system.set_handler(second.clone()).unwrap();
        assert!(Arc::ptr_eq(&replaced, &first));
        assert!(Arc::ptr_eq(&system.handler().unwrap(), &second));

        assert!(system.set_loader(Arc::new(NoLoader)).is_none());
        assert!(system.set_saver(Arc::new(NoSaver)).is_none());
        let loader = system.loader().unwrap();
        assert_eq!(loader.load(GridIndex::ORIGIN).unwrap(), None);
        let saver = system.saver().unwrap();
        assert!(saver.save(GridIndex::ORIGIN, &"x".to_string()).is_ok());
    }

    #[test]
    fn test_bound_targets() {
        let (system, _focus) = focused_system(0.0, 0.0);
        let log = Arc::new(EventLog::default());
        let listener: Arc<dyn ChunkSystemListener> = log.clone();
        system.add_listener(&listener);

        let npc = Arc::new(PositionTarget::new(-5.0, 25.0));
        let id = system.bind_target(&as_target(&npc));
        assert!(system.is_target_bound(id));
        assert_eq!(system.bound_target_count(), 1);

        system.tick();
        assert_eq!(system.target_index(id), Some(GridIndex::new(-1, 2)));
        let events = log.take();
        assert!(events.contains(&ChunkSystemEvent::TargetEntered {
            target: id,
            index: GridIndex::new(-1, 2)
        }));

        assert!(system.unbind_target(id));
        npc.set_position(100.0, 100.0);
        system.tick();
        assert!(log.take().is_empty());
        assert_eq!(system.target_index(id), None);
    }

    #[test]
    fn test_switching_focus_reports_fresh_entry() {
        let (system, _first) = focused_system(5.0, 5.0);
        let handler = Arc::new(HandlerLog::default());
        system.set_handler(handler.clone());
        system.tick();

        let second = Arc::new(PositionTarget::new(55.0, 55.0));
        let config = ChunkConfiguration::new(10.0, 10.0).with_focus(second);
        system.set_configuration(config).unwrap();
        system.tick();

        assert_eq!(
            *handler.calls.lock().unwrap(),
            vec![("enter", GridIndex::new(0, 0)), ("enter", GridIndex::new(5, 5))]
        );
    }

    #[test]
    fn test_oversized_radius_is_rejected() {
        let (system, focus) = focused_system(5.0, 5.0);
        let config = ChunkConfiguration::new(10.0, 10.0)
            .with_radius(100_000)
            .with_focus(focus);

        assert!(matches!(
            system.set_configuration(config),
            Err(ChunkError::InvalidRadius { radius: 100_000, .. })
        ));
        assert_eq!(system.visible_indices().len(), 9);
    }

    #[test]
    fn test_visible_indices() {
        let focus = Arc::new(PositionTarget::new(-5.0, 5.0));
        let config = ChunkConfiguration::new(10.0, 10.0)
            .with_radius(2)
            .with_focus(focus);
        let system: ChunkSystem<String> = ChunkSystem::new(config).unwrap();

        let visible = system.visible_indices();
        assert_eq!(visible.len(), 25);
        assert!(visible.contains(&GridIndex::new(-1, 0)));
        assert!(visible.contains(&GridIndex::new(-3, -2)));
        assert!(visible.contains(&GridIndex::new(1, 2)));
        assert!(!visible.contains(&GridIndex::new(2, 0)));
    }
}
