//! The placement engine.
//!
//! Wires the tracking supplier, placement cursor, object store and scene
//! mutation queue together and owns the session lifecycle.

use std::sync::Arc;

use decor_core::{
    AssetRef, CursorPlacement, CursorState, CursorTransition, DecorError, EngineOptions,
    PlacementCursor, Result, TrackingEstimate, Transform, VirtualObject,
};
use decor_scene::{
    AssetLoader, ObjectHandle, ObjectStore, SceneMutation, SceneMutationQueue, SceneSink,
};

use crate::messaging::{AdvisoryMessenger, MessageCategory};
use crate::session::SessionState;
use crate::supplier::{RunOptions, TrackingSupplier};

/// Places virtual objects on tracked surfaces.
///
/// The platform layer calls [`on_frame`](Self::on_frame) once per tracking
/// frame and the lifecycle methods from its view callbacks. Frame handling
/// never blocks: object loads run on background workers and every scene
/// change goes through one serial queue.
pub struct PlacementEngine {
    options: EngineOptions,
    supplier: Box<dyn TrackingSupplier>,
    messenger: Arc<dyn AdvisoryMessenger>,
    queue: SceneMutationQueue,
    store: ObjectStore,
    cursor: PlacementCursor,
    state: SessionState,
    add_object_enabled: bool,
    selected: Option<ObjectHandle>,
}

impl PlacementEngine {
    /// Builds an engine around its collaborators.
    ///
    /// Fails with [`DecorError::TrackingUnavailable`] if the supplier cannot
    /// track on this device. Nothing is started until [`start`](Self::start).
    pub fn new<S>(
        options: EngineOptions,
        supplier: Box<dyn TrackingSupplier>,
        sink: S,
        loader: Arc<dyn AssetLoader>,
        messenger: Arc<dyn AdvisoryMessenger>,
    ) -> Result<Self>
    where
        S: SceneSink + 'static,
    {
        if !supplier.is_supported() {
            log::error!("world tracking is not supported, placement engine unavailable");
            return Err(DecorError::TrackingUnavailable);
        }

        let queue = SceneMutationQueue::new(sink)?;
        let store = ObjectStore::new(queue.clone(), loader, options.load_workers)?;
        log::info!(
            "placement engine ready ({} load workers)",
            options.load_workers.max(1)
        );

        Ok(Self {
            options,
            supplier,
            messenger,
            queue,
            store,
            cursor: PlacementCursor::new(),
            state: SessionState::NotStarted,
            add_object_enabled: false,
            selected: None,
        })
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Starts tracking for the first time.
    pub fn start(&mut self) -> Result<()> {
        self.state = self.state.start()?;
        log::info!("session started");
        self.run_fresh();
        Ok(())
    }

    /// Pauses tracking. Frames are ignored until [`resume`](Self::resume).
    pub fn pause(&mut self) -> Result<()> {
        self.state = self.state.pause()?;
        self.supplier.pause();
        log::info!("session paused");
        Ok(())
    }

    /// Resumes a paused session, keeping placed objects and the world map.
    pub fn resume(&mut self) -> Result<()> {
        self.state = self.state.resume()?;
        self.supplier
            .run(&RunOptions::resume(self.options.plane_detection));
        log::info!("session resumed");
        Ok(())
    }

    /// Clears every object and restarts tracking from scratch.
    pub fn restart(&mut self) -> Result<()> {
        self.state = self.state.restart()?;
        log::info!("restarting session");

        self.selected = None;
        let removed = self.store.remove_all();
        self.cursor.reset();
        self.set_add_object_enabled(false);
        self.submit(SceneMutation::PlaceCursor(CursorPlacement::Hidden));
        self.messenger
            .cancel_scheduled_message(MessageCategory::FocusHint);
        self.run_fresh();

        self.state = SessionState::Running;
        log::info!("session restarted, {removed} objects cleared");
        Ok(())
    }

    fn run_fresh(&mut self) {
        self.supplier
            .run(&RunOptions::fresh(self.options.plane_detection));
        self.messenger.schedule_message(
            &self.options.plane_estimation_message,
            self.options.plane_estimation_delay(),
            MessageCategory::PlaneEstimation,
        );
    }

    // ========================================================================
    // Frames
    // ========================================================================

    /// Processes one tracking frame.
    ///
    /// Visibility of placed objects is tested against the frame camera's
    /// frustum. Ignored unless the session is running.
    pub fn on_frame(&mut self, estimate: &TrackingEstimate) -> &CursorState {
        if self.state.is_running() {
            let visible = self.store.is_object_visible(&estimate.camera.frustum());
            self.update_cursor(estimate, visible);
        } else {
            log::trace!("frame ignored, session is {}", self.state);
        }
        self.cursor.state()
    }

    /// Feeds the cursor with an explicit visibility flag and applies the side effects.
    ///
    /// Returns `None` if the session is not running.
    pub fn update_cursor(
        &mut self,
        estimate: &TrackingEstimate,
        any_object_visible: bool,
    ) -> Option<CursorTransition> {
        if !self.state.is_running() {
            return None;
        }

        let transition = self.cursor.update(estimate, any_object_visible);
        self.submit(SceneMutation::PlaceCursor(self.cursor.placement()));

        if transition.entered_detecting() {
            self.set_add_object_enabled(true);
            self.messenger
                .cancel_scheduled_message(MessageCategory::FocusHint);
            self.messenger
                .cancel_scheduled_message(MessageCategory::PlaneEstimation);
        } else if transition.left_detecting() {
            self.set_add_object_enabled(false);
            self.messenger.schedule_message(
                &self.options.focus_hint_message,
                self.options.focus_hint_delay(),
                MessageCategory::FocusHint,
            );
        }
        Some(transition)
    }

    fn set_add_object_enabled(&mut self, enabled: bool) {
        if self.add_object_enabled != enabled {
            log::debug!("add object {}", if enabled { "enabled" } else { "disabled" });
        }
        self.add_object_enabled = enabled;
    }

    fn submit(&self, mutation: SceneMutation) {
        if let Err(err) = self.queue.submit(mutation) {
            log::warn!("scene update dropped: {err}");
        }
    }

    // ========================================================================
    // Objects
    // ========================================================================

    /// Places `asset` where the cursor currently sits on a surface.
    ///
    /// Fails with [`DecorError::NoPlacementSurface`] unless the cursor is detecting.
    pub fn place_at_cursor<F>(&mut self, asset: impl Into<AssetRef>, on_loaded: F) -> Result<ObjectHandle>
    where
        F: FnOnce(Result<VirtualObject>) + Send + 'static,
    {
        let Some(hit) = self.cursor.state().hit() else {
            return Err(DecorError::NoPlacementSurface);
        };
        let transform = Transform::on_surface(hit.position, hit.normal);
        let object = VirtualObject::new(asset).with_transform(transform);
        Ok(self.place(object, on_loaded))
    }

    /// Places `object` at its own transform.
    pub fn place<F>(&mut self, object: VirtualObject, on_loaded: F) -> ObjectHandle
    where
        F: FnOnce(Result<VirtualObject>) + Send + 'static,
    {
        self.store.place(object, on_loaded)
    }

    /// Removes one object. Returns false if it was already gone.
    pub fn remove(&mut self, handle: ObjectHandle) -> bool {
        if self.selected == Some(handle) {
            self.selected = None;
        }
        self.store.remove(handle)
    }

    /// Removes every object and returns how many were removed.
    pub fn remove_all(&mut self) -> usize {
        self.selected = None;
        self.store.remove_all()
    }

    /// Moves an object. Returns false if it is not placed.
    pub fn set_transform(&mut self, handle: ObjectHandle, transform: Transform) -> bool {
        self.store.set_transform(handle, transform)
    }

    /// Marks `handle` as the object under manipulation. Returns false if it is not placed.
    pub fn select(&mut self, handle: ObjectHandle) -> bool {
        if self.store.contains(handle) {
            self.selected = Some(handle);
            true
        } else {
            false
        }
    }

    /// Clears the selection.
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Returns the object under manipulation, if it is still placed.
    pub fn selected(&self) -> Option<ObjectHandle> {
        self.selected.filter(|&handle| self.store.contains(handle))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the cursor state.
    pub fn cursor_state(&self) -> &CursorState {
        self.cursor.state()
    }

    /// Returns whether the "add object" affordance should be offered.
    pub fn can_add_object(&self) -> bool {
        self.add_object_enabled
    }

    /// Returns true while any object is loading.
    pub fn is_loading(&self) -> bool {
        self.store.is_loading()
    }

    /// Returns the object store.
    pub fn objects(&self) -> &ObjectStore {
        &self.store
    }

    /// Returns the options the engine was built with.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Blocks until every scene change requested so far has been applied.
    pub fn flush(&self) -> Result<()> {
        self.queue.flush()
    }

    /// Finishes in-flight loads, applies pending scene changes, then stops
    /// the load workers and the scene worker.
    pub fn shutdown(&mut self) {
        self.store.shutdown();
        self.queue.shutdown();
    }
}
