//! Ordered store of placed virtual objects.
//!
//! Objects enter the store synchronously when placed and load in the
//! background. The store never touches the scene directly: attach, detach and
//! transform changes are submitted to the [`SceneMutationQueue`].

use std::sync::Arc;

use decor_core::{DecorError, Frustum, LoadState, ObjectId, Result, Transform, VirtualObject};
use parking_lot::Mutex;

use crate::loader::AssetLoader;
use crate::pool::{Job, LoadPool};
use crate::queue::SceneMutationQueue;
use crate::sink::{SceneMutation, SceneNode};

type Objects = Arc<Mutex<Vec<VirtualObject>>>;

/// Handle to a placed object. Stays valid (and harmless) after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(ObjectId);

impl ObjectHandle {
    /// Returns the id of the object this handle refers to.
    pub fn id(self) -> ObjectId {
        self.0
    }
}

/// Owns the placed objects in placement order.
pub struct ObjectStore {
    objects: Objects,
    queue: SceneMutationQueue,
    loader: Arc<dyn AssetLoader>,
    pool: LoadPool,
}

impl ObjectStore {
    /// Creates a store loading through `loader` on `load_workers` background workers.
    pub fn new(
        queue: SceneMutationQueue,
        loader: Arc<dyn AssetLoader>,
        load_workers: usize,
    ) -> Result<Self> {
        Ok(Self {
            objects: Arc::new(Mutex::new(Vec::new())),
            queue,
            loader,
            pool: LoadPool::new(load_workers)?,
        })
    }

    /// Appends `object` and starts loading it in the background.
    ///
    /// The object is in the store, in the `Loading` state, as soon as this
    /// returns. When the load finishes the stored state is updated, the scene
    /// attach is queued, and `on_loaded` runs exactly once on the load worker.
    /// If the object is removed before its load finishes, the completion is
    /// discarded: nothing is attached and `on_loaded` is not called.
    ///
    /// An object that has already been placed (a snapshot from [`get`](Self::get),
    /// say, or a failed object being retried) is placed as a fresh copy with a
    /// new id, so the returned handle may differ from `object.id()`.
    pub fn place<F>(&self, object: VirtualObject, on_loaded: F) -> ObjectHandle
    where
        F: FnOnce(Result<VirtualObject>) + Send + 'static,
    {
        let job = {
            let mut objects = self.objects.lock();
            let placed_before = object.load_state() != &LoadState::Unloaded
                || objects.iter().any(|o| o.id() == object.id());
            let mut object = if placed_before {
                log::debug!("object {} was placed before, placing a fresh copy", object.id());
                object.respawn()
            } else {
                object
            };
            object.begin_loading();
            log::info!("placing object {} ({})", object.id(), object.asset());

            let job = LoadJob {
                id: object.id(),
                asset: object.asset().clone(),
                objects: Arc::clone(&self.objects),
                queue: self.queue.clone(),
                loader: Arc::clone(&self.loader),
            };
            objects.push(object);
            job
        };
        let handle = ObjectHandle(job.id);

        let task: Job = Box::new(move || job.run(on_loaded));
        if let Err(task) = self.pool.execute(task) {
            log::warn!("load workers unavailable, loading object {} inline", handle.0);
            task();
        }
        handle
    }

    /// Removes the object behind `handle` from the store and the scene.
    ///
    /// Returns false, and does nothing else, if it is no longer stored.
    pub fn remove(&self, handle: ObjectHandle) -> bool {
        let removed = {
            let mut objects = self.objects.lock();
            objects
                .iter()
                .position(|o| o.id() == handle.0)
                .map(|index| objects.remove(index))
        };
        match removed {
            Some(object) => {
                self.detach(&object);
                true
            }
            None => {
                log::trace!("object {} already removed", handle.0);
                false
            }
        }
    }

    /// Removes the object at `index`; later objects shift down by one.
    ///
    /// Out-of-range indices are ignored.
    pub fn remove_at(&self, index: usize) -> Option<VirtualObject> {
        let removed = {
            let mut objects = self.objects.lock();
            (index < objects.len()).then(|| objects.remove(index))
        };
        if let Some(object) = &removed {
            self.detach(object);
        }
        removed
    }

    /// Removes every object, newest first, and returns how many were removed.
    ///
    /// Walking the indices backwards means each removal only shifts elements
    /// that have already been visited.
    pub fn remove_all(&self) -> usize {
        let count = self.len();
        let removed = (0..count)
            .rev()
            .filter(|&index| self.remove_at(index).is_some())
            .count();
        log::info!("removed {removed} objects");
        removed
    }

    /// Moves the object behind `handle`. Returns false if it is not stored.
    pub fn set_transform(&self, handle: ObjectHandle, transform: Transform) -> bool {
        let attached = {
            let mut objects = self.objects.lock();
            let Some(object) = objects.iter_mut().find(|o| o.id() == handle.0) else {
                return false;
            };
            object.set_transform(transform);
            object.is_loaded()
        };
        // Objects still loading pick the new transform up when they attach
        if attached {
            let mutation = SceneMutation::SetTransform(handle.0.into(), transform.to_matrix());
            if let Err(err) = self.queue.submit(mutation) {
                log::warn!("cannot move object {}: {err}", handle.0);
            }
        }
        true
    }

    /// Shows or hides the object behind `handle`. Returns false if it is not stored.
    pub fn set_visible(&self, handle: ObjectHandle, visible: bool) -> bool {
        let mut objects = self.objects.lock();
        match objects.iter_mut().find(|o| o.id() == handle.0) {
            Some(object) => {
                object.set_visible(visible);
                true
            }
            None => false,
        }
    }

    /// Returns true if any loaded, visible object overlaps `frustum`.
    pub fn is_object_visible(&self, frustum: &Frustum) -> bool {
        self.objects.lock().iter().any(|object| {
            object.is_loaded()
                && object.is_visible()
                && object
                    .world_bounds()
                    .is_some_and(|b| frustum.intersects_aabb(b.min, b.max))
        })
    }

    /// Returns true while at least one object is loading.
    pub fn is_loading(&self) -> bool {
        self.objects.lock().iter().any(VirtualObject::is_loading)
    }

    /// Returns the number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    /// Returns true if no objects are stored.
    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }

    /// Returns whether the object behind `handle` is stored.
    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.index_of(handle).is_some()
    }

    /// Returns the position of the object behind `handle`.
    pub fn index_of(&self, handle: ObjectHandle) -> Option<usize> {
        self.objects.lock().iter().position(|o| o.id() == handle.0)
    }

    /// Returns a snapshot of the object behind `handle`.
    pub fn get(&self, handle: ObjectHandle) -> Option<VirtualObject> {
        self.objects
            .lock()
            .iter()
            .find(|o| o.id() == handle.0)
            .cloned()
    }

    /// Returns a snapshot of all objects in placement order.
    pub fn objects(&self) -> Vec<VirtualObject> {
        self.objects.lock().clone()
    }

    /// Returns handles to all objects in placement order.
    pub fn handles(&self) -> Vec<ObjectHandle> {
        self.objects
            .lock()
            .iter()
            .map(|o| ObjectHandle(o.id()))
            .collect()
    }

    /// Blocks until every scene mutation queued so far has been applied.
    pub fn flush(&self) -> Result<()> {
        self.queue.flush()
    }

    /// Finishes in-flight loads and stops the load workers.
    ///
    /// Objects placed afterwards load inline on the calling thread.
    pub fn shutdown(&mut self) {
        self.pool.shutdown();
    }

    fn detach(&self, object: &VirtualObject) {
        log::info!("removing object {} ({})", object.id(), object.asset());
        // A still-loading object has no node yet; its pending attach checks membership
        if !object.is_loaded() {
            return;
        }
        if let Err(err) = self.queue.submit(SceneMutation::RemoveNode(object.id().into())) {
            log::warn!("cannot detach object {}: {err}", object.id());
        }
    }
}

/// Everything a load worker needs to finish one placement.
struct LoadJob {
    id: ObjectId,
    asset: decor_core::AssetRef,
    objects: Objects,
    queue: SceneMutationQueue,
    loader: Arc<dyn AssetLoader>,
}

impl LoadJob {
    fn run<F>(self, on_loaded: F)
    where
        F: FnOnce(Result<VirtualObject>),
    {
        let result = self.loader.load(&self.asset);

        let outcome = {
            let mut objects = self.objects.lock();
            let Some(object) = objects.iter_mut().find(|o| o.id() == self.id) else {
                log::debug!(
                    "object {} was removed while loading {}, discarding",
                    self.id,
                    self.asset
                );
                return;
            };
            match result {
                Ok(loaded) if object.finish_loading(loaded.bounds) => Ok(object.clone()),
                Ok(_) => Err(DecorError::load_failure(
                    self.asset.as_str(),
                    format!("object {} was not loading", self.id),
                )),
                Err(err) => {
                    object.fail_loading(err.to_string());
                    Err(err)
                }
            }
        };

        match &outcome {
            Ok(_) => self.attach(),
            Err(err) => log::warn!("object {}: {err}", self.id),
        }
        on_loaded(outcome);
    }

    fn attach(&self) {
        let objects = Arc::clone(&self.objects);
        let id = self.id;
        let submitted = self.queue.submit_task(move |sink| {
            // Built when applied so transform changes queued ahead of the attach are kept
            let node = objects
                .lock()
                .iter()
                .find(|o| o.id() == id && o.is_loaded())
                .map(SceneNode::for_object);
            match node {
                Some(node) => sink.add_node(node),
                None => log::debug!("object {id} removed before attach, skipping"),
            }
        });
        if let Err(err) = submitted {
            log::warn!("cannot attach object {id}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crossbeam::channel::{unbounded, Receiver, Sender};
    use decor_core::{AssetRef, CameraPose, DecorError, LoadState, Quat, Vec3};

    use super::*;
    use crate::loader::{CatalogLoader, LoadedAsset};
    use crate::sink::{NodeId, SharedScene};

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// A loader whose loads finish only when the test releases them.
    struct GatedLoader {
        gate: Receiver<Result<LoadedAsset>>,
    }

    impl AssetLoader for GatedLoader {
        fn load(&self, asset: &AssetRef) -> Result<LoadedAsset> {
            self.gate
                .recv()
                .unwrap_or_else(|_| Err(DecorError::load_failure(asset.as_str(), "gate closed")))
        }
    }

    fn unit_cube() -> LoadedAsset {
        LoadedAsset {
            bounds: decor_core::Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5)),
        }
    }

    fn gated_store() -> (ObjectStore, SharedScene, Sender<Result<LoadedAsset>>) {
        let (release, gate) = unbounded();
        let scene = SharedScene::new();
        let queue = SceneMutationQueue::new(scene.clone()).unwrap();
        let store = ObjectStore::new(queue, Arc::new(GatedLoader { gate }), 1).unwrap();
        (store, scene, release)
    }

    fn catalog_store() -> (ObjectStore, SharedScene) {
        let scene = SharedScene::new();
        let queue = SceneMutationQueue::new(scene.clone()).unwrap();
        let store = ObjectStore::new(queue, Arc::new(CatalogLoader::furniture()), 2).unwrap();
        (store, scene)
    }

    /// Stalls the scene queue until the returned sender fires or is dropped.
    fn block_queue(queue: &SceneMutationQueue) -> Sender<()> {
        let (unblock, blocked) = unbounded::<()>();
        queue
            .submit_task(move |_| {
                let _ = blocked.recv();
            })
            .unwrap();
        unblock
    }

    /// Places `count` chairs and waits for all of them to load.
    fn place_loaded(store: &ObjectStore, count: usize) -> Vec<ObjectHandle> {
        let (done, loaded) = unbounded();
        let handles: Vec<ObjectHandle> = (0..count)
            .map(|i| {
                let done = done.clone();
                let object = VirtualObject::new("chair")
                    .with_transform(Transform::from_translation(Vec3::new(i as f32, 0.0, -3.0)));
                store.place(object, move |outcome| done.send(outcome.is_ok()).unwrap())
            })
            .collect();
        for _ in 0..count {
            assert!(loaded.recv_timeout(TIMEOUT).unwrap());
        }
        store.flush().unwrap();
        handles
    }

    #[test]
    fn test_place_is_visible_before_load_completes() {
        let (store, scene, release) = gated_store();
        let fired = Arc::new(AtomicUsize::new(0));
        let (done, outcomes) = unbounded();

        let counter = Arc::clone(&fired);
        let handle = store.place(VirtualObject::new("lamp"), move |outcome| {
            counter.fetch_add(1, Ordering::SeqCst);
            done.send(outcome).unwrap();
        });

        // Appended synchronously, still loading
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(handle).unwrap().load_state(), &LoadState::Loading);
        assert!(store.is_loading());

        release.send(Ok(unit_cube())).unwrap();
        let outcome = outcomes.recv_timeout(TIMEOUT).unwrap();
        assert!(outcome.unwrap().is_loaded());
        store.flush().unwrap();

        assert_eq!(store.get(handle).unwrap().load_state(), &LoadState::Loaded);
        assert!(!store.is_loading());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scene.read(|s| s.times_added(handle.id().into())), 1);
    }

    #[test]
    fn test_failed_load_is_reported_once_and_not_attached() {
        let (store, scene, release) = gated_store();
        let fired = Arc::new(AtomicUsize::new(0));
        let (done, outcomes) = unbounded();

        let counter = Arc::clone(&fired);
        let handle = store.place(VirtualObject::new("sofa"), move |outcome| {
            counter.fetch_add(1, Ordering::SeqCst);
            done.send(outcome).unwrap();
        });

        release
            .send(Err(DecorError::load_failure("sofa", "corrupt model")))
            .unwrap();
        let outcome = outcomes.recv_timeout(TIMEOUT).unwrap();
        assert!(matches!(outcome, Err(DecorError::LoadFailure { .. })));
        store.flush().unwrap();

        assert!(matches!(
            store.get(handle).unwrap().load_state(),
            LoadState::Failed(reason) if reason.contains("corrupt model")
        ));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(scene.read(|s| s.is_empty()));
        // Failed objects stay in the store until the user removes them
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_while_loading_prevents_attach() {
        let (store, scene, release) = gated_store();
        let first_fired = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&first_fired);
        let first = store.place(VirtualObject::new("table"), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(store.remove(first));
        assert!(store.is_empty());

        // A single worker runs loads in order, so the second completing means the first has too
        let (done, outcomes) = unbounded();
        let second = store.place(VirtualObject::new("chair"), move |outcome| {
            done.send(outcome.is_ok()).unwrap();
        });
        release.send(Ok(unit_cube())).unwrap();
        release.send(Ok(unit_cube())).unwrap();
        assert!(outcomes.recv_timeout(TIMEOUT).unwrap());
        store.flush().unwrap();

        assert_eq!(first_fired.load(Ordering::SeqCst), 0);
        assert_eq!(scene.read(|s| s.times_added(first.id().into())), 0);
        assert_eq!(scene.read(|s| s.times_added(second.id().into())), 1);
        assert_eq!(store.handles(), vec![second]);
    }

    #[test]
    fn test_remove_absent_handle_is_noop() {
        let (store, _scene) = catalog_store();
        let handles = place_loaded(&store, 2);

        assert!(store.remove(handles[0]));
        assert!(!store.remove(handles[0]));
        assert_eq!(store.handles(), vec![handles[1]]);
    }

    #[test]
    fn test_remove_at_shifts_later_objects() {
        let (store, scene) = catalog_store();
        let handles = place_loaded(&store, 3);

        let removed = store.remove_at(0).unwrap();
        assert_eq!(removed.id(), handles[0].id());
        assert_eq!(store.handles(), vec![handles[1], handles[2]]);
        assert_eq!(store.index_of(handles[2]), Some(1));
        assert!(store.remove_at(5).is_none());

        store.flush().unwrap();
        let ids: Vec<NodeId> = scene.read(|s| s.iter().map(|n| n.id).collect());
        assert_eq!(ids, vec![handles[1].id().into(), handles[2].id().into()]);
    }

    #[test]
    fn test_remove_all_removes_exactly_n() {
        for n in [0, 1, 5] {
            let (store, scene) = catalog_store();
            place_loaded(&store, n);
            assert_eq!(store.len(), n);

            assert_eq!(store.remove_all(), n);
            assert!(store.is_empty());
            store.flush().unwrap();
            assert!(scene.read(|s| s.is_empty()));
        }
    }

    #[test]
    fn test_remove_all_with_pending_loads() {
        let (store, scene, release) = gated_store();
        for _ in 0..3 {
            store.place(VirtualObject::new("vase"), |_| {});
        }
        assert_eq!(store.remove_all(), 3);
        assert!(!store.is_loading());

        for _ in 0..3 {
            release.send(Ok(unit_cube())).unwrap();
        }
        // Wait for the worker to drain the three discarded loads
        let (done, finished) = unbounded();
        store.place(VirtualObject::new("cup"), move |_| done.send(()).unwrap());
        release.send(Ok(unit_cube())).unwrap();
        finished.recv_timeout(TIMEOUT).unwrap();
        store.flush().unwrap();

        assert_eq!(scene.read(|s| s.len()), 1);
    }

    #[test]
    fn test_set_transform_moves_attached_node() {
        let (store, scene) = catalog_store();
        let handle = place_loaded(&store, 1)[0];

        let moved = Transform {
            translation: Vec3::new(1.0, 0.0, -2.0),
            rotation: Quat::from_rotation_y(0.3),
            scale: Vec3::ONE,
        };
        assert!(store.set_transform(handle, moved));
        store.flush().unwrap();

        let node_transform = scene.read(|s| s.get(handle.id().into()).unwrap().transform);
        assert_eq!(node_transform, moved.to_matrix());
        assert_eq!(store.get(handle).unwrap().transform(), &moved);
    }

    #[test]
    fn test_is_object_visible() {
        let (store, _scene) = catalog_store();
        let looking_ahead = CameraPose::new(1.0).frustum();
        let looking_behind =
            CameraPose::looking_at(1.0, Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), Vec3::Y).frustum();

        assert!(!store.is_object_visible(&looking_ahead));

        let handle = place_loaded(&store, 1)[0];
        assert!(store.is_object_visible(&looking_ahead));
        assert!(!store.is_object_visible(&looking_behind));

        store.set_visible(handle, false);
        assert!(!store.is_object_visible(&looking_ahead));
    }

    #[test]
    fn test_loading_objects_are_not_visible() {
        let (store, _scene, release) = gated_store();
        store.place(
            VirtualObject::new("chair")
                .with_transform(Transform::from_translation(Vec3::new(0.0, 0.0, -2.0))),
            |_| {},
        );
        assert!(!store.is_object_visible(&CameraPose::new(1.0).frustum()));

        // Unblock the worker so the pool can shut down
        drop(release);
    }

    #[test]
    fn test_replacing_failed_object_places_fresh_copy() {
        let (store, scene, release) = gated_store();
        let (done, outcomes) = unbounded();

        let sent = done.clone();
        let failed = store.place(VirtualObject::new("sofa"), move |outcome| {
            sent.send(outcome).unwrap();
        });
        release
            .send(Err(DecorError::load_failure("sofa", "corrupt model")))
            .unwrap();
        assert!(outcomes.recv_timeout(TIMEOUT).unwrap().is_err());

        // Retry from the stored snapshot
        let snapshot = store.get(failed).unwrap();
        let retried = store.place(snapshot, move |outcome| done.send(outcome).unwrap());
        assert_ne!(retried, failed);

        release.send(Ok(unit_cube())).unwrap();
        let outcome = outcomes.recv_timeout(TIMEOUT).unwrap().unwrap();
        assert_eq!(outcome.id(), retried.id());
        assert!(outcome.is_loaded());
        store.flush().unwrap();

        let ids: Vec<ObjectId> = store.objects().iter().map(VirtualObject::id).collect();
        assert_eq!(ids, vec![failed.id(), retried.id()]);
        assert!(matches!(store.get(failed).unwrap().load_state(), LoadState::Failed(_)));
        assert_eq!(store.get(retried).unwrap().load_state(), &LoadState::Loaded);
        assert_eq!(scene.read(|s| s.times_added(retried.id().into())), 1);

        assert!(store.remove(failed));
        assert!(store.remove(retried));
        store.flush().unwrap();
        assert!(store.is_empty());
        assert!(scene.read(|s| s.is_empty()));
    }

    #[test]
    fn test_placing_same_unloaded_object_twice_gets_two_ids() {
        let (store, scene) = catalog_store();
        let (done, outcomes) = unbounded();
        let object = VirtualObject::new("chair");

        let sent = done.clone();
        let first = store.place(object.clone(), move |outcome| sent.send(outcome.is_ok()).unwrap());
        let second = store.place(object, move |outcome| done.send(outcome.is_ok()).unwrap());
        assert_ne!(first, second);

        assert!(outcomes.recv_timeout(TIMEOUT).unwrap());
        assert!(outcomes.recv_timeout(TIMEOUT).unwrap());
        store.flush().unwrap();
        assert_eq!(scene.read(|s| s.len()), 2);
    }

    #[test]
    fn test_attach_uses_transform_set_while_queued() {
        let scene = SharedScene::new();
        let queue = SceneMutationQueue::new(scene.clone()).unwrap();
        let store = ObjectStore::new(queue.clone(), Arc::new(CatalogLoader::furniture()), 1).unwrap();

        let unblock = block_queue(&queue);
        let (done, outcomes) = unbounded();
        let handle = store.place(VirtualObject::new("chair"), move |outcome| {
            done.send(outcome.is_ok()).unwrap();
        });
        // Loaded, attach waiting behind the stalled queue
        assert!(outcomes.recv_timeout(TIMEOUT).unwrap());

        let moved = Transform::from_translation(Vec3::new(2.0, 0.0, -4.0));
        assert!(store.set_transform(handle, moved));
        unblock.send(()).unwrap();
        store.flush().unwrap();

        let attached = scene.read(|s| {
            s.journal().iter().find_map(|m| match m {
                SceneMutation::AddNode(node) if node.id == NodeId::from(handle.id()) => {
                    Some(node.transform)
                }
                _ => None,
            })
        });
        assert_eq!(attached, Some(moved.to_matrix()));
        assert_eq!(
            scene.read(|s| s.get(handle.id().into()).unwrap().transform),
            moved.to_matrix()
        );
    }

    #[test]
    fn test_remove_after_load_before_attach_applies() {
        let scene = SharedScene::new();
        let queue = SceneMutationQueue::new(scene.clone()).unwrap();
        let store = ObjectStore::new(queue.clone(), Arc::new(CatalogLoader::furniture()), 1).unwrap();

        let unblock = block_queue(&queue);
        let (done, outcomes) = unbounded();
        let handle = store.place(VirtualObject::new("table"), move |outcome| {
            done.send(outcome.is_ok()).unwrap();
        });
        assert!(outcomes.recv_timeout(TIMEOUT).unwrap());

        assert!(store.remove(handle));
        unblock.send(()).unwrap();
        store.flush().unwrap();

        assert_eq!(scene.read(|s| s.times_added(handle.id().into())), 0);
        assert!(scene.read(|s| s.is_empty()));
    }

    #[test]
    fn test_place_after_shutdown_loads_inline() {
        let (mut store, scene) = catalog_store();
        store.shutdown();

        let (done, outcomes) = unbounded();
        let handle = store.place(VirtualObject::new("lamp"), move |outcome| {
            done.send(outcome.is_ok()).unwrap();
        });

        // Already finished by the time place returns
        assert_eq!(outcomes.try_recv(), Ok(true));
        assert_eq!(store.get(handle).unwrap().load_state(), &LoadState::Loaded);
        store.flush().unwrap();
        assert_eq!(scene.read(|s| s.times_added(handle.id().into())), 1);
    }
}
