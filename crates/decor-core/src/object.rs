//! Virtual objects placed into the scene.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::bounds::Aabb;
use crate::transform::Transform;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a virtual object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocates a fresh identifier.
    pub fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reference to the asset a virtual object is built from (e.g. `"chair"` or a model path).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRef(String);

impl AssetRef {
    /// Creates an asset reference.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the asset name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for AssetRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Load progress of a virtual object.
///
/// Moves forward only: `Unloaded -> Loading -> Loaded | Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Created, load not yet started.
    #[default]
    Unloaded,
    /// Load in flight on a background worker.
    Loading,
    /// Content is ready and attached to the scene.
    Loaded,
    /// Load failed with the given reason.
    Failed(String),
}

/// A piece of virtual furniture.
#[derive(Debug, Clone)]
pub struct VirtualObject {
    id: ObjectId,
    asset: AssetRef,
    load_state: LoadState,
    transform: Transform,
    /// Local-space bounds, known once loaded.
    bounds: Option<Aabb>,
    visible: bool,
}

impl VirtualObject {
    /// Creates an unloaded object for `asset` at the origin.
    pub fn new(asset: impl Into<AssetRef>) -> Self {
        Self {
            id: ObjectId::next(),
            asset: asset.into(),
            load_state: LoadState::Unloaded,
            transform: Transform::identity(),
            bounds: None,
            visible: true,
        }
    }

    /// Sets the placement transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Returns the identifier.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns the asset reference.
    pub fn asset(&self) -> &AssetRef {
        &self.asset
    }

    /// Returns the load state.
    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    /// Returns true while the load is in flight.
    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    /// Returns true once the content is ready.
    pub fn is_loaded(&self) -> bool {
        self.load_state == LoadState::Loaded
    }

    /// Returns the placement transform.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Sets the placement transform.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Returns the local-space bounds, if loaded.
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Returns the world-space bounds, if loaded.
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.bounds
            .map(|b| b.transformed(&self.transform.to_matrix()))
    }

    /// Returns whether this object is visible.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Sets the visibility of this object.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Returns an unloaded copy with a fresh id, keeping asset, transform and visibility.
    #[must_use]
    pub fn respawn(&self) -> Self {
        Self {
            transform: self.transform,
            visible: self.visible,
            ..Self::new(self.asset.clone())
        }
    }

    /// Marks the load as started. Only valid from `Unloaded`.
    pub fn begin_loading(&mut self) -> bool {
        self.advance(LoadState::Unloaded, LoadState::Loading)
    }

    /// Marks the load as finished with the loaded content bounds.
    pub fn finish_loading(&mut self, bounds: Aabb) -> bool {
        let advanced = self.advance(LoadState::Loading, LoadState::Loaded);
        if advanced {
            self.bounds = Some(bounds);
        }
        advanced
    }

    /// Marks the load as failed.
    pub fn fail_loading(&mut self, reason: impl Into<String>) -> bool {
        self.advance(LoadState::Loading, LoadState::Failed(reason.into()))
    }

    fn advance(&mut self, expected: LoadState, next: LoadState) -> bool {
        if self.load_state != expected {
            log::warn!(
                "object {} ({}): ignoring load transition {:?} -> {:?}",
                self.id,
                self.asset,
                self.load_state,
                next
            );
            return false;
        }
        self.load_state = next;
        true
    }
}
