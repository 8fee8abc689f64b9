//! Asset loading.

use std::collections::HashMap;

use decor_core::{Aabb, AssetRef, DecorError, Result, Vec3};

/// Content produced by a successful load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadedAsset {
    /// Local-space bounds of the loaded model.
    pub bounds: Aabb,
}

/// Loads the content behind an [`AssetRef`].
///
/// Called on a load worker, never on the frame loop, so implementations may
/// block on disk or network.
pub trait AssetLoader: Send + Sync {
    /// Loads `asset`, returning [`DecorError::LoadFailure`] if it cannot.
    fn load(&self, asset: &AssetRef) -> Result<LoadedAsset>;
}

/// A loader backed by a fixed catalog of known models and their sizes.
#[derive(Debug, Clone, Default)]
pub struct CatalogLoader {
    models: HashMap<AssetRef, Aabb>,
}

impl CatalogLoader {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a model whose footprint is `size` (width, height, depth), resting
    /// on its local origin.
    #[must_use]
    pub fn with_model(mut self, asset: impl Into<AssetRef>, size: Vec3) -> Self {
        let half = size * 0.5;
        let bounds = Aabb::new(Vec3::new(-half.x, 0.0, -half.z), Vec3::new(half.x, size.y, half.z));
        self.models.insert(asset.into(), bounds);
        self
    }

    /// The furniture set of the home decor demo.
    pub fn furniture() -> Self {
        Self::new()
            .with_model("chair", Vec3::new(0.5, 0.9, 0.5))
            .with_model("table", Vec3::new(1.2, 0.75, 0.8))
            .with_model("lamp", Vec3::new(0.3, 1.6, 0.3))
            .with_model("vase", Vec3::new(0.2, 0.35, 0.2))
            .with_model("cup", Vec3::new(0.08, 0.1, 0.08))
    }

    /// Returns whether the catalog knows `asset`.
    pub fn contains(&self, asset: &AssetRef) -> bool {
        self.models.contains_key(asset)
    }
}

impl AssetLoader for CatalogLoader {
    fn load(&self, asset: &AssetRef) -> Result<LoadedAsset> {
        self.models
            .get(asset)
            .map(|&bounds| LoadedAsset { bounds })
            .ok_or_else(|| DecorError::load_failure(asset.as_str(), "not in catalog"))
    }
}
