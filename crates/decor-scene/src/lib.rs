//! Scene side of decor-rs.
//!
//! Everything that touches the shared scene graph lives here:
//! - [`SceneSink`] and the in-memory [`SceneGraph`] / [`SharedScene`]
//! - [`SceneMutationQueue`], the single serial writer of the sink
//! - [`LoadPool`], the bounded background load workers
//! - [`ObjectStore`], the ordered set of placed objects

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod loader;
pub mod pool;
pub mod queue;
pub mod sink;
pub mod store;

pub use loader::{AssetLoader, CatalogLoader, LoadedAsset};
pub use pool::{Job, LoadPool};
pub use queue::{SceneMutationQueue, SceneTask};
pub use sink::{NodeId, SceneGraph, SceneMutation, SceneNode, SceneSink, SharedScene};
pub use store::{ObjectHandle, ObjectStore};
