//! decor-rs: a placement engine for AR furniture demos.
//!
//! The engine turns per-frame tracking estimates into a placement cursor,
//! keeps the set of placed virtual objects, and funnels every scene change
//! through one serial queue so cursor updates and object loads never race.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use decor::*;
//!
//! struct Device;
//!
//! impl TrackingSupplier for Device {
//!     fn is_supported(&self) -> bool { true }
//!     fn run(&mut self, _options: &RunOptions) {}
//!     fn pause(&mut self) {}
//! }
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let scene = SharedScene::new();
//!     let mut engine = PlacementEngine::new(
//!         EngineOptions::default(),
//!         Box::new(Device),
//!         scene.clone(),
//!         Arc::new(CatalogLoader::furniture()),
//!         Arc::new(MessageBoard::new()),
//!     )?;
//!     engine.start()?;
//!
//!     let hit = SurfaceHit::horizontal(Vec3::new(0.0, -1.0, -2.0), 2.2);
//!     engine.on_frame(&TrackingEstimate::detecting(CameraPose::default(), hit));
//!     engine.place_at_cursor("chair", |outcome| {
//!         if let Err(err) = outcome {
//!             eprintln!("{err}");
//!         }
//!     })?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`decor_core`] holds the platform-independent types: tracking snapshots,
//!   camera and frustum math, the cursor state machine, virtual objects.
//! - [`decor_scene`] holds the scene side: the sink trait, the serial mutation
//!   queue, load workers and the [`ObjectStore`].
//! - This crate wires them into the [`PlacementEngine`] and adds the session
//!   lifecycle, advisory messages and the local account gate.

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod accounts;
pub mod engine;
pub mod messaging;
pub mod session;
pub mod supplier;

pub use decor_core::{
    Aabb, AssetRef, CameraPose, CursorKind, CursorPlacement, CursorState, CursorTransition,
    DecorError, EngineOptions, Frustum, LimitedReason, LoadState, Mat4, ObjectId,
    PlacementCursor, PlaneDetection, Quat, Result, SurfaceHit, SurfaceKind, TrackingEstimate,
    TrackingQuality, Transform, Vec3, VirtualObject,
};
pub use decor_scene::{
    AssetLoader, CatalogLoader, LoadedAsset, NodeId, ObjectHandle, ObjectStore, SceneGraph,
    SceneMutation, SceneMutationQueue, SceneNode, SceneSink, SharedScene,
};

pub use accounts::{Accounts, MemorySessionStore, SessionStore};
pub use engine::PlacementEngine;
pub use messaging::{AdvisoryMessenger, MessageBoard, MessageCategory, PendingMessage};
pub use session::SessionState;
pub use supplier::{RunOptions, TrackingSupplier};

/// Installs the `env_logger` backend for the `log` facade.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    if env_logger::try_init().is_ok() {
        log::debug!("logging initialized");
    }
}
