//! Core abstractions for decor-rs.
//!
//! This crate provides the platform-independent types of the placement engine:
//! - [`TrackingEstimate`] snapshots supplied once per tracking frame
//! - [`CameraPose`] and its view [`Frustum`]
//! - [`PlacementCursor`], the state machine for where a new object would land
//! - [`VirtualObject`] and its load state
//! - [`EngineOptions`] configuration and the shared [`DecorError`] type

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Module-qualified names like cursor::CursorState read better at call sites
#![allow(clippy::module_name_repetitions)]

pub mod bounds;
pub mod camera;
pub mod cursor;
pub mod error;
pub mod object;
pub mod options;
pub mod tracking;
pub mod transform;

pub use bounds::Aabb;
pub use camera::{CameraPose, Frustum, Plane};
pub use cursor::{CursorKind, CursorPlacement, CursorState, CursorTransition, PlacementCursor};
pub use error::{DecorError, Result};
pub use object::{AssetRef, LoadState, ObjectId, VirtualObject};
pub use options::{EngineOptions, PlaneDetection};
pub use tracking::{LimitedReason, SurfaceHit, SurfaceKind, TrackingEstimate, TrackingQuality};
pub use transform::Transform;

// Re-export glam types for convenience
pub use glam::{Mat4, Quat, Vec3, Vec4};
