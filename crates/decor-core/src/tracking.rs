//! Per-frame tracking snapshots.
//!
//! A [`TrackingEstimate`] is what the tracking supplier hands the engine every
//! frame: the camera pose, how much that pose can be trusted, and optionally
//! the surface found under the center of the screen.

use std::fmt;

use glam::Vec3;

use crate::camera::CameraPose;

/// Why tracking quality is limited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitedReason {
    /// The session has just started and has no map yet.
    Initializing,
    /// The device is moving too fast.
    ExcessiveMotion,
    /// The scene lacks visible texture or light.
    InsufficientFeatures,
    /// The session is recovering after an interruption.
    Relocalizing,
}

/// Coarse classification of how reliable the current camera pose is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingQuality {
    /// Pose is reliable.
    Normal,
    /// Pose is available but of questionable accuracy.
    Limited(LimitedReason),
    /// No pose is available.
    #[default]
    NotAvailable,
}

impl TrackingQuality {
    /// Returns true if the pose can be used for hit testing.
    pub fn is_normal(self) -> bool {
        matches!(self, Self::Normal)
    }
}

impl fmt::Display for TrackingQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Limited(reason) => write!(f, "limited ({reason:?})"),
            Self::NotAvailable => write!(f, "not available"),
        }
    }
}

/// Kind of surface a hit test landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// A detected horizontal plane (floor, table top).
    PlaneHorizontal,
    /// A detected vertical plane (wall).
    PlaneVertical,
    /// A surface estimated from feature points, not yet a detected plane.
    EstimatedPlane,
}

/// A ray-cast result identifying a surface under the screen center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// World position of the hit.
    pub position: Vec3,
    /// Surface normal at the hit.
    pub normal: Vec3,
    /// Kind of surface that was hit.
    pub kind: SurfaceKind,
    /// Distance from the camera to the hit.
    pub distance: f32,
}

impl SurfaceHit {
    /// Creates a hit on a horizontal plane at `position`.
    pub fn horizontal(position: Vec3, distance: f32) -> Self {
        Self {
            position,
            normal: Vec3::Y,
            kind: SurfaceKind::PlaneHorizontal,
            distance,
        }
    }

    /// Creates a hit with an explicit normal and kind.
    pub fn new(position: Vec3, normal: Vec3, kind: SurfaceKind, distance: f32) -> Self {
        Self {
            position,
            normal: normal.normalize_or_zero(),
            kind,
            distance,
        }
    }
}

/// Immutable tracking snapshot for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingEstimate {
    /// Camera pose this frame.
    pub camera: CameraPose,
    /// Reliability of the pose.
    pub quality: TrackingQuality,
    /// Surface under the screen center, if any.
    pub hit: Option<SurfaceHit>,
}

impl TrackingEstimate {
    /// Creates an estimate without a surface hit.
    pub fn new(camera: CameraPose, quality: TrackingQuality) -> Self {
        Self {
            camera,
            quality,
            hit: None,
        }
    }

    /// An estimate with reliable tracking and a surface hit.
    pub fn detecting(camera: CameraPose, hit: SurfaceHit) -> Self {
        Self {
            camera,
            quality: TrackingQuality::Normal,
            hit: Some(hit),
        }
    }

    /// Attaches a surface hit.
    #[must_use]
    pub fn with_hit(mut self, hit: SurfaceHit) -> Self {
        self.hit = Some(hit);
        self
    }

    /// Returns the surface hit, but only when tracking is reliable enough to use it.
    pub fn usable_hit(&self) -> Option<&SurfaceHit> {
        if self.quality.is_normal() {
            self.hit.as_ref()
        } else {
            None
        }
    }
}
