//! Placement cursor state machine.
//!
//! The cursor shows the user where a new object would be placed. Its state is
//! recomputed from scratch for every tracking frame; the only memory it keeps
//! is the previous state, so callers can react to transitions.

use glam::Mat4;

use crate::camera::CameraPose;
use crate::tracking::{SurfaceHit, TrackingEstimate};
use crate::transform::Transform;

/// State of the placement cursor. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CursorState {
    /// No reliable tracking yet.
    #[default]
    Initializing,
    /// A surface candidate is available this frame.
    Detecting {
        /// The surface under the screen center.
        hit: SurfaceHit,
        /// The camera pose the hit was computed from.
        camera: CameraPose,
    },
    /// Suppressed because a placed object is already in view.
    Hidden,
}

/// Payload-free discriminant of [`CursorState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    /// See [`CursorState::Initializing`].
    Initializing,
    /// See [`CursorState::Detecting`].
    Detecting,
    /// See [`CursorState::Hidden`].
    Hidden,
}

impl CursorState {
    /// Evaluates the cursor rules for one frame.
    ///
    /// A visible placed object always hides the cursor. Otherwise the cursor
    /// detects when tracking is normal and a surface was hit, and is
    /// initializing in every other case.
    pub fn evaluate(estimate: &TrackingEstimate, any_object_visible: bool) -> Self {
        if any_object_visible {
            return Self::Hidden;
        }
        match estimate.usable_hit() {
            Some(hit) => Self::Detecting {
                hit: *hit,
                camera: estimate.camera,
            },
            None => Self::Initializing,
        }
    }

    /// Returns the discriminant of this state.
    pub fn kind(&self) -> CursorKind {
        match self {
            Self::Initializing => CursorKind::Initializing,
            Self::Detecting { .. } => CursorKind::Detecting,
            Self::Hidden => CursorKind::Hidden,
        }
    }

    /// Returns the surface hit when detecting.
    pub fn hit(&self) -> Option<&SurfaceHit> {
        match self {
            Self::Detecting { hit, .. } => Some(hit),
            _ => None,
        }
    }

    /// Returns true when a surface is under the cursor.
    pub fn is_detecting(&self) -> bool {
        matches!(self, Self::Detecting { .. })
    }
}

/// Where the scene should draw the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorPlacement {
    /// Anchored in the world on the detected surface.
    OnSurface(Mat4),
    /// Floating in front of the camera, waiting for a surface.
    ScreenCenter,
    /// Not drawn.
    Hidden,
}

/// A state change reported by [`PlacementCursor::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorTransition {
    /// State before the update.
    pub from: CursorKind,
    /// State after the update.
    pub to: CursorKind,
}

impl CursorTransition {
    /// True when the cursor started detecting a surface this frame.
    pub fn entered_detecting(&self) -> bool {
        self.from != CursorKind::Detecting && self.to == CursorKind::Detecting
    }

    /// True when the cursor lost its surface this frame.
    pub fn left_detecting(&self) -> bool {
        self.from == CursorKind::Detecting && self.to != CursorKind::Detecting
    }

    /// True when the state kind changed.
    pub fn is_change(&self) -> bool {
        self.from != self.to
    }
}

/// The placement cursor.
#[derive(Debug, Clone, Default)]
pub struct PlacementCursor {
    state: CursorState,
}

impl PlacementCursor {
    /// Creates a cursor in the initializing state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    pub fn state(&self) -> &CursorState {
        &self.state
    }

    /// Feeds one tracking frame into the cursor.
    pub fn update(&mut self, estimate: &TrackingEstimate, any_object_visible: bool) -> CursorTransition {
        let from = self.state.kind();
        self.state = CursorState::evaluate(estimate, any_object_visible);
        let transition = CursorTransition {
            from,
            to: self.state.kind(),
        };
        if transition.is_change() {
            log::debug!("placement cursor {:?} -> {:?}", transition.from, transition.to);
        }
        transition
    }

    /// Returns the cursor to the initializing state.
    pub fn reset(&mut self) {
        self.state = CursorState::Initializing;
    }

    /// Returns where the scene should draw the cursor.
    pub fn placement(&self) -> CursorPlacement {
        match &self.state {
            CursorState::Initializing => CursorPlacement::ScreenCenter,
            CursorState::Detecting { hit, .. } => {
                CursorPlacement::OnSurface(Transform::on_surface(hit.position, hit.normal).to_matrix())
            }
            CursorState::Hidden => CursorPlacement::Hidden,
        }
    }
}
