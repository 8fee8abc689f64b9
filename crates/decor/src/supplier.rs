//! The tracking collaborator.

use decor_core::PlaneDetection;

/// How the supplier should (re)start tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Which plane orientations to detect.
    pub plane_detection: PlaneDetection,
    /// Discard the current world map and start tracking from scratch.
    pub reset_tracking: bool,
    /// Discard anchors from the previous run.
    pub remove_existing_anchors: bool,
}

impl RunOptions {
    /// Options for a first run, or a restart: tracking and anchors are reset.
    pub fn fresh(plane_detection: PlaneDetection) -> Self {
        Self {
            plane_detection,
            reset_tracking: true,
            remove_existing_anchors: true,
        }
    }

    /// Options for resuming after a pause: the existing world map is kept.
    pub fn resume(plane_detection: PlaneDetection) -> Self {
        Self {
            plane_detection,
            reset_tracking: false,
            remove_existing_anchors: false,
        }
    }
}

/// Supplies world tracking to the engine.
///
/// The engine only drives the supplier's lifecycle. Per-frame
/// [`TrackingEstimate`](decor_core::TrackingEstimate)s are pushed by the
/// platform layer through [`PlacementEngine::on_frame`](crate::PlacementEngine::on_frame).
pub trait TrackingSupplier: Send {
    /// Returns whether the device supports world tracking at all.
    fn is_supported(&self) -> bool;

    /// Starts or restarts tracking.
    fn run(&mut self, options: &RunOptions);

    /// Pauses tracking. Estimates stop until the next [`run`](Self::run).
    fn pause(&mut self);
}
