//! Configuration options for the placement engine.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which plane orientations the tracking supplier should detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaneDetection {
    /// Detect floors and table tops.
    pub horizontal: bool,
    /// Detect walls.
    pub vertical: bool,
}

impl Default for PlaneDetection {
    fn default() -> Self {
        Self {
            horizontal: true,
            vertical: true,
        }
    }
}

/// Global configuration options for the placement engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Number of background workers loading object assets.
    pub load_workers: usize,

    /// Delay before the "find a surface" advisory after a session (re)start, in seconds.
    pub plane_estimation_delay_secs: f32,

    /// Delay before the "move the device" advisory after the cursor loses its surface, in seconds.
    pub focus_hint_delay_secs: f32,

    /// Plane orientations to detect.
    pub plane_detection: PlaneDetection,

    /// Text of the plane estimation advisory.
    pub plane_estimation_message: String,

    /// Text of the focus hint advisory.
    pub focus_hint_message: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            load_workers: 2,
            plane_estimation_delay_secs: 7.5,
            focus_hint_delay_secs: 5.0,
            plane_detection: PlaneDetection::default(),
            plane_estimation_message: "FIND A SURFACE TO PLACE AN OBJECT".to_string(),
            focus_hint_message: "TRY MOVING LEFT OR RIGHT".to_string(),
        }
    }
}

impl EngineOptions {
    /// Parses options from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serializes the options to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Sets the number of load workers (at least one).
    #[must_use]
    pub fn with_load_workers(mut self, workers: usize) -> Self {
        self.load_workers = workers.max(1);
        self
    }

    /// Sets the plane detection mode.
    #[must_use]
    pub fn with_plane_detection(mut self, plane_detection: PlaneDetection) -> Self {
        self.plane_detection = plane_detection;
        self
    }

    /// Returns the plane estimation advisory delay.
    pub fn plane_estimation_delay(&self) -> Duration {
        Duration::from_secs_f32(self.plane_estimation_delay_secs.max(0.0))
    }

    /// Returns the focus hint advisory delay.
    pub fn focus_hint_delay(&self) -> Duration {
        Duration::from_secs_f32(self.focus_hint_delay_secs.max(0.0))
    }
}
