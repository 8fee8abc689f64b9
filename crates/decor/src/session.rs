//! Session lifecycle state machine.

use std::fmt;

use decor_core::{DecorError, Result};

/// Where the AR session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Constructed, tracking never run.
    #[default]
    NotStarted,
    /// Tracking and frame processing are live.
    Running,
    /// Tracking paused; frames are ignored.
    Paused,
    /// Clearing objects and resetting tracking. Only observable while a restart is in progress.
    Restarting,
}

impl SessionState {
    /// Returns the state after `start`.
    pub fn start(self) -> Result<Self> {
        match self {
            Self::NotStarted => Ok(Self::Running),
            other => Err(other.invalid("start")),
        }
    }

    /// Returns the state after `pause`.
    pub fn pause(self) -> Result<Self> {
        match self {
            Self::Running => Ok(Self::Paused),
            other => Err(other.invalid("pause")),
        }
    }

    /// Returns the state after `resume`.
    pub fn resume(self) -> Result<Self> {
        match self {
            Self::Paused => Ok(Self::Running),
            other => Err(other.invalid("resume")),
        }
    }

    /// Returns the intermediate state entered by `restart`.
    pub fn restart(self) -> Result<Self> {
        match self {
            Self::Running | Self::Paused => Ok(Self::Restarting),
            other => Err(other.invalid("restart")),
        }
    }

    /// Returns whether frames should be processed.
    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    fn invalid(self, action: &'static str) -> DecorError {
        DecorError::InvalidTransition {
            from: self.to_string(),
            action,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Restarting => write!(f, "restarting"),
        }
    }
}
