//! Delayed advisory messages.
//!
//! The engine asks for hints such as "find a surface" to appear after a
//! delay, and withdraws them once they are no longer relevant. How they are
//! presented is up to the [`AdvisoryMessenger`] implementation.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// The kind of advisory. At most one message per category is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageCategory {
    /// The session has not found any surface yet.
    PlaneEstimation,
    /// The cursor lost its surface; the user should move the device.
    FocusHint,
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlaneEstimation => write!(f, "plane estimation"),
            Self::FocusHint => write!(f, "focus hint"),
        }
    }
}

/// Presents delayed advisory messages to the user.
pub trait AdvisoryMessenger: Send + Sync {
    /// Shows `text` after `delay`, replacing any pending message of the same category.
    fn schedule_message(&self, text: &str, delay: Duration, category: MessageCategory);

    /// Withdraws the pending or showing message of `category`, if any.
    fn cancel_scheduled_message(&self, category: MessageCategory);
}

/// A message waiting for its delay to elapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMessage {
    /// Text to show.
    pub text: String,
    /// When the message becomes visible.
    pub due: Instant,
}

#[derive(Debug, Default)]
struct Board {
    pending: HashMap<MessageCategory, PendingMessage>,
    showing: HashMap<MessageCategory, String>,
}

/// Clock-driven in-memory messenger.
///
/// Scheduled messages become visible when [`poll`](Self::poll) is called at
/// or after their due time.
#[derive(Debug, Default)]
pub struct MessageBoard {
    board: Mutex<Board>,
}

impl MessageBoard {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Promotes every message due at `now` to showing and returns the newly
    /// shown categories in declaration order.
    pub fn poll(&self, now: Instant) -> Vec<MessageCategory> {
        let mut board = self.board.lock();
        let mut due: Vec<MessageCategory> = board
            .pending
            .iter()
            .filter(|(_, message)| message.due <= now)
            .map(|(&category, _)| category)
            .collect();
        due.sort_unstable();
        for category in &due {
            if let Some(message) = board.pending.remove(category) {
                log::info!("showing {category} message: {}", message.text);
                board.showing.insert(*category, message.text);
            }
        }
        due
    }

    /// Returns the text showing for `category`.
    pub fn showing(&self, category: MessageCategory) -> Option<String> {
        self.board.lock().showing.get(&category).cloned()
    }

    /// Returns the message pending for `category`.
    pub fn pending(&self, category: MessageCategory) -> Option<PendingMessage> {
        self.board.lock().pending.get(&category).cloned()
    }

    /// Returns whether anything is pending or showing for `category`.
    pub fn is_active(&self, category: MessageCategory) -> bool {
        let board = self.board.lock();
        board.pending.contains_key(&category) || board.showing.contains_key(&category)
    }

    /// Hides the showing message of `category`, as when the user taps it away.
    pub fn dismiss(&self, category: MessageCategory) {
        self.board.lock().showing.remove(&category);
    }
}

impl AdvisoryMessenger for MessageBoard {
    fn schedule_message(&self, text: &str, delay: Duration, category: MessageCategory) {
        let mut board = self.board.lock();
        if board.showing.contains_key(&category) {
            log::trace!("{category} message already showing");
            return;
        }
        board.pending.insert(
            category,
            PendingMessage {
                text: text.to_string(),
                due: Instant::now() + delay,
            },
        );
    }

    fn cancel_scheduled_message(&self, category: MessageCategory) {
        let mut board = self.board.lock();
        let pending = board.pending.remove(&category).is_some();
        let showing = board.showing.remove(&category).is_some();
        if pending || showing {
            log::debug!("cancelled {category} message");
        }
    }
}
