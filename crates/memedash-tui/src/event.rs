//! TUI event types for input and data changes.

use crossterm::event::KeyEvent;

/// Application event emitted by input handlers or data watchers.
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input event.
    Input(KeyEvent),
    /// Mouse wheel movement; negative is up.
    Scroll(i16),
    /// Periodic tick event.
    Tick,
    /// The leaderboard cache changed.
    TopMemesChanged,
    /// The history cache changed.
    HistoryChanged,
    /// A notification appeared or expired.
    NotificationChanged,
    /// A background action finished with a status line message.
    Status(String),
}
