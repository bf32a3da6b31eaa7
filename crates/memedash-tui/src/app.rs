//! Application state for the memedash TUI.

use log::{debug, info};
use memedash_core::{HistorySnapshot, Notification, TopMemesSnapshot};
use memedash_protocol::{Credentials, Meme};

/// Top-level pages reachable from the navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Top,
    History,
    Reports,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::Top, Route::History, Route::Reports];

    pub fn title(self) -> &'static str {
        match self {
            Route::Top => "Top Memes",
            Route::History => "History",
            Route::Reports => "Reports",
        }
    }

    fn index(self) -> usize {
        match self {
            Route::Top => 0,
            Route::History => 1,
            Route::Reports => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Route bound to a digit shortcut.
    pub fn from_shortcut(ch: char) -> Option<Self> {
        match ch {
            '1' => Some(Route::Top),
            '2' => Some(Route::History),
            '3' => Some(Route::Reports),
            _ => None,
        }
    }
}

/// Field focused in the settings form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    BotToken,
    ChatId,
}

impl FormField {
    fn toggled(self) -> Self {
        match self {
            FormField::BotToken => FormField::ChatId,
            FormField::ChatId => FormField::BotToken,
        }
    }
}

/// Editable copy of the credentials while the dialog is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsForm {
    pub bot_token: String,
    pub chat_id: String,
    pub focus: FormField,
}

impl SettingsForm {
    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            FormField::BotToken => &mut self.bot_token,
            FormField::ChatId => &mut self.chat_id,
        }
    }
}

/// Telegram settings dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsDialog {
    Closed,
    Open(SettingsForm),
}

/// Top-level application state for the TUI.
pub struct App {
    /// Page currently mounted.
    pub route: Route,
    /// Selected card on the top page.
    pub top_selected: usize,
    /// Selected card on the history page.
    pub history_selected: usize,
    pub dialog: SettingsDialog,
    /// Status line text.
    pub status: String,
    /// Latest leaderboard state.
    pub top: TopMemesSnapshot,
    /// Latest history state.
    pub history: HistorySnapshot,
    pub notification: Option<Notification>,
    /// Whether a report is being sent.
    pub report_pending: bool,
    /// Saved credentials, shown in the reports page.
    pub credentials: Credentials,
    /// Number of memes a report contains.
    pub report_limit: u32,
}

impl App {
    pub fn new(report_limit: u32) -> Self {
        Self {
            route: Route::Top,
            top_selected: 0,
            history_selected: 0,
            dialog: SettingsDialog::Closed,
            status: "idle".to_string(),
            top: TopMemesSnapshot::default(),
            history: HistorySnapshot::default(),
            notification: None,
            report_pending: false,
            credentials: Credentials::default(),
            report_limit,
        }
    }

    /// Switch page. Returns `false` if the page was already mounted.
    pub fn set_route(&mut self, route: Route) -> bool {
        if self.route == route {
            return false;
        }
        info!("route changed (from={:?}, to={:?})", self.route, route);
        self.route = route;
        true
    }

    pub fn set_top(&mut self, snapshot: TopMemesSnapshot) {
        self.top = snapshot;
        self.top_selected = clamp_selection(self.top_selected, self.top.memes.len());
    }

    pub fn set_history(&mut self, snapshot: HistorySnapshot) {
        if snapshot.key != self.history.key {
            self.history_selected = 0;
        }
        self.history = snapshot;
        self.history_selected = clamp_selection(self.history_selected, self.history.items.len());
    }

    /// Update the status line text.
    pub fn push_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        debug!("status updated (status={})", self.status);
    }

    pub fn select_up(&mut self) {
        match self.route {
            Route::Top => self.top_selected = self.top_selected.saturating_sub(1),
            Route::History => self.history_selected = self.history_selected.saturating_sub(1),
            Route::Reports => {}
        }
    }

    pub fn select_down(&mut self) {
        match self.route {
            Route::Top => {
                if self.top_selected + 1 < self.top.memes.len() {
                    self.top_selected += 1;
                }
            }
            Route::History => {
                if self.history_selected + 1 < self.history.items.len() {
                    self.history_selected += 1;
                }
            }
            Route::Reports => {}
        }
    }

    /// Meme under the cursor on the mounted page.
    pub fn selected_meme(&self) -> Option<&Meme> {
        match self.route {
            Route::Top => self.top.memes.get(self.top_selected),
            Route::History => self.history.items.get(self.history_selected),
            Route::Reports => None,
        }
    }

    /// Open the dialog pre-filled with the saved credentials.
    pub fn open_settings(&mut self) {
        self.dialog = SettingsDialog::Open(SettingsForm {
            bot_token: self.credentials.bot_token.clone(),
            chat_id: self.credentials.chat_id.clone(),
            focus: FormField::BotToken,
        });
    }

    /// Close the dialog, discarding edits.
    pub fn close_settings(&mut self) {
        self.dialog = SettingsDialog::Closed;
    }

    pub fn settings_open(&self) -> bool {
        matches!(self.dialog, SettingsDialog::Open(_))
    }

    pub fn settings_input(&mut self, ch: char) {
        if let SettingsDialog::Open(form) = &mut self.dialog {
            form.focused_mut().push(ch);
        }
    }

    pub fn settings_backspace(&mut self) {
        if let SettingsDialog::Open(form) = &mut self.dialog {
            form.focused_mut().pop();
        }
    }

    pub fn settings_toggle_field(&mut self) {
        if let SettingsDialog::Open(form) = &mut self.dialog {
            form.focus = form.focus.toggled();
        }
    }

    /// Close the dialog and hand back the credentials exactly as typed.
    pub fn submit_settings(&mut self) -> Option<Credentials> {
        match std::mem::replace(&mut self.dialog, SettingsDialog::Closed) {
            SettingsDialog::Open(form) => Some(Credentials::new(form.bot_token, form.chat_id)),
            SettingsDialog::Closed => None,
        }
    }
}

fn clamp_selection(selected: usize, len: usize) -> usize {
    selected.min(len.saturating_sub(1))
}
