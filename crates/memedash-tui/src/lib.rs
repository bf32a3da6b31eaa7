//! Library entry point for the memedash TUI.
//!
//! Provides a reusable [`run`] function that launches the Ratatui terminal UI
//! against pre-wired [`Dashboard`] services.

mod app;
mod client;
mod event;
mod ui;

use anyhow::anyhow;
use app::{App, Route};
use client::DashboardClient;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode, KeyEvent,
    KeyEventKind, KeyModifiers, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use event::AppEvent;
use log::{debug, info, warn};
use memedash_core::{Dashboard, HistoryKey};
use memedash_protocol::DEFAULT_REPORT_LIMIT;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Configuration for a dashboard session.
#[derive(Debug, Clone)]
pub struct TuiConfig {
    /// Number of memes a report contains (shown on the reports page).
    pub report_limit: u32,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            report_limit: DEFAULT_REPORT_LIMIT,
        }
    }
}

/// Launch the memedash TUI.
///
/// The caller is responsible for initializing logging before calling `run`.
/// Logging to stderr will garble the alternate screen, so route it to a file.
///
/// # Errors
/// Returns an error if terminal setup or the event loop fails.
pub async fn run(dashboard: Dashboard, config: TuiConfig) -> anyhow::Result<()> {
    let client = DashboardClient::new(dashboard);
    let mut app = App::new(config.report_limit);
    sync_app(&mut app, client.dashboard());

    let mut terminal = setup_terminal()?;
    let (tx, mut rx) = mpsc::channel(256);
    spawn_input_handler(tx.clone());
    spawn_tick(tx.clone());
    client.spawn_watchers(tx.clone());

    let mut poll_handle = Some(client.mount_top());
    info!("dashboard started (route={:?})", app.route);

    let result = event_loop(&mut terminal, &client, &mut app, &mut rx, tx, &mut poll_handle).await;

    if let Some(handle) = poll_handle.take() {
        handle.abort();
    }
    restore_terminal(&mut terminal)?;
    info!("dashboard stopped");
    result
}

/// Draw, wait for the next event, and dispatch it until the user quits.
async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    client: &DashboardClient,
    app: &mut App,
    rx: &mut mpsc::Receiver<AppEvent>,
    tx: mpsc::Sender<AppEvent>,
    poll_handle: &mut Option<JoinHandle<()>>,
) -> anyhow::Result<()> {
    loop {
        sync_app(app, client.dashboard());
        terminal.draw(|frame| ui::draw(frame, app))?;
        let event = rx
            .recv()
            .await
            .ok_or_else(|| anyhow!("event channel closed unexpectedly"))?;
        if handle_app_event(event, client, app, tx.clone(), poll_handle)? {
            return Ok(());
        }
    }
}

/// Copy the latest service state into the view model.
fn sync_app(app: &mut App, dashboard: &Dashboard) {
    app.set_top(dashboard.top_memes.snapshot());
    app.set_history(dashboard.history.snapshot());
    app.notification = dashboard.notifier.current();
    app.report_pending = dashboard.reports.is_pending();
    app.credentials = dashboard.settings.credentials();
}

/// Dispatch a UI event and return true when the app should exit.
fn handle_app_event(
    event: AppEvent,
    client: &DashboardClient,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
    poll_handle: &mut Option<JoinHandle<()>>,
) -> anyhow::Result<bool> {
    match event {
        AppEvent::Input(key) => handle_input(key, client, app, sender, poll_handle),
        AppEvent::Scroll(delta) => {
            if !app.settings_open() {
                if delta < 0 {
                    app.select_up();
                } else if delta > 0 {
                    app.select_down();
                }
            }
            Ok(false)
        }
        AppEvent::Status(message) => {
            app.push_status(message);
            Ok(false)
        }
        // State is re-read before every draw.
        AppEvent::Tick
        | AppEvent::TopMemesChanged
        | AppEvent::HistoryChanged
        | AppEvent::NotificationChanged => Ok(false),
    }
}

/// Handle keyboard input for the current screen.
fn handle_input(
    key: KeyEvent,
    client: &DashboardClient,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
    poll_handle: &mut Option<JoinHandle<()>>,
) -> anyhow::Result<bool> {
    if key.kind == KeyEventKind::Release {
        return Ok(false);
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Ok(true);
    }
    if key.code == KeyCode::Esc {
        if app.settings_open() {
            app.close_settings();
            return Ok(false);
        }
        return Ok(true);
    }

    if app.settings_open() {
        handle_settings_input(key, client, app);
        return Ok(false);
    }

    handle_default_input(key, client, app, sender, poll_handle)
}

/// Handle keyboard input while the Telegram settings dialog is open.
fn handle_settings_input(key: KeyEvent, client: &DashboardClient, app: &mut App) {
    match key.code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            app.settings_toggle_field();
        }
        KeyCode::Backspace => app.settings_backspace(),
        KeyCode::Enter => {
            if let Some(credentials) = app.submit_settings()
                && client.save_credentials(credentials)
            {
                app.push_status("settings saved");
            }
        }
        KeyCode::Char(ch) => app.settings_input(ch),
        _ => {}
    }
}

/// Handle navigation and page actions.
fn handle_default_input(
    key: KeyEvent,
    client: &DashboardClient,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
    poll_handle: &mut Option<JoinHandle<()>>,
) -> anyhow::Result<bool> {
    match key.code {
        KeyCode::Char('q') => return Ok(true),
        KeyCode::Char(ch @ '1'..='3') => {
            if let Some(route) = Route::from_shortcut(ch) {
                switch_route(route, client, app, poll_handle);
            }
        }
        KeyCode::Tab => switch_route(app.route.next(), client, app, poll_handle),
        KeyCode::BackTab => switch_route(app.route.prev(), client, app, poll_handle),
        KeyCode::Up | KeyCode::Char('k') => app.select_up(),
        KeyCode::Down | KeyCode::Char('j') => app.select_down(),
        KeyCode::Enter => match app.route {
            Route::Reports => send_report(client, app, sender),
            Route::Top | Route::History => open_selected(app),
        },
        KeyCode::Char('r') => match app.route {
            Route::Top => {
                client.refresh_top();
                app.push_status("refreshing top memes");
            }
            Route::History => {
                client.refresh_history();
                app.push_status("refreshing history");
            }
            Route::Reports => {}
        },
        KeyCode::Char('s') if app.route == Route::History => {
            let key = client.dashboard().history.key();
            change_history_params(client, app, key.with_sort_by(key.sort_by.next()));
        }
        KeyCode::Char('o') if app.route == Route::History => {
            let key = client.dashboard().history.key();
            change_history_params(client, app, key.with_order(key.order.toggled()));
        }
        KeyCode::Char('l') if app.route == Route::History => {
            let key = client.dashboard().history.key();
            change_history_params(client, app, key.with_limit(key.limit.next()));
        }
        KeyCode::Char('m') if app.route == Route::History => {
            if app.history.has_more && !app.history.fetching_next {
                client.load_more(sender);
                app.push_status("loading more");
            }
        }
        KeyCode::Char('c') if app.route == Route::Reports => app.open_settings(),
        _ => {}
    }
    Ok(false)
}

/// Mount a page, starting or stopping leaderboard polling as needed.
fn switch_route(
    route: Route,
    client: &DashboardClient,
    app: &mut App,
    poll_handle: &mut Option<JoinHandle<()>>,
) {
    if !app.set_route(route) {
        return;
    }
    match route {
        Route::Top => {
            if poll_handle.is_none() {
                *poll_handle = Some(client.mount_top());
            }
        }
        Route::History | Route::Reports => {
            if let Some(handle) = poll_handle.take() {
                handle.abort();
                debug!("top memes polling stopped");
            }
        }
    }
    if route == Route::History {
        client.mount_history();
    }
}

fn change_history_params(client: &DashboardClient, app: &mut App, key: HistoryKey) {
    if client.dashboard().history.set_params(key) {
        app.push_status(format!(
            "sorted by {} ({}), {}",
            key.sort_by.label(),
            key.order.label(),
            key.limit.label()
        ));
        client.mount_history();
    }
}

fn send_report(client: &DashboardClient, app: &mut App, sender: mpsc::Sender<AppEvent>) {
    if client.dashboard().reports.is_pending() {
        debug!("report already pending; ignoring request");
        return;
    }
    client.send_report(sender);
    app.report_pending = true;
    app.push_status("sending report");
}

/// Open the selected meme's permalink in the system browser.
fn open_selected(app: &mut App) {
    let Some(meme) = app.selected_meme() else {
        return;
    };
    if meme.permalink.is_empty() {
        app.push_status("meme has no link");
        return;
    }
    let link = meme.permalink.clone();
    let reddit_id = meme.reddit_id.clone();
    match webbrowser::open(&link) {
        Ok(()) => {
            info!("opened meme link (reddit_id={reddit_id})");
            app.push_status(format!("opened {link}"));
        }
        Err(err) => {
            warn!("failed to open meme link (reddit_id={reddit_id}): {err}");
            app.push_status(format!("failed to open link: {err}"));
        }
    }
}

/// Spawn a task that polls crossterm for keyboard and mouse input.
fn spawn_input_handler(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        loop {
            if matches!(crossterm::event::poll(Duration::from_millis(30)), Ok(true)) {
                while matches!(crossterm::event::poll(Duration::from_millis(0)), Ok(true)) {
                    let event = match crossterm::event::read() {
                        Ok(event) => event,
                        Err(_) => break,
                    };
                    let app_event = match event {
                        CrosstermEvent::Key(key) => AppEvent::Input(key),
                        CrosstermEvent::Mouse(mouse) => match mouse.kind {
                            MouseEventKind::ScrollUp => AppEvent::Scroll(-1),
                            MouseEventKind::ScrollDown => AppEvent::Scroll(1),
                            _ => continue,
                        },
                        _ => continue,
                    };
                    if sender.send(app_event).await.is_err() {
                        return;
                    }
                }
            }
        }
    });
}

/// Spawn a periodic tick event generator.
fn spawn_tick(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(250));
        loop {
            interval.tick().await;
            if sender.send(AppEvent::Tick).await.is_err() {
                break;
            }
        }
    });
}

/// Configure terminal in raw mode with alternate screen.
fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    debug!("setting up terminal");
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal state on exit.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    debug!("restoring terminal");
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
