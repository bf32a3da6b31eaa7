//! Rendering routines for the memedash TUI.

use crate::app::{App, FormField, Route, SettingsDialog, SettingsForm};
use chrono::{DateTime, NaiveDateTime, Utc};
use memedash_core::NotificationKind;
use memedash_protocol::{Meme, SortField};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
    Wrap,
};

const PRIMARY: Color = Color::Rgb(236, 91, 43); // #EC5B2B
const SECONDARY: Color = Color::Rgb(238, 121, 72); // #EE7948
const TEXT: Color = Color::Rgb(238, 238, 238); // #eeeeee
const TEXT_MUTED: Color = Color::Rgb(128, 128, 128); // #808080
const BORDER: Color = Color::Rgb(60, 60, 60); // #3c3c3c
const YELLOW: Color = Color::Rgb(229, 192, 123); // #e5c07b
const GREEN: Color = Color::Rgb(120, 220, 140);
const RED: Color = Color::Rgb(255, 110, 110);
const OVERLAY_BG: Color = Color::Rgb(20, 20, 20);

/// Rows taken by one meme card, including its spacer.
const CARD_HEIGHT: usize = 3;
const DIALOG_WIDTH: u16 = 64;
const DIALOG_HEIGHT: u16 = 12;

const SETUP_STEPS: [&str; 5] = [
    "Create a Telegram bot via @BotFather",
    "Send /newbot command in BotFather and follow instructions",
    "Copy the bot token provided",
    "Search for @userinfobot in Telegram and start a chat to get your chat ID",
    "Configure these credentials in the settings dialog (c)",
];

/// Draw the entire TUI frame.
pub fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let area = frame.area();
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // navigation
            Constraint::Min(0),    // page
            Constraint::Length(1), // status bar
        ])
        .split(area);

    draw_nav(frame, app, root[0]);
    match app.route {
        Route::Top => draw_top(frame, app, root[1]),
        Route::History => draw_history(frame, app, root[1]),
        Route::Reports => draw_reports(frame, app, root[1]),
    }
    draw_status_bar(frame, app, root[2]);

    if let SettingsDialog::Open(form) = &app.dialog {
        draw_settings_dialog(frame, form, area);
    }
    draw_toast(frame, app, area);
}

fn draw_nav(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(
            " memedash ",
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        ));

    let mut spans = Vec::new();
    for (idx, route) in Route::ALL.iter().enumerate() {
        let label = format!(" {} {} ", idx + 1, route.title());
        let style = if *route == app.route {
            Style::default()
                .fg(Color::Rgb(10, 10, 10))
                .bg(PRIMARY)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT_MUTED)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw("  "));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn page_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        ))
}

fn draw_top(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let mut title = Route::Top.title().to_string();
    if app.top.refreshing {
        title.push_str(" (refreshing)");
    }
    let block = page_block(&title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    if let Some(error) = &app.top.error {
        lines.push(error_line(error));
    }
    if app.top.loading {
        lines.push(muted_line("Loading..."));
    } else if app.top.memes.is_empty() && app.top.error.is_none() {
        lines.push(muted_line("No memes yet."));
    }
    let header = lines.len();
    for (idx, meme) in app.top.memes.iter().enumerate() {
        let stats = format!("Upvotes: {} • Comments: {}", meme.score, meme.num_comments);
        lines.extend(card_lines(idx, meme, stats, idx == app.top_selected));
    }
    draw_card_list(frame, lines, header, app.top_selected, inner);
}

fn draw_history(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // toolbar
            Constraint::Min(0),    // cards
            Constraint::Length(1), // load more
        ])
        .split(area);

    let key = app.history.key;
    let label_style = Style::default().fg(TEXT_MUTED);
    let value_style = Style::default().fg(TEXT).add_modifier(Modifier::BOLD);
    let toolbar = Line::from(vec![
        Span::styled(" Sort ", label_style),
        Span::styled(key.sort_by.label(), value_style),
        Span::styled(" (s)   Order ", label_style),
        Span::styled(key.order.label(), value_style),
        Span::styled(" (o)   Show ", label_style),
        Span::styled(key.limit.label(), value_style),
        Span::styled(" (l)", label_style),
    ]);
    let toolbar_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER));
    frame.render_widget(Paragraph::new(toolbar).block(toolbar_block), sections[0]);

    let mut title = Route::History.title().to_string();
    if app.history.refreshing {
        title.push_str(" (refreshing)");
    }
    let block = page_block(&title);
    let inner = block.inner(sections[1]);
    frame.render_widget(block, sections[1]);

    let mut lines = Vec::new();
    if let Some(error) = &app.history.error {
        lines.push(error_line(error));
    }
    if app.history.loading_first {
        lines.push(muted_line("Loading..."));
    } else if app.history.items.is_empty() && app.history.error.is_none() {
        lines.push(muted_line("No memes found."));
    }
    let header = lines.len();
    for (idx, meme) in app.history.items.iter().enumerate() {
        let mut stats = format!("Score: {} • Comments: {}", meme.score, meme.num_comments);
        if let Some(date) = display_date(meme, key.sort_by) {
            stats.push_str(" • ");
            stats.push_str(&date);
        }
        lines.extend(card_lines(idx, meme, stats, idx == app.history_selected));
    }
    draw_card_list(frame, lines, header, app.history_selected, inner);

    let footer = if !app.history.has_more {
        None
    } else if app.history.fetching_next {
        Some(Span::styled(" Loading more...", Style::default().fg(TEXT_MUTED)))
    } else {
        Some(Span::styled(
            " Load More (m)",
            Style::default().fg(SECONDARY).add_modifier(Modifier::BOLD),
        ))
    };
    if let Some(footer) = footer {
        frame.render_widget(Paragraph::new(Line::from(footer)), sections[2]);
    }
}

fn draw_reports(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = page_block(Route::Reports.title());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(
                " Generate and send reports of the top {} memes to your Telegram channel.",
                app.report_limit
            ),
            Style::default().fg(TEXT),
        )),
    ];
    if app.credentials.is_empty() {
        lines.push(Line::from(Span::styled(
            " Warning: No Telegram credentials set. Report will be sent to default bot. Press c to add your bot credentials.",
            Style::default().fg(YELLOW),
        )));
    } else {
        lines.push(Line::from(vec![
            Span::styled(" Chat ID ", Style::default().fg(TEXT_MUTED)),
            Span::styled(app.credentials.chat_id.clone(), Style::default().fg(TEXT)),
        ]));
    }
    lines.push(Line::from(""));

    let button = if app.report_pending {
        Span::styled(" [ Sending... ] ", Style::default().fg(TEXT_MUTED))
    } else {
        Span::styled(
            " [ Send Report ] ",
            Style::default()
                .fg(Color::Rgb(10, 10, 10))
                .bg(PRIMARY)
                .add_modifier(Modifier::BOLD),
        )
    };
    lines.push(Line::from(vec![
        Span::raw(" "),
        button,
        Span::styled("  Enter", Style::default().fg(TEXT_MUTED)),
        Span::styled("   Settings ", Style::default().fg(TEXT_MUTED)),
        Span::styled("c", Style::default().fg(SECONDARY)),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " To set up Telegram reporting:",
        Style::default().fg(TEXT).add_modifier(Modifier::BOLD),
    )));
    for (idx, step) in SETUP_STEPS.iter().enumerate() {
        lines.push(Line::from(Span::styled(
            format!("   {}. {step}", idx + 1),
            Style::default().fg(TEXT_MUTED),
        )));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_settings_dialog(frame: &mut Frame<'_>, form: &SettingsForm, area: Rect) {
    let width = DIALOG_WIDTH.min(area.width);
    let height = DIALOG_HEIGHT.min(area.height);
    let dialog_area = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(PRIMARY))
        .title(Span::styled(
            " Telegram Settings ",
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(OVERLAY_BG));
    let inner = block.inner(dialog_area);

    let fields = [
        (
            FormField::BotToken,
            "Bot Token",
            form.bot_token.as_str(),
            "Enter your Telegram bot token",
        ),
        (
            FormField::ChatId,
            "Chat ID",
            form.chat_id.as_str(),
            "Enter your Telegram chat ID",
        ),
    ];
    let mut lines = vec![Line::from("")];
    let mut cursor = None;
    for (field, label, value, placeholder) in fields {
        let focused = form.focus == field;
        lines.push(Line::from(Span::styled(
            format!(" {label}"),
            Style::default().fg(if focused { SECONDARY } else { TEXT_MUTED }),
        )));
        let marker = Span::styled(
            if focused { " > " } else { "   " },
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        );
        let value_span = if value.is_empty() {
            Span::styled(placeholder, Style::default().fg(TEXT_MUTED))
        } else {
            Span::styled(value, Style::default().fg(TEXT))
        };
        if focused {
            cursor = Some((
                inner.x + 3 + value.chars().count() as u16,
                inner.y + lines.len() as u16,
            ));
        }
        lines.push(Line::from(vec![marker, value_span]));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        " Tab switch field  Enter save settings  Esc close",
        Style::default().fg(TEXT_MUTED).add_modifier(Modifier::ITALIC),
    )));

    frame.render_widget(Clear, dialog_area);
    frame.render_widget(Paragraph::new(lines).block(block), dialog_area);
    if let Some((x, y)) = cursor {
        let max_x = inner.x + inner.width.saturating_sub(1);
        frame.set_cursor_position((x.min(max_x), y));
    }
}

fn draw_toast(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(notification) = &app.notification else {
        return;
    };
    let color = match notification.kind {
        NotificationKind::Success => GREEN,
        NotificationKind::Error => RED,
    };
    let width = (notification.message.chars().count() as u16 + 4)
        .min(area.width / 2)
        .max(12)
        .min(area.width);
    let toast_area = Rect {
        x: area.x + area.width.saturating_sub(width + 1),
        y: area.y + 1,
        width,
        height: 3.min(area.height),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .style(Style::default().bg(OVERLAY_BG));
    let message = Paragraph::new(Line::from(Span::styled(
        notification.message.as_str(),
        Style::default().fg(color),
    )))
    .block(block);
    frame.render_widget(Clear, toast_area);
    frame.render_widget(message, toast_area);
}

/// Draw the status bar at the bottom.
fn draw_status_bar(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let mut shortcuts = vec![("q", "quit"), ("1-3/Tab", "switch")];
    match app.route {
        Route::Top => shortcuts.extend([("↑↓", "select"), ("Enter", "open"), ("r", "refresh")]),
        Route::History => shortcuts.extend([
            ("↑↓", "select"),
            ("Enter", "open"),
            ("m", "more"),
            ("r", "refresh"),
        ]),
        Route::Reports => shortcuts.extend([("Enter", "send"), ("c", "settings")]),
    }
    let mut spans = Vec::new();
    for (key, action) in shortcuts {
        spans.push(Span::styled(format!(" {key}"), Style::default().fg(TEXT_MUTED)));
        spans.push(Span::styled(format!(" {action} "), Style::default().fg(BORDER)));
    }

    let status_color = match app.status.as_str() {
        "idle" => TEXT_MUTED,
        _ => YELLOW,
    };
    let right_text = format!(" {} ", app.status);
    let right_len = right_text.chars().count() as u16;
    let left_area = Rect {
        width: area.width.saturating_sub(right_len),
        ..area
    };
    let right_area = Rect {
        x: area.x + area.width.saturating_sub(right_len),
        width: right_len.min(area.width),
        ..area
    };

    frame.render_widget(Paragraph::new(Line::from(spans)), left_area);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            right_text,
            Style::default().fg(status_color),
        ))),
        right_area,
    );
}

fn card_lines(idx: usize, meme: &Meme, stats: String, selected: bool) -> Vec<Line<'static>> {
    let (marker, title_style) = if selected {
        (
            "▶ ",
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        )
    } else {
        ("  ", Style::default().fg(TEXT))
    };
    vec![
        Line::from(vec![
            Span::styled(marker, Style::default().fg(PRIMARY)),
            Span::styled(format!("{}. {}", idx + 1, meme.title), title_style),
        ]),
        Line::from(Span::styled(
            format!("     {stats}"),
            Style::default().fg(TEXT_MUTED),
        )),
        Line::from(""),
    ]
}

/// Render card lines, scrolled so the selected card is visible.
fn draw_card_list(
    frame: &mut Frame<'_>,
    lines: Vec<Line<'static>>,
    header: usize,
    selected: usize,
    area: Rect,
) {
    let total = lines.len();
    let height = area.height as usize;
    let selected_bottom = header + (selected + 1) * CARD_HEIGHT;
    let scroll = selected_bottom.saturating_sub(height).min(total.saturating_sub(1));

    let list_area = Rect {
        width: area.width.saturating_sub(1),
        ..area
    };
    frame.render_widget(
        Paragraph::new(lines).scroll((scroll as u16, 0)),
        list_area,
    );

    if total > height {
        let mut scrollbar_state = ScrollbarState::default()
            .content_length(total)
            .position(scroll)
            .viewport_content_length(height);
        let scrollbar_area = Rect {
            x: area.x + area.width.saturating_sub(1),
            y: area.y,
            width: 1,
            height: area.height,
        };
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .style(Style::default().fg(BORDER))
                .thumb_style(Style::default().fg(TEXT_MUTED)),
            scrollbar_area,
            &mut scrollbar_state,
        );
    }
}

fn error_line(message: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!(" Error: {message}"),
        Style::default().fg(RED),
    ))
}

fn muted_line(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(format!(" {text}"), Style::default().fg(TEXT_MUTED)))
}

/// Date matching the active sort, so the ordering is visible.
fn display_date(meme: &Meme, sort_by: SortField) -> Option<String> {
    let raw = match sort_by {
        SortField::RedditCreatedAt => meme.reddit_created_at.as_deref(),
        _ => meme.created_at.as_deref(),
    }?;
    Some(format_timestamp(raw))
}

/// Format API timestamps as `YYYY-MM-DD HH:MM` UTC, passing unknown shapes through.
fn format_timestamp(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M")
            .to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::{draw, format_timestamp};
    use crate::app::{App, Route};
    use memedash_core::{HistorySnapshot, Notification, NotificationKind, TopMemesSnapshot};
    use memedash_protocol::Credentials;
    use memedash_test_utils::{meme_with_stats, memes};
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render(app: &mut App) -> String {
        let backend = TestBackend::new(120, 32);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal.draw(|frame| draw(frame, app)).expect("draw");
        let buffer = terminal.backend().buffer().clone();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    /// A single leaderboard meme renders one card with its stats.
    #[test]
    fn top_card_shows_upvotes_and_comments() {
        let mut app = App::new(20);
        app.set_top(TopMemesSnapshot {
            memes: vec![meme_with_stats("1", 10, 2)],
            ..TopMemesSnapshot::default()
        });
        let screen = render(&mut app);
        assert!(screen.contains("Upvotes: 10"), "{screen}");
        assert!(screen.contains("Comments: 2"), "{screen}");
        assert_eq!(screen.matches("Upvotes:").count(), 1);
    }

    #[test]
    fn top_error_is_inline() {
        let mut app = App::new(20);
        app.set_top(TopMemesSnapshot {
            error: Some("Network response was not ok".to_string()),
            ..TopMemesSnapshot::default()
        });
        let screen = render(&mut app);
        assert!(screen.contains("Error: Network response was not ok"), "{screen}");
    }

    #[test]
    fn history_load_more_states() {
        let mut app = App::new(20);
        app.set_route(Route::History);
        app.set_history(HistorySnapshot {
            items: memes("a", 2),
            has_more: true,
            ..HistorySnapshot::default()
        });
        let screen = render(&mut app);
        assert!(screen.contains("Load More"), "{screen}");
        assert!(screen.contains("Score: 0"), "{screen}");
        assert!(screen.contains("Date Created"), "{screen}");

        app.history.fetching_next = true;
        let screen = render(&mut app);
        assert!(screen.contains("Loading more..."), "{screen}");

        app.history.fetching_next = false;
        app.history.has_more = false;
        let screen = render(&mut app);
        assert!(!screen.contains("Load More"));
        assert!(!screen.contains("Loading more..."));
    }

    #[test]
    fn reports_page_reflects_credentials_and_pending() {
        let mut app = App::new(20);
        app.set_route(Route::Reports);
        let screen = render(&mut app);
        assert!(screen.contains("No Telegram credentials set"), "{screen}");
        assert!(screen.contains("Send Report"));

        app.credentials = Credentials::new("token", "-100");
        app.report_pending = true;
        let screen = render(&mut app);
        assert!(!screen.contains("No Telegram credentials set"));
        assert!(screen.contains("Sending..."));
    }

    #[test]
    fn overlays_render_on_top() {
        let mut app = App::new(20);
        app.open_settings();
        app.notification = Some(Notification {
            message: "Your Telegram credentials have been saved.".to_string(),
            kind: NotificationKind::Success,
        });
        let screen = render(&mut app);
        assert!(screen.contains("Telegram Settings"), "{screen}");
        assert!(screen.contains("Enter your Telegram bot token"), "{screen}");
        assert!(screen.contains("Your Telegram credentials have been saved."), "{screen}");
    }

    #[test]
    fn timestamps_are_normalized() {
        assert_eq!(format_timestamp("2024-05-01T12:34:56Z"), "2024-05-01 12:34");
        assert_eq!(format_timestamp("2024-05-01T12:34:56.123456"), "2024-05-01 12:34");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
