//! UI rendering functions.

use std::time::Duration;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Tabs,
    Wrap,
};

use crate::app::{App, Focus};
use crate::model::{Section, ValidationStatus};
use crate::submission::SubmissionState;

/// Maximum number of text rows the input panel grows to.
const INPUT_MAX_ROWS: u16 = 6;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Formats a duration as M:SS (under 1 hour) or H:MM:SS (1+ hours).
pub fn format_elapsed(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Short status word and color for the status bar.
pub fn status_indicator(state: &SubmissionState) -> (&'static str, Color) {
    match state {
        SubmissionState::Idle => ("IDLE", Color::Cyan),
        SubmissionState::Loading => ("TRANSLATING", Color::Yellow),
        SubmissionState::Failed { .. } => ("ERROR", Color::Red),
        SubmissionState::Succeeded { .. } => ("DONE", Color::Green),
    }
}

fn validation_color(status: ValidationStatus) -> Color {
    match status {
        ValidationStatus::Empty => Color::DarkGray,
        ValidationStatus::TooShort { .. } => Color::Yellow,
        ValidationStatus::Valid { .. } => Color::Green,
    }
}

/// Keyboard shortcuts shown in the footer for the current focus and state.
pub fn shortcuts(focus: Focus, state: &SubmissionState, can_submit: bool) -> &'static str {
    match (focus, state) {
        (Focus::Result, _) => "[1-4/←→] Section  [j/k] Scroll  [y] Copy  [e] Export  [Esc] Edit  [q] Quit",
        (Focus::Input, SubmissionState::Loading) => "[Ctrl+C] Quit",
        (Focus::Input, SubmissionState::Succeeded { .. }) if can_submit => {
            "[Enter] Translate  [Tab] Results  [Ctrl+U] Clear  [Ctrl+C] Quit"
        }
        (Focus::Input, SubmissionState::Succeeded { .. }) => {
            "[Tab] Results  [Ctrl+U] Clear  [Ctrl+C] Quit"
        }
        (Focus::Input, _) if can_submit => "[Enter] Translate  [Ctrl+U] Clear  [Ctrl+C] Quit",
        (Focus::Input, _) => "[Ctrl+U] Clear  [Ctrl+C] Quit",
    }
}

/// Draw the main UI.
pub fn draw_ui(f: &mut Frame, app: &mut App) {
    app.frame_count = app.frame_count.wrapping_add(1);

    let area = f.area();
    let input_width = area.width.saturating_sub(2);
    let (input_rows, cursor) = app.input.layout(input_width);
    let content_rows = u16::try_from(input_rows.len())
        .unwrap_or(u16::MAX)
        .max(cursor.1.saturating_add(1));
    let input_height = content_rows.clamp(1, INPUT_MAX_ROWS) + 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Status bar
            Constraint::Length(input_height), // Requirement input
            Constraint::Min(3),               // Body
            Constraint::Length(1),            // Footer
        ])
        .split(area);

    draw_status_bar(f, app, chunks[0]);
    draw_input(f, app, chunks[1], input_rows, cursor);

    match app.controller.state() {
        SubmissionState::Idle => draw_idle_hint(f, chunks[2]),
        SubmissionState::Loading => draw_loading(f, app, chunks[2]),
        SubmissionState::Failed { message } => draw_error(f, app, chunks[2], message),
        SubmissionState::Succeeded { .. } => draw_result(f, app, chunks[2]),
    }

    draw_footer(f, app, chunks[3]);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let (status_text, status_color) = status_indicator(app.controller.state());
    let status_text = match app.controller.elapsed() {
        Some(elapsed) => format!("{} {}", status_text, format_elapsed(elapsed)),
        None => status_text.to_string(),
    };

    let left = vec![
        Span::styled("bizspec", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(
            app.service_health.label(),
            Style::default().fg(app.service_health.color()),
        ),
        Span::styled(
            format!("  {}", app.config.service.url),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    let left_len: usize = left.iter().map(|s| s.width()).sum();

    let status_dot = "● ";
    let inner_width = area.width.saturating_sub(2) as usize;
    let status_len = status_dot.chars().count() + status_text.chars().count();
    let spacing = inner_width.saturating_sub(left_len + status_len);

    let mut spans = left;
    spans.push(Span::raw(" ".repeat(spacing)));
    spans.push(Span::styled(status_dot, Style::default().fg(status_color)));
    spans.push(Span::styled(status_text, Style::default().fg(status_color)));

    let panel = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(Line::from(format!(" {} ", app.session_id)).right_aligned()),
    );
    f.render_widget(panel, area);
}

fn draw_input(f: &mut Frame, app: &App, area: Rect, rows: Vec<String>, cursor: (u16, u16)) {
    let loading = app.controller.state().is_loading();
    let focused = app.focus == Focus::Input;
    let validation = app.controller.validation();

    // Keep the cursor row in view when the text is taller than the panel
    let visible_rows = area.height.saturating_sub(2);
    let row_offset = cursor.1.saturating_add(1).saturating_sub(visible_rows);

    let text_style = if loading {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    let lines: Vec<Line> = rows
        .into_iter()
        .skip(row_offset as usize)
        .map(|r| Line::styled(r, text_style))
        .collect();

    let border_color = if focused && !loading {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if focused {
            BorderType::Double
        } else {
            BorderType::Rounded
        })
        .border_style(Style::default().fg(border_color))
        .title(Line::from(" Business requirement ").left_aligned())
        .title_bottom(
            Line::from(Span::styled(
                format!(" {} ", validation.message()),
                Style::default().fg(validation_color(validation)),
            ))
            .right_aligned(),
        );

    f.render_widget(Paragraph::new(lines).block(block), area);

    if focused && !loading {
        let x = area.x + 1 + cursor.0;
        let y = area.y + 1 + (cursor.1 - row_offset);
        if x < area.right().saturating_sub(1) && y < area.bottom().saturating_sub(1) {
            f.set_cursor_position((x, y));
        }
    }
}

fn draw_idle_hint(f: &mut Frame, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::styled("Describe a feature in plain language and press Enter.", dim),
        Line::raw(""),
        Line::styled("The translation service will produce:", dim),
    ];
    for section in Section::ALL {
        lines.push(Line::styled(format!("  • {}", section.title()), dim));
    }
    let hint = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).border_style(dim));
    f.render_widget(hint, area);
}

fn draw_loading(f: &mut Frame, app: &App, area: Rect) {
    let spinner = SPINNER[(app.frame_count / 3) as usize % SPINNER.len()];
    let elapsed = app
        .controller
        .elapsed()
        .map(format_elapsed)
        .unwrap_or_default();

    let lines = vec![
        Line::raw(""),
        Line::from(vec![
            Span::styled(spinner, Style::default().fg(Color::Yellow)),
            Span::styled(
                " Analyzing requirement...",
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ])
        .centered(),
        Line::styled(
            "Generating the specification usually takes 30 to 60 seconds",
            Style::default().fg(Color::DarkGray),
        )
        .centered(),
        Line::styled(elapsed, Style::default().fg(Color::DarkGray)).centered(),
    ];

    let panel = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(panel, area);
}

fn draw_error(f: &mut Frame, app: &App, area: Rect, message: &str) {
    let lines = vec![
        Line::styled(
            "Translation failed",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::styled(message.to_string(), Style::default().fg(Color::LightRed)),
        Line::raw(""),
        Line::styled(
            format!(
                "Hint: the translation service may be unreachable. Check that it is running at {}",
                app.config.service.url
            ),
            Style::default().fg(Color::DarkGray),
        ),
        Line::styled(
            "Press Enter to try again.",
            Style::default().fg(Color::DarkGray),
        ),
    ];

    let banner = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(Color::Red)),
    );
    f.render_widget(banner, area);
}

fn draw_result(f: &mut Frame, app: &mut App, area: Rect) {
    let Some(selection) = app.viewer.selection() else {
        return;
    };
    let focused = app.focus == Focus::Result;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let titles: Vec<Line> = Section::ALL
        .iter()
        .map(|s| Line::from(format!(" {} {} ", s.index() + 1, s.label())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(selection.index())
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(if focused { Color::Cyan } else { Color::Gray })
                .add_modifier(Modifier::BOLD),
        )
        .divider("│");
    f.render_widget(tabs, chunks[0]);

    let content_area = chunks[1];
    app.result_pane_height = content_area.height.saturating_sub(2);
    app.result_pane_width = content_area.width.saturating_sub(2);
    app.scroll_offset = app.scroll_offset.min(app.max_scroll());

    let content = app
        .viewer
        .visible_content(app.controller.state())
        .unwrap_or_default();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if focused {
            BorderType::Double
        } else {
            BorderType::Rounded
        })
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::Gray }))
        .title(Line::from(format!(" {} ", selection.title())).left_aligned());

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset, 0));
    f.render_widget(paragraph, content_area);

    let visual_lines = app.visual_line_count();
    if visual_lines > app.result_pane_height {
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"));
        let mut scrollbar_state = ScrollbarState::default()
            .content_length(visual_lines as usize)
            .position(app.scroll_offset as usize)
            .viewport_content_length(app.result_pane_height as usize);
        f.render_stateful_widget(scrollbar, content_area, &mut scrollbar_state);
    }
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let keys = shortcuts(app.focus, app.controller.state(), app.controller.can_submit());
    let mut spans = vec![Span::styled(keys, Style::default().fg(Color::DarkGray))];

    if let Some((notice, _)) = &app.notice {
        let message = notice.message();
        let color = if notice.is_error() {
            Color::Red
        } else {
            Color::Green
        };
        let used = keys.chars().count() + message.chars().count();
        let spacing = (area.width as usize).saturating_sub(used);
        spans.push(Span::raw(" ".repeat(spacing)));
        spans.push(Span::styled(message, Style::default().fg(color)));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::client::TranslateError;
    use crate::config::Config;
    use crate::submission::testing::{FakeBackend, sample_result};

    fn render(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw_ui(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app_with_input(text: &str) -> App {
        let mut app = App::new("abc123".to_string(), Config::default());
        app.paste(text);
        app
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0:00");
        assert_eq!(format_elapsed(Duration::from_secs(45)), "0:45");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2:05");
        assert_eq!(format_elapsed(Duration::from_secs(3661)), "1:01:01");
    }

    #[test]
    fn test_status_indicator() {
        assert_eq!(status_indicator(&SubmissionState::Idle).0, "IDLE");
        assert_eq!(status_indicator(&SubmissionState::Loading).0, "TRANSLATING");
        assert_eq!(
            status_indicator(&SubmissionState::Failed {
                message: "x".to_string()
            })
            .1,
            Color::Red
        );
    }

    #[test]
    fn test_shortcuts_hide_translate_when_invalid() {
        assert!(!shortcuts(Focus::Input, &SubmissionState::Idle, false).contains("Translate"));
        assert!(shortcuts(Focus::Input, &SubmissionState::Idle, true).contains("Translate"));
        assert!(!shortcuts(Focus::Input, &SubmissionState::Loading, false).contains("Translate"));
    }

    #[test]
    fn test_render_validation_feedback() {
        let screen = render(&mut app_with_input("short"));
        assert!(screen.contains("currently 5"));

        let screen = render(&mut app_with_input("long enough requirement"));
        assert!(screen.contains("Ready to translate"));
    }

    #[test]
    fn test_render_loading_panel() {
        let backend = FakeBackend::default();
        let mut app = app_with_input("long enough requirement");
        app.submit(&backend);

        let screen = render(&mut app);
        assert!(screen.contains("Analyzing requirement"));
        assert!(screen.contains("TRANSLATING"));
    }

    #[test]
    fn test_render_error_banner_with_hint() {
        let backend = FakeBackend::default();
        let mut app = app_with_input("long enough requirement");
        app.submit(&backend);
        backend.respond(Err(TranslateError::Remote {
            status: 500,
            detail: Some("model overloaded".to_string()),
        }));
        app.poll();

        let screen = render(&mut app);
        assert!(screen.contains("model overloaded"));
        assert!(screen.contains("may be unreachable"));
    }

    #[test]
    fn test_render_result_tabs() {
        let backend = FakeBackend::default();
        let mut app = app_with_input("long enough requirement");
        app.submit(&backend);
        backend.respond(Ok(sample_result()));
        app.poll();

        let screen = render(&mut app);
        assert!(screen.contains("Tech Spec"));
        assert!(screen.contains("Prototype"));
        assert!(screen.contains("Frontend: cart total calculation"));
    }

    #[test]
    fn test_render_input_taller_than_u16_rows() {
        let mut app = app_with_input(&"\n".repeat(70_000));

        let screen = render(&mut app);
        assert!(screen.contains("Business requirement"));
    }
}
