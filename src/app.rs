//! Application state and key handling.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::Color;
use ratatui::widgets::{Paragraph, Wrap};
use tracing::{debug, info};

use crate::client::TranslationBackend;
use crate::config::Config;
use crate::environment::Environment;
use crate::input::InputField;
use crate::model::{HealthStatus, Section};
use crate::submission::{SubmissionController, SubmissionState};
use crate::viewer::{Notice, ResultViewer};

/// How long a copy/export notice stays on screen.
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);

/// Which panel receives key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// Requirement editor (default).
    #[default]
    Input,
    /// Tabbed result viewer.
    Result,
}

/// Reachability of the translation service, as seen by the startup probe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServiceHealth {
    #[default]
    Unknown,
    Up {
        version: Option<String>,
    },
    Down,
}

impl ServiceHealth {
    pub fn label(&self) -> String {
        match self {
            ServiceHealth::Unknown => "service: checking".to_string(),
            ServiceHealth::Up { version: Some(v) } => format!("service: ok v{}", v),
            ServiceHealth::Up { version: None } => "service: ok".to_string(),
            ServiceHealth::Down => "service: unreachable".to_string(),
        }
    }

    pub fn color(&self) -> Color {
        match self {
            ServiceHealth::Unknown => Color::DarkGray,
            ServiceHealth::Up { .. } => Color::Green,
            ServiceHealth::Down => Color::Red,
        }
    }
}

/// Requested by a key press; the event loop acts on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
}

/// Main application state.
pub struct App {
    pub controller: SubmissionController,
    pub viewer: ResultViewer,
    pub input: InputField,
    pub focus: Focus,
    /// Session ID for this invocation.
    pub session_id: String,
    pub config: Config,
    pub service_health: ServiceHealth,
    pub health_receiver: Option<Receiver<Option<HealthStatus>>>,
    /// Latest copy/export notice and when it was raised.
    pub notice: Option<(Notice, Instant)>,
    pub scroll_offset: u16,
    pub result_pane_height: u16,
    pub result_pane_width: u16,
    /// Frame counter for animations (incremented each render cycle).
    pub frame_count: u64,
}

impl App {
    pub fn new(session_id: String, config: Config) -> Self {
        Self {
            controller: SubmissionController::new(),
            viewer: ResultViewer::new(),
            input: InputField::default(),
            focus: Focus::default(),
            session_id,
            config,
            service_health: ServiceHealth::default(),
            health_receiver: None,
            notice: None,
            scroll_offset: 0,
            result_pane_height: 0,
            result_pane_width: 0,
            frame_count: 0,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        self.controller.state()
    }

    /// Pushes the editor text into the controller after every edit.
    fn sync_input(&mut self) {
        self.controller.update_input(self.input.text());
    }

    /// Lets the viewer follow the controller; resets scroll when a new result appears.
    fn sync_viewer(&mut self) {
        let changed = self
            .viewer
            .observe(self.controller.state(), self.controller.submission_id());
        if changed {
            self.scroll_offset = 0;
            self.focus = if self.viewer.selection().is_some() {
                Focus::Result
            } else {
                Focus::Input
            };
        }
    }

    /// Submits the current input if allowed.
    pub fn submit(&mut self, backend: &dyn TranslationBackend) {
        match self.controller.submit(backend) {
            Ok(()) => {
                self.notice = None;
                self.sync_viewer();
            }
            Err(reason) => debug!(reason = %reason, "submit_ignored"),
        }
    }

    /// Drains background channels. Called on every tick.
    pub fn poll(&mut self) {
        if self.controller.poll() {
            self.sync_viewer();
        }
        self.poll_health();
        if let Some((_, raised)) = &self.notice
            && raised.elapsed() >= NOTICE_DURATION
        {
            self.notice = None;
        }
    }

    fn poll_health(&mut self) {
        let Some(rx) = &self.health_receiver else {
            return;
        };
        let health = match rx.try_recv() {
            Ok(Some(status)) => ServiceHealth::Up {
                version: status.version,
            },
            Ok(None) | Err(TryRecvError::Disconnected) => ServiceHealth::Down,
            Err(TryRecvError::Empty) => return,
        };
        info!(health = %health.label(), "service_health");
        self.service_health = health;
        self.health_receiver = None;
    }

    fn show_notice(&mut self, notice: Notice) {
        self.notice = Some((notice, Instant::now()));
    }

    pub fn select_section(&mut self, section: Section) {
        if self.viewer.selection() != Some(section) {
            self.viewer.select_section(section);
            self.scroll_offset = 0;
        }
    }

    pub fn copy_visible(&mut self, env: &mut dyn Environment) {
        let notice = self.viewer.copy_visible_content(self.controller.state(), env);
        self.show_notice(notice);
    }

    pub fn export(&mut self, env: &mut dyn Environment) {
        let notice = self.viewer.export_all(self.controller.state(), env);
        self.show_notice(notice);
    }

    /// Wrapped line count of the visible section at the current pane width.
    pub fn visual_line_count(&self) -> u16 {
        if self.result_pane_width == 0 {
            return 0;
        }
        let Some(content) = self.viewer.visible_content(self.controller.state()) else {
            return 0;
        };
        let paragraph = Paragraph::new(content).wrap(Wrap { trim: false });
        u16::try_from(paragraph.line_count(self.result_pane_width)).unwrap_or(u16::MAX)
    }

    pub fn max_scroll(&self) -> u16 {
        self.visual_line_count()
            .saturating_sub(self.result_pane_height)
    }

    pub fn scroll_up(&mut self, amount: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: u16) {
        let max = self.max_scroll();
        self.scroll_offset = self.scroll_offset.saturating_add(amount).min(max);
    }

    /// Handles one key press.
    pub fn handle_key(
        &mut self,
        key: KeyEvent,
        backend: &dyn TranslationBackend,
        env: &mut dyn Environment,
    ) -> Action {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }

        if key.code == KeyCode::Tab || key.code == KeyCode::BackTab {
            self.toggle_focus();
            return Action::None;
        }

        match self.focus {
            Focus::Input => self.handle_input_key(key, backend),
            Focus::Result => return self.handle_result_key(key, env),
        }
        Action::None
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input if self.viewer.selection().is_some() => Focus::Result,
            _ => Focus::Input,
        };
    }

    fn handle_input_key(&mut self, key: KeyEvent, backend: &dyn TranslationBackend) {
        if key.code == KeyCode::Enter {
            self.submit(backend);
            return;
        }

        // The editor is read-only while a translation is in flight
        if self.controller.state().is_loading() {
            return;
        }

        match key.code {
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.clear()
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.insert_char(c)
            }
            KeyCode::Backspace => self.input.delete_char_before(),
            KeyCode::Delete => self.input.delete_char_at(),
            KeyCode::Left => self.input.cursor_left(),
            KeyCode::Right => self.input.cursor_right(),
            KeyCode::Home => self.input.cursor_home(),
            KeyCode::End => self.input.cursor_end(),
            _ => return,
        }
        self.sync_input();
    }

    /// Inserts pasted text into the editor.
    pub fn paste(&mut self, text: &str) {
        if self.focus != Focus::Input || self.controller.state().is_loading() {
            return;
        }
        self.input.insert_str(text);
        self.sync_input();
    }

    fn handle_result_key(&mut self, key: KeyEvent, env: &mut dyn Environment) -> Action {
        match key.code {
            KeyCode::Char('q') => return Action::Quit,
            KeyCode::Esc => self.focus = Focus::Input,
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                if let Some(section) = Section::from_index(index) {
                    self.select_section(section);
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.viewer.select_next();
                self.scroll_offset = 0;
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.viewer.select_prev();
                self.scroll_offset = 0;
            }
            KeyCode::Char('j') | KeyCode::Down => self.scroll_down(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_up(1),
            KeyCode::PageDown => self.scroll_down(self.result_pane_height),
            KeyCode::PageUp => self.scroll_up(self.result_pane_height),
            KeyCode::Char('y') => self.copy_visible(env),
            KeyCode::Char('e') => self.export(env),
            _ => {}
        }
        Action::None
    }
}
