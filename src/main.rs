mod app;
mod client;
mod config;
mod environment;
mod input;
mod logging;
mod model;
mod submission;
mod ui;
mod viewer;

use std::io::{self, Write};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, Event, EventStream, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use ratatui::{DefaultTerminal, Terminal};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::app::{Action, App};
use crate::client::HttpBackend;
use crate::config::{Config, ConfigLoadStatus};
use crate::environment::TerminalEnvironment;
use crate::model::Section;
use crate::submission::SubmissionController;
use crate::ui::draw_ui;
use crate::viewer::export_document;

/// Redraw and channel-polling interval.
const TICK: Duration = Duration::from_millis(50);

/// Turn business requirements into technical specs, feasibility, estimates and prototype code.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Base URL of the translation service (overrides config)
    #[arg(long)]
    url: Option<String>,

    /// Directory the export file is written to (overrides config)
    #[arg(long)]
    export_dir: Option<String>,

    /// Translate this requirement without the TUI and print the export document
    #[arg(long, value_name = "REQUIREMENT")]
    print: Option<String>,

    /// With --print, output only this section (technical_spec, feasibility, estimation, prototype_code)
    #[arg(long, value_name = "ID", value_parser = parse_section, requires = "print")]
    section: Option<Section>,
}

fn parse_section(id: &str) -> Result<Section, String> {
    Section::from_id(id)
        .ok_or_else(|| format!("expected one of: {}", Section::ALL.map(Section::id).join(", ")))
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.service.url = url.clone();
        }
        if let Some(dir) = &self.export_dir {
            config.export.directory = dir.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    // Initialize logging before anything else
    let logging_ctx = match logging::init() {
        Ok(ctx) => {
            logging::cleanup_old_logs(&ctx.log_directory);
            Some(ctx)
        }
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            None
        }
    };
    let session_id = logging_ctx
        .as_ref()
        .map(|ctx| ctx.session_id.clone())
        .unwrap_or_else(logging::generate_session_id);

    let loaded = config::load_config();
    let mut config = loaded.config;
    cli.apply(&mut config);
    debug!(
        config_path = %loaded.config_path.display(),
        project_config = ?loaded.project_config_path,
        status = ?loaded.status,
        "config_loaded"
    );
    if let ConfigLoadStatus::Error(e) = &loaded.status {
        warn!(error = %e, "config_fallback_to_defaults");
    }

    if let Some(ctx) = &logging_ctx
        && let Err(e) = logging::update_log_level(&ctx.reload_handle, &config.logging.level)
    {
        warn!(error = %e, "log_level_rejected");
    }

    let backend = HttpBackend::new(&config.service.url, config.request_timeout(), Handle::current())?;
    info!(url = %backend.base_url(), "service_configured");

    let code = match &cli.print {
        Some(requirement) => {
            let outcome = run_headless(
                &backend,
                requirement,
                cli.section,
                &mut io::stdout(),
                &mut io::stderr(),
            )
            .await?;
            info!(outcome = ?outcome, "headless_finished");
            outcome.exit_code()
        }
        None => run_tui(&backend, session_id.clone(), config).await?,
    };

    info!(
        session_id = %session_id,
        duration_secs = start_time.elapsed().as_secs_f64(),
        "session_end"
    );

    Ok(code)
}

/// How a headless run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadlessOutcome {
    Translated,
    Failed,
    /// The requirement never left the process.
    Rejected,
}

impl HeadlessOutcome {
    fn code(self) -> u8 {
        match self {
            HeadlessOutcome::Translated => 0,
            HeadlessOutcome::Failed => 1,
            HeadlessOutcome::Rejected => 2,
        }
    }

    fn exit_code(self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

/// Runs one translation without a terminal UI.
///
/// The export document (or the chosen section) goes to `out`; failures go to `err`.
async fn run_headless(
    backend: &HttpBackend,
    requirement: &str,
    section: Option<Section>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<HeadlessOutcome> {
    let mut controller = SubmissionController::new();
    controller.update_input(requirement);

    if let Err(reason) = controller.submit(backend) {
        writeln!(err, "{}: {}", reason, controller.validation().message())?;
        return Ok(HeadlessOutcome::Rejected);
    }

    while !controller.poll() {
        tokio::time::sleep(TICK).await;
    }

    let state = controller.state();
    if let Some(result) = state.result() {
        match section {
            Some(section) => writeln!(out, "{}", section.content(result))?,
            None => writeln!(out, "{}", export_document(result))?,
        }
        return Ok(HeadlessOutcome::Translated);
    }

    writeln!(err, "Error: {}", state.error().unwrap_or_default())?;
    writeln!(
        err,
        "Hint: check that the translation service is running at {}",
        backend.base_url()
    )?;
    Ok(HeadlessOutcome::Failed)
}

async fn run_tui(backend: &HttpBackend, session_id: String, config: Config) -> Result<ExitCode> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let terminal = Terminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

    let result = run_app(terminal, backend, session_id, config).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableBracketedPaste)?;

    result.map(|()| ExitCode::SUCCESS)
}

async fn run_app(
    mut terminal: DefaultTerminal,
    backend: &HttpBackend,
    session_id: String,
    config: Config,
) -> Result<()> {
    let mut env = TerminalEnvironment::new(io::stdout(), config.export_dir());
    debug!(export_dir = %env.export_dir().display(), "environment_ready");
    let mut app = App::new(session_id, config);
    app.health_receiver = Some(backend.probe_health());

    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(TICK);

    loop {
        app.poll();
        terminal.draw(|f| draw_ui(f, &mut app))?;

        tokio::select! {
            _ = ticker.tick() => {}
            maybe_event = events.next() => {
                let event = match maybe_event {
                    Some(event) => event?,
                    None => return Ok(()),
                };
                match event {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if app.handle_key(key, backend, &mut env) == Action::Quit {
                            return Ok(());
                        }
                    }
                    Event::Paste(text) => app.paste(&text),
                    _ => {}
                }
            }
        }
    }
}
