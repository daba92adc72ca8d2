//! Plate - terminal UI for local database containers.
//!
//! This is the entry point for the `plate` binary.

mod app;
mod clipboard;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use plate_control::{Dispatcher, Intent};
use plate_core::{PlateConfig, DEFAULT_CONFIG_PATH};
use plate_gateway::{CommandGateway, DockerGateway, GatewayConfig};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use app::{App, TICK_INTERVAL};
use ui::Theme;

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "plate=debug,plate_control=debug,plate_gateway=debug,warn";

/// Plate - provision and supervise local database containers.
#[derive(Parser, Debug)]
#[command(name = "plate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the services file.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Container CLI binary.
    #[arg(long, env = "PLATE_DOCKER_BIN", default_value = "docker")]
    docker_bin: String,

    /// Deadline for container commands, in seconds.
    #[arg(long, env = "PLATE_COMMAND_TIMEOUT", default_value_t = 120)]
    command_timeout: u64,

    /// Deadline for image pulls, in seconds.
    #[arg(long, env = "PLATE_PULL_TIMEOUT", default_value_t = 600)]
    pull_timeout: u64,

    /// Enable debug logging.
    #[arg(long, default_value = "false")]
    debug: bool,

    /// Log file, written only when logging is enabled.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            docker_bin: self.docker_bin.clone(),
            command_timeout_seconds: self.command_timeout,
            pull_timeout_seconds: self.pull_timeout,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    // Configuration errors are fatal before the terminal is touched.
    let config = match PlateConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(
        path = %args.config.display(),
        services = config.len(),
        "Loaded configuration"
    );

    let gateway = Arc::new(DockerGateway::new(args.gateway_config()));
    let dispatcher = Dispatcher::new(config.services, gateway);
    let mut app = App::new(dispatcher, args.config.display().to_string());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.start();

    let result = run_event_loop(&mut terminal, &mut app, &Theme::default()).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Install the file logger when `--debug` or `--log-file` is given.
fn init_logging(args: &Args) -> anyhow::Result<()> {
    if !args.debug && args.log_file.is_none() {
        return Ok(());
    }

    let path = args
        .log_file
        .clone()
        .unwrap_or_else(|| PathBuf::from("plate.log"));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

/// Main event loop.
///
/// Redraws after every terminal event, command completion, and spinner tick,
/// and returns once every running container has been stopped.
async fn run_event_loop<G: CommandGateway + 'static>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<G>,
    theme: &Theme,
) -> anyhow::Result<()> {
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(TICK_INTERVAL);

    loop {
        terminal.draw(|f| ui::render(f, app, theme))?;

        tokio::select! {
            _ = tick.tick() => {
                app.tick();
            }

            Some(completion) = app.dispatcher.next_completion() => {
                app.apply(completion);
            }

            event = events.next() => {
                match event {
                    Some(Ok(Event::Key(key))) => handle_key(app, key),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Terminal event error");
                        app.quit();
                    }
                    None => app.quit(),
                }
            }
        }

        if app.is_finished() {
            break;
        }
    }

    Ok(())
}

/// Map a key press to an app action.
fn handle_key<G: CommandGateway + 'static>(app: &mut App<G>, key: KeyEvent) {
    if key.kind != KeyEventKind::Press || app.is_quitting() {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('c') {
            app.quit();
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Char('s') => app.send(Intent::Stop),
        KeyCode::Char('b') => app.send(Intent::Boot),
        KeyCode::Char('r') => app.send(Intent::RequestReset),
        KeyCode::Char('d') => app.send(Intent::RequestDelete),
        KeyCode::Char('y' | 'Y') => app.send(Intent::Confirm),
        KeyCode::Char('n' | 'N') | KeyCode::Esc => app.send(Intent::Cancel),
        KeyCode::Char('c') => {
            app.copy_selected(&mut io::stdout());
        }
        _ => {}
    }
}
