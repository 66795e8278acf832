//! Kabuscope TUI: five-panel terminal explorer for Tokyo stock prices.
//!
//! Panels:
//! 1. Source: fetch the configured companies or upload a CSV
//! 2. Filter: company, date range, chart type, table toggle, download
//! 3. Chart: close price over time, with a range slider in interactive mode
//! 4. Table: the filtered rows
//! 5. Help: keyboard and mouse reference

mod app;
mod input;
mod theme;
mod ui;

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kabuscope_core::data::{DataProvider, SyntheticProvider, UniverseConfig, YahooProvider};
use kabuscope_core::pipeline::LOADING_MESSAGE;
use kabuscope_core::Session;

use crate::app::AppState;

const LOG_FILE_NAME: &str = "kabuscope.log";

#[derive(Parser)]
#[command(name = "kabuscope-tui", about = "Tokyo stock price explorer in the terminal")]
struct Args {
    /// Universe TOML file. Defaults to <config dir>/kabuscope/universe.toml, then the built-in list.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the offline synthetic provider instead of Yahoo Finance.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Directory for the downloaded CSV and saved chart.
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,

    /// Log filter, e.g. "info" or "kabuscope_core=debug".
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_path = init_logging(&args.log_level)?;

    let config_dir = dirs::config_dir().map(|d| d.join("kabuscope"));
    let universe = UniverseConfig::discover(args.config.as_deref(), config_dir.as_deref())
        .context("loading universe config")?;
    let provider: Box<dyn DataProvider> = if args.synthetic {
        Box::new(SyntheticProvider::new())
    } else {
        Box::new(YahooProvider::new().context("building HTTP client")?)
    };
    info!(
        provider = provider.name(),
        companies = universe.companies.len(),
        log = %log_path.display(),
        "starting"
    );

    let session = Session::new(provider, universe);
    let mut app = AppState::new(session, args.export_dir);

    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen, DisableMouseCapture);
        default_hook(info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("exiting");
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        // 1. Re-run the pipeline if the selection changed.
        if app.needs_refresh {
            if app.will_fetch() {
                app.set_status(LOADING_MESSAGE);
                terminal.draw(|f| ui::draw(f, app))?;
            }
            app.refresh();
        }

        // 2. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => input::handle_key(app, key),
                Event::Mouse(mouse) => input::handle_mouse(app, mouse),
                _ => {}
            }
        }

        // 4. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

/// Send tracing output to a file so it never lands on the alternate screen.
fn init_logging(level: &str) -> Result<PathBuf> {
    let dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kabuscope");
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(LOG_FILE_NAME);
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;

    let filter = EnvFilter::try_new(level).with_context(|| format!("bad log level '{level}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();
    Ok(path)
}
