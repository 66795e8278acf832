//! Kabuscope CLI: fetch, export, chart, show and companies commands.
//!
//! Commands:
//! - `fetch`: download every configured company and report failures
//! - `export`: write the filtered subset as CSV
//! - `chart`: render the close-price chart to a PNG file
//! - `show`: print the selection summary and the filtered rows
//! - `companies`: list the universe, or write the default universe file

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kabuscope_core::data::{
    fetch_universe, DataProvider, StdoutProgress, SyntheticProvider, UniverseConfig,
    YahooProvider,
};
use kabuscope_core::render::{render_png, PngOptions, TableView};
use kabuscope_core::{
    ChartMode, DateRange, PipelineError, Selection, Session, SourceChoice, View, ViewOutcome,
    ViewRequest,
};

const PREVIEW_ROWS: usize = 10;

#[derive(Parser)]
#[command(name = "kabuscope", about = "Kabuscope CLI: Tokyo stock price explorer")]
struct Cli {
    /// Log filter, e.g. "info" or "kabuscope_core=debug".
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Source and selection flags shared by every view command.
#[derive(Args, Clone)]
struct ViewArgs {
    /// Universe TOML file. Defaults to <config dir>/kabuscope/universe.toml, then the built-in list.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read this CSV instead of fetching the universe.
    #[arg(long)]
    upload: Option<PathBuf>,

    /// Use the offline synthetic provider instead of Yahoo Finance.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Company to keep. Defaults to the first one in the data.
    #[arg(long)]
    symbol: Option<String>,

    /// Start date (YYYY-MM-DD). Defaults to the first date in the data.
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to the last date in the data.
    #[arg(long, requires = "start")]
    end: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every configured company and report which ones failed.
    Fetch {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Print the summary as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the filtered subset as CSV.
    Export {
        #[command(flatten)]
        view: ViewArgs,

        /// Output file.
        #[arg(long, default_value = "filtered_stock_data.csv")]
        out: PathBuf,
    },
    /// Render the close-price chart of the filtered subset to PNG.
    Chart {
        #[command(flatten)]
        view: ViewArgs,

        /// Output file.
        #[arg(long, default_value = "chart.png")]
        out: PathBuf,

        #[arg(long, default_value_t = 1200)]
        width: u32,

        #[arg(long, default_value_t = 600)]
        height: u32,
    },
    /// Print the selection summary and the filtered rows.
    Show {
        #[command(flatten)]
        view: ViewArgs,

        /// Print every row instead of the first ten.
        #[arg(long, default_value_t = false)]
        full: bool,

        /// Print rows as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List the configured companies.
    Companies {
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the built-in universe to this TOML file and exit.
        #[arg(long)]
        write_default: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Fetch {
            config,
            synthetic,
            json,
        } => run_fetch(config.as_deref(), synthetic, json),
        Commands::Export { view, out } => run_export(&view, &out),
        Commands::Chart {
            view,
            out,
            width,
            height,
        } => run_chart(&view, &out, width, height),
        Commands::Show { view, full, json } => run_show(&view, full, json),
        Commands::Companies {
            config,
            write_default,
        } => run_companies(config.as_deref(), write_default.as_deref()),
    }
}

/// Log to stderr so stdout stays clean for tables and JSON.
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level).with_context(|| format!("bad log level '{level}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn load_universe(explicit: Option<&Path>) -> Result<UniverseConfig> {
    let config_dir = dirs::config_dir().map(|d| d.join("kabuscope"));
    UniverseConfig::discover(explicit, config_dir.as_deref()).context("loading universe config")
}

fn build_provider(synthetic: bool) -> Result<Box<dyn DataProvider>> {
    if synthetic {
        Ok(Box::new(SyntheticProvider::new()))
    } else {
        Ok(Box::new(YahooProvider::new().context("building HTTP client")?))
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("bad date '{s}', expected YYYY-MM-DD"))
}

fn run_fetch(config: Option<&Path>, synthetic: bool, json: bool) -> Result<()> {
    let universe = load_universe(config)?;
    let provider = build_provider(synthetic)?;

    let partial = fetch_universe(provider.as_ref(), &universe, &StdoutProgress)?;
    let summary = partial.summary();
    info!(%summary, rows = partial.dataset.height(), "fetch finished");

    if json {
        let report = serde_json::json!({
            "summary": summary,
            "rows": partial.dataset.height(),
            "failures": partial.failures,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for warning in partial.warnings() {
            eprintln!("{warning}");
        }
        println!("{} rows", partial.dataset.height());
    }

    if partial.is_total_failure() {
        bail!("no company could be loaded");
    }
    Ok(())
}

/// Run the session once for the given flags.
fn build_view(args: &ViewArgs) -> Result<Option<View>> {
    let universe = load_universe(args.config.as_deref())?;
    let provider = build_provider(args.synthetic)?;
    let mut session = Session::new(provider, universe);

    let date_range = match (&args.start, &args.end) {
        (Some(start), Some(end)) => Some(DateRange::new(parse_date(start)?, parse_date(end)?)),
        _ => None,
    };
    let source = match &args.upload {
        Some(path) => SourceChoice::Upload(Some(path.clone())),
        None => SourceChoice::Remote,
    };
    let request = ViewRequest::new(
        source,
        Selection {
            chosen_symbol: args.symbol.clone(),
            date_range,
            chart_mode: ChartMode::Static,
            show_table: false,
        },
    );

    let progress = StdoutProgress;
    match session.run(&request, &progress) {
        Ok(ViewOutcome::Ready(view)) => {
            for warning in &view.warnings {
                warn!("{warning}");
                eprintln!("{warning}");
            }
            if let Some(requested) = &args.symbol {
                if view.chosen_symbol.as_deref() != Some(requested.as_str()) && !view.symbols.is_empty() {
                    eprintln!(
                        "'{requested}' is not in the data, showing {}",
                        view.chosen_symbol.as_deref().unwrap_or("-")
                    );
                }
            }
            Ok(Some(*view))
        }
        Ok(ViewOutcome::AwaitingUpload { prompt }) => {
            eprintln!("{prompt}");
            Ok(None)
        }
        Err(err @ PipelineError::AllSymbolsFailed { .. }) => {
            for warning in err.warnings() {
                eprintln!("{warning}");
            }
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

fn run_export(args: &ViewArgs, out: &Path) -> Result<()> {
    let Some(view) = build_view(args)? else {
        return Ok(());
    };
    std::fs::write(out, &view.export.bytes[..])
        .with_context(|| format!("writing {}", out.display()))?;
    println!(
        "Wrote {} rows ({} bytes, {}) to {}",
        view.filtered.height(),
        view.export.len(),
        view.export.mime,
        out.display()
    );
    Ok(())
}

fn run_chart(args: &ViewArgs, out: &Path, width: u32, height: u32) -> Result<()> {
    let Some(view) = build_view(args)? else {
        return Ok(());
    };
    let options = PngOptions {
        width,
        height,
        ..PngOptions::default()
    };
    render_png(&view.chart, out, options)?;
    println!(
        "{}: {} points written to {}",
        view.chart.title,
        view.chart.len(),
        out.display()
    );
    Ok(())
}

fn run_show(args: &ViewArgs, full: bool, json: bool) -> Result<()> {
    let Some(view) = build_view(args)? else {
        return Ok(());
    };

    if json {
        let report = serde_json::json!({
            "source": view.source_label,
            "symbol": view.chosen_symbol,
            "range": view.range,
            "bounds": view.bounds,
            "warnings": view.warnings,
            "rows": view.filtered.rows()?,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Source:  {}", view.source_label);
    if let Some(notice) = &view.notice {
        println!("         {notice}");
    }
    if !view.symbols.is_empty() {
        println!("Symbols: {}", view.symbols.join(", "));
        println!("Symbol:  {}", view.chosen_symbol.as_deref().unwrap_or("-"));
    }
    match (view.range, view.bounds) {
        (Some(range), Some(bounds)) => println!("Dates:   {range} (available {bounds})"),
        _ => println!("Dates:   no typed Date column, date filter skipped"),
    }
    println!("Rows:    {}", view.filtered.height());
    println!();

    let limit = if full { None } else { Some(PREVIEW_ROWS) };
    let table = TableView::from_dataset(&view.filtered, limit)?;
    print!("{}", table.to_text());
    Ok(())
}

fn run_companies(config: Option<&Path>, write_default: Option<&Path>) -> Result<()> {
    if let Some(path) = write_default {
        let toml = UniverseConfig::tokyo_default().to_toml()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(path, toml).with_context(|| format!("writing {}", path.display()))?;
        println!("Default universe written to {}", path.display());
        return Ok(());
    }

    let universe = load_universe(config)?;
    println!("Window: {} .. {} (end exclusive)", universe.start, universe.end);
    println!();
    println!("{:<20} {:<10}", "Company", "Ticker");
    println!("{}", "-".repeat(31));
    for company in &universe.companies {
        println!("{:<20} {:<10}", company.name, company.ticker);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_show_with_filters() {
        let cli = Cli::try_parse_from([
            "kabuscope",
            "show",
            "--synthetic",
            "--symbol",
            "NINTENDO",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
            "--full",
        ])
        .unwrap();
        match cli.command {
            Commands::Show { view, full, json } => {
                assert!(view.synthetic);
                assert_eq!(view.symbol.as_deref(), Some("NINTENDO"));
                assert_eq!(view.start.as_deref(), Some("2024-01-01"));
                assert!(full);
                assert!(!json);
            }
            _ => panic!("expected show"),
        }
    }

    #[test]
    fn start_requires_end() {
        assert!(Cli::try_parse_from(["kabuscope", "show", "--start", "2024-01-01"]).is_err());
    }

    #[test]
    fn parse_date_rejects_other_formats() {
        assert_eq!(
            parse_date("2024-01-31").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
        assert!(parse_date("31/01/2024").is_err());
    }

    #[test]
    fn synthetic_view_honours_symbol_and_range() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("universe.toml");
        std::fs::write(
            &config,
            r#"
                start = "2024-01-01"
                end = "2024-03-01"

                [[companies]]
                name = "SONY"
                ticker = "6758.T"

                [[companies]]
                name = "NINTENDO"
                ticker = "7974.T"
            "#,
        )
        .unwrap();

        let args = ViewArgs {
            config: Some(config),
            upload: None,
            synthetic: true,
            symbol: Some("NINTENDO".into()),
            start: Some("2024-01-08".into()),
            end: Some("2024-01-12".into()),
        };
        let view = build_view(&args).unwrap().unwrap();
        assert_eq!(view.chosen_symbol.as_deref(), Some("NINTENDO"));
        assert_eq!(view.filtered.height(), 5);
        assert_eq!(view.chart.title, "NINTENDO Stock Price Over Time");
    }

    #[test]
    fn write_default_creates_a_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("universe.toml");
        run_companies(None, Some(&path)).unwrap();
        assert_eq!(
            UniverseConfig::from_file(&path).unwrap(),
            UniverseConfig::tokyo_default()
        );
    }
}
