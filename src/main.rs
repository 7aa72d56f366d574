//! bikedash - Bike Sharing Data Analysis Dashboard
//!
//! A CLI tool that loads a daily bike-sharing dataset once, computes
//! descriptive aggregates (trends, comparisons, distributions) and
//! renders them as a Markdown or JSON dashboard.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing file, schema or parse error, empty dataset, etc.)

mod analysis;
mod cli;
mod config;
mod loader;
mod models;
mod report;

use anyhow::{Context, Result};
use cli::{is_stdout, Args, OutputFormat};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use loader::TableCache;
use models::Table;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("bikedash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("Dashboard failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .bikedash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", config::CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Edit it to customize the data path, output and histogram bins.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load the dataset, render the dashboard and, with --watch, keep
/// re-rendering whenever the data file changes.
fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    if args.watch && is_stdout(&config.report.output) {
        anyhow::bail!("--watch needs an output file, but the configured output is stdout");
    }

    let show_progress = !args.quiet && !is_stdout(&config.report.output);
    let mut cache = TableCache::new();

    // Load failures at startup abort the run.
    let mut current = render(&config, &mut cache, None, show_progress)?;

    if !args.watch {
        return Ok(());
    }

    let interval = Duration::from_secs(config.watch.poll_interval_seconds.max(1));
    println!(
        "\n👀 Watching {} every {}s (Ctrl+C to stop)...",
        config.data.path.display(),
        interval.as_secs()
    );

    loop {
        std::thread::sleep(interval);

        match render(&config, &mut cache, Some(&current), show_progress) {
            Ok(table) => current = table,
            Err(e) => warn!("Keeping previous dashboard: {:#}", e),
        }
    }
}

/// Render one dashboard pass. Skips rendering when the cached table is the
/// same one `previous` points at.
fn render(
    config: &Config,
    cache: &mut TableCache,
    previous: Option<&Arc<Table>>,
    show_progress: bool,
) -> Result<Arc<Table>> {
    let data_path = &config.data.path;
    let table = cache
        .get_or_load(data_path)
        .with_context(|| format!("Failed to load dataset {}", data_path.display()))?;

    if previous.is_some_and(|prev| Arc::ptr_eq(prev, &table)) {
        debug!("Dataset unchanged; skipping render");
        return Ok(table);
    }

    let start_time = Instant::now();
    info!("Loaded {} rows from {}", table.len(), data_path.display());

    let progress = make_progress_bar(show_progress);
    let dashboard = analysis::build_dashboard(
        &table,
        &data_path.display().to_string(),
        &config.dashboard_options(),
        &progress,
    );
    progress.finish_and_clear();

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Markdown => report::generate_markdown_report(&dashboard),
    };

    write_output(&config.report.output, &output)?;

    if show_progress {
        let stats = &dashboard.user_statistics;
        println!("\n📊 Dashboard Summary:");
        println!("   Rows: {}", dashboard.metadata.rows);
        if let (Some(first), Some(last)) = (dashboard.metadata.first_date, dashboard.metadata.last_date) {
            println!("   Dates: {} to {}", first, last);
        }
        println!(
            "   Registered total: {} | Casual total: {}",
            stats.registered.sum, stats.casual.sum
        );
        println!("   Duration: {:.2}s", start_time.elapsed().as_secs_f64());
        println!(
            "\n✅ Dashboard saved to: {}",
            config.report.output.display()
        );
    }

    Ok(table)
}

fn make_progress_bar(show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(analysis::DASHBOARD_STEPS);
    match ProgressStyle::default_bar().template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}") {
        Ok(style) => pb.set_style(style.progress_chars("#>-")),
        Err(e) => debug!("Falling back to default progress style: {}", e),
    }
    pb
}

/// Write the rendered dashboard to a file, or stdout for `-`.
fn write_output(path: &Path, content: &str) -> Result<()> {
    if is_stdout(path) {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(content.as_bytes())
            .context("Failed to write dashboard to stdout")?;
        return Ok(());
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write dashboard to {}", path.display()))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
