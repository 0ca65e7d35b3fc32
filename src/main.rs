use std::{
    fs::{File, OpenOptions},
    io::{self, BufReader},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use telemetry_scope::{
    app::App,
    config::Config,
    constants::DEMO_PERIOD_MS,
    snapshot::{spawn_demo_feed, spawn_json_reader, SharedSource},
    ui,
};

/// Terminal dashboard for drift and thought-rate telemetry.
#[derive(Parser, Debug)]
#[command(name = "telemetry_scope", version)]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON-lines telemetry input, `-` for stdin
    #[arg(long, conflicts_with = "demo")]
    input: Option<PathBuf>,

    /// Use the built-in synthetic telemetry feed
    #[arg(long)]
    demo: bool,

    /// Log file (the terminal is taken by the dashboard)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: &Path, level: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref()).context("loading configuration")?;

    let log_file = cli.log_file.clone().unwrap_or_else(|| config.log_file.clone());
    init_logging(&log_file, &config.log_level)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || shutdown.store(true, Ordering::Relaxed)).context("installing signal handler")?;
    }

    let source = SharedSource::new();
    let source_label = match (&cli.input, cli.demo) {
        (Some(path), _) if path.as_os_str() == "-" => {
            spawn_json_reader(BufReader::new(io::stdin()), source.clone());
            "stdin".to_string()
        }
        (Some(path), _) => {
            let file = File::open(path).with_context(|| format!("opening telemetry input {}", path.display()))?;
            spawn_json_reader(BufReader::new(file), source.clone());
            path.display().to_string()
        }
        (None, true) => {
            spawn_demo_feed(source.clone(), Duration::from_millis(DEMO_PERIOD_MS), Arc::clone(&shutdown));
            "demo".to_string()
        }
        (None, false) => bail!("no telemetry source: pass --input <path> or --demo"),
    };
    info!(source = %source_label, ?config, "starting dashboard");

    let app = App::new(&config, source).context("building panels")?;
    ui::run(app, Duration::from_millis(config.frame_interval_ms), Arc::clone(&shutdown), &source_label)?;

    shutdown.store(true, Ordering::Relaxed);
    info!("dashboard closed");
    Ok(())
}
