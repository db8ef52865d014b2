use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nb_runner::config::defaults::LOG_FILE_NAME;
use nb_runner::config::Config;
use nb_runner::context::RunnerContext;
use nb_runner::jobs::QueueWatcher;

#[derive(Parser)]
#[command(name = "nb-runner")]
#[command(version)]
#[command(about = "Unattended queue-driven runner for parameterized notebook jobs")]
struct Cli {
    /// Runner configuration file; created with defaults when missing
    #[arg(short, long, default_value = "nb-runner.toml")]
    config: String,

    /// Path to input notebooks
    #[arg(short = 'n', long, value_name = "DIR")]
    nb_path: Option<PathBuf>,

    /// Path to the log folder
    #[arg(short = 'l', long, value_name = "DIR")]
    log_path: Option<PathBuf>,

    /// Path to the root folder for executed notebooks
    #[arg(short = 'o', long, value_name = "DIR")]
    output_path: Option<PathBuf>,

    /// Path to the input queue
    #[arg(short = 'q', long, value_name = "DIR")]
    queue_path: Option<PathBuf>,

    /// Time division for output folders (h, d, m, y)
    #[arg(short = 'd', long, value_name = "CODE")]
    output_div: Option<String>,

    /// Path to the root of the findings store
    #[arg(short = 'f', long, value_name = "DIR")]
    findings_path: Option<PathBuf>,

    /// Time to sleep between queue checks, e.g. "3s"
    #[arg(short = 'i', long, value_name = "DURATION")]
    check_interval: Option<String>,

    /// External configuration file for notebook runs
    #[arg(short = 'e', long, value_name = "FILE")]
    engine_config: Option<PathBuf>,

    /// Path to the configuration folder
    #[arg(long, value_name = "DIR")]
    config_path: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the folder layout for notebook runs
    Config,
    /// Watch the queue folder for job descriptors and run them
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_from_file(&cli.config)?;
    apply_overrides(&mut config, &cli);

    // The guard must live for the whole run so buffered log lines reach
    // the file on shutdown.
    let _guard = init_tracing(&config, &cli.log_level)?;
    info!("Configuration loaded from: {}", cli.config);

    match cli.command {
        Command::Config => create_folders(&config),
        Command::Run => run(&config).await,
    }
}

/// CLI flags override the config file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(nb_path) = &cli.nb_path {
        config.storage.notebook_path = nb_path.clone();
    }
    if let Some(log_path) = &cli.log_path {
        config.storage.log_path = Some(log_path.clone());
    }
    if let Some(output_path) = &cli.output_path {
        config.storage.output_path = output_path.clone();
    }
    if let Some(queue_path) = &cli.queue_path {
        config.storage.queue_path = queue_path.clone();
    }
    if let Some(output_div) = &cli.output_div {
        config.watcher.output_granularity = output_div.clone();
    }
    if let Some(findings_path) = &cli.findings_path {
        config.storage.findings_path = findings_path.clone();
    }
    if let Some(check_interval) = &cli.check_interval {
        config.watcher.check_interval = check_interval.clone();
    }
    if let Some(engine_config) = &cli.engine_config {
        config.engine.external_config = Some(engine_config.clone());
    }
    if let Some(config_path) = &cli.config_path {
        config.storage.config_path = config_path.clone();
    }
}

/// Initialize stdout logging plus the append-only log file when a log
/// folder is configured
fn init_tracing(
    config: &Config,
    log_level: &str,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("nb_runner={log_level}").into());

    let (file_layer, guard) = match &config.storage.log_path {
        Some(log_path) => {
            std::fs::create_dir_all(log_path)
                .with_context(|| format!("failed to create log folder {}", log_path.display()))?;
            let appender = tracing_appender::rolling::never(log_path, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Create the folder layout; idempotent, no other side effects
fn create_folders(config: &Config) -> Result<()> {
    let storage = &config.storage;
    let mut folders = vec![
        &storage.notebook_path,
        &storage.queue_path,
        &storage.output_path,
        &storage.findings_path,
        &storage.config_path,
    ];
    if let Some(log_path) = &storage.log_path {
        folders.push(log_path);
    }
    for folder in folders {
        std::fs::create_dir_all(folder)
            .with_context(|| format!("failed to create folder {}", folder.display()))?;
        info!("Created folder: {}", folder.display());
    }
    Ok(())
}

/// Start the watcher loop
async fn run(config: &Config) -> Result<()> {
    info!("====================");
    info!("nb-runner v{} started", env!("CARGO_PKG_VERSION"));

    let ctx = RunnerContext::from_config(config)?;
    let watcher = QueueWatcher::new(ctx);
    watcher.run().await?;

    info!("nb-runner ended");
    Ok(())
}
