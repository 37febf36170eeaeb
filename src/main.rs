//! memtui - interactive terminal browser and editor for memcached
#![allow(clippy::print_stderr)]

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use memtui::config::{Config, LogFormat};
use tracing::{error, info};

/// memtui - browse and edit the keys of a memcached server
#[derive(Parser, Debug)]
#[command(name = "memtui")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server address host:port (overrides config file)
    #[arg(long = "addr", value_name = "HOST:PORT", env = "MEMTUI_ADDR")]
    addr: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error (overrides config file)
    #[arg(
        short = 'l',
        long = "log-level",
        value_name = "LEVEL",
        env = "MEMTUI_LOG_LEVEL"
    )]
    loglevel: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("memtui: {}", e);
            return ExitCode::from(1);
        }
    };

    init_logging(&config);
    info!(version = env!("CARGO_PKG_VERSION"), addr = %config.server.addr, "starting memtui");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("memtui: failed to start runtime: {}", e);
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(memtui::tui::run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "terminal error");
            eprintln!("memtui: {}", e);
            ExitCode::from(1)
        }
    }
}

fn load_config(cli: &Cli) -> memtui::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(addr) = &cli.addr {
        config.server.addr = addr.clone();
    }
    if let Some(level) = &cli.loglevel {
        config.logging.level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Log to a file; the terminal belongs to the UI. Logging is skipped when
/// the file cannot be opened.
fn init_logging(config: &Config) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let Some(path) = config.logging.resolved_file() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let writer = Mutex::new(file);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    // a subscriber already being set is not an error worth reporting
    let _ = match config.logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_ansi(false).with_writer(writer))
            .try_init(),
    };
}
