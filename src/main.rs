//! beacond — run configured beacons and print their events
//!
//! Usage:
//!   beacond run                     → one pass per interval until Ctrl-C
//!   beacond once                    → a single pass
//!   beacond validate                → check every beacon config, run nothing
//!   beacond modules                 → list registered modules
//!   beacond version                 → show version

use beacond::{write_events, Agent};
use beacond_core::config::load_beacons;
use beacond_core::AgentConfig;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(
    name = "beacond",
    about = "Host beacon agent — turns configured checks into tagged events",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to agent config file (TOML)
    #[arg(short, long, global = true, default_value = "/etc/beacond/beacond.toml")]
    config: PathBuf,

    /// Beacon file (.toml or .json) replacing the config's [beacons] table
    #[arg(short, long, global = true)]
    beacons: Option<PathBuf>,

    /// Write logs to a file (in addition to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log to stderr as JSON
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run passes on an interval until interrupted
    Run {
        /// Seconds between passes (overrides loop_interval_secs)
        #[arg(short, long)]
        interval: Option<u64>,
    },
    /// Run a single pass
    Once,
    /// Validate beacon configs without running them
    Validate,
    /// List registered beacon modules
    Modules,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("beacond v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let _log_guard = init_tracing(cli.json_logs, cli.log_file.as_deref())?;

    let config = AgentConfig::load(&cli.config);
    let mut agent = Agent::from_config(&config);
    if let Some(path) = &cli.beacons {
        agent.set_beacons(load_beacons(path)?);
        tracing::info!("Loaded beacons from {}", path.display());
    }

    match cli.command {
        Commands::Run { interval } => {
            if let Some(secs) = interval {
                agent.set_interval(Duration::from_secs(secs.max(1)));
            }
            let cancel = CancellationToken::new();
            let shutdown = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Shutdown requested");
                    shutdown.cancel();
                }
            });
            let mut stdout = std::io::stdout().lock();
            agent.run(&mut stdout, &cancel, None).await?;
        }

        Commands::Once => {
            let events = agent.run_once().await;
            write_events(&mut std::io::stdout().lock(), &events)?;
        }

        Commands::Validate => {
            let mut invalid = 0usize;
            for (name, outcome) in agent.validate_all().await {
                if outcome.valid {
                    println!("{name}: ok");
                } else {
                    invalid += 1;
                    println!("{name}: {}", outcome.message);
                }
            }
            if invalid > 0 {
                anyhow::bail!("{} beacon(s) have invalid configuration", invalid);
            }
        }

        Commands::Modules => {
            let registry = agent.beacon().registry().snapshot().await;
            for name in registry.list() {
                let validates = registry
                    .resolve(name)
                    .map(|m| m.provides_validate())
                    .unwrap_or(false);
                println!("{name}\tvalidate={validates}");
            }
        }

        Commands::Version => {}
    }

    Ok(())
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "beacond=info,beacond_core=info,beacond_modules=info,beacond_engine=info".into()
    })
}

fn init_tracing(json: bool, log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let stderr_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(default_filter())
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(default_filter())
            .boxed()
    };

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("invalid log file path: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(default_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(guard)
}
