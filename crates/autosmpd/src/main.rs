//! autosmpd — the autosmp daemon.
//!
//! Single binary that assembles:
//! - A platform backend (Linux sysfs or the in-memory simulator)
//! - The hotplug governor worker
//! - The operator REST API
//! - Suspend/resume signal wiring
//!
//! # Usage
//!
//! ```text
//! autosmpd run --config /etc/autosmp.toml --listen 127.0.0.1:7878
//! autosmpd run --backend sim --sim-cores 8 --startup-delay-ms 0 --no-api
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use autosmp_core::config::ApiConfig;
use autosmp_core::{AutosmpConfig, BackendConfig};
use autosmp_governor::GovernorOptions;
use autosmp_platform::format_cpu_list;
use autosmpd::{backend, operator, signals};

#[derive(Parser)]
#[command(name = "autosmpd", about = "Load-driven CPU core hotplug daemon")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendKind {
    Sysfs,
    Sim,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Path to an autosmp.toml file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Platform backend, overriding the config file.
    #[arg(long, value_enum)]
    backend: Option<BackendKind>,

    /// cpu directory for the sysfs backend.
    #[arg(long)]
    sysfs_root: Option<PathBuf>,

    /// Core count for the sim backend.
    #[arg(long, default_value = "4")]
    sim_cores: u32,

    /// Address for the operator API (default 127.0.0.1:7878).
    #[arg(long, conflicts_with = "no_api")]
    listen: Option<SocketAddr>,

    /// Do not start the operator API.
    #[arg(long)]
    no_api: bool,

    /// Delay before the first tick, in milliseconds.
    #[arg(long)]
    startup_delay_ms: Option<u64>,

    /// Start with the governor disabled.
    #[arg(long)]
    disabled: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run the governor until interrupted.
    Run(RunArgs),

    /// Print the effective configuration as TOML.
    PrintConfig(RunArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Run(args) => run(load_config(&args)?).await,
        Command::PrintConfig(args) => {
            print!("{}", load_config(&args)?.to_toml_string()?);
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,autosmpd=debug,autosmp=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Merge the config file (if any) with CLI overrides.
fn load_config(args: &RunArgs) -> anyhow::Result<AutosmpConfig> {
    let mut config = match &args.config {
        Some(path) => AutosmpConfig::from_file(path)?,
        None => AutosmpConfig::default(),
    };

    match args.backend {
        Some(BackendKind::Sim) => {
            config.backend = Some(BackendConfig::Sim {
                cores: args.sim_cores,
                max_rate: None,
            });
        }
        Some(BackendKind::Sysfs) => {
            config.backend = Some(BackendConfig::Sysfs {
                root: args.sysfs_root.clone(),
            });
        }
        None => {
            if let Some(root) = &args.sysfs_root {
                config.backend = Some(BackendConfig::Sysfs {
                    root: Some(root.clone()),
                });
            }
        }
    }
    if let Some(listen) = args.listen {
        config.api.get_or_insert_with(ApiConfig::default).listen = Some(listen);
    }
    if args.no_api {
        config.api.get_or_insert_with(ApiConfig::default).enabled = Some(false);
    }
    if let Some(delay) = args.startup_delay_ms {
        config.startup_delay_ms = Some(delay);
    }
    if args.disabled {
        config.enabled = Some(false);
    }
    Ok(config)
}

async fn run(config: AutosmpConfig) -> anyhow::Result<()> {
    info!("autosmp daemon starting");

    // ── Platform ───────────────────────────────────────────────

    let backend = backend::build(&config.backend())?;
    let present = backend.cores.present_set()?;
    info!(
        backend = backend.name,
        present = %format_cpu_list(&present),
        "platform backend ready"
    );

    // ── Governor ───────────────────────────────────────────────

    let options = GovernorOptions {
        tunables: config.initial_tunables(present.len() as u32),
        enabled: config.enabled(),
        startup_delay: Duration::from_millis(config.startup_delay_ms()),
    };
    let (governor, worker) =
        autosmp_governor::spawn(backend.oracle.clone(), backend.cores.clone(), options)?;
    info!(enabled = governor.enabled(), "governor initialized");

    // ── Operator API ───────────────────────────────────────────

    let api_handle = match config.listen_addr() {
        Some(addr) => operator::spawn_api(addr, governor.clone()).await,
        None => {
            info!("operator API disabled");
            None
        }
    };

    // ── Signals ────────────────────────────────────────────────

    let signal_handle = signals::spawn_forwarder(governor.clone());

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    governor.shutdown()?;
    let _ = worker.await;
    if let Some(handle) = signal_handle {
        handle.abort();
    }
    if let Some(handle) = api_handle {
        handle.abort();
    }

    info!("autosmp daemon stopped");
    Ok(())
}
