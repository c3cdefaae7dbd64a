mod cli;
mod config;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use device_inventory::{load_snapshot, Snapshot, SnapshotFiles, SnapshotStore, StaticRegistry};
use host_resolver::SystemResolver;
use serde::Serialize;
use tracing::{error, info};

use crate::cli::{Cli, Command};
use crate::config::{LogFormat, LoggingConfig};

/// Exit status of an `authorize` run that was rejected.
const EXIT_REJECTED: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 1. Parse CLI args.
    let cli = Cli::parse();

    // 2. Load config, then merge CLI overrides.
    let mut cfg = config::load(&cli.config)?;

    if let Some(ref devices) = cli.devices {
        cfg.devices_file = devices.clone();
    }
    if let Some(ref directives) = cli.directives {
        cfg.directives_file = directives.clone();
    }
    if let Some(ref plugin_dir) = cli.plugin_dir {
        cfg.plugin_dir = Some(plugin_dir.clone());
    }

    // 3. Init tracing-subscriber; stdout is reserved for command output.
    init_tracing(&cfg.logging);

    let files = cfg.snapshot_files();
    info!(
        config_file = %cli.config.display(),
        devices_file = %files.devices_file.display(),
        directives_file = %files.directives_file.display(),
        include_builtins = files.include_builtins,
        "glass-gate starting"
    );

    // 4. Platform registry: shipped table plus configured entries.
    let registry = cfg
        .platforms
        .iter()
        .cloned()
        .fold(StaticRegistry::builtin(), StaticRegistry::with_entry);

    // 5. Build the snapshot. Any configuration error is fatal.
    let snapshot = load_snapshot(&files, &registry, &SystemResolver)
        .context("failed to load configuration")?;

    match cli.command {
        Command::Check => {
            print_json(&summary(&snapshot))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Authorize {
            device,
            directive,
            target,
        } => match snapshot.authorize(&device, &directive, &target) {
            Ok(permit) => {
                print_json(&serde_json::json!({
                    "permitted": true,
                    "permit": permit,
                }))?;
                Ok(ExitCode::SUCCESS)
            }
            Err(rejection) => {
                print_json(&serde_json::json!({
                    "permitted": false,
                    "message": rejection.to_string(),
                    "rejection": rejection,
                }))?;
                Ok(ExitCode::from(EXIT_REJECTED))
            }
        },
        Command::Inventory => {
            print_json(&snapshot.export_public_inventory())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Catalog => {
            print_json(&snapshot.export_frontend_catalog())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Watch => {
            watch(SnapshotStore::new(snapshot), Arc::new(files), Arc::new(registry)).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match logging.format {
        LogFormat::Json => builder.json().with_thread_ids(true).init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}

fn summary(snapshot: &Snapshot) -> serde_json::Value {
    let devices = snapshot.devices();
    let builtins = snapshot
        .directives()
        .iter()
        .filter(|d| d.is_builtin())
        .count();
    serde_json::json!({
        "devices": devices.len(),
        "directives": snapshot.directives().len(),
        "builtin_directives": builtins,
        "groups": devices.groups(),
        "plugins": devices.directive_plugins().len(),
        "hostnames": devices.hostnames(),
    })
}

// ---------------------------------------------------------------------------
// watch
// ---------------------------------------------------------------------------

/// Hold the snapshot until shutdown, rebuilding it from disk on SIGHUP.
///
/// A failed rebuild keeps the previous snapshot in effect.
async fn watch(
    store: SnapshotStore,
    files: Arc<SnapshotFiles>,
    registry: Arc<StaticRegistry>,
) -> Result<()> {
    let current = store.current();
    info!(
        devices = current.devices().len(),
        directives = current.directives().len(),
        "watching for reload signals"
    );

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sighup =
            signal(SignalKind::hangup()).context("failed to register SIGHUP handler")?;
        let mut sigterm =
            signal(SignalKind::terminate()).context("failed to register SIGTERM handler")?;

        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    info!("received SIGHUP; reloading configuration");
                    if let Err(e) = reload(&store, Arc::clone(&files), Arc::clone(&registry)).await {
                        error!(error = %format!("{e:#}"), "configuration reload rejected");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("received SIGINT (ctrl-c)");
                    break;
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM");
                    break;
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = (files, registry);
        tokio::signal::ctrl_c().await.ok();
        info!("received SIGINT (ctrl-c)");
    }

    info!("glass-gate shutting down");
    Ok(())
}

/// Rebuild the snapshot off the async workers and publish it on success.
///
/// Hostname resolution blocks, so the load runs on the blocking pool.
async fn reload(
    store: &SnapshotStore,
    files: Arc<SnapshotFiles>,
    registry: Arc<StaticRegistry>,
) -> Result<Arc<Snapshot>> {
    let built = tokio::task::spawn_blocking(move || {
        load_snapshot(&files, registry.as_ref(), &SystemResolver)
    })
    .await
    .context("configuration reload task failed")?;
    store.reload(|| built)
}
