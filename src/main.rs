//! oob-gpu-exporter entry point: CLI dispatch, logging, signal handlers.

mod app;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use app::cli::Args;
use app::logging::{init_tracing, reload_level, resolve_filter};
use oob_gpu_exporter::config::persistence::load_config;
use oob_gpu_exporter::exporter::{self, Exporter, SessionFactory};
use oob_gpu_exporter::redfish::{MockBmc, SessionClient};

#[tokio::main]
async fn main() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            if matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) {
                err.exit();
            }
            eprintln!("{}", err);
            eprintln!("\nFor more information, try '--help'.");
            std::process::exit(2);
        }
    };

    // Priority: 1. --log-level flag, 2. LOG_LEVEL env, 3. config file, 4. info.
    // The config level is applied after loading, once the subscriber can report errors.
    let env_level = std::env::var("LOG_LEVEL").ok();
    init_tracing(resolve_filter(args.log_level.as_deref(), env_level.as_deref(), None));

    if let (Some(target), Some(fixture)) = (args.check.as_deref(), args.fixture.as_deref()) {
        return run_fixture_check(target, fixture).await;
    }

    let config = load_config(args.config.as_deref()).await?;
    if args.log_level.is_none() && env_level.is_none() {
        if let Err(e) = reload_level(&config.exporter.log_level) {
            warn!("Keeping INFO logging: {:#}", e);
        }
    }

    if let Some(target) = args.check.as_deref() {
        let exporter = Exporter::new(config);
        let output = exporter::check(&exporter, target).await?;
        print!("{}", output.body);
        std::process::exit(if output.up { 0 } else { 1 });
    }

    let listen = args
        .listen
        .clone()
        .unwrap_or_else(|| config.exporter.listen_address.clone());

    info!("oob-gpu-exporter v{} starting ({} host entries)", env!("CARGO_PKG_VERSION"), config.hosts.len());

    #[cfg(unix)]
    spawn_log_level_reloader(args.config.clone(), args.log_level.is_some() || env_level.is_some());

    let exporter = Arc::new(Exporter::new(config));
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received (Ctrl+C)");
    };

    exporter::serve(exporter, &listen, shutdown).await?;
    info!("Exporter shutdown complete");
    Ok(())
}

/// `--check` against a captured fixture: no config or credentials needed.
async fn run_fixture_check(target: &str, fixture: &str) -> Result<()> {
    let content = tokio::fs::read_to_string(fixture)
        .await
        .with_context(|| format!("Failed to read fixture {}", fixture))?;
    let bmc = Arc::new(MockBmc::from_fixture(&content).with_context(|| format!("Invalid fixture {}", fixture))?);
    info!("Checking {} against fixture {}", target, fixture);

    let sessions: SessionFactory = Box::new(move |_target: &str| Ok(Box::new(bmc.clone()) as Box<dyn SessionClient>));
    let exporter = Exporter::with_sessions(sessions);
    let output = exporter::check(&exporter, target).await?;
    print!("{}", output.body);
    std::process::exit(if output.up { 0 } else { 1 });
}

/// SIGHUP re-reads the config file and applies its log level, unless the level
/// was pinned on the command line or through LOG_LEVEL.
#[cfg(unix)]
fn spawn_log_level_reloader(config_path: Option<String>, pinned: bool) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sighup = match signal(SignalKind::hangup()) {
        Ok(sighup) => sighup,
        Err(e) => {
            warn!("Failed to set up SIGHUP handler: {}", e);
            return;
        }
    };

    tokio::spawn(async move {
        while sighup.recv().await.is_some() {
            if pinned {
                info!("SIGHUP received; log level is pinned by --log-level or LOG_LEVEL");
                continue;
            }
            info!("SIGHUP received, reloading log level configuration");
            match load_config(config_path.as_deref()).await {
                Ok(config) => match reload_level(&config.exporter.log_level) {
                    Ok(filter) => info!("Log level reloaded: {}", filter.to_uppercase()),
                    Err(e) => error!("Failed to reload log level: {:#}", e),
                },
                Err(e) => error!("Failed to reload config: {:#}", e),
            }
        }
    });
}
