//! exo-predict - Exoplanet characterization inference service
//!
//! Subcommands:
//! - `serve`: load artifacts and answer prediction requests over HTTP
//! - `check`: load artifacts, print registry and pipeline status, exit

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use exo_common::config::{
    default_config_path, load_toml_config, BranchSchedule, CliOverrides, ConfigResolver,
    ResolvedConfig,
};
use exo_predict::registry::ArtifactRegistry;
use exo_predict::{build_router, AppState, PredictionService};
use tokio::signal;
use tracing::{error, info, warn};

/// Command-line arguments for exo-predict
#[derive(Parser, Debug)]
#[command(name = "exo-predict")]
#[command(about = "Exoplanet characterization inference service")]
#[command(version)]
struct Cli {
    /// TOML config file (default: <config_dir>/exo/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the artifact tree
    #[arg(short, long, global = true)]
    models_dir: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve prediction requests over HTTP
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        bind: Option<String>,

        /// Fusion branch schedule (concurrent, spectral_first, tabular_first)
        #[arg(long)]
        schedule: Option<BranchSchedule>,
    },
    /// Load every artifact and report what is usable
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .init();

    info!(
        "Starting exo-predict v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Models directory: {}", config.models_dir.display());

    match cli.command {
        Command::Serve { .. } => serve(config).await,
        Command::Check => check(config),
    }
}

/// Resolve settings: CLI → ENV → TOML → compiled defaults
fn resolve_config(cli: &Cli) -> Result<ResolvedConfig> {
    let config_path = cli.config.clone().or_else(default_config_path);
    let toml = match &config_path {
        Some(path) => load_toml_config(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => None,
    };

    let (bind_address, schedule) = match &cli.command {
        Command::Serve { bind, schedule } => (bind.clone(), *schedule),
        Command::Check => (None, None),
    };
    let overrides = CliOverrides {
        models_dir: cli.models_dir.clone(),
        bind_address,
        log_level: cli.log_level.clone(),
        schedule,
    };

    ConfigResolver::new(overrides, toml)
        .resolve()
        .context("Failed to resolve configuration")
}

async fn serve(config: ResolvedConfig) -> Result<()> {
    let registry = ArtifactRegistry::load(&config.models_dir);
    let service = PredictionService::new(&registry, config.schedule);
    let unavailable = service.status().iter().filter(|s| !s.available).count();
    if unavailable > 0 {
        warn!("{} pipeline(s) unavailable; their routes will answer 503", unavailable);
    }

    let app = build_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;
    info!("exo-predict listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn check(config: ResolvedConfig) -> Result<()> {
    let registry = ArtifactRegistry::load(&config.models_dir);
    let service = PredictionService::new(&registry, config.schedule);

    println!("Artifacts ({}):", config.models_dir.display());
    for status in registry.status() {
        match (&status.error, &status.input_shape, &status.output_shape) {
            (Some(reason), _, _) => println!("  ✗ {:<32} {}", status.id, reason),
            (None, Some(input), Some(output)) => println!(
                "  ✓ {:<32} {} {} → {}",
                status.id,
                status.kind.unwrap_or("?"),
                input,
                output
            ),
            _ => println!("  ✓ {}", status.id),
        }
    }

    println!("Pipelines:");
    let statuses = service.status();
    for status in &statuses {
        match &status.reason {
            None => println!("  ✓ {}", status.pipeline),
            Some(reason) => println!("  ✗ {:<14} {}", status.pipeline.as_str(), reason),
        }
    }

    let unavailable = statuses.iter().filter(|s| !s.available).count();
    if unavailable > 0 {
        anyhow::bail!("{} of {} pipelines unavailable", unavailable, statuses.len());
    }
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
