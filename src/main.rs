use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use gamevault::config::AppConfig;
use gamevault::router::{self, AppState};
use gamevault::{Result, db};
use tracing_subscriber::EnvFilter;

/// A server-rendered game catalog with a form-based admin panel.
#[derive(Debug, Parser)]
#[command(name = "gamevault", version)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration.
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Seed the demo catalog into an empty database before serving.
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }

    let state = AppState::from_config(config).await?;
    if cli.seed {
        db::seed_demo(&state.pool).await?;
    }

    let listener = tokio::net::TcpListener::bind(state.config.listen_addr).await?;
    tracing::info!(address = %state.config.listen_addr, "listening");

    let app = router::build(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install the ctrl-c handler; running until killed");
        std::future::pending::<()>().await;
    }
}
