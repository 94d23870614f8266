// SPDX-License-Identifier: AGPL-3.0-only
// Minimal bootstrap; handlers and state live in the library.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use poster_engine::catalog;
use poster_studio::{http::build_router, AppState, Settings};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug, Clone)]
#[command(name = "poster-studio", about = "Chart poster data, assistant and render service")]
struct Cli {
    /// Settings file; defaults to ./poster-studio.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    Serve,
    /// Print the catalog snapshot the assistant is given, then exit.
    Catalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    match cli.cmd.unwrap_or(Command::Serve) {
        Command::Serve => run_server(settings).await,
        Command::Catalog => print_catalog(settings).await,
    }
}

async fn print_catalog(settings: Settings) -> Result<()> {
    let state = AppState::from_settings(&settings)?;
    let snapshot = catalog::snapshot(state.engine.store().as_ref()).await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn run_server(settings: Settings) -> Result<()> {
    info!("poster-studio starting");
    let state = AppState::from_settings(&settings)?;
    let app = build_router(state, settings.http.body_limit_bytes);

    let addr = settings.http.addr;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            warn!(error=%e, %addr, "bind failed, using ephemeral");
            tokio::net::TcpListener::bind("127.0.0.1:0").await?
        }
    };
    let local = listener.local_addr()?;
    info!(%local, "poster api listening");

    tokio::select! { _ = axum::serve(listener, app) => {} _ = tokio::signal::ctrl_c() => {} }
    info!("poster-studio shutting down");
    Ok(())
}
