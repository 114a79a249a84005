// CrabScore - GPL-3.0-or-later
// This file is part of CrabScore.
//
// Copyright (C) 2025 Daniel Freiermuth
//
// CrabScore is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// CrabScore is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with CrabScore.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use clap::Parser;
use crabscore::config::AppConfig;
use crabscore::http::{create_router, AppState};
use crabscore::parser::load_records;
use crabscore::ModelService;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "crabscore")]
#[command(author = "CrabScore Team")]
#[command(version)]
#[command(about = "Score structured log records for anomalies over HTTP", long_about = None)]
struct Args {
    /// Path to a JSON config file (defaults to the user config directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address to listen on, overrides the config file
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// JSON or JSON-lines file of records to train on before serving
    #[arg(long, value_name = "FILE")]
    train_file: Option<PathBuf>,

    /// Contamination for the start-up training run
    #[arg(long, value_name = "RATIO", requires = "train_file")]
    contamination: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set RUST_LOG environment variable to override (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crabscore=info,tower_http=info".into()),
        )
        .init();

    tracing::info!(
        "CrabScore starting up (version {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    let service = Arc::new(ModelService::new(&config)?);

    if let Some(path) = &args.train_file {
        let records = load_records(path)?;
        let contamination = args
            .contamination
            .unwrap_or(config.scoring.default_contamination);
        let trainer = Arc::clone(&service);
        let info = tokio::task::spawn_blocking(move || trainer.train(&records, contamination))
            .await
            .context("Start-up training task panicked")?
            .with_context(|| format!("Failed to train on {}", path.display()))?;
        tracing::info!(
            "Start-up model ready: {}",
            info.version.as_deref().unwrap_or_default()
        );
    } else {
        tracing::info!("No training file given, serving untrained until POST /api/v1/anomaly/train");
    }

    let app = create_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("CrabScore shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
