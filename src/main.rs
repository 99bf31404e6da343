//! Gas Price Predictor API server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request                    ┌──────────────────────────────────────────┐
//!     ─────────────────────────────────▶│ http: request id → cors → rate limit     │
//!                                       │       → handlers → JSON envelope         │
//!                                       └────────────────────┬─────────────────────┘
//!                                                            │
//!                                                            ▼
//!                                       ┌──────────────────────────────────────────┐
//!                                       │ db client                                │
//!                                       │   readiness gate → retry executor        │
//!                                       │   (timeout / classify / backoff)         │──▶ Database
//!                                       │   heartbeat                              │
//!                                       └──────────────────────────────────────────┘
//!
//!     Cross-cutting: config, observability, lifecycle (startup / signals / shutdown)
//! ```
//!
//! # Usage
//! ```text
//! gas-price-api [--config path/to/config.toml]
//! ```
//! Environment variables (`APP_ENV`, `PORT`, `DATABASE_URI`, `JWT_SECRET`,
//! `CORS_ORIGIN`, `RATE_LIMIT_WINDOW_MS`, `RATE_LIMIT_MAX`) override the file.
//! `NODE_ENV` and `MONGODB_URI` are read when `APP_ENV` and `DATABASE_URI` are unset.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gas-price-api")]
#[command(about = "Gas Price Predictor API server", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Err(e) = gas_price_api::lifecycle::run(cli.config.as_deref()).await {
        tracing::error!(error = %e, "Fatal startup error");
        return Err(e.into());
    }

    Ok(())
}
