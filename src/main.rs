//! Attendance Engine HTTP server.
//!
//! Environment:
//! - `ATTENDANCE_CONFIG_DIR`: configuration directory (default `./config/attendance`)
//! - `ATTENDANCE_PORT`: listen port (default `8080`)
//! - `RUST_LOG`: log filter (default `info`)

use std::net::SocketAddr;

use attendance_engine::api::{AppState, create_router};
use attendance_engine::config::ConfigLoader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_DIR: &str = "./config/attendance";
const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        error!(error = %err, "Attendance engine stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir =
        std::env::var("ATTENDANCE_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let port = match std::env::var("ATTENDANCE_PORT") {
        Ok(value) => value.parse::<u16>()?,
        Err(_) => DEFAULT_PORT,
    };

    let config = ConfigLoader::load(&config_dir)?;
    let router = create_router(AppState::from_config(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, config_dir = %config_dir, "Attendance engine listening");

    axum::serve(listener, router).await?;
    Ok(())
}
