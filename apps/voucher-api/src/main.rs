//! # GreenPay Voucher API
//!
//! gRPC server for voucher issuance, validation and redemption.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Voucher API Server                               │
//! │                                                                         │
//! │  Admin portal ──┐                                                       │
//! │                 ├──► gRPC (50051) ───► Services ───► SQLite             │
//! │  Gate scanner ──┘                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Log level comes from `RUST_LOG` (default `info`); everything else from
//! `greenpay.toml` and `GREENPAY_*` variables, see [`ApiConfig`].

use std::net::SocketAddr;
use std::sync::Arc;

use tonic::transport::Server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use greenpay_db::Database;
use greenpay_voucher_api::proto::{
    health_service_server::HealthServiceServer, voucher_service_server::VoucherServiceServer,
};
use greenpay_voucher_api::services::{
    health_service::HealthServiceImpl, voucher_service::VoucherServiceImpl,
};
use greenpay_voucher_api::{ApiConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting GreenPay Voucher API server...");

    let config = ApiConfig::load()?;
    info!(
        port = config.grpc_port,
        database = %config.database_path,
        max_attempts = config.issue_max_attempts,
        "Configuration loaded"
    );

    // Migrations run as part of connecting
    let db = Database::new(config.db_config()).await?;
    info!("Connected to SQLite, migrations complete");

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    let voucher_service = VoucherServiceServer::new(VoucherServiceImpl::new(state.clone()));
    let health_service = HealthServiceServer::new(HealthServiceImpl::new(state.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.grpc_port));
    info!(%addr, "Starting gRPC server");

    Server::builder()
        .add_service(voucher_service)
        .add_service(health_service)
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;

    state.db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
