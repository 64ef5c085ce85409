//! gRPC server bootstrap.

pub mod checkin;
pub mod service;

pub use service::ManagerService;

use std::sync::Arc;

use anyhow::Result;
use tokio::net::{TcpListener, UnixListener};
use tokio_stream::wrappers::{TcpListenerStream, UnixListenerStream};
use tonic::transport::Server;
use tracing::info;

use crate::config::Config;
use crate::proto::cartesi::rollup::v1::machine_check_in_server::MachineCheckInServer;
use crate::proto::cartesi::rollup::v1::machine_manager_server::MachineManagerServer;

/// Binds the manager address and serves the MachineManager and
/// MachineCheckIn services until ctrl-c, then terminates every session's
/// machine server process group.
pub async fn start_server(config: Config) -> Result<()> {
    match config.manager_address.strip_prefix("unix:") {
        Some(path) => serve_unix(&config, path).await,
        None => serve_tcp(&config).await,
    }
}

async fn serve_tcp(config: &Config) -> Result<()> {
    let listener = TcpListener::bind(&config.manager_address).await?;
    // The configured address may carry port 0; children must be told the
    // port that was actually bound.
    let manager_address = replace_port(&config.manager_address, listener.local_addr()?.port());
    let service = Arc::new(ManagerService::new(
        manager_address.clone(),
        config.server_address.clone(),
    ));
    info!(address = %manager_address, "manager listening");
    Server::builder()
        .add_service(MachineManagerServer::from_arc(Arc::clone(&service)))
        .add_service(MachineCheckInServer::from_arc(Arc::clone(&service)))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown_signal())
        .await?;
    service.terminate_sessions().await;
    Ok(())
}

async fn serve_unix(config: &Config, path: &str) -> Result<()> {
    let listener = UnixListener::bind(path)?;
    let service = Arc::new(ManagerService::new(
        config.manager_address.clone(),
        config.server_address.clone(),
    ));
    info!(address = %config.manager_address, "manager listening");
    Server::builder()
        .add_service(MachineManagerServer::from_arc(Arc::clone(&service)))
        .add_service(MachineCheckInServer::from_arc(Arc::clone(&service)))
        .serve_with_incoming_shutdown(UnixListenerStream::new(listener), shutdown_signal())
        .await?;
    service.terminate_sessions().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        info!(%error, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}

/// Replaces the port specification in a host:port address. Unix addresses
/// pass through unchanged.
fn replace_port(address: &str, port: u16) -> String {
    if address.starts_with("unix:") {
        return address.to_string();
    }
    match address.rfind(':') {
        Some(position) => format!("{}:{port}", &address[..position]),
        None => format!("{address}:{port}"),
    }
}
