use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rollup_machine_manager::commands::cli::Cli;
use rollup_machine_manager::config::Config;
use rollup_machine_manager::server;
use rollup_machine_manager::{
    MANAGER_VERSION_MAJOR, MANAGER_VERSION_MINOR, MANAGER_VERSION_PATCH,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = Config::from(&cli);
    info!(
        "manager version is {}.{}.{}",
        MANAGER_VERSION_MAJOR, MANAGER_VERSION_MINOR, MANAGER_VERSION_PATCH
    );
    server::start_server(config).await
}
