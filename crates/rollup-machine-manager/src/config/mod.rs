use serde::{Deserialize, Serialize};

use crate::commands::cli::Cli;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Address the manager binds to; also the check-in target handed to
    /// spawned machine servers.
    pub manager_address: String,
    /// Bind address suggested to spawned machine servers.
    pub server_address: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manager_address: "127.0.0.1:50051".to_string(),
            server_address: "localhost:0".to_string(),
        }
    }
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Config {
            manager_address: cli.manager_address.clone(),
            server_address: cli.server_address.clone(),
        }
    }
}
