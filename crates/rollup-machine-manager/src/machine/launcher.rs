//! Spawning of machine server child processes.

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{ManagerError, Result};

/// Command spawned for each session.
pub const MACHINE_SERVER_BIN: &str = "cartesi-machine-server";

/// How machine servers are brought up for a session.
///
/// The seam exists so tests can stand in a scripted in-process server; the
/// manager itself always uses [`ProcessLauncher`].
#[async_trait]
pub trait MachineLauncher: Send + Sync {
    /// Spawns a machine server that will check in with the manager.
    async fn launch(
        &self,
        session_id: &str,
        checkin_address: &str,
        server_address: &str,
    ) -> Result<ServerProcess>;
}

/// Handle to a spawned machine server process group.
///
/// Dropping the handle leaves the child running; `terminate` kills the
/// whole group, which covers servers respawned by Snapshot/Rollback forks.
#[derive(Debug, Default)]
pub struct ServerProcess {
    child: Option<Child>,
    pgid: Option<i32>,
}

impl ServerProcess {
    pub fn terminate(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            debug!(pgid, "terminating machine server process group");
            unsafe {
                libc::kill(-pgid, libc::SIGKILL);
            }
        }
        self.child.take();
    }
}

/// Spawns real `cartesi-machine-server` child processes.
pub struct ProcessLauncher;

#[async_trait]
impl MachineLauncher for ProcessLauncher {
    async fn launch(
        &self,
        session_id: &str,
        checkin_address: &str,
        server_address: &str,
    ) -> Result<ServerProcess> {
        let mut command = Command::new(MACHINE_SERVER_BIN);
        command
            .arg(format!("--session-id={session_id}"))
            .arg(format!("--checkin-address={checkin_address}"))
            .arg(format!("--server-address={server_address}"))
            .process_group(0);
        debug!(session_id, server_address, "spawning {MACHINE_SERVER_BIN}");
        let child = command.spawn().map_err(|e| {
            ManagerError::Internal(format!(
                "failed spawning {MACHINE_SERVER_BIN} for session {session_id} ({e})"
            ))
        })?;
        let pgid = match child.id() {
            Some(pid) => Some(pid as i32),
            None => {
                warn!(session_id, "spawned machine server already exited");
                None
            }
        };
        Ok(ServerProcess {
            child: Some(child),
            pgid,
        })
    }
}
