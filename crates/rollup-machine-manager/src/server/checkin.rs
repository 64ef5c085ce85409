//! Rendezvous between a spawning session task and its machine server's
//! check-in.
//!
//! A task that is about to cause a machine server to (re)start registers
//! here before triggering the spawn, then suspends on the returned receiver.
//! The server's CheckIn RPC resolves the entry with the advertised address,
//! resuming the task. At most one entry per session id exists at any time
//! because all operations that respawn a session's server are serialised by
//! the session lock.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{ManagerError, Result};

#[derive(Debug, Default)]
pub struct CheckInTable {
    waiting: Mutex<HashMap<String, oneshot::Sender<String>>>,
}

impl CheckInTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session as waiting for a check-in.
    pub fn register(&self, session_id: &str) -> oneshot::Receiver<String> {
        let (sender, receiver) = oneshot::channel();
        let mut waiting = self.waiting.lock().expect("checkin table poisoned");
        if waiting.insert(session_id.to_string(), sender).is_some() {
            warn!(session_id, "replaced a stale check-in entry");
        }
        receiver
    }

    /// Completes the rendezvous for a checked-in server.
    pub fn resolve(&self, session_id: &str, address: String) -> Result<()> {
        let sender = self
            .waiting
            .lock()
            .expect("checkin table poisoned")
            .remove(session_id)
            .ok_or_else(|| {
                ManagerError::InvalidArgument(format!(
                    "check-in with wrong session id {session_id}"
                ))
            })?;
        debug!(session_id, address, "check-in resolved");
        // The waiting task abandoning the rendezvous at the same moment is
        // indistinguishable from a late check-in.
        sender.send(address).map_err(|_| {
            ManagerError::InvalidArgument(format!("check-in with wrong session id {session_id}"))
        })
    }

    /// Drops the entry of a registrant that gave up waiting.
    pub fn abandon(&self, session_id: &str) {
        self.waiting
            .lock()
            .expect("checkin table poisoned")
            .remove(session_id);
    }

    /// Suspends until the registered check-in arrives or the deadline
    /// expires, returning the advertised server address.
    pub async fn wait(
        &self,
        session_id: &str,
        receiver: oneshot::Receiver<String>,
        deadline: u64,
    ) -> Result<String> {
        match timeout(Duration::from_millis(deadline), receiver).await {
            Ok(Ok(address)) => Ok(address),
            Ok(Err(_)) => {
                self.abandon(session_id);
                Err(ManagerError::Internal(format!(
                    "check-in channel for session {session_id} closed"
                )))
            }
            Err(_) => {
                self.abandon(session_id);
                Err(ManagerError::DeadlineExceeded(format!(
                    "no check-in for session {session_id} within {deadline}ms"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_then_resolve_delivers_address() {
        let table = CheckInTable::new();
        let receiver = table.register("session");
        table.resolve("session", "localhost:5001".to_string()).unwrap();
        let address = table.wait("session", receiver, 1_000).await.unwrap();
        assert_eq!(address, "localhost:5001");
    }

    #[tokio::test]
    async fn resolve_without_registration_fails() {
        let table = CheckInTable::new();
        let err = table
            .resolve("unknown", "localhost:5001".to_string())
            .unwrap_err();
        assert!(matches!(err, ManagerError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn wait_times_out_and_abandons_entry() {
        let table = CheckInTable::new();
        let receiver = table.register("session");
        let err = table.wait("session", receiver, 10).await.unwrap_err();
        assert!(matches!(err, ManagerError::DeadlineExceeded(_)));
        // The entry is gone, so a late check-in is rejected.
        let err = table
            .resolve("session", "localhost:5001".to_string())
            .unwrap_err();
        assert!(matches!(err, ManagerError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn reregistration_replaces_previous_entry() {
        let table = CheckInTable::new();
        let stale = table.register("session");
        let fresh = table.register("session");
        table.resolve("session", "localhost:5002".to_string()).unwrap();
        assert_eq!(
            table.wait("session", fresh, 1_000).await.unwrap(),
            "localhost:5002"
        );
        drop(stale);
    }
}
