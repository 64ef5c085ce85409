//! Sessions and their per-epoch state.

pub mod epoch;
pub mod processor;
pub mod store;

pub use epoch::Epoch;
pub use store::SessionStore;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, MutexGuard};

use crate::error::{ManagerError, Result, TaintStatus};
use crate::machine::ranges::MemoryRanges;
use crate::machine::{MachineClient, ServerProcess};
use crate::proto::cartesi::rollup::v1 as rollup;

/// Deadlines, in milliseconds, for the machine server operations issued on
/// behalf of a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadlines {
    pub checkin: u64,
    pub update_merkle_tree: u64,
    pub advance_state: u64,
    pub advance_state_increment: u64,
    pub inspect_state: u64,
    pub inspect_state_increment: u64,
    pub machine: u64,
    pub store: u64,
    pub fast: u64,
}

impl From<&rollup::DeadlineConfig> for Deadlines {
    fn from(config: &rollup::DeadlineConfig) -> Self {
        Deadlines {
            checkin: config.checkin,
            update_merkle_tree: config.update_merkle_tree,
            advance_state: config.advance_state,
            advance_state_increment: config.advance_state_increment,
            inspect_state: config.inspect_state,
            inspect_state_increment: config.inspect_state_increment,
            machine: config.machine,
            store: config.store,
            fast: config.fast,
        }
    }
}

/// Cycle budgets for machine runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleBudgets {
    pub max_advance_state: u64,
    pub advance_state_increment: u64,
    pub max_inspect_state: u64,
    pub inspect_state_increment: u64,
}

impl From<&rollup::CyclesConfig> for CycleBudgets {
    fn from(config: &rollup::CyclesConfig) -> Self {
        CycleBudgets {
            max_advance_state: config.max_advance_state,
            advance_state_increment: config.advance_state_increment,
            max_inspect_state: config.max_inspect_state,
            inspect_state_increment: config.inspect_state_increment,
        }
    }
}

/// One session driving one machine server.
///
/// Two layers of locking, mirroring their distinct purposes:
///
/// - the session lock is an RPC-level flag. A handler touching the session
///   holds it for its whole run; a second concurrent handler observes
///   `Aborted` instead of queueing.
/// - the state mutex guards the data. Handlers and the input processor
///   acquire it around their accesses; the processor holds it only between
///   machine calls, so enqueues and status snapshots interleave with
///   processing exactly at those points.
#[derive(Debug)]
pub struct Session {
    id: String,
    session_lock: AtomicBool,
    state: Mutex<SessionState>,
}

/// Holds the RPC-level session lock until dropped.
#[derive(Debug)]
pub struct SessionLock<'a> {
    session: &'a Session,
}

impl Drop for SessionLock<'_> {
    fn drop(&mut self) {
        self.session.session_lock.store(false, Ordering::Release);
    }
}

/// Everything a session owns besides its id.
#[derive(Debug)]
pub struct SessionState {
    pub deadlines: Deadlines,
    pub cycles: CycleBudgets,
    pub tainted: Option<TaintStatus>,
    /// Set while a task is draining the pending-input queue.
    pub processing: bool,
    pub current_mcycle: u64,
    pub active_epoch_index: u64,
    pub max_input_payload_length: u64,
    pub epochs: BTreeMap<u64, Epoch>,
    pub memory_ranges: Option<MemoryRanges>,
    pub client: Option<MachineClient>,
    pub server_address: String,
    pub server_process: Option<ServerProcess>,
}

impl Session {
    pub fn new(
        id: String,
        active_epoch_index: u64,
        deadlines: Deadlines,
        cycles: CycleBudgets,
    ) -> Self {
        let mut epochs = BTreeMap::new();
        epochs.insert(active_epoch_index, Epoch::new(active_epoch_index));
        Session {
            id,
            session_lock: AtomicBool::new(false),
            state: Mutex::new(SessionState {
                deadlines,
                cycles,
                tainted: None,
                processing: false,
                current_mcycle: 0,
                active_epoch_index,
                max_input_payload_length: 0,
                epochs,
                memory_ranges: None,
                client: None,
                server_address: String::new(),
                server_process: None,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Acquires the RPC-level session lock, failing on concurrent calls.
    pub fn try_lock_session(&self) -> Result<SessionLock<'_>> {
        if self.session_lock.swap(true, Ordering::Acquire) {
            return Err(ManagerError::Aborted("concurrent call in session".to_string()));
        }
        Ok(SessionLock { session: self })
    }

    /// Acquires the state mutex.
    pub async fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }
}

impl SessionState {
    pub fn ensure_not_tainted(&self) -> Result<()> {
        if self.tainted.is_some() {
            return Err(ManagerError::DataLoss("session is tainted".to_string()));
        }
        Ok(())
    }

    /// Marks the session tainted with the given error, keeping the first
    /// taint if one is already recorded.
    pub fn taint(&mut self, error: &ManagerError) {
        if self.tainted.is_none() {
            self.tainted = Some(TaintStatus::from(error));
        }
    }

    pub fn active_epoch_mut(&mut self) -> Result<&mut Epoch> {
        self.epochs
            .get_mut(&self.active_epoch_index)
            .ok_or_else(|| ManagerError::Internal("active epoch not found".to_string()))
    }

    /// The machine client, present once StartSession completed.
    pub fn client(&self) -> Result<MachineClient> {
        self.client
            .clone()
            .ok_or_else(|| ManagerError::Internal("session has no machine stub".to_string()))
    }

    /// The memory ranges, present once StartSession completed.
    pub fn ranges(&self) -> Result<MemoryRanges> {
        self.memory_ranges
            .clone()
            .ok_or_else(|| ManagerError::Internal("session has no memory ranges".to_string()))
    }

    /// Starts a fresh active epoch after the current one finished.
    pub fn start_new_epoch(&mut self) {
        self.active_epoch_index += 1;
        self.epochs
            .insert(self.active_epoch_index, Epoch::new(self.active_epoch_index));
    }
}
