//! The manager's RPC handlers: session lifecycle, status queries, and the
//! check-in endpoint for spawned machine servers.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{debug, info};

use crate::error::{ManagerError, Result};
use crate::machine::ranges::{MemoryRange, MemoryRanges, INPUT_METADATA_LENGTH};
use crate::machine::{MachineClient, MachineLauncher, ProcessLauncher};
use crate::proto::cartesi::machine::v1::{GetVersionResponse, SemanticVersion, Void};
use crate::proto::cartesi::rollup::v1::machine_check_in_server::MachineCheckIn;
use crate::proto::cartesi::rollup::v1::machine_manager_server::MachineManager;
use crate::proto::cartesi::rollup::v1::{
    AdvanceStateRequest, CheckInRequest, EndSessionRequest, FinishEpochRequest,
    GetEpochStatusRequest, GetEpochStatusResponse, GetSessionStatusRequest,
    GetSessionStatusResponse, GetStatusResponse, StartSessionRequest, TaintStatus,
};
use crate::server::checkin::CheckInTable;
use crate::session::epoch::{EpochState, PendingInput};
use crate::session::{processor, CycleBudgets, Deadlines, Session, SessionState, SessionStore};
use crate::{
    MACHINE_VERSION_MAJOR, MACHINE_VERSION_MINOR, MANAGER_VERSION_BUILD, MANAGER_VERSION_MAJOR,
    MANAGER_VERSION_MINOR, MANAGER_VERSION_PATCH, MANAGER_VERSION_PRE_RELEASE,
};

/// Shared state behind the MachineManager and MachineCheckIn services.
pub struct ManagerService {
    sessions: Arc<SessionStore>,
    checkin: Arc<CheckInTable>,
    launcher: Arc<dyn MachineLauncher>,
    /// Address children use to check in.
    manager_address: String,
    /// Suggested bind address passed to spawned machine servers.
    server_address: String,
}

impl ManagerService {
    pub fn new(manager_address: String, server_address: String) -> Self {
        Self::with_launcher(manager_address, server_address, Arc::new(ProcessLauncher))
    }

    /// Creates a service with an externally provided launcher. This is how
    /// tests stand in an in-process machine server.
    pub fn with_launcher(
        manager_address: String,
        server_address: String,
        launcher: Arc<dyn MachineLauncher>,
    ) -> Self {
        ManagerService {
            sessions: Arc::new(SessionStore::new()),
            checkin: Arc::new(CheckInTable::new()),
            launcher,
            manager_address,
            server_address,
        }
    }

    /// Terminates every session's machine server process group. Called on
    /// manager shutdown.
    pub async fn terminate_sessions(&self) {
        for session in self.sessions.drain() {
            let mut state = session.state().await;
            if let Some(process) = state.server_process.as_mut() {
                process.terminate();
            }
        }
    }

    async fn start_session_inner(&self, request: StartSessionRequest) -> Result<()> {
        let id = request.session_id.clone();
        info!(session_id = %id, "received StartSession");
        if id.is_empty() {
            return Err(ManagerError::InvalidArgument("session id is empty".to_string()));
        }
        let deadlines = request.server_deadline.as_ref().map(Deadlines::from);
        let cycles = request.server_cycles.as_ref().map(CycleBudgets::from);
        // Inserting the shell before any async work closes the window in
        // which a second StartSession with the same id could slip in; the
        // duplicate is rejected here with AlreadyExists.
        let session = self.sessions.insert(Session::new(
            id.clone(),
            request.active_epoch_index,
            deadlines.unwrap_or_default(),
            cycles.unwrap_or_default(),
        ))?;
        let _lock = session.try_lock_session()?;
        let mut state = session.state().await;
        match self.configure_session(&session, &mut state, &request).await {
            Ok(()) => {
                drop(state);
                info!(session_id = %id, "session started");
                Ok(())
            }
            Err(error) => {
                // Try to shut the server down before erasing the session.
                if let Some(client) = state.client.clone() {
                    let _ = client.shutdown().await;
                }
                drop(state);
                self.sessions.remove(&id);
                Err(error)
            }
        }
    }

    /// Validates the request, spawns the machine server, and brings the
    /// session to its runnable state. Runs with the session lock held.
    async fn configure_session(
        &self,
        session: &Session,
        state: &mut SessionState,
        request: &StartSessionRequest,
    ) -> Result<()> {
        let machine = request
            .machine
            .as_ref()
            .filter(|machine| machine.machine_oneof.is_some())
            .ok_or_else(|| {
                ManagerError::InvalidArgument("missing initial machine config".to_string())
            })?;
        if request.active_epoch_index == u64::MAX {
            return Err(ManagerError::OutOfRange(
                "active epoch index will overflow".to_string(),
            ));
        }
        let deadline = request.server_deadline.as_ref().ok_or_else(|| {
            ManagerError::InvalidArgument("missing server deadline config".to_string())
        })?;
        if deadline.advance_state < deadline.advance_state_increment {
            return Err(ManagerError::InvalidArgument(
                "advance state deadline is less than advance state increment deadline".to_string(),
            ));
        }
        if deadline.inspect_state < deadline.inspect_state_increment {
            return Err(ManagerError::InvalidArgument(
                "inspect state deadline is less than inspect state increment deadline".to_string(),
            ));
        }
        let cycles = request.server_cycles.as_ref().ok_or_else(|| {
            ManagerError::InvalidArgument("missing server cycles config".to_string())
        })?;
        if cycles.max_advance_state == 0 || cycles.advance_state_increment == 0 {
            return Err(ManagerError::InvalidArgument(
                "max cycles per advance state or cycles per advance state increment is zero"
                    .to_string(),
            ));
        }
        if cycles.max_advance_state < cycles.advance_state_increment {
            return Err(ManagerError::InvalidArgument(
                "max cycles per advance state is less than cycles per advance state increment"
                    .to_string(),
            ));
        }
        if cycles.max_inspect_state == 0 || cycles.inspect_state_increment == 0 {
            return Err(ManagerError::InvalidArgument(
                "max cycles per inspect state or cycles per inspect state increment is zero"
                    .to_string(),
            ));
        }
        if cycles.max_inspect_state < cycles.inspect_state_increment {
            return Err(ManagerError::InvalidArgument(
                "max cycles per inspect state is less than cycles per inspect state increment"
                    .to_string(),
            ));
        }

        // Spawn the machine server and suspend until it checks in.
        let receiver = self.checkin.register(session.id());
        let process = match self
            .launcher
            .launch(session.id(), &self.manager_address, &self.server_address)
            .await
        {
            Ok(process) => process,
            Err(error) => {
                self.checkin.abandon(session.id());
                return Err(error);
            }
        };
        state.server_process = Some(process);
        let address = self
            .checkin
            .wait(session.id(), receiver, state.deadlines.checkin)
            .await?;
        debug!(session_id = session.id(), address = %address, "machine server checked in");
        state.server_address = address.clone();
        let client = MachineClient::connect(&address, state.deadlines).await?;
        state.client = Some(client.clone());

        let version = client.get_version().await?;
        if version.major != MACHINE_VERSION_MAJOR || version.minor != MACHINE_VERSION_MINOR {
            return Err(ManagerError::FailedPrecondition(
                "manager is incompatible with machine server".to_string(),
            ));
        }
        client.create_machine(machine.clone()).await?;
        let config = client.get_initial_config().await?;
        let htif = config.htif.as_ref().ok_or_else(|| {
            ManagerError::InvalidArgument("missing server htif config".to_string())
        })?;
        if !htif.yield_manual {
            return Err(ManagerError::InvalidArgument(
                "yield manual must be enabled".to_string(),
            ));
        }
        if !htif.yield_automatic {
            return Err(ManagerError::InvalidArgument(
                "yield automatic must be enabled".to_string(),
            ));
        }
        if htif.console_getchar {
            return Err(ManagerError::InvalidArgument(
                "console getchar must be disabled".to_string(),
            ));
        }
        // The machine may have started past mcycle 0; budgets are relative
        // to this point.
        state.current_mcycle = config.processor.as_ref().map_or(0, |p| p.mcycle);
        let rollup = config.rollup.ok_or_else(|| {
            ManagerError::InvalidArgument("missing server rollup config".to_string())
        })?;
        let ranges = MemoryRanges {
            tx_buffer: MemoryRange::from_config("tx buffer", rollup.tx_buffer)?,
            rx_buffer: MemoryRange::from_config("rx buffer", rollup.rx_buffer)?,
            input_metadata: MemoryRange::from_config("input metadata", rollup.input_metadata)?,
            voucher_hashes: MemoryRange::from_config("voucher hashes", rollup.voucher_hashes)?,
            notice_hashes: MemoryRange::from_config("notice hashes", rollup.notice_hashes)?,
        };
        state.max_input_payload_length = ranges.rx_buffer.length - 1;
        state.memory_ranges = Some(ranges);
        client.update_merkle_tree().await?;
        Ok(())
    }

    async fn end_session_inner(&self, request: EndSessionRequest) -> Result<()> {
        let id = &request.session_id;
        info!(session_id = %id, "received EndSession");
        let session = self.sessions.get(id)?;
        let _lock = session.try_lock_session()?;
        let mut state = session.state().await;
        let tainted = state.tainted.is_some();
        if !tainted {
            // Only a pristine active epoch may be abandoned.
            let epoch = state
                .epochs
                .get(&state.active_epoch_index)
                .ok_or_else(|| ManagerError::Internal("active epoch not found".to_string()))?;
            if !epoch.pending_inputs.is_empty() {
                return Err(ManagerError::InvalidArgument(
                    "active epoch has pending inputs".to_string(),
                ));
            }
            if !epoch.processed_inputs.is_empty() {
                return Err(ManagerError::InvalidArgument(
                    "active epoch has processed inputs".to_string(),
                ));
            }
        }
        if state.processing {
            return Err(ManagerError::Internal(
                "session is processing inputs".to_string(),
            ));
        }
        if let Some(client) = state.client.clone() {
            let shutdown = client.shutdown().await;
            if !tainted {
                shutdown?;
            }
        }
        if tainted {
            info!(session_id = %id, "session is tainted, terminating machine server process group");
            if let Some(process) = state.server_process.as_mut() {
                process.terminate();
            }
        }
        drop(state);
        self.sessions.remove(id);
        Ok(())
    }

    async fn finish_epoch_inner(&self, request: FinishEpochRequest) -> Result<()> {
        let id = &request.session_id;
        info!(session_id = %id, epoch = request.active_epoch_index, "received FinishEpoch");
        let session = self.sessions.get(id)?;
        let _lock = session.try_lock_session()?;
        let mut state = session.state().await;
        state.ensure_not_tainted()?;
        if state.active_epoch_index == u64::MAX {
            return Err(ManagerError::OutOfRange(
                "active epoch index will overflow".to_string(),
            ));
        }
        {
            let epoch = state
                .epochs
                .get(&request.active_epoch_index)
                .ok_or_else(|| {
                    ManagerError::InvalidArgument("unknown epoch index".to_string())
                })?;
            if epoch.state != EpochState::Active {
                return Err(ManagerError::InvalidArgument(
                    "epoch already finished".to_string(),
                ));
            }
            if !epoch.pending_inputs.is_empty() {
                return Err(ManagerError::InvalidArgument(
                    "epoch still has pending inputs".to_string(),
                ));
            }
            let processed = epoch.processed_inputs.len() as u64;
            if processed != request.processed_input_count {
                return Err(ManagerError::InvalidArgument(format!(
                    "incorrect processed input count (expected {processed}, got {})",
                    request.processed_input_count
                )));
            }
        }
        // Store the machine before anything changes.
        if !request.storage_directory.is_empty() {
            debug!(session_id = %id, directory = %request.storage_directory, "storing machine");
            let client = state.client()?;
            client.store(request.storage_directory.clone()).await?;
        }
        state
            .epochs
            .get_mut(&request.active_epoch_index)
            .ok_or_else(|| ManagerError::Internal("active epoch not found".to_string()))?
            .finish()?;
        state.start_new_epoch();
        Ok(())
    }

    async fn advance_state_inner(&self, request: AdvanceStateRequest) -> Result<()> {
        let id = &request.session_id;
        info!(
            session_id = %id,
            epoch = request.active_epoch_index,
            input = request.current_input_index,
            "received AdvanceState"
        );
        let session = self.sessions.get(id)?;
        let _lock = session.try_lock_session()?;
        let mut state = session.state().await;
        if state.active_epoch_index == u64::MAX {
            return Err(ManagerError::OutOfRange(
                "active epoch index will overflow".to_string(),
            ));
        }
        state.ensure_not_tainted()?;
        if state.active_epoch_index != request.active_epoch_index {
            return Err(ManagerError::InvalidArgument(format!(
                "incorrect active epoch index (expected {}, got {})",
                state.active_epoch_index, request.active_epoch_index
            )));
        }
        let max_input_payload_length = state.max_input_payload_length;
        let should_process = {
            let epoch = state.active_epoch_mut()?;
            if epoch.state != EpochState::Active {
                return Err(ManagerError::InvalidArgument("epoch is finished".to_string()));
            }
            let current_input_index = epoch.next_input_index();
            if current_input_index != request.current_input_index {
                return Err(ManagerError::InvalidArgument(format!(
                    "incorrect current input index (expected {current_input_index}, got {})",
                    request.current_input_index
                )));
            }
            if request.input_metadata.len() != INPUT_METADATA_LENGTH {
                return Err(ManagerError::InvalidArgument(format!(
                    "input metadata wrong size (expected {INPUT_METADATA_LENGTH} bytes, got {} bytes)",
                    request.input_metadata.len()
                )));
            }
            if request.input_payload.len() as u64 > max_input_payload_length {
                return Err(ManagerError::InvalidArgument(format!(
                    "input payload too long for rx buffer length (expected {max_input_payload_length} bytes max, got {} bytes)",
                    request.input_payload.len()
                )));
            }
            epoch.pending_inputs.push_back(PendingInput {
                metadata: request.input_metadata,
                payload: request.input_payload,
            });
            // Only the enqueue that makes the queue non-empty starts the
            // drain task; a running drain picks later inputs up itself.
            epoch.pending_inputs.len() == 1
        };
        if should_process && !state.processing {
            state.processing = true;
            processor::spawn(Arc::clone(&session), Arc::clone(&self.checkin));
        }
        Ok(())
    }

    async fn session_status(
        &self,
        request: GetSessionStatusRequest,
    ) -> Result<GetSessionStatusResponse> {
        let session = self.sessions.get(&request.session_id)?;
        let _lock = session.try_lock_session()?;
        let state = session.state().await;
        Ok(GetSessionStatusResponse {
            session_id: request.session_id,
            active_epoch_index: state.active_epoch_index,
            epoch_index: state.epochs.keys().copied().collect(),
            taint_status: state.tainted.as_ref().map(taint_to_proto),
        })
    }

    async fn epoch_status(&self, request: GetEpochStatusRequest) -> Result<GetEpochStatusResponse> {
        let session = self.sessions.get(&request.session_id)?;
        let _lock = session.try_lock_session()?;
        let state = session.state().await;
        let epoch = state
            .epochs
            .get(&request.epoch_index)
            .ok_or_else(|| ManagerError::InvalidArgument("unknown epoch index".to_string()))?;
        Ok(GetEpochStatusResponse {
            session_id: request.session_id,
            epoch_index: request.epoch_index,
            state: crate::proto::cartesi::rollup::v1::EpochState::from(epoch.state) as i32,
            processed_inputs: epoch.processed_inputs.iter().map(Into::into).collect(),
            pending_input_count: epoch.pending_inputs.len() as u64,
            taint_status: state.tainted.as_ref().map(taint_to_proto),
        })
    }

    fn check_in_inner(&self, request: CheckInRequest) -> Result<()> {
        info!(session_id = %request.session_id, address = %request.address, "received CheckIn");
        if !self.sessions.contains(&request.session_id) {
            return Err(ManagerError::InvalidArgument(format!(
                "could not find an actual session with id {}",
                request.session_id
            )));
        }
        self.checkin.resolve(&request.session_id, request.address)
    }
}

fn taint_to_proto(taint: &crate::error::TaintStatus) -> TaintStatus {
    TaintStatus {
        error_code: taint.code as u32,
        error_message: taint.message.clone(),
    }
}

#[tonic::async_trait]
impl MachineManager for ManagerService {
    async fn get_version(
        &self,
        _request: Request<Void>,
    ) -> std::result::Result<Response<GetVersionResponse>, Status> {
        debug!("received GetVersion");
        Ok(Response::new(GetVersionResponse {
            version: Some(SemanticVersion {
                major: MANAGER_VERSION_MAJOR,
                minor: MANAGER_VERSION_MINOR,
                patch: MANAGER_VERSION_PATCH,
                pre_release: MANAGER_VERSION_PRE_RELEASE.to_string(),
                build: MANAGER_VERSION_BUILD.to_string(),
            }),
        }))
    }

    async fn get_status(
        &self,
        _request: Request<Void>,
    ) -> std::result::Result<Response<GetStatusResponse>, Status> {
        debug!("received GetStatus");
        Ok(Response::new(GetStatusResponse {
            session_id: self.sessions.ids(),
        }))
    }

    async fn start_session(
        &self,
        request: Request<StartSessionRequest>,
    ) -> std::result::Result<Response<Void>, Status> {
        self.start_session_inner(request.into_inner())
            .await
            .map(|()| Response::new(Void {}))
            .map_err(Into::into)
    }

    async fn end_session(
        &self,
        request: Request<EndSessionRequest>,
    ) -> std::result::Result<Response<Void>, Status> {
        self.end_session_inner(request.into_inner())
            .await
            .map(|()| Response::new(Void {}))
            .map_err(Into::into)
    }

    async fn get_session_status(
        &self,
        request: Request<GetSessionStatusRequest>,
    ) -> std::result::Result<Response<GetSessionStatusResponse>, Status> {
        self.session_status(request.into_inner())
            .await
            .map(Response::new)
            .map_err(Into::into)
    }

    async fn get_epoch_status(
        &self,
        request: Request<GetEpochStatusRequest>,
    ) -> std::result::Result<Response<GetEpochStatusResponse>, Status> {
        self.epoch_status(request.into_inner())
            .await
            .map(Response::new)
            .map_err(Into::into)
    }

    async fn advance_state(
        &self,
        request: Request<AdvanceStateRequest>,
    ) -> std::result::Result<Response<Void>, Status> {
        self.advance_state_inner(request.into_inner())
            .await
            .map(|()| Response::new(Void {}))
            .map_err(Into::into)
    }

    async fn finish_epoch(
        &self,
        request: Request<FinishEpochRequest>,
    ) -> std::result::Result<Response<Void>, Status> {
        self.finish_epoch_inner(request.into_inner())
            .await
            .map(|()| Response::new(Void {}))
            .map_err(Into::into)
    }
}

#[tonic::async_trait]
impl MachineCheckIn for ManagerService {
    async fn check_in(
        &self,
        request: Request<CheckInRequest>,
    ) -> std::result::Result<Response<Void>, Status> {
        self.check_in_inner(request.into_inner())
            .map(|()| Response::new(Void {}))
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tonic::Code;

    use crate::machine::ServerProcess;
    use crate::proto::cartesi::machine::v1::{machine_request, MachineConfig, MachineRequest};
    use crate::proto::cartesi::rollup::v1::{CyclesConfig, DeadlineConfig};

    /// A launcher for tests that never get as far as spawning a server.
    struct NullLauncher;

    #[async_trait]
    impl MachineLauncher for NullLauncher {
        async fn launch(&self, _: &str, _: &str, _: &str) -> crate::error::Result<ServerProcess> {
            Err(ManagerError::Internal("no machine server in this test".to_string()))
        }
    }

    fn service() -> ManagerService {
        ManagerService::with_launcher(
            "localhost:5001".to_string(),
            "localhost:0".to_string(),
            Arc::new(NullLauncher),
        )
    }

    fn valid_request(id: &str) -> StartSessionRequest {
        StartSessionRequest {
            session_id: id.to_string(),
            active_epoch_index: 0,
            machine: Some(MachineRequest {
                machine_oneof: Some(machine_request::MachineOneof::Config(
                    MachineConfig::default(),
                )),
            }),
            server_deadline: Some(DeadlineConfig {
                checkin: 1_000,
                update_merkle_tree: 1_000,
                advance_state: 1_000,
                advance_state_increment: 100,
                inspect_state: 1_000,
                inspect_state_increment: 100,
                machine: 1_000,
                store: 1_000,
                fast: 1_000,
            }),
            server_cycles: Some(CyclesConfig {
                max_advance_state: 1_000,
                advance_state_increment: 100,
                max_inspect_state: 1_000,
                inspect_state_increment: 100,
            }),
        }
    }

    async fn start_session_err(service: &ManagerService, request: StartSessionRequest) -> Status {
        service
            .start_session(Request::new(request))
            .await
            .expect_err("start session should fail")
    }

    #[tokio::test]
    async fn get_version_reports_manager_version() {
        let response = service().get_version(Request::new(Void {})).await.unwrap();
        let version = response.into_inner().version.unwrap();
        assert_eq!(version.major, MANAGER_VERSION_MAJOR);
        assert_eq!(version.minor, MANAGER_VERSION_MINOR);
    }

    #[tokio::test]
    async fn start_session_rejects_empty_id() {
        let status = start_session_err(&service(), valid_request("")).await;
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "session id is empty");
    }

    #[tokio::test]
    async fn start_session_rejects_missing_machine_config() {
        let service = service();
        let mut request = valid_request("session");
        request.machine = None;
        let status = start_session_err(&service, request).await;
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "missing initial machine config");
        // The shell was erased, so the id is free again.
        let mut request = valid_request("session");
        request.machine = Some(MachineRequest { machine_oneof: None });
        let status = start_session_err(&service, request).await;
        assert_eq!(status.message(), "missing initial machine config");
    }

    #[tokio::test]
    async fn start_session_rejects_epoch_index_overflow() {
        let mut request = valid_request("session");
        request.active_epoch_index = u64::MAX;
        let status = start_session_err(&service(), request).await;
        assert_eq!(status.code(), Code::OutOfRange);
    }

    #[tokio::test]
    async fn start_session_rejects_missing_or_inverted_deadlines() {
        let service = service();
        let mut request = valid_request("session");
        request.server_deadline = None;
        let status = start_session_err(&service, request).await;
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "missing server deadline config");

        let mut request = valid_request("session");
        request.server_deadline.as_mut().unwrap().advance_state = 10;
        let status = start_session_err(&service, request).await;
        assert_eq!(
            status.message(),
            "advance state deadline is less than advance state increment deadline"
        );
    }

    #[tokio::test]
    async fn start_session_rejects_bad_cycle_budgets() {
        let service = service();
        let mut request = valid_request("session");
        request.server_cycles = None;
        let status = start_session_err(&service, request).await;
        assert_eq!(status.message(), "missing server cycles config");

        let mut request = valid_request("session");
        request.server_cycles.as_mut().unwrap().advance_state_increment = 0;
        let status = start_session_err(&service, request).await;
        assert_eq!(
            status.message(),
            "max cycles per advance state or cycles per advance state increment is zero"
        );

        let mut request = valid_request("session");
        request.server_cycles.as_mut().unwrap().max_advance_state = 10;
        let status = start_session_err(&service, request).await;
        assert_eq!(
            status.message(),
            "max cycles per advance state is less than cycles per advance state increment"
        );
    }

    #[tokio::test]
    async fn failed_start_session_frees_the_id() {
        let service = service();
        // NullLauncher fails the spawn, so the session must be erased.
        let status = start_session_err(&service, valid_request("session")).await;
        assert_eq!(status.code(), Code::Internal);
        let status = service
            .get_session_status(Request::new(GetSessionStatusRequest {
                session_id: "session".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "session id not found");
    }

    #[tokio::test]
    async fn rpcs_on_unknown_sessions_fail() {
        let service = service();
        let status = service
            .advance_state(Request::new(AdvanceStateRequest {
                session_id: "ghost".to_string(),
                active_epoch_index: 0,
                current_input_index: 0,
                input_metadata: vec![0; 128],
                input_payload: vec![],
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);

        let status = service
            .end_session(Request::new(EndSessionRequest {
                session_id: "ghost".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);

        let status = service
            .finish_epoch(Request::new(FinishEpochRequest {
                session_id: "ghost".to_string(),
                active_epoch_index: 0,
                processed_input_count: 0,
                storage_directory: String::new(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn check_in_without_waiting_session_fails() {
        let service = service();
        let status = service
            .check_in(Request::new(CheckInRequest {
                session_id: "ghost".to_string(),
                address: "localhost:5002".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn get_status_lists_no_sessions_initially() {
        let response = service().get_status(Request::new(Void {})).await.unwrap();
        assert!(response.into_inner().session_id.is_empty());
    }
}
