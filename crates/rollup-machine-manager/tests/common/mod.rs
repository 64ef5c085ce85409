//! Test harness: a scripted machine server served over local gRPC, and a
//! launcher that performs the check-in a spawned child would.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use rollup_merkle::{keccak, CompleteMerkleTree, Hash, ZERO_HASH};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use rollup_machine_manager::error::Result as ManagerResult;
use rollup_machine_manager::machine::convert::proof_to_proto;
use rollup_machine_manager::machine::ranges::count_hash_entries;
use rollup_machine_manager::machine::{MachineLauncher, ServerProcess};
use rollup_machine_manager::proto::cartesi::machine::v1::machine_server::{
    Machine as MachineService, MachineServer,
};
use rollup_machine_manager::proto::cartesi::machine::v1::{
    GetInitialConfigResponse, GetProofRequest, GetProofResponse, GetRootHashResponse,
    GetVersionResponse, HtifConfig, MachineConfig, MachineRequest, MemoryRangeConfig,
    ProcessorConfig, ReadMemoryRequest, ReadMemoryResponse, ReplaceMemoryRangeRequest,
    RollupConfig, RunRequest, RunResponse, SemanticVersion, StoreRequest,
    UpdateMerkleTreeResponse, Void, WriteMemoryRequest,
};
use rollup_machine_manager::proto::cartesi::rollup::v1::machine_check_in_server::MachineCheckIn;
use rollup_machine_manager::proto::cartesi::rollup::v1::machine_manager_server::MachineManager;
use rollup_machine_manager::proto::cartesi::rollup::v1::{
    AdvanceStateRequest, CheckInRequest, CyclesConfig, DeadlineConfig, GetEpochStatusRequest,
    GetEpochStatusResponse, StartSessionRequest,
};
use rollup_machine_manager::server::ManagerService;

pub const RANGE_LENGTH: u64 = 4096;
pub const RANGE_LOG2: u64 = 12;
pub const RX_START: u64 = 0x6000_0000;
pub const TX_START: u64 = 0x6001_0000;
pub const METADATA_START: u64 = 0x6002_0000;
pub const VOUCHER_HASHES_START: u64 = 0x6003_0000;
pub const NOTICE_HASHES_START: u64 = 0x6004_0000;

const RANGE_STARTS: [u64; 5] = [
    RX_START,
    TX_START,
    METADATA_START,
    VOUCHER_HASHES_START,
    NOTICE_HASHES_START,
];

/// One scripted reaction to a Run call; consumed front to back, except
/// `Spin`, which keeps answering every Run.
#[derive(Debug, Clone)]
pub enum RunStep {
    Voucher {
        address: Hash,
        payload: Vec<u8>,
        write_hash: bool,
    },
    Notice {
        payload: Vec<u8>,
    },
    Report {
        payload: Vec<u8>,
    },
    Accept,
    Reject,
    Halt,
    Spin {
        sleep_ms: u64,
    },
}

pub struct Shared {
    manager: OnceLock<Arc<ManagerService>>,
    session_id: Mutex<String>,
    address: Mutex<String>,
    script: Mutex<VecDeque<RunStep>>,
    memory: Mutex<HashMap<u64, Vec<u8>>>,
    mcycle: Mutex<u64>,
    snapshot_mcycle: Mutex<u64>,
}

/// In-process stand-in for a cartesi machine server.
#[derive(Clone)]
pub struct MachineSim {
    shared: Arc<Shared>,
}

impl MachineSim {
    pub fn new(script: Vec<RunStep>) -> Self {
        let mut memory = HashMap::new();
        for start in RANGE_STARTS {
            memory.insert(start, vec![0u8; RANGE_LENGTH as usize]);
        }
        MachineSim {
            shared: Arc::new(Shared {
                manager: OnceLock::new(),
                session_id: Mutex::new(String::new()),
                address: Mutex::new(String::new()),
                script: Mutex::new(script.into()),
                memory: Mutex::new(memory),
                mcycle: Mutex::new(0),
                snapshot_mcycle: Mutex::new(0),
            }),
        }
    }

    fn locate(address: u64) -> Result<(u64, usize), Status> {
        RANGE_STARTS
            .into_iter()
            .find(|start| address >= *start && address < start + RANGE_LENGTH)
            .map(|start| (start, (address - start) as usize))
            .ok_or_else(|| Status::invalid_argument("address outside any memory range"))
    }

    /// A freshly forked server advertises itself back to the manager.
    fn trigger_checkin(&self) {
        let manager = self.shared.manager.get().cloned();
        let session_id = self.shared.session_id.lock().unwrap().clone();
        let address = self.shared.address.lock().unwrap().clone();
        tokio::spawn(async move {
            if let Some(manager) = manager {
                let _ = manager
                    .check_in(Request::new(CheckInRequest { session_id, address }))
                    .await;
            }
        });
    }

    fn write_tx_frame(&self, prefix: &[u8], payload: &[u8], payload_offset: usize) {
        let mut memory = self.shared.memory.lock().unwrap();
        let tx = memory.get_mut(&TX_START).unwrap();
        tx.fill(0);
        tx[..prefix.len()].copy_from_slice(prefix);
        tx[payload_offset..payload_offset + payload.len()].copy_from_slice(payload);
    }

    fn append_hash(&self, range_start: u64, hash: Hash) {
        let mut memory = self.shared.memory.lock().unwrap();
        let range = memory.get_mut(&range_start).unwrap();
        let slot = count_hash_entries(range) as usize * 32;
        range[slot..slot + 32].copy_from_slice(&hash);
    }
}

fn length_field(length: u64) -> [u8; 32] {
    let mut field = [0u8; 32];
    field[24..].copy_from_slice(&length.to_be_bytes());
    field
}

#[tonic::async_trait]
impl MachineService for MachineSim {
    async fn get_version(&self, _: Request<Void>) -> Result<Response<GetVersionResponse>, Status> {
        Ok(Response::new(GetVersionResponse {
            version: Some(SemanticVersion {
                major: 0,
                minor: 5,
                patch: 0,
                pre_release: String::new(),
                build: String::new(),
            }),
        }))
    }

    async fn machine(&self, _: Request<MachineRequest>) -> Result<Response<Void>, Status> {
        Ok(Response::new(Void {}))
    }

    async fn get_initial_config(
        &self,
        _: Request<Void>,
    ) -> Result<Response<GetInitialConfigResponse>, Status> {
        let range = |start: u64| {
            Some(MemoryRangeConfig {
                start,
                length: RANGE_LENGTH,
                shared: false,
                image_filename: String::new(),
            })
        };
        Ok(Response::new(GetInitialConfigResponse {
            config: Some(MachineConfig {
                processor: Some(ProcessorConfig { mcycle: 0 }),
                htif: Some(HtifConfig {
                    console_getchar: false,
                    yield_manual: true,
                    yield_automatic: true,
                }),
                rollup: Some(RollupConfig {
                    rx_buffer: range(RX_START),
                    tx_buffer: range(TX_START),
                    input_metadata: range(METADATA_START),
                    voucher_hashes: range(VOUCHER_HASHES_START),
                    notice_hashes: range(NOTICE_HASHES_START),
                }),
            }),
        }))
    }

    async fn run(&self, request: Request<RunRequest>) -> Result<Response<RunResponse>, Status> {
        let limit = request.into_inner().limit;
        let step = {
            let mut script = self.shared.script.lock().unwrap();
            if matches!(script.front(), Some(RunStep::Spin { .. })) {
                // A spinning program keeps answering every Run until the
                // manager gives up on the input.
                script.front().cloned().unwrap()
            } else {
                script.pop_front().unwrap_or(RunStep::Halt)
            }
        };
        let mut response = RunResponse {
            mcycle: 0,
            tohost: 0,
            iflags_h: false,
            iflags_y: false,
            iflags_x: false,
        };
        let mut mcycle = self.shared.mcycle.lock().unwrap();
        match step {
            RunStep::Spin { sleep_ms } => {
                drop(mcycle);
                if sleep_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
                }
                *self.shared.mcycle.lock().unwrap() = limit;
                response.mcycle = limit;
                return Ok(Response::new(response));
            }
            RunStep::Accept => {
                *mcycle += 1;
                response.iflags_y = true;
                response.tohost = 1 << 32;
            }
            RunStep::Reject => {
                *mcycle += 1;
                response.iflags_y = true;
                response.tohost = 2 << 32;
            }
            RunStep::Halt => {
                *mcycle += 1;
                response.iflags_h = true;
            }
            RunStep::Voucher {
                address,
                payload,
                write_hash,
            } => {
                *mcycle += 1;
                response.iflags_x = true;
                response.tohost = 3 << 32;
                let mut prefix = Vec::with_capacity(96);
                prefix.extend_from_slice(&address);
                prefix.extend_from_slice(&[0u8; 32]);
                prefix.extend_from_slice(&length_field(payload.len() as u64));
                drop(mcycle);
                self.write_tx_frame(&prefix, &payload, 96);
                if write_hash {
                    self.append_hash(VOUCHER_HASHES_START, keccak(&payload));
                }
                response.mcycle = *self.shared.mcycle.lock().unwrap();
                return Ok(Response::new(response));
            }
            RunStep::Notice { payload } => {
                *mcycle += 1;
                response.iflags_x = true;
                response.tohost = 4 << 32;
                let mut prefix = Vec::with_capacity(64);
                prefix.extend_from_slice(&[0u8; 32]);
                prefix.extend_from_slice(&length_field(payload.len() as u64));
                drop(mcycle);
                self.write_tx_frame(&prefix, &payload, 64);
                self.append_hash(NOTICE_HASHES_START, keccak(&payload));
                response.mcycle = *self.shared.mcycle.lock().unwrap();
                return Ok(Response::new(response));
            }
            RunStep::Report { payload } => {
                *mcycle += 1;
                response.iflags_x = true;
                response.tohost = 5 << 32;
                let mut prefix = Vec::with_capacity(64);
                prefix.extend_from_slice(&[0u8; 32]);
                prefix.extend_from_slice(&length_field(payload.len() as u64));
                drop(mcycle);
                self.write_tx_frame(&prefix, &payload, 64);
                response.mcycle = *self.shared.mcycle.lock().unwrap();
                return Ok(Response::new(response));
            }
        }
        response.mcycle = *mcycle;
        Ok(Response::new(response))
    }

    async fn read_memory(
        &self,
        request: Request<ReadMemoryRequest>,
    ) -> Result<Response<ReadMemoryResponse>, Status> {
        let request = request.into_inner();
        let (start, offset) = Self::locate(request.address)?;
        let memory = self.shared.memory.lock().unwrap();
        let range = &memory[&start];
        let end = offset + request.length as usize;
        if end > range.len() {
            return Err(Status::invalid_argument("read beyond range"));
        }
        Ok(Response::new(ReadMemoryResponse {
            data: range[offset..end].to_vec(),
        }))
    }

    async fn write_memory(
        &self,
        request: Request<WriteMemoryRequest>,
    ) -> Result<Response<Void>, Status> {
        let request = request.into_inner();
        let (start, offset) = Self::locate(request.address)?;
        let mut memory = self.shared.memory.lock().unwrap();
        let range = memory.get_mut(&start).unwrap();
        let end = offset + request.data.len();
        if end > range.len() {
            return Err(Status::invalid_argument("write beyond range"));
        }
        range[offset..end].copy_from_slice(&request.data);
        Ok(Response::new(Void {}))
    }

    async fn replace_memory_range(
        &self,
        request: Request<ReplaceMemoryRangeRequest>,
    ) -> Result<Response<Void>, Status> {
        let config = request
            .into_inner()
            .config
            .ok_or_else(|| Status::invalid_argument("missing range config"))?;
        let (start, _) = Self::locate(config.start)?;
        self.shared
            .memory
            .lock()
            .unwrap()
            .get_mut(&start)
            .unwrap()
            .fill(0);
        Ok(Response::new(Void {}))
    }

    async fn snapshot(&self, _: Request<Void>) -> Result<Response<Void>, Status> {
        *self.shared.snapshot_mcycle.lock().unwrap() = *self.shared.mcycle.lock().unwrap();
        self.trigger_checkin();
        Ok(Response::new(Void {}))
    }

    async fn rollback(&self, _: Request<Void>) -> Result<Response<Void>, Status> {
        // The rolled-back machine forgets the spinning program; the cycle
        // counter reverts to the snapshot.
        *self.shared.mcycle.lock().unwrap() = *self.shared.snapshot_mcycle.lock().unwrap();
        let mut script = self.shared.script.lock().unwrap();
        if matches!(script.front(), Some(RunStep::Spin { .. })) {
            script.pop_front();
        }
        drop(script);
        self.trigger_checkin();
        Ok(Response::new(Void {}))
    }

    async fn reset_iflags_y(&self, _: Request<Void>) -> Result<Response<Void>, Status> {
        Ok(Response::new(Void {}))
    }

    async fn update_merkle_tree(
        &self,
        _: Request<Void>,
    ) -> Result<Response<UpdateMerkleTreeResponse>, Status> {
        Ok(Response::new(UpdateMerkleTreeResponse { success: true }))
    }

    async fn get_root_hash(&self, _: Request<Void>) -> Result<Response<GetRootHashResponse>, Status> {
        let mcycle = *self.shared.mcycle.lock().unwrap();
        Ok(Response::new(GetRootHashResponse {
            hash: Some(rollup_machine_manager::proto::cartesi::machine::v1::Hash {
                data: keccak(&mcycle.to_be_bytes()).to_vec(),
            }),
        }))
    }

    async fn get_proof(
        &self,
        request: Request<GetProofRequest>,
    ) -> Result<Response<GetProofResponse>, Status> {
        let request = request.into_inner();
        let (start, offset) = Self::locate(request.address)?;
        let memory = self.shared.memory.lock().unwrap();
        let range = &memory[&start];
        let mut tree = CompleteMerkleTree::new(RANGE_LOG2 as u32, 5, 5);
        for chunk in range.chunks(32) {
            let leaf: Hash = chunk.try_into().unwrap();
            tree.push_back(leaf).unwrap();
        }
        // Machine state proofs are rooted at the full 64-bit address space;
        // only the levels below the range root are real, which is all the
        // manager ever looks at.
        let proof = if request.log2_size == RANGE_LOG2 {
            rollup_merkle::Proof {
                target_address: request.address,
                log2_target_size: RANGE_LOG2 as u32,
                target_hash: tree.root(),
                log2_root_size: 64,
                root_hash: ZERO_HASH,
                sibling_hashes: vec![ZERO_HASH; (64 - RANGE_LOG2) as usize],
            }
        } else if request.log2_size == 5 {
            let inner = tree.get_proof(offset as u64, 5).unwrap();
            let mut sibling_hashes = inner.sibling_hashes;
            sibling_hashes.resize((64 - 5) as usize, ZERO_HASH);
            rollup_merkle::Proof {
                target_address: request.address,
                log2_target_size: 5,
                target_hash: inner.target_hash,
                log2_root_size: 64,
                root_hash: ZERO_HASH,
                sibling_hashes,
            }
        } else {
            return Err(Status::invalid_argument("unexpected proof size"));
        };
        Ok(Response::new(GetProofResponse {
            proof: Some(proof_to_proto(&proof)),
        }))
    }

    async fn store(&self, _: Request<StoreRequest>) -> Result<Response<Void>, Status> {
        Ok(Response::new(Void {}))
    }

    async fn shutdown(&self, _: Request<Void>) -> Result<Response<Void>, Status> {
        Ok(Response::new(Void {}))
    }
}

/// Performs the check-in a spawned child process would.
pub struct SimLauncher {
    shared: Arc<Shared>,
}

#[async_trait]
impl MachineLauncher for SimLauncher {
    async fn launch(
        &self,
        session_id: &str,
        _checkin_address: &str,
        _server_address: &str,
    ) -> ManagerResult<ServerProcess> {
        *self.shared.session_id.lock().unwrap() = session_id.to_string();
        MachineSim {
            shared: Arc::clone(&self.shared),
        }
        .trigger_checkin();
        Ok(ServerProcess::default())
    }
}

pub struct TestHarness {
    pub manager: Arc<ManagerService>,
    pub sim: MachineSim,
}

/// Serves a scripted machine on a local port and wires a manager to it.
pub async fn setup(script: Vec<RunStep>) -> TestHarness {
    let sim = MachineSim::new(script);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
    *sim.shared.address.lock().unwrap() = address;
    tokio::spawn(
        Server::builder()
            .add_service(MachineServer::new(sim.clone()))
            .serve_with_incoming(TcpListenerStream::new(listener)),
    );
    let manager = Arc::new(ManagerService::with_launcher(
        "127.0.0.1:0".to_string(),
        "localhost:0".to_string(),
        Arc::new(SimLauncher {
            shared: Arc::clone(&sim.shared),
        }),
    ));
    sim.shared.manager.set(Arc::clone(&manager)).ok();
    TestHarness { manager, sim }
}

pub fn deadline_config() -> DeadlineConfig {
    DeadlineConfig {
        checkin: 5_000,
        update_merkle_tree: 5_000,
        advance_state: 5_000,
        advance_state_increment: 5_000,
        inspect_state: 5_000,
        inspect_state_increment: 5_000,
        machine: 5_000,
        store: 5_000,
        fast: 5_000,
    }
}

pub fn cycles_config() -> CyclesConfig {
    CyclesConfig {
        max_advance_state: 1_000_000,
        advance_state_increment: 100_000,
        max_inspect_state: 1_000_000,
        inspect_state_increment: 100_000,
    }
}

pub fn start_session_request(id: &str) -> StartSessionRequest {
    StartSessionRequest {
        session_id: id.to_string(),
        active_epoch_index: 0,
        machine: Some(MachineRequest {
            machine_oneof: Some(
                rollup_machine_manager::proto::cartesi::machine::v1::machine_request::MachineOneof::Config(
                    MachineConfig::default(),
                ),
            ),
        }),
        server_deadline: Some(deadline_config()),
        server_cycles: Some(cycles_config()),
    }
}

pub async fn start_session(harness: &TestHarness, id: &str) {
    harness
        .manager
        .start_session(Request::new(start_session_request(id)))
        .await
        .expect("start session");
}

pub async fn advance(harness: &TestHarness, id: &str, epoch: u64, index: u64, payload: &[u8]) {
    harness
        .manager
        .advance_state(Request::new(AdvanceStateRequest {
            session_id: id.to_string(),
            active_epoch_index: epoch,
            current_input_index: index,
            input_metadata: vec![0u8; 128],
            input_payload: payload.to_vec(),
        }))
        .await
        .expect("advance state");
}

pub async fn epoch_status(
    harness: &TestHarness,
    id: &str,
    epoch: u64,
) -> Result<GetEpochStatusResponse, Status> {
    harness
        .manager
        .get_epoch_status(Request::new(GetEpochStatusRequest {
            session_id: id.to_string(),
            epoch_index: epoch,
        }))
        .await
        .map(|response| response.into_inner())
}

/// Polls until the epoch reports the expected number of processed inputs
/// and an empty pending queue. Concurrent locking by the processor shows
/// up as Aborted; that just means "try again".
pub async fn wait_processed(
    harness: &TestHarness,
    id: &str,
    epoch: u64,
    count: usize,
) -> GetEpochStatusResponse {
    for _ in 0..500 {
        match epoch_status(harness, id, epoch).await {
            Ok(status)
                if status.pending_input_count == 0 && status.processed_inputs.len() == count =>
            {
                return status;
            }
            Ok(_) => {}
            Err(status) if status.code() == tonic::Code::Aborted => {}
            Err(status) => panic!("epoch status failed: {status}"),
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {count} processed inputs");
}
