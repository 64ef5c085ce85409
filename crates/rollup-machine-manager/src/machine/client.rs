//! Typed client for the machine server RPC surface.
//!
//! Every call carries a deadline drawn from the session's `Deadlines`,
//! enforced client-side. Whether a failed call taints the session or is
//! surfaced to the originating RPC is decided by the caller.

use std::future::Future;
use std::time::Duration;

use rollup_merkle::{Hash, Proof};
use tokio::time::timeout;
use tonic::transport::Channel;
use tonic::Status;
use tracing::debug;

use crate::error::{ManagerError, Result};
use crate::machine::convert::{hash_from_proto, proof_from_proto};
use crate::proto::cartesi::machine::v1::machine_client::MachineClient as MachineStub;
use crate::proto::cartesi::machine::v1::{
    GetProofRequest, MachineConfig, MachineRequest, MemoryRangeConfig, ReadMemoryRequest,
    ReplaceMemoryRangeRequest, RunRequest, RunResponse, SemanticVersion, StoreRequest, Void,
    WriteMemoryRequest,
};
use crate::session::Deadlines;

/// Connection to one session's machine server.
#[derive(Debug, Clone)]
pub struct MachineClient {
    stub: MachineStub<Channel>,
    deadlines: Deadlines,
}

fn endpoint_uri(address: &str) -> String {
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}

impl MachineClient {
    /// Connects to the machine server the session's child advertised.
    pub async fn connect(address: &str, deadlines: Deadlines) -> Result<Self> {
        debug!(address, "connecting to machine server");
        let stub = MachineStub::connect(endpoint_uri(address))
            .await
            .map_err(|e| {
                ManagerError::ResourceExhausted(format!(
                    "unable to create machine stub for session at {address} ({e})"
                ))
            })?;
        Ok(MachineClient { stub, deadlines })
    }

    async fn unary<T, F>(&self, deadline: u64, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<tonic::Response<T>, Status>>,
    {
        match timeout(Duration::from_millis(deadline), call).await {
            Ok(Ok(response)) => Ok(response.into_inner()),
            Ok(Err(status)) => Err(status.into()),
            Err(_) => Err(ManagerError::DeadlineExceeded(format!(
                "machine server call did not complete within {deadline}ms"
            ))),
        }
    }

    pub async fn get_version(&self) -> Result<SemanticVersion> {
        let mut stub = self.stub.clone();
        let response = self
            .unary(self.deadlines.fast, async move {
                stub.get_version(Void {}).await
            })
            .await?;
        response
            .version
            .ok_or_else(|| ManagerError::Internal("machine server sent no version".to_string()))
    }

    pub async fn create_machine(&self, request: MachineRequest) -> Result<()> {
        let mut stub = self.stub.clone();
        self.unary(self.deadlines.machine, async move {
            stub.machine(request).await
        })
        .await?;
        Ok(())
    }

    pub async fn get_initial_config(&self) -> Result<MachineConfig> {
        let mut stub = self.stub.clone();
        let response = self
            .unary(self.deadlines.fast, async move {
                stub.get_initial_config(Void {}).await
            })
            .await?;
        response
            .config
            .ok_or_else(|| ManagerError::Internal("machine server sent no config".to_string()))
    }

    /// Runs the machine until the given mcycle limit, a yield, or a halt.
    pub async fn run(&self, limit: u64) -> Result<RunResponse> {
        let mut stub = self.stub.clone();
        self.unary(self.deadlines.advance_state_increment, async move {
            stub.run(RunRequest { limit }).await
        })
        .await
    }

    pub async fn read_memory(&self, address: u64, length: u64) -> Result<Vec<u8>> {
        let mut stub = self.stub.clone();
        let response = self
            .unary(self.deadlines.fast, async move {
                stub.read_memory(ReadMemoryRequest { address, length }).await
            })
            .await?;
        if response.data.len() as u64 != length {
            return Err(ManagerError::Internal(
                "read returned wrong number of bytes".to_string(),
            ));
        }
        Ok(response.data)
    }

    pub async fn write_memory(&self, address: u64, data: Vec<u8>) -> Result<()> {
        let mut stub = self.stub.clone();
        self.unary(self.deadlines.fast, async move {
            stub.write_memory(WriteMemoryRequest { address, data }).await
        })
        .await?;
        Ok(())
    }

    pub async fn replace_memory_range(&self, config: MemoryRangeConfig) -> Result<()> {
        let mut stub = self.stub.clone();
        self.unary(self.deadlines.fast, async move {
            stub.replace_memory_range(ReplaceMemoryRangeRequest {
                config: Some(config),
            })
            .await
        })
        .await?;
        Ok(())
    }

    pub async fn snapshot(&self) -> Result<()> {
        let mut stub = self.stub.clone();
        self.unary(self.deadlines.fast, async move { stub.snapshot(Void {}).await })
            .await?;
        Ok(())
    }

    pub async fn rollback(&self) -> Result<()> {
        let mut stub = self.stub.clone();
        self.unary(self.deadlines.fast, async move { stub.rollback(Void {}).await })
            .await?;
        Ok(())
    }

    pub async fn reset_iflags_y(&self) -> Result<()> {
        let mut stub = self.stub.clone();
        self.unary(self.deadlines.fast, async move {
            stub.reset_iflags_y(Void {}).await
        })
        .await?;
        Ok(())
    }

    pub async fn update_merkle_tree(&self) -> Result<()> {
        let mut stub = self.stub.clone();
        let response = self
            .unary(self.deadlines.update_merkle_tree, async move {
                stub.update_merkle_tree(Void {}).await
            })
            .await?;
        if !response.success {
            return Err(ManagerError::Internal(
                "failed updating merkle tree".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn get_root_hash(&self) -> Result<Hash> {
        let mut stub = self.stub.clone();
        let response = self
            .unary(self.deadlines.fast, async move {
                stub.get_root_hash(Void {}).await
            })
            .await?;
        hash_from_proto(response.hash)
    }

    pub async fn get_proof(&self, address: u64, log2_size: u64) -> Result<Proof> {
        let mut stub = self.stub.clone();
        let response = self
            .unary(self.deadlines.fast, async move {
                stub.get_proof(GetProofRequest { address, log2_size }).await
            })
            .await?;
        proof_from_proto(response.proof)
    }

    pub async fn store(&self, directory: String) -> Result<()> {
        let mut stub = self.stub.clone();
        self.unary(self.deadlines.store, async move {
            stub.store(StoreRequest { directory }).await
        })
        .await?;
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<()> {
        let mut stub = self.stub.clone();
        self.unary(self.deadlines.fast, async move { stub.shutdown(Void {}).await })
            .await?;
        Ok(())
    }
}
