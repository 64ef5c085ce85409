// @generated
/// Void is an empty message, used by operations that carry no payload.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Void {
}
/// Hash is a 32-byte Keccak-256 digest.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Hash {
    /// data holds exactly 32 bytes.
    #[prost(bytes="vec", tag="1")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}
/// MerkleTreeProof is an inclusion witness for a tree node.
///
/// sibling_hashes is ordered bottom-up: entry 0 is the sibling at the target
/// level, the last entry is the sibling immediately below the root.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MerkleTreeProof {
    /// target_address is the address of the target node within the tree.
    #[prost(uint64, tag="1")]
    pub target_address: u64,
    /// log2_target_size is the log2 of the target node size.
    #[prost(uint64, tag="2")]
    pub log2_target_size: u64,
    /// target_hash is the hash of the target node.
    #[prost(message, optional, tag="3")]
    pub target_hash: ::core::option::Option<Hash>,
    /// log2_root_size is the log2 of the tree size.
    #[prost(uint64, tag="4")]
    pub log2_root_size: u64,
    /// root_hash is the hash of the tree root.
    #[prost(message, optional, tag="5")]
    pub root_hash: ::core::option::Option<Hash>,
    /// sibling_hashes are the hashes along the path from target to root.
    #[prost(message, repeated, tag="6")]
    pub sibling_hashes: ::prost::alloc::vec::Vec<Hash>,
}
/// SemanticVersion describes a semantic version number.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SemanticVersion {
    #[prost(uint32, tag="1")]
    pub major: u32,
    #[prost(uint32, tag="2")]
    pub minor: u32,
    #[prost(uint32, tag="3")]
    pub patch: u32,
    #[prost(string, tag="4")]
    pub pre_release: ::prost::alloc::string::String,
    #[prost(string, tag="5")]
    pub build: ::prost::alloc::string::String,
}
/// GetVersionResponse is the response type for GetVersion.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetVersionResponse {
    /// version is the server's semantic version.
    #[prost(message, optional, tag="1")]
    pub version: ::core::option::Option<SemanticVersion>,
}
/// ProcessorConfig holds the processor state the manager cares about.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProcessorConfig {
    /// mcycle is the machine's execution-cycle counter.
    #[prost(uint64, tag="1")]
    pub mcycle: u64,
}
/// HtifConfig holds the host-target interface device configuration.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HtifConfig {
    /// console_getchar enables the console getchar device.
    #[prost(bool, tag="1")]
    pub console_getchar: bool,
    /// yield_manual enables manual yields.
    #[prost(bool, tag="2")]
    pub yield_manual: bool,
    /// yield_automatic enables automatic yields.
    #[prost(bool, tag="3")]
    pub yield_automatic: bool,
}
/// MemoryRangeConfig describes one memory range of the machine.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MemoryRangeConfig {
    /// start is the first address of the range.
    #[prost(uint64, tag="1")]
    pub start: u64,
    /// length is the range length in bytes.
    #[prost(uint64, tag="2")]
    pub length: u64,
    /// shared maps the range as shared memory.
    #[prost(bool, tag="3")]
    pub shared: bool,
    /// image_filename is the backing image, empty for a pristine range.
    #[prost(string, tag="4")]
    pub image_filename: ::prost::alloc::string::String,
}
/// RollupConfig names the five rollup memory ranges.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RollupConfig {
    /// rx_buffer receives inputs and queries.
    #[prost(message, optional, tag="1")]
    pub rx_buffer: ::core::option::Option<MemoryRangeConfig>,
    /// tx_buffer emits vouchers, notices and reports.
    #[prost(message, optional, tag="2")]
    pub tx_buffer: ::core::option::Option<MemoryRangeConfig>,
    /// input_metadata receives input metadata.
    #[prost(message, optional, tag="3")]
    pub input_metadata: ::core::option::Option<MemoryRangeConfig>,
    /// voucher_hashes accumulates the hashes of emitted vouchers.
    #[prost(message, optional, tag="4")]
    pub voucher_hashes: ::core::option::Option<MemoryRangeConfig>,
    /// notice_hashes accumulates the hashes of emitted notices.
    #[prost(message, optional, tag="5")]
    pub notice_hashes: ::core::option::Option<MemoryRangeConfig>,
}
/// MachineConfig is the machine configuration reported by the server.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MachineConfig {
    #[prost(message, optional, tag="1")]
    pub processor: ::core::option::Option<ProcessorConfig>,
    #[prost(message, optional, tag="2")]
    pub htif: ::core::option::Option<HtifConfig>,
    #[prost(message, optional, tag="3")]
    pub rollup: ::core::option::Option<RollupConfig>,
}
/// MachineRequest instantiates a machine from a config or a stored directory.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MachineRequest {
    #[prost(oneof="machine_request::MachineOneof", tags="1, 2")]
    pub machine_oneof: ::core::option::Option<machine_request::MachineOneof>,
}
/// Nested message and enum types in `MachineRequest`.
pub mod machine_request {
    #[allow(clippy::derive_partial_eq_without_eq)]
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum MachineOneof {
        #[prost(message, tag="1")]
        Config(super::MachineConfig),
        #[prost(string, tag="2")]
        Directory(::prost::alloc::string::String),
    }
}
/// GetInitialConfigResponse is the response type for GetInitialConfig.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetInitialConfigResponse {
    #[prost(message, optional, tag="1")]
    pub config: ::core::option::Option<MachineConfig>,
}
/// RunRequest asks the machine to run until the given mcycle limit.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RunRequest {
    #[prost(uint64, tag="1")]
    pub limit: u64,
}
/// RunResponse reports the machine state when the run stopped.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RunResponse {
    /// mcycle is the cycle counter where the run stopped.
    #[prost(uint64, tag="1")]
    pub mcycle: u64,
    /// tohost is the HTIF tohost register; bits 47:32 carry the yield reason.
    #[prost(uint64, tag="2")]
    pub tohost: u64,
    /// iflags_h is set when the machine halted.
    #[prost(bool, tag="3")]
    pub iflags_h: bool,
    /// iflags_y is set on a manual yield.
    #[prost(bool, tag="4")]
    pub iflags_y: bool,
    /// iflags_x is set on an automatic yield.
    #[prost(bool, tag="5")]
    pub iflags_x: bool,
}
/// ReadMemoryRequest is the request type for ReadMemory.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReadMemoryRequest {
    #[prost(uint64, tag="1")]
    pub address: u64,
    #[prost(uint64, tag="2")]
    pub length: u64,
}
/// ReadMemoryResponse is the response type for ReadMemory.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReadMemoryResponse {
    #[prost(bytes="vec", tag="1")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}
/// WriteMemoryRequest is the request type for WriteMemory.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WriteMemoryRequest {
    #[prost(uint64, tag="1")]
    pub address: u64,
    #[prost(bytes="vec", tag="2")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}
/// ReplaceMemoryRangeRequest replaces a memory range with a fresh one.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReplaceMemoryRangeRequest {
    #[prost(message, optional, tag="1")]
    pub config: ::core::option::Option<MemoryRangeConfig>,
}
/// GetProofRequest asks for a Merkle proof of a machine state node.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetProofRequest {
    #[prost(uint64, tag="1")]
    pub address: u64,
    #[prost(uint64, tag="2")]
    pub log2_size: u64,
}
/// GetProofResponse is the response type for GetProof.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetProofResponse {
    #[prost(message, optional, tag="1")]
    pub proof: ::core::option::Option<MerkleTreeProof>,
}
/// GetRootHashResponse is the response type for GetRootHash.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRootHashResponse {
    #[prost(message, optional, tag="1")]
    pub hash: ::core::option::Option<Hash>,
}
/// UpdateMerkleTreeResponse is the response type for UpdateMerkleTree.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateMerkleTreeResponse {
    #[prost(bool, tag="1")]
    pub success: bool,
}
/// StoreRequest stores the machine to a directory.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StoreRequest {
    #[prost(string, tag="1")]
    pub directory: ::prost::alloc::string::String,
}
include!("cartesi.machine.v1.tonic.rs");
// @@protoc_insertion_point(module)
