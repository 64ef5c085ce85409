// @generated
/// GetStatusResponse lists the ids of every known session.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetStatusResponse {
    #[prost(string, repeated, tag="1")]
    pub session_id: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}
/// DeadlineConfig holds the deadlines, in milliseconds, for the machine
/// server operations issued on behalf of a session.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeadlineConfig {
    /// checkin bounds the wait for a spawned server's check-in.
    #[prost(uint64, tag="1")]
    pub checkin: u64,
    /// update_merkle_tree bounds the UpdateMerkleTree call.
    #[prost(uint64, tag="2")]
    pub update_merkle_tree: u64,
    /// advance_state bounds the whole processing of one input.
    #[prost(uint64, tag="3")]
    pub advance_state: u64,
    /// advance_state_increment bounds a single Run increment.
    #[prost(uint64, tag="4")]
    pub advance_state_increment: u64,
    /// inspect_state bounds the whole processing of one query.
    #[prost(uint64, tag="5")]
    pub inspect_state: u64,
    /// inspect_state_increment bounds a single query Run increment.
    #[prost(uint64, tag="6")]
    pub inspect_state_increment: u64,
    /// machine bounds machine instantiation.
    #[prost(uint64, tag="7")]
    pub machine: u64,
    /// store bounds storing a machine.
    #[prost(uint64, tag="8")]
    pub store: u64,
    /// fast bounds quick server operations.
    #[prost(uint64, tag="9")]
    pub fast: u64,
}
/// CyclesConfig holds the cycle budgets for machine runs.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CyclesConfig {
    /// max_advance_state caps the cycles one input may consume.
    #[prost(uint64, tag="1")]
    pub max_advance_state: u64,
    /// advance_state_increment is the cycle step of each Run call.
    #[prost(uint64, tag="2")]
    pub advance_state_increment: u64,
    /// max_inspect_state caps the cycles one query may consume.
    #[prost(uint64, tag="3")]
    pub max_inspect_state: u64,
    /// inspect_state_increment is the cycle step of each query Run call.
    #[prost(uint64, tag="4")]
    pub inspect_state_increment: u64,
}
/// StartSessionRequest is the request type for StartSession.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StartSessionRequest {
    #[prost(string, tag="1")]
    pub session_id: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub active_epoch_index: u64,
    #[prost(message, optional, tag="3")]
    pub machine: ::core::option::Option<super::super::machine::v1::MachineRequest>,
    #[prost(message, optional, tag="4")]
    pub server_deadline: ::core::option::Option<DeadlineConfig>,
    #[prost(message, optional, tag="5")]
    pub server_cycles: ::core::option::Option<CyclesConfig>,
}
/// EndSessionRequest is the request type for EndSession.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EndSessionRequest {
    #[prost(string, tag="1")]
    pub session_id: ::prost::alloc::string::String,
}
/// TaintStatus carries the error that tainted a session.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TaintStatus {
    /// error_code is the gRPC status code of the tainting error.
    #[prost(uint32, tag="1")]
    pub error_code: u32,
    #[prost(string, tag="2")]
    pub error_message: ::prost::alloc::string::String,
}
/// GetSessionStatusRequest is the request type for GetSessionStatus.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetSessionStatusRequest {
    #[prost(string, tag="1")]
    pub session_id: ::prost::alloc::string::String,
}
/// GetSessionStatusResponse is the response type for GetSessionStatus.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetSessionStatusResponse {
    #[prost(string, tag="1")]
    pub session_id: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub active_epoch_index: u64,
    /// epoch_index lists every epoch the session still holds.
    #[prost(uint64, repeated, tag="3")]
    pub epoch_index: ::prost::alloc::vec::Vec<u64>,
    /// taint_status is present when the session is tainted.
    #[prost(message, optional, tag="4")]
    pub taint_status: ::core::option::Option<TaintStatus>,
}
/// GetEpochStatusRequest is the request type for GetEpochStatus.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetEpochStatusRequest {
    #[prost(string, tag="1")]
    pub session_id: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub epoch_index: u64,
}
/// Voucher is a machine-emitted output intended for on-chain replay.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Voucher {
    /// address is the destination the voucher targets.
    #[prost(message, optional, tag="1")]
    pub address: ::core::option::Option<super::super::machine::v1::Hash>,
    #[prost(bytes="vec", tag="2")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
    /// keccak is the voucher hash the machine wrote, present after the
    /// input was accepted.
    #[prost(message, optional, tag="3")]
    pub keccak: ::core::option::Option<super::super::machine::v1::Hash>,
    /// keccak_in_voucher_hashes proves the hash within the voucher-hashes
    /// memory range.
    #[prost(message, optional, tag="4")]
    pub keccak_in_voucher_hashes: ::core::option::Option<super::super::machine::v1::MerkleTreeProof>,
}
/// Notice is a machine-emitted informational output.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Notice {
    #[prost(bytes="vec", tag="1")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
    /// keccak is the notice hash the machine wrote, present after the
    /// input was accepted.
    #[prost(message, optional, tag="2")]
    pub keccak: ::core::option::Option<super::super::machine::v1::Hash>,
    /// keccak_in_notice_hashes proves the hash within the notice-hashes
    /// memory range.
    #[prost(message, optional, tag="3")]
    pub keccak_in_notice_hashes: ::core::option::Option<super::super::machine::v1::MerkleTreeProof>,
}
/// Report is a machine-emitted diagnostic output; it is not accumulated.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Report {
    #[prost(bytes="vec", tag="1")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
}
/// InputResult holds the outputs of an accepted input.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InputResult {
    /// voucher_hashes_in_machine proves the voucher-hashes range in the
    /// machine state.
    #[prost(message, optional, tag="1")]
    pub voucher_hashes_in_machine: ::core::option::Option<super::super::machine::v1::MerkleTreeProof>,
    #[prost(message, repeated, tag="2")]
    pub vouchers: ::prost::alloc::vec::Vec<Voucher>,
    /// notice_hashes_in_machine proves the notice-hashes range in the
    /// machine state.
    #[prost(message, optional, tag="3")]
    pub notice_hashes_in_machine: ::core::option::Option<super::super::machine::v1::MerkleTreeProof>,
    #[prost(message, repeated, tag="4")]
    pub notices: ::prost::alloc::vec::Vec<Notice>,
}
/// ProcessedInput is the per-input commitment record of an epoch.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProcessedInput {
    /// input_index is the index of the input within its epoch.
    #[prost(uint64, tag="1")]
    pub input_index: u64,
    /// most_recent_machine_hash is the machine root hash after processing.
    #[prost(message, optional, tag="2")]
    pub most_recent_machine_hash: ::core::option::Option<super::super::machine::v1::Hash>,
    /// voucher_hashes_in_epoch proves the input's voucher-hashes entry in
    /// the epoch tree.
    #[prost(message, optional, tag="3")]
    pub voucher_hashes_in_epoch: ::core::option::Option<super::super::machine::v1::MerkleTreeProof>,
    /// notice_hashes_in_epoch proves the input's notice-hashes entry in
    /// the epoch tree.
    #[prost(message, optional, tag="4")]
    pub notice_hashes_in_epoch: ::core::option::Option<super::super::machine::v1::MerkleTreeProof>,
    #[prost(message, repeated, tag="7")]
    pub reports: ::prost::alloc::vec::Vec<Report>,
    #[prost(oneof="processed_input::ProcessedOneof", tags="5, 6")]
    pub processed_oneof: ::core::option::Option<processed_input::ProcessedOneof>,
}
/// Nested message and enum types in `ProcessedInput`.
pub mod processed_input {
    #[allow(clippy::derive_partial_eq_without_eq)]
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum ProcessedOneof {
        /// result holds the outputs of an accepted input.
        #[prost(message, tag="5")]
        Result(super::InputResult),
        /// skip_reason tells why the input was skipped.
        #[prost(enumeration="super::InputSkipReason", tag="6")]
        SkipReason(i32),
    }
}
/// GetEpochStatusResponse is the response type for GetEpochStatus.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetEpochStatusResponse {
    #[prost(string, tag="1")]
    pub session_id: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub epoch_index: u64,
    #[prost(enumeration="EpochState", tag="3")]
    pub state: i32,
    #[prost(message, repeated, tag="4")]
    pub processed_inputs: ::prost::alloc::vec::Vec<ProcessedInput>,
    #[prost(uint64, tag="5")]
    pub pending_input_count: u64,
    /// taint_status is present when the session is tainted.
    #[prost(message, optional, tag="6")]
    pub taint_status: ::core::option::Option<TaintStatus>,
}
/// AdvanceStateRequest enqueues one input into the active epoch.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AdvanceStateRequest {
    #[prost(string, tag="1")]
    pub session_id: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub active_epoch_index: u64,
    /// current_input_index must equal processed plus pending input counts.
    #[prost(uint64, tag="3")]
    pub current_input_index: u64,
    /// input_metadata must hold exactly 128 bytes.
    #[prost(bytes="vec", tag="4")]
    pub input_metadata: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes="vec", tag="5")]
    pub input_payload: ::prost::alloc::vec::Vec<u8>,
}
/// FinishEpochRequest is the request type for FinishEpoch.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FinishEpochRequest {
    #[prost(string, tag="1")]
    pub session_id: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub active_epoch_index: u64,
    /// processed_input_count must match the epoch's processed inputs.
    #[prost(uint64, tag="3")]
    pub processed_input_count: u64,
    /// storage_directory, when non-empty, stores the machine before the
    /// epoch transition.
    #[prost(string, tag="4")]
    pub storage_directory: ::prost::alloc::string::String,
}
/// CheckInRequest is sent by a freshly spawned machine server to advertise
/// its listening address.
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CheckInRequest {
    #[prost(string, tag="1")]
    pub session_id: ::prost::alloc::string::String,
    #[prost(string, tag="2")]
    pub address: ::prost::alloc::string::String,
}
/// EpochState is the lifecycle state of an epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum EpochState {
    Active = 0,
    Finished = 1,
}
impl EpochState {
    /// String value of the enum field names used in the ProtoBuf definition.
    ///
    /// The values are not transformed in any way and thus are considered stable
    /// (if the ProtoBuf definition does not change) and safe for programmatic use.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            EpochState::Active => "ACTIVE",
            EpochState::Finished => "FINISHED",
        }
    }
    /// Creates an enum from field names used in the ProtoBuf definition.
    pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
        match value {
            "ACTIVE" => Some(Self::Active),
            "FINISHED" => Some(Self::Finished),
            _ => None,
        }
    }
}
/// InputSkipReason tells why an input was skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum InputSkipReason {
    CycleLimitExceeded = 0,
    RequestedByMachine = 1,
    MachineHalted = 2,
    TimeLimitExceeded = 3,
}
impl InputSkipReason {
    /// String value of the enum field names used in the ProtoBuf definition.
    ///
    /// The values are not transformed in any way and thus are considered stable
    /// (if the ProtoBuf definition does not change) and safe for programmatic use.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            InputSkipReason::CycleLimitExceeded => "CYCLE_LIMIT_EXCEEDED",
            InputSkipReason::RequestedByMachine => "REQUESTED_BY_MACHINE",
            InputSkipReason::MachineHalted => "MACHINE_HALTED",
            InputSkipReason::TimeLimitExceeded => "TIME_LIMIT_EXCEEDED",
        }
    }
    /// Creates an enum from field names used in the ProtoBuf definition.
    pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
        match value {
            "CYCLE_LIMIT_EXCEEDED" => Some(Self::CycleLimitExceeded),
            "REQUESTED_BY_MACHINE" => Some(Self::RequestedByMachine),
            "MACHINE_HALTED" => Some(Self::MachineHalted),
            "TIME_LIMIT_EXCEEDED" => Some(Self::TimeLimitExceeded),
            _ => None,
        }
    }
}
include!("cartesi.rollup.v1.tonic.rs");
// @@protoc_insertion_point(module)
