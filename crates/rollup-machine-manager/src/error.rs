//! Error kinds shared by every manager operation.

use thiserror::Error;
use tonic::{Code, Status};

/// Result type for manager operations.
pub type Result<T> = std::result::Result<T, ManagerError>;

/// The closed set of errors a manager operation can produce.
///
/// Each variant maps to exactly one gRPC status code. Errors raised before
/// an input enters the processing pipeline are surfaced to the caller;
/// errors raised inside the pipeline taint the session instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManagerError {
    /// Malformed request, unknown id, or size/alignment violation.
    #[error("{0}")]
    InvalidArgument(String),
    /// Duplicate session id.
    #[error("{0}")]
    AlreadyExists(String),
    /// Machine server version incompatible with the manager.
    #[error("{0}")]
    FailedPrecondition(String),
    /// Numeric overflow, unaligned range, or unknown yield reason.
    #[error("{0}")]
    OutOfRange(String),
    /// Concurrent call on a locked session.
    #[error("{0}")]
    Aborted(String),
    /// Attempted mutation on a tainted session.
    #[error("{0}")]
    DataLoss(String),
    /// Could not establish a machine server stub.
    #[error("{0}")]
    ResourceExhausted(String),
    /// A machine server call missed its deadline.
    #[error("{0}")]
    DeadlineExceeded(String),
    /// Invariant violation or unexpected failure.
    #[error("{0}")]
    Internal(String),
}

impl ManagerError {
    pub fn code(&self) -> Code {
        match self {
            ManagerError::InvalidArgument(_) => Code::InvalidArgument,
            ManagerError::AlreadyExists(_) => Code::AlreadyExists,
            ManagerError::FailedPrecondition(_) => Code::FailedPrecondition,
            ManagerError::OutOfRange(_) => Code::OutOfRange,
            ManagerError::Aborted(_) => Code::Aborted,
            ManagerError::DataLoss(_) => Code::DataLoss,
            ManagerError::ResourceExhausted(_) => Code::ResourceExhausted,
            ManagerError::DeadlineExceeded(_) => Code::DeadlineExceeded,
            ManagerError::Internal(_) => Code::Internal,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ManagerError::InvalidArgument(m)
            | ManagerError::AlreadyExists(m)
            | ManagerError::FailedPrecondition(m)
            | ManagerError::OutOfRange(m)
            | ManagerError::Aborted(m)
            | ManagerError::DataLoss(m)
            | ManagerError::ResourceExhausted(m)
            | ManagerError::DeadlineExceeded(m)
            | ManagerError::Internal(m) => m,
        }
    }
}

impl From<ManagerError> for Status {
    fn from(err: ManagerError) -> Self {
        Status::new(err.code(), err.message())
    }
}

impl From<Status> for ManagerError {
    fn from(status: Status) -> Self {
        let message = format!("machine server error: {}", status.message());
        match status.code() {
            Code::InvalidArgument => ManagerError::InvalidArgument(message),
            Code::AlreadyExists => ManagerError::AlreadyExists(message),
            Code::FailedPrecondition => ManagerError::FailedPrecondition(message),
            Code::OutOfRange => ManagerError::OutOfRange(message),
            Code::Aborted => ManagerError::Aborted(message),
            Code::DataLoss => ManagerError::DataLoss(message),
            Code::ResourceExhausted => ManagerError::ResourceExhausted(message),
            Code::DeadlineExceeded => ManagerError::DeadlineExceeded(message),
            _ => ManagerError::Internal(message),
        }
    }
}

impl From<rollup_merkle::MerkleError> for ManagerError {
    fn from(err: rollup_merkle::MerkleError) -> Self {
        ManagerError::Internal(format!("epoch merkle tree error: {err}"))
    }
}

/// Why a session was tainted; echoed by the status RPCs.
#[derive(Debug, Clone)]
pub struct TaintStatus {
    pub code: Code,
    pub message: String,
}

impl From<&ManagerError> for TaintStatus {
    fn from(err: &ManagerError) -> Self {
        TaintStatus {
            code: err.code(),
            message: err.message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_status() {
        let err = ManagerError::Aborted("concurrent call in session".to_string());
        let status: Status = err.clone().into();
        assert_eq!(status.code(), Code::Aborted);
        assert_eq!(status.message(), "concurrent call in session");
    }

    #[test]
    fn unlisted_codes_collapse_to_internal() {
        let status = Status::unavailable("server went away");
        let err: ManagerError = status.into();
        assert!(matches!(err, ManagerError::Internal(_)));
        assert!(err.message().contains("server went away"));
    }
}
