//! The five rollup memory ranges and the framing of machine outputs.
//!
//! Vouchers, notices and reports leave the machine through the tx buffer
//! with big-endian 32-byte header fields. The voucher-hashes and
//! notice-hashes ranges hold packed arrays of 32-byte hashes terminated by
//! the first all-zero entry.

use rollup_merkle::{Hash, HASH_SIZE};

use crate::error::{ManagerError, Result};
use crate::proto::cartesi::machine::v1::MemoryRangeConfig;

/// Bytes of input metadata delivered alongside every input payload.
pub const INPUT_METADATA_LENGTH: usize = 128;

/// Voucher frame prefix: address(32) || offset(32) || length(32).
pub const VOUCHER_HEADER_LENGTH: u64 = 96;

/// Notice/report frame prefix: offset(32) || length(32).
pub const OUTPUT_HEADER_LENGTH: u64 = 64;

/// A validated memory range of the machine.
#[derive(Debug, Clone)]
pub struct MemoryRange {
    pub start: u64,
    pub length: u64,
    pub log2_size: u64,
    /// Config used to replace the range with a fresh one; its
    /// image_filename is cleared for that purpose.
    pub config: MemoryRangeConfig,
}

impl MemoryRange {
    /// Validates the config the machine server reported for a range.
    pub fn from_config(name: &str, config: Option<MemoryRangeConfig>) -> Result<Self> {
        let mut config = config.ok_or_else(|| {
            ManagerError::InvalidArgument(format!("missing {name} memory range config"))
        })?;
        if config.shared {
            return Err(ManagerError::InvalidArgument(format!(
                "{name} buffer cannot be shared"
            )));
        }
        config.image_filename.clear();
        let length = config.length;
        if !length.is_power_of_two() {
            return Err(ManagerError::OutOfRange(format!(
                "{name} memory range length not a power of two ({length})"
            )));
        }
        let log2_size = u64::from(length.ilog2());
        let start = config.start;
        if start & (length - 1) != 0 {
            return Err(ManagerError::OutOfRange(format!(
                "{name} memory range start not aligned to its power of two size"
            )));
        }
        Ok(MemoryRange {
            start,
            length,
            log2_size,
            config,
        })
    }
}

/// The rollup memory ranges of a session's machine.
#[derive(Debug, Clone)]
pub struct MemoryRanges {
    pub rx_buffer: MemoryRange,
    pub tx_buffer: MemoryRange,
    pub input_metadata: MemoryRange,
    pub voucher_hashes: MemoryRange,
    pub notice_hashes: MemoryRange,
}

/// Decodes a big-endian 32-byte length field into a u64.
///
/// The upper 24 bytes must be zero.
pub fn payload_length(field: &[u8]) -> Result<u64> {
    if field.len() != 32 {
        return Err(ManagerError::Internal(format!(
            "payload length field has {} bytes, expected 32",
            field.len()
        )));
    }
    if field[..24].iter().any(|&b| b != 0) {
        return Err(ManagerError::OutOfRange(
            "payload length too large".to_string(),
        ));
    }
    let bytes: [u8; 8] = field[24..]
        .try_into()
        .map_err(|_| ManagerError::Internal("payload length field truncated".to_string()))?;
    Ok(u64::from_be_bytes(bytes))
}

/// Decodes the voucher frame prefix read from the start of the tx buffer.
///
/// Returns the destination address and the payload length.
pub fn voucher_header(data: &[u8]) -> Result<(Hash, u64)> {
    if data.len() != VOUCHER_HEADER_LENGTH as usize {
        return Err(ManagerError::Internal(format!(
            "voucher header has {} bytes, expected {VOUCHER_HEADER_LENGTH}",
            data.len()
        )));
    }
    let address: Hash = data[..HASH_SIZE]
        .try_into()
        .map_err(|_| ManagerError::OutOfRange("invalid hash length".to_string()))?;
    let length = payload_length(&data[64..96])?;
    Ok((address, length))
}

/// Decodes the notice/report frame prefix read from the start of the tx
/// buffer, returning the payload length.
pub fn output_header(data: &[u8]) -> Result<u64> {
    if data.len() != OUTPUT_HEADER_LENGTH as usize {
        return Err(ManagerError::Internal(format!(
            "output header has {} bytes, expected {OUTPUT_HEADER_LENGTH}",
            data.len()
        )));
    }
    payload_length(&data[32..64])
}

/// Counts the 32-byte hash entries before the first all-zero entry.
pub fn count_hash_entries(data: &[u8]) -> u64 {
    data.chunks_exact(HASH_SIZE)
        .take_while(|entry| entry.iter().any(|&b| b != 0))
        .count() as u64
}

/// Extracts the hash entry at the given index.
pub fn hash_entry(data: &[u8], index: u64) -> Result<Hash> {
    let start = index as usize * HASH_SIZE;
    data.get(start..start + HASH_SIZE)
        .and_then(|entry| entry.try_into().ok())
        .ok_or_else(|| ManagerError::OutOfRange("invalid hash length".to_string()))
}
