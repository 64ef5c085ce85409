//! Epochs: the unit under which input outputs are committed.

use std::collections::VecDeque;

use rollup_merkle::{CompleteMerkleTree, Hash, Proof};

use crate::error::Result;
use crate::machine::convert::{hash_to_proto, proof_to_proto};
use crate::proto::cartesi::rollup::v1 as rollup;

/// Log2 of the epoch trees' address span.
pub const LOG2_ROOT_SIZE: u32 = 37;
/// Log2 of a Keccak hash, the trees' leaf and word size.
pub const LOG2_KECCAK_SIZE: u32 = 5;
/// Bytes in a Keccak hash.
pub const KECCAK_SIZE: u64 = 1 << LOG2_KECCAK_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochState {
    Active,
    Finished,
}

/// Why an input was skipped instead of accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    CycleLimitExceeded,
    RequestedByMachine,
    MachineHalted,
    TimeLimitExceeded,
}

/// An input waiting to be processed.
#[derive(Debug, Clone)]
pub struct PendingInput {
    /// Exactly 128 bytes, validated at enqueue time.
    pub metadata: Vec<u8>,
    pub payload: Vec<u8>,
}

/// Hash of one voucher or notice, with its proof inside the corresponding
/// hashes memory range.
#[derive(Debug, Clone)]
pub struct OutputHash {
    pub keccak: Hash,
    pub keccak_in_hashes: Proof,
}

#[derive(Debug, Clone)]
pub struct Voucher {
    pub address: Hash,
    pub payload: Vec<u8>,
    pub hash: Option<OutputHash>,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub payload: Vec<u8>,
    pub hash: Option<OutputHash>,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub payload: Vec<u8>,
}

/// Outputs of an accepted input.
#[derive(Debug, Clone)]
pub struct InputResult {
    pub voucher_hashes_in_machine: Proof,
    pub vouchers: Vec<Voucher>,
    pub notice_hashes_in_machine: Proof,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone)]
pub enum InputOutcome {
    Accepted(InputResult),
    Skipped(SkipReason),
}

/// The per-input commitment record.
#[derive(Debug, Clone)]
pub struct ProcessedInput {
    pub input_index: u64,
    pub most_recent_machine_hash: Hash,
    pub voucher_hashes_in_epoch: Proof,
    pub notice_hashes_in_epoch: Proof,
    pub outcome: InputOutcome,
    pub reports: Vec<Report>,
}

/// An epoch's trees and input queues.
#[derive(Debug)]
pub struct Epoch {
    pub index: u64,
    pub state: EpochState,
    pub vouchers_tree: CompleteMerkleTree,
    pub notices_tree: CompleteMerkleTree,
    pub processed_inputs: Vec<ProcessedInput>,
    pub pending_inputs: VecDeque<PendingInput>,
}

impl Epoch {
    pub fn new(index: u64) -> Self {
        Epoch {
            index,
            state: EpochState::Active,
            vouchers_tree: CompleteMerkleTree::new(LOG2_ROOT_SIZE, LOG2_KECCAK_SIZE, LOG2_KECCAK_SIZE),
            notices_tree: CompleteMerkleTree::new(LOG2_ROOT_SIZE, LOG2_KECCAK_SIZE, LOG2_KECCAK_SIZE),
            processed_inputs: Vec::new(),
            pending_inputs: VecDeque::new(),
        }
    }

    /// Index the next AdvanceState must carry.
    pub fn next_input_index(&self) -> u64 {
        self.processed_inputs.len() as u64 + self.pending_inputs.len() as u64
    }

    /// Marks the epoch finished and refreshes every processed input's
    /// in-epoch proofs against the now-final trees.
    pub fn finish(&mut self) -> Result<()> {
        self.state = EpochState::Finished;
        for input in &mut self.processed_inputs {
            let address = input.input_index << LOG2_KECCAK_SIZE;
            input.voucher_hashes_in_epoch =
                self.vouchers_tree.get_proof(address, LOG2_KECCAK_SIZE)?;
            input.notice_hashes_in_epoch =
                self.notices_tree.get_proof(address, LOG2_KECCAK_SIZE)?;
        }
        Ok(())
    }
}

impl From<SkipReason> for rollup::InputSkipReason {
    fn from(reason: SkipReason) -> Self {
        match reason {
            SkipReason::CycleLimitExceeded => rollup::InputSkipReason::CycleLimitExceeded,
            SkipReason::RequestedByMachine => rollup::InputSkipReason::RequestedByMachine,
            SkipReason::MachineHalted => rollup::InputSkipReason::MachineHalted,
            SkipReason::TimeLimitExceeded => rollup::InputSkipReason::TimeLimitExceeded,
        }
    }
}

impl From<&Voucher> for rollup::Voucher {
    fn from(voucher: &Voucher) -> Self {
        rollup::Voucher {
            address: Some(hash_to_proto(&voucher.address)),
            payload: voucher.payload.clone(),
            keccak: voucher.hash.as_ref().map(|h| hash_to_proto(&h.keccak)),
            keccak_in_voucher_hashes: voucher
                .hash
                .as_ref()
                .map(|h| proof_to_proto(&h.keccak_in_hashes)),
        }
    }
}

impl From<&Notice> for rollup::Notice {
    fn from(notice: &Notice) -> Self {
        rollup::Notice {
            payload: notice.payload.clone(),
            keccak: notice.hash.as_ref().map(|h| hash_to_proto(&h.keccak)),
            keccak_in_notice_hashes: notice
                .hash
                .as_ref()
                .map(|h| proof_to_proto(&h.keccak_in_hashes)),
        }
    }
}

impl From<&ProcessedInput> for rollup::ProcessedInput {
    fn from(input: &ProcessedInput) -> Self {
        let processed_oneof = Some(match &input.outcome {
            InputOutcome::Accepted(result) => {
                rollup::processed_input::ProcessedOneof::Result(rollup::InputResult {
                    voucher_hashes_in_machine: Some(proof_to_proto(
                        &result.voucher_hashes_in_machine,
                    )),
                    vouchers: result.vouchers.iter().map(Into::into).collect(),
                    notice_hashes_in_machine: Some(proof_to_proto(
                        &result.notice_hashes_in_machine,
                    )),
                    notices: result.notices.iter().map(Into::into).collect(),
                })
            }
            InputOutcome::Skipped(reason) => rollup::processed_input::ProcessedOneof::SkipReason(
                rollup::InputSkipReason::from(*reason) as i32,
            ),
        });
        rollup::ProcessedInput {
            input_index: input.input_index,
            most_recent_machine_hash: Some(hash_to_proto(&input.most_recent_machine_hash)),
            voucher_hashes_in_epoch: Some(proof_to_proto(&input.voucher_hashes_in_epoch)),
            notice_hashes_in_epoch: Some(proof_to_proto(&input.notice_hashes_in_epoch)),
            reports: input
                .reports
                .iter()
                .map(|report| rollup::Report {
                    payload: report.payload.clone(),
                })
                .collect(),
            processed_oneof,
        }
    }
}

impl From<EpochState> for rollup::EpochState {
    fn from(state: EpochState) -> Self {
        match state {
            EpochState::Active => rollup::EpochState::Active,
            EpochState::Finished => rollup::EpochState::Finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollup_merkle::keccak;

    fn record_input(epoch: &mut Epoch, leaf: rollup_merkle::Hash) {
        let index = epoch.processed_inputs.len() as u64;
        epoch.vouchers_tree.push_back(leaf).unwrap();
        epoch.notices_tree.push_back(leaf).unwrap();
        let address = index << LOG2_KECCAK_SIZE;
        epoch.processed_inputs.push(ProcessedInput {
            input_index: index,
            most_recent_machine_hash: keccak(b"root"),
            voucher_hashes_in_epoch: epoch
                .vouchers_tree
                .get_proof(address, LOG2_KECCAK_SIZE)
                .unwrap(),
            notice_hashes_in_epoch: epoch
                .notices_tree
                .get_proof(address, LOG2_KECCAK_SIZE)
                .unwrap(),
            outcome: InputOutcome::Skipped(SkipReason::RequestedByMachine),
            reports: Vec::new(),
        });
    }

    #[test]
    fn finish_refreshes_proofs_against_final_trees() {
        let mut epoch = Epoch::new(0);
        record_input(&mut epoch, keccak(b"first"));
        record_input(&mut epoch, keccak(b"second"));
        let stale_root = epoch.processed_inputs[0].voucher_hashes_in_epoch.root_hash;
        epoch.finish().unwrap();
        assert_eq!(epoch.state, EpochState::Finished);
        for input in &epoch.processed_inputs {
            assert!(input.voucher_hashes_in_epoch.verify());
            assert_eq!(
                input.voucher_hashes_in_epoch.root_hash,
                epoch.vouchers_tree.root()
            );
            assert!(input.notice_hashes_in_epoch.verify());
        }
        // The first input's proof was taken when the tree had one leaf; the
        // refresh re-rooted it.
        assert_ne!(stale_root, epoch.vouchers_tree.root());
    }

    #[test]
    fn next_input_index_counts_both_queues() {
        let mut epoch = Epoch::new(0);
        assert_eq!(epoch.next_input_index(), 0);
        epoch.pending_inputs.push_back(PendingInput {
            metadata: vec![0; 128],
            payload: Vec::new(),
        });
        record_input(&mut epoch, keccak(b"leaf"));
        assert_eq!(epoch.next_input_index(), 2);
    }
}
