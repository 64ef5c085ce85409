//! The per-input processing pipeline.
//!
//! One task per session drains the active epoch's pending-input queue in
//! FIFO order. For each input it commits the machine to a snapshot, delivers
//! the input, runs the machine under cycle and wall-clock budgets, extracts
//! the emitted outputs, and updates the epoch's Merkle accumulators; on
//! rejection, halt, or deadline it rolls the machine back and accumulates
//! zero leaves instead. Any error inside the pipeline taints the session.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use rollup_merkle::{Hash, Proof, ZERO_HASH};
use tracing::{debug, warn};

use crate::error::{ManagerError, Result};
use crate::machine::ranges::{
    count_hash_entries, hash_entry, output_header, voucher_header, MemoryRange, MemoryRanges,
    OUTPUT_HEADER_LENGTH, VOUCHER_HEADER_LENGTH,
};
use crate::machine::{self, MachineClient};
use crate::proto::cartesi::machine::v1::RunResponse;
use crate::server::checkin::CheckInTable;
use crate::session::epoch::{
    InputOutcome, InputResult, Notice, OutputHash, PendingInput, ProcessedInput, Report,
    SkipReason, Voucher, KECCAK_SIZE, LOG2_KECCAK_SIZE,
};
use crate::session::{CycleBudgets, Deadlines, Session};

/// Spawns the drain task for a session whose pending queue just became
/// non-empty. The caller must have set the session's processing flag under
/// the state lock, which guarantees at most one drain task per session.
pub fn spawn(session: Arc<Session>, checkin: Arc<CheckInTable>) {
    tokio::spawn(process_pending_inputs(session, checkin));
}

/// Drains the pending-input queue, tainting the session on any failure.
pub async fn process_pending_inputs(session: Arc<Session>, checkin: Arc<CheckInTable>) {
    let outcome = AssertUnwindSafe(drain(&session, &checkin)).catch_unwind().await;
    let error = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(error)) => error,
        Err(_) => ManagerError::Internal("unexpected panic while processing input".to_string()),
    };
    warn!(
        session_id = session.id(),
        error = %error,
        "input processing failed, tainting session"
    );
    let mut state = session.state().await;
    state.taint(&error);
    state.processing = false;
}

/// What one pipeline pass gathered from the machine, before the epoch-side
/// mutation is applied.
struct InputArtifacts {
    outcome: OutcomeArtifacts,
    reports: Vec<Report>,
    machine_root: Hash,
    final_mcycle: u64,
}

enum OutcomeArtifacts {
    Accepted {
        voucher_hashes_in_machine: Proof,
        vouchers: Vec<Voucher>,
        notice_hashes_in_machine: Proof,
        notices: Vec<Notice>,
    },
    Skipped(SkipReason),
}

async fn drain(session: &Session, checkin: &CheckInTable) -> Result<()> {
    loop {
        let mut state = session.state().await;
        debug_assert!(state.processing, "drain task without processing lock");
        let deadlines = state.deadlines;
        let cycles = state.cycles;
        let current_mcycle = state.current_mcycle;
        let client = state.client()?;
        let ranges = state.ranges()?;
        let epoch = state.active_epoch_mut()?;
        let input_index = epoch.processed_inputs.len() as u64;
        let next = epoch.pending_inputs.front().cloned();
        let input = match next {
            Some(input) => input,
            None => {
                state.processing = false;
                return Ok(());
            }
        };
        drop(state);

        debug!(session_id = session.id(), input_index, "processing input");
        let artifacts = process_input(
            session,
            checkin,
            client,
            &ranges,
            &deadlines,
            &cycles,
            current_mcycle,
            &input,
        )
        .await?;
        apply(session, artifacts, input_index).await?;
        debug!(session_id = session.id(), input_index, "done processing input");
    }
}

/// Runs the machine-side pipeline for a single input. No session state is
/// held across the machine calls, so status queries and further enqueues
/// interleave freely.
#[allow(clippy::too_many_arguments)]
async fn process_input(
    session: &Session,
    checkin: &CheckInTable,
    client: MachineClient,
    ranges: &MemoryRanges,
    deadlines: &Deadlines,
    cycles: &CycleBudgets,
    current_mcycle: u64,
    input: &PendingInput,
) -> Result<InputArtifacts> {
    // Snapshot forks the server, so the child checks in again.
    debug!(session_id = session.id(), "creating snapshot");
    let client = respawn(session, checkin, deadlines, RespawnOp::Snapshot, client).await?;

    debug!(session_id = session.id(), "clearing buffers");
    for config in [
        ranges.rx_buffer.config.clone(),
        ranges.input_metadata.config.clone(),
        ranges.voucher_hashes.config.clone(),
        ranges.notice_hashes.config.clone(),
    ] {
        client.replace_memory_range(config).await?;
    }

    debug!(session_id = session.id(), "writing rx buffer and metadata");
    client
        .write_memory(ranges.rx_buffer.start, input.payload.clone())
        .await?;
    client
        .write_memory(ranges.input_metadata.start, input.metadata.clone())
        .await?;
    client.reset_iflags_y().await?;

    let max_mcycle = current_mcycle.saturating_add(cycles.max_advance_state);
    let start = Instant::now();
    let mut mcycle = current_mcycle;
    let mut vouchers: Vec<Voucher> = Vec::new();
    let mut notices: Vec<Notice> = Vec::new();
    let mut reports: Vec<Report> = Vec::new();

    // Loop gathering outputs until the machine accepts, rejects, halts,
    // exceeds a budget, or behaves inappropriately.
    let skip_reason = loop {
        let response =
            match run_increments(&client, mcycle, max_mcycle, start, deadlines, cycles).await? {
                Some(response) => response,
                None => break Some(SkipReason::TimeLimitExceeded),
            };
        if response.mcycle >= max_mcycle {
            break Some(SkipReason::CycleLimitExceeded);
        }
        if response.iflags_h {
            break Some(SkipReason::MachineHalted);
        }
        let reason = machine::yield_reason(response.tohost);
        if response.iflags_y {
            match reason {
                machine::HTIF_YIELD_REASON_RX_REJECTED => {
                    break Some(SkipReason::RequestedByMachine)
                }
                machine::HTIF_YIELD_REASON_RX_ACCEPTED => break None,
                _ => {
                    return Err(ManagerError::OutOfRange(
                        "unknown machine yield reason".to_string(),
                    ))
                }
            }
        }
        if !response.iflags_x {
            return Err(ManagerError::Internal(
                "machine returned without hitting mcycle limit or yielding".to_string(),
            ));
        }
        match reason {
            machine::HTIF_YIELD_REASON_TX_VOUCHER => {
                debug!(session_id = session.id(), index = vouchers.len(), "reading voucher");
                vouchers.push(read_voucher(&client, ranges).await?);
            }
            machine::HTIF_YIELD_REASON_TX_NOTICE => {
                debug!(session_id = session.id(), index = notices.len(), "reading notice");
                notices.push(read_notice(&client, ranges).await?);
            }
            machine::HTIF_YIELD_REASON_TX_REPORT => {
                debug!(session_id = session.id(), index = reports.len(), "reading report");
                reports.push(read_report(&client, ranges).await?);
            }
            other => {
                debug!(reason = other, "ignoring automatic yield with unrecognized reason");
            }
        }
        mcycle = response.mcycle;
    };

    match skip_reason {
        None => {
            // Accepted: refresh the machine tree and gather proofs of the
            // hashes ranges and of each individual output hash.
            client.update_merkle_tree().await?;
            let (voucher_hashes_in_machine, voucher_hashes) = scan_hashes(
                &client,
                &ranges.voucher_hashes,
                vouchers.len() as u64,
                "voucher",
            )
            .await?;
            for (voucher, hash) in vouchers.iter_mut().zip(voucher_hashes) {
                voucher.hash = Some(hash);
            }
            let (notice_hashes_in_machine, notice_hashes) = scan_hashes(
                &client,
                &ranges.notice_hashes,
                notices.len() as u64,
                "notice",
            )
            .await?;
            for (notice, hash) in notices.iter_mut().zip(notice_hashes) {
                notice.hash = Some(hash);
            }
            let machine_root = client.get_root_hash().await?;
            debug!(
                session_id = session.id(),
                root = %hex::encode(machine_root),
                "machine root after accepted input"
            );
            Ok(InputArtifacts {
                outcome: OutcomeArtifacts::Accepted {
                    voucher_hashes_in_machine,
                    vouchers,
                    notice_hashes_in_machine,
                    notices,
                },
                reports,
                machine_root,
                final_mcycle: mcycle,
            })
        }
        Some(reason) => {
            // Skipped: roll the machine back. Rollback respawns the server,
            // so the child checks in again. The session's mcycle does not
            // move.
            debug!(session_id = session.id(), ?reason, "input skipped, rolling back");
            let client = respawn(session, checkin, deadlines, RespawnOp::Rollback, client).await?;
            client.update_merkle_tree().await?;
            let machine_root = client.get_root_hash().await?;
            Ok(InputArtifacts {
                outcome: OutcomeArtifacts::Skipped(reason),
                reports,
                machine_root,
                final_mcycle: current_mcycle,
            })
        }
    }
}

enum RespawnOp {
    Snapshot,
    Rollback,
}

/// Triggers an operation that makes the machine server fork and respawn,
/// waits for the child's check-in, and reconnects the session's stub to the
/// advertised address.
async fn respawn(
    session: &Session,
    checkin: &CheckInTable,
    deadlines: &Deadlines,
    op: RespawnOp,
    client: MachineClient,
) -> Result<MachineClient> {
    let receiver = checkin.register(session.id());
    let triggered = match op {
        RespawnOp::Snapshot => client.snapshot().await,
        RespawnOp::Rollback => client.rollback().await,
    };
    if let Err(error) = triggered {
        checkin.abandon(session.id());
        return Err(error);
    }
    let address = checkin.wait(session.id(), receiver, deadlines.checkin).await?;
    debug!(session_id = session.id(), address = %address, "machine server checked in");
    let client = MachineClient::connect(&address, *deadlines).await?;
    let mut state = session.state().await;
    state.server_address = address;
    state.client = Some(client.clone());
    Ok(client)
}

/// Runs the machine in increments of `advance_state_increment` cycles until
/// it yields, halts, or reaches `max_mcycle`. Returns `None` when the
/// wall-clock budget expired while the machine was still responsive.
async fn run_increments(
    client: &MachineClient,
    current_mcycle: u64,
    max_mcycle: u64,
    start: Instant,
    deadlines: &Deadlines,
    cycles: &CycleBudgets,
) -> Result<Option<RunResponse>> {
    let mut limit = max_mcycle.min(current_mcycle.saturating_add(cycles.advance_state_increment));
    let mut increment = 0;
    loop {
        debug!(increment, limit, "running advance state increment");
        let response = client.run(limit).await?;
        if response.iflags_y || response.iflags_x || response.iflags_h
            || response.mcycle >= max_mcycle
        {
            return Ok(Some(response));
        }
        if start.elapsed() > Duration::from_millis(deadlines.advance_state) {
            return Ok(None);
        }
        limit = max_mcycle.min(limit.saturating_add(cycles.advance_state_increment));
        increment += 1;
    }
}

async fn read_voucher(client: &MachineClient, ranges: &MemoryRanges) -> Result<Voucher> {
    let header = client
        .read_memory(ranges.tx_buffer.start, VOUCHER_HEADER_LENGTH)
        .await?;
    let (address, length) = voucher_header(&header)?;
    if length > ranges.tx_buffer.length - VOUCHER_HEADER_LENGTH {
        return Err(ManagerError::OutOfRange(
            "voucher payload length is out of bounds".to_string(),
        ));
    }
    let payload = client
        .read_memory(ranges.tx_buffer.start + VOUCHER_HEADER_LENGTH, length)
        .await?;
    Ok(Voucher {
        address,
        payload,
        hash: None,
    })
}

async fn read_tx_payload(client: &MachineClient, ranges: &MemoryRanges) -> Result<Vec<u8>> {
    let header = client
        .read_memory(ranges.tx_buffer.start, OUTPUT_HEADER_LENGTH)
        .await?;
    let length = output_header(&header)?;
    if length > ranges.tx_buffer.length - OUTPUT_HEADER_LENGTH {
        return Err(ManagerError::OutOfRange(
            "notice payload length is out of bounds".to_string(),
        ));
    }
    client
        .read_memory(ranges.tx_buffer.start + OUTPUT_HEADER_LENGTH, length)
        .await
}

async fn read_notice(client: &MachineClient, ranges: &MemoryRanges) -> Result<Notice> {
    Ok(Notice {
        payload: read_tx_payload(client, ranges).await?,
        hash: None,
    })
}

async fn read_report(client: &MachineClient, ranges: &MemoryRanges) -> Result<Report> {
    Ok(Report {
        payload: read_tx_payload(client, ranges).await?,
    })
}

/// Reads a hashes memory range whole, checks the zero-terminated entry
/// count against the outputs observed during the run, and collects each
/// entry's hash with its proof re-rooted at the range.
async fn scan_hashes(
    client: &MachineClient,
    range: &MemoryRange,
    expected: u64,
    kind: &str,
) -> Result<(Proof, Vec<OutputHash>)> {
    let range_proof = client.get_proof(range.start, range.log2_size).await?;
    let data = client.read_memory(range.start, range.length).await?;
    let count = count_hash_entries(&data);
    debug!(kind, count, "scanned hashes memory range");
    if count != expected {
        return Err(ManagerError::InvalidArgument(format!(
            "number of {kind}s yielded and non-zero {kind} hashes disagree"
        )));
    }
    let mut hashes = Vec::with_capacity(count as usize);
    for entry_index in 0..count {
        let keccak = hash_entry(&data, entry_index)?;
        let keccak_in_hashes = client
            .get_proof(range.start + entry_index * KECCAK_SIZE, u64::from(LOG2_KECCAK_SIZE))
            .await?
            .slice(range.log2_size as u32, LOG2_KECCAK_SIZE)?;
        hashes.push(OutputHash {
            keccak,
            keccak_in_hashes,
        });
    }
    Ok((range_proof, hashes))
}

/// Applies one input's artifacts to its epoch as a single atomic step:
/// invariant checks, leaf appends, in-epoch proofs, the processed-input
/// record, and the mcycle update.
async fn apply(session: &Session, artifacts: InputArtifacts, input_index: u64) -> Result<()> {
    let mut state = session.state().await;
    let epoch = state.active_epoch_mut()?;
    if epoch.vouchers_tree.size() != input_index {
        return Err(ManagerError::Internal(
            "inconsistent number of entries in epoch's session vouchers Merkle tree".to_string(),
        ));
    }
    if epoch.notices_tree.size() != input_index {
        return Err(ManagerError::Internal(
            "inconsistent number of entries in epoch's session notices Merkle tree".to_string(),
        ));
    }
    let address = input_index << LOG2_KECCAK_SIZE;
    let processed = match artifacts.outcome {
        OutcomeArtifacts::Accepted {
            voucher_hashes_in_machine,
            vouchers,
            notice_hashes_in_machine,
            notices,
        } => {
            epoch
                .vouchers_tree
                .push_back(voucher_hashes_in_machine.target_hash)?;
            epoch
                .notices_tree
                .push_back(notice_hashes_in_machine.target_hash)?;
            ProcessedInput {
                input_index,
                most_recent_machine_hash: artifacts.machine_root,
                voucher_hashes_in_epoch: epoch.vouchers_tree.get_proof(address, LOG2_KECCAK_SIZE)?,
                notice_hashes_in_epoch: epoch.notices_tree.get_proof(address, LOG2_KECCAK_SIZE)?,
                outcome: InputOutcome::Accepted(InputResult {
                    voucher_hashes_in_machine,
                    vouchers,
                    notice_hashes_in_machine,
                    notices,
                }),
                reports: artifacts.reports,
            }
        }
        OutcomeArtifacts::Skipped(reason) => {
            epoch.vouchers_tree.push_back(ZERO_HASH)?;
            epoch.notices_tree.push_back(ZERO_HASH)?;
            ProcessedInput {
                input_index,
                most_recent_machine_hash: artifacts.machine_root,
                voucher_hashes_in_epoch: epoch.vouchers_tree.get_proof(address, LOG2_KECCAK_SIZE)?,
                notice_hashes_in_epoch: epoch.notices_tree.get_proof(address, LOG2_KECCAK_SIZE)?,
                outcome: InputOutcome::Skipped(reason),
                reports: artifacts.reports,
            }
        }
    };
    epoch.processed_inputs.push(processed);
    epoch.pending_inputs.pop_front();
    state.current_mcycle = artifacts.final_mcycle;
    Ok(())
}
