//! End-to-end scenarios driven through the manager service against a
//! scripted machine server.

mod common;

use common::*;

use rollup_machine_manager::machine::convert::proof_from_proto;
use rollup_machine_manager::proto::cartesi::rollup::v1::machine_manager_server::MachineManager;
use rollup_machine_manager::proto::cartesi::rollup::v1::processed_input::ProcessedOneof;
use rollup_machine_manager::proto::cartesi::rollup::v1::{
    AdvanceStateRequest, EndSessionRequest, EpochState, FinishEpochRequest,
    GetSessionStatusRequest, InputSkipReason,
};
use rollup_merkle::{keccak, ZERO_HASH};
use tonic::{Code, Request};

fn skip_reason(status: &rollup_machine_manager::proto::cartesi::rollup::v1::ProcessedInput) -> i32 {
    match status.processed_oneof.as_ref().expect("outcome") {
        ProcessedOneof::SkipReason(reason) => *reason,
        ProcessedOneof::Result(_) => panic!("input was accepted"),
    }
}

#[tokio::test]
async fn s1_accepted_input_commits_voucher_and_notice() {
    let harness = setup(vec![
        RunStep::Voucher {
            address: [0x11; 32],
            payload: b"hello".to_vec(),
            write_hash: true,
        },
        RunStep::Notice {
            payload: b"noted".to_vec(),
        },
        RunStep::Accept,
    ])
    .await;
    start_session(&harness, "session").await;
    advance(&harness, "session", 0, 0, b"x").await;

    let status = wait_processed(&harness, "session", 0, 1).await;
    assert!(status.taint_status.is_none());
    let input = &status.processed_inputs[0];
    assert_eq!(input.input_index, 0);
    assert!(!input.most_recent_machine_hash.as_ref().unwrap().data.is_empty());
    assert!(input.reports.is_empty());

    let result = match input.processed_oneof.as_ref().unwrap() {
        ProcessedOneof::Result(result) => result,
        ProcessedOneof::SkipReason(reason) => panic!("input skipped with reason {reason}"),
    };
    assert_eq!(result.vouchers.len(), 1);
    let voucher = &result.vouchers[0];
    assert_eq!(voucher.address.as_ref().unwrap().data, vec![0x11; 32]);
    assert_eq!(voucher.payload, b"hello");
    assert_eq!(voucher.keccak.as_ref().unwrap().data, keccak(b"hello").to_vec());
    assert_eq!(result.notices.len(), 1);
    assert_eq!(result.notices[0].payload, b"noted");
    assert_eq!(
        result.notices[0].keccak.as_ref().unwrap().data,
        keccak(b"noted").to_vec()
    );

    // The voucher hash's proof re-roots at the voucher-hashes range, whose
    // hash is in turn the leaf committed to the epoch tree.
    let keccak_in_hashes =
        proof_from_proto(voucher.keccak_in_voucher_hashes.clone()).unwrap();
    assert!(keccak_in_hashes.verify());
    assert_eq!(keccak_in_hashes.target_address, 0);
    assert_eq!(keccak_in_hashes.target_hash, keccak(b"hello"));
    let in_machine = proof_from_proto(result.voucher_hashes_in_machine.clone()).unwrap();
    assert_eq!(keccak_in_hashes.root_hash, in_machine.target_hash);

    let in_epoch = proof_from_proto(input.voucher_hashes_in_epoch.clone()).unwrap();
    assert!(in_epoch.verify());
    assert_eq!(in_epoch.target_address, 0);
    assert_eq!(in_epoch.log2_target_size, 5);
    assert_eq!(in_epoch.target_hash, in_machine.target_hash);

    let notice_in_epoch = proof_from_proto(input.notice_hashes_in_epoch.clone()).unwrap();
    assert!(notice_in_epoch.verify());
    assert_eq!(
        notice_in_epoch.target_hash,
        proof_from_proto(result.notice_hashes_in_machine.clone()).unwrap().target_hash
    );
}

#[tokio::test]
async fn s2_rejected_input_accumulates_zero_leaves() {
    let harness = setup(vec![
        RunStep::Report {
            payload: b"why not".to_vec(),
        },
        RunStep::Reject,
    ])
    .await;
    start_session(&harness, "session").await;
    advance(&harness, "session", 0, 0, b"x").await;

    let status = wait_processed(&harness, "session", 0, 1).await;
    assert!(status.taint_status.is_none());
    let input = &status.processed_inputs[0];
    assert_eq!(
        skip_reason(input),
        InputSkipReason::RequestedByMachine as i32
    );
    // Reports are kept even for skipped inputs.
    assert_eq!(input.reports.len(), 1);
    assert_eq!(input.reports[0].payload, b"why not");

    let in_epoch = proof_from_proto(input.voucher_hashes_in_epoch.clone()).unwrap();
    assert!(in_epoch.verify());
    assert_eq!(in_epoch.target_hash, ZERO_HASH);
    let notice_in_epoch = proof_from_proto(input.notice_hashes_in_epoch.clone()).unwrap();
    assert_eq!(notice_in_epoch.target_hash, ZERO_HASH);
}

#[tokio::test]
async fn s3_spinning_machine_hits_the_cycle_limit() {
    let harness = setup(vec![RunStep::Spin { sleep_ms: 0 }]).await;
    let mut request = start_session_request("session");
    let cycles = request.server_cycles.as_mut().unwrap();
    cycles.max_advance_state = 1_000;
    cycles.advance_state_increment = 500;
    harness
        .manager
        .start_session(Request::new(request))
        .await
        .unwrap();
    advance(&harness, "session", 0, 0, b"x").await;

    let status = wait_processed(&harness, "session", 0, 1).await;
    assert!(status.taint_status.is_none());
    assert_eq!(
        skip_reason(&status.processed_inputs[0]),
        InputSkipReason::CycleLimitExceeded as i32
    );
}

#[tokio::test]
async fn s4_slow_machine_hits_the_wall_clock_limit() {
    let harness = setup(vec![RunStep::Spin { sleep_ms: 30 }]).await;
    let mut request = start_session_request("session");
    // Each increment returns well within its own deadline, but the total
    // budget runs out after a few increments.
    request.server_deadline.as_mut().unwrap().advance_state = 100;
    request.server_cycles.as_mut().unwrap().max_advance_state = 1 << 40;
    harness
        .manager
        .start_session(Request::new(request))
        .await
        .unwrap();
    advance(&harness, "session", 0, 0, b"x").await;

    let status = wait_processed(&harness, "session", 0, 1).await;
    assert!(status.taint_status.is_none());
    assert_eq!(
        skip_reason(&status.processed_inputs[0]),
        InputSkipReason::TimeLimitExceeded as i32
    );
}

#[tokio::test]
async fn s5_missing_voucher_hashes_taint_the_session() {
    let harness = setup(vec![
        RunStep::Voucher {
            address: [0x22; 32],
            payload: b"ghost".to_vec(),
            write_hash: false,
        },
        RunStep::Accept,
    ])
    .await;
    start_session(&harness, "session").await;
    advance(&harness, "session", 0, 0, b"x").await;

    // The pipeline taints the session when the voucher count and the
    // hashes range disagree.
    let taint = loop {
        match harness
            .manager
            .get_session_status(Request::new(GetSessionStatusRequest {
                session_id: "session".to_string(),
            }))
            .await
        {
            Ok(response) => {
                if let Some(taint) = response.into_inner().taint_status {
                    break taint;
                }
            }
            Err(status) if status.code() == Code::Aborted => {}
            Err(status) => panic!("session status failed: {status}"),
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    };
    assert_eq!(taint.error_code, Code::InvalidArgument as u32);
    assert!(taint.error_message.contains("disagree"));

    let status = harness
        .manager
        .advance_state(Request::new(AdvanceStateRequest {
            session_id: "session".to_string(),
            active_epoch_index: 0,
            current_input_index: 1,
            input_metadata: vec![0u8; 128],
            input_payload: vec![],
        }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::DataLoss);

    // EndSession still succeeds on a tainted session.
    harness
        .manager
        .end_session(Request::new(EndSessionRequest {
            session_id: "session".to_string(),
        }))
        .await
        .unwrap();
}

#[tokio::test]
async fn s6_finish_epoch_freezes_proofs_and_opens_the_next() {
    let harness = setup(vec![RunStep::Accept, RunStep::Accept]).await;
    start_session(&harness, "session").await;
    advance(&harness, "session", 0, 0, b"one").await;
    wait_processed(&harness, "session", 0, 1).await;
    advance(&harness, "session", 0, 1, b"two").await;
    wait_processed(&harness, "session", 0, 2).await;

    // A wrong processed-input count is refused.
    let status = harness
        .manager
        .finish_epoch(Request::new(FinishEpochRequest {
            session_id: "session".to_string(),
            active_epoch_index: 0,
            processed_input_count: 1,
            storage_directory: String::new(),
        }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    harness
        .manager
        .finish_epoch(Request::new(FinishEpochRequest {
            session_id: "session".to_string(),
            active_epoch_index: 0,
            processed_input_count: 2,
            storage_directory: String::new(),
        }))
        .await
        .unwrap();

    let session = harness
        .manager
        .get_session_status(Request::new(GetSessionStatusRequest {
            session_id: "session".to_string(),
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(session.active_epoch_index, 1);
    assert_eq!(session.epoch_index, vec![0, 1]);

    let old_epoch = epoch_status(&harness, "session", 0).await.unwrap();
    assert_eq!(old_epoch.state, EpochState::Finished as i32);
    // All processed inputs now prove against the same frozen root.
    let roots: Vec<_> = old_epoch
        .processed_inputs
        .iter()
        .map(|input| {
            let proof = proof_from_proto(input.voucher_hashes_in_epoch.clone()).unwrap();
            assert!(proof.verify());
            assert_eq!(proof.target_address, input.input_index << 5);
            proof.root_hash
        })
        .collect();
    assert_eq!(roots[0], roots[1]);

    // The frozen epoch no longer accepts inputs.
    let status = harness
        .manager
        .advance_state(Request::new(AdvanceStateRequest {
            session_id: "session".to_string(),
            active_epoch_index: 0,
            current_input_index: 0,
            input_metadata: vec![0u8; 128],
            input_payload: vec![],
        }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    // With a pristine active epoch, the session can be ended.
    harness
        .manager
        .end_session(Request::new(EndSessionRequest {
            session_id: "session".to_string(),
        }))
        .await
        .unwrap();
}

#[tokio::test]
async fn finish_epoch_can_store_the_machine_first() {
    let harness = setup(vec![RunStep::Accept]).await;
    start_session(&harness, "session").await;
    advance(&harness, "session", 0, 0, b"x").await;
    wait_processed(&harness, "session", 0, 1).await;

    let dir = tempfile::tempdir().unwrap();
    harness
        .manager
        .finish_epoch(Request::new(FinishEpochRequest {
            session_id: "session".to_string(),
            active_epoch_index: 0,
            processed_input_count: 1,
            storage_directory: dir.path().to_string_lossy().into_owned(),
        }))
        .await
        .unwrap();
    let status = epoch_status(&harness, "session", 0).await.unwrap();
    assert_eq!(status.state, EpochState::Finished as i32);
}

#[tokio::test]
async fn advance_state_validates_the_request() {
    let harness = setup(vec![]).await;
    start_session(&harness, "session").await;

    let advance = |epoch, index, metadata: Vec<u8>, payload: Vec<u8>| {
        let manager = std::sync::Arc::clone(&harness.manager);
        async move {
            manager
                .advance_state(Request::new(AdvanceStateRequest {
                    session_id: "session".to_string(),
                    active_epoch_index: epoch,
                    current_input_index: index,
                    input_metadata: metadata,
                    input_payload: payload,
                }))
                .await
                .unwrap_err()
        }
    };

    let status = advance(7, 0, vec![0u8; 128], vec![]).await;
    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(status.message().contains("incorrect active epoch index"));

    let status = advance(0, 3, vec![0u8; 128], vec![]).await;
    assert!(status.message().contains("incorrect current input index"));

    let status = advance(0, 0, vec![0u8; 64], vec![]).await;
    assert!(status.message().contains("input metadata wrong size"));

    let status = advance(0, 0, vec![0u8; 128], vec![0u8; RANGE_LENGTH as usize]).await;
    assert!(status.message().contains("input payload too long"));
}

#[tokio::test]
async fn duplicate_session_ids_are_rejected() {
    let harness = setup(vec![]).await;
    start_session(&harness, "session").await;
    let status = harness
        .manager
        .start_session(Request::new(start_session_request("session")))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::AlreadyExists);
    assert_eq!(status.message(), "session id is taken");
}

#[tokio::test]
async fn end_session_refuses_a_dirty_active_epoch() {
    let harness = setup(vec![RunStep::Reject]).await;
    start_session(&harness, "session").await;
    advance(&harness, "session", 0, 0, b"x").await;
    wait_processed(&harness, "session", 0, 1).await;

    let status = harness
        .manager
        .end_session(Request::new(EndSessionRequest {
            session_id: "session".to_string(),
        }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert!(status.message().contains("active epoch has processed inputs"));
}

#[tokio::test]
async fn inputs_queued_during_processing_are_drained_in_order() {
    let harness = setup(vec![
        RunStep::Spin { sleep_ms: 20 },
        RunStep::Accept,
        RunStep::Accept,
    ])
    .await;
    // The first input spins until its cycle budget is gone, giving the
    // later AdvanceStates time to land while processing is under way.
    let mut request = start_session_request("session");
    let cycles = request.server_cycles.as_mut().unwrap();
    cycles.max_advance_state = 1_000;
    cycles.advance_state_increment = 500;
    harness
        .manager
        .start_session(Request::new(request))
        .await
        .unwrap();

    advance(&harness, "session", 0, 0, b"slow").await;
    advance(&harness, "session", 0, 1, b"fast").await;
    advance(&harness, "session", 0, 2, b"faster").await;

    let status = wait_processed(&harness, "session", 0, 3).await;
    assert!(status.taint_status.is_none());
    assert_eq!(
        skip_reason(&status.processed_inputs[0]),
        InputSkipReason::CycleLimitExceeded as i32
    );
    for (index, input) in status.processed_inputs.iter().enumerate() {
        assert_eq!(input.input_index, index as u64);
    }
    assert!(matches!(
        status.processed_inputs[1].processed_oneof,
        Some(ProcessedOneof::Result(_))
    ));
    assert!(matches!(
        status.processed_inputs[2].processed_oneof,
        Some(ProcessedOneof::Result(_))
    ));
}
