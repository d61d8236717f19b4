//! # Dispatcher Properties
//!
//! Randomized checks of the entry filter and the atomicity of refused
//! messages.

mod common;

use common::*;
use config_contract::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

const KNOWN_OPS: [u32; 5] = [
    op::SET_CUSTOM_SLOT,
    op::NEW_VOTING,
    op::VOTE_FOR_PROPOSAL,
    op::NEW_VALIDATORS_SET,
    op::CUSTOM_SLOT_ACCEPTED,
];

fn address(workchain: i8, hash: [u8; 32]) -> StdAddress {
    StdAddress::new(workchain, hash)
}

/// Known op followed by arbitrary bits and an optional reference.
fn raw_body(op: u32, bytes: &[u8], bit_len: usize, with_ref: bool) -> Cell {
    let mut b = CellBuilder::new();
    b.store_uint(u64::from(op), 32).unwrap();
    b.store_bits(bytes, bit_len).unwrap();
    if with_ref {
        b.store_ref(text_cell(SCENARIO_TEXT)).unwrap();
    }
    b.build()
}

fn is_commit(outcome: &TransactionOutcome) -> bool {
    matches!(outcome, TransactionOutcome::Executed { effect, .. } if !effect.is_rejection())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_ordinary_ids_never_written(
        param_id in any::<i32>().prop_filter("custom slot", |id| *id != -1024 && *id != -1025),
        use_1025 in any::<bool>(),
    ) {
        let mut contract = contract();
        let sender = if use_1025 { admin_1025() } else { admin_1024() };
        let before = contract.data_hash().unwrap();

        let outcome = set_slot(
            &mut contract,
            sender,
            param_id,
            text_cell(SCENARIO_TEXT),
            Some(deployer()),
        );

        prop_assert_eq!(
            outcome.notification().map(|(kind, _)| kind),
            Some(Notification::CustomSlotRejected)
        );
        prop_assert_eq!(contract.data_hash().unwrap(), before);
    }

    #[test]
    fn prop_foreign_workchains_ignored(
        workchain in any::<i8>().prop_filter("masterchain", |wc| *wc != -1),
        hash in any::<[u8; 32]>(),
        op_idx in 0..KNOWN_OPS.len(),
    ) {
        let mut contract = contract();
        let before = contract.data_hash().unwrap();
        let sender = address(workchain, hash);

        // A body that would succeed for a masterchain admin.
        let body = match KNOWN_OPS[op_idx] {
            op::SET_CUSTOM_SLOT => set_custom_slot_message(
                CUSTOM_SLOT_1025,
                text_cell(SCENARIO_TEXT),
                &MsgAddress::from(deployer()),
                0,
            ).unwrap(),
            op::NEW_VOTING => new_voting_proposal_message(
                &NewVotingParams {
                    expire_at: 0,
                    critical: false,
                    param_id: 20,
                    value: None,
                    current_hash: None,
                },
                0,
            ).unwrap().0,
            other => raw_body(other, &[0; 8], 64, true),
        };

        let outcome = send(&mut contract, sender, body);
        prop_assert_eq!(outcome, TransactionOutcome::Ignored(IgnoreReason::NotMasterchain));
        prop_assert_eq!(contract.data_hash().unwrap(), before);
        prop_assert!(contract.get_param(CUSTOM_SLOT_1025).is_none());
    }

    #[test]
    fn prop_random_bodies_are_atomic(
        op_idx in 0..=KNOWN_OPS.len(),
        raw_op in any::<u32>(),
        bytes in proptest::collection::vec(any::<u8>(), 0..120),
        trim in 0usize..8,
        with_ref in any::<bool>(),
        bounce in any::<bool>(),
    ) {
        let op = KNOWN_OPS.get(op_idx).copied().unwrap_or(raw_op);
        let bit_len = (bytes.len() * 8).saturating_sub(trim);
        let body = raw_body(op, &bytes, bit_len, with_ref);

        let mut contract = contract();
        let before = contract.data_hash().unwrap();
        let mut message = InboundMessage::internal(admin_1025(), body);
        message.bounce = bounce;
        let outcome = contract.process(message);

        if !is_commit(&outcome) {
            prop_assert_eq!(contract.data_hash().unwrap(), before);
        }
        match &outcome {
            TransactionOutcome::Aborted { error, bounce: reply } => {
                prop_assert_eq!(error.exit_code(), outcome.exit_code());
                prop_assert_eq!(reply.is_some(), bounce);
                if let Some(reply) = reply {
                    prop_assert!(reply.bounced);
                    prop_assert_eq!(reply.destination, admin_1025());
                }
            }
            TransactionOutcome::Unsupported { op: code } => {
                prop_assert_eq!(*code, op);
                prop_assert_eq!(outcome.exit_code(), 0xffff);
            }
            TransactionOutcome::Executed { .. } | TransactionOutcome::Ignored(_) => {
                prop_assert_eq!(outcome.exit_code(), 0);
            }
        }
    }

    #[test]
    fn prop_bounced_messages_ignored(op_idx in 0..KNOWN_OPS.len(), query_id in any::<u64>()) {
        let mut contract = contract();
        let before = contract.data_hash().unwrap();
        let body = raw_body(KNOWN_OPS[op_idx], &query_id.to_be_bytes(), 64, true);
        let mut message = InboundMessage::internal(admin_1024(), Arc::new(body));
        message.bounced = true;

        prop_assert_eq!(
            contract.process(message),
            TransactionOutcome::Ignored(IgnoreReason::Bounced)
        );
        prop_assert_eq!(contract.data_hash().unwrap(), before);
    }
}
