//! # Custom Slot Scenarios
//!
//! Direct writes to -1024 and -1025 through `setCustomSlot`.
//!
//! ## Test Categories
//!
//! 1. **Admin writes** - accepted values, response handling
//! 2. **Access control** - foreign admins, other workchains, lookalike ids
//! 3. **Payload shape** - multi-cell and exotic values
//! 4. **Malformed messages** - bad response addresses, ordinary ids

mod common;

use common::*;
use config_contract::prelude::*;
use rand::Rng;
use std::sync::Arc;

// =============================================================================
// ADMIN WRITES
// =============================================================================

#[test]
fn test_admin_1024_sets_slot() {
    let mut contract = contract();
    let cell_a = text_cell(SCENARIO_TEXT);
    let cell_b = hash_cell(&cell_a);

    for value in [cell_a, cell_b] {
        let before = contract.get_param(CUSTOM_SLOT_1024);
        assert!(before.as_ref() != Some(&value));

        let outcome = set_slot(
            &mut contract,
            admin_1024(),
            CUSTOM_SLOT_1024,
            Arc::clone(&value),
            Some(deployer()),
        );
        assert_eq!(
            outcome.notification().map(|(kind, _)| kind),
            Some(Notification::CustomSlotAccepted)
        );
        assert_eq!(outcome.outbound().unwrap().destination, deployer());
        assert_param_set(&contract, CUSTOM_SLOT_1024, &value);
    }
}

#[test]
fn test_admin_1025_sets_slot() {
    // The -1025 admin is the config address itself.
    let mut contract = contract();
    let value = text_cell(SCENARIO_TEXT);
    let outcome = set_slot(
        &mut contract,
        admin_1025(),
        CUSTOM_SLOT_1025,
        Arc::clone(&value),
        Some(deployer()),
    );
    assert_eq!(
        outcome.notification().map(|(kind, _)| kind),
        Some(Notification::CustomSlotAccepted)
    );
    assert_param_set(&contract, CUSTOM_SLOT_1025, &value);

    // Overwrite with the second fixture value.
    let next = hash_cell(&value);
    set_slot(&mut contract, admin_1025(), CUSTOM_SLOT_1025, Arc::clone(&next), Some(deployer()));
    assert_param_set(&contract, CUSTOM_SLOT_1025, &next);
}

#[test]
fn test_write_touches_only_the_slot() {
    let mut contract = contract();
    let before = contract.config_snapshot();
    let value = text_cell(SCENARIO_TEXT);
    set_slot(&mut contract, admin_1024(), CUSTOM_SLOT_1024, Arc::clone(&value), None);

    let after = contract.config_snapshot();
    assert_eq!(after.len(), before.len() + 1);
    for (id, cell) in before.iter() {
        assert_eq!(after.get(id), Some(cell));
    }
}

#[test]
fn test_slot_without_response_address() {
    let mut contract = contract();
    let value = text_cell(SCENARIO_TEXT);
    for (slot, admin) in [
        (CUSTOM_SLOT_1024, admin_1024()),
        (CUSTOM_SLOT_1025, admin_1025()),
    ] {
        let outcome = set_slot(&mut contract, admin, slot, Arc::clone(&value), None);
        assert!(!outcome.is_aborted());
        assert!(outcome.outbound().is_none());
        assert_param_set(&contract, slot, &value);
    }
}

#[test]
fn test_shared_admin_binding() {
    let admin = StdAddress::new(-1, [0x42; 32]);
    let mut contract = contract_with(ContractConfig {
        admins: AdminBinding::Shared { admin },
        ..ContractConfig::default()
    });
    let value = text_cell(SCENARIO_TEXT);

    for slot in [CUSTOM_SLOT_1024, CUSTOM_SLOT_1025] {
        set_slot(&mut contract, admin, slot, Arc::clone(&value), None);
        assert_param_set(&contract, slot, &value);
    }

    // The default admins lose their rights.
    let before = contract.data_hash().unwrap();
    let outcome = set_slot(
        &mut contract,
        admin_1024(),
        CUSTOM_SLOT_1024,
        text_cell("other"),
        Some(deployer()),
    );
    assert_slot_rejected(&outcome, &contract, before, deployer());
}

// =============================================================================
// ACCESS CONTROL
// =============================================================================

fn check_only_admin(slot: ParamId, admin: StdAddress, other_admin: StdAddress) {
    let mut rng = rng();
    let mut contract = contract();
    let senders = [
        deployer(),
        random_address(&mut rng, 0),
        other_admin,
        admin.with_workchain(0),
        different_address(&mut rng, &admin),
    ];

    for sender in senders {
        // The value names the sender, so a successful write would be visible.
        let value = address_cell(&sender);
        let before = contract.data_hash().unwrap();
        let outcome = set_slot(&mut contract, sender, slot, value, Some(deployer()));

        if sender.is_masterchain() {
            assert_slot_rejected(&outcome, &contract, before, deployer());
        } else {
            assert_eq!(
                outcome,
                TransactionOutcome::Ignored(IgnoreReason::NotMasterchain)
            );
            assert_eq!(contract.data_hash().unwrap(), before);
        }
    }
    assert!(contract.get_param(slot).is_none());
}

#[test]
fn test_only_admin_1024_sets_slot() {
    check_only_admin(CUSTOM_SLOT_1024, admin_1024(), admin_1025());
}

#[test]
fn test_only_admin_1025_sets_slot() {
    check_only_admin(CUSTOM_SLOT_1025, admin_1025(), admin_1024());
}

#[test]
fn test_ordinary_params_not_settable() {
    let mut rng = rng();
    let value = text_cell(SCENARIO_TEXT);
    let mut params: Vec<ParamId> = (0..5).map(|_| rng.gen_range(1..=81)).collect();
    params.extend((0..5).map(|_| rng.gen_range(-1023..=-1)));
    params.push(-94);

    let mut contract = contract();
    for sender in [admin_1025(), admin_1024()] {
        for &param in &params {
            let before = contract.data_hash().unwrap();
            let outcome = set_slot(
                &mut contract,
                sender,
                param,
                Arc::clone(&value),
                Some(deployer()),
            );
            assert_slot_rejected(&outcome, &contract, before, deployer());
            assert!(matches!(
                outcome,
                TransactionOutcome::Executed {
                    effect: Effect::SlotRejected(SlotRejection::NotCustomSlot { .. }),
                    ..
                }
            ));
        }
    }
}

// =============================================================================
// PAYLOAD SHAPE
// =============================================================================

#[test]
fn test_multi_cell_value_rejected() {
    // The accepted string, moved into a child reference.
    let mut contract = contract();
    let value = ref_text_cell(SCENARIO_TEXT);
    for (slot, admin) in [
        (CUSTOM_SLOT_1024, admin_1024()),
        (CUSTOM_SLOT_1025, admin_1025()),
    ] {
        let before = contract.data_hash().unwrap();
        let outcome = set_slot(&mut contract, admin, slot, Arc::clone(&value), Some(deployer()));
        assert_slot_rejected(&outcome, &contract, before, deployer());
        assert!(contract.get_param(slot).is_none());
    }
}

#[test]
fn test_exotic_values_rejected() {
    let mut contract = contract();
    let inner = text_cell(SCENARIO_TEXT);
    for (slot, admin) in [
        (CUSTOM_SLOT_1024, admin_1024()),
        (CUSTOM_SLOT_1025, admin_1025()),
    ] {
        for payload in exotic_cells(&inner) {
            assert!(payload.is_exotic());
            let before = contract.data_hash().unwrap();
            let outcome = set_slot(&mut contract, admin, slot, payload, Some(deployer()));
            assert_slot_rejected(&outcome, &contract, before, deployer());
        }
    }
}

#[test]
fn test_rejection_preserves_previous_value() {
    let mut contract = contract();
    let original = text_cell(SCENARIO_TEXT);
    set_slot(&mut contract, admin_1024(), CUSTOM_SLOT_1024, Arc::clone(&original), None);

    let [library, ..] = exotic_cells(&original);
    set_slot(&mut contract, admin_1024(), CUSTOM_SLOT_1024, library, Some(deployer()));
    set_slot(&mut contract, admin_1025(), CUSTOM_SLOT_1024, text_cell("x"), Some(deployer()));
    set_slot(
        &mut contract,
        admin_1024(),
        CUSTOM_SLOT_1024,
        ref_text_cell("y"),
        Some(deployer()),
    );
    assert_param_set(&contract, CUSTOM_SLOT_1024, &original);
}

#[test]
fn test_legacy_multi_cell_slot_does_not_block_contract() {
    let mut store = fixture_store();
    store.set(CUSTOM_SLOT_1025, ref_text_cell("legacy"));
    let mut contract = ConfigContractService::new(
        ContractConfig::default(),
        ContractState::with_config(store),
        InMemoryCollaborator::new(),
    );

    let params = NewVotingParams {
        expire_at: 1_900_000_000,
        critical: false,
        param_id: 20,
        value: Some(text_cell(SCENARIO_TEXT)),
        current_hash: contract.get_param(20).map(|cell| cell.hash()),
    };
    let (body, proposal) = new_voting_proposal_message(&params, 1).unwrap();
    let outcome = send(&mut contract, deployer(), body);
    assert_eq!(
        outcome.notification(),
        Some((Notification::NewVotingCreated, 1))
    );
    assert!(contract.get_proposal(&proposal.hash()).is_some());

    let value = text_cell(SCENARIO_TEXT);
    let outcome = set_slot(
        &mut contract,
        admin_1024(),
        CUSTOM_SLOT_1024,
        Arc::clone(&value),
        Some(deployer()),
    );
    assert_eq!(
        outcome.notification().map(|(kind, _)| kind),
        Some(Notification::CustomSlotAccepted)
    );
    assert_param_set(&contract, CUSTOM_SLOT_1024, &value);

    // The admin can also replace the legacy value.
    set_slot(&mut contract, admin_1025(), CUSTOM_SLOT_1025, Arc::clone(&value), None);
    assert_param_set(&contract, CUSTOM_SLOT_1025, &value);
    assert_eq!(contract.stats().aborted, 0);
}

// =============================================================================
// MALFORMED MESSAGES
// =============================================================================

#[test]
fn test_malformed_response_address_bounces() {
    let mut contract = contract();
    let responses = [
        MsgAddress::External {
            bit_len: 24,
            bits: vec![1, 2, 3],
        },
        MsgAddress::Var {
            anycast: None,
            workchain: -1,
            bit_len: 256,
            bits: vec![0xde; 32],
        },
    ];

    for response in responses {
        for (sender, slot) in [
            (admin_1024(), CUSTOM_SLOT_1024),
            (deployer(), CUSTOM_SLOT_1025),
        ] {
            let before = contract.data_hash().unwrap();
            let body =
                set_custom_slot_message(slot, text_cell(SCENARIO_TEXT), &response, 5).unwrap();
            let outcome = send(&mut contract, sender, body);

            assert!(outcome.is_aborted(), "outcome: {outcome:?}");
            assert_eq!(outcome.exit_code(), 9);
            let bounce = outcome.outbound().unwrap();
            assert!(bounce.bounced);
            assert_eq!(bounce.destination, sender);
            assert_eq!(contract.data_hash().unwrap(), before);
        }
    }
    assert_eq!(contract.stats().aborted, 4);
}

#[test]
fn test_query_id_echoed() {
    let mut contract = contract();
    let body = set_custom_slot_message(
        CUSTOM_SLOT_1025,
        text_cell(SCENARIO_TEXT),
        &MsgAddress::from(deployer()),
        0xdead_beef,
    )
    .unwrap();
    let outcome = send(&mut contract, admin_1025(), body);
    assert_eq!(
        outcome.notification(),
        Some((Notification::CustomSlotAccepted, 0xdead_beef))
    );
}
