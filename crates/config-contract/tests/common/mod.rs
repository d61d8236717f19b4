//! Shared fixtures for the scenario tests.

#![allow(dead_code)]

use config_contract::domain::proposal::critical_params_cell;
use config_contract::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::env;
use std::sync::{Arc, Once};

pub const SCENARIO_TEXT: &str = "Hop hey La La Ley";

/// Ids flagged critical in the fixture registry.
pub const CRITICAL: [ParamId; 12] = [0, 1, 9, 10, 12, 14, 15, 16, 17, 32, 34, 36];

// =============================================================================
// ADDRESSES
// =============================================================================

pub fn admin_1024() -> StdAddress {
    StdAddress::new(-1, [0x33; 32])
}

pub fn admin_1025() -> StdAddress {
    StdAddress::new(-1, [0x55; 32])
}

pub fn deployer() -> StdAddress {
    StdAddress::new(-1, [0xde; 32])
}

pub fn random_address(rng: &mut StdRng, workchain: i8) -> StdAddress {
    StdAddress::new(workchain, rng.gen())
}

/// Random masterchain address distinct from `other`.
pub fn different_address(rng: &mut StdRng, other: &StdAddress) -> StdAddress {
    loop {
        let candidate = random_address(rng, other.workchain);
        if candidate != *other {
            return candidate;
        }
    }
}

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(0x6e43_536c)
}

// =============================================================================
// CELLS
// =============================================================================

pub fn text_cell(s: &str) -> Arc<Cell> {
    let mut b = CellBuilder::new();
    b.store_string_tail(s).unwrap();
    Arc::new(b.build())
}

/// Same text, moved into a child cell.
pub fn ref_text_cell(s: &str) -> Arc<Cell> {
    let mut b = CellBuilder::new();
    b.store_string_ref_tail(s).unwrap();
    Arc::new(b.build())
}

/// A cell holding the hash of `cell`.
pub fn hash_cell(cell: &Cell) -> Arc<Cell> {
    let mut b = CellBuilder::new();
    b.store_hash(&cell.hash()).unwrap();
    Arc::new(b.build())
}

/// A cell holding a serialized address.
pub fn address_cell(address: &StdAddress) -> Arc<Cell> {
    let mut b = CellBuilder::new();
    b.store_address(&MsgAddress::from(*address)).unwrap();
    Arc::new(b.build())
}

/// Library, Merkle proof and Merkle update cells wrapping `inner`.
pub fn exotic_cells(inner: &Arc<Cell>) -> [Arc<Cell>; 3] {
    let library = Arc::new(Cell::library(inner.hash()));
    let proof = Arc::new(Cell::merkle_proof(Arc::clone(inner)));
    let update = Arc::new(Cell::merkle_update(Arc::clone(&proof), Arc::clone(&proof)));
    [library, proof, update]
}

// =============================================================================
// CONTRACT
// =============================================================================

/// Parameter store resembling a live network: a handful of ordinary
/// parameters plus the critical registry.
pub fn fixture_store() -> ConfigStore {
    let mut store = ConfigStore::new();
    store.set(0, address_cell(&admin_1025()));
    store.set(1, address_cell(&admin_1024()));
    store.set(
        10,
        Arc::new(critical_params_cell(CRITICAL).unwrap().unwrap()),
    );
    for id in [8, 15, 17, 20, 21, 34, 44, 71, 79, 81] {
        store.set(id, text_cell(&format!("param {id}")));
    }
    store
}

pub fn contract() -> ConfigContractService<InMemoryCollaborator> {
    contract_with(ContractConfig::default())
}

/// Installs the log subscriber once per test binary. Quiet unless
/// `RUST_LOG` or `CFG_LOG_LEVEL` is set.
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let mut config = TelemetryConfig::from_env();
        if env::var("RUST_LOG").is_err() && env::var("CFG_LOG_LEVEL").is_err() {
            config.log_level = "off".to_string();
        }
        let _ = init_tracing(&config);
    });
}

pub fn contract_with(config: ContractConfig) -> ConfigContractService<InMemoryCollaborator> {
    init_test_logging();
    ConfigContractService::new(
        config,
        ContractState::with_config(fixture_store()),
        InMemoryCollaborator::new(),
    )
}

pub fn send<C: GovernanceCollaborator>(
    contract: &mut ConfigContractService<C>,
    sender: StdAddress,
    body: Cell,
) -> TransactionOutcome {
    contract.process(InboundMessage::internal(sender, body).with_value(10_000_000_000))
}

pub fn set_slot<C: GovernanceCollaborator>(
    contract: &mut ConfigContractService<C>,
    sender: StdAddress,
    param_id: ParamId,
    value: Arc<Cell>,
    response: Option<StdAddress>,
) -> TransactionOutcome {
    let body = set_custom_slot_message(param_id, value, &MsgAddress::from(response), 0).unwrap();
    send(contract, sender, body)
}

/// Asserts a rejection notification reached `response` and the state is
/// byte-for-byte unchanged.
pub fn assert_slot_rejected<C: GovernanceCollaborator>(
    outcome: &TransactionOutcome,
    contract: &ConfigContractService<C>,
    data_before: Hash,
    response: StdAddress,
) {
    assert_eq!(
        outcome.notification().map(|(kind, _)| kind),
        Some(Notification::CustomSlotRejected),
        "outcome: {outcome:?}"
    );
    assert_eq!(outcome.outbound().unwrap().destination, response);
    assert_eq!(contract.data_hash().unwrap(), data_before);
}

pub fn assert_param_set<C: GovernanceCollaborator>(
    contract: &ConfigContractService<C>,
    param_id: ParamId,
    value: &Arc<Cell>,
) {
    assert_eq!(contract.get_param(param_id).as_ref(), Some(value));
}
