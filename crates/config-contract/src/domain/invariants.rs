//! # Domain Invariants
//!
//! Properties that must hold across every processed message. The service
//! checks them after each transaction against the state it started from.
//!
//! - INVARIANT-1: Custom slots never appear in the proposal table
//! - INVARIANT-2: A custom slot write stores a single ordinary cell
//! - INVARIANT-3: Parameters change only through an accepted slot write
//! - INVARIANT-4: Proposals change only through creation or a vote
//! - INVARIANT-5: Rejected and ignored messages leave state untouched

use crate::domain::access::CustomSlot;
use crate::domain::state::ContractState;
use crate::domain::validator::validate_payload;
use crate::domain::value_objects::{is_protected_param, Hash, ParamId};

/// What a transaction was allowed to change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Nothing.
    Unchanged,
    /// Exactly one custom slot.
    SlotWritten(CustomSlot),
    /// One new proposal.
    ProposalCreated(Hash),
    /// An existing proposal's vote bookkeeping.
    ProposalVoted(Hash),
}

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// INVARIANT-1: no proposal targets -1024 or -1025.
#[must_use]
pub fn check_protected_slots_invariant(state: &ContractState) -> bool {
    state
        .proposals
        .iter()
        .all(|(_, p)| !is_protected_param(p.param_id))
}

/// INVARIANT-2: the slot written by this transaction passes the payload check.
///
/// Values present before the transaction are not re-validated.
#[must_use]
pub fn check_slot_payload_invariant(after: &ContractState, transition: Transition) -> bool {
    match transition {
        Transition::SlotWritten(slot) => after
            .config
            .get(slot.param_id())
            .is_some_and(|cell| validate_payload(cell).is_ok()),
        _ => true,
    }
}

/// INVARIANT-3: parameters other than the written slot are unchanged.
#[must_use]
pub fn check_config_isolation_invariant(
    before: &ContractState,
    after: &ContractState,
    transition: Transition,
) -> bool {
    let written = match transition {
        Transition::SlotWritten(slot) => Some(slot.param_id()),
        _ => None,
    };
    let ids: std::collections::BTreeSet<ParamId> = before
        .config
        .iter()
        .chain(after.config.iter())
        .map(|(id, _)| id)
        .collect();
    ids.into_iter()
        .filter(|id| Some(*id) != written)
        .all(|id| before.config.get(id) == after.config.get(id))
}

/// INVARIANT-4: the proposal table differs only at the touched proposal.
#[must_use]
pub fn check_proposal_isolation_invariant(
    before: &ContractState,
    after: &ContractState,
    transition: Transition,
) -> bool {
    match transition {
        Transition::ProposalCreated(hash) => {
            !before.proposals.contains(&hash)
                && after.proposals.contains(&hash)
                && after.proposals.len() == before.proposals.len() + 1
                && before
                    .proposals
                    .iter()
                    .all(|(h, p)| after.proposals.get(h) == Some(p))
        }
        Transition::ProposalVoted(hash) => {
            before.proposals.len() == after.proposals.len()
                && before.proposals.iter().all(|(h, p)| {
                    *h == hash || after.proposals.get(h) == Some(p)
                })
                && match (before.proposals.get(&hash), after.proposals.get(&hash)) {
                    (Some(old), Some(new)) => {
                        old.param_id == new.param_id
                            && old.value == new.value
                            && old.critical == new.critical
                    }
                    _ => false,
                }
        }
        Transition::Unchanged | Transition::SlotWritten(_) => before.proposals == after.proposals,
    }
}

/// INVARIANT-5: an unchanged transition keeps the state identical.
#[must_use]
pub fn check_rollback_invariant(
    before: &ContractState,
    after: &ContractState,
    transition: Transition,
) -> bool {
    transition != Transition::Unchanged || before == after
}

/// Check all invariants at once.
#[must_use]
pub fn check_all_invariants(
    before: &ContractState,
    after: &ContractState,
    transition: Transition,
) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if !check_protected_slots_invariant(after) {
        violations.push(InvariantViolation::ProtectedProposal);
    }

    if !check_slot_payload_invariant(after, transition) {
        violations.push(InvariantViolation::InvalidSlotPayload);
    }

    if !check_config_isolation_invariant(before, after, transition) {
        violations.push(InvariantViolation::ConfigChanged { transition });
    }

    if !check_proposal_isolation_invariant(before, after, transition) {
        violations.push(InvariantViolation::ProposalsChanged { transition });
    }

    if !check_rollback_invariant(before, after, transition) {
        violations.push(InvariantViolation::StateNotRolledBack);
    }

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking all invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A proposal targets a custom slot.
    ProtectedProposal,
    /// A custom slot holds an exotic or multi-cell value.
    InvalidSlotPayload,
    /// Parameters changed outside the permitted slot.
    ConfigChanged {
        /// Transition the message was allowed.
        transition: Transition,
    },
    /// Proposal table changed outside the permitted entry.
    ProposalsChanged {
        /// Transition the message was allowed.
        transition: Transition,
    },
    /// State changed although the message was refused.
    StateNotRolledBack,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProtectedProposal => write!(f, "proposal targets a custom slot"),
            Self::InvalidSlotPayload => write!(f, "custom slot holds an invalid value"),
            Self::ConfigChanged { transition } => {
                write!(f, "config changed outside {transition:?}")
            }
            Self::ProposalsChanged { transition } => {
                write!(f, "proposals changed outside {transition:?}")
            }
            Self::StateNotRolledBack => write!(f, "state changed on a refused message"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
