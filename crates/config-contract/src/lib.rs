//! # Config Contract - Network Parameter Governance
//!
//! Governance core of the network configuration contract. Holds the numbered
//! configuration parameters and exposes two mutation paths:
//!
//! - **Custom slots**: the admins of parameters -1024 and -1025 overwrite
//!   them directly, without voting.
//! - **Proposals**: anyone may propose a change to an ordinary parameter,
//!   provided the proposal names the hash of the current value.
//!
//! Every inbound message is decoded once, routed to exactly one handler and
//! produces at most one outbound message. Processing is deterministic and
//! single-threaded; each message is an atomic transaction.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Custom slots never reach the proposal table | `domain/proposal.rs` - `create_proposal()` |
//! | INVARIANT-2 | A custom slot write stores a single ordinary cell | `domain/validator.rs` - `validate_payload()` |
//! | INVARIANT-3 | Parameters change only through an accepted slot write | `domain/invariants.rs` - `check_config_isolation_invariant()` |
//! | INVARIANT-4 | Proposals change only through creation or a vote | `domain/invariants.rs` - `check_proposal_isolation_invariant()` |
//! | INVARIANT-5 | Refused messages leave state untouched | `service.rs` - rollback on abort |
//!
//! ## Outcome Taxonomy
//!
//! | Condition | Outcome | Reply |
//! |-----------|---------|-------|
//! | Sender outside the masterchain, bounced or empty message | `Ignored` | none |
//! | Wrong admin, ordinary id, exotic or multi-cell value | `SlotRejected` | `customSlotRejected` |
//! | Proposal for -1024 / -1025 | `VotingRejected` | `customSlotVotingRejected` |
//! | Stale hash, critical mismatch, duplicate, bad proposal cell | `VotingRejected` | `newVotingRejected` |
//! | Malformed body or response address | `Aborted` (exit 9) | bounce |
//! | Unknown query op | `Unsupported` (exit 0xffff) | none |
//!
//! ## Outbound Dependencies
//!
//! | Concern | Trait | Purpose |
//! |---------|-------|---------|
//! | Vote tallying | `GovernanceCollaborator::on_vote` | Quorum bookkeeping |
//! | Validator sets | `GovernanceCollaborator::on_new_validator_set` | Set adoption |
//!
//! ## Usage Example
//!
//! ```ignore
//! use config_contract::prelude::*;
//!
//! let mut contract = ConfigContractService::with_config(
//!     ContractConfig::from_env()?,
//!     InMemoryCollaborator::new(),
//! );
//! let outcome = contract.process(InboundMessage::internal(sender, body));
//! if let Some(reply) = outcome.outbound() {
//!     deliver(reply);
//! }
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod messages;
pub mod ports;
pub mod service;
pub mod telemetry;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Cells and addresses
    pub use crate::domain::address::{AddressClass, MsgAddress, StdAddress};
    pub use crate::domain::cell::{Cell, CellBuilder, CellSlice, CellType};

    // Domain
    pub use crate::domain::access::{AdminBinding, CustomSlot};
    pub use crate::domain::custom_slot::SlotRejection;
    pub use crate::domain::proposal::{Proposal, ProposalBody, VotingRejection};
    pub use crate::domain::state::ContractState;
    pub use crate::domain::store::ConfigStore;
    pub use crate::domain::validator::PayloadRejection;
    pub use crate::domain::value_objects::{Hash, ParamId, CUSTOM_SLOT_1024, CUSTOM_SLOT_1025};

    // Invariants
    pub use crate::domain::invariants::{
        check_all_invariants, InvariantCheckResult, InvariantViolation, Transition,
    };

    // Messages
    pub use crate::messages::{
        mock_vote_message, new_voting_proposal_message, new_vset_message, op,
        set_custom_slot_message, NewVotingParams, Notification,
    };

    // Ports
    pub use crate::ports::inbound::{
        ConfigContractApi, Effect, IgnoreReason, InboundMessage, OutboundMessage,
        TransactionOutcome,
    };
    pub use crate::ports::outbound::GovernanceCollaborator;

    // Errors
    pub use crate::errors::{CellError, ConfigError, ContractError, DecodeError};

    // Adapters
    pub use crate::adapters::{InMemoryCollaborator, NullCollaborator};

    // Service
    pub use crate::config::ContractConfig;
    pub use crate::service::{create_test_service, ConfigContractService, ServiceStats};
    pub use crate::telemetry::{init_tracing, TelemetryConfig};
}
