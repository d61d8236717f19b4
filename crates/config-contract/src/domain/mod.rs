//! # Domain Layer (Inner Hexagon)
//!
//! Pure governance logic for the config contract: cells, addresses,
//! dictionaries, the parameter store, access control and proposals.
//! NO I/O, NO logging, NO message framing.

pub mod access;
pub mod address;
pub mod cell;
pub mod custom_slot;
pub mod dict;
pub mod invariants;
pub mod proposal;
pub mod state;
pub mod store;
pub mod validator;
pub mod value_objects;

pub use access::{authorize, AccessDecision, AdminBinding, CustomSlot};
pub use address::{AddressClass, Anycast, MsgAddress, StdAddress, MASTERCHAIN};
pub use cell::{Cell, CellBuilder, CellSlice, CellType};
pub use custom_slot::{apply_custom_slot, SlotOutcome, SlotRejection};
pub use invariants::*;
pub use proposal::{
    create_proposal, MalformedProposal, Proposal, ProposalBody, ProposalRequest, ProposalTable,
    VotingRejection,
};
pub use state::ContractState;
pub use store::ConfigStore;
pub use validator::{classify_payload, validate_payload, PayloadRejection};
pub use value_objects::*;
