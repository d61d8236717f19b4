//! # Driving Ports (API - Inbound)
//!
//! The interface the hosting runtime uses to feed messages to the contract
//! and read its state, plus the message and outcome types crossing it.

use crate::domain::access::CustomSlot;
use crate::domain::address::StdAddress;
use crate::domain::cell::Cell;
use crate::domain::custom_slot::SlotRejection;
use crate::domain::proposal::{Proposal, VotingRejection};
use crate::domain::store::ConfigStore;
use crate::domain::value_objects::{Hash, ParamId};
use crate::errors::{ContractError, EXIT_UNKNOWN_OP};
use crate::messages::Notification;
use std::sync::Arc;

// =============================================================================
// MESSAGES
// =============================================================================

/// Internal message delivered to the contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    /// Source account.
    pub sender: StdAddress,
    /// Attached value in nanotons.
    pub value: u128,
    /// Whether the sender asked for a bounce on failure.
    pub bounce: bool,
    /// Whether this message is itself a bounce.
    pub bounced: bool,
    /// Message body.
    pub body: Arc<Cell>,
}

impl InboundMessage {
    /// Bounceable message with no attached value.
    #[must_use]
    pub fn internal(sender: StdAddress, body: impl Into<Arc<Cell>>) -> Self {
        Self {
            sender,
            value: 0,
            bounce: true,
            bounced: false,
            body: body.into(),
        }
    }

    /// Sets the attached value.
    #[must_use]
    pub fn with_value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }
}

/// Message emitted by a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Destination account.
    pub destination: StdAddress,
    /// Forwarded value in nanotons.
    pub value: u128,
    /// Whether this is a bounce of the inbound message.
    pub bounced: bool,
    /// Message body.
    pub body: Arc<Cell>,
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Why a message was dropped silently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Inbound message is a bounce.
    Bounced,
    /// Body carries no data.
    EmptyBody,
    /// Sender is outside the masterchain.
    NotMasterchain,
    /// Unknown response code (high bit set).
    Response {
        /// Raw operation code.
        op: u32,
    },
}

/// What a committed transaction did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Custom slot overwritten.
    SlotWritten {
        /// Slot written.
        slot: CustomSlot,
    },
    /// Custom slot write refused.
    SlotRejected(SlotRejection),
    /// Proposal recorded.
    ProposalCreated {
        /// Identity hash.
        hash: Hash,
    },
    /// Proposal refused.
    VotingRejected(VotingRejection),
    /// Vote handed to the collaborator.
    VoteForwarded {
        /// Target proposal.
        proposal_hash: Hash,
        /// Whether the proposal exists.
        known: bool,
    },
    /// Validator set handed to the collaborator.
    ValidatorSetForwarded,
}

impl Effect {
    /// Returns true if the effect is a refusal.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::SlotRejected(_) | Self::VotingRejected(_))
    }
}

/// Result of processing one inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// Dropped without reply; state unchanged.
    Ignored(IgnoreReason),
    /// Handled; at most one notification.
    Executed {
        /// What happened.
        effect: Effect,
        /// Reply, if any.
        notification: Option<OutboundMessage>,
    },
    /// Aborted; state unchanged and the inbound message bounces when
    /// bounceable.
    Aborted {
        /// Why.
        error: ContractError,
        /// Bounce message.
        bounce: Option<OutboundMessage>,
    },
    /// Query with an operation code the contract does not implement.
    Unsupported {
        /// Raw operation code.
        op: u32,
    },
}

impl TransactionOutcome {
    /// Exit code the runtime records for the transaction.
    #[must_use]
    pub fn exit_code(&self) -> u32 {
        match self {
            Self::Ignored(_) | Self::Executed { .. } => 0,
            Self::Aborted { error, .. } => error.exit_code(),
            Self::Unsupported { .. } => EXIT_UNKNOWN_OP,
        }
    }

    /// Returns true if the transaction aborted.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }

    /// The single outbound message, if any.
    #[must_use]
    pub fn outbound(&self) -> Option<&OutboundMessage> {
        match self {
            Self::Executed { notification, .. } => notification.as_ref(),
            Self::Aborted { bounce, .. } => bounce.as_ref(),
            Self::Ignored(_) | Self::Unsupported { .. } => None,
        }
    }

    /// Notification kind and query id of the outbound message.
    #[must_use]
    pub fn notification(&self) -> Option<(Notification, u64)> {
        match self {
            Self::Executed {
                notification: Some(msg),
                ..
            } => Notification::decode(&msg.body).ok().flatten(),
            _ => None,
        }
    }
}

// =============================================================================
// API
// =============================================================================

/// Public interface of the config contract.
pub trait ConfigContractApi {
    /// Processes one inbound message as an atomic transaction.
    fn process(&mut self, message: InboundMessage) -> TransactionOutcome;

    /// Value of `param_id`, if set.
    fn get_param(&self, param_id: ParamId) -> Option<Arc<Cell>>;

    /// Proposal with identity `hash`, if pending.
    fn get_proposal(&self, hash: &Hash) -> Option<Proposal>;

    /// Copy of the whole parameter store.
    fn config_snapshot(&self) -> ConfigStore;

    /// Hash of the persisted state root.
    fn data_hash(&self) -> Result<Hash, ContractError>;
}
