//! # Message Codec
//!
//! Operation codes, inbound body decoding, outbound notification bodies and
//! client-side message builders.
//!
//! Every body starts with `op:uint32 query_id:uint64`.
//!
//! | Operation | Op | Fields after query id |
//! |-----------|----|-----------------------|
//! | setCustomSlot | `0x6e43536c` | `param_id:int32 response:MsgAddress ^value` |
//! | newVoting | `0x6e565052` | `expire_at:uint32 critical:Bool ^proposal` |
//! | voteForProposal | `0x566f7465` | `signature:bits512 sign_tag:uint32 idx:uint16 hash:uint256` |
//! | newValidatorsSet | `0x4e565354` | `^vset` |

use crate::domain::address::{MsgAddress, StdAddress};
use crate::domain::cell::{Cell, CellBuilder};
use crate::domain::proposal::{ProposalBody, ProposalRequest};
use crate::domain::value_objects::{Hash, ParamId};
use crate::errors::{CellError, DecodeError};
use std::sync::Arc;

// =============================================================================
// OPERATION CODES
// =============================================================================

/// Raw operation codes.
pub mod op {
    /// Direct write to a custom slot.
    pub const SET_CUSTOM_SLOT: u32 = 0x6e43_536c;
    /// Create a voting proposal.
    pub const NEW_VOTING: u32 = 0x6e56_5052;
    /// Vote for a proposal.
    pub const VOTE_FOR_PROPOSAL: u32 = 0x566f_7465;
    /// Submit a new validator set.
    pub const NEW_VALIDATORS_SET: u32 = 0x4e56_5354;

    /// Custom slot write stored.
    pub const CUSTOM_SLOT_ACCEPTED: u32 = 0xef76_4f4b;
    /// Custom slot write refused.
    pub const CUSTOM_SLOT_REJECTED: u32 = 0xef76_4f6f;
    /// Proposal created.
    pub const NEW_VOTING_CREATED: u32 = 0xee56_5052;
    /// Proposal for a custom slot refused.
    pub const CUSTOM_SLOT_VOTING_REJECTED: u32 = 0xc372_6956;
    /// Proposal refused for any other reason.
    pub const NEW_VOTING_REJECTED: u32 = 0xce56_5052;
    /// Vote handled by the vote collaborator.
    pub const VOTE_PROCESSED: u32 = 0xd674_5240;
    /// Validator set handled by the collaborator.
    pub const VALIDATORS_SET_ACCEPTED: u32 = 0xee76_4f4b;

    /// Body tag of a bounced message.
    pub const BOUNCE: u32 = 0xffff_ffff;
}

/// Tag carried inside a vote payload.
pub const VOTE_SIGN_TAG: u32 = 0x566f_7445;

/// Bits of the original body echoed in a bounce.
pub const BOUNCE_ECHO_BITS: usize = 256;

/// Inbound operations the contract understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    /// `setCustomSlot`.
    SetCustomSlot,
    /// `newVoting`.
    NewVoting,
    /// `voteForProposal`.
    VoteForProposal,
    /// `newValidatorsSet`.
    NewValidatorsSet,
}

impl Op {
    /// Maps a raw code to a known operation.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            op::SET_CUSTOM_SLOT => Some(Self::SetCustomSlot),
            op::NEW_VOTING => Some(Self::NewVoting),
            op::VOTE_FOR_PROPOSAL => Some(Self::VoteForProposal),
            op::NEW_VALIDATORS_SET => Some(Self::NewValidatorsSet),
            _ => None,
        }
    }

    /// Raw code.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::SetCustomSlot => op::SET_CUSTOM_SLOT,
            Self::NewVoting => op::NEW_VOTING,
            Self::VoteForProposal => op::VOTE_FOR_PROPOSAL,
            Self::NewValidatorsSet => op::NEW_VALIDATORS_SET,
        }
    }
}

/// Returns true for codes reserved for responses (high bit set).
#[must_use]
pub const fn is_response_op(code: u32) -> bool {
    code & 0x8000_0000 != 0
}

// =============================================================================
// DECODED REQUESTS
// =============================================================================

/// Decoded `setCustomSlot` body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetCustomSlotRequest {
    /// Target parameter.
    pub param_id: ParamId,
    /// Where to send the notification, if anywhere.
    pub response: Option<StdAddress>,
    /// Value to store.
    pub value: Arc<Cell>,
}

/// Decoded `voteForProposal` body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteRequest {
    /// Validator signature over the vote payload.
    pub signature: [u8; 64],
    /// Index of the voting validator.
    pub validator_idx: u16,
    /// Identity hash of the proposal.
    pub proposal_hash: Hash,
}

/// Decoded `newValidatorsSet` body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewValidatorsSetRequest {
    /// Proposed validator set.
    pub vset: Arc<Cell>,
}

/// Request carried by an inbound body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// Direct custom slot write.
    SetCustomSlot(SetCustomSlotRequest),
    /// Proposal creation.
    NewVoting(ProposalRequest),
    /// Vote.
    Vote(VoteRequest),
    /// Validator set submission.
    NewValidatorsSet(NewValidatorsSetRequest),
    /// Code the contract does not implement.
    Unknown,
}

/// Fully decoded inbound body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedBody {
    /// Raw operation code.
    pub op: u32,
    /// Query id echoed in replies.
    pub query_id: u64,
    /// Operation payload.
    pub request: Request,
}

/// Decodes an inbound body.
///
/// Returns `Ok(None)` for an empty body. Unknown codes decode to
/// [`Request::Unknown`] with whatever query id is present.
pub fn decode_body(body: &Cell) -> Result<Option<DecodedBody>, DecodeError> {
    let mut s = body.parse();
    if s.is_empty() {
        return Ok(None);
    }
    let code = s.load_uint(32)? as u32;

    let Some(operation) = Op::from_code(code) else {
        let query_id = if s.remaining_bits() >= 64 {
            s.load_uint(64)?
        } else {
            0
        };
        return Ok(Some(DecodedBody {
            op: code,
            query_id,
            request: Request::Unknown,
        }));
    };

    let query_id = s.load_uint(64)?;
    let request = match operation {
        Op::SetCustomSlot => {
            let param_id = s.load_int(32)? as ParamId;
            let response = s
                .load_address()?
                .to_response_address()
                .map_err(DecodeError::MalformedAddress)?;
            let value = s.load_ref()?;
            Request::SetCustomSlot(SetCustomSlotRequest {
                param_id,
                response,
                value,
            })
        }
        Op::NewVoting => {
            let expire_at = s.load_uint(32)? as u32;
            let critical = s.load_bit()?;
            let proposal = s.load_ref()?;
            Request::NewVoting(ProposalRequest {
                expire_at,
                critical,
                proposal,
            })
        }
        Op::VoteForProposal => {
            let mut signature = [0u8; 64];
            signature.copy_from_slice(&s.load_bytes(64)?);
            let tag = s.load_uint(32)? as u32;
            if tag != VOTE_SIGN_TAG {
                return Err(DecodeError::InvalidSignTag(tag));
            }
            let validator_idx = s.load_uint(16)? as u16;
            let proposal_hash = s.load_hash()?;
            Request::Vote(VoteRequest {
                signature,
                validator_idx,
                proposal_hash,
            })
        }
        Op::NewValidatorsSet => Request::NewValidatorsSet(NewValidatorsSetRequest {
            vset: s.load_ref()?,
        }),
    };
    Ok(Some(DecodedBody {
        op: code,
        query_id,
        request,
    }))
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Outbound notification kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    /// Custom slot write stored.
    CustomSlotAccepted,
    /// Custom slot write refused.
    CustomSlotRejected,
    /// Proposal created.
    NewVotingCreated,
    /// Proposal for a custom slot refused.
    CustomSlotVotingRejected,
    /// Proposal refused; carries a reason code.
    NewVotingRejected {
        /// Reason code.
        reason: u32,
    },
    /// Vote handled.
    VoteProcessed,
    /// Validator set handled.
    ValidatorsSetAccepted,
}

impl Notification {
    /// Operation code of the notification.
    #[must_use]
    pub const fn op(self) -> u32 {
        match self {
            Self::CustomSlotAccepted => op::CUSTOM_SLOT_ACCEPTED,
            Self::CustomSlotRejected => op::CUSTOM_SLOT_REJECTED,
            Self::NewVotingCreated => op::NEW_VOTING_CREATED,
            Self::CustomSlotVotingRejected => op::CUSTOM_SLOT_VOTING_REJECTED,
            Self::NewVotingRejected { .. } => op::NEW_VOTING_REJECTED,
            Self::VoteProcessed => op::VOTE_PROCESSED,
            Self::ValidatorsSetAccepted => op::VALIDATORS_SET_ACCEPTED,
        }
    }

    /// Encodes the notification body.
    pub fn encode(self, query_id: u64) -> Result<Cell, CellError> {
        let mut b = CellBuilder::new();
        b.store_uint(u64::from(self.op()), 32)?
            .store_uint(query_id, 64)?;
        if let Self::NewVotingRejected { reason } = self {
            b.store_uint(u64::from(reason), 32)?;
        }
        Ok(b.build())
    }

    /// Reads a notification body back. Unknown codes yield `None`.
    pub fn decode(body: &Cell) -> Result<Option<(Self, u64)>, CellError> {
        let mut s = body.parse();
        let code = s.load_uint(32)? as u32;
        let query_id = s.load_uint(64)?;
        let kind = match code {
            op::CUSTOM_SLOT_ACCEPTED => Self::CustomSlotAccepted,
            op::CUSTOM_SLOT_REJECTED => Self::CustomSlotRejected,
            op::NEW_VOTING_CREATED => Self::NewVotingCreated,
            op::CUSTOM_SLOT_VOTING_REJECTED => Self::CustomSlotVotingRejected,
            op::NEW_VOTING_REJECTED => Self::NewVotingRejected {
                reason: s.load_uint(32)? as u32,
            },
            op::VOTE_PROCESSED => Self::VoteProcessed,
            op::VALIDATORS_SET_ACCEPTED => Self::ValidatorsSetAccepted,
            _ => return Ok(None),
        };
        Ok(Some((kind, query_id)))
    }
}

/// Builds the body of a bounce for `original`: the bounce tag followed by
/// the leading bits of the original body.
pub fn bounce_body(original: &Cell) -> Result<Cell, CellError> {
    let echo = original.bit_len().min(BOUNCE_ECHO_BITS);
    let mut s = original.parse();
    let bits = s.load_bits(echo)?;
    let mut b = CellBuilder::new();
    b.store_uint(u64::from(op::BOUNCE), 32)?.store_bits(&bits, echo)?;
    Ok(b.build())
}

// =============================================================================
// CLIENT BUILDERS
// =============================================================================

/// Fields of a `newVoting` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewVotingParams {
    /// Expiration timestamp.
    pub expire_at: u32,
    /// Claimed criticality.
    pub critical: bool,
    /// Target parameter.
    pub param_id: ParamId,
    /// New value; `None` deletes.
    pub value: Option<Arc<Cell>>,
    /// Expected hash of the current value.
    pub current_hash: Option<Hash>,
}

/// Builds a `setCustomSlot` body.
pub fn set_custom_slot_message(
    param_id: ParamId,
    value: Arc<Cell>,
    response: &MsgAddress,
    query_id: u64,
) -> Result<Cell, CellError> {
    let mut b = CellBuilder::new();
    b.store_uint(u64::from(op::SET_CUSTOM_SLOT), 32)?
        .store_uint(query_id, 64)?
        .store_int(i64::from(param_id), 32)?
        .store_address(response)?
        .store_ref(value)?;
    Ok(b.build())
}

/// Builds a `newVoting` body. Returns the body and the proposal cell whose
/// hash identifies the proposal.
pub fn new_voting_proposal_message(
    params: &NewVotingParams,
    query_id: u64,
) -> Result<(Cell, Arc<Cell>), CellError> {
    let proposal = Arc::new(
        ProposalBody {
            param_id: params.param_id,
            value: params.value.clone(),
            if_hash_equal: params.current_hash,
        }
        .to_cell()?,
    );
    let mut b = CellBuilder::new();
    b.store_uint(u64::from(op::NEW_VOTING), 32)?
        .store_uint(query_id, 64)?
        .store_uint(u64::from(params.expire_at), 32)?
        .store_bit(params.critical)?
        .store_ref(Arc::clone(&proposal))?;
    Ok((b.build(), proposal))
}

/// Builds a `voteForProposal` body with an all-zero signature.
pub fn mock_vote_message(
    validator_idx: u16,
    proposal_hash: &Hash,
    query_id: u64,
) -> Result<Cell, CellError> {
    let mut b = CellBuilder::new();
    b.store_uint(u64::from(op::VOTE_FOR_PROPOSAL), 32)?
        .store_uint(query_id, 64)?
        .store_bytes(&[0u8; 64])?
        .store_uint(u64::from(VOTE_SIGN_TAG), 32)?
        .store_uint(u64::from(validator_idx), 16)?
        .store_hash(proposal_hash)?;
    Ok(b.build())
}

/// Builds a `newValidatorsSet` body.
pub fn new_vset_message(vset: Arc<Cell>, query_id: u64) -> Result<Cell, CellError> {
    let mut b = CellBuilder::new();
    b.store_uint(u64::from(op::NEW_VALIDATORS_SET), 32)?
        .store_uint(query_id, 64)?
        .store_ref(vset)?;
    Ok(b.build())
}

// =============================================================================
// TESTS
// =============================================================================
