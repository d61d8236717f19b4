//! # Proposal Manager
//!
//! Creation and bookkeeping of voting proposals for ordinary parameters.
//!
//! A proposal is identified by the hash of the proposal cell carried in the
//! `newVoting` message:
//!
//! ```text
//! cfg_proposal#f3 param_id:int32 param_value:(Maybe ^Cell) if_hash_equal:(Maybe uint256)
//! ```
//!
//! Creation checks, in order:
//!
//! 1. the proposal cell parses;
//! 2. the target is not a custom slot (-1024, -1025);
//! 3. `if_hash_equal`, when present, equals the hash of the current value
//!    (all zeros when unset);
//! 4. the critical flag matches the critical parameter registry;
//! 5. no proposal with the same identity exists.

use crate::domain::cell::{Cell, CellBuilder};
use crate::domain::dict::{
    build_dict, build_int_set, hash_key, key_to_hash, parse_dict, parse_int_set, DictKey,
};
use crate::domain::store::ConfigStore;
use crate::domain::value_objects::{is_protected_param, Hash, ParamId};
use crate::errors::CellError;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Tag byte of a proposal cell.
pub const PROPOSAL_TAG: u8 = 0xf3;

// =============================================================================
// PROPOSAL BODY
// =============================================================================

/// Parsed content of a proposal cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalBody {
    /// Target parameter.
    pub param_id: ParamId,
    /// New value; `None` deletes the parameter.
    pub value: Option<Arc<Cell>>,
    /// Expected hash of the current value.
    pub if_hash_equal: Option<Hash>,
}

impl ProposalBody {
    /// Parses a proposal cell.
    pub fn parse(cell: &Cell) -> Result<Self, MalformedProposal> {
        let mut s = cell.parse();
        let tag = s.load_uint(8)? as u8;
        if tag != PROPOSAL_TAG {
            return Err(MalformedProposal::BadTag(tag));
        }
        let param_id = s.load_int(32)? as ParamId;
        let value = s.load_maybe_ref()?;
        let if_hash_equal = if s.load_bit()? {
            Some(s.load_hash()?)
        } else {
            None
        };
        Ok(Self {
            param_id,
            value,
            if_hash_equal,
        })
    }

    /// Builds the proposal cell.
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut b = CellBuilder::new();
        b.store_uint(u64::from(PROPOSAL_TAG), 8)?
            .store_int(i64::from(self.param_id), 32)?
            .store_maybe_ref(self.value.clone())?;
        match &self.if_hash_equal {
            Some(hash) => {
                b.store_bit(true)?.store_hash(hash)?;
            }
            None => {
                b.store_bit(false)?;
            }
        }
        Ok(b.build())
    }
}

/// Why a proposal cell could not be read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MalformedProposal {
    /// First byte is not `0xf3`.
    BadTag(u8),
    /// Cell ended early.
    Truncated(CellError),
}

impl From<CellError> for MalformedProposal {
    fn from(err: CellError) -> Self {
        Self::Truncated(err)
    }
}

// =============================================================================
// PROPOSAL
// =============================================================================

/// A pending proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proposal {
    /// Expiration timestamp (unix seconds). Stored, not enforced here.
    pub expire_at: u32,
    /// Whether the target is a critical parameter.
    pub critical: bool,
    /// Target parameter.
    pub param_id: ParamId,
    /// Proposed value; `None` deletes the parameter.
    pub value: Option<Arc<Cell>>,
    /// Hash of the parameter's value when the proposal was made.
    pub if_hash_equal: Option<Hash>,
    /// Validator indices that voted for the proposal.
    pub voters: BTreeSet<u16>,
    /// Weight still needed to pass the current round. Zero until the vote
    /// collaborator sets it.
    pub weight_remaining: i64,
}

impl Proposal {
    /// Serializes the proposal record.
    ///
    /// `expire_at:uint32 critical:Bool param_id:int32 value:(Maybe ^Cell)
    /// if_hash_equal:(Maybe uint256) voters:(Maybe ^(Hashmap 16 True))
    /// weight_remaining:int64`
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut b = CellBuilder::new();
        b.store_uint(u64::from(self.expire_at), 32)?
            .store_bit(self.critical)?
            .store_int(i64::from(self.param_id), 32)?
            .store_maybe_ref(self.value.clone())?;
        match &self.if_hash_equal {
            Some(hash) => b.store_bit(true)?.store_hash(hash)?,
            None => b.store_bit(false)?,
        };
        let voters = build_dict(
            16,
            self.voters.iter().map(|idx| (voter_key(*idx), ())).collect(),
            |_, ()| Ok(()),
        )?;
        b.store_maybe_ref(voters.map(Arc::new))?
            .store_int(self.weight_remaining, 64)?;
        Ok(b.build())
    }

    /// Reads a proposal record written by [`Proposal::to_cell`].
    pub fn from_cell(cell: &Cell) -> Result<Self, CellError> {
        let mut s = cell.parse();
        let expire_at = s.load_uint(32)? as u32;
        let critical = s.load_bit()?;
        let param_id = s.load_int(32)? as ParamId;
        let value = s.load_maybe_ref()?;
        let if_hash_equal = if s.load_bit()? {
            Some(s.load_hash()?)
        } else {
            None
        };
        let voters = match s.load_maybe_ref()? {
            Some(root) => parse_dict(&root, 16, |_| Ok(()))?
                .into_iter()
                .map(|(key, ())| key.iter().fold(0u16, |acc, bit| (acc << 1) | u16::from(*bit)))
                .collect(),
            None => BTreeSet::new(),
        };
        let weight_remaining = s.load_int(64)?;
        Ok(Self {
            expire_at,
            critical,
            param_id,
            value,
            if_hash_equal,
            voters,
            weight_remaining,
        })
    }
}

fn voter_key(idx: u16) -> DictKey {
    (0..16).rev().map(|i| (idx >> i) & 1 == 1).collect()
}

// =============================================================================
// PROPOSAL TABLE
// =============================================================================

/// Pending proposals keyed by identity hash.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProposalTable {
    proposals: BTreeMap<Hash, Proposal>,
}

impl ProposalTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Proposal with identity `hash`.
    #[must_use]
    pub fn get(&self, hash: &Hash) -> Option<&Proposal> {
        self.proposals.get(hash)
    }

    /// Mutable access for the vote collaborator.
    pub fn get_mut(&mut self, hash: &Hash) -> Option<&mut Proposal> {
        self.proposals.get_mut(hash)
    }

    /// Returns true if a proposal with identity `hash` exists.
    #[must_use]
    pub fn contains(&self, hash: &Hash) -> bool {
        self.proposals.contains_key(hash)
    }

    /// Removes a proposal (finalization or expiry, driven by collaborators).
    pub fn remove(&mut self, hash: &Hash) -> Option<Proposal> {
        self.proposals.remove(hash)
    }

    /// Number of pending proposals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Iterates proposals in hash order.
    pub fn iter(&self) -> impl Iterator<Item = (&Hash, &Proposal)> {
        self.proposals.iter()
    }

    fn insert(&mut self, hash: Hash, proposal: Proposal) {
        self.proposals.insert(hash, proposal);
    }

    /// Serializes the table as a `Hashmap 256 ^Proposal`. `None` when empty.
    pub fn to_dict_cell(&self) -> Result<Option<Cell>, CellError> {
        let entries = self
            .proposals
            .iter()
            .map(|(hash, p)| Ok((hash_key(hash), Arc::new(p.to_cell()?))))
            .collect::<Result<Vec<_>, CellError>>()?;
        build_dict(256, entries, |b, v| b.store_ref(Arc::clone(v)).map(|_| ()))
    }

    /// Rebuilds a table from a `Hashmap 256 ^Proposal` root.
    pub fn from_dict_cell(root: &Cell) -> Result<Self, CellError> {
        let proposals = parse_dict(root, 256, |s| Proposal::from_cell(&*s.load_ref()?))?
            .into_iter()
            .map(|(key, p)| (key_to_hash(&key), p))
            .collect();
        Ok(Self { proposals })
    }
}

// =============================================================================
// REJECTIONS
// =============================================================================

/// Why a `newVoting` request was refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VotingRejection {
    /// Custom slots are never reachable through voting.
    ProtectedParameter {
        /// Requested id.
        param_id: ParamId,
    },
    /// `if_hash_equal` does not match the current value.
    HashMismatch {
        /// Requested id.
        param_id: ParamId,
        /// Hash the proposer expected.
        claimed: Hash,
        /// Hash of the stored value.
        actual: Hash,
    },
    /// Critical flag disagrees with the registry.
    CriticalMismatch {
        /// Requested id.
        param_id: ParamId,
        /// Flag in the request.
        claimed: bool,
    },
    /// Same proposal is already pending.
    AlreadyExists {
        /// Identity hash.
        hash: Hash,
    },
    /// Proposal cell could not be parsed.
    MalformedProposal(MalformedProposal),
}

impl VotingRejection {
    /// Reason code carried in the rejection notification.
    #[must_use]
    pub fn reason_code(&self) -> u32 {
        match self {
            Self::HashMismatch { .. } => 1,
            Self::CriticalMismatch { .. } => 2,
            Self::AlreadyExists { .. } => 3,
            Self::MalformedProposal(_) => 4,
            Self::ProtectedParameter { .. } => 5,
        }
    }
}

impl fmt::Display for VotingRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtectedParameter { param_id } => {
                write!(f, "parameter {param_id} is not votable")
            }
            Self::HashMismatch {
                param_id,
                claimed,
                actual,
            } => write!(
                f,
                "stale hash for parameter {param_id}: claimed {claimed}, actual {actual}"
            ),
            Self::CriticalMismatch { param_id, claimed } => write!(
                f,
                "critical flag {claimed} does not match registry for parameter {param_id}"
            ),
            Self::AlreadyExists { hash } => write!(f, "proposal {hash} already exists"),
            Self::MalformedProposal(reason) => write!(f, "malformed proposal: {reason:?}"),
        }
    }
}

impl From<MalformedProposal> for VotingRejection {
    fn from(reason: MalformedProposal) -> Self {
        Self::MalformedProposal(reason)
    }
}

// =============================================================================
// CREATION
// =============================================================================

/// Decoded `newVoting` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalRequest {
    /// Expiration timestamp.
    pub expire_at: u32,
    /// Claimed criticality.
    pub critical: bool,
    /// Proposal cell; its hash is the proposal identity.
    pub proposal: Arc<Cell>,
}

/// Validates `request` against the store and records a new proposal.
///
/// Returns the identity hash. On rejection the table is untouched.
pub fn create_proposal(
    store: &ConfigStore,
    table: &mut ProposalTable,
    critical_params: &BTreeSet<ParamId>,
    request: &ProposalRequest,
) -> Result<Hash, VotingRejection> {
    let body = ProposalBody::parse(&request.proposal)?;

    if is_protected_param(body.param_id) {
        return Err(VotingRejection::ProtectedParameter {
            param_id: body.param_id,
        });
    }

    if let Some(claimed) = body.if_hash_equal {
        let actual = store.value_hash(body.param_id);
        if claimed != actual {
            return Err(VotingRejection::HashMismatch {
                param_id: body.param_id,
                claimed,
                actual,
            });
        }
    }

    if request.critical != critical_params.contains(&body.param_id) {
        return Err(VotingRejection::CriticalMismatch {
            param_id: body.param_id,
            claimed: request.critical,
        });
    }

    let hash = request.proposal.hash();
    if table.contains(&hash) {
        return Err(VotingRejection::AlreadyExists { hash });
    }

    table.insert(
        hash,
        Proposal {
            expire_at: request.expire_at,
            critical: request.critical,
            param_id: body.param_id,
            value: body.value,
            if_hash_equal: body.if_hash_equal,
            voters: BTreeSet::new(),
            weight_remaining: 0,
        },
    );
    Ok(hash)
}

/// Reads the critical parameter registry out of `store`.
///
/// The registry value is the direct root of a `Hashmap 32 True`; an unset
/// entry means no parameter is critical.
pub fn critical_params(
    store: &ConfigStore,
    registry_id: ParamId,
) -> Result<BTreeSet<ParamId>, CellError> {
    match store.get(registry_id) {
        Some(root) => parse_int_set(root),
        None => Ok(BTreeSet::new()),
    }
}

/// Builds a registry value for `ids`; an empty set yields `None`.
pub fn critical_params_cell(
    ids: impl IntoIterator<Item = ParamId>,
) -> Result<Option<Cell>, CellError> {
    build_int_set(ids)
}

// =============================================================================
// TESTS
// =============================================================================
