//! # Governance Collaborators
//!
//! In-process implementations of [`GovernanceCollaborator`] for tests and
//! embedding without a real tallying engine.

use crate::domain::cell::Cell;
use crate::domain::proposal::Proposal;
use crate::messages::{NewValidatorsSetRequest, Notification, VoteRequest};
use crate::ports::outbound::GovernanceCollaborator;
use std::sync::Arc;

/// Collaborator that accepts everything and replies to nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullCollaborator;

impl GovernanceCollaborator for NullCollaborator {
    fn on_vote(
        &mut self,
        _vote: &VoteRequest,
        _proposal: Option<&mut Proposal>,
    ) -> Option<Notification> {
        None
    }

    fn on_new_validator_set(&mut self, _request: &NewValidatorsSetRequest) -> Option<Notification> {
        None
    }
}

/// Collaborator that records every request and marks voters on known
/// proposals.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCollaborator {
    votes: Vec<VoteRequest>,
    validator_sets: Vec<Arc<Cell>>,
}

impl InMemoryCollaborator {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Votes seen so far, in arrival order.
    #[must_use]
    pub fn votes(&self) -> &[VoteRequest] {
        &self.votes
    }

    /// Validator sets seen so far, in arrival order.
    #[must_use]
    pub fn validator_sets(&self) -> &[Arc<Cell>] {
        &self.validator_sets
    }
}

impl GovernanceCollaborator for InMemoryCollaborator {
    fn on_vote(
        &mut self,
        vote: &VoteRequest,
        proposal: Option<&mut Proposal>,
    ) -> Option<Notification> {
        self.votes.push(vote.clone());
        let proposal = proposal?;
        proposal.voters.insert(vote.validator_idx);
        Some(Notification::VoteProcessed)
    }

    fn on_new_validator_set(&mut self, request: &NewValidatorsSetRequest) -> Option<Notification> {
        self.validator_sets.push(Arc::clone(&request.vset));
        Some(Notification::ValidatorsSetAccepted)
    }
}
