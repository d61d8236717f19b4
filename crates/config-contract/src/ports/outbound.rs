//! # Driven Ports (SPI - Outbound)
//!
//! Vote tallying and validator set adoption live outside the contract core.
//! The service hands decoded requests to a [`GovernanceCollaborator`] and
//! forwards whatever reply it produces.

use crate::domain::proposal::Proposal;
use crate::messages::{NewValidatorsSetRequest, Notification, VoteRequest};

/// Handles the governance operations the core only routes.
pub trait GovernanceCollaborator: Send {
    /// Processes a vote.
    ///
    /// `proposal` is the targeted proposal when it exists. The collaborator
    /// may update its vote bookkeeping; other fields must stay as they are.
    fn on_vote(
        &mut self,
        vote: &VoteRequest,
        proposal: Option<&mut Proposal>,
    ) -> Option<Notification>;

    /// Processes a validator set submission.
    fn on_new_validator_set(&mut self, request: &NewValidatorsSetRequest) -> Option<Notification>;
}

impl<T: GovernanceCollaborator + ?Sized> GovernanceCollaborator for Box<T> {
    fn on_vote(
        &mut self,
        vote: &VoteRequest,
        proposal: Option<&mut Proposal>,
    ) -> Option<Notification> {
        (**self).on_vote(vote, proposal)
    }

    fn on_new_validator_set(&mut self, request: &NewValidatorsSetRequest) -> Option<Notification> {
        (**self).on_new_validator_set(request)
    }
}
