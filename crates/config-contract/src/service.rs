//! # Config Contract Service
//!
//! The message dispatcher. Owns the contract state and runs every inbound
//! message as one atomic transaction:
//!
//! 1. bounced messages, empty bodies and non-masterchain senders are dropped;
//! 2. the body is decoded once; a decode failure (including a malformed
//!    response address) aborts and bounces;
//! 3. the request is routed to exactly one handler;
//! 4. invariants are checked against the pre-transaction state; a violation
//!    rolls back and aborts.
//!
//! Each transaction emits at most one outbound message.

use crate::adapters::InMemoryCollaborator;
use crate::config::ContractConfig;
use crate::domain::address::StdAddress;
use crate::domain::cell::Cell;
use crate::domain::custom_slot::{apply_custom_slot, SlotOutcome, SlotRejection};
use crate::domain::invariants::{check_all_invariants, InvariantCheckResult, Transition};
use crate::domain::proposal::{
    create_proposal, critical_params, Proposal, ProposalBody, ProposalRequest, VotingRejection,
};
use crate::domain::state::ContractState;
use crate::domain::store::ConfigStore;
use crate::domain::value_objects::{is_protected_param, Hash, ParamId};
use crate::errors::ContractError;
use crate::messages::{
    bounce_body, decode_body, is_response_op, NewValidatorsSetRequest, Notification, Request,
    SetCustomSlotRequest, VoteRequest,
};
use crate::ports::inbound::{
    ConfigContractApi, Effect, IgnoreReason, InboundMessage, OutboundMessage, TransactionOutcome,
};
use crate::ports::outbound::GovernanceCollaborator;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Statistics for the config contract service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Messages handed to `process`.
    pub messages_processed: u64,
    /// Transactions that changed state.
    pub committed: u64,
    /// Requests refused with a notification.
    pub rejected: u64,
    /// Messages dropped silently.
    pub ignored: u64,
    /// Transactions aborted and rolled back.
    pub aborted: u64,
    /// Queries with unknown operation codes.
    pub unsupported: u64,
}

/// Handler result before invariant checking.
struct Step {
    effect: Effect,
    transition: Transition,
    notification: Option<OutboundMessage>,
}

enum Routed {
    Step(Step),
    Ignored(IgnoreReason),
    Unsupported(u32),
}

/// The config contract.
pub struct ConfigContractService<C: GovernanceCollaborator> {
    /// Static configuration.
    config: ContractConfig,
    /// Persistent state.
    state: ContractState,
    /// Vote and validator set handling.
    collaborator: C,
    /// Service statistics.
    stats: ServiceStats,
}

impl<C: GovernanceCollaborator> ConfigContractService<C> {
    /// Create a service over existing state.
    pub fn new(config: ContractConfig, state: ContractState, collaborator: C) -> Self {
        info!(
            config_address = %config.config_address,
            params = state.config.len(),
            proposals = state.proposals.len(),
            "Config contract service created"
        );
        Self {
            config,
            state,
            collaborator,
            stats: ServiceStats::default(),
        }
    }

    /// Create a service with an empty parameter store.
    pub fn with_config(config: ContractConfig, collaborator: C) -> Self {
        Self::new(config, ContractState::default(), collaborator)
    }

    /// Static configuration.
    #[must_use]
    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &ContractState {
        &self.state
    }

    /// The governance collaborator.
    #[must_use]
    pub fn collaborator(&self) -> &C {
        &self.collaborator
    }

    /// Get current service statistics.
    #[must_use]
    pub fn stats(&self) -> ServiceStats {
        self.stats.clone()
    }

    /// Processes one inbound message as an atomic transaction.
    #[instrument(skip(self, message), fields(sender = %message.sender, value = message.value))]
    pub fn process(&mut self, message: InboundMessage) -> TransactionOutcome {
        let outcome = self.execute(&message);

        self.stats.messages_processed += 1;
        match &outcome {
            TransactionOutcome::Ignored(_) => self.stats.ignored += 1,
            TransactionOutcome::Executed { effect, .. } if effect.is_rejection() => {
                self.stats.rejected += 1;
            }
            TransactionOutcome::Executed { .. } => self.stats.committed += 1,
            TransactionOutcome::Aborted { .. } => self.stats.aborted += 1,
            TransactionOutcome::Unsupported { .. } => self.stats.unsupported += 1,
        }
        outcome
    }

    fn execute(&mut self, message: &InboundMessage) -> TransactionOutcome {
        if message.bounced {
            debug!("Ignoring bounced message");
            return TransactionOutcome::Ignored(IgnoreReason::Bounced);
        }
        if !message.sender.is_masterchain() {
            debug!(
                workchain = message.sender.workchain,
                "Ignoring message from outside the masterchain"
            );
            return TransactionOutcome::Ignored(IgnoreReason::NotMasterchain);
        }

        let decoded = match decode_body(&message.body) {
            Ok(Some(decoded)) => decoded,
            Ok(None) => {
                debug!("Ignoring empty body");
                return TransactionOutcome::Ignored(IgnoreReason::EmptyBody);
            }
            Err(e) => return self.abort(message, ContractError::from(e)),
        };

        let before = self.state.clone();
        let sender = message.sender;
        let query_id = decoded.query_id;
        let routed = match decoded.request {
            Request::SetCustomSlot(req) => self.handle_set_custom_slot(message, query_id, req),
            Request::NewVoting(req) => self.handle_new_voting(message, query_id, &req),
            Request::Vote(vote) => self.handle_vote(message, query_id, &vote),
            Request::NewValidatorsSet(req) => self.handle_new_vset(message, query_id, &req),
            Request::Unknown if is_response_op(decoded.op) => {
                debug!(op = format_args!("0x{:08x}", decoded.op), "Ignoring unknown response");
                Ok(Routed::Ignored(IgnoreReason::Response { op: decoded.op }))
            }
            Request::Unknown => {
                warn!(
                    op = format_args!("0x{:08x}", decoded.op),
                    %sender,
                    "Unsupported operation"
                );
                Ok(Routed::Unsupported(decoded.op))
            }
        };

        let step = match routed {
            Ok(Routed::Step(step)) => step,
            Ok(Routed::Ignored(reason)) => return TransactionOutcome::Ignored(reason),
            Ok(Routed::Unsupported(op)) => return TransactionOutcome::Unsupported { op },
            Err(e) => {
                self.state = before;
                return self.abort(message, e);
            }
        };

        if let InvariantCheckResult::Invalid(violations) =
            check_all_invariants(&before, &self.state, step.transition)
        {
            error!(?violations, "Invariant violated, rolling back transaction");
            self.state = before;
            return self.abort(message, ContractError::InvariantViolated(violations));
        }

        TransactionOutcome::Executed {
            effect: step.effect,
            notification: step.notification,
        }
    }

    // =========================================================================
    // HANDLERS
    // =========================================================================

    fn handle_set_custom_slot(
        &mut self,
        message: &InboundMessage,
        query_id: u64,
        req: SetCustomSlotRequest,
    ) -> Result<Routed, ContractError> {
        let outcome = apply_custom_slot(
            &mut self.state.config,
            &self.config.admins,
            &message.sender,
            req.param_id,
            &req.value,
        );

        let (effect, transition, kind) = match outcome {
            SlotOutcome::Accepted { slot, previous } => {
                info!(
                    param_id = req.param_id,
                    value_hash = %req.value.hash(),
                    replaced = previous.is_some(),
                    "Custom slot updated"
                );
                (
                    Effect::SlotWritten { slot },
                    Transition::SlotWritten(slot),
                    Notification::CustomSlotAccepted,
                )
            }
            SlotOutcome::Rejected(reason) => {
                match reason {
                    SlotRejection::AccessDenied { .. } => {
                        warn!(param_id = req.param_id, %reason, "Custom slot write denied");
                    }
                    SlotRejection::NotCustomSlot { .. } | SlotRejection::InvalidPayload(_) => {
                        debug!(param_id = req.param_id, %reason, "Custom slot write rejected");
                    }
                }
                (
                    Effect::SlotRejected(reason),
                    Transition::Unchanged,
                    Notification::CustomSlotRejected,
                )
            }
            SlotOutcome::Ignored => {
                return Ok(Routed::Ignored(IgnoreReason::NotMasterchain));
            }
        };

        let notification = match req.response {
            Some(destination) => Some(notify(destination, message.value, kind, query_id)?),
            None => None,
        };
        Ok(Routed::Step(Step {
            effect,
            transition,
            notification,
        }))
    }

    fn handle_new_voting(
        &mut self,
        message: &InboundMessage,
        query_id: u64,
        req: &ProposalRequest,
    ) -> Result<Routed, ContractError> {
        // Custom slot proposals are refused before the registry is read.
        let critical = match ProposalBody::parse(&req.proposal) {
            Ok(body) if !is_protected_param(body.param_id) => {
                critical_params(&self.state.config, self.config.critical_params_id)
                    .map_err(ContractError::CorruptState)?
            }
            _ => BTreeSet::new(),
        };

        let (effect, transition, kind) =
            match create_proposal(&self.state.config, &mut self.state.proposals, &critical, req) {
                Ok(hash) => {
                    info!(
                        proposal = %hash,
                        expire_at = req.expire_at,
                        critical = req.critical,
                        "Proposal created"
                    );
                    (
                        Effect::ProposalCreated { hash },
                        Transition::ProposalCreated(hash),
                        Notification::NewVotingCreated,
                    )
                }
                Err(rejection) => {
                    let kind = match &rejection {
                        VotingRejection::ProtectedParameter { .. } => {
                            warn!(%rejection, "Proposal for custom slot rejected");
                            Notification::CustomSlotVotingRejected
                        }
                        VotingRejection::MalformedProposal(_) => {
                            warn!(%rejection, "Proposal rejected");
                            Notification::NewVotingRejected {
                                reason: rejection.reason_code(),
                            }
                        }
                        _ => {
                            debug!(%rejection, "Proposal rejected");
                            Notification::NewVotingRejected {
                                reason: rejection.reason_code(),
                            }
                        }
                    };
                    (
                        Effect::VotingRejected(rejection),
                        Transition::Unchanged,
                        kind,
                    )
                }
            };

        Ok(Routed::Step(Step {
            effect,
            transition,
            notification: Some(notify(message.sender, message.value, kind, query_id)?),
        }))
    }

    fn handle_vote(
        &mut self,
        message: &InboundMessage,
        query_id: u64,
        vote: &VoteRequest,
    ) -> Result<Routed, ContractError> {
        let proposal_hash = vote.proposal_hash;
        let proposal = self.state.proposals.get_mut(&proposal_hash);
        let known = proposal.is_some();
        let reply = self.collaborator.on_vote(vote, proposal);
        debug!(
            proposal = %proposal_hash,
            validator = vote.validator_idx,
            known,
            "Vote forwarded"
        );

        Ok(Routed::Step(Step {
            effect: Effect::VoteForwarded {
                proposal_hash,
                known,
            },
            transition: if known {
                Transition::ProposalVoted(proposal_hash)
            } else {
                Transition::Unchanged
            },
            notification: match reply {
                Some(kind) => Some(notify(message.sender, message.value, kind, query_id)?),
                None => None,
            },
        }))
    }

    fn handle_new_vset(
        &mut self,
        message: &InboundMessage,
        query_id: u64,
        req: &NewValidatorsSetRequest,
    ) -> Result<Routed, ContractError> {
        let reply = self.collaborator.on_new_validator_set(req);
        debug!(vset = %req.vset.hash(), "Validator set forwarded");

        Ok(Routed::Step(Step {
            effect: Effect::ValidatorSetForwarded,
            transition: Transition::Unchanged,
            notification: match reply {
                Some(kind) => Some(notify(message.sender, message.value, kind, query_id)?),
                None => None,
            },
        }))
    }

    fn abort(&self, message: &InboundMessage, error: ContractError) -> TransactionOutcome {
        warn!(
            exit_code = error.exit_code(),
            error = %error,
            "Transaction aborted"
        );
        let bounce = if message.bounce {
            match bounce_body(&message.body) {
                Ok(body) => Some(OutboundMessage {
                    destination: message.sender,
                    value: message.value,
                    bounced: true,
                    body: Arc::new(body),
                }),
                Err(e) => {
                    error!(error = %e, "Failed to build bounce body");
                    None
                }
            }
        } else {
            None
        };
        TransactionOutcome::Aborted { error, bounce }
    }
}

fn notify(
    destination: StdAddress,
    value: u128,
    kind: Notification,
    query_id: u64,
) -> Result<OutboundMessage, ContractError> {
    let body = kind.encode(query_id).map_err(ContractError::ReplyEncoding)?;
    Ok(OutboundMessage {
        destination,
        value,
        bounced: false,
        body: Arc::new(body),
    })
}

/// Create a service with the default admin binding and an in-memory
/// collaborator (for testing).
#[must_use]
pub fn create_test_service() -> ConfigContractService<InMemoryCollaborator> {
    ConfigContractService::with_config(ContractConfig::default(), InMemoryCollaborator::new())
}

// =============================================================================
// ConfigContractApi Implementation
// =============================================================================

impl<C: GovernanceCollaborator> ConfigContractApi for ConfigContractService<C> {
    fn process(&mut self, message: InboundMessage) -> TransactionOutcome {
        Self::process(self, message)
    }

    fn get_param(&self, param_id: ParamId) -> Option<Arc<Cell>> {
        self.state.config.get(param_id).cloned()
    }

    fn get_proposal(&self, hash: &Hash) -> Option<Proposal> {
        self.state.proposals.get(hash).cloned()
    }

    fn config_snapshot(&self) -> ConfigStore {
        self.state.config.clone()
    }

    fn data_hash(&self) -> Result<Hash, ContractError> {
        self.state.data_hash().map_err(ContractError::CorruptState)
    }
}

// =============================================================================
// TESTS
// =============================================================================
