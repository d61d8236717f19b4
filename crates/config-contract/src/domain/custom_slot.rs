//! # Custom Slot Handler
//!
//! Direct, vote-free writes to parameters -1024 and -1025.
//!
//! Decision order:
//!
//! 1. sender outside the masterchain: `Ignored`, nothing changes;
//! 2. target is not a custom slot: rejected;
//! 3. sender is not the slot's admin: rejected;
//! 4. value is exotic or spans several cells: rejected;
//! 5. otherwise the value overwrites the slot.
//!
//! Rejections never touch the store.

use crate::domain::access::{authorize, AccessDecision, AdminBinding, CustomSlot};
use crate::domain::address::StdAddress;
use crate::domain::cell::Cell;
use crate::domain::store::ConfigStore;
use crate::domain::validator::{validate_payload, PayloadRejection};
use crate::domain::value_objects::ParamId;
use std::fmt;
use std::sync::Arc;

/// Why a custom slot write was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotRejection {
    /// Target id is not -1024 or -1025.
    NotCustomSlot {
        /// Requested id.
        param_id: ParamId,
    },
    /// Sender is not the admin of the slot.
    AccessDenied {
        /// Requested slot.
        slot: CustomSlot,
    },
    /// Value failed the shape check.
    InvalidPayload(PayloadRejection),
}

impl fmt::Display for SlotRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCustomSlot { param_id } => {
                write!(f, "parameter {param_id} is not a custom slot")
            }
            Self::AccessDenied { slot } => {
                write!(f, "sender is not the admin of {}", slot.param_id())
            }
            Self::InvalidPayload(reason) => write!(f, "invalid payload: {reason}"),
        }
    }
}

/// Result of a custom slot write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotOutcome {
    /// Value stored.
    Accepted {
        /// Slot written.
        slot: CustomSlot,
        /// Value it replaced.
        previous: Option<Arc<Cell>>,
    },
    /// Refused; store unchanged.
    Rejected(SlotRejection),
    /// Dropped without reply; store unchanged.
    Ignored,
}

/// Applies a `setCustomSlot` request from `sender` to `store`.
pub fn apply_custom_slot(
    store: &mut ConfigStore,
    binding: &AdminBinding,
    sender: &StdAddress,
    param_id: ParamId,
    value: &Arc<Cell>,
) -> SlotOutcome {
    if !sender.is_masterchain() {
        return SlotOutcome::Ignored;
    }
    let Some(slot) = CustomSlot::from_param_id(param_id) else {
        return SlotOutcome::Rejected(SlotRejection::NotCustomSlot { param_id });
    };
    match authorize(binding, sender, param_id) {
        AccessDecision::Allowed => {}
        AccessDecision::Denied => {
            return SlotOutcome::Rejected(SlotRejection::AccessDenied { slot });
        }
        AccessDecision::Ignored => return SlotOutcome::Ignored,
    }
    if let Err(reason) = validate_payload(value) {
        return SlotOutcome::Rejected(SlotRejection::InvalidPayload(reason));
    }
    let previous = store.set(param_id, Arc::clone(value));
    SlotOutcome::Accepted { slot, previous }
}
