//! # Access Control Gate
//!
//! Decides who may write the custom slots.
//!
//! | Sender | Decision |
//! |--------|----------|
//! | workchain != -1 | `Ignored` (silent) |
//! | admin bound to the slot | `Allowed` |
//! | any other masterchain address | `Denied` |

use crate::domain::address::StdAddress;
use crate::domain::value_objects::{ParamId, CUSTOM_SLOT_1024, CUSTOM_SLOT_1025};
use serde::{Deserialize, Serialize};

// =============================================================================
// CUSTOM SLOTS
// =============================================================================

/// One of the two admin-controlled parameter slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CustomSlot {
    /// Parameter -1024.
    Slot1024,
    /// Parameter -1025.
    Slot1025,
}

impl CustomSlot {
    /// Both slots.
    pub const ALL: [Self; 2] = [Self::Slot1024, Self::Slot1025];

    /// Parameter id of the slot.
    #[must_use]
    pub const fn param_id(self) -> ParamId {
        match self {
            Self::Slot1024 => CUSTOM_SLOT_1024,
            Self::Slot1025 => CUSTOM_SLOT_1025,
        }
    }

    /// Slot for `param_id`, if it is one.
    #[must_use]
    pub const fn from_param_id(param_id: ParamId) -> Option<Self> {
        match param_id {
            CUSTOM_SLOT_1024 => Some(Self::Slot1024),
            CUSTOM_SLOT_1025 => Some(Self::Slot1025),
            _ => None,
        }
    }
}

// =============================================================================
// ADMIN BINDING
// =============================================================================

/// Which addresses administer the custom slots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AdminBinding {
    /// Each slot has its own admin.
    Distinct {
        /// Admin of -1024.
        slot_1024: StdAddress,
        /// Admin of -1025.
        slot_1025: StdAddress,
    },
    /// One admin controls both slots.
    Shared {
        /// The admin.
        admin: StdAddress,
    },
}

impl AdminBinding {
    /// Admin bound to `slot`.
    #[must_use]
    pub fn admin_for(&self, slot: CustomSlot) -> &StdAddress {
        match (self, slot) {
            (Self::Distinct { slot_1024, .. }, CustomSlot::Slot1024) => slot_1024,
            (Self::Distinct { slot_1025, .. }, CustomSlot::Slot1025) => slot_1025,
            (Self::Shared { admin }, _) => admin,
        }
    }
}

// =============================================================================
// GATE
// =============================================================================

/// Outcome of the access check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessDecision {
    /// Sender administers the slot.
    Allowed,
    /// Masterchain sender without rights: explicit rejection.
    Denied,
    /// Sender outside the masterchain: drop silently.
    Ignored,
}

/// Checks whether `sender` may write `param_id`.
///
/// Ids that are not custom slots have no admin and are always `Denied` for
/// masterchain senders.
#[must_use]
pub fn authorize(binding: &AdminBinding, sender: &StdAddress, param_id: ParamId) -> AccessDecision {
    if !sender.is_masterchain() {
        return AccessDecision::Ignored;
    }
    match CustomSlot::from_param_id(param_id) {
        Some(slot) if binding.admin_for(slot) == sender => AccessDecision::Allowed,
        _ => AccessDecision::Denied,
    }
}

// =============================================================================
// TESTS
// =============================================================================
