//! # Payload Validator
//!
//! Shape check for values written through the custom slot path: a single
//! flat ordinary cell. Content is opaque.

use crate::domain::cell::{Cell, CellType};
use std::fmt;

/// Why a payload was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadRejection {
    /// Library, Merkle proof, Merkle update or pruned branch.
    ExoticCell(CellType),
    /// Value continues into child cells.
    HasReferences {
        /// Number of child references found.
        refs: usize,
    },
}

impl fmt::Display for PayloadRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExoticCell(ty) => write!(f, "exotic cell ({ty:?})"),
            Self::HasReferences { refs } => write!(f, "value spans {} cells", refs + 1),
        }
    }
}

/// Structural class of a value cell.
#[must_use]
pub fn classify_payload(cell: &Cell) -> CellType {
    cell.cell_type()
}

/// Accepts only ordinary cells without child references.
pub fn validate_payload(cell: &Cell) -> Result<(), PayloadRejection> {
    match classify_payload(cell) {
        CellType::Ordinary => {}
        exotic => return Err(PayloadRejection::ExoticCell(exotic)),
    }
    if !cell.refs().is_empty() {
        return Err(PayloadRejection::HasReferences {
            refs: cell.refs().len(),
        });
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
