//! # Error Types
//!
//! All error types for the config contract core.
//!
//! Protocol rejections (wrong admin, exotic payload, stale hash, ...) are not
//! errors: they are outcome values that turn into notifications. The types
//! here cover codec failures, configuration problems and the transaction
//! aborts that make the runtime bounce the inbound message.

use crate::domain::address::AddressClass;
use crate::domain::invariants::InvariantViolation;
use thiserror::Error;

// =============================================================================
// CELL ERRORS
// =============================================================================

/// Errors raised while building or reading cells.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CellError {
    /// Builder ran out of data bits.
    #[error("cell overflow: {requested} bits requested, {available} available")]
    BitOverflow {
        /// Bits the write needed.
        requested: usize,
        /// Bits still free in the builder.
        available: usize,
    },

    /// Builder ran out of reference slots.
    #[error("cell overflow: more than 4 references")]
    RefOverflow,

    /// Slice ran out of data bits.
    #[error("cell underflow: {requested} bits requested, {available} left")]
    BitUnderflow {
        /// Bits the read needed.
        requested: usize,
        /// Bits left in the slice.
        available: usize,
    },

    /// Slice ran out of references.
    #[error("cell underflow: no references left")]
    RefUnderflow,

    /// Integer does not fit the requested width.
    #[error("value {value} does not fit in {bits} bits")]
    ValueOutOfRange {
        /// Offending value.
        value: i128,
        /// Target width.
        bits: usize,
    },

    /// Requested integer width is not supported by the loader.
    #[error("unsupported integer width: {0} bits")]
    UnsupportedWidth(usize),

    /// Exotic cell header is not one of the known types.
    #[error("unknown exotic cell type: {0}")]
    UnknownExoticType(u8),

    /// Exotic cell layout does not match its declared type.
    #[error("malformed exotic cell: {0}")]
    MalformedExotic(&'static str),

    /// Dictionary label or fork is inconsistent with the key length.
    #[error("malformed dictionary: {0}")]
    MalformedDictionary(&'static str),
}

// =============================================================================
// ADDRESS ERRORS
// =============================================================================

/// Errors from parsing textual addresses.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Raw form must be `workchain:hex`.
    #[error("invalid raw address format: {0}")]
    InvalidFormat(String),

    /// Workchain is not a valid `int8`.
    #[error("invalid workchain: {0}")]
    InvalidWorkchain(String),

    /// Account part is not 32 bytes of hex.
    #[error("invalid account hash: {0}")]
    InvalidHash(String),
}

// =============================================================================
// DECODE ERRORS
// =============================================================================

/// Errors from decoding an inbound message body.
///
/// Every variant makes the body unparseable as an instance of its declared
/// operation, so the transaction aborts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Body ended early or carried an out-of-range field.
    #[error("cell error: {0}")]
    Cell(#[from] CellError),

    /// Embedded address is not a plain standard address.
    #[error("malformed address: {0:?} where a standard address is required")]
    MalformedAddress(AddressClass),

    /// Vote payload does not carry the expected sign tag.
    #[error("invalid vote sign tag: 0x{0:08x}")]
    InvalidSignTag(u32),
}

// =============================================================================
// CONTRACT ERRORS
// =============================================================================

/// Exit code raised on cell deserialization failures.
pub const EXIT_CELL_UNDERFLOW: u32 = 9;

/// Exit code raised on queries with an unknown operation code.
pub const EXIT_UNKNOWN_OP: u32 = 0xffff;

/// Exit code raised when a transaction would break a state invariant.
pub const EXIT_INVARIANT_VIOLATION: u32 = 0xfffe;

/// Reasons for aborting a transaction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Body could not be decoded.
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// Persistent state could not be read or written.
    #[error("corrupt contract state: {0}")]
    CorruptState(CellError),

    /// Outbound message body could not be built.
    #[error("reply encoding failed: {0}")]
    ReplyEncoding(CellError),

    /// Post-transaction state check failed; the transaction was rolled back.
    #[error("invariant violated: {0:?}")]
    InvariantViolated(Vec<InvariantViolation>),
}

impl ContractError {
    /// Numeric exit code reported to the runtime.
    #[must_use]
    pub fn exit_code(&self) -> u32 {
        match self {
            Self::Decode(_) | Self::CorruptState(_) | Self::ReplyEncoding(_) => {
                EXIT_CELL_UNDERFLOW
            }
            Self::InvariantViolated(_) => EXIT_INVARIANT_VIOLATION,
        }
    }

    /// Returns true if the failure came from a malformed embedded address.
    #[must_use]
    pub fn is_malformed_address(&self) -> bool {
        matches!(self, Self::Decode(DecodeError::MalformedAddress(_)))
    }
}

// =============================================================================
// CONFIG ERRORS
// =============================================================================

/// Errors from loading contract configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable holds an unparsable address.
    #[error("invalid address in {var}: {source}")]
    InvalidAddress {
        /// Variable name.
        var: &'static str,
        /// Parse failure.
        #[source]
        source: AddressError,
    },

    /// Environment variable holds an unparsable integer.
    #[error("invalid integer in {var}: {value}")]
    InvalidInteger {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// JSON configuration could not be parsed.
    #[error("invalid json config: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// TELEMETRY ERRORS
// =============================================================================

/// Errors from installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Filter directive could not be parsed.
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    /// A global subscriber is already installed.
    #[error("tracing init failed: {0}")]
    TracerInit(String),
}

// =============================================================================
// TESTS
// =============================================================================
