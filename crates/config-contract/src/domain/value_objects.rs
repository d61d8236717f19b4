//! # Value Objects
//!
//! Small immutable primitives shared by the domain modules.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

// =============================================================================
// PARAMETER IDS
// =============================================================================

/// Signed 32-bit configuration parameter id.
pub type ParamId = i32;

/// First admin-controlled custom slot.
pub const CUSTOM_SLOT_1024: ParamId = -1024;

/// Second admin-controlled custom slot.
pub const CUSTOM_SLOT_1025: ParamId = -1025;

/// Config entry holding the critical parameter registry.
pub const CRITICAL_PARAMS_ID: ParamId = 10;

/// Returns true for the two ids that only the custom slot path may write.
#[must_use]
pub const fn is_protected_param(param_id: ParamId) -> bool {
    param_id == CUSTOM_SLOT_1024 || param_id == CUSTOM_SLOT_1025
}

// =============================================================================
// HASH (32 bytes)
// =============================================================================

/// A 32-byte SHA-256 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// The zero hash, also the "parameter not set" sentinel.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Creates a hash from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Creates a hash from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(slice).ok().map(Self)
    }

    /// SHA-256 of `data`.
    #[must_use]
    pub fn digest(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns true if this is the zero hash.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Lowercase hex without prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...")?;
        for byte in &self.0[28..] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for [u8; 32] {
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_params() {
        assert!(is_protected_param(-1024));
        assert!(is_protected_param(-1025));
        assert!(!is_protected_param(-1023));
        assert!(!is_protected_param(-94));
        assert!(!is_protected_param(0));
    }

    #[test]
    fn test_hash_display() {
        let hash = Hash::new([0xAB; 32]);
        assert_eq!(format!("{hash}"), "0xabababab...abababab");
        assert_eq!(format!("{hash:?}").len(), 66);
    }

    #[test]
    fn test_hash_from_slice() {
        assert!(Hash::from_slice(&[0u8; 31]).is_none());
        assert_eq!(Hash::from_slice(&[0u8; 32]), Some(Hash::ZERO));
        assert!(Hash::ZERO.is_zero());
    }

    #[test]
    fn test_digest_known_vector() {
        assert_eq!(
            Hash::digest(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
