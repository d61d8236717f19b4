//! # Addresses
//!
//! Message addresses as they appear in message bodies, and the
//! classification the access gate and the dispatcher rely on.
//!
//! Wire layout:
//!
//! | Form | Prefix | Fields |
//! |------|--------|--------|
//! | `addr_none` | `00` | - |
//! | `addr_extern` | `01` | `len:(## 9) bits:(len * Bit)` |
//! | `addr_std` | `10` | `anycast:(Maybe Anycast) workchain:int8 hash:bits256` |
//! | `addr_var` | `11` | `anycast:(Maybe Anycast) len:(## 9) workchain:int32 bits:(len * Bit)` |

use crate::domain::cell::{CellBuilder, CellSlice};
use crate::errors::{AddressError, CellError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workchain id of the administrative chain.
pub const MASTERCHAIN: i8 = -1;

// =============================================================================
// STANDARD ADDRESS
// =============================================================================

/// A plain standard internal address: workchain plus 256-bit account id.
///
/// Serialized in raw form, `-1:5555...5555`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StdAddress {
    /// Workchain id.
    pub workchain: i8,
    /// Account id.
    pub hash: [u8; 32],
}

impl StdAddress {
    /// Creates an address from its parts.
    #[must_use]
    pub const fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    /// Returns true if the address lives on the administrative chain.
    #[must_use]
    pub const fn is_masterchain(&self) -> bool {
        self.workchain == MASTERCHAIN
    }

    /// Same account id on another workchain.
    #[must_use]
    pub const fn with_workchain(&self, workchain: i8) -> Self {
        Self {
            workchain,
            hash: self.hash,
        }
    }

    /// Raw textual form.
    #[must_use]
    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }
}

impl FromStr for StdAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (wc, account) = s
            .split_once(':')
            .ok_or_else(|| AddressError::InvalidFormat(s.to_string()))?;
        let workchain = wc
            .parse::<i8>()
            .map_err(|_| AddressError::InvalidWorkchain(wc.to_string()))?;
        let bytes = hex::decode(account)
            .map_err(|_| AddressError::InvalidHash(account.to_string()))?;
        let hash = <[u8; 32]>::try_from(bytes.as_slice())
            .map_err(|_| AddressError::InvalidHash(account.to_string()))?;
        Ok(Self { workchain, hash })
    }
}

impl TryFrom<String> for StdAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StdAddress> for String {
    fn from(addr: StdAddress) -> Self {
        addr.to_raw()
    }
}

impl fmt::Debug for StdAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_raw())
    }
}

impl fmt::Display for StdAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.workchain)?;
        for byte in &self.hash[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...")?;
        for byte in &self.hash[28..] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

// =============================================================================
// MESSAGE ADDRESS
// =============================================================================

/// Anycast rewrite prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Anycast {
    /// Prefix length, 1 to 30.
    pub depth: u8,
    /// Prefix bits, right-aligned.
    pub rewrite_pfx: u32,
}

/// Any address form a message body may carry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MsgAddress {
    /// `addr_none`.
    None,
    /// `addr_extern`.
    External {
        /// Length in bits.
        bit_len: u16,
        /// Address bits, MSB first.
        bits: Vec<u8>,
    },
    /// `addr_std`.
    Std {
        /// Optional anycast prefix.
        anycast: Option<Anycast>,
        /// Workchain and account.
        address: StdAddress,
    },
    /// `addr_var`.
    Var {
        /// Optional anycast prefix.
        anycast: Option<Anycast>,
        /// 32-bit workchain id.
        workchain: i32,
        /// Length in bits.
        bit_len: u16,
        /// Address bits, MSB first.
        bits: Vec<u8>,
    },
}

/// Classification of a present address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressClass {
    /// Standard address on workchain -1.
    MasterchainStandard,
    /// Standard address on any other workchain.
    OtherWorkchainStandard,
    /// Standard address with an anycast prefix.
    Anycast,
    /// External address.
    External,
    /// Variable-length address.
    VariableLength,
}

impl MsgAddress {
    /// Classifies the address. `None` for `addr_none`.
    #[must_use]
    pub fn classify(&self) -> Option<AddressClass> {
        match self {
            Self::None => None,
            Self::External { .. } => Some(AddressClass::External),
            Self::Var { .. } => Some(AddressClass::VariableLength),
            Self::Std {
                anycast: Some(_), ..
            } => Some(AddressClass::Anycast),
            Self::Std {
                anycast: None,
                address,
            } => Some(if address.is_masterchain() {
                AddressClass::MasterchainStandard
            } else {
                AddressClass::OtherWorkchainStandard
            }),
        }
    }

    /// Interprets the address as an optional response destination.
    ///
    /// `addr_none` is `Ok(None)`; a plain standard address is `Ok(Some)`;
    /// every other form is an error carrying its class.
    pub fn to_response_address(&self) -> Result<Option<StdAddress>, AddressClass> {
        match self {
            Self::None => Ok(None),
            Self::Std {
                anycast: None,
                address,
            } => Ok(Some(*address)),
            other => Err(other
                .classify()
                .unwrap_or(AddressClass::External)),
        }
    }

    /// Reads an address from `slice`.
    pub fn load(slice: &mut CellSlice<'_>) -> Result<Self, CellError> {
        match slice.load_uint(2)? {
            0b00 => Ok(Self::None),
            0b01 => {
                let bit_len = slice.load_uint(9)? as u16;
                let bits = slice.load_bits(usize::from(bit_len))?;
                Ok(Self::External { bit_len, bits })
            }
            0b10 => {
                let anycast = load_anycast(slice)?;
                let workchain = slice.load_int(8)? as i8;
                let hash = *slice.load_hash()?.as_bytes();
                Ok(Self::Std {
                    anycast,
                    address: StdAddress { workchain, hash },
                })
            }
            _ => {
                let anycast = load_anycast(slice)?;
                let bit_len = slice.load_uint(9)? as u16;
                let workchain = slice.load_int(32)? as i32;
                let bits = slice.load_bits(usize::from(bit_len))?;
                Ok(Self::Var {
                    anycast,
                    workchain,
                    bit_len,
                    bits,
                })
            }
        }
    }

    /// Writes the address into `builder`.
    pub fn store(&self, builder: &mut CellBuilder) -> Result<(), CellError> {
        match self {
            Self::None => {
                builder.store_uint(0b00, 2)?;
            }
            Self::External { bit_len, bits } => {
                builder
                    .store_uint(0b01, 2)?
                    .store_uint(u64::from(*bit_len), 9)?
                    .store_bits(bits, usize::from(*bit_len))?;
            }
            Self::Std { anycast, address } => {
                builder.store_uint(0b10, 2)?;
                store_anycast(builder, anycast.as_ref())?;
                builder
                    .store_int(i64::from(address.workchain), 8)?
                    .store_bytes(&address.hash)?;
            }
            Self::Var {
                anycast,
                workchain,
                bit_len,
                bits,
            } => {
                builder.store_uint(0b11, 2)?;
                store_anycast(builder, anycast.as_ref())?;
                builder
                    .store_uint(u64::from(*bit_len), 9)?
                    .store_int(i64::from(*workchain), 32)?
                    .store_bits(bits, usize::from(*bit_len))?;
            }
        }
        Ok(())
    }
}

impl From<StdAddress> for MsgAddress {
    fn from(address: StdAddress) -> Self {
        Self::Std {
            anycast: None,
            address,
        }
    }
}

impl From<Option<StdAddress>> for MsgAddress {
    fn from(address: Option<StdAddress>) -> Self {
        address.map_or(Self::None, Self::from)
    }
}

fn load_anycast(slice: &mut CellSlice<'_>) -> Result<Option<Anycast>, CellError> {
    if !slice.load_bit()? {
        return Ok(None);
    }
    let depth = slice.load_uint(5)? as u8;
    let rewrite_pfx = slice.load_uint(usize::from(depth))? as u32;
    Ok(Some(Anycast { depth, rewrite_pfx }))
}

fn store_anycast(builder: &mut CellBuilder, anycast: Option<&Anycast>) -> Result<(), CellError> {
    match anycast {
        None => {
            builder.store_bit(false)?;
        }
        Some(a) => {
            builder
                .store_bit(true)?
                .store_uint(u64::from(a.depth), 5)?
                .store_uint(u64::from(a.rewrite_pfx), usize::from(a.depth))?;
        }
    }
    Ok(())
}

impl CellBuilder {
    /// Appends a message address.
    pub fn store_address(&mut self, address: &MsgAddress) -> Result<&mut Self, CellError> {
        address.store(self)?;
        Ok(self)
    }
}

impl CellSlice<'_> {
    /// Reads a message address.
    pub fn load_address(&mut self) -> Result<MsgAddress, CellError> {
        MsgAddress::load(self)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config_address() -> StdAddress {
        StdAddress::new(-1, [0x55; 32])
    }

    fn roundtrip(addr: &MsgAddress) -> MsgAddress {
        let mut b = CellBuilder::new();
        b.store_address(addr).unwrap();
        let cell = b.build();
        let mut s = cell.parse();
        let out = s.load_address().unwrap();
        assert_eq!(s.remaining_bits(), 0);
        out
    }

    #[test]
    fn test_raw_parse_and_display() {
        let raw = format!("-1:{}", "55".repeat(32));
        let addr: StdAddress = raw.parse().unwrap();
        assert_eq!(addr, config_address());
        assert_eq!(addr.to_raw(), raw);
        assert!(addr.is_masterchain());
        assert_eq!(format!("{addr}"), "-1:55555555...55555555");
    }

    #[test]
    fn test_raw_parse_errors() {
        assert!(matches!(
            "nonsense".parse::<StdAddress>(),
            Err(AddressError::InvalidFormat(_))
        ));
        assert!(matches!(
            format!("300:{}", "00".repeat(32)).parse::<StdAddress>(),
            Err(AddressError::InvalidWorkchain(_))
        ));
        assert!(matches!(
            "0:abcd".parse::<StdAddress>(),
            Err(AddressError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_serde_uses_raw_form() {
        let json = serde_json::to_string(&config_address()).unwrap();
        assert_eq!(json, format!("\"-1:{}\"", "55".repeat(32)));
        let back: StdAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config_address());
    }

    #[test]
    fn test_classification() {
        assert_eq!(MsgAddress::None.classify(), None);
        assert_eq!(
            MsgAddress::from(config_address()).classify(),
            Some(AddressClass::MasterchainStandard)
        );
        assert_eq!(
            MsgAddress::from(config_address().with_workchain(0)).classify(),
            Some(AddressClass::OtherWorkchainStandard)
        );
        let ext = MsgAddress::External {
            bit_len: 16,
            bits: vec![0xBE, 0xEF],
        };
        assert_eq!(ext.classify(), Some(AddressClass::External));
        let var = MsgAddress::Var {
            anycast: None,
            workchain: -1,
            bit_len: 256,
            bits: vec![0x55; 32],
        };
        assert_eq!(var.classify(), Some(AddressClass::VariableLength));
    }

    #[test]
    fn test_response_address_rules() {
        assert_eq!(MsgAddress::None.to_response_address(), Ok(None));
        assert_eq!(
            MsgAddress::from(config_address()).to_response_address(),
            Ok(Some(config_address()))
        );
        let anycast = MsgAddress::Std {
            anycast: Some(Anycast {
                depth: 3,
                rewrite_pfx: 0b101,
            }),
            address: config_address(),
        };
        assert_eq!(anycast.to_response_address(), Err(AddressClass::Anycast));
        let ext = MsgAddress::External {
            bit_len: 0,
            bits: vec![],
        };
        assert_eq!(ext.to_response_address(), Err(AddressClass::External));
    }

    #[test]
    fn test_wire_roundtrip_all_forms() {
        let forms = [
            MsgAddress::None,
            MsgAddress::from(config_address()),
            MsgAddress::Std {
                anycast: Some(Anycast {
                    depth: 5,
                    rewrite_pfx: 0b10011,
                }),
                address: config_address().with_workchain(0),
            },
            MsgAddress::External {
                bit_len: 12,
                bits: vec![0xAB, 0xC0],
            },
            MsgAddress::Var {
                anycast: None,
                workchain: 7,
                bit_len: 40,
                bits: vec![1, 2, 3, 4, 5],
            },
        ];
        for form in &forms {
            assert_eq!(&roundtrip(form), form);
        }
    }

    #[test]
    fn test_std_address_bit_length() {
        let mut b = CellBuilder::new();
        b.store_address(&MsgAddress::from(config_address())).unwrap();
        assert_eq!(b.bits_used(), 267);
    }
}
