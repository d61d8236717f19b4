//! # Cells
//!
//! Minimal model of the ledger's serialization unit: an immutable node of up
//! to 1023 data bits and up to 4 child references, either ordinary or exotic.
//!
//! Only what the governance core needs is modelled: building, reading,
//! exotic headers and the representation hash. Hashes are computed at level
//! 0 for every cell type, so Merkle cells hash consistently but not
//! identically to a full level-aware codec.

use crate::domain::value_objects::Hash;
use crate::errors::CellError;
use std::fmt;
use std::sync::Arc;

/// Maximum number of data bits in one cell.
pub const MAX_DATA_BITS: usize = 1023;

/// Maximum number of child references in one cell.
pub const MAX_REFS: usize = 4;

// =============================================================================
// CELL TYPE
// =============================================================================

/// Structural type of a cell.
///
/// Exotic cells carry their type in the first data byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellType {
    /// Plain data cell.
    Ordinary,
    /// Pruned branch (type 1).
    PrunedBranch,
    /// Library reference (type 2).
    Library,
    /// Merkle proof (type 3).
    MerkleProof,
    /// Merkle update (type 4).
    MerkleUpdate,
}

impl CellType {
    /// Maps an exotic type byte to its cell type.
    pub fn from_exotic_tag(tag: u8) -> Result<Self, CellError> {
        match tag {
            1 => Ok(Self::PrunedBranch),
            2 => Ok(Self::Library),
            3 => Ok(Self::MerkleProof),
            4 => Ok(Self::MerkleUpdate),
            other => Err(CellError::UnknownExoticType(other)),
        }
    }

    /// Type byte for exotic cells, `None` for ordinary ones.
    #[must_use]
    pub const fn exotic_tag(self) -> Option<u8> {
        match self {
            Self::Ordinary => None,
            Self::PrunedBranch => Some(1),
            Self::Library => Some(2),
            Self::MerkleProof => Some(3),
            Self::MerkleUpdate => Some(4),
        }
    }

    /// Returns true for every non-ordinary type.
    #[must_use]
    pub const fn is_exotic(self) -> bool {
        !matches!(self, Self::Ordinary)
    }
}

// =============================================================================
// CELL
// =============================================================================

/// An immutable cell. Equality is representation-hash equality.
#[derive(Clone)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
    cell_type: CellType,
    depth: u16,
    hash: Hash,
}

impl Cell {
    /// The empty ordinary cell.
    #[must_use]
    pub fn empty() -> Self {
        CellBuilder::new().build()
    }

    /// Library cell referencing the cell with `hash`.
    #[must_use]
    pub fn library(hash: Hash) -> Self {
        let mut data = vec![2u8];
        data.extend_from_slice(hash.as_bytes());
        Self::finalize(data, 8 + 256, Vec::new(), CellType::Library)
    }

    /// Merkle proof over `inner`.
    #[must_use]
    pub fn merkle_proof(inner: Arc<Cell>) -> Self {
        let mut data = vec![3u8];
        data.extend_from_slice(inner.hash().as_bytes());
        data.extend_from_slice(&inner.depth().to_be_bytes());
        Self::finalize(data, 8 + 256 + 16, vec![inner], CellType::MerkleProof)
    }

    /// Merkle update from `old` to `new`.
    #[must_use]
    pub fn merkle_update(old: Arc<Cell>, new: Arc<Cell>) -> Self {
        let mut data = vec![4u8];
        data.extend_from_slice(old.hash().as_bytes());
        data.extend_from_slice(new.hash().as_bytes());
        data.extend_from_slice(&old.depth().to_be_bytes());
        data.extend_from_slice(&new.depth().to_be_bytes());
        Self::finalize(
            data,
            8 + 512 + 32,
            vec![old, new],
            CellType::MerkleUpdate,
        )
    }

    fn finalize(data: Vec<u8>, bit_len: usize, refs: Vec<Arc<Cell>>, cell_type: CellType) -> Self {
        let depth = refs
            .iter()
            .map(|r| r.depth.saturating_add(1))
            .max()
            .unwrap_or(0);
        let hash = representation_hash(&data, bit_len, &refs, cell_type);
        Self {
            data,
            bit_len,
            refs,
            cell_type,
            depth,
            hash,
        }
    }

    /// Structural type.
    #[must_use]
    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    /// Returns true for library, proof, update and pruned cells.
    #[must_use]
    pub fn is_exotic(&self) -> bool {
        self.cell_type.is_exotic()
    }

    /// Number of data bits.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Data bytes; the last byte is zero-padded.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Child references.
    #[must_use]
    pub fn refs(&self) -> &[Arc<Cell>] {
        &self.refs
    }

    /// Child reference at `index`.
    #[must_use]
    pub fn reference(&self, index: usize) -> Option<&Arc<Cell>> {
        self.refs.get(index)
    }

    /// Representation hash.
    #[must_use]
    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// Longest path to a leaf.
    #[must_use]
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Starts reading this cell from the first bit.
    #[must_use]
    pub fn parse(&self) -> CellSlice<'_> {
        CellSlice {
            cell: self,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    fn bit_at(&self, index: usize) -> bool {
        self.data[index / 8] & (0x80 >> (index % 8)) != 0
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Cell {}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("type", &self.cell_type)
            .field("bits", &self.bit_len)
            .field("refs", &self.refs.len())
            .field("hash", &self.hash)
            .finish()
    }
}

fn representation_hash(
    data: &[u8],
    bit_len: usize,
    refs: &[Arc<Cell>],
    cell_type: CellType,
) -> Hash {
    let exotic_flag = if cell_type.is_exotic() { 8 } else { 0 };
    // refs.len() <= 4 and bit_len <= 1023 keep both descriptors in one byte
    let d1 = refs.len() as u8 + exotic_flag;
    let d2 = (bit_len / 8 + bit_len.div_ceil(8)) as u8;

    let mut repr = Vec::with_capacity(2 + data.len() + refs.len() * 34);
    repr.push(d1);
    repr.push(d2);

    let full = bit_len / 8;
    repr.extend_from_slice(&data[..full]);
    let rem = bit_len % 8;
    if rem != 0 {
        let last = (data[full] & (0xFFu8 << (8 - rem))) | (0x80 >> rem);
        repr.push(last);
    }

    for r in refs {
        repr.extend_from_slice(&r.depth.to_be_bytes());
    }
    for r in refs {
        repr.extend_from_slice(r.hash.as_bytes());
    }

    Hash::digest(&repr)
}

impl From<CellBuilder> for Cell {
    fn from(builder: CellBuilder) -> Self {
        builder.build()
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Incremental writer for ordinary cells.
#[derive(Clone, Debug, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
}

impl CellBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bits written so far.
    #[must_use]
    pub fn bits_used(&self) -> usize {
        self.bit_len
    }

    /// Bits still available.
    #[must_use]
    pub fn remaining_bits(&self) -> usize {
        MAX_DATA_BITS - self.bit_len
    }

    /// Reference slots still available.
    #[must_use]
    pub fn remaining_refs(&self) -> usize {
        MAX_REFS - self.refs.len()
    }

    fn ensure_bits(&self, requested: usize) -> Result<(), CellError> {
        if requested > self.remaining_bits() {
            return Err(CellError::BitOverflow {
                requested,
                available: self.remaining_bits(),
            });
        }
        Ok(())
    }

    fn push_bit(&mut self, bit: bool) {
        let byte = self.bit_len / 8;
        if byte == self.data.len() {
            self.data.push(0);
        }
        if bit {
            self.data[byte] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
    }

    /// Appends one bit.
    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self, CellError> {
        self.ensure_bits(1)?;
        self.push_bit(bit);
        Ok(self)
    }

    /// Appends an unsigned integer of `bits` width (at most 64).
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self, CellError> {
        if bits > 64 {
            return Err(CellError::UnsupportedWidth(bits));
        }
        if bits < 64 && value >> bits != 0 {
            return Err(CellError::ValueOutOfRange {
                value: i128::from(value),
                bits,
            });
        }
        self.ensure_bits(bits)?;
        for i in (0..bits).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
        Ok(self)
    }

    /// Appends a two's complement integer of `bits` width (1 to 64).
    pub fn store_int(&mut self, value: i64, bits: usize) -> Result<&mut Self, CellError> {
        if bits == 0 || bits > 64 {
            return Err(CellError::UnsupportedWidth(bits));
        }
        if bits < 64 {
            let min = -(1i64 << (bits - 1));
            let max = (1i64 << (bits - 1)) - 1;
            if value < min || value > max {
                return Err(CellError::ValueOutOfRange {
                    value: i128::from(value),
                    bits,
                });
            }
        }
        let mask = if bits == 64 {
            u64::MAX
        } else {
            (1u64 << bits) - 1
        };
        self.store_uint((value as u64) & mask, bits)
    }

    /// Appends whole bytes.
    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, CellError> {
        self.store_bits(bytes, bytes.len() * 8)
    }

    /// Appends the first `bit_len` bits of `bits` (MSB first).
    pub fn store_bits(&mut self, bits: &[u8], bit_len: usize) -> Result<&mut Self, CellError> {
        if bit_len > bits.len() * 8 {
            return Err(CellError::BitUnderflow {
                requested: bit_len,
                available: bits.len() * 8,
            });
        }
        self.ensure_bits(bit_len)?;
        for i in 0..bit_len {
            self.push_bit(bits[i / 8] & (0x80 >> (i % 8)) != 0);
        }
        Ok(self)
    }

    /// Appends a 256-bit hash.
    pub fn store_hash(&mut self, hash: &Hash) -> Result<&mut Self, CellError> {
        self.store_bytes(hash.as_bytes())
    }

    /// Appends a child reference.
    pub fn store_ref(&mut self, cell: impl Into<Arc<Cell>>) -> Result<&mut Self, CellError> {
        if self.refs.len() == MAX_REFS {
            return Err(CellError::RefOverflow);
        }
        self.refs.push(cell.into());
        Ok(self)
    }

    /// Appends `Maybe ^Cell`: a presence bit and, if present, the reference.
    pub fn store_maybe_ref(&mut self, cell: Option<Arc<Cell>>) -> Result<&mut Self, CellError> {
        match cell {
            Some(cell) => {
                if self.refs.len() == MAX_REFS {
                    return Err(CellError::RefOverflow);
                }
                self.store_bit(true)?;
                self.store_ref(cell)
            }
            None => self.store_bit(false),
        }
    }

    /// Appends the unread remainder of `slice` (bits and references).
    pub fn store_slice(&mut self, slice: &CellSlice<'_>) -> Result<&mut Self, CellError> {
        let mut slice = slice.clone();
        let bits = slice.remaining_bits();
        if slice.remaining_refs() > self.remaining_refs() {
            return Err(CellError::RefOverflow);
        }
        self.ensure_bits(bits)?;
        let data = slice.load_bits(bits)?;
        self.store_bits(&data, bits)?;
        while slice.remaining_refs() > 0 {
            self.store_ref(slice.load_ref()?)?;
        }
        Ok(self)
    }

    /// Appends a string inline, continuing into a chain of child cells when
    /// it does not fit.
    pub fn store_string_tail(&mut self, s: &str) -> Result<&mut Self, CellError> {
        self.store_bytes_tail(s.as_bytes())
    }

    /// Stores a string in a child cell instead of inline.
    pub fn store_string_ref_tail(&mut self, s: &str) -> Result<&mut Self, CellError> {
        let mut inner = CellBuilder::new();
        inner.store_string_tail(s)?;
        self.store_ref(inner.build())
    }

    fn store_bytes_tail(&mut self, bytes: &[u8]) -> Result<&mut Self, CellError> {
        let fit = self.remaining_bits() / 8;
        if bytes.len() <= fit {
            return self.store_bytes(bytes);
        }
        let (head, tail) = bytes.split_at(fit);
        self.store_bytes(head)?;
        let mut next = CellBuilder::new();
        next.store_bytes_tail(tail)?;
        self.store_ref(next.build())
    }

    /// Finishes an ordinary cell.
    #[must_use]
    pub fn build(self) -> Cell {
        Cell::finalize(self.data, self.bit_len, self.refs, CellType::Ordinary)
    }

    /// Finishes an exotic cell, checking the header against the declared type.
    pub fn build_exotic(self) -> Result<Cell, CellError> {
        if self.bit_len < 8 {
            return Err(CellError::MalformedExotic("missing type byte"));
        }
        let cell_type = CellType::from_exotic_tag(self.data[0])?;
        let (bits_ok, refs_ok) = match cell_type {
            CellType::PrunedBranch => (self.bit_len >= 16, self.refs.is_empty()),
            CellType::Library => (self.bit_len == 8 + 256, self.refs.is_empty()),
            CellType::MerkleProof => (self.bit_len == 8 + 256 + 16, self.refs.len() == 1),
            CellType::MerkleUpdate => (self.bit_len == 8 + 512 + 32, self.refs.len() == 2),
            CellType::Ordinary => (false, false),
        };
        if !bits_ok {
            return Err(CellError::MalformedExotic("unexpected data length"));
        }
        if !refs_ok {
            return Err(CellError::MalformedExotic("unexpected reference count"));
        }

        match cell_type {
            CellType::MerkleProof => {
                if self.data[1..33] != self.refs[0].hash().as_bytes()[..] {
                    return Err(CellError::MalformedExotic("proof hash mismatch"));
                }
            }
            CellType::MerkleUpdate => {
                if self.data[1..33] != self.refs[0].hash().as_bytes()[..]
                    || self.data[33..65] != self.refs[1].hash().as_bytes()[..]
                {
                    return Err(CellError::MalformedExotic("update hash mismatch"));
                }
            }
            _ => {}
        }

        Ok(Cell::finalize(self.data, self.bit_len, self.refs, cell_type))
    }
}

// =============================================================================
// SLICE
// =============================================================================

/// Read cursor over a cell.
#[derive(Clone, Debug)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    bit_pos: usize,
    ref_pos: usize,
}

impl<'a> CellSlice<'a> {
    /// Unread data bits.
    #[must_use]
    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len - self.bit_pos
    }

    /// Unread references.
    #[must_use]
    pub fn remaining_refs(&self) -> usize {
        self.cell.refs.len() - self.ref_pos
    }

    /// Returns true when no bits and no references are left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining_bits() == 0 && self.remaining_refs() == 0
    }

    fn ensure_bits(&self, requested: usize) -> Result<(), CellError> {
        if requested > self.remaining_bits() {
            return Err(CellError::BitUnderflow {
                requested,
                available: self.remaining_bits(),
            });
        }
        Ok(())
    }

    /// Reads one bit.
    pub fn load_bit(&mut self) -> Result<bool, CellError> {
        self.ensure_bits(1)?;
        let bit = self.cell.bit_at(self.bit_pos);
        self.bit_pos += 1;
        Ok(bit)
    }

    /// Reads an unsigned integer of `bits` width (at most 64).
    pub fn load_uint(&mut self, bits: usize) -> Result<u64, CellError> {
        if bits > 64 {
            return Err(CellError::UnsupportedWidth(bits));
        }
        self.ensure_bits(bits)?;
        let mut value = 0u64;
        for _ in 0..bits {
            value = (value << 1) | u64::from(self.cell.bit_at(self.bit_pos));
            self.bit_pos += 1;
        }
        Ok(value)
    }

    /// Reads a two's complement integer of `bits` width (1 to 64).
    pub fn load_int(&mut self, bits: usize) -> Result<i64, CellError> {
        if bits == 0 || bits > 64 {
            return Err(CellError::UnsupportedWidth(bits));
        }
        let raw = self.load_uint(bits)?;
        if bits < 64 && (raw >> (bits - 1)) & 1 == 1 {
            Ok((raw | (u64::MAX << bits)) as i64)
        } else {
            Ok(raw as i64)
        }
    }

    /// Reads `bit_len` bits, packed MSB first and zero-padded.
    pub fn load_bits(&mut self, bit_len: usize) -> Result<Vec<u8>, CellError> {
        self.ensure_bits(bit_len)?;
        let mut out = vec![0u8; bit_len.div_ceil(8)];
        for i in 0..bit_len {
            if self.cell.bit_at(self.bit_pos) {
                out[i / 8] |= 0x80 >> (i % 8);
            }
            self.bit_pos += 1;
        }
        Ok(out)
    }

    /// Reads `len` whole bytes.
    pub fn load_bytes(&mut self, len: usize) -> Result<Vec<u8>, CellError> {
        self.load_bits(len * 8)
    }

    /// Reads a 256-bit hash.
    pub fn load_hash(&mut self) -> Result<Hash, CellError> {
        let bytes = self.load_bytes(32)?;
        Hash::from_slice(&bytes).ok_or(CellError::BitUnderflow {
            requested: 256,
            available: bytes.len() * 8,
        })
    }

    /// Skips `bits` data bits.
    pub fn skip_bits(&mut self, bits: usize) -> Result<(), CellError> {
        self.ensure_bits(bits)?;
        self.bit_pos += bits;
        Ok(())
    }

    /// Reads the next reference.
    pub fn load_ref(&mut self) -> Result<Arc<Cell>, CellError> {
        let cell = self
            .cell
            .refs
            .get(self.ref_pos)
            .ok_or(CellError::RefUnderflow)?;
        self.ref_pos += 1;
        Ok(Arc::clone(cell))
    }

    /// Reads `Maybe ^Cell`.
    pub fn load_maybe_ref(&mut self) -> Result<Option<Arc<Cell>>, CellError> {
        if self.load_bit()? {
            self.load_ref().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Reads a byte string stored with [`CellBuilder::store_string_tail`],
    /// following the continuation chain.
    pub fn load_bytes_tail(&mut self) -> Result<Vec<u8>, CellError> {
        let mut out = self.load_bytes(self.remaining_bits() / 8)?;
        if self.remaining_refs() > 0 {
            let next = self.load_ref()?;
            out.extend(next.parse().load_bytes_tail()?);
        }
        Ok(out)
    }
}

// =============================================================================
// TESTS
// =============================================================================
