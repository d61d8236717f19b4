//! # Dictionaries
//!
//! Reader and writer for the binary-trie dictionary (`Hashmap n X`) used by
//! the persisted state and by the critical parameter registry.
//!
//! Each node starts with a label compressing the shared key prefix:
//!
//! - `hml_short$0 len:(Unary ~n) s:(n * Bit)`
//! - `hml_long$10 n:(#<= m) s:(n * Bit)`
//! - `hml_same$11 v:Bit n:(#<= m)`
//!
//! A node with key bits left forks into two references (next bit 0 and 1),
//! otherwise it is a leaf holding the value.

use crate::domain::cell::{Cell, CellBuilder, CellSlice};
use crate::domain::value_objects::{Hash, ParamId};
use crate::errors::CellError;
use std::collections::BTreeSet;

/// Dictionary key as a bit sequence, most significant bit first.
pub type DictKey = Vec<bool>;

/// Key bits of a signed 32-bit parameter id.
#[must_use]
pub fn int_key(id: ParamId) -> DictKey {
    let raw = id as u32;
    (0..32).rev().map(|i| (raw >> i) & 1 == 1).collect()
}

/// Parameter id from 32 key bits.
#[must_use]
pub fn key_to_int(key: &[bool]) -> ParamId {
    key.iter().fold(0u32, |acc, bit| (acc << 1) | u32::from(*bit)) as i32
}

/// Key bits of a 256-bit hash.
#[must_use]
pub fn hash_key(hash: &Hash) -> DictKey {
    bytes_to_bits(hash.as_bytes(), 256)
}

/// Hash from 256 key bits.
#[must_use]
pub fn key_to_hash(key: &[bool]) -> Hash {
    let mut bytes = [0u8; 32];
    for (i, bit) in key.iter().take(256).enumerate() {
        if *bit {
            bytes[i / 8] |= 0x80 >> (i % 8);
        }
    }
    Hash::new(bytes)
}

fn bytes_to_bits(bytes: &[u8], len: usize) -> DictKey {
    (0..len).map(|i| bytes[i / 8] & (0x80 >> (i % 8)) != 0).collect()
}

/// Bits needed to encode a number in `0..=max`.
fn len_bits(max: usize) -> usize {
    (usize::BITS - max.leading_zeros()) as usize
}

// =============================================================================
// WRITER
// =============================================================================

/// Serializes `entries` as the root of a `Hashmap key_len X`.
///
/// Returns `None` for an empty map. Keys must all be `key_len` bits long;
/// duplicates keep the last value.
pub fn build_dict<V, F>(
    key_len: usize,
    entries: Vec<(DictKey, V)>,
    write_value: F,
) -> Result<Option<Cell>, CellError>
where
    F: Fn(&mut CellBuilder, &V) -> Result<(), CellError>,
{
    if entries.iter().any(|(k, _)| k.len() != key_len) {
        return Err(CellError::MalformedDictionary("key length mismatch"));
    }
    let mut entries = entries;
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.reverse();
    entries.dedup_by(|a, b| a.0 == b.0);
    entries.reverse();

    if entries.is_empty() {
        return Ok(None);
    }
    let refs: Vec<(&[bool], &V)> = entries.iter().map(|(k, v)| (k.as_slice(), v)).collect();
    build_node(&refs, key_len, &write_value).map(Some)
}

fn build_node<V, F>(entries: &[(&[bool], &V)], n: usize, write_value: &F) -> Result<Cell, CellError>
where
    F: Fn(&mut CellBuilder, &V) -> Result<(), CellError>,
{
    let first = entries[0].0;
    let last = entries[entries.len() - 1].0;
    // entries are sorted, so the common prefix of the extremes is shared by all
    let label_len = first
        .iter()
        .zip(last.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut builder = CellBuilder::new();
    store_label(&mut builder, &first[..label_len], n)?;

    if label_len == n {
        write_value(&mut builder, entries[0].1)?;
        return Ok(builder.build());
    }

    let split = entries.partition_point(|(k, _)| !k[label_len]);
    let left = strip_prefix(&entries[..split], label_len + 1);
    let right = strip_prefix(&entries[split..], label_len + 1);
    let remaining = n - label_len - 1;

    builder.store_ref(build_node(&left, remaining, write_value)?)?;
    builder.store_ref(build_node(&right, remaining, write_value)?)?;
    Ok(builder.build())
}

fn strip_prefix<'a, V>(part: &[(&'a [bool], &'a V)], skip: usize) -> Vec<(&'a [bool], &'a V)> {
    part.iter().map(|&(k, v)| (&k[skip..], v)).collect()
}

fn store_label(builder: &mut CellBuilder, label: &[bool], max: usize) -> Result<(), CellError> {
    let l = label.len();
    let k = len_bits(max);
    let short_cost = 2 * l + 2;
    let long_cost = 2 + k + l;
    let same = l > 0 && label.iter().all(|b| *b == label[0]);
    let same_cost = 3 + k;

    if same && same_cost < short_cost && same_cost < long_cost {
        builder
            .store_uint(0b11, 2)?
            .store_bit(label[0])?
            .store_uint(l as u64, k)?;
    } else if short_cost <= long_cost {
        builder.store_bit(false)?;
        for _ in 0..l {
            builder.store_bit(true)?;
        }
        builder.store_bit(false)?;
        for bit in label {
            builder.store_bit(*bit)?;
        }
    } else {
        builder.store_uint(0b10, 2)?.store_uint(l as u64, k)?;
        for bit in label {
            builder.store_bit(*bit)?;
        }
    }
    Ok(())
}

// =============================================================================
// READER
// =============================================================================

/// Reads every entry of a `Hashmap key_len X` whose root is `root`.
///
/// Entries come back in ascending key order.
pub fn parse_dict<V, F>(
    root: &Cell,
    key_len: usize,
    read_value: F,
) -> Result<Vec<(DictKey, V)>, CellError>
where
    F: Fn(&mut CellSlice<'_>) -> Result<V, CellError>,
{
    let mut out = Vec::new();
    let mut prefix = Vec::with_capacity(key_len);
    read_node(root, key_len, &mut prefix, &mut out, &read_value)?;
    Ok(out)
}

fn read_node<V, F>(
    cell: &Cell,
    n: usize,
    prefix: &mut DictKey,
    out: &mut Vec<(DictKey, V)>,
    read_value: &F,
) -> Result<(), CellError>
where
    F: Fn(&mut CellSlice<'_>) -> Result<V, CellError>,
{
    let mut slice = cell.parse();
    let label = load_label(&mut slice, n)?;
    let base = prefix.len();
    prefix.extend_from_slice(&label);

    let remaining = n - label.len();
    if remaining == 0 {
        out.push((prefix.clone(), read_value(&mut slice)?));
    } else {
        let left = slice.load_ref()?;
        let right = slice.load_ref()?;
        prefix.push(false);
        read_node(&left, remaining - 1, prefix, out, read_value)?;
        prefix.pop();
        prefix.push(true);
        read_node(&right, remaining - 1, prefix, out, read_value)?;
        prefix.pop();
    }
    prefix.truncate(base);
    Ok(())
}

fn load_label(slice: &mut CellSlice<'_>, max: usize) -> Result<DictKey, CellError> {
    let k = len_bits(max);
    let label = if !slice.load_bit()? {
        let mut l = 0;
        while slice.load_bit()? {
            l += 1;
            if l > max {
                return Err(CellError::MalformedDictionary("unary label too long"));
            }
        }
        load_key_bits(slice, l)?
    } else if !slice.load_bit()? {
        let l = slice.load_uint(k)? as usize;
        if l > max {
            return Err(CellError::MalformedDictionary("long label too long"));
        }
        load_key_bits(slice, l)?
    } else {
        let bit = slice.load_bit()?;
        let l = slice.load_uint(k)? as usize;
        if l > max {
            return Err(CellError::MalformedDictionary("same label too long"));
        }
        vec![bit; l]
    };
    Ok(label)
}

fn load_key_bits(slice: &mut CellSlice<'_>, len: usize) -> Result<DictKey, CellError> {
    (0..len).map(|_| slice.load_bit()).collect()
}

// =============================================================================
// INTEGER SETS
// =============================================================================

/// Reads a `Hashmap 32 True` used as a set of parameter ids.
pub fn parse_int_set(root: &Cell) -> Result<BTreeSet<ParamId>, CellError> {
    let entries = parse_dict(root, 32, |_| Ok(()))?;
    Ok(entries.iter().map(|(k, ())| key_to_int(k)).collect())
}

/// Writes a set of parameter ids as a `Hashmap 32 True`.
pub fn build_int_set(ids: impl IntoIterator<Item = ParamId>) -> Result<Option<Cell>, CellError> {
    let entries: Vec<(DictKey, ())> = ids.into_iter().map(|id| (int_key(id), ())).collect();
    build_dict(32, entries, |_, ()| Ok(()))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_int_key_roundtrip() {
        for id in [0, 1, -1, -1024, -1025, i32::MAX, i32::MIN, 81] {
            assert_eq!(key_to_int(&int_key(id)), id);
        }
        assert!(int_key(-1)[0]);
        assert!(!int_key(1)[0]);
    }

    #[test]
    fn test_empty_set() {
        assert!(build_int_set(Vec::new()).unwrap().is_none());
    }

    #[test]
    fn test_single_entry_is_leaf() {
        let root = build_int_set([34]).unwrap().unwrap();
        assert!(root.refs().is_empty());
        assert_eq!(parse_int_set(&root).unwrap(), BTreeSet::from([34]));
    }

    #[test]
    fn test_critical_set_roundtrip() {
        let ids = [0, 1, 9, 10, 12, 14, 15, 16, 17, 32, 34, 36, -999, -1000, -1001];
        let root = build_int_set(ids).unwrap().unwrap();
        let parsed = parse_int_set(&root).unwrap();
        assert_eq!(parsed, ids.into_iter().collect::<BTreeSet<_>>());
    }

    #[test]
    fn test_values_as_refs() {
        let mut a = CellBuilder::new();
        a.store_string_tail("alpha").unwrap();
        let a = std::sync::Arc::new(a.build());
        let entries = vec![(int_key(7), a.clone()), (int_key(-1024), a.clone())];
        let root = build_dict(32, entries, |b, v| b.store_ref(v.clone()).map(|_| ()))
            .unwrap()
            .unwrap();
        let parsed = parse_dict(&root, 32, |s| s.load_ref()).unwrap();
        assert_eq!(parsed.len(), 2);
        // Ascending unsigned key order: 7 before -1024.
        assert_eq!(key_to_int(&parsed[0].0), 7);
        assert_eq!(key_to_int(&parsed[1].0), -1024);
        assert_eq!(parsed[1].1, a);
    }

    #[test]
    fn test_hash_keys() {
        let h = Hash::new([0x5A; 32]);
        assert_eq!(key_to_hash(&hash_key(&h)), h);
        let root = build_dict(256, vec![(hash_key(&h), ())], |_, ()| Ok(()))
            .unwrap()
            .unwrap();
        let parsed = parse_dict(&root, 256, |_| Ok(())).unwrap();
        assert_eq!(key_to_hash(&parsed[0].0), h);
    }

    #[test]
    fn test_key_length_mismatch() {
        let err = build_dict(32, vec![(vec![true; 8], ())], |_, ()| Ok(())).unwrap_err();
        assert!(matches!(err, CellError::MalformedDictionary(_)));
    }

    #[test]
    fn test_reads_long_and_same_labels() {
        // Single leaf with an hml_same label: key = 32 one-bits = -1.
        let mut b = CellBuilder::new();
        b.store_uint(0b11, 2).unwrap().store_bit(true).unwrap().store_uint(32, 6).unwrap();
        let root = b.build();
        assert_eq!(parse_int_set(&root).unwrap(), BTreeSet::from([-1]));

        // Single leaf with an hml_long label: key = 5.
        let mut b = CellBuilder::new();
        b.store_uint(0b10, 2).unwrap().store_uint(32, 6).unwrap();
        b.store_uint(5, 32).unwrap();
        let root = b.build();
        assert_eq!(parse_int_set(&root).unwrap(), BTreeSet::from([5]));
    }

    #[test]
    fn test_rejects_oversized_label() {
        let mut b = CellBuilder::new();
        b.store_uint(0b10, 2).unwrap().store_uint(40, 6).unwrap();
        let root = b.build();
        assert!(matches!(
            parse_int_set(&root),
            Err(CellError::MalformedDictionary(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_int_set_roundtrip(ids in proptest::collection::btree_set(any::<i32>(), 0..40)) {
            let root = build_int_set(ids.iter().copied()).unwrap();
            let parsed = root.map(|r| parse_int_set(&r).unwrap()).unwrap_or_default();
            prop_assert_eq!(parsed, ids);
        }
    }
}
