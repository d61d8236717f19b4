//! # Config Store
//!
//! The persistent parameter map: signed 32-bit id to opaque value cell.

use crate::domain::cell::Cell;
use crate::domain::dict::{build_dict, int_key, key_to_int, parse_dict};
use crate::domain::value_objects::{Hash, ParamId};
use crate::errors::CellError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Mapping from parameter id to value cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigStore {
    params: BTreeMap<ParamId, Arc<Cell>>,
}

impl ConfigStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored at `param_id`.
    #[must_use]
    pub fn get(&self, param_id: ParamId) -> Option<&Arc<Cell>> {
        self.params.get(&param_id)
    }

    /// Returns true if `param_id` holds a value.
    #[must_use]
    pub fn contains(&self, param_id: ParamId) -> bool {
        self.params.contains_key(&param_id)
    }

    /// Writes `value` at `param_id`, returning the previous value.
    pub fn set(&mut self, param_id: ParamId, value: Arc<Cell>) -> Option<Arc<Cell>> {
        self.params.insert(param_id, value)
    }

    /// Removes `param_id`, returning its value.
    pub fn remove(&mut self, param_id: ParamId) -> Option<Arc<Cell>> {
        self.params.remove(&param_id)
    }

    /// Number of stored parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if no parameter is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates parameters in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (ParamId, &Arc<Cell>)> {
        self.params.iter().map(|(id, cell)| (*id, cell))
    }

    /// Hash of the value at `param_id`, or [`Hash::ZERO`] when unset.
    #[must_use]
    pub fn value_hash(&self, param_id: ParamId) -> Hash {
        self.params
            .get(&param_id)
            .map_or(Hash::ZERO, |cell| cell.hash())
    }

    /// Serializes the store as a `Hashmap 32 ^Cell`. `None` when empty.
    pub fn to_dict_cell(&self) -> Result<Option<Cell>, CellError> {
        let entries = self
            .params
            .iter()
            .map(|(id, cell)| (int_key(*id), Arc::clone(cell)))
            .collect();
        build_dict(32, entries, |b, v| b.store_ref(Arc::clone(v)).map(|_| ()))
    }

    /// Rebuilds a store from a `Hashmap 32 ^Cell` root.
    pub fn from_dict_cell(root: &Cell) -> Result<Self, CellError> {
        let params = parse_dict(root, 32, |s| s.load_ref())?
            .into_iter()
            .map(|(key, cell)| (key_to_int(&key), cell))
            .collect();
        Ok(Self { params })
    }
}

impl FromIterator<(ParamId, Arc<Cell>)> for ConfigStore {
    fn from_iter<T: IntoIterator<Item = (ParamId, Arc<Cell>)>>(iter: T) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
