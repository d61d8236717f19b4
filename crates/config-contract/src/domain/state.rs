//! # Contract State
//!
//! Everything the contract persists between transactions.
//!
//! ```text
//! state$_ config:(Maybe ^(Hashmap 32 ^Cell)) proposals:(Maybe ^(Hashmap 256 ^Proposal))
//! ```

use crate::domain::cell::{Cell, CellBuilder};
use crate::domain::proposal::{critical_params, ProposalTable};
use crate::domain::store::ConfigStore;
use crate::domain::value_objects::{Hash, ParamId, CRITICAL_PARAMS_ID};
use crate::errors::CellError;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Persistent contract state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractState {
    /// Parameter map.
    pub config: ConfigStore,
    /// Pending proposals.
    pub proposals: ProposalTable,
}

impl ContractState {
    /// State with the given parameters and no proposals.
    #[must_use]
    pub fn with_config(config: ConfigStore) -> Self {
        Self {
            config,
            proposals: ProposalTable::new(),
        }
    }

    /// Ids registered as critical under parameter 10.
    pub fn critical_params(&self) -> Result<BTreeSet<ParamId>, CellError> {
        critical_params(&self.config, CRITICAL_PARAMS_ID)
    }

    /// Serializes the full state into its root cell.
    pub fn to_cell(&self) -> Result<Cell, CellError> {
        let mut b = CellBuilder::new();
        b.store_maybe_ref(self.config.to_dict_cell()?.map(Arc::new))?
            .store_maybe_ref(self.proposals.to_dict_cell()?.map(Arc::new))?;
        Ok(b.build())
    }

    /// Reads a state root written by [`ContractState::to_cell`].
    pub fn from_cell(cell: &Cell) -> Result<Self, CellError> {
        let mut s = cell.parse();
        let config = match s.load_maybe_ref()? {
            Some(root) => ConfigStore::from_dict_cell(&root)?,
            None => ConfigStore::new(),
        };
        let proposals = match s.load_maybe_ref()? {
            Some(root) => ProposalTable::from_dict_cell(&root)?,
            None => ProposalTable::new(),
        };
        Ok(Self { config, proposals })
    }

    /// Hash of the persisted root cell.
    pub fn data_hash(&self) -> Result<Hash, CellError> {
        Ok(self.to_cell()?.hash())
    }
}
