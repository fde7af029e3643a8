//! Non-neighbor connection bookkeeping.
//!
//! Connections are directed: a file pair C1 -> C2 is recorded once, on the
//! head grid's [`NncInfo`], in the vector keyed by the tail grid's id. The
//! entry keyed by the owning grid's own id is the "self" vector holding
//! intra-grid connections.

use std::collections::BTreeMap;

/// Parallel arrays of partner cell indices and ordinals into the flat
/// transmissibility table, for one (owning grid, partner grid) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NncVector {
    lgr_id: u32,
    grid_index_list: Vec<u32>,
    nnc_index_list: Vec<u32>,
}

impl NncVector {
    pub fn new(lgr_id: u32) -> Self {
        Self {
            lgr_id,
            grid_index_list: Vec::new(),
            nnc_index_list: Vec::new(),
        }
    }

    /// Id of the partner grid this vector points into.
    pub fn lgr_id(&self) -> u32 {
        self.lgr_id
    }

    /// Global cell indices in the partner grid, aligned with
    /// [`nnc_index_list`](NncVector::nnc_index_list).
    pub fn grid_index_list(&self) -> &[u32] {
        &self.grid_index_list
    }

    /// Ordinals into the flat NNC transmissibility table.
    pub fn nnc_index_list(&self) -> &[u32] {
        &self.nnc_index_list
    }

    pub fn len(&self) -> u32 {
        self.grid_index_list.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.grid_index_list.is_empty()
    }

    fn push(&mut self, partner_global_index: u32, nnc_ordinal: u32) {
        self.grid_index_list.push(partner_global_index);
        self.nnc_index_list.push(nnc_ordinal);
    }
}

/// All NNC data owned by one grid, one vector per partner grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NncInfo {
    lgr_id: u32,
    vectors: BTreeMap<u32, NncVector>,
}

impl NncInfo {
    pub fn new(lgr_id: u32) -> Self {
        Self {
            lgr_id,
            vectors: BTreeMap::new(),
        }
    }

    /// Id of the owning grid.
    pub fn lgr_id(&self) -> u32 {
        self.lgr_id
    }

    /// Append a connection to the vector for `partner_lgr_id`, creating the
    /// vector on first use. Duplicate `(partner, ordinal)` pairs are kept —
    /// deduplication is a caller policy.
    pub fn add_nnc(&mut self, partner_lgr_id: u32, partner_global_index: u32, nnc_ordinal: u32) {
        self.vectors
            .entry(partner_lgr_id)
            .or_insert_with(|| NncVector::new(partner_lgr_id))
            .push(partner_global_index, nnc_ordinal);
    }

    /// The vector for `lgr_id`, or `None` when no connection to that grid
    /// was ever recorded — absence is distinguishable from "data, empty".
    pub fn get_vector(&self, lgr_id: u32) -> Option<&NncVector> {
        self.vectors.get(&lgr_id)
    }

    /// Intra-grid connections (the vector keyed by the owning grid's id).
    pub fn self_vector(&self) -> Option<&NncVector> {
        self.vectors.get(&self.lgr_id)
    }

    pub fn vectors(&self) -> impl Iterator<Item = &NncVector> {
        self.vectors.values()
    }

    /// Total connection count across all owned vectors. Must agree with the
    /// number of entries consumed from the flat transmissibility table when
    /// that table is loaded.
    pub fn total_size(&self) -> u32 {
        self.vectors.values().map(NncVector::len).sum()
    }
}
