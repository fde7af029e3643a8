//! The rooted tree of locally refined grids.
//!
//! The main grid is itself a node (id 0, empty parent mapping); each child
//! exclusively owns its own active index map and its own children. Parent
//! references are id/index lookups, never pointers.

use std::collections::BTreeMap;

use log::debug;

use super::error::{ResdataError, Result};
use super::index::{ActiveIndexMap, GridDims};

/// Name of the root grid node.
pub const MAIN_GRID_NAME: &str = "global";

/// One grid in the LGR tree.
#[derive(Debug, Clone)]
pub struct LgrNode {
    name: String,
    lgr_id: u32,
    dims: GridDims,
    index: ActiveIndexMap,
    /// For each local global cell, the global index of its host cell in the
    /// parent grid. Empty for the root.
    parent_cell_of: Vec<u32>,
    children: BTreeMap<String, LgrNode>,
}

impl LgrNode {
    pub(crate) fn new_root(dims: GridDims, actnum: Option<&[bool]>) -> Result<Self> {
        Ok(Self {
            name: MAIN_GRID_NAME.to_string(),
            lgr_id: 0,
            dims,
            index: ActiveIndexMap::build(dims.checked_global_size()?, actnum)?,
            parent_cell_of: Vec::new(),
            children: BTreeMap::new(),
        })
    }

    /// Add a refinement nested in this grid's cells.
    ///
    /// Rejected with `DuplicateName` if a sibling of that name exists, and
    /// with `InvalidMapping` if the mapping has the wrong length or points
    /// outside this grid — both checked before any mutation.
    pub fn add_child(
        &mut self,
        name: &str,
        dims: GridDims,
        parent_cell_map: Vec<u32>,
        lgr_id: u32,
        actnum: Option<&[bool]>,
    ) -> Result<&mut LgrNode> {
        if self.children.contains_key(name) {
            return Err(ResdataError::DuplicateName(name.to_string()));
        }
        let local_size = dims.checked_global_size()?;
        if parent_cell_map.len() as u64 != local_size as u64 {
            return Err(ResdataError::Consistency {
                context: "parent cell map length",
                expected: local_size as u64,
                found: parent_cell_map.len() as u64,
            });
        }
        let parent_size = self.dims.global_size();
        for &host in &parent_cell_map {
            if host >= parent_size {
                return Err(ResdataError::InvalidMapping {
                    lgr: name.to_string(),
                    index: host,
                    parent_size,
                });
            }
        }
        debug!(
            "adding LGR {} ({}x{}x{}) under {} with id {}",
            name, dims.nx, dims.ny, dims.nz, self.name, lgr_id
        );
        let node = LgrNode {
            name: name.to_string(),
            lgr_id,
            dims,
            index: ActiveIndexMap::build(local_size, actnum)?,
            parent_cell_of: parent_cell_map,
            children: BTreeMap::new(),
        };
        Ok(self
            .children
            .entry(name.to_string())
            .or_insert(node))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lgr_id(&self) -> u32 {
        self.lgr_id
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn active_index(&self) -> &ActiveIndexMap {
        &self.index
    }

    /// Replace this grid's active mask. Mutation must be externally
    /// serialized against concurrent readers.
    pub fn reset_actnum(&mut self, actnum: Option<&[bool]>) -> Result<()> {
        self.index.reset_actnum(actnum)
    }

    /// Host cell in the parent grid for a local cell. Total over the local
    /// global range of a refinement; the root has no parent cells.
    pub fn parent_cell_of(&self, local_global: u32) -> Result<u32> {
        self.parent_cell_of
            .get(local_global as usize)
            .copied()
            .ok_or(ResdataError::OutOfRange {
                what: "local cell",
                index: local_global as u64,
                size: self.parent_cell_of.len() as u64,
            })
    }

    /// Direct child lookup — this level only, no implicit flattening.
    pub fn get_lgr(&self, name: &str) -> Option<&LgrNode> {
        self.children.get(name)
    }

    pub fn children(&self) -> impl Iterator<Item = &LgrNode> {
        self.children.values()
    }

    /// Deep pre-order search by name, including this node.
    pub fn find(&self, name: &str) -> Option<&LgrNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.values().find_map(|child| child.find(name))
    }

    pub(crate) fn find_mut(&mut self, name: &str) -> Option<&mut LgrNode> {
        if self.name == name {
            return Some(self);
        }
        self.children
            .values_mut()
            .find_map(|child| child.find_mut(name))
    }

    /// Deep pre-order search by id, including this node.
    pub fn find_by_id(&self, lgr_id: u32) -> Option<&LgrNode> {
        if self.lgr_id == lgr_id {
            return Some(self);
        }
        self.children
            .values()
            .find_map(|child| child.find_by_id(lgr_id))
    }

    /// All nodes of the subtree in pre-order.
    pub fn descendants(&self) -> Vec<&LgrNode> {
        let mut nodes = vec![self];
        for child in self.children.values() {
            nodes.extend(child.descendants());
        }
        nodes
    }
}
