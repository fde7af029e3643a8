//! Grid dimensions and the global/active cell index bijection.

use super::error::{ResdataError, Result};

/// Dimensions of a corner-point grid.
///
/// Global cell indexing is dense row-major over `nx*ny*nz` with `i` varying
/// fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    pub nx: u32,
    pub ny: u32,
    pub nz: u32,
}

impl GridDims {
    pub fn new(nx: u32, ny: u32, nz: u32) -> Self {
        Self { nx, ny, nz }
    }

    pub fn global_size(&self) -> u32 {
        self.nx * self.ny * self.nz
    }

    /// Cell count with the product checked against the dense u32 cell index
    /// space. Every grid construction path goes through this; dimensions
    /// whose product does not fit are rejected, never wrapped.
    pub fn checked_global_size(&self) -> Result<u32> {
        let product = self.nx as u64 * self.ny as u64 * self.nz as u64;
        u32::try_from(product).map_err(|_| ResdataError::OutOfRange {
            what: "grid cell count",
            index: product,
            size: u32::MAX as u64,
        })
    }

    /// Row-major global index of `(i, j, k)`; coordinates outside the box
    /// are an error, never clamped.
    pub fn ijk_to_global(&self, i: u32, j: u32, k: u32) -> Result<u32> {
        if i >= self.nx {
            return Err(ResdataError::OutOfRange {
                what: "i coordinate",
                index: i as u64,
                size: self.nx as u64,
            });
        }
        if j >= self.ny {
            return Err(ResdataError::OutOfRange {
                what: "j coordinate",
                index: j as u64,
                size: self.ny as u64,
            });
        }
        if k >= self.nz {
            return Err(ResdataError::OutOfRange {
                what: "k coordinate",
                index: k as u64,
                size: self.nz as u64,
            });
        }
        Ok(i + j * self.nx + k * self.nx * self.ny)
    }

    pub fn global_to_ijk(&self, global: u32) -> Result<(u32, u32, u32)> {
        if global >= self.global_size() {
            return Err(ResdataError::OutOfRange {
                what: "global cell",
                index: global as u64,
                size: self.global_size() as u64,
            });
        }
        let i = global % self.nx;
        let j = (global / self.nx) % self.ny;
        let k = global / (self.nx * self.ny);
        Ok((i, j, k))
    }
}

/// Bijection between the dense global index space and the dense active
/// index space induced by an active/inactive mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveIndexMap {
    global_to_active: Vec<Option<u32>>,
    active_to_global: Vec<u32>,
}

impl ActiveIndexMap {
    /// Build the map for `global_size` cells. With no mask every cell is
    /// active and the two index spaces coincide.
    pub fn build(global_size: u32, actnum: Option<&[bool]>) -> Result<Self> {
        if let Some(mask) = actnum {
            if mask.len() as u64 != global_size as u64 {
                return Err(ResdataError::Consistency {
                    context: "active mask length",
                    expected: global_size as u64,
                    found: mask.len() as u64,
                });
            }
        }
        let mut global_to_active = Vec::with_capacity(global_size as usize);
        let mut active_to_global = Vec::new();
        for global in 0..global_size {
            let active = actnum.map_or(true, |mask| mask[global as usize]);
            if active {
                global_to_active.push(Some(active_to_global.len() as u32));
                active_to_global.push(global);
            } else {
                global_to_active.push(None);
            }
        }
        Ok(Self {
            global_to_active,
            active_to_global,
        })
    }

    /// Rebuild both maps from a new mask in one pass. The new vectors are
    /// built aside and swapped in, so readers never observe a
    /// partially-consistent state.
    pub fn reset_actnum(&mut self, actnum: Option<&[bool]>) -> Result<()> {
        let rebuilt = Self::build(self.global_size(), actnum)?;
        *self = rebuilt;
        Ok(())
    }

    pub fn global_size(&self) -> u32 {
        self.global_to_active.len() as u32
    }

    pub fn nactive(&self) -> u32 {
        self.active_to_global.len() as u32
    }

    /// Active index of a global cell, `None` when the cell is inactive.
    /// An out-of-range global index is an error, not `None`.
    pub fn global_to_active(&self, global: u32) -> Result<Option<u32>> {
        self.global_to_active
            .get(global as usize)
            .copied()
            .ok_or(ResdataError::OutOfRange {
                what: "global cell",
                index: global as u64,
                size: self.global_to_active.len() as u64,
            })
    }

    pub fn active_to_global(&self, active: u32) -> Result<u32> {
        self.active_to_global
            .get(active as usize)
            .copied()
            .ok_or(ResdataError::OutOfRange {
                what: "active cell",
                index: active as u64,
                size: self.active_to_global.len() as u64,
            })
    }

    /// The current mask, derived from the map itself.
    pub fn actnum(&self) -> Vec<bool> {
        self.global_to_active
            .iter()
            .map(|entry| entry.is_some())
            .collect()
    }
}
