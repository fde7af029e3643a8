//! Grid construction from a keyword stream and the public query surface.
//!
//! Load sequence (cell numbers are 1-based on disk, 0-based in memory):
//!
//! - `DIMENS` (INTE, 3) — main grid dimensions, always first.
//! - `ACTNUM` (INTE, nx*ny*nz) — optional active mask, non-zero = active.
//! - LGR block: `LGR` name, optional `LGRPARNT`, `DIMENS`, optional
//!   `ACTNUM`, `HOSTNUM` (host cell per refined cell). Ids run 1, 2, ... in
//!   file order.
//! - NNC block: `NNCHEAD` (INTE, 2: pair count + owning grid id), then
//!   `NNC1`/`NNC2` (same-grid pairs) and/or `NNCG`/`NNCL` (main-to-LGR
//!   pairs); connection ordinals run across blocks in file order, indexing
//!   the flat transmissibility table.
//! - `TRANNNC` — flat transmissibility table; its length must match the
//!   aggregated connection count.
//! - `FAULTBLK` (INTE, nx*ny*nz) — per-cell fault block labels.
//!
//! A load either completes atomically or fails without exposing a partially
//! built grid.

use std::collections::BTreeMap;
use std::io::{Read, Seek, Write};
use std::path::Path;

use log::{debug, info, warn};

use super::error::{ResdataError, Result};
use super::fault_block::FaultBlockLayer;
use super::index::{ActiveIndexMap, GridDims};
use super::keyword::{Keyword, KwData, KwHeader, KwType};
use super::lgr::{LgrNode, MAIN_GRID_NAME};
use super::nnc::{NncInfo, NncVector};
use super::stream::{Endian, RecordStream};

const DIMENS_KW: &str = "DIMENS";
const ACTNUM_KW: &str = "ACTNUM";
const LGR_KW: &str = "LGR";
const LGRPARNT_KW: &str = "LGRPARNT";
const HOSTNUM_KW: &str = "HOSTNUM";
const NNCHEAD_KW: &str = "NNCHEAD";
const NNC1_KW: &str = "NNC1";
const NNC2_KW: &str = "NNC2";
const NNCG_KW: &str = "NNCG";
const NNCL_KW: &str = "NNCL";
const TRANNNC_KW: &str = "TRANNNC";
const FAULTBLK_KW: &str = "FAULTBLK";

/// Id of the main grid in NNC and LGR numbering.
pub const MAIN_GRID_ID: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NncBlockKind {
    SameGrid,
    MainToLgr,
}

/// Raw head/tail pair lists for one NNC keyword block, kept for export.
#[derive(Debug, Clone)]
struct NncPairBlock {
    lgr_id: u32,
    kind: NncBlockKind,
    heads: Vec<u32>,
    tails: Vec<u32>,
}

struct LgrDef {
    name: String,
    parent: String,
    dims: GridDims,
    hostnum: Vec<u32>,
    actnum: Option<Vec<bool>>,
}

/// A three-dimensional corner-point grid: active cell index, nested LGR
/// tree and the NNC graph over both.
#[derive(Debug)]
pub struct Grid {
    main: LgrNode,
    nnc: BTreeMap<u32, NncInfo>,
    nnc_blocks: Vec<NncPairBlock>,
    fault_blocks: Option<Vec<i32>>,
    next_lgr_id: u32,
}

impl Grid {
    /// An empty grid with the given dimensions and optional active mask.
    pub fn new(dims: GridDims, actnum: Option<&[bool]>) -> Result<Self> {
        Ok(Self {
            main: LgrNode::new_root(dims, actnum)?,
            nnc: BTreeMap::new(),
            nnc_blocks: Vec::new(),
            fault_blocks: None,
            next_lgr_id: 1,
        })
    }

    /// Load a grid from a binary file.
    pub fn from_file(path: impl AsRef<Path>, endian: Endian) -> Result<Self> {
        let mut stream = RecordStream::open_reader(path, endian)?;
        Self::from_stream(&mut stream)
    }

    /// Load a grid from an open keyword stream (binary or formatted).
    pub fn from_stream<S: Read + Seek>(stream: &mut RecordStream<S>) -> Result<Self> {
        let dimens = match Keyword::read(stream)? {
            Some(kw) if kw.name() == DIMENS_KW => kw,
            _ => return Err(ResdataError::MissingKeyword(DIMENS_KW)),
        };
        let dims = read_dims(&dimens)?;
        let global_size = dims.global_size();
        info!(
            "loading grid {}x{}x{} ({} cells)",
            dims.nx, dims.ny, dims.nz, global_size
        );

        let mut main_actnum: Option<Vec<bool>> = None;
        let mut lgr_defs: Vec<LgrDef> = Vec::new();
        let mut nnc_blocks: Vec<NncPairBlock> = Vec::new();
        let mut trannnc_len: Option<u64> = None;
        let mut fault_blocks: Option<Vec<i32>> = None;

        let mut pending = KwHeader::read(stream)?;
        while let Some(header) = pending.take() {
            match header.name.as_str() {
                ACTNUM_KW => {
                    let kw = read_typed(stream, header, KwType::Int)?;
                    let mask = int_mask(&kw, global_size)?;
                    main_actnum = Some(mask);
                }
                LGR_KW => {
                    let def = read_lgr_block(stream, header)?;
                    lgr_defs.push(def);
                }
                NNCHEAD_KW => {
                    let (blocks, next) = read_nnc_block(stream, header)?;
                    nnc_blocks.extend(blocks);
                    pending = next;
                    continue;
                }
                TRANNNC_KW => {
                    let kw = read_typed(stream, header, KwType::Float)?;
                    trannnc_len = Some(kw.count() as u64);
                }
                FAULTBLK_KW => {
                    let kw = read_typed(stream, header, KwType::Int)?;
                    let values = kw
                        .as_int()
                        .map(<[i32]>::to_vec)
                        .unwrap_or_default();
                    if values.len() as u64 != global_size as u64 {
                        return Err(ResdataError::Consistency {
                            context: "FAULTBLK length",
                            expected: global_size as u64,
                            found: values.len() as u64,
                        });
                    }
                    fault_blocks = Some(values);
                }
                other => {
                    debug!("skipping keyword {}", other);
                    Keyword::skip_payload(stream, &header)?;
                }
            }
            pending = KwHeader::read(stream)?;
        }

        // Everything parsed; build the grid in one go so a failed load never
        // leaves a partial structure behind.
        let mut grid = Grid::new(dims, main_actnum.as_deref())?;
        for def in lgr_defs {
            grid.add_lgr(
                &def.parent,
                &def.name,
                def.dims,
                def.hostnum,
                def.actnum.as_deref(),
            )?;
        }
        let mut ordinal = 0;
        for block in nnc_blocks {
            ordinal = grid.apply_nnc_block(block, ordinal)?;
        }
        if let Some(table_len) = trannnc_len {
            let total = grid.total_nnc_count() as u64;
            if table_len != total {
                return Err(ResdataError::Consistency {
                    context: "TRANNNC table length",
                    expected: total,
                    found: table_len,
                });
            }
        }
        grid.fault_blocks = fault_blocks;
        info!(
            "grid loaded: {} active cells, {} LGRs, {} NNCs",
            grid.nactive(),
            grid.main.descendants().len() - 1,
            grid.total_nnc_count()
        );
        Ok(grid)
    }

    /// Add a refinement under the named parent grid, returning its assigned
    /// id. `parent_cell_map` is 0-based into the parent's global space.
    pub fn add_lgr(
        &mut self,
        parent: &str,
        name: &str,
        dims: GridDims,
        parent_cell_map: Vec<u32>,
        actnum: Option<&[bool]>,
    ) -> Result<u32> {
        if self.main.find(name).is_some() {
            return Err(ResdataError::DuplicateName(name.to_string()));
        }
        let lgr_id = self.next_lgr_id;
        let parent_node = self
            .main
            .find_mut(parent)
            .ok_or_else(|| ResdataError::InvalidFormat(format!("unknown parent grid {:?}", parent)))?;
        parent_node.add_child(name, dims, parent_cell_map, lgr_id, actnum)?;
        self.next_lgr_id += 1;
        Ok(lgr_id)
    }

    /// Record a directed connection between two cells of the same grid.
    pub fn add_self_nnc(&mut self, lgr_id: u32, cell1: u32, cell2: u32, ordinal: u32) -> Result<()> {
        let size = self.grid_size_by_id(lgr_id)?;
        check_cell("NNC cell", cell1, size)?;
        check_cell("NNC cell", cell2, size)?;
        self.nnc
            .entry(lgr_id)
            .or_insert_with(|| NncInfo::new(lgr_id))
            .add_nnc(lgr_id, cell2, ordinal);
        self.pair_block_mut(lgr_id, NncBlockKind::SameGrid)
            .push_pair(cell1, cell2);
        Ok(())
    }

    /// Record a directed connection from a main-grid cell to an LGR cell.
    pub fn add_main_lgr_nnc(
        &mut self,
        lgr_id: u32,
        global_cell: u32,
        lgr_cell: u32,
        ordinal: u32,
    ) -> Result<()> {
        if lgr_id == MAIN_GRID_ID {
            return Err(ResdataError::InvalidFormat(
                "main-to-LGR connection needs a non-zero LGR id".to_string(),
            ));
        }
        check_cell("NNC global cell", global_cell, self.grid_size_by_id(MAIN_GRID_ID)?)?;
        check_cell("NNC LGR cell", lgr_cell, self.grid_size_by_id(lgr_id)?)?;
        self.nnc
            .entry(MAIN_GRID_ID)
            .or_insert_with(|| NncInfo::new(MAIN_GRID_ID))
            .add_nnc(lgr_id, lgr_cell, ordinal);
        self.pair_block_mut(lgr_id, NncBlockKind::MainToLgr)
            .push_pair(global_cell, lgr_cell);
        Ok(())
    }

    /// Attach per-cell fault block labels (one per main-grid global cell).
    pub fn set_fault_blocks(&mut self, values: Vec<i32>) -> Result<()> {
        if values.len() as u64 != self.dims().global_size() as u64 {
            return Err(ResdataError::Consistency {
                context: "fault block labels",
                expected: self.dims().global_size() as u64,
                found: values.len() as u64,
            });
        }
        self.fault_blocks = Some(values);
        Ok(())
    }

    fn pair_block_mut(&mut self, lgr_id: u32, kind: NncBlockKind) -> &mut NncPairBlock {
        let position = self
            .nnc_blocks
            .iter()
            .position(|block| block.lgr_id == lgr_id && block.kind == kind);
        match position {
            Some(index) => &mut self.nnc_blocks[index],
            None => {
                self.nnc_blocks.push(NncPairBlock {
                    lgr_id,
                    kind,
                    heads: Vec::new(),
                    tails: Vec::new(),
                });
                let last = self.nnc_blocks.len() - 1;
                &mut self.nnc_blocks[last]
            }
        }
    }

    fn grid_size_by_id(&self, lgr_id: u32) -> Result<u32> {
        self.main
            .find_by_id(lgr_id)
            .map(|node| node.dims().global_size())
            .ok_or(ResdataError::OutOfRange {
                what: "LGR id",
                index: lgr_id as u64,
                size: self.next_lgr_id as u64,
            })
    }

    /// Apply one parsed pair block, assigning ordinals from `ordinal_base`
    /// onward. Returns the next free ordinal.
    fn apply_nnc_block(&mut self, block: NncPairBlock, ordinal_base: u32) -> Result<u32> {
        let mut ordinal = ordinal_base;
        for (&head, &tail) in block.heads.iter().zip(block.tails.iter()) {
            match block.kind {
                NncBlockKind::SameGrid => {
                    self.add_self_nnc(block.lgr_id, head, tail, ordinal)?
                }
                NncBlockKind::MainToLgr => {
                    self.add_main_lgr_nnc(block.lgr_id, head, tail, ordinal)?
                }
            }
            ordinal += 1;
        }
        Ok(ordinal)
    }

    /// Write the grid as a keyword stream with the same vocabulary the
    /// loader accepts.
    pub fn write_stream<S: Write + Seek>(&self, stream: &mut RecordStream<S>) -> Result<()> {
        write_dims(stream, DIMENS_KW, self.dims())?;
        write_actnum(stream, self.main.active_index())?;

        let mut lgrs: Vec<(&str, &LgrNode)> = Vec::new();
        collect_lgrs(&self.main, &mut lgrs);
        lgrs.sort_by_key(|(_, node)| node.lgr_id());
        for (parent_name, node) in lgrs {
            Keyword::new(LGR_KW, KwData::Str(vec![node.name().to_string()]))?
                .write(stream)?;
            Keyword::new(LGRPARNT_KW, KwData::Str(vec![parent_name.to_string()]))?
                .write(stream)?;
            write_dims(stream, DIMENS_KW, node.dims())?;
            write_actnum(stream, node.active_index())?;
            let hostnum: Vec<i32> = (0..node.dims().global_size())
                .map(|local| node.parent_cell_of(local).map(|host| host as i32 + 1))
                .collect::<Result<_>>()?;
            Keyword::new(HOSTNUM_KW, KwData::Int(hostnum))?.write(stream)?;
        }

        for block in &self.nnc_blocks {
            let head = vec![block.heads.len() as i32, block.lgr_id as i32];
            Keyword::new(NNCHEAD_KW, KwData::Int(head))?.write(stream)?;
            let (head_kw, tail_kw) = match block.kind {
                NncBlockKind::SameGrid => (NNC1_KW, NNC2_KW),
                NncBlockKind::MainToLgr => (NNCG_KW, NNCL_KW),
            };
            Keyword::new(head_kw, KwData::Int(one_based(&block.heads)))?.write(stream)?;
            Keyword::new(tail_kw, KwData::Int(one_based(&block.tails)))?.write(stream)?;
        }

        if let Some(values) = &self.fault_blocks {
            Keyword::new(FAULTBLK_KW, KwData::Int(values.clone()))?.write(stream)?;
        }
        stream.flush()
    }

    pub fn dims(&self) -> GridDims {
        self.main.dims()
    }

    pub fn nactive(&self) -> u32 {
        self.main.active_index().nactive()
    }

    /// The root node of the LGR tree.
    pub fn main_grid(&self) -> &LgrNode {
        &self.main
    }

    pub fn global_to_active(&self, global: u32) -> Result<Option<u32>> {
        self.main.active_index().global_to_active(global)
    }

    pub fn active_to_global(&self, active: u32) -> Result<u32> {
        self.main.active_index().active_to_global(active)
    }

    pub fn ijk_to_global(&self, i: u32, j: u32, k: u32) -> Result<u32> {
        self.dims().ijk_to_global(i, j, k)
    }

    pub fn global_to_ijk(&self, global: u32) -> Result<(u32, u32, u32)> {
        self.dims().global_to_ijk(global)
    }

    /// Direct LGR lookup at the main-grid level.
    pub fn get_lgr(&self, name: &str) -> Option<&LgrNode> {
        self.main.get_lgr(name)
    }

    /// Deep LGR lookup anywhere in the tree.
    pub fn find_lgr(&self, name: &str) -> Option<&LgrNode> {
        if name == MAIN_GRID_NAME {
            return Some(&self.main);
        }
        self.main
            .children()
            .find_map(|child| child.find(name))
    }

    pub fn lgr_by_id(&self, lgr_id: u32) -> Option<&LgrNode> {
        self.main.find_by_id(lgr_id)
    }

    /// NNC data owned by the given grid, `None` when that grid has none.
    pub fn nnc_info(&self, lgr_id: u32) -> Option<&NncInfo> {
        self.nnc.get(&lgr_id)
    }

    /// Shorthand for one owning grid's vector toward a partner grid.
    pub fn nnc_vector(&self, owning_lgr_id: u32, partner_lgr_id: u32) -> Option<&NncVector> {
        self.nnc
            .get(&owning_lgr_id)
            .and_then(|info| info.get_vector(partner_lgr_id))
    }

    /// Aggregated connection count over the whole grid/LGR tree.
    pub fn total_nnc_count(&self) -> u32 {
        self.nnc.values().map(NncInfo::total_size).sum()
    }

    /// Replace the main grid's active mask. Mutation must be externally
    /// serialized against concurrent readers.
    pub fn reset_actnum(&mut self, actnum: Option<&[bool]>) -> Result<()> {
        self.main.reset_actnum(actnum)
    }

    /// Build the fault block layer for one k-slice from the loaded labels.
    pub fn fault_block_layer(&self, k: u32) -> Result<FaultBlockLayer> {
        let dims = self.dims();
        if k >= dims.nz {
            return Err(ResdataError::OutOfRange {
                what: "layer k",
                index: k as u64,
                size: dims.nz as u64,
            });
        }
        let values = self
            .fault_blocks
            .as_ref()
            .ok_or(ResdataError::MissingKeyword(FAULTBLK_KW))?;
        let layer_size = (dims.nx * dims.ny) as usize;
        let start = k as usize * layer_size;
        FaultBlockLayer::scan(k, dims.nx, dims.ny, &values[start..start + layer_size])
    }
}

impl NncPairBlock {
    fn push_pair(&mut self, head: u32, tail: u32) {
        self.heads.push(head);
        self.tails.push(tail);
    }
}

fn check_cell(what: &'static str, cell: u32, size: u32) -> Result<()> {
    if cell >= size {
        return Err(ResdataError::OutOfRange {
            what,
            index: cell as u64,
            size: size as u64,
        });
    }
    Ok(())
}

fn one_based(cells: &[u32]) -> Vec<i32> {
    cells.iter().map(|&c| c as i32 + 1).collect()
}

fn read_typed<S: Read + Seek>(
    stream: &mut RecordStream<S>,
    header: KwHeader,
    expected: KwType,
) -> Result<Keyword> {
    if header.kw_type != expected {
        return Err(ResdataError::InvalidFormat(format!(
            "keyword {} has type {}, expected {}",
            header.name,
            header.kw_type.tag(),
            expected.tag()
        )));
    }
    Keyword::read_payload(stream, header)
}

fn read_dims(kw: &Keyword) -> Result<GridDims> {
    let values = kw.as_int().ok_or_else(|| {
        ResdataError::InvalidFormat(format!("keyword {} is not integer typed", kw.name()))
    })?;
    if values.len() != 3 {
        return Err(ResdataError::Consistency {
            context: "DIMENS element count",
            expected: 3,
            found: values.len() as u64,
        });
    }
    let (nx, ny, nz) = (values[0], values[1], values[2]);
    if nx <= 0 || ny <= 0 || nz <= 0 {
        return Err(ResdataError::InvalidFormat(format!(
            "non-positive grid dimensions {}x{}x{}",
            nx, ny, nz
        )));
    }
    let dims = GridDims::new(nx as u32, ny as u32, nz as u32);
    if dims.checked_global_size().is_err() {
        return Err(ResdataError::InvalidFormat(format!(
            "grid dimensions {}x{}x{} overflow the cell index space",
            nx, ny, nz
        )));
    }
    Ok(dims)
}

fn int_mask(kw: &Keyword, global_size: u32) -> Result<Vec<bool>> {
    let values = kw.as_int().ok_or_else(|| {
        ResdataError::InvalidFormat(format!("keyword {} is not integer typed", kw.name()))
    })?;
    if values.len() as u64 != global_size as u64 {
        return Err(ResdataError::Consistency {
            context: "ACTNUM length",
            expected: global_size as u64,
            found: values.len() as u64,
        });
    }
    Ok(values.iter().map(|&v| v != 0).collect())
}

fn read_lgr_block<S: Read + Seek>(
    stream: &mut RecordStream<S>,
    lgr_header: KwHeader,
) -> Result<LgrDef> {
    let lgr_kw = read_typed(stream, lgr_header, KwType::String)?;
    let name = lgr_kw
        .as_str()
        .and_then(|names| names.first())
        .ok_or_else(|| ResdataError::InvalidFormat("LGR keyword without a name".to_string()))?
        .clone();

    let mut next = require_kw(stream, "LGR definition")?;
    let parent = if next.name() == LGRPARNT_KW {
        let parent = next
            .as_str()
            .and_then(|names| names.first())
            .ok_or_else(|| {
                ResdataError::InvalidFormat("LGRPARNT keyword without a name".to_string())
            })?
            .clone();
        next = require_kw(stream, "LGR definition")?;
        parent
    } else {
        MAIN_GRID_NAME.to_string()
    };

    if next.name() != DIMENS_KW {
        return Err(ResdataError::InvalidFormat(format!(
            "expected DIMENS in LGR block {}, found {}",
            name,
            next.name()
        )));
    }
    let dims = read_dims(&next)?;

    next = require_kw(stream, "LGR definition")?;
    let actnum = if next.name() == ACTNUM_KW {
        let mask = int_mask(&next, dims.global_size())?;
        next = require_kw(stream, "LGR definition")?;
        Some(mask)
    } else {
        None
    };

    if next.name() != HOSTNUM_KW {
        return Err(ResdataError::InvalidFormat(format!(
            "expected HOSTNUM in LGR block {}, found {}",
            name,
            next.name()
        )));
    }
    let raw_hosts = next.as_int().ok_or_else(|| {
        ResdataError::InvalidFormat("HOSTNUM keyword is not integer typed".to_string())
    })?;
    let mut hostnum = Vec::with_capacity(raw_hosts.len());
    for &host in raw_hosts {
        if host < 1 {
            return Err(ResdataError::InvalidFormat(format!(
                "HOSTNUM entry {} in LGR block {} is not a 1-based cell number",
                host, name
            )));
        }
        hostnum.push(host as u32 - 1);
    }
    debug!("parsed LGR block {} under {}", name, parent);
    Ok(LgrDef {
        name,
        parent,
        dims,
        hostnum,
        actnum,
    })
}

/// Read the keywords of one NNC block. Returns the parsed pair blocks plus
/// the first header that does not belong to the block.
fn read_nnc_block<S: Read + Seek>(
    stream: &mut RecordStream<S>,
    head_header: KwHeader,
) -> Result<(Vec<NncPairBlock>, Option<KwHeader>)> {
    let head_kw = read_typed(stream, head_header, KwType::Int)?;
    let head_values = head_kw.as_int().unwrap_or(&[]);
    if head_values.len() != 2 {
        return Err(ResdataError::Consistency {
            context: "NNCHEAD element count",
            expected: 2,
            found: head_values.len() as u64,
        });
    }
    let declared = head_values[0];
    let lgr_id = head_values[1];
    if lgr_id < 0 {
        return Err(ResdataError::InvalidFormat(format!(
            "negative grid id {} in NNCHEAD",
            lgr_id
        )));
    }
    let lgr_id = lgr_id as u32;

    let mut nnc1: Option<Vec<u32>> = None;
    let mut nnc2: Option<Vec<u32>> = None;
    let mut nncg: Option<Vec<u32>> = None;
    let mut nncl: Option<Vec<u32>> = None;
    let next = loop {
        let header = match KwHeader::read(stream)? {
            Some(header) => header,
            None => break None,
        };
        let slot = match header.name.as_str() {
            NNC1_KW => &mut nnc1,
            NNC2_KW => &mut nnc2,
            NNCG_KW => &mut nncg,
            NNCL_KW => &mut nncl,
            _ => break Some(header),
        };
        let kw = read_typed(stream, header, KwType::Int)?;
        let cells = cells_one_based(&kw)?;
        *slot = Some(cells);
    };

    let mut blocks = Vec::new();
    match (nnc1, nnc2) {
        (Some(heads), Some(tails)) => {
            if heads.len() != tails.len() {
                return Err(ResdataError::Consistency {
                    context: "NNC1/NNC2 pair lists",
                    expected: heads.len() as u64,
                    found: tails.len() as u64,
                });
            }
            if declared >= 0 && declared as usize != heads.len() {
                warn!(
                    "NNCHEAD declares {} pairs, NNC1 carries {}",
                    declared,
                    heads.len()
                );
            }
            blocks.push(NncPairBlock {
                lgr_id,
                kind: NncBlockKind::SameGrid,
                heads,
                tails,
            });
        }
        (None, None) => {}
        _ => {
            return Err(ResdataError::InvalidFormat(
                "NNC1 and NNC2 must occur together".to_string(),
            ))
        }
    }
    match (nncg, nncl) {
        (Some(heads), Some(tails)) => {
            if heads.len() != tails.len() {
                return Err(ResdataError::Consistency {
                    context: "NNCG/NNCL pair lists",
                    expected: heads.len() as u64,
                    found: tails.len() as u64,
                });
            }
            blocks.push(NncPairBlock {
                lgr_id,
                kind: NncBlockKind::MainToLgr,
                heads,
                tails,
            });
        }
        (None, None) => {}
        _ => {
            return Err(ResdataError::InvalidFormat(
                "NNCG and NNCL must occur together".to_string(),
            ))
        }
    }
    Ok((blocks, next))
}

fn cells_one_based(kw: &Keyword) -> Result<Vec<u32>> {
    let values = kw.as_int().ok_or_else(|| {
        ResdataError::InvalidFormat(format!("keyword {} is not integer typed", kw.name()))
    })?;
    let mut cells = Vec::with_capacity(values.len());
    for &value in values {
        if value < 1 {
            return Err(ResdataError::InvalidFormat(format!(
                "cell number {} in keyword {} is not 1-based",
                value,
                kw.name()
            )));
        }
        cells.push(value as u32 - 1);
    }
    Ok(cells)
}

fn require_kw<S: Read + Seek>(stream: &mut RecordStream<S>, context: &str) -> Result<Keyword> {
    Keyword::read(stream)?.ok_or_else(|| {
        ResdataError::InvalidFormat(format!("stream ended inside {}", context))
    })
}

fn write_dims<S: Write + Seek>(
    stream: &mut RecordStream<S>,
    name: &str,
    dims: GridDims,
) -> Result<()> {
    Keyword::new(
        name,
        KwData::Int(vec![dims.nx as i32, dims.ny as i32, dims.nz as i32]),
    )?
    .write(stream)
}

fn write_actnum<S: Write + Seek>(
    stream: &mut RecordStream<S>,
    index: &ActiveIndexMap,
) -> Result<()> {
    let values: Vec<i32> = index
        .actnum()
        .into_iter()
        .map(|active| if active { 1 } else { 0 })
        .collect();
    Keyword::new(ACTNUM_KW, KwData::Int(values))?.write(stream)
}

fn collect_lgrs<'a>(node: &'a LgrNode, out: &mut Vec<(&'a str, &'a LgrNode)>) {
    for child in node.children() {
        out.push((node.name(), child));
        collect_lgrs(child, out);
    }
}
