//! Per-layer fault block geometry queries.
//!
//! A fault block is a 4-connected component of same-labeled cells within one
//! k-layer. The layer is transient: rebuilt from a keyword array, never
//! persisted.

use log::debug;

use super::error::{ResdataError, Result};

/// Cell corner coordinate in the layer's (i, j) corner lattice.
pub type CornerPoint = (i32, i32);

/// One k-layer of fault block labels (0 meaning "no block").
#[derive(Debug, Clone)]
pub struct FaultBlockLayer {
    k: u32,
    nx: u32,
    ny: u32,
    cell_value: Vec<i32>,
}

impl FaultBlockLayer {
    /// Label a layer from caller-supplied block ids; `layer_values` must
    /// hold exactly `nx * ny` entries.
    pub fn scan(k: u32, nx: u32, ny: u32, layer_values: &[i32]) -> Result<Self> {
        let expected = nx as u64 * ny as u64;
        if layer_values.len() as u64 != expected {
            return Err(ResdataError::Consistency {
                context: "fault block layer size",
                expected,
                found: layer_values.len() as u64,
            });
        }
        debug!("scanned fault block layer k={} ({}x{})", k, nx, ny);
        Ok(Self {
            k,
            nx,
            ny,
            cell_value: layer_values.to_vec(),
        })
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn nx(&self) -> u32 {
        self.nx
    }

    pub fn ny(&self) -> u32 {
        self.ny
    }

    fn cell(&self, i: u32, j: u32) -> usize {
        (i + j * self.nx) as usize
    }

    fn check_ij(&self, i: u32, j: u32) -> Result<()> {
        if i >= self.nx {
            return Err(ResdataError::OutOfRange {
                what: "layer i coordinate",
                index: i as u64,
                size: self.nx as u64,
            });
        }
        if j >= self.ny {
            return Err(ResdataError::OutOfRange {
                what: "layer j coordinate",
                index: j as u64,
                size: self.ny as u64,
            });
        }
        Ok(())
    }

    /// Block id carried by cell `(i, j)`.
    pub fn block_value(&self, i: u32, j: u32) -> Result<i32> {
        self.check_ij(i, j)?;
        Ok(self.cell_value[self.cell(i, j)])
    }

    /// Sum of all labels in the layer, used as a caller-tracked checksum.
    pub fn value_sum(&self) -> i64 {
        self.cell_value.iter().map(|&v| v as i64).sum()
    }

    fn in_component(&self, component: &[bool], i: i32, j: i32) -> bool {
        if i < 0 || j < 0 || i >= self.nx as i32 || j >= self.ny as i32 {
            return false;
        }
        component[self.cell(i as u32, j as u32)]
    }

    /// Flood fill the 4-connected component of `block_id` containing
    /// `(i, j)`, returning the visited cells as a membership mask.
    fn fill_component(&self, i: u32, j: u32, block_id: i32) -> Result<Vec<u32>> {
        self.check_ij(i, j)?;
        if self.cell_value[self.cell(i, j)] != block_id {
            return Err(ResdataError::NoSuchBlock { i, j, block_id });
        }
        let mut seen = vec![false; self.cell_value.len()];
        let mut queue = std::collections::VecDeque::new();
        let mut visited = Vec::new();
        seen[self.cell(i, j)] = true;
        queue.push_back((i as i32, j as i32));
        while let Some((ci, cj)) = queue.pop_front() {
            visited.push(self.cell(ci as u32, cj as u32) as u32);
            for (di, dj) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let (ni, nj) = (ci + di, cj + dj);
                if ni < 0 || nj < 0 || ni >= self.nx as i32 || nj >= self.ny as i32 {
                    continue;
                }
                let cell = self.cell(ni as u32, nj as u32);
                if !seen[cell] && self.cell_value[cell] == block_id {
                    seen[cell] = true;
                    queue.push_back((ni, nj));
                }
            }
        }
        Ok(visited)
    }

    /// Flood fill the component containing `(i, j)` and return the visited
    /// i and j index lists, in visit order.
    pub fn trace_block_content(
        &self,
        i: u32,
        j: u32,
        block_id: i32,
    ) -> Result<(Vec<i32>, Vec<i32>)> {
        let visited = self.fill_component(i, j, block_id)?;
        let mut i_list = Vec::with_capacity(visited.len());
        let mut j_list = Vec::with_capacity(visited.len());
        for cell in visited {
            i_list.push((cell % self.nx) as i32);
            j_list.push((cell / self.nx) as i32);
        }
        Ok((i_list, j_list))
    }

    /// Trace the outer boundary of the component containing `(i, j)`.
    ///
    /// Returns the ordered corner points of the boundary polygon
    /// (counter-clockwise, region kept on the left, the starting corner not
    /// repeated) and the cell indices visited along the boundary.
    pub fn trace_block_edge(
        &self,
        i: u32,
        j: u32,
        block_id: i32,
    ) -> Result<(Vec<CornerPoint>, Vec<u32>)> {
        let cells = self.fill_component(i, j, block_id)?;
        let mut component = vec![false; self.cell_value.len()];
        for &cell in &cells {
            component[cell as usize] = true;
        }

        // Boundary start: the lower-left corner of the cell with minimal
        // (j, i) — its south and west sides are guaranteed boundary edges.
        let mut start_cell = (i as i32, j as i32);
        for &cell in &cells {
            let ci = (cell % self.nx) as i32;
            let cj = (cell / self.nx) as i32;
            if (cj, ci) < (start_cell.1, start_cell.0) {
                start_cell = (ci, cj);
            }
        }

        let start: CornerPoint = (start_cell.0, start_cell.1);
        let mut corners = Vec::new();
        let mut cell_trace = Vec::new();
        let mut corner = start;
        // First move is along the south edge of the start cell.
        let mut dir: (i32, i32) = (1, 0);

        loop {
            corners.push(corner);
            let owner = match dir {
                (1, 0) => (corner.0, corner.1),          // south edge, cell above
                (0, 1) => (corner.0 - 1, corner.1),      // east edge, cell west
                (-1, 0) => (corner.0 - 1, corner.1 - 1), // north edge, cell below
                _ => (corner.0, corner.1 - 1),           // west edge, cell east
            };
            let owner_cell = self.cell(owner.0 as u32, owner.1 as u32) as u32;
            if cell_trace.last() != Some(&owner_cell) && !cell_trace.contains(&owner_cell) {
                cell_trace.push(owner_cell);
            }
            corner = (corner.0 + dir.0, corner.1 + dir.1);
            if corner == start {
                break;
            }
            dir = self.next_edge_dir(&component, corner, dir)?;
        }

        Ok((corners, cell_trace))
    }

    /// Pick the outgoing boundary direction at `corner` given the incoming
    /// direction, preferring left turn, then straight, then right, so the
    /// trace hugs the region at saddle corners.
    fn next_edge_dir(
        &self,
        component: &[bool],
        corner: CornerPoint,
        incoming: (i32, i32),
    ) -> Result<(i32, i32)> {
        let left = (-incoming.1, incoming.0);
        let right = (incoming.1, -incoming.0);
        for dir in [left, incoming, right] {
            if self.is_boundary_edge(component, corner, dir) {
                return Ok(dir);
            }
        }
        Err(ResdataError::InvalidFormat(format!(
            "boundary trace stuck at corner ({}, {})",
            corner.0, corner.1
        )))
    }

    /// Whether the edge leaving `corner` in direction `dir` separates the
    /// component (on the left) from its outside (on the right).
    fn is_boundary_edge(&self, component: &[bool], corner: CornerPoint, dir: (i32, i32)) -> bool {
        let (inside, outside) = match dir {
            (1, 0) => ((corner.0, corner.1), (corner.0, corner.1 - 1)),
            (0, 1) => ((corner.0 - 1, corner.1), (corner.0, corner.1)),
            (-1, 0) => ((corner.0 - 1, corner.1 - 1), (corner.0 - 1, corner.1)),
            _ => ((corner.0, corner.1 - 1), (corner.0 - 1, corner.1 - 1)),
        };
        self.in_component(component, inside.0, inside.1)
            && !self.in_component(component, outside.0, outside.1)
    }

    /// Distinct non-zero labels adjacent to any cell carrying `block_id`,
    /// ascending.
    pub fn block_neighbours(&self, block_id: i32) -> Vec<i32> {
        let mut labels = Vec::new();
        for j in 0..self.ny as i32 {
            for i in 0..self.nx as i32 {
                if self.cell_value[self.cell(i as u32, j as u32)] != block_id {
                    continue;
                }
                for (di, dj) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                    let (ni, nj) = (i + di, j + dj);
                    if ni < 0 || nj < 0 || ni >= self.nx as i32 || nj >= self.ny as i32 {
                        continue;
                    }
                    let label = self.cell_value[self.cell(ni as u32, nj as u32)];
                    if label != 0 && label != block_id && !labels.contains(&label) {
                        labels.push(label);
                    }
                }
            }
        }
        labels.sort_unstable();
        labels
    }
}
