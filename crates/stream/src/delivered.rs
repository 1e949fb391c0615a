use std::ops::AddAssign;

use chunkgraph_common::CellCoord;

use crate::cell::{CellArena, CellId};

/// Delta produced by a mutating grid operation.
///
/// For every created cell the caller attaches its payload and external
/// representation; every deleted payload is released by the caller.
#[derive(Debug)]
pub struct Delivered<T> {
    /// Cells allocated by the operation, in creation order.
    pub created: Vec<CellId>,
    /// Payloads moved out of cells that were destroyed.
    pub deleted: Vec<T>,
}

impl<T> Default for Delivered<T> {
    fn default() -> Self {
        Self {
            created: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

impl<T> AddAssign for Delivered<T> {
    fn add_assign(&mut self, rhs: Self) {
        self.created.extend(rhs.created);
        self.deleted.extend(rhs.deleted);
    }
}

impl<T> Delivered<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.deleted.is_empty()
    }

    /// Drop created entries whose cell was reset again later in the same
    /// composite operation.
    pub fn retain_live(&mut self, cells: &CellArena<T>) {
        self.created.retain(|id| cells.contains(*id));
    }

    /// Coordinates of the created cells that are still live.
    pub fn created_coords(&self, cells: &CellArena<T>) -> Vec<CellCoord> {
        self.created.iter().filter_map(|id| cells.coord(*id)).collect()
    }
}
