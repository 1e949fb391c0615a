use std::collections::HashSet;

use chunkgraph_common::{CellCoord, Direction};
use slotmap::{SlotMap, new_key_type};

use crate::error::GridError;

new_key_type! {
    /// Stable handle to a cell in a [`CellArena`]. Goes stale once the cell is reset.
    pub struct CellId;
}

/// A node of the 8-connected planar graph.
///
/// Neighbour slots hold handles, so a slot can outlive the cell it names.
/// Such stale slots are cleared lazily by [`CellArena::neighbour`].
#[derive(Debug)]
pub struct Cell<T> {
    coord: CellCoord,
    neighbours: [Option<CellId>; 8],
    owners: u32,
    payload: Option<T>,
}

impl<T> Cell<T> {
    fn new(coord: CellCoord) -> Self {
        Self {
            coord,
            neighbours: [None; 8],
            owners: 1,
            payload: None,
        }
    }

    pub fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Number of grids currently holding this cell.
    pub fn owners(&self) -> u32 {
        self.owners
    }

    pub fn is_shared(&self) -> bool {
        self.owners > 1
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// Raw slot content. May name a cell that no longer exists.
    pub fn slot(&self, dir: Direction) -> Option<CellId> {
        self.neighbours[dir.index()]
    }

    fn set_slot(&mut self, dir: Direction, cell: Option<CellId>) {
        self.neighbours[dir.index()] = cell;
    }

    fn increment_owner(&mut self) -> u32 {
        self.owners += 1;
        self.owners
    }

    fn decrement_owner(&mut self) -> u32 {
        self.owners = self.owners.saturating_sub(1);
        self.owners
    }

    /// Clear all neighbour slots, returning what they held.
    fn reset(&mut self) -> [Option<CellId>; 8] {
        std::mem::replace(&mut self.neighbours, [None; 8])
    }
}

/// Outcome of [`CellArena::release`].
#[derive(Debug)]
pub enum Release<T> {
    /// Another grid still holds the cell; carries the remaining owner count.
    Shared(u32),
    /// The last owner let go and the cell was reset.
    Destroyed(Removed<T>),
}

/// What is left of a cell after [`CellArena::reset`].
#[derive(Debug)]
pub struct Removed<T> {
    pub coord: CellCoord,
    pub payload: Option<T>,
    /// Former neighbours that were still live at reset time.
    pub neighbours: Vec<CellId>,
}

/// Generational storage for every cell of every grid.
///
/// All grids driven together must share one arena so overlapping grids can
/// hand cells to each other.
#[derive(Debug)]
pub struct CellArena<T> {
    cells: SlotMap<CellId, Cell<T>>,
}

impl<T> Default for CellArena<T> {
    fn default() -> Self {
        Self {
            cells: SlotMap::with_key(),
        }
    }
}

impl<T> CellArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True while the cell has not been reset.
    pub fn contains(&self, id: CellId) -> bool {
        self.cells.contains_key(id)
    }

    pub fn get(&self, id: CellId) -> Option<&Cell<T>> {
        self.cells.get(id)
    }

    pub fn coord(&self, id: CellId) -> Option<CellCoord> {
        self.cells.get(id).map(Cell::coord)
    }

    pub fn owners(&self, id: CellId) -> Option<u32> {
        self.cells.get(id).map(Cell::owners)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellId, &Cell<T>)> {
        self.cells.iter()
    }

    /// Allocate an unlinked cell with a single owner.
    pub fn make_cell(&mut self, coord: CellCoord) -> CellId {
        self.cells.insert(Cell::new(coord))
    }

    /// Neighbour in `dir`. A slot naming a reset cell is cleared on the way.
    pub fn neighbour(&mut self, id: CellId, dir: Direction) -> Option<CellId> {
        let slot = self.cells.get(id)?.slot(dir)?;
        if self.cells.contains_key(slot) {
            return Some(slot);
        }
        if let Some(cell) = self.cells.get_mut(id) {
            cell.set_slot(dir, None);
        }
        None
    }

    /// Read-only variant of [`neighbour`](Self::neighbour): stale slots read
    /// as `None` but stay in place.
    pub fn peek_neighbour(&self, id: CellId, dir: Direction) -> Option<CellId> {
        self.cells
            .get(id)?
            .slot(dir)
            .filter(|n| self.cells.contains_key(*n))
    }

    /// Overwrite a slot unconditionally. No-op on a stale `id`.
    pub fn set_neighbour(&mut self, id: CellId, dir: Direction, cell: Option<CellId>) {
        if let Some(c) = self.cells.get_mut(id) {
            c.set_slot(dir, cell);
        }
    }

    /// Live neighbours of `id` in slot order, healing stale slots.
    pub fn live_neighbours(&mut self, id: CellId) -> Vec<CellId> {
        Direction::ALL
            .into_iter()
            .filter_map(|dir| self.neighbour(id, dir))
            .collect()
    }

    /// Clear every stale slot of `id`. Returns how many were cleared.
    pub fn heal(&mut self, id: CellId) -> usize {
        let Some(slots) = self.cells.get(id).map(|c| c.neighbours) else {
            return 0;
        };
        let stale: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|dir| slots[dir.index()].is_some_and(|n| !self.cells.contains_key(n)))
            .collect();
        if let Some(cell) = self.cells.get_mut(id) {
            for dir in &stale {
                cell.set_slot(*dir, None);
            }
        }
        stale.len()
    }

    /// Register one more owning grid.
    ///
    /// Pre: `id` is live. Post: owner count incremented by one.
    pub fn share(&mut self, id: CellId) -> Result<u32, GridError> {
        self.cells
            .get_mut(id)
            .map(Cell::increment_owner)
            .ok_or(GridError::StaleCell(id))
    }

    /// Drop one owning grid.
    ///
    /// Pre: `id` is live. Post: with other owners left the count drops by
    /// one and the cell survives; otherwise the cell is reset.
    pub fn release(&mut self, id: CellId) -> Result<Release<T>, GridError> {
        let cell = self.cells.get_mut(id).ok_or(GridError::StaleCell(id))?;
        if cell.is_shared() {
            return Ok(Release::Shared(cell.decrement_owner()));
        }
        self.reset(id)
            .map(Release::Destroyed)
            .ok_or(GridError::StaleCell(id))
    }

    /// Invalidate a cell regardless of owners. Former neighbours keep their
    /// slots until they are read or healed. Idempotent: `None` once gone.
    pub fn reset(&mut self, id: CellId) -> Option<Removed<T>> {
        let mut cell = self.cells.remove(id)?;
        let former = cell.reset();
        let neighbours = former
            .into_iter()
            .flatten()
            .filter(|n| self.cells.contains_key(*n))
            .collect();
        Some(Removed {
            coord: cell.coord,
            payload: cell.payload.take(),
            neighbours,
        })
    }

    /// Attach caller data to a cell, returning whatever was attached before.
    pub fn attach(&mut self, id: CellId, payload: T) -> Result<Option<T>, GridError> {
        let cell = self.cells.get_mut(id).ok_or(GridError::StaleCell(id))?;
        Ok(cell.payload.replace(payload))
    }

    pub fn detach(&mut self, id: CellId) -> Option<T> {
        self.cells.get_mut(id)?.payload.take()
    }

    pub fn payload(&self, id: CellId) -> Option<&T> {
        self.cells.get(id)?.payload()
    }

    pub fn payload_mut(&mut self, id: CellId) -> Option<&mut T> {
        self.cells.get_mut(id)?.payload.as_mut()
    }

    /// Check the graph invariants over all live cells: one cell per
    /// coordinate, every live link points at the right coordinate and is
    /// mirrored by its target. Stale slots are ignored.
    pub fn verify_links(&self) -> Result<(), GridError> {
        let mut seen = HashSet::with_capacity(self.cells.len());
        for (id, cell) in &self.cells {
            if !seen.insert(cell.coord) {
                return Err(GridError::DuplicateCell(cell.coord));
            }
            for dir in Direction::ALL {
                let Some(other) = cell.slot(dir).and_then(|n| self.cells.get(n)) else {
                    continue;
                };
                if other.coord != cell.coord.step(dir) {
                    return Err(GridError::MisplacedLink {
                        at: cell.coord,
                        direction: dir,
                        found: other.coord,
                    });
                }
                if other.slot(dir.opposite()) != Some(id) {
                    return Err(GridError::AsymmetricLink {
                        at: cell.coord,
                        direction: dir,
                    });
                }
            }
        }
        Ok(())
    }
}
