use chunkgraph_common::CellCoord;
use slotmap::{SlotMap, new_key_type};

use crate::cell::{CellArena, CellId};
use crate::config::GridConfig;
use crate::delivered::Delivered;
use crate::error::GridError;
use crate::grid::Grid;

new_key_type! {
    /// Handle to a grid registered with a [`GridManager`].
    pub struct GridId;
}

/// Owns one cell arena and every grid drawing from it.
///
/// Routing each grid operation through the manager keeps sibling grids
/// visible to each other, so overlapping regions share cells instead of
/// duplicating coordinates.
#[derive(Debug)]
pub struct GridManager<T> {
    cells: CellArena<T>,
    grids: SlotMap<GridId, Grid>,
    config: GridConfig,
}

impl<T> Default for GridManager<T> {
    fn default() -> Self {
        Self {
            cells: CellArena::new(),
            grids: SlotMap::with_key(),
            config: GridConfig::default(),
        }
    }
}

impl<T> GridManager<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager whose grids all use `config`.
    pub fn with_config(config: GridConfig) -> Result<Self, GridError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Register an uninitialized grid.
    pub fn create_grid(&mut self) -> GridId {
        let id = self.grids.insert(Grid::from_valid(self.config));
        tracing::debug!(?id, grids = self.grids.len(), "grid created");
        id
    }

    /// Clear a grid and drop it from the manager.
    pub fn destroy_grid(&mut self, id: GridId) -> Result<Delivered<T>, GridError> {
        let delivered = self.clear(id)?;
        self.grids.remove(id);
        tracing::debug!(?id, grids = self.grids.len(), "grid destroyed");
        Ok(delivered)
    }

    pub fn grid(&self, id: GridId) -> Option<&Grid> {
        self.grids.get(id)
    }

    pub fn grids(&self) -> impl Iterator<Item = (GridId, &Grid)> {
        self.grids.iter()
    }

    /// Number of registered grids.
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    pub fn cells(&self) -> &CellArena<T> {
        &self.cells
    }

    /// Mutable arena access, for payload handling.
    pub fn cells_mut(&mut self) -> &mut CellArena<T> {
        &mut self.cells
    }

    pub fn init(
        &mut self,
        id: GridId,
        coord: CellCoord,
        radius: i32,
    ) -> Result<Delivered<T>, GridError> {
        self.with_grid(id, |grid, cells, siblings| {
            grid.init(cells, coord, radius, siblings)
        })
    }

    pub fn resize(&mut self, id: GridId, radius: i32) -> Result<Delivered<T>, GridError> {
        self.with_grid(id, |grid, cells, siblings| {
            grid.resize(cells, radius, siblings)
        })
    }

    pub fn increase_radius(&mut self, id: GridId) -> Result<Delivered<T>, GridError> {
        self.with_grid(id, |grid, cells, siblings| {
            grid.increase_radius(cells, siblings)
        })
    }

    pub fn decrease_radius(&mut self, id: GridId) -> Result<Delivered<T>, GridError> {
        self.with_grid(id, |grid, cells, _| grid.decrease_radius(cells))
    }

    pub fn move_to(&mut self, id: GridId, coord: CellCoord) -> Result<Delivered<T>, GridError> {
        self.with_grid(id, |grid, cells, siblings| {
            grid.move_to(cells, coord, siblings)
        })
    }

    pub fn clear(&mut self, id: GridId) -> Result<Delivered<T>, GridError> {
        self.with_grid(id, |grid, cells, _| grid.clear(cells))
    }

    /// Cell at `coord` in any grid, `Ok(None)` when no grid covers it.
    pub fn find_cell(&self, coord: CellCoord) -> Result<Option<CellId>, GridError> {
        for (_, grid) in &self.grids {
            if let Some(found) = grid.find_cell_by_index(&self.cells, coord)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Other grids whose regions overlap grid `id`.
    pub fn colliding_grids(&self, id: GridId) -> Result<Vec<GridId>, GridError> {
        let grid = self.grids.get(id).ok_or(GridError::UnknownGrid(id))?;
        Ok(self
            .grids
            .iter()
            .filter(|(other, g)| *other != id && grid.collides_with(g))
            .map(|(other, _)| other)
            .collect())
    }

    /// Run `op` on grid `id` with every other grid passed as a sibling.
    fn with_grid<R>(
        &mut self,
        id: GridId,
        op: impl FnOnce(&mut Grid, &mut CellArena<T>, &[&Grid]) -> Result<R, GridError>,
    ) -> Result<R, GridError> {
        let slot = self.grids.get_mut(id).ok_or(GridError::UnknownGrid(id))?;
        let mut grid = std::mem::take(slot);

        let siblings: Vec<&Grid> = self
            .grids
            .iter()
            .filter(|(other, _)| *other != id)
            .map(|(_, g)| g)
            .collect();
        let result = op(&mut grid, &mut self.cells, &siblings);

        if let Some(slot) = self.grids.get_mut(id) {
            *slot = grid;
        }
        result
    }
}
