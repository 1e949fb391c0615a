use std::fmt::{self, Write as _};

use chunkgraph_common::{Bounds, CellCoord, Direction};
use chunkgraph_stream::{GridError, GridId, GridManager};
use serde::Serialize;

/// Grid inspector for developer tooling.
///
/// Provides read-only queries against a [`GridManager`] for debugging and
/// command-line output.
pub struct GridInspector;

impl GridInspector {
    /// Produce a summary of the manager and its shared arena.
    pub fn summary<T>(manager: &GridManager<T>) -> ManagerSummary {
        let cells = manager.cells();
        let mut shared_cells = 0;
        let mut stale_slots = 0;
        for (_, cell) in cells.iter() {
            if cell.is_shared() {
                shared_cells += 1;
            }
            stale_slots += Direction::ALL
                .into_iter()
                .filter(|dir| cell.slot(*dir).is_some_and(|n| !cells.contains(n)))
                .count();
        }

        ManagerSummary {
            grids: manager.len(),
            initialized: manager.grids().filter(|(_, g)| g.is_initialized()).count(),
            cells: cells.len(),
            shared_cells,
            stale_slots,
        }
    }

    /// Describe one grid, `None` if the id is unknown.
    pub fn inspect_grid<T>(manager: &GridManager<T>, id: GridId) -> Option<GridInfo> {
        let grid = manager.grid(id)?;
        Some(GridInfo {
            id: format!("{id:?}"),
            root: grid.root_coord(),
            radius: grid.radius(),
            bounds: grid.bounds(),
            cells: grid.bounds().map_or(0, |b| b.area()),
        })
    }

    /// Describe the cell at `coord`, looked up through the grids covering it.
    pub fn inspect_cell<T>(
        manager: &GridManager<T>,
        coord: CellCoord,
    ) -> Result<Option<CellInfo>, GridError> {
        let Some(id) = manager.find_cell(coord)? else {
            return Ok(None);
        };
        let cells = manager.cells();
        Ok(cells.get(id).map(|cell| CellInfo {
            coord: cell.coord(),
            owners: cell.owners(),
            links: Direction::ALL
                .into_iter()
                .filter(|dir| cells.peek_neighbour(id, *dir).is_some())
                .collect(),
            has_payload: cell.payload().is_some(),
        }))
    }

    /// Draw the cells inside `area`, one character per coordinate.
    ///
    /// Rows run from front (max y) to back; columns run from max x to min x so
    /// a grid's LEFT side is drawn on the left. `.` is empty, `@` a grid root,
    /// `#` a cell with one owner and a digit the owner count of a shared cell.
    pub fn render_map<T>(manager: &GridManager<T>, area: Bounds) -> String {
        let cells = manager.cells();
        let roots: Vec<CellCoord> = manager
            .grids()
            .filter_map(|(_, g)| g.root_coord())
            .collect();

        let mut owners = std::collections::HashMap::with_capacity(cells.len());
        for (_, cell) in cells.iter() {
            if area.contains(cell.coord()) {
                owners.insert(cell.coord(), cell.owners());
            }
        }
        tracing::trace!(visible = owners.len(), "rendering grid map");

        let mut out = String::with_capacity(area.area() + area.height() as usize);
        for y in (area.min.y..=area.max.y).rev() {
            for x in (area.min.x..=area.max.x).rev() {
                let coord = CellCoord::new(x, y);
                let glyph = match owners.get(&coord) {
                    None => '.',
                    Some(_) if roots.contains(&coord) => '@',
                    Some(1) => '#',
                    Some(n) => char::from_digit(*n, 10).unwrap_or('+'),
                };
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}

/// Summary of manager state for the inspector.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerSummary {
    pub grids: usize,
    pub initialized: usize,
    pub cells: usize,
    pub shared_cells: usize,
    /// Neighbour slots still naming a reset cell.
    pub stale_slots: usize,
}

impl fmt::Display for ManagerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Manager: grids={} initialized={} cells={} shared={} stale_slots={}",
            self.grids, self.initialized, self.cells, self.shared_cells, self.stale_slots
        )
    }
}

/// Snapshot of a single grid.
#[derive(Debug, Clone, Serialize)]
pub struct GridInfo {
    pub id: String,
    pub root: Option<CellCoord>,
    pub radius: i32,
    pub bounds: Option<Bounds>,
    pub cells: usize,
}

impl fmt::Display for GridInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.root, self.bounds) {
            (Some(root), Some(bounds)) => write!(
                f,
                "Grid [{}] root={} radius={} bounds={} cells={}",
                self.id, root, self.radius, bounds, self.cells
            ),
            _ => write!(f, "Grid [{}] uninitialized", self.id),
        }
    }
}

/// Snapshot of a single cell.
#[derive(Debug, Clone, Serialize)]
pub struct CellInfo {
    pub coord: CellCoord,
    pub owners: u32,
    /// Directions holding a live neighbour.
    pub links: Vec<Direction>,
    pub has_payload: bool,
}

impl fmt::Display for CellInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut links = String::new();
        for (i, dir) in self.links.iter().enumerate() {
            if i > 0 {
                links.push(',');
            }
            let _ = write!(links, "{dir:?}");
        }
        write!(
            f,
            "Cell {} owners={} links=[{}] payload={}",
            self.coord, self.owners, links, self.has_payload
        )
    }
}
