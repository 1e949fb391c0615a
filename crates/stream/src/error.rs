use chunkgraph_common::{CellCoord, Direction};

use crate::cell::CellId;
use crate::manager::GridId;

/// Errors from grid and cell-graph operations.
///
/// Recoverable conditions (non-adjacent links, lookups outside a region,
/// out-of-range radii) never show up here; they resolve to neutral results.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("grid is not initialized")]
    NotInitialized,
    #[error("inconsistent cell graph: cell {at} has no {direction:?} neighbour")]
    InconsistentGraph { at: CellCoord, direction: Direction },
    #[error("asymmetric link: cell {at} points {direction:?} but its neighbour does not point back")]
    AsymmetricLink { at: CellCoord, direction: Direction },
    #[error("misplaced link: cell {at} points {direction:?} at a cell located at {found}")]
    MisplacedLink {
        at: CellCoord,
        direction: Direction,
        found: CellCoord,
    },
    #[error("more than one live cell at {0}")]
    DuplicateCell(CellCoord),
    #[error("stale cell handle {0:?}")]
    StaleCell(CellId),
    #[error("unknown grid {0:?}")]
    UnknownGrid(GridId),
    #[error("invalid grid config: {0}")]
    InvalidConfig(String),
}
