//! Chunk streaming core: an 8-connected graph of cells kept around movable
//! grid roots.
//!
//! A [`Grid`] covers the `(2r-1) x (2r-1)` square around its root. Moving the
//! root slides the region over the graph, creating cells on the leading edge
//! and resetting them on the trailing edge. Every mutation returns a
//! [`Delivered`] delta so callers can attach or release their own per-cell
//! data. Several grids can draw from one [`CellArena`]; the
//! [`GridManager`] wires them together so overlapping regions share cells.
//!
//! # Invariants
//! - At most one live cell per coordinate in an arena.
//! - Live links are symmetric and point one step away in their direction.
//! - A cell's owner count equals the number of grids covering its coordinate.
//! - Stale handles are detected through the arena, never dereferenced.

mod cell;
mod config;
mod delivered;
mod error;
mod grid;
mod link;
mod manager;

pub use cell::{Cell, CellArena, CellId, Release, Removed};
pub use config::{DEFAULT_MAX_RADIUS, DEFAULT_MIN_RADIUS, GridConfig};
pub use delivered::Delivered;
pub use error::GridError;
pub use grid::Grid;
pub use manager::{GridId, GridManager};

pub use chunkgraph_common::{Bounds, CellCoord, Direction};

pub fn crate_info() -> &'static str {
    "chunkgraph-stream v0.1.0"
}
