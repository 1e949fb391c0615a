//! Value types shared by every chunkgraph crate.
//!
//! # Invariants
//! - `Direction` is a closed domain of the 8 planar compass values.
//! - Coordinates are plain integers; no world-space conversion lives here.

mod direction;
mod types;

pub use direction::Direction;
pub use types::{Bounds, CellCoord};
