//! Developer tooling: read-only views over a grid manager for debugging and
//! the CLI.
//!
//! # Invariants
//! - Inspection never mutates the cell graph or heals stale slots.

mod inspector;

pub use inspector::{CellInfo, GridInfo, GridInspector, ManagerSummary};

pub fn crate_info() -> &'static str {
    "chunkgraph-tools v0.1.0"
}
