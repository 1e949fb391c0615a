//! Linking and meshing of cells inside a [`CellArena`].
//!
//! Links are merged "first writer wins": a slot that already names a live
//! cell is never overwritten. Callers create a whole batch of cells first and
//! mesh them afterwards; meshing while the batch is incomplete misses links.

use chunkgraph_common::Direction;

use crate::cell::{CellArena, CellId};

impl<T> CellArena<T> {
    /// Link two 8-adjacent live cells in both directions.
    ///
    /// Returns false for stale or non-adjacent cells, and when either side
    /// already holds a different live cell in the matching slot.
    pub fn link(&mut self, a: CellId, b: CellId) -> bool {
        let (Some(from), Some(to)) = (self.coord(a), self.coord(b)) else {
            return false;
        };
        let Some(dir) = from.direction_to(to) else {
            return false;
        };
        let back = dir.opposite();

        if self.neighbour(a, dir).is_none() {
            self.set_neighbour(a, dir, Some(b));
        }
        if self.neighbour(b, back).is_none() {
            self.set_neighbour(b, back, Some(a));
        }

        self.peek_neighbour(a, dir) == Some(b) && self.peek_neighbour(b, back) == Some(a)
    }

    /// Mesh `id` into its local 8-neighbourhood.
    ///
    /// Every neighbour-of-a-neighbour adjacent to `id` gets linked to it,
    /// repeated until no new neighbour shows up; then adjacent pairs among
    /// the final neighbours are linked to each other.
    pub fn link_neighbours(&mut self, id: CellId) -> bool {
        let Some(origin) = self.coord(id) else {
            return false;
        };

        let mut known = self.live_neighbours(id);
        loop {
            for &nb in &known {
                for dir in Direction::ALL {
                    let Some(candidate) = self.neighbour(nb, dir) else {
                        continue;
                    };
                    if candidate == id {
                        continue;
                    }
                    let adjacent = self
                        .coord(candidate)
                        .and_then(|c| origin.direction_to(c))
                        .is_some();
                    if adjacent {
                        self.link(id, candidate);
                    }
                }
            }

            let grown = self.live_neighbours(id);
            if grown.len() == known.len() {
                break;
            }
            known = grown;
        }

        for (i, &a) in known.iter().enumerate() {
            for &b in &known[i + 1..] {
                self.link(a, b);
            }
        }
        true
    }

    /// Allocate a cell one step from `id` in `dir` and link the two.
    pub fn make_neighbour(&mut self, id: CellId, dir: Direction) -> Option<CellId> {
        let coord = self.coord(id)?.step(dir);
        let created = self.make_cell(coord);
        self.link(id, created);
        Some(created)
    }

    /// Fill every empty slot of `id` with a new cell, then mesh the batch.
    ///
    /// Does not look for existing unlinked cells at those coordinates.
    pub fn make_neighbours(&mut self, id: CellId) -> Vec<CellId> {
        if !self.contains(id) {
            return Vec::new();
        }

        let mut created = Vec::new();
        for dir in Direction::ALL {
            if self.neighbour(id, dir).is_some() {
                continue;
            }
            if let Some(n) = self.make_neighbour(id, dir) {
                created.push(n);
            }
        }

        for &n in &created {
            self.link_neighbours(n);
        }
        created
    }
}
