use glam::IVec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

use crate::Direction;

/// Integer coordinate of a cell on the planar grid.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub const ORIGIN: CellCoord = CellCoord { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Coordinate one step away in `dir`.
    pub fn step(self, dir: Direction) -> Self {
        self + dir.offset()
    }

    /// Vector from `self` to `other`.
    pub fn delta(self, other: CellCoord) -> IVec2 {
        IVec2::from(other) - IVec2::from(self)
    }

    /// Chebyshev (king-move) distance.
    pub fn chebyshev(self, other: CellCoord) -> i32 {
        let d = self.delta(other).abs();
        d.x.max(d.y)
    }

    /// Direction from `self` to `other` if the two are 8-adjacent.
    pub fn direction_to(self, other: CellCoord) -> Option<Direction> {
        Direction::from_offset(self.delta(other))
    }
}

impl Add<IVec2> for CellCoord {
    type Output = CellCoord;

    fn add(self, rhs: IVec2) -> CellCoord {
        CellCoord::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl From<IVec2> for CellCoord {
    fn from(v: IVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<CellCoord> for IVec2 {
    fn from(c: CellCoord) -> Self {
        IVec2::new(c.x, c.y)
    }
}

impl From<(i32, i32)> for CellCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Inclusive axis-aligned rectangle of cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub min: CellCoord,
    pub max: CellCoord,
}

impl Bounds {
    /// Build bounds from two corners in any order.
    pub fn new(a: CellCoord, b: CellCoord) -> Self {
        Self {
            min: CellCoord::new(a.x.min(b.x), a.y.min(b.y)),
            max: CellCoord::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Square of cells within Chebyshev distance `reach` of `center`.
    pub fn around(center: CellCoord, reach: i32) -> Self {
        let reach = reach.max(0);
        Self {
            min: CellCoord::new(center.x - reach, center.y - reach),
            max: CellCoord::new(center.x + reach, center.y + reach),
        }
    }

    pub fn contains(&self, c: CellCoord) -> bool {
        c.x >= self.min.x && c.x <= self.max.x && c.y >= self.min.y && c.y <= self.max.y
    }

    /// True when the two rectangles share at least one coordinate.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Smallest bounds covering both rectangles.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: CellCoord::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: CellCoord::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x + 1
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y + 1
    }

    /// Number of coordinates covered.
    pub fn area(&self) -> usize {
        (self.width() as usize) * (self.height() as usize)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.min, self.max)
    }
}
