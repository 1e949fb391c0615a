use glam::IVec2;
use serde::{Deserialize, Serialize};

/// One of the 8 planar neighbour directions of a cell.
///
/// FRONT/BACK move along +Y/-Y, LEFT/RIGHT move along +X/-X. Diagonals are the
/// sum of their two orthogonal components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Front,
    Back,
    Left,
    Right,
    FrontRight,
    BackRight,
    BackLeft,
    FrontLeft,
}

impl Direction {
    /// All directions in slot order.
    pub const ALL: [Direction; 8] = [
        Direction::Front,
        Direction::Back,
        Direction::Left,
        Direction::Right,
        Direction::FrontRight,
        Direction::BackRight,
        Direction::BackLeft,
        Direction::FrontLeft,
    ];

    /// The four axis-aligned directions, in the order grids grow and shrink.
    pub const CARDINAL: [Direction; 4] = [
        Direction::Front,
        Direction::Back,
        Direction::Left,
        Direction::Right,
    ];

    /// Slot index of this direction inside a neighbour table.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Coordinate delta of one step in this direction.
    pub fn offset(self) -> IVec2 {
        match self {
            Direction::Front => IVec2::new(0, 1),
            Direction::Back => IVec2::new(0, -1),
            Direction::Left => IVec2::new(1, 0),
            Direction::Right => IVec2::new(-1, 0),
            Direction::FrontRight => IVec2::new(-1, 1),
            Direction::BackRight => IVec2::new(-1, -1),
            Direction::BackLeft => IVec2::new(1, -1),
            Direction::FrontLeft => IVec2::new(1, 1),
        }
    }

    /// Direction matching a unit delta, or `None` when the delta is zero or
    /// longer than one step on either axis.
    pub fn from_offset(delta: IVec2) -> Option<Direction> {
        match (delta.x, delta.y) {
            (0, 1) => Some(Direction::Front),
            (0, -1) => Some(Direction::Back),
            (1, 0) => Some(Direction::Left),
            (-1, 0) => Some(Direction::Right),
            (-1, 1) => Some(Direction::FrontRight),
            (-1, -1) => Some(Direction::BackRight),
            (1, -1) => Some(Direction::BackLeft),
            (1, 1) => Some(Direction::FrontLeft),
            _ => None,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Front => Direction::Back,
            Direction::Back => Direction::Front,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::FrontRight => Direction::BackLeft,
            Direction::BackRight => Direction::FrontLeft,
            Direction::BackLeft => Direction::FrontRight,
            Direction::FrontLeft => Direction::BackRight,
        }
    }

    /// Next direction clockwise (looking down on the grid with FRONT up).
    pub fn cw(self) -> Direction {
        match self {
            Direction::Front => Direction::FrontRight,
            Direction::FrontRight => Direction::Right,
            Direction::Right => Direction::BackRight,
            Direction::BackRight => Direction::Back,
            Direction::Back => Direction::BackLeft,
            Direction::BackLeft => Direction::Left,
            Direction::Left => Direction::FrontLeft,
            Direction::FrontLeft => Direction::Front,
        }
    }

    /// Next direction counterclockwise.
    pub fn ccw(self) -> Direction {
        match self {
            Direction::Front => Direction::FrontLeft,
            Direction::FrontLeft => Direction::Left,
            Direction::Left => Direction::BackLeft,
            Direction::BackLeft => Direction::Back,
            Direction::Back => Direction::BackRight,
            Direction::BackRight => Direction::Right,
            Direction::Right => Direction::FrontRight,
            Direction::FrontRight => Direction::Front,
        }
    }

    pub fn is_cardinal(self) -> bool {
        matches!(
            self,
            Direction::Front | Direction::Back | Direction::Left | Direction::Right
        )
    }

    /// Splits a diagonal into its (vertical, horizontal) components.
    /// Cardinal directions return `None`.
    pub fn components(self) -> Option<(Direction, Direction)> {
        match self {
            Direction::FrontRight => Some((Direction::Front, Direction::Right)),
            Direction::BackRight => Some((Direction::Back, Direction::Right)),
            Direction::BackLeft => Some((Direction::Back, Direction::Left)),
            Direction::FrontLeft => Some((Direction::Front, Direction::Left)),
            _ => None,
        }
    }
}
