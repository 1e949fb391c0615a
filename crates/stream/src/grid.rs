use chunkgraph_common::{Bounds, CellCoord, Direction};
use glam::IVec2;

use crate::cell::{CellArena, CellId, Release};
use crate::config::GridConfig;
use crate::delivered::Delivered;
use crate::error::GridError;

/// One of the four edges of a grid region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Front,
    Back,
    Left,
    Right,
}

impl Side {
    const ALL: [Side; 4] = [Side::Front, Side::Back, Side::Left, Side::Right];

    fn of(dir: Direction) -> Option<Side> {
        match dir {
            Direction::Front => Some(Side::Front),
            Direction::Back => Some(Side::Back),
            Direction::Left => Some(Side::Left),
            Direction::Right => Some(Side::Right),
            _ => None,
        }
    }

    /// The sides to walk to reach `dir`: one for a cardinal direction, the
    /// vertical then the horizontal one for a diagonal.
    fn legs(dir: Direction) -> (Side, Option<Side>) {
        match dir {
            Direction::Front => (Side::Front, None),
            Direction::Back => (Side::Back, None),
            Direction::Left => (Side::Left, None),
            Direction::Right => (Side::Right, None),
            Direction::FrontRight => (Side::Front, Some(Side::Right)),
            Direction::BackRight => (Side::Back, Some(Side::Right)),
            Direction::BackLeft => (Side::Back, Some(Side::Left)),
            Direction::FrontLeft => (Side::Front, Some(Side::Left)),
        }
    }

    fn direction(self) -> Direction {
        match self {
            Side::Front => Direction::Front,
            Side::Back => Direction::Back,
            Side::Left => Direction::Left,
            Side::Right => Direction::Right,
        }
    }

    fn opposite(self) -> Side {
        match self {
            Side::Front => Side::Back,
            Side::Back => Side::Front,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// How far the occupied region reaches from the root towards each side.
///
/// A settled grid of radius `r` has every extent at `r - 1`. Extents differ
/// only after a single-sided expand/narrow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Extents {
    front: i32,
    back: i32,
    left: i32,
    right: i32,
}

impl Extents {
    fn get(&self, side: Side) -> i32 {
        match side {
            Side::Front => self.front,
            Side::Back => self.back,
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    fn add(&mut self, side: Side, amount: i32) {
        match side {
            Side::Front => self.front += amount,
            Side::Back => self.back += amount,
            Side::Left => self.left += amount,
            Side::Right => self.right += amount,
        }
    }

    /// The root moved one cell towards `side`.
    fn shift(&mut self, side: Side) {
        self.add(side, -1);
        self.add(side.opposite(), 1);
    }
}

/// A border resolved ahead of an expansion: each edge cell paired with the
/// sibling cell already covering the coordinate beyond it, if any.
type Plan = Vec<(CellId, Option<CellId>)>;

/// A square region of cells kept around a movable root.
///
/// A grid only holds handles; the cells live in a [`CellArena`] that every
/// operation receives explicitly. Operations that may grow the region also
/// take the sibling grids sharing that arena, so a coordinate already held by
/// a sibling is shared instead of duplicated.
///
/// Composite operations check the regions they are about to walk first, so a
/// broken graph fails them before anything is mutated.
#[derive(Debug)]
pub struct Grid {
    root: Option<CellId>,
    root_coord: CellCoord,
    radius: i32,
    extents: Extents,
    config: GridConfig,
}

impl Default for Grid {
    fn default() -> Self {
        Self::from_valid(GridConfig::default())
    }
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a grid with custom radius limits. Fails on limits that
    /// [`GridConfig::validate`] rejects.
    pub fn with_config(config: GridConfig) -> Result<Self, GridError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    /// Caller guarantees `config` has been validated.
    pub(crate) fn from_valid(config: GridConfig) -> Self {
        Self {
            root: None,
            root_coord: CellCoord::ORIGIN,
            radius: 1,
            extents: Extents::default(),
            config,
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.root.is_some()
    }

    pub fn root(&self) -> Option<CellId> {
        self.root
    }

    pub fn root_coord(&self) -> Option<CellCoord> {
        self.root.map(|_| self.root_coord)
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Coordinates covered by the region, `None` before `init`.
    pub fn bounds(&self) -> Option<Bounds> {
        self.root?;
        let e = self.extents;
        Some(Bounds {
            min: CellCoord::new(self.root_coord.x - e.right, self.root_coord.y - e.back),
            max: CellCoord::new(self.root_coord.x + e.left, self.root_coord.y + e.front),
        })
    }

    /// True when both grids are initialized and their regions share a cell.
    pub fn collides_with(&self, other: &Grid) -> bool {
        match (self.bounds(), other.bounds()) {
            (Some(a), Some(b)) => a.intersects(&b),
            _ => false,
        }
    }

    /// Walk from the root to the far edge (cardinal `dir`) or to the corner
    /// (diagonal `dir`, vertical leg first).
    pub fn find_last<T>(&self, cells: &CellArena<T>, dir: Direction) -> Result<CellId, GridError> {
        let root = self.root.ok_or(GridError::NotInitialized)?;
        let (first, second) = Side::legs(dir);
        let mut at = walk(cells, root, first.direction(), self.extents.get(first))?;
        if let Some(second) = second {
            at = walk(cells, at, second.direction(), self.extents.get(second))?;
        }
        Ok(at)
    }

    /// Cells along the outer edge facing `side`.
    ///
    /// FRONT runs from the front-right corner towards LEFT, BACK from the
    /// back-left corner towards RIGHT, LEFT from the back-left corner towards
    /// FRONT and RIGHT from the front-right corner towards BACK. Diagonal
    /// sides select nothing.
    pub fn select_border<T>(
        &self,
        cells: &CellArena<T>,
        side: Direction,
    ) -> Result<Vec<CellId>, GridError> {
        match Side::of(side) {
            Some(side) => self.border(cells, side),
            None => Ok(Vec::new()),
        }
    }

    /// Look up the cell at `coord` by walking from the root, X axis first.
    ///
    /// `Ok(None)` outside the region or before `init`.
    pub fn find_cell_by_index<T>(
        &self,
        cells: &CellArena<T>,
        coord: CellCoord,
    ) -> Result<Option<CellId>, GridError> {
        let (Some(root), Some(bounds)) = (self.root, self.bounds()) else {
            return Ok(None);
        };
        if !bounds.contains(coord) {
            return Ok(None);
        }

        let delta = self.root_coord.delta(coord);
        let horizontal = if delta.x > 0 { Direction::Left } else { Direction::Right };
        let vertical = if delta.y > 0 { Direction::Front } else { Direction::Back };
        let at = walk(cells, root, horizontal, delta.x.abs())?;
        walk(cells, at, vertical, delta.y.abs()).map(Some)
    }

    /// Every cell of the region, column by column from the front edge.
    pub fn collect_cells<T>(&self, cells: &CellArena<T>) -> Result<Vec<CellId>, GridError> {
        if self.root.is_none() {
            return Ok(Vec::new());
        }
        let depth = self.extents.front + self.extents.back;
        let top = self.border(cells, Side::Front)?;

        let mut region = Vec::with_capacity(top.len() * (depth as usize + 1));
        for mut at in top {
            region.push(at);
            for _ in 0..depth {
                at = walk(cells, at, Direction::Back, 1)?;
                region.push(at);
            }
        }
        Ok(region)
    }

    /// Check that every cell of the region links to each of its cardinal
    /// neighbours inside the region. Uninitialized grids pass.
    pub fn verify_region<T>(&self, cells: &CellArena<T>) -> Result<(), GridError> {
        let Some(bounds) = self.bounds() else {
            return Ok(());
        };
        for id in self.collect_cells(cells)? {
            let at = cells.coord(id).ok_or(GridError::StaleCell(id))?;
            for side in Side::ALL {
                let dir = side.direction();
                if bounds.contains(at.step(dir)) && cells.peek_neighbour(id, dir).is_none() {
                    return Err(GridError::InconsistentGraph { at, direction: dir });
                }
            }
        }
        Ok(())
    }

    /// Create the root at `coord` and grow to `radius`. No-op once initialized.
    pub fn init<T>(
        &mut self,
        cells: &mut CellArena<T>,
        coord: CellCoord,
        radius: i32,
        siblings: &[&Grid],
    ) -> Result<Delivered<T>, GridError> {
        if self.root.is_some() {
            return Ok(Delivered::default());
        }

        let target = self.config.clamp_radius(radius);
        let _span = tracing::debug_span!("grid_init", x = coord.x, y = coord.y, radius = target)
            .entered();

        let colliding = colliding_siblings(siblings, Bounds::around(coord, target - 1));
        verify_all(cells, &colliding)?;
        self.place(cells, coord, target, &colliding)
    }

    /// Grow or shrink one radius unit at a time until the clamped target is
    /// reached. Growth expands FRONT, BACK, LEFT, RIGHT; shrinking narrows
    /// in the same order.
    pub fn resize<T>(
        &mut self,
        cells: &mut CellArena<T>,
        radius: i32,
        siblings: &[&Grid],
    ) -> Result<Delivered<T>, GridError> {
        if self.root.is_none() {
            return Err(GridError::NotInitialized);
        }
        let target = self.config.clamp_radius(radius);
        let _span = tracing::debug_span!("grid_resize", from = self.radius, to = target).entered();

        let colliding = colliding_siblings(siblings, Bounds::around(self.root_coord, target - 1));
        self.verify_region(cells)?;
        verify_all(cells, &colliding)?;
        self.resize_checked(cells, target, &colliding)
    }

    pub fn increase_radius<T>(
        &mut self,
        cells: &mut CellArena<T>,
        siblings: &[&Grid],
    ) -> Result<Delivered<T>, GridError> {
        self.resize(cells, self.radius + 1, siblings)
    }

    pub fn decrease_radius<T>(
        &mut self,
        cells: &mut CellArena<T>,
    ) -> Result<Delivered<T>, GridError> {
        self.resize(cells, self.radius - 1, &[])
    }

    /// Push the `dir` edge out by one cell, creating every new cell.
    pub fn expand<T>(
        &mut self,
        cells: &mut CellArena<T>,
        dir: Direction,
    ) -> Result<Delivered<T>, GridError> {
        self.expand_shared(cells, dir, &[])
    }

    /// Push the `dir` edge out by one cell. Target coordinates already held
    /// by a sibling are shared (linked in, owner count raised) and are not
    /// reported as created.
    ///
    /// Diagonal directions and edges already at the radius limit leave the
    /// grid untouched.
    pub fn expand_shared<T>(
        &mut self,
        cells: &mut CellArena<T>,
        dir: Direction,
        siblings: &[&Grid],
    ) -> Result<Delivered<T>, GridError> {
        if self.root.is_none() {
            return Err(GridError::NotInitialized);
        }
        let Some(side) = Side::of(dir) else {
            return Ok(Delivered::default());
        };
        if self.extents.get(side) >= self.config.max_radius - 1 {
            return Ok(Delivered::default());
        }

        let plan = self.plan_expansion(cells, side, siblings)?;
        Ok(self.apply_expansion(cells, side, plan))
    }

    /// Pull the `dir` edge in by one cell.
    ///
    /// Shared edge cells only lose this grid as an owner; the rest are reset
    /// and their payloads moved into `deleted`. The root row cannot be
    /// narrowed away.
    pub fn narrow_down<T>(
        &mut self,
        cells: &mut CellArena<T>,
        dir: Direction,
    ) -> Result<Delivered<T>, GridError> {
        if self.root.is_none() {
            return Err(GridError::NotInitialized);
        }
        let Some(side) = Side::of(dir) else {
            return Ok(Delivered::default());
        };
        if self.extents.get(side) == 0 {
            return Ok(Delivered::default());
        }

        let border = self.border(cells, side)?;
        self.release_border(cells, side, border)
    }

    /// Re-center the grid on `coord`, keeping its radius.
    ///
    /// Shifts up to the radius on both axes slide the grid one cell at a
    /// time (X fully before Y), narrowing the trailing edge before expanding
    /// the leading one. Longer shifts, and any move of a radius-1 grid,
    /// rebuild the grid at the target instead.
    pub fn move_to<T>(
        &mut self,
        cells: &mut CellArena<T>,
        coord: CellCoord,
        siblings: &[&Grid],
    ) -> Result<Delivered<T>, GridError> {
        let Some(current) = self.bounds() else {
            return Err(GridError::NotInitialized);
        };
        let mut delivered = Delivered::default();
        if coord == self.root_coord {
            return Ok(delivered);
        }

        let radius = self.radius;
        let delta = self.root_coord.delta(coord);
        let _span =
            tracing::debug_span!("grid_move", from = %self.root_coord, to = %coord, radius).entered();

        let target = Bounds::around(coord, radius - 1);
        let colliding = colliding_siblings(siblings, current.union(&target));
        self.verify_region(cells)?;
        verify_all(cells, &colliding)?;

        if is_teleport(delta, radius) {
            tracing::debug!("shift exceeds radius, rebuilding grid at target");
            delivered += self.clear(cells)?;
            let colliding = colliding_siblings(&colliding, target);
            delivered += self.place(cells, coord, radius, &colliding)?;
        } else {
            tracing::trace!(collisions = colliding.len(), "stepping grid");
            let axes = [
                (delta.x, Side::Left, Side::Right),
                (delta.y, Side::Front, Side::Back),
            ];
            for (amount, positive, negative) in axes {
                let side = if amount > 0 { positive } else { negative };
                for _ in 0..amount.abs() {
                    delivered += self.step(cells, side, &colliding)?;
                }
            }
        }

        delivered.retain_live(cells);
        Ok(delivered)
    }

    /// Release every cell of the region and return to the uninitialized
    /// state with radius 1. Cells shared with another grid survive.
    pub fn clear<T>(&mut self, cells: &mut CellArena<T>) -> Result<Delivered<T>, GridError> {
        let mut delivered = Delivered::default();
        if self.root.is_none() {
            return Ok(delivered);
        }

        let region = self.collect_cells(cells)?;
        tracing::debug!(cells = region.len(), "clearing grid");
        release_all(cells, region, &mut delivered);

        self.root = None;
        self.radius = 1;
        self.extents = Extents::default();
        Ok(delivered)
    }

    /// Root creation (or sharing) plus growth, on regions already verified.
    fn place<T>(
        &mut self,
        cells: &mut CellArena<T>,
        coord: CellCoord,
        target: i32,
        colliding: &[&Grid],
    ) -> Result<Delivered<T>, GridError> {
        let mut delivered = Delivered::default();
        let root = match find_in(cells, colliding, coord)? {
            Some(shared) => {
                let owners = cells.share(shared)?;
                tracing::debug!(%coord, owners, "sharing root cell");
                shared
            }
            None => {
                let created = cells.make_cell(coord);
                delivered.created.push(created);
                created
            }
        };

        self.root = Some(root);
        self.root_coord = coord;
        self.radius = 1;
        self.extents = Extents::default();

        delivered += self.resize_checked(cells, target, colliding)?;
        Ok(delivered)
    }

    fn resize_checked<T>(
        &mut self,
        cells: &mut CellArena<T>,
        target: i32,
        colliding: &[&Grid],
    ) -> Result<Delivered<T>, GridError> {
        let mut delivered = Delivered::default();
        while self.radius < target {
            for side in Side::ALL {
                let plan = self.plan_expansion(cells, side, colliding)?;
                delivered += self.apply_expansion(cells, side, plan);
            }
            self.radius += 1;
        }
        while self.radius > target {
            for side in Side::ALL {
                let border = self.border(cells, side)?;
                delivered += self.release_border(cells, side, border)?;
            }
            self.radius -= 1;
        }

        delivered.retain_live(cells);
        Ok(delivered)
    }

    /// Move the root one cell towards `side`, narrowing the trailing edge and
    /// expanding the leading one. Both edges are resolved before anything
    /// changes, so a failed step leaves the grid where it was.
    fn step<T>(
        &mut self,
        cells: &mut CellArena<T>,
        side: Side,
        siblings: &[&Grid],
    ) -> Result<Delivered<T>, GridError> {
        let root = self.root.ok_or(GridError::NotInitialized)?;
        let next = walk(cells, root, side.direction(), 1)?;
        let trailing = self.border(cells, side.opposite())?;
        let leading = self.plan_expansion(cells, side, siblings)?;

        self.root = Some(next);
        self.root_coord = self.root_coord.step(side.direction());
        self.extents.shift(side);

        let mut delivered = self.release_border(cells, side.opposite(), trailing)?;
        delivered += self.apply_expansion(cells, side, leading);
        Ok(delivered)
    }

    fn border<T>(&self, cells: &CellArena<T>, side: Side) -> Result<Vec<CellId>, GridError> {
        let (corner, along) = match side {
            Side::Front => (Direction::FrontRight, Side::Left),
            Side::Back => (Direction::BackLeft, Side::Right),
            Side::Left => (Direction::BackLeft, Side::Front),
            Side::Right => (Direction::FrontRight, Side::Back),
        };
        let length = self.extents.get(along) + self.extents.get(along.opposite()) + 1;

        let mut at = self.find_last(cells, corner)?;
        let mut border = Vec::with_capacity(length as usize);
        border.push(at);
        for _ in 1..length {
            at = walk(cells, at, along.direction(), 1)?;
            border.push(at);
        }
        Ok(border)
    }

    fn plan_expansion<T>(
        &self,
        cells: &CellArena<T>,
        side: Side,
        siblings: &[&Grid],
    ) -> Result<Plan, GridError> {
        let border = self.border(cells, side)?;
        let mut plan = Vec::with_capacity(border.len());
        for anchor in border {
            let coord = cells.coord(anchor).ok_or(GridError::StaleCell(anchor))?;
            plan.push((anchor, find_in(cells, siblings, coord.step(side.direction()))?));
        }
        Ok(plan)
    }

    /// Share or create the cell beyond every planned edge cell, then mesh the
    /// whole batch.
    fn apply_expansion<T>(
        &mut self,
        cells: &mut CellArena<T>,
        side: Side,
        plan: Plan,
    ) -> Delivered<T> {
        let dir = side.direction();
        let mut delivered = Delivered::default();
        let mut batch = Vec::with_capacity(plan.len());
        for (anchor, existing) in plan {
            match existing.filter(|id| cells.contains(*id)) {
                Some(shared) => {
                    if let Ok(owners) = cells.share(shared) {
                        tracing::trace!(?dir, owners, "sharing sibling cell");
                    }
                    cells.link(anchor, shared);
                    batch.push(shared);
                }
                None => {
                    if let Some(created) = cells.make_neighbour(anchor, dir) {
                        delivered.created.push(created);
                        batch.push(created);
                    }
                }
            }
        }
        for &id in &batch {
            cells.link_neighbours(id);
        }

        self.extents.add(side, 1);
        delivered
    }

    fn release_border<T>(
        &mut self,
        cells: &mut CellArena<T>,
        side: Side,
        border: Vec<CellId>,
    ) -> Result<Delivered<T>, GridError> {
        let mut delivered = Delivered::default();
        release_all(cells, border, &mut delivered);
        self.extents.add(side, -1);
        Ok(delivered)
    }
}

fn is_teleport(delta: IVec2, radius: i32) -> bool {
    radius == 1 || delta.x.abs() > radius || delta.y.abs() > radius
}

/// Follow `dir` links for `steps` cells. A missing link inside a region is a
/// broken graph, never a short region.
fn walk<T>(
    cells: &CellArena<T>,
    from: CellId,
    dir: Direction,
    steps: i32,
) -> Result<CellId, GridError> {
    let mut at = from;
    for _ in 0..steps {
        at = cells
            .peek_neighbour(at, dir)
            .ok_or_else(|| GridError::InconsistentGraph {
                at: cells.coord(at).unwrap_or_default(),
                direction: dir,
            })?;
    }
    Ok(at)
}

/// Siblings whose region intersects `area`.
fn colliding_siblings<'a>(siblings: &[&'a Grid], area: Bounds) -> Vec<&'a Grid> {
    siblings
        .iter()
        .copied()
        .filter(|g| g.bounds().is_some_and(|b| b.intersects(&area)))
        .collect()
}

fn verify_all<T>(cells: &CellArena<T>, grids: &[&Grid]) -> Result<(), GridError> {
    grids.iter().try_for_each(|g| g.verify_region(cells))
}

fn find_in<T>(
    cells: &CellArena<T>,
    siblings: &[&Grid],
    coord: CellCoord,
) -> Result<Option<CellId>, GridError> {
    for grid in siblings {
        if let Some(found) = grid.find_cell_by_index(cells, coord)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Release each cell once; destroyed payloads go to `delivered`, and the
/// live neighbours of destroyed cells get their stale slots cleared. Cells
/// already gone are skipped.
fn release_all<T>(cells: &mut CellArena<T>, ids: Vec<CellId>, delivered: &mut Delivered<T>) {
    let mut touched = Vec::new();
    for id in ids {
        match cells.release(id) {
            Ok(Release::Shared(owners)) => {
                tracing::trace!(owners, "kept shared cell");
            }
            Ok(Release::Destroyed(removed)) => {
                touched.extend(removed.neighbours);
                delivered.deleted.extend(removed.payload);
            }
            Err(_) => {}
        }
    }
    for id in touched {
        cells.heal(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords<T>(cells: &CellArena<T>, ids: &[CellId]) -> Vec<CellCoord> {
        ids.iter().map(|id| cells.coord(*id).unwrap()).collect()
    }

    fn sorted(mut v: Vec<CellCoord>) -> Vec<CellCoord> {
        v.sort();
        v
    }

    fn grid_at<T>(cells: &mut CellArena<T>, coord: CellCoord, radius: i32) -> Grid {
        let mut grid = Grid::new();
        grid.init(cells, coord, radius, &[]).unwrap();
        grid
    }

    #[test]
    fn init_single_cell() {
        let mut cells: CellArena<()> = CellArena::new();
        let mut grid = Grid::new();
        let delivered = grid.init(&mut cells, CellCoord::ORIGIN, 1, &[]).unwrap();

        assert_eq!(delivered.created.len(), 1);
        assert_eq!(cells.len(), 1);
        assert_eq!(grid.radius(), 1);
        assert_eq!(grid.root_coord(), Some(CellCoord::ORIGIN));
        assert_eq!(grid.root(), delivered.created.first().copied());
    }

    #[test]
    fn init_twice_is_a_no_op() {
        let mut cells: CellArena<()> = CellArena::new();
        let mut grid = grid_at(&mut cells, CellCoord::ORIGIN, 2);
        let again = grid.init(&mut cells, CellCoord::new(5, 5), 3, &[]).unwrap();
        assert!(again.is_empty());
        assert_eq!(grid.root_coord(), Some(CellCoord::ORIGIN));
        assert_eq!(grid.radius(), 2);
    }

    #[test]
    fn resize_to_two_builds_three_by_three() {
        let mut cells: CellArena<()> = CellArena::new();
        let mut grid = grid_at(&mut cells, CellCoord::ORIGIN, 1);
        let delivered = grid.resize(&mut cells, 2, &[]).unwrap();

        assert_eq!(delivered.created.len(), 8);
        assert_eq!(cells.len(), 9);
        assert_eq!(grid.radius(), 2);

        let root = grid.root().unwrap();
        for dir in Direction::ALL {
            let n = cells.peek_neighbour(root, dir).unwrap();
            assert_eq!(cells.coord(n), Some(CellCoord::ORIGIN.step(dir)));
        }

        let front = grid.select_border(&cells, Direction::Front).unwrap();
        assert_eq!(
            coords(&cells, &front),
            vec![CellCoord::new(-1, 1), CellCoord::new(0, 1), CellCoord::new(1, 1)]
        );
        cells.verify_links().unwrap();
    }

    #[test]
    fn borders_have_two_r_minus_one_cells() {
        let mut cells: CellArena<()> = CellArena::new();
        let grid = grid_at(&mut cells, CellCoord::new(3, -2), 5);
        assert_eq!(cells.len(), 81);
        for side in Direction::CARDINAL {
            assert_eq!(grid.select_border(&cells, side).unwrap().len(), 9);
        }
        assert!(grid.select_border(&cells, Direction::BackLeft).unwrap().is_empty());

        let back = grid.select_border(&cells, Direction::Back).unwrap();
        assert_eq!(cells.coord(back[0]), Some(CellCoord::new(7, -6)));
        assert_eq!(cells.coord(back[8]), Some(CellCoord::new(-1, -6)));

        let left = grid.select_border(&cells, Direction::Left).unwrap();
        assert_eq!(cells.coord(left[0]), Some(CellCoord::new(7, -6)));
        assert_eq!(cells.coord(left[8]), Some(CellCoord::new(7, 2)));
    }

    #[test]
    fn find_last_reaches_every_corner() {
        let mut cells: CellArena<()> = CellArena::new();
        let grid = grid_at(&mut cells, CellCoord::ORIGIN, 3);
        let corner = |dir| cells.coord(grid.find_last(&cells, dir).unwrap()).unwrap();

        assert_eq!(corner(Direction::FrontRight), CellCoord::new(-2, 2));
        assert_eq!(corner(Direction::FrontLeft), CellCoord::new(2, 2));
        assert_eq!(corner(Direction::BackRight), CellCoord::new(-2, -2));
        assert_eq!(corner(Direction::BackLeft), CellCoord::new(2, -2));
        assert_eq!(corner(Direction::Front), CellCoord::new(0, 2));
        assert_eq!(corner(Direction::Right), CellCoord::new(-2, 0));
    }

    #[test]
    fn radius_clamps_to_limits() {
        let mut cells: CellArena<()> = CellArena::new();
        let mut grid = grid_at(&mut cells, CellCoord::ORIGIN, 0);
        assert_eq!(grid.radius(), 1);

        grid.resize(&mut cells, 40, &[]).unwrap();
        assert_eq!(grid.radius(), 16);
        assert_eq!(cells.len(), 31 * 31);

        grid.resize(&mut cells, -3, &[]).unwrap();
        assert_eq!(grid.radius(), 1);
        assert_eq!(cells.len(), 1);
    }

    #[test]
    fn config_limits_apply() {
        let mut cells: CellArena<()> = CellArena::new();
        let config = GridConfig {
            min_radius: 2,
            max_radius: 3,
        };
        let mut grid = Grid::with_config(config).unwrap();
        grid.init(&mut cells, CellCoord::ORIGIN, 1, &[]).unwrap();
        assert_eq!(grid.radius(), 2);
        grid.increase_radius(&mut cells, &[]).unwrap();
        grid.increase_radius(&mut cells, &[]).unwrap();
        assert_eq!(grid.radius(), 3);
        assert_eq!(cells.len(), 25);
    }

    #[test]
    fn shrink_reports_payloads() {
        let mut cells: CellArena<CellCoord> = CellArena::new();
        let mut grid = Grid::new();
        let delivered = grid.init(&mut cells, CellCoord::ORIGIN, 3, &[]).unwrap();
        for id in delivered.created {
            let coord = cells.coord(id).unwrap();
            cells.attach(id, coord).unwrap();
        }

        let shrunk = grid.decrease_radius(&mut cells).unwrap();
        assert!(shrunk.created.is_empty());
        assert_eq!(shrunk.deleted.len(), 16);
        assert!(shrunk.deleted.iter().all(|c| c.chebyshev(CellCoord::ORIGIN) == 2));
        assert_eq!(cells.len(), 9);
        cells.verify_links().unwrap();
    }

    #[test]
    fn operations_before_init_fail() {
        let mut cells: CellArena<()> = CellArena::new();
        let mut grid = Grid::new();
        assert_eq!(
            grid.resize(&mut cells, 3, &[]).unwrap_err(),
            GridError::NotInitialized
        );
        assert_eq!(
            grid.move_to(&mut cells, CellCoord::new(1, 1), &[]).unwrap_err(),
            GridError::NotInitialized
        );
        assert!(grid.clear(&mut cells).unwrap().is_empty());
        assert_eq!(grid.find_cell_by_index(&cells, CellCoord::ORIGIN), Ok(None));
        assert!(grid.bounds().is_none());
    }

    #[test]
    fn find_cell_by_index_walks_the_region() {
        let mut cells: CellArena<()> = CellArena::new();
        let grid = grid_at(&mut cells, CellCoord::new(10, 10), 3);
        for x in 8..=12 {
            for y in 8..=12 {
                let coord = CellCoord::new(x, y);
                let found = grid.find_cell_by_index(&cells, coord).unwrap().unwrap();
                assert_eq!(cells.coord(found), Some(coord));
            }
        }
        assert_eq!(grid.find_cell_by_index(&cells, CellCoord::new(13, 10)), Ok(None));
        assert_eq!(grid.find_cell_by_index(&cells, CellCoord::new(10, 7)), Ok(None));
    }

    #[test]
    fn broken_chain_is_reported() {
        let mut cells: CellArena<()> = CellArena::new();
        let grid = grid_at(&mut cells, CellCoord::ORIGIN, 2);
        let root = grid.root().unwrap();
        let front = cells.peek_neighbour(root, Direction::Front).unwrap();
        cells.set_neighbour(root, Direction::Front, None);

        let err = grid.select_border(&cells, Direction::Front).unwrap_err();
        assert_eq!(
            err,
            GridError::InconsistentGraph {
                at: CellCoord::ORIGIN,
                direction: Direction::Front,
            }
        );
        assert!(grid.find_cell_by_index(&cells, CellCoord::new(0, 1)).is_err());
        assert!(cells.contains(front));
    }

    #[test]
    fn move_to_current_root_is_a_no_op() {
        let mut cells: CellArena<()> = CellArena::new();
        let mut grid = grid_at(&mut cells, CellCoord::new(2, 2), 3);
        let before: Vec<CellId> = grid.collect_cells(&cells).unwrap();

        let delivered = grid.move_to(&mut cells, CellCoord::new(2, 2), &[]).unwrap();
        assert!(delivered.is_empty());
        assert_eq!(grid.collect_cells(&cells).unwrap(), before);
        assert_eq!(cells.len(), 25);
    }

    #[test]
    fn move_one_step_slides_the_grid() {
        let mut cells: CellArena<CellCoord> = CellArena::new();
        let mut grid = Grid::new();
        grid.init(&mut cells, CellCoord::ORIGIN, 1, &[]).unwrap();
        let grown = grid.resize(&mut cells, 2, &[]).unwrap();
        let root = grid.root().unwrap();
        cells.attach(root, CellCoord::ORIGIN).unwrap();
        for id in grown.created {
            let coord = cells.coord(id).unwrap();
            cells.attach(id, coord).unwrap();
        }
        let old_left = cells.peek_neighbour(root, Direction::Left).unwrap();

        let delivered = grid.move_to(&mut cells, CellCoord::new(1, 0), &[]).unwrap();

        assert_eq!(grid.root(), Some(old_left));
        assert_eq!(grid.root_coord(), Some(CellCoord::new(1, 0)));
        assert_eq!(grid.radius(), 2);
        assert_eq!(
            sorted(delivered.created_coords(&cells)),
            vec![CellCoord::new(2, -1), CellCoord::new(2, 0), CellCoord::new(2, 1)]
        );
        assert_eq!(
            sorted(delivered.deleted),
            vec![CellCoord::new(-1, -1), CellCoord::new(-1, 0), CellCoord::new(-1, 1)]
        );
        assert_eq!(cells.len(), 9);
        cells.verify_links().unwrap();
    }

    #[test]
    fn diagonal_move_steps_both_axes() {
        let mut cells: CellArena<()> = CellArena::new();
        let mut grid = grid_at(&mut cells, CellCoord::ORIGIN, 4);
        let delivered = grid.move_to(&mut cells, CellCoord::new(-2, 3), &[]).unwrap();

        assert_eq!(grid.root_coord(), Some(CellCoord::new(-2, 3)));
        assert_eq!(cells.len(), 49);
        assert_eq!(
            grid.bounds(),
            Some(Bounds::around(CellCoord::new(-2, 3), 3))
        );
        // Cells created on the X pass and narrowed on the Y pass are dropped.
        assert!(delivered.created.iter().all(|id| cells.contains(*id)));
        let created = delivered.created_coords(&cells);
        assert!(created.iter().all(|c| !Bounds::around(CellCoord::ORIGIN, 3).contains(*c)));
        assert_eq!(created.len(), 49 - 5 * 4);
        cells.verify_links().unwrap();
    }

    #[test]
    fn long_move_teleports() {
        let mut cells: CellArena<()> = CellArena::new();
        let mut grid = grid_at(&mut cells, CellCoord::ORIGIN, 3);
        let delivered = grid.move_to(&mut cells, CellCoord::new(10, 0), &[]).unwrap();

        assert_eq!(delivered.created.len(), 25);
        assert_eq!(cells.len(), 25);
        assert_eq!(grid.root_coord(), Some(CellCoord::new(10, 0)));
        assert_eq!(grid.radius(), 3);
        cells.verify_links().unwrap();
    }

    #[test]
    fn teleport_matches_stepping() {
        let mut stepped_cells: CellArena<()> = CellArena::new();
        let mut stepped = grid_at(&mut stepped_cells, CellCoord::ORIGIN, 3);
        stepped.move_to(&mut stepped_cells, CellCoord::new(3, 0), &[]).unwrap();
        stepped.move_to(&mut stepped_cells, CellCoord::new(6, -2), &[]).unwrap();

        let mut jumped_cells: CellArena<()> = CellArena::new();
        let mut jumped = grid_at(&mut jumped_cells, CellCoord::ORIGIN, 3);
        jumped.move_to(&mut jumped_cells, CellCoord::new(6, -2), &[]).unwrap();

        assert_eq!(stepped.root_coord(), jumped.root_coord());
        assert_eq!(stepped.radius(), jumped.radius());
        for side in Direction::CARDINAL {
            let a = stepped.select_border(&stepped_cells, side).unwrap();
            let b = jumped.select_border(&jumped_cells, side).unwrap();
            assert_eq!(coords(&stepped_cells, &a), coords(&jumped_cells, &b));
        }
        let a = stepped.collect_cells(&stepped_cells).unwrap();
        let b = jumped.collect_cells(&jumped_cells).unwrap();
        assert_eq!(
            sorted(coords(&stepped_cells, &a)),
            sorted(coords(&jumped_cells, &b))
        );
    }

    #[test]
    fn radius_one_grid_moves() {
        let mut cells: CellArena<()> = CellArena::new();
        let mut grid = grid_at(&mut cells, CellCoord::ORIGIN, 1);
        let delivered = grid.move_to(&mut cells, CellCoord::new(0, -1), &[]).unwrap();
        assert_eq!(delivered.created_coords(&cells), vec![CellCoord::new(0, -1)]);
        assert_eq!(cells.len(), 1);
    }

    #[test]
    fn expand_then_narrow_round_trips() {
        let mut cells: CellArena<()> = CellArena::new();
        let mut grid = grid_at(&mut cells, CellCoord::ORIGIN, 2);
        let bounds = grid.bounds();

        let grown = grid.expand(&mut cells, Direction::Front).unwrap();
        assert_eq!(grown.created.len(), 3);
        assert_eq!(cells.len(), 12);
        assert_eq!(grid.select_border(&cells, Direction::Left).unwrap().len(), 4);

        let shrunk = grid.narrow_down(&mut cells, Direction::Front).unwrap();
        assert!(shrunk.created.is_empty());
        assert_eq!(cells.len(), 9);
        assert!(grown.created.iter().all(|id| !cells.contains(*id)));
        assert_eq!(grid.bounds(), bounds);
        assert_eq!(grid.radius(), 2);
        cells.verify_links().unwrap();
    }

    #[test]
    fn narrow_never_removes_the_root_row() {
        let mut cells: CellArena<()> = CellArena::new();
        let mut grid = grid_at(&mut cells, CellCoord::ORIGIN, 1);
        assert!(grid.narrow_down(&mut cells, Direction::Back).unwrap().is_empty());
        assert!(grid.narrow_down(&mut cells, Direction::FrontLeft).unwrap().is_empty());
        assert!(grid.expand(&mut cells, Direction::BackRight).unwrap().is_empty());
        assert_eq!(cells.len(), 1);
    }

    #[test]
    fn clear_resets_everything() {
        let mut cells: CellArena<u32> = CellArena::new();
        let mut grid = Grid::new();
        let delivered = grid.init(&mut cells, CellCoord::ORIGIN, 3, &[]).unwrap();
        for (i, id) in delivered.created.iter().enumerate() {
            cells.attach(*id, i as u32).unwrap();
        }

        let cleared = grid.clear(&mut cells).unwrap();
        assert_eq!(cleared.deleted.len(), 25);
        assert!(cells.is_empty());
        assert!(!grid.is_initialized());
        assert_eq!(grid.radius(), 1);

        grid.init(&mut cells, CellCoord::new(4, 4), 2, &[]).unwrap();
        assert_eq!(cells.len(), 9);
    }

    #[test]
    fn overlapping_grid_shares_cells() {
        let mut cells: CellArena<()> = CellArena::new();
        let g1 = grid_at(&mut cells, CellCoord::ORIGIN, 2);
        let mut g2 = Grid::new();
        let delivered = g2.init(&mut cells, CellCoord::new(2, 0), 2, &[&g1]).unwrap();

        assert_eq!(delivered.created.len(), 6);
        assert_eq!(cells.len(), 15);
        assert!(g1.collides_with(&g2));
        for y in -1..=1 {
            let shared = g1.find_cell_by_index(&cells, CellCoord::new(1, y)).unwrap().unwrap();
            assert_eq!(cells.owners(shared), Some(2));
            assert_eq!(g2.find_cell_by_index(&cells, CellCoord::new(1, y)), Ok(Some(shared)));
        }
        cells.verify_links().unwrap();
    }

    #[test]
    fn shared_cell_survives_narrowing() {
        let mut cells: CellArena<()> = CellArena::new();
        let mut g1 = grid_at(&mut cells, CellCoord::ORIGIN, 2);
        let mut g2 = Grid::new();
        g2.init(&mut cells, CellCoord::new(2, 0), 2, &[&g1]).unwrap();
        let shared = g2.find_cell_by_index(&cells, CellCoord::new(1, 0)).unwrap().unwrap();

        g1.move_to(&mut cells, CellCoord::new(-1, 0), &[&g2]).unwrap();
        assert!(cells.contains(shared));
        assert_eq!(cells.owners(shared), Some(1));
        assert_eq!(g2.find_cell_by_index(&cells, CellCoord::new(1, 0)), Ok(Some(shared)));
        assert_eq!(g2.collect_cells(&cells).unwrap().len(), 9);
        assert_eq!(cells.len(), 18);
        cells.verify_links().unwrap();

        // Coming back shares the same column again instead of duplicating it.
        g1.move_to(&mut cells, CellCoord::ORIGIN, &[&g2]).unwrap();
        assert_eq!(cells.owners(shared), Some(2));
        assert_eq!(cells.len(), 15);
        cells.verify_links().unwrap();
    }

    #[test]
    fn clearing_one_grid_keeps_shared_cells() {
        let mut cells: CellArena<()> = CellArena::new();
        let mut g1 = grid_at(&mut cells, CellCoord::ORIGIN, 3);
        let mut g2 = Grid::new();
        g2.init(&mut cells, CellCoord::new(1, 1), 2, &[&g1]).unwrap();
        assert_eq!(cells.len(), 25);

        g1.clear(&mut cells).unwrap();
        assert_eq!(cells.len(), 9);
        assert_eq!(g2.collect_cells(&cells).unwrap().len(), 9);
        for (_, cell) in cells.iter() {
            assert_eq!(cell.owners(), 1);
        }
        cells.verify_links().unwrap();
    }

    #[test]
    fn invalid_limits_are_rejected() {
        let inverted = GridConfig {
            min_radius: 4,
            max_radius: 2,
        };
        assert!(matches!(
            Grid::with_config(inverted).unwrap_err(),
            GridError::InvalidConfig(_)
        ));

        let empty = GridConfig {
            min_radius: 0,
            max_radius: 3,
        };
        assert!(matches!(
            Grid::with_config(empty).unwrap_err(),
            GridError::InvalidConfig(_)
        ));
    }

    #[test]
    fn broken_border_leaves_grid_unchanged() {
        let mut cells: CellArena<()> = CellArena::new();
        let mut grid = grid_at(&mut cells, CellCoord::ORIGIN, 3);
        let corner = grid.find_last(&cells, Direction::FrontRight).unwrap();
        cells.set_neighbour(corner, Direction::Back, None);
        let bounds = grid.bounds();

        let broken = GridError::InconsistentGraph {
            at: CellCoord::new(-2, 2),
            direction: Direction::Back,
        };
        assert_eq!(grid.verify_region(&cells), Err(broken.clone()));
        assert_eq!(
            grid.move_to(&mut cells, CellCoord::new(1, 0), &[]).unwrap_err(),
            broken
        );
        assert_eq!(grid.root_coord(), Some(CellCoord::ORIGIN));
        assert_eq!(grid.bounds(), bounds);
        assert_eq!(cells.len(), 25);

        assert_eq!(grid.resize(&mut cells, 4, &[]).unwrap_err(), broken);
        assert_eq!(grid.radius(), 3);
        assert_eq!(cells.len(), 25);

        assert_eq!(
            grid.move_to(&mut cells, CellCoord::new(20, 0), &[]).unwrap_err(),
            broken
        );
        assert_eq!(grid.root_coord(), Some(CellCoord::ORIGIN));
        assert_eq!(cells.len(), 25);
    }

    #[test]
    fn broken_sibling_blocks_the_move() {
        let mut cells: CellArena<()> = CellArena::new();
        let mut mover = grid_at(&mut cells, CellCoord::ORIGIN, 2);
        let resident = grid_at(&mut cells, CellCoord::new(4, 0), 2);
        cells.set_neighbour(resident.root().unwrap(), Direction::Left, None);

        let err = mover
            .move_to(&mut cells, CellCoord::new(2, 0), &[&resident])
            .unwrap_err();
        assert_eq!(
            err,
            GridError::InconsistentGraph {
                at: CellCoord::new(4, 0),
                direction: Direction::Left,
            }
        );
        assert_eq!(mover.root_coord(), Some(CellCoord::ORIGIN));
        assert_eq!(cells.len(), 18);
        assert!(cells.iter().all(|(_, cell)| !cell.is_shared()));
    }

    #[test]
    fn failed_init_creates_nothing() {
        let mut cells: CellArena<()> = CellArena::new();
        let resident = grid_at(&mut cells, CellCoord::ORIGIN, 2);
        cells.set_neighbour(resident.root().unwrap(), Direction::Back, None);

        let mut grid = Grid::new();
        assert!(grid.init(&mut cells, CellCoord::new(1, 0), 2, &[&resident]).is_err());
        assert!(!grid.is_initialized());
        assert_eq!(cells.len(), 9);
    }
}
