use super::direction::Direction;
use crate::consts;
use serde::{Deserialize, Serialize};

/// A square on the board.  Coordinates are signed so that a candidate head
/// one step past an edge can be represented before the border policy
/// resolves it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub(crate) struct Cell {
    pub(crate) x: i32,
    pub(crate) y: i32,
}

impl Cell {
    pub(crate) const fn new(x: i32, y: i32) -> Cell {
        Cell { x, y }
    }

    /// Return the cell one step away in the given direction
    pub(crate) fn offset(self, direction: Direction) -> Cell {
        let (dx, dy) = direction.delta();
        Cell {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// True if `other` is exactly one axis-aligned step away
    #[cfg(test)]
    pub(crate) fn is_adjacent(self, other: Cell) -> bool {
        Direction::between(self, other).is_some()
    }
}

/// The discrete coordinate space of a level
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct Grid {
    width: u16,
    height: u16,
}

impl Grid {
    pub(crate) const fn new(width: u16, height: u16) -> Grid {
        Grid { width, height }
    }

    /// Compute the largest square grid whose side, times `cell_size`, fits
    /// within `extent`.  Returns `None` if the result would be smaller than
    /// [`MIN_GRID_SIDE`][consts::MIN_GRID_SIDE].
    pub(crate) fn fit(extent: u16, cell_size: u16) -> Option<Grid> {
        let side = extent.checked_div(cell_size)?.min(consts::MAX_GRID_SIDE);
        (side >= consts::MIN_GRID_SIDE).then_some(Grid::new(side, side))
    }

    pub(crate) fn width(self) -> u16 {
        self.width
    }

    pub(crate) fn height(self) -> u16 {
        self.height
    }

    pub(crate) fn contains(self, cell: Cell) -> bool {
        (0..i32::from(self.width)).contains(&cell.x) && (0..i32::from(self.height)).contains(&cell.y)
    }

    /// Map an out-of-bounds cell back onto the board, as though the board
    /// were a torus
    pub(crate) fn wrap(self, cell: Cell) -> Cell {
        Cell {
            x: cell.x.rem_euclid(i32::from(self.width.max(1))),
            y: cell.y.rem_euclid(i32::from(self.height.max(1))),
        }
    }

    /// True if `a` and `b` are one step apart, either directly or across an
    /// edge of the board
    pub(crate) fn links(self, a: Cell, b: Cell) -> bool {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
            .into_iter()
            .any(|d| self.wrap(a.offset(d)) == b)
    }

    /// The total number of cells on the board
    #[cfg(test)]
    pub(crate) fn capacity(self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    pub(crate) fn center(self) -> Cell {
        Cell::new(i32::from(self.width / 2), i32::from(self.height / 2))
    }

    /// Iterate over every cell in the board in row-major order
    pub(crate) fn cells(self) -> impl Iterator<Item = Cell> {
        let width = i32::from(self.width);
        (0..i32::from(self.height)).flat_map(move |y| (0..width).map(move |x| Cell::new(x, y)))
    }
}
