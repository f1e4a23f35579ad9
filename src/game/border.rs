use super::direction::Direction;
use super::grid::{Cell, Grid};
use super::snake::Snake;
use enum_map::Enum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happens when the snake's head leaves the board
#[derive(Clone, Copy, Debug, Default, Deserialize, Enum, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum BorderMode {
    /// Leaving the board ends the run
    #[default]
    Die,

    /// The head reappears on the opposite edge
    Wrap,

    /// The snake turns around and heads back the way it came
    Bounce,
}

impl BorderMode {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            BorderMode::Die => "Die",
            BorderMode::Wrap => "Wrap",
            BorderMode::Bounce => "Bounce",
        }
    }
}

impl fmt::Display for BorderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The outcome of checking a candidate head position
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Resolution {
    /// The head may move to `cell`.  `relocated` is true if the cell was
    /// wrapped around from the other side of the board.
    Move { cell: Cell, relocated: bool },

    /// The snake must be reversed to face `direction`, after which its head
    /// moves to `cell`.
    Bounce { cell: Cell, direction: Direction },

    /// The move is fatal
    Collision(Collision),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Collision {
    Wall,
    Body,
}

/// Decide what happens when `snake` tries to move its head to `candidate`.
///
/// Self-collision is checked after the border has been resolved, in every
/// mode, against all of the body except the cell the head is leaving.
///
/// A bounce reverses the whole snake, so the new head grows out of the old
/// tail and is not next to the old head.  Clamping the head in place would
/// put it on top of itself.
pub(crate) fn resolve(candidate: Cell, mode: BorderMode, grid: Grid, snake: &Snake) -> Resolution {
    if grid.contains(candidate) {
        return moved(candidate, false, snake);
    }
    match mode {
        BorderMode::Die => Resolution::Collision(Collision::Wall),
        BorderMode::Wrap => moved(grid.wrap(candidate), true, snake),
        BorderMode::Bounce => {
            let direction = snake.tail_heading();
            let mut cell = snake.tail().offset(direction);
            if !grid.contains(cell) {
                // The tail is against a wall too; reflect off it.
                cell = snake.tail().offset(direction.reverse());
            }
            let len = snake.len();
            if snake.body().iter().take(len - 1).any(|&c| c == cell) {
                Resolution::Collision(Collision::Body)
            } else {
                Resolution::Bounce { cell, direction }
            }
        }
    }
}

fn moved(cell: Cell, relocated: bool, snake: &Snake) -> Resolution {
    if snake.body().iter().skip(1).any(|&c| c == cell) {
        Resolution::Collision(Collision::Body)
    } else {
        Resolution::Move { cell, relocated }
    }
}
