pub(crate) mod border;
pub(crate) mod direction;
pub(crate) mod food;
pub(crate) mod grid;
pub(crate) mod snake;
use self::border::{Collision, Resolution};
use self::direction::Direction;
use self::grid::{Cell, Grid};
use self::snake::Snake;
use crate::consts;
use crate::settings::Settings;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A single game of Snake: the board, the run state, and the scores.
///
/// The session performs no I/O.  Saved state is handed to
/// [`GameSession::init()`] and the effects of each tick are reported in the
/// returned [`TickOutcome`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct GameSession<R = rand::rngs::ThreadRng> {
    rng: R,
    settings: Settings,
    high_score: u32,
    last_score: u32,
    state: RunState,
    board: Option<Board>,
}

impl<R: Rng> GameSession<R> {
    pub(crate) fn new_with_rng(settings: Settings, rng: R) -> GameSession<R> {
        GameSession {
            rng,
            settings,
            high_score: 0,
            last_score: 0,
            state: RunState::Uninitialized,
            board: None,
        }
    }

    /// Build the board on `grid` and start running.  The run saved in
    /// `snapshot` is resumed if it fits the grid; otherwise a fresh snake is
    /// seeded.
    pub(crate) fn init(&mut self, grid: Grid, snapshot: Option<Snapshot>, high_score: u32) {
        let restored = snapshot.and_then(|snap| {
            let board = Board::restore(grid, snap);
            if board.is_none() {
                warn!("Discarding saved run that does not fit the current board");
            }
            board
        });
        let board = match restored {
            Some(board) => {
                info!(score = board.score, "Resuming saved run");
                board
            }
            None => Board::seed(grid, &mut self.rng),
        };
        self.high_score = self.high_score.max(high_score).max(board.score);
        self.state = if board.food.is_some() {
            RunState::Running
        } else {
            RunState::Ended(Ending::BoardFull)
        };
        debug!(
            width = grid.width(),
            height = grid.height(),
            "Game session initialized"
        );
        self.board = Some(board);
    }

    /// Start or resume the run
    pub(crate) fn start(&mut self) -> Result<(), SessionError> {
        match self.state {
            RunState::Uninitialized => Err(SessionError::NotInitialized),
            RunState::Ended(_) => Err(SessionError::Ended),
            RunState::Running | RunState::Paused => {
                self.state = RunState::Running;
                Ok(())
            }
        }
    }

    pub(crate) fn resume(&mut self) -> Result<(), SessionError> {
        self.start()
    }

    /// Stop advancing the run without discarding it.  Pausing an
    /// already-paused or finished run does nothing.
    pub(crate) fn pause(&mut self) -> Result<(), SessionError> {
        match self.state {
            RunState::Uninitialized => Err(SessionError::NotInitialized),
            RunState::Running | RunState::Paused => {
                self.state = RunState::Paused;
                Ok(())
            }
            RunState::Ended(_) => Ok(()),
        }
    }

    /// Throw away the current run and immediately start a fresh one on the
    /// same grid
    pub(crate) fn reset(&mut self) -> Result<(), SessionError> {
        let board = self.board.as_mut().ok_or(SessionError::NotInitialized)?;
        self.last_score = board.score;
        *board = Board::seed(board.grid, &mut self.rng);
        self.state = RunState::Running;
        info!(last_score = self.last_score, "Run reset");
        Ok(())
    }

    /// Replace the settings.  The board is discarded, and the session must be
    /// initialized again.
    pub(crate) fn reconfigure(&mut self, settings: Settings) {
        info!(?settings, "Applying new settings");
        self.settings = settings;
        self.board = None;
        self.state = RunState::Uninitialized;
    }

    /// Move the run onto a differently-sized grid.  If the snake no longer
    /// fits, a fresh snake is seeded.
    pub(crate) fn resize(&mut self, grid: Grid) -> Result<(), SessionError> {
        let board = self.board.as_mut().ok_or(SessionError::NotInitialized)?;
        if board.grid == grid {
            return Ok(());
        }
        let body = board.snake.body();
        if body.iter().all(|&c| grid.contains(c)) && is_connected(grid, body.iter().copied()) {
            board.grid = grid;
            if !board.food.is_some_and(|f| grid.contains(f)) {
                board.food = food::spawn(grid, &board.snake, &mut self.rng);
            }
        } else {
            info!("Snake no longer fits on the resized board; starting over");
            *board = Board::seed(grid, &mut self.rng);
        }
        if board.food.is_none() && !self.is_ended() {
            self.state = RunState::Ended(Ending::BoardFull);
        }
        Ok(())
    }

    /// Buffer a direction change for the next tick
    pub(crate) fn set_direction(&mut self, direction: Direction) {
        if let Some(board) = self.board.as_mut() {
            if matches!(self.state, RunState::Running | RunState::Paused) {
                board.snake.set_direction(direction);
            }
        }
    }

    /// Advance the snake by one cell
    pub(crate) fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        match self.state {
            RunState::Running => (),
            RunState::Uninitialized => return Err(SessionError::NotInitialized),
            RunState::Paused => return Err(SessionError::NotRunning),
            RunState::Ended(_) => return Err(SessionError::Ended),
        }
        let board = self.board.as_mut().ok_or(SessionError::NotInitialized)?;
        board.snake.latch_direction();
        let candidate = board.snake.step();
        let cell = match border::resolve(
            candidate,
            self.settings.border_mode,
            board.grid,
            &board.snake,
        ) {
            Resolution::Move { cell, relocated } => {
                if relocated {
                    debug!(x = cell.x, y = cell.y, "Snake wrapped around the board");
                }
                cell
            }
            Resolution::Bounce { cell, direction } => {
                board.snake.reverse(direction);
                cell
            }
            Resolution::Collision(collision) => {
                info!(?collision, score = board.score, "Snake crashed");
                let ending = Ending::Collision(collision);
                self.state = RunState::Ended(ending);
                return Ok(TickOutcome {
                    ending: Some(ending),
                    ..TickOutcome::default()
                });
            }
        };
        let mut outcome = TickOutcome::default();
        let grew = board.food == Some(cell);
        board.snake.advance(cell, grew);
        if grew {
            outcome.ate = true;
            board.score = board.score.saturating_add(consts::SCORE_INCREMENT);
            if board.score > self.high_score {
                self.high_score = board.score;
                outcome.new_high_score = true;
            }
            board.food = food::spawn(board.grid, &board.snake, &mut self.rng);
            if board.food.is_none() {
                info!(score = board.score, "Board filled");
                self.state = RunState::Ended(Ending::BoardFull);
                outcome.ending = Some(Ending::BoardFull);
            }
        }
        Ok(outcome)
    }
}

impl<R> GameSession<R> {
    pub(crate) fn state(&self) -> RunState {
        self.state
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.state != RunState::Uninitialized
    }

    pub(crate) fn is_ended(&self) -> bool {
        matches!(self.state, RunState::Ended(_))
    }

    pub(crate) fn settings(&self) -> Settings {
        self.settings
    }

    pub(crate) fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub(crate) fn score(&self) -> u32 {
        self.board.as_ref().map_or(0, |b| b.score)
    }

    pub(crate) fn high_score(&self) -> u32 {
        self.high_score
    }

    #[cfg(test)]
    pub(crate) fn last_score(&self) -> u32 {
        self.last_score
    }

    /// Capture the current run for saving.  Returns `None` if there is no
    /// board or no food (i.e., the board is full).
    pub(crate) fn snapshot(&self) -> Option<Snapshot> {
        let board = self.board.as_ref()?;
        Some(Snapshot {
            snake: board.snake.body().iter().copied().collect(),
            food: board.food?,
            score: board.score,
            direction: board.snake.next_direction(),
        })
    }
}

/// The playing field of a run
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Board {
    grid: Grid,
    snake: Snake,
    food: Option<Cell>,
    score: u32,
}

impl Board {
    fn seed<R: Rng>(grid: Grid, rng: &mut R) -> Board {
        let snake = Snake::new(grid.center(), Direction::Right);
        let food = food::spawn(grid, &snake, rng);
        Board {
            grid,
            snake,
            food,
            score: 0,
        }
    }

    /// Rebuild a board from a snapshot, provided that the snapshot is
    /// consistent with `grid`
    fn restore(grid: Grid, snapshot: Snapshot) -> Option<Board> {
        let Snapshot {
            snake,
            food,
            score,
            direction,
        } = snapshot;
        let mut seen = HashSet::with_capacity(snake.len());
        if !snake.iter().all(|&c| grid.contains(c) && seen.insert(c)) {
            return None;
        }
        if !grid.contains(food) || seen.contains(&food) {
            return None;
        }
        if !is_connected(grid, snake.iter().copied()) {
            return None;
        }
        let snake = Snake::from_cells(snake, direction)?;
        if snake
            .body()
            .get(1)
            .is_some_and(|&neck| snake.head().offset(direction) == neck)
        {
            return None;
        }
        Some(Board {
            grid,
            snake,
            food: Some(food),
            score,
        })
    }

    pub(crate) fn grid(&self) -> Grid {
        self.grid
    }

    pub(crate) fn snake(&self) -> &Snake {
        &self.snake
    }

    pub(crate) fn food(&self) -> Option<Cell> {
        self.food
    }
}

/// True if each cell is one step from the next, counting steps across an
/// edge of the board
fn is_connected<I>(grid: Grid, cells: I) -> bool
where
    I: Iterator<Item = Cell> + Clone,
{
    cells.clone().zip(cells.skip(1)).all(|(a, b)| grid.links(a, b))
}

/// A saved, in-progress run
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct Snapshot {
    /// The snake's cells, head first
    pub(crate) snake: Vec<Cell>,
    pub(crate) food: Cell,
    pub(crate) score: u32,
    pub(crate) direction: Direction,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum RunState {
    /// No board has been built yet
    Uninitialized,
    Running,
    Paused,
    Ended(Ending),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Ending {
    Collision(Collision),
    /// The snake has filled the board and there is nowhere left to place
    /// food.
    BoardFull,
}

/// What happened during a tick
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct TickOutcome {
    /// The snake ate the food
    pub(crate) ate: bool,

    /// The score surpassed the previous high score
    pub(crate) new_high_score: bool,

    /// The run ended during this tick
    pub(crate) ending: Option<Ending>,
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub(crate) enum SessionError {
    #[error("game session has not been initialized")]
    NotInitialized,
    #[error("game session is not running")]
    NotRunning,
    #[error("game session has ended")]
    Ended,
}
