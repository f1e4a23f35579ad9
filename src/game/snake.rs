use super::direction::Direction;
use super::grid::Cell;
use crate::consts;
use std::collections::VecDeque;

/// Snake state.  Snate.
///
/// The body is stored head-first: `body[0]` is the head and the last element
/// is the tail.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Snake {
    /// The cells occupied by the snake, head first.  Never empty.
    body: VecDeque<Cell>,

    /// The direction used for the most recent tick
    direction: Direction,

    /// The direction that will be used for the next tick
    next_direction: Direction,
}

impl Snake {
    /// Create a new snake of [`INITIAL_SNAKE_LENGTH`][consts::INITIAL_SNAKE_LENGTH]
    /// cells with its head at `head`, facing `direction`, and its body
    /// trailing out behind it.
    pub(crate) fn new(head: Cell, direction: Direction) -> Snake {
        let behind = direction.reverse();
        let body = std::iter::successors(Some(head), |&c| Some(c.offset(behind)))
            .take(consts::INITIAL_SNAKE_LENGTH)
            .collect();
        Snake {
            body,
            direction,
            next_direction: direction,
        }
    }

    /// Construct a snake from previously-saved cells.  Returns `None` if
    /// `cells` is empty.
    pub(crate) fn from_cells<I>(cells: I, direction: Direction) -> Option<Snake>
    where
        I: IntoIterator<Item = Cell>,
    {
        let body = cells.into_iter().collect::<VecDeque<_>>();
        (!body.is_empty()).then_some(Snake {
            body,
            direction,
            next_direction: direction,
        })
    }

    /// Return the position of the snake's head
    pub(crate) fn head(&self) -> Cell {
        self.body[0]
    }

    /// Return the position of the snake's tail.  For a one-cell snake, this
    /// is the head.
    pub(crate) fn tail(&self) -> Cell {
        self.body[self.body.len() - 1]
    }

    /// Return all cells occupied by the snake, head first
    pub(crate) fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub(crate) fn len(&self) -> usize {
        self.body.len()
    }

    pub(crate) fn contains(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn next_direction(&self) -> Direction {
        self.next_direction
    }

    /// Buffer `direction` for the next tick.  A request to turn straight
    /// back on the direction of the last tick is ignored.
    pub(crate) fn set_direction(&mut self, direction: Direction) {
        if !direction.is_opposite(self.direction) {
            self.next_direction = direction;
        }
    }

    /// Make the buffered direction the effective direction for this tick
    pub(crate) fn latch_direction(&mut self) {
        self.direction = self.next_direction;
    }

    /// Return the cell the head would move into this tick.  Nothing is
    /// changed until [`Snake::advance()`] is called.
    pub(crate) fn step(&self) -> Cell {
        self.head().offset(self.direction)
    }

    /// Move the head to `new_head`.  Unless the snake `grew`, the tail cell is
    /// released.
    pub(crate) fn advance(&mut self, new_head: Cell, grew: bool) {
        self.body.push_front(new_head);
        if !grew {
            let _ = self.body.pop_back();
        }
    }

    /// The direction the snake would travel in if it were turned around:
    /// outwards from its tail
    pub(crate) fn tail_heading(&self) -> Direction {
        let len = self.body.len();
        if len >= 2 {
            if let Some(d) = Direction::between(self.body[len - 2], self.body[len - 1]) {
                return d;
            }
        }
        self.direction.reverse()
    }

    /// Turn the snake around so that its tail becomes its head, now facing
    /// `direction`
    pub(crate) fn reverse(&mut self, direction: Direction) {
        self.body.make_contiguous().reverse();
        self.direction = direction;
        self.next_direction = direction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Snake {
        Snake::new(Cell::new(5, 5), Direction::Right)
    }

    #[test]
    fn new_snake_trails_behind_head() {
        let snake = seeded();
        assert_eq!(
            snake.body().iter().copied().collect::<Vec<_>>(),
            [Cell::new(5, 5), Cell::new(4, 5), Cell::new(3, 5)]
        );
        assert_eq!(snake.head(), Cell::new(5, 5));
        assert_eq!(snake.tail(), Cell::new(3, 5));
    }

    #[test]
    fn reverse_request_is_ignored() {
        let mut snake = seeded();
        snake.set_direction(Direction::Left);
        assert_eq!(snake.next_direction(), Direction::Right);
        snake.latch_direction();
        assert_eq!(snake.step(), Cell::new(6, 5));
    }

    #[test]
    fn quick_double_turn_cannot_reverse() {
        let mut snake = seeded();
        snake.set_direction(Direction::Up);
        snake.set_direction(Direction::Left);
        assert_eq!(snake.next_direction(), Direction::Up);
    }

    #[test]
    fn step_does_not_move() {
        let mut snake = seeded();
        snake.set_direction(Direction::Down);
        snake.latch_direction();
        assert_eq!(snake.step(), Cell::new(5, 6));
        assert_eq!(snake.head(), Cell::new(5, 5));
    }

    #[test]
    fn advance_without_growth() {
        let mut snake = seeded();
        snake.advance(Cell::new(6, 5), false);
        assert_eq!(
            snake.body().iter().copied().collect::<Vec<_>>(),
            [Cell::new(6, 5), Cell::new(5, 5), Cell::new(4, 5)]
        );
    }

    #[test]
    fn advance_with_growth() {
        let mut snake = seeded();
        snake.advance(Cell::new(6, 5), true);
        assert_eq!(snake.len(), 4);
        assert_eq!(snake.tail(), Cell::new(3, 5));
    }

    #[test]
    fn reverse_swaps_ends() {
        let mut snake = seeded();
        assert_eq!(snake.tail_heading(), Direction::Left);
        snake.reverse(Direction::Left);
        assert_eq!(snake.head(), Cell::new(3, 5));
        assert_eq!(snake.tail(), Cell::new(5, 5));
        assert_eq!(snake.direction(), Direction::Left);
        assert_eq!(snake.next_direction(), Direction::Left);
    }

    #[test]
    fn single_cell_tail_heading() {
        let snake = Snake::from_cells([Cell::new(2, 2)], Direction::Up).unwrap();
        assert_eq!(snake.tail_heading(), Direction::Down);
    }

    #[test]
    fn from_no_cells() {
        assert_eq!(Snake::from_cells([], Direction::Up), None);
    }
}
