use super::grid::{Cell, Grid};
use super::snake::Snake;
use rand::{seq::IteratorRandom, Rng};
use std::collections::HashSet;

/// Pick a cell not occupied by the snake, uniformly at random.  Returns
/// `None` if the snake fills the whole board.
pub(crate) fn spawn<R: Rng + ?Sized>(grid: Grid, snake: &Snake, rng: &mut R) -> Option<Cell> {
    let occupied = snake.body().iter().copied().collect::<HashSet<_>>();
    grid.cells().filter(|c| !occupied.contains(c)).choose(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::direction::Direction;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn never_on_snake() {
        let grid = Grid::new(5, 5);
        let snake = Snake::new(Cell::new(2, 2), Direction::Right);
        let mut rng = ChaCha12Rng::seed_from_u64(0x0123456789ABCDEF);
        for _ in 0..200 {
            let food = spawn(grid, &snake, &mut rng).unwrap();
            assert!(grid.contains(food));
            assert!(!snake.contains(food));
        }
    }

    #[test]
    fn only_free_cell() {
        let grid = Grid::new(2, 2);
        let snake = Snake::from_cells(
            [Cell::new(0, 0), Cell::new(1, 0), Cell::new(1, 1)],
            Direction::Down,
        )
        .unwrap();
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        assert_eq!(spawn(grid, &snake, &mut rng), Some(Cell::new(0, 1)));
    }

    #[test]
    fn full_board() {
        let grid = Grid::new(2, 2);
        let snake = Snake::from_cells(
            [
                Cell::new(0, 0),
                Cell::new(1, 0),
                Cell::new(1, 1),
                Cell::new(0, 1),
            ],
            Direction::Left,
        )
        .unwrap();
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        assert_eq!(spawn(grid, &snake, &mut rng), None);
    }
}
