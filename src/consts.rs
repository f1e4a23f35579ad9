//! Assorted constants & hard-coded configuration
use ratatui::style::{Color, Modifier, Style};
use std::time::Duration;

/// How often the terminal is redrawn while a run is in progress
pub(crate) const FRAME_PERIOD: Duration = Duration::from_millis(16);

/// Number of cells in a freshly-seeded snake
pub(crate) const INITIAL_SNAKE_LENGTH: usize = 3;

/// Points awarded for each piece of food eaten
pub(crate) const SCORE_INCREMENT: u32 = 10;

/// Boards smaller than this many cells on a side are not playable
pub(crate) const MIN_GRID_SIDE: u16 = 5;

/// Boards never grow beyond this many cells on a side, no matter how large
/// the terminal is
pub(crate) const MAX_GRID_SIDE: u16 = 40;

/// Each grid cell is this many terminal columns wide per unit of cell size
/// (terminal glyphs are about twice as tall as they are wide)
pub(crate) const CELL_COLUMNS: u16 = 2;

/// Minimum time between two snapshot writes
pub(crate) const SNAPSHOT_SAVE_INTERVAL: Duration = Duration::from_secs(1);

/// Errors older than this are forgotten by the error handler
pub(crate) const ERROR_WINDOW: Duration = Duration::from_secs(60);

/// This many errors within [`ERROR_WINDOW`] force a full reset
pub(crate) const ERROR_LIMIT: usize = 3;

/// Maximum number of frame timestamps kept by the performance monitor
pub(crate) const FPS_SAMPLE_WINDOW: usize = 60;

/// The performance monitor needs at least this many samples before it will
/// judge the frame rate
pub(crate) const MIN_FPS_SAMPLES: usize = 10;

/// Frame rate below which rendering fidelity is reduced
pub(crate) const LOW_FPS_THRESHOLD: f64 = 30.0;

/// How long the frame rate must stay below [`LOW_FPS_THRESHOLD`] before
/// fidelity is reduced
pub(crate) const LOW_FPS_GRACE: Duration = Duration::from_secs(2);

/// Minimum pointer travel, in terminal columns, for a drag to count as a
/// swipe.  Rows count double.
pub(crate) const MIN_SWIPE_DISTANCE: i32 = 3;

/// Number of colours in the snake's body gradient at full fidelity
pub(crate) const GRADIENT_LEVELS: usize = 8;

/// Number of colours in the snake's body gradient at reduced fidelity
pub(crate) const REDUCED_GRADIENT_LEVELS: usize = 2;

/// Label every this-many cells along the board's top & left edges
pub(crate) const LABEL_STEP: u16 = 5;

/// Glyph for the snake's head when it is moving up
pub(crate) const SNAKE_HEAD_UP_SYMBOL: char = 'v';

/// Glyph for the snake's head when it is moving down
pub(crate) const SNAKE_HEAD_DOWN_SYMBOL: char = '^';

/// Glyph for the snake's head when it is moving right
pub(crate) const SNAKE_HEAD_RIGHT_SYMBOL: char = '<';

/// Glyph for the snake's head when it is moving left
pub(crate) const SNAKE_HEAD_LEFT_SYMBOL: char = '>';

/// Glyph for the food
pub(crate) const FOOD_SYMBOL: char = '●';

/// Glyph for the snake's head when it's collided with a wall or itself
pub(crate) const COLLISION_SYMBOL: char = '×';

/// Brightest colour of the snake's body gradient (nearest the head)
pub(crate) const SNAKE_HEAD_COLOR: (u8, u8, u8) = (120, 230, 90);

/// Darkest colour of the snake's body gradient (nearest the tail)
pub(crate) const SNAKE_TAIL_COLOR: (u8, u8, u8) = (30, 90, 30);

/// Style for the head glyph drawn on top of the gradient
pub(crate) const SNAKE_HEAD_STYLE: Style = Style::new().fg(Color::Black).add_modifier(Modifier::BOLD);

/// Style for the food
pub(crate) const FOOD_STYLE: Style = Style::new().fg(Color::LightRed);

/// Style for [`COLLISION_SYMBOL`]
pub(crate) const COLLISION_STYLE: Style = Style::new()
    .fg(Color::LightRed)
    .add_modifier(Modifier::REVERSED);

/// Background shades of the checkerboard
pub(crate) const BOARD_LIGHT: Color = Color::Rgb(44, 44, 44);
pub(crate) const BOARD_DARK: Color = Color::Rgb(38, 38, 38);

/// Style for the coordinate labels on the board's border
pub(crate) const LABEL_STYLE: Style = Style::new().fg(Color::DarkGray);

/// Style for key codes shown in the interface
pub(crate) const KEY_STYLE: Style = Style::new().fg(Color::Yellow);

/// Style for the score bar at the top of the screen
pub(crate) const SCORE_BAR_STYLE: Style = Style::new().add_modifier(Modifier::REVERSED);

/// Style for the currently-selected menu item
pub(crate) const MENU_SELECTION_STYLE: Style = Style::new().add_modifier(Modifier::UNDERLINED);
