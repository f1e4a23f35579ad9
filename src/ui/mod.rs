pub(crate) mod paused;
pub(crate) mod settings_panel;
use self::paused::PauseMenu;
use self::settings_panel::SettingsPanel;
use crate::consts;
use crate::game::border::BorderMode;
use crate::game::direction::Direction;
use crate::game::grid::{Cell, Grid};
use crate::game::{Board, Ending, GameSession, RunState};
use crate::perf::Fidelity;
use crate::settings::{CellSize, Settings};
use crate::util::center_rect;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Position, Rect, Size},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, StatefulWidget, Widget},
};
use tracing::debug;

/// Rows used by the score bar and the message line
const CHROME_ROWS: u16 = 2;

/// Rows/columns used by the board's border
const BORDER: u16 = 2;

/// Columns to the left of the board's border used for row labels
const LABEL_GUTTER: u16 = 2;

/// Compute the largest board that can be drawn in a terminal of the given
/// size.  Returns `None` if the terminal is too small for a playable board.
pub(crate) fn fit_grid(area: Rect, cell_size: CellSize) -> Option<Grid> {
    let rows = area.height.saturating_sub(CHROME_ROWS + BORDER);
    let columns = area.width.saturating_sub(BORDER + LABEL_GUTTER) / consts::CELL_COLUMNS;
    Grid::fit(rows.min(columns), cell_size.get())
}

/// A pop-up drawn on top of the board
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) enum Overlay {
    #[default]
    None,
    Paused(PauseMenu),
    Settings(SettingsPanel),
}

/// Everything that is drawn in a single frame
#[derive(Clone, Copy, Debug)]
pub(crate) struct Scene<'a> {
    board: Option<&'a Board>,
    state: RunState,
    score: u32,
    high_score: u32,
    settings: Settings,
    overlay: &'a Overlay,
    fps: Option<f64>,
    fidelity: Fidelity,
}

impl<'a> Scene<'a> {
    pub(crate) fn new<R>(session: &'a GameSession<R>, overlay: &'a Overlay) -> Scene<'a> {
        Scene {
            board: session.board(),
            state: session.state(),
            score: session.score(),
            high_score: session.high_score(),
            settings: session.settings(),
            overlay,
            fps: None,
            fidelity: Fidelity::Full,
        }
    }

    pub(crate) fn fps(mut self, fps: Option<f64>) -> Scene<'a> {
        self.fps = fps;
        self
    }

    pub(crate) fn fidelity(mut self, fidelity: Fidelity) -> Scene<'a> {
        self.fidelity = fidelity;
        self
    }

    fn score_line(&self) -> Line<'static> {
        let fps = self
            .fps
            .map_or_else(String::new, |fps| format!("   FPS: {fps:.0}"));
        Line::styled(
            format!(
                " Score: {}   High Score: {}{fps}",
                self.score, self.high_score
            ),
            consts::SCORE_BAR_STYLE,
        )
    }

    fn message_line(&self) -> Line<'static> {
        let key = |k: &'static str| Span::styled(k, consts::KEY_STYLE);
        match self.state {
            RunState::Uninitialized => Line::from_iter([
                Span::raw(" Enlarge the terminal or shrink the cells ("),
                key("o"),
                Span::raw(")"),
            ]),
            RunState::Running => Line::from_iter([
                Span::raw(" Pause ("),
                key("Space"),
                Span::raw(") · Settings ("),
                key("o"),
                Span::raw(") · Quit ("),
                key("q"),
                Span::raw(")"),
            ]),
            RunState::Paused => Line::default(),
            RunState::Ended(ending) => Line::from_iter([
                Span::raw(match ending {
                    Ending::Collision(_) => " GAME OVER · Restart (",
                    Ending::BoardFull => " YOU WIN! · Restart (",
                }),
                key("r"),
                Span::raw(") · Quit ("),
                key("q"),
                Span::raw(")"),
            ]),
        }
    }
}

impl StatefulWidget for Scene<'_> {
    type State = Renderer;

    fn render(self, area: Rect, buf: &mut Buffer, renderer: &mut Renderer) {
        let [score_area, main_area, message_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);
        self.score_line().render(score_area, buf);
        if let Some(board) = self.board {
            renderer.draw_board(&self, board, main_area, buf);
        } else {
            let notice = center_rect(main_area, Size::new(main_area.width, 1));
            Line::from("Terminal too small").centered().render(notice, buf);
        }
        self.message_line().render(message_area, buf);
        match self.overlay {
            Overlay::None => (),
            Overlay::Paused(menu) => {
                let menu_area =
                    center_rect(main_area, Size::new(PauseMenu::WIDTH, PauseMenu::HEIGHT));
                (*menu).render(menu_area, buf);
            }
            Overlay::Settings(panel) => {
                let panel_area = center_rect(
                    main_area,
                    Size::new(SettingsPanel::WIDTH, SettingsPanel::HEIGHT),
                );
                panel.render(panel_area, buf);
            }
        }
    }
}

/// Drawing state that persists between frames: the pre-rendered board
/// background and the snake's colour gradient
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Renderer {
    background: Option<Background>,
    gradient: Gradient,
    rebuilds: u32,
}

impl Renderer {
    pub(crate) fn new() -> Renderer {
        Renderer::default()
    }

    /// Forget the cached background so that it is redrawn on the next frame
    pub(crate) fn invalidate(&mut self) {
        self.background = None;
    }

    /// The number of times the background has been drawn from scratch
    #[cfg(test)]
    pub(crate) fn rebuilds(&self) -> u32 {
        self.rebuilds
    }

    fn background(&mut self, key: BackgroundKey) -> &Buffer {
        if matches!(self.background, Some(ref bg) if bg.key != key) {
            self.background = None;
        }
        let rebuilds = &mut self.rebuilds;
        &self
            .background
            .get_or_insert_with(|| {
                debug!(?key, "Rebuilding board background");
                *rebuilds = rebuilds.saturating_add(1);
                Background::new(key)
            })
            .buffer
    }

    fn draw_board(&mut self, scene: &Scene<'_>, board: &Board, area: Rect, buf: &mut Buffer) {
        let grid = board.grid();
        let cell_size = scene.settings.cell_size.get();
        let key = BackgroundKey {
            area: center_rect(area, frame_size(grid, cell_size)),
            grid,
            cell_size,
            border_mode: scene.settings.border_mode,
            fidelity: scene.fidelity,
        };
        let background = self.background(key);
        for pos in background.area.positions() {
            if let (Some(src), Some(dest)) = (background.cell(pos), buf.cell_mut(pos)) {
                *dest = src.clone();
            }
        }

        self.gradient.set_fidelity(scene.fidelity);
        let mut painter = Painter {
            area: board_rect(key.area),
            cell_size,
            buf,
        };
        let snake = board.snake();
        for (i, &cell) in snake.body().iter().enumerate() {
            painter.fill(cell, self.gradient.color(i, snake.len()));
        }
        if let Some(food) = board.food() {
            painter.glyph(food, consts::FOOD_SYMBOL, consts::FOOD_STYLE);
        }
        // Draw the head last so that a collision glyph covers whatever was
        // hit
        if matches!(scene.state, RunState::Ended(Ending::Collision(_))) {
            painter.glyph(
                snake.head(),
                consts::COLLISION_SYMBOL,
                consts::COLLISION_STYLE,
            );
        } else {
            painter.glyph(
                snake.head(),
                head_symbol(snake.direction()),
                consts::SNAKE_HEAD_STYLE,
            );
        }
    }
}

/// Everything the background depends on
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct BackgroundKey {
    area: Rect,
    grid: Grid,
    cell_size: u16,
    border_mode: BorderMode,
    fidelity: Fidelity,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Background {
    key: BackgroundKey,
    buffer: Buffer,
}

impl Background {
    fn new(key: BackgroundKey) -> Background {
        let mut buffer = Buffer::empty(key.area);
        let border_area = Rect {
            x: key.area.x.saturating_add(LABEL_GUTTER),
            width: key.area.width.saturating_sub(LABEL_GUTTER),
            ..key.area
        };
        match key.border_mode {
            BorderMode::Die => Block::bordered().render(border_area, &mut buffer),
            BorderMode::Wrap => DottedBorder.render(border_area, &mut buffer),
            BorderMode::Bounce => Block::bordered()
                .border_type(BorderType::Double)
                .render(border_area, &mut buffer),
        }
        let board = board_rect(key.area);
        let mut painter = Painter {
            area: board,
            cell_size: key.cell_size,
            buf: &mut buffer,
        };
        if key.fidelity == Fidelity::Full {
            for cell in key.grid.cells() {
                let shade = if (cell.x + cell.y) % 2 == 0 {
                    consts::BOARD_LIGHT
                } else {
                    consts::BOARD_DARK
                };
                painter.fill(cell, shade);
            }
        }
        let (cell_width, cell_height) = cell_extent(key.cell_size);
        for x in (0..key.grid.width()).step_by(usize::from(consts::LABEL_STEP)) {
            put_str(
                &mut buffer,
                board.x.saturating_add(x.saturating_mul(cell_width)),
                key.area.y,
                &x.to_string(),
            );
        }
        for y in (0..key.grid.height()).step_by(usize::from(consts::LABEL_STEP)) {
            put_str(
                &mut buffer,
                key.area.x,
                board.y.saturating_add(y.saturating_mul(cell_height)),
                &format!("{y:>2}"),
            );
        }
        Background { key, buffer }
    }
}

fn put_str(buf: &mut Buffer, x: u16, y: u16, s: &str) {
    let mut pos = Position::new(x, y);
    for ch in s.chars() {
        if !buf.area.contains(pos) {
            return;
        }
        if let Some(cell) = buf.cell_mut(pos) {
            cell.set_char(ch).set_style(consts::LABEL_STYLE);
        }
        pos.x = pos.x.saturating_add(1);
    }
}

/// The terminal columns & rows occupied by one grid cell
fn cell_extent(cell_size: u16) -> (u16, u16) {
    (cell_size.saturating_mul(consts::CELL_COLUMNS), cell_size)
}

/// The size of the board including its border and label gutter
fn frame_size(grid: Grid, cell_size: u16) -> Size {
    let (cell_width, cell_height) = cell_extent(cell_size);
    Size::new(
        grid.width()
            .saturating_mul(cell_width)
            .saturating_add(BORDER + LABEL_GUTTER),
        grid.height()
            .saturating_mul(cell_height)
            .saturating_add(BORDER),
    )
}

/// The area inside the border of a board drawn in `frame`
fn board_rect(frame: Rect) -> Rect {
    Rect {
        x: frame.x.saturating_add(LABEL_GUTTER + 1),
        y: frame.y.saturating_add(1),
        width: frame.width.saturating_sub(LABEL_GUTTER + BORDER),
        height: frame.height.saturating_sub(BORDER),
    }
}

fn head_symbol(direction: Direction) -> char {
    match direction {
        Direction::Up => consts::SNAKE_HEAD_UP_SYMBOL,
        Direction::Down => consts::SNAKE_HEAD_DOWN_SYMBOL,
        Direction::Left => consts::SNAKE_HEAD_LEFT_SYMBOL,
        Direction::Right => consts::SNAKE_HEAD_RIGHT_SYMBOL,
    }
}

/// Draws grid cells into the terminal cells they occupy
#[derive(Debug)]
struct Painter<'a> {
    area: Rect,
    cell_size: u16,
    buf: &'a mut Buffer,
}

impl Painter<'_> {
    fn cell_rect(&self, cell: Cell) -> Option<Rect> {
        let (width, height) = cell_extent(self.cell_size);
        let x = u16::try_from(cell.x).ok()?.checked_mul(width)?;
        let y = u16::try_from(cell.y).ok()?.checked_mul(height)?;
        let r = Rect {
            x: self.area.x.checked_add(x)?,
            y: self.area.y.checked_add(y)?,
            width,
            height,
        };
        Some(r.intersection(self.area).intersection(self.buf.area))
    }

    fn fill(&mut self, cell: Cell, color: Color) {
        if let Some(r) = self.cell_rect(cell) {
            for pos in r.positions() {
                if let Some(c) = self.buf.cell_mut(pos) {
                    c.set_bg(color);
                }
            }
        }
    }

    /// Draw `symbol` in the middle of the cell, keeping its background
    fn glyph(&mut self, cell: Cell, symbol: char, style: Style) {
        let Some(r) = self.cell_rect(cell) else {
            return;
        };
        if r.is_empty() {
            return;
        }
        let pos = Position::new(
            r.x + r.width.saturating_sub(1) / 2,
            r.y + r.height.saturating_sub(1) / 2,
        );
        if let Some(c) = self.buf.cell_mut(pos) {
            c.set_char(symbol).set_style(style);
        }
    }
}

/// The snake's body colours, from head to tail
#[derive(Clone, Debug, Eq, PartialEq)]
struct Gradient {
    fidelity: Fidelity,
    colors: Vec<Color>,
}

impl Gradient {
    fn new(fidelity: Fidelity) -> Gradient {
        let levels = match fidelity {
            Fidelity::Full => consts::GRADIENT_LEVELS,
            Fidelity::Reduced => consts::REDUCED_GRADIENT_LEVELS,
        };
        let steps = levels.saturating_sub(1).max(1);
        let colors = (0..levels)
            .map(|i| blend(consts::SNAKE_HEAD_COLOR, consts::SNAKE_TAIL_COLOR, i, steps))
            .collect();
        Gradient { fidelity, colors }
    }

    fn set_fidelity(&mut self, fidelity: Fidelity) {
        if self.fidelity != fidelity {
            *self = Gradient::new(fidelity);
        }
    }

    /// The colour of segment `index` of a snake of length `len`
    fn color(&self, index: usize, len: usize) -> Color {
        let levels = self.colors.len();
        let level = (index.saturating_mul(levels) / len.max(1)).min(levels.saturating_sub(1));
        self.colors.get(level).copied().unwrap_or(Color::Reset)
    }
}

impl Default for Gradient {
    fn default() -> Gradient {
        Gradient::new(Fidelity::default())
    }
}

fn blend(from: (u8, u8, u8), to: (u8, u8, u8), step: usize, steps: usize) -> Color {
    let step = i32::try_from(step).unwrap_or(i32::MAX);
    let steps = i32::try_from(steps).unwrap_or(i32::MAX).max(1);
    let channel = |a: u8, b: u8| {
        let (a, b) = (i32::from(a), i32::from(b));
        u8::try_from(a + (b - a) * step.min(steps) / steps).unwrap_or(u8::MAX)
    };
    Color::Rgb(
        channel(from.0, to.0),
        channel(from.1, to.1),
        channel(from.2, to.2),
    )
}

/// The border drawn around boards that the snake can pass through
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct DottedBorder;

impl Widget for DottedBorder {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let right = area.right().saturating_sub(1);
        let bottom = area.bottom().saturating_sub(1);
        for pos in area.positions() {
            let edge_x = pos.x == area.x || pos.x == right;
            let edge_y = pos.y == area.y || pos.y == bottom;
            let symbol = match (edge_x, edge_y) {
                (true, true) => '·',
                (false, true) => '⋯',
                (true, false) => '⋮',
                (false, false) => continue,
            };
            if let Some(cell) = buf.cell_mut(pos) {
                cell.set_char(symbol);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;
    use rstest::rstest;

    const RNG_SEED: u64 = 0x0123456789ABCDEF;

    /// The symbols of each row of `buf`, without styles
    pub(super) fn symbols(buf: &Buffer) -> Vec<String> {
        (buf.area.top()..buf.area.bottom())
            .map(|y| {
                (buf.area.left()..buf.area.right())
                    .filter_map(|x| buf.cell((x, y)))
                    .map(ratatui::buffer::Cell::symbol)
                    .collect()
            })
            .collect()
    }

    fn session(area: Rect, settings: Settings) -> GameSession<ChaCha12Rng> {
        let mut session =
            GameSession::new_with_rng(settings, ChaCha12Rng::seed_from_u64(RNG_SEED));
        let grid = fit_grid(area, settings.cell_size).unwrap();
        session.init(grid, None, 40);
        session
    }

    fn draw(scene: Scene<'_>, area: Rect, renderer: &mut Renderer) -> Buffer {
        let mut buf = Buffer::empty(area);
        scene.render(area, &mut buf, renderer);
        buf
    }

    #[rstest]
    #[case(Rect::new(0, 0, 80, 24), 1, Some(20))]
    #[case(Rect::new(0, 0, 80, 24), 2, Some(10))]
    #[case(Rect::new(0, 0, 40, 14), 1, Some(10))]
    #[case(Rect::new(0, 0, 30, 40), 1, Some(13))]
    #[case(Rect::new(0, 0, 300, 100), 1, Some(40))]
    #[case(Rect::new(0, 0, 80, 24), 3, Some(6))]
    #[case(Rect::new(0, 0, 13, 24), 1, None)]
    #[case(Rect::new(0, 0, 80, 8), 1, None)]
    fn test_fit_grid(#[case] area: Rect, #[case] cell_size: u16, #[case] side: Option<u16>) {
        assert_eq!(
            fit_grid(area, CellSize::new(cell_size).unwrap()),
            side.map(|s| Grid::new(s, s))
        );
    }

    #[test]
    fn board_layout() {
        let area = Rect::new(0, 0, 40, 14);
        let session = session(area, Settings::default());
        let overlay = Overlay::None;
        let mut renderer = Renderer::new();
        let buf = draw(Scene::new(&session, &overlay), area, &mut renderer);
        let rows = symbols(&buf);
        assert_eq!(rows[0].trim_end(), " Score: 0   High Score: 40");
        assert_eq!(buf.cell((10, 1)).unwrap().symbol(), "┌");
        assert_eq!(buf.cell((11, 1)).unwrap().symbol(), "0");
        assert_eq!(buf.cell((21, 1)).unwrap().symbol(), "5");
        assert_eq!(buf.cell((9, 2)).unwrap().symbol(), "0");
        assert_eq!(buf.cell((10, 2)).unwrap().symbol(), "│");
        // Seeded snake: head at (5, 5) moving right
        let head = buf.cell((21, 7)).unwrap();
        assert_eq!(head.symbol(), "<");
        assert_eq!(head.bg, Color::Rgb(120, 230, 90));
        assert_eq!(buf.cell((9, 7)).unwrap().symbol(), "5");
        for x in [17, 18, 19, 20] {
            assert_ne!(buf.cell((x, 7)).unwrap().bg, consts::BOARD_LIGHT);
            assert_ne!(buf.cell((x, 7)).unwrap().bg, consts::BOARD_DARK);
        }
        let food = session.board().unwrap().food().unwrap();
        let fx = 11 + u16::try_from(food.x).unwrap() * 2;
        let fy = 2 + u16::try_from(food.y).unwrap();
        assert_eq!(buf.cell((fx, fy)).unwrap().symbol(), "●");
        assert!(rows[13].starts_with(" Pause (Space)"));
    }

    #[test]
    fn background_is_cached() {
        let area = Rect::new(0, 0, 40, 14);
        let session = session(area, Settings::default());
        let overlay = Overlay::None;
        let mut renderer = Renderer::new();
        draw(Scene::new(&session, &overlay), area, &mut renderer);
        draw(Scene::new(&session, &overlay).fps(Some(60.0)), area, &mut renderer);
        assert_eq!(renderer.rebuilds(), 1);
        let buf = draw(
            Scene::new(&session, &overlay).fidelity(Fidelity::Reduced),
            area,
            &mut renderer,
        );
        assert_eq!(renderer.rebuilds(), 2);
        // No checkerboard at reduced fidelity
        assert_eq!(buf.cell((11, 2)).unwrap().bg, Color::Reset);
        draw(
            Scene::new(&session, &overlay).fidelity(Fidelity::Reduced),
            Rect::new(0, 0, 44, 14),
            &mut renderer,
        );
        assert_eq!(renderer.rebuilds(), 3);
        renderer.invalidate();
        draw(
            Scene::new(&session, &overlay).fidelity(Fidelity::Reduced),
            Rect::new(0, 0, 44, 14),
            &mut renderer,
        );
        assert_eq!(renderer.rebuilds(), 4);
    }

    #[test]
    fn checkerboard() {
        let area = Rect::new(0, 0, 40, 14);
        let session = session(area, Settings::default());
        let overlay = Overlay::None;
        let buf = draw(Scene::new(&session, &overlay), area, &mut Renderer::new());
        assert_eq!(buf.cell((11, 2)).unwrap().bg, consts::BOARD_LIGHT);
        assert_eq!(buf.cell((12, 2)).unwrap().bg, consts::BOARD_LIGHT);
        assert_eq!(buf.cell((13, 2)).unwrap().bg, consts::BOARD_DARK);
        assert_eq!(buf.cell((11, 3)).unwrap().bg, consts::BOARD_DARK);
    }

    #[rstest]
    #[case(BorderMode::Die, "┌")]
    #[case(BorderMode::Wrap, "·")]
    #[case(BorderMode::Bounce, "╔")]
    fn border_style(#[case] border_mode: BorderMode, #[case] corner: &str) {
        let area = Rect::new(0, 0, 40, 14);
        let settings = Settings {
            border_mode,
            ..Settings::default()
        };
        let session = session(area, settings);
        let overlay = Overlay::None;
        let buf = draw(Scene::new(&session, &overlay), area, &mut Renderer::new());
        assert_eq!(buf.cell((10, 1)).unwrap().symbol(), corner);
    }

    #[test]
    fn game_over() {
        let area = Rect::new(0, 0, 40, 14);
        let mut session = session(area, Settings::default());
        while !session.is_ended() {
            session.tick().unwrap();
        }
        let overlay = Overlay::None;
        let buf = draw(Scene::new(&session, &overlay), area, &mut Renderer::new());
        let rows = symbols(&buf);
        assert!(rows[13].starts_with(" GAME OVER · Restart (r) · Quit (q)"));
        let head = session.board().unwrap().snake().head();
        let hx = 11 + u16::try_from(head.x).unwrap() * 2;
        let hy = 2 + u16::try_from(head.y).unwrap();
        assert_eq!(buf.cell((hx, hy)).unwrap().symbol(), "×");
    }

    #[test]
    fn too_small() {
        let area = Rect::new(0, 0, 40, 7);
        let session = GameSession::new_with_rng(
            Settings::default(),
            ChaCha12Rng::seed_from_u64(RNG_SEED),
        );
        let overlay = Overlay::None;
        let buf = draw(Scene::new(&session, &overlay), area, &mut Renderer::new());
        let rows = symbols(&buf);
        assert_eq!(rows[3], "           Terminal too small           ");
        assert!(rows[6].starts_with(" Enlarge the terminal"));
    }

    #[test]
    fn pause_overlay() {
        let area = Rect::new(0, 0, 40, 14);
        let mut session = session(area, Settings::default());
        session.pause().unwrap();
        let overlay = Overlay::Paused(PauseMenu::new());
        let buf = draw(Scene::new(&session, &overlay), area, &mut Renderer::new());
        let rows = symbols(&buf);
        assert_eq!(
            rows[4].chars().skip(9).take(22).collect::<String>(),
            "┌────── PAUSED ──────┐"
        );
        assert_eq!(rows[13].trim(), "");
    }

    #[test]
    fn gradient_levels() {
        let full = Gradient::new(Fidelity::Full);
        assert_eq!(full.colors.len(), consts::GRADIENT_LEVELS);
        assert_eq!(full.colors[0], Color::Rgb(120, 230, 90));
        assert_eq!(full.colors[7], Color::Rgb(30, 90, 30));
        assert_eq!(full.color(0, 3), Color::Rgb(120, 230, 90));
        assert_eq!(full.color(99, 100), Color::Rgb(30, 90, 30));
        let mut reduced = full.clone();
        reduced.set_fidelity(Fidelity::Reduced);
        assert_eq!(
            reduced.colors,
            [Color::Rgb(120, 230, 90), Color::Rgb(30, 90, 30)]
        );
        assert_eq!(reduced.color(1, 3), Color::Rgb(120, 230, 90));
        assert_eq!(reduced.color(2, 3), Color::Rgb(30, 90, 30));
    }
}
