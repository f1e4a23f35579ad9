//! Pointer input: mouse capture and swipe gestures
use crate::consts;
use crate::game::direction::Direction;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use tracing::{debug, warn};

/// Live input wiring for a run.  Mouse capture is enabled for as long as
/// the subscription exists.
#[derive(Debug)]
pub(crate) struct InputSubscription {
    _capture: Option<MouseCapture>,
    swipe: SwipeTracker,
}

impl InputSubscription {
    /// Subscribe to pointer input.  If `capture_mouse` is false, no terminal
    /// mode is changed, and swipes are still classified for any mouse events
    /// that arrive.
    pub(crate) fn new(capture_mouse: bool) -> std::io::Result<InputSubscription> {
        let capture = if capture_mouse {
            Some(MouseCapture::enable()?)
        } else {
            None
        };
        Ok(InputSubscription {
            _capture: capture,
            swipe: SwipeTracker::default(),
        })
    }

    /// Feed a mouse event to the swipe tracker, returning the direction of
    /// a completed swipe
    pub(crate) fn handle_mouse(&mut self, ev: MouseEvent) -> Option<Direction> {
        self.swipe.handle(ev)
    }
}

/// Mouse capture, released on drop
#[derive(Debug)]
struct MouseCapture;

impl MouseCapture {
    fn enable() -> std::io::Result<MouseCapture> {
        execute!(std::io::stdout(), EnableMouseCapture)?;
        debug!("Mouse capture enabled");
        Ok(MouseCapture)
    }
}

impl Drop for MouseCapture {
    fn drop(&mut self) {
        match execute!(std::io::stdout(), DisableMouseCapture) {
            Ok(()) => debug!("Mouse capture disabled"),
            Err(e) => warn!(error = %e, "Failed to disable mouse capture"),
        }
    }
}

/// Turns a left-button press and release into a direction
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct SwipeTracker {
    origin: Option<(u16, u16)>,
}

impl SwipeTracker {
    pub(crate) fn handle(&mut self, ev: MouseEvent) -> Option<Direction> {
        match ev.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.origin = Some((ev.column, ev.row));
                None
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let (column, row) = self.origin.take()?;
                classify(
                    i32::from(ev.column) - i32::from(column),
                    (i32::from(ev.row) - i32::from(row)) * 2,
                )
            }
            _ => None,
        }
    }
}

/// Classify a displacement, in column-equivalents, as a swipe along its
/// dominant axis.  Ties go to the horizontal axis.
fn classify(dx: i32, dy: i32) -> Option<Direction> {
    if dx.abs().max(dy.abs()) < consts::MIN_SWIPE_DISTANCE {
        None
    } else if dx.abs() >= dy.abs() {
        Some(if dx > 0 { Direction::Right } else { Direction::Left })
    } else {
        Some(if dy > 0 { Direction::Down } else { Direction::Up })
    }
}
