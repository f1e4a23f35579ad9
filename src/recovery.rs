use crate::consts;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::Write;
use std::time::Instant;
use tracing::{error, warn};

/// Tracks recent runtime errors and decides when the game should be reset
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct ErrorHandler {
    recent: VecDeque<Instant>,
}

impl ErrorHandler {
    pub(crate) fn new() -> ErrorHandler {
        ErrorHandler::default()
    }

    /// Log `err` and record it.  Once [`ERROR_LIMIT`][consts::ERROR_LIMIT]
    /// errors have been reported within
    /// [`ERROR_WINDOW`][consts::ERROR_WINDOW], the record is cleared and
    /// [`Verdict::Reset`] is returned.
    pub(crate) fn report(&mut self, err: &(dyn Error + 'static), now: Instant) -> Verdict {
        error!(error = %chain(err), "Runtime error");
        while self
            .recent
            .front()
            .is_some_and(|&t| now.saturating_duration_since(t) > consts::ERROR_WINDOW)
        {
            self.recent.pop_front();
        }
        self.recent.push_back(now);
        if self.recent.len() >= consts::ERROR_LIMIT {
            warn!(
                errors = self.recent.len(),
                "Too many errors in a short time; resetting game"
            );
            self.recent.clear();
            Verdict::Reset
        } else {
            Verdict::Tolerated
        }
    }

    /// The number of errors currently on record
    #[cfg(test)]
    pub(crate) fn count(&self) -> usize {
        self.recent.len()
    }
}

/// What the caller should do after an error has been reported
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Verdict {
    Tolerated,
    Reset,
}

/// Render an error together with all of its sources, separated by colons
pub(crate) fn chain(err: &(dyn Error + 'static)) -> String {
    let mut s = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        let _ = write!(s, ": {e}");
        source = e.source();
    }
    s
}
