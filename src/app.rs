use crate::command::Command;
use crate::driver::FrameDriver;
use crate::game::{GameSession, RunState, TickOutcome};
use crate::input::InputSubscription;
use crate::perf::PerfMonitor;
use crate::persistence::{Persistence, Store};
use crate::recovery::{chain, ErrorHandler, Verdict};
use crate::settings::Settings;
use crate::ui::paused::{PauseMenu, PauseOpt};
use crate::ui::settings_panel::{PanelChoice, SettingsPanel};
use crate::ui::{fit_grid, Overlay, Renderer, Scene};
use crossterm::event::{poll, read, Event};
use rand::Rng;
use ratatui::{
    backend::Backend,
    layout::{Position, Rect},
    Terminal,
};
use std::io;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// The top-level game loop: owns the session and everything that feeds it
/// or shows it
#[derive(Debug)]
pub(crate) struct App<S, R = rand::rngs::ThreadRng> {
    session: GameSession<R>,
    persistence: Persistence<S>,
    driver: FrameDriver,
    perf: PerfMonitor,
    errors: ErrorHandler,
    renderer: Renderer,
    overlay: Overlay,
    input: Option<InputSubscription>,
    capture_mouse: bool,
    viewport: Option<Rect>,
    quitting: bool,
}

impl<S: Store> App<S> {
    pub(crate) fn new(persistence: Persistence<S>, defaults: Settings, capture_mouse: bool) -> Self {
        App::new_with_rng(persistence, defaults, rand::rng(), capture_mouse)
    }
}

impl<S: Store, R: Rng> App<S, R> {
    /// Create an app using the saved settings, or `defaults` if there are
    /// none
    pub(crate) fn new_with_rng(
        persistence: Persistence<S>,
        defaults: Settings,
        rng: R,
        capture_mouse: bool,
    ) -> App<S, R> {
        let settings = match persistence.load_settings() {
            Ok(Some(settings)) => settings,
            Ok(None) => defaults,
            Err(e) => {
                warn!(error = %chain(&e), "Failed to load saved settings; using defaults");
                defaults
            }
        };
        App {
            session: GameSession::new_with_rng(settings, rng),
            persistence,
            driver: FrameDriver::new(settings.tick_interval()),
            perf: PerfMonitor::new(),
            errors: ErrorHandler::new(),
            renderer: Renderer::new(),
            overlay: Overlay::None,
            input: None,
            capture_mouse,
            viewport: None,
            quitting: false,
        }
    }

    pub(crate) fn run<B: Backend>(mut self, mut terminal: Terminal<B>) -> io::Result<()> {
        let r = self.run_loop(&mut terminal);
        self.shutdown(Instant::now());
        r
    }

    fn run_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        while !self.quitting {
            self.frame(terminal, Instant::now())?;
            self.process_input()?;
        }
        Ok(())
    }

    /// Wait for the next event, or for the next frame to be due
    fn process_input(&mut self) -> io::Result<()> {
        let ready = match self.driver.poll_timeout() {
            Some(timeout) => poll(timeout)?,
            None => true,
        };
        if ready {
            let event = read()?;
            self.handle_event(event, Instant::now());
        }
        Ok(())
    }

    /// Do one frame's work: follow the terminal size, advance the
    /// simulation if a tick is due, save state, and redraw
    fn frame<B: Backend>(&mut self, terminal: &mut Terminal<B>, now: Instant) -> io::Result<()> {
        let size = terminal.size()?;
        self.sync_viewport(Rect::from((Position::ORIGIN, size)), now);
        match self.driver.frame(&mut self.session, now) {
            Some(Ok(outcome)) => self.after_tick(outcome, now),
            Some(Err(e)) => self.report(&e, now),
            None => (),
        }
        if let Err(e) = self.persistence.flush(now) {
            warn!(error = %chain(&e), "Failed to save game state");
        }
        let scene = Scene::new(&self.session, &self.overlay)
            .fps(self.perf.fps())
            .fidelity(self.perf.fidelity());
        terminal.draw(|frame| {
            frame.render_stateful_widget(scene, frame.area(), &mut self.renderer);
        })?;
        // Only frames drawn while animating say anything about performance
        if self.driver.is_scheduled() {
            self.perf.record(now);
        } else {
            self.perf.clear();
        }
        Ok(())
    }

    fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::FocusLost => self.pause(now),
            Event::Mouse(ev) => {
                if let Some(direction) = self.input.as_mut().and_then(|i| i.handle_mouse(ev)) {
                    self.session.set_direction(direction);
                }
            }
            _ => {
                if let Some(cmd) = event
                    .as_key_press_event()
                    .and_then(Command::from_key_event)
                {
                    self.handle_command(cmd, now);
                }
            }
        }
    }

    fn handle_command(&mut self, cmd: Command, now: Instant) {
        if cmd == Command::Quit {
            debug!("Quit requested");
            self.quitting = true;
            return;
        }
        match std::mem::take(&mut self.overlay) {
            Overlay::Paused(mut menu) => match menu.handle_command(cmd) {
                Some(PauseOpt::Resume) => self.resume(now),
                Some(PauseOpt::Restart) => self.restart(now),
                Some(PauseOpt::Settings) => self.open_settings(now),
                Some(PauseOpt::Quit) => self.quitting = true,
                None => self.overlay = Overlay::Paused(menu),
            },
            Overlay::Settings(mut panel) => match panel.handle_command(cmd) {
                Some(PanelChoice::Apply(settings)) => self.apply_settings(settings, now),
                Some(PanelChoice::Cancel) => {
                    if self.session.state() == RunState::Paused {
                        self.overlay = Overlay::Paused(PauseMenu::new());
                    }
                }
                None => self.overlay = Overlay::Settings(panel),
            },
            Overlay::None => match (self.session.state(), cmd) {
                (RunState::Running, cmd) if cmd.toggles_pause() => self.pause(now),
                (RunState::Running, cmd) => match cmd.direction() {
                    Some(direction) => self.session.set_direction(direction),
                    None => self.run_command(cmd, now),
                },
                (RunState::Paused, cmd) if cmd.toggles_pause() => self.resume(now),
                (_, cmd) => self.run_command(cmd, now),
            },
        }
    }

    /// Handle the commands that apply outside of any pop-up and in any state
    fn run_command(&mut self, cmd: Command, now: Instant) {
        match (self.session.state(), cmd) {
            (RunState::Running | RunState::Paused, Command::Restart)
            | (RunState::Ended(_), Command::Restart | Command::Enter) => self.restart(now),
            (_, Command::Settings) => self.open_settings(now),
            _ => (),
        }
    }

    /// Track the terminal size.  A new size refits the board, or, if there
    /// is no board yet, retries initialization.
    fn sync_viewport(&mut self, area: Rect, now: Instant) {
        if self.viewport == Some(area) {
            return;
        }
        debug!(width = area.width, height = area.height, "Viewport changed");
        self.viewport = Some(area);
        self.renderer.invalidate();
        if !self.session.is_initialized() {
            self.try_init(area, now);
            return;
        }
        match fit_grid(area, self.session.settings().cell_size) {
            Some(grid) => {
                let was_ended = self.session.is_ended();
                if let Err(e) = self.session.resize(grid) {
                    self.report(&e, now);
                }
                if self.session.is_ended() && !was_ended {
                    self.end_run();
                }
            }
            None => {
                info!("Terminal too small for the current board; pausing");
                self.pause(now);
            }
        }
    }

    /// Build the board for the given viewport, resuming the saved run if
    /// there is one
    fn try_init(&mut self, area: Rect, now: Instant) {
        let Some(grid) = fit_grid(area, self.session.settings().cell_size) else {
            let e = InitError::SurfaceTooSmall {
                width: area.width,
                height: area.height,
            };
            self.report(&e, now);
            return;
        };
        let snapshot = self.persistence.load_snapshot().unwrap_or_else(|e| {
            warn!(error = %chain(&e), "Failed to load saved run");
            None
        });
        let high_score = self.persistence.load_high_score().unwrap_or_else(|e| {
            warn!(error = %chain(&e), "Failed to load high score");
            0
        });
        self.session.init(grid, snapshot, high_score);
        self.begin_run(now);
    }

    /// Start the frame driver and input subscription for a running session
    fn begin_run(&mut self, now: Instant) {
        if !self.session.is_running() {
            return;
        }
        self.driver.set_interval(self.session.settings().tick_interval());
        self.driver.start(now);
        if self.input.is_none() {
            match InputSubscription::new(self.capture_mouse) {
                Ok(input) => self.input = Some(input),
                Err(e) => self.report(&e, now),
            }
        }
    }

    fn after_tick(&mut self, outcome: TickOutcome, now: Instant) {
        if outcome.new_high_score {
            self.save_high_score();
        }
        if let Some(ending) = outcome.ending {
            info!(
                ?ending,
                score = self.session.score(),
                high_score = self.session.high_score(),
                "Run over"
            );
            self.end_run();
        } else {
            self.save_snapshot(now);
        }
    }

    /// Tear down a finished run: there is nothing left to resume
    fn end_run(&mut self) {
        self.driver.stop();
        self.input = None;
        self.save_high_score();
        if let Err(e) = self.persistence.clear_snapshot() {
            warn!(error = %chain(&e), "Failed to delete saved run");
        }
    }

    fn pause(&mut self, now: Instant) {
        if !self.session.is_running() {
            return;
        }
        if let Err(e) = self.session.pause() {
            self.report(&e, now);
            return;
        }
        self.driver.stop();
        self.overlay = Overlay::Paused(PauseMenu::new());
        self.save_snapshot(now);
        if let Err(e) = self.persistence.sync(now) {
            warn!(error = %chain(&e), "Failed to save game state");
        }
    }

    fn resume(&mut self, now: Instant) {
        match self.session.resume() {
            Ok(()) => {
                self.overlay = Overlay::None;
                self.begin_run(now);
            }
            Err(e) => self.report(&e, now),
        }
    }

    fn restart(&mut self, now: Instant) {
        match self.session.reset() {
            Ok(()) => {
                self.overlay = Overlay::None;
                if let Err(e) = self.persistence.clear_snapshot() {
                    warn!(error = %chain(&e), "Failed to delete saved run");
                }
                self.begin_run(now);
            }
            Err(e) => self.report(&e, now),
        }
    }

    fn open_settings(&mut self, now: Instant) {
        self.pause(now);
        self.overlay = Overlay::Settings(SettingsPanel::new(self.session.settings()));
    }

    /// Save new settings and rebuild the game with them.  The current run
    /// carries over if it still fits the board.
    fn apply_settings(&mut self, settings: Settings, now: Instant) {
        if let Err(e) = self.persistence.save_settings(settings) {
            warn!(error = %chain(&e), "Failed to save settings");
        }
        self.overlay = Overlay::None;
        if settings == self.session.settings() {
            if self.session.state() == RunState::Paused {
                self.resume(now);
            }
            return;
        }
        if self.session.is_initialized() && !self.session.is_ended() {
            self.save_snapshot(now);
            if let Err(e) = self.persistence.sync(now) {
                warn!(error = %chain(&e), "Failed to save game state");
            }
        }
        self.driver.stop();
        self.session.reconfigure(settings);
        self.renderer.invalidate();
        if let Some(area) = self.viewport {
            self.try_init(area, now);
        }
    }

    /// Send a runtime error to the error handler, resetting the game if too
    /// many have happened recently
    fn report(&mut self, err: &(dyn std::error::Error + 'static), now: Instant) {
        if self.errors.report(err, now) == Verdict::Reset && self.session.is_initialized() {
            self.overlay = Overlay::None;
            self.restart(now);
        }
    }

    fn save_snapshot(&mut self, now: Instant) {
        if let Some(snapshot) = self.session.snapshot() {
            if let Err(e) = self.persistence.save_snapshot(snapshot, now) {
                warn!(error = %chain(&e), "Failed to save game state");
            }
        }
    }

    fn save_high_score(&mut self) {
        if let Err(e) = self.persistence.save_high_score(self.session.high_score()) {
            warn!(error = %chain(&e), "Failed to save high score");
        }
    }

    /// Persist whatever is worth keeping before the program exits
    fn shutdown(&mut self, now: Instant) {
        if self.session.is_initialized() && !self.session.is_ended() {
            self.save_snapshot(now);
            if let Err(e) = self.persistence.sync(now) {
                warn!(error = %chain(&e), "Failed to save game state");
            }
        }
        self.save_high_score();
        self.driver.stop();
        self.input = None;
        info!(high_score = self.session.high_score(), "Exiting");
    }
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub(crate) enum InitError {
    #[error("terminal is too small for a playable board ({width}x{height})")]
    SurfaceTooSmall { width: u16, height: u16 },
}
