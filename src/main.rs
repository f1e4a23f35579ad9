mod app;
mod command;
mod config;
mod consts;
mod driver;
mod game;
mod input;
mod logging;
mod perf;
mod persistence;
mod recovery;
mod settings;
mod ui;
mod util;
use crate::app::App;
use crate::config::Config;
use crate::persistence::Persistence;
use crate::recovery::chain;
use anyhow::Context;
use crossterm::event::{DisableFocusChange, EnableFocusChange};
use crossterm::execute;
use lexopt::{Arg, Parser};
use std::io::{self, ErrorKind};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

const USAGE: &str = "\
Usage: gridsnake [options]

Play Snake in the terminal

Options:
  -c, --config <FILE>   Read configuration from FILE
      --no-mouse        Do not capture the mouse for swipe steering
  -h, --help            Show this help and exit
  -V, --version         Show the program version and exit
";

/// What the command line asked for
#[derive(Clone, Debug, Eq, PartialEq)]
enum Action {
    Run {
        config: Option<PathBuf>,
        capture_mouse: bool,
    },
    Help,
    Version,
}

impl Action {
    fn from_parser(mut parser: Parser) -> Result<Action, lexopt::Error> {
        let mut config = None;
        let mut capture_mouse = true;
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('c') | Arg::Long("config") => {
                    config = Some(PathBuf::from(parser.value()?));
                }
                Arg::Long("no-mouse") => capture_mouse = false,
                Arg::Short('h') | Arg::Long("help") => return Ok(Action::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Action::Version),
                _ => return Err(arg.unexpected()),
            }
        }
        Ok(Action::Run {
            config,
            capture_mouse,
        })
    }
}

fn main() -> ExitCode {
    match Action::from_parser(Parser::from_env()) {
        Ok(Action::Run {
            config,
            capture_mouse,
        }) => run(config, capture_mouse),
        Ok(Action::Help) => {
            print!("{USAGE}");
            ExitCode::SUCCESS
        }
        Ok(Action::Version) => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("gridsnake: {e}\n\n{USAGE}");
            ExitCode::from(2)
        }
    }
}

fn run(config_path: Option<PathBuf>, capture_mouse: bool) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("gridsnake: {e:?}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init(&config) {
        eprintln!("gridsnake: logging disabled: {}", chain(&e));
    }
    info!(version = env!("CARGO_PKG_VERSION"), "Starting gridsnake");
    let app = App::new(
        Persistence::new(config.store()),
        config.settings,
        capture_mouse,
    );
    let terminal = ratatui::init();
    let focus_events = execute!(io::stdout(), EnableFocusChange);
    if let Err(ref e) = focus_events {
        warn!(error = %e, "Failed to enable focus events");
    }
    let r = app.run(terminal);
    if focus_events.is_ok() {
        if let Err(e) = execute!(io::stdout(), DisableFocusChange) {
            warn!(error = %e, "Failed to disable focus events");
        }
    }
    ratatui::restore();
    io_exit(r)
}

/// Load the configuration file given on the command line, which must exist,
/// or else the default configuration file, which need not
fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(&path, false)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => match Config::default_path() {
            Ok(path) => Config::load(&path, true)
                .with_context(|| format!("failed to load configuration from {}", path.display())),
            Err(_) => Ok(Config::default()),
        },
    }
}

fn io_exit(r: io::Result<()>) -> ExitCode {
    match r {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.kind() == ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(2)
        }
    }
}
