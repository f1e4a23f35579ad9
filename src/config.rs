use crate::persistence::{FileStore, MemoryStore, Store};
use crate::settings::Settings;
use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Program configuration read from a configuration file
#[derive(Clone, Deserialize, Debug, Default, Eq, PartialEq)]
pub(crate) struct Config {
    /// Default settings when no settings have been saved
    #[serde(default)]
    pub(crate) settings: Settings,

    /// Settings about data files
    #[serde(default)]
    pub(crate) files: FileConfig,

    #[serde(default)]
    pub(crate) logging: LoggingConfig,
}

impl Config {
    /// Return the default configuration file path
    pub(crate) fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_local_dir()
            .map(|p| p.join("gridsnake").join("config.toml"))
            .ok_or(ConfigError::NoPath)
    }

    /// Read configuration from a file on disk.  If the file does not exist and
    /// `allow_missing` is true, a default `Config` value is returned.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the file could not be read or if the file's contents
    /// could not be deserialized.
    pub(crate) fn load(path: &Path, allow_missing: bool) -> Result<Config, ConfigError> {
        let content = match fs_err::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
                return Ok(Config::default())
            }
            Err(e) => return Err(ConfigError::Read(e)),
        };
        toml::from_str(&content).map_err(Into::into)
    }

    /// Return the directory in which game state should be stored: the
    /// directory given in the configuration or, if that is not set, the
    /// default data directory.  Return `None` if no directory is configured
    /// and the default could not be computed.
    pub(crate) fn data_dir(&self) -> Option<Cow<'_, Path>> {
        self.files
            .data_dir
            .as_deref()
            .map(Cow::from)
            .or_else(|| default_data_dir().map(Cow::from))
    }

    /// Return the file to which log messages should be written, if any
    pub(crate) fn log_file(&self) -> Option<Cow<'_, Path>> {
        self.logging
            .log_file
            .as_deref()
            .map(Cow::from)
            .or_else(|| default_data_dir().map(|p| Cow::from(p.join("gridsnake.log"))))
    }

    /// Construct the store in which game state will be kept.
    ///
    /// If `self.files.save_state` is `false`, or if no data directory could
    /// be determined, state is only kept in memory.
    pub(crate) fn store(&self) -> ConfiguredStore {
        if self.files.save_state {
            if let Some(dir) = self.data_dir() {
                return ConfiguredStore::File(FileStore::new(dir.into_owned()));
            }
        }
        ConfiguredStore::Memory(MemoryStore::new())
    }
}

fn default_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("gridsnake"))
}

#[derive(Clone, Deserialize, Debug, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct FileConfig {
    /// Directory in which the high score, settings, and saved run are stored
    data_dir: Option<PathBuf>,

    /// Whether to load & save game state on disk
    save_state: bool,
}

impl Default for FileConfig {
    fn default() -> FileConfig {
        FileConfig {
            data_dir: None,
            save_state: true,
        }
    }
}

#[derive(Clone, Deserialize, Debug, Default, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct LoggingConfig {
    log_file: Option<PathBuf>,

    /// Filter directive used when `GRIDSNAKE_LOG` is not set
    pub(crate) level: Option<String>,
}

/// The store selected by a [`Config`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum ConfiguredStore {
    File(FileStore),
    Memory(MemoryStore),
}

impl Store for ConfiguredStore {
    fn get(&self, key: &str) -> std::io::Result<Option<String>> {
        match self {
            ConfiguredStore::File(s) => s.get(key),
            ConfiguredStore::Memory(s) => s.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> std::io::Result<()> {
        match self {
            ConfiguredStore::File(s) => s.set(key, value),
            ConfiguredStore::Memory(s) => s.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> std::io::Result<()> {
        match self {
            ConfiguredStore::File(s) => s.remove(key),
            ConfiguredStore::Memory(s) => s.remove(key),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to determine path to local configuration directory")]
    NoPath,
    #[error("failed to read configuration file")]
    Read(#[from] std::io::Error),
    #[error("failed to parse configuration file")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::border::BorderMode;
    use crate::settings::{CellSize, TickInterval};
    use tempfile::tempdir;

    #[test]
    fn empty() {
        let cfg = toml::from_str::<Config>("").unwrap();
        assert_eq!(cfg, Config::default());
        assert!(cfg.files.save_state);
    }

    #[test]
    fn full() {
        let cfg = toml::from_str::<Config>(concat!(
            "[settings]\n",
            "tick-interval-ms = 150\n",
            "cell-size = 2\n",
            "border-mode = \"wrap\"\n",
            "\n",
            "[files]\n",
            "data-dir = \"/var/games/gridsnake\"\n",
            "save-state = false\n",
            "\n",
            "[logging]\n",
            "log-file = \"/tmp/gridsnake.log\"\n",
            "level = \"debug\"\n",
        ))
        .unwrap();
        assert_eq!(
            cfg.settings,
            Settings {
                tick_interval_ms: TickInterval::new(150).unwrap(),
                cell_size: CellSize::new(2).unwrap(),
                border_mode: BorderMode::Wrap,
            }
        );
        assert_eq!(
            cfg.data_dir().as_deref(),
            Some(Path::new("/var/games/gridsnake"))
        );
        assert!(!cfg.files.save_state);
        assert_eq!(
            cfg.log_file().as_deref(),
            Some(Path::new("/tmp/gridsnake.log"))
        );
        assert_eq!(cfg.logging.level.as_deref(), Some("debug"));
        assert_eq!(cfg.store(), ConfiguredStore::Memory(MemoryStore::new()));
    }

    #[test]
    fn invalid_setting() {
        let r = toml::from_str::<Config>("[settings]\ncell-size = 9\n");
        assert!(r.is_err());
    }

    #[test]
    fn file_store_from_data_dir() {
        let cfg = toml::from_str::<Config>("[files]\ndata-dir = \"/srv/snake\"\n").unwrap();
        assert_eq!(
            cfg.store(),
            ConfiguredStore::File(FileStore::new(PathBuf::from("/srv/snake")))
        );
    }

    #[test]
    fn load_missing() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        assert_eq!(Config::load(&path, true).unwrap(), Config::default());
        assert!(matches!(
            Config::load(&path, false),
            Err(ConfigError::Read(_))
        ));
    }

    #[test]
    fn load_unparseable() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs_err::write(&path, "[files\n").unwrap();
        assert!(matches!(
            Config::load(&path, true),
            Err(ConfigError::Parse(_))
        ));
    }
}
