use crate::game::border::BorderMode;
use crate::util::EnumExt;
use enum_dispatch::enum_dispatch;
use enum_map::Enum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// User-adjustable gameplay settings.  Changing them reinitializes the game.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct Settings {
    #[serde(alias = "tick-interval-ms")]
    pub(crate) tick_interval_ms: TickInterval,
    #[serde(alias = "cell-size")]
    pub(crate) cell_size: CellSize,
    #[serde(alias = "border-mode")]
    pub(crate) border_mode: BorderMode,
}

impl Settings {
    pub(crate) fn get(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::Speed => self.tick_interval_ms.into(),
            SettingKey::CellSize => self.cell_size.into(),
            SettingKey::BorderMode => self.border_mode.into(),
        }
    }

    /// Set the setting for `key` to `value`.  A value of the wrong kind for
    /// the key is ignored.
    pub(crate) fn set(&mut self, key: SettingKey, value: SettingValue) {
        match (key, value) {
            (SettingKey::Speed, SettingValue::TickInterval(v)) => self.tick_interval_ms = v,
            (SettingKey::CellSize, SettingValue::CellSize(v)) => self.cell_size = v,
            (SettingKey::BorderMode, SettingValue::BorderMode(v)) => self.border_mode = v,
            (key, value) => tracing::warn!(?key, ?value, "Mismatched setting value ignored"),
        }
    }

    pub(crate) fn tick_interval(&self) -> Duration {
        self.tick_interval_ms.as_duration()
    }
}

#[derive(Clone, Copy, Debug, Enum, Eq, PartialEq)]
pub(crate) enum SettingKey {
    Speed,
    CellSize,
    BorderMode,
}

impl SettingKey {
    pub(crate) const DISPLAY_WIDTH: u16 = 9;

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            SettingKey::Speed => "Speed",
            SettingKey::CellSize => "Cell Size",
            SettingKey::BorderMode => "Border",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[enum_dispatch]
pub(crate) trait Adjustable {
    fn increase(&mut self);
    fn decrease(&mut self);
    fn toggle(&mut self);
    fn can_increase(&self) -> bool;
    fn can_decrease(&self) -> bool;
}

#[enum_dispatch(Adjustable)] // This also gives us From and TryInto
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SettingValue {
    TickInterval,
    CellSize,
    BorderMode,
}

impl SettingValue {
    pub(crate) const DISPLAY_WIDTH: u16 = 12;
}

// This is needed for EnumMap to be convenient to construct.
impl Default for SettingValue {
    fn default() -> SettingValue {
        SettingValue::TickInterval(TickInterval::default())
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let left = if self.can_decrease() { '◀' } else { '◁' };
        let right = if self.can_increase() { '▶' } else { '▷' };
        match *self {
            SettingValue::TickInterval(ti) => write!(f, "{left} {ti:^8} {right}"),
            SettingValue::CellSize(cs) => write!(f, "{left} {cs:^8} {right}"),
            SettingValue::BorderMode(bm) => write!(f, "{left} {bm:^8} {right}"),
        }
    }
}

/// Time between snake movements, in milliseconds
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "u64", into = "u64")]
pub(crate) struct TickInterval(u64);

impl TickInterval {
    pub(crate) const MINIMUM: u64 = 50;
    pub(crate) const MAXIMUM: u64 = 500;
    pub(crate) const STEP: u64 = 25;

    pub(crate) fn new(ms: u64) -> Option<TickInterval> {
        ((Self::MINIMUM..=Self::MAXIMUM).contains(&ms) && ms % Self::STEP == 0)
            .then_some(TickInterval(ms))
    }

    pub(crate) fn as_duration(self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl Default for TickInterval {
    fn default() -> TickInterval {
        TickInterval(100)
    }
}

impl TryFrom<u64> for TickInterval {
    type Error = RangeError;

    fn try_from(ms: u64) -> Result<TickInterval, RangeError> {
        TickInterval::new(ms).ok_or(RangeError {
            what: "tick interval",
            value: ms,
        })
    }
}

impl From<TickInterval> for u64 {
    fn from(value: TickInterval) -> u64 {
        value.0
    }
}

impl fmt::Display for TickInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{}ms", self.0))
    }
}

// Moving left in the settings panel makes the game slower, i.e., the
// interval longer.
impl Adjustable for TickInterval {
    fn increase(&mut self) {
        if self.can_increase() {
            self.0 -= Self::STEP;
        }
    }

    fn decrease(&mut self) {
        if self.can_decrease() {
            self.0 += Self::STEP;
        }
    }

    fn toggle(&mut self) {}

    fn can_increase(&self) -> bool {
        self.0 > Self::MINIMUM
    }

    fn can_decrease(&self) -> bool {
        self.0 < Self::MAXIMUM
    }
}

/// Size of a grid cell, in terminal rows
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "u64", into = "u64")]
pub(crate) struct CellSize(u16);

impl CellSize {
    pub(crate) const MINIMUM: u16 = 1;
    pub(crate) const MAXIMUM: u16 = 3;

    pub(crate) fn new(size: u16) -> Option<CellSize> {
        (Self::MINIMUM..=Self::MAXIMUM)
            .contains(&size)
            .then_some(CellSize(size))
    }

    pub(crate) fn get(self) -> u16 {
        self.0
    }
}

impl Default for CellSize {
    fn default() -> CellSize {
        CellSize(1)
    }
}

impl TryFrom<u64> for CellSize {
    type Error = RangeError;

    fn try_from(size: u64) -> Result<CellSize, RangeError> {
        u16::try_from(size)
            .ok()
            .and_then(CellSize::new)
            .ok_or(RangeError {
                what: "cell size",
                value: size,
            })
    }
}

impl From<CellSize> for u64 {
    fn from(value: CellSize) -> u64 {
        u64::from(value.0)
    }
}

impl fmt::Display for CellSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0.to_string())
    }
}

impl Adjustable for CellSize {
    fn increase(&mut self) {
        if self.can_increase() {
            self.0 += 1;
        }
    }

    fn decrease(&mut self) {
        if self.can_decrease() {
            self.0 -= 1;
        }
    }

    fn toggle(&mut self) {}

    fn can_increase(&self) -> bool {
        self.0 < Self::MAXIMUM
    }

    fn can_decrease(&self) -> bool {
        self.0 > Self::MINIMUM
    }
}

impl Adjustable for BorderMode {
    fn increase(&mut self) {
        if let Some(mode) = self.next() {
            *self = mode;
        }
    }

    fn decrease(&mut self) {
        if let Some(mode) = self.prev() {
            *self = mode;
        }
    }

    fn toggle(&mut self) {
        *self = self.next().unwrap_or_else(BorderMode::min);
    }

    fn can_increase(&self) -> bool {
        *self != BorderMode::max()
    }

    fn can_decrease(&self) -> bool {
        *self != BorderMode::min()
    }
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("{what} out of range: {value}")]
pub(crate) struct RangeError {
    what: &'static str,
    value: u64,
}
