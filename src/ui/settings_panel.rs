use crate::command::Command;
use crate::consts;
use crate::settings::{Adjustable, SettingKey, SettingValue, Settings};
use crate::util::EnumExt;
use enum_map::{Enum, EnumMap};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{
        block::{Block, Padding},
        Widget,
    },
};

/// A pop-up for editing the settings.  Edits are only applied when the user
/// confirms them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct SettingsPanel {
    selection: SettingKey,
    values: EnumMap<SettingKey, SettingValue>,
}

impl SettingsPanel {
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const HEIGHT: u16 = (SettingKey::LENGTH as u16) + 2 /* for border */ + 2 /* for hint */;
    const HORIZONTAL_PADDING: u16 = 1; // padding on each side
    const POINTER_WIDTH: u16 = 2;
    const LABEL_VALUE_GUTTER: u16 = 2;
    pub(crate) const WIDTH: u16 = 2 /* for border */ + 2 * Self::HORIZONTAL_PADDING + Self::POINTER_WIDTH + SettingKey::DISPLAY_WIDTH + Self::LABEL_VALUE_GUTTER + SettingValue::DISPLAY_WIDTH;

    pub(crate) fn new(settings: Settings) -> SettingsPanel {
        let values = EnumMap::from_iter(SettingKey::iter().map(|key| (key, settings.get(key))));
        SettingsPanel {
            selection: SettingKey::min(),
            values,
        }
    }

    pub(crate) fn to_settings(&self) -> Settings {
        let mut settings = Settings::default();
        for key in SettingKey::iter() {
            settings.set(key, self.values[key]);
        }
        settings
    }

    /// Handle a command.  Returns `Some` once the user has confirmed or
    /// dismissed the panel.
    pub(crate) fn handle_command(&mut self, cmd: Command) -> Option<PanelChoice> {
        match cmd {
            Command::Enter => return Some(PanelChoice::Apply(self.to_settings())),
            Command::Esc | Command::Settings => return Some(PanelChoice::Cancel),
            Command::Up => {
                if let Some(key) = self.selection.prev() {
                    self.selection = key;
                }
            }
            Command::Down => {
                if let Some(key) = self.selection.next() {
                    self.selection = key;
                }
            }
            Command::Next => {
                self.selection = self.selection.next().unwrap_or_else(SettingKey::min);
            }
            Command::Prev => {
                self.selection = self.selection.prev().unwrap_or_else(SettingKey::max);
            }
            Command::Home => self.selection = SettingKey::min(),
            Command::End => self.selection = SettingKey::max(),
            Command::Left => self.values[self.selection].decrease(),
            Command::Right => self.values[self.selection].increase(),
            Command::Space => self.values[self.selection].toggle(),
            Command::Quit | Command::Pause | Command::Restart => (),
        }
        None
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum PanelChoice {
    Apply(Settings),
    Cancel,
}

impl Widget for &SettingsPanel {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(" SETTINGS ")
            .title_alignment(Alignment::Center)
            .padding(Padding::horizontal(SettingsPanel::HORIZONTAL_PADDING))
            .style(Style::reset());
        let inner = block.inner(area);
        block.render(area, buf);
        let mut rows = inner.rows();
        for (key, row) in SettingKey::iter().zip(rows.by_ref()) {
            let selected = key == self.selection;
            let style = if selected {
                consts::MENU_SELECTION_STYLE
            } else {
                Style::new()
            };
            let s = format!(
                "{pointer:pwidth$}{key:lwidth$}{space:gutter$}{value}",
                pointer = if selected { "»" } else { "" },
                pwidth = usize::from(SettingsPanel::POINTER_WIDTH),
                lwidth = usize::from(SettingKey::DISPLAY_WIDTH),
                space = "",
                gutter = usize::from(SettingsPanel::LABEL_VALUE_GUTTER),
                value = self.values[key],
            );
            Span::styled(s, style).render(row, buf);
        }
        if let Some(row) = rows.nth(1) {
            Line::from_iter([
                Span::styled("Enter", consts::KEY_STYLE),
                Span::raw(" apply · "),
                Span::styled("Esc", consts::KEY_STYLE),
                Span::raw(" cancel"),
            ])
            .centered()
            .render(row, buf);
        }
    }
}
