//! Color theme for streamed terminal output.

use ratatui::crossterm::style::Color;

/// Colors and glyphs used by the terminal renderer
#[derive(Debug, Clone)]
pub struct Theme {
    /// Emit ANSI colors at all
    pub colored: bool,

    /// Divider rule color
    pub divider: Color,

    /// Timestamp prefix color
    pub timestamp: Color,

    /// Indicator color when no target is active (single target mode)
    pub neutral_indicator: Color,

    /// Columns per indicator slot
    pub indicator_width: usize,

    /// Glyph used to draw dividers
    pub divider_glyph: char,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            colored: true,
            divider: Color::AnsiValue(244),
            timestamp: Color::AnsiValue(250),
            neutral_indicator: Color::AnsiValue(244),
            indicator_width: 2,
            divider_glyph: '─',
        }
    }
}

impl Theme {
    /// Theme without escape sequences, for pipes and `--no-color`
    pub fn monochrome() -> Self {
        Self {
            colored: false,
            ..Self::default()
        }
    }

    /// Color of the target at `index` in its log set: xterm palette entries 1, 2, 3, ...
    pub fn target_color(&self, index: usize) -> Color {
        Color::AnsiValue((index % 255 + 1) as u8)
    }
}
