//! Streaming, colorized terminal output.
//!
//! Each event prints as `[yy-mm-dd HH:MM:SS] message`, wrapped to the terminal width. When
//! tailing a log set every row starts with an indicator column: one slot per target, only the
//! slot of the event's target filled with its color, so interleaved sources stay readable.
//! A divider rule separates distinct timestamps and source switches.

use crate::error::Result;
use crate::event::{LogEvent, LogSet};
use crate::render::{EventSink, Theme};
use chrono::{Local, TimeZone};
use ratatui::crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal,
};
use std::io::{self, Write};
use unicode_width::UnicodeWidthChar;

/// Columns reserved next to the message for timestamp and indicators
const RESERVED_COLUMNS: usize = 48;
/// Narrowest message column, whatever the terminal reports
const MIN_MESSAGE_WIDTH: usize = 20;
/// Width assumed when the output is not a terminal
const FALLBACK_WIDTH: u16 = 120;
/// Columns the divider leaves free
const DIVIDER_MARGIN: usize = 8;

const TIMESTAMP_FORMAT: &str = "%y-%m-%d %H:%M:%S";

/// Renders batches to any writer; stdout in production
pub struct TerminalRenderer<W: Write> {
    out: W,
    theme: Theme,
    log_set: Option<LogSet>,
    fixed_width: Option<u16>,
    /// Slot of the last drawn target; dividers take its color
    last_slot: Option<usize>,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout(theme: Theme) -> Self {
        Self::new(io::stdout(), theme)
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, theme: Theme) -> Self {
        Self {
            out,
            theme,
            log_set: None,
            fixed_width: None,
            last_slot: None,
        }
    }

    /// Use a fixed width instead of querying the terminal
    pub fn with_width(mut self, width: u16) -> Self {
        self.fixed_width = Some(width);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn width(&self) -> usize {
        let width = self
            .fixed_width
            .or_else(|| terminal::size().ok().map(|(columns, _)| columns))
            .unwrap_or(FALLBACK_WIDTH);
        usize::from(width)
    }

    fn slot_of(&self, event: &LogEvent) -> Option<usize> {
        let set = self.log_set.as_ref()?;
        let source = event.source.as_ref()?;
        set.index_of(&source.name)
    }

    fn slot_count(&self) -> usize {
        self.log_set.as_ref().map_or(0, |set| set.targets.len())
    }

    fn set_bg(&mut self, color: Color) -> io::Result<()> {
        if self.theme.colored {
            queue!(self.out, SetBackgroundColor(color))?;
        }
        Ok(())
    }

    fn set_fg(&mut self, color: Color) -> io::Result<()> {
        if self.theme.colored {
            queue!(self.out, SetForegroundColor(color))?;
        }
        Ok(())
    }

    fn reset(&mut self) -> io::Result<()> {
        if self.theme.colored {
            queue!(self.out, ResetColor)?;
        }
        Ok(())
    }

    /// Filled block of one slot; monochrome output marks it with `#`
    fn write_block(&mut self, color: Color) -> io::Result<()> {
        let width = self.theme.indicator_width;
        let fill = if self.theme.colored { " " } else { "#" };
        self.set_bg(color)?;
        queue!(self.out, Print(fill.repeat(width)))?;
        self.reset()
    }

    fn write_indicator(&mut self, slot: usize) -> io::Result<()> {
        let width = self.theme.indicator_width;
        let count = self.slot_count().max(slot + 1);
        let color = self.theme.target_color(slot);

        queue!(self.out, Print(" ".repeat(slot * width)))?;
        self.write_block(color)?;
        queue!(self.out, Print(" ".repeat((count - slot - 1) * width)))
    }

    fn write_divider(&mut self) -> io::Result<()> {
        match self.last_slot {
            Some(slot) => self.write_indicator(slot)?,
            None => {
                let neutral = self.theme.neutral_indicator;
                self.write_block(neutral)?;
            }
        }
        let rule_width = self.width().saturating_sub(DIVIDER_MARGIN);
        let rule: String = std::iter::repeat(self.theme.divider_glyph)
            .take(rule_width)
            .collect();
        let divider = self.theme.divider;
        self.set_fg(divider)?;
        queue!(self.out, Print(rule))?;
        self.reset()?;
        queue!(self.out, Print("\n"))
    }

    fn write_legend(&mut self) -> io::Result<()> {
        let Some(set) = self.log_set.clone() else {
            return Ok(());
        };
        for (slot, target) in set.targets.iter().enumerate() {
            self.write_indicator(slot)?;
            let color = self.theme.target_color(slot);
            self.set_fg(color)?;
            queue!(self.out, Print(format!(" {}", target.label())))?;
            self.reset()?;
            queue!(self.out, Print("\n"))?;
        }
        Ok(())
    }

    fn write_event(&mut self, event: &LogEvent, slot: Option<usize>) -> io::Result<()> {
        let stamp = format_timestamp(event.timestamp);
        let message_width = self
            .width()
            .saturating_sub(RESERVED_COLUMNS)
            .max(MIN_MESSAGE_WIDTH);

        for row in wrap_message(&event.message, message_width) {
            if let Some(slot) = slot {
                self.write_indicator(slot)?;
            }
            let timestamp_color = self.theme.timestamp;
            self.set_fg(timestamp_color)?;
            queue!(self.out, Print(format!("[{stamp}] ")))?;
            self.reset()?;
            queue!(self.out, Print(row), Print("\n"))?;
        }
        Ok(())
    }

    fn write_batch(&mut self, events: &[LogEvent]) -> io::Result<()> {
        let mut last_timestamp: Option<i64> = None;
        for event in events {
            let slot = self.slot_of(event);
            let source_changed = slot.is_some() && slot != self.last_slot;
            let time_advanced = last_timestamp.map_or(true, |last| last < event.timestamp);

            if source_changed {
                self.last_slot = slot;
            }
            if source_changed || time_advanced {
                self.write_divider()?;
            }
            self.write_event(event, slot)?;
            last_timestamp = Some(event.timestamp);
        }
        self.out.flush()
    }
}

impl<W: Write + Send> EventSink for TerminalRenderer<W> {
    fn begin(&mut self, log_set: Option<&LogSet>) -> Result<()> {
        self.log_set = log_set.cloned();
        self.write_legend()?;
        self.out.flush()?;
        Ok(())
    }

    fn render(&mut self, events: &[LogEvent]) -> Result<()> {
        self.write_batch(events)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.reset()?;
        self.out.flush()?;
        Ok(())
    }
}

/// `yy-mm-dd HH:MM:SS` in local time
pub fn format_timestamp(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(local) => local.format(TIMESTAMP_FORMAT).to_string(),
        None => timestamp_ms.to_string(),
    }
}

/// Split `message` into rows of at most `width` display columns; one row per line at least.
pub fn wrap_message(message: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();

    for line in message.trim_end_matches(['\n', '\r']).split('\n') {
        let line = line.trim_end_matches('\r');
        let mut row = String::new();
        let mut row_width = 0;
        for ch in line.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if row_width + ch_width > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            row.push(ch);
            row_width += ch_width;
        }
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LogTarget;
    use std::sync::Arc;

    fn render_to_string(log_set: Option<&LogSet>, events: &[LogEvent]) -> String {
        let mut renderer = TerminalRenderer::new(Vec::new(), Theme::monochrome()).with_width(80);
        renderer.begin(log_set).unwrap();
        renderer.render(events).unwrap();
        renderer.finish().unwrap();
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_wrap_message_by_width() {
        assert_eq!(wrap_message("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_message("", 4), vec![""]);
        assert_eq!(wrap_message("ab\ncd\n", 10), vec!["ab", "cd"]);
        assert_eq!(wrap_message("ab\r\n", 10), vec!["ab"]);
    }

    #[test]
    fn test_wrap_counts_wide_characters() {
        // each CJK character occupies two columns
        assert_eq!(wrap_message("日本語", 4), vec!["日本", "語"]);
    }

    #[test]
    fn test_single_target_output() {
        let events = vec![LogEvent::new(0, "hello"), LogEvent::new(0, "world")];
        let output = render_to_string(None, &events);
        let lines: Vec<_> = output.lines().collect();

        // one divider for the first timestamp, none for the repeated one
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("##"));
        assert!(lines[0].contains('─'));
        assert!(lines[1].ends_with("] hello"));
        assert!(lines[2].ends_with("] world"));
        assert!(!output.contains('\u{1b}'));
    }

    #[test]
    fn test_set_output_has_legend_and_indicators() {
        let set = LogSet {
            name: "pair".to_string(),
            targets: vec![
                LogTarget::with_alias("/aws/lambda/api", "api"),
                LogTarget::new("/aws/lambda/worker"),
            ],
        };
        let api = Arc::new(set.targets[0].clone());
        let worker = Arc::new(set.targets[1].clone());
        let events = vec![
            LogEvent::new(1_000, "from api").tagged(api),
            LogEvent::new(2_000, "from worker").tagged(worker),
        ];

        let output = render_to_string(Some(&set), &events);
        let lines: Vec<_> = output.lines().collect();

        assert_eq!(lines[0], "##   api");
        assert_eq!(lines[1], "  ## /aws/lambda/worker");
        assert!(lines[2].starts_with("##  ─"));
        assert!(lines[3].starts_with("##  ["));
        assert!(lines[3].ends_with("from api"));
        assert!(lines[4].starts_with("  ##─"));
        assert!(lines[5].starts_with("  ##["));
        assert!(lines[5].ends_with("from worker"));
    }

    #[test]
    fn test_colored_output_uses_escape_sequences() {
        let mut renderer = TerminalRenderer::new(Vec::new(), Theme::default()).with_width(80);
        renderer.render(&[LogEvent::new(0, "x")]).unwrap();
        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(output.contains('\u{1b}'));
    }
}
