//! Interactive disambiguation on the console.

use crate::error::{CwtailError, Result};
use crate::event::LogTarget;
use crate::resolver::Chooser;
use ratatui::crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, BufRead, Write};

const QUESTION: &str = "Which log group would you like to tail? ";

/// Lists candidates as `[index] name` and reads the answer from a line-oriented reader
pub struct ConsoleChooser<R, W> {
    input: R,
    output: W,
}

impl ConsoleChooser<io::BufReader<io::Stdin>, io::Stderr> {
    /// Prompt on stderr so that stdout only ever carries log events
    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stderr())
    }
}

impl<R: BufRead, W: Write> ConsoleChooser<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn write_candidates(&mut self, candidates: &[LogTarget]) -> io::Result<()> {
        for (index, candidate) in candidates.iter().enumerate() {
            queue!(
                self.output,
                SetForegroundColor(Color::Cyan),
                Print(format!("[{index}] ")),
                SetForegroundColor(Color::Green),
                Print(&candidate.name),
                ResetColor,
                Print("\n"),
            )?;
        }
        queue!(self.output, Print(QUESTION))?;
        self.output.flush()
    }
}

impl<R, W> Chooser for ConsoleChooser<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn choose(&mut self, candidates: &[LogTarget]) -> Result<String> {
        self.write_candidates(candidates)
            .map_err(|e| CwtailError::io("failed to write selection prompt", e))?;

        let mut answer = String::new();
        self.input
            .read_line(&mut answer)
            .map_err(|e| CwtailError::io("failed to read selection", e))?;
        Ok(answer)
    }
}
