//! Terminal reporting for the command-line validator.

use std::io::{self, Write};
use std::ops::ControlFlow;

use crossterm::{queue, style};

use crate::validator::{EventHandler, HrmEvent, LogEventHandler, Outcome};

/// Logs every event and keeps a tally of what failed.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    log: LogEventHandler,
    errors: usize,
    /// Offset of the first failing snapshot.
    first_failure: Option<String>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failed(&self) -> bool {
        self.errors > 0
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    /// Print the one-line verdict for `outcome`.
    pub fn print_summary(&self, out: &mut impl Write, outcome: &Outcome) -> io::Result<()> {
        if outcome.passed() {
            queue!(
                out,
                style::SetForegroundColor(style::Color::Green),
                style::SetAttribute(style::Attribute::Bold),
                style::Print("Validation passed"),
                style::SetAttribute(style::Attribute::Reset),
                style::ResetColor,
                style::Print(format!(" ({} snapshots)\n", outcome.snapshots)),
            )?;
        } else {
            queue!(
                out,
                style::SetForegroundColor(style::Color::Red),
                style::SetAttribute(style::Attribute::Bold),
                style::Print("Validation failed"),
                style::SetAttribute(style::Attribute::Reset),
                style::ResetColor,
                style::Print(format!(
                    " ({} error{} in {} snapshots",
                    outcome.errors,
                    if outcome.errors == 1 { "" } else { "s" },
                    outcome.snapshots
                )),
            )?;
            if let Some(at) = &self.first_failure {
                queue!(
                    out,
                    style::SetAttribute(style::Attribute::Dim),
                    style::Print(format!(", first at {at}s")),
                    style::SetAttribute(style::Attribute::Reset),
                )?;
            }
            if outcome.aborted {
                queue!(out, style::Print(", stopped early"))?;
            }
            queue!(out, style::Print(")\n"))?;
        }
        out.flush()
    }
}

impl EventHandler for ConsoleReporter {
    fn debug(&mut self, event: &HrmEvent<'_>) {
        self.log.debug(event);
    }

    fn info(&mut self, event: &HrmEvent<'_>) {
        self.log.info(event);
    }

    fn warn(&mut self, event: &HrmEvent<'_>) {
        self.log.warn(event);
    }

    fn error(&mut self, event: &HrmEvent<'_>) -> ControlFlow<()> {
        self.errors += 1;
        self.first_failure
            .get_or_insert_with(|| event.time_offset.to_string());
        self.log.error(event)
    }
}
