//! Presentation-layer implementations of `ProgressReporter` and `OutcomeSink`.
//!
//! Application services emit progress and outcomes through these ports
//! without depending on any presentation type directly.

use std::sync::{Mutex, PoisonError};

use owo_colors::OwoColorize as _;
use winsvc_common::UpdateOutcome;

use crate::application::ports::{OutcomeSink, ProgressReporter, UpdateReport};
use crate::output::{OutputContext, Styles};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// - `step()` prints `"  → {message}"` (suppressed when `ctx.quiet`)
/// - `success()` prints `"  ✓ {message}"` (suppressed when `ctx.quiet`)
/// - `warn()` prints `"  ! {message}"` (suppressed when `ctx.quiet`)
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if !self.ctx.quiet {
            println!("  {} {message}", "→".style(self.ctx.styles.info));
        }
    }

    fn success(&self, message: &str) {
        if !self.ctx.quiet {
            println!("  {} {message}", "✓".style(self.ctx.styles.success));
        }
    }

    fn warn(&self, message: &str) {
        if !self.ctx.quiet {
            println!("  {} {message}", "!".style(self.ctx.styles.warning));
        }
    }
}

/// Prints each update outcome as it arrives, one line or one JSON object
/// per report, and remembers the outcomes for the exit status.
pub struct ConsoleSink {
    styles: Styles,
    json: bool,
    seen: Mutex<Vec<UpdateOutcome>>,
}

impl ConsoleSink {
    #[must_use]
    pub fn new(ctx: &OutputContext) -> Self {
        Self {
            styles: ctx.styles,
            json: ctx.json,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Outcomes reported so far, in arrival order.
    #[must_use]
    pub fn outcomes(&self) -> Vec<UpdateOutcome> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn human_line(&self, report: &UpdateReport) -> String {
        let style = match report.outcome {
            UpdateOutcome::Success => self.styles.success,
            o if o.needs_attention() => self.styles.error,
            _ => self.styles.dim,
        };
        let mut line = format!(
            "  {}  {}  {}",
            report.node,
            report.outcome.style(style),
            report.target.display()
        );
        if let Some(detail) = &report.detail {
            line.push_str(&format!("  ({detail})"));
        }
        line
    }
}

impl OutcomeSink for ConsoleSink {
    fn report(&self, report: &UpdateReport) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.outcome);
        if self.json {
            match serde_json::to_string(report) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::error!(error = %e, "cannot serialize update report"),
            }
        } else {
            println!("{}", self.human_line(report));
        }
    }
}
