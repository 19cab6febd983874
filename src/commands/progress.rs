// src/commands/progress.rs
//! Terminal progress for sync execution
//!
//! Wraps an indicatif bar so the executor can report per-record progress
//! through the library's `ProgressTracker` trait. When stderr is not a
//! terminal, progress goes to the log instead.

use indicatif::{ProgressBar, ProgressStyle};
use ledgersync::{LogProgress, ProgressTracker};
use std::io::IsTerminal;

/// Progress tracker for a sync run
///
/// Quiet runs get a hidden bar. A visible run on a non-terminal stderr
/// logs progress lines.
pub fn tracker(quiet: bool) -> Box<dyn ProgressTracker> {
    tracker_for(quiet, std::io::stderr().is_terminal())
}

fn tracker_for(quiet: bool, terminal: bool) -> Box<dyn ProgressTracker> {
    if quiet || terminal {
        Box::new(CliProgress::new(quiet))
    } else {
        Box::new(LogProgress::new("sync"))
    }
}

/// Progress bar shown while recommendations are applied
pub struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    /// A visible bar, or a hidden one in quiet mode
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        if let Ok(style) =
            ProgressStyle::with_template("{msg} ({pos}/{len}) [{bar:40.green/dim}] {percent}%")
        {
            bar.set_style(style.progress_chars("##-"));
        }
        Self { bar }
    }
}

impl ProgressTracker for CliProgress {
    fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn increment(&self, amount: u64) {
        self.bar.inc(amount);
    }

    fn reset(&self, length: u64) {
        self.bar.reset();
        self.bar.set_length(length);
    }

    fn position(&self) -> u64 {
        self.bar.position()
    }

    fn length(&self) -> u64 {
        self.bar.length().unwrap_or(0)
    }

    fn finish_with_message(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    fn finish_with_error(&self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }

    fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_progress_tracks_position() {
        let progress = CliProgress::new(true);
        progress.reset(3);
        progress.increment(2);
        assert_eq!(progress.position(), 2);
        assert_eq!(progress.length(), 3);

        progress.finish_with_message("done");
        assert!(progress.is_finished());
    }

    #[test]
    fn test_tracker_without_terminal_logs() {
        let progress = tracker_for(false, false);
        progress.reset(4);
        progress.increment(4);
        assert_eq!(progress.position(), 4);
        progress.finish_with_message("done");
        assert!(progress.is_finished());

        let quiet = tracker_for(true, false);
        quiet.reset(2);
        quiet.increment(1);
        assert_eq!(quiet.length(), 2);
    }
}
