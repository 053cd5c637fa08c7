//! Spinners shown while extraction, repacking and hashing are in flight.
//!
//! Those stages can run for minutes on a 3 GB image, so the spinner carries
//! the elapsed time and the finished line keeps it.

#![allow(clippy::expect_used)] // Templates are compile-time constants

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"];
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Start a spinner for one pipeline stage.
#[must_use]
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(TICKS)
            .template("  {spinner:.cyan} {msg} {elapsed:.dim}")
            .expect("valid template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(TICK_INTERVAL);
    pb
}

/// Turn the stage's spinner into a `✓` line with the time it took.
pub fn finish_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {prefix:.green} {msg} {elapsed:.dim}")
            .expect("valid template"),
    );
    pb.set_prefix("✓");
    pb.finish_with_message(msg.to_string());
}

/// Erase an unfinished spinner, e.g. when the stage failed.
pub fn abandon(pb: &ProgressBar) {
    pb.finish_and_clear();
}
