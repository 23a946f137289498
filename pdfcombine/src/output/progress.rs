//! Per-source progress display.
//!
//! The bar is drawn on stderr so that machine-readable output on stdout
//! (e.g. `list --json`) is never interleaved with it. It only draws when
//! stderr is a terminal.
//!
//! # Examples
//!
//! ```
//! use pdfcombine::output::progress::{ProgressBar, ProgressStyle};
//!
//! let mut progress = ProgressBar::new(3, ProgressStyle::Bar);
//! for (name, skipped) in [("plan.pdf", false), ("notes.txt", true), ("photo.png", false)] {
//!     progress.advance(name, skipped);
//! }
//! progress.finish_with_message("done");
//! ```

use std::io::{self, IsTerminal, Write};
use std::time::{Duration, Instant};

/// Style of progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStyle {
    /// Bar with percentage: `[=======>     ] 60% 3/5`
    Bar,
    /// Counter only: `3/5`
    Counter,
}

const BAR_WIDTH: usize = 30;

/// Progress bar counting processed sources.
#[derive(Debug)]
pub struct ProgressBar {
    total: usize,
    current: usize,
    skipped: usize,
    style: ProgressStyle,
    message: Option<String>,
    start_time: Instant,
    enabled: bool,
}

impl ProgressBar {
    /// Create a new progress bar.
    pub fn new(total: usize, style: ProgressStyle) -> Self {
        Self {
            total,
            current: 0,
            skipped: 0,
            style,
            message: None,
            start_time: Instant::now(),
            enabled: io::stderr().is_terminal(),
        }
    }

    /// Bar for a known total, counter otherwise.
    pub fn auto(total: usize) -> Self {
        let style = if total > 1 {
            ProgressStyle::Bar
        } else {
            ProgressStyle::Counter
        };
        Self::new(total, style)
    }

    /// Create a progress bar that never draws.
    pub fn disabled() -> Self {
        let mut pb = Self::new(0, ProgressStyle::Counter);
        pb.enabled = false;
        pb
    }

    /// Bar for a compile over `sources` files; never draws when `quiet`.
    pub fn for_sources(sources: usize, quiet: bool) -> Self {
        if quiet {
            let mut pb = Self::disabled();
            pb.total = sources;
            pb
        } else {
            Self::auto(sources)
        }
    }

    /// Set the label shown before the bar.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Count one more processed source, labelled with its file name.
    pub fn advance(&mut self, file_name: impl Into<String>, skipped: bool) {
        self.current += 1;
        if skipped {
            self.skipped += 1;
        }
        self.set_message(file_name);
        self.draw();
    }

    /// Sources counted as skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Complete the bar, print `message` in its place and end the line.
    pub fn finish_with_message(&mut self, message: impl Into<String>) {
        self.current = self.total;
        self.set_message(message);
        if self.enabled {
            self.draw();
            eprintln!();
        }
    }

    /// Erase the bar, e.g. before printing a warning.
    pub fn clear(&self) {
        if self.enabled {
            eprint!("\r\x1b[K");
            io::stderr().flush().ok();
        }
    }

    /// Progress as a percentage.
    pub fn percent(&self) -> f64 {
        if self.total > 0 {
            (self.current as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Time since the bar was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn draw(&self) {
        if !self.enabled {
            return;
        }
        eprint!("\r\x1b[K{}", self.render_line());
        io::stderr().flush().ok();
    }

    /// The text the bar currently shows.
    pub fn render_line(&self) -> String {
        let counter = format!("{}/{}", self.current, self.total);
        let elapsed = format_duration(self.elapsed());

        let mut parts = Vec::with_capacity(5);
        if let Some(msg) = &self.message {
            parts.push(msg.clone());
        }
        if self.style == ProgressStyle::Bar {
            parts.push(render_bar(self.current, self.total));
            parts.push(format!("{:.0}%", self.percent()));
        }
        parts.push(counter);
        if self.skipped > 0 {
            parts.push(format!("({} skipped)", self.skipped));
        }
        parts.push(elapsed);

        parts.join(" ")
    }
}

fn render_bar(current: usize, total: usize) -> String {
    let filled = (BAR_WIDTH * current.min(total)) / total.max(1);
    let head = if filled > 0 && filled < BAR_WIDTH { ">" } else { "" };
    let body = "=".repeat(if head.is_empty() { filled } else { filled - 1 });
    format!("[{body}{head}{}]", " ".repeat(BAR_WIDTH - filled))
}

/// Format a duration as a human-readable string.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
