//! Per-document progress display.
//!
//! # Examples
//!
//! ```
//! use docxcat::output::progress::{ProgressBar, ProgressStyle};
//!
//! let mut progress = ProgressBar::new(3, ProgressStyle::Bar);
//! progress.set_message("Merging");
//! for done in 1..=3 {
//!     progress.update(done);
//! }
//! progress.finish();
//! ```

use std::io::{self, IsTerminal, Write};
use std::time::{Duration, Instant};

/// Style of progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStyle {
    /// `[=====>    ] 50% 2/4 0s`
    Bar,
    /// `2/4 0s`
    Counter,
}

/// Progress indicator drawn on stderr when it is a terminal.
#[derive(Debug)]
pub struct ProgressBar {
    total: usize,
    current: usize,
    style: ProgressStyle,
    message: Option<String>,
    start_time: Instant,
    enabled: bool,
}

impl ProgressBar {
    /// Create a progress bar for `total` items.
    pub fn new(total: usize, style: ProgressStyle) -> Self {
        Self {
            total,
            current: 0,
            style,
            message: None,
            start_time: Instant::now(),
            enabled: io::stderr().is_terminal(),
        }
    }

    /// Create a progress bar that never draws.
    pub fn disabled() -> Self {
        let mut pb = Self::new(0, ProgressStyle::Counter);
        pb.enabled = false;
        pb
    }

    /// Set the message shown before the bar.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Move to `current` and redraw.
    pub fn update(&mut self, current: usize) {
        self.current = current;
        self.render();
    }

    /// Advance by one.
    pub fn increment(&mut self) {
        self.update(self.current + 1);
    }

    /// Draw the completed bar and end the line.
    pub fn finish(&mut self) {
        self.current = self.total;
        if self.enabled {
            self.render();
            eprintln!();
        }
    }

    /// Erase the bar.
    pub fn clear(&self) {
        if self.enabled {
            eprint!("\r\x1b[K");
            io::stderr().flush().ok();
        }
    }

    fn render(&self) {
        if !self.enabled {
            return;
        }
        eprint!("\r{}", self.line());
        io::stderr().flush().ok();
    }

    /// The text of the current frame.
    pub fn line(&self) -> String {
        let counter = format!("{}/{}", self.current, self.total);
        let elapsed = format_duration(self.start_time.elapsed());

        let mut parts = match self.style {
            ProgressStyle::Bar => vec![
                self.bar(40),
                format!("{:.0}%", self.percent()),
                counter,
                elapsed,
            ],
            ProgressStyle::Counter => vec![counter, elapsed],
        };
        if let Some(msg) = &self.message {
            parts.insert(0, msg.clone());
        }
        parts.join(" ")
    }

    fn bar(&self, width: usize) -> String {
        let filled = (width * self.current.min(self.total)) / self.total.max(1);
        let head = if filled > 0 {
            format!("{}>", "=".repeat(filled - 1))
        } else {
            String::new()
        };
        format!("[{head}{}]", " ".repeat(width - filled))
    }

    /// Completed share as a percentage.
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
}

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
