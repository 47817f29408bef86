//! Console reporting for a generation run.
//!
//! Progress lines go to stdout, warnings to stderr. With a progress bar
//! enabled, lines are routed through the bar so they don't tear it.

use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::fmt::Display;

pub struct Console {
    quiet: bool,
    warnings: bool,
    bars: bool,
    bar: RefCell<Option<ProgressBar>>,
}

impl Console {
    /// Progress lines and warnings, no bar
    pub fn new() -> Self {
        Self {
            quiet: false,
            warnings: true,
            bars: false,
            bar: RefCell::new(None),
        }
    }

    /// Nothing at all; used by tests and library callers
    pub fn silent() -> Self {
        Self {
            quiet: true,
            warnings: false,
            ..Self::new()
        }
    }

    /// Suppress progress lines, keep warnings
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        self.bars = enabled;
        self
    }

    pub fn info(&self, message: impl Display) {
        if self.quiet {
            return;
        }
        match self.bar.borrow().as_ref() {
            Some(bar) => bar.println(message.to_string()),
            None => println!("{}", message),
        }
    }

    pub fn warn(&self, message: impl Display) {
        if !self.warnings {
            return;
        }
        match self.bar.borrow().as_ref() {
            Some(bar) => bar.suspend(|| eprintln!("warning: {}", message)),
            None => eprintln!("warning: {}", message),
        }
    }

    /// Start a bar counting accepted rows of one relation
    pub fn start_bar(&self, label: &str, total: u64) {
        if !self.bars || self.quiet {
            return;
        }
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
        );
        bar.set_message(label.to_string());
        *self.bar.borrow_mut() = Some(bar);
    }

    pub fn set_bar_position(&self, position: u64) {
        if let Some(bar) = self.bar.borrow().as_ref() {
            bar.set_position(position);
        }
    }

    pub fn finish_bar(&self) {
        if let Some(bar) = self.bar.borrow_mut().take() {
            bar.finish_and_clear();
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
