//! Terminal presentation: notifications, spinners and streamed model output.

pub mod icons;
pub mod progress;

use std::io::Write;

use console::style;

use crate::turn::FragmentSink;
use icons::{CHECK, CROSS, SPARKLE, WARN};

pub use progress::StepSpinner;

pub fn success(message: impl AsRef<str>) {
    eprintln!("{}{}", CHECK, style(message.as_ref()).green());
}

pub fn warning(message: impl AsRef<str>) {
    eprintln!("{}{}", WARN, style(message.as_ref()).yellow());
}

pub fn error(message: impl AsRef<str>) {
    eprintln!("{}{}", CROSS, style(message.as_ref()).red());
}

pub fn info(message: impl AsRef<str>) {
    eprintln!("{}{}", SPARKLE, message.as_ref());
}

/// Writes model fragments to stdout as they arrive.
#[derive(Debug, Default)]
pub struct StdoutSink {
    wrote_any: bool,
    ends_with_newline: bool,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminate the streamed text with a newline if it lacks one.
    pub fn finish(&mut self) {
        if self.wrote_any && !self.ends_with_newline {
            println!();
        }
        self.wrote_any = false;
        self.ends_with_newline = false;
    }
}

impl FragmentSink for StdoutSink {
    fn fragment(&mut self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout must not abort the turn.
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
        self.wrote_any = true;
        self.ends_with_newline = text.ends_with('\n');
    }
}
