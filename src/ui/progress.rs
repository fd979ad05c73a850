use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::ui::icons::{CHECK, CROSS};

/// Spinner for a single blocking step such as starting a container.
///
/// Hidden when stderr is not a terminal, so piped output stays clean.
pub struct StepSpinner {
    bar: ProgressBar,
}

impl StepSpinner {
    pub fn start(message: impl Into<String>) -> Self {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .expect("progress bar template is a valid static string");

        let bar = if console::Term::stderr().is_term() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(style);
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn succeed(self, message: impl AsRef<str>) {
        self.bar.finish_and_clear();
        eprintln!("{}{}", CHECK, style(message.as_ref()).green());
    }

    pub fn fail(self, message: impl AsRef<str>) {
        self.bar.finish_and_clear();
        eprintln!("{}{}", CROSS, style(message.as_ref()).red());
    }

    /// Remove the spinner without printing anything.
    pub fn clear(self) {
        self.bar.finish_and_clear();
    }
}
