//! Terminal progress feedback.
//!
//! Long waits (camera start, the inference round trip) are wrapped in a
//! `StageGuard`: an indicatif spinner on a TTY, a plain `==>` line otherwise.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::IsTerminal;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UiMode {
    #[default]
    Auto,
    Plain,
    Pretty,
    /// No progress output at all (tests, scripted sessions).
    Quiet,
}

impl std::str::FromStr for UiMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value {
            "auto" => Ok(UiMode::Auto),
            "plain" => Ok(UiMode::Plain),
            "pretty" => Ok(UiMode::Pretty),
            "quiet" => Ok(UiMode::Quiet),
            other => Err(anyhow::anyhow!(
                "unknown ui mode '{}'; expected auto, plain, pretty or quiet",
                other
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool) -> Self {
        Self { mode, is_tty }
    }

    /// Mode from the CLI, TTY detection from stderr.
    pub fn for_stderr(mode: UiMode) -> Self {
        Self::new(mode, std::io::stderr().is_terminal())
    }

    pub fn quiet() -> Self {
        Self::new(UiMode::Quiet, false)
    }

    fn use_pretty(&self) -> bool {
        match self.mode {
            UiMode::Pretty | UiMode::Auto => self.is_tty,
            UiMode::Plain | UiMode::Quiet => false,
        }
    }

    pub fn stage(&self, name: &str) -> StageGuard {
        if self.mode == UiMode::Quiet {
            return StageGuard::new(name.to_string(), StageOutput::Silent);
        }
        if self.use_pretty() {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(format!("{name}…"));
            StageGuard::new(name.to_string(), StageOutput::Spinner(spinner))
        } else {
            eprintln!("==> {}", name);
            StageGuard::new(name.to_string(), StageOutput::Plain)
        }
    }
}

enum StageOutput {
    Silent,
    Plain,
    Spinner(ProgressBar),
}

pub struct StageGuard {
    name: String,
    start: Instant,
    output: StageOutput,
}

impl StageGuard {
    fn new(name: String, output: StageOutput) -> Self {
        Self {
            name,
            start: Instant::now(),
            output,
        }
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let message = format!("✔ {} ({})", self.name, format_duration(self.start.elapsed()));
        match &self.output {
            StageOutput::Silent => {}
            StageOutput::Plain => eprintln!("{message}"),
            StageOutput::Spinner(spinner) => spinner.finish_with_message(message),
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
