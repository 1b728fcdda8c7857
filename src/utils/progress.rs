//! Build progress on the terminal, a no-op without the `progress` feature

use std::borrow::Cow;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Spinner naming the current build stage. Hidden when quiet.
pub struct BuildProgress {
    #[cfg(feature = "progress")]
    spinner: Option<ProgressBar>,
}

impl BuildProgress {
    #[cfg(feature = "progress")]
    pub fn start(quiet: bool, first_stage: &'static str) -> Self {
        let spinner = (!quiet).then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message(first_stage);
            spinner.enable_steady_tick(std::time::Duration::from_millis(80));
            spinner
        });
        BuildProgress { spinner }
    }

    #[cfg(not(feature = "progress"))]
    pub fn start(_quiet: bool, _first_stage: &'static str) -> Self {
        BuildProgress {}
    }

    /// Switch to the next stage
    #[cfg(feature = "progress")]
    pub fn stage(&self, msg: impl Into<Cow<'static, str>>) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(msg);
        }
    }

    #[cfg(not(feature = "progress"))]
    pub fn stage(&self, _msg: impl Into<Cow<'static, str>>) {}

    /// Stop spinning, leaving `msg` as the last line
    #[cfg(feature = "progress")]
    pub fn finish(self, msg: impl Into<Cow<'static, str>>) {
        if let Some(spinner) = self.spinner {
            spinner.finish_with_message(msg);
        }
    }

    #[cfg(not(feature = "progress"))]
    pub fn finish(self, _msg: impl Into<Cow<'static, str>>) {}
}
