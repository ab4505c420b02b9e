//! Progress reporting for the submission loop.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::episodes::Episode;

/// Observer for submission progress.
pub trait ProgressReporter {
    /// Called once before the first submission.
    fn start(&mut self, total: usize);

    /// Called after episode `index` (1-based) of `total` was accepted.
    fn advance(&mut self, index: usize, total: usize, episode: &Episode);

    /// Called once when the loop ends, successfully or not.
    fn finish(&mut self);
}

/// Terminal progress bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for BarProgress {
    fn start(&mut self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        // The template is a literal; fall back to the default style rather than fail.
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/dim}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        self.bar = bar;
    }

    fn advance(&mut self, _index: usize, _total: usize, episode: &Episode) {
        self.bar.set_message(episode.name.clone());
        self.bar.inc(1);
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Emits one tracing event per episode; for non-interactive runs.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn start(&mut self, total: usize) {
        info!(total, "submitting episodes");
    }

    fn advance(&mut self, index: usize, total: usize, episode: &Episode) {
        info!(index, total, name = %episode.name, "episode ingested");
    }

    fn finish(&mut self) {}
}

/// Records every event; handy for asserting on the observed sequence.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingProgress {
    pub total: Option<usize>,
    /// `(index, total, episode name)` per advance call.
    pub steps: Vec<(usize, usize, String)>,
    pub finished: bool,
}

impl RecordingProgress {
    /// Steps rendered as `"index/total"`.
    pub fn fractions(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|(index, total, _)| format!("{index}/{total}"))
            .collect()
    }
}

impl ProgressReporter for RecordingProgress {
    fn start(&mut self, total: usize) {
        self.total = Some(total);
    }

    fn advance(&mut self, index: usize, total: usize, episode: &Episode) {
        self.steps.push((index, total, episode.name.clone()));
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}
