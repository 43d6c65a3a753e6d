//! Progress callbacks for long renders. Reporters are called from worker threads and must
//! return quickly.

use crate::film::Image;
use crate::Float;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use tracing::{error, info};

pub trait ProgressReporter: Send + Sync {
    fn begin(&self) {}

    fn new_stage(&self, _name: &str) {}

    /// `percent` is in [0, 100]. `preview` builds an image of the current state on demand.
    fn progress(&self, percent: Float, preview: Option<&dyn Fn() -> Image>);

    fn end_stage(&self) {}

    fn end(&self) {}

    fn error(&self, _msg: &str) {}
}

/// Discards everything.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn progress(&self, _percent: Float, _preview: Option<&dyn Fn() -> Image>) {}
}

/// Logs stage changes, and progress every time another `step` percent is done.
pub struct LogReporter {
    step: Float,
    last_logged: Mutex<Float>,
}

impl LogReporter {
    pub fn new(step: Float) -> Self {
        Self { step: step.max(0.0), last_logged: Mutex::new(0.0) }
    }
}

impl Default for LogReporter {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl ProgressReporter for LogReporter {
    fn begin(&self) {
        *self.last_logged.lock() = 0.0;
        info!("render started");
    }

    fn new_stage(&self, name: &str) {
        *self.last_logged.lock() = 0.0;
        info!(stage = name, "stage started");
    }

    fn progress(&self, percent: Float, _preview: Option<&dyn Fn() -> Image>) {
        let mut last = self.last_logged.lock();
        if percent - *last >= self.step || (percent >= 100.0 && *last < 100.0) {
            *last = percent;
            info!("{:.1}% done", percent);
        }
    }

    fn end_stage(&self) {
        info!("stage finished");
    }

    fn end(&self) {
        info!("render finished");
    }

    fn error(&self, msg: &str) {
        error!(msg, "render failed");
    }
}

const BAR_RESOLUTION: u64 = 1000;

/// A terminal progress bar.
pub struct ProgressBarReporter {
    bar: ProgressBar,
}

impl ProgressBarReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(BAR_RESOLUTION);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} {msg} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {percent}% {eta_precise}",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self { bar: ProgressBar::hidden() }
    }
}

impl Default for ProgressBarReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ProgressBarReporter {
    fn begin(&self) {
        self.bar.reset();
    }

    fn new_stage(&self, name: &str) {
        self.bar.set_message(name.to_string());
        self.bar.set_position(0);
    }

    fn progress(&self, percent: Float, _preview: Option<&dyn Fn() -> Image>) {
        let pos = (percent.clamp(0.0, 100.0) / 100.0 * BAR_RESOLUTION as Float) as u64;
        self.bar.set_position(pos);
    }

    fn end(&self) {
        self.bar.finish();
    }

    fn error(&self, msg: &str) {
        self.bar.abandon_with_message(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporters_accept_full_lifecycle() {
        let reporters: Vec<Box<dyn ProgressReporter>> = vec![
            Box::new(NoopReporter),
            Box::new(LogReporter::default()),
            Box::new(ProgressBarReporter::hidden()),
        ];
        let preview = || Image::new(2, 2);
        for r in &reporters {
            r.begin();
            r.new_stage("tiles");
            r.progress(12.5, Some(&preview));
            r.progress(100.0, None);
            r.end_stage();
            r.end();
        }
    }

    #[test]
    fn test_log_reporter_throttles() {
        let r = LogReporter::new(25.0);
        r.progress(10.0, None);
        assert_eq!(*r.last_logged.lock(), 0.0);
        r.progress(30.0, None);
        assert_eq!(*r.last_logged.lock(), 30.0);
        r.progress(100.0, None);
        assert_eq!(*r.last_logged.lock(), 100.0);
    }
}
