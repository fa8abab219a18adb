//! Progress reporting for long downloads

use indicatif::{ProgressBar, ProgressStyle};

/// Receives completion percentages in `0.0..=100.0`
pub trait ProgressSink {
    fn report(&mut self, percent: f64);
}

/// Discards every report
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _percent: f64) {}
}

impl<F: FnMut(f64)> ProgressSink for F {
    fn report(&mut self, percent: f64) {
        self(percent)
    }
}

/// Bar length is 100, one unit per percent
impl ProgressSink for ProgressBar {
    fn report(&mut self, percent: f64) {
        self.set_position(percent.clamp(0.0, 100.0).round() as u64);
        if percent >= 100.0 {
            self.finish();
        }
    }
}

/// Percentage bar used by the download command
pub fn percent_bar(label: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(label.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |p: f64| seen.push(p);
            sink.report(40.0);
            sink.report(100.0);
        }
        assert_eq!(seen, vec![40.0, 100.0]);
    }

    #[test]
    fn test_progress_bar_sink() {
        let mut pb = ProgressBar::hidden();
        pb.set_length(100);
        pb.report(33.4);
        assert_eq!(pb.position(), 33);
        pb.report(150.0);
        assert_eq!(pb.position(), 100);
        assert!(pb.is_finished());
    }
}
