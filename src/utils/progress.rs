use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// File-count progress bar shown during ingestion. Constructed silent in
/// tests and library use, so no bar is drawn.
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
}

impl ProgressReporter {
    pub fn new(total: u64, message: &str, silent: bool) -> Self {
        if silent {
            Self { progress_bar: None }
        } else {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            pb.set_message(message.to_string());
            pb.enable_steady_tick(Duration::from_millis(100));

            Self {
                progress_bar: Some(pb),
            }
        }
    }

    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    pub fn finish_with_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_reporter_draws_nothing() {
        let progress = ProgressReporter::new(3, "Ingesting", true);
        assert!(progress.progress_bar.is_none());
        // All operations are no-ops without a bar.
        progress.increment(2);
        progress.finish_with_message("done");
    }

    #[test]
    fn test_reporter_tracks_position() {
        let progress = ProgressReporter::new(3, "Ingesting", false);
        progress.increment(2);
        assert_eq!(progress.progress_bar.as_ref().unwrap().position(), 2);
        progress.finish_with_message("done");
    }
}
