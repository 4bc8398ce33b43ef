//! Training progress logging.
//!
//! [`TrainingLogger`] turns cross-validation milestones into `tracing` events,
//! filtered by [`Verbosity`]. Installing a subscriber is left to the caller.

use std::time::Instant;

/// How much training progress to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Nothing.
    #[default]
    Silent,
    /// Degenerate conditions only.
    Warning,
    /// Seed, partition progress and final choice.
    Info,
    /// Every validation partition and every k.
    Debug,
}

/// Emits training progress events.
#[derive(Debug)]
pub struct TrainingLogger {
    verbosity: Verbosity,
    started: Option<Instant>,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            started: None,
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    #[inline]
    fn enabled(&self, level: Verbosity) -> bool {
        self.verbosity >= level
    }

    pub fn start_training(&mut self, seed: u64, n_records: usize, partition_count: usize) {
        self.started = Some(Instant::now());
        if self.enabled(Verbosity::Info) {
            tracing::info!(
                seed,
                n_records,
                partition_count,
                "starting naive bayes training"
            );
        }
    }

    pub fn log_candidates(&self, k_values: &[u64]) {
        if self.enabled(Verbosity::Info) {
            tracing::info!(n_candidates = k_values.len(), ?k_values, "smoothing candidates");
        }
    }

    pub fn log_test_partition(&self, index: usize, count: usize) {
        if self.enabled(Verbosity::Info) {
            tracing::info!(
                test_partition = index + 1,
                of = count,
                "processing test partition"
            );
        }
    }

    pub fn log_validation_partition(&self, pass: usize, count: usize) {
        if self.enabled(Verbosity::Debug) {
            tracing::debug!(
                validation_partition = pass,
                of = count,
                "processing validation partition"
            );
        }
    }

    pub fn log_candidate(&self, k: u64, accuracy: f64) {
        if self.enabled(Verbosity::Debug) {
            tracing::debug!(k, accuracy, "validated smoothing candidate");
        }
    }

    pub fn log_refit(
        &self,
        test_partition: usize,
        best_k: u64,
        mean_validation_error: f64,
        accuracy: f64,
    ) {
        if self.enabled(Verbosity::Info) {
            tracing::info!(
                test_partition = test_partition + 1,
                best_k,
                mean_validation_error,
                accuracy,
                "refit on training and validation rows"
            );
        }
    }

    pub fn warn(&self, message: &str) {
        if self.enabled(Verbosity::Warning) {
            tracing::warn!("{message}");
        }
    }

    /// Log the final choice and return elapsed seconds since `start_training`.
    pub fn finish_training(&self, best_k: u64, accuracy: f64) -> f64 {
        let elapsed = self.started.map_or(0.0, |t| t.elapsed().as_secs_f64());
        if self.enabled(Verbosity::Info) {
            tracing::info!(
                best_k,
                accuracy,
                elapsed_secs = elapsed,
                "completed training"
            );

        }
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_ordering() {
        assert!(Verbosity::Debug > Verbosity::Info);
        assert!(Verbosity::Info > Verbosity::Warning);
        assert!(Verbosity::Warning > Verbosity::Silent);
        assert_eq!(Verbosity::default(), Verbosity::Silent);
    }

    #[test]
    fn finish_reports_elapsed() {
        let mut logger = TrainingLogger::new(Verbosity::Silent);
        assert_eq!(logger.finish_training(0, 100.0), 0.0);
        logger.start_training(1, 10, 3);
        assert!(logger.finish_training(0, 100.0) >= 0.0);
    }
}
