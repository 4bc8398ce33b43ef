//! Nested cross-validation search over the smoothing coefficient.
//!
//! The dataset is shuffled and cut into `P` contiguous partitions. Each
//! partition takes a turn as the test slice; for each test slice the other
//! `P - 1` partitions take turns as the validation slice and every candidate
//! `k` is scored by mean validation error. The best `k` per test slice is
//! refit on training + validation rows and scored on the test slice. The `k`
//! with the lowest test error is finally refit on all data.

use std::ops::Range;

use super::counter::{CountError, FrequencyCounter};
use super::eval::{EvalError, accuracy_percent, error_rate};
use super::logger::{TrainingLogger, Verbosity};
use super::partition::{draw_seed, partition_range, shuffle_and_partition};
use super::tables::{ProbabilityTables, TableError};
use crate::data::{Dataset, DatasetError};
use crate::inference::{PredictError, Predictor};
use crate::model::{ConfigError, KeyMeta};

/// Error sentinel, worse than any real error rate.
const ERROR_SENTINEL: f64 = 2.0;

/// Errors raised during training.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrainError {
    #[error("invalid training configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot train on an empty dataset")]
    EmptyDataset,

    /// `floor(n * k_step_fraction)` is zero.
    #[error("k step is zero: {n_records} records * k_step_fraction {fraction} < 1")]
    ZeroKStep { n_records: usize, fraction: f64 },

    /// No candidate below `floor(n * max_k_fraction)`.
    #[error("no smoothing candidates below max_k={max_k}")]
    NoCandidateK { max_k: u64 },

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Count(#[from] CountError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Predict(#[from] PredictError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

// =============================================================================
// TrainerParams
// =============================================================================

/// Parameters for [`NaiveBayesTrainer`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerParams {
    /// Number of contiguous partitions (at least 3).
    pub partition_count: usize,
    /// Candidate step as a fraction of the dataset, in `(0, 1]`.
    pub k_step_fraction: f64,
    /// Exclusive candidate bound as a fraction of the dataset, in `[0, 1]`.
    pub max_k_fraction: f64,

    // --- Reproducibility ---
    /// Shuffle seed. `None` draws one.
    pub seed: Option<u64>,

    // --- Logging ---
    pub verbosity: Verbosity,
}

impl Default for TrainerParams {
    fn default() -> Self {
        Self {
            partition_count: 5,
            k_step_fraction: 0.01,
            max_k_fraction: 0.1,
            seed: None,
            verbosity: Verbosity::default(),
        }
    }
}

impl TrainerParams {
    /// Check partition count and fraction intervals.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.partition_count < 3 {
            return Err(ConfigError::TooFewPartitions(self.partition_count));
        }
        if !(self.k_step_fraction > 0.0 && self.k_step_fraction <= 1.0) {
            return Err(ConfigError::InvalidFraction {
                field: "k_step_fraction",
                interval: "(0, 1]",
                value: self.k_step_fraction,
            });
        }
        if !(0.0..=1.0).contains(&self.max_k_fraction) {
            return Err(ConfigError::InvalidFraction {
                field: "max_k_fraction",
                interval: "[0, 1]",
                value: self.max_k_fraction,
            });
        }
        Ok(())
    }

    /// Candidate smoothing values for a dataset of `n_records`.
    pub fn k_values(&self, n_records: usize) -> Result<Vec<u64>, TrainError> {
        let k_step = (n_records as f64 * self.k_step_fraction).floor() as u64;
        let max_k = (n_records as f64 * self.max_k_fraction).floor() as u64;
        if k_step == 0 {
            return Err(TrainError::ZeroKStep {
                n_records,
                fraction: self.k_step_fraction,
            });
        }
        let k_values: Vec<u64> = (0..max_k).step_by(k_step as usize).collect();
        if k_values.is_empty() {
            return Err(TrainError::NoCandidateK { max_k });
        }
        Ok(k_values)
    }
}

// =============================================================================
// Results
// =============================================================================

/// Outcome of one test partition.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldResult {
    /// Zero-based test partition index.
    pub test_partition: usize,
    pub test_range: Range<usize>,
    /// Candidate with the lowest mean validation error.
    pub best_k: u64,
    pub mean_validation_error: f64,
    /// Error of `best_k` on the test slice after refitting.
    pub test_error: f64,
}

/// Summary of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    /// Seed used for the shuffle.
    pub seed: u64,
    pub partition_starts: Vec<usize>,
    pub k_values: Vec<u64>,
    pub folds: Vec<FoldResult>,
    /// Chosen smoothing coefficient.
    pub best_k: u64,
    /// Test error of the chosen coefficient.
    pub best_error: f64,
    /// `(1 - best_error) * 100`, two decimals.
    pub accuracy: f64,
    pub elapsed_secs: f64,
}

/// Tables fit on all data plus the run summary.
#[derive(Debug, Clone)]
pub struct TrainOutput {
    pub counter: FrequencyCounter,
    pub tables: ProbabilityTables,
    pub report: TrainReport,
}

// =============================================================================
// NaiveBayesTrainer
// =============================================================================

/// Cross-validated Naive Bayes trainer.
#[derive(Debug, Clone, Default)]
pub struct NaiveBayesTrainer {
    params: TrainerParams,
}

/// Working state for one run.
struct Workspace<'a> {
    meta: &'a KeyMeta,
    counter: FrequencyCounter,
    tables: ProbabilityTables,
}

impl<'a> Workspace<'a> {
    fn count(&mut self, dataset: &Dataset) -> Result<(), TrainError> {
        self.counter.reset_counters(self.meta)?;
        self.counter.count_frequencies(dataset)?;
        Ok(())
    }

    fn fit(&mut self, dataset: &Dataset, k: u64) -> Result<(), TrainError> {
        self.tables.reset_tables(&self.counter)?;
        self.tables.fit(dataset, &self.counter, k as f64)?;
        Ok(())
    }

    fn error(&self, dataset: &Dataset, range: Range<usize>) -> Result<f64, TrainError> {
        let predictor = Predictor::new(self.meta, &self.tables)?;
        Ok(error_rate(&predictor, dataset.records()?, range)?)
    }
}

impl NaiveBayesTrainer {
    pub fn new(params: TrainerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrainerParams {
        &self.params
    }

    /// Shuffle `dataset`, search for the best `k`, and refit on all data.
    ///
    /// On return the dataset is left shuffled with no active partitions.
    pub fn train(&self, meta: &KeyMeta, dataset: &mut Dataset) -> Result<TrainOutput, TrainError> {
        self.params.validate()?;
        let n_records = dataset.len()?;
        if n_records == 0 {
            return Err(TrainError::EmptyDataset);
        }

        let seed = self.params.seed.unwrap_or_else(draw_seed);
        let mut logger = TrainingLogger::new(self.params.verbosity);
        logger.start_training(seed, n_records, self.params.partition_count);

        let k_values = self.params.k_values(n_records)?;
        logger.log_candidates(&k_values);

        let p = self.params.partition_count;
        let starts = shuffle_and_partition(dataset, seed, p)?;
        let ranges: Vec<Range<usize>> = (0..p)
            .filter_map(|i| partition_range(&starts, i, n_records))
            .collect();
        if let Some(range) = ranges.iter().find(|r| r.is_empty()) {
            logger.warn("partition_count exceeds dataset size; a partition is empty");
            return Err(EvalError::EmptyRange {
                start: range.start,
                end: range.end,
            }
            .into());
        }

        let mut ws = Workspace {
            meta,
            counter: FrequencyCounter::new(),
            tables: ProbabilityTables::new(),
        };

        let mut folds = Vec::with_capacity(p);
        for t in 0..p {
            logger.log_test_partition(t, p);
            let test = ranges[t].clone();
            dataset.clear_partitions();
            dataset.set_test_bounds(test.start, test.end)?;

            let mut mean_errors = vec![0.0_f64; k_values.len()];
            let mut pass = 0usize;
            for v in (0..p).filter(|&v| v != t) {
                pass += 1;
                logger.log_validation_partition(pass, p - 1);
                let validation = ranges[v].clone();
                dataset.set_validation_bounds(validation.start, validation.end)?;
                ws.count(dataset)?;

                for (mean, &k) in mean_errors.iter_mut().zip(&k_values) {
                    ws.fit(dataset, k)?;
                    let error = ws.error(dataset, validation.clone())?;
                    logger.log_candidate(k, accuracy_percent(error));
                    *mean += (error - *mean) / pass as f64;
                }
            }

            let (best_k, mean_validation_error) =
                select_best(k_values.iter().copied().zip(mean_errors.iter().copied()))
                    .ok_or(TrainError::NoCandidateK { max_k: 0 })?;

            dataset.clear_validation_partition();
            ws.count(dataset)?;
            ws.fit(dataset, best_k)?;
            let test_error = ws.error(dataset, test.clone())?;
            let accuracy = accuracy_percent(test_error);
            logger.log_refit(t, best_k, mean_validation_error, accuracy);

            folds.push(FoldResult {
                test_partition: t,
                test_range: test,
                best_k,
                mean_validation_error,
                test_error,
            });
        }

        let (best_k, best_error) = select_best(folds.iter().map(|f| (f.best_k, f.test_error)))
            .ok_or(TrainError::NoCandidateK { max_k: 0 })?;

        dataset.clear_partitions();
        ws.count(dataset)?;
        ws.fit(dataset, best_k)?;

        let accuracy = accuracy_percent(best_error);
        let elapsed_secs = logger.finish_training(best_k, accuracy);

        Ok(TrainOutput {
            counter: ws.counter,
            tables: ws.tables,
            report: TrainReport {
                seed,
                partition_starts: starts,
                k_values,
                folds,
                best_k,
                best_error,
                accuracy,
                elapsed_secs,
            },
        })
    }
}

/// First candidate with strictly lowest error.
fn select_best(candidates: impl IntoIterator<Item = (u64, f64)>) -> Option<(u64, f64)> {
    let mut best: Option<(u64, f64)> = None;
    let mut best_error = ERROR_SENTINEL;
    for (k, error) in candidates {
        if error < best_error {
            best = Some((k, error));
            best_error = error;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReferenceTables;
    use crate::testing::synthetic_records;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    fn synthetic(n: usize) -> (KeyMeta, Dataset) {
        let records = synthetic_records(n, 11);
        let mut meta = ReferenceTables::builtin().key_meta();
        let airports = records
            .iter()
            .flat_map(|r| [r.origin.clone(), r.dest.clone()]);
        meta.set_seen_airports(airports);
        meta.set_seen_carriers(records.iter().map(|r| r.carrier.clone()));
        let mut ds = Dataset::new();
        ds.set_data(records);
        (meta, ds)
    }

    fn params(seed: u64) -> TrainerParams {
        TrainerParams {
            partition_count: 3,
            k_step_fraction: 0.02,
            max_k_fraction: 0.1,
            seed: Some(seed),
            verbosity: Verbosity::Silent,
        }
    }

    #[rstest]
    #[case(100, 0.01, 0.1, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9])]
    #[case(100, 0.03, 0.1, vec![0, 3, 6, 9])]
    #[case(50, 0.02, 0.1, vec![0, 1, 2, 3, 4])]
    #[case(10, 0.5, 1.0, vec![0, 5])]
    fn candidate_values(
        #[case] n: usize,
        #[case] step: f64,
        #[case] max: f64,
        #[case] expected: Vec<u64>,
    ) {
        let params = TrainerParams {
            k_step_fraction: step,
            max_k_fraction: max,
            ..Default::default()
        };
        assert_eq!(params.k_values(n).unwrap(), expected);
    }

    #[test]
    fn zero_step_fails() {
        let params = TrainerParams {
            k_step_fraction: 0.01,
            ..Default::default()
        };
        assert_eq!(
            params.k_values(50),
            Err(TrainError::ZeroKStep {
                n_records: 50,
                fraction: 0.01,
            })
        );

    }

    #[test]
    fn empty_candidates_fail() {
        let params = TrainerParams {
            k_step_fraction: 0.1,
            max_k_fraction: 0.0,
            ..Default::default()
        };
        assert_eq!(
            params.k_values(50),
            Err(TrainError::NoCandidateK { max_k: 0 })
        );
    }

    #[test]
    fn select_best_keeps_first_on_tie() {
        assert_eq!(select_best([(0, 0.5), (1, 0.3), (2, 0.3)]), Some((1, 0.3)));
        assert_eq!(select_best([(0, 1.0), (1, 1.0)]), Some((0, 1.0)));
        assert_eq!(select_best(std::iter::empty()), None);
    }

    #[test]
    fn same_seed_same_model() {
        let (meta, mut a) = synthetic(120);
        let mut b = a.clone();
        let trainer = NaiveBayesTrainer::new(params(1));
        let out_a = trainer.train(&meta, &mut a).unwrap();
        let out_b = trainer.train(&meta, &mut b).unwrap();

        assert_eq!(out_a.report.best_k, out_b.report.best_k);
        assert_eq!(out_a.report.folds, out_b.report.folds);
        assert_eq!(
            out_a.tables.p_status().unwrap(),
            out_b.tables.p_status().unwrap()
        );
        assert_eq!(a.records().unwrap(), b.records().unwrap());
    }

    #[test]
    fn report_shape() {
        let (meta, mut ds) = synthetic(120);
        let trainer = NaiveBayesTrainer::new(params(3));
        let out = trainer.train(&meta, &mut ds).unwrap();
        let report = &out.report;

        assert_eq!(report.seed, 3);
        assert_eq!(report.partition_starts, vec![0, 40, 80]);
        assert_eq!(report.k_values, vec![0, 2, 4, 6, 8, 10]);
        assert_eq!(report.folds.len(), 3);
        assert!(report.k_values.contains(&report.best_k));
        assert!((0.0..=1.0).contains(&report.best_error));
        assert!((0.0..=100.0).contains(&report.accuracy));
        assert_eq!(report.accuracy, accuracy_percent(report.best_error));

        // Final fit uses every row and the chosen k.
        assert_eq!(out.counter.n_counted(), 120);
        assert_eq!(out.tables.get_k(), Some(report.best_k as f64));
        assert_eq!(ds.test_bounds(), None);
        assert_eq!(ds.validation_bounds(), None);
    }

    #[test]
    fn folds_replay_by_hand() {
        let (meta, mut ds) = synthetic(120);
        let trainer = NaiveBayesTrainer::new(params(3));
        let out = trainer.train(&meta, &mut ds).unwrap();
        let report = &out.report;
        let n = ds.len().unwrap();

        // The dataset stays in shuffled order, so every fold can be recomputed.
        for fold in &report.folds {
            ds.clear_partitions();
            ds.set_test_bounds(fold.test_range.start, fold.test_range.end)
                .unwrap();

            let mut errors = vec![Vec::new(); report.k_values.len()];
            for v in (0..3).filter(|&v| v != fold.test_partition) {
                let validation = partition_range(&report.partition_starts, v, n).unwrap();
                ds.set_validation_bounds(validation.start, validation.end)
                    .unwrap();
                let mut counter = FrequencyCounter::new();
                counter.reset_counters(&meta).unwrap();
                counter.count_frequencies(&ds).unwrap();
                for (k_errors, &k) in errors.iter_mut().zip(&report.k_values) {
                    let mut tables = ProbabilityTables::new();
                    tables.reset_tables(&counter).unwrap();
                    tables.fit(&ds, &counter, k as f64).unwrap();
                    let predictor = Predictor::new(&meta, &tables).unwrap();
                    let error = error_rate(&predictor, ds.records().unwrap(), validation.clone());
                    k_errors.push(error.unwrap());
                }
            }
            assert!(errors.iter().all(|e| e.len() == 2));

            let running: Vec<f64> = errors
                .iter()
                .map(|e| {
                    let mut mean = 0.0;
                    for (i, error) in e.iter().enumerate() {
                        mean += (error - mean) / (i + 1) as f64;
                    }
                    mean
                })
                .collect();
            for (mean, e) in running.iter().zip(&errors) {
                let arithmetic = e.iter().sum::<f64>() / e.len() as f64;
                assert_abs_diff_eq!(*mean, arithmetic, epsilon = 1e-12);
            }

            let mut best = 0;
            for (i, mean) in running.iter().enumerate() {
                if *mean < running[best] {
                    best = i;
                }
            }
            assert_eq!(fold.best_k, report.k_values[best]);
            assert_eq!(fold.mean_validation_error, running[best]);

            ds.clear_validation_partition();
            let mut counter = FrequencyCounter::new();
            counter.reset_counters(&meta).unwrap();
            counter.count_frequencies(&ds).unwrap();
            let mut tables = ProbabilityTables::new();
            tables.reset_tables(&counter).unwrap();
            tables.fit(&ds, &counter, fold.best_k as f64).unwrap();
            let predictor = Predictor::new(&meta, &tables).unwrap();
            let error = error_rate(&predictor, ds.records().unwrap(), fold.test_range.clone());
            assert_eq!(error, Ok(fold.test_error));
        }
    }

    #[test]
    fn missing_seed_is_drawn() {
        let (meta, mut ds) = synthetic(60);
        let params = TrainerParams {
            seed: None,
            ..params(0)
        };
        let trainer = NaiveBayesTrainer::new(params);
        let out = trainer.train(&meta, &mut ds).unwrap();
        assert!(out.report.seed < super::super::partition::MAX_DRAWN_SEED);
    }

    #[test]
    fn more_partitions_than_rows_fails_fast() {
        let meta = crate::testing::fixture_key_meta();
        let mut ds = crate::testing::fixture_dataset();
        let params = TrainerParams {
            partition_count: 6,
            k_step_fraction: 0.2,
            max_k_fraction: 1.0,
            ..params(1)
        };
        assert!(matches!(
            NaiveBayesTrainer::new(params).train(&meta, &mut ds),
            Err(TrainError::Eval(EvalError::EmptyRange { .. }))
        ));
    }

    #[test]
    fn untrained_dataset_fails() {
        let meta = crate::testing::fixture_key_meta();
        let mut ds = Dataset::new();
        let trainer = NaiveBayesTrainer::new(params(1));
        assert_eq!(
            trainer.train(&meta, &mut ds).unwrap_err(),
            TrainError::Dataset(DatasetError::NotLoaded)
        );
    }

    #[test]
    fn invalid_params_rejected() {
        let (meta, mut ds) = synthetic(30);
        let params = TrainerParams {
            partition_count: 2,
            ..params(1)
        };
        let trainer = NaiveBayesTrainer::new(params);
        assert_eq!(
            trainer.train(&meta, &mut ds).unwrap_err(),

            TrainError::Config(ConfigError::TooFewPartitions(2))
        );
    }
}
