//! Counting, smoothing and the cross-validated search for `k`.
//!
//! ## Tables
//!
//! - [`FrequencyCounter`]: outcome and joint feature/outcome counts
//! - [`ProbabilityTables`]: Laplace-smoothed marginals and conditionals
//! - [`Feature`]: the nine conditional feature families
//!
//! ## Search
//!
//! - [`NaiveBayesTrainer`]: nested cross-validation over candidate `k`
//! - [`evaluate`], [`error_rate`]: holdout measurement
//! - [`TrainingLogger`], [`Verbosity`]: progress logging

mod counter;
mod eval;
mod features;
mod logger;
pub mod partition;
mod tables;
mod trainer;
mod vocab;

pub use counter::{CountError, CountTable, FrequencyCounter};
pub use eval::{EvalCounts, EvalError, accuracy_percent, error_rate, evaluate};
pub use features::{Feature, FeatureSource};
pub use logger::{TrainingLogger, Verbosity};
pub use partition::{partition_range, partition_starts, shuffle_and_partition};
pub use tables::{ConditionalTable, ProbTable, ProbabilityTables, TableError, laplace_smooth};
pub use trainer::{
    FoldResult, NaiveBayesTrainer, TrainError, TrainOutput, TrainReport, TrainerParams,
};
pub use vocab::Vocabulary;
