//! Training configuration with builder pattern.
//!
//! # Example
//!
//! ```
//! use flightcast::model::TrainConfig;
//! use flightcast::training::Verbosity;
//!
//! // All defaults: 5 partitions, k step 1% of the data, k below 10% of the data
//! let config = TrainConfig::builder().build().unwrap();
//!
//! let config = TrainConfig::builder()
//!     .partition_count(3)
//!     .k_step_fraction(0.02)
//!     .max_k_fraction(0.2)
//!     .seed(1)
//!     .verbosity(Verbosity::Info)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.seed, Some(1));
//! ```

use bon::Builder;

use crate::training::{TrainerParams, Verbosity};

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Fewer than three partitions leave no room for a validation partition.
    #[error("partition_count must be at least 3, got {0}")]
    TooFewPartitions(usize),

    /// A fraction outside its allowed interval.
    #[error("{field} must be in {interval}, got {value}")]
    InvalidFraction {
        field: &'static str,
        interval: &'static str,
        value: f64,
    },
}

// =============================================================================
// TrainConfig
// =============================================================================

/// Configuration for the cross-validated smoothing search.
///
/// Candidate smoothing values are `0, step, 2 * step, ..` below `max`, where
/// `step = floor(n * k_step_fraction)` and `max = floor(n * max_k_fraction)`
/// for a dataset of `n` records.
#[derive(Debug, Clone, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct TrainConfig {
    /// Number of contiguous partitions. Default: 5.
    #[builder(default = 5)]
    pub partition_count: usize,

    /// Step between smoothing candidates, as a fraction of the dataset. Default: 0.01.
    #[builder(default = 0.01)]
    pub k_step_fraction: f64,

    /// Exclusive upper bound on candidates, as a fraction of the dataset. Default: 0.1.
    #[builder(default = 0.1)]
    pub max_k_fraction: f64,

    /// Shuffle seed. `None` draws one and records it in the model.
    pub seed: Option<u64>,

    /// Verbosity level. Default: `Silent`.
    #[builder(default)]
    pub verbosity: Verbosity,
}

/// Custom finishing function that validates the config.
impl<S: train_config_builder::IsComplete> TrainConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if:
    /// - `partition_count < 3`
    /// - `k_step_fraction` is outside `(0, 1]`
    /// - `max_k_fraction` is outside `[0, 1]`
    pub fn build(self) -> Result<TrainConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl Default for TrainConfig {
    /// Same values as the builder defaults.
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


impl TrainConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.to_trainer_params().validate()
    }

    /// Convert to trainer parameters.
    pub fn to_trainer_params(&self) -> TrainerParams {
        TrainerParams {
            partition_count: self.partition_count,
            k_step_fraction: self.k_step_fraction,
            max_k_fraction: self.max_k_fraction,
            seed: self.seed,
            verbosity: self.verbosity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults() {
        let config = TrainConfig::default();
        assert_eq!(config.partition_count, 5);
        assert_eq!(config.k_step_fraction, 0.01);
        assert_eq!(config.max_k_fraction, 0.1);
        assert_eq!(config.seed, None);
        assert_eq!(config.verbosity, Verbosity::Silent);

        let built = TrainConfig::builder().build().unwrap();
        assert_eq!(format!("{config:?}"), format!("{built:?}"));
    }


    #[test]
    fn too_few_partitions() {
        let err = TrainConfig::builder()
            .partition_count(2)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::TooFewPartitions(2));
    }

    #[rstest]
    #[case(0.0, 0.1)]
    #[case(1.5, 0.1)]
    #[case(-0.1, 0.1)]
    #[case(0.01, -0.1)]
    #[case(0.01, 1.01)]
    #[case(f64::NAN, 0.1)]
    fn invalid_fractions(#[case] step: f64, #[case] max: f64) {
        let result = TrainConfig::builder()
            .k_step_fraction(step)
            .max_k_fraction(max)
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidFraction { .. })));
    }

    #[rstest]
    #[case(1.0, 0.0)]
    #[case(0.5, 1.0)]
    fn boundary_fractions_accepted(#[case] step: f64, #[case] max: f64) {
        let result = TrainConfig::builder()
            .k_step_fraction(step)
            .max_k_fraction(max)
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn converts_to_params() {
        let config = TrainConfig::builder()
            .partition_count(3)
            .seed(9)
            .build()
            .unwrap();

        let params = config.to_trainer_params();
        assert_eq!(params.partition_count, 3);
        assert_eq!(params.seed, Some(9));
    }
}
