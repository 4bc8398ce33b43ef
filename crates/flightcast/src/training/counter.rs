//! Frequency counting over the training rows of a [`Dataset`].
//!
//! The counter is two-phase: [`FrequencyCounter::reset_counters`] allocates
//! zeroed tables over the full key space, then
//! [`FrequencyCounter::count_frequencies`] fills them from every row outside
//! the active holdout partitions. Each counting pass needs a fresh reset.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2};

use super::features::{Feature, FeatureSource};
use super::vocab::Vocabulary;
use crate::data::{Dataset, DatasetError, Outcome};
use crate::model::{KeyMeta, KeyMetaError};

/// Errors raised by [`FrequencyCounter`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CountError {
    /// Counting or querying before [`FrequencyCounter::reset_counters`].
    #[error("frequency counters must be reset before counting")]
    NotReset,

    /// Querying before a counting pass has run.
    #[error("frequency counters have not been counted since the last reset")]
    NotCounted,

    /// A validation partition is active without a test partition.
    #[error("a validation partition requires an active test partition")]
    ValidationWithoutTest,

    /// A record or query carries a value outside the allocated key space.
    #[error("value {value:?} is not in the {feature} key space")]
    UnknownValue {
        feature: &'static str,
        value: String,
    },

    /// A record has no derivable outcome.
    #[error("record {index} has no arrival outcome")]
    MissingOutcome { index: usize },

    #[error(transparent)]
    KeyMeta(#[from] KeyMetaError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Counts for one feature family: `[value, outcome] -> count`.
#[derive(Debug, Clone, PartialEq)]
pub struct CountTable {
    values: Vocabulary<String>,
    counts: Array2<u64>,
}

impl CountTable {
    fn zeros(values: Vocabulary<String>, n_outcomes: usize) -> Self {
        let counts = Array2::zeros((values.len(), n_outcomes));
        Self { values, counts }
    }

    /// Value vocabulary (rows).
    pub fn values(&self) -> &Vocabulary<String> {
        &self.values
    }

    /// Count matrix, shape `[n_values, n_outcomes]`.
    pub fn counts(&self) -> &Array2<u64> {
        &self.counts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Empty,
    Reset,
    Counted,
}

/// Per-family `(value, outcome)` counts and the outcome marginal.
#[derive(Debug, Clone, Default)]
pub struct FrequencyCounter {
    phase: Phase,
    outcomes: Vocabulary<Outcome>,
    status: Array1<u64>,
    tables: Vec<CountTable>,
    n_counted: usize,
}

impl FrequencyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate zeroed tables over the key space described by `meta`.
    ///
    /// Every family gets its own allocation, including families that share a
    /// universe (source and destination airports, for instance).
    pub fn reset_counters(&mut self, meta: &KeyMeta) -> Result<(), CountError> {
        let outcomes = Vocabulary::new(meta.status_keys());
        let n_outcomes = outcomes.len();
        let mut tables = Vec::with_capacity(Feature::COUNT);
        for feature in Feature::ALL {
            let values = Vocabulary::new(feature.universe(meta)?);
            tables.push(CountTable::zeros(values, n_outcomes));
        }

        self.outcomes = outcomes;
        self.status = Array1::zeros(n_outcomes);
        self.tables = tables;
        self.n_counted = 0;
        self.phase = Phase::Reset;
        Ok(())
    }

    /// Count every row of `dataset` outside the active partitions.
    ///
    /// A row is skipped iff it lies in the test range or the validation range.
    /// Returns the number of rows counted.
    pub fn count_frequencies(&mut self, dataset: &Dataset) -> Result<usize, CountError> {
        if self.phase != Phase::Reset {
            return Err(CountError::NotReset);
        }
        if dataset.validation_bounds().is_some() && dataset.test_bounds().is_none() {
            return Err(CountError::ValidationWithoutTest);
        }

        let records = dataset.records()?;
        let mut counted = 0;
        for (index, record) in records.iter().enumerate() {
            if dataset.is_held_out(index) {
                continue;
            }
            let outcome = record
                .outcome()
                .ok_or(CountError::MissingOutcome { index })?;
            let o = self.outcomes.get(&outcome).ok_or_else(|| CountError::UnknownValue {
                feature: "arrival_status",
                value: outcome.to_string(),
            })?;

            // Resolve every cell before touching the counts so a bad record
            // leaves the tables unchanged.
            let mut cells = [0usize; Feature::COUNT];
            for feature in Feature::ALL {
                let value = record.feature_value(feature);
                cells[feature.index()] = self.tables[feature.index()]
                    .values
                    .get(value.as_ref())
                    .ok_or_else(|| CountError::UnknownValue {
                        feature: feature.name(),
                        value: value.into_owned(),
                    })?;
            }

            self.status[o] += 1;
            for (table, &v) in self.tables.iter_mut().zip(cells.iter()) {
                table.counts[[v, o]] += 1;
            }
            counted += 1;
        }

        self.n_counted = counted;
        self.phase = Phase::Counted;
        Ok(counted)
    }

    /// Whether the last reset has been followed by a counting pass.
    pub fn is_counted(&self) -> bool {
        self.phase == Phase::Counted
    }

    /// Rows counted in the last pass.
    pub fn n_counted(&self) -> usize {
        self.n_counted
    }

    // =========================================================================
    // Views (used by fitting)
    // =========================================================================

    pub fn outcomes(&self) -> Result<&Vocabulary<Outcome>, CountError> {
        self.ensure_allocated()?;
        Ok(&self.outcomes)
    }

    /// Outcome marginal counts, indexed like [`Self::outcomes`].
    pub fn status_counts(&self) -> Result<&Array1<u64>, CountError> {
        self.ensure_counted()?;
        Ok(&self.status)
    }

    pub fn table(&self, feature: Feature) -> Result<&CountTable, CountError> {
        self.ensure_counted()?;
        Ok(&self.tables[feature.index()])
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Count of rows with the given outcome.
    pub fn query_status(&self, outcome: &Outcome) -> Result<u64, CountError> {
        let o = self.outcome_index(outcome)?;
        Ok(self.status_counts()?[o])
    }

    /// Count of rows with `feature == value` and the given outcome.
    pub fn query(
        &self,
        feature: Feature,
        value: &str,
        outcome: &Outcome,
    ) -> Result<u64, CountError> {
        let o = self.outcome_index(outcome)?;
        let table = self.table(feature)?;
        let v = table.values.get(value).ok_or_else(|| CountError::UnknownValue {
            feature: feature.name(),
            value: value.to_string(),
        })?;
        Ok(table.counts[[v, o]])
    }

    /// Copy of the outcome marginal.
    pub fn status_counter(&self) -> Result<BTreeMap<Outcome, u64>, CountError> {
        let status = self.status_counts()?;
        Ok(self
            .outcomes
            .iter()
            .map(|(o, outcome)| (outcome.clone(), status[o]))
            .collect())
    }

    /// Copy of one family's table as `value -> outcome -> count`.
    pub fn counter(
        &self,
        feature: Feature,
    ) -> Result<BTreeMap<String, BTreeMap<Outcome, u64>>, CountError> {
        let table = self.table(feature)?;
        Ok(table
            .values
            .iter()
            .map(|(v, value)| {
                let row = self
                    .outcomes
                    .iter()
                    .map(|(o, outcome)| (outcome.clone(), table.counts[[v, o]]))
                    .collect();
                (value.clone(), row)
            })
            .collect())
    }

    fn outcome_index(&self, outcome: &Outcome) -> Result<usize, CountError> {
        self.ensure_allocated()?;
        self.outcomes.get(outcome).ok_or_else(|| CountError::UnknownValue {
            feature: "arrival_status",
            value: outcome.to_string(),
        })
    }

    fn ensure_allocated(&self) -> Result<(), CountError> {
        match self.phase {
            Phase::Empty => Err(CountError::NotReset),
            _ => Ok(()),
        }
    }

    fn ensure_counted(&self) -> Result<(), CountError> {
        match self.phase {
            Phase::Empty => Err(CountError::NotReset),
            Phase::Reset => Err(CountError::NotCounted),
            Phase::Counted => Ok(()),
        }
    }
}
