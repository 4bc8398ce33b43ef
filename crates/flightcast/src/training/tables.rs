//! Laplace-smoothed probability tables.
//!
//! For every outcome `s`, feature family `F` and value `v`:
//!
//! ```text
//! P(F = v | s) = laplace_smooth(count(F = v, s), count(s), |F|, k)
//! P(s)         = laplace_smooth(count(s), training_len, |S|, k)
//! ```
//!
//! Conditional rows are not normalized across outcomes; each entry is an
//! independent estimate of `P(value | outcome)`. Normalization happens once,
//! at prediction time, over the product of all ten terms.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView1};

use super::counter::{CountError, FrequencyCounter};
use super::features::Feature;
use super::vocab::Vocabulary;
use crate::data::{Dataset, DatasetError, Outcome};

/// `value -> outcome -> probability` for one feature family.
pub type ConditionalTable = BTreeMap<String, BTreeMap<Outcome, f64>>;

/// Errors raised by [`ProbabilityTables`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    /// Fitting without a preceding [`ProbabilityTables::reset_tables`].
    #[error("probability tables must be reset before fitting")]
    NotReset,

    /// Querying tables that were neither fit nor imported.
    #[error("probability tables have not been fit")]
    NotFit,

    /// Counts were reallocated after the tables were reset.
    #[error("frequency tables changed shape since the probability tables were reset")]
    ShapeMismatch,

    /// A lookup key is absent.
    #[error("key {key:?} not found in {table} table")]
    UnknownKey { table: &'static str, key: String },

    /// Imported tables disagree on the outcome universe.
    #[error("{table} table row {value:?} does not cover the arrival_status outcomes")]
    InconsistentOutcomes { table: &'static str, value: String },

    /// Smoothing coefficient is negative or not finite.
    #[error("smoothing coefficient must be finite and non-negative, got {0}")]
    InvalidK(f64),

    #[error(transparent)]
    Count(#[from] CountError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Additive smoothing: `(obs + k) / (total + dim * k)`.
///
/// Returns 0 when `total == 0` and either `dim == 0` or `k == 0`.
#[inline]
pub fn laplace_smooth(obs: u64, total: u64, dim: usize, k: f64) -> f64 {
    if total == 0 && (dim == 0 || k == 0.0) {
        return 0.0;
    }
    (obs as f64 + k) / (total as f64 + dim as f64 * k)
}

/// Probabilities for one feature family: `[value, outcome] -> P(value | outcome)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbTable {
    values: Vocabulary<String>,
    probs: Array2<f64>,
}

impl ProbTable {
    pub fn values(&self) -> &Vocabulary<String> {
        &self.values
    }

    pub fn probs(&self) -> &Array2<f64> {
        &self.probs
    }

    /// `P(value | outcome)` for every outcome.
    pub fn row(&self, value: &str) -> Option<ArrayView1<'_, f64>> {
        self.values.get(value).map(|v| self.probs.row(v))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Empty,
    Reset,
    Fit,
}

/// The ten probability tables of the classifier.
#[derive(Debug, Clone, Default)]
pub struct ProbabilityTables {
    phase: Phase,
    k: Option<f64>,
    outcomes: Vocabulary<Outcome>,
    status: Array1<f64>,
    tables: Vec<ProbTable>,
}

impl ProbabilityTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the tables over the key space of `frequencies`.
    pub fn reset_tables(&mut self, frequencies: &FrequencyCounter) -> Result<(), TableError> {
        let outcomes = frequencies.outcomes()?.clone();
        let n_outcomes = outcomes.len();
        let mut tables = Vec::with_capacity(Feature::COUNT);
        for feature in Feature::ALL {
            let values = frequencies.table(feature)?.values().clone();
            let probs = Array2::zeros((values.len(), n_outcomes));
            tables.push(ProbTable { values, probs });
        }

        self.outcomes = outcomes;
        self.status = Array1::zeros(n_outcomes);
        self.tables = tables;
        self.k = None;
        self.phase = Phase::Reset;
        Ok(())
    }

    /// Fit every table from `frequencies` with smoothing coefficient `k`.
    ///
    /// The marginal denominator is the training length of `dataset`.
    pub fn fit(
        &mut self,
        dataset: &Dataset,
        frequencies: &FrequencyCounter,
        k: f64,
    ) -> Result<(), TableError> {
        if self.phase != Phase::Reset {
            return Err(TableError::NotReset);
        }
        if !k.is_finite() || k < 0.0 {
            return Err(TableError::InvalidK(k));
        }
        if frequencies.outcomes()? != &self.outcomes {
            return Err(TableError::ShapeMismatch);
        }

        let training_len = dataset.training_len()? as u64;
        let status_counts = frequencies.status_counts()?;
        let n_outcomes = self.outcomes.len();

        for (o, &count) in status_counts.iter().enumerate() {
            self.status[o] = laplace_smooth(count, training_len, n_outcomes, k);
        }

        for (feature, table) in Feature::ALL.into_iter().zip(self.tables.iter_mut()) {
            let counts = frequencies.table(feature)?;
            if counts.values() != &table.values {
                return Err(TableError::ShapeMismatch);
            }
            let dim = table.values.len();
            let counts = counts.counts();
            for ((v, o), p) in table.probs.indexed_iter_mut() {
                *p = laplace_smooth(counts[[v, o]], status_counts[o], dim, k);
            }
        }

        self.k = Some(k);
        self.phase = Phase::Fit;
        Ok(())
    }

    /// Whether the tables hold fitted or imported values.
    pub fn is_fit(&self) -> bool {
        self.phase == Phase::Fit
    }

    /// Smoothing coefficient of the last fit, if known.
    pub fn get_k(&self) -> Option<f64> {
        self.k
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn outcomes(&self) -> Result<&Vocabulary<Outcome>, TableError> {
        self.ensure_fit()?;
        Ok(&self.outcomes)
    }

    /// `P(outcome)`, indexed like [`Self::outcomes`].
    pub fn status(&self) -> Result<ArrayView1<'_, f64>, TableError> {
        self.ensure_fit()?;
        Ok(self.status.view())
    }

    pub fn table(&self, feature: Feature) -> Result<&ProbTable, TableError> {
        self.ensure_fit()?;
        Ok(&self.tables[feature.index()])
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn query_p_status(&self, outcome: &Outcome) -> Result<f64, TableError> {
        let o = self.outcome_index(outcome)?;
        Ok(self.status[o])
    }

    /// `P(feature = value | outcome)`.
    pub fn query_p(
        &self,
        feature: Feature,
        value: &str,
        outcome: &Outcome,
    ) -> Result<f64, TableError> {
        let o = self.outcome_index(outcome)?;
        let table = &self.tables[feature.index()];
        let v = table.values.get(value).ok_or_else(|| TableError::UnknownKey {
            table: feature.name(),
            key: value.to_string(),
        })?;
        Ok(table.probs[[v, o]])
    }

    /// Copy of the outcome marginal.
    pub fn p_status(&self) -> Result<BTreeMap<Outcome, f64>, TableError> {
        self.ensure_fit()?;
        Ok(self
            .outcomes
            .iter()
            .map(|(o, outcome)| (outcome.clone(), self.status[o]))
            .collect())
    }

    /// Copy of one conditional table.
    pub fn p_table(&self, feature: Feature) -> Result<ConditionalTable, TableError> {
        let table = self.table(feature)?;
        Ok(table
            .values
            .iter()
            .map(|(v, value)| {
                let row = self
                    .outcomes
                    .iter()
                    .map(|(o, outcome)| (outcome.clone(), table.probs[[v, o]]))
                    .collect();
                (value.clone(), row)
            })
            .collect())
    }

    // =========================================================================
    // Import
    // =========================================================================

    /// Build fitted tables from a marginal and the nine conditional tables.
    ///
    /// `conditionals` is indexed like [`Feature::ALL`]. Every conditional row
    /// must carry exactly the outcomes of `p_status`.
    pub fn from_parts(
        p_status: BTreeMap<Outcome, f64>,
        conditionals: [ConditionalTable; Feature::COUNT],
        k: Option<f64>,
    ) -> Result<Self, TableError> {
        let outcomes = Vocabulary::new(p_status.keys().cloned());
        let status = Array1::from_iter(p_status.values().copied());
        let n_outcomes = outcomes.len();

        let mut tables = Vec::with_capacity(Feature::COUNT);
        for (feature, conditional) in Feature::ALL.into_iter().zip(conditionals) {
            let values = Vocabulary::new(conditional.keys().cloned());
            let mut probs = Array2::zeros((values.len(), n_outcomes));
            for (v, (value, row)) in conditional.into_iter().enumerate() {
                if row.len() != n_outcomes {
                    return Err(TableError::InconsistentOutcomes {
                        table: feature.name(),
                        value,
                    });
                }
                for (outcome, p) in row {
                    let Some(o) = outcomes.get(&outcome) else {
                        return Err(TableError::InconsistentOutcomes {
                            table: feature.name(),
                            value,
                        });
                    };
                    probs[[v, o]] = p;
                }
            }
            tables.push(ProbTable { values, probs });
        }

        Ok(Self {
            phase: Phase::Fit,
            k,
            outcomes,
            status,
            tables,
        })
    }

    fn outcome_index(&self, outcome: &Outcome) -> Result<usize, TableError> {
        self.ensure_fit()?;
        self.outcomes.get(outcome).ok_or_else(|| TableError::UnknownKey {
            table: "arrival_status",
            key: outcome.to_string(),
        })
    }

    fn ensure_fit(&self) -> Result<(), TableError> {
        match self.phase {
            Phase::Fit => Ok(()),
            _ => Err(TableError::NotFit),
        }
    }
}
