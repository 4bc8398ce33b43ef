//! Naive Bayes inference.
//!
//! For a query with feature values `x_1..x_9`, every outcome `s` scores
//!
//! ```text
//! score(s) = P(s) * P(x_1 | s) * ... * P(x_9 | s)
//! ```
//!
//! and the posterior is `score / sum(score)`. When every score is zero the
//! posterior is zero everywhere rather than undefined.
//!
//! Airports and carriers are checked against the seen vocabulary before any
//! table is touched.

use std::collections::BTreeMap;

use ndarray::{Array1, ArrayView1};

use crate::data::Outcome;
use crate::model::{KeyMeta, KeyMetaError};
use crate::training::{Feature, FeatureSource, ProbTable, ProbabilityTables, TableError, Vocabulary};

/// Errors raised while predicting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    /// Tables have not been fit or imported.
    #[error("model has not been trained")]
    NotTrained,

    /// The outcome universe is empty.
    #[error("model has no outcomes to predict")]
    NoOutcomes,

    #[error("{role} airport {airport:?} did not occur in the training data")]
    UnknownAirport { role: &'static str, airport: String },

    #[error("carrier {0:?} did not occur in the training data")]
    UnknownCarrier(String),

    #[error(transparent)]
    KeyMeta(#[from] KeyMetaError),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Most probable outcome and its posterior probability.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub outcome: Outcome,
    pub probability: f64,
}

/// Normalized posterior over the outcome universe, in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct Posterior<'a> {
    outcomes: &'a Vocabulary<Outcome>,
    probs: Array1<f64>,
}

impl<'a> Posterior<'a> {
    /// Normalize raw scores. An all-zero score vector stays all zero.
    fn from_scores(outcomes: &'a Vocabulary<Outcome>, scores: Array1<f64>) -> Self {
        let total: f64 = scores.iter().sum();
        let probs = if total == 0.0 {
            Array1::zeros(scores.len())
        } else {
            scores / total
        };
        Self { outcomes, probs }
    }

    pub fn probability(&self, outcome: &Outcome) -> Option<f64> {
        self.outcomes.get(outcome).map(|i| self.probs[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a Outcome, f64)> + '_ {
        self.outcomes.keys().iter().zip(self.probs.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn to_map(&self) -> BTreeMap<Outcome, f64> {
        self.iter().map(|(o, p)| (o.clone(), p)).collect()
    }

    /// First outcome with strictly greatest probability.
    ///
    /// Returns `None` only for an empty posterior.
    pub fn argmax(&self) -> Option<Prediction> {
        let (index, probability) = argmax(self.probs.iter().copied())?;
        let outcome = self.outcomes.key(index)?.clone();
        Some(Prediction {
            outcome,
            probability,
        })
    }
}

/// Index and value of the first strictly greatest element.
fn argmax(values: impl IntoIterator<Item = f64>) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in values.into_iter().enumerate() {
        if best.is_none_or(|(_, best_p)| p > best_p) {
            best = Some((i, p));
        }
    }
    best
}

/// Borrowing view that scores queries against fitted tables.
#[derive(Debug, Clone)]
pub struct Predictor<'a> {
    meta: &'a KeyMeta,
    outcomes: &'a Vocabulary<Outcome>,
    status: ArrayView1<'a, f64>,
    tables: Vec<&'a ProbTable>,
}

impl<'a> Predictor<'a> {
    pub fn new(meta: &'a KeyMeta, tables: &'a ProbabilityTables) -> Result<Self, PredictError> {
        if !tables.is_fit() {
            return Err(PredictError::NotTrained);
        }
        let outcomes = tables.outcomes()?;
        if outcomes.is_empty() {
            return Err(PredictError::NoOutcomes);
        }
        let by_feature = Feature::ALL
            .iter()
            .map(|&feature| tables.table(feature))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            meta,
            outcomes,
            status: tables.status()?,
            tables: by_feature,
        })
    }

    /// Reject airports and carriers outside the seen vocabulary.
    pub fn check_vocabulary<Q: FeatureSource + ?Sized>(
        &self,
        query: &Q,
    ) -> Result<(), PredictError> {
        for (feature, role) in [
            (Feature::SrcAirport, "source"),
            (Feature::DstAirport, "destination"),
        ] {
            let airport = query.feature_value(feature);
            if !self.meta.in_seen_airports(&airport)? {
                return Err(PredictError::UnknownAirport {
                    role,
                    airport: airport.into_owned(),
                });
            }
        }
        let carrier = query.feature_value(Feature::Airline);
        if !self.meta.in_seen_carriers(&carrier)? {
            return Err(PredictError::UnknownCarrier(carrier.into_owned()));
        }
        Ok(())
    }

    /// Row index of the query's value in every feature table.
    fn rows<Q: FeatureSource + ?Sized>(
        &self,
        query: &Q,
    ) -> Result<[usize; Feature::COUNT], PredictError> {
        self.check_vocabulary(query)?;
        let mut rows = [0; Feature::COUNT];
        for ((row, feature), table) in rows.iter_mut().zip(Feature::ALL).zip(&self.tables) {
            let value = query.feature_value(feature);
            *row = table
                .values()
                .get(value.as_ref())
                .ok_or_else(|| TableError::UnknownKey {
                    table: feature.name(),
                    key: value.to_string(),
                })?;
        }
        Ok(rows)
    }

    /// Unnormalized `P(s) * prod P(x_i | s)` for outcome index `s`.
    fn score(&self, rows: &[usize; Feature::COUNT], outcome: usize) -> f64 {
        let mut score = self.status[outcome];
        for (table, &row) in self.tables.iter().zip(rows) {
            score *= table.probs()[[row, outcome]];
        }
        score
    }

    /// Posterior over every outcome.
    pub fn posterior<Q: FeatureSource + ?Sized>(
        &self,
        query: &Q,
    ) -> Result<Posterior<'a>, PredictError> {
        let rows = self.rows(query)?;
        let scores = Array1::from_shape_fn(self.outcomes.len(), |s| self.score(&rows, s));
        Ok(Posterior::from_scores(self.outcomes, scores))
    }

    /// Most probable outcome, without materializing the posterior.
    pub fn predict<Q: FeatureSource + ?Sized>(
        &self,
        query: &Q,
    ) -> Result<Prediction, PredictError> {
        let rows = self.rows(query)?;
        let n = self.outcomes.len();
        let total: f64 = (0..n).map(|s| self.score(&rows, s)).sum();
        let best = if total == 0.0 {
            argmax((0..n).map(|_| 0.0))
        } else {
            argmax((0..n).map(|s| self.score(&rows, s) / total))
        };
        let (index, probability) = best.ok_or(PredictError::NoOutcomes)?;
        let outcome = self
            .outcomes
            .key(index)
            .ok_or(PredictError::NoOutcomes)?
            .clone();
        Ok(Prediction {
            outcome,
            probability,
        })
    }
}
