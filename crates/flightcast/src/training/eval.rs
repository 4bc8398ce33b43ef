//! Holdout evaluation.
//!
//! A prediction passes when the predicted outcome equals the record's true
//! outcome exactly (same cancellation code, same delay group, or both divert).

use std::ops::Range;

use crate::data::FlightRecord;
use crate::inference::{PredictError, Predictor};

/// Errors raised while measuring error on a range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// No rows to evaluate; the error rate would be undefined.
    #[error("cannot evaluate empty range {start}..{end}")]
    EmptyRange { start: usize, end: usize },

    /// Range extends past the data.
    #[error("evaluation range {start}..{end} exceeds dataset length {len}")]
    OutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },

    /// A record has no derivable outcome to compare against.
    #[error("record {index} has no arrival outcome")]
    MissingOutcome { index: usize },

    #[error(transparent)]
    Predict(#[from] PredictError),
}

/// Pass/fail tally over an evaluated range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvalCounts {
    pub passed: usize,
    pub failed: usize,
}

impl EvalCounts {
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// `failed / total`. Never called on an empty tally.
    pub fn error_rate(&self) -> f64 {
        self.failed as f64 / self.total() as f64
    }

    /// `(1 - error) * 100` rounded to two decimals.
    pub fn accuracy_percent(&self) -> f64 {
        accuracy_percent(self.error_rate())
    }
}

/// Convert an error rate to a percentage rounded to two decimals.
pub fn accuracy_percent(error: f64) -> f64 {
    ((1.0 - error) * 100.0 * 100.0).round() / 100.0
}

/// Predict every record in `range` and tally passes and failures.
pub fn evaluate(
    predictor: &Predictor<'_>,
    records: &[FlightRecord],
    range: Range<usize>,
) -> Result<EvalCounts, EvalError> {
    if range.start >= range.end {
        return Err(EvalError::EmptyRange {
            start: range.start,
            end: range.end,
        });

    }
    if range.end > records.len() {
        return Err(EvalError::OutOfBounds {
            start: range.start,
            end: range.end,
            len: records.len(),
        });
    }

    let mut counts = EvalCounts::default();
    for index in range {
        let record = &records[index];
        let truth = record.outcome().ok_or(EvalError::MissingOutcome { index })?;
        let predicted = predictor.predict(record)?;
        if predicted.outcome == truth {
            counts.passed += 1;
        } else {
            counts.failed += 1;
        }
    }
    Ok(counts)
}

/// Error rate over `range`.
pub fn error_rate(
    predictor: &Predictor<'_>,
    records: &[FlightRecord],
    range: Range<usize>,
) -> Result<f64, EvalError> {
    evaluate(predictor, records, range).map(|c| c.error_rate())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture_dataset, fixture_key_meta, fixture_records};
    use crate::training::{FrequencyCounter, ProbabilityTables};
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    fn tables(k: f64) -> ProbabilityTables {
        let ds = fixture_dataset();
        let mut counter = FrequencyCounter::new();
        counter.reset_counters(&fixture_key_meta()).unwrap();
        counter.count_frequencies(&ds).unwrap();
        let mut tables = ProbabilityTables::new();
        tables.reset_tables(&counter).unwrap();
        tables.fit(&ds, &counter, k).unwrap();
        tables
    }

    #[rstest]
    #[case(0.0, 100.0)]
    #[case(1.0, 0.0)]
    #[case(0.25, 75.0)]
    #[case(1.0 / 3.0, 66.67)]
    fn accuracy_rounding(#[case] error: f64, #[case] expected: f64) {
        assert_abs_diff_eq!(accuracy_percent(error), expected, epsilon = 1e-9);
    }

    #[test]
    fn empty_range_fails_fast() {
        let meta = fixture_key_meta();
        let tables = tables(1.0);
        let predictor = Predictor::new(&meta, &tables).unwrap();
        assert_eq!(
            error_rate(&predictor, &fixture_records(), 2..2),
            Err(EvalError::EmptyRange { start: 2, end: 2 })
        );
    }

    #[test]
    fn out_of_bounds_range() {
        let meta = fixture_key_meta();
        let tables = tables(1.0);
        let predictor = Predictor::new(&meta, &tables).unwrap();
        assert!(matches!(
            error_rate(&predictor, &fixture_records(), 3..9),
            Err(EvalError::OutOfBounds { len: 5, .. })
        ));
    }

    #[test]
    fn training_rows_are_recalled_without_smoothing() {
        let meta = fixture_key_meta();
        let tables = tables(0.0);
        let predictor = Predictor::new(&meta, &tables).unwrap();
        let counts = evaluate(&predictor, &fixture_records(), 0..5).unwrap();
        assert_eq!(counts.total(), 5);
        assert_eq!(counts.passed, 5);
        assert_eq!(counts.error_rate(), 0.0);
        assert_eq!(counts.accuracy_percent(), 100.0);
    }
}
