//! Discretization of continuous weather and time fields.
//!
//! Temperature and wind speed are mapped to bucket keys through threshold
//! tables; scheduled departure times are floored onto a 30-minute grid.

use serde::{Deserialize, Serialize};

/// Width of a departure-time slot, in minutes.
pub const DEPARTURE_SLOT_MINUTES: u32 = 30;

/// Number of departure-time slots in a day.
pub const N_DEPARTURE_SLOTS: usize = (24 * 60 / DEPARTURE_SLOT_MINUTES) as usize;

/// Errors raised while discretizing raw values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DiscretizeError {
    /// Departure time is not a valid `hhmm` clock time.
    #[error("invalid departure time {0:?}: expected `hhmm` in 0000..=2359")]
    InvalidDepartureTime(String),

    /// Value is NaN and cannot be placed in a bucket.
    #[error("cannot bucket NaN value for {0}")]
    NotANumber(&'static str),

    /// Bucket table has no rows.
    #[error("bucket table {0} is empty")]
    EmptyTable(&'static str),
}

// =============================================================================
// Buckets
// =============================================================================

/// One row of a threshold table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Key stored in records and probability tables.
    pub key: String,
    /// Inclusive lower bound. Ignored for the first row, which is unbounded below.
    pub min: f64,
}

/// Ordered threshold table mapping continuous values to bucket keys.
///
/// Lookup follows `bisect_right` semantics over the lower bounds of every row
/// except the first: a value equal to a threshold lands in the upper bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Buckets {
    name: &'static str,
    rows: Vec<Bucket>,
}

impl Buckets {
    /// Create a table from rows sorted by `min`.
    pub fn new(name: &'static str, rows: Vec<Bucket>) -> Result<Self, DiscretizeError> {
        if rows.is_empty() {
            return Err(DiscretizeError::EmptyTable(name));
        }
        Ok(Self { name, rows })
    }

    /// Evenly spaced table: keys `"0".."n"` with thresholds `first, first + step, ..`.
    ///
    /// `n_thresholds` thresholds give `n_thresholds + 1` buckets.
    pub fn uniform(name: &'static str, first: f64, step: f64, n_thresholds: usize) -> Self {
        let rows = (0..=n_thresholds)
            .map(|i| Bucket {
                key: i.to_string(),
                min: if i == 0 {
                    f64::NEG_INFINITY
                } else {
                    first + step * (i - 1) as f64
                },
            })
            .collect();
        Self { name, rows }
    }

    /// Table name (for diagnostics).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Bucket keys in table order.
    pub fn keys(&self) -> Vec<String> {
        self.rows.iter().map(|b| b.key.clone()).collect()
    }

    /// Rows in table order.
    pub fn rows(&self) -> &[Bucket] {
        &self.rows
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false for a constructed table.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bucket key for a value.
    pub fn key_for(&self, value: f64) -> Result<&str, DiscretizeError> {
        if value.is_nan() {
            return Err(DiscretizeError::NotANumber(self.name));
        }
        let index = self.rows[1..].partition_point(|b| b.min <= value);
        Ok(&self.rows[index].key)
    }
}

// =============================================================================
// Departure times
// =============================================================================

/// The fixed departure-time grid: `0000`, `0030`, ..., `2330`.
pub fn departure_time_keys() -> Vec<String> {
    (0..N_DEPARTURE_SLOTS as u32)
        .map(|slot| {
            let minutes = slot * DEPARTURE_SLOT_MINUTES;
            format!("{:02}{:02}", minutes / 60, minutes % 60)
        })
        .collect()
}

/// Floor an `hhmm` clock time onto the departure grid.
///
/// Leading zeros may be omitted (`"5"` is `00:05`), as in BTS exports.
pub fn floor_departure_time(hhmm: &str) -> Result<String, DiscretizeError> {
    let invalid = || DiscretizeError::InvalidDepartureTime(hhmm.to_string());
    let trimmed = hhmm.trim();
    if trimmed.is_empty() || trimmed.len() > 4 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let value: u32 = trimmed.parse().map_err(|_| invalid())?;
    let (hours, minutes) = (value / 100, value % 100);
    if hours >= 24 || minutes >= 60 {
        return Err(invalid());
    }
    let floored = minutes - minutes % DEPARTURE_SLOT_MINUTES;
    Ok(format!("{hours:02}{floored:02}"))
}
