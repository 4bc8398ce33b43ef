//! Model vocabulary: which keys are possible and which were observed.

use std::collections::{BTreeMap, BTreeSet};

use crate::data::discretize::departure_time_keys;
use crate::data::Outcome;

/// Error raised when a vocabulary field is read before it was set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyMetaError {
    #[error("key metadata field `{0}` has not been initialized")]
    Uninitialized(&'static str),
}

/// Vocabulary provider for counting, fitting and prediction.
///
/// Static vocabularies (outcomes, days, departure slots, weather buckets) are
/// the same for every model built from the same reference tables. The seen
/// airport and carrier sets are derived from training data and gate which
/// values prediction accepts.
///
/// Optional fields distinguish "never configured" from "configured but empty":
/// membership queries on an unset field fail instead of answering `false`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyMeta {
    arrival_statuses: BTreeMap<Outcome, String>,
    seen_airports: Option<BTreeSet<String>>,
    seen_carriers: Option<BTreeSet<String>>,
    temp_keys: Option<Vec<String>>,
    wind_keys: Option<Vec<String>>,
}

/// Day-of-week keys, Monday first.
pub const DAY_KEYS: [&str; 7] = ["1", "2", "3", "4", "5", "6", "7"];

impl KeyMeta {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Replace the outcome universe (outcome → description).
    pub fn set_arrival_statuses(&mut self, statuses: BTreeMap<Outcome, String>) {
        self.arrival_statuses = statuses;
    }

    pub fn set_seen_airports<I, S>(&mut self, airports: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seen_airports = Some(airports.into_iter().map(Into::into).collect());
    }

    pub fn set_seen_carriers<I, S>(&mut self, carriers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seen_carriers = Some(carriers.into_iter().map(Into::into).collect());
    }

    pub fn set_temp_keys<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.temp_keys = Some(keys.into_iter().map(Into::into).collect());
    }

    pub fn set_wind_keys<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wind_keys = Some(keys.into_iter().map(Into::into).collect());
    }

    // =========================================================================
    // Membership
    // =========================================================================

    pub fn in_seen_airports(&self, airport: &str) -> Result<bool, KeyMetaError> {
        Ok(self.seen_airports()?.contains(airport))
    }

    pub fn in_seen_carriers(&self, carrier: &str) -> Result<bool, KeyMetaError> {
        Ok(self.seen_carriers()?.contains(carrier))
    }

    pub fn in_temp_keys(&self, key: &str) -> Result<bool, KeyMetaError> {
        Ok(self.temp_keys()?.iter().any(|k| k == key))
    }

    pub fn in_wind_keys(&self, key: &str) -> Result<bool, KeyMetaError> {
        Ok(self.wind_keys()?.iter().any(|k| k == key))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The outcome universe in canonical order.
    pub fn status_keys(&self) -> Vec<Outcome> {
        self.arrival_statuses.keys().cloned().collect()
    }

    pub fn arrival_statuses(&self) -> &BTreeMap<Outcome, String> {
        &self.arrival_statuses
    }

    /// Human-readable description of an outcome.
    pub fn describe(&self, outcome: &Outcome) -> Option<&str> {
        self.arrival_statuses.get(outcome).map(String::as_str)
    }

    /// The 48 half-hour departure slots.
    pub fn dep_times(&self) -> Vec<String> {
        departure_time_keys()
    }

    pub fn day_keys(&self) -> Vec<String> {
        DAY_KEYS.iter().map(|d| d.to_string()).collect()
    }

    pub fn seen_airports(&self) -> Result<&BTreeSet<String>, KeyMetaError> {
        self.seen_airports
            .as_ref()
            .ok_or(KeyMetaError::Uninitialized("seen_airports"))
    }

    pub fn seen_carriers(&self) -> Result<&BTreeSet<String>, KeyMetaError> {
        self.seen_carriers
            .as_ref()
            .ok_or(KeyMetaError::Uninitialized("seen_carriers"))
    }

    pub fn temp_keys(&self) -> Result<&[String], KeyMetaError> {
        self.temp_keys
            .as_deref()
            .ok_or(KeyMetaError::Uninitialized("temp_keys"))
    }

    pub fn wind_keys(&self) -> Result<&[String], KeyMetaError> {
        self.wind_keys
            .as_deref()
            .ok_or(KeyMetaError::Uninitialized("wind_keys"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture_key_meta;

    #[test]
    fn unset_membership_is_an_error() {
        let meta = KeyMeta::new();
        assert_eq!(
            meta.in_seen_airports("a1"),
            Err(KeyMetaError::Uninitialized("seen_airports"))
        );
        assert_eq!(
            meta.in_seen_carriers("c1"),
            Err(KeyMetaError::Uninitialized("seen_carriers"))
        );
        assert!(meta.in_temp_keys("1").is_err());
        assert!(meta.in_wind_keys("1").is_err());
    }

    #[test]
    fn empty_set_is_not_uninitialized() {
        let mut meta = KeyMeta::new();
        meta.set_seen_airports(Vec::<String>::new());
        assert_eq!(meta.in_seen_airports("a1"), Ok(false));
    }

    #[test]
    fn membership_after_set() {
        let meta = fixture_key_meta();
        assert_eq!(meta.in_seen_airports("a1"), Ok(true));
        assert_eq!(meta.in_seen_airports("zz"), Ok(false));
        assert_eq!(meta.in_seen_carriers("c2"), Ok(true));
        assert_eq!(meta.in_temp_keys("2"), Ok(true));
        assert_eq!(meta.in_wind_keys("9"), Ok(false));
    }

    #[test]
    fn status_keys_are_canonical() {
        let meta = fixture_key_meta();
        assert_eq!(
            meta.status_keys(),
            vec![
                Outcome::cancel("1"),
                Outcome::delay(1),
                Outcome::delay(2),
                Outcome::Divert
            ]
        );
    }

    #[test]
    fn fixed_grids() {
        let meta = KeyMeta::new();
        assert_eq!(meta.dep_times().len(), 48);
        assert_eq!(meta.day_keys(), DAY_KEYS);
    }

    #[test]
    fn setters_replace() {
        let mut meta = fixture_key_meta();
        meta.set_seen_carriers(["x"]);
        assert_eq!(meta.in_seen_carriers("c1"), Ok(false));
        assert_eq!(meta.in_seen_carriers("x"), Ok(true));
    }
}
