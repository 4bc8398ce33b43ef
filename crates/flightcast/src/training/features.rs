//! Conditional feature families.
//!
//! Counting, fitting and prediction all iterate over [`Feature::ALL`] instead
//! of handling each family separately.

use std::borrow::Cow;
use std::fmt;

use crate::data::FlightRecord;
use crate::model::{KeyMeta, KeyMetaError};

/// One of the nine categorical predictors conditioned on the outcome.
///
/// The outcome marginal is the tenth table and is handled separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    Day,
    Airline,
    SrcAirport,
    DstAirport,
    DepartureTime,
    SrcTemperature,
    DstTemperature,
    SrcWindSpeed,
    DstWindSpeed,
}

impl Feature {
    /// Number of conditional families.
    pub const COUNT: usize = 9;

    /// Every family, in table order.
    pub const ALL: [Feature; Self::COUNT] = [
        Feature::Day,
        Feature::Airline,
        Feature::SrcAirport,
        Feature::DstAirport,
        Feature::DepartureTime,
        Feature::SrcTemperature,
        Feature::DstTemperature,
        Feature::SrcWindSpeed,
        Feature::DstWindSpeed,
    ];

    /// Position in [`Feature::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Table name used in the persisted model.
    pub fn name(self) -> &'static str {
        match self {
            Feature::Day => "day",
            Feature::Airline => "airline",
            Feature::SrcAirport => "src_airport",
            Feature::DstAirport => "dst_airport",
            Feature::DepartureTime => "departure_time",
            Feature::SrcTemperature => "src_temperature",
            Feature::DstTemperature => "dst_temperature",
            Feature::SrcWindSpeed => "src_wind_speed",
            Feature::DstWindSpeed => "dst_wind_speed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Every value this family can take, from the vocabulary.
    ///
    /// Source and destination families share a universe but each call
    /// returns a freshly allocated list.
    pub fn universe(self, meta: &KeyMeta) -> Result<Vec<String>, KeyMetaError> {
        Ok(match self {
            Feature::Day => meta.day_keys(),
            Feature::Airline => meta.seen_carriers()?.iter().cloned().collect(),
            Feature::SrcAirport | Feature::DstAirport => {
                meta.seen_airports()?.iter().cloned().collect()
            }
            Feature::DepartureTime => meta.dep_times(),
            Feature::SrcTemperature | Feature::DstTemperature => meta.temp_keys()?.to_vec(),
            Feature::SrcWindSpeed | Feature::DstWindSpeed => meta.wind_keys()?.to_vec(),
        })
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything that carries a value for every feature family.
pub trait FeatureSource {
    fn feature_value(&self, feature: Feature) -> Cow<'_, str>;
}

impl FeatureSource for FlightRecord {
    fn feature_value(&self, feature: Feature) -> Cow<'_, str> {
        match feature {
            Feature::Day => Cow::Owned(self.day_key()),
            Feature::Airline => Cow::Borrowed(&self.carrier),
            Feature::SrcAirport => Cow::Borrowed(&self.origin),
            Feature::DstAirport => Cow::Borrowed(&self.dest),
            Feature::DepartureTime => Cow::Borrowed(&self.departure_time),
            Feature::SrcTemperature => Cow::Borrowed(&self.src_temperature),
            Feature::DstTemperature => Cow::Borrowed(&self.dst_temperature),
            Feature::SrcWindSpeed => Cow::Borrowed(&self.src_wind_speed),
            Feature::DstWindSpeed => Cow::Borrowed(&self.dst_wind_speed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture_key_meta, fixture_records};

    #[test]
    fn index_matches_position() {
        for (i, f) in Feature::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
            assert_eq!(Feature::from_name(f.name()), Some(*f));
        }
        assert_eq!(Feature::from_name("arrival_status"), None);
    }

    #[test]
    fn universes_follow_key_meta() {
        let meta = fixture_key_meta();
        assert_eq!(Feature::Day.universe(&meta).unwrap().len(), 7);
        assert_eq!(Feature::DepartureTime.universe(&meta).unwrap().len(), 48);
        assert_eq!(Feature::SrcAirport.universe(&meta).unwrap(), ["a1", "a2"]);
        assert_eq!(Feature::Airline.universe(&meta).unwrap(), ["c1", "c2"]);
        assert_eq!(Feature::DstWindSpeed.universe(&meta).unwrap(), ["1", "2"]);
    }

    #[test]
    fn unset_universe_propagates() {
        let meta = KeyMeta::new();
        assert!(Feature::Airline.universe(&meta).is_err());
        assert!(Feature::Day.universe(&meta).is_ok());
    }

    #[test]
    fn record_values() {
        let r = &fixture_records()[0];
        assert_eq!(r.feature_value(Feature::SrcAirport), "a1");
        assert_eq!(r.feature_value(Feature::DstAirport), "a2");
        assert_eq!(r.feature_value(Feature::Day), "1");
    }
}
