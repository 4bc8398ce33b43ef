//! Prediction inputs.

use std::borrow::Cow;

use super::reference::ReferenceTables;
use crate::data::discretize::{DiscretizeError, floor_departure_time};
use crate::data::FlightRecord;
use crate::forecast::{ForecastError, ForecastProvider};
use crate::training::{Feature, FeatureSource};

/// Errors raised while building a query.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("day of week must be in 1..=7, got {0}")]
    InvalidDay(u8),

    #[error(transparent)]
    Discretize(#[from] DiscretizeError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

/// The nine discretized inputs of a prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightQuery {
    pub origin: String,
    pub dest: String,
    pub carrier: String,
    /// 1 (Monday) to 7 (Sunday).
    pub day_of_week: u8,
    /// Departure slot on the 30-minute grid.
    pub departure_time: String,
    pub src_temperature: String,
    pub dst_temperature: String,
    pub src_wind_speed: String,
    pub dst_wind_speed: String,
}

/// A scheduled flight whose weather is still to be looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledFlight {
    pub origin: String,
    pub dest: String,
    pub carrier: String,
    pub day_of_week: u8,
    /// Scheduled departure, `hhmm`.
    pub departure_hhmm: String,
    /// Scheduled departure as an ISO 8601 timestamp, passed to the forecast provider.
    pub departure_timestamp: String,
}

impl FlightQuery {
    /// Query with the feature values of an existing record.
    pub fn from_record(record: &FlightRecord) -> Self {
        Self {
            origin: record.origin.clone(),
            dest: record.dest.clone(),
            carrier: record.carrier.clone(),
            day_of_week: record.day_of_week,
            departure_time: record.departure_time.clone(),
            src_temperature: record.src_temperature.clone(),
            dst_temperature: record.dst_temperature.clone(),
            src_wind_speed: record.src_wind_speed.clone(),
            dst_wind_speed: record.dst_wind_speed.clone(),
        }
    }

    /// Discretize raw weather readings and an `hhmm` departure time.
    #[allow(clippy::too_many_arguments)]
    pub fn from_raw(
        reference: &ReferenceTables,
        origin: impl Into<String>,
        dest: impl Into<String>,
        carrier: impl Into<String>,
        day_of_week: u8,
        departure_hhmm: &str,
        temperatures: (f64, f64),
        wind_speeds: (f64, f64),
    ) -> Result<Self, QueryError> {
        if !(1..=7).contains(&day_of_week) {
            return Err(QueryError::InvalidDay(day_of_week));
        }
        let temperature = reference.temperature();
        let wind = reference.wind_speed();
        Ok(Self {
            origin: origin.into(),
            dest: dest.into(),
            carrier: carrier.into(),
            day_of_week,
            departure_time: floor_departure_time(departure_hhmm)?,
            src_temperature: temperature.key_for(temperatures.0)?.to_string(),
            dst_temperature: temperature.key_for(temperatures.1)?.to_string(),
            src_wind_speed: wind.key_for(wind_speeds.0)?.to_string(),
            dst_wind_speed: wind.key_for(wind_speeds.1)?.to_string(),
        })
    }

    /// Fetch origin and destination forecasts at departure time and discretize them.
    pub fn from_forecast<P: ForecastProvider + ?Sized>(
        provider: &P,
        reference: &ReferenceTables,
        flight: &ScheduledFlight,
    ) -> Result<Self, QueryError> {
        let src = provider.forecast(&flight.origin, &flight.departure_timestamp)?;
        let dst = provider.forecast(&flight.dest, &flight.departure_timestamp)?;
        Self::from_raw(
            reference,
            flight.origin.clone(),
            flight.dest.clone(),
            flight.carrier.clone(),
            flight.day_of_week,
            &flight.departure_hhmm,
            (src.temperature, dst.temperature),
            (src.wind_speed, dst.wind_speed),
        )
    }
}

impl From<&FlightRecord> for FlightQuery {
    fn from(record: &FlightRecord) -> Self {
        Self::from_record(record)
    }
}

impl FeatureSource for FlightQuery {
    fn feature_value(&self, feature: Feature) -> Cow<'_, str> {
        match feature {
            Feature::Day => Cow::Owned(self.day_of_week.to_string()),
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
