//! Weather forecast provider contract.
//!
//! Forecast retrieval lives outside this crate. A provider returns the hourly
//! temperature and wind speed for an airport at a timestamp at most
//! [`MAX_FORECAST_DAYS`] ahead; [`crate::model::FlightQuery::from_forecast`]
//! discretizes the readings for prediction.

use std::collections::HashMap;

/// Furthest a forecast can reach into the future, in days.
pub const MAX_FORECAST_DAYS: u32 = 7;

/// Failure modes a provider must keep distinct.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForecastError {
    /// The forecast service could not be reached or answered with an error.
    #[error("forecast provider unreachable: {0}")]
    Connectivity(String),

    /// The airport has no forecast location mapping.
    #[error("no forecast location for airport {0:?}")]
    UnknownAirport(String),

    /// The timestamp is in the past or beyond the forecast horizon.
    #[error("timestamp {0:?} is outside the forecast range")]
    OutOfRange(String),
}

/// Hourly weather reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forecast {
    /// Temperature, in the units of the temperature bucket table.
    pub temperature: f64,
    /// Wind speed, in the units of the wind bucket table.
    pub wind_speed: f64,
}

/// Source of hourly forecasts.
pub trait ForecastProvider {
    /// Forecast for the hour containing `iso_timestamp` at `airport`.
    fn forecast(&self, airport: &str, iso_timestamp: &str) -> Result<Forecast, ForecastError>;
}

impl<P: ForecastProvider + ?Sized> ForecastProvider for &P {
    fn forecast(&self, airport: &str, iso_timestamp: &str) -> Result<Forecast, ForecastError> {
        (**self).forecast(airport, iso_timestamp)
    }
}

/// Fixed per-airport forecasts, ignoring the timestamp.
///
/// Useful for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticForecasts {
    readings: HashMap<String, Forecast>,
}

impl StaticForecasts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, airport: impl Into<String>, forecast: Forecast) -> Self {
        self.readings.insert(airport.into(), forecast);
        self
    }
}

impl ForecastProvider for StaticForecasts {
    fn forecast(&self, airport: &str, _iso_timestamp: &str) -> Result<Forecast, ForecastError> {
        self.readings
            .get(airport)
            .copied()
            .ok_or_else(|| ForecastError::UnknownAirport(airport.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_forecasts() {
        let forecast = Forecast {
            temperature: 12.0,
            wind_speed: 8.0,
        };
        let provider = StaticForecasts::new().with("10135", forecast);

        let f = provider.forecast("10135", "2024-03-01T14:00:00Z").unwrap();
        assert_eq!(f.temperature, 12.0);
        assert_eq!(
            provider.forecast("99999", "2024-03-01T14:00:00Z"),
            Err(ForecastError::UnknownAirport("99999".into()))
        );
    }
}
