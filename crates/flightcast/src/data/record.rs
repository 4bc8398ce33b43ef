//! Flight records.
//!
//! - [`FlightRecord`]: a merged, discretized training row.
//! - [`RawFlightRecord`]: a merged row whose weather and time fields are still
//!   continuous; [`RawFlightRecord::discretize`] turns it into a [`FlightRecord`].
//!
//! Field names follow the BTS on-time performance export so that merged files
//! can be read without renaming columns.

use serde::{Deserialize, Serialize};

use super::discretize::{Buckets, DiscretizeError, floor_departure_time};
use super::outcome::Outcome;

/// A merged and discretized flight record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    /// Origin airport id.
    #[serde(rename = "ORIGIN_AIRPORT_ID", with = "loose::text")]
    pub origin: String,
    /// Destination airport id.
    #[serde(rename = "DEST_AIRPORT_ID", with = "loose::text")]
    pub dest: String,
    /// Operating carrier code.
    #[serde(rename = "OP_UNIQUE_CARRIER", with = "loose::text")]
    pub carrier: String,
    /// Day of week, 1 (Monday) to 7 (Sunday).
    #[serde(rename = "DAY_OF_WEEK", with = "loose::day")]
    pub day_of_week: u8,
    /// Scheduled departure time bucket (`hhmm` on the 30-minute grid).
    #[serde(rename = "CRS_DEP_TIME", with = "loose::text")]
    pub departure_time: String,
    /// Temperature bucket key at the origin.
    #[serde(rename = "src_tavg", with = "loose::text")]
    pub src_temperature: String,
    /// Temperature bucket key at the destination.
    #[serde(rename = "dst_tavg", with = "loose::text")]
    pub dst_temperature: String,
    /// Wind-speed bucket key at the origin.
    #[serde(rename = "src_wspd", with = "loose::text")]
    pub src_wind_speed: String,
    /// Wind-speed bucket key at the destination.
    #[serde(rename = "dst_wspd", with = "loose::text")]
    pub dst_wind_speed: String,
    /// Whether the flight was cancelled.
    #[serde(rename = "CANCELLED", with = "loose::flag")]
    pub cancelled: bool,
    /// Cancellation reason code; empty unless cancelled.
    #[serde(rename = "CANCELLATION_CODE", with = "loose::text", default)]
    pub cancellation_code: String,
    /// Whether the flight was diverted.
    #[serde(rename = "DIVERTED", with = "loose::flag")]
    pub diverted: bool,
    /// Arrival delay group; absent for cancelled or diverted flights.
    #[serde(rename = "ARR_DELAY_GROUP", with = "loose::group", default)]
    pub arrival_delay_group: Option<i32>,
}

impl FlightRecord {
    /// The true outcome of this flight.
    ///
    /// Cancellation takes priority over diversion, which takes priority over
    /// the delay group. Returns `None` for a flight that was neither cancelled
    /// nor diverted but has no delay group.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.cancelled {
            Some(Outcome::Cancel(self.cancellation_code.clone()))
        } else if self.diverted {
            Some(Outcome::Divert)
        } else {
            self.arrival_delay_group.map(Outcome::Delay)
        }
    }

    /// Day-of-week key as stored in the probability tables.
    pub fn day_key(&self) -> String {
        self.day_of_week.to_string()
    }
}

/// A merged record whose weather and departure fields are not yet discretized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFlightRecord {
    #[serde(rename = "ORIGIN_AIRPORT_ID", with = "loose::text")]
    pub origin: String,
    #[serde(rename = "DEST_AIRPORT_ID", with = "loose::text")]
    pub dest: String,
    #[serde(rename = "OP_UNIQUE_CARRIER", with = "loose::text")]
    pub carrier: String,
    #[serde(rename = "DAY_OF_WEEK", with = "loose::day")]
    pub day_of_week: u8,
    /// Scheduled departure time, `hhmm`.
    #[serde(rename = "CRS_DEP_TIME", with = "loose::text")]
    pub departure_time: String,
    #[serde(rename = "src_tavg")]
    pub src_temperature: f64,
    #[serde(rename = "dst_tavg")]
    pub dst_temperature: f64,
    #[serde(rename = "src_wspd")]
    pub src_wind_speed: f64,
    #[serde(rename = "dst_wspd")]
    pub dst_wind_speed: f64,
    #[serde(rename = "CANCELLED", with = "loose::flag")]
    pub cancelled: bool,
    #[serde(rename = "CANCELLATION_CODE", with = "loose::text", default)]
    pub cancellation_code: String,
    #[serde(rename = "DIVERTED", with = "loose::flag")]
    pub diverted: bool,
    #[serde(rename = "ARR_DELAY_GROUP", with = "loose::group", default)]
    pub arrival_delay_group: Option<i32>,
}

impl RawFlightRecord {
    /// Discretize weather and departure time.
    ///
    /// Every other field is carried over unchanged.
    pub fn discretize(
        &self,
        temperature: &Buckets,
        wind_speed: &Buckets,
    ) -> Result<FlightRecord, DiscretizeError> {
        Ok(FlightRecord {
            origin: self.origin.clone(),
            dest: self.dest.clone(),
            carrier: self.carrier.clone(),
            day_of_week: self.day_of_week,
            departure_time: floor_departure_time(&self.departure_time)?,
            src_temperature: temperature.key_for(self.src_temperature)?.to_string(),
            dst_temperature: temperature.key_for(self.dst_temperature)?.to_string(),
            src_wind_speed: wind_speed.key_for(self.src_wind_speed)?.to_string(),
            dst_wind_speed: wind_speed.key_for(self.dst_wind_speed)?.to_string(),
            cancelled: self.cancelled,
            cancellation_code: self.cancellation_code.clone(),
            diverted: self.diverted,
            arrival_delay_group: self.arrival_delay_group,
        })
    }
}

// =============================================================================
// Lenient field codecs
// =============================================================================

/// Field codecs tolerant of the mixed typing found in BTS exports.
///
/// Flags appear as `"1.00"`, `"1"`, `1` or `true`; ids appear as strings or
/// numbers; empty strings stand for missing values.
mod loose {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Value {
        Missing,
        Bool(bool),
        Int(i64),
        Float(f64),
        Text(String),
    }

    fn invalid<E: serde::de::Error>(what: &str, got: impl std::fmt::Display) -> E {
        E::custom(format!("invalid {what}: {got}"))
    }

    pub mod text {
        use super::*;
        use serde::Serializer;

        pub fn serialize<S: Serializer>(value: &str, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_str(value)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
            Ok(match Value::deserialize(d)? {
                Value::Missing => String::new(),
                Value::Bool(b) => b.to_string(),
                Value::Int(i) => i.to_string(),
                Value::Float(f) => f.to_string(),
                Value::Text(t) => t,
            })
        }
    }

    pub mod flag {
        use super::*;
        use serde::Serializer;

        pub fn serialize<S: Serializer>(value: &bool, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_str(if *value { "1.00" } else { "0.00" })
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
            match Value::deserialize(d)? {
                Value::Missing => Ok(false),
                Value::Bool(b) => Ok(b),
                Value::Int(i) => Ok(i != 0),
                Value::Float(f) => Ok(f != 0.0),
                Value::Text(t) => match t.trim() {
                    "" => Ok(false),
                    "true" | "True" => Ok(true),
                    "false" | "False" => Ok(false),
                    other => other
                        .parse::<f64>()
                        .map(|f| f != 0.0)
                        .map_err(|_| invalid("flag", other)),
                },
            }
        }
    }

    pub mod day {
        use super::*;
        use serde::Serializer;

        pub fn serialize<S: Serializer>(value: &u8, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_str(&value.to_string())
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
            let day = match Value::deserialize(d)? {
                Value::Int(i) => i,
                Value::Float(f) if f.fract() == 0.0 => f as i64,
                Value::Text(t) => match t.trim().parse::<i64>() {
                    Ok(day) => day,
                    Err(_) => return Err(invalid("day of week", &t)),
                },
                _ => return Err(invalid("day of week", "non-numeric value")),
            };
            if !(1..=7).contains(&day) {
                return Err(invalid("day of week", day));
            }
            Ok(day as u8)
        }
    }

    pub mod group {
        use super::*;
        use serde::Serializer;

        pub fn serialize<S: Serializer>(value: &Option<i32>, s: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(g) => s.serialize_str(&g.to_string()),
                None => s.serialize_str(""),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
            match Value::deserialize(d)? {
                Value::Missing => Ok(None),
                Value::Int(i) => i32::try_from(i)
                    .map(Some)
                    .map_err(|_| invalid("delay group", i)),
                Value::Float(f) => whole_i32(f)
                    .map(Some)
                    .ok_or_else(|| invalid("delay group", f)),
                Value::Text(t) if t.trim().is_empty() => Ok(None),
                Value::Text(t) => {
                    let trimmed = t.trim();
                    trimmed
                        .parse::<i32>()
                        .ok()
                        .or_else(|| trimmed.parse::<f64>().ok().and_then(whole_i32))
                        .map(Some)
                        .ok_or_else(|| invalid("delay group", trimmed))
                }
                _ => Err(invalid("delay group", "non-numeric value")),
            }
        }

        /// `f` as an `i32` when it is integral and in range.
        fn whole_i32(f: f64) -> Option<i32> {
            let in_range = f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX);
            (f.fract() == 0.0 && in_range).then_some(f as i32)
        }
    }
}
