//! Static reference tables.
//!
//! The outcome universe and weather bucket thresholds come from four lookup
//! tables: BTS cancellation codes, BTS on-time delay groups, temperature ranges
//! and wind speeds. [`ReferenceTables::builtin`] carries the standard tables;
//! [`ReferenceTables::from_dir`] reads them from CSV files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::keymeta::KeyMeta;
use crate::data::discretize::{Bucket, Buckets, DiscretizeError};
use crate::data::Outcome;

/// File names read by [`ReferenceTables::from_dir`].
pub const CANCELLATION_FILE: &str = "L_CANCELLATION.csv";
pub const DELAY_GROUPS_FILE: &str = "L_ONTIME_DELAY_GROUPS.csv";
pub const TEMPERATURE_FILE: &str = "temp_ranges.csv";
pub const WIND_SPEED_FILE: &str = "wind_speeds.csv";

/// Description attached to the divert outcome.
pub const DIVERT_DESCRIPTION: &str = "Diverted";

/// Errors raised while reading reference tables.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("failed to read {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: invalid code {code:?}", path.display())]
    InvalidCode { path: PathBuf, code: String },

    #[error("{}: row {row} has no lower bound", path.display())]
    MissingThreshold { path: PathBuf, row: usize },

    #[error(transparent)]
    Discretize(#[from] DiscretizeError),
}

/// Outcome vocabulary and weather bucket tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTables {
    cancellation_codes: BTreeMap<String, String>,
    delay_groups: BTreeMap<i32, String>,
    temperature: Buckets,
    wind_speed: Buckets,
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReferenceTables {
    /// The standard BTS codes with 10-degree temperature and 10-knot wind buckets.
    pub fn builtin() -> Self {
        let cancellation_codes = [
            ("A", "Carrier"),
            ("B", "Weather"),
            ("C", "National Air System"),
            ("D", "Security"),
        ]
        .into_iter()
        .map(|(c, d)| (c.to_string(), d.to_string()))
        .collect();

        let delay_groups = (-2..=12).map(|g| (g, delay_group_description(g))).collect();

        Self {
            cancellation_codes,
            delay_groups,
            temperature: Buckets::uniform("temperature", -10.0, 10.0, 12),
            wind_speed: Buckets::uniform("wind_speed", 10.0, 10.0, 4),
        }
    }

    /// Read the four lookup tables from `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ReferenceError> {
        let dir = dir.as_ref();

        let path = dir.join(CANCELLATION_FILE);
        let cancellation_codes: BTreeMap<String, String> = read_codes(&path)?
            .into_iter()
            .map(|row| {
                if row.code.is_empty() {
                    Err(ReferenceError::InvalidCode {
                        path: path.clone(),
                        code: row.code,
                    })
                } else {
                    Ok((row.code, row.description))
                }
            })
            .collect::<Result<_, _>>()?;

        let path = dir.join(DELAY_GROUPS_FILE);
        let delay_groups: BTreeMap<i32, String> = read_codes(&path)?
            .into_iter()
            .map(|row| match row.code.trim().parse::<i32>() {
                Ok(group) => Ok((group, row.description)),
                Err(_) => Err(ReferenceError::InvalidCode {
                    path: path.clone(),
                    code: row.code,
                }),
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            cancellation_codes,
            delay_groups,
            temperature: read_buckets("temperature", &dir.join(TEMPERATURE_FILE))?,
            wind_speed: read_buckets("wind_speed", &dir.join(WIND_SPEED_FILE))?,
        })
    }

    pub fn temperature(&self) -> &Buckets {
        &self.temperature
    }

    pub fn wind_speed(&self) -> &Buckets {
        &self.wind_speed
    }

    pub fn cancellation_codes(&self) -> &BTreeMap<String, String> {
        &self.cancellation_codes
    }

    pub fn delay_groups(&self) -> &BTreeMap<i32, String> {
        &self.delay_groups
    }

    /// Every outcome with its description: cancellations, delay groups, divert.
    pub fn arrival_statuses(&self) -> BTreeMap<Outcome, String> {
        let cancels = self
            .cancellation_codes
            .iter()
            .map(|(code, d)| (Outcome::cancel(code.clone()), d.clone()));
        let delays = self
            .delay_groups
            .iter()
            .map(|(&group, d)| (Outcome::delay(group), d.clone()));
        let divert = (Outcome::Divert, DIVERT_DESCRIPTION.to_string());
        cancels
            .chain(delays)
            .chain(std::iter::once(divert))
            .collect()
    }

    /// Vocabulary with the static fields set. Seen sets are left unset.
    pub fn key_meta(&self) -> KeyMeta {
        let mut meta = KeyMeta::new();
        meta.set_arrival_statuses(self.arrival_statuses());
        meta.set_temp_keys(self.temperature.keys());
        meta.set_wind_keys(self.wind_speed.keys());
        meta
    }
}

fn delay_group_description(group: i32) -> String {
    match group {
        g if g <= -2 => "Delay < -15 minutes".to_string(),
        -1 => "Delay between -15 and -1 minutes".to_string(),
        g if g >= 12 => "Delay >= 180 minutes".to_string(),
        g => format!("Delay between {} and {} minutes", g * 15, g * 15 + 14),
    }
}

#[derive(Debug, Deserialize)]
struct CodeRow {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Description", default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct BucketRow {
    key: String,
    #[serde(default)]
    min: Option<f64>,
}

fn csv_reader(path: &Path) -> Result<csv::Reader<std::fs::File>, ReferenceError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| ReferenceError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

fn read_codes(path: &Path) -> Result<Vec<CodeRow>, ReferenceError> {
    csv_reader(path)?
        .deserialize()
        .collect::<Result<Vec<CodeRow>, _>>()
        .map_err(|source| ReferenceError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// The first row is unbounded below; its `min` may be empty.
fn read_buckets(name: &'static str, path: &Path) -> Result<Buckets, ReferenceError> {
    let rows: Vec<BucketRow> = csv_reader(path)?
        .deserialize()
        .collect::<Result<_, _>>()
        .map_err(|source| ReferenceError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let buckets = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| match (i, row.min) {
            (0, min) => Ok(Bucket {
                key: row.key,
                min: min.unwrap_or(f64::NEG_INFINITY),
            }),
            (_, Some(min)) => Ok(Bucket { key: row.key, min }),
            (_, None) => Err(ReferenceError::MissingThreshold {
                path: path.to_path_buf(),
                row: i,
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Buckets::new(name, buckets)?)
}
