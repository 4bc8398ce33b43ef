//! Loading merged training records from disk.
//!
//! Two formats are accepted, chosen by file extension:
//!
//! - `.json`: an array of already discretized [`FlightRecord`] objects.
//! - `.csv`: merged flight + weather rows ([`RawFlightRecord`]) with continuous
//!   weather readings and `hhmm` departure times, discretized while loading.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use super::discretize::{Buckets, DiscretizeError};
use super::record::{FlightRecord, RawFlightRecord};

/// Errors that can occur when loading training records.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("training data file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed JSON training data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed CSV training data: {0}")]
    Csv(#[from] csv::Error),

    #[error("record {index}: {source}")]
    Discretize {
        index: usize,
        #[source]
        source: DiscretizeError,
    },

    #[error("record {index} is malformed: {reason}")]
    Malformed { index: usize, reason: String },

    #[error("training data file contains no records: {}", .0.display())]
    Empty(PathBuf),

    #[error("unsupported training data format {0:?}; expected .json or .csv")]
    UnsupportedFormat(String),
}

/// Load records from `path`, discretizing CSV input with the given tables.
pub fn load_records(
    path: &Path,
    temperature: &Buckets,
    wind_speed: &Buckets,
) -> Result<Vec<FlightRecord>, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
        _ => LoadError::Io(e),
    })?;

    let records = match extension.as_str() {
        "json" => serde_json::from_reader::<_, Vec<FlightRecord>>(BufReader::new(file))?,
        "csv" => read_raw_csv(file, temperature, wind_speed)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    if records.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    validate(&records)?;
    Ok(records)
}

/// Read raw merged rows and discretize them.
pub fn read_raw_csv<R: io::Read>(
    reader: R,
    temperature: &Buckets,
    wind_speed: &Buckets,
) -> Result<Vec<FlightRecord>, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (index, row) in csv_reader.deserialize::<RawFlightRecord>().enumerate() {
        let raw = row?;
        let record = raw
            .discretize(temperature, wind_speed)
            .map_err(|source| LoadError::Discretize { index, source })?;
        records.push(record);
    }
    Ok(records)
}

/// Every record must have a derivable outcome.
fn validate(records: &[FlightRecord]) -> Result<(), LoadError> {
    for (index, record) in records.iter().enumerate() {
        if record.outcome().is_none() {
            return Err(LoadError::Malformed {
                index,
                reason: "flight neither cancelled nor diverted but has no ARR_DELAY_GROUP".into(),
            });
        }
        if record.cancelled && record.cancellation_code.is_empty() {
            return Err(LoadError::Malformed {
                index,
                reason: "cancelled flight has no CANCELLATION_CODE".into(),
            });
        }
    }
    Ok(())
}
