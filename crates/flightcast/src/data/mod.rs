//! Flight records and the dataset they are trained on.
//!
//! - [`Outcome`]: cancellation, delay group or diversion
//! - [`FlightRecord`]: one discretized training row
//! - [`RawFlightRecord`]: a merged flight + weather row before discretization
//! - [`Dataset`]: ordered records with test and validation partitions
//! - [`load_records`]: read records from JSON or CSV

pub mod dataset;
pub mod discretize;
pub mod io;
pub mod outcome;
pub mod record;

pub use dataset::{Dataset, DatasetError};
pub use discretize::{Bucket, Buckets, DiscretizeError};
pub use io::{LoadError, load_records, read_raw_csv};
pub use outcome::{Outcome, ParseOutcomeError};
pub use record::{FlightRecord, RawFlightRecord};
