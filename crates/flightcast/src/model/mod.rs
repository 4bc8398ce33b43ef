//! High-level model API.
//!
//! - [`BayesModel`]: load data, train, predict, save and load
//! - [`TrainConfig`]: training configuration builder
//! - [`KeyMeta`]: key vocabularies shared by counting and prediction
//! - [`ReferenceTables`]: outcome codes and weather bucket thresholds
//! - [`FlightQuery`]: the inputs of one prediction

mod bayes;
mod config;
mod keymeta;
mod query;
mod reference;

pub use bayes::{BayesModel, ModelError, ModelState};
pub use config::{ConfigError, TrainConfig, TrainConfigBuilder};
pub use keymeta::{DAY_KEYS, KeyMeta, KeyMetaError};
pub use query::{FlightQuery, QueryError, ScheduledFlight};
pub use reference::{
    CANCELLATION_FILE, DELAY_GROUPS_FILE, DIVERT_DESCRIPTION, ReferenceError, ReferenceTables,
    TEMPERATURE_FILE, WIND_SPEED_FILE,
};
