//! flightcast: Naive Bayes forecasting of flight arrival outcomes.
//!
//! Predicts whether a flight will be cancelled (and why), diverted, or how
//! late it will arrive, from its route, carrier, schedule and the weather at
//! both ends. Every feature is discretized, and conditional probabilities
//! are Laplace smoothed with a coefficient chosen by nested cross-validation.
//!
//! # Key Types
//!
//! - [`BayesModel`] - High-level model with load/train/predict/save
//! - [`TrainConfig`] - Training configuration builder
//! - [`FlightQuery`] - Prediction inputs
//! - [`Outcome`] - Cancellation, delay group or diversion
//! - [`Dataset`] - Records with holdout partitions
//!
//! # Training
//!
//! ```no_run
//! use flightcast::{BayesModel, FlightQuery, TrainConfig};
//!
//! let mut model = BayesModel::default();
//! model.load_data("flights.csv")?;
//! let report = model.train(&TrainConfig::builder().seed(7).build()?)?;
//! println!("k = {}, accuracy = {}%", report.best_k, report.accuracy);
//!
//! let record = &model.dataset().records()?[0];
//! let prediction = model.make_prediction(&FlightQuery::from(record))?;
//! println!("{} ({:.3})", prediction.outcome, prediction.probability);
//! model.save_json("model.json")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Forecast Queries
//!
//! Queries for upcoming flights fetch weather through a
//! [`forecast::ForecastProvider`]; see [`FlightQuery::from_forecast`].

// Re-export approx traits for users who want to compare probabilities
pub use approx;

pub mod data;
pub mod forecast;
pub mod inference;
pub mod model;
pub mod persist;
pub mod testing;
pub mod training;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// High-level model types
pub use model::{BayesModel, ModelError, ModelState};

// Configuration and inputs
pub use model::{FlightQuery, ReferenceTables, ScheduledFlight, TrainConfig};

// Training results
pub use training::{TrainReport, Verbosity};

// Prediction results
pub use inference::{Posterior, Prediction};

// Data types
pub use data::{Dataset, DatasetError, FlightRecord, Outcome};
