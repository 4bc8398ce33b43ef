//! High-level Naive Bayes model.
//!
//! [`BayesModel`] owns the dataset, vocabulary, counter and tables, and moves
//! through [`ModelState`] as data is loaded and the model is trained or
//! imported. Access components via [`meta()`](BayesModel::meta),
//! [`dataset()`](BayesModel::dataset) and [`tables()`](BayesModel::tables).

use std::collections::BTreeSet;
use std::ops::Range;
use std::path::Path;

use super::config::{ConfigError, TrainConfig};
use super::keymeta::KeyMeta;
use super::query::FlightQuery;
use super::reference::ReferenceTables;
use crate::data::{Dataset, DatasetError, FlightRecord, LoadError, load_records};
use crate::inference::{Posterior, PredictError, Prediction, Predictor};
use crate::persist::{self, ModelSchema, ReadError, WriteError};
use crate::training::{
    EvalError, FrequencyCounter, NaiveBayesTrainer, ProbabilityTables, TableError, TrainError,
    TrainReport, error_rate,
};

/// Errors raised by [`BayesModel`].
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// An operation that needs training data ran before any was loaded.
    #[error("no training data loaded")]
    NotLoaded,

    /// An operation that needs fitted tables ran before training or import.
    #[error("model has not been trained")]
    NotTrained,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Train(#[from] TrainError),

    #[error(transparent)]
    Predict(#[from] PredictError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Lifecycle of a [`BayesModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelState {
    /// No data and no tables.
    #[default]
    Unconfigured,
    /// Records loaded, tables not fit.
    DataLoaded,
    /// Cross-validation in progress.
    Training,
    /// Tables fit by training or imported from a model document.
    Trained,
}

/// Naive Bayes flight outcome model.
#[derive(Debug, Clone)]
pub struct BayesModel {
    reference: ReferenceTables,
    meta: KeyMeta,
    dataset: Dataset,
    counter: FrequencyCounter,
    tables: ProbabilityTables,
    rng_seed: Option<u64>,
    last_report: Option<TrainReport>,
    state: ModelState,
}

impl Default for BayesModel {
    fn default() -> Self {
        Self::new(ReferenceTables::builtin())
    }
}

impl BayesModel {
    /// Create an unconfigured model over the given reference tables.
    pub fn new(reference: ReferenceTables) -> Self {
        let meta = reference.key_meta();
        Self {
            reference,
            meta,
            dataset: Dataset::new(),
            counter: FrequencyCounter::new(),
            tables: ProbabilityTables::new(),
            rng_seed: None,
            last_report: None,
            state: ModelState::Unconfigured,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub fn reference(&self) -> &ReferenceTables {
        &self.reference
    }

    pub fn meta(&self) -> &KeyMeta {
        &self.meta
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Frequencies of the last fit. Not populated for imported models.
    pub fn counter(&self) -> &FrequencyCounter {
        &self.counter
    }

    pub fn tables(&self) -> &ProbabilityTables {
        &self.tables
    }

    /// Seed of the shuffle behind the current tables.
    pub fn rng_seed(&self) -> Option<u64> {
        self.rng_seed
    }

    pub fn last_report(&self) -> Option<&TrainReport> {
        self.last_report.as_ref()
    }

    pub fn is_trained(&self) -> bool {
        self.state == ModelState::Trained
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Load records from a `.json` or `.csv` file. Returns the record count.
    ///
    /// Any previously fit tables are discarded.
    pub fn load_data(&mut self, path: impl AsRef<Path>) -> Result<usize, ModelError> {
        let path = path.as_ref();
        let reference = &self.reference;
        let records = load_records(path, reference.temperature(), reference.wind_speed())?;
        let n = records.len();
        self.set_records(records);
        tracing::info!(path = %path.display(), n_records = n, "loaded training data");
        Ok(n)
    }

    /// Use `records` as training data and derive the seen airport and carrier sets.
    pub fn set_records(&mut self, records: Vec<FlightRecord>) {
        derive_seen_sets(&mut self.meta, &records);
        self.dataset.set_data(records);
        self.counter = FrequencyCounter::new();
        self.tables = ProbabilityTables::new();
        self.rng_seed = None;
        self.last_report = None;
        self.state = ModelState::DataLoaded;
    }

    // =========================================================================
    // Training
    // =========================================================================

    /// Run the cross-validated search and refit on all data.
    ///
    /// The seen airport and carrier sets are re-derived from the loaded
    /// records, replacing any imported ones. On failure the model returns to
    /// [`ModelState::DataLoaded`].
    pub fn train(&mut self, config: &TrainConfig) -> Result<&TrainReport, ModelError> {
        let records = self.dataset.records().map_err(|_| ModelError::NotLoaded)?;
        derive_seen_sets(&mut self.meta, records);

        self.state = ModelState::Training;
        let trainer = NaiveBayesTrainer::new(config.to_trainer_params());
        let output = match trainer.train(&self.meta, &mut self.dataset) {
            Ok(output) => output,
            Err(e) => {
                self.state = ModelState::DataLoaded;
                self.tables = ProbabilityTables::new();
                return Err(e.into());
            }
        };

        self.counter = output.counter;
        self.tables = output.tables;
        self.rng_seed = Some(output.report.seed);
        self.state = ModelState::Trained;
        Ok(self.last_report.insert(output.report))
    }

    /// Train with explicit parameters. Returns `(best_k, accuracy_percent)`.
    pub fn train_model(
        &mut self,
        partition_count: usize,
        k_step_fraction: f64,
        max_k_fraction: f64,
        seed: Option<u64>,
    ) -> Result<(u64, f64), ModelError> {
        let config = TrainConfig::builder()
            .partition_count(partition_count)
            .k_step_fraction(k_step_fraction)
            .max_k_fraction(max_k_fraction)
            .maybe_seed(seed)
            .build()?;
        let report = self.train(&config)?;
        Ok((report.best_k, report.accuracy))
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    fn predictor(&self) -> Result<Predictor<'_>, ModelError> {
        if self.state != ModelState::Trained {
            return Err(ModelError::NotTrained);
        }
        Ok(Predictor::new(&self.meta, &self.tables)?)
    }

    /// Most probable outcome and its posterior probability.
    pub fn make_prediction(&self, query: &FlightQuery) -> Result<Prediction, ModelError> {
        Ok(self.predictor()?.predict(query)?)
    }

    /// Full posterior over the outcome universe.
    pub fn posterior(&self, query: &FlightQuery) -> Result<Posterior<'_>, ModelError> {
        Ok(self.predictor()?.posterior(query)?)
    }

    /// Error rate of the current tables on `range` of the loaded records.
    pub fn test(&self, range: Range<usize>) -> Result<f64, ModelError> {
        let predictor = self.predictor()?;
        let records = self.dataset.records().map_err(|_| ModelError::NotLoaded)?;
        Ok(error_rate(&predictor, records, range)?)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Snapshot of the trained model.
    pub fn export_parameters(&self) -> Result<ModelSchema, ModelError> {
        if self.state != ModelState::Trained {
            return Err(ModelError::NotTrained);
        }
        let seen_airports = self
            .meta
            .seen_airports()
            .map_err(|_| ModelError::NotTrained)?
            .iter()
            .cloned()
            .collect();
        let seen_carriers = self
            .meta
            .seen_carriers()
            .map_err(|_| ModelError::NotTrained)?
            .iter()
            .cloned()
            .collect();
        Ok(ModelSchema {
            training_rng_seed: self.rng_seed.unwrap_or_default(),
            seen_airports,
            seen_carriers,
            smoothing_k: self.tables.get_k(),
            p_tables: self.tables.export_p_tables()?,
        })
    }

    /// Replace the tables and seen sets with those of a model document.
    ///
    /// The document is validated first; on error the model is unchanged.
    pub fn import_parameters(&mut self, schema: ModelSchema) -> Result<(), ModelError> {
        schema.validate()?;
        let ModelSchema {
            training_rng_seed,
            seen_airports,
            seen_carriers,
            smoothing_k,
            p_tables,
        } = schema;
        let tables = p_tables.into_tables(smoothing_k)?;

        tracing::info!(
            seed = training_rng_seed,
            n_airports = seen_airports.len(),
            n_carriers = seen_carriers.len(),
            "imported model parameters"
        );
        self.meta.set_seen_airports(seen_airports);
        self.meta.set_seen_carriers(seen_carriers);
        self.tables = tables;
        self.counter = FrequencyCounter::new();
        self.rng_seed = Some(training_rng_seed);
        self.last_report = None;
        self.state = ModelState::Trained;
        Ok(())
    }

    /// Write the trained model as pretty-printed JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let schema = self.export_parameters()?;
        persist::write_path(&schema, path, true)?;
        Ok(())
    }

    /// Read a model document and import it.
    pub fn load_json(&mut self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let schema = persist::read_path(path)?;
        self.import_parameters(schema)
    }
}

/// Replace the seen airport and carrier sets with those occurring in `records`.
fn derive_seen_sets(meta: &mut KeyMeta, records: &[FlightRecord]) {
    let airports: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| [r.origin.as_str(), r.dest.as_str()])
        .collect();
    let carriers: BTreeSet<&str> = records.iter().map(|r| r.carrier.as_str()).collect();
    tracing::debug!(
        n_airports = airports.len(),
        n_carriers = carriers.len(),
        "derived seen vocabularies"
    );
    meta.set_seen_airports(airports);
    meta.set_seen_carriers(carriers);
}
