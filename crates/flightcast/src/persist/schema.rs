//! Schema types for model serialization.
//!
//! The persisted model is a single flat JSON object holding the training
//! seed, the seen airport and carrier vocabularies, and the ten probability
//! tables keyed by their table names. Outcome keys are stored in their
//! textual form (`cancel:<code>`, `delay:<group>`, `divert`).
//!
//! All schema types use `BTreeMap` for deterministic JSON output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `outcome -> probability`.
pub type StatusTableSchema = BTreeMap<String, f64>;

/// `value -> outcome -> probability`.
pub type ConditionalTableSchema = BTreeMap<String, BTreeMap<String, f64>>;

/// The ten probability tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PTablesSchema {
    pub arrival_status: StatusTableSchema,
    pub day: ConditionalTableSchema,
    pub airline: ConditionalTableSchema,
    pub src_airport: ConditionalTableSchema,
    pub dst_airport: ConditionalTableSchema,
    pub departure_time: ConditionalTableSchema,
    pub src_temperature: ConditionalTableSchema,
    pub dst_temperature: ConditionalTableSchema,
    pub src_wind_speed: ConditionalTableSchema,
    pub dst_wind_speed: ConditionalTableSchema,
}

/// A trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    /// Seed of the shuffle that produced this model.
    pub training_rng_seed: u64,
    pub seen_airports: Vec<String>,
    pub seen_carriers: Vec<String>,
    /// Smoothing coefficient of the final fit. Absent in older documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothing_k: Option<f64>,
    pub p_tables: PTablesSchema,
}
