//! Conversion between runtime tables and schema types.

use std::collections::{BTreeMap, BTreeSet};

use super::error::ReadError;
use super::schema::{ConditionalTableSchema, ModelSchema, PTablesSchema, StatusTableSchema};
use crate::data::Outcome;
use crate::training::{ConditionalTable, Feature, ProbabilityTables, TableError};

// =============================================================================
// Table name mapping
// =============================================================================

impl PTablesSchema {
    /// Conditional table for a feature family.
    pub fn conditional(&self, feature: Feature) -> &ConditionalTableSchema {
        match feature {
            Feature::Day => &self.day,
            Feature::Airline => &self.airline,
            Feature::SrcAirport => &self.src_airport,
            Feature::DstAirport => &self.dst_airport,
            Feature::DepartureTime => &self.departure_time,
            Feature::SrcTemperature => &self.src_temperature,
            Feature::DstTemperature => &self.dst_temperature,
            Feature::SrcWindSpeed => &self.src_wind_speed,
            Feature::DstWindSpeed => &self.dst_wind_speed,
        }
    }

    fn from_conditionals(
        arrival_status: StatusTableSchema,
        conditionals: [ConditionalTableSchema; Feature::COUNT],
    ) -> Self {
        let [
            day,
            airline,
            src_airport,
            dst_airport,
            departure_time,
            src_temperature,
            dst_temperature,
            src_wind_speed,
            dst_wind_speed,
        ] = conditionals;
        Self {
            arrival_status,
            day,
            airline,
            src_airport,
            dst_airport,
            departure_time,
            src_temperature,
            dst_temperature,
            src_wind_speed,
            dst_wind_speed,
        }
    }

    fn into_conditionals(self) -> (StatusTableSchema, [ConditionalTableSchema; Feature::COUNT]) {
        (
            self.arrival_status,
            [
                self.day,
                self.airline,
                self.src_airport,
                self.dst_airport,
                self.departure_time,
                self.src_temperature,
                self.dst_temperature,
                self.src_wind_speed,
                self.dst_wind_speed,
            ],
        )
    }
}

// =============================================================================
// ProbabilityTables <-> PTablesSchema
// =============================================================================

fn status_to_schema(status: BTreeMap<Outcome, f64>) -> StatusTableSchema {
    status
        .into_iter()
        .map(|(o, p)| (o.to_string(), p))
        .collect()
}

fn conditional_to_schema(table: ConditionalTable) -> ConditionalTableSchema {
    table
        .into_iter()
        .map(|(value, row)| (value, status_to_schema(row)))
        .collect()
}

fn status_from_schema(status: StatusTableSchema) -> Result<BTreeMap<Outcome, f64>, ReadError> {
    status
        .into_iter()
        .map(|(o, p)| Ok((o.parse::<Outcome>()?, p)))
        .collect()
}

fn conditional_from_schema(table: ConditionalTableSchema) -> Result<ConditionalTable, ReadError> {
    table
        .into_iter()
        .map(|(value, row)| Ok((value, status_from_schema(row)?)))
        .collect()
}

impl TryFrom<&ProbabilityTables> for PTablesSchema {
    type Error = TableError;

    fn try_from(tables: &ProbabilityTables) -> Result<Self, Self::Error> {
        let status = status_to_schema(tables.p_status()?);
        let mut conditionals: [ConditionalTableSchema; Feature::COUNT] = Default::default();
        for feature in Feature::ALL {
            conditionals[feature.index()] = conditional_to_schema(tables.p_table(feature)?);
        }
        Ok(Self::from_conditionals(status, conditionals))
    }
}

impl PTablesSchema {
    /// Rebuild fitted tables, recording `k` as the smoothing coefficient.
    pub fn into_tables(self, k: Option<f64>) -> Result<ProbabilityTables, ReadError> {
        let (status, conditionals) = self.into_conditionals();
        let status = status_from_schema(status)?;
        let mut parsed: [ConditionalTable; Feature::COUNT] = Default::default();
        for (slot, table) in parsed.iter_mut().zip(conditionals) {
            *slot = conditional_from_schema(table)?;
        }
        Ok(ProbabilityTables::from_parts(status, parsed, k)?)
    }
}

impl ProbabilityTables {
    /// Flat nested-map form of the ten tables.
    pub fn export_p_tables(&self) -> Result<PTablesSchema, TableError> {
        PTablesSchema::try_from(self)
    }

    /// Replace every table with the imported ones.
    pub fn import_p_tables(&mut self, schema: PTablesSchema) -> Result<(), ReadError> {
        *self = schema.into_tables(self.get_k())?;
        Ok(())
    }
}

// =============================================================================
// Model validation
// =============================================================================

impl ModelSchema {
    /// Check that the vocabulary tables agree with the seen sets.
    pub fn validate(&self) -> Result<(), ReadError> {
        let airports: BTreeSet<&str> = self.seen_airports.iter().map(String::as_str).collect();
        let carriers: BTreeSet<&str> = self.seen_carriers.iter().map(String::as_str).collect();

        let checks = [
            (Feature::SrcAirport, &airports, "seen_airports"),
            (Feature::DstAirport, &airports, "seen_airports"),
            (Feature::Airline, &carriers, "seen_carriers"),
        ];
        for (feature, seen, field) in checks {
            let keys: BTreeSet<&str> = self
                .p_tables
                .conditional(feature)
                .keys()
                .map(String::as_str)
                .collect();
            if &keys != seen {
                return Err(ReadError::Validation(format!(
                    "{} table keys do not match {field}",
                    feature.name()
                )));
            }
        }

        if let Some(k) = self.smoothing_k {
            if !k.is_finite() || k < 0.0 {
                return Err(ReadError::Validation(format!(
                    "smoothing_k must be finite and non-negative, got {k}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture_dataset, fixture_key_meta};
    use crate::training::FrequencyCounter;

    fn fitted() -> ProbabilityTables {
        let ds = fixture_dataset();
        let mut counter = FrequencyCounter::new();
        counter.reset_counters(&fixture_key_meta()).unwrap();
        counter.count_frequencies(&ds).unwrap();
        let mut tables = ProbabilityTables::new();
        tables.reset_tables(&counter).unwrap();
        tables.fit(&ds, &counter, 2.0).unwrap();
        tables
    }

    #[test]
    fn export_uses_key_form() {
        let schema = fitted().export_p_tables().unwrap();
        assert!(schema.arrival_status.contains_key("cancel:1"));
        assert!(schema.arrival_status.contains_key("delay:2"));
        assert!(schema.arrival_status.contains_key("divert"));
        assert_eq!(schema.day.len(), 7);
        assert_eq!(schema.departure_time.len(), 48);
        assert_eq!(schema.src_airport["a1"].len(), 4);
    }

    #[test]
    fn import_export_is_lossless() {
        let tables = fitted();
        let schema = tables.export_p_tables().unwrap();
        let mut imported = ProbabilityTables::new();
        imported.import_p_tables(schema.clone()).unwrap();
        assert!(imported.is_fit());
        assert_eq!(imported.export_p_tables().unwrap(), schema);
    }

    #[test]
    fn export_before_fit_fails() {
        assert_eq!(
            ProbabilityTables::new().export_p_tables(),
            Err(TableError::NotFit)
        );
    }

    #[test]
    fn malformed_outcome_key() {
        let mut schema = fitted().export_p_tables().unwrap();
        schema.arrival_status.insert("late".into(), 0.1);
        assert!(matches!(
            schema.into_tables(None),
            Err(ReadError::Outcome(_))
        ));

    }

    #[test]
    fn validation_catches_vocabulary_mismatch() {
        let p_tables = fitted().export_p_tables().unwrap();
        let mut model = ModelSchema {
            training_rng_seed: 1,
            seen_airports: vec!["a1".into(), "a2".into()],
            seen_carriers: vec!["c1".into(), "c2".into()],
            smoothing_k: Some(2.0),
            p_tables,
        };
        assert!(model.validate().is_ok());
        model.seen_carriers.pop();
        assert!(matches!(model.validate(), Err(ReadError::Validation(_))));
    }
}
