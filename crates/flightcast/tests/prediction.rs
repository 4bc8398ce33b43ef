//! Prediction tests.

use approx::assert_abs_diff_eq;

use flightcast::data::Outcome;
use flightcast::forecast::{Forecast, ForecastError, StaticForecasts};
use flightcast::inference::{PredictError, Predictor};
use flightcast::model::{BayesModel, FlightQuery, ModelError, QueryError, ScheduledFlight};
use flightcast::testing::{fixture_dataset, fixture_key_meta, fixture_records, synthetic_records};
use flightcast::training::{Feature, FrequencyCounter, ProbabilityTables};

fn fixture_tables(k: f64) -> ProbabilityTables {
    let ds = fixture_dataset();
    let mut counter = FrequencyCounter::new();
    counter.reset_counters(&fixture_key_meta()).unwrap();
    counter.count_frequencies(&ds).unwrap();
    let mut tables = ProbabilityTables::new();
    tables.reset_tables(&counter).unwrap();
    tables.fit(&ds, &counter, k).unwrap();
    tables
}

fn trained() -> BayesModel {
    let mut model = BayesModel::default();
    model.set_records(synthetic_records(150, 21));
    model.train_model(3, 0.02, 0.1, Some(3)).unwrap();
    model
}

#[test]
fn posterior_sums_to_one() {
    let model = trained();
    for record in &model.dataset().records().unwrap()[..20] {
        let posterior = model.posterior(&FlightQuery::from(record)).unwrap();
        assert_eq!(posterior.len(), 20);
        let total: f64 = posterior.iter().map(|(_, p)| p).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-9);
    }
}

#[test]
fn unknown_airport_rejected_before_lookup() {
    let model = trained();
    let mut query = FlightQuery::from(&model.dataset().records().unwrap()[0]);
    query.dest = "12345".into();
    match model.make_prediction(&query).unwrap_err() {
        ModelError::Predict(PredictError::UnknownAirport { role, airport }) => {
            assert_eq!(role, "destination");
            assert_eq!(airport, "12345");
        }
        other => panic!("expected unknown airport, got {other:?}"),
    }
}

#[test]
fn unknown_carrier_rejected() {
    let model = trained();
    let mut query = FlightQuery::from(&model.dataset().records().unwrap()[0]);
    query.carrier = "ZZ".into();
    assert!(matches!(
        model.make_prediction(&query),
        Err(ModelError::Predict(PredictError::UnknownCarrier(_)))
    ));
}

#[test]
fn unsmoothed_cells_are_zero() {
    let tables = fixture_tables(0.0);
    // c2 never flew a diverted flight
    let divert = |airline: &str| tables.query_p(Feature::Airline, airline, &Outcome::Divert);
    assert_eq!(divert("c2"), Ok(0.0));
    assert_abs_diff_eq!(divert("c1").unwrap(), 1.0);
}

#[test]
fn all_zero_scores_pick_first_outcome() {
    let tables = fixture_tables(0.0);
    let meta = fixture_key_meta();
    let predictor = Predictor::new(&meta, &tables).unwrap();

    // No training record matches day 7, so every score is zero.
    let mut query = FlightQuery::from(&fixture_records()[0]);
    query.day_of_week = 7;
    let prediction = predictor.predict(&query).unwrap();
    assert_eq!(prediction.outcome, Outcome::cancel("1"));
    assert_eq!(prediction.probability, 0.0);
}

#[test]
fn smoothed_prediction_on_fixture() {
    let tables = fixture_tables(1.0);
    let meta = fixture_key_meta();
    let predictor = Predictor::new(&meta, &tables).unwrap();
    let posterior = predictor.posterior(&fixture_records()[1]).unwrap();
    let total: f64 = posterior.iter().map(|(_, p)| p).sum();
    assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
    assert!(posterior.iter().all(|(_, p)| p > 0.0));
}

#[test]
fn forecast_query_predicts() {
    let model = trained();
    let record = &model.dataset().records().unwrap()[0];
    let origin = Forecast {
        temperature: 55.0,
        wind_speed: 12.0,
    };
    let dest = Forecast {
        temperature: 61.0,
        wind_speed: 4.0,
    };
    let provider = StaticForecasts::new()
        .with(record.origin.clone(), origin)
        .with(record.dest.clone(), dest);
    let flight = ScheduledFlight {
        origin: record.origin.clone(),
        dest: record.dest.clone(),
        carrier: record.carrier.clone(),
        day_of_week: 3,
        departure_hhmm: "0915".into(),
        departure_timestamp: "2024-05-08T09:15:00Z".into(),
    };
    let query = FlightQuery::from_forecast(&provider, model.reference(), &flight).unwrap();
    assert_eq!(query.departure_time, "0900");
    let prediction = model.make_prediction(&query).unwrap();
    assert!((0.0..=1.0).contains(&prediction.probability));
}

#[test]
fn forecast_failure_surfaces() {
    let model = trained();
    let flight = ScheduledFlight {
        origin: "10135".into(),
        dest: "10136".into(),
        carrier: "AA".into(),
        day_of_week: 3,
        departure_hhmm: "0915".into(),
        departure_timestamp: "2024-05-08T09:15:00Z".into(),
    };
    let provider = StaticForecasts::new();
    let err = FlightQuery::from_forecast(&provider, model.reference(), &flight).unwrap_err();
    let unknown = ForecastError::UnknownAirport("10135".into());
    assert_eq!(err, QueryError::Forecast(unknown));

}
