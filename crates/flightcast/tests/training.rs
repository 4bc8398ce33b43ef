//! End-to-end training tests.

use approx::assert_abs_diff_eq;
use rstest::rstest;

use flightcast::data::{Dataset, Outcome};
use flightcast::model::{BayesModel, ModelState, ReferenceTables, TrainConfig};
use flightcast::testing::{fixture_dataset, fixture_key_meta, synthetic_records};
use flightcast::training::{
    FrequencyCounter, NaiveBayesTrainer, ProbabilityTables, accuracy_percent, partition_starts,
    shuffle_and_partition,
};

fn train(n: usize, seed: u64) -> BayesModel {
    let mut model = BayesModel::default();
    model.set_records(synthetic_records(n, 5));
    let config = TrainConfig::builder()
        .partition_count(3)
        .k_step_fraction(0.02)
        .max_k_fraction(0.1)
        .seed(seed)
        .build()
        .unwrap();
    model.train(&config).unwrap();
    model
}

#[test]
fn same_seed_same_model() {
    let a = train(150, 1);
    let b = train(150, 1);
    assert_eq!(
        a.last_report().unwrap().best_k,
        b.last_report().unwrap().best_k
    );
    assert_eq!(
        a.export_parameters().unwrap(),
        b.export_parameters().unwrap()
    );
    assert_eq!(
        a.dataset().records().unwrap(),
        b.dataset().records().unwrap()
    );
}

#[test]
fn fifty_records_three_partitions() {
    assert_eq!(partition_starts(50, 3), [0, 16, 33]);

    let mut ds = Dataset::new();
    ds.set_data(synthetic_records(50, 9));
    let starts = shuffle_and_partition(&mut ds, 1, 3).unwrap();
    assert_eq!(starts, [0, 16, 33]);
}

#[test]
fn report_covers_every_test_partition() {
    let model = train(150, 4);
    let report = model.last_report().unwrap();

    assert_eq!(report.seed, 4);
    assert_eq!(report.partition_starts, [0, 50, 100]);
    // k_step = floor(150 * 0.02) = 3, max_k = floor(150 * 0.1) = 15
    assert_eq!(report.k_values, [0, 3, 6, 9, 12]);
    assert_eq!(report.folds.len(), 3);
    for (i, fold) in report.folds.iter().enumerate() {
        assert_eq!(fold.test_partition, i);
        assert!(report.k_values.contains(&fold.best_k));
        assert!((0.0..=1.0).contains(&fold.test_error));
        assert!((0.0..=1.0).contains(&fold.mean_validation_error));
    }

    let best = report
        .folds
        .iter()
        .map(|f| f.test_error)
        .fold(f64::INFINITY, f64::min);
    assert_abs_diff_eq!(report.best_error, best);
    assert_abs_diff_eq!(report.accuracy, accuracy_percent(best));
}

#[test]
fn final_fit_uses_all_records() {
    let model = train(150, 2);
    assert_eq!(model.state(), ModelState::Trained);
    assert_eq!(model.dataset().test_bounds(), None);
    assert_eq!(model.dataset().validation_bounds(), None);
    assert_eq!(model.counter().n_counted(), 150);
    let total: u64 = model.counter().status_counter().unwrap().values().sum();
    assert_eq!(total, 150);
}

#[test]
fn trainer_without_model() {
    let mut meta = ReferenceTables::builtin().key_meta();
    let records = synthetic_records(90, 8);
    let airports = records
        .iter()
        .flat_map(|r| [r.origin.clone(), r.dest.clone()]);
    meta.set_seen_airports(airports);

    meta.set_seen_carriers(records.iter().map(|r| r.carrier.clone()));

    let mut ds = Dataset::new();
    ds.set_data(records);
    let config = TrainConfig::builder()
        .partition_count(3)
        .k_step_fraction(0.05)
        .max_k_fraction(0.2)
        .seed(11)
        .build()
        .unwrap();
    let output = NaiveBayesTrainer::new(config.to_trainer_params())
        .train(&meta, &mut ds)
        .unwrap();
    assert!(output.tables.is_fit());
    assert_eq!(output.tables.get_k(), Some(output.report.best_k as f64));
}

#[rstest]
#[case(0.0, [0.2, 0.4, 0.2, 0.2])]
#[case(1.0, [2.0 / 9.0, 3.0 / 9.0, 2.0 / 9.0, 2.0 / 9.0])]
fn fixture_marginals(#[case] k: f64, #[case] expected: [f64; 4]) {
    let ds = fixture_dataset();
    let mut counter = FrequencyCounter::new();
    counter.reset_counters(&fixture_key_meta()).unwrap();
    counter.count_frequencies(&ds).unwrap();
    let mut tables = ProbabilityTables::new();
    tables.reset_tables(&counter).unwrap();
    tables.fit(&ds, &counter, k).unwrap();

    let outcomes = [
        Outcome::Divert,
        Outcome::cancel("1"),
        Outcome::delay(1),
        Outcome::delay(2),
    ];
    for (outcome, p) in outcomes.iter().zip(expected) {
        assert_abs_diff_eq!(tables.query_p_status(outcome).unwrap(), p, epsilon = 1e-12);
    }
}

#[test]
fn holdout_excluded_from_counts() {
    let mut ds = fixture_dataset();
    ds.set_test_bounds(0, 2).unwrap();
    ds.set_validation_bounds(1, 3).unwrap();

    let mut counter = FrequencyCounter::new();
    counter.reset_counters(&fixture_key_meta()).unwrap();
    counter.count_frequencies(&ds).unwrap();
    let total: u64 = counter.status_counter().unwrap().values().sum();
    assert_eq!(total as usize, ds.training_len().unwrap());
    assert_eq!(total, 2);
}
