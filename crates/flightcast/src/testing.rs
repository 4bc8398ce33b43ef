//! Shared fixtures for unit and integration tests.
//!
//! - [`fixture_records`]: five hand-written records with outcome counts
//!   `divert: 1, cancel:1: 2, delay:1: 1, delay:2: 1`
//! - [`fixture_key_meta`]: the matching vocabulary
//! - [`synthetic_records`]: a seeded generator over the built-in reference tables

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::{Dataset, FlightRecord, Outcome};
use crate::model::{KeyMeta, ReferenceTables};

/// Default tolerance for probability comparisons.
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

/// `fields` holds origin, dest, carrier, departure key, then the source and
/// destination temperature and wind keys, separated by whitespace.
fn record(fields: &str, day: u8, outcome: Outcome) -> FlightRecord {
    let f: Vec<&str> = fields.split_whitespace().collect();
    assert_eq!(f.len(), 8, "fixture row needs 8 fields: {fields}");
    let (cancelled, cancellation_code, diverted, arrival_delay_group) = match outcome {
        Outcome::Cancel(code) => (true, code, false, None),
        Outcome::Divert => (false, String::new(), true, None),
        Outcome::Delay(group) => (false, String::new(), false, Some(group)),
    };
    FlightRecord {
        origin: f[0].into(),
        dest: f[1].into(),
        carrier: f[2].into(),
        day_of_week: day,
        departure_time: f[3].into(),
        src_temperature: f[4].into(),
        dst_temperature: f[5].into(),
        src_wind_speed: f[6].into(),
        dst_wind_speed: f[7].into(),
        cancelled,
        cancellation_code,
        diverted,
        arrival_delay_group,
    }
}

/// Five records over airports `a1`/`a2`, carriers `c1`/`c2` and weather keys `1`/`2`.
pub fn fixture_records() -> Vec<FlightRecord> {
    vec![
        record("a1 a2 c1 0800 1 2 1 1", 1, Outcome::Divert),
        record("a1 a2 c1 0800 1 1 1 2", 1, Outcome::cancel("1")),
        record("a2 a1 c2 1430 2 1 2 2", 2, Outcome::cancel("1")),
        record("a2 a1 c1 0800 2 2 1 1", 3, Outcome::delay(1)),
        record("a1 a2 c2 1430 1 2 2 1", 1, Outcome::delay(2)),
    ]
}

/// Dataset loaded with [`fixture_records`].
pub fn fixture_dataset() -> Dataset {
    let mut ds = Dataset::new();
    ds.set_data(fixture_records());
    ds
}

/// Vocabulary matching [`fixture_records`].
pub fn fixture_key_meta() -> KeyMeta {
    let statuses: BTreeMap<Outcome, String> = [
        (Outcome::Divert, "Diverted"),
        (Outcome::cancel("1"), "Cancelled (1)"),
        (Outcome::delay(1), "Delay group 1"),
        (Outcome::delay(2), "Delay group 2"),
    ]
    .into_iter()
    .map(|(o, d)| (o, d.to_string()))
    .collect();

    let mut meta = KeyMeta::new();
    meta.set_arrival_statuses(statuses);
    meta.set_seen_airports(["a1", "a2"]);
    meta.set_seen_carriers(["c1", "c2"]);
    meta.set_temp_keys(["1", "2"]);
    meta.set_wind_keys(["1", "2"]);
    meta
}

/// Seeded synthetic records valid under [`ReferenceTables::builtin`].
///
/// Outcomes are correlated with carrier and wind so a trained model does
/// better than chance.
pub fn synthetic_records(n: usize, seed: u64) -> Vec<FlightRecord> {
    const AIRPORTS: [&str; 4] = ["10135", "10136", "10140", "10141"];
    const CARRIERS: [&str; 3] = ["9E", "AA", "DL"];

    let tables = ReferenceTables::builtin();
    let dep_times = crate::data::discretize::departure_time_keys();
    let temp_keys = tables.temperature().keys();
    let wind_keys = tables.wind_speed().keys();

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let origin = AIRPORTS[rng.gen_range(0..AIRPORTS.len())];
            let mut dest = AIRPORTS[rng.gen_range(0..AIRPORTS.len())];
            if dest == origin {
                let i = AIRPORTS.iter().position(|a| *a == origin).unwrap_or(0);
                dest = AIRPORTS[(i + 1) % AIRPORTS.len()];

            }
            let c = rng.gen_range(0..CARRIERS.len());
            let wind = rng.gen_range(0..wind_keys.len());
            let outcome = match (c, wind, rng.gen_range(0..10)) {
                (_, w, 0) if w >= 3 => Outcome::cancel("B"),
                (_, _, 1) => Outcome::Divert,
                (0, _, r) if r < 8 => Outcome::delay(0),
                (1, _, r) if r < 7 => Outcome::delay(-1),
                (2, w, _) if w >= 2 => Outcome::delay(3),
                _ => Outcome::delay(rng.gen_range(-2..=12)),
            };
            let carrier = CARRIERS[c];
            let day = rng.gen_range(1..=7);
            let dep = &dep_times[rng.gen_range(0..dep_times.len())];
            let st = &temp_keys[rng.gen_range(0..temp_keys.len())];
            let dt = &temp_keys[rng.gen_range(0..temp_keys.len())];
            let sw = &wind_keys[wind];
            let dw = &wind_keys[rng.gen_range(0..wind_keys.len())];
            record(
                &format!("{origin} {dest} {carrier} {dep} {st} {dt} {sw} {dw}"),
                day,
                outcome,
            )
        })
        .collect()
}
