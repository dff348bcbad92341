use crate::flight::RawFlightRow;
use crate::predict::{DelayModel, FeatureVector, Predictor};
use crate::store::FlightStore;
use std::sync::Arc;

pub fn id(s: &str) -> Arc<str> {
    Arc::from(s)
}

pub fn raw_row(flight: &str, tail: &str, sched: &str, delay_min: i64) -> RawFlightRow {
    let sched_time = crate::flight::parse_timestamp(sched).unwrap();
    let actual_time = sched_time + chrono::Duration::minutes(delay_min);
    RawFlightRow {
        flight: id(flight),
        tail_id: id(tail),
        origin: id("BOM"),
        destination: id("DEL"),
        sched_time_local: sched.to_string(),
        actual_time_local: actual_time.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

pub fn store(rows: Vec<RawFlightRow>) -> Arc<FlightStore> {
    Arc::new(FlightStore::from_rows(rows).unwrap())
}

/// Fixed per-hour delay table; hours not listed fall back to `default`.
pub struct TableModel {
    pub by_hour: Vec<(u32, f64)>,
    pub default: f64,
}

impl DelayModel for TableModel {
    fn predict(&self, features: &FeatureVector) -> f64 {
        self.by_hour
            .iter()
            .find(|(h, _)| *h == features.hour)
            .map(|(_, d)| *d)
            .unwrap_or(self.default)
    }
}

pub fn predictor(store: Arc<FlightStore>, by_hour: &[(u32, f64)], default: f64) -> Arc<Predictor> {
    Arc::new(Predictor::new(
        store,
        Arc::new(TableModel {
            by_hour: by_hour.to_vec(),
            default,
        }),
    ))
}
