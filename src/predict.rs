use crate::error::EngineError;
use crate::flight::{AirportId, FlightId, FlightRecord};
use crate::store::FlightStore;
use std::sync::Arc;

/// Inputs the regression capability was trained on. The optimizer varies only
/// the hour; weekday and month stay fixed to the flight's original date.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub origin: AirportId,
    pub destination: AirportId,
    pub hour: u32,
    pub weekday: u32,
    pub month: u32,
}

/// Black-box delay regression capability. Implementations take a feature
/// vector and return a predicted delay in minutes, unrounded.
pub trait DelayModel: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> f64;
}

/// Bundled capability: per-hour mean of historical delays. Training clips
/// negative delays to zero; that clipping belongs to this path only, the
/// analytics path keeps delays signed.
pub struct HourlyMeanModel {
    mean_by_hour: [f64; 24],
}

impl HourlyMeanModel {
    pub fn fit(records: &[FlightRecord]) -> HourlyMeanModel {
        let mut sum = [0.0f64; 24];
        let mut count = [0usize; 24];
        for rec in records {
            let clipped = rec.delay_min.max(0.0);
            sum[rec.hour as usize] += clipped;
            count[rec.hour as usize] += 1;
        }
        let total: f64 = sum.iter().sum();
        let n: usize = count.iter().sum();
        let overall = if n > 0 { total / n as f64 } else { 0.0 };

        let mut mean_by_hour = [overall; 24];
        for h in 0..24 {
            if count[h] > 0 {
                mean_by_hour[h] = sum[h] / count[h] as f64;
            }
        }
        HourlyMeanModel { mean_by_hour }
    }
}

impl DelayModel for HourlyMeanModel {
    fn predict(&self, features: &FeatureVector) -> f64 {
        self.mean_by_hour[features.hour.min(23) as usize]
    }
}

/// Boundary adapter between flight ids and the regression capability. The
/// model is an explicit handle; a predictor without one reports every
/// prediction as `ModelUnavailable` rather than guessing.
pub struct Predictor {
    store: Arc<FlightStore>,
    model: Option<Arc<dyn DelayModel>>,
}

impl Predictor {
    pub fn new(store: Arc<FlightStore>, model: Arc<dyn DelayModel>) -> Predictor {
        Predictor {
            store,
            model: Some(model),
        }
    }

    pub fn uninitialized(store: Arc<FlightStore>) -> Predictor {
        Predictor { store, model: None }
    }

    pub fn store(&self) -> &FlightStore {
        &self.store
    }

    pub fn resolve(&self, flight_id: &FlightId) -> Result<&FlightRecord, EngineError> {
        self.store
            .find(flight_id)
            .ok_or_else(|| EngineError::NotFound(flight_id.clone()))
    }

    /// Predicted delay for the flight if it departed at `hour` on its original
    /// day. Hour is validated before the model is ever invoked.
    pub fn predict_for_hour(&self, flight_id: &FlightId, hour: u32) -> Result<f64, EngineError> {
        if hour > 23 {
            return Err(EngineError::InvalidHour(hour));
        }
        let model = self.model.as_ref().ok_or(EngineError::ModelUnavailable)?;
        let record = self.resolve(flight_id)?;
        let features = FeatureVector {
            origin: record.origin.clone(),
            destination: record.destination.clone(),
            hour,
            weekday: record.weekday,
            month: record.month,
        };
        Ok(model.predict(&features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::RawFlightRow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> Arc<FlightStore> {
        let rows = vec![
            RawFlightRow {
                flight: Arc::from("AI101"),
                tail_id: Arc::from("VT-A1"),
                origin: Arc::from("BOM"),
                destination: Arc::from("DEL"),
                sched_time_local: "2024-03-04 06:00:00".to_string(),
                actual_time_local: "2024-03-04 06:20:00".to_string(),
            },
            RawFlightRow {
                flight: Arc::from("AI102"),
                tail_id: Arc::from("VT-A1"),
                origin: Arc::from("DEL"),
                destination: Arc::from("BOM"),
                sched_time_local: "2024-03-04 09:00:00".to_string(),
                actual_time_local: "2024-03-04 08:50:00".to_string(),
            },
        ];
        Arc::new(FlightStore::from_rows(rows).unwrap())
    }

    struct SpyModel {
        calls: AtomicUsize,
    }

    impl DelayModel for SpyModel {
        fn predict(&self, _features: &FeatureVector) -> f64 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            7.5
        }
    }

    #[test]
    fn test_invalid_hour_never_reaches_the_model() {
        let spy = Arc::new(SpyModel {
            calls: AtomicUsize::new(0),
        });
        let predictor = Predictor::new(store(), spy.clone());
        let err = predictor
            .predict_for_hour(&Arc::from("AI101"), 25)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidHour(25)));
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_model_is_reported_distinctly() {
        let predictor = Predictor::uninitialized(store());
        let err = predictor
            .predict_for_hour(&Arc::from("AI101"), 10)
            .unwrap_err();
        assert!(matches!(err, EngineError::ModelUnavailable));
    }

    #[test]
    fn test_unknown_flight_is_not_found() {
        let predictor = Predictor::new(
            store(),
            Arc::new(SpyModel {
                calls: AtomicUsize::new(0),
            }),
        );
        let err = predictor
            .predict_for_hour(&Arc::from("ZZ999"), 10)
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(id) if id == Arc::from("ZZ999")));
    }

    #[test]
    fn test_candidate_hour_with_original_calendar_features() {
        struct Capture;
        impl DelayModel for Capture {
            fn predict(&self, features: &FeatureVector) -> f64 {
                assert_eq!(features.hour, 22);
                assert_eq!(features.weekday, 0); // AI101 flies on a Monday
                assert_eq!(features.month, 3);
                assert_eq!(features.origin, Arc::from("BOM"));
                1.0
            }
        }
        let predictor = Predictor::new(store(), Arc::new(Capture));
        assert_eq!(
            predictor.predict_for_hour(&Arc::from("AI101"), 22).unwrap(),
            1.0
        );
    }

    #[test]
    fn test_hourly_mean_model_clips_training_delays() {
        let store = store();
        let model = HourlyMeanModel::fit(store.records());
        // hour 9 holds a single early flight: clipped to 0 for training
        let predictor = Predictor::new(store, Arc::new(model));
        assert_eq!(
            predictor.predict_for_hour(&Arc::from("AI101"), 9).unwrap(),
            0.0
        );
        assert_eq!(
            predictor.predict_for_hour(&Arc::from("AI101"), 6).unwrap(),
            20.0
        );
    }
}
