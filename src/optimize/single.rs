use crate::error::EngineError;
use crate::flight::FlightId;
use crate::predict::Predictor;
use chrono::{Duration, NaiveDateTime, Timelike};
use serde::Serialize;
use std::sync::Arc;

/// Symmetric search window around the original scheduled time.
#[derive(Debug, Clone, Copy)]
pub struct SearchWindow {
    pub span_min: i64,
    pub step_min: i64,
}

impl Default for SearchWindow {
    fn default() -> Self {
        SearchWindow {
            span_min: 90,
            step_min: 15,
        }
    }
}

/// Outcome of one bounded local search. `recommended_time` is `None` when no
/// candidate beat the original slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub flight: FlightId,
    pub original_time: NaiveDateTime,
    pub recommended_time: Option<NaiveDateTime>,
    pub original_delay: f64,
    pub best_delay: f64,
}

impl OptimizationResult {
    pub fn improvement(&self) -> f64 {
        self.original_delay - self.best_delay
    }
}

pub struct Optimizer {
    predictor: Arc<Predictor>,
    window: SearchWindow,
}

impl Optimizer {
    pub fn new(predictor: Arc<Predictor>, window: SearchWindow) -> Optimizer {
        Optimizer { predictor, window }
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    /// Bounded local search over shifted departure slots. Only the candidate's
    /// hour reaches the model, so sub-hour shifts landing in the same hour
    /// repeat the same prediction; the predictor's resolution is hourly.
    /// First-seen minimum wins on ties. Predictor failures propagate unchanged.
    pub fn optimize(&self, flight_id: &FlightId) -> Result<OptimizationResult, EngineError> {
        let record = self.predictor.resolve(flight_id)?.clone();
        let original_delay = self.predictor.predict_for_hour(flight_id, record.hour)?;

        let mut best_delay = original_delay;
        let mut best_time = None;

        let step = self.window.step_min.max(1);
        let mut offset = -self.window.span_min;
        while offset <= self.window.span_min {
            if offset != 0 {
                let candidate = record.sched_time + Duration::minutes(offset);
                let delay = self.predictor.predict_for_hour(flight_id, candidate.hour())?;
                if delay < best_delay {
                    best_delay = delay;
                    best_time = Some(candidate);
                }
            }
            offset += step;
        }

        Ok(OptimizationResult {
            flight: flight_id.clone(),
            original_time: record.sched_time,
            recommended_time: best_time,
            original_delay,
            best_delay,
        })
    }
}
