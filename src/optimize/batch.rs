use crate::flight::FlightId;
use crate::optimize::single::{OptimizationResult, Optimizer};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_COST_PER_MIN: f64 = 100.0;

/// Aggregate over one system-wide pass. The only durable artifact of the
/// engine between runs; see `report` for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSummary {
    pub flights_optimized: usize,
    pub total_delay_before: f64,
    pub total_delay_after: f64,
    pub total_minutes_saved: f64,
    pub mean_improvement_pct: f64,
    pub cost_before: f64,
    pub cost_after: f64,
    pub cost_saved: f64,
}

pub struct BatchOutcome {
    pub results: Vec<OptimizationResult>,
    pub summary: OptimizationSummary,
}

pub struct BatchOptimizer {
    optimizer: Optimizer,
    cost_per_min: f64,
}

impl BatchOptimizer {
    pub fn new(optimizer: Optimizer, cost_per_min: f64) -> BatchOptimizer {
        BatchOptimizer {
            optimizer,
            cost_per_min,
        }
    }

    /// Optimizes every sampled flight independently. Each search reads only
    /// immutable shared inputs, so the per-flight work fans out across the
    /// rayon pool; aggregation runs once after all workers join. A failing
    /// flight is logged and dropped, never aborting the batch.
    pub fn run(&self, flight_ids: &[FlightId]) -> BatchOutcome {
        let results: Vec<OptimizationResult> = flight_ids
            .par_iter()
            .filter_map(|id| match self.optimizer.optimize(id) {
                Ok(result) => Some(result),
                Err(err) => {
                    warn!(flight = %id, %err, "dropping flight from batch");
                    None
                }
            })
            .collect();

        info!(
            sampled = flight_ids.len(),
            optimized = results.len(),
            "system-wide pass complete"
        );

        let summary = aggregate(&results, self.cost_per_min);
        BatchOutcome { results, summary }
    }
}

fn aggregate(results: &[OptimizationResult], cost_per_min: f64) -> OptimizationSummary {
    let total_before: f64 = results.iter().map(|r| r.original_delay).sum();
    let total_after: f64 = results.iter().map(|r| r.best_delay).sum();

    let mean_improvement_pct = if results.is_empty() {
        0.0
    } else {
        let pct_sum: f64 = results
            .iter()
            .map(|r| {
                let denom = if r.original_delay == 0.0 {
                    1.0
                } else {
                    r.original_delay
                };
                let pct = r.improvement() / denom * 100.0;
                if pct.is_finite() { pct } else { 0.0 }
            })
            .sum();
        pct_sum / results.len() as f64
    };

    OptimizationSummary {
        flights_optimized: results.len(),
        total_delay_before: total_before,
        total_delay_after: total_after,
        total_minutes_saved: total_before - total_after,
        mean_improvement_pct,
        cost_before: total_before * cost_per_min,
        cost_after: total_after * cost_per_min,
        cost_saved: (total_before - total_after) * cost_per_min,
    }
}
