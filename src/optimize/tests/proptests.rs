use crate::cascade::{CascadeConfig, detect_cascades};
use crate::flight::RawFlightRow;
use crate::optimize::batch::{BatchOptimizer, DEFAULT_COST_PER_MIN};
use crate::optimize::single::{Optimizer, SearchWindow};
use crate::optimize::tests::utils::raw_row;
use crate::predict::{HourlyMeanModel, Predictor};
use crate::store::FlightStore;
use proptest::prelude::*;
use std::sync::Arc;

fn arb_week() -> impl Strategy<Value = Vec<RawFlightRow>> {
    prop::collection::vec(
        (0u32..3, 0u32..7, 0u32..24, 0u32..60, -60i64..180),
        1..40,
    )
    .prop_map(|seeds| {
        seeds
            .into_iter()
            .enumerate()
            .map(|(i, (tail, day, hour, minute, delay))| {
                raw_row(
                    &format!("FL{:03}", i),
                    &format!("VT-A{}", tail),
                    &format!("2024-03-{:02} {:02}:{:02}:00", 4 + day, hour, minute),
                    delay,
                )
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn test_optimizer_never_worsens_a_flight(rows in arb_week()) {
        let store = Arc::new(FlightStore::from_rows(rows).unwrap());
        let model = Arc::new(HourlyMeanModel::fit(store.records()));
        let predictor = Arc::new(Predictor::new(store.clone(), model));
        let optimizer = Optimizer::new(predictor, SearchWindow::default());

        for flight_id in store.flight_ids() {
            let result = optimizer.optimize(&flight_id).unwrap();
            prop_assert!(result.best_delay <= result.original_delay);
            match result.recommended_time {
                None => prop_assert_eq!(result.best_delay, result.original_delay),
                Some(_) => prop_assert!(result.best_delay < result.original_delay),
            }
            prop_assert!(result.improvement() >= 0.0);
        }
    }

    #[test]
    fn test_cascade_output_invariants(rows in arb_week()) {
        let store = FlightStore::from_rows(rows).unwrap();
        let config = CascadeConfig::default();
        let events = detect_cascades(store.records(), &config);

        prop_assert!(events.len() <= config.top_n);
        for event in &events {
            prop_assert!(event.cascade_effect_min > config.threshold_min);
        }
        for pair in events.windows(2) {
            prop_assert!(pair[0].cascade_effect_min >= pair[1].cascade_effect_min);
        }
    }

    #[test]
    fn test_batch_totals_balance(rows in arb_week()) {
        let store = Arc::new(FlightStore::from_rows(rows).unwrap());
        let model = Arc::new(HourlyMeanModel::fit(store.records()));
        let predictor = Arc::new(Predictor::new(store.clone(), model));
        let batch = BatchOptimizer::new(
            Optimizer::new(predictor, SearchWindow::default()),
            DEFAULT_COST_PER_MIN,
        );

        let outcome = batch.run(&store.flight_ids());
        let improvements: f64 = outcome.results.iter().map(|r| r.improvement()).sum();
        let summary = &outcome.summary;
        prop_assert!(
            (improvements - (summary.total_delay_before - summary.total_delay_after)).abs() < 1e-6
        );
        prop_assert!(summary.total_delay_after <= summary.total_delay_before + 1e-9);
        prop_assert!(summary.mean_improvement_pct.is_finite());
    }
}
