use crate::flight::{AirportId, FlightId, FlightRecord, TailId};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;

/// A flight whose delay grew sharply relative to the previous flight operated
/// by the same aircraft on the same day.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct CascadeEvent {
    pub flight: FlightId,
    pub tail_id: TailId,
    #[tabled(rename = "scheduled")]
    pub sched_time: NaiveDateTime,
    pub origin: AirportId,
    pub destination: AirportId,
    #[tabled(rename = "delay (min)")]
    pub delay_min: f64,
    #[tabled(rename = "cascade effect (min)")]
    pub cascade_effect_min: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct CascadeConfig {
    pub threshold_min: f64,
    pub top_n: usize,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        CascadeConfig {
            threshold_min: 30.0,
            top_n: 10,
        }
    }
}

/// Ranks knock-on delay events. Pure function of its input: records are
/// grouped by (tail, scheduled date), each group is ordered by scheduled time,
/// and the cascade effect is the first difference of delay within the group.
/// The first flight of an aircraft's day has no predecessor and scores zero.
pub fn detect_cascades(records: &[FlightRecord], config: &CascadeConfig) -> Vec<CascadeEvent> {
    let mut groups: BTreeMap<(TailId, NaiveDate), Vec<&FlightRecord>> = BTreeMap::new();
    for rec in records {
        groups
            .entry((rec.tail_id.clone(), rec.sched_time.date()))
            .or_default()
            .push(rec);
    }

    let mut events = Vec::new();
    for group in groups.values_mut() {
        // stable, so same-timestamp flights keep input order
        group.sort_by_key(|r| r.sched_time);
        let mut prev_delay = None;
        for rec in group.iter() {
            let effect = prev_delay.map_or(0.0, |prev: f64| rec.delay_min - prev);
            prev_delay = Some(rec.delay_min);
            if effect > config.threshold_min {
                events.push(CascadeEvent {
                    flight: rec.flight.clone(),
                    tail_id: rec.tail_id.clone(),
                    sched_time: rec.sched_time,
                    origin: rec.origin.clone(),
                    destination: rec.destination.clone(),
                    delay_min: rec.delay_min,
                    cascade_effect_min: effect,
                });
            }
        }
    }

    events.sort_by(|a, b| b.cascade_effect_min.total_cmp(&a.cascade_effect_min));
    events.truncate(config.top_n);
    events
}
