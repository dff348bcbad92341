use crate::error::EngineError;
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tabled::Tabled;

pub type FlightId = Arc<str>;
pub type TailId = Arc<str>;
pub type AirportId = Arc<str>;

/// Raw row as it appears in the weekly flight CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFlightRow {
    pub flight: FlightId,
    pub tail_id: TailId,
    pub origin: AirportId,
    pub destination: AirportId,
    pub sched_time_local: String,
    pub actual_time_local: String,
}

/// Flight with derived delay and calendar features. Immutable once derived;
/// the analytics path keeps the delay signed (early operations are negative).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct FlightRecord {
    pub flight: FlightId,
    pub tail_id: TailId,
    pub origin: AirportId,
    pub destination: AirportId,
    #[tabled(rename = "scheduled")]
    pub sched_time: NaiveDateTime,
    #[tabled(rename = "actual")]
    pub actual_time: NaiveDateTime,
    #[tabled(rename = "delay (min)")]
    pub delay_min: f64,
    pub hour: u32,
    /// 0 = Monday.
    pub weekday: u32,
    pub month: u32,
}

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, EngineError> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
        .ok_or_else(|| EngineError::SourceUnavailable(format!("unparseable timestamp {:?}", raw)))
}

impl FlightRecord {
    pub fn derive(row: RawFlightRow) -> Result<FlightRecord, EngineError> {
        let sched_time = parse_timestamp(&row.sched_time_local)?;
        let actual_time = parse_timestamp(&row.actual_time_local)?;
        let delay_min = (actual_time - sched_time).num_seconds() as f64 / 60.0;
        Ok(FlightRecord {
            flight: row.flight,
            tail_id: row.tail_id,
            origin: row.origin,
            destination: row.destination,
            sched_time,
            actual_time,
            delay_min,
            hour: sched_time.hour(),
            weekday: sched_time.weekday().num_days_from_monday(),
            month: sched_time.month(),
        })
    }
}
