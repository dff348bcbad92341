use crate::error::EngineError;
use crate::flight::{FlightId, FlightRecord, RawFlightRow};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tabled::Tabled;
use tracing::info;

/// Per-hour traffic and delay aggregate over the whole week.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct HourlyStat {
    pub hour: u32,
    #[tabled(rename = "operations")]
    pub ops_count: usize,
    #[tabled(rename = "avg delay (min)")]
    pub avg_delay_min: f64,
}

/// In-memory table of derived flight records for one analysis session.
#[derive(Debug)]
pub struct FlightStore {
    records: Vec<FlightRecord>,
    index: HashMap<FlightId, usize>,
}

impl FlightStore {
    /// Derives features for every raw row. An empty or malformed source is a
    /// hard stop; partially-populated stores are never produced.
    pub fn from_rows(rows: Vec<RawFlightRow>) -> Result<FlightStore, EngineError> {
        if rows.is_empty() {
            return Err(EngineError::SourceUnavailable(
                "no flight rows in source".to_string(),
            ));
        }
        let records = rows
            .into_iter()
            .map(FlightRecord::derive)
            .collect::<Result<Vec<_>, _>>()?;

        // First match in storage order wins for duplicate flight ids.
        let mut index = HashMap::new();
        for (i, rec) in records.iter().enumerate() {
            index.entry(rec.flight.clone()).or_insert(i);
        }

        info!(flights = records.len(), "flight store ready");
        Ok(FlightStore { records, index })
    }

    pub fn load_from_csv(path: impl AsRef<Path>) -> Result<FlightStore, EngineError> {
        let mut reader = csv::Reader::from_path(path.as_ref())
            .map_err(EngineError::source_unavailable)?;
        let rows = reader
            .deserialize::<RawFlightRow>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(EngineError::source_unavailable)?;
        Self::from_rows(rows)
    }

    pub fn records(&self) -> &[FlightRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, flight_id: &FlightId) -> Option<&FlightRecord> {
        self.index.get(flight_id).map(|i| &self.records[*i])
    }

    pub fn flight_ids(&self) -> Vec<FlightId> {
        self.records.iter().map(|r| r.flight.clone()).collect()
    }

    /// One entry per hour that saw traffic, ordered by hour.
    pub fn hourly_stats(&self) -> Vec<HourlyStat> {
        let mut ops = [0usize; 24];
        let mut delay_sum = [0.0f64; 24];
        for rec in &self.records {
            ops[rec.hour as usize] += 1;
            delay_sum[rec.hour as usize] += rec.delay_min;
        }
        (0..24)
            .filter(|h| ops[*h] > 0)
            .map(|h| HourlyStat {
                hour: h as u32,
                ops_count: ops[h],
                avg_delay_min: delay_sum[h] / ops[h] as f64,
            })
            .collect()
    }

    pub fn busiest_hours(&self, n: usize) -> Vec<HourlyStat> {
        let mut stats = self.hourly_stats();
        stats.sort_by(|a, b| b.ops_count.cmp(&a.ops_count));
        stats.truncate(n);
        stats
    }

    pub fn best_hours(&self, n: usize) -> Vec<HourlyStat> {
        let mut stats = self.hourly_stats();
        stats.sort_by(|a, b| a.avg_delay_min.total_cmp(&b.avg_delay_min));
        stats.truncate(n);
        stats
    }
}
