use crate::flight::FlightId;
use crate::optimize::batch::{BatchOutcome, OptimizationSummary};
use crate::optimize::single::OptimizationResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tabled::Tabled;

pub const SUMMARY_FILE: &str = "optimization_summary.json";
pub const DETAILS_FILE: &str = "schedule_reco_samples.csv";

/// One persisted row per successfully-optimized sampled flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct BatchDetailRow {
    pub flight: FlightId,
    #[tabled(rename = "original delay (min)")]
    pub original_delay_min: f64,
    #[tabled(rename = "optimized delay (min)")]
    pub optimized_delay_min: f64,
    #[tabled(rename = "reduction (min)")]
    pub reduction_min: f64,
}

impl From<&OptimizationResult> for BatchDetailRow {
    fn from(result: &OptimizationResult) -> Self {
        BatchDetailRow {
            flight: result.flight.clone(),
            original_delay_min: result.original_delay,
            optimized_delay_min: result.best_delay,
            reduction_min: result.improvement(),
        }
    }
}

pub fn format_minutes(value: f64) -> String {
    format!("{:.2} mins", value)
}

/// `$1,234.56`-style, thousands grouped.
pub fn format_money(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;
    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, frac)
}

/// Human-readable labels, as consumed by downstream reporting without
/// recomputation.
pub fn summary_labels(summary: &OptimizationSummary) -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "Flights Optimized".to_string(),
            summary.flights_optimized.to_string(),
        ),
        (
            "Total Delay BEFORE".to_string(),
            format_minutes(summary.total_delay_before),
        ),
        (
            "Total Delay AFTER".to_string(),
            format_minutes(summary.total_delay_after),
        ),
        (
            "Total Minutes Saved".to_string(),
            format_minutes(summary.total_minutes_saved),
        ),
        (
            "Mean Improvement".to_string(),
            format!("{:.2}%", summary.mean_improvement_pct),
        ),
        (
            "Estimated Cost BEFORE".to_string(),
            format_money(summary.cost_before),
        ),
        (
            "Estimated Cost AFTER".to_string(),
            format_money(summary.cost_after),
        ),
        (
            "Estimated Savings".to_string(),
            format_money(summary.cost_saved),
        ),
    ])
}

/// Writes the summary and detail artifacts. Called once, after all batch
/// workers have joined; never concurrently.
pub fn write_artifacts(dir: impl AsRef<Path>, outcome: &BatchOutcome) -> io::Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let labels = summary_labels(&outcome.summary);
    let json = serde_json::to_string_pretty(&labels)?;
    fs::write(dir.join(SUMMARY_FILE), json)?;

    let mut writer = csv::Writer::from_path(dir.join(DETAILS_FILE)).map_err(io::Error::other)?;
    for result in &outcome.results {
        writer
            .serialize(BatchDetailRow::from(result))
            .map_err(io::Error::other)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads the persisted summary back, if a previous pass left one.
pub fn read_summary(dir: impl AsRef<Path>) -> io::Result<Option<BTreeMap<String, String>>> {
    let path = dir.as_ref().join(SUMMARY_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}

pub fn read_details(dir: impl AsRef<Path>) -> io::Result<Option<Vec<BatchDetailRow>>> {
    let path = dir.as_ref().join(DETAILS_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let mut reader = csv::Reader::from_path(path).map_err(io::Error::other)?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<BatchDetailRow>, _>>()
        .map_err(io::Error::other)?;
    Ok(Some(rows))
}
