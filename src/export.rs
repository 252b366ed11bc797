//! Tabular and JSON views of a `TankReport` for export collaborators.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::analysis::aggregate::{Period, period_start};
use crate::model::TrendLabel;
use crate::pipeline::TankReport;

pub const CSV_HEADER: &str = "created_at,liters,smoothed,trend,inflow,usage,hour";

/// One reading's worth of derived columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub created_at: DateTime<FixedOffset>,
    pub liters: f64,
    pub smoothed: f64,
    pub trend: TrendLabel,
    pub inflow: f64,
    pub usage: f64,
    pub hour: DateTime<FixedOffset>,
}

/// Flattens the report's series and flow into one row per point.
pub fn rows(report: &TankReport) -> Vec<ExportRow> {
    report
        .series
        .iter()
        .zip(&report.flow)
        .map(|(s, f)| ExportRow {
            created_at: s.timestamp,
            liters: s.volume_liters,
            smoothed: s.smoothed_liters,
            trend: f.trend,
            inflow: f.inflow_liters,
            usage: f.usage_liters,
            hour: period_start(s.timestamp, Period::Hour),
        })
        .collect()
}

pub fn to_csv(report: &TankReport) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for r in rows(report) {
        out.push_str(&format!(
            "{},{:.3},{:.3},{},{:.3},{:.3},{}\n",
            r.created_at.to_rfc3339(),
            r.liters,
            r.smoothed,
            r.trend,
            r.inflow,
            r.usage,
            r.hour.to_rfc3339()
        ));
    }
    out
}

pub fn to_json(report: &TankReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// File name for a tank's export, with spaces replaced by underscores.
pub fn file_name(tank_id: &str, extension: &str) -> String {
    format!("{}.{}", tank_id.replace(' ', "_"), extension)
}

/// Writes the report's CSV into `dir` under [`file_name`] and returns the path.
pub fn write_csv(report: &TankReport, dir: &Path) -> std::io::Result<PathBuf> {
    let path = dir.join(file_name(&report.tank_id, "csv"));
    std::fs::write(&path, to_csv(report))?;
    Ok(path)
}
