//! Core running-log library: workout records, pace parsing, the record store
//! contract, the chat bot and the dashboard metrics.

pub mod axis;
pub mod bot;
pub mod dashboard;
pub mod metrics;
pub mod pace;
pub mod store;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use axis::{AxisTick, PaceAxis};
pub use bot::{Bot, Command, InboundMessage, Reply, Submission, SubmissionError};
pub use dashboard::{Dashboard, DashboardRow, MetricCard};
pub use metrics::{summarize, BestPace, Summary};
pub use pace::{format_pace, parse_pace, PaceParse};
pub use store::{CsvStore, MemoryStore, RecordStore};

#[derive(Error, Debug)]
pub enum RunlogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("store error: {0}")]
    Store(String),
    #[error("invalid row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

/// Header row written at the top of every store.
pub const HEADER: [&str; 5] = ["Date", "Distance (KM)", "Duration", "Pace", "HR"];

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One logged run, exactly as it is stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub date: NaiveDate,
    pub distance_km: f64,
    pub duration: String,
    pub pace: String,
    pub heart_rate: u32,
}

impl WorkoutRecord {
    /// Pace of this record in seconds per kilometer.
    pub fn pace_seconds(&self) -> PaceParse {
        parse_pace(&self.pace)
    }

    /// Encode as the five store cells.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.date.format(DATE_FORMAT).to_string(),
            format_distance(self.distance_km),
            self.duration.clone(),
            self.pace.clone(),
            self.heart_rate.to_string(),
        ]
    }

    /// Decode store cells. `row_number` is the 1-based sheet row used in errors.
    pub fn from_row(cells: &[String], row_number: usize) -> Result<Self, RunlogError> {
        let invalid = |reason: String| RunlogError::InvalidRow {
            row: row_number,
            reason,
        };

        let mut cells: Vec<&str> = cells.iter().map(|c| c.trim()).collect();
        while cells.len() > HEADER.len() && cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        if cells.len() != HEADER.len() {
            return Err(invalid(format!(
                "expected {} cells, found {}",
                HEADER.len(),
                cells.len()
            )));
        }

        let date = NaiveDate::parse_from_str(cells[0], DATE_FORMAT)
            .map_err(|e| invalid(format!("bad date '{}': {}", cells[0], e)))?;
        let distance_km = parse_distance(cells[1])
            .ok_or_else(|| invalid(format!("bad distance '{}'", cells[1])))?;
        let heart_rate: u32 = cells[4]
            .parse()
            .map_err(|_| invalid(format!("bad heart rate '{}'", cells[4])))?;

        Ok(Self {
            date,
            distance_km,
            duration: cells[2].to_string(),
            pace: cells[3].to_string(),
            heart_rate,
        })
    }
}

/// Parse a distance in kilometers, accepting `,` as the decimal separator.
/// Negative and non-finite values are rejected.
pub fn parse_distance(text: &str) -> Option<f64> {
    let value: f64 = text.trim().replace(',', ".").parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Render a distance the way the store displays floats: always at least one
/// fractional digit.
pub fn format_distance(km: f64) -> String {
    if km.fract() == 0.0 {
        format!("{:.1}", km)
    } else {
        format!("{}", km)
    }
}

pub fn header_row() -> Vec<String> {
    HEADER.iter().map(|h| h.to_string()).collect()
}
