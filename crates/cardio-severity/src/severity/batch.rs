use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use super::error::PredictionError;
use super::label::{group_severity, SeverityLabel, CLASS_COUNT};
use super::pipeline::SeverityPipeline;
use super::record::{RawRecord, RawValue};
use super::response::PredictionResult;

/// Column carrying the original five-level severity in UCI-style exports.
const GROUND_TRUTH_COLUMN: &str = "num";

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("failed to read batch file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid batch CSV data: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Scored { result: PredictionResult },
    Rejected { error: String, fields: Vec<&'static str> },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchRow {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub expected: Option<SeverityLabel>,
    #[serde(flatten)]
    pub outcome: RowOutcome,
}

impl BatchRow {
    pub fn prediction(&self) -> Option<&PredictionResult> {
        match &self.outcome {
            RowOutcome::Scored { result } => Some(result),
            RowOutcome::Rejected { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub rows: Vec<BatchRow>,
    pub scored: usize,
    pub rejected: usize,
    /// Predicted class counts keyed by class index.
    pub predicted_counts: BTreeMap<String, usize>,
    pub low_confidence: usize,
}

/// Scores every row of a CSV export; bad rows are reported, not fatal.
pub struct BatchScorer<'a> {
    pipeline: &'a SeverityPipeline,
}

impl<'a> BatchScorer<'a> {
    pub fn new(pipeline: &'a SeverityPipeline) -> Self {
        Self { pipeline }
    }

    pub fn score_path(&self, path: impl AsRef<Path>) -> Result<BatchReport, BatchError> {
        let file = File::open(path)?;
        self.score_reader(file)
    }

    pub fn score_reader<R: Read>(&self, reader: R) -> Result<BatchReport, BatchError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (index, record) in csv_reader
            .deserialize::<BTreeMap<String, String>>()
            .enumerate()
        {
            let columns = record?;
            let row = index + 1;
            let expected = columns
                .get(GROUND_TRUTH_COLUMN)
                .and_then(|value| parse_ground_truth(row, value));
            let raw = raw_record_from_columns(&columns);

            let outcome = match self.pipeline.predict(&raw) {
                Ok(result) => RowOutcome::Scored { result },
                Err(error) => rejected(error),
            };
            rows.push(BatchRow {
                row,
                expected,
                outcome,
            });
        }

        Ok(summarize(rows))
    }
}

fn rejected(error: PredictionError) -> RowOutcome {
    RowOutcome::Rejected {
        fields: error.fields(),
        error: error.to_string(),
    }
}

fn parse_ground_truth(row: usize, value: &str) -> Option<SeverityLabel> {
    if value.is_empty() {
        return None;
    }
    let grouped = value
        .parse::<f64>()
        .ok()
        .filter(|level| level.fract() == 0.0 && *level >= 0.0 && *level <= 4.0)
        .and_then(|level| group_severity(level as u8));
    if grouped.is_none() {
        warn!(row, value, "ignoring unrecognised severity level");
    }
    grouped
}

/// Empty cells become absent values; numbers are parsed, everything else stays text.
fn raw_record_from_columns(columns: &BTreeMap<String, String>) -> RawRecord {
    let mut raw = RawRecord::new();
    for (column, cell) in columns {
        if column == GROUND_TRUTH_COLUMN || cell.is_empty() {
            continue;
        }
        let value = match cell.parse::<f64>() {
            Ok(number) => RawValue::Number(number),
            Err(_) => RawValue::Text(cell.clone()),
        };
        raw.insert(column, value);
    }
    raw
}

fn summarize(rows: Vec<BatchRow>) -> BatchReport {
    let mut predicted_counts: BTreeMap<String, usize> = (0..CLASS_COUNT)
        .map(|index| (index.to_string(), 0))
        .collect();
    let mut low_confidence = 0;
    let mut scored = 0;

    for result in rows.iter().filter_map(BatchRow::prediction) {
        scored += 1;
        if result.is_low_confidence() {
            low_confidence += 1;
        }
        *predicted_counts
            .entry(result.label().index().to_string())
            .or_insert(0) += 1;
    }

    BatchReport {
        rejected: rows.len() - scored,
        scored,
        predicted_counts,
        low_confidence,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_cells_to_raw_values() {
        let columns: BTreeMap<String, String> = [
            ("age", "63"),
            ("sex", "Male"),
            ("fbs", "TRUE"),
            ("ca", ""),
            ("num", "3"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

        let raw = raw_record_from_columns(&columns);
        assert_eq!(raw.0.get("age"), Some(&Some(RawValue::Number(63.0))));
        assert_eq!(
            raw.0.get("fbs"),
            Some(&Some(RawValue::Text("TRUE".to_string())))
        );
        assert!(!raw.0.contains_key("ca"));
        assert!(!raw.0.contains_key("num"));
    }

    #[test]
    fn ground_truth_goes_through_grouping() {
        assert_eq!(parse_ground_truth(1, "0"), Some(SeverityLabel::NoDisease));
        assert_eq!(parse_ground_truth(1, "2"), Some(SeverityLabel::MildModerate));
        assert_eq!(parse_ground_truth(1, "4.0"), Some(SeverityLabel::SevereCritical));
        assert_eq!(parse_ground_truth(1, "7"), None);
        assert_eq!(parse_ground_truth(1, ""), None);
    }
}
