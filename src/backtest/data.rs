//! Price series loading for pair scans.
//!
//! Provides CSV and JSON import.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single price history, optionally stamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub values: Vec<f64>,
    /// One timestamp per value when the source provides them
    pub timestamps: Option<Vec<DateTime<Utc>>>,
}

impl PriceSeries {
    /// Create an unstamped series.
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            timestamps: None,
        }
    }

    /// Create a stamped series. Both vectors must be the same length.
    pub fn with_timestamps(values: Vec<f64>, timestamps: Vec<DateTime<Utc>>) -> Result<Self> {
        anyhow::ensure!(
            values.len() == timestamps.len(),
            "Series has {} values but {} timestamps",
            values.len(),
            timestamps.len()
        );

        Ok(Self {
            values,
            timestamps: Some(timestamps),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Timestamp of the sample at `index`, if stamped.
    pub fn timestamp(&self, index: usize) -> Option<DateTime<Utc>> {
        self.timestamps.as_ref()?.get(index).copied()
    }

    /// First and last timestamps.
    pub fn available_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let timestamps = self.timestamps.as_ref()?;
        Some((*timestamps.first()?, *timestamps.last()?))
    }

    /// Keep only samples stamped within `[start, end]`.
    ///
    /// Unstamped series are returned unchanged.
    pub fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let Some(timestamps) = &self.timestamps else {
            return self.clone();
        };

        let (timestamps, values): (Vec<_>, Vec<_>) = timestamps
            .iter()
            .zip(&self.values)
            .filter(|(ts, _)| **ts >= start && **ts <= end)
            .map(|(ts, value)| (*ts, *value))
            .unzip();

        Self {
            values,
            timestamps: Some(timestamps),
        }
    }
}

/// Trait for loading a price series.
pub trait SeriesLoader: Send + Sync {
    /// Load the full series.
    fn load(&self) -> Result<PriceSeries>;
}

/// CSV loader for price series.
///
/// Accepts a headerless single value column, a headerless
/// `timestamp,value` pair, or a headered file where the value column is
/// picked by name and an optional `timestamp` column is read as RFC 3339:
/// ```csv
/// timestamp,close
/// 2024-01-01T00:00:00Z,42000.50
/// 2024-01-01T01:00:00Z,42100.00
/// ```
#[derive(Debug, Clone)]
pub struct CsvSeriesLoader {
    content: String,
    value_column: String,
}

impl CsvSeriesLoader {
    /// Read a CSV file from disk.
    pub fn new<P: AsRef<Path>>(path: P, value_column: &str) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;

        Ok(Self::from_content(content, value_column))
    }

    /// Wrap CSV content already in memory.
    pub fn from_content(content: impl Into<String>, value_column: &str) -> Self {
        Self {
            content: content.into(),
            value_column: value_column.to_string(),
        }
    }

    fn parse(&self) -> Result<PriceSeries> {
        let mut lines = self
            .content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .peekable();

        let Some(&(_, first)) = lines.peek() else {
            anyhow::bail!("CSV file contains no data rows");
        };

        let layout = match ColumnLayout::from_header(first, &self.value_column)? {
            Some(layout) => {
                lines.next();
                layout
            }
            None => ColumnLayout::headerless(first),
        };

        let mut values = Vec::new();
        let mut timestamps = layout.timestamp.map(|_| Vec::new());

        for (line_num, line) in lines {
            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            let (value, timestamp) = layout
                .parse_row(&parts)
                .with_context(|| format!("Failed to parse line {}: {}", line_num + 1, line))?;

            values.push(value);
            if let (Some(stamps), Some(ts)) = (timestamps.as_mut(), timestamp) {
                stamps.push(ts);
            }
        }

        if values.is_empty() {
            anyhow::bail!("CSV file contains no data rows");
        }

        match timestamps {
            Some(timestamps) => PriceSeries::with_timestamps(values, timestamps),
            None => Ok(PriceSeries::new(values)),
        }
    }
}

impl SeriesLoader for CsvSeriesLoader {
    fn load(&self) -> Result<PriceSeries> {
        self.parse()
    }
}

/// Column positions for a CSV file.
#[derive(Debug, Clone, Copy)]
struct ColumnLayout {
    value: usize,
    timestamp: Option<usize>,
}

impl ColumnLayout {
    /// `None` when the first line is already data.
    fn from_header(line: &str, value_column: &str) -> Result<Option<Self>> {
        let columns: Vec<&str> = line.split(',').map(str::trim).collect();
        if columns.last().is_some_and(|c| c.parse::<f64>().is_ok()) {
            return Ok(None);
        }

        let find = |name: &str| columns.iter().position(|c| c.eq_ignore_ascii_case(name));

        let value = find(value_column)
            .with_context(|| format!("CSV header has no '{}' column: {}", value_column, line))?;

        Ok(Some(Self {
            value,
            timestamp: find("timestamp"),
        }))
    }

    fn headerless(line: &str) -> Self {
        if line.contains(',') {
            Self {
                value: 1,
                timestamp: Some(0),
            }
        } else {
            Self {
                value: 0,
                timestamp: None,
            }
        }
    }

    fn parse_row(&self, parts: &[&str]) -> Result<(f64, Option<DateTime<Utc>>)> {
        let raw = parts
            .get(self.value)
            .with_context(|| format!("Missing value column {}", self.value + 1))?;
        let value: f64 = raw
            .parse()
            .with_context(|| format!("Invalid value: {}", raw))?;

        let timestamp = match self.timestamp {
            Some(idx) => {
                let raw = parts
                    .get(idx)
                    .with_context(|| format!("Missing timestamp column {}", idx + 1))?;
                Some(
                    raw.parse::<DateTime<Utc>>()
                        .with_context(|| format!("Invalid timestamp: {}", raw))?,
                )
            }
            None => None,
        };

        Ok((value, timestamp))
    }
}

/// JSON loader accepting a bare array of numbers.
#[derive(Debug, Clone)]
pub struct JsonSeriesLoader {
    content: String,
}

impl JsonSeriesLoader {
    /// Read a JSON file from disk.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON file: {}", path.display()))?;

        Ok(Self { content })
    }

    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

impl SeriesLoader for JsonSeriesLoader {
    fn load(&self) -> Result<PriceSeries> {
        let values: Vec<f64> =
            serde_json::from_str(&self.content).context("Expected a JSON array of numbers")?;

        if values.is_empty() {
            anyhow::bail!("JSON series contains no values");
        }

        Ok(PriceSeries::new(values))
    }
}

/// Load a series from disk, choosing the format by file extension.
pub fn load_series<P: AsRef<Path>>(path: P, value_column: &str) -> Result<PriceSeries> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        JsonSeriesLoader::new(path)?.load()
    } else {
        CsvSeriesLoader::new(path, value_column)?.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn test_single_column_without_header() {
        let csv = "5.94\n5.89\n\n5.97\n";
        let series = CsvSeriesLoader::from_content(csv, "value").load().unwrap();
        assert_eq!(series.values, vec![5.94, 5.89, 5.97]);
        assert!(series.timestamps.is_none());
    }

    #[test]
    fn test_headered_with_timestamps() {
        let csv = r#"timestamp,symbol,close
2024-01-01T00:00:00Z,BTCUSDT,42000.50
2024-01-02T00:00:00Z,BTCUSDT,42500
2024-01-03T00:00:00Z,BTCUSDT,43000
"#;

        let series = CsvSeriesLoader::from_content(csv, "close").load().unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.values[0], 42000.50);

        let range = series.available_range().unwrap();
        assert_eq!(range.0, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(range.1, Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap());
        assert_eq!(series.timestamp(1).unwrap().day(), 2);
    }

    #[test]
    fn test_loader_output_stays_aligned() {
        let csv = "timestamp,value\n2024-01-01T00:00:00Z,1.0\n2024-01-01T01:00:00Z,2.0\n";
        let series = CsvSeriesLoader::from_content(csv, "value").load().unwrap();
        let rebuilt = PriceSeries::with_timestamps(
            series.values.clone(),
            series.timestamps.clone().unwrap(),
        )
        .unwrap();
        assert_eq!(rebuilt, series);
    }

    #[test]
    fn test_headerless_timestamp_pairs() {
        let csv = "2024-01-01T00:00:00Z,1.5\n2024-01-01T01:00:00Z,1.6\n";
        let series = CsvSeriesLoader::from_content(csv, "value").load().unwrap();
        assert_eq!(series.values, vec![1.5, 1.6]);
        assert_eq!(series.timestamps.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_missing_value_column() {
        let csv = "timestamp,price\n2024-01-01T00:00:00Z,1.0\n";
        let err = CsvSeriesLoader::from_content(csv, "close")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("close"));
    }

    #[test]
    fn test_bad_value_reports_line() {
        let csv = "value\n1.0\nabc\n";
        let err = CsvSeriesLoader::from_content(csv, "value")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_empty_inputs_rejected() {
        assert!(CsvSeriesLoader::from_content("", "value").load().is_err());
        assert!(CsvSeriesLoader::from_content("value\n", "value")
            .load()
            .is_err());
        assert!(JsonSeriesLoader::from_content("[]").load().is_err());
    }

    #[test]
    fn test_json_array() {
        let series = JsonSeriesLoader::from_content("[5.94, 5.89, 6]")
            .load()
            .unwrap();
        assert_eq!(series.values, vec![5.94, 5.89, 6.0]);
        assert!(JsonSeriesLoader::from_content("{\"a\": 1}").load().is_err());
    }

    #[test]
    fn test_filter_by_date_range() {
        let csv = r#"timestamp,value
2024-01-01T00:00:00Z,1.0
2024-01-02T00:00:00Z,2.0
2024-01-03T00:00:00Z,3.0
"#;
        let series = CsvSeriesLoader::from_content(csv, "value").load().unwrap();

        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();

        let filtered = series.between(start, end);
        assert_eq!(filtered.values, vec![2.0]);
        assert_eq!(filtered.timestamp(0).unwrap().day(), 2);

        let unstamped = PriceSeries::new(vec![1.0, 2.0]);
        assert_eq!(unstamped.between(start, end), unstamped);
    }

    #[test]
    fn test_mismatched_timestamps_rejected() {
        let ts = vec![Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()];
        assert!(PriceSeries::with_timestamps(vec![1.0, 2.0], ts).is_err());
    }
}
