//! Configuration management for optitrade.
//!
//! Loads settings from environment variables and config files.

use crate::finder::Penalty;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Transaction penalty settings
    #[serde(default)]
    pub penalty: PenaltyConfig,
    /// Input series settings
    #[serde(default)]
    pub data: DataConfig,
    /// Result output settings
    #[serde(default)]
    pub output: OutputConfig,
    /// Penalty sweep settings
    #[serde(default)]
    pub sweep: SweepConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyConfig {
    /// Fraction charged when opting in (0.0-1.0)
    #[serde(default = "default_penalty")]
    pub entry: f64,
    /// Fraction charged when opting out (0.0-1.0)
    #[serde(default = "default_penalty")]
    pub exit: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Series file (CSV or JSON)
    #[serde(default)]
    pub path: Option<String>,
    /// Column holding the values in headered CSV files
    #[serde(default = "default_value_column")]
    pub value_column: String,
    /// First day to keep (YYYY-MM-DD), stamped series only
    #[serde(default)]
    pub start: Option<String>,
    /// Last day to keep (YYYY-MM-DD), inclusive
    #[serde(default)]
    pub end: Option<String>,
}

impl DataConfig {
    /// Date window from `start`/`end`, or `None` when neither is set.
    ///
    /// The start day begins at 00:00:00 UTC and the end day runs through 23:59:59.
    pub fn date_range(&self) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        if self.start.is_none() && self.end.is_none() {
            return Ok(None);
        }

        let start = match &self.start {
            Some(s) => parse_day(s, (0, 0, 0))?,
            None => DateTime::<Utc>::MIN_UTC,
        };
        let end = match &self.end {
            Some(s) => parse_day(s, (23, 59, 59))?,
            None => DateTime::<Utc>::MAX_UTC,
        };

        anyhow::ensure!(start <= end, "start date {} is after end date {}", start, end);

        Ok(Some((start, end)))
    }
}

fn parse_day(raw: &str, (hour, min, sec): (u32, u32, u32)) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))?;
    let datetime = date
        .and_hms_opt(hour, min, sec)
        .with_context(|| format!("Invalid time on {}", raw))?;
    Ok(datetime.and_utc())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for CSV exports
    #[serde(default)]
    pub directory: Option<String>,
    /// Print JSON instead of the text summary
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Symmetric penalties to try
    #[serde(default = "default_sweep_penalties")]
    pub penalties: Vec<f64>,
    /// Number of worker threads
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

// Default value functions
fn default_penalty() -> f64 {
    0.0025 // 0.25% per side
}

fn default_value_column() -> String {
    "value".to_string()
}

fn default_sweep_penalties() -> Vec<f64> {
    vec![0.0005, 0.001, 0.0025, 0.005, 0.01]
}

fn default_parallelism() -> usize {
    4
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("optitrade").required(false))
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .prefix("OPTITRADE"),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("entry", self.penalty.entry), ("exit", self.penalty.exit)] {
            anyhow::ensure!(
                is_valid_penalty(value),
                "{} penalty must be between 0 and 1, got {}",
                name,
                value
            );
        }

        for &p in &self.sweep.penalties {
            anyhow::ensure!(
                is_valid_penalty(p),
                "sweep penalties must be between 0 and 1, got {}",
                p
            );
        }

        anyhow::ensure!(
            self.sweep.parallelism >= 1,
            "sweep parallelism must be at least 1"
        );

        anyhow::ensure!(
            !self.data.value_column.trim().is_empty(),
            "value_column must not be empty"
        );

        self.data.date_range()?;

        Ok(())
    }

    /// Penalty described by the `penalty` section.
    pub fn penalty(&self) -> Result<Penalty> {
        Penalty::asymmetric(self.penalty.entry, self.penalty.exit)
            .context("Invalid penalty configuration")
    }

    /// Penalties for the sweep, each applied symmetrically.
    pub fn sweep_penalties(&self) -> Result<Vec<Penalty>> {
        self.sweep
            .penalties
            .iter()
            .map(|&p| Penalty::symmetric(p).context("Invalid sweep penalty"))
            .collect()
    }
}

fn is_valid_penalty(value: f64) -> bool {
    value.is_finite() && (0.0..1.0).contains(&value)
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            entry: default_penalty(),
            exit: default_penalty(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: None,
            value_column: default_value_column(),
            start: None,
            end: None,
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            penalties: default_sweep_penalties(),
            parallelism: default_parallelism(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.penalty().unwrap(), Penalty::Symmetric(0.0025));
    }

    #[test]
    fn test_rejects_out_of_range_penalty() {
        let mut config = Config::default();
        config.penalty.exit = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.penalty.entry = -0.01;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sweep.penalties.push(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_parallelism() {
        let mut config = Config::default();
        config.sweep.parallelism = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_asymmetric_penalty_from_config() {
        let mut config = Config::default();
        config.penalty.entry = 0.001;
        config.penalty.exit = 0.002;
        assert_eq!(
            config.penalty().unwrap(),
            Penalty::Asymmetric {
                entry: 0.001,
                exit: 0.002
            }
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                "[penalty]\nentry = 0.001\n\n[sweep]\nparallelism = 2\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.penalty.entry, 0.001);
        assert_eq!(config.penalty.exit, 0.0025);
        assert_eq!(config.sweep.parallelism, 2);
        assert_eq!(config.sweep.penalties, default_sweep_penalties());
        assert_eq!(config.data.value_column, "value");
    }

    #[test]
    fn test_date_range() {
        let mut config = Config::default();
        assert!(config.data.date_range().unwrap().is_none());

        config.data.start = Some("2024-01-02".to_string());
        config.data.end = Some("2024-01-03".to_string());
        let (start, end) = config.data.date_range().unwrap().unwrap();
        assert_eq!(start.to_rfc3339(), "2024-01-02T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-01-03T23:59:59+00:00");

        config.data.end = None;
        let (_, end) = config.data.date_range().unwrap().unwrap();
        assert_eq!(end, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_rejects_bad_date_range() {
        let mut config = Config::default();
        config.data.start = Some("2024-13-01".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.data.start = Some("2024-02-01".to_string());
        config.data.end = Some("2024-01-01".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sweep_penalties_are_symmetric() {
        let config = Config::default();
        let penalties = config.sweep_penalties().unwrap();
        assert_eq!(penalties.len(), 5);
        assert!(penalties.iter().all(|p| p.entry() == p.exit()));
    }
}
