//! Configuration file handling.
//!
//! Loads `music-minds.toml`: where the survey lives, which columns carry
//! which meaning, and how numeric fields are binned.

use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::data::bins::BinSpec;
use crate::error::PipelineError;
use crate::output::OutputFormat;
use crate::views::View;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "music-minds.toml";

/// Public MxMH survey export used by the original dashboards.
pub const DEFAULT_SOURCE: &str =
    "https://raw.githubusercontent.com/mohidqadeer123/week-1/refs/heads/main/Data_Science_Survey.csv";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub schema: SchemaConfig,

    #[serde(default)]
    pub bins: BinsConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL or local path (`.csv`, `.json`, `.parquet`).
    #[serde(default = "default_location")]
    pub location: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
        }
    }
}

fn default_location() -> String {
    DEFAULT_SOURCE.to_string()
}

/// Column names in the loaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default = "default_age")]
    pub age: String,

    #[serde(default = "default_hours")]
    pub hours: String,

    #[serde(default = "default_genre")]
    pub genre: String,

    /// Every mental-health score column.
    #[serde(default = "default_metrics")]
    pub metrics: Vec<String>,

    /// Scores shown (and combined into `avg_score`) by the genre view.
    #[serde(default = "default_genre_metrics")]
    pub genre_metrics: Vec<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            age: default_age(),
            hours: default_hours(),
            genre: default_genre(),
            metrics: default_metrics(),
            genre_metrics: default_genre_metrics(),
        }
    }
}

fn default_age() -> String {
    "Age".to_string()
}

fn default_hours() -> String {
    "Hours per day".to_string()
}

fn default_genre() -> String {
    "Fav genre".to_string()
}

fn default_metrics() -> Vec<String> {
    ["Anxiety", "Depression", "Insomnia", "OCD"]
        .map(String::from)
        .to_vec()
}

fn default_genre_metrics() -> Vec<String> {
    ["Anxiety", "Depression", "Insomnia"].map(String::from).to_vec()
}

/// Binning of numeric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinsConfig {
    /// Grid resolution of the heatmap view.
    #[serde(default = "default_heatmap_age_bins")]
    pub heatmap_age_bins: usize,

    #[serde(default = "default_heatmap_hours_bins")]
    pub heatmap_hours_bins: usize,

    /// Age-group partition; see [`BinSpec`] for the edge policy.
    #[serde(default = "default_age_groups")]
    pub age_groups: BinSpec,

    /// Listening-time bands.
    #[serde(default = "default_hours_bands")]
    pub hours_bands: BinSpec,
}

impl Default for BinsConfig {
    fn default() -> Self {
        Self {
            heatmap_age_bins: default_heatmap_age_bins(),
            heatmap_hours_bins: default_heatmap_hours_bins(),
            age_groups: default_age_groups(),
            hours_bands: default_hours_bands(),
        }
    }
}

fn default_age_groups() -> BinSpec {
    BinSpec::age_groups()
}

fn default_hours_bands() -> BinSpec {
    BinSpec::hours_bands()
}

fn default_heatmap_age_bins() -> usize {
    8
}

fn default_heatmap_hours_bins() -> usize {
    6
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub view: View,

    /// Metric used by single-metric views (heatmap, scatter).
    #[serde(default = "default_metric")]
    pub metric: String,

    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            view: View::default(),
            metric: default_metric(),
            format: OutputFormat::default(),
        }
    }
}

fn default_metric() -> String {
    "Anxiety".to_string()
}

impl Config {
    /// Load from an explicit path, or from `music-minds.toml` in the working
    /// directory if present, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    Self::load_from_file(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that do not need the dataset.
    pub fn validate(&self) -> std::result::Result<(), PipelineError> {
        if self.schema.metrics.is_empty() {
            return Err(PipelineError::InvalidConfig("schema.metrics is empty".into()));
        }
        if self.schema.genre_metrics.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "schema.genre_metrics is empty".into(),
            ));
        }
        if self.bins.heatmap_age_bins == 0 || self.bins.heatmap_hours_bins == 0 {
            return Err(PipelineError::InvalidConfig(
                "heatmap bin counts must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Render the default configuration as TOML.
    pub fn default_toml() -> String {
        let header = "# music-minds configuration\n\n";
        match toml::to_string_pretty(&Config::default()) {
            Ok(body) => format!("{header}{body}"),
            Err(_) => header.to_string(),
        }
    }

    /// Every score column plus the genre-view columns, deduplicated.
    pub fn all_metrics(&self) -> Vec<String> {
        let mut out = self.schema.metrics.clone();
        for m in &self.schema.genre_metrics {
            if !out.contains(m) {
                out.push(m.clone());
            }
        }
        if !out.contains(&self.defaults.metric) {
            out.push(self.defaults.metric.clone());
        }
        out
    }
}
