//! Command-line interface argument parsing.

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use music_minds::config::Config;
use music_minds::output::OutputFormat;
use music_minds::views::View;

/// music-minds - music taste vs. mental health, summarised
///
/// Loads the survey once, applies the filters given on the command line and
/// prints the table behind one dashboard chart.
///
/// Examples:
///   music-minds --view genre
///   music-minds --view age --genre Rock --genre Metal
///   music-minds --view heatmap --metric Insomnia --age 18..30
///   music-minds --source survey.csv --format json --output genre.json
///   music-minds --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Survey location: http(s) URL, .csv, .json or .parquet
    #[arg(short, long, env = "MUSIC_MINDS_SOURCE")]
    pub source: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for music-minds.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Which summary to compute
    #[arg(long, value_enum)]
    pub view: Option<View>,

    /// Inclusive age range, e.g. 18..30
    #[arg(long, value_name = "LO..HI", value_parser = parse_range)]
    pub age: Option<(f64, f64)>,

    /// Inclusive hours-per-day range, e.g. 0..4
    #[arg(long, value_name = "LO..HI", value_parser = parse_range)]
    pub hours: Option<(f64, f64)>,

    /// Keep only these favourite genres (repeatable)
    #[arg(short, long, value_name = "GENRE")]
    pub genre: Vec<String>,

    /// Keep only one age group, e.g. "20-29"
    #[arg(long, value_name = "LABEL")]
    pub age_group: Option<String>,

    /// Score column(s); the first drives single-metric views,
    /// all of them the grouped views
    #[arg(short, long, value_name = "METRIC")]
    pub metric: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Write a default music-minds.toml and exit
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default log level when `RUST_LOG` is unset.
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        }
    }

    /// Command-line values win over the config file.
    pub fn merge_into(&self, config: &mut Config) {
        if let Some(source) = &self.source {
            config.source.location = source.clone();
        }
        if let Some(view) = self.view {
            config.defaults.view = view;
        }
        if let Some(format) = self.format {
            config.defaults.format = format;
        }
        if let Some(first) = self.metric.first() {
            config.defaults.metric = first.clone();
            config.schema.metrics = self.metric.clone();
            config.schema.genre_metrics = self.metric.clone();
        }
    }
}

/// Parse `LO..HI` (or `LO,HI`) into an inclusive range.
pub fn parse_range(s: &str) -> Result<(f64, f64), String> {
    let (lo, hi) = s
        .split_once("..")
        .or_else(|| s.split_once(','))
        .ok_or_else(|| format!("expected LO..HI, got '{s}'"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", part.trim()))
    };
    Ok((parse(lo)?, parse(hi)?))
}
