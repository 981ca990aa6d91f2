//! Command-line surface

use crate::config::{DEFAULT_CACHE_PATH, DEFAULT_MODEL, DEFAULT_OUT_CSV, DEFAULT_OUT_SUMMARY};
use crate::runner::RunConfig;
use crate::summarizer::DEFAULT_UNIVERSE;
use clap::Parser;
use std::path::PathBuf;

/// Enrich a company table with sector labels via a chat model, then summarize it.
#[derive(Debug, Clone, Parser)]
#[command(name = "enrich", version, about)]
pub struct Args {
    /// Company-attributes CSV (needs `symbol`; `name` or `company` preferred)
    #[arg(long)]
    pub input_ca: PathBuf,

    /// Price-performance CSV (needs `symbol` and `ytd`)
    #[arg(long)]
    pub price_change: PathBuf,

    #[arg(long, default_value = DEFAULT_OUT_CSV)]
    pub out_csv: PathBuf,

    #[arg(long, default_value = DEFAULT_OUT_SUMMARY)]
    pub out_summary: PathBuf,

    /// Chat model identifier
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Sector cache file
    #[arg(long, default_value = DEFAULT_CACHE_PATH)]
    pub cache: PathBuf,

    /// Company set described in the summary instruction
    #[arg(long, default_value = DEFAULT_UNIVERSE)]
    pub universe: String,

    #[arg(long, default_value_t = 0.0)]
    pub temperature: f32,

    /// Save the cache once at the end instead of after every new label
    #[arg(long)]
    pub flush_at_end: bool,

    /// Hide the progress bar
    #[arg(long, short)]
    pub quiet: bool,
}

impl Args {
    pub fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::new(
            &self.input_ca,
            &self.price_change,
            &self.out_csv,
            &self.out_summary,
        );
        config.universe = self.universe.clone();
        config.temperature = self.temperature;
        config.flush_each_row = !self.flush_at_end;
        config.show_progress = !self.quiet;
        config
    }
}
