//! Enrichment runner
//!
//! LOAD → MERGE → CLASSIFY (cached, per row) → PERSIST → SUMMARIZE
//!
//! Setup failures abort before any output is written. Per-row label problems
//! are absorbed by the classifier's fallback.

use crate::cache::CacheStore;
use crate::classifier::{Classification, LabelSource, SectorClassifier};
use crate::llm::{ChatModel, RetryPolicy};
use crate::summarizer::{SummaryGenerator, DEFAULT_UNIVERSE};
use crate::table::{merge, Table};
use crate::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Paths and knobs for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub attributes_path: PathBuf,
    pub prices_path: PathBuf,
    pub out_csv: PathBuf,
    pub out_summary: PathBuf,
    /// Company-set phrase used in the summary instruction
    pub universe: String,
    pub temperature: f32,
    /// Save the cache after every newly classified row, not only at the end
    pub flush_each_row: bool,
    pub show_progress: bool,
}

impl RunConfig {
    pub fn new(
        attributes_path: impl Into<PathBuf>,
        prices_path: impl Into<PathBuf>,
        out_csv: impl Into<PathBuf>,
        out_summary: impl Into<PathBuf>,
    ) -> Self {
        Self {
            attributes_path: attributes_path.into(),
            prices_path: prices_path.into(),
            out_csv: out_csv.into(),
            out_summary: out_summary.into(),
            universe: DEFAULT_UNIVERSE.to_string(),
            temperature: 0.0,
            flush_each_row: true,
            show_progress: true,
        }
    }
}

/// Per-source label counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationStats {
    pub cached: usize,
    pub model: usize,
    pub repaired: usize,
    pub fallback: usize,
}

impl ClassificationStats {
    pub fn record(&mut self, classification: &Classification) {
        match classification.source {
            LabelSource::Cached => self.cached += 1,
            LabelSource::Model => self.model += 1,
            LabelSource::Repaired => self.repaired += 1,
            LabelSource::Fallback => self.fallback += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.cached + self.model + self.repaired + self.fallback
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub rows: usize,
    pub stats: ClassificationStats,
    pub out_csv: PathBuf,
    pub out_summary: PathBuf,
    pub cache_location: String,
}

pub struct Runner {
    model: Box<dyn ChatModel>,
    cache_store: Box<dyn CacheStore>,
    retry: RetryPolicy,
    config: RunConfig,
}

impl Runner {
    pub fn new(
        model: Box<dyn ChatModel>,
        cache_store: Box<dyn CacheStore>,
        config: RunConfig,
    ) -> Self {
        Self {
            model,
            cache_store,
            retry: RetryPolicy::default(),
            config,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn run(&self) -> Result<RunReport> {
        let started = Instant::now();
        let config = &self.config;

        let attributes = Table::from_path(&config.attributes_path)?;
        let prices = Table::from_path(&config.prices_path)?;
        let mut table = merge(&attributes, &prices)?;

        info!(
            rows = table.len(),
            name_column = %table.name_column(),
            "Merged input tables"
        );

        let mut cache = self.cache_store.load().await?;
        debug!(entries = cache.len(), location = %self.cache_store.location(), "Cache loaded");

        let classifier = SectorClassifier::new(&*self.model, self.retry.clone())
            .with_temperature(config.temperature);

        let progress = progress_bar(table.len() as u64, config.show_progress);
        let mut stats = ClassificationStats::default();

        for row in table.rows_mut() {
            let classification = classifier.classify(&mut cache, &row.name, &row.symbol).await?;
            row.sector = Some(classification.label);
            stats.record(&classification);

            if config.flush_each_row && classification.source != LabelSource::Cached {
                self.cache_store.save(&cache).await?;
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        self.cache_store.save(&cache).await?;
        table.write_csv(&config.out_csv)?;

        let summary = SummaryGenerator::new(&*self.model, self.retry.clone())
            .with_universe(config.universe.as_str())
            .with_temperature(config.temperature)
            .summarize(&table)
            .await?;
        write_text(&config.out_summary, &summary)?;

        info!(
            rows = table.len(),
            cached = stats.cached,
            classified = stats.model,
            repaired = stats.repaired,
            fallback = stats.fallback,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Enrichment complete"
        );

        Ok(RunReport {
            rows: table.len(),
            stats,
            out_csv: config.out_csv.clone(),
            out_summary: config.out_summary.clone(),
            cache_location: self.cache_store.location(),
        })
    }
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let template = "{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})";
    if let Ok(style) = ProgressStyle::with_template(template) {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message("Classifying");
    pb
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}
