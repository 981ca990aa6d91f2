//! Sector Enricher
//!
//! Enriches a table of companies with a sector label from a chat model, then
//! asks the model for an investment summary of the enriched table:
//! - Inner-joins company attributes with year-to-date price performance
//! - Classifies each company into a closed ten-label sector taxonomy
//! - Caches labels across runs, keyed by name and ticker
//! - Retries transient API failures with bounded exponential backoff
//! - Repairs or falls back on invalid labels so one bad answer never aborts a run
//!
//! PIPELINE:
//! LOAD → MERGE → CLASSIFY (cache → model → repair → fallback) → PERSIST → SUMMARIZE

pub mod cache;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod runner;
pub mod summarizer;
pub mod table;

pub use error::Result;

// Re-export common types
pub use classifier::{Classification, LabelSource, SectorClassifier};
pub use models::{InvalidLabel, SectorLabel};
pub use runner::{RunConfig, RunReport, Runner};
