//! Runtime configuration
//!
//! Credentials come from the environment (optionally seeded from `.env`).
//! Everything else comes from the command line.

use crate::error::EnrichError;
use crate::llm::openai::DEFAULT_BASE_URL;
use crate::Result;
use std::env;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OUT_CSV: &str = "data/output/enriched.csv";
pub const DEFAULT_OUT_SUMMARY: &str = "data/output/summary.txt";
pub const DEFAULT_CACHE_PATH: &str = "data/output/sector_cache.json";

/// Connection settings for the chat completions API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub api_key: String,
    pub base_url: String,
}

impl ApiConfig {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                EnrichError::ConfigurationError(format!(
                    "{} not found. Set it in the environment or .env",
                    API_KEY_VAR
                ))
            })?;

        let base_url = lookup(BASE_URL_VAR)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self { api_key, base_url })
    }
}
