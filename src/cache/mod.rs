//! Classification cache
//!
//! Maps `"{name}|{symbol}"` to a previously assigned sector so that reruns
//! skip the model for companies already classified. Keys are taken verbatim:
//! no case or whitespace normalization.

pub mod store;

pub use store::{CacheStore, InMemoryCacheStore, JsonFileCacheStore};

use crate::models::SectorLabel;
use crate::Result;
use std::collections::BTreeMap;
use tracing::warn;

const KEY_SEPARATOR: char = '|';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationCache {
    entries: BTreeMap<String, SectorLabel>,
}

impl ClassificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(name: &str, symbol: &str) -> String {
        format!("{}{}{}", name, KEY_SEPARATOR, symbol)
    }

    pub fn get(&self, name: &str, symbol: &str) -> Option<SectorLabel> {
        self.entries.get(&Self::key(name, symbol)).copied()
    }

    pub fn put(&mut self, name: &str, symbol: &str, label: SectorLabel) {
        self.entries.insert(Self::key(name, symbol), label);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SectorLabel)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Parse a flat JSON object of key → label.
    ///
    /// Entries whose value is not a sector label are dropped.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)?;

        let mut entries = BTreeMap::new();
        for (key, value) in raw {
            match value.parse::<SectorLabel>() {
                Ok(label) => {
                    entries.insert(key, label);
                }
                Err(e) => warn!(key = %key, "Dropping cache entry: {}", e),
            }
        }

        Ok(Self { entries })
    }

    /// Pretty-printed JSON object, keys sorted
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}
