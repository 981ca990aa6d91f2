//! Sector Classifier
//!
//! Assigns each company exactly one label from the sector taxonomy:
//! - Cache hit: return the stored label, no model call
//! - Otherwise ask the model; if the answer is not a label, ask once more
//!   with a stricter prompt; if that also fails, assign the fallback label
//!
//! A bad model answer never fails a row. Transport failures that outlast the
//! retry policy do propagate.

use crate::cache::ClassificationCache;
use crate::llm::{ChatModel, ChatRequest, RetryPolicy};
use crate::models::SectorLabel;
use crate::Result;
use tracing::{debug, warn};

/// Where a row's label came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    Cached,
    /// Valid on the first request
    Model,
    /// Valid on the stricter second request
    Repaired,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub label: SectorLabel,
    pub source: LabelSource,
}

pub fn classification_system_prompt() -> String {
    format!(
        "You are a careful classifier. Given a public company name and ticker, \
         return ONLY one sector label from this exact set: {}.",
        SectorLabel::taxonomy()
    )
}

pub fn classification_prompt(name: &str, symbol: &str) -> String {
    format!(
        "Company: {} (Ticker: {}). Return only one of: {}.",
        name,
        symbol,
        SectorLabel::taxonomy()
    )
}

pub fn strict_classification_prompt(name: &str, symbol: &str) -> String {
    format!(
        "Return only the sector label (no punctuation). Company: {} (Ticker: {}).",
        name, symbol
    )
}

pub struct SectorClassifier<'a> {
    model: &'a dyn ChatModel,
    retry: RetryPolicy,
    temperature: f32,
    system_prompt: String,
}

impl<'a> SectorClassifier<'a> {
    pub fn new(model: &'a dyn ChatModel, retry: RetryPolicy) -> Self {
        Self {
            model,
            retry,
            temperature: 0.0,
            system_prompt: classification_system_prompt(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Classify one company, consulting and updating `cache`
    pub async fn classify(
        &self,
        cache: &mut ClassificationCache,
        name: &str,
        symbol: &str,
    ) -> Result<Classification> {
        if let Some(label) = cache.get(name, symbol) {
            debug!(symbol = %symbol, label = %label, "Sector cache hit");
            return Ok(Classification {
                label,
                source: LabelSource::Cached,
            });
        }

        let first = self.ask(classification_prompt(name, symbol)).await?;

        let classification = match first.parse::<SectorLabel>() {
            Ok(label) => Classification {
                label,
                source: LabelSource::Model,
            },
            Err(invalid) => {
                debug!(symbol = %symbol, "{}; asking again", invalid);

                let second = self.ask(strict_classification_prompt(name, symbol)).await?;
                match second.parse::<SectorLabel>() {
                    Ok(label) => Classification {
                        label,
                        source: LabelSource::Repaired,
                    },
                    Err(invalid) => {
                        warn!(
                            symbol = %symbol,
                            name = %name,
                            fallback = %SectorLabel::FALLBACK,
                            "{}; using fallback",
                            invalid
                        );
                        Classification {
                            label: SectorLabel::FALLBACK,
                            source: LabelSource::Fallback,
                        }
                    }
                }
            }
        };

        cache.put(name, symbol, classification.label);
        Ok(classification)
    }

    async fn ask(&self, user: String) -> Result<String> {
        let request = ChatRequest::new(self.system_prompt.as_str(), user, self.temperature);
        let model = self.model;
        let request = &request;

        Ok(self.retry.run(move || model.complete(request)).await?)
    }
}
