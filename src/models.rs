//! Core data models for the enricher
//!
//! The sector taxonomy is a closed enumeration: any text the model returns
//! either parses into one of its ten labels or is rejected as [`InvalidLabel`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ================= Sector taxonomy =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectorLabel {
    Technology,
    #[serde(rename = "Consumer Cyclical")]
    ConsumerCyclical,
    Industrials,
    Utilities,
    Healthcare,
    Communication,
    Energy,
    #[serde(rename = "Consumer Defensive")]
    ConsumerDefensive,
    #[serde(rename = "Real Estate")]
    RealEstate,
    Financial,
}

impl SectorLabel {
    /// Every label, in the order presented to the model
    pub const ALL: [SectorLabel; 10] = [
        SectorLabel::Technology,
        SectorLabel::ConsumerCyclical,
        SectorLabel::Industrials,
        SectorLabel::Utilities,
        SectorLabel::Healthcare,
        SectorLabel::Communication,
        SectorLabel::Energy,
        SectorLabel::ConsumerDefensive,
        SectorLabel::RealEstate,
        SectorLabel::Financial,
    ];

    /// Assigned when the model cannot be coaxed into a valid label.
    /// Technology is the most common sector in the target universe.
    pub const FALLBACK: SectorLabel = SectorLabel::Technology;

    pub fn as_str(self) -> &'static str {
        match self {
            SectorLabel::Technology => "Technology",
            SectorLabel::ConsumerCyclical => "Consumer Cyclical",
            SectorLabel::Industrials => "Industrials",
            SectorLabel::Utilities => "Utilities",
            SectorLabel::Healthcare => "Healthcare",
            SectorLabel::Communication => "Communication",
            SectorLabel::Energy => "Energy",
            SectorLabel::ConsumerDefensive => "Consumer Defensive",
            SectorLabel::RealEstate => "Real Estate",
            SectorLabel::Financial => "Financial",
        }
    }

    /// Comma-separated label list for prompts
    pub fn taxonomy() -> String {
        Self::ALL
            .iter()
            .map(|label| label.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SectorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text that is not exactly one of the ten sector labels.
///
/// This is an expected outcome of asking a language model for a label,
/// handled locally by the classifier's repair/fallback policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a sector label: {0:?}")]
pub struct InvalidLabel(pub String);

impl FromStr for SectorLabel {
    type Err = InvalidLabel;

    /// Exact match only: no trimming, no case folding
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| InvalidLabel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_every_label() {
        for label in SectorLabel::ALL {
            assert_eq!(label.as_str().parse::<SectorLabel>(), Ok(label));
        }
    }

    #[test]
    fn test_rejects_near_misses() {
        let cases = vec![
            "technology",
            "Technology.",
            " Technology",
            "Tech",
            "Real estate",
            "Sector: Energy",
            "",
        ];

        for c in cases {
            assert_eq!(c.parse::<SectorLabel>(), Err(InvalidLabel(c.to_string())));
        }
    }

    #[test]
    fn test_fallback_is_technology() {
        assert_eq!(SectorLabel::FALLBACK, SectorLabel::Technology);
    }

    #[test]
    fn test_taxonomy_lists_ten_labels() {
        let taxonomy = SectorLabel::taxonomy();
        assert_eq!(taxonomy.split(", ").count(), 10);
        assert!(taxonomy.starts_with("Technology, Consumer Cyclical"));
        assert!(taxonomy.ends_with("Real Estate, Financial"));
    }

    #[test]
    fn test_serializes_as_display_text() {
        let json = serde_json::to_string(&SectorLabel::ConsumerDefensive).unwrap();
        assert_eq!(json, "\"Consumer Defensive\"");

        let label: SectorLabel = serde_json::from_str("\"Real Estate\"").unwrap();
        assert_eq!(label, SectorLabel::RealEstate);
    }
}
