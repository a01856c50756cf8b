//! Serializable result of one scan run
//!
//! Renderers consume [`ScanReport`]; the JSON form is lossless, other
//! formats may summarize.

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Credential, Match, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Quick,
    Full,
}

/// A non-fatal problem met during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWarning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub message: String,
}

impl ScanWarning {
    pub fn table(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TierCounts {
    pub fn add(&mut self, tier: Tier) {
        *self.get_mut(tier) += 1;
    }

    pub fn get(&self, tier: Tier) -> usize {
        match tier {
            Tier::High => self.high,
            Tier::Medium => self.medium,
            Tier::Low => self.low,
        }
    }

    fn get_mut(&mut self, tier: Tier) -> &mut usize {
        match tier {
            Tier::High => &mut self.high,
            Tier::Medium => &mut self.medium,
            Tier::Low => &mut self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TierPercentages {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl TierPercentages {
    pub fn get(&self, tier: Tier) -> f64 {
        match tier {
            Tier::High => self.high,
            Tier::Medium => self.medium,
            Tier::Low => self.low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}

/// Summary statistics over every accepted match
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateSnapshot {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub category_percent: BTreeMap<String, f64>,
    pub category_sensitivity: BTreeMap<String, TierCounts>,
    pub by_sensitivity: TierCounts,
    pub sensitivity_percent: TierPercentages,
    /// Most frequent keywords, highest count first
    #[serde(serialize_with = "serialize_keyword_counts")]
    pub top_keywords: Vec<KeywordCount>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pattern_hits: BTreeMap<String, BTreeMap<String, usize>>,
}

fn serialize_keyword_counts<S: Serializer>(
    counts: &[KeywordCount],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(counts.len()))?;
    for entry in counts {
        map.serialize_entry(&entry.keyword, &entry.count)?;
    }
    map.end()
}

/// Matches of one category, in scan order
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMatches {
    pub name: String,
    pub matches: Vec<Match>,
}

fn serialize_categories<S: Serializer>(
    categories: &[CategoryMatches],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(categories.len()))?;
    for category in categories {
        map.serialize_entry(&category.name, &category.matches)?;
    }
    map.end()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisInfo {
    pub run_id: String,
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_hash: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub analyzed_at: OffsetDateTime,
    pub mode: ScanMode,
    pub batch_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    pub tables_scanned: Vec<String>,
    pub rows_scanned: usize,
    pub elapsed_ms: u64,
}

/// Everything one scan produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub info: AnalysisInfo,
    #[serde(serialize_with = "serialize_categories")]
    pub categories: Vec<CategoryMatches>,
    pub aggregate: AggregateSnapshot,
    pub credentials: Vec<Credential>,
    pub warnings: Vec<ScanWarning>,
    pub notices: Vec<String>,
    /// Set when the result cap stopped the scan early
    pub truncated: bool,
}

impl ScanReport {
    pub fn is_empty(&self) -> bool {
        self.aggregate.total == 0
    }

    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.categories.iter().flat_map(|c| c.matches.iter())
    }

    pub fn category(&self, name: &str) -> Option<&CategoryMatches> {
        self.categories.iter().find(|c| c.name == name)
    }
}
