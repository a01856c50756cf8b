use std::sync::Arc;

use kvscan_core::{Category, Match, Record, SensitivityTiers, Taxonomy, Tier};

/// Assigns records to taxonomy categories.
///
/// A record matches a category when any of its non-empty field values
/// contains any of the category's keywords (case-insensitive). Regex
/// patterns only annotate a match; they never create or remove one.
pub struct Classifier {
    taxonomy: Arc<Taxonomy>,
    analyze_patterns: bool,
}

impl Classifier {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self {
            taxonomy,
            analyze_patterns: true,
        }
    }

    pub fn with_patterns(mut self, enabled: bool) -> Self {
        self.analyze_patterns = enabled;
        self
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// One match per category the record hits, in taxonomy order
    pub fn classify(&self, record: &Record) -> Vec<Match> {
        let values: Vec<String> = record
            .fields
            .iter()
            .filter_map(|f| f.value.as_text())
            .map(|t| t.to_lowercase())
            .collect();

        if values.is_empty() {
            return Vec::new();
        }

        let text = values.join(" ");

        self.taxonomy
            .categories()
            .iter()
            .filter_map(|category| {
                let matched_keywords = matched_keywords(category, &values);
                if matched_keywords.is_empty() {
                    return None;
                }

                let matched_patterns = if self.analyze_patterns {
                    category
                        .patterns()
                        .iter()
                        .filter(|p| p.is_match(&text))
                        .map(|p| p.as_str().to_string())
                        .collect()
                } else {
                    Vec::new()
                };

                Some(Match {
                    table: record.table.clone(),
                    category: category.name().to_string(),
                    matched_keywords,
                    matched_patterns,
                    sensitivity: sensitivity(self.taxonomy.tiers(), &text),
                    record: record.clone(),
                })
            })
            .collect()
    }
}

fn matched_keywords(category: &Category, values: &[String]) -> Vec<String> {
    category
        .keywords()
        .iter()
        .filter(|k| values.iter().any(|v| v.contains(k.as_str())))
        .cloned()
        .collect()
}

/// First tier with a keyword in `text`, checked high before medium
fn sensitivity(tiers: &SensitivityTiers, text: &str) -> Tier {
    for tier in [Tier::High, Tier::Medium] {
        if tiers.keywords(tier).iter().any(|k| text.contains(k.as_str())) {
            return tier;
        }
    }
    Tier::Low
}
