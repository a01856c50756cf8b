//! Incremental bookkeeping over classifier output

use std::collections::BTreeMap;

use kvscan_core::{
    AggregateSnapshot, CategoryMatches, KeywordCount, Match, Taxonomy, TierCounts,
    TierPercentages,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    Empty,
    Accumulating,
    Finalized,
}

/// Collects matches into per-category buckets and keeps running counts.
///
/// Counts are updated on every [`Aggregator::record`] call and never
/// recomputed; [`Aggregator::snapshot`] only derives percentages and the
/// keyword ranking from them.
pub struct Aggregator {
    buckets: Vec<CategoryMatches>,
    by_sensitivity: TierCounts,
    category_sensitivity: BTreeMap<String, TierCounts>,
    keywords: BTreeMap<String, usize>,
    pattern_hits: BTreeMap<String, BTreeMap<String, usize>>,
    total: usize,
    top_keywords: usize,
    state: AggregatorState,
}

impl Aggregator {
    /// Buckets are pre-created for every category so the report lists them
    /// in taxonomy order, empty ones included. Counts only cover categories
    /// with at least one match.
    pub fn new(taxonomy: &Taxonomy, top_keywords: usize) -> Self {
        let buckets = taxonomy
            .categories()
            .iter()
            .map(|c| CategoryMatches {
                name: c.name().to_string(),
                matches: Vec::new(),
            })
            .collect();

        Self {
            buckets,
            by_sensitivity: TierCounts::default(),
            category_sensitivity: BTreeMap::new(),
            keywords: BTreeMap::new(),
            pattern_hits: BTreeMap::new(),
            total: 0,
            top_keywords,
            state: AggregatorState::Empty,
        }
    }

    pub fn state(&self) -> AggregatorState {
        self.state
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Whether any accepted match carried `keyword`
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.contains_key(keyword)
    }

    pub fn record(&mut self, m: Match) {
        self.total += 1;
        self.by_sensitivity.add(m.sensitivity);
        self.category_sensitivity
            .entry(m.category.clone())
            .or_default()
            .add(m.sensitivity);

        for keyword in &m.matched_keywords {
            *self.keywords.entry(keyword.clone()).or_default() += 1;
        }
        if !m.matched_patterns.is_empty() {
            let hits = self.pattern_hits.entry(m.category.clone()).or_default();
            for pattern in &m.matched_patterns {
                *hits.entry(pattern.clone()).or_default() += 1;
            }
        }

        match self.buckets.iter_mut().find(|b| b.name == m.category) {
            Some(bucket) => bucket.matches.push(m),
            None => self.buckets.push(CategoryMatches {
                name: m.category.clone(),
                matches: vec![m],
            }),
        }

        self.state = AggregatorState::Accumulating;
    }

    pub fn snapshot(&mut self) -> AggregateSnapshot {
        self.state = AggregatorState::Finalized;

        let by_category: BTreeMap<String, usize> = self
            .buckets
            .iter()
            .filter(|b| !b.matches.is_empty())
            .map(|b| (b.name.clone(), b.matches.len()))
            .collect();

        let category_percent = by_category
            .iter()
            .map(|(name, count)| (name.clone(), percent(*count, self.total)))
            .collect();

        let sensitivity_percent = TierPercentages {
            high: percent(self.by_sensitivity.high, self.total),
            medium: percent(self.by_sensitivity.medium, self.total),
            low: percent(self.by_sensitivity.low, self.total),
        };

        let mut ranked: Vec<KeywordCount> = self
            .keywords
            .iter()
            .map(|(keyword, count)| KeywordCount {
                keyword: keyword.clone(),
                count: *count,
            })
            .collect();
        // Stable sort over a keyword-ordered map: ties stay alphabetical
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(self.top_keywords);

        AggregateSnapshot {
            total: self.total,
            by_category,
            category_percent,
            category_sensitivity: self.category_sensitivity.clone(),
            by_sensitivity: self.by_sensitivity,
            sensitivity_percent,
            top_keywords: ranked,
            pattern_hits: self.pattern_hits.clone(),
        }
    }

    pub fn into_categories(self) -> Vec<CategoryMatches> {
        self.buckets
    }
}

/// Share of `part` in `total` as a percentage, 0 when `total` is 0
fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = part as f64 * 100.0 / total as f64;
    (raw * 10.0).round() / 10.0
}
