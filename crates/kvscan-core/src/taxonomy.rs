//! Classification taxonomy
//!
//! A taxonomy is built once at startup and passed explicitly to whatever
//! classifies records. It holds no behavior beyond validation.

use std::collections::HashSet;
use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::{CoreError, Result};

/// Sensitivity tier of a record's content. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl Tier {
    /// Tiers in report order, most sensitive first
    pub const ALL: [Tier; 3] = [Tier::High, Tier::Medium, Tier::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::High => "high",
            Tier::Medium => "medium",
            Tier::Low => "low",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named category: literal keywords plus optional refinement patterns
#[derive(Debug, Clone)]
pub struct Category {
    name: String,
    keywords: Vec<String>,
    patterns: Vec<Regex>,
}

impl Category {
    /// Build a category. Keywords are lowercased and deduplicated in
    /// declaration order; patterns compile case-insensitively.
    pub fn new<K, P>(name: impl Into<String>, keywords: K, patterns: P) -> Result<Self>
    where
        K: IntoIterator,
        K::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::InvalidTaxonomy(
                "category name must not be empty".to_string(),
            ));
        }

        let keywords = normalize_keywords(keywords);
        if keywords.is_empty() {
            return Err(CoreError::InvalidTaxonomy(format!(
                "category '{}' has no keywords",
                name
            )));
        }

        let patterns = patterns
            .into_iter()
            .map(|p| {
                RegexBuilder::new(p.as_ref())
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| CoreError::InvalidPattern {
                        category: name.clone(),
                        pattern: p.as_ref().to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name,
            keywords,
            patterns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowercase keywords in declaration order
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }
}

/// Keyword sets that decide a record's sensitivity tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensitivityTiers {
    high: Vec<String>,
    medium: Vec<String>,
    low: Vec<String>,
}

impl SensitivityTiers {
    /// The three sets must be disjoint.
    pub fn new<I>(high: I, medium: I, low: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let tiers = Self {
            high: normalize_keywords(high),
            medium: normalize_keywords(medium),
            low: normalize_keywords(low),
        };

        let mut seen = HashSet::new();
        for keyword in tiers.high.iter().chain(&tiers.medium).chain(&tiers.low) {
            if !seen.insert(keyword.as_str()) {
                return Err(CoreError::InvalidTaxonomy(format!(
                    "sensitivity keyword '{}' appears in more than one tier",
                    keyword
                )));
            }
        }

        Ok(tiers)
    }

    pub fn keywords(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::High => &self.high,
            Tier::Medium => &self.medium,
            Tier::Low => &self.low,
        }
    }
}

impl Default for SensitivityTiers {
    fn default() -> Self {
        Self {
            high: to_strings(&["token", "password", "key", "secret", "credential"]),
            medium: to_strings(&["userid", "email", "api", "auth"]),
            low: to_strings(&["plan", "status", "mode", "feature"]),
        }
    }
}

/// Immutable set of categories and sensitivity tiers
#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: Vec<Category>,
    tiers: SensitivityTiers,
}

impl Taxonomy {
    pub fn new(categories: Vec<Category>, tiers: SensitivityTiers) -> Result<Self> {
        let mut names = HashSet::new();
        for category in &categories {
            if !names.insert(category.name()) {
                return Err(CoreError::InvalidTaxonomy(format!(
                    "duplicate category '{}'",
                    category.name()
                )));
            }
        }

        Ok(Self { categories, tiers })
    }

    /// Categories in declaration order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn tiers(&self) -> &SensitivityTiers {
        &self.tiers
    }

    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }
}

fn normalize_keywords<I>(keywords: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for keyword in keywords {
        let keyword = keyword.as_ref().trim().to_lowercase();
        if !keyword.is_empty() && !out.contains(&keyword) {
            out.push(keyword);
        }
    }
    out
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::High > Tier::Medium);
        assert!(Tier::Medium > Tier::Low);
        assert_eq!(Tier::High.to_string(), "high");
    }

    #[test]
    fn test_category_normalizes_keywords() {
        let category =
            Category::new("auth", ["Token", "token", " Bearer ", ""], Vec::<String>::new())
                .unwrap();
        assert_eq!(category.keywords(), &["token", "bearer"]);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = Category::new("broken", ["x"], ["(unclosed"]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPattern { .. }));
    }

    #[test]
    fn test_patterns_are_case_insensitive() {
        let category = Category::new("auth", ["token"], [r"auth.*token"]).unwrap();
        assert!(category.patterns()[0].is_match("AUTH_TOKEN"));
    }

    #[test]
    fn test_overlapping_tiers_rejected() {
        let err = SensitivityTiers::new(vec!["auth"], vec!["auth"], vec![]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTaxonomy(_)));
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let a = Category::new("dup", ["a"], Vec::<String>::new()).unwrap();
        let b = Category::new("dup", ["b"], Vec::<String>::new()).unwrap();
        assert!(Taxonomy::new(vec![a, b], SensitivityTiers::default()).is_err());
    }
}
