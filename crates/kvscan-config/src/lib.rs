use std::path::{Path, PathBuf};

use anyhow::Context;
use kvscan_core::{Category, SensitivityTiers, Taxonomy};
use serde::{Deserialize, Serialize};

/// Configuration for kvscan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub sensitivity: SensitivityConfig,

    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Rows fetched per page
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Result cap applied by quick mode
    #[serde(default = "default_quick_max_results")]
    pub quick_max_results: usize,

    /// Result cap in full mode, 0 = unlimited
    #[serde(default)]
    pub max_results: usize,

    #[serde(default = "default_top_keywords")]
    pub top_keywords: usize,

    #[serde(default = "default_true")]
    pub analyze_patterns: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub include_sensitive: bool,

    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityConfig {
    #[serde(default = "default_high")]
    pub high: Vec<String>,

    #[serde(default = "default_medium")]
    pub medium: Vec<String>,

    #[serde(default = "default_low")]
    pub low: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,

    pub keywords: Vec<String>,

    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            export: ExportConfig::default(),
            sensitivity: SensitivityConfig::default(),
            taxonomy: TaxonomyConfig::default(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            quick_max_results: default_quick_max_results(),
            max_results: 0,
            top_keywords: default_top_keywords(),
            analyze_patterns: true,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            include_sensitive: false,
            formats: default_formats(),
        }
    }
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            high: default_high(),
            medium: default_medium(),
            low: default_low(),
        }
    }
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
        }
    }
}

fn default_batch_size() -> usize {
    500
}

fn default_quick_max_results() -> usize {
    1000
}

fn default_top_keywords() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("analysis_output")
}

fn default_formats() -> Vec<String> {
    strings(&["json", "csv", "txt", "html"])
}

fn default_high() -> Vec<String> {
    strings(&["token", "password", "key", "secret", "credential"])
}

fn default_medium() -> Vec<String> {
    strings(&["userid", "email", "api", "auth"])
}

fn default_low() -> Vec<String> {
    strings(&["plan", "status", "mode", "feature"])
}

fn default_categories() -> Vec<CategoryConfig> {
    vec![
        category(
            "authentication",
            &[
                "token",
                "auth",
                "login",
                "logout",
                "credential",
                "password",
                "session",
                "bearer",
            ],
            &[
                r"auth.*token",
                r"access.*token",
                r"refresh.*token",
                r"auth.*key",
                r"api.*key",
                r"bearer",
            ],
        ),
        category(
            "subscription",
            &[
                "pro",
                "plan",
                "subscription",
                "trial",
                "premium",
                "paid",
                "billing",
            ],
            &[
                r"pro.*plan",
                r"pro.*trial",
                r"trial.*end",
                r"plan.*type",
                r"membership",
                r"upgrade",
                r"downgrade",
            ],
        ),
        category(
            "ai_features",
            &["max mode", "ai", "model", "chat", "composer", "copilot"],
            &[
                r"max.*mode",
                r"ai.*model",
                r"chat.*model",
                r"code.*generation",
                r"ai.*feature",
            ],
        ),
        category(
            "account_status",
            &[
                "status", "active", "inactive", "enabled", "disabled", "banned",
            ],
            &[r"account.*status", r"user.*status", r"suspended"],
        ),
        category(
            "blackbox_specific",
            &["blackbox", "blackboxai", "blackboxapp"],
            &[
                r"blackbox.*agent",
                r"blackbox.*auth",
                r"blackbox.*user",
                r"blackbox.*api",
                r"blackbox.*key",
                r"blackbox.*pro",
            ],
        ),
        category(
            "usage_limits",
            &["limit", "quota", "usage", "remaining", "consumed"],
            &[
                r"usage.*limit",
                r"remaining.*usage",
                r"rate.*limit",
                r"api.*limit",
            ],
        ),
    ]
}

fn category(name: &str, keywords: &[&str], patterns: &[&str]) -> CategoryConfig {
    CategoryConfig {
        name: name.to_string(),
        keywords: strings(keywords),
        patterns: strings(patterns),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            Self::load_from(&path)
        } else {
            // Create default config file
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(&path, content)?;
            Ok(config)
        }
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "kvscan", "kvscan") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.kvscan/config.toml")
        }
    }

    /// Replace the taxonomy with a single `custom` category built from
    /// free-text keywords. Patterns are not used for ad-hoc searches.
    pub fn with_custom_keywords(mut self, keywords: Vec<String>) -> Self {
        self.taxonomy.categories = vec![CategoryConfig {
            name: "custom".to_string(),
            keywords,
            patterns: Vec::new(),
        }];
        self
    }

    /// Compile the immutable taxonomy
    pub fn taxonomy(&self) -> anyhow::Result<Taxonomy> {
        let tiers = SensitivityTiers::new(
            &self.sensitivity.high,
            &self.sensitivity.medium,
            &self.sensitivity.low,
        )?;

        let categories = self
            .taxonomy
            .categories
            .iter()
            .map(|c| Category::new(c.name.clone(), &c.keywords, &c.patterns))
            .collect::<kvscan_core::Result<Vec<_>>>()?;

        Ok(Taxonomy::new(categories, tiers)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scan.batch_size, 500);
        assert_eq!(config.scan.quick_max_results, 1000);
        assert!(!config.export.include_sensitive);
        assert_eq!(config.taxonomy.categories.len(), 6);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.scan.batch_size, config.scan.batch_size);
        assert_eq!(parsed.taxonomy.categories, config.taxonomy.categories);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml_str = r#"
[scan]
batch_size = 50

[[taxonomy.categories]]
name = "editor"
keywords = ["cursor", "vscode"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scan.batch_size, 50);
        assert_eq!(config.scan.top_keywords, 10);
        assert_eq!(config.taxonomy.categories.len(), 1);
        assert!(config.taxonomy.categories[0].patterns.is_empty());
        assert_eq!(config.sensitivity.high, default_high());
    }

    #[test]
    fn test_default_taxonomy_compiles_in_order() {
        let taxonomy = Config::default().taxonomy().unwrap();
        assert_eq!(
            taxonomy.category_names(),
            vec![
                "authentication",
                "subscription",
                "ai_features",
                "account_status",
                "blackbox_specific",
                "usage_limits",
            ]
        );
    }

    #[test]
    fn test_invalid_pattern_fails_taxonomy() {
        let mut config = Config::default();
        config.taxonomy.categories[0].patterns.push("(".to_string());
        assert!(config.taxonomy().is_err());
    }

    #[test]
    fn test_custom_keywords() {
        let config = Config::default().with_custom_keywords(vec!["cursor".to_string()]);
        let taxonomy = config.taxonomy().unwrap();
        assert_eq!(taxonomy.category_names(), vec!["custom"]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[export]\ninclude_sensitive = true\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.export.include_sensitive);
        assert_eq!(config.export.formats, default_formats());
    }
}
