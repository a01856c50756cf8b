use kvscan_core::{Field, Record, SensitivityTiers, Tier, Value};
use serde::{Deserialize, Serialize};

/// Marker placed between the kept head and tail of a long value
pub const LONG_MARKER: &str = "***[SENSITIVE DATA CENSORED]***";

/// Marker for short values, or after the kept head of a medium value
pub const SHORT_MARKER: &str = "***[CENSORED]***";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionInfo {
    pub table: String,
    pub column: String,
    pub original_len: usize,
}

/// Masks fields whose column name contains a high sensitivity keyword
pub struct Redactor {
    keywords: Vec<String>,
}

impl Redactor {
    pub fn new(tiers: &SensitivityTiers) -> Self {
        Self::with_keywords(tiers.keywords(Tier::High).iter())
    }

    pub fn with_keywords<I>(keywords: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn is_sensitive_column(&self, column: &str) -> bool {
        let column = column.to_lowercase();
        self.keywords.iter().any(|k| column.contains(k.as_str()))
    }

    /// Mask a value by length band:
    /// - more than 20 chars keeps the first 10 and the last 5
    /// - 11 to 20 chars keeps the first 5
    /// - 10 chars or fewer keeps nothing
    pub fn mask(value: &str) -> String {
        let chars: Vec<char> = value.chars().collect();
        let len = chars.len();

        if len > 20 {
            let head: String = chars[..10].iter().collect();
            let tail: String = chars[len - 5..].iter().collect();
            format!("{}{}{}", head, LONG_MARKER, tail)
        } else if len > 10 {
            let head: String = chars[..5].iter().collect();
            format!("{}{}", head, SHORT_MARKER)
        } else {
            SHORT_MARKER.to_string()
        }
    }

    /// Produce an export-safe copy of a record's fields.
    ///
    /// Masking follows the column name alone, so a sensitive column is
    /// masked whatever tier its record's values earned. Nulls are never
    /// masked.
    pub fn redact(&self, record: &Record) -> (Vec<Field>, Vec<RedactionInfo>) {
        let mut redactions = Vec::new();
        let fields = record
            .fields
            .iter()
            .map(|field| {
                if field.value.is_null() || !self.is_sensitive_column(&field.name) {
                    return field.clone();
                }

                let text = field.value.as_text().unwrap_or_default();
                redactions.push(RedactionInfo {
                    table: record.table.clone(),
                    column: field.name.clone(),
                    original_len: text.chars().count(),
                });

                Field {
                    name: field.name.clone(),
                    value: Value::Text(Self::mask(&text)),
                }
            })
            .collect();

        (fields, redactions)
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(&SensitivityTiers::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: Vec<Field>) -> Record {
        Record {
            table: "ItemTable".to_string(),
            fields,
        }
    }

    #[test]
    fn test_long_value_keeps_head_and_tail() {
        let redactor = Redactor::default();
        let rec = record(vec![Field::new("token", "abcdefghijklmnopqrstuvwxyz")]);

        let (fields, info) = redactor.redact(&rec);

        assert_eq!(
            fields[0].value,
            Value::from("abcdefghij***[SENSITIVE DATA CENSORED]***vwxyz")
        );
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].column, "token");
        assert_eq!(info[0].original_len, 26);
    }

    #[test]
    fn test_medium_value_keeps_head() {
        assert_eq!(Redactor::mask("abcdefghijklmno"), "abcde***[CENSORED]***");
        assert_eq!(Redactor::mask("abcdefghijklmnopqrst"), "abcde***[CENSORED]***");
    }

    #[test]
    fn test_short_value_fully_masked() {
        assert_eq!(Redactor::mask("abc"), SHORT_MARKER);
        assert_eq!(Redactor::mask("abcdefghij"), SHORT_MARKER);
        assert_eq!(Redactor::mask(""), SHORT_MARKER);
    }

    #[test]
    fn test_multibyte_values_mask_by_chars() {
        let masked = Redactor::mask("ééééééééééééééééééééééé");
        assert!(masked.starts_with("éééééééééé***"));
    }

    #[test]
    fn test_non_sensitive_columns_unchanged() {
        let redactor = Redactor::default();
        let rec = record(vec![
            Field::new("name", "a very long value that would be masked"),
            Field::new("value", "short"),
        ]);

        let (fields, info) = redactor.redact(&rec);

        assert_eq!(fields, rec.fields);
        assert!(info.is_empty());
    }

    #[test]
    fn test_null_passes_through() {
        let redactor = Redactor::default();
        let rec = record(vec![Field::new("password", Value::Null)]);

        let (fields, info) = redactor.redact(&rec);

        assert_eq!(fields[0].value, Value::Null);
        assert!(info.is_empty());
    }

    #[test]
    fn test_sensitive_column_masked_in_low_tier_record() {
        let redactor = Redactor::default();
        let rec = Record {
            table: "accounts".to_string(),
            fields: vec![
                Field::new("login_name", "login-bob"),
                Field::new("password", "hunter2hunter2xyz"),
            ],
        };

        let (fields, info) = redactor.redact(&rec);

        assert_eq!(fields[0].value, Value::from("login-bob"));
        assert_eq!(fields[1].value, Value::from("hunte***[CENSORED]***"));
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].table, "accounts");
        assert_eq!(info[0].column, "password");
    }

    #[test]
    fn test_column_match_is_case_insensitive() {
        let redactor = Redactor::default();
        assert!(redactor.is_sensitive_column("AccessToken"));
        assert!(redactor.is_sensitive_column("KEY"));
        assert!(!redactor.is_sensitive_column("value"));
    }
}
