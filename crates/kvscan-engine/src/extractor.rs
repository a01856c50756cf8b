//! Credential-like keys inside structured values

use kvscan_core::{Credential, CredentialKind, Record};
use kvscan_security::preview;

/// Key-name fragments per credential kind, checked in this order
const KEY_GROUPS: [(CredentialKind, &[&str]); 5] = [
    (CredentialKind::Token, &["token", "access", "refresh", "bearer"]),
    (CredentialKind::ApiKey, &["api", "key", "secret"]),
    (CredentialKind::UserId, &["userid", "user_id", "uid"]),
    (
        CredentialKind::Subscription,
        &["plan", "subscription", "trial", "premium", "pro"],
    ),
    (
        CredentialKind::AccountStatus,
        &["status", "active", "enabled"],
    ),
];

/// Column-name checks for values that are not structured documents
const COLUMN_GROUPS: [(CredentialKind, &[&str]); 2] = [
    (CredentialKind::Token, &["token", "access", "refresh"]),
    (CredentialKind::UserId, &["userid", "user_id"]),
];

pub struct CredentialExtractor;

impl CredentialExtractor {
    /// Walk every JSON-looking field of a record and collect keys whose
    /// name falls into a credential kind. Other fields are checked by
    /// column name only.
    pub fn extract(record: &Record) -> Vec<Credential> {
        let mut found = Vec::new();

        for field in &record.fields {
            if let Some(document) = field.value.as_structured() {
                walk(&document, &record.table, &mut found);
            } else if let Some(text) = field.value.as_text() {
                if let Some(kind) = classify(&field.name, &COLUMN_GROUPS) {
                    found.push(Credential {
                        key: field.name.clone(),
                        value_preview: preview(&text),
                        table: record.table.clone(),
                        kind,
                    });
                }
            }
        }

        found
    }
}

/// A key that classifies is reported with its whole value; nested
/// documents are only descended into under keys that did not classify.
fn walk(value: &serde_json::Value, table: &str, found: &mut Vec<Credential>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                if let Some(kind) = classify(key, &KEY_GROUPS) {
                    found.push(Credential {
                        key: key.clone(),
                        value_preview: preview(&render(child)),
                        table: table.to_string(),
                        kind,
                    });
                } else if child.is_object() || child.is_array() {
                    walk(child, table, found);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                walk(item, table, found);
            }
        }
        _ => {}
    }
}

fn classify(name: &str, groups: &[(CredentialKind, &[&str])]) -> Option<CredentialKind> {
    let name = name.to_lowercase();
    groups
        .iter()
        .find(|(_, fragments)| fragments.iter().any(|f| name.contains(f)))
        .map(|(kind, _)| *kind)
}

fn render(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
