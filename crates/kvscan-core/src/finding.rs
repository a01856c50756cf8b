use serde::{Deserialize, Serialize, Serializer};

use crate::value::{Record, serialize_fields};
use crate::Tier;

/// A record classified into one category, with its evidence.
///
/// A record that matches several categories yields one `Match` per
/// category; each carries its own copy of the record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    #[serde(rename = "source_table")]
    pub table: String,
    pub category: String,
    pub matched_keywords: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matched_patterns: Vec<String>,
    pub sensitivity: Tier,
    #[serde(rename = "data", serialize_with = "serialize_record")]
    pub record: Record,
}

fn serialize_record<S: Serializer>(record: &Record, serializer: S) -> Result<S::Ok, S::Error> {
    serialize_fields(&record.fields, serializer)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Token,
    ApiKey,
    UserId,
    Subscription,
    AccountStatus,
}

impl CredentialKind {
    pub const ALL: [CredentialKind; 5] = [
        CredentialKind::Token,
        CredentialKind::ApiKey,
        CredentialKind::UserId,
        CredentialKind::Subscription,
        CredentialKind::AccountStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Token => "token",
            CredentialKind::ApiKey => "api_key",
            CredentialKind::UserId => "user_id",
            CredentialKind::Subscription => "subscription",
            CredentialKind::AccountStatus => "account_status",
        }
    }
}

/// A key found inside a record whose name looks credential-like.
///
/// `value_preview` is truncated for display only and is not a redaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub key: String,
    pub value_preview: String,
    pub table: String,
    #[serde(rename = "type")]
    pub kind: CredentialKind,
}
