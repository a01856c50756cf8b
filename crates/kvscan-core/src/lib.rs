//! Core domain models for kvscan
//!
//! This crate contains:
//! - Raw values and records read from a key-value store
//! - The immutable classification taxonomy (categories and sensitivity tiers)
//! - Matches, extracted credentials and the serializable scan report

pub mod error;
pub mod finding;
pub mod report;
pub mod taxonomy;
pub mod value;

pub use error::{CoreError, Result};
pub use finding::{Credential, CredentialKind, Match};
pub use report::{
    AggregateSnapshot, AnalysisInfo, CategoryMatches, KeywordCount, ScanMode, ScanReport,
    ScanWarning, TierCounts, TierPercentages,
};
pub use taxonomy::{Category, SensitivityTiers, Taxonomy, Tier};
pub use value::{Field, Record, RowOutcome, Value};
