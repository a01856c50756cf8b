//! Classification engine
//!
//! Records flow through the [`Classifier`] into the [`Aggregator`]; the
//! [`Scanner`] drives that loop over a [`kvscan_sources::RecordSource`]
//! and assembles the final [`kvscan_core::ScanReport`].

pub mod aggregator;
pub mod classifier;
pub mod extractor;
pub mod scanner;

pub use aggregator::{Aggregator, AggregatorState};
pub use classifier::Classifier;
pub use extractor::CredentialExtractor;
pub use scanner::{ScanOptions, Scanner};
