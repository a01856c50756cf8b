//! Storage layer for kvscan
//!
//! This crate provides:
//! - Read-only access to SQLite key-value stores (`state.vscdb` and friends)
//! - Schema introspection and paged row retrieval

pub mod db;
pub mod error;

pub use db::SqliteSource;
pub use error::{Result, StorageError};
