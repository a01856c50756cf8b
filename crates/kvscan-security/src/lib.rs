//! Export-time masking of sensitive values

pub mod preview;
pub mod redactor;

pub use preview::{PREVIEW_LEN, preview};
pub use redactor::{RedactionInfo, Redactor};
