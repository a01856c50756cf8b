pub mod handler;
pub mod memory;
pub mod scan;

pub use handler::{RecordSource, SourceInfo};
pub use memory::MemorySource;
pub use scan::TableScan;
