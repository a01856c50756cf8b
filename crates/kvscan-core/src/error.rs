use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid pattern '{pattern}' in category '{category}': {source}")]
    InvalidPattern {
        category: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid taxonomy: {0}")]
    InvalidTaxonomy(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
