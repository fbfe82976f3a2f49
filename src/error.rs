use thiserror::Error;

/// Failures that abort a resolution run.
///
/// Degenerate data (names that normalize to nothing, identifiers that
/// truncate to nothing) is not an error; it flows through as low-quality keys.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("canonical universe is empty, no record can be matched")]
    EmptyCanonicalUniverse,

    #[error("identifier '{identifier}' is shorter than {min_len} characters after whitespace removal")]
    IdentifierTooShort { identifier: String, min_len: usize },

    #[error("input is missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
