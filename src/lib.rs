pub mod config;
pub mod entity;
pub mod environment;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod table;

pub use config::{MatchStrategy, QueryKey, ResolverConfig};
pub use entity::similarity::SimilarityMetric;
pub use error::{ResolveError, Result};

pub const TARGET_PIPELINE: &str = "pipeline";
pub const TARGET_IO: &str = "io";
