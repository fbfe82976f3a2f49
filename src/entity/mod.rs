pub mod aggregate;
pub mod business_terms;
pub mod canonical;
pub mod dedup;
pub mod matching;
pub mod normalizer;
pub mod similarity;
pub mod types;

pub use types::*;

// Module-level constants
pub const TARGET_ENTITY: &str = "entity";
