use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::entity::business_terms::{BusinessTerms, TermPositions, DEFAULT_BUSINESS_TERMS};
use crate::entity::normalizer::normalize;
use crate::entity::similarity::SimilarityMetric;
use crate::environment::{get_env_var, get_env_var_as_vec, get_env_var_parsed};
use crate::error::{ResolveError, Result};
use crate::TARGET_PIPELINE;

pub const ENV_NAME_COLUMN: &str = "COALESCE_NAME_COLUMN";
pub const ENV_IDENTIFIER_COLUMN: &str = "COALESCE_IDENTIFIER_COLUMN";
pub const ENV_INVALID_SENTINEL: &str = "COALESCE_INVALID_SENTINEL";
pub const ENV_ENTITY_COLUMN: &str = "COALESCE_ENTITY_COLUMN";
pub const ENV_EXTRA_BUSINESS_TERMS: &str = "COALESCE_EXTRA_BUSINESS_TERMS";
pub const ENV_THREADS: &str = "COALESCE_THREADS";

/// Which key of a record is scored against the canonical universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum QueryKey {
    /// Normalized name with legal form, plus the untruncated identifier
    #[default]
    Full,
    /// Same shape as the universe: stripped name plus truncated identifier
    Candidate,
}

/// How the matcher walks the canonical universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Score every candidate
    BruteForce,
    /// Skip candidates whose score bound cannot win; same result as brute force
    #[default]
    Pruned,
}

/// Settings shared by every pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub name_column: String,
    pub identifier_column: String,
    pub invalid_sentinel: String,
    pub entity_column: String,
    pub business_terms: Vec<String>,
    pub term_positions: TermPositions,
    pub query_key: QueryKey,
    pub metric: SimilarityMetric,
    pub strategy: MatchStrategy,
    pub threads: Option<usize>,
    pub strict_identifiers: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            name_column: "name".to_string(),
            identifier_column: "iban".to_string(),
            invalid_sentinel: "INVALID".to_string(),
            entity_column: "company".to_string(),
            business_terms: DEFAULT_BUSINESS_TERMS.iter().map(|t| t.to_string()).collect(),
            term_positions: TermPositions::default(),
            query_key: QueryKey::default(),
            metric: SimilarityMetric::default(),
            strategy: MatchStrategy::default(),
            threads: None,
            strict_identifiers: false,
        }
    }
}

impl ResolverConfig {
    /// Load a JSON config file; absent fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: ResolverConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Overlay `COALESCE_*` environment variables.
    pub fn with_env(mut self) -> Result<Self> {
        if let Some(value) = get_env_var(ENV_NAME_COLUMN) {
            self.name_column = value;
        }
        if let Some(value) = get_env_var(ENV_IDENTIFIER_COLUMN) {
            self.identifier_column = value;
        }
        if let Some(value) = get_env_var(ENV_INVALID_SENTINEL) {
            self.invalid_sentinel = value;
        }
        if let Some(value) = get_env_var(ENV_ENTITY_COLUMN) {
            self.entity_column = value;
        }

        let extra_terms = get_env_var_as_vec(ENV_EXTRA_BUSINESS_TERMS, ',');
        if !extra_terms.is_empty() {
            debug!(
                target: TARGET_PIPELINE,
                "Adding {} business terms from {}", extra_terms.len(), ENV_EXTRA_BUSINESS_TERMS
            );
            self.business_terms.extend(extra_terms);
        }

        if let Some(threads) =
            get_env_var_parsed::<usize>(ENV_THREADS).map_err(ResolveError::InvalidConfig)?
        {
            self.threads = Some(threads);
        }

        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name_column.trim().is_empty() {
            return Err(ResolveError::InvalidConfig("name_column must not be empty".into()));
        }
        if self.identifier_column.trim().is_empty() {
            return Err(ResolveError::InvalidConfig(
                "identifier_column must not be empty".into(),
            ));
        }
        if self.name_column == self.identifier_column {
            return Err(ResolveError::InvalidConfig(format!(
                "name_column and identifier_column are both '{}'",
                self.name_column
            )));
        }
        if self.entity_column.trim().is_empty() {
            return Err(ResolveError::InvalidConfig("entity_column must not be empty".into()));
        }
        if let Some(term) = self.business_terms.iter().find(|t| normalize(t).is_empty()) {
            return Err(ResolveError::InvalidConfig(format!(
                "business term '{term}' is empty after normalization"
            )));
        }
        if self.threads == Some(0) {
            return Err(ResolveError::InvalidConfig("threads must be at least 1".into()));
        }
        Ok(())
    }

    /// Compile the configured lexicon.
    pub fn lexicon(&self) -> BusinessTerms {
        BusinessTerms::new(&self.business_terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ResolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.invalid_sentinel, "INVALID");
        assert_eq!(config.strategy, MatchStrategy::Pruned);
        assert_eq!(config.query_key, QueryKey::Full);
        assert!(config.lexicon().len() > 50);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"name_column": "company_name", "metric": "jaro_winkler", "business_terms": ["gmbh"]}}"#
        )
        .unwrap();

        let config = ResolverConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.name_column, "company_name");
        assert_eq!(config.identifier_column, "iban");
        assert_eq!(config.metric, SimilarityMetric::JaroWinkler);
        assert_eq!(config.lexicon().len(), 1);
        assert!(config.term_positions.suffix);
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"strategy": "fastest"}}"#).unwrap();
        assert!(matches!(
            ResolverConfig::from_json_file(file.path()),
            Err(ResolveError::Json(_))
        ));
    }

    #[test]
    fn test_validation_errors() {
        let config = ResolverConfig {
            identifier_column: "name".into(),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("both 'name'"));

        let config = ResolverConfig {
            business_terms: vec!["gmbh".into(), "..".into()],
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("'..'"));

        let config = ResolverConfig {
            threads: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overlay() {
        std::env::set_var(ENV_INVALID_SENTINEL, "XX");
        std::env::set_var(ENV_EXTRA_BUSINESS_TERMS, "holding, group");
        let config = ResolverConfig::default().with_env().unwrap();
        std::env::remove_var(ENV_INVALID_SENTINEL);
        std::env::remove_var(ENV_EXTRA_BUSINESS_TERMS);

        assert_eq!(config.invalid_sentinel, "XX");
        assert!(config.business_terms.iter().any(|t| t == "holding"));
        assert!(config.business_terms.iter().any(|t| t == "group"));
    }
}
