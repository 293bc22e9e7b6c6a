//! # adjudicator-runtime
//!
//! Oracle-assisted case processing for workplace-accident claims.
//!
//! `adjudicator-core` decides; this crate gathers what it decides on. It
//! talks to the oracle (document extraction, narrative comparison, condition
//! assessment), persists cases through repository traits and serializes
//! writes per case.
//!
//! ## Error policy
//!
//! - Transient oracle errors are retried with bounded exponential backoff
//! - Unparseable answers are never retried; the raw text is kept on the case
//! - A case whose oracle calls keep failing is closed as `FAILED` with an
//!   automated comment
//! - A withdrawn or deleted case discards the results of a run in flight
//!
//! ## Example
//!
//! ```rust,ignore
//! use adjudicator_runtime::{CasePipeline, InMemoryStore, OracleRegistry, RuntimeConfig, Upload};
//!
//! let config = RuntimeConfig::from_yaml_file("adjudicator.yaml")?;
//! let oracle = OracleRegistry::with_defaults()
//!     .create(&config.oracle.provider, &config.oracle.provider_config())?;
//! let pipeline = CasePipeline::new(oracle, Arc::new(InMemoryStore::new()), &config);
//!
//! let case = pipeline.create_case(Some(subject_id), uploads).await?;
//! let outcome = pipeline.dispatch_processing(case.id).await?;
//! ```

pub mod cache;
pub mod config;
pub mod consistency;
pub mod extractor;
pub mod oracle;
pub mod pipeline;
pub mod prompts;
pub mod qualifier;
pub mod resilience;
pub mod store;

pub use config::{ConfigError, QualificationMode, RuntimeConfig, CONFIG_ENV};
pub use consistency::ConsistencyChecker;
pub use extractor::{DocumentExtractor, Upload};
pub use oracle::{
    OracleClient, OracleDocument, OracleError, OracleFactory, OracleRegistry, OracleRequest,
    OracleResponse, ResilientOracle,
};
pub use pipeline::{CasePipeline, OutcomeStatus, ProcessingOutcome};
pub use qualifier::LegalQualifier;
pub use store::{CaseRepository, FileRepository, InMemoryStore, StoreError, SubjectRepository};

use adjudicator_core::{AdjudicationError, CardError};
use thiserror::Error;

/// Errors from the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Adjudication(#[from] AdjudicationError),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Accident card unavailable: {0}")]
    Card(#[from] CardError),
}

impl From<StoreError> for RuntimeError {
    fn from(err: StoreError) -> Self {
        match err.as_adjudication() {
            Some(adjudication) => RuntimeError::Adjudication(adjudication),
            None => RuntimeError::Store(err),
        }
    }
}

impl RuntimeError {
    /// The pipeline error behind this one, if any.
    pub fn adjudication(&self) -> Option<&AdjudicationError> {
        match self {
            RuntimeError::Adjudication(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adjudicator_core::CaseId;

    #[test]
    fn test_store_conflict_becomes_concurrent_modification() {
        let err = RuntimeError::from(StoreError::Conflict {
            case_id: CaseId::new(),
            expected: 1,
            found: 2,
        });
        assert!(matches!(
            err.adjudication(),
            Some(AdjudicationError::ConcurrentModification { expected: 1, found: 2, .. })
        ));
    }

    #[test]
    fn test_backend_error_stays_a_store_error() {
        let err = RuntimeError::from(StoreError::Backend("connection reset".into()));
        assert!(matches!(err, RuntimeError::Store(_)));
        assert!(err.to_string().contains("connection reset"));
    }
}
