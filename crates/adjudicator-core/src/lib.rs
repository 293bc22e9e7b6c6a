//! # adjudicator-core
//!
//! Deterministic adjudication engine for workplace-accident insurance claims.
//!
//! This crate holds everything about a claim that can be decided without
//! talking to the outside world:
//! - decoding and schema validation of oracle responses
//! - the statutory five-condition test and PKD match scoring
//! - cross-document consistency aggregation
//! - the case lifecycle state machine
//! - accident card generation
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same input and policy always produce the same decision
//! 2. **No oracle calls**: the runtime crate does all I/O
//! 3. **Nothing invented**: absent facts stay `Unknown` or render as placeholders
//! 4. **Forward-only lifecycle**: terminal cases reject every further transition
//!
//! ## Example
//!
//! ```rust,ignore
//! use adjudicator_core::{QualificationInput, Qualifier};
//!
//! let input: QualificationInput = serde_json::from_str(body)?;
//! let result = Qualifier::default().qualify(&input)?;
//!
//! if result.should_accept {
//!     println!("ACCEPT ({}%): {}", result.pkd_probability, result.short_explanation);
//! } else {
//!     println!("REJECT: {}\n{}", result.short_explanation, result.notes);
//! }
//! ```

pub mod api;
pub mod card;
pub mod case;
pub mod consistency;
pub mod criteria;
pub mod error;
pub mod pkd;
pub mod qualifier;
pub mod response;
pub mod types;

// Re-export main types at crate root
pub use api::{ConsistencyRequest, DecisionRequest, ExtractionResponse};
pub use card::{generate as generate_card, AccidentCard, CardConfig, CardError, CardField, CardSource};
pub use case::{Case, CaseAnalysis};
pub use criteria::{
    evaluate_all, ConditionFinding, ConditionFindings, ConditionRule, FindingSource,
    StatutoryCondition,
};
pub use error::{AdjudicationError, IntegrityError};
pub use pkd::pkd_probability;
pub use qualifier::{QualificationPolicy, Qualifier, DEFAULT_ACCEPTANCE_THRESHOLD};
pub use response::{NarrativeAssessment, OracleQualification};
pub use types::{
    AccidentFacts, Address, AddressId, CaseId, CaseStatus, Decision, Difference, Differences,
    DoctorOpinion, DraftDecision, ExtractedFile, ExtractionSet, FailedExtraction, FailureKind,
    FileId, FileRecord, FinalDecision, HumanReview, InjuryType, Knowable, PipelineStage, PkdCode,
    QualificationInput, QualificationResult, Severity, StageFailure, Subject, SubjectId, Verdict,
    Versioned,
};
