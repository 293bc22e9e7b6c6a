//! Persistence boundary.
//!
//! The pipeline only sees these traits; the storage engine is the caller's
//! choice. [`InMemoryStore`] implements all three for tests and the CLI.

mod memory;

pub use memory::InMemoryStore;

use adjudicator_core::{
    AccidentFacts, Address, AddressId, AdjudicationError, Case, CaseId, FileId, FileRecord,
    Subject, SubjectId, Versioned,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Case {0} not found")]
    CaseNotFound(CaseId),

    #[error("File {0} not found")]
    FileNotFound(FileId),

    #[error("Subject {0} not found")]
    SubjectNotFound(SubjectId),

    #[error("Record already exists: {0}")]
    Duplicate(String),

    #[error("Case {case_id} revision conflict: expected {expected}, found {found}")]
    Conflict {
        case_id: CaseId,
        expected: u64,
        found: u64,
    },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// The pipeline error a caller should see, when one applies.
    pub fn as_adjudication(&self) -> Option<AdjudicationError> {
        match self {
            StoreError::CaseNotFound(id) => Some(AdjudicationError::NotFound(format!("case {}", id))),
            StoreError::FileNotFound(id) => Some(AdjudicationError::NotFound(format!("file {}", id))),
            StoreError::SubjectNotFound(id) => {
                Some(AdjudicationError::NotFound(format!("subject {}", id)))
            }
            StoreError::Conflict {
                case_id,
                expected,
                found,
            } => Some(AdjudicationError::ConcurrentModification {
                case_id: *case_id,
                expected: *expected,
                found: *found,
            }),
            StoreError::Duplicate(_) | StoreError::Backend(_) => None,
        }
    }
}

#[async_trait]
pub trait CaseRepository: Send + Sync {
    async fn insert_case(&self, case: Case) -> Result<(), StoreError>;

    async fn get_case(&self, id: CaseId) -> Result<Option<Case>, StoreError>;

    /// Store `case` if the stored revision still equals `expected_revision`.
    ///
    /// Returns the stored copy, whose revision is one higher.
    async fn update_case(&self, case: Case, expected_revision: u64) -> Result<Case, StoreError>;

    /// Returns whether a case was removed.
    async fn delete_case(&self, id: CaseId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn insert_file(&self, file: FileRecord) -> Result<(), StoreError>;

    async fn get_file(&self, id: &FileId) -> Result<Option<FileRecord>, StoreError>;

    /// Attach (or replace) the extracted facts of a stored file.
    async fn attach_extraction(
        &self,
        id: &FileId,
        facts: Versioned<AccidentFacts>,
    ) -> Result<FileRecord, StoreError>;
}

#[async_trait]
pub trait SubjectRepository: Send + Sync {
    async fn insert_subject(&self, subject: Subject) -> Result<(), StoreError>;

    async fn get_subject(&self, id: SubjectId) -> Result<Option<Subject>, StoreError>;

    async fn insert_address(&self, id: AddressId, address: Address) -> Result<(), StoreError>;

    async fn get_address(&self, id: AddressId) -> Result<Option<Address>, StoreError>;
}
