use adjudicator_core::{
    AccidentFacts, Address, AddressId, Case, CaseId, FileId, FileRecord, Subject, SubjectId,
    Versioned,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{CaseRepository, FileRepository, StoreError, SubjectRepository};

/// Process-local store.
#[derive(Default)]
pub struct InMemoryStore {
    cases: RwLock<HashMap<CaseId, Case>>,
    files: RwLock<HashMap<FileId, FileRecord>>,
    subjects: RwLock<HashMap<SubjectId, Subject>>,
    addresses: RwLock<HashMap<AddressId, Address>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case_count(&self) -> usize {
        self.cases.read().len()
    }

    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }
}

#[async_trait]
impl CaseRepository for InMemoryStore {
    async fn insert_case(&self, case: Case) -> Result<(), StoreError> {
        let mut cases = self.cases.write();
        if cases.contains_key(&case.id) {
            return Err(StoreError::Duplicate(format!("case {}", case.id)));
        }
        cases.insert(case.id, case);
        Ok(())
    }

    async fn get_case(&self, id: CaseId) -> Result<Option<Case>, StoreError> {
        Ok(self.cases.read().get(&id).cloned())
    }

    async fn update_case(&self, mut case: Case, expected_revision: u64) -> Result<Case, StoreError> {
        let mut cases = self.cases.write();
        let found = cases
            .get(&case.id)
            .map(|stored| stored.revision)
            .ok_or(StoreError::CaseNotFound(case.id))?;

        if found != expected_revision {
            return Err(StoreError::Conflict {
                case_id: case.id,
                expected: expected_revision,
                found,
            });
        }

        case.revision = found + 1;
        cases.insert(case.id, case.clone());
        Ok(case)
    }

    async fn delete_case(&self, id: CaseId) -> Result<bool, StoreError> {
        Ok(self.cases.write().remove(&id).is_some())
    }
}

#[async_trait]
impl FileRepository for InMemoryStore {
    async fn insert_file(&self, file: FileRecord) -> Result<(), StoreError> {
        let mut files = self.files.write();
        if files.contains_key(&file.id) {
            return Err(StoreError::Duplicate(format!("file {}", file.id)));
        }
        files.insert(file.id.clone(), file);
        Ok(())
    }

    async fn get_file(&self, id: &FileId) -> Result<Option<FileRecord>, StoreError> {
        Ok(self.files.read().get(id).cloned())
    }

    async fn attach_extraction(
        &self,
        id: &FileId,
        facts: Versioned<AccidentFacts>,
    ) -> Result<FileRecord, StoreError> {
        let mut files = self.files.write();
        let file = files
            .get_mut(id)
            .ok_or_else(|| StoreError::FileNotFound(id.clone()))?;
        file.extracted = Some(facts);
        file.updated_at = Utc::now();
        Ok(file.clone())
    }
}

#[async_trait]
impl SubjectRepository for InMemoryStore {
    async fn insert_subject(&self, subject: Subject) -> Result<(), StoreError> {
        self.subjects.write().insert(subject.id, subject);
        Ok(())
    }

    async fn get_subject(&self, id: SubjectId) -> Result<Option<Subject>, StoreError> {
        Ok(self.subjects.read().get(&id).cloned())
    }

    async fn insert_address(&self, id: AddressId, address: Address) -> Result<(), StoreError> {
        self.addresses.write().insert(id, address);
        Ok(())
    }

    async fn get_address(&self, id: AddressId) -> Result<Option<Address>, StoreError> {
        Ok(self.addresses.read().get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_increments_revision() {
        let store = InMemoryStore::new();
        let case = Case::new(None, vec![], Utc::now());
        let id = case.id;
        store.insert_case(case.clone()).await.unwrap();

        let stored = store.update_case(case, 0).await.unwrap();
        assert_eq!(stored.revision, 1);
        assert_eq!(store.get_case(id).await.unwrap().unwrap().revision, 1);
    }

    #[tokio::test]
    async fn test_stale_revision_conflicts() {
        let store = InMemoryStore::new();
        let case = Case::new(None, vec![], Utc::now());
        store.insert_case(case.clone()).await.unwrap();
        store.update_case(case.clone(), 0).await.unwrap();

        let err = store.update_case(case, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 0, found: 1, .. }));
        assert!(matches!(
            err.as_adjudication(),
            Some(adjudicator_core::AdjudicationError::ConcurrentModification { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_of_deleted_case_fails() {
        let store = InMemoryStore::new();
        let case = Case::new(None, vec![], Utc::now());
        store.insert_case(case.clone()).await.unwrap();
        assert!(store.delete_case(case.id).await.unwrap());

        let err = store.update_case(case, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::CaseNotFound(_)));
    }

    #[tokio::test]
    async fn test_attach_extraction() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let id = FileId::from("f-1");
        store
            .insert_file(FileRecord {
                id: id.clone(),
                bytes: b"abc".to_vec(),
                original_name: "a.txt".to_string(),
                media_type: "text/plain".to_string(),
                content_hash: "hash".to_string(),
                extracted: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let file = store
            .attach_extraction(&id, Versioned::current(AccidentFacts::default()))
            .await
            .unwrap();
        assert!(file.extracted.is_some());
        assert!(store
            .attach_extraction(&FileId::from("missing"), Versioned::current(AccidentFacts::default()))
            .await
            .is_err());
    }
}
