//! Document extraction.
//!
//! Sends one document to the oracle and decodes the answer into
//! [`AccidentFacts`]. A missing value stays `Unknown`; an unusable answer is a
//! parse error carrying the raw text. Nothing is defaulted or guessed.

use adjudicator_core::response::decode_extraction;
use adjudicator_core::{
    AccidentFacts, AdjudicationError, ExtractedFile, FileId, FileRecord, PipelineStage, Versioned,
};
use chrono::Utc;
use std::sync::Arc;

use crate::cache::{content_hash, ExtractionCache};
use crate::oracle::{OracleClient, OracleDocument, OracleRequest};
use crate::prompts::extraction_instructions;
use crate::store::FileRepository;
use crate::RuntimeError;

/// An uploaded document before it is stored.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub original_name: String,
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("bytes", &self.bytes.len())
            .field("media_type", &self.media_type)
            .field("original_name", &self.original_name)
            .finish()
    }
}

impl Upload {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>, original_name: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            original_name: original_name.into(),
        }
    }

    fn validate(&self) -> Result<(), AdjudicationError> {
        if self.bytes.is_empty() {
            return Err(AdjudicationError::Validation(format!(
                "file '{}' is empty",
                self.original_name
            )));
        }
        if self.media_type.trim().is_empty() {
            return Err(AdjudicationError::Validation(format!(
                "file '{}' has no media type",
                self.original_name
            )));
        }
        Ok(())
    }

    fn into_record(self) -> FileRecord {
        let now = Utc::now();
        FileRecord {
            id: FileId::generate(),
            content_hash: content_hash(&self.bytes),
            bytes: self.bytes,
            original_name: self.original_name,
            media_type: self.media_type,
            extracted: None,
            created_at: now,
            updated_at: now,
        }
    }
}

pub struct DocumentExtractor {
    oracle: Arc<dyn OracleClient>,
    files: Arc<dyn FileRepository>,
    cache: ExtractionCache,
}

impl DocumentExtractor {
    pub fn new(oracle: Arc<dyn OracleClient>, files: Arc<dyn FileRepository>, cache: ExtractionCache) -> Self {
        Self { oracle, files, cache }
    }

    /// Store a document without extracting it.
    pub async fn upload(&self, upload: Upload) -> Result<FileRecord, RuntimeError> {
        upload.validate()?;
        let record = upload.into_record();
        self.files.insert_file(record.clone()).await?;
        tracing::info!(file_id = %record.id, name = %record.original_name, "File stored");
        Ok(record)
    }

    /// Extract facts from a new document and store both.
    ///
    /// Nothing is stored when extraction fails.
    pub async fn extract(
        &self,
        bytes: Vec<u8>,
        media_type: &str,
        original_name: &str,
    ) -> Result<FileRecord, RuntimeError> {
        let upload = Upload::new(bytes, media_type, original_name);
        upload.validate()?;

        let mut record = upload.into_record();
        let facts = self.facts_for(&record).await?;
        record.extracted = Some(Versioned::current(facts));

        self.files.insert_file(record.clone()).await?;
        tracing::info!(file_id = %record.id, name = %record.original_name, "File extracted and stored");
        Ok(record)
    }

    /// Extract a stored file. Already extracted files are returned as they are.
    pub async fn extract_existing(&self, file_id: &FileId) -> Result<ExtractedFile, RuntimeError> {
        let record = self
            .files
            .get_file(file_id)
            .await?
            .ok_or_else(|| AdjudicationError::NotFound(format!("file {}", file_id)))?;
        self.extract_record(record).await
    }

    #[tracing::instrument(skip(self, record), fields(file_id = %record.id))]
    pub(crate) async fn extract_record(&self, record: FileRecord) -> Result<ExtractedFile, RuntimeError> {
        if let Some(extracted) = &record.extracted {
            return Ok(ExtractedFile {
                file_id: record.id.clone(),
                original_name: record.original_name.clone(),
                facts: extracted.payload.clone(),
            });
        }

        let facts = self.facts_for(&record).await?;
        let stored = self
            .files
            .attach_extraction(&record.id, Versioned::current(facts.clone()))
            .await?;

        Ok(ExtractedFile {
            file_id: stored.id,
            original_name: stored.original_name,
            facts,
        })
    }

    async fn facts_for(&self, record: &FileRecord) -> Result<AccidentFacts, AdjudicationError> {
        if let Some(facts) = self.cache.get(&record.content_hash).await {
            tracing::debug!(file_id = %record.id, "Extraction cache hit");
            return Ok(facts);
        }

        let request = OracleRequest::new(PipelineStage::Extraction, extraction_instructions())
            .with_document(OracleDocument {
                bytes: record.bytes.clone(),
                media_type: record.media_type.clone(),
                name: record.original_name.clone(),
            });

        let response = self
            .oracle
            .complete(request)
            .await
            .map_err(|e| e.into_adjudication(PipelineStage::Extraction))?;

        let facts = decode_extraction(&response.content).map_err(|e| {
            tracing::warn!(file_id = %record.id, error = %e, "Extraction response rejected");
            e
        })?;

        tracing::debug!(
            file_id = %record.id,
            tokens = response.usage.total(),
            known_date = facts.accident_date.is_known(),
            "Extraction decoded"
        );

        self.cache.insert(record.content_hash.clone(), facts.clone()).await;
        Ok(facts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::testing::ScriptedOracle;
    use crate::store::InMemoryStore;
    use adjudicator_core::Knowable;

    const FACTS: &str = r#"{"accidentDate": "2024-05-02", "accidentTime": "10:00", "place": "Kraków, ul. Długa 5", "injuryPresent": true}"#;

    fn extractor(oracle: Arc<ScriptedOracle>) -> (DocumentExtractor, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let extractor = DocumentExtractor::new(oracle, store.clone(), ExtractionCache::default());
        (extractor, store)
    }

    #[tokio::test]
    async fn test_extract_stores_file_with_facts() {
        let oracle = Arc::new(ScriptedOracle::new().reply(PipelineStage::Extraction, FACTS));
        let (extractor, store) = extractor(oracle);

        let record = extractor
            .extract(b"%PDF-1.7 ...".to_vec(), "application/pdf", "zgloszenie.pdf")
            .await
            .unwrap();

        let facts = &record.extracted.as_ref().unwrap().payload;
        assert_eq!(facts.accident_time, Knowable::Known("10:00".to_string()));
        assert_eq!(facts.causes, Knowable::Unknown);
        assert_eq!(record.content_hash, content_hash(b"%PDF-1.7 ..."));
        assert_eq!(store.file_count(), 1);
    }

    #[tokio::test]
    async fn test_prose_response_is_parse_error_and_nothing_stored() {
        let oracle = Arc::new(
            ScriptedOracle::new().reply(PipelineStage::Extraction, "Nie mogę odczytać dokumentu."),
        );
        let (extractor, store) = extractor(oracle);

        let err = extractor
            .extract(b"scan".to_vec(), "image/png", "skan.png")
            .await
            .unwrap_err();
        match err {
            RuntimeError::Adjudication(e) => {
                assert_eq!(e.raw_response(), Some("Nie mogę odczytać dokumentu."));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(store.file_count(), 0);
    }

    #[tokio::test]
    async fn test_same_bytes_extracted_once() {
        let oracle = Arc::new(ScriptedOracle::new().reply(PipelineStage::Extraction, FACTS));
        let (extractor, _) = extractor(oracle.clone());

        extractor.extract(b"same".to_vec(), "text/plain", "a.txt").await.unwrap();
        extractor.extract(b"same".to_vec(), "text/plain", "b.txt").await.unwrap();
        assert_eq!(oracle.calls(PipelineStage::Extraction), 1);
    }

    #[tokio::test]
    async fn test_extract_existing_attaches_once() {
        let oracle = Arc::new(ScriptedOracle::new().reply(PipelineStage::Extraction, FACTS));
        let (extractor, store) = extractor(oracle.clone());

        let record = extractor
            .upload(Upload::new(b"notatka".to_vec(), "text/plain", "notatka.txt"))
            .await
            .unwrap();
        assert!(record.extracted.is_none());

        let first = extractor.extract_existing(&record.id).await.unwrap();
        let second = extractor.extract_existing(&record.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(oracle.calls(PipelineStage::Extraction), 1);
        assert!(store.get_file(&record.id).await.unwrap().unwrap().extracted.is_some());
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let oracle = Arc::new(ScriptedOracle::new());
        let (extractor, _) = extractor(oracle);
        let err = extractor
            .upload(Upload::new(Vec::new(), "text/plain", "pusty.txt"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Adjudication(AdjudicationError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_oracle_failure_is_not_fabricated() {
        let oracle = Arc::new(ScriptedOracle::new().fail(
            PipelineStage::Extraction,
            crate::oracle::OracleError::Auth("invalid key".into()),
        ));
        let (extractor, _) = extractor(oracle);
        let err = extractor
            .extract(b"doc".to_vec(), "text/plain", "doc.txt")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Adjudication(AdjudicationError::Oracle {
                stage: PipelineStage::Extraction,
                ..
            })
        ));
    }
}
