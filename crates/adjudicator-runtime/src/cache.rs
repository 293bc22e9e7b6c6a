//! Extraction cache.
//!
//! The same document is often attached to several cases (the claimant's
//! statement, a shared medical record). Extracted facts are cached by the
//! SHA-256 of the document bytes so identical bytes are sent to the oracle
//! once per TTL.

use adjudicator_core::AccidentFacts;
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Hex-encoded SHA-256 of the document bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub struct ExtractionCache {
    cache: Cache<String, AccidentFacts>,
}

impl ExtractionCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, content_hash: &str) -> Option<AccidentFacts> {
        self.cache.get(content_hash).await
    }

    pub async fn insert(&self, content_hash: String, facts: AccidentFacts) {
        self.cache.insert(content_hash, facts).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for ExtractionCache {
    fn default() -> Self {
        Self::new(1_000, Duration::from_secs(3600))
    }
}
