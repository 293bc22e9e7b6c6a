//! Cross-document consistency checking.
//!
//! Dates, times and places are compared locally. The narrative parts of the
//! documents go to the oracle. When the oracle cannot help, the local
//! comparison is still reported; the check itself never fails.

use adjudicator_core::consistency::{aggregate, compare_facts, degraded};
use adjudicator_core::response::decode_consistency;
use adjudicator_core::{Differences, ExtractedFile, PipelineStage};
use std::sync::Arc;

use crate::oracle::{OracleClient, OracleRequest};
use crate::prompts::{consistency_instructions, consistency_material};

pub struct ConsistencyChecker {
    oracle: Arc<dyn OracleClient>,
}

impl ConsistencyChecker {
    pub fn new(oracle: Arc<dyn OracleClient>) -> Self {
        Self { oracle }
    }

    /// Compare the documents with each other and with an optional statement.
    #[tracing::instrument(skip_all, fields(files = files.len()))]
    pub async fn check(&self, files: &[ExtractedFile], statement: Option<&str>) -> Differences {
        let deterministic = compare_facts(files);

        let has_statement = statement.is_some_and(|s| !s.trim().is_empty());
        let accounts = files.len() + usize::from(has_statement);
        if accounts < 2 {
            return aggregate(deterministic, None);
        }

        let request = OracleRequest::new(PipelineStage::Consistency, consistency_instructions())
            .with_text(consistency_material(files, statement));

        let report = match self.oracle.complete(request).await {
            Ok(response) => match decode_consistency(&response.content) {
                Ok(narrative) => aggregate(deterministic, Some(narrative)),
                Err(e) => {
                    tracing::warn!(error = %e, "Consistency response unusable, using local comparison");
                    degraded(deterministic, "odpowiedź usługi analizy była nieczytelna")
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Consistency oracle unavailable, using local comparison");
                degraded(deterministic, "usługa analizy była niedostępna")
            }
        };

        for difference in &report.differences {
            tracing::debug!(
                field = %difference.field,
                severity = ?difference.severity,
                "Difference found"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::testing::ScriptedOracle;
    use crate::oracle::OracleError;
    use adjudicator_core::consistency::TIME_FIELD;
    use adjudicator_core::{AccidentFacts, FileId, Knowable, Severity};

    fn file(id: &str, time: &str) -> ExtractedFile {
        ExtractedFile {
            file_id: FileId::from(id),
            original_name: format!("{}.pdf", id),
            facts: AccidentFacts {
                accident_date: Knowable::Known("2024-05-02".to_string()),
                accident_time: Knowable::Known(time.to_string()),
                ..Default::default()
            },
        }
    }

    const NO_NARRATIVE_DIFFERENCES: &str = r#"{"differences": [], "summary": "Opisy są zgodne."}"#;

    #[tokio::test]
    async fn test_time_mismatch_is_medium_difference() {
        let oracle = Arc::new(ScriptedOracle::new().reply(PipelineStage::Consistency, NO_NARRATIVE_DIFFERENCES));
        let checker = ConsistencyChecker::new(oracle);

        let report = checker.check(&[file("a", "10:00"), file("b", "10:30")], None).await;
        let time = report
            .differences
            .iter()
            .find(|d| d.field == TIME_FIELD)
            .unwrap();
        assert_eq!(time.severity, Severity::Medium);
        assert!(!report.all_times_consistent);
        assert!(report.all_dates_consistent);
        assert!(!report.is_in_general_consistent);
        assert!(report.summary.contains(TIME_FIELD));
    }

    #[tokio::test]
    async fn test_oracle_failure_keeps_local_differences() {
        let oracle = Arc::new(
            ScriptedOracle::new().fail(PipelineStage::Consistency, OracleError::Transport("down".into())),
        );
        let checker = ConsistencyChecker::new(oracle);

        let report = checker.check(&[file("a", "10:00"), file("b", "10:30")], None).await;
        assert_eq!(report.differences.len(), 1);
        assert!(report.summary.contains("niedostępna"));
    }

    #[tokio::test]
    async fn test_unparseable_answer_with_nothing_local_is_unchecked() {
        let oracle = Arc::new(ScriptedOracle::new().reply(PipelineStage::Consistency, "Wszystko w porządku"));
        let checker = ConsistencyChecker::new(oracle);

        let report = checker.check(&[file("a", "10:00"), file("b", "10:00")], None).await;
        assert!(report.differences.is_empty());
        assert!(report.is_in_general_consistent);
        assert_eq!(report, Differences::unchecked("odpowiedź usługi analizy była nieczytelna"));
    }

    #[tokio::test]
    async fn test_single_document_skips_oracle() {
        let oracle = Arc::new(ScriptedOracle::new());
        let checker = ConsistencyChecker::new(oracle.clone());

        let report = checker.check(&[file("a", "10:00")], None).await;
        assert!(report.is_in_general_consistent);
        assert_eq!(oracle.calls(PipelineStage::Consistency), 0);
    }

    #[tokio::test]
    async fn test_check_is_idempotent() {
        let narrative = r#"{"differences": [{"field": "przyczyny", "details": "Poślizg a potknięcie", "severity": "low"}], "summary": "Drobne różnice."}"#;
        let oracle = Arc::new(ScriptedOracle::new().reply(PipelineStage::Consistency, narrative));
        let checker = ConsistencyChecker::new(oracle);
        let files = [file("a", "10:00"), file("b", "10:30")];

        let first = checker.check(&files, Some("Poślizgnąłem się.")).await;
        let second = checker.check(&files, Some("Poślizgnąłem się.")).await;
        assert_eq!(first, second);
        assert_eq!(first.differences.len(), 2);
    }
}
