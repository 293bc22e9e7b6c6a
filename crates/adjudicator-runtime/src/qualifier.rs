//! Legal qualification with oracle-assessed conditions.
//!
//! In `oracle` mode the oracle assesses each of the five statutory
//! conditions and writes the justification. In `rules` mode the keyword rule
//! tables do. Either way the recommendation itself is computed by
//! [`Qualifier`], so the same findings always give the same decision.

use adjudicator_core::response::decode_qualification;
use adjudicator_core::{
    evaluate_all, AdjudicationError, PipelineStage, QualificationInput, QualificationPolicy,
    QualificationResult, Qualifier,
};
use std::sync::Arc;

use crate::config::{QualificationMode, QualificationSettings};
use crate::oracle::{OracleClient, OracleRequest};
use crate::prompts::{qualification_instructions, qualification_material};

enum Assessor {
    Oracle(Arc<dyn OracleClient>),
    Rules,
}

pub struct LegalQualifier {
    assessor: Assessor,
    qualifier: Qualifier,
}

impl LegalQualifier {
    pub fn new(oracle: Arc<dyn OracleClient>, settings: &QualificationSettings) -> Self {
        let assessor = match settings.mode {
            QualificationMode::Oracle => Assessor::Oracle(oracle),
            QualificationMode::Rules => Assessor::Rules,
        };
        Self {
            assessor,
            qualifier: Qualifier::new(settings.policy()),
        }
    }

    /// Qualifier that never calls an oracle.
    pub fn rules_only(policy: QualificationPolicy) -> Self {
        Self {
            assessor: Assessor::Rules,
            qualifier: Qualifier::new(policy),
        }
    }

    pub fn mode(&self) -> QualificationMode {
        match self.assessor {
            Assessor::Oracle(_) => QualificationMode::Oracle,
            Assessor::Rules => QualificationMode::Rules,
        }
    }

    #[tracing::instrument(skip_all, fields(mode = ?self.mode(), pkd_codes = input.pkd_codes.len()))]
    pub async fn qualify(&self, input: &QualificationInput) -> Result<QualificationResult, AdjudicationError> {
        input.validate()?;

        let result = match &self.assessor {
            Assessor::Rules => self.qualifier.decide(input, evaluate_all(input), None),
            Assessor::Oracle(oracle) => {
                let request = OracleRequest::new(PipelineStage::Qualification, qualification_instructions())
                    .with_text(qualification_material(input));

                let response = oracle
                    .complete(request)
                    .await
                    .map_err(|e| e.into_adjudication(PipelineStage::Qualification))?;

                let assessed = decode_qualification(&response.content).map_err(|e| {
                    tracing::warn!(error = %e, "Qualification response rejected");
                    e
                })?;

                self.qualifier.decide(
                    input,
                    assessed.findings,
                    Some(&assessed.detailed_justification),
                )
            }
        };

        tracing::info!(
            should_accept = result.should_accept,
            pkd_probability = result.pkd_probability,
            "Qualification computed"
        );
        Ok(result)
    }
}
