//! Decoding of raw oracle responses into typed records.
//!
//! Every decoder runs the same three steps: recover a JSON object from the
//! text, validate it against the stage schema, then deserialize. A response
//! that fails any step is reported with the raw text attached; nothing is
//! defaulted.

mod parser;
mod schema;

pub use parser::parse_json_object;
pub use schema::{validate_response, ResponseSchema};

use serde::Deserialize;
use serde_json::Value;

use crate::criteria::{ConditionFinding, ConditionFindings, FindingSource, StatutoryCondition};
use crate::error::AdjudicationError;
use crate::types::{AccidentFacts, Difference, PipelineStage, Severity};

/// Decode an extraction response into accident facts.
pub fn decode_extraction(raw: &str) -> Result<AccidentFacts, AdjudicationError> {
    let stage = PipelineStage::Extraction;
    let value = parse_json_object(raw).map_err(|e| AdjudicationError::parse(stage, e, raw))?;

    validate_response(ResponseSchema::Extraction, &value)
        .map_err(|errors| AdjudicationError::parse(stage, errors.join("; "), raw))?;

    serde_json::from_value(value).map_err(|e| AdjudicationError::parse(stage, e.to_string(), raw))
}

/// Narrative comparison returned by the consistency oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeAssessment {
    pub differences: Vec<Difference>,
    pub summary: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDifference {
    field: String,
    details: String,
    #[serde(default)]
    source_documents: Vec<String>,
    severity: Severity,
}

#[derive(Deserialize)]
struct RawAssessment {
    differences: Vec<RawDifference>,
    summary: String,
}

/// Decode a consistency response.
pub fn decode_consistency(raw: &str) -> Result<NarrativeAssessment, AdjudicationError> {
    let stage = PipelineStage::Consistency;
    let value = parse_json_object(raw).map_err(|e| AdjudicationError::parse(stage, e, raw))?;

    validate_response(ResponseSchema::Consistency, &value)
        .map_err(|errors| AdjudicationError::parse(stage, errors.join("; "), raw))?;

    let parsed: RawAssessment = serde_json::from_value(value)
        .map_err(|e| AdjudicationError::parse(stage, e.to_string(), raw))?;

    Ok(NarrativeAssessment {
        differences: parsed
            .differences
            .into_iter()
            .map(|d| Difference {
                field: d.field,
                details: d.details,
                source_documents: d.source_documents,
                severity: d.severity,
            })
            .collect(),
        summary: parsed.summary,
    })
}

/// Per-condition assessment and prose returned by the qualification oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleQualification {
    pub findings: ConditionFindings,
    pub short_explanation: String,
    pub detailed_justification: String,
}

/// Decode a qualification response.
///
/// Non-JSON text is a parse error. JSON that lacks any of the five
/// conditions, or their `affirmed` flags, is a malformed qualification.
pub fn decode_qualification(raw: &str) -> Result<OracleQualification, AdjudicationError> {
    let value = parse_json_object(raw)
        .map_err(|e| AdjudicationError::parse(PipelineStage::Qualification, e, raw))?;

    validate_response(ResponseSchema::Qualification, &value).map_err(|problems| {
        AdjudicationError::MalformedQualification {
            problems,
            raw: raw.to_string(),
        }
    })?;

    let finding = |condition: StatutoryCondition| -> Result<ConditionFinding, AdjudicationError> {
        let entry = &value["conditions"][condition.key()];
        match (entry["affirmed"].as_bool(), entry["justification"].as_str()) {
            (Some(affirmed), Some(justification)) => Ok(ConditionFinding {
                condition,
                affirmed,
                justification: justification.to_string(),
                source: FindingSource::Oracle,
            }),
            _ => Err(AdjudicationError::MalformedQualification {
                problems: vec![format!("condition '{}' is incomplete", condition.key())],
                raw: raw.to_string(),
            }),
        }
    };

    let findings = ConditionFindings {
        suddenness: finding(StatutoryCondition::Suddenness)?,
        external_cause: finding(StatutoryCondition::ExternalCause)?,
        injury: finding(StatutoryCondition::Injury)?,
        insured_period: finding(StatutoryCondition::InsuredPeriod)?,
        ordinary_activity: finding(StatutoryCondition::OrdinaryActivity)?,
    };

    Ok(OracleQualification {
        findings,
        short_explanation: text_field(&value, "shortExplanation"),
        detailed_justification: text_field(&value, "detailedJustification"),
    })
}

fn text_field(value: &Value, key: &str) -> String {
    value[key].as_str().unwrap_or_default().trim().to_string()
}
