//! JSON Schema validation for oracle responses.
//!
//! Each oracle stage answers with its own JSON shape. The schemas live in
//! `schemas/` at the workspace root and are embedded at compile time.

use std::sync::OnceLock;

/// Embedded schemas (loaded at compile time).
const EXTRACTION_SCHEMA_JSON: &str = include_str!("../../../../schemas/extraction.schema.json");
const CONSISTENCY_SCHEMA_JSON: &str = include_str!("../../../../schemas/consistency.schema.json");
const QUALIFICATION_SCHEMA_JSON: &str =
    include_str!("../../../../schemas/qualification.schema.json");

type Compiled = OnceLock<Result<jsonschema::Validator, String>>;

/// Compiled validators (initialized once, reused).
static EXTRACTION: Compiled = OnceLock::new();
static CONSISTENCY: Compiled = OnceLock::new();
static QUALIFICATION: Compiled = OnceLock::new();

/// Which response shape to validate against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSchema {
    Extraction,
    Consistency,
    Qualification,
}

impl ResponseSchema {
    fn source(&self) -> (&'static Compiled, &'static str) {
        match self {
            ResponseSchema::Extraction => (&EXTRACTION, EXTRACTION_SCHEMA_JSON),
            ResponseSchema::Consistency => (&CONSISTENCY, CONSISTENCY_SCHEMA_JSON),
            ResponseSchema::Qualification => (&QUALIFICATION, QUALIFICATION_SCHEMA_JSON),
        }
    }

    fn validator(&self) -> Result<&'static jsonschema::Validator, String> {
        let (cell, json) = self.source();
        let result = cell.get_or_init(|| {
            let schema_value: serde_json::Value = serde_json::from_str(json)
                .map_err(|e| format!("Invalid schema JSON: {}", e))?;
            jsonschema::options()
                .build(&schema_value)
                .map_err(|e| format!("Failed to compile schema: {}", e))
        });

        result.as_ref().map_err(Clone::clone)
    }
}

/// Validate a response value against its schema.
///
/// Returns every validation problem, formatted with its instance path.
pub fn validate_response(schema: ResponseSchema, value: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = schema.validator().map_err(|e| vec![e])?;

    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|e| {
            let path = e.instance_path.to_string();
            if path.is_empty() {
                e.to_string()
            } else {
                format!("{} at {}", e, path)
            }
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_schemas_compile() {
        for schema in [
            ResponseSchema::Extraction,
            ResponseSchema::Consistency,
            ResponseSchema::Qualification,
        ] {
            assert!(schema.validator().is_ok(), "{:?} failed to compile", schema);
        }
    }

    #[test]
    fn test_extraction_accepts_unknowns() {
        let value = serde_json::json!({
            "accidentDate": "2024-03-12",
            "place": null,
            "injuryPresent": "unknown",
            "medicalEvidence": false,
            "draftDecision": "accept",
            "justifications": [
                { "criterion": "suddenness", "justification": "Upadek z drabiny" }
            ]
        });
        assert!(validate_response(ResponseSchema::Extraction, &value).is_ok());
    }

    #[test]
    fn test_extraction_rejects_wrong_types() {
        let value = serde_json::json!({
            "accidentDate": 12,
            "witnesses": "Jan Kowalski"
        });
        let errors = validate_response(ResponseSchema::Extraction, &value).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_qualification_missing_condition() {
        let value = serde_json::json!({
            "conditions": {
                "suddenness": { "affirmed": true, "justification": "Nagłe zdarzenie" },
                "externalCause": { "affirmed": true, "justification": "Śliska podłoga" },
                "injury": { "affirmed": true, "justification": "Złamanie" },
                "ordinaryActivity": { "affirmed": true, "justification": "Montaż" }
            },
            "shortExplanation": "",
            "detailedJustification": ""
        });
        let errors = validate_response(ResponseSchema::Qualification, &value).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("insuredPeriod")));
    }

    #[test]
    fn test_consistency_severity_enum() {
        let value = serde_json::json!({
            "differences": [
                { "field": "opis", "details": "x", "severity": "critical" }
            ],
            "summary": "s"
        });
        assert!(validate_response(ResponseSchema::Consistency, &value).is_err());
    }
}
