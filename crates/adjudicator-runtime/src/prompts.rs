//! Oracle instructions.
//!
//! The statutory conditions and the injury taxonomy are rendered from the
//! tables in `adjudicator-core`, so instructions and local decision rules
//! cannot drift apart. Each instruction ends with the exact JSON shape the
//! matching decoder validates.

use adjudicator_core::{
    AccidentFacts, ExtractedFile, InjuryType, Knowable, QualificationInput, StatutoryCondition,
};

/// Role shared by all stages.
pub const BASE_INSTRUCTIONS: &str = r#"
You assist a social-insurance claims examiner reviewing a workplace-accident claim
of a self-employed person (wypadek przy prowadzeniu pozarolniczej działalności).

## Constraints
1. Use only the material you are given. Never invent facts, names, dates or places.
2. When a document does not state something, answer "unknown" (or null).
3. Answer in Polish for all free-text values.
4. Reply with a single JSON object and nothing else.
"#;

/// Instructions for extracting facts from one document.
pub fn extraction_instructions() -> String {
    let injury_types = InjuryType::ALL
        .iter()
        .map(|t| format!("- \"{}\": {}", t.as_str(), t.description()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"{base}
## Task: document extraction
Read the attached document and extract the facts of the accident it describes.

## Injury types
{injury_types}

## Output format (JSON)
{{
  "accidentDate": "YYYY-MM-DD" | "unknown",
  "accidentTime": "HH:MM" | "unknown",
  "place": string | "unknown",
  "country": string | "unknown",
  "circumstances": string | "unknown",
  "causes": string | "unknown",
  "activitiesAtTime": string | "unknown",
  "injuryPresent": true | false | "unknown",
  "injuryDescription": string | "unknown",
  "injuryType": one of the injury types above,
  "medicalEvidence": true | false | "unknown",
  "draftDecision": "accept" | "reject" | "needs-more-information",
  "justifications": [{{ "criterion": "suddenness" | "external-cause" | "injury" | "work-relation", "justification": string }}],
  "witnesses": [string]
}}
"#,
        base = BASE_INSTRUCTIONS.trim(),
        injury_types = injury_types,
    )
}

/// Instructions for comparing narratives across documents.
pub fn consistency_instructions() -> String {
    format!(
        r#"{base}
## Task: consistency check
Compare the accounts of the same accident given in the documents below and in the
claimant's statement, if present. Report every contradiction about the circumstances,
causes, activities performed or the injury. Dates, times and places are compared
separately; report them only when the wording contradicts itself.

## Severity
- "high": the contradiction changes whether the event is an accident at work
- "medium": the contradiction concerns an important detail of the course of events
- "low": wording differences that do not change the facts

## Output format (JSON)
{{
  "differences": [
    {{ "field": string, "details": string, "sourceDocuments": [string], "severity": "high" | "medium" | "low" }}
  ],
  "summary": string
}}
"#,
        base = BASE_INSTRUCTIONS.trim(),
    )
}

/// Instructions for the five-condition assessment.
pub fn qualification_instructions() -> String {
    let conditions = StatutoryCondition::ALL
        .iter()
        .map(|c| format!("- \"{}\" ({}): {}", c.key(), c.label(), c.legal_test()))
        .collect::<Vec<_>>()
        .join("\n");

    let shape = StatutoryCondition::ALL
        .iter()
        .map(|c| format!("    \"{}\": {{ \"affirmed\": true | false, \"justification\": string }}", c.key()))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"{base}
## Task: legal qualification
Assess whether the event meets each statutory condition of an accident
(art. 3 ust. 3 pkt 8 ustawy o ubezpieczeniu społecznym z tytułu wypadków przy pracy
i chorób zawodowych). Assess every condition separately. A condition that the
material does not establish is not affirmed. You do not decide the claim.

## Conditions
{conditions}

## Output format (JSON)
{{
  "conditions": {{
{shape}
  }},
  "shortExplanation": string,
  "detailedJustification": string
}}
"#,
        base = BASE_INSTRUCTIONS.trim(),
        conditions = conditions,
        shape = shape,
    )
}

/// Case material for the qualification request.
pub fn qualification_material(input: &QualificationInput) -> String {
    let mut material = format!(
        "Opis wypadku:\n{}\n\nCzynności wykonywane w chwili wypadku:\n{}\n",
        input.accident_description.trim(),
        input.activities_performed.trim()
    );

    if input.pkd_codes.is_empty() {
        material.push_str("\nKody PKD: brak\n");
    } else {
        material.push_str("\nKody PKD:\n");
        for code in &input.pkd_codes {
            match &code.description {
                Some(description) => material.push_str(&format!("- {} {}\n", code.code, description)),
                None => material.push_str(&format!("- {}\n", code.code)),
            }
        }
    }

    match &input.doctor_opinion {
        Some(opinion) => {
            let verdict = if opinion.injuries_match_definition {
                "obrażenia odpowiadają definicji urazu"
            } else {
                "obrażenia NIE odpowiadają definicji urazu"
            };
            material.push_str(&format!("\nOpinia lekarza orzecznika: {}", verdict));
            if let Some(comment) = &opinion.comment {
                material.push_str(&format!(" ({})", comment.trim()));
            }
            material.push('\n');
        }
        None => material.push_str("\nOpinia lekarza orzecznika: brak\n"),
    }

    material
}

/// Case material for the consistency request.
pub fn consistency_material(files: &[ExtractedFile], statement: Option<&str>) -> String {
    let mut material = String::new();
    for file in files {
        material.push_str(&format!("### Dokument \"{}\"\n", file.original_name));
        material.push_str(&describe_facts(&file.facts));
        material.push('\n');
    }
    if let Some(statement) = statement.map(str::trim).filter(|s| !s.is_empty()) {
        material.push_str("### Oświadczenie poszkodowanego\n");
        material.push_str(statement);
        material.push('\n');
    }
    material
}

fn describe_facts(facts: &AccidentFacts) -> String {
    let line = |label: &str, value: &Knowable<String>| {
        format!("{}: {}\n", label, value.known().map(String::as_str).unwrap_or("unknown"))
    };
    let mut text = String::new();
    text.push_str(&line("Data", &facts.accident_date));
    text.push_str(&line("Godzina", &facts.accident_time));
    text.push_str(&line("Miejsce", &facts.place));
    text.push_str(&line("Okoliczności", &facts.circumstances));
    text.push_str(&line("Przyczyny", &facts.causes));
    text.push_str(&line("Czynności", &facts.activities_at_time));
    text.push_str(&line("Opis urazu", &facts.injury_description));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use adjudicator_core::{DoctorOpinion, FileId, PkdCode};

    #[test]
    fn test_qualification_instructions_list_every_condition() {
        let text = qualification_instructions();
        for condition in StatutoryCondition::ALL {
            assert!(text.contains(condition.key()));
            assert!(text.contains(condition.legal_test()));
        }
        assert!(text.contains("shortExplanation"));
        assert!(text.contains("You do not decide the claim"));
    }

    #[test]
    fn test_extraction_instructions_list_injury_types() {
        let text = extraction_instructions();
        for injury in InjuryType::ALL {
            assert!(text.contains(injury.as_str()));
        }
        assert!(text.contains("witnesses"));
    }

    #[test]
    fn test_qualification_material() {
        let input = QualificationInput {
            accident_description: "Upadek z rusztowania".to_string(),
            activities_performed: "Montaż instalacji".to_string(),
            pkd_codes: vec![PkdCode::new("43.21.Z", "Wykonywanie instalacji elektrycznych")],
            doctor_opinion: Some(DoctorOpinion {
                injuries_match_definition: false,
                comment: Some("Brak obrażeń".to_string()),
            }),
        };
        let material = qualification_material(&input);
        assert!(material.contains("43.21.Z Wykonywanie instalacji elektrycznych"));
        assert!(material.contains("NIE odpowiadają"));
        assert!(material.contains("Brak obrażeń"));
    }

    #[test]
    fn test_consistency_material_marks_unknowns() {
        let files = vec![ExtractedFile {
            file_id: FileId::from("f1"),
            original_name: "notatka.pdf".to_string(),
            facts: AccidentFacts {
                accident_time: Knowable::Known("10:00".to_string()),
                ..Default::default()
            },
        }];
        let material = consistency_material(&files, Some("Spadłem z drabiny."));
        assert!(material.contains("Dokument \"notatka.pdf\""));
        assert!(material.contains("Godzina: 10:00"));
        assert!(material.contains("Miejsce: unknown"));
        assert!(material.contains("Spadłem z drabiny."));
    }
}
