//! Accident card generation.
//!
//! A pure mapping from a finalized, qualified case to the data of the
//! accident card ("karta wypadku"). Nothing is invented: every filled field
//! names the upstream field it was copied from, and anything absent renders
//! as a placeholder.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::case::Case;
use crate::types::{
    AccidentFacts, Address, AddressId, CaseId, CaseStatus, FileRecord, Knowable, Subject, Verdict,
};

/// Text shown in place of a missing value.
pub const PLACEHOLDER: &str = "[brak danych]";

/// Citation used for affirmative qualifications that name no provision.
pub const DEFAULT_CITATION: &str = "art. 3 ust. 3 pkt 8 ustawy z dnia 30 października 2002 r. o ubezpieczeniu społecznym z tytułu wypadków przy pracy i chorób zawodowych";

const DEFAULT_PAYER: &str = "Zakład Ubezpieczeń Społecznych";

lazy_static! {
    static ref CITATION: Regex = Regex::new(
        r"(?i)\bart\.\s*\d+[a-z]?(?:\s*ust\.\s*\d+[a-z]?)?(?:\s*pkt\s*\d+[a-z]?)?"
    )
    .unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    #[error("Case {0} has no qualification")]
    NotQualified(CaseId),

    #[error("Case {case_id} is not finalized (status {status})")]
    NotFinalized { case_id: CaseId, status: CaseStatus },
}

/// Card settings that come from configuration, not from the case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    pub payer_name: String,
    pub payer_address: Option<String>,
    pub default_citation: String,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            payer_name: DEFAULT_PAYER.to_string(),
            payer_address: None,
            default_citation: DEFAULT_CITATION.to_string(),
        }
    }
}

/// One card field: a copied value with its origin, or a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CardField {
    Value { value: String, source: String },
    Placeholder { label: String },
}

impl CardField {
    pub fn value(value: impl Into<String>, source: impl Into<String>) -> Self {
        CardField::Value {
            value: value.into(),
            source: source.into(),
        }
    }

    pub fn placeholder() -> Self {
        CardField::Placeholder {
            label: PLACEHOLDER.to_string(),
        }
    }

    fn from_option(value: Option<&str>, source: impl Into<String>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => CardField::value(v, source),
            None => CardField::placeholder(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, CardField::Placeholder { .. })
    }

    /// Rendered text.
    pub fn text(&self) -> &str {
        match self {
            CardField::Value { value, .. } => value,
            CardField::Placeholder { label } => label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayerBlock {
    pub name: CardField,
    pub address: CardField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimantBlock {
    pub name: CardField,
    pub surname: CardField,
    pub national_id: CardField,
    pub nip: CardField,
    pub regon: CardField,
    pub residential_address: CardField,
    pub correspondence_address: CardField,
    pub business_address: CardField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentBlock {
    pub date: CardField,
    pub time: CardField,
    pub place: CardField,
    pub circumstances: CardField,
    pub causes: CardField,
    pub activities: CardField,
    pub injury: CardField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationBlock {
    pub decision: CardField,
    pub decided_at: CardField,
    /// Blank for negative qualifications.
    pub citation: Option<CardField>,
    /// Set for negative qualifications only.
    pub rejection_justification: Option<CardField>,
    pub reviewer_comment: CardField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOffBlock {
    pub reviewer_name: CardField,
    pub reviewer_signature: CardField,
    pub signed_on: CardField,
}

impl SignOffBlock {
    fn unsigned() -> Self {
        Self {
            reviewer_name: CardField::placeholder(),
            reviewer_signature: CardField::placeholder(),
            signed_on: CardField::placeholder(),
        }
    }
}

/// The accident card data model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccidentCard {
    pub case_id: CaseId,
    pub payer: PayerBlock,
    pub claimant: ClaimantBlock,
    pub incident: IncidentBlock,
    pub witnesses: Vec<CardField>,
    pub qualification: QualificationBlock,
    pub sign_off: SignOffBlock,
}

impl AccidentCard {
    /// Every field of the card, with its position.
    pub fn fields(&self) -> Vec<(&'static str, &CardField)> {
        let mut fields = vec![
            ("payer.name", &self.payer.name),
            ("payer.address", &self.payer.address),
            ("claimant.name", &self.claimant.name),
            ("claimant.surname", &self.claimant.surname),
            ("claimant.nationalId", &self.claimant.national_id),
            ("claimant.nip", &self.claimant.nip),
            ("claimant.regon", &self.claimant.regon),
            ("claimant.residentialAddress", &self.claimant.residential_address),
            ("claimant.correspondenceAddress", &self.claimant.correspondence_address),
            ("claimant.businessAddress", &self.claimant.business_address),
            ("incident.date", &self.incident.date),
            ("incident.time", &self.incident.time),
            ("incident.place", &self.incident.place),
            ("incident.circumstances", &self.incident.circumstances),
            ("incident.causes", &self.incident.causes),
            ("incident.activities", &self.incident.activities),
            ("incident.injury", &self.incident.injury),
            ("qualification.decision", &self.qualification.decision),
            ("qualification.decidedAt", &self.qualification.decided_at),
            ("qualification.reviewerComment", &self.qualification.reviewer_comment),
            ("signOff.reviewerName", &self.sign_off.reviewer_name),
            ("signOff.reviewerSignature", &self.sign_off.reviewer_signature),
            ("signOff.signedOn", &self.sign_off.signed_on),
        ];
        if let Some(citation) = &self.qualification.citation {
            fields.push(("qualification.citation", citation));
        }
        if let Some(justification) = &self.qualification.rejection_justification {
            fields.push(("qualification.rejectionJustification", justification));
        }
        fields.extend(self.witnesses.iter().map(|w| ("witnesses", w)));
        fields
    }
}

/// Everything the card is built from.
#[derive(Debug, Clone)]
pub struct CardSource {
    pub case: Case,
    pub subject: Option<Subject>,
    pub addresses: HashMap<AddressId, Address>,
    pub files: Vec<FileRecord>,
}

/// Build the accident card for a finalized, qualified case.
pub fn generate(source: &CardSource, config: &CardConfig) -> Result<AccidentCard, CardError> {
    let case = &source.case;
    let qualification = case
        .qualification
        .as_ref()
        .map(|q| &q.payload)
        .ok_or(CardError::NotQualified(case.id))?;
    let decision = case
        .final_decision
        .as_ref()
        .filter(|_| case.is_terminal())
        .ok_or(CardError::NotFinalized {
            case_id: case.id,
            status: case.status,
        })?;

    let (citation, rejection_justification) = if qualification.should_accept {
        let found = CITATION
            .find(&qualification.detailed_justification)
            .map(|m| CardField::value(m.as_str(), "qualification.detailedJustification"))
            .or_else(|| {
                CITATION
                    .find(&qualification.short_explanation)
                    .map(|m| CardField::value(m.as_str(), "qualification.shortExplanation"))
            })
            .unwrap_or_else(|| CardField::value(&config.default_citation, "config.defaultCitation"));
        (Some(found), None)
    } else {
        (
            None,
            Some(CardField::from_option(
                Some(qualification.detailed_justification.as_str()),
                "qualification.detailedJustification",
            )),
        )
    };

    let verdict = match decision.decision {
        Verdict::Accepted => "ACCEPTED",
        Verdict::Failed => "FAILED",
    };

    Ok(AccidentCard {
        case_id: case.id,
        payer: PayerBlock {
            name: CardField::from_option(Some(config.payer_name.as_str()), "config.payerName"),
            address: CardField::from_option(config.payer_address.as_deref(), "config.payerAddress"),
        },
        claimant: claimant_block(source),
        incident: incident_block(source),
        witnesses: witnesses(source),
        qualification: QualificationBlock {
            decision: CardField::value(verdict, "case.finalDecision.decision"),
            decided_at: CardField::value(decision.decided_at.to_rfc3339(), "case.finalDecision.decidedAt"),
            citation,
            rejection_justification,
            reviewer_comment: CardField::from_option(decision.comment.as_deref(), "case.finalDecision.comment"),
        },
        sign_off: SignOffBlock::unsigned(),
    })
}

fn claimant_block(source: &CardSource) -> ClaimantBlock {
    let Some(subject) = &source.subject else {
        return ClaimantBlock {
            name: CardField::placeholder(),
            surname: CardField::placeholder(),
            national_id: CardField::placeholder(),
            nip: CardField::placeholder(),
            regon: CardField::placeholder(),
            residential_address: CardField::placeholder(),
            correspondence_address: CardField::placeholder(),
            business_address: CardField::placeholder(),
        };
    };

    let address = |id: Option<AddressId>, role: &str| -> CardField {
        id.and_then(|id| source.addresses.get(&id).map(|a| (id, a)))
            .and_then(|(id, a)| a.one_line().map(|line| CardField::value(line, format!("addresses[{}].{}", id.0, role))))
            .unwrap_or_else(CardField::placeholder)
    };

    ClaimantBlock {
        name: CardField::from_option(subject.name.as_deref(), "subject.name"),
        surname: CardField::from_option(subject.surname.as_deref(), "subject.surname"),
        national_id: CardField::from_option(subject.national_id.as_deref(), "subject.nationalId"),
        nip: CardField::from_option(subject.nip.as_deref(), "subject.nip"),
        regon: CardField::from_option(subject.regon.as_deref(), "subject.regon"),
        residential_address: address(subject.residential_address, "residential"),
        correspondence_address: address(subject.correspondence_address, "correspondence"),
        business_address: address(subject.business_address, "business"),
    }
}

/// Extracted facts of the case's files, in case order.
fn case_facts(source: &CardSource) -> Vec<(&FileRecord, &AccidentFacts)> {
    source
        .case
        .file_ids
        .iter()
        .filter_map(|id| source.files.iter().find(|f| &f.id == id))
        .filter_map(|f| f.extracted.as_ref().map(|e| (f, &e.payload)))
        .collect()
}

fn first_known(
    facts: &[(&FileRecord, &AccidentFacts)],
    field: &str,
    value_of: impl Fn(&AccidentFacts) -> &Knowable<String>,
) -> CardField {
    facts
        .iter()
        .find_map(|(file, f)| {
            value_of(f)
                .known()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(|v| CardField::value(v, format!("files[{}].extracted.{}", file.id, field)))
        })
        .unwrap_or_else(CardField::placeholder)
}

fn incident_block(source: &CardSource) -> IncidentBlock {
    let facts = case_facts(source);

    IncidentBlock {
        date: first_known(&facts, "accidentDate", |f| &f.accident_date),
        time: first_known(&facts, "accidentTime", |f| &f.accident_time),
        place: first_known(&facts, "place", |f| &f.place),
        circumstances: first_known(&facts, "circumstances", |f| &f.circumstances),
        causes: first_known(&facts, "causes", |f| &f.causes),
        activities: first_known(&facts, "activitiesAtTime", |f| &f.activities_at_time),
        injury: first_known(&facts, "injuryDescription", |f| &f.injury_description),
    }
}

fn witnesses(source: &CardSource) -> Vec<CardField> {
    let mut seen: Vec<String> = Vec::new();
    let mut fields = Vec::new();

    for (file, facts) in case_facts(source) {
        for (index, witness) in facts.witnesses.iter().enumerate() {
            let name = witness.trim();
            if name.is_empty() || seen.iter().any(|s| s.eq_ignore_ascii_case(name)) {
                continue;
            }
            seen.push(name.to_string());
            fields.push(CardField::value(
                name,
                format!("files[{}].extracted.witnesses[{}]", file.id, index),
            ));
        }
    }

    if fields.is_empty() {
        fields.push(CardField::placeholder());
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::CaseAnalysis;
    use crate::types::{
        Decision, Differences, ExtractionSet, FileId, PkdCode, QualificationResult, SubjectId,
        Versioned, DEFAULT_COUNTRY,
    };
    use chrono::Utc;

    fn file(id: &str, facts: AccidentFacts) -> FileRecord {
        let now = Utc::now();
        FileRecord {
            id: FileId::from(id),
            bytes: vec![],
            original_name: format!("{}.pdf", id),
            media_type: "application/pdf".to_string(),
            content_hash: String::new(),
            extracted: Some(Versioned::current(facts)),
            created_at: now,
            updated_at: now,
        }
    }

    fn source(should_accept: bool, justification: &str, decision: Option<Decision>) -> CardSource {
        let now = Utc::now();
        let address_id = AddressId::new();
        let subject = Subject {
            id: SubjectId::new(),
            name: Some("Anna".to_string()),
            surname: Some("Kowalska".to_string()),
            national_id: Some("85010112345".to_string()),
            nip: None,
            regon: None,
            pkd_codes: vec![PkdCode::new("43.21.Z", "Wykonywanie instalacji elektrycznych")],
            residential_address: Some(address_id),
            correspondence_address: None,
            business_address: None,
        };
        let address = Address {
            street: Some("Długa".to_string()),
            house_number: Some("5".to_string()),
            apartment_number: None,
            postal_code: Some("30-001".to_string()),
            city: Some("Kraków".to_string()),
            country: DEFAULT_COUNTRY.to_string(),
        };

        let first = AccidentFacts {
            accident_date: Knowable::Known("2024-03-12".to_string()),
            place: Knowable::Unknown,
            witnesses: vec!["Jan Nowak".to_string()],
            ..Default::default()
        };
        let second = AccidentFacts {
            accident_date: Knowable::Known("2024-03-12".to_string()),
            place: Knowable::Known("Kraków, ul. Zielona 3".to_string()),
            circumstances: Knowable::Known("Upadek z drabiny podczas montażu".to_string()),
            witnesses: vec!["jan nowak".to_string(), "Piotr Zieliński".to_string()],
            ..Default::default()
        };

        let mut case = Case::new(Some(subject.id), vec![FileId::from("f1"), FileId::from("f2")], now);
        case.begin_processing(now).unwrap();
        case.record_analysis(
            CaseAnalysis {
                extraction: ExtractionSet::default(),
                consistency: Differences::unchecked("test"),
                qualification: Some(QualificationResult {
                    should_accept,
                    short_explanation: "Krótko".to_string(),
                    pkd_probability: 70,
                    detailed_justification: justification.to_string(),
                    notes: "Brak uwag.".to_string(),
                    conditions: vec![],
                }),
            },
            now,
        )
        .unwrap();
        if let Some(decision) = decision {
            case.apply_decision(decision, Some("Decyzja recenzenta".to_string()), now).unwrap();
        }

        CardSource {
            case,
            subject: Some(subject),
            addresses: HashMap::from([(address_id, address)]),
            files: vec![file("f1", first), file("f2", second)],
        }
    }

    #[test]
    fn test_affirmative_card_uses_found_citation() {
        let source = source(true, "Zgodnie z art. 3 ust. 3 pkt 8 ustawy wypadkowej.", Some(Decision::Accepted));
        let card = generate(&source, &CardConfig::default()).unwrap();

        let citation = card.qualification.citation.unwrap();
        assert_eq!(citation.text(), "art. 3 ust. 3 pkt 8");
        assert!(card.qualification.rejection_justification.is_none());
    }

    #[test]
    fn test_affirmative_card_falls_back_to_default_citation() {
        let source = source(true, "Wszystkie przesłanki spełnione.", Some(Decision::Accepted));
        let card = generate(&source, &CardConfig::default()).unwrap();
        assert_eq!(card.qualification.citation.unwrap().text(), DEFAULT_CITATION);
    }

    #[test]
    fn test_negative_card_copies_justification() {
        let justification = "Brak przyczyny zewnętrznej. Zdarzenie wynikło z choroby samoistnej.";
        let source = source(false, justification, Some(Decision::Failed));
        let card = generate(&source, &CardConfig::default()).unwrap();

        assert!(card.qualification.citation.is_none());
        assert_eq!(card.qualification.rejection_justification.unwrap().text(), justification);
    }

    #[test]
    fn test_incident_uses_first_known_values() {
        let source = source(true, "ok", Some(Decision::Accepted));
        let card = generate(&source, &CardConfig::default()).unwrap();

        assert_eq!(
            card.incident.date,
            CardField::value("2024-03-12", "files[f1].extracted.accidentDate")
        );
        assert_eq!(
            card.incident.place,
            CardField::value("Kraków, ul. Zielona 3", "files[f2].extracted.place")
        );
        assert!(card.incident.time.is_placeholder());
        assert_eq!(card.witnesses.len(), 2);
        assert!(card.payer.address.is_placeholder());
        assert!(card.claimant.nip.is_placeholder());
        assert!(card.sign_off.reviewer_name.is_placeholder());
    }

    #[test]
    fn test_card_values_trace_to_input() {
        let source = source(true, "Zgodnie z art. 3 ust. 3 pkt 8 ustawy.", Some(Decision::Accepted));
        let config = CardConfig::default();
        let card = generate(&source, &config).unwrap();

        let mut inputs = serde_json::to_string(&source.case).unwrap();
        inputs.push_str(&serde_json::to_string(&source.subject).unwrap());
        inputs.push_str(&serde_json::to_string(&source.files).unwrap());
        inputs.push_str(&serde_json::to_string(&config).unwrap());

        for (position, field) in card.fields() {
            if let CardField::Value { value, source: origin } = field {
                assert!(!origin.is_empty(), "{} has no source", position);
                if origin.starts_with("addresses[") {
                    let address = source.addresses.values().next().unwrap();
                    assert_eq!(Some(value.clone()), address.one_line());
                } else if origin == "case.finalDecision.decidedAt" {
                    let decided_at = source.case.final_decision.as_ref().unwrap().decided_at;
                    assert_eq!(value, &decided_at.to_rfc3339());
                } else {
                    assert!(inputs.contains(value.as_str()), "{} = {} not in input", position, value);
                }
            }
        }
    }

    #[test]
    fn test_unqualified_case_is_rejected() {
        let mut source = source(true, "ok", None);
        source.case.qualification = None;
        assert!(matches!(
            generate(&source, &CardConfig::default()),
            Err(CardError::NotQualified(_))
        ));
    }

    #[test]
    fn test_open_case_is_rejected() {
        let source = source(true, "ok", None);
        assert!(matches!(
            generate(&source, &CardConfig::default()),
            Err(CardError::NotFinalized { status: CaseStatus::Processing, .. })
        ));
    }

    #[test]
    fn test_missing_subject_renders_placeholders() {
        let mut source = source(true, "ok", Some(Decision::Accepted));
        source.subject = None;
        let card = generate(&source, &CardConfig::default()).unwrap();
        assert!(card.claimant.name.is_placeholder());
        assert!(card.claimant.residential_address.is_placeholder());
    }
}
