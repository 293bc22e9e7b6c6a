//! Shared domain types for claim adjudication.
//!
//! Everything an oracle produces is represented here as an explicit,
//! versioned structure. Absent facts are modelled with [`Knowable::Unknown`]
//! so downstream logic can tell "checked and absent" from "not checked".

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Schema version stamped on every persisted AI-derived payload.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Country recorded on addresses that do not name one.
pub const DEFAULT_COUNTRY: &str = "Polska";

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of a [`Case`](crate::Case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(pub Uuid);

impl CaseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a claimant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub Uuid);

impl SubjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a stored address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressId(pub Uuid);

impl AddressId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AddressId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of an uploaded evidentiary file.
///
/// Opaque string so identifiers handed out by an upstream oracle file store
/// can be kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    /// Generate a fresh local identifier.
    pub fn generate() -> Self {
        Self(format!("file-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FileId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Knowable values
// ============================================================================

/// Markers an oracle uses for "the document does not say".
const UNKNOWN_MARKERS: &[&str] = &["unknown", "nieznane", "nieznany", "brak danych", "n/a", ""];

/// A fact that is either known from the evidence or explicitly unknown.
///
/// Serializes `Unknown` as the string `"unknown"`. Deserializes `null`, a
/// missing field (with `#[serde(default)]`) or any unknown marker string to
/// `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Knowable<T> {
    Known(T),
    Unknown,
}

impl<T> Default for Knowable<T> {
    fn default() -> Self {
        Knowable::Unknown
    }
}

impl<T> Knowable<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Knowable::Known(v) => Some(v),
            Knowable::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Knowable::Known(_))
    }
}

impl<T> From<Option<T>> for Knowable<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Knowable::Unknown, Knowable::Known)
    }
}

impl<T: Serialize> Serialize for Knowable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Knowable::Known(v) => v.serialize(serializer),
            Knowable::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Knowable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        match value {
            None | Some(serde_json::Value::Null) => Ok(Knowable::Unknown),
            Some(serde_json::Value::String(s))
                if UNKNOWN_MARKERS.contains(&s.trim().to_lowercase().as_str()) =>
            {
                Ok(Knowable::Unknown)
            }
            Some(v) => serde_json::from_value(v)
                .map(Knowable::Known)
                .map_err(D::Error::custom),
        }
    }
}

/// A payload wrapped with the schema version it was produced under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Versioned<T> {
    pub schema_version: u32,
    pub payload: T,
}

impl<T> Versioned<T> {
    pub fn current(payload: T) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

// ============================================================================
// Extraction record
// ============================================================================

/// Classification of the injury described in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InjuryType {
    VisiblePhysical,
    InternalPhysical,
    Psychological,
    PreExistingAggravation,
    PainOnly,
    Mixed,
    #[default]
    Unknown,
}

impl InjuryType {
    pub const ALL: [InjuryType; 7] = [
        InjuryType::VisiblePhysical,
        InjuryType::InternalPhysical,
        InjuryType::Psychological,
        InjuryType::PreExistingAggravation,
        InjuryType::PainOnly,
        InjuryType::Mixed,
        InjuryType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InjuryType::VisiblePhysical => "visible-physical",
            InjuryType::InternalPhysical => "internal-physical",
            InjuryType::Psychological => "psychological",
            InjuryType::PreExistingAggravation => "pre-existing-condition-aggravation",
            InjuryType::PainOnly => "pain-only-no-visible-damage",
            InjuryType::Mixed => "mixed",
            InjuryType::Unknown => "unknown",
        }
    }

    /// Description used when instructing the oracle.
    pub fn description(&self) -> &'static str {
        match self {
            InjuryType::VisiblePhysical => "visible physical damage (wound, fracture, burn)",
            InjuryType::InternalPhysical => "internal physical damage (concussion, internal bleeding)",
            InjuryType::Psychological => "psychological injury (e.g. acute stress reaction)",
            InjuryType::PreExistingAggravation => "aggravation of a pre-existing condition",
            InjuryType::PainOnly => "pain reported without visible damage",
            InjuryType::Mixed => "more than one of the above",
            InjuryType::Unknown => "the documents do not allow classification",
        }
    }
}

impl FromStr for InjuryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "pre-existing-aggravation" => return Ok(InjuryType::PreExistingAggravation),
            "pain-only" => return Ok(InjuryType::PainOnly),
            _ => {}
        }
        InjuryType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("unknown injury type '{}'", s))
    }
}

impl Serialize for InjuryType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InjuryType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .and_then(|s| s.parse().ok())
            .unwrap_or(InjuryType::Unknown))
    }
}

/// The draft decision a document analysis suggests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DraftDecision {
    Accept,
    Reject,
    #[default]
    #[serde(alias = "needs_more_information", alias = "NEED_MORE_INFO")]
    NeedsMoreInformation,
}

/// Statutory criterion a document-level justification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionCriterion {
    #[serde(alias = "nagłość")]
    Suddenness,
    #[serde(alias = "przyczyna zewnętrzna", alias = "external_cause")]
    ExternalCause,
    #[serde(alias = "uraz")]
    Injury,
    #[serde(alias = "związek z pracą", alias = "work_relation")]
    WorkRelation,
}

/// Justification the oracle gave for one criterion, per document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionJustification {
    pub criterion: ExtractionCriterion,
    pub justification: String,
}

/// Structured facts extracted from one evidentiary document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccidentFacts {
    #[serde(default)]
    pub accident_date: Knowable<String>,
    #[serde(default)]
    pub accident_time: Knowable<String>,
    #[serde(default)]
    pub place: Knowable<String>,
    #[serde(default)]
    pub country: Knowable<String>,
    #[serde(default)]
    pub circumstances: Knowable<String>,
    #[serde(default)]
    pub causes: Knowable<String>,
    #[serde(default)]
    pub activities_at_time: Knowable<String>,
    #[serde(default)]
    pub injury_present: Knowable<bool>,
    #[serde(default)]
    pub injury_description: Knowable<String>,
    #[serde(default)]
    pub injury_type: InjuryType,
    #[serde(default)]
    pub medical_evidence: Knowable<bool>,
    #[serde(default)]
    pub draft_decision: DraftDecision,
    #[serde(default)]
    pub justifications: Vec<CriterionJustification>,
    #[serde(default)]
    pub witnesses: Vec<String>,
}

/// Facts extracted from one file, tagged with the file they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFile {
    pub file_id: FileId,
    pub original_name: String,
    pub facts: AccidentFacts,
}

/// An extraction that did not produce facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedExtraction {
    pub file_id: FileId,
    pub message: String,
}

/// Aggregated extraction output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSet {
    pub files: Vec<ExtractedFile>,
    #[serde(default)]
    pub missing_file_ids: Vec<FileId>,
    #[serde(default)]
    pub failed: Vec<FailedExtraction>,
}

// ============================================================================
// Stored records
// ============================================================================

/// One uploaded evidentiary document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: FileId,
    #[serde(with = "bytes_as_len", default)]
    pub bytes: Vec<u8>,
    pub original_name: String,
    pub media_type: String,
    pub content_hash: String,
    pub extracted: Option<Versioned<AccidentFacts>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw bytes are never echoed into JSON views; only their length is.
mod bytes_as_len {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(bytes.len() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        serde::de::IgnoredAny::deserialize(deserializer)?;
        Ok(Vec::new())
    }
}

/// A registered business-activity code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkdCode {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl PkdCode {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: Some(description.into()),
        }
    }
}

/// A postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub house_number: Option<String>,
    #[serde(default)]
    pub apartment_number: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

impl Address {
    /// Single-line rendering; `None` when no component is known.
    pub fn one_line(&self) -> Option<String> {
        let mut street = self.street.clone().unwrap_or_default();
        if let Some(house) = &self.house_number {
            street = format!("{} {}", street, house).trim().to_string();
            if let Some(apartment) = &self.apartment_number {
                street = format!("{}/{}", street, apartment);
            }
        }
        let city = [self.postal_code.as_deref(), self.city.as_deref()]
            .iter()
            .flatten()
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        let parts: Vec<String> = [street, city]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(format!("{}, {}", parts.join(", "), self.country))
        }
    }
}

/// Claimant identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub national_id: Option<String>,
    pub nip: Option<String>,
    pub regon: Option<String>,
    #[serde(default)]
    pub pkd_codes: Vec<PkdCode>,
    #[serde(default)]
    pub residential_address: Option<AddressId>,
    #[serde(default)]
    pub correspondence_address: Option<AddressId>,
    #[serde(default)]
    pub business_address: Option<AddressId>,
}

// ============================================================================
// Consistency report
// ============================================================================

/// Severity of a cross-document difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// One contradiction between source documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Difference {
    pub field: String,
    pub details: String,
    pub source_documents: Vec<String>,
    pub severity: Severity,
}

/// Result of cross-document consistency checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Differences {
    pub differences: Vec<Difference>,
    pub all_dates_consistent: bool,
    pub all_times_consistent: bool,
    pub all_statements_consistent: bool,
    pub summary: String,
    pub is_in_general_consistent: bool,
}

// ============================================================================
// Qualification
// ============================================================================

/// Medical opinion on whether the injuries match the statutory definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorOpinion {
    pub injuries_match_definition: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Input to the legal qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationInput {
    pub accident_description: String,
    pub activities_performed: String,
    #[serde(default)]
    pub pkd_codes: Vec<PkdCode>,
    #[serde(default)]
    pub doctor_opinion: Option<DoctorOpinion>,
}

/// Output of the legal qualifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationResult {
    pub should_accept: bool,
    pub short_explanation: String,
    pub pkd_probability: u8,
    pub detailed_justification: String,
    pub notes: String,
    #[serde(default)]
    pub conditions: Vec<crate::criteria::ConditionFinding>,
}

// ============================================================================
// Decisions and lifecycle
// ============================================================================

/// Lifecycle state of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    Pending,
    Processing,
    Accepted,
    Failed,
}

impl CaseStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaseStatus::Accepted | CaseStatus::Failed)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaseStatus::Pending => "PENDING",
            CaseStatus::Processing => "PROCESSING",
            CaseStatus::Accepted => "ACCEPTED",
            CaseStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// A reviewer action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Accepted,
    Failed,
    NeedMoreInfo,
}

impl Decision {
    /// The terminal verdict this action produces, if any.
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            Decision::Accepted => Some(Verdict::Accepted),
            Decision::Failed => Some(Verdict::Failed),
            Decision::NeedMoreInfo => None,
        }
    }
}

/// A terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Accepted,
    Failed,
}

impl Verdict {
    pub fn status(&self) -> CaseStatus {
        match self {
            Verdict::Accepted => CaseStatus::Accepted,
            Verdict::Failed => CaseStatus::Failed,
        }
    }
}

/// The terminal decision recorded on a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalDecision {
    pub decision: Verdict,
    pub comment: Option<String>,
    pub decided_at: DateTime<Utc>,
    /// True when the pipeline, not a reviewer, closed the case.
    #[serde(default)]
    pub automated: bool,
}

/// One reviewer annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewNote {
    pub comment: String,
    pub recorded_at: DateTime<Utc>,
}

/// Reviewer-supplied annotations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanReview {
    #[serde(default)]
    pub notes: Vec<ReviewNote>,
    #[serde(default)]
    pub doctor_opinion: Option<DoctorOpinion>,
}

/// Pipeline stage that talks to the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Extraction,
    Consistency,
    Qualification,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Extraction => "extraction",
            PipelineStage::Consistency => "consistency",
            PipelineStage::Qualification => "qualification",
        };
        f.write_str(s)
    }
}

/// Category of a recorded stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Oracle,
    Parse,
    MalformedQualification,
    Validation,
}

/// Diagnostic record of the last failed pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageFailure {
    pub stage: PipelineStage,
    pub kind: FailureKind,
    pub message: String,
    #[serde(default)]
    pub raw_response: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knowable_unknown_markers() {
        let facts: AccidentFacts = serde_json::from_value(serde_json::json!({
            "accidentDate": "2024-03-12",
            "place": "unknown",
            "circumstances": null,
            "causes": "nieznane",
            "injuryPresent": true
        }))
        .unwrap();

        assert_eq!(facts.accident_date, Knowable::Known("2024-03-12".to_string()));
        assert_eq!(facts.place, Knowable::Unknown);
        assert_eq!(facts.circumstances, Knowable::Unknown);
        assert_eq!(facts.causes, Knowable::Unknown);
        assert_eq!(facts.accident_time, Knowable::Unknown);
        assert_eq!(facts.injury_present, Knowable::Known(true));
        assert_eq!(facts.medical_evidence, Knowable::Unknown);
    }

    #[test]
    fn test_knowable_serializes_unknown_explicitly() {
        let facts = AccidentFacts::default();
        let value = serde_json::to_value(&facts).unwrap();
        assert_eq!(value["place"], "unknown");
        assert_eq!(value["injuryPresent"], "unknown");
        assert_eq!(value["injuryType"], "unknown");
    }

    #[test]
    fn test_injury_type_parsing() {
        assert_eq!("visible-physical".parse::<InjuryType>(), Ok(InjuryType::VisiblePhysical));
        assert_eq!("Pain Only".parse::<InjuryType>(), Ok(InjuryType::PainOnly));
        assert_eq!(
            "pain-only-no-visible-damage".parse::<InjuryType>(),
            Ok(InjuryType::PainOnly)
        );
        assert_eq!(
            "pre-existing-condition-aggravation".parse::<InjuryType>(),
            Ok(InjuryType::PreExistingAggravation)
        );
        assert_eq!(
            "pre_existing_aggravation".parse::<InjuryType>(),
            Ok(InjuryType::PreExistingAggravation)
        );
        assert_eq!(
            serde_json::to_value(InjuryType::PainOnly).unwrap(),
            serde_json::json!("pain-only-no-visible-damage")
        );
        assert!("broken".parse::<InjuryType>().is_err());

        let parsed: InjuryType = serde_json::from_str("\"something else\"").unwrap();
        assert_eq!(parsed, InjuryType::Unknown);
    }

    #[test]
    fn test_address_defaults_country() {
        let address: Address = serde_json::from_value(serde_json::json!({
            "street": "Długa",
            "houseNumber": "5",
            "apartmentNumber": "2",
            "postalCode": "00-001",
            "city": "Warszawa"
        }))
        .unwrap();

        assert_eq!(address.country, DEFAULT_COUNTRY);
        assert_eq!(address.one_line().unwrap(), "Długa 5/2, 00-001 Warszawa, Polska");
    }

    #[test]
    fn test_empty_address_has_no_rendering() {
        let address = Address {
            street: None,
            house_number: None,
            apartment_number: None,
            postal_code: None,
            city: None,
            country: DEFAULT_COUNTRY.to_string(),
        };
        assert!(address.one_line().is_none());
    }

    #[test]
    fn test_decision_verdicts() {
        assert_eq!(Decision::Accepted.verdict(), Some(Verdict::Accepted));
        assert_eq!(Decision::NeedMoreInfo.verdict(), None);
        let parsed: Decision = serde_json::from_str("\"NEED_MORE_INFO\"").unwrap();
        assert_eq!(parsed, Decision::NeedMoreInfo);
    }

    #[test]
    fn test_case_status_terminal() {
        assert!(CaseStatus::Accepted.is_terminal());
        assert!(CaseStatus::Failed.is_terminal());
        assert!(!CaseStatus::Processing.is_terminal());
        assert_eq!(CaseStatus::Pending.to_string(), "PENDING");
    }
}
