//! Cross-document consistency.
//!
//! Dates, times and places are compared here, deterministically. Narrative
//! contradictions come from the oracle, but the aggregate flags are always
//! computed locally from the merged difference list.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;

use crate::criteria::patterns::fold;
use crate::response::NarrativeAssessment;
use crate::types::{Difference, Differences, ExtractedFile, Knowable, Severity};

pub const DATE_FIELD: &str = "data wypadku";
pub const TIME_FIELD: &str = "godzina wypadku";
pub const PLACE_FIELD: &str = "miejsce wypadku";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d-%m-%Y", "%d/%m/%Y", "%Y.%m.%d", "%Y/%m/%d"];

lazy_static! {
    static ref CLOCK: Regex = Regex::new(r"(\d{1,2})\s*[:.]\s*(\d{2})").unwrap();
    static ref HOUR_ONLY: Regex = Regex::new(r"^\D*(\d{1,2})\D*$").unwrap();
    static ref NON_WORD: Regex = Regex::new(r"[^\p{L}\p{N}]+").unwrap();
}

type FieldComparison = (
    &'static str,
    Severity,
    fn(&ExtractedFile) -> &Knowable<String>,
    fn(&str) -> String,
);

fn date_of(file: &ExtractedFile) -> &Knowable<String> {
    &file.facts.accident_date
}

fn time_of(file: &ExtractedFile) -> &Knowable<String> {
    &file.facts.accident_time
}

fn place_of(file: &ExtractedFile) -> &Knowable<String> {
    &file.facts.place
}

/// Compare dates, times and places across the extracted documents.
///
/// Unknown values are skipped. Each field yields at most one difference,
/// listing every document that reported a value.
pub fn compare_facts(files: &[ExtractedFile]) -> Vec<Difference> {
    let mut differences = Vec::new();

    let fields: [FieldComparison; 3] = [
        (DATE_FIELD, Severity::High, date_of, normalize_date),
        (TIME_FIELD, Severity::Medium, time_of, normalize_time),
        (PLACE_FIELD, Severity::Medium, place_of, normalize_place),
    ];

    for (field, severity, value_of, normalize) in fields {
        if let Some(difference) = compare_field(files, field, severity, value_of, normalize) {
            differences.push(difference);
        }
    }

    differences
}

fn compare_field(
    files: &[ExtractedFile],
    field: &str,
    severity: Severity,
    value_of: fn(&ExtractedFile) -> &Knowable<String>,
    normalize: fn(&str) -> String,
) -> Option<Difference> {
    // normalized value -> (first original spelling, reporting documents)
    let mut groups: BTreeMap<String, (String, Vec<String>)> = BTreeMap::new();
    let mut reporters = Vec::new();

    for file in files {
        let Some(raw) = value_of(file).known() else {
            continue;
        };
        if raw.trim().is_empty() {
            continue;
        }
        let name = document_name(file);
        let entry = groups
            .entry(normalize(raw))
            .or_insert_with(|| (raw.trim().to_string(), Vec::new()));
        entry.1.push(name.clone());
        reporters.push(name);
    }

    if groups.len() < 2 {
        return None;
    }

    let details = groups
        .values()
        .map(|(value, docs)| format!("„{}” ({})", value, docs.join(", ")))
        .collect::<Vec<_>>()
        .join("; ");

    Some(Difference {
        field: field.to_string(),
        details: format!("Rozbieżne wartości: {}", details),
        source_documents: reporters,
        severity,
    })
}

fn document_name(file: &ExtractedFile) -> String {
    if file.original_name.trim().is_empty() {
        file.file_id.to_string()
    } else {
        file.original_name.clone()
    }
}

fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| fold(trimmed))
}

fn normalize_time(raw: &str) -> String {
    let clock = CLOCK
        .captures(raw)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .or_else(|| {
            HOUR_ONLY
                .captures(raw)
                .map(|caps| (caps[1].to_string(), "00".to_string()))
        });

    clock
        .and_then(|(h, m)| NaiveTime::from_hms_opt(h.parse().ok()?, m.parse().ok()?, 0))
        .map(|time| time.format("%H:%M").to_string())
        .unwrap_or_else(|| fold(raw.trim()))
}

fn normalize_place(raw: &str) -> String {
    NON_WORD.replace_all(&fold(raw), " ").trim().to_string()
}

/// Merge deterministic differences with the oracle narrative comparison.
///
/// Differences are sorted by `(field, details)` and deduplicated, so the
/// same input always yields the same report.
pub fn aggregate(deterministic: Vec<Difference>, narrative: Option<NarrativeAssessment>) -> Differences {
    let (narrative_differences, narrative_summary) = match narrative {
        Some(n) => (n.differences, Some(n.summary)),
        None => (Vec::new(), None),
    };

    let mut differences: Vec<Difference> = deterministic
        .into_iter()
        .chain(narrative_differences)
        .map(with_field_severity)
        .collect();
    differences.sort_by(|a, b| (&a.field, &a.details).cmp(&(&b.field, &b.details)));
    differences.dedup_by(|a, b| a.field == b.field && a.details == b.details);

    let mut summary = describe(&differences);
    if let Some(narrative) = narrative_summary.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
        summary = format!("{} {}", summary, narrative);
    }

    build(differences, summary)
}

/// Date conflicts are always high severity and time conflicts medium,
/// whatever the oracle reported.
fn with_field_severity(mut difference: Difference) -> Difference {
    match difference.field.as_str() {
        DATE_FIELD => difference.severity = Severity::High,
        TIME_FIELD => difference.severity = Severity::Medium,
        _ => {}
    }
    difference
}

/// Report for when the narrative comparison could not run.
///
/// Keeps whatever the deterministic comparison found; with nothing found
/// this is the same as [`Differences::unchecked`].
pub fn degraded(deterministic: Vec<Difference>, reason: &str) -> Differences {
    if deterministic.is_empty() {
        return Differences::unchecked(reason);
    }
    let mut report = aggregate(deterministic, None);
    report.summary = format!(
        "{} Automatyczne porównanie opisów zdarzenia nie mogło zostać wykonane ({}).",
        report.summary, reason
    );
    report
}

impl Differences {
    /// Report used when automated checking could not run at all.
    pub fn unchecked(reason: &str) -> Self {
        Self {
            differences: Vec::new(),
            all_dates_consistent: true,
            all_times_consistent: true,
            all_statements_consistent: true,
            summary: format!(
                "Automatyczna weryfikacja spójności nie mogła zostać wykonana ({}). Zalecana ręczna weryfikacja dokumentów.",
                reason
            ),
            is_in_general_consistent: true,
        }
    }
}

fn build(differences: Vec<Difference>, summary: String) -> Differences {
    let all_dates_consistent = !differences.iter().any(|d| d.field == DATE_FIELD);
    let all_times_consistent = !differences.iter().any(|d| d.field == TIME_FIELD);
    let all_statements_consistent = differences
        .iter()
        .all(|d| d.field == DATE_FIELD || d.field == TIME_FIELD);
    let is_in_general_consistent =
        differences.is_empty() || differences.iter().all(|d| d.severity == Severity::Low);

    Differences {
        differences,
        all_dates_consistent,
        all_times_consistent,
        all_statements_consistent,
        summary,
        is_in_general_consistent,
    }
}

fn describe(differences: &[Difference]) -> String {
    if differences.is_empty() {
        return "Nie stwierdzono rozbieżności między dokumentami.".to_string();
    }
    let mut fields: Vec<&str> = differences.iter().map(|d| d.field.as_str()).collect();
    fields.dedup();
    format!(
        "Stwierdzono rozbieżności ({}) w polach: {}.",
        differences.len(),
        fields.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccidentFacts, FileId};
    use proptest::prelude::*;

    fn file(name: &str, date: Option<&str>, time: Option<&str>, place: Option<&str>) -> ExtractedFile {
        ExtractedFile {
            file_id: FileId::from(name),
            original_name: name.to_string(),
            facts: AccidentFacts {
                accident_date: date.map(str::to_string).into(),
                accident_time: time.map(str::to_string).into(),
                place: place.map(str::to_string).into(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_time_mismatch_is_medium() {
        let files = vec![
            file("zawiadomienie.pdf", Some("2024-03-12"), Some("10:00"), None),
            file("wyjasnienia.pdf", Some("12.03.2024"), Some("10:30"), None),
        ];

        let report = aggregate(compare_facts(&files), None);

        assert_eq!(report.differences.len(), 1);
        let difference = &report.differences[0];
        assert_eq!(difference.field, TIME_FIELD);
        assert_eq!(difference.severity, Severity::Medium);
        assert_eq!(difference.source_documents, vec!["zawiadomienie.pdf", "wyjasnienia.pdf"]);
        assert!(!report.all_times_consistent);
        assert!(report.all_dates_consistent);
        assert!(!report.is_in_general_consistent);
    }

    #[test]
    fn test_date_mismatch_is_high() {
        let files = vec![
            file("a.pdf", Some("2024-03-12"), None, None),
            file("b.pdf", Some("2024-03-13"), None, None),
        ];
        let report = aggregate(compare_facts(&files), None);
        assert_eq!(report.differences[0].field, DATE_FIELD);
        assert_eq!(report.differences[0].severity, Severity::High);
        assert!(!report.all_dates_consistent);
    }

    #[test]
    fn test_equivalent_spellings_agree() {
        let files = vec![
            file("a.pdf", Some("2024-03-12"), Some("9:05"), Some("Kraków, ul. Długa 5")),
            file("b.pdf", Some("12/03/2024"), Some("09.05"), Some("kraków ul długa 5")),
            file("c.pdf", None, None, None),
        ];
        let report = aggregate(compare_facts(&files), None);
        assert!(report.differences.is_empty());
        assert!(report.is_in_general_consistent);
        assert!(report.summary.contains("Nie stwierdzono"));
    }

    #[test]
    fn test_unknown_values_are_skipped() {
        let files = vec![file("a.pdf", Some("2024-03-12"), None, None), file("b.pdf", None, None, None)];
        assert!(compare_facts(&files).is_empty());
    }

    #[test]
    fn test_low_severity_only_is_consistent() {
        let narrative = NarrativeAssessment {
            differences: vec![Difference {
                field: "przyczyny".to_string(),
                details: "Drobna różnica w opisie".to_string(),
                source_documents: vec![],
                severity: Severity::Low,
            }],
            summary: "Opisy zgodne co do istoty".to_string(),
        };
        let report = aggregate(vec![], Some(narrative));
        assert!(report.is_in_general_consistent);
        assert!(!report.all_statements_consistent);
        assert!(report.summary.starts_with("Stwierdzono rozbieżności (1) w polach: przyczyny."));
        assert!(report.summary.ends_with("Opisy zgodne co do istoty"));
    }

    #[test]
    fn test_narrative_summary_never_hides_local_differences() {
        let files = vec![
            file("a.pdf", Some("2024-03-12"), Some("10:00"), None),
            file("b.pdf", Some("2024-03-13"), Some("10:30"), None),
        ];
        let narrative = NarrativeAssessment {
            differences: vec![],
            summary: "Relacje są zgodne.".to_string(),
        };
        let report = aggregate(compare_facts(&files), Some(narrative));
        assert!(!report.is_in_general_consistent);
        assert!(report.summary.contains(DATE_FIELD));
        assert!(report.summary.contains(TIME_FIELD));
        assert!(report.summary.ends_with("Relacje są zgodne."));
    }

    #[test]
    fn test_narrative_date_and_time_severity_is_fixed() {
        let low = |field: &str| Difference {
            field: field.to_string(),
            details: "Inna data w oświadczeniu".to_string(),
            source_documents: vec!["a.pdf".to_string()],
            severity: Severity::Low,
        };
        let narrative = NarrativeAssessment {
            differences: vec![low(DATE_FIELD), low(TIME_FIELD)],
            summary: String::new(),
        };
        let report = aggregate(vec![], Some(narrative));
        assert_eq!(report.differences[0].field, DATE_FIELD);
        assert_eq!(report.differences[0].severity, Severity::High);
        assert_eq!(report.differences[1].severity, Severity::Medium);
        assert!(!report.is_in_general_consistent);
        assert!(!report.all_dates_consistent);
    }

    #[test]
    fn test_unchecked_report() {
        let report = Differences::unchecked("oracle unavailable");
        assert!(report.is_in_general_consistent);
        assert!(report.differences.is_empty());
        assert!(report.summary.contains("oracle unavailable"));
        assert_eq!(degraded(vec![], "oracle unavailable"), report);
    }

    #[test]
    fn test_degraded_keeps_deterministic_findings() {
        let files = vec![
            file("a.pdf", None, Some("10:00"), None),
            file("b.pdf", None, Some("10:30"), None),
        ];
        let report = degraded(compare_facts(&files), "timeout");
        assert_eq!(report.differences.len(), 1);
        assert!(!report.all_times_consistent);
        assert!(report.summary.contains("timeout"));
    }

    #[test]
    fn test_duplicate_differences_are_merged() {
        let difference = Difference {
            field: "okoliczności".to_string(),
            details: "Sprzeczne opisy".to_string(),
            source_documents: vec!["a.pdf".to_string()],
            severity: Severity::High,
        };
        let report = aggregate(
            vec![difference.clone()],
            Some(NarrativeAssessment {
                differences: vec![difference],
                summary: String::new(),
            }),
        );
        assert_eq!(report.differences.len(), 1);
        assert!(report.summary.contains("okoliczności"));
    }

    proptest! {
        #[test]
        fn test_consistency_is_idempotent(
            values in prop::collection::vec(
                (
                    prop::option::of(prop::sample::select(vec!["2024-03-12", "12.03.2024", "2024-03-13"])),
                    prop::option::of(prop::sample::select(vec!["10:00", "10.00", "10:30", "godz. 11"])),
                    prop::option::of(prop::sample::select(vec!["Kraków", "Warszawa", "kraków"])),
                ),
                0..5,
            )
        ) {
            let files: Vec<ExtractedFile> = values
                .iter()
                .enumerate()
                .map(|(i, (d, t, p))| file(&format!("doc-{}.pdf", i), *d, *t, *p))
                .collect();

            let first = aggregate(compare_facts(&files), None);
            let second = aggregate(compare_facts(&files), None);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(
                first.is_in_general_consistent,
                first.differences.iter().all(|d| d.severity == Severity::Low)
            );
        }
    }
}
