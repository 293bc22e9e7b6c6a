//! Legal qualification.
//!
//! Combines the five condition findings, the medical opinion and the PKD
//! match probability into one recommendation. The decision is a pure
//! function of its inputs and the policy threshold; only the justification
//! prose may come from elsewhere.

use serde::{Deserialize, Serialize};

use crate::criteria::{evaluate_all, ConditionFindings, StatutoryCondition};
use crate::error::AdjudicationError;
use crate::pkd::pkd_probability;
use crate::types::{QualificationInput, QualificationResult};

/// Default minimum PKD match probability for acceptance.
pub const DEFAULT_ACCEPTANCE_THRESHOLD: u8 = 40;

const NO_REMARKS: &str = "Brak uwag.";

/// Policy knobs for qualification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationPolicy {
    #[serde(default = "default_threshold")]
    pub acceptance_threshold: u8,
}

fn default_threshold() -> u8 {
    DEFAULT_ACCEPTANCE_THRESHOLD
}

impl Default for QualificationPolicy {
    fn default() -> Self {
        Self {
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
        }
    }
}

impl QualificationInput {
    /// Reject inputs that cannot be qualified at all.
    pub fn validate(&self) -> Result<(), AdjudicationError> {
        if self.accident_description.trim().is_empty() {
            return Err(AdjudicationError::Validation(
                "accidentDescription is required".to_string(),
            ));
        }
        if self.activities_performed.trim().is_empty() {
            return Err(AdjudicationError::Validation(
                "activitiesPerformed is required".to_string(),
            ));
        }
        if self.pkd_codes.iter().any(|c| c.code.trim().is_empty()) {
            return Err(AdjudicationError::Validation(
                "pkdCodes must not contain blank codes".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the medical opinion explicitly denies a qualifying injury.
    pub fn doctor_contradicts_injury(&self) -> bool {
        self.doctor_opinion
            .as_ref()
            .is_some_and(|o| !o.injuries_match_definition)
    }
}

/// The legal qualifier.
#[derive(Debug, Clone, Default)]
pub struct Qualifier {
    policy: QualificationPolicy,
}

impl Qualifier {
    pub fn new(policy: QualificationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &QualificationPolicy {
        &self.policy
    }

    /// Qualify using the built-in rule tables only.
    pub fn qualify(&self, input: &QualificationInput) -> Result<QualificationResult, AdjudicationError> {
        input.validate()?;
        Ok(self.decide(input, evaluate_all(input), None))
    }

    /// Decide from already evaluated findings.
    ///
    /// `detailed_justification` replaces the generated justification when
    /// present and non-blank.
    pub fn decide(
        &self,
        input: &QualificationInput,
        findings: ConditionFindings,
        detailed_justification: Option<&str>,
    ) -> QualificationResult {
        let pkd = pkd_probability(&input.activities_performed, &input.pkd_codes);
        self.conclude(input, findings, pkd, detailed_justification)
    }

    /// Decide with a given PKD probability.
    ///
    /// Without PKD codes the probability is forced to 0.
    pub fn conclude(
        &self,
        input: &QualificationInput,
        findings: ConditionFindings,
        pkd_probability: u8,
        detailed_justification: Option<&str>,
    ) -> QualificationResult {
        let pkd = if input.pkd_codes.is_empty() {
            0
        } else {
            pkd_probability.min(100)
        };

        let blockers = self.blocking_reasons(input, &findings, pkd);
        let should_accept = blockers.is_empty();

        let short_explanation = match blockers.first() {
            None => "Zdarzenie spełnia definicję wypadku przy prowadzeniu pozarolniczej działalności.".to_string(),
            Some(reason) => format!("Zdarzenie nie spełnia definicji wypadku: {}", reason),
        };

        let detailed_justification = detailed_justification
            .map(str::trim)
            .filter(|j| !j.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.build_justification(&findings, pkd, should_accept));

        let notes = self.build_notes(input, &findings, pkd);

        tracing::debug!(
            should_accept,
            pkd_probability = pkd,
            threshold = self.policy.acceptance_threshold,
            "Qualification concluded"
        );

        QualificationResult {
            should_accept,
            short_explanation,
            pkd_probability: pkd,
            detailed_justification,
            notes,
            conditions: findings.to_vec(),
        }
    }

    fn blocking_reasons(
        &self,
        input: &QualificationInput,
        findings: &ConditionFindings,
        pkd: u8,
    ) -> Vec<String> {
        let mut reasons = Vec::new();

        for finding in findings.unaffirmed() {
            reasons.push(format!(
                "niespełniony warunek „{}”.",
                finding.condition.label()
            ));
        }

        if input.doctor_contradicts_injury() && findings.injury.affirmed {
            reasons.push("opinia lekarska nie potwierdza urazu.".to_string());
        }

        if input.pkd_codes.is_empty() {
            reasons.push("brak zarejestrowanych kodów PKD.".to_string());
        } else if pkd < self.policy.acceptance_threshold {
            reasons.push(format!(
                "zgodność czynności z kodami PKD ({}%) poniżej progu {}%.",
                pkd, self.policy.acceptance_threshold
            ));
        }

        reasons
    }

    fn build_justification(&self, findings: &ConditionFindings, pkd: u8, accepted: bool) -> String {
        let mut lines: Vec<String> = findings
            .iter()
            .map(|f| {
                format!(
                    "{}: {}. {}",
                    capitalize(f.condition.label()),
                    if f.affirmed { "spełniony" } else { "niespełniony" },
                    f.justification
                )
            })
            .collect();

        lines.push(format!(
            "Prawdopodobieństwo zgodności czynności z zarejestrowaną działalnością (PKD): {}%.",
            pkd
        ));
        lines.push(if accepted {
            "Wszystkie przesłanki definicji wypadku zostały spełnione.".to_string()
        } else {
            "Nie wszystkie przesłanki definicji wypadku zostały spełnione.".to_string()
        });

        lines.join("\n")
    }

    fn build_notes(&self, input: &QualificationInput, findings: &ConditionFindings, pkd: u8) -> String {
        let mut notes = Vec::new();

        if input.pkd_codes.is_empty() {
            notes.push(
                "Brak kodów PKD: należy uzupełnić kody działalności z wpisu do CEIDG.".to_string(),
            );
        }
        if input.doctor_opinion.is_none() {
            notes.push(
                "Brak opinii lekarskiej: należy uzyskać opinię lekarza orzecznika co do charakteru urazu."
                    .to_string(),
            );
        }

        for condition in StatutoryCondition::ALL {
            let finding = findings.get(condition);
            if !finding.affirmed {
                notes.push(format!(
                    "Niespełniony warunek „{}”: {} Zalecane: {}.",
                    condition.label(),
                    finding.justification,
                    condition.remedy()
                ));
            }
        }

        if input.doctor_contradicts_injury() && findings.injury.affirmed {
            notes.push("Opinia lekarska nie potwierdza urazu w rozumieniu ustawy.".to_string());
        }

        if !input.pkd_codes.is_empty() && pkd < self.policy.acceptance_threshold {
            notes.push(format!(
                "Niska zgodność czynności z kodami PKD ({}% < {}%): należy wykazać związek czynności z zarejestrowaną działalnością.",
                pkd, self.policy.acceptance_threshold
            ));
        }

        if notes.is_empty() {
            NO_REMARKS.to_string()
        } else {
            notes.join("\n")
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
