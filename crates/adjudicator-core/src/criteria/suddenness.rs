//! Suddenness
//!
//! **Question**: Did the event happen at once, rather than through a
//! prolonged process?

use crate::types::QualificationInput;

use super::patterns::{first_match, GRADUAL_ONSET, SUDDEN_EVENT};
use super::{folded_narrative, ConditionFinding, ConditionRule, StatutoryCondition};

/// The suddenness rule.
pub struct SuddennessRule;

impl ConditionRule for SuddennessRule {
    fn condition(&self) -> StatutoryCondition {
        StatutoryCondition::Suddenness
    }

    fn evaluate(&self, input: &QualificationInput) -> ConditionFinding {
        let text = folded_narrative(input);

        if let Some((label, fragment)) = first_match(&SUDDEN_EVENT, &text) {
            return ConditionFinding::affirmed(
                self.condition(),
                format!("Opis wskazuje na nagłe zdarzenie: {} („{}”).", label, fragment),
            );
        }

        if let Some((label, fragment)) = first_match(&GRADUAL_ONSET, &text) {
            return ConditionFinding::not_affirmed(
                self.condition(),
                format!(
                    "Opis wskazuje na proces rozłożony w czasie: {} („{}”), a nie nagłe zdarzenie.",
                    label, fragment
                ),
            );
        }

        ConditionFinding::not_affirmed(
            self.condition(),
            "Opis nie wskazuje konkretnego, nagłego zdarzenia.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(description: &str) -> QualificationInput {
        QualificationInput {
            accident_description: description.to_string(),
            activities_performed: "Naprawa dachu u klienta".to_string(),
            pkd_codes: vec![],
            doctor_opinion: None,
        }
    }

    #[test]
    fn test_fall_is_sudden() {
        let finding = SuddennessRule.evaluate(&input("Spadłem z rusztowania."));
        assert!(finding.affirmed);
        assert!(finding.justification.contains("spadnięcie"));
    }

    #[test]
    fn test_gradual_onset_is_not_sudden() {
        let finding = SuddennessRule.evaluate(&input("Ból kręgosłupa narastał stopniowo od kilku miesięcy."));
        assert!(!finding.affirmed);
        assert!(finding.justification.contains("rozłożony w czasie"));
    }

    #[test]
    fn test_no_event_described() {
        let finding = SuddennessRule.evaluate(&input("Źle się poczułem."));
        assert!(!finding.affirmed);
    }
}
