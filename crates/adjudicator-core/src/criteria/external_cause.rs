//! External cause
//!
//! **Question**: Was the event triggered by a factor outside the claimant's
//! own body?

use crate::types::QualificationInput;

use super::patterns::{first_match, EXTERNAL_FACTOR, INTERNAL_CAUSE};
use super::{folded_narrative, ConditionFinding, ConditionRule, StatutoryCondition};

/// The external cause rule.
pub struct ExternalCauseRule;

impl ConditionRule for ExternalCauseRule {
    fn condition(&self) -> StatutoryCondition {
        StatutoryCondition::ExternalCause
    }

    fn evaluate(&self, input: &QualificationInput) -> ConditionFinding {
        let text = folded_narrative(input);
        let external = first_match(&EXTERNAL_FACTOR, &text);
        let internal = first_match(&INTERNAL_CAUSE, &text);

        match (external, internal) {
            (Some((label, fragment)), None) => ConditionFinding::affirmed(
                self.condition(),
                format!("Wskazano czynnik zewnętrzny: {} („{}”).", label, fragment),
            ),
            (Some((label, _)), Some((internal_label, _))) => ConditionFinding::affirmed(
                self.condition(),
                format!(
                    "Wskazano czynnik zewnętrzny ({}), choć opis wspomina także: {}. Czynnik zewnętrzny nie musi być jedyną przyczyną.",
                    label, internal_label
                ),
            ),
            (None, Some((label, fragment))) => ConditionFinding::not_affirmed(
                self.condition(),
                format!(
                    "Zdarzenie wynika z przyczyny wewnętrznej: {} („{}”), brak czynnika zewnętrznego.",
                    label, fragment
                ),
            ),
            (None, None) => ConditionFinding::not_affirmed(
                self.condition(),
                "Opis nie wskazuje czynnika zewnętrznego, który wywołał zdarzenie.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(description: &str) -> QualificationInput {
        QualificationInput {
            accident_description: description.to_string(),
            activities_performed: "Transport towaru do klienta".to_string(),
            pkd_codes: vec![],
            doctor_opinion: None,
        }
    }

    #[test]
    fn test_machine_is_external() {
        let finding = ExternalCauseRule.evaluate(&input("Szlifierka wyrwała mi się z ręki."));
        assert!(finding.affirmed);
        assert!(finding.justification.contains("maszyna lub narzędzie"));
    }

    #[test]
    fn test_heart_attack_is_internal() {
        let finding = ExternalCauseRule.evaluate(&input("Doznałem zawału w kabinie."));
        assert!(!finding.affirmed);
        assert!(finding.justification.contains("przyczyny wewnętrznej"));
    }

    #[test]
    fn test_external_factor_prevails_over_mentioned_illness() {
        let finding = ExternalCauseRule.evaluate(&input(
            "Po omdleniu spadłem ze schodów magazynu.",
        ));
        assert!(finding.affirmed);
    }

    #[test]
    fn test_nothing_described() {
        let finding = ExternalCauseRule.evaluate(&input("Coś się stało."));
        assert!(!finding.affirmed);
    }
}
