//! Injury
//!
//! **Question**: Did the event damage the claimant's body?
//!
//! A supplied medical opinion takes precedence over the narrative.

use crate::types::QualificationInput;

use super::patterns::{first_match, fold, INJURY_MARKERS, NO_INJURY};
use super::{ConditionFinding, ConditionRule, StatutoryCondition};

/// The injury rule.
pub struct InjuryRule;

impl ConditionRule for InjuryRule {
    fn condition(&self) -> StatutoryCondition {
        StatutoryCondition::Injury
    }

    fn evaluate(&self, input: &QualificationInput) -> ConditionFinding {
        if let Some(opinion) = &input.doctor_opinion {
            let comment = opinion
                .comment
                .as_deref()
                .map(|c| format!(" Komentarz: {}", c))
                .unwrap_or_default();
            return if opinion.injuries_match_definition {
                ConditionFinding::affirmed(
                    self.condition(),
                    format!("Opinia lekarska potwierdza uraz w rozumieniu ustawy.{}", comment),
                )
            } else {
                ConditionFinding::not_affirmed(
                    self.condition(),
                    format!("Opinia lekarska nie potwierdza urazu w rozumieniu ustawy.{}", comment),
                )
            };
        }

        let text = fold(&input.accident_description);

        if let Some((label, _)) = first_match(&NO_INJURY, &text) {
            return ConditionFinding::not_affirmed(
                self.condition(),
                format!("Opis wskazuje na {}.", label),
            );
        }

        match first_match(&INJURY_MARKERS, &text) {
            Some((label, fragment)) => ConditionFinding::affirmed(
                self.condition(),
                format!("Opis wskazuje na uraz: {} („{}”).", label, fragment),
            ),
            None => ConditionFinding::not_affirmed(
                self.condition(),
                "Opis nie wskazuje urazu.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DoctorOpinion;

    fn input(description: &str, opinion: Option<bool>) -> QualificationInput {
        QualificationInput {
            accident_description: description.to_string(),
            activities_performed: "Montaż okien".to_string(),
            pkd_codes: vec![],
            doctor_opinion: opinion.map(|matches| DoctorOpinion {
                injuries_match_definition: matches,
                comment: None,
            }),
        }
    }

    #[test]
    fn test_injury_from_description() {
        let finding = InjuryRule.evaluate(&input("Upadłem i doznałem skręcenia kostki.", None));
        assert!(finding.affirmed);
    }

    #[test]
    fn test_explicit_no_injury() {
        let finding = InjuryRule.evaluate(&input("Upadłem, ale nie doznałem obrażeń.", None));
        assert!(!finding.affirmed);
    }

    #[test]
    fn test_doctor_opinion_overrides_description() {
        let finding = InjuryRule.evaluate(&input("Złamanie ręki.", Some(false)));
        assert!(!finding.affirmed);
        assert!(finding.justification.contains("Opinia lekarska"));

        let finding = InjuryRule.evaluate(&input("Ból pleców.", Some(true)));
        assert!(finding.affirmed);
    }
}
