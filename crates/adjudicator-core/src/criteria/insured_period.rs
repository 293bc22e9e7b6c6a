//! Insured period
//!
//! **Question**: Did the event happen while the claimant was carrying on the
//! insured business activity?

use crate::types::QualificationInput;

use super::patterns::{first_match, PRIVATE_TIME};
use super::{folded_narrative, ConditionFinding, ConditionRule, StatutoryCondition};

/// The insured period rule.
pub struct InsuredPeriodRule;

impl ConditionRule for InsuredPeriodRule {
    fn condition(&self) -> StatutoryCondition {
        StatutoryCondition::InsuredPeriod
    }

    fn evaluate(&self, input: &QualificationInput) -> ConditionFinding {
        if input.activities_performed.trim().is_empty() {
            return ConditionFinding::not_affirmed(
                self.condition(),
                "Nie opisano czynności wykonywanych w chwili zdarzenia.",
            );
        }

        let text = folded_narrative(input);
        if let Some((label, fragment)) = first_match(&PRIVATE_TIME, &text) {
            return ConditionFinding::not_affirmed(
                self.condition(),
                format!(
                    "Zdarzenie nastąpiło poza działalnością: {} („{}”).",
                    label, fragment
                ),
            );
        }

        ConditionFinding::affirmed(
            self.condition(),
            "Zdarzenie nastąpiło podczas wykonywania czynności w ramach działalności.",
        )
    }
}
