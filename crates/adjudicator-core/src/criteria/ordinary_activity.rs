//! Ordinary activity
//!
//! **Question**: Was the claimant doing the ordinary work of the business
//! when the event happened?

use crate::types::QualificationInput;

use super::patterns::{first_match, fold, matches_any, BUSINESS_ACTIVITY, PRIVATE_TIME};
use super::{ConditionFinding, ConditionRule, StatutoryCondition};

/// The ordinary activity rule.
pub struct OrdinaryActivityRule;

impl ConditionRule for OrdinaryActivityRule {
    fn condition(&self) -> StatutoryCondition {
        StatutoryCondition::OrdinaryActivity
    }

    fn evaluate(&self, input: &QualificationInput) -> ConditionFinding {
        let activities = fold(&input.activities_performed);

        if matches_any(&PRIVATE_TIME, &activities) {
            return ConditionFinding::not_affirmed(
                self.condition(),
                "Opisane czynności mają charakter prywatny.",
            );
        }

        match first_match(&BUSINESS_ACTIVITY, &activities) {
            Some((label, fragment)) => ConditionFinding::affirmed(
                self.condition(),
                format!("Czynności odpowiadają działalności: {} („{}”).", label, fragment),
            ),
            None => ConditionFinding::not_affirmed(
                self.condition(),
                "Z opisu czynności nie wynika związek ze zwykłą działalnością.",
            ),
        }
    }
}
