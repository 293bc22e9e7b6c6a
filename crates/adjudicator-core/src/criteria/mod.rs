//! The statutory five-condition test.
//!
//! A workplace accident qualifies when it was a sudden event, caused by an
//! external factor, resulting in injury, occurring within the insured period
//! and during ordinary business activity. Each condition is evaluated by its
//! own rule independently of the others.
//!
//! The rule tables here are the authoritative definition of the test; the
//! oracle instructions are generated from them, never the other way round.

mod external_cause;
mod injury;
mod insured_period;
mod ordinary_activity;
pub mod patterns;
mod suddenness;

pub use external_cause::ExternalCauseRule;
pub use injury::InjuryRule;
pub use insured_period::InsuredPeriodRule;
pub use ordinary_activity::OrdinaryActivityRule;
pub use suddenness::SuddennessRule;

use serde::{Deserialize, Serialize};

use crate::types::QualificationInput;

/// One of the five statutory conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatutoryCondition {
    Suddenness,
    ExternalCause,
    Injury,
    InsuredPeriod,
    OrdinaryActivity,
}

impl StatutoryCondition {
    pub const ALL: [StatutoryCondition; 5] = [
        StatutoryCondition::Suddenness,
        StatutoryCondition::ExternalCause,
        StatutoryCondition::Injury,
        StatutoryCondition::InsuredPeriod,
        StatutoryCondition::OrdinaryActivity,
    ];

    /// Key used in oracle responses.
    pub fn key(&self) -> &'static str {
        match self {
            StatutoryCondition::Suddenness => "suddenness",
            StatutoryCondition::ExternalCause => "externalCause",
            StatutoryCondition::Injury => "injury",
            StatutoryCondition::InsuredPeriod => "insuredPeriod",
            StatutoryCondition::OrdinaryActivity => "ordinaryActivity",
        }
    }

    /// Polish name as it appears in decisions and notes.
    pub fn label(&self) -> &'static str {
        match self {
            StatutoryCondition::Suddenness => "nagłość zdarzenia",
            StatutoryCondition::ExternalCause => "przyczyna zewnętrzna",
            StatutoryCondition::Injury => "uraz",
            StatutoryCondition::InsuredPeriod => "okres ubezpieczenia",
            StatutoryCondition::OrdinaryActivity => "związek ze zwykłymi czynnościami",
        }
    }

    /// The legal test the condition applies.
    pub fn legal_test(&self) -> &'static str {
        match self {
            StatutoryCondition::Suddenness => {
                "Zdarzenie było nagłe: nastąpiło natychmiast lub w krótkim, zamkniętym odcinku czasu, a nie w wyniku długotrwałego procesu."
            }
            StatutoryCondition::ExternalCause => {
                "Zdarzenie zostało wywołane przyczyną zewnętrzną, a nie wyłącznie stanem chorobowym poszkodowanego."
            }
            StatutoryCondition::Injury => {
                "Zdarzenie spowodowało uraz, czyli uszkodzenie tkanek ciała lub narządów wskutek działania czynnika zewnętrznego."
            }
            StatutoryCondition::InsuredPeriod => {
                "Zdarzenie nastąpiło w okresie podlegania ubezpieczeniu wypadkowemu, podczas wykonywania pozarolniczej działalności."
            }
            StatutoryCondition::OrdinaryActivity => {
                "Zdarzenie nastąpiło podczas wykonywania zwykłych czynności związanych z prowadzoną działalnością."
            }
        }
    }

    /// Documents or actions that could settle the condition.
    pub fn remedy(&self) -> &'static str {
        match self {
            StatutoryCondition::Suddenness => {
                "wyjaśnienia poszkodowanego opisujące przebieg zdarzenia krok po kroku"
            }
            StatutoryCondition::ExternalCause => {
                "opis okoliczności wskazujący czynnik zewnętrzny oraz zeznania świadków"
            }
            StatutoryCondition::Injury => "dokumentacja medyczna z pierwszej pomocy lub opinia lekarza orzecznika",
            StatutoryCondition::InsuredPeriod => {
                "potwierdzenie opłacania składek na ubezpieczenie wypadkowe w dniu zdarzenia"
            }
            StatutoryCondition::OrdinaryActivity => {
                "dokumenty potwierdzające wykonywanie czynności w ramach działalności (umowa, zlecenie, faktura)"
            }
        }
    }
}

impl std::fmt::Display for StatutoryCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a finding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSource {
    Rules,
    Oracle,
}

/// Outcome of one condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionFinding {
    pub condition: StatutoryCondition,
    pub affirmed: bool,
    pub justification: String,
    pub source: FindingSource,
}

impl ConditionFinding {
    pub fn affirmed(condition: StatutoryCondition, justification: impl Into<String>) -> Self {
        Self {
            condition,
            affirmed: true,
            justification: justification.into(),
            source: FindingSource::Rules,
        }
    }

    pub fn not_affirmed(condition: StatutoryCondition, justification: impl Into<String>) -> Self {
        Self {
            condition,
            affirmed: false,
            justification: justification.into(),
            source: FindingSource::Rules,
        }
    }
}

/// Findings for all five conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionFindings {
    pub suddenness: ConditionFinding,
    pub external_cause: ConditionFinding,
    pub injury: ConditionFinding,
    pub insured_period: ConditionFinding,
    pub ordinary_activity: ConditionFinding,
}

impl ConditionFindings {
    pub fn get(&self, condition: StatutoryCondition) -> &ConditionFinding {
        match condition {
            StatutoryCondition::Suddenness => &self.suddenness,
            StatutoryCondition::ExternalCause => &self.external_cause,
            StatutoryCondition::Injury => &self.injury,
            StatutoryCondition::InsuredPeriod => &self.insured_period,
            StatutoryCondition::OrdinaryActivity => &self.ordinary_activity,
        }
    }

    pub fn get_mut(&mut self, condition: StatutoryCondition) -> &mut ConditionFinding {
        match condition {
            StatutoryCondition::Suddenness => &mut self.suddenness,
            StatutoryCondition::ExternalCause => &mut self.external_cause,
            StatutoryCondition::Injury => &mut self.injury,
            StatutoryCondition::InsuredPeriod => &mut self.insured_period,
            StatutoryCondition::OrdinaryActivity => &mut self.ordinary_activity,
        }
    }

    /// Findings in statutory order.
    pub fn iter(&self) -> impl Iterator<Item = &ConditionFinding> {
        StatutoryCondition::ALL.into_iter().map(move |c| self.get(c))
    }

    pub fn all_affirmed(&self) -> bool {
        self.iter().all(|f| f.affirmed)
    }

    pub fn unaffirmed(&self) -> Vec<&ConditionFinding> {
        self.iter().filter(|f| !f.affirmed).collect()
    }

    pub fn to_vec(&self) -> Vec<ConditionFinding> {
        self.iter().cloned().collect()
    }
}

/// Evaluates one statutory condition.
pub trait ConditionRule: Send + Sync {
    fn condition(&self) -> StatutoryCondition;

    fn evaluate(&self, input: &QualificationInput) -> ConditionFinding;
}

/// Evaluate all five conditions with the built-in rule tables.
pub fn evaluate_all(input: &QualificationInput) -> ConditionFindings {
    ConditionFindings {
        suddenness: SuddennessRule.evaluate(input),
        external_cause: ExternalCauseRule.evaluate(input),
        injury: InjuryRule.evaluate(input),
        insured_period: InsuredPeriodRule.evaluate(input),
        ordinary_activity: OrdinaryActivityRule.evaluate(input),
    }
}

/// Accident description and activities, folded for pattern matching.
pub(crate) fn folded_narrative(input: &QualificationInput) -> String {
    patterns::fold(&format!(
        "{} {}",
        input.accident_description, input.activities_performed
    ))
}
