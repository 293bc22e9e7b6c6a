//! PKD match probability.
//!
//! Scores how well the activities performed at the time of the accident fit
//! the claimant's registered business-activity codes. Purely lexical: both
//! sides are folded, stop words and short tokens dropped, and tokens cut to a
//! 5-character stem so Polish inflection ("naprawa", "naprawy", "naprawie")
//! still matches.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::criteria::patterns::fold;
use crate::types::PkdCode;

const STEM_LEN: usize = 5;
const MIN_TOKEN_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "oraz", "lub", "dla", "przez", "jest", "byla", "bylo", "ktory", "ktora", "ktore", "gdzie",
    "ramach", "podczas", "pozostala", "pozostale", "pozostalych", "wylaczeniem",
    "indziej", "niesklasyfikowana", "niesklasyfikowane", "dzialalnosc", "sie", "nie", "ich",
];

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"[a-z0-9]+").unwrap();
}

/// Probability (0-100) that the activities fall within one of the codes.
///
/// An explicit mention of a registered code scores 100. Otherwise the best
/// code wins with `round(100 * matched / description_tokens)`. No codes, or
/// no descriptions to compare against, score 0.
pub fn pkd_probability(activities: &str, codes: &[PkdCode]) -> u8 {
    if codes.is_empty() {
        return 0;
    }

    let folded = fold(activities);
    if codes.iter().any(|c| mentions_code(&folded, &c.code)) {
        return 100;
    }

    let activity_stems = stems(&folded);
    if activity_stems.is_empty() {
        return 0;
    }

    codes
        .iter()
        .filter_map(|c| c.description.as_deref())
        .map(|description| {
            let description_stems = stems(&fold(description));
            if description_stems.is_empty() {
                return 0;
            }
            let matched = description_stems.intersection(&activity_stems).count();
            ((100.0 * matched as f64) / description_stems.len() as f64).round() as u8
        })
        .max()
        .unwrap_or(0)
}

fn stems(folded: &str) -> BTreeSet<String> {
    TOKEN
        .find_iter(folded)
        .map(|m| m.as_str())
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .filter(|t| !STOP_WORDS.contains(t))
        .map(|t| t.chars().take(STEM_LEN).collect())
        .collect()
}

/// Whether the text names the code, with or without the dot ("43.21.Z", "4321Z").
fn mentions_code(folded: &str, code: &str) -> bool {
    let normalized: String = code
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if normalized.len() < 4 {
        return false;
    }
    let compact: String = folded.chars().filter(|c| !c.is_whitespace() && *c != '.').collect();
    compact.contains(&normalized)
}
