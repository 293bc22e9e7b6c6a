//! Shared keyword patterns for the statutory condition rules.
//!
//! All patterns run against [`fold`]ed text: lowercase ASCII with Polish
//! diacritics removed, so one pattern covers "upadł", "Upadl" and "UPADŁ".

use lazy_static::lazy_static;
use regex::Regex;

/// A labelled pattern. The label is quoted back in justifications.
pub type KeywordTable = Vec<(&'static str, Regex)>;

lazy_static! {
    // =========================================================================
    // SUDDENNESS
    // =========================================================================

    pub static ref SUDDEN_EVENT: KeywordTable = vec![
        ("nagłe zdarzenie", Regex::new(r"\b(nagl|w pewnym momencie|niespodziewan)").unwrap()),
        ("upadek", Regex::new(r"\b(upadl|upadek|upadku|przewrocil|przewrocenie)").unwrap()),
        ("poślizgnięcie", Regex::new(r"\bposlizg").unwrap()),
        ("potknięcie", Regex::new(r"\bpotkn").unwrap()),
        ("spadnięcie", Regex::new(r"\b(spadl|spadajac|spadniecie|spadek z)").unwrap()),
        ("uderzenie", Regex::new(r"\buderz").unwrap()),
        ("skaleczenie", Regex::new(r"\b(skalecz|zranil|zacial|przecial)").unwrap()),
        ("zdarzenie drogowe", Regex::new(r"\b(kolizj|zderz|potracen|potracil)").unwrap()),
        ("wybuch lub pożar", Regex::new(r"\b(wybuch|eksploz|pozar|zapalil)").unwrap()),
        ("porażenie", Regex::new(r"\b(porazen|porazil)").unwrap()),
        ("przygniecenie", Regex::new(r"\bprzygni").unwrap()),
    ];

    pub static ref GRADUAL_ONSET: KeywordTable = vec![
        ("dolegliwości długotrwałe", Regex::new(r"\b(dlugotrwal|przewlekl|stopniow)").unwrap()),
        ("dolegliwości od dłuższego czasu", Regex::new(r"\bod (wielu|kilku|paru) (lat|miesiecy|tygodni)").unwrap()),
        ("choroba zawodowa", Regex::new(r"\bchorob\w* zawodow").unwrap()),
    ];

    // =========================================================================
    // EXTERNAL CAUSE
    // =========================================================================

    pub static ref EXTERNAL_FACTOR: KeywordTable = vec![
        ("śliska lub nierówna nawierzchnia", Regex::new(r"\b(slisk|mokr|oblodz|zamarz|nierown)").unwrap()),
        ("maszyna lub narzędzie", Regex::new(r"\b(maszyn|narzedz|szlifier|wiertark|noz|pilark|prasa)").unwrap()),
        ("praca na wysokości", Regex::new(r"\b(drabin|rusztowan|schod|dach)").unwrap()),
        ("pojazd", Regex::new(r"\b(samochod|pojazd|rower|autobus|ciezarow)").unwrap()),
        ("przedmiot", Regex::new(r"\b(przedmiot|paczk|skrzyn|belk|cegl|desk|regal)").unwrap()),
        ("czynnik fizyczny lub chemiczny", Regex::new(r"\b(prad|ogien|gorac|chemikal|substancj|wybuch)").unwrap()),
        ("zwierzę", Regex::new(r"\b(pies|psa|zwierz)").unwrap()),
        ("działanie osoby trzeciej", Regex::new(r"\b(napad|pobil|zaatakow)").unwrap()),
        ("upadek na podłoże", Regex::new(r"\b(upadl|upadek|upadku|poslizg|potkn)").unwrap()),
    ];

    pub static ref INTERNAL_CAUSE: KeywordTable = vec![
        ("przyczyna chorobowa", Regex::new(r"\b(zawal|udar|padaczk|epilep)").unwrap()),
        ("zasłabnięcie", Regex::new(r"\b(omdl|zaslabl|zaslabniec)").unwrap()),
        ("zdarzenie samoistne", Regex::new(r"\bsamoistn").unwrap()),
    ];

    // =========================================================================
    // INJURY
    // =========================================================================

    pub static ref INJURY_MARKERS: KeywordTable = vec![
        ("złamanie", Regex::new(r"\bzlaman").unwrap()),
        ("skręcenie lub zwichnięcie", Regex::new(r"\b(skrec|zwichn)").unwrap()),
        ("rana", Regex::new(r"\b(rana|rany|rane|ranny|zranien|skalecz)").unwrap()),
        ("stłuczenie", Regex::new(r"\b(stluczen|stlucz|krwiak|siniak)").unwrap()),
        ("uraz", Regex::new(r"\b(uraz|obrazen|kontuzj)").unwrap()),
        ("oparzenie", Regex::new(r"\boparzen").unwrap()),
        ("wstrząśnienie", Regex::new(r"\bwstrzasnien").unwrap()),
        ("naderwanie", Regex::new(r"\b(naderwan|zerwan|pekniec)").unwrap()),
        ("amputacja", Regex::new(r"\bamputac").unwrap()),
    ];

    pub static ref NO_INJURY: KeywordTable = vec![
        ("brak obrażeń", Regex::new(r"\b(bez obrazen|brak obrazen|nie doznal|nie odniosl)").unwrap()),
    ];

    // =========================================================================
    // INSURED ACTIVITY
    // =========================================================================

    pub static ref PRIVATE_TIME: KeywordTable = vec![
        ("urlop", Regex::new(r"\b(urlop|wakacj)").unwrap()),
        ("czas wolny", Regex::new(r"\b(czas(ie)? woln|po pracy|weekend)").unwrap()),
        ("sprawy prywatne", Regex::new(r"\bprywatn").unwrap()),
    ];

    pub static ref BUSINESS_ACTIVITY: KeywordTable = vec![
        ("wykonywanie zlecenia", Regex::new(r"\b(zlecen|zamowien|umow|klient)").unwrap()),
        ("prace montażowe", Regex::new(r"\b(montaz|montow|instal)").unwrap()),
        ("naprawa lub serwis", Regex::new(r"\b(napraw|serwis|konserwac)").unwrap()),
        ("prace budowlane", Regex::new(r"\b(budow|remont|malow|tynk)").unwrap()),
        ("transport i dostawa", Regex::new(r"\b(dostaw|transport|przewoz|kurs)").unwrap()),
        ("sprzedaż i obsługa", Regex::new(r"\b(sprzeda|obslug|uslug)").unwrap()),
        ("wykonywanie pracy", Regex::new(r"\b(wykonyw|prac[eay]|pracowal|pracuj)").unwrap()),
    ];
}

/// Lowercase and strip Polish diacritics.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'ą' => 'a',
            'ć' => 'c',
            'ę' => 'e',
            'ł' => 'l',
            'ń' => 'n',
            'ó' => 'o',
            'ś' => 's',
            'ź' | 'ż' => 'z',
            other => other,
        })
        .collect()
}

/// First table entry matching the folded text, with the matched fragment.
pub fn first_match(table: &KeywordTable, folded: &str) -> Option<(&'static str, String)> {
    table.iter().find_map(|(label, regex)| {
        regex
            .find(folded)
            .map(|m| (*label, m.as_str().to_string()))
    })
}

/// Whether any table entry matches the folded text.
pub fn matches_any(table: &KeywordTable, folded: &str) -> bool {
    table.iter().any(|(_, regex)| regex.is_match(folded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_removes_diacritics() {
        assert_eq!(fold("Upadł na ŚLISKIEJ posadzce"), "upadl na sliskiej posadzce");
        assert_eq!(fold("Źdźbło żółci"), "zdzblo zolci");
    }

    #[test]
    fn test_sudden_event_detection() {
        let text = fold("Poślizgnąłem się na mokrej podłodze");
        let (label, _) = first_match(&SUDDEN_EVENT, &text).unwrap();
        assert_eq!(label, "poślizgnięcie");
    }

    #[test]
    fn test_external_factor_detection() {
        let text = fold("Spadł z drabiny podczas montażu");
        let (label, _) = first_match(&EXTERNAL_FACTOR, &text).unwrap();
        assert_eq!(label, "praca na wysokości");
    }

    #[test]
    fn test_internal_cause_detection() {
        assert!(matches_any(&INTERNAL_CAUSE, &fold("Doznał zawału serca przy biurku")));
        assert!(!matches_any(&INTERNAL_CAUSE, &fold("Uderzył się w głowę")));
    }

    #[test]
    fn test_injury_detection() {
        assert!(matches_any(&INJURY_MARKERS, &fold("Złamanie kości promieniowej")));
        assert!(matches_any(&NO_INJURY, &fold("Poszkodowany nie doznał obrażeń")));
    }

    #[test]
    fn test_private_time_detection() {
        assert!(matches_any(&PRIVATE_TIME, &fold("W czasie urlopu naprawiał dach")));
        assert!(!matches_any(&PRIVATE_TIME, &fold("Montaż instalacji u klienta")));
    }
}
