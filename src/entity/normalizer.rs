use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::business_terms::{BusinessTerms, TermPositions};
use crate::error::{ResolveError, Result};

/// Number of trailing identifier characters ignored when building keys
pub const CHECK_DIGIT_WINDOW: usize = 2;

lazy_static! {
    // Anything that is neither a Unicode word character nor whitespace
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s]").expect("static regex");
}

/// Normalize free text into a comparable form.
///
/// Lowercases, drops every character that is not a word character or
/// whitespace, trims, and collapses whitespace runs to a single space.
/// Idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let lowered = text.nfc().collect::<String>().to_lowercase();
    let joined = NON_WORD
        .replace_all(&lowered, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    // Dropping punctuation can leave a base letter next to a combining mark
    joined.nfc().collect()
}

/// Remove legal-form terms from an already-normalized name.
pub fn strip_business_terms(text: &str, lexicon: &BusinessTerms, positions: TermPositions) -> String {
    lexicon
        .strip(text, positions)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop the check-digit window from an account identifier.
///
/// All whitespace is removed first. Identifiers shorter than the window
/// truncate to the empty string.
pub fn truncate_identifier(identifier: &str) -> String {
    let compact: Vec<char> = identifier.chars().filter(|c| !c.is_whitespace()).collect();
    let keep = compact.len().saturating_sub(CHECK_DIGIT_WINDOW);
    compact[..keep].iter().collect()
}

/// Strict variant of [`truncate_identifier`] that rejects identifiers
/// shorter than the check-digit window.
pub fn try_truncate_identifier(identifier: &str) -> Result<String> {
    let length = identifier.chars().filter(|c| !c.is_whitespace()).count();
    if length < CHECK_DIGIT_WINDOW {
        return Err(ResolveError::IdentifierTooShort {
            identifier: identifier.to_string(),
            min_len: CHECK_DIGIT_WINDOW,
        });
    }
    Ok(truncate_identifier(identifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_basic_normalization() {
        assert_eq!(normalize("Acme Corp."), "acme corp");
        assert_eq!(normalize("  ACME   GmbH "), "acme gmbh");
        assert_eq!(normalize("Müller & Söhne, K.G."), "müller söhne kg");
        assert_eq!(normalize("O'Brien\tHoldings\nLtd"), "obrien holdings ltd");
    }

    #[test]
    fn test_normalization_keeps_word_characters() {
        assert_eq!(normalize("acme_eu 24/7"), "acme_eu 247");
        assert_eq!(normalize("Ελληνική Εταιρεία"), "ελληνική εταιρεία");
    }

    #[test]
    fn test_degenerate_names_normalize_to_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" .,-!? "), "");
    }

    #[test]
    fn test_composed_and_decomposed_forms_agree() {
        assert_eq!(normalize("Cafe\u{301} Rouge"), normalize("Café Rouge"));
    }

    #[test]
    fn test_mark_separated_by_punctuation_recomposes() {
        let once = normalize("Cafe.\u{301} Rouge");
        assert_eq!(once, "café rouge");
        assert_eq!(normalize(&once), once);
        assert_eq!(normalize("Ü.\u{308}ber-\u{301}"), normalize(&normalize("Ü.\u{308}ber-\u{301}")));
    }

    #[test]
    fn test_strip_business_terms() {
        let lexicon = BusinessTerms::builtin();
        let positions = TermPositions::default();
        assert_eq!(strip_business_terms("acme corp", lexicon, positions), "acme");
        assert_eq!(strip_business_terms("acme gmbh", lexicon, positions), "acme");
        assert_eq!(strip_business_terms("acme", lexicon, positions), "acme");
    }

    #[test]
    fn test_truncate_identifier() {
        assert_eq!(truncate_identifier("DE001"), "DE0");
        assert_eq!(truncate_identifier("DE89 3704 0044 0532 0130 00"), "DE8937040044053201300");
        assert_eq!(truncate_identifier("AB"), "");
        assert_eq!(truncate_identifier("A"), "");
        assert_eq!(truncate_identifier(""), "");
    }

    #[test]
    fn test_try_truncate_identifier() {
        assert_eq!(try_truncate_identifier("DE001").unwrap(), "DE0");
        assert_eq!(try_truncate_identifier("AB").unwrap(), "");
        assert!(matches!(
            try_truncate_identifier(" A "),
            Err(ResolveError::IdentifierTooShort { min_len: 2, .. })
        ));
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "[A-Za-z0-9ÄÖÜäöüßéè\u{301}\u{308}\u{327} .,&()'/_\\t-]{0,40}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn truncation_drops_exactly_two(id in "[A-Z]{2}[0-9]{0,30}") {
            prop_assert_eq!(
                truncate_identifier(&id).chars().count(),
                id.chars().count() - CHECK_DIGIT_WINDOW
            );
        }
    }
}
