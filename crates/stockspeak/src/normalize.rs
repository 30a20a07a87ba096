use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::numbers::spell_to_digits;

/// Normalize free text for matching: fold diacritics and case, drop
/// punctuation, collapse whitespace and turn number words into digits.
///
/// Dash-like characters separate words ("twenty-three" reads as two words);
/// a dot survives only between two digits so `2.5` stays a decimal.
/// `normalize(normalize(s)) == normalize(s)` for every input.
pub fn normalize(text: &str) -> String {
    let folded = fold(text);
    let stripped = strip_punctuation(&folded);
    let tokens: Vec<&str> = stripped.split_whitespace().collect();
    spell_to_digits(&tokens).join(" ")
}

/// Canonical text with spaces, hyphens and dots removed: `"green onion"` and
/// `"green-onion"` both compact to `"greenonion"`.
pub fn compact(text: &str) -> String {
    text.chars()
        .filter(|c| !(c.is_whitespace() || matches!(c, '-' | '.')))
        .collect()
}

fn fold(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

fn is_dash(c: char) -> bool {
    matches!(c, '-' | '_' | '/' | '\u{2010}'..='\u{2015}' | '\u{2212}')
}

fn strip_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_alphanumeric() {
            out.push(c);
        } else if c.is_whitespace() || is_dash(c) {
            out.push(' ');
        } else if c == '.'
            && out.chars().next_back().is_some_and(|p| p.is_ascii_digit())
            && chars.peek().is_some_and(|n| n.is_ascii_digit())
        {
            out.push('.');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn lowercases_and_strips() {
        assert_eq!(normalize("  Ten AVOCADO!!  "), "10 avocado");
        assert_eq!(normalize("Jalapeño, crème fraîche"), "jalapeno creme fraiche");
        assert_eq!(normalize("don't\tstop"), "dont stop");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n "), "");
    }

    #[test]
    fn keeps_decimals_and_splits_dashes() {
        assert_eq!(normalize("2.5 lbs."), "2.5 lbs");
        assert_eq!(normalize("twenty-three limes"), "23 limes");
        assert_eq!(normalize("green-onion"), "green onion");
        assert_eq!(normalize("a.5"), "a5");
        assert_eq!(normalize("2..5"), "2.5");
    }

    #[test]
    fn number_words_only_on_word_boundaries() {
        assert_eq!(normalize("six tofu"), "6 tofu");
        assert_eq!(normalize("Someone sixteenth often"), "someone sixteenth often");
        assert_eq!(normalize("SIX"), "6");
    }

    #[test]
    fn compacts_separators() {
        assert_eq!(compact("green onion"), "greenonion");
        assert_eq!(compact("pico-de-gallo"), "picodegallo");
        assert_eq!(compact("st. germain"), "stgermain");
    }

    #[test]
    fn idempotent_on_tricky_inputs() {
        for s in ["t.en", "İstanbul", "ℌello", "1,000 cups", "one hundred and", "2.5.3", "x-"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "{s:?}");
        }
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(s in "\\PC{0,40}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn spoken_numbers_are_idempotent(
            words in prop::collection::vec(
                prop::sample::select(vec![
                    "one", "two", "twenty", "hundred", "thousand", "and", "dozen",
                    "zero", "tofu", "2.5", "-", ".", "7",
                ]),
                0..12,
            )
        ) {
            let s = words.join(" ");
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
