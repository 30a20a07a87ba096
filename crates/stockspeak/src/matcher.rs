use stock_types::CatalogItem;
use tracing::debug;

use crate::index::CatalogIndex;
use crate::normalize::normalize;

/// Resolve a spoken phrase to a catalog item id.
///
/// Tries leading token windows from longest to shortest so trailing noise
/// ("tofu please") never blocks a match, and only ever compares whole
/// windows, never substrings. When no window hits the index, falls back to
/// an equality scan over every catalog term against the phrase and its
/// singular/plural spellings.
pub fn match_phrase<'a>(
    phrase: &str,
    index: &'a CatalogIndex,
    catalog: &'a [CatalogItem],
) -> Option<&'a str> {
    let canonical = index.canonical(phrase);
    let tokens: Vec<&str> = canonical.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    for end in (1..=tokens.len()).rev() {
        let window = tokens[..end].join(" ");
        if let Some(item_id) = index.lookup(&window) {
            if end < tokens.len() {
                debug!(
                    "matched {window:?} -> {item_id}, ignoring {:?}",
                    tokens[end..].join(" ")
                );
            }
            return Some(item_id);
        }
    }

    scan_catalog(phrase, index, catalog)
}

/// Linear equality scan used when the index has no key for the phrase.
fn scan_catalog<'a>(
    phrase: &str,
    index: &CatalogIndex,
    catalog: &'a [CatalogItem],
) -> Option<&'a str> {
    let candidates = phrase_variants(phrase, index);
    if candidates.is_empty() {
        return None;
    }
    for item in catalog {
        for term in item.terms() {
            let term = normalize(term);
            if !term.is_empty() && candidates.contains(&term) {
                debug!("fallback scan matched {phrase:?} -> {}", item.id);
                return Some(item.id.as_str());
            }
        }
    }
    None
}

/// The normalized phrase, its canonical form, and the phrase with its last
/// word swapped for each singular/plural spelling.
fn phrase_variants(phrase: &str, index: &CatalogIndex) -> Vec<String> {
    let normalized = normalize(phrase);
    if normalized.is_empty() {
        return Vec::new();
    }
    let mut out = vec![normalized.clone(), index.canonical(&normalized)];

    let (head, last) = match normalized.rsplit_once(' ') {
        Some((head, last)) => (Some(head), last),
        None => (None, normalized.as_str()),
    };
    for variant in index.singularizer().variants(last) {
        let candidate = match head {
            Some(head) => format!("{head} {}", variant.text),
            None => variant.text.into_owned(),
        };
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new("green-onion", "Green Onion").with_synonyms(["scallion"]),
            CatalogItem::new("onion", "Onion"),
            CatalogItem::new("tofu", "Tofu"),
            CatalogItem::new("hummus", "Hummus"),
            CatalogItem::new("fries", "Fries"),
        ]
    }

    #[test]
    fn prefers_longest_window() {
        let items = catalog();
        let index = CatalogIndex::build(&items);
        assert_eq!(
            match_phrase("green onion bunch", &index, &items),
            Some("green-onion")
        );
        assert_eq!(match_phrase("onion bunch", &index, &items), Some("onion"));
        assert_eq!(match_phrase("green onions", &index, &items), Some("green-onion"));
        assert_eq!(match_phrase("scallions", &index, &items), Some("green-onion"));
    }

    #[test]
    fn trailing_noise_is_ignored_but_leading_is_not() {
        let items = catalog();
        let index = CatalogIndex::build(&items);
        assert_eq!(match_phrase("tofu please", &index, &items), Some("tofu"));
        assert_eq!(match_phrase("please tofu", &index, &items), None);
    }

    #[test]
    fn never_matches_substrings() {
        let items = catalog();
        let index = CatalogIndex::build(&items);
        assert_eq!(match_phrase("onionette", &index, &items), None);
        assert_eq!(match_phrase("tof", &index, &items), None);
        assert_eq!(match_phrase("", &index, &items), None);
    }

    #[test]
    fn plural_insensitive_both_ways() {
        let items = catalog();
        let index = CatalogIndex::build(&items);
        assert_eq!(match_phrase("hummus", &index, &items), Some("hummus"));
        assert_eq!(match_phrase("fry", &index, &items), Some("fries"));
        assert_eq!(match_phrase("fries", &index, &items), Some("fries"));
    }

    #[test]
    fn falls_back_to_catalog_scan() {
        let items = catalog();
        let index = CatalogIndex::build(&items[..2]);
        assert_eq!(match_phrase("tofu", &index, &items), Some("tofu"));
        assert_eq!(match_phrase("tofus", &index, &items), Some("tofu"));
        assert_eq!(match_phrase("tofu please", &index, &items), None);
    }
}
