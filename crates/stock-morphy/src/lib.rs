//! Heuristic singularization for catalog matching.
//!
//! Stock counts are spoken in the plural ("three onions", "two boxes of
//! berries") while catalog names are usually singular. Both sides are reduced
//! to the same canonical singular form before comparison, so the rules only
//! need to be consistent, not linguistically perfect.
//!
//! # How it works
//! 1. Leave short words, non-alphabetic tokens and invariant endings alone.
//! 2. Check exceptions (irregular plurals and words that only look plural).
//! 3. Apply suffix rules in order; the first one that leaves a usable stem wins.
//!
//! [`Singularizer::variants`] goes the other way as well and lists plural
//! spellings, each tagged with where it came from.
//!
//! # Example
//! ```
//! use stock_morphy::Singularizer;
//!
//! let s = Singularizer::new();
//! assert_eq!(s.singular("berries"), "berry");
//! assert_eq!(s.singular_phrase("green onions"), "green onion");
//! assert_eq!(s.singular("hummus"), "hummus");
//! ```
//!
//! For a runnable demo, see `cargo run -p stock-morphy --example singularize -- <word>...`.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Irregular plurals, plus words that end in `s` but are already singular.
const BUILTIN_EXCEPTIONS: &[(&str, &str)] = &[
    ("leaves", "leaf"),
    ("loaves", "loaf"),
    ("halves", "half"),
    ("knives", "knife"),
    ("shelves", "shelf"),
    ("calves", "calf"),
    ("geese", "goose"),
    ("mice", "mouse"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("people", "person"),
    ("dice", "die"),
    ("molasses", "molasses"),
    ("series", "series"),
    ("species", "species"),
    ("swiss", "swiss"),
    ("chives", "chive"),
    ("olives", "olive"),
    ("cookies", "cookie"),
    ("movies", "movie"),
    ("brownies", "brownie"),
    ("shoes", "shoe"),
];

/// Endings that never take the trailing-`s` rule.
const INVARIANT_SUFFIXES: &[&str] = &["ss", "us", "is", "ous"];

/// Suffix rules, tried in order. `ies` needs a stem of at least two letters
/// so that "pies" falls through to the plain `s` rule.
const RULES: &[(&str, &str)] = &[
    ("sses", "ss"),
    ("zzes", "zz"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("xes", "x"),
    ("oes", "o"),
    ("ies", "y"),
    ("s", ""),
];

/// Extra strips offered by [`Singularizer::variants`] only.
const LOOSE_RULES: &[(&str, &str)] = &[("es", "")];

const MIN_WORD_LEN: usize = 4;

/// Where a variant spelling originated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VariantSource {
    Surface,
    Exception,
    Rule {
        suffix: &'static str,
        replacement: &'static str,
    },
    Plural,
}

/// A spelling of a word paired with its provenance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Variant<'a> {
    pub text: Cow<'a, str>,
    pub source: VariantSource,
}

/// Plural-insensitive word reducer with an extensible exception table.
#[derive(Clone, Debug)]
pub struct Singularizer {
    exceptions: HashMap<String, String>,
    plurals: HashMap<String, String>,
}

impl Default for Singularizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Singularizer {
    /// Singularizer with the built-in exception table only.
    pub fn new() -> Self {
        Self::with_exceptions(std::iter::empty())
    }

    /// Built-in exceptions extended (and overridden) by `extra` pairs of
    /// `(plural, singular)`.
    pub fn with_exceptions<I>(extra: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut out = Self {
            exceptions: HashMap::new(),
            plurals: HashMap::new(),
        };
        for (plural, singular) in BUILTIN_EXCEPTIONS {
            out.insert_exception(plural, singular);
        }
        for (plural, singular) in extra {
            out.insert_exception(&plural, &singular);
        }
        out
    }

    /// Load extra exceptions from a whitespace-separated `plural singular`
    /// file (one pair per line, `#` starts a comment).
    ///
    /// A missing file is treated as empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let extra = load_exc(path.as_ref())?;
        debug!(
            "loaded {} singular exceptions from {}",
            extra.len(),
            path.as_ref().display()
        );
        Ok(Self::with_exceptions(extra))
    }

    fn insert_exception(&mut self, plural: &str, singular: &str) {
        let plural = normalize(plural);
        let singular = normalize(singular);
        if plural.is_empty() || singular.is_empty() {
            return;
        }
        if plural != singular {
            self.plurals.insert(singular.clone(), plural.clone());
        }
        self.exceptions.insert(plural, singular);
    }

    /// Reduce one lowercase word to its singular form.
    pub fn singular<'a>(&self, word: &'a str) -> Cow<'a, str> {
        if let Some(singular) = self.exceptions.get(word) {
            return Cow::Owned(singular.clone());
        }
        if !is_reducible(word) {
            return Cow::Borrowed(word);
        }
        for &(suffix, replacement) in RULES {
            if let Some(candidate) = apply_rule(word, suffix, replacement) {
                return Cow::Owned(candidate);
            }
        }
        Cow::Borrowed(word)
    }

    /// Singularize every whitespace-separated token of an already normalized
    /// phrase.
    pub fn singular_phrase(&self, phrase: &str) -> String {
        phrase
            .split_whitespace()
            .map(|word| self.singular(word))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Every spelling worth comparing for `word`: the surface form, the
    /// result of each suffix rule that applies (the canonical singular
    /// first), and plural forms of that singular. Deduplicated, surface
    /// first.
    pub fn variants<'a>(&'a self, word: &'a str) -> Vec<Variant<'a>> {
        let mut seen: HashSet<Cow<'a, str>> = HashSet::new();
        let mut out: Vec<Variant<'a>> = Vec::new();

        push_unique(
            &mut out,
            &mut seen,
            Variant {
                text: Cow::Borrowed(word),
                source: VariantSource::Surface,
            },
        );

        let stem: Cow<'a, str> = if let Some(singular) = self.exceptions.get(word) {
            push_unique(
                &mut out,
                &mut seen,
                Variant {
                    text: Cow::Borrowed(singular.as_str()),
                    source: VariantSource::Exception,
                },
            );
            Cow::Borrowed(singular.as_str())
        } else if is_reducible(word) {
            // Every applicable rule, not just the first: "quiches" gives both
            // "quich" and "quiche". The first candidate is the canonical stem.
            let mut stem: Option<Cow<'a, str>> = None;
            for &(suffix, replacement) in RULES.iter().chain(LOOSE_RULES) {
                if let Some(candidate) = apply_rule(word, suffix, replacement) {
                    if stem.is_none() {
                        stem = Some(Cow::Owned(candidate.clone()));
                    }
                    push_unique(
                        &mut out,
                        &mut seen,
                        Variant {
                            text: Cow::Owned(candidate),
                            source: VariantSource::Rule {
                                suffix,
                                replacement,
                            },
                        },
                    );
                }
            }
            stem.unwrap_or(Cow::Borrowed(word))
        } else {
            Cow::Borrowed(word)
        };

        for plural in self.plurals_of(&stem) {
            push_unique(
                &mut out,
                &mut seen,
                Variant {
                    text: Cow::Owned(plural),
                    source: VariantSource::Plural,
                },
            );
        }

        out
    }

    fn plurals_of(&self, singular: &str) -> Vec<String> {
        if let Some(plural) = self.plurals.get(singular) {
            return vec![plural.clone()];
        }
        if !singular.chars().all(char::is_alphabetic) || singular.is_empty() {
            return Vec::new();
        }
        let mut out = vec![format!("{singular}s")];
        if ["s", "x", "z", "ch", "sh", "o"]
            .iter()
            .any(|end| singular.ends_with(end))
        {
            out.push(format!("{singular}es"));
        }
        if let Some(stem) = singular.strip_suffix('y')
            && stem.chars().last().is_some_and(|c| !is_vowel(c))
        {
            out.push(format!("{stem}ies"));
        }
        out
    }
}

fn is_reducible(word: &str) -> bool {
    word.chars().count() >= MIN_WORD_LEN
        && word.chars().all(char::is_alphabetic)
        && !INVARIANT_SUFFIXES.iter().any(|end| word.ends_with(end))
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn apply_rule(word: &str, suffix: &str, replacement: &str) -> Option<String> {
    let stem = word.strip_suffix(suffix)?;
    let min_stem = if suffix == "ies" { 2 } else { 1 };
    if stem.chars().count() < min_stem {
        return None;
    }
    Some(format!("{stem}{replacement}"))
}

fn load_exc(path: &Path) -> Result<Vec<(String, String)>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file =
        File::open(path).with_context(|| format!("open exception file {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut pairs = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line =
            line.with_context(|| format!("read line {} in {}", lineno + 1, path.display()))?;
        let content = line.split('#').next().unwrap_or_default();
        let mut parts = content.split_whitespace();
        let (Some(plural), Some(singular)) = (parts.next(), parts.next()) else {
            continue;
        };
        pairs.push((plural.to_string(), singular.to_string()));
    }
    Ok(pairs)
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn push_unique<'a>(
    out: &mut Vec<Variant<'a>>,
    seen: &mut HashSet<Cow<'a, str>>,
    variant: Variant<'a>,
) {
    if seen.insert(variant.text.clone()) {
        out.push(variant);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_suffix_rules() {
        let s = Singularizer::new();
        assert_eq!(s.singular("onions"), "onion");
        assert_eq!(s.singular("berries"), "berry");
        assert_eq!(s.singular("tomatoes"), "tomato");
        assert_eq!(s.singular("peaches"), "peach");
        assert_eq!(s.singular("radishes"), "radish");
        assert_eq!(s.singular("boxes"), "box");
        assert_eq!(s.singular("glasses"), "glass");
        assert_eq!(s.singular("pies"), "pie");
        assert_eq!(s.singular("grapes"), "grape");
    }

    #[test]
    fn leaves_invariant_words_alone() {
        let s = Singularizer::new();
        assert_eq!(s.singular("hummus"), "hummus");
        assert_eq!(s.singular("asparagus"), "asparagus");
        assert_eq!(s.singular("bass"), "bass");
        assert_eq!(s.singular("tofu"), "tofu");
        assert_eq!(s.singular("gas"), "gas");
        assert_eq!(s.singular("7up"), "7up");
        assert_eq!(s.singular("12"), "12");
    }

    #[test]
    fn uses_exceptions_first() {
        let s = Singularizer::new();
        assert_eq!(s.singular("leaves"), "leaf");
        assert_eq!(s.singular("olives"), "olive");
        assert_eq!(s.singular("molasses"), "molasses");
    }

    #[test]
    fn singular_is_stable() {
        let s = Singularizer::new();
        for word in ["onion", "berry", "tomato", "leaf", "olive", "cookie", "glass"] {
            assert_eq!(s.singular(word), word, "{word}");
        }
    }

    #[test]
    fn extra_exceptions_override_builtins() {
        let s = Singularizer::with_exceptions([("fries".to_string(), "fries".to_string())]);
        assert_eq!(s.singular("fries"), "fries");
        assert_eq!(Singularizer::new().singular("fries"), "fry");
    }

    #[test]
    fn variants_cover_both_directions() {
        let s = Singularizer::new();
        let texts: Vec<String> = s
            .variants("berries")
            .into_iter()
            .map(|v| v.text.into_owned())
            .collect();
        assert_eq!(texts, vec!["berries", "berry", "berrie", "berri", "berrys"]);

        let onion = s.variants("onion");
        assert!(matches!(onion[0].source, VariantSource::Surface));
        assert!(onion.iter().any(|v| v.text == "onions"));

        let leaf = s.variants("leaf");
        assert!(leaf.iter().any(|v| v.text == "leaves"));

        let leaves = s.variants("leaves");
        assert!(matches!(leaves[1].source, VariantSource::Exception));
        assert_eq!(leaves[1].text, "leaf");
    }

    #[test]
    fn variants_include_plain_strips() {
        let s = Singularizer::new();
        for (plural, singular) in [
            ("smoothies", "smoothie"),
            ("veggies", "veggie"),
            ("quiches", "quiche"),
            ("brioches", "brioche"),
            ("aloes", "aloe"),
        ] {
            let variants = s.variants(plural);
            assert!(
                variants.iter().any(|v| v.text == singular),
                "{plural} -> {variants:?}"
            );
        }
        assert_eq!(s.singular("quiches"), "quich");
    }

    #[test]
    fn rule_variant_records_provenance() {
        let s = Singularizer::new();
        let variants = s.variants("tomatoes");
        assert_eq!(variants[1].text, "tomato");
        assert_eq!(
            variants[1].source,
            VariantSource::Rule {
                suffix: "oes",
                replacement: "o",
            }
        );
        assert!(variants.iter().any(|v| v.text == "tomatos"));
    }
}
