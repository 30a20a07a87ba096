use std::mem;

use stock_types::ParsedSegment;
use tracing::debug;

use crate::normalize::normalize;
use crate::numbers::{QuantityToken, is_joining_and, parse_quantity};

/// Words dropped from a phrase without ending it.
const FILLER_WORDS: &[&str] = &["um", "uh", "er", "erm", "hmm", "the", "and", "a", "an", "like"];

/// Filler words that signal the speaker is correcting the previous count.
const CORRECTION_CUES: &[&str] = &[
    "wait",
    "no",
    "actually",
    "sorry",
    "oops",
    "scratch",
    "make",
    "that",
    "mean",
    "i",
    "correction",
    "instead",
];

/// How the transcript was cut into parts before scanning.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SegmentStrategy {
    /// Commas, semicolons, `&`, newlines or a standalone "and" produced
    /// several parts.
    Delimited,
    /// A single part; only quantity tokens start new segments.
    NumberAnchored,
}

/// A longer reading of a segment whose phrase may have been cut by a
/// standalone "and": "2 mac and cheese" scans as `2 mac` plus the stray
/// `cheese`, and reads as `mac and cheese` here.
#[derive(Clone, Debug, PartialEq)]
pub struct Continuation {
    /// Index into [`Extraction::segments`].
    pub segment: usize,
    /// Index into [`Extraction::unanchored`] of the text it absorbs.
    pub unanchored: usize,
    pub phrase: String,
}

/// Ordered segments plus the text that could not be attached to a quantity.
#[derive(Clone, Debug, PartialEq)]
pub struct Extraction {
    pub strategy: SegmentStrategy,
    pub segments: Vec<ParsedSegment>,
    /// Text spoken before any quantity in a part, e.g. "we have" in
    /// "we have 3 tofu".
    pub unanchored: Vec<String>,
    pub continuations: Vec<Continuation>,
    /// Segments whose quantity token was not a finite decimal.
    pub malformed: usize,
}

impl Extraction {
    fn empty(strategy: SegmentStrategy) -> Self {
        Self {
            strategy,
            segments: Vec::new(),
            unanchored: Vec::new(),
            continuations: Vec::new(),
            malformed: 0,
        }
    }
}

/// Split a raw transcript into `(quantity, phrase)` segments in spoken order.
pub fn extract_segments(transcript: &str) -> Extraction {
    let parts = split_parts(transcript);
    let strategy = if parts.len() > 1 {
        SegmentStrategy::Delimited
    } else {
        SegmentStrategy::NumberAnchored
    };

    let mut scanner = Scanner::new(strategy);
    for part in &parts {
        scanner.scan(&part.text, part.after_and);
    }
    let extraction = scanner.finish();
    debug!(
        strategy = ?extraction.strategy,
        parts = parts.len(),
        segments = extraction.segments.len(),
        "extracted segments"
    );
    extraction
}

/// Cut on explicit delimiters and return the normalized, non-empty parts.
///
/// A comma between two digits is a thousands separator, and an "and" inside a
/// spelled number ("one hundred and five") is part of that number.
pub fn split_delimited(transcript: &str) -> Vec<String> {
    split_parts(transcript)
        .into_iter()
        .map(|part| part.text)
        .collect()
}

struct Part {
    text: String,
    /// The part was cut from its predecessor by a standalone "and".
    after_and: bool,
}

fn split_parts(transcript: &str) -> Vec<Part> {
    let chars: Vec<char> = transcript.chars().collect();
    let mut pieces = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        let delimiter = match c {
            ';' | '&' | '\n' | '\r' => true,
            ',' => {
                let digit_before = i > 0 && chars[i - 1].is_ascii_digit();
                let digit_after = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
                !(digit_before && digit_after)
            }
            _ => false,
        };
        if delimiter {
            pieces.push(mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    pieces.push(current);

    let mut parts = Vec::new();
    for piece in pieces {
        let normalized = normalize(&piece);
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        let mut part: Vec<&str> = Vec::new();
        let mut after_and = false;
        for (pos, token) in tokens.iter().enumerate() {
            if *token == "and" && !is_joining_and(&tokens, pos) {
                if !part.is_empty() {
                    parts.push(Part {
                        text: part.join(" "),
                        after_and,
                    });
                }
                part.clear();
                after_and = true;
            } else {
                part.push(*token);
            }
        }
        if !part.is_empty() {
            parts.push(Part {
                text: part.join(" "),
                after_and,
            });
        }
    }
    parts
}

/// Words the scanner drops from phrases, correction cues included.
pub(crate) fn is_filler(word: &str) -> bool {
    FILLER_WORDS.contains(&word) || CORRECTION_CUES.contains(&word)
}

fn is_correction_cue(word: &str) -> bool {
    CORRECTION_CUES.contains(&word)
}

/// A quantity anchor and how many tokens it spans.
enum Anchor {
    Quantity(f64),
    Malformed,
}

fn anchor_at(tokens: &[&str], pos: usize) -> Option<(Anchor, usize)> {
    let token = tokens[pos];
    if token == "out" && tokens.get(pos + 1) == Some(&"of") {
        return Some((Anchor::Quantity(0.0), 2));
    }
    match parse_quantity(token)? {
        QuantityToken::Value(v) => Some((Anchor::Quantity(v), 1)),
        QuantityToken::Malformed => Some((Anchor::Malformed, 1)),
    }
}

struct Open {
    anchor: Anchor,
    words: Vec<String>,
}

/// Left-to-right token scan shared by every part of one transcript, so a
/// correction cue in one part ("no wait") can carry the previous phrase into
/// a bare quantity in the next ("3").
struct Scanner {
    out: Extraction,
    open: Option<Open>,
    last_phrase: Option<String>,
    correcting: bool,
    /// Segment emitted when the previous part ended.
    tail: Option<usize>,
}

impl Scanner {
    fn new(strategy: SegmentStrategy) -> Self {
        Self {
            out: Extraction::empty(strategy),
            open: None,
            last_phrase: None,
            correcting: false,
            tail: None,
        }
    }

    fn scan(&mut self, part: &str, after_and: bool) {
        let tail = self.tail.take();
        let tokens: Vec<&str> = part.split_whitespace().collect();
        let mut stray: Vec<&str> = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if let Some((anchor, width)) = anchor_at(&tokens, i) {
                self.close();
                self.open = Some(Open {
                    anchor,
                    words: Vec::new(),
                });
                i += width;
                continue;
            }

            let word = tokens[i];
            if is_correction_cue(word) {
                self.correcting = true;
            }
            match self.open.as_mut() {
                Some(open) if !is_filler(word) => {
                    open.words.push(word.to_string());
                    self.correcting = false;
                }
                None if !is_filler(word) => stray.push(word),
                _ => {}
            }
            i += 1;
        }
        if self.close() {
            self.tail = Some(self.out.segments.len() - 1);
        }
        if !stray.is_empty() {
            let stray = stray.join(" ");
            if after_and && let Some(segment) = tail {
                self.out.continuations.push(Continuation {
                    segment,
                    unanchored: self.out.unanchored.len(),
                    phrase: format!("{} and {stray}", self.out.segments[segment].phrase),
                });
            }
            self.out.unanchored.push(stray);
        }
    }

    /// Close the open segment; true when it was emitted.
    fn close(&mut self) -> bool {
        let Some(open) = self.open.take() else {
            return false;
        };
        let quantity = match open.anchor {
            Anchor::Quantity(q) => q,
            Anchor::Malformed => {
                debug!("dropping segment with malformed quantity");
                self.out.malformed += 1;
                return false;
            }
        };
        let phrase = if open.words.is_empty() {
            match (&self.last_phrase, self.correcting) {
                (Some(previous), true) => {
                    self.correcting = false;
                    previous.clone()
                }
                _ => {
                    debug!(quantity, "dropping segment with empty phrase");
                    return false;
                }
            }
        } else {
            open.words.join(" ")
        };
        self.last_phrase = Some(phrase.clone());
        self.out.segments.push(ParsedSegment { quantity, phrase });
        true
    }

    fn finish(mut self) -> Extraction {
        self.close();
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(transcript: &str) -> Vec<(f64, String)> {
        extract_segments(transcript)
            .segments
            .into_iter()
            .map(|s| (s.quantity, s.phrase))
            .collect()
    }

    fn pair(q: f64, p: &str) -> (f64, String) {
        (q, p.to_string())
    }

    #[test]
    fn splits_on_commas_and_standalone_and() {
        let extraction = extract_segments("Ten avocado, three red onion and out of cucumber");
        assert_eq!(extraction.strategy, SegmentStrategy::Delimited);
        assert_eq!(
            pairs("Ten avocado, three red onion and out of cucumber"),
            vec![pair(10.0, "avocado"), pair(3.0, "red onion"), pair(0.0, "cucumber")]
        );
    }

    #[test]
    fn and_inside_words_does_not_split() {
        assert_eq!(split_delimited("4 candy canes"), vec!["4 candy canes"]);
        assert_eq!(
            split_delimited("2 sandwich, 3 andouille"),
            vec!["2 sandwich", "3 andouille"]
        );
    }

    #[test]
    fn scans_delimiter_free_speech() {
        let extraction = extract_segments("5 green onion 3 fried onions 3 edamame");
        assert_eq!(extraction.strategy, SegmentStrategy::NumberAnchored);
        assert_eq!(
            pairs("5 green onion 3 fried onions 3 edamame"),
            vec![
                pair(5.0, "green onion"),
                pair(3.0, "fried onions"),
                pair(3.0, "edamame"),
            ]
        );
    }

    #[test]
    fn filters_filler_without_ending_phrase() {
        assert_eq!(
            pairs("five avocado wait no um three the avocado"),
            vec![pair(5.0, "avocado"), pair(3.0, "avocado")]
        );
        assert_eq!(pairs("3 red um onion"), vec![pair(3.0, "red onion")]);
    }

    #[test]
    fn out_of_is_zero_anywhere() {
        assert_eq!(pairs("out of cucumber"), vec![pair(0.0, "cucumber")]);
        assert_eq!(
            pairs("10 avocado out of cucumber 2 tofu"),
            vec![pair(10.0, "avocado"), pair(0.0, "cucumber"), pair(2.0, "tofu")]
        );
    }

    #[test]
    fn decimals_and_malformed_quantities() {
        assert_eq!(pairs("2.5 tofu"), vec![pair(2.5, "tofu")]);
        let extraction = extract_segments("2.5.3 tofu, 4 rice");
        assert_eq!(extraction.malformed, 1);
        assert_eq!(pairs("2.5.3 tofu, 4 rice"), vec![pair(4.0, "rice")]);
    }

    #[test]
    fn thousands_separator_is_not_a_delimiter() {
        assert_eq!(pairs("1,000 napkins"), vec![pair(1000.0, "napkins")]);
        assert_eq!(
            pairs("one hundred and five cups, 2 lids"),
            vec![pair(105.0, "cups"), pair(2.0, "lids")]
        );
    }

    #[test]
    fn keeps_unanchored_text() {
        let extraction = extract_segments("we have 3 tofu");
        assert_eq!(extraction.unanchored, vec!["we have"]);
        assert_eq!(extraction.segments.len(), 1);
    }

    #[test]
    fn bare_quantity_after_correction_reuses_phrase() {
        assert_eq!(
            pairs("5 avocado, no wait, 3"),
            vec![pair(5.0, "avocado"), pair(3.0, "avocado")]
        );
        assert_eq!(
            pairs("5 avocado actually make that 3"),
            vec![pair(5.0, "avocado"), pair(3.0, "avocado")]
        );
        assert_eq!(pairs("5 avocado 3"), vec![pair(5.0, "avocado")]);
    }

    #[test]
    fn and_split_keeps_a_joined_reading() {
        let extraction = extract_segments("2 mac and cheese, 3 tofu");
        assert_eq!(
            pairs("2 mac and cheese, 3 tofu"),
            vec![pair(2.0, "mac"), pair(3.0, "tofu")]
        );
        assert_eq!(extraction.unanchored, vec!["cheese"]);
        assert_eq!(
            extraction.continuations,
            vec![Continuation {
                segment: 0,
                unanchored: 0,
                phrase: "mac and cheese".to_string(),
            }]
        );

        assert!(extract_segments("5 avocado, cheese").continuations.is_empty());
        assert!(extract_segments("and cheese 3 tofu").continuations.is_empty());
    }

    #[test]
    fn empty_input_has_no_segments() {
        let extraction = extract_segments("   ");
        assert!(extraction.segments.is_empty());
        assert!(extraction.unanchored.is_empty());
    }
}
