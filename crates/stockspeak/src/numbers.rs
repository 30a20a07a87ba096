use std::borrow::Cow;

/// Spoken number word categories. Composition rules depend on which kind
/// came before.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum NumberWord {
    Unit(u64),
    Teen(u64),
    Tens(u64),
    Hundred,
    Thousand,
    Dozen,
}

const UNITS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

const TEENS: &[&str] = &[
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: &[&str] = &[
    "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

fn classify_word(word: &str) -> Option<NumberWord> {
    if let Some(v) = UNITS.iter().position(|w| *w == word) {
        return Some(NumberWord::Unit(v as u64));
    }
    if let Some(v) = TEENS.iter().position(|w| *w == word) {
        return Some(NumberWord::Teen(10 + v as u64));
    }
    if let Some(v) = TENS.iter().position(|w| *w == word) {
        return Some(NumberWord::Tens(20 + 10 * v as u64));
    }
    match word {
        "hundred" => Some(NumberWord::Hundred),
        "thousand" => Some(NumberWord::Thousand),
        "dozen" => Some(NumberWord::Dozen),
        _ => None,
    }
}

/// True for any word that [`spell_to_digits`] would turn into a number.
pub fn is_number_word(word: &str) -> bool {
    classify_word(word).is_some()
}

/// Value of a single number word read on its own.
pub fn word_value(word: &str) -> Option<f64> {
    read_number(&[word]).map(|(value, _)| value as f64)
}

/// A token that looks like a quantity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum QuantityToken {
    Value(f64),
    /// Digits and dots that do not form a finite decimal, e.g. `2.5.3`.
    Malformed,
}

/// Read a normalized token as a quantity: `\d+(\.\d+)?`, or a bare number
/// word. Returns `None` for ordinary words, including ones that merely start
/// with a digit such as `7up`.
pub fn parse_quantity(token: &str) -> Option<QuantityToken> {
    if let Some(value) = word_value(token) {
        return Some(QuantityToken::Value(value));
    }
    if !token.starts_with(|c: char| c.is_ascii_digit())
        || !token.chars().all(|c| c.is_ascii_digit() || c == '.')
    {
        return None;
    }
    let mut parts = token.split('.');
    let whole = parts.next().unwrap_or_default();
    let frac = parts.next();
    let well_formed = parts.next().is_none()
        && !whole.is_empty()
        && frac.is_none_or(|f| !f.is_empty());
    match token.parse::<f64>() {
        Ok(value) if well_formed && value.is_finite() => Some(QuantityToken::Value(value)),
        _ => Some(QuantityToken::Malformed),
    }
}

/// Replace runs of spelled-out number words with their digit form.
///
/// "twenty three" and "one hundred and five" compose into one number;
/// "five three" stays two numbers. An `and` only joins when it sits between
/// `hundred`/`thousand` and another number word. `dozen` multiplies a
/// preceding digit quantity as well: "2 dozen" and "1.5 dozen" read as 24
/// and 18.
pub fn spell_to_digits<'a>(tokens: &[&'a str]) -> Vec<Cow<'a, str>> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if let Some(dozens) = digit_dozens(&tokens[i..]) {
            out.push(Cow::Owned(dozens.to_string()));
            i += 2;
            continue;
        }
        match read_number(&tokens[i..]) {
            Some((value, used)) => {
                out.push(Cow::Owned(value.to_string()));
                i += used;
            }
            None => {
                out.push(Cow::Borrowed(tokens[i]));
                i += 1;
            }
        }
    }
    out
}

/// `<digits> dozen` as a single value.
fn digit_dozens(tokens: &[&str]) -> Option<f64> {
    let [count, "dozen", ..] = tokens else {
        return None;
    };
    if !count.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    match parse_quantity(count)? {
        QuantityToken::Value(value) => Some(value * 12.0).filter(|v| v.is_finite()),
        QuantityToken::Malformed => None,
    }
}

/// True when `tokens[pos]` is an `and` glued inside a spelled number.
pub fn is_joining_and(tokens: &[&str], pos: usize) -> bool {
    if tokens.get(pos) != Some(&"and") || pos == 0 {
        return false;
    }
    let before = classify_word(tokens[pos - 1]);
    let after = tokens.get(pos + 1).and_then(|w| classify_word(w));
    matches!(before, Some(NumberWord::Hundred | NumberWord::Thousand))
        && matches!(
            after,
            Some(NumberWord::Unit(1..) | NumberWord::Teen(_) | NumberWord::Tens(_))
        )
}

fn can_follow(last: NumberWord, next: NumberWord, total: u64, current: u64) -> bool {
    use NumberWord::*;
    match (last, next) {
        (Unit(0), _) | (_, Unit(0)) => false,
        (Tens(_) | Hundred | Thousand, Unit(_)) => current % 10 == 0,
        (Hundred | Thousand, Teen(_) | Tens(_)) => true,
        (Unit(_) | Teen(_), Hundred) => current < 100,
        (Unit(_) | Teen(_) | Tens(_) | Hundred, Thousand) => total == 0,
        (Unit(_) | Teen(_) | Tens(_), Dozen) => current < 100,
        _ => false,
    }
}

/// Longest composable number at the start of `tokens`, with the number of
/// tokens consumed.
fn read_number(tokens: &[&str]) -> Option<(u64, usize)> {
    let first = classify_word(tokens.first()?)?;
    let mut total = 0u64;
    let mut current = 0u64;
    let mut last = first;
    apply(first, &mut total, &mut current);
    let mut used = 1;

    if first == NumberWord::Dozen {
        return Some((total + current, used));
    }

    let mut i = 1;
    while i < tokens.len() {
        let skip_and = is_joining_and(tokens, i);
        let at = if skip_and { i + 1 } else { i };
        let Some(next) = tokens.get(at).and_then(|w| classify_word(w)) else {
            break;
        };
        if !can_follow(last, next, total, current) {
            break;
        }
        apply(next, &mut total, &mut current);
        last = next;
        i = at + 1;
        used = i;
        if next == NumberWord::Dozen {
            break;
        }
    }

    Some((total + current, used))
}

fn apply(word: NumberWord, total: &mut u64, current: &mut u64) {
    match word {
        NumberWord::Unit(v) | NumberWord::Teen(v) | NumberWord::Tens(v) => *current += v,
        NumberWord::Hundred => *current = (*current).max(1) * 100,
        NumberWord::Thousand => {
            *total += (*current).max(1) * 1000;
            *current = 0;
        }
        NumberWord::Dozen => *current = (*current).max(1) * 12,
    }
}
