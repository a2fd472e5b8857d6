use alloc::{
    collections::{BTreeMap, BTreeSet},
    string::String,
    vec::Vec,
};

const SIGNATURE_MIN_CHARS: usize = 3;
const SIGNATURE_MAX_CHARS: usize = 90;
const PROTECTED_LINE_CHARS: usize = 120;
const PROTECTED_LINE_WORDS: usize = 15;

/// Normalized forms of a line used to recognise running heads and feet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct LineSignature {
    pub(super) with_digits: String,
    pub(super) without_digits: String,
}

impl LineSignature {
    pub(super) fn of(text: &str) -> Self {
        Self {
            with_digits: normalize_line(text, true),
            without_digits: normalize_line(text, false),
        }
    }

    fn keys(&self) -> impl Iterator<Item = &str> {
        let without = (self.without_digits != self.with_digits).then_some(self.without_digits.as_str());
        core::iter::once(self.with_digits.as_str()).chain(without)
    }
}

/// Lowercase, drop punctuation (and digits when `keep_digits` is false),
/// collapse whitespace.
fn normalize_line(text: &str, keep_digits: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if !ch.is_alphanumeric() || (!keep_digits && ch.is_numeric()) {
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.extend(ch.to_lowercase());
    }

    out
}

/// Long prose lines are body text even when they sit in a margin band.
pub(super) fn is_protected(text: &str) -> bool {
    text.chars().count() > PROTECTED_LINE_CHARS
        || text.split_whitespace().count() >= PROTECTED_LINE_WORDS
}

/// Folios: `12`, `- 12 -`, `12 / 40`, `Page 12`, `Page 12 of 40`, `xii`.
pub(super) fn is_page_number(text: &str) -> bool {
    let lower: String = text.trim().chars().flat_map(char::to_lowercase).collect();
    let core = lower.trim_matches(|ch: char| ch.is_whitespace() || matches!(ch, '-' | '–' | '—'));
    if core.is_empty() {
        return false;
    }

    let rest = match core.strip_prefix("page") {
        Some(rest) => rest.trim_start(),
        None => core,
    };

    if let Some((current, total)) = rest.split_once('/') {
        return is_number(current.trim()) && is_number(total.trim());
    }

    let parts: Vec<&str> = rest.split_whitespace().collect();
    match parts.as_slice() {
        [single] => is_number(single) || is_roman_numeral(single),
        [current, "of", total] => is_number(current) && is_number(total),
        _ => false,
    }
}

fn is_number(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|ch| ch.is_ascii_digit())
}

/// Accepts canonical lowercase roman numerals only, so words such as `dim`
/// or `civil` are not mistaken for folios.
fn is_roman_numeral(text: &str) -> bool {
    if text.is_empty() || text.len() > 12 {
        return false;
    }
    roman_value(text).is_some_and(|value| to_roman(value).as_str() == text)
}

fn roman_value(text: &str) -> Option<u32> {
    let mut total = 0u32;
    let mut previous = 0u32;

    for ch in text.chars().rev() {
        let value = match ch {
            'i' => 1,
            'v' => 5,
            'x' => 10,
            'l' => 50,
            'c' => 100,
            'd' => 500,
            'm' => 1_000,
            _ => return None,
        };
        if value < previous {
            total = total.checked_sub(value)?;
        } else {
            total += value;
            previous = value;
        }
    }

    (1..=3_999).contains(&total).then_some(total)
}

fn to_roman(mut value: u32) -> String {
    const TABLE: [(u32, &str); 13] = [
        (1_000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];

    let mut out = String::new();
    for (unit, glyphs) in TABLE {
        while value >= unit {
            out.push_str(glyphs);
            value -= unit;
        }
    }
    out
}

/// Which pages each margin-band signature was seen on.
#[derive(Debug, Default)]
pub(super) struct RepeatTracker {
    pages_by_signature: BTreeMap<String, BTreeSet<usize>>,
}

impl RepeatTracker {
    pub(super) fn observe(&mut self, page_ordinal: usize, signature: &LineSignature) {
        for key in signature.keys() {
            let chars = key.chars().count();
            if !(SIGNATURE_MIN_CHARS..=SIGNATURE_MAX_CHARS).contains(&chars) {
                continue;
            }
            self.pages_by_signature
                .entry(String::from(key))
                .or_default()
                .insert(page_ordinal);
        }
    }

    /// Signatures seen on at least `min_share_percent` of `page_count` pages.
    pub(super) fn removable(&self, page_count: usize, min_share_percent: u8) -> BTreeSet<String> {
        self.pages_by_signature
            .iter()
            .filter(|(_, pages)| pages.len() * 100 >= page_count * min_share_percent as usize)
            .map(|(signature, _)| signature.clone())
            .collect()
    }
}

pub(super) fn matches_any(signature: &LineSignature, removable: &BTreeSet<String>) -> bool {
    signature.keys().any(|key| removable.contains(key))
}

/// User-supplied phrases, matched as substrings of the normalized line.
#[derive(Debug, Default)]
pub(super) struct PhraseMatcher {
    phrases: Vec<LineSignature>,
}

impl PhraseMatcher {
    pub(super) fn new<'a, I>(phrases: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let phrases = phrases
            .into_iter()
            .map(LineSignature::of)
            .filter(|signature| !signature.with_digits.is_empty())
            .collect();
        Self { phrases }
    }

    pub(super) fn matches(&self, line: &LineSignature) -> bool {
        self.phrases.iter().any(|phrase| {
            line.with_digits.contains(phrase.with_digits.as_str())
                || (!phrase.without_digits.is_empty()
                    && line.without_digits.contains(phrase.without_digits.as_str()))
        })
    }
}
