//! Efficient text processing utilities

use std::borrow::Cow;
use regex::Regex;
use lazy_static::lazy_static;

lazy_static! {
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
    static ref URL_REGEX: Regex = Regex::new(r"http\S+|www\S+|https\S+").unwrap();
}

/// Unicode punctuation that shows up in pasted store reviews on top of ASCII.
const EXTRA_PUNCTUATION: &[char] = &[
    '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2013}', '\u{2014}', '\u{2026}',
    '\u{00AB}', '\u{00BB}', '\u{00BF}', '\u{00A1}',
];

/// Case-insensitive text operations and review normalization
pub struct TextUtils;

impl TextUtils {
    /// Lowercase, drop URLs and punctuation, collapse whitespace.
    ///
    /// Total over every input and idempotent: `normalize(normalize(x)) == normalize(x)`.
    pub fn normalize(text: &str) -> String {
        let lowered = text.to_lowercase();
        let without_urls = URL_REGEX.replace_all(&lowered, "");
        let without_punct: String = without_urls
            .chars()
            .filter(|c| !Self::is_punctuation(*c))
            .collect();
        // Stripping punctuation can glue "www" or "http" onto a following token.
        let without_urls = URL_REGEX.replace_all(&without_punct, "");
        Self::normalize_whitespace(&without_urls).into_owned()
    }

    /// Normalize any displayable value, e.g. a numeric cell read from an export.
    pub fn normalize_value<T: ToString + ?Sized>(value: &T) -> String {
        Self::normalize(&value.to_string())
    }

    pub fn is_punctuation(c: char) -> bool {
        c.is_ascii_punctuation() || EXTRA_PUNCTUATION.contains(&c)
    }

    /// Collapse whitespace runs to one space and trim both ends
    pub fn normalize_whitespace(text: &str) -> Cow<'_, str> {
        let trimmed = text.trim();
        if WHITESPACE_REGEX.find_iter(trimmed).any(|m| m.as_str() != " ") {
            Cow::Owned(WHITESPACE_REGEX.replace_all(trimmed, " ").into_owned())
        } else {
            Cow::Borrowed(trimmed)
        }
    }

    /// Keep at most `max_chars` characters, cutting on a char boundary
    pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => &text[..idx],
            None => text,
        }
    }
}
