//! Text cleaning and regex fallbacks for field extraction

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_RE: hardcoded regex is valid"));

static DISALLOWED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\s@.,-]").expect("DISALLOWED_RE: hardcoded regex is valid")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("EMAIL_RE: hardcoded regex is valid")
});

static PHONE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // +CC (AAA) NNN-NNNN
        r"\+?\d{1,3}[-.\s]?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}",
        // +CC AAA NNN NNNN
        r"\+?\d{1,3}[-.\s]?\d{3}[-.\s]?\d{3}[-.\s]?\d{4}",
        // (AAA) NNN-NNNN
        r"\(\d{3}\)\s?\d{3}-\d{4}",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("PHONE_RES: hardcoded regex is valid"))
    .collect()
});

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*").expect("NUMBER_RE: hardcoded regex is valid"));

/// Normalizes scraped text
///
/// Collapses whitespace runs to one space, trims, then drops every character
/// that is not a word character, whitespace, `@`, `.`, `,` or `-`.
pub fn clean_text(raw: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(raw.trim(), " ");
    DISALLOWED_RE.replace_all(&collapsed, "").into_owned()
}

/// First email-looking token in `text`, or an empty string
pub fn extract_email(text: &str) -> String {
    EMAIL_RE
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// First phone number in `text`; patterns are tried in order
pub fn extract_phone(text: &str) -> String {
    PHONE_RES
        .iter()
        .find_map(|pattern| pattern.find(text))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Path segment right after `marker` in `href`, e.g. the company slug in
/// `https://app.example.com/#/companies/acme-inc/people`
pub fn segment_after(href: &str, marker: &str) -> Option<String> {
    let (_, rest) = href.rsplit_once(marker)?;
    let segment = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    (!segment.is_empty()).then(|| segment.to_string())
}

/// First integer in `text`, with thousands separators removed
///
/// `"1,234 results"` yields `Some(1234)`.
pub fn first_number(text: &str) -> Option<u64> {
    NUMBER_RE
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}
