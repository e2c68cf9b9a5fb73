//! Per-field plausibility rules
//!
//! These run on the candidates of every cascade stage, so a stage that picks
//! up a heading or a placeholder simply yields nothing and the next stage
//! gets its turn.

use crate::extract::labels::{
    is_any_label, is_section_heading, normalize_label, starts_with_words,
};
use crate::extract::normalize::collapse_whitespace;
use crate::extract::SellerFields;
use regex::Regex;
use std::sync::OnceLock;

const MAX_BUSINESS_NAME_CHARS: usize = 120;

/// Normalized values that are never a business name
const DISALLOWED_NAMES: &[&str] = &[
    "",
    "business name",
    "company name",
    "trading name",
    "legal name",
    "seller name",
    "name",
    "vat number",
    "vat",
    "registered address",
    "business address",
    "address",
    "seller information",
    "business information",
    "detailed seller information",
    "about the seller",
    "about this seller",
    "seller profile",
    "n a",
    "na",
    "none",
    "unknown",
    "not provided",
];

/// Leading phrases of headings that the backward scan sometimes lands on
const NON_NAME_PREFIXES: &[&str] = &[
    "this seller",
    "about the seller",
    "about this seller",
    "detailed seller information",
    "seller feedback",
    "contact the seller",
    "returns",
    "customer service",
    "shipping policies",
    "lifetime ratings",
    "positive feedback",
];

/// Phrases after which an address capture has run into the next section
const ADDRESS_TRAILERS: &[&str] = &[
    "this seller ships from",
    "ships from",
    "contact the seller",
    "customer services address",
    "customer service address",
    "returns policy",
    "return policy",
    "returns address",
    "detailed seller information",
    "seller feedback",
];

fn vat_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[A-Za-z]{2})?[A-Za-z0-9 \-]{8,20}$").expect("valid VAT shape pattern")
    })
}

fn vat_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]{8,}").expect("valid VAT digit pattern"))
}

/// Applies every field rule to a stage's candidates
pub fn apply(fields: SellerFields) -> SellerFields {
    SellerFields {
        business_name: business_name(&fields.business_name),
        vat_number: vat_number(&fields.vat_number),
        registered_address: registered_address(&fields.registered_address),
        shipped_from: shipped_from(&fields.shipped_from),
    }
}

/// Returns the cleaned business name, or an empty string if it is implausible
pub fn business_name(candidate: &str) -> String {
    let value = collapse_whitespace(candidate);
    if !is_plausible_business_name(&value) {
        return String::new();
    }
    value
}

/// Plausibility filter shared with the backward scan of the pattern stage
pub fn is_plausible_business_name(value: &str) -> bool {
    let normalized = normalize_label(value);

    if DISALLOWED_NAMES.contains(&normalized.as_str()) {
        return false;
    }

    if value.chars().count() > MAX_BUSINESS_NAME_CHARS {
        return false;
    }

    if NON_NAME_PREFIXES
        .iter()
        .any(|prefix| starts_with_words(&normalized, prefix))
    {
        return false;
    }

    !is_any_label(value) && !is_section_heading(value)
}

/// Returns the VAT number if it has a plausible shape
///
/// Accepted: optional two-letter country prefix followed by 8 to 20 letters,
/// digits, spaces or hyphens, containing a run of at least 8 digits.
pub fn vat_number(candidate: &str) -> String {
    let value = candidate.trim();
    if vat_shape().is_match(value) && vat_digits().is_match(value) {
        value.to_string()
    } else {
        String::new()
    }
}

/// Cleans an address and cuts off any section that bled into it
pub fn registered_address(candidate: &str) -> String {
    let mut value = collapse_whitespace(candidate);

    // byte offsets survive ASCII lowercasing
    let lowered = value.to_ascii_lowercase();
    let cut = ADDRESS_TRAILERS
        .iter()
        .filter_map(|phrase| lowered.find(phrase))
        .min();
    if let Some(offset) = cut {
        value.truncate(offset);
    }

    let trimmed = value
        .trim_end_matches(|c: char| c == ',' || c == ';' || c == '-' || c == '|' || c.is_whitespace())
        .trim_start_matches(|c: char| c == ',' || c.is_whitespace());

    if normalize_label(trimmed).is_empty() {
        return String::new();
    }
    trimmed.to_string()
}

/// Cleans a shipping origin, rejecting labels and headings
pub fn shipped_from(candidate: &str) -> String {
    let value = collapse_whitespace(candidate);
    let value = value.trim_end_matches(|c: char| c == '.' || c == ',' || c.is_whitespace());

    if normalize_label(value).is_empty() || is_any_label(value) || is_section_heading(value) {
        return String::new();
    }
    value.to_string()
}
