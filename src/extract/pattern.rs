//! Pattern fallback, the most permissive strategy
//!
//! Finds each field's canonical label anywhere at the end of a line (so
//! breadcrumbs or icons in front of it do not matter) and reads the value
//! from the following line(s). Business names get one more chance: the few
//! lines right above the VAT number or registered address label.

use crate::extract::label_block::capture_value;
use crate::extract::labels::{is_boundary, is_noise, Field};
use crate::extract::validate::is_plausible_business_name;
use crate::extract::{PageInput, SellerFields};
use regex::Regex;
use std::sync::OnceLock;

/// How many lines above an anchor label the business-name scan inspects
pub const NAME_LOOKBEHIND_LINES: usize = 4;

/// Builds a line-end pattern for a label, tolerant of separators between its
/// words and of a trailing colon
fn label_pattern(label: &str) -> Regex {
    let words: Vec<String> = label.split(' ').map(regex::escape).collect();
    let pattern = format!(r"(?i)\b{}\s*:?\s*$", words.join(r"[\s\-_]*"));
    Regex::new(&pattern).expect("label pattern built from escaped words")
}

fn canonical_patterns() -> &'static [(Field, Regex)] {
    static PATTERNS: OnceLock<Vec<(Field, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        Field::ALL
            .iter()
            .map(|field| (*field, label_pattern(field.canonical())))
            .collect()
    })
}

fn ships_from_phrase() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)this\s+seller\s+ships\s+from\s*:?\s*([^\n]+)")
            .expect("valid ships-from pattern")
    })
}

/// Extracts fields by canonical label patterns plus the business-name
/// lookbehind
pub fn extract(input: &PageInput<'_>) -> SellerFields {
    let lines: Vec<&str> = input.text.lines().map(str::trim).collect();
    let mut fields = SellerFields::default();

    for (field, pattern) in canonical_patterns() {
        let found = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| pattern.is_match(line))
            .map(|(index, _)| capture_value(&lines[index + 1..], *field, ""))
            .find(|value| !value.is_empty());

        if let Some(value) = found {
            fields.set(*field, value);
        }
    }

    if fields.business_name.is_empty() {
        fields.business_name = name_above_anchor(&lines).unwrap_or_default();
    }

    fields
}

/// Looks at the lines just above the first VAT number or registered address
/// label and returns the nearest plausible business name
pub fn name_above_anchor(lines: &[&str]) -> Option<String> {
    let anchors: Vec<&Regex> = canonical_patterns()
        .iter()
        .filter(|(field, _)| matches!(field, Field::VatNumber | Field::RegisteredAddress))
        .map(|(_, pattern)| pattern)
        .collect();

    let anchor = lines
        .iter()
        .position(|line| anchors.iter().any(|pattern| pattern.is_match(line)))?;

    lines[anchor.saturating_sub(NAME_LOOKBEHIND_LINES)..anchor]
        .iter()
        .rev()
        .filter(|line| !line.is_empty() && !is_noise(line) && !is_boundary(line))
        .find(|line| is_plausible_business_name(line))
        .map(|line| line.to_string())
}

/// The last-resort "This seller ships from <value>" phrase anywhere in the text
pub fn shipped_from_phrase(text: &str) -> Option<String> {
    ships_from_phrase()
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}
