//! Label-block extraction, the highest-confidence strategy
//!
//! Walks the normalized text line by line. A recognized label either carries
//! its value after a colon or is followed by the value on the next line(s).

use crate::extract::labels::{is_boundary, is_noise, match_label, Field};
use crate::extract::{PageInput, SellerFields};

/// Maximum number of lines an address capture accumulates
pub const MAX_ADDRESS_LINES: usize = 6;

/// Extracts fields from label/value blocks; the first occurrence of a label wins
pub fn extract(input: &PageInput<'_>) -> SellerFields {
    let lines: Vec<&str> = input.text.lines().map(str::trim).collect();
    let mut fields = SellerFields::default();

    for (index, line) in lines.iter().enumerate() {
        let Some(label) = match_label(line) else {
            continue;
        };

        if !fields.get(label.field).is_empty() {
            continue;
        }

        let value = capture_value(&lines[index + 1..], label.field, &label.inline);
        fields.set(label.field, value);
    }

    fields
}

/// Collects the value that follows a label
///
/// `inline` is the text found after the label on its own line. Single-line
/// fields use it directly when present; addresses keep accumulating from the
/// following lines until a label, a section heading or [`MAX_ADDRESS_LINES`].
pub fn capture_value(following: &[&str], field: Field, inline: &str) -> String {
    let inline = inline.trim();

    if !field.is_multiline() {
        if !inline.is_empty() {
            return inline.to_string();
        }
        return next_value_line(following).unwrap_or_default();
    }

    let mut parts: Vec<&str> = Vec::new();
    if !inline.is_empty() {
        parts.push(inline);
    }

    for line in following {
        if parts.len() >= MAX_ADDRESS_LINES {
            break;
        }
        if line.is_empty() || is_noise(line) {
            continue;
        }
        if is_boundary(line) {
            break;
        }
        parts.push(line);
    }

    parts.join(", ")
}

/// First line after a label that can hold its value
///
/// Blank lines and noise are skipped; reaching another label or a heading
/// means the label had no value.
fn next_value_line(following: &[&str]) -> Option<String> {
    for line in following {
        if line.is_empty() || is_noise(line) {
            continue;
        }
        if is_boundary(line) {
            return None;
        }
        return Some(line.to_string());
    }
    None
}
