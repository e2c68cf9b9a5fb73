//! Structural pair extraction
//!
//! Collects key/value pairs from definition lists, two-column table rows and
//! `key: value` lines, then looks each field up by label. Pairs that come from
//! markup structure replace colon pairs with the same key.

use crate::extract::labels::{normalize_label, Field};
use crate::extract::normalize::element_lines;
use crate::extract::{PageInput, SellerFields};
use scraper::{ElementRef, Html, Selector};

/// Keys that contain a field synonym but belong to a different block
const CONTAINS_EXCLUSIONS: &[&str] = &["customer service", "return", "email", "phone", "contact"];

/// Longest key (in words) a colon line may have to count as a pair
const MAX_KEY_WORDS: usize = 6;

/// A normalized key with its raw value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub key: String,
    pub value: String,
}

/// Extracts fields from structural and colon pairs
pub fn extract(input: &PageInput<'_>) -> SellerFields {
    let pairs = collect_pairs(input);
    let mut fields = SellerFields::default();

    for field in Field::ALL {
        if let Some(value) = lookup(&pairs, field) {
            fields.set(field, value.to_string());
        }
    }

    fields
}

/// Gathers all pairs in document order, structural pairs overriding colon pairs
pub fn collect_pairs(input: &PageInput<'_>) -> Vec<Pair> {
    let mut pairs = colon_pairs(input.text);

    if let Some(markup) = input.markup {
        for pair in markup_pairs(markup) {
            match pairs.iter_mut().find(|existing| existing.key == pair.key) {
                Some(existing) => existing.value = pair.value,
                None => pairs.push(pair),
            }
        }
    }

    pairs
}

/// Finds a field's value: exact synonym match first, then a key containing a
/// synonym
pub fn lookup(pairs: &[Pair], field: Field) -> Option<&str> {
    for synonym in field.synonyms() {
        if let Some(pair) = pairs.iter().find(|pair| pair.key == *synonym) {
            return Some(pair.value.as_str());
        }
    }

    pairs
        .iter()
        .filter(|pair| {
            !CONTAINS_EXCLUSIONS
                .iter()
                .any(|excluded| pair.key.contains(excluded))
        })
        .find(|pair| {
            field
                .synonyms()
                .iter()
                .any(|synonym| contains_words(&pair.key, synonym))
        })
        .map(|pair| pair.value.as_str())
}

/// Word-boundary substring test on normalized labels
fn contains_words(key: &str, synonym: &str) -> bool {
    format!(" {} ", key).contains(&format!(" {} ", synonym))
}

fn colon_pairs(text: &str) -> Vec<Pair> {
    let mut pairs: Vec<Pair> = Vec::new();

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        let key = normalize_label(key);
        let value = value.trim();
        if key.is_empty() || value.is_empty() || key.split(' ').count() > MAX_KEY_WORDS {
            continue;
        }

        if !pairs.iter().any(|existing| existing.key == key) {
            pairs.push(Pair {
                key,
                value: value.to_string(),
            });
        }
    }

    pairs
}

fn markup_pairs(markup: &str) -> Vec<Pair> {
    let document = Html::parse_document(markup);
    let mut pairs = definition_list_pairs(&document);
    pairs.extend(table_row_pairs(&document));
    pairs
}

fn definition_list_pairs(document: &Html) -> Vec<Pair> {
    let Ok(dt_selector) = Selector::parse("dl dt") else {
        return Vec::new();
    };

    document
        .select(&dt_selector)
        .filter_map(|dt| {
            let dd = dt
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .next()
                .filter(|sibling| sibling.value().name() == "dd")?;
            make_pair(dt, dd)
        })
        .collect()
}

fn table_row_pairs(document: &Html) -> Vec<Pair> {
    let Ok(row_selector) = Selector::parse("tr") else {
        return Vec::new();
    };

    document
        .select(&row_selector)
        .filter_map(|row| {
            let cells: Vec<ElementRef<'_>> = row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .collect();
            match cells.as_slice() {
                [key, value] => make_pair(*key, *value),
                _ => None,
            }
        })
        .collect()
}

fn make_pair(key: ElementRef<'_>, value: ElementRef<'_>) -> Option<Pair> {
    let key = normalize_label(&element_lines(key).join(" "));
    let value = element_lines(value).join(", ");
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some(Pair { key, value })
}
