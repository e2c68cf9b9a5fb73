//! Field extraction from rendered seller pages
//!
//! This module turns a seller page into the four business fields through a
//! cascade of independent strategies:
//!
//! 1. Label blocks (`label_block`): a known label followed by its value
//! 2. Structural pairs (`structural`): definition lists, table rows, colon lines
//! 3. Pattern fallback (`pattern`): canonical labels anywhere, plus a
//!    business-name scan above the VAT/address labels
//!
//! Each strategy sees the same [`PageInput`] and returns a [`SellerFields`].
//! Candidates are validated per stage and the first non-empty value per field
//! wins. Extraction never fails; a missing field is an empty string.

pub mod label_block;
pub mod labels;
mod normalize;
pub mod pattern;
pub mod structural;
pub mod validate;

pub use labels::Field;
pub use normalize::{collapse_whitespace, element_lines, html_to_text, normalize_text};

use crate::state::SellerRecord;

/// What every strategy gets to look at
#[derive(Debug, Clone, Copy)]
pub struct PageInput<'a> {
    /// Normalized page text
    pub text: &'a str,
    /// Original markup, when extracting from HTML
    pub markup: Option<&'a str>,
}

impl<'a> PageInput<'a> {
    pub fn new(text: &'a str, markup: Option<&'a str>) -> Self {
        Self { text, markup }
    }

    /// Input with normalized text only
    pub fn text(text: &'a str) -> Self {
        Self { text, markup: None }
    }
}

/// The four extracted business fields; empty means not found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SellerFields {
    pub business_name: String,
    pub vat_number: String,
    pub registered_address: String,
    pub shipped_from: String,
}

impl SellerFields {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::BusinessName => &self.business_name,
            Field::VatNumber => &self.vat_number,
            Field::RegisteredAddress => &self.registered_address,
            Field::ShippedFrom => &self.shipped_from,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::BusinessName => self.business_name = value,
            Field::VatNumber => self.vat_number = value,
            Field::RegisteredAddress => self.registered_address = value,
            Field::ShippedFrom => self.shipped_from = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|field| self.get(*field).is_empty())
    }

    pub fn is_complete(&self) -> bool {
        Field::ALL.iter().all(|field| !self.get(*field).is_empty())
    }

    /// Takes values from `other` for every field still empty here
    pub fn fill_missing(&mut self, other: SellerFields) {
        for field in Field::ALL {
            if self.get(field).is_empty() && !other.get(field).is_empty() {
                self.set(field, other.get(field).to_string());
            }
        }
    }

    /// Builds the result row for a seller id
    pub fn into_record(self, id: u64, source_reference: impl Into<String>) -> SellerRecord {
        SellerRecord {
            id,
            business_name: self.business_name,
            vat_number: self.vat_number,
            registered_address: self.registered_address,
            shipped_from: self.shipped_from,
            source_reference: source_reference.into(),
        }
    }
}

/// Uniform strategy signature
pub type Strategy = fn(&PageInput<'_>) -> SellerFields;

/// The cascade, strongest strategy first
pub const CASCADE: [(&str, Strategy); 3] = [
    ("label-block", label_block::extract),
    ("structural", structural::extract),
    ("pattern", pattern::extract),
];

/// Runs the cascade over already-normalized input
pub fn extract_fields(input: &PageInput<'_>) -> SellerFields {
    let mut fields = SellerFields::default();

    for (name, strategy) in CASCADE {
        if fields.is_complete() {
            break;
        }

        let candidates = validate::apply(strategy(input));
        tracing::trace!(strategy = name, ?candidates, "extraction stage");
        fields.fill_missing(candidates);
    }

    if fields.shipped_from.is_empty() {
        if let Some(phrase) = pattern::shipped_from_phrase(input.text) {
            fields.shipped_from = validate::shipped_from(&phrase);
        }
    }

    fields
}

/// Normalizes a page's markup and extracts its fields
///
/// Returns the normalized text alongside the fields so callers can run
/// further checks (block and not-found detection) on the same text.
pub fn extract_page(markup: &str) -> (String, SellerFields) {
    let text = html_to_text(markup);
    let fields = extract_fields(&PageInput::new(&text, Some(markup)));
    (text, fields)
}
