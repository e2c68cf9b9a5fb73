//! Field labels, section headings and noise tokens
//!
//! Label comparison always happens on the normalized form produced by
//! [`normalize_label`]: lowercase ASCII words separated by single spaces, with
//! all punctuation removed.

use std::sync::OnceLock;

/// The four seller fields the extractor looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    BusinessName,
    VatNumber,
    RegisteredAddress,
    ShippedFrom,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::BusinessName,
        Field::VatNumber,
        Field::RegisteredAddress,
        Field::ShippedFrom,
    ];

    /// Accepted label spellings, already normalized
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            Field::BusinessName => &[
                "business name",
                "legal business name",
                "registered business name",
                "company name",
                "trading name",
                "legal name",
                "seller name",
                "name of business",
            ],
            Field::VatNumber => &[
                "vat number",
                "vat registration number",
                "vat reg no",
                "vat no",
                "vat id",
                "vat",
                "tax id",
                "tax number",
                "tax registration number",
            ],
            Field::RegisteredAddress => &[
                "registered address",
                "registered business address",
                "business address",
                "registered office address",
                "registered office",
                "company address",
                "address",
            ],
            Field::ShippedFrom => &[
                "this seller ships from",
                "ships from",
                "shipped from",
                "ship from",
                "dispatched from",
                "dispatches from",
            ],
        }
    }

    /// The label the pattern fallback searches for
    pub fn canonical(&self) -> &'static str {
        self.synonyms()[0]
    }

    /// Whether the value may span several lines
    pub fn is_multiline(&self) -> bool {
        matches!(self, Field::RegisteredAddress)
    }

    /// Whether the label may be followed by its value on the same line
    /// without a colon ("This seller ships from Germany")
    fn allows_inline_phrase(&self) -> bool {
        matches!(self, Field::ShippedFrom)
    }
}

/// Labels of fields we do not extract; they still end a multi-line capture
const OTHER_LABELS: &[&str] = &[
    "trade register number",
    "commercial register number",
    "commercial registry",
    "phone number",
    "phone",
    "telephone",
    "fax",
    "email",
    "email address",
    "customer services address",
    "customer service address",
    "returns address",
    "return address",
];

/// Headings that end any capture in progress
const SECTION_HEADINGS: &[&str] = &[
    "about the seller",
    "about this seller",
    "detailed seller information",
    "seller information",
    "business information",
    "contact the seller",
    "contact seller",
    "customer service",
    "customer services",
    "returns",
    "returns policy",
    "return policy",
    "returns and refunds",
    "shipping policies",
    "shipping policy",
    "seller feedback",
    "feedback",
    "ratings",
    "seller ratings",
    "products",
    "help",
];

/// Short UI artifacts that sit between a label and its value
const NOISE_TOKENS: &[&str] = &[
    "show more",
    "show less",
    "see more",
    "see less",
    "read more",
    "copy",
    "copied",
    "more",
    "less",
    "info",
    "i",
    "x",
    "close",
    "edit",
];

/// A line recognized as a field label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMatch {
    pub field: Field,
    /// Value found on the label's own line, empty if it follows on later lines
    pub inline: String,
}

/// Lowercases, drops punctuation and collapses whitespace
///
/// ```
/// use seller_census::extract::labels::normalize_label;
///
/// assert_eq!(normalize_label("  VAT-Number: "), "vat number");
/// ```
pub fn normalize_label(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// All (synonym, field) pairs, longest synonym first so "vat number" is
/// tried before "vat"
fn ordered_synonyms() -> &'static [(&'static str, Field)] {
    static ORDERED: OnceLock<Vec<(&'static str, Field)>> = OnceLock::new();
    ORDERED.get_or_init(|| {
        let mut all: Vec<(&'static str, Field)> = Field::ALL
            .iter()
            .flat_map(|field| field.synonyms().iter().map(move |syn| (*syn, *field)))
            .collect();
        all.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        all
    })
}

/// Returns true if `normalized` is `label` or starts with `label` followed by
/// further words
pub(crate) fn starts_with_words(normalized: &str, label: &str) -> bool {
    normalized == label
        || (normalized.starts_with(label) && normalized[label.len()..].starts_with(' '))
}

/// Recognizes a field label at the start of a line
///
/// Accepted shapes:
/// - `Label` alone on the line (value on following lines)
/// - `Label: value` or `Label (annotation): value`, where the key only has to
///   start with a known label
/// - `This seller ships from value` for phrase-style labels
pub fn match_label(line: &str) -> Option<LabelMatch> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some((key, value)) = line.split_once(':') {
        let key = normalize_label(key);
        if !key.is_empty() {
            for (label, field) in ordered_synonyms() {
                if starts_with_words(&key, label) {
                    return Some(LabelMatch {
                        field: *field,
                        inline: value.trim().to_string(),
                    });
                }
            }
        }
    }

    let normalized = normalize_label(line);
    for (label, field) in ordered_synonyms() {
        if normalized == *label {
            return Some(LabelMatch {
                field: *field,
                inline: String::new(),
            });
        }

        if field.allows_inline_phrase() && starts_with_words(&normalized, label) {
            return Some(LabelMatch {
                field: *field,
                inline: strip_leading_words(line, label.split(' ').count()),
            });
        }
    }

    None
}

/// Drops the first `count` label words from the original line, keeping the
/// original spelling of the rest
fn strip_leading_words(line: &str, count: usize) -> String {
    let mut seen = 0;
    let mut tokens = line.split_whitespace();

    for token in tokens.by_ref() {
        seen += normalize_label(token).split(' ').filter(|w| !w.is_empty()).count();
        if seen >= count {
            break;
        }
    }

    tokens
        .collect::<Vec<_>>()
        .join(" ")
        .trim_start_matches(|c: char| c == ':' || c == '-' || c.is_whitespace())
        .to_string()
}

/// Returns true for a known label of any field, including fields we skip
pub fn is_any_label(line: &str) -> bool {
    if match_label(line).is_some() {
        return true;
    }

    let normalized = normalize_label(line.split(':').next().unwrap_or(line));
    OTHER_LABELS
        .iter()
        .any(|label| starts_with_words(&normalized, label))
}

/// Returns true for a section heading that ends a capture
pub fn is_section_heading(line: &str) -> bool {
    let normalized = normalize_label(line);
    SECTION_HEADINGS.iter().any(|heading| {
        normalized == *heading || (heading.contains(' ') && starts_with_words(&normalized, heading))
    })
}

/// Returns true for UI artifacts and punctuation-only lines
pub fn is_noise(line: &str) -> bool {
    let normalized = normalize_label(line);
    normalized.is_empty() || NOISE_TOKENS.contains(&normalized.as_str())
}

/// Returns true if a capture must stop at this line
pub fn is_boundary(line: &str) -> bool {
    is_any_label(line) || is_section_heading(line)
}
