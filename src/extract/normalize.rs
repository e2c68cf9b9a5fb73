//! Markup to plain-text normalization
//!
//! Every extraction strategy works line by line, so the normalizer's main job
//! is stable line segmentation: block-level elements start a new line, `<br>`
//! breaks a line, paragraphs are separated by one blank line, and everything
//! inside `<script>`, `<style>`, `<noscript>` and `<template>` is dropped.
//! Entity decoding and tolerance for broken markup come from the HTML5 parser.

use scraper::{ElementRef, Html};

/// Elements whose content never reaches the visible text
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head", "svg"];

/// Elements that start and end on their own line
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "dd", "details", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hr", "li", "main", "nav", "ol", "option", "pre", "section", "summary",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Elements followed by a blank line
const PARAGRAPH_ELEMENTS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6", "section", "table"];

/// Converts raw markup into normalized plain text
///
/// # Example
///
/// ```
/// use seller_census::extract::html_to_text;
///
/// let text = html_to_text("<div>Business name</div><div>ACME&nbsp;&amp;&nbsp;Co</div>");
/// assert_eq!(text, "Business name\nACME & Co");
/// ```
pub fn html_to_text(markup: &str) -> String {
    let document = Html::parse_document(markup);
    let mut raw = String::with_capacity(markup.len() / 2);
    walk(document.root_element(), &mut raw);
    normalize_text(&raw)
}

/// Returns the visible lines of a single element, in the same form as
/// [`html_to_text`] produces for a whole page
pub fn element_lines(element: ElementRef<'_>) -> Vec<String> {
    let mut raw = String::new();
    walk(element, &mut raw);
    normalize_text(&raw)
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collapses whitespace inside lines and blank-line runs between them
///
/// Non-breaking spaces count as whitespace. Leading and trailing blank lines
/// are removed and at most one blank line separates two text lines.
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_blank = false;

    for line in raw.lines() {
        let collapsed = collapse_whitespace(line);
        if collapsed.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }

        if !out.is_empty() {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        out.push_str(&collapsed);
        pending_blank = false;
    }

    out
}

/// Replaces every whitespace run with one space and trims the ends
pub fn collapse_whitespace(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn walk(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }

        let Some(child_element) = ElementRef::wrap(child) else {
            continue;
        };

        let name = child_element.value().name();
        if SKIPPED_ELEMENTS.contains(&name) {
            continue;
        }

        if name == "br" {
            out.push('\n');
            continue;
        }

        let is_block = BLOCK_ELEMENTS.contains(&name) || PARAGRAPH_ELEMENTS.contains(&name);
        if is_block {
            break_line(out);
        }

        walk(child_element, out);

        if PARAGRAPH_ELEMENTS.contains(&name) {
            break_line(out);
            out.push('\n');
        } else if is_block {
            break_line(out);
        }
    }
}

fn break_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_become_lines() {
        let html = "<html><body><div>Business name</div><div>ACME LTD</div></body></html>";
        assert_eq!(html_to_text(html), "Business name\nACME LTD");
    }

    #[test]
    fn test_inline_elements_stay_on_line() {
        let html = "<div><span>This seller ships from</span> <b>Germany</b></div>";
        assert_eq!(html_to_text(html), "This seller ships from Germany");
    }

    #[test]
    fn test_br_splits_lines() {
        let html = "<div>1 High St<br>London<br/>SW1A 1AA</div>";
        assert_eq!(html_to_text(html), "1 High St\nLondon\nSW1A 1AA");
    }

    #[test]
    fn test_scripts_and_styles_removed() {
        let html = r#"<html><head><title>t</title><style>.a{}</style></head>
            <body><script>var verify = "you are human";</script><p>Visible</p>
            <noscript>Enable JS</noscript></body></html>"#;
        assert_eq!(html_to_text(html), "Visible");
    }

    #[test]
    fn test_entities_decoded() {
        let html = "<p>Smith &amp; Sons&nbsp;Ltd &lt;UK&gt; &#8211; &quot;ok&quot;</p>";
        assert_eq!(html_to_text(html), "Smith & Sons Ltd <UK> \u{2013} \"ok\"");
    }

    #[test]
    fn test_at_most_one_blank_line_between_paragraphs() {
        let html = "<p>First</p><p></p><p></p><p>Second</p>";
        assert_eq!(html_to_text(html), "First\n\nSecond");
    }

    #[test]
    fn test_malformed_markup_is_tolerated() {
        let html = "<div>Business name<div>ACME <b>LTD</div></span></p>";
        assert_eq!(html_to_text(html), "Business name\nACME LTD");
    }

    #[test]
    fn test_plain_text_passes_through() {
        let text = "Business name\n  ACME   LTD  \n\n\n\nVAT number";
        assert_eq!(html_to_text(text), "Business name\nACME LTD\n\nVAT number");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_text("  a  b \n\n\n c\t\td ");
        assert_eq!(once, "a b\n\nc d");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn test_element_lines() {
        let document = Html::parse_fragment("<dd>1 High St<br>London</dd>");
        let selector = scraper::Selector::parse("dd").unwrap();
        let dd = document.select(&selector).next().unwrap();
        assert_eq!(element_lines(dd), vec!["1 High St", "London"]);
    }
}
