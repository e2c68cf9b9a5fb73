//! Block and not-found detection for rendered pages
//!
//! A page that yields no seller fields is ambiguous: it may be a real
//! "no such seller" page or a challenge page served with a success status.
//! This module looks for four kinds of block signal:
//!
//! - Denial or challenge wording in the visible text (scripts stripped)
//! - A narrower set of markers that are safe to search for in raw markup
//! - Captcha widgets found by CSS selector
//! - A redirect target that points at a challenge or sign-in page
//!
//! Widgets such as reCAPTCHA also sit in newsletter and contact forms, so
//! they only count when the page does not say the seller is missing.

use scraper::{Html, Selector};
use std::sync::OnceLock;

/// Phrases that only appear on challenge or denial pages
const TEXT_SIGNALS: &[&str] = &[
    "verify you are human",
    "verify that you are human",
    "are you a robot",
    "not a robot",
    "unusual traffic",
    "automated access",
    "access denied",
    "request blocked",
    "checking your browser",
    "enter the characters you see below",
    "type the characters you see",
    "press and hold",
    "please enable cookies",
    "too many requests",
];

/// Markers served only on interstitial challenge pages
///
/// Cloudflare's `/cdn-cgi/challenge-platform/` script is injected into
/// ordinary pages too and must not be listed here.
const MARKUP_SIGNALS: &[&str] = &[
    "cf-chl-",
    "captcha-delivery.com",
    "px-captcha",
    "_incapsula_resource",
    "/errors/validatecaptcha",
];

const WIDGET_SELECTORS: &[&str] = &[
    ".g-recaptcha",
    ".h-captcha",
    "iframe[src*='captcha']",
    "iframe[src*='challenges.cloudflare.com']",
    "form[action*='validateCaptcha']",
    "input[name='cf-turnstile-response']",
    "img[src*='captcha']",
    "#captcha",
];

/// URL fragments of challenge and sign-in targets
const REDIRECT_SIGNALS: &[&str] = &[
    "captcha",
    "/challenge",
    "/ap/signin",
    "/blocked",
    "/sorry/",
];

/// Wording that confirms a seller does not exist
const NOT_FOUND_WORDING: &[&str] = &[
    "seller not found",
    "page not found",
    "we couldn't find",
    "we could not find",
    "no longer available",
    "this seller does not exist",
    "this page does not exist",
    "looking for something?",
];

fn widget_selectors() -> &'static [Selector] {
    static SELECTORS: OnceLock<Vec<Selector>> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        WIDGET_SELECTORS
            .iter()
            .filter_map(|css| Selector::parse(css).ok())
            .collect()
    })
}

/// Returns the reason a page looks like a block, or `None`
///
/// # Arguments
///
/// * `visible_text` - Normalized page text with scripts and styles removed
/// * `markup` - The raw response body
/// * `final_url` - Where the request ended up after redirects
pub fn detect_block(visible_text: &str, markup: &str, final_url: Option<&str>) -> Option<String> {
    let text = visible_text.to_lowercase();
    if let Some(signal) = TEXT_SIGNALS.iter().find(|signal| text.contains(*signal)) {
        return Some(format!("challenge wording \"{}\"", signal));
    }

    let raw = markup.to_lowercase();
    if let Some(signal) = MARKUP_SIGNALS.iter().find(|signal| raw.contains(*signal)) {
        return Some(format!("challenge marker \"{}\"", signal));
    }

    if !has_not_found_wording(visible_text) && has_captcha_widget(markup) {
        return Some("captcha widget".to_string());
    }

    if let Some(url) = final_url {
        let url = url.to_lowercase();
        if let Some(signal) = REDIRECT_SIGNALS.iter().find(|signal| url.contains(*signal)) {
            return Some(format!("redirected to {} ({})", url, signal));
        }
    }

    None
}

fn has_captcha_widget(markup: &str) -> bool {
    let document = Html::parse_document(markup);
    widget_selectors()
        .iter()
        .any(|selector| document.select(selector).next().is_some())
}

/// Whether the visible text states outright that the seller does not exist
pub fn has_not_found_wording(visible_text: &str) -> bool {
    let text = visible_text.to_lowercase();
    NOT_FOUND_WORDING.iter().any(|phrase| text.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::html_to_text;

    fn check(markup: &str) -> Option<String> {
        detect_block(&html_to_text(markup), markup, None)
    }

    #[test]
    fn test_challenge_wording() {
        let reason = check("<p>Please verify you are human to continue</p>");
        assert!(reason.unwrap().contains("verify you are human"));
    }

    #[test]
    fn test_wording_inside_script_is_ignored() {
        let markup = r#"<script>var msg = "are you a robot";</script><p>Seller not found</p>"#;
        assert_eq!(check(markup), None);
    }

    #[test]
    fn test_markup_marker() {
        let markup = r#"<form id="challenge-form" action="/?__cf_chl_f_tk=abc"><div id="cf-chl-widget"></div></form>"#;
        assert!(check(markup).unwrap().starts_with("challenge marker"));
    }

    #[test]
    fn test_recaptcha_div_is_a_widget() {
        let markup = r#"<p>One more step</p><div class="g-recaptcha" data-sitekey="x"></div>"#;
        assert_eq!(check(markup).as_deref(), Some("captcha widget"));
    }

    #[test]
    fn test_not_found_page_with_protection_script_is_not_blocked() {
        let markup = r#"<html><body>
            <h1>Sorry! Seller not found.</h1>
            <script src="/cdn-cgi/challenge-platform/scripts/jsd/main.js"></script>
            <footer><form action="/newsletter"><div class="g-recaptcha" data-sitekey="x"></div></form></footer>
            </body></html>"#;
        let text = html_to_text(markup);
        assert!(has_not_found_wording(&text));
        assert_eq!(check(markup), None);
    }

    #[test]
    fn test_captcha_widget() {
        let markup = r#"<form action="/errors/check"><img src="/img/captcha-1234.jpg"></form>"#;
        assert_eq!(check(markup).as_deref(), Some("captcha widget"));
    }

    #[test]
    fn test_redirect_target() {
        let reason = detect_block("", "<p></p>", Some("https://shop.example/ap/signin?x=1"));
        assert!(reason.is_some());
        assert_eq!(
            detect_block("", "<p></p>", Some("https://shop.example/sp?seller=5")),
            None
        );
    }

    #[test]
    fn test_not_found_wording() {
        assert!(has_not_found_wording("Sorry! Seller Not Found."));
        assert!(has_not_found_wording("We couldn't find that page"));
        assert!(!has_not_found_wording("Business name\nACME LTD"));
    }
}
