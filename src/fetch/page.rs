//! Rendered seller page upstream
//!
//! Loads the seller page, runs the extraction cascade and, when nothing was
//! extracted, decides between "blocked", "no such seller" and "anomaly".

use crate::extract::{extract_page, html_to_text};
use crate::fetch::block::{detect_block, has_not_found_wording};
use crate::fetch::source::{classify_common_status, Retrieved, SellerSource};
use crate::fetch::FetchFailure;
use crate::storage::DiagnosticStore;
use reqwest::Client;

#[derive(Debug, Clone)]
pub struct PageSource {
    client: Client,
    url_template: String,
    diagnostics: Option<DiagnosticStore>,
}

impl PageSource {
    /// Creates a page source; `url_template` must contain `{id}`
    pub fn new(client: Client, url_template: impl Into<String>) -> Self {
        Self {
            client,
            url_template: url_template.into(),
            diagnostics: None,
        }
    }

    /// Keeps raw copies of blocked and empty pages in `store`
    pub fn with_diagnostics(mut self, store: DiagnosticStore) -> Self {
        self.diagnostics = Some(store);
        self
    }

    async fn dump(&self, id: u64, reason: &str, body: &str) {
        if let Some(store) = &self.diagnostics {
            store.save(id, reason, body).await;
        }
    }
}

impl SellerSource for PageSource {
    fn locator(&self, id: u64) -> String {
        self.url_template.replace("{id}", &id.to_string())
    }

    async fn attempt(&self, id: u64, locator: &str) -> Result<Retrieved, FetchFailure> {
        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|e| FetchFailure::from_transport(&e))?;

        let status = response.status();
        if let Some(failure) = classify_common_status(status, response.headers()) {
            return Err(failure);
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| FetchFailure::from_transport(&e))?;

        // Challenge pages are often served as 403 or 503
        if !status.is_success() {
            let text = html_to_text(&body);
            if let Some(reason) = detect_block(&text, &body, Some(&final_url)) {
                self.dump(id, "blocked", &body).await;
                return Err(FetchFailure::Blocked { reason });
            }
            return Err(FetchFailure::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let (text, fields) = extract_page(&body);
        if !fields.is_empty() {
            return Ok(Retrieved::Found(fields.into_record(id, locator)));
        }

        if let Some(reason) = detect_block(&text, &body, Some(&final_url)) {
            self.dump(id, "blocked", &body).await;
            return Err(FetchFailure::Blocked { reason });
        }

        self.dump(id, "empty", &body).await;

        if has_not_found_wording(&text) {
            return Ok(Retrieved::Empty);
        }

        Err(FetchFailure::Anomaly {
            reason: "page had no seller fields and no not-found wording".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_substitutes_id() {
        let source = PageSource::new(Client::new(), "https://shop.example/sp?seller={id}&tab=info");
        assert_eq!(
            source.locator(3958),
            "https://shop.example/sp?seller=3958&tab=info"
        );
    }
}
