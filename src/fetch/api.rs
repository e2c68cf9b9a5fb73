//! Structured JSON API upstream
//!
//! `GET {base-url}/{id}` with a bearer token. The response document is either
//! wrapped (`{"data": {"attributes": {...}}}`) or flat (`{...}`); attribute
//! names vary between API versions, so each field accepts a few aliases.

use crate::fetch::source::{classify_common_status, Retrieved, SellerSource};
use crate::fetch::FetchFailure;
use crate::state::SellerRecord;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// Address parts that mean "no address"
const PLACEHOLDERS: &[&str] = &["n/a", "na", "-", "none", "unknown", "null"];

#[derive(Debug, Clone)]
pub struct ApiSource {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiSource {
    pub fn new(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        }
    }
}

impl SellerSource for ApiSource {
    fn locator(&self, id: u64) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), id)
    }

    async fn attempt(&self, id: u64, locator: &str) -> Result<Retrieved, FetchFailure> {
        let response = self
            .client
            .get(locator)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchFailure::from_transport(&e))?;

        let status = response.status();
        if let Some(failure) = classify_common_status(status, response.headers()) {
            return Err(failure);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(FetchFailure::Fatal {
                reason: "API credential rejected (HTTP 401)".to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchFailure::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchFailure::from_transport(&e))?;

        let document: ApiDocument =
            serde_json::from_str(&body).map_err(|e| FetchFailure::Fatal {
                reason: format!("malformed API response: {}", e),
            })?;

        let record = document.into_attributes().into_record(id, locator);
        if record.is_empty() {
            Ok(Retrieved::Empty)
        } else {
            Ok(Retrieved::Found(record))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiDocument {
    Wrapped { data: ApiSeller },
    Flat(SellerAttributes),
}

impl ApiDocument {
    fn into_attributes(self) -> SellerAttributes {
        match self {
            ApiDocument::Wrapped { data } => data.attributes,
            ApiDocument::Flat(attributes) => attributes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiSeller {
    #[serde(default)]
    attributes: SellerAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct SellerAttributes {
    #[serde(default, alias = "businessName", alias = "legal_name", alias = "name")]
    business_name: Option<String>,

    #[serde(default, alias = "taxId", alias = "vat_number", alias = "vatNumber")]
    tax_id: Option<String>,

    #[serde(default, alias = "registeredAddress", alias = "address")]
    registered_address: Option<ApiAddress>,

    #[serde(default, alias = "businessAddress")]
    business_address: Option<ApiAddress>,

    #[serde(default, alias = "shippingCountry", alias = "ships_from", alias = "shipsFrom")]
    shipping_country: Option<String>,
}

impl SellerAttributes {
    fn into_record(self, id: u64, locator: &str) -> SellerRecord {
        let registered_address = self
            .registered_address
            .map(|address| address.formatted())
            .filter(|formatted| !formatted.is_empty())
            .or_else(|| self.business_address.map(|address| address.formatted()))
            .unwrap_or_default();

        SellerRecord {
            id,
            business_name: clean(self.business_name),
            vat_number: clean(self.tax_id),
            registered_address,
            shipped_from: clean(self.shipping_country),
            source_reference: locator.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiAddress {
    #[serde(default, alias = "line1", alias = "address_line")]
    street: Option<String>,

    #[serde(default)]
    city: Option<String>,

    #[serde(default, alias = "state", alias = "province")]
    region: Option<String>,

    #[serde(default, alias = "postal_code", alias = "postalCode", alias = "zip")]
    postcode: Option<String>,

    #[serde(default, alias = "country_code")]
    country: Option<String>,
}

impl ApiAddress {
    /// Joins the non-placeholder parts; empty when the address is a placeholder
    fn formatted(self) -> String {
        [
            self.street,
            self.city,
            self.region,
            self.postcode,
            self.country,
        ]
        .into_iter()
        .map(clean)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Trims a value and maps placeholders to the empty string
fn clean(value: Option<String>) -> String {
    let value = value.unwrap_or_default();
    let trimmed = value.trim();
    if PLACEHOLDERS.contains(&trimmed.to_lowercase().as_str()) {
        return String::new();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> SellerRecord {
        let document: ApiDocument = serde_json::from_str(json).unwrap();
        document
            .into_attributes()
            .into_record(3958, "https://api.example/sellers/3958")
    }

    #[test]
    fn test_wrapped_document() {
        let record = record(
            r#"{"data": {"id": "3958", "attributes": {
                "business_name": "ACME LTD",
                "tax_id": "GB999999973",
                "registered_address": {"street": "1 High St", "city": "London", "postcode": "SW1A 1AA"},
                "shipping_country": "United Kingdom"
            }}}"#,
        );
        assert_eq!(record.business_name, "ACME LTD");
        assert_eq!(record.vat_number, "GB999999973");
        assert_eq!(record.registered_address, "1 High St, London, SW1A 1AA");
        assert_eq!(record.shipped_from, "United Kingdom");
    }

    #[test]
    fn test_flat_document_with_aliases() {
        let record = record(r#"{"businessName": "Widget GmbH", "vatNumber": "DE123456789"}"#);
        assert_eq!(record.business_name, "Widget GmbH");
        assert_eq!(record.vat_number, "DE123456789");
        assert_eq!(record.registered_address, "");
    }

    #[test]
    fn test_placeholder_address_falls_back() {
        let record = record(
            r#"{"data": {"attributes": {
                "registered_address": {"street": "N/A", "city": "-"},
                "business_address": {"street": "5 Quay Rd", "country": "IE"}
            }}}"#,
        );
        assert_eq!(record.registered_address, "5 Quay Rd, IE");
    }

    #[test]
    fn test_all_null_attributes_are_empty() {
        let record = record(r#"{"data": {"attributes": {"business_name": null, "tax_id": " "}}}"#);
        assert!(record.is_empty());
    }
}
