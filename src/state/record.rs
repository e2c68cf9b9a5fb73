/// Seller record definitions
///
/// A record is one CSV row: the seller id, the four extracted business
/// fields and the locator the data was retrieved from.
use serde::{Deserialize, Serialize};

/// One harvested seller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerRecord {
    pub id: u64,
    pub business_name: String,
    pub vat_number: String,
    pub registered_address: String,
    pub shipped_from: String,
    pub source_reference: String,
}

impl SellerRecord {
    /// Creates a record with no business fields filled in
    pub fn new(id: u64, source_reference: impl Into<String>) -> Self {
        Self {
            id,
            source_reference: source_reference.into(),
            ..Default::default()
        }
    }

    /// Returns true if none of the four business fields carry a value
    ///
    /// An all-empty record means no seller exists at this id.
    pub fn is_empty(&self) -> bool {
        self.business_name.is_empty()
            && self.vat_number.is_empty()
            && self.registered_address.is_empty()
            && self.shipped_from.is_empty()
    }

    /// Column order of the result sink
    pub const HEADER: [&'static str; 6] = [
        "id",
        "business_name",
        "vat_number",
        "registered_address",
        "shipped_from",
        "source_url",
    ];

    /// Returns the record as a CSV row in [`SellerRecord::HEADER`] order
    pub fn to_row(&self) -> [String; 6] {
        [
            self.id.to_string(),
            self.business_name.clone(),
            self.vat_number.clone(),
            self.registered_address.clone(),
            self.shipped_from.clone(),
            self.source_reference.clone(),
        ]
    }
}
