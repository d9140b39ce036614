use serde::{Deserialize, Serialize};

/// One page of a Spring-style paged listing.
///
/// Field names follow the wire format (`content`, `number`); missing fields
/// default so that trimmed-down responses still parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(rename = "content", default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(rename = "number", default)]
    pub page_number: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub number_of_elements: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
    #[serde(default)]
    pub empty: bool,
}

impl<T> Page<T> {
    #[must_use]
    pub fn has_next(&self) -> bool {
        !self.last && self.page_number.saturating_add(1) < self.total_pages
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        !self.first && self.page_number > 0
    }
}
