//! Envelope and query DTOs for `/api/userSub`.

use serde::{Deserialize, Serialize};

use crate::filter::AudienceFilter;

/// Envelope wrapping every JSON response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// Query parameters for the list endpoint. Unset fields are omitted.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct ListUsersQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<&'a str>,
}

impl<'a> From<&'a AudienceFilter> for ListUsersQuery<'a> {
    fn from(filter: &'a AudienceFilter) -> Self {
        Self {
            page: (filter.page > 0).then_some(filter.page),
            limit: (filter.limit > 0).then_some(filter.limit),
            status: filter
                .status
                .as_ref()
                .map(|s| s.as_str())
                .filter(|s| !s.is_empty()),
            search: filter.search_term(),
        }
    }
}

impl ListUsersQuery<'_> {
    /// Encodes the query, empty when every field is unset.
    pub fn to_query_string(&self) -> Result<String, serde_html_form::ser::Error> {
        serde_html_form::to_string(self)
    }
}
