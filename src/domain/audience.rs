use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    AgentId, AudienceId, BrandId, CountryCode, CustomerName, PhoneNumber, SubscriptionId,
    TypeConstraintError,
};

/// Opt-in state of a subscription. Unknown backend values are preserved.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    Subscribed,
    Unsubscribed,
    Other(String),
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Subscribed => "subscribed",
            Self::Unsubscribed => "unsubscribed",
            Self::Other(value) => value,
        }
    }

    /// Parses the status selector value; an empty selection means no filter.
    pub fn parse_filter(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            Some(Self::from(value.to_string()))
        }
    }
}

impl From<String> for SubscriptionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "subscribed" => Self::Subscribed,
            "unsubscribed" => Self::Unsubscribed,
            _ => Self::Other(value),
        }
    }
}

impl From<SubscriptionStatus> for String {
    fn from(value: SubscriptionStatus) -> Self {
        value.as_str().to_string()
    }
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display-only reference to a brand or agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DisplayRef {
    pub name: String,
    pub display_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub status: SubscriptionStatus,
    pub subscribed_at: DateTime<Utc>,
    #[serde(default)]
    pub unsubscribed_at: Option<DateTime<Utc>>,
    pub brand: DisplayRef,
    pub agent: DisplayRef,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MessageCount {
    #[serde(default)]
    pub messages: u64,
}

/// Customer entity as returned by the backend for one brand/agent scope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudienceRecord {
    pub id: AudienceId,
    pub name: String,
    pub phone_number: String,
    pub country_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Subscriptions across brand/agent pairings; absent means none.
    #[serde(default)]
    pub subscriptions: Option<Vec<Subscription>>,
    #[serde(rename = "_count", default)]
    pub count: Option<MessageCount>,
}

impl AudienceRecord {
    pub fn subscriptions(&self) -> &[Subscription] {
        self.subscriptions.as_deref().unwrap_or_default()
    }

    pub fn message_count(&self) -> u64 {
        self.count.map(|c| c.messages).unwrap_or(0)
    }

    /// True when any subscription is active.
    pub fn is_subscribed(&self) -> bool {
        self.has_status(&SubscriptionStatus::Subscribed)
    }

    /// True when any subscription was opted out. Not exclusive with [`Self::is_subscribed`].
    pub fn is_unsubscribed(&self) -> bool {
        self.has_status(&SubscriptionStatus::Unsubscribed)
    }

    fn has_status(&self, status: &SubscriptionStatus) -> bool {
        self.subscriptions().iter().any(|s| &s.status == status)
    }

    /// Short status label for tables and exports.
    pub fn status_label(&self) -> &str {
        if self.is_subscribed() {
            "subscribed"
        } else if self.is_unsubscribed() {
            "unsubscribed"
        } else {
            self.subscriptions()
                .first()
                .map(|s| s.status.as_str())
                .unwrap_or("none")
        }
    }
}

/// Authoritative paging metadata returned with every list response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
}

impl Pagination {
    /// Placeholder used when no page is loaded.
    pub const fn empty(limit: usize) -> Self {
        Self {
            page: 1,
            limit,
            total: 0,
            total_pages: 0,
        }
    }
}

/// One page of records with its pagination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudiencePage {
    #[serde(rename = "users")]
    pub records: Vec<AudienceRecord>,
    pub pagination: Pagination,
}

/// Brand/agent tenancy pair every scoped call operates under.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Scope {
    pub brand_id: BrandId,
    pub agent_id: AgentId,
}

impl Scope {
    pub fn new(brand_id: BrandId, agent_id: AgentId) -> Self {
        Self { brand_id, agent_id }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.brand_id, self.agent_id)
    }
}

/// Payload for creating a customer. The backend subscribes it automatically.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewAudienceUser {
    pub phone_number: PhoneNumber,
    pub name: CustomerName,
    pub country_code: CountryCode,
}

impl NewAudienceUser {
    pub fn new(
        name: &str,
        phone_number: &str,
        country_code: &str,
    ) -> Result<Self, TypeConstraintError> {
        let name = CustomerName::new(name)?;
        let country_code = CountryCode::new(country_code)?;
        let phone_number = PhoneNumber::new(phone_number, &country_code)?;
        Ok(Self {
            phone_number,
            name,
            country_code,
        })
    }
}

/// Acknowledgement for mutations whose payload is not used.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Ack {
    pub message: String,
}

/// Result of a bulk import.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct ImportSummary {
    #[serde(default)]
    pub imported: usize,
    /// Per-row problems reported by the backend, in whatever shape it sends.
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

/// Raw file contents uploaded as multipart content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Media,
}

/// Direct message to a single customer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub recipient_id: AudienceId,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
}
