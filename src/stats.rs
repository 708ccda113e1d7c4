//! Summary counters derived from the currently loaded page.
//!
//! These are page-local: they describe only the records on screen, never
//! the whole audience. A record holding both a subscribed and an
//! unsubscribed subscription counts toward both buckets.

use serde::Serialize;

use crate::domain::audience::AudienceRecord;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudienceStats {
    pub total_customers: usize,
    pub subscribed_customers: usize,
    pub unsubscribed_customers: usize,
    pub total_messages: u64,
}

/// Computes the counters for one page of records.
pub fn derive_stats(records: &[AudienceRecord]) -> AudienceStats {
    AudienceStats {
        total_customers: records.len(),
        subscribed_customers: records.iter().filter(|r| r.is_subscribed()).count(),
        unsubscribed_customers: records.iter().filter(|r| r.is_unsubscribed()).count(),
        total_messages: records.iter().map(AudienceRecord::message_count).sum(),
    }
}
