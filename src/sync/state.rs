use crate::domain::audience::{AudiencePage, AudienceRecord, Pagination, Scope};
use crate::filter::AudienceFilter;
use crate::stats::{AudienceStats, derive_stats};

/// A committed page together with the filter it was requested for.
#[derive(Clone, Debug, PartialEq)]
pub struct PageSnapshot {
    pub filter: AudienceFilter,
    pub records: Vec<AudienceRecord>,
    pub pagination: Pagination,
    /// Computed once at commit time.
    pub stats: AudienceStats,
}

impl PageSnapshot {
    pub fn new(filter: AudienceFilter, page: AudiencePage) -> Self {
        let stats = derive_stats(&page.records);
        Self {
            filter,
            records: page.records,
            pagination: page.pagination,
            stats,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum ListState {
    #[default]
    Idle,
    /// A fetch is in flight. `previous` is shown meanwhile and is never re-committed.
    Loading { previous: Option<PageSnapshot> },
    Loaded(PageSnapshot),
    /// Last fetch failed; nothing is displayed.
    Errored(String),
}

impl ListState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ListState::Loading { .. })
    }

    /// Snapshot currently on screen, if any.
    pub fn snapshot(&self) -> Option<&PageSnapshot> {
        match self {
            ListState::Loaded(snapshot) => Some(snapshot),
            ListState::Loading { previous } => previous.as_ref(),
            ListState::Idle | ListState::Errored(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ListState::Errored(message) => Some(message),
            _ => None,
        }
    }
}

/// Identifies one issued list fetch and the query it was issued for.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use = "the ticket must be fetched or the list stays loading"]
pub struct FetchTicket {
    pub(crate) seq: u64,
    pub(crate) scope: Scope,
    pub(crate) filter: AudienceFilter,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn filter(&self) -> &AudienceFilter {
        &self.filter
    }
}
