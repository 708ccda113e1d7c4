//! Query state for the audience list.
//!
//! Search and status changes always return to the first page; page changes
//! keep the active search and status.

use crate::domain::audience::SubscriptionStatus;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudienceFilter {
    /// 1-based page number.
    pub page: usize,
    pub limit: usize,
    /// Free text matched server-side against name and phone.
    pub search: String,
    pub status: Option<SubscriptionStatus>,
}

impl Default for AudienceFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: String::new(),
            status: None,
        }
    }
}

impl AudienceFilter {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            ..Self::default()
        }
    }

    /// Search term to send, `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        let term = self.search.trim();
        (!term.is_empty()).then_some(term)
    }
}

/// Holds the single live filter.
#[derive(Clone, Debug, Default)]
pub struct FilterState {
    current: AudienceFilter,
}

impl FilterState {
    pub fn new(limit: usize) -> Self {
        Self {
            current: AudienceFilter::with_limit(limit),
        }
    }

    pub fn current(&self) -> &AudienceFilter {
        &self.current
    }

    pub fn set_search(&mut self, text: impl Into<String>) -> &AudienceFilter {
        self.current.search = text.into();
        self.current.page = 1;
        &self.current
    }

    pub fn set_status(&mut self, status: Option<SubscriptionStatus>) -> &AudienceFilter {
        self.current.status = status;
        self.current.page = 1;
        &self.current
    }

    /// Moves to page `n`. Returns `None` and leaves the filter untouched when
    /// `n` is outside `[1, total_pages]`.
    pub fn set_page(&mut self, n: usize, total_pages: usize) -> Option<&AudienceFilter> {
        if n < 1 || n > total_pages {
            return None;
        }
        self.current.page = n;
        Some(&self.current)
    }

    /// Changes the page size; zero is rejected.
    pub fn set_limit(&mut self, limit: usize) -> Option<&AudienceFilter> {
        if limit == 0 {
            return None;
        }
        self.current.limit = limit;
        self.current.page = 1;
        Some(&self.current)
    }
}
