use std::time::Duration;

use tokio::time::timeout;

use crate::domain::audience::{
    Ack, AudiencePage, AudienceRecord, ExportFormat, ImportSummary, OutgoingMessage, Pagination,
    Scope, SubscriptionStatus,
};
use crate::domain::types::{AgentId, BrandId, Credential};
use crate::filter::{AudienceFilter, DEFAULT_PAGE_SIZE, FilterState};
use crate::forms::audience::{AddCustomerForm, ImportCustomersForm};
use crate::gateway::{AudienceGateway, GatewayError, GatewayResult};
use crate::stats::AudienceStats;
use crate::sync::state::{FetchTicket, ListState, PageSnapshot};
use crate::sync::{Confirm, Mutation, SyncError, SyncResult};

/// Bounded wait applied to every list fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns the filter and the displayed page for one brand/agent scope.
///
/// Callers that run fetches concurrently use [`Self::begin_fetch`] (or one of
/// the filter setters) to obtain a ticket, perform the gateway call
/// themselves and hand the result to [`Self::complete_fetch`]. Results for
/// anything but the most recently issued ticket are dropped.
#[derive(Debug)]
pub struct AudienceSynchronizer {
    credential: Credential,
    brand_id: Option<BrandId>,
    agent_id: Option<AgentId>,
    filter: FilterState,
    state: ListState,
    last_issued: u64,
    fetch_timeout: Duration,
}

impl AudienceSynchronizer {
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            brand_id: None,
            agent_id: None,
            filter: FilterState::new(DEFAULT_PAGE_SIZE),
            state: ListState::Idle,
            last_issued: 0,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_page_size(mut self, limit: usize) -> Self {
        self.filter = FilterState::new(limit);
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Presets brand and agent without issuing a fetch.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.brand_id = Some(scope.brand_id);
        self.agent_id = Some(scope.agent_id);
        self
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn filter(&self) -> &AudienceFilter {
        self.filter.current()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Both identifiers, once known.
    pub fn scope(&self) -> Option<Scope> {
        match (&self.brand_id, &self.agent_id) {
            (Some(brand), Some(agent)) => Some(Scope::new(brand.clone(), agent.clone())),
            _ => None,
        }
    }

    pub fn records(&self) -> &[AudienceRecord] {
        self.state
            .snapshot()
            .map(|s| s.records.as_slice())
            .unwrap_or_default()
    }

    pub fn pagination(&self) -> Pagination {
        self.state
            .snapshot()
            .map(|s| s.pagination)
            .unwrap_or_else(|| Pagination::empty(self.filter.current().limit))
    }

    pub fn stats(&self) -> AudienceStats {
        self.state
            .snapshot()
            .map(|s| s.stats)
            .unwrap_or_default()
    }

    #[must_use = "the ticket must be fetched or the list stays loading"]
    pub fn set_brand(&mut self, brand_id: BrandId) -> Option<FetchTicket> {
        if self.brand_id.as_ref() == Some(&brand_id) {
            return None;
        }
        self.brand_id = Some(brand_id);
        self.begin_scope_fetch()
    }

    #[must_use = "the ticket must be fetched or the list stays loading"]
    pub fn set_agent(&mut self, agent_id: AgentId) -> Option<FetchTicket> {
        if self.agent_id.as_ref() == Some(&agent_id) {
            return None;
        }
        self.agent_id = Some(agent_id);
        self.begin_scope_fetch()
    }

    #[must_use = "the ticket must be fetched or the list stays loading"]
    pub fn set_scope(&mut self, scope: Scope) -> Option<FetchTicket> {
        if self.scope().as_ref() == Some(&scope) {
            return None;
        }
        self.brand_id = Some(scope.brand_id);
        self.agent_id = Some(scope.agent_id);
        self.begin_scope_fetch()
    }

    /// Another tenant's page is never shown while the new scope loads.
    fn begin_scope_fetch(&mut self) -> Option<FetchTicket> {
        self.state = ListState::Idle;
        self.begin_fetch()
    }

    #[must_use = "the ticket must be fetched or the list stays loading"]
    pub fn set_search(&mut self, text: impl Into<String>) -> Option<FetchTicket> {
        self.filter.set_search(text);
        self.begin_fetch()
    }

    #[must_use = "the ticket must be fetched or the list stays loading"]
    pub fn set_status(&mut self, status: Option<SubscriptionStatus>) -> Option<FetchTicket> {
        self.filter.set_status(status);
        self.begin_fetch()
    }

    /// Out-of-range pages are ignored: no ticket, no state change.
    #[must_use = "the ticket must be fetched or the list stays loading"]
    pub fn set_page(&mut self, page: usize) -> Option<FetchTicket> {
        let total_pages = self.pagination().total_pages;
        if self.filter.set_page(page, total_pages).is_none() {
            log::debug!("Ignoring page {page} outside 1..={total_pages}");
            return None;
        }
        self.begin_fetch()
    }

    /// A zero size is ignored.
    #[must_use = "the ticket must be fetched or the list stays loading"]
    pub fn set_page_size(&mut self, limit: usize) -> Option<FetchTicket> {
        self.filter.set_limit(limit)?;
        self.begin_fetch()
    }

    /// Issues a ticket for the current filter and enters `Loading`.
    ///
    /// Returns `None` while brand or agent is still unknown.
    #[must_use = "the ticket must be fetched or the list stays loading"]
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        let scope = self.scope()?;
        self.last_issued += 1;

        let previous = match std::mem::take(&mut self.state) {
            ListState::Loaded(snapshot) => Some(snapshot),
            ListState::Loading { previous } => previous,
            ListState::Idle | ListState::Errored(_) => None,
        };
        self.state = ListState::Loading { previous };

        Some(FetchTicket {
            seq: self.last_issued,
            scope,
            filter: self.filter.current().clone(),
        })
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.seq == self.last_issued
    }

    /// Applies a fetch result. Returns `false` when the ticket is stale.
    pub fn complete_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: GatewayResult<AudiencePage>,
    ) -> bool {
        if !self.is_current(ticket) {
            log::debug!(
                "Discarding stale fetch #{} (latest is #{})",
                ticket.seq,
                self.last_issued
            );
            return false;
        }

        self.state = match result {
            Ok(page) => ListState::Loaded(PageSnapshot::new(ticket.filter.clone(), page)),
            Err(err) => {
                log::error!("Failed to fetch customers: {err}");
                ListState::Errored(err.to_string())
            }
        };
        true
    }

    /// Runs the list call for `ticket` with the configured timeout and commits it.
    pub async fn fetch<G>(&mut self, gateway: &G, ticket: FetchTicket) -> bool
    where
        G: AudienceGateway + ?Sized,
    {
        let call = gateway.list_users(&self.credential, &ticket.scope, &ticket.filter);
        let result = match timeout(self.fetch_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout),
        };
        self.complete_fetch(&ticket, result)
    }

    /// Fetches the current filter. Does nothing until the scope is known.
    pub async fn refresh<G>(&mut self, gateway: &G) -> bool
    where
        G: AudienceGateway + ?Sized,
    {
        match self.begin_fetch() {
            Some(ticket) => self.fetch(gateway, ticket).await,
            None => false,
        }
    }

    /// Single hook every mutation path reports to.
    ///
    /// A success issues one fetch ticket for the current filter; a failure
    /// issues nothing and leaves the displayed page as it is.
    #[must_use = "the ticket must be fetched or the list stays loading"]
    pub fn on_mutation_settled(
        &mut self,
        mutation: Mutation,
        succeeded: bool,
    ) -> Option<FetchTicket> {
        if !succeeded {
            return None;
        }
        log::info!("Refreshing customers after {mutation}");
        self.begin_fetch()
    }

    async fn settle<G, T>(
        &mut self,
        gateway: &G,
        mutation: Mutation,
        outcome: GatewayResult<T>,
    ) -> SyncResult<T>
    where
        G: AudienceGateway + ?Sized,
    {
        let ticket = self.on_mutation_settled(mutation, outcome.is_ok());
        match outcome {
            Ok(value) => {
                if let Some(ticket) = ticket {
                    self.fetch(gateway, ticket).await;
                }
                Ok(value)
            }
            Err(err) => {
                log::error!("Failed to {mutation}: {err}");
                Err(err.into())
            }
        }
    }

    pub async fn create_user<G>(
        &mut self,
        gateway: &G,
        form: &AddCustomerForm,
    ) -> SyncResult<AudienceRecord>
    where
        G: AudienceGateway + ?Sized,
    {
        let user = form.to_new_user().map_err(|err| {
            log::error!("Failed to validate form: {err}");
            err
        })?;
        let scope = self.scope().ok_or(SyncError::NoScope)?;
        let outcome = gateway.create_user(&self.credential, &scope, &user).await;
        self.settle(gateway, Mutation::Create, outcome).await
    }

    pub async fn delete_user<G, C>(
        &mut self,
        gateway: &G,
        record: &AudienceRecord,
        confirm: &C,
    ) -> SyncResult<Ack>
    where
        G: AudienceGateway + ?Sized,
        C: Confirm + ?Sized,
    {
        if !confirm.confirm(&format!("Are you sure you want to delete {}?", record.name)) {
            return Err(SyncError::Cancelled);
        }
        let outcome = gateway.delete_user(&self.credential, record.id).await;
        self.settle(gateway, Mutation::Delete, outcome).await
    }

    pub async fn unsubscribe_user<G, C>(
        &mut self,
        gateway: &G,
        record: &AudienceRecord,
        confirm: &C,
    ) -> SyncResult<Ack>
    where
        G: AudienceGateway + ?Sized,
        C: Confirm + ?Sized,
    {
        let scope = self.scope().ok_or(SyncError::NoScope)?;
        if !confirm.confirm(&format!(
            "Are you sure you want to unsubscribe {}?",
            record.name
        )) {
            return Err(SyncError::Cancelled);
        }
        let outcome = gateway
            .unsubscribe_user(&self.credential, &scope, record.id)
            .await;
        self.settle(gateway, Mutation::Unsubscribe, outcome).await
    }

    pub async fn import_users<G>(
        &mut self,
        gateway: &G,
        form: ImportCustomersForm,
    ) -> SyncResult<ImportSummary>
    where
        G: AudienceGateway + ?Sized,
    {
        let file = form.into_import_file().map_err(|err| {
            log::error!("Failed to prepare import: {err}");
            err
        })?;
        let scope = self.scope().ok_or(SyncError::NoScope)?;
        let outcome = gateway.import_users(&self.credential, &scope, &file).await;
        self.settle(gateway, Mutation::Import, outcome).await
    }

    pub async fn send_message<G>(
        &mut self,
        gateway: &G,
        message: &OutgoingMessage,
    ) -> SyncResult<Ack>
    where
        G: AudienceGateway + ?Sized,
    {
        let scope = self.scope().ok_or(SyncError::NoScope)?;
        let outcome = gateway.send_message(&self.credential, &scope, message).await;
        self.settle(gateway, Mutation::MessageSent, outcome).await
    }

    /// Notification from a message workflow that sent outside this synchronizer.
    pub async fn message_sent<G>(&mut self, gateway: &G) -> bool
    where
        G: AudienceGateway + ?Sized,
    {
        match self.on_mutation_settled(Mutation::MessageSent, true) {
            Some(ticket) => self.fetch(gateway, ticket).await,
            None => false,
        }
    }

    /// Downloads the backend export. Read-only, so the list is not refreshed.
    pub async fn export_users<G>(&self, gateway: &G, format: ExportFormat) -> SyncResult<Vec<u8>>
    where
        G: AudienceGateway + ?Sized,
    {
        let scope = self.scope().ok_or(SyncError::NoScope)?;
        gateway
            .export_users(&self.credential, &scope, format)
            .await
            .map_err(|err| {
                log::error!("Failed to export customers: {err}");
                SyncError::from(err)
            })
    }
}
