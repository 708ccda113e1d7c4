//! In-memory audience backend shared by the integration tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use pushkind_audience::domain::audience::{
    Ack, AudiencePage, AudienceRecord, DisplayRef, ExportFormat, ImportFile, ImportSummary,
    MessageCount, NewAudienceUser, Pagination, Scope, Subscription, SubscriptionStatus,
};
use pushkind_audience::domain::types::{AudienceId, Credential, SubscriptionId};
use pushkind_audience::filter::AudienceFilter;
use pushkind_audience::gateway::{AudienceGateway, GatewayError, GatewayResult};

pub fn customer(id: i64, name: &str, status: SubscriptionStatus, messages: u64) -> AudienceRecord {
    let at = Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap();
    AudienceRecord {
        id: AudienceId::new(id).unwrap(),
        name: name.to_string(),
        phone_number: format!("415555{id:04}"),
        country_code: "+1".to_string(),
        created_at: at,
        updated_at: at,
        subscriptions: Some(vec![Subscription {
            id: SubscriptionId::new(id).unwrap(),
            status,
            subscribed_at: at,
            unsubscribed_at: None,
            brand: DisplayRef::default(),
            agent: DisplayRef::default(),
        }]),
        count: Some(MessageCount { messages }),
    }
}

/// Applies search, status and paging the way the backend does.
#[derive(Default)]
pub struct FakeBackend {
    pub records: Mutex<Vec<AudienceRecord>>,
    pub list_calls: Mutex<Vec<AudienceFilter>>,
    pub fail_lists: Mutex<bool>,
}

impl FakeBackend {
    pub fn with_records(records: Vec<AudienceRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }

    pub fn last_list_call(&self) -> Option<AudienceFilter> {
        self.list_calls.lock().unwrap().last().cloned()
    }

    pub fn page_for(&self, filter: &AudienceFilter) -> AudiencePage {
        let records = self.records.lock().unwrap();
        let matching: Vec<AudienceRecord> = records
            .iter()
            .filter(|r| match filter.search_term() {
                Some(term) => r.name.contains(term) || r.phone_number.contains(term),
                None => true,
            })
            .filter(|r| match &filter.status {
                Some(status) => r.subscriptions().iter().any(|s| &s.status == status),
                None => true,
            })
            .cloned()
            .collect();

        let total = matching.len();
        let total_pages = total.div_ceil(filter.limit);
        let start = (filter.page - 1) * filter.limit;
        AudiencePage {
            records: matching.into_iter().skip(start).take(filter.limit).collect(),
            pagination: Pagination {
                page: filter.page,
                limit: filter.limit,
                total,
                total_pages,
            },
        }
    }
}

#[async_trait]
impl AudienceGateway for FakeBackend {
    async fn list_users(
        &self,
        _credential: &Credential,
        _scope: &Scope,
        filter: &AudienceFilter,
    ) -> GatewayResult<AudiencePage> {
        self.list_calls.lock().unwrap().push(filter.clone());
        if *self.fail_lists.lock().unwrap() {
            return Err(GatewayError::Http {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }
        Ok(self.page_for(filter))
    }

    async fn get_user(
        &self,
        _credential: &Credential,
        user_id: AudienceId,
    ) -> GatewayResult<AudienceRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == user_id)
            .cloned()
            .ok_or(GatewayError::Http {
                status: 404,
                message: "Not Found".to_string(),
            })
    }

    async fn create_user(
        &self,
        _credential: &Credential,
        _scope: &Scope,
        user: &NewAudienceUser,
    ) -> GatewayResult<AudienceRecord> {
        let mut records = self.records.lock().unwrap();
        if records
            .iter()
            .any(|r| r.phone_number == user.phone_number.as_str())
        {
            return Err(GatewayError::Http {
                status: 409,
                message: "phone already exists".to_string(),
            });
        }
        let id = records.iter().map(|r| r.id.get()).max().unwrap_or(0) + 1;
        let mut record = customer(id, user.name.as_str(), SubscriptionStatus::Subscribed, 0);
        record.phone_number = user.phone_number.as_str().to_string();
        records.push(record.clone());
        Ok(record)
    }

    async fn unsubscribe_user(
        &self,
        _credential: &Credential,
        _scope: &Scope,
        user_id: AudienceId,
    ) -> GatewayResult<Ack> {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.iter_mut().find(|r| r.id == user_id) {
            for subscription in record.subscriptions.iter_mut().flatten() {
                subscription.status = SubscriptionStatus::Unsubscribed;
            }
        }
        Ok(Ack::default())
    }

    async fn delete_user(
        &self,
        _credential: &Credential,
        user_id: AudienceId,
    ) -> GatewayResult<Ack> {
        self.records.lock().unwrap().retain(|r| r.id != user_id);
        Ok(Ack::default())
    }

    async fn import_users(
        &self,
        _credential: &Credential,
        _scope: &Scope,
        file: &ImportFile,
    ) -> GatewayResult<ImportSummary> {
        let text = String::from_utf8_lossy(&file.bytes).to_string();
        let mut records = self.records.lock().unwrap();
        let mut imported = 0;
        for line in text.lines().skip(1).filter(|l| !l.trim().is_empty()) {
            let name = line.split(',').next().unwrap_or_default();
            let id = records.iter().map(|r| r.id.get()).max().unwrap_or(0) + 1;
            records.push(customer(id, name, SubscriptionStatus::Subscribed, 0));
            imported += 1;
        }
        Ok(ImportSummary {
            imported,
            errors: Vec::new(),
        })
    }

    async fn export_users(
        &self,
        _credential: &Credential,
        _scope: &Scope,
        _format: ExportFormat,
    ) -> GatewayResult<Vec<u8>> {
        Err(GatewayError::NotImplemented("export_users"))
    }
}
