//! Request/response contract with the audience backend.
//!
//! Each method maps to exactly one backend call and carries the caller's
//! credential explicitly. Implementations never touch local list state; the
//! synchronizer re-fetches after every successful mutation.

use async_trait::async_trait;

use crate::domain::audience::{
    Ack, AudiencePage, AudienceRecord, ExportFormat, ImportFile, ImportSummary, NewAudienceUser,
    OutgoingMessage, Scope,
};
use crate::domain::types::{AudienceId, Credential};
use crate::filter::AudienceFilter;

pub mod errors;
pub mod http;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;

pub use errors::{GatewayError, GatewayResult};

#[async_trait]
pub trait AudienceGateway: Send + Sync {
    /// Lists one page of records for the brand, narrowed by `filter`.
    async fn list_users(
        &self,
        credential: &Credential,
        scope: &Scope,
        filter: &AudienceFilter,
    ) -> GatewayResult<AudiencePage>;

    async fn get_user(
        &self,
        credential: &Credential,
        user_id: AudienceId,
    ) -> GatewayResult<AudienceRecord>;

    /// Creates a customer; the backend subscribes it automatically.
    async fn create_user(
        &self,
        credential: &Credential,
        scope: &Scope,
        user: &NewAudienceUser,
    ) -> GatewayResult<AudienceRecord>;

    /// Opts the customer out. Repeating it on an unsubscribed record is not an error.
    async fn unsubscribe_user(
        &self,
        credential: &Credential,
        scope: &Scope,
        user_id: AudienceId,
    ) -> GatewayResult<Ack>;

    async fn delete_user(&self, credential: &Credential, user_id: AudienceId)
    -> GatewayResult<Ack>;

    async fn import_users(
        &self,
        credential: &Credential,
        scope: &Scope,
        file: &ImportFile,
    ) -> GatewayResult<ImportSummary>;

    async fn export_users(
        &self,
        credential: &Credential,
        scope: &Scope,
        format: ExportFormat,
    ) -> GatewayResult<Vec<u8>>;

    async fn update_user(
        &self,
        _credential: &Credential,
        _user_id: AudienceId,
        _user: &NewAudienceUser,
    ) -> GatewayResult<AudienceRecord> {
        Err(GatewayError::NotImplemented("update_user"))
    }

    /// Customers are subscribed on creation; there is no separate call.
    async fn subscribe_user(
        &self,
        _credential: &Credential,
        _scope: &Scope,
        _user_id: AudienceId,
    ) -> GatewayResult<Ack> {
        Err(GatewayError::NotImplemented("subscribe_user"))
    }

    async fn send_message(
        &self,
        _credential: &Credential,
        _scope: &Scope,
        _message: &OutgoingMessage,
    ) -> GatewayResult<Ack> {
        Err(GatewayError::NotImplemented("send_message"))
    }
}
