//! Mock gateway for isolating the synchronizer in tests.

use async_trait::async_trait;
use mockall::mock;

use crate::domain::audience::{
    Ack, AudiencePage, AudienceRecord, ExportFormat, ImportFile, ImportSummary, NewAudienceUser,
    Scope,
};
use crate::domain::types::{AudienceId, Credential};
use crate::filter::AudienceFilter;
use crate::gateway::{AudienceGateway, GatewayResult};

mock! {
    pub Gateway {}

    #[async_trait]
    impl AudienceGateway for Gateway {
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
        async fn create_user(
            &self,
            credential: &Credential,
            scope: &Scope,
            user: &NewAudienceUser,
        ) -> GatewayResult<AudienceRecord>;
        async fn unsubscribe_user(
            &self,
            credential: &Credential,
            scope: &Scope,
            user_id: AudienceId,
        ) -> GatewayResult<Ack>;
        async fn delete_user(
            &self,
            credential: &Credential,
            user_id: AudienceId,
        ) -> GatewayResult<Ack>;
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
    }
}
