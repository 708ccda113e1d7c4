//! [`AudienceGateway`] over the backend's JSON/HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::domain::audience::{
    Ack, AudiencePage, AudienceRecord, ExportFormat, ImportFile, ImportSummary, NewAudienceUser,
    Scope,
};
use crate::domain::types::{AudienceId, Credential};
use crate::dto::api::{ApiResponse, ListUsersQuery};
use crate::filter::AudienceFilter;
use crate::gateway::{AudienceGateway, GatewayError, GatewayResult};

const API_PREFIX: [&str; 2] = ["api", "userSub"];

#[derive(Clone, Debug)]
pub struct HttpAudienceGateway {
    client: Client,
    base_url: Url,
}

impl HttpAudienceGateway {
    /// Builds a gateway whose requests give up after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> GatewayResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> GatewayResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| GatewayError::Validation(format!("invalid base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::Validation(format!("invalid base URL {base_url}")));
        }
        Ok(Self { client, base_url })
    }

    /// Appends percent-encoded path segments below the API prefix.
    fn endpoint<I>(&self, segments: I) -> Url
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(API_PREFIX).extend(segments);
        }
        url
    }

    /// Full list URL; the query part is left off when no field is set.
    pub fn list_url(&self, scope: &Scope, filter: &AudienceFilter) -> GatewayResult<Url> {
        let query = ListUsersQuery::from(filter)
            .to_query_string()
            .map_err(|e| GatewayError::Validation(e.to_string()))?;
        let mut url = self.endpoint(["brand", scope.brand_id.as_str()]);
        if !query.is_empty() {
            url.set_query(Some(&query));
        }
        Ok(url)
    }

    pub fn users_url(&self, scope: &Scope) -> Url {
        self.endpoint([
            "brand",
            scope.brand_id.as_str(),
            "agent",
            scope.agent_id.as_str(),
            "users",
        ])
    }

    pub fn user_url(&self, user_id: AudienceId) -> Url {
        self.endpoint([user_id.to_string()])
    }

    pub fn unsubscribe_url(&self, user_id: AudienceId) -> Url {
        self.endpoint([user_id.to_string().as_str(), "unsubscribe"])
    }

    pub fn export_url(&self, scope: &Scope, format: ExportFormat) -> Url {
        let mut url = self.endpoint([
            "brand",
            scope.brand_id.as_str(),
            "agent",
            scope.agent_id.as_str(),
            "export",
        ]);
        url.query_pairs_mut().append_pair("format", format.as_str());
        url
    }
}

/// Maps a non-2xx response to an error, preferring the backend's own message.
async fn check_status(response: Response, op: &'static str) -> GatewayResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED {
        return Err(GatewayError::NotImplemented(op));
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Http {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ApiResponse<serde_json::Value>>(body)
        .ok()
        .map(|envelope| envelope.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        })
}

/// Unwraps `data` from a successful envelope.
pub(crate) fn unwrap_envelope<T>(envelope: ApiResponse<T>) -> GatewayResult<T> {
    if !envelope.success {
        return Err(GatewayError::Rejected(envelope.message));
    }
    envelope
        .data
        .ok_or_else(|| GatewayError::Decode("response has no data".to_string()))
}

async fn send<T: DeserializeOwned>(request: RequestBuilder, op: &'static str) -> GatewayResult<T> {
    let response = check_status(request.send().await?, op).await?;
    let envelope: ApiResponse<T> = response.json().await?;
    unwrap_envelope(envelope)
}

/// Acks are accepted on any 2xx; the payload is informational only.
async fn send_ack(request: RequestBuilder, op: &'static str) -> GatewayResult<Ack> {
    let response = check_status(request.send().await?, op).await?;
    let body = response.text().await?;
    let envelope = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body).ok();
    if let Some(envelope) = &envelope
        && !envelope.success
    {
        log::warn!("{op} acknowledged without success: {}", envelope.message);
    }
    Ok(Ack {
        message: envelope.map(|e| e.message).unwrap_or_default(),
    })
}

#[async_trait]
impl AudienceGateway for HttpAudienceGateway {
    async fn list_users(
        &self,
        credential: &Credential,
        scope: &Scope,
        filter: &AudienceFilter,
    ) -> GatewayResult<AudiencePage> {
        let url = self.list_url(scope, filter)?;
        log::debug!("GET {url}");
        send(
            self.client.get(url).bearer_auth(credential.expose()),
            "list_users",
        )
        .await
    }

    async fn get_user(
        &self,
        credential: &Credential,
        user_id: AudienceId,
    ) -> GatewayResult<AudienceRecord> {
        let url = self.user_url(user_id);
        send(
            self.client.get(url).bearer_auth(credential.expose()),
            "get_user",
        )
        .await
    }

    async fn create_user(
        &self,
        credential: &Credential,
        scope: &Scope,
        user: &NewAudienceUser,
    ) -> GatewayResult<AudienceRecord> {
        let url = self.users_url(scope);
        log::debug!("POST {url}");
        send(
            self.client
                .post(url)
                .bearer_auth(credential.expose())
                .json(user),
            "create_user",
        )
        .await
    }

    async fn unsubscribe_user(
        &self,
        credential: &Credential,
        scope: &Scope,
        user_id: AudienceId,
    ) -> GatewayResult<Ack> {
        let url = self.unsubscribe_url(user_id);
        log::debug!("POST {url} ({scope})");
        send_ack(
            self.client.post(url).bearer_auth(credential.expose()),
            "unsubscribe_user",
        )
        .await
    }

    async fn delete_user(
        &self,
        credential: &Credential,
        user_id: AudienceId,
    ) -> GatewayResult<Ack> {
        let url = self.user_url(user_id);
        log::debug!("DELETE {url}");
        send_ack(
            self.client.delete(url).bearer_auth(credential.expose()),
            "delete_user",
        )
        .await
    }

    async fn import_users(
        &self,
        credential: &Credential,
        scope: &Scope,
        file: &ImportFile,
    ) -> GatewayResult<ImportSummary> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(file.content_type)
            .map_err(|e| GatewayError::Validation(e.to_string()))?;
        let form = Form::new().part("file", part);
        let url = self.endpoint(["import"]);
        log::debug!("POST {url} ({scope}, {} bytes)", file.bytes.len());
        send(
            self.client
                .post(url)
                .bearer_auth(credential.expose())
                .multipart(form),
            "import_users",
        )
        .await
    }

    async fn export_users(
        &self,
        credential: &Credential,
        scope: &Scope,
        format: ExportFormat,
    ) -> GatewayResult<Vec<u8>> {
        let url = self.export_url(scope, format);
        log::debug!("GET {url}");
        let request = self.client.get(url).bearer_auth(credential.expose());
        let response = check_status(request.send().await?, "export_users").await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audience::SubscriptionStatus;
    use crate::domain::types::{AgentId, BrandId};

    fn gateway() -> HttpAudienceGateway {
        HttpAudienceGateway::with_client(Client::new(), "https://crm.example.com/").unwrap()
    }

    fn scope() -> Scope {
        Scope::new(BrandId::new("b1").unwrap(), AgentId::new("a1").unwrap())
    }

    #[test]
    fn list_url_carries_filter() {
        let filter = AudienceFilter {
            status: Some(SubscriptionStatus::Unsubscribed),
            ..AudienceFilter::default()
        };

        assert_eq!(
            gateway().list_url(&scope(), &filter).unwrap().as_str(),
            "https://crm.example.com/api/userSub/brand/b1?page=1&limit=10&status=unsubscribed"
        );
    }

    #[test]
    fn list_url_without_query() {
        let filter = AudienceFilter {
            page: 0,
            limit: 0,
            search: String::new(),
            status: None,
        };

        assert_eq!(
            gateway().list_url(&scope(), &filter).unwrap().as_str(),
            "https://crm.example.com/api/userSub/brand/b1"
        );
    }

    #[test]
    fn scoped_urls() {
        let gateway = gateway();
        assert_eq!(
            gateway.users_url(&scope()).as_str(),
            "https://crm.example.com/api/userSub/brand/b1/agent/a1/users"
        );
        assert_eq!(
            gateway.export_url(&scope(), ExportFormat::Csv).as_str(),
            "https://crm.example.com/api/userSub/brand/b1/agent/a1/export?format=csv"
        );
        assert_eq!(
            gateway.unsubscribe_url(AudienceId::new(4).unwrap()).as_str(),
            "https://crm.example.com/api/userSub/4/unsubscribe"
        );
    }

    #[test]
    fn reserved_characters_in_scope_are_encoded() {
        let scope = Scope::new(
            BrandId::new("acme#eu").unwrap(),
            AgentId::new("sales/bot?x").unwrap(),
        );
        let filter = AudienceFilter {
            status: Some(SubscriptionStatus::Unsubscribed),
            ..AudienceFilter::default()
        };
        let gateway = gateway();

        let list = gateway.list_url(&scope, &filter).unwrap();
        assert_eq!(list.path(), "/api/userSub/brand/acme%23eu");
        assert_eq!(list.query(), Some("page=1&limit=10&status=unsubscribed"));
        assert!(list.fragment().is_none());

        assert_eq!(
            gateway.users_url(&scope).path(),
            "/api/userSub/brand/acme%23eu/agent/sales%2Fbot%3Fx/users"
        );
    }

    #[test]
    fn base_url_path_prefix_is_kept() {
        let gateway =
            HttpAudienceGateway::with_client(Client::new(), "https://example.com/crm/").unwrap();

        assert_eq!(
            gateway.users_url(&scope()).as_str(),
            "https://example.com/crm/api/userSub/brand/b1/agent/a1/users"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            HttpAudienceGateway::with_client(Client::new(), "not a url"),
            Err(GatewayError::Validation(_))
        ));
    }

    #[test]
    fn error_message_prefers_backend_message() {
        assert_eq!(
            error_message(
                StatusCode::BAD_REQUEST,
                r#"{"success":false,"message":"phone already exists"}"#
            ),
            "phone already exists"
        );
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>"),
            "Internal Server Error"
        );
    }

    #[test]
    fn envelope_failure_is_rejected() {
        let envelope: ApiResponse<AudiencePage> =
            serde_json::from_str(r#"{"success":false,"message":"brand not found"}"#).unwrap();

        assert!(matches!(
            unwrap_envelope(envelope),
            Err(GatewayError::Rejected(message)) if message == "brand not found"
        ));
    }

    #[test]
    fn envelope_success_yields_page() {
        let body = r#"{
            "success": true,
            "message": "ok",
            "data": {
                "users": [],
                "pagination": {"page": 2, "limit": 10, "total": 11, "totalPages": 2}
            }
        }"#;
        let envelope: ApiResponse<AudiencePage> = serde_json::from_str(body).unwrap();

        let page = unwrap_envelope(envelope).unwrap();

        assert!(page.records.is_empty());
        assert_eq!(page.pagination.total_pages, 2);
        assert_eq!(page.pagination.total, 11);
    }

    #[test]
    fn envelope_success_without_data_is_decode_error() {
        let envelope: ApiResponse<AudiencePage> =
            serde_json::from_str(r#"{"success":true,"message":"ok"}"#).unwrap();

        assert!(matches!(unwrap_envelope(envelope), Err(GatewayError::Decode(_))));
    }
}
