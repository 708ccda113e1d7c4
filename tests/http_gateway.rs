use std::time::Duration;

use reqwest::Client;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use pushkind_audience::domain::audience::{ExportFormat, Scope, SubscriptionStatus};
use pushkind_audience::domain::types::{AgentId, AudienceId, BrandId, Credential};
use pushkind_audience::filter::AudienceFilter;
use pushkind_audience::gateway::http::HttpAudienceGateway;
use pushkind_audience::gateway::{AudienceGateway, GatewayError};

/// Accepts one connection, answers it with `status` and `body`, and yields
/// the raw request head.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        String::from_utf8_lossy(&request).into_owned()
    });

    (format!("http://{addr}"), handle)
}

fn gateway(base_url: &str) -> HttpAudienceGateway {
    let client = Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    HttpAudienceGateway::with_client(client, base_url).unwrap()
}

fn credential() -> Credential {
    Credential::new("secret-token").unwrap()
}

fn scope() -> Scope {
    Scope::new(BrandId::new("acme").unwrap(), AgentId::new("bot").unwrap())
}

#[tokio::test]
async fn test_list_users_decodes_page_and_sends_bearer() {
    let body = r#"{"success":true,"message":"ok","data":{"users":[],"pagination":{"page":1,"limit":10,"total":0,"totalPages":0}}}"#;
    let (base_url, server) = serve_once("200 OK", body).await;

    let page = gateway(&base_url)
        .list_users(&credential(), &scope(), &AudienceFilter::default())
        .await
        .unwrap();
    let request = server.await.unwrap();

    assert!(page.records.is_empty());
    assert!(request.starts_with("GET /api/userSub/brand/acme?page=1&limit=10 HTTP/1.1\r\n"));
    assert!(
        request
            .to_ascii_lowercase()
            .contains("authorization: bearer secret-token\r\n")
    );
}

#[tokio::test]
async fn test_reserved_brand_characters_stay_in_path() {
    let body = r#"{"success":true,"message":"ok","data":{"users":[],"pagination":{"page":1,"limit":10,"total":0,"totalPages":0}}}"#;
    let (base_url, server) = serve_once("200 OK", body).await;
    let scope = Scope::new(BrandId::new("acme#eu").unwrap(), AgentId::new("bot").unwrap());
    let filter = AudienceFilter {
        status: Some(SubscriptionStatus::Unsubscribed),
        ..AudienceFilter::default()
    };

    gateway(&base_url)
        .list_users(&credential(), &scope, &filter)
        .await
        .unwrap();
    let request = server.await.unwrap();

    assert!(request.starts_with(
        "GET /api/userSub/brand/acme%23eu?page=1&limit=10&status=unsubscribed HTTP/1.1\r\n"
    ));
}

#[tokio::test]
async fn test_not_implemented_statuses() {
    let (base_url, server) = serve_once("501 Not Implemented", "").await;
    let result = gateway(&base_url)
        .list_users(&credential(), &scope(), &AudienceFilter::default())
        .await;
    server.await.unwrap();
    assert!(matches!(result, Err(GatewayError::NotImplemented("list_users"))));

    let (base_url, server) = serve_once("405 Method Not Allowed", "").await;
    let result = gateway(&base_url)
        .export_users(&credential(), &scope(), ExportFormat::Csv)
        .await;
    let request = server.await.unwrap();
    assert!(matches!(result, Err(GatewayError::NotImplemented("export_users"))));
    assert!(request.starts_with("GET /api/userSub/brand/acme/agent/bot/export?format=csv "));
}

#[tokio::test]
async fn test_server_error_carries_backend_message() {
    let (base_url, server) = serve_once(
        "500 Internal Server Error",
        r#"{"success":false,"message":"boom"}"#,
    )
    .await;

    let result = gateway(&base_url)
        .list_users(&credential(), &scope(), &AudienceFilter::default())
        .await;
    server.await.unwrap();

    match result {
        Err(GatewayError::Http { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_rejected_by_envelope() {
    let (base_url, server) =
        serve_once("200 OK", r#"{"success":false,"message":"brand not found"}"#).await;

    let result = gateway(&base_url)
        .list_users(&credential(), &scope(), &AudienceFilter::default())
        .await;
    server.await.unwrap();

    assert!(matches!(result, Err(GatewayError::Rejected(message)) if message == "brand not found"));
}

#[tokio::test]
async fn test_repeated_unsubscribe_is_acknowledged() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"success":false,"message":"already unsubscribed"}"#,
    )
    .await;

    let ack = gateway(&base_url)
        .unsubscribe_user(&credential(), &scope(), AudienceId::new(4).unwrap())
        .await
        .unwrap();
    let request = server.await.unwrap();

    assert_eq!(ack.message, "already unsubscribed");
    assert!(request.starts_with("POST /api/userSub/4/unsubscribe HTTP/1.1\r\n"));
    assert!(
        request
            .to_ascii_lowercase()
            .contains("authorization: bearer secret-token\r\n")
    );
}

#[tokio::test]
async fn test_delete_with_empty_body_is_acknowledged() {
    let (base_url, server) = serve_once("200 OK", "").await;

    let ack = gateway(&base_url)
        .delete_user(&credential(), AudienceId::new(9).unwrap())
        .await
        .unwrap();
    let request = server.await.unwrap();

    assert!(ack.message.is_empty());
    assert!(request.starts_with("DELETE /api/userSub/9 HTTP/1.1\r\n"));
}
