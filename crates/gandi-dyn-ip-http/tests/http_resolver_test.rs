// Integration tests for `HttpIpResolver` using wiremock.

use std::net::Ipv4Addr;
use std::time::Duration;

use gandi_dyn_core::Error;
use gandi_dyn_core::config::IpEndpointConfig;
use gandi_dyn_core::traits::IpResolver;
use gandi_dyn_ip_http::HttpIpResolver;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn resolver(server: &MockServer, suffix: &str) -> HttpIpResolver {
    HttpIpResolver::new(format!("{}{}", server.uri(), suffix), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_plain_text_answer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.7\n"))
        .expect(1)
        .mount(&server)
        .await;

    let ip = resolver(&server, "/").await.current().await.unwrap();
    assert_eq!(ip, Ipv4Addr::new(203, 0, 113, 7));
}

#[tokio::test]
async fn test_json_answer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ip": "5.6.7.8" })))
        .mount(&server)
        .await;

    let ip = resolver(&server, "/?format=json").await.current().await.unwrap();
    assert_eq!(ip, Ipv4Addr::new(5, 6, 7, 8));
}

#[tokio::test]
async fn test_custom_json_field() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/whoami"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "address": "5.6.7.8", "port": 4711 })),
        )
        .mount(&server)
        .await;

    let ip = resolver(&server, "/whoami")
        .await
        .with_json_field("address")
        .current()
        .await
        .unwrap();
    assert_eq!(ip, Ipv4Addr::new(5, 6, 7, 8));
}

#[tokio::test]
async fn test_json_field_from_config() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/whoami"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ip": "1.1.1.1", "client_ip": "5.6.7.8" })),
        )
        .mount(&server)
        .await;

    let config = IpEndpointConfig {
        url: format!("{}/whoami", server.uri()),
        json_field: "client_ip".to_string(),
        ..IpEndpointConfig::default()
    };

    let ip = HttpIpResolver::from_config(&config)
        .unwrap()
        .current()
        .await
        .unwrap();
    assert_eq!(ip, Ipv4Addr::new(5, 6, 7, 8));
}

#[tokio::test]
async fn test_malformed_address_is_validation_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ip": "1.2.3" })))
        .mount(&server)
        .await;

    let result = resolver(&server, "/").await.current().await;
    assert!(
        matches!(result, Err(Error::Validation(_))),
        "expected Validation error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_ipv6_answer_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("2001:db8::1"))
        .mount(&server)
        .await;

    let result = resolver(&server, "/").await.current().await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn test_http_error_is_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let result = resolver(&server, "/").await.current().await;
    assert!(
        matches!(&result, Err(e) if e.is_transport()),
        "expected Transport error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("5.6.7.8")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let resolver = HttpIpResolver::new(server.uri(), Duration::from_millis(200)).unwrap();
    let result = resolver.current().await;
    assert!(matches!(&result, Err(e) if e.is_transport()));
}
