use metrics_ingestor::{
    providers::{
        ProviderError, TrafficProvider,
        cloudflare_radar::{CloudflareRadarConfig, CloudflareRadarProvider},
    },
    requests::retry::RetryPolicy,
};
use secrecy::SecretString;
use serde_json::json;
use serial_test::serial;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

fn provider(server: &MockServer) -> CloudflareRadarProvider {
    CloudflareRadarProvider::new(
        SecretString::new("test-token".into()),
        CloudflareRadarConfig {
            base_url: server.uri(),
            retry: RetryPolicy::immediate(2),
            ..Default::default()
        },
    )
    .expect("provider")
}

#[tokio::test]
async fn traffic_sends_bearer_token_and_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/netflows/timeseries"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("name", "main"))
        .and(query_param("location", "DE"))
        .and(query_param("dateRange", "52w"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": {"main": {
                "timestamps": ["2024-01-01T00:00:00Z", "2024-01-08T00:00:00Z"],
                "values": ["0.75", 1]
            }}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let series = provider(&server).traffic("DE").await.unwrap();
    assert_eq!(series.timestamps.len(), 2);
    assert_eq!(series.values, vec![0.75, 1.0]);
}

#[tokio::test]
async fn quality_requests_bandwidth_percentiles() {
    let server = MockServer::start().await;
    Mock::given(path("/quality/iqi/timeseries_groups"))
        .and(query_param("metric", "bandwidth"))
        .and(query_param("interpolation", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": {"main": {
                "timestamps": ["2024-01-01T00:00:00Z"],
                "p25": ["10.5"], "p50": ["20"], "p75": ["40.25"]
            }}
        })))
        .mount(&server)
        .await;

    let q = provider(&server).internet_quality("DE").await.unwrap();
    assert_eq!(q.p75, vec![40.25]);
    assert_eq!(q.p25, vec![10.5]);
}

#[tokio::test]
async fn auth_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(path("/netflows/timeseries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errors": [{"code": 10000, "message": "Authentication error"}],
            "result": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider(&server).traffic("DE").await.unwrap_err();
    assert!(matches!(err, ProviderError::Api(_)));
}

#[test]
#[serial]
fn from_env_requires_token() {
    // SAFETY: serialised with the other env-mutating tests.
    unsafe { std::env::remove_var("CLOUDFLARE_API_TOKEN") };
    let err = CloudflareRadarProvider::from_env(CloudflareRadarConfig::default())
        .err()
        .expect("missing token");
    assert!(err.to_string().contains("CLOUDFLARE_API_TOKEN"));
}
