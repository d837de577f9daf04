//! HTTP lookup tests against a local fake geolocation API

mod common;

use axum::http::StatusCode;
use common::FakeApi;
use ipgeo::config::ApiConfig;
use ipgeo::lookup::{GeoLookup, HttpGeoLookup, LookupError};
use std::net::IpAddr;
use std::sync::Arc;

async fn lookup_for(api: FakeApi) -> (HttpGeoLookup, Arc<FakeApi>) {
    let api = Arc::new(api);
    let base_url = common::spawn(Arc::clone(&api)).await;
    let config = ApiConfig {
        base_url: format!("{}/", base_url),
        timeout_secs: 5,
        ..Default::default()
    };
    (HttpGeoLookup::from_config(&config).unwrap(), api)
}

#[tokio::test]
async fn test_successful_lookup() {
    let (lookup, api) =
        lookup_for(FakeApi::new().location("8.8.8.8", "US", "Mountain View", "California")).await;

    let ip: IpAddr = "8.8.8.8".parse().unwrap();
    let record = lookup.lookup(ip).await.unwrap();

    assert_eq!(record.ip, ip);
    assert_eq!(record.country.as_deref(), Some("US"));
    assert_eq!(record.city.as_deref(), Some("Mountain View"));
    assert_eq!(record.region.as_deref(), Some("California"));
    assert_eq!(*api.requests.lock().unwrap(), vec!["8.8.8.8".to_string()]);
}

#[tokio::test]
async fn test_ipv6_lookup() {
    let (lookup, _api) =
        lookup_for(FakeApi::new().location("2001:db8::1", "DE", "Berlin", "Berlin")).await;

    let record = lookup.lookup("2001:db8::1".parse().unwrap()).await.unwrap();
    assert_eq!(record.country.as_deref(), Some("DE"));
}

#[tokio::test]
async fn test_non_success_status_is_status_error() {
    let (lookup, _api) = lookup_for(FakeApi::new().raw(
        "1.1.1.1",
        StatusCode::TOO_MANY_REQUESTS,
        r#"{"error":"rate limited"}"#,
    ))
    .await;

    let err = lookup.lookup("1.1.1.1".parse().unwrap()).await.unwrap_err();
    match err {
        LookupError::Status { status, .. } => assert_eq!(status.as_u16(), 429),
        other => panic!("Unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_address_is_status_error() {
    let (lookup, _api) = lookup_for(FakeApi::new()).await;

    let err = lookup.lookup("9.9.9.9".parse().unwrap()).await.unwrap_err();
    assert!(err.is_network());
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let (lookup, _api) =
        lookup_for(FakeApi::new().raw("1.0.0.1", StatusCode::OK, "<html>oops</html>")).await;

    let err = lookup.lookup("1.0.0.1".parse().unwrap()).await.unwrap_err();
    assert!(matches!(err, LookupError::Decode { .. }));
    assert!(!err.is_network());
}

#[tokio::test]
async fn test_array_body_is_decode_error() {
    let (lookup, _api) = lookup_for(
        FakeApi::new()
            .raw("1.0.0.2", StatusCode::OK, "[]")
            .raw("1.0.0.3", StatusCode::OK, r#"["US","NY","CA"]"#),
    )
    .await;

    for ip in ["1.0.0.2", "1.0.0.3"] {
        let err = lookup.lookup(ip.parse().unwrap()).await.unwrap_err();
        assert!(matches!(err, LookupError::Decode { .. }), "{}: {:?}", ip, err);
    }
}

#[tokio::test]
async fn test_unreachable_api_is_transport_error() {
    // Bind then drop a listener so the port is very likely closed
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ApiConfig {
        base_url: format!("http://{}", addr),
        timeout_secs: 2,
        ..Default::default()
    };
    let lookup = HttpGeoLookup::from_config(&config).unwrap();

    let err = lookup.lookup("8.8.4.4".parse().unwrap()).await.unwrap_err();
    assert!(matches!(err, LookupError::Transport { .. }));
}
