//! Stub provider against the fixtures in `tests/fixtures/`.

use std::path::PathBuf;

use netlayer_core::{
    load_fixture, ConfigError, DateDecodeStrategy, ErrorKind, FixtureBundle, NetworkManager, NoHeader, Provider,
    RequestConfig, Response, Timestamp,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Item {
    id: String,
    name: String,
    created_at: Timestamp,
}

fn fixtures() -> FixtureBundle {
    FixtureBundle::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"))
}

fn stub(path: &str) -> RequestConfig {
    RequestConfig::builder("api.test", path)
        .provider(Provider::Stub)
        .bundle(fixtures())
        .date_decode_strategy(DateDecodeStrategy::Iso8601)
        .build()
        .unwrap()
}

#[test]
fn stub_without_bundle_cannot_be_constructed() {
    let result = RequestConfig::builder("api.test", "/item").provider(Provider::Stub).build();
    assert_eq!(result.unwrap_err(), ConfigError::MissingBundle);
}

#[test]
fn fixture_bytes_load_by_name() {
    let bytes = load_fixture("item", "json", &fixtures()).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["id"], "fixture-1");
}

#[tokio::test]
async fn stub_request_decodes_fixture() {
    let res: Response<Item> = NetworkManager::new().request(&stub("/item")).await.unwrap();
    assert_eq!(res.object.id, "fixture-1");
    assert_eq!(res.object.name, "from fixture");
    assert_eq!(res.object.created_at.to_string(), "2024-01-15T09:30:00+00:00");
    assert!(res.header.is_none());
}

#[tokio::test]
async fn stub_request_for_missing_fixture_is_malformed_url() {
    let err = NetworkManager::new()
        .request::<Item, NoHeader>(&stub("/missing"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::MalformedUrl);
    assert_eq!(err.code, Some(-1002));
}

#[tokio::test]
async fn stub_request_for_broken_fixture_is_decoder_failure() {
    let err = NetworkManager::new()
        .request::<Item, NoHeader>(&stub("/broken"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DecoderFailure);
}
