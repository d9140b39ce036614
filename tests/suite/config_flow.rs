//! Settings from a config file driving a real client

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ledgerx_client::{ClientOptions, LedgerClient};
use ledgerx_config::{ENV_ACCOUNT_A, ENV_API_URL, LedgerxConfig, Settings};
use ledgerx_engine::{BackendState, ReadinessCoordinator, ReadinessTimings};

use crate::common::account_json;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, body).unwrap();
    path
}

fn client_from(settings: &Settings) -> LedgerClient {
    let options = ClientOptions::new(settings.base_url.clone())
        .with_health_path(settings.health_path.clone())
        .with_connect_timeout(settings.connect_timeout);
    LedgerClient::new(options).unwrap()
}

#[tokio::test]
async fn file_settings_reach_the_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/internal/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "OK"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/WALLET-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json("WALLET-1", 12.5)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config_path = write_config(
        &dir,
        &format!(
            r#"
[api]
base_url = "{}"
health_path = "/internal/ping"

[accounts]
source = "WALLET-1"
destination = "WALLET-2"

[readiness]
max_wait_secs = 2
retry_interval_secs = 1
"#,
            server.uri()
        ),
    );

    let config = LedgerxConfig::load_from(&config_path).unwrap().unwrap();
    let settings = config.resolve_with(|_| None).unwrap();
    assert_eq!(settings.account_a.as_str(), "WALLET-1");
    assert_eq!(settings.max_wait, Duration::from_secs(2));

    let client = client_from(&settings);
    let readiness = ReadinessCoordinator::new(
        Arc::new(client.clone()),
        ReadinessTimings {
            attempt_timeout: settings.attempt_timeout,
            retry_interval: settings.retry_interval,
            max_wait: settings.max_wait,
            ready_flash: settings.ready_flash,
        },
    );
    readiness.ensure_ready().await.unwrap();
    assert_eq!(readiness.current_state(), BackendState::Ready);

    let account = client.get_account(&settings.account_a).await.unwrap();
    assert_eq!(account.account_number, settings.account_a);
}

#[tokio::test]
async fn environment_overrides_file_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/ENV-A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(account_json("ENV-A", 1.0)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config_path = write_config(
        &dir,
        r#"
[api]
base_url = "http://file-host.invalid:9"

[accounts]
source = "FILE-A"
"#,
    );
    let uri = server.uri();
    let config = LedgerxConfig::load_from(&config_path).unwrap().unwrap();
    let settings = config
        .resolve_with(|key| match key {
            k if k == ENV_API_URL => Some(uri.clone()),
            k if k == ENV_ACCOUNT_A => Some("ENV-A".to_string()),
            _ => None,
        })
        .unwrap();

    let account = client_from(&settings)
        .get_account(&settings.account_a)
        .await
        .unwrap();
    assert_eq!(account.account_number.as_str(), "ENV-A");
}

#[test]
fn missing_file_means_defaults() {
    let dir = TempDir::new().unwrap();
    let loaded = LedgerxConfig::load_from(&dir.path().join("absent.toml")).unwrap();
    assert!(loaded.is_none());

    let settings = LedgerxConfig::default().resolve_with(|_| None).unwrap();
    assert_eq!(settings.base_url.as_str(), "http://localhost:8080/");
    assert_eq!(settings.health_path, "/api/v1/health");
}
