//! Pipeline relaying documents through the Telegram forwarder

mod common;

use common::{mount_case, mount_document, test_config, visible_files};
use registry_dl::{CaseIdentifier, Event, Pipeline, TelegramConfig};
use serde_json::json;
use std::time::Duration;
use tempfile::tempdir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn telegram_config(server: &MockServer) -> TelegramConfig {
    TelegramConfig {
        api_base: server.uri(),
        bot_token: "42:token".to_string(),
        chat_id: "-1001".to_string(),
        content_type: "application/pdf".to_string(),
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn documents_are_uploaded_to_the_configured_chat() {
    let registry = MockServer::start().await;
    let telegram = MockServer::start().await;
    let temp_dir = tempdir().unwrap();
    mount_case(&registry, "12345", &[("d1", "a.pdf")]).await;
    mount_document(&registry, "d1", "a.pdf", b"%PDF-1.4").await;

    Mock::given(method("POST"))
        .and(path("/bot42:token/sendDocument"))
        .and(body_string_contains("-1001"))
        .and(body_string_contains("d1_a.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&telegram)
        .await;

    let mut config = test_config(&registry, &temp_dir);
    config.notifications.telegram = Some(telegram_config(&telegram));
    let pipeline = Pipeline::new(config).unwrap();

    let result = pipeline
        .download_case(&CaseIdentifier::new("12345", "abc"), false)
        .await
        .unwrap();

    assert_eq!(result.documents().len(), 1);
}

#[tokio::test]
async fn rejected_upload_leaves_document_on_disk() {
    let registry = MockServer::start().await;
    let telegram = MockServer::start().await;
    let temp_dir = tempdir().unwrap();
    mount_case(&registry, "1", &[("d1", "a.pdf")]).await;
    mount_document(&registry, "d1", "a.pdf", b"%PDF-1.4").await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "ok": false,
            "error_code": 403,
            "description": "Forbidden: bot was kicked from the group chat"
        })))
        .mount(&telegram)
        .await;

    let mut config = test_config(&registry, &temp_dir);
    config.notifications.telegram = Some(telegram_config(&telegram));
    let pipeline = Pipeline::new(config).unwrap();
    let mut events = pipeline.subscribe();

    let result = pipeline
        .download_case(&CaseIdentifier::new("1", "abc"), false)
        .await
        .unwrap();

    assert_eq!(result.documents().len(), 1);
    assert!(
        visible_files(&temp_dir.path().join("out")).contains(&"d1_a.pdf".to_string())
    );

    let mut failure = None;
    while let Ok(event) = events.try_recv() {
        if let Event::NotificationFailed { channel, error, .. } = event {
            failure = Some((channel, error));
        }
    }
    let (channel, error) = failure.expect("NotificationFailed event");
    assert_eq!(channel, "telegram");
    assert!(error.contains("bot was kicked"));
}
