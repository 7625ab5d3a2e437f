//! Mock registry, recording forwarder and pipeline setup

use async_trait::async_trait;
use base64::Engine as _;
use registry_dl::{Config, DeliveryError, NotificationForwarder, Pipeline};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock registry serves queries on
pub const ENDPOINT_PATH: &str = "/sptDataEndpoint";

/// Forwarder that records every delivered document
#[derive(Default)]
pub struct RecordingForwarder {
    deliveries: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingForwarder {
    /// Display names in delivery order
    pub fn names(&self) -> Vec<String> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Number of times `name` was delivered
    pub fn count(&self, name: &str) -> usize {
        self.names().iter().filter(|n| *n == name).count()
    }
}

#[async_trait]
impl NotificationForwarder for RecordingForwarder {
    async fn deliver(&self, display_name: &str, bytes: &[u8]) -> Result<(), DeliveryError> {
        self.deliveries
            .lock()
            .unwrap()
            .push((display_name.to_string(), bytes.to_vec()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Config pointing at the mock registry and a temp output directory
pub fn test_config(server: &MockServer, temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.registry.endpoint = format!("{}{}", server.uri(), ENDPOINT_PATH);
    config.download.output_dir = temp_dir.path().join("out");
    config
}

/// Pipeline wired to the mock registry with a recording forwarder
pub fn recording_pipeline(
    server: &MockServer,
    temp_dir: &TempDir,
) -> (Pipeline, Arc<RecordingForwarder>) {
    let forwarder = Arc::new(RecordingForwarder::default());
    let pipeline = Pipeline::with_forwarder(test_config(server, temp_dir), forwarder.clone())
        .expect("pipeline");
    (pipeline, forwarder)
}

/// Serve a case listing the given `(id, fileName)` documents
pub async fn mount_case(server: &MockServer, case_number: &str, docs: &[(&str, &str)]) {
    let docs: Vec<_> = docs
        .iter()
        .map(|(id, name)| json!({"id": id, "fileName": name}))
        .collect();

    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_partial_json(json!({
            "filter": {"VpNum": case_number, "dataType": "getSharedInfoByVP"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mParams": {"vpNum": case_number, "otherDocs": docs}
        })))
        .mount(server)
        .await;
}

/// Serve a document payload
pub async fn mount_document(server: &MockServer, id: &str, file_name: &str, content: &[u8]) {
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_partial_json(json!({
            "filter": {"ID": id, "dataType": "otherDecisionDocument", "isArtm": false}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mParams": {
                "fileName": file_name,
                "data": base64::engine::general_purpose::STANDARD.encode(content)
            }
        })))
        .mount(server)
        .await;
}

/// Serve `mParams: null` for every query not matched by an earlier mock
pub async fn mount_empty_fallback(server: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mParams": null})))
        .with_priority(u8::MAX)
        .mount(server)
        .await;
}

/// Deterministic pseudo-random content distinct per seed
pub fn document_bytes(seed: u32, len: usize) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xff) as u8
        })
        .collect()
}
