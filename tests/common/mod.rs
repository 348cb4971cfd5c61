// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use gains_iq::config::Config;
use gains_iq::db::{FirestoreDb, MemoryStore};
use gains_iq::routes::create_router;
use gains_iq::services::{Authenticator, RecordingNotifier, StaticKeyValidator};
use gains_iq::AppState;
use std::sync::Arc;

/// API key that the test app maps to `alice`.
#[allow(dead_code)]
pub const ALICE_KEY: &str = "abc123";
/// API key that the test app maps to `bob`.
#[allow(dead_code)]
pub const BOB_KEY: &str = "xyz789";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Handles to the collaborators behind a test app.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

/// Create a test app backed by the in-memory store and static API keys.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let mut config = Config::test_default();
    config
        .api_key_map
        .insert(BOB_KEY.to_string(), "bob".to_string());

    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let authenticator =
        Authenticator::StaticKeys(StaticKeyValidator::new(config.api_key_map.clone()));

    let state = Arc::new(AppState::new(
        config,
        store.clone(),
        authenticator,
        notifier.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        notifier,
    }
}

/// Build a JSON request with a bearer key.
#[allow(dead_code)]
pub fn json_request(
    method: &str,
    uri: &str,
    key: &str,
    body: serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", key))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a bodiless request with a bearer key.
#[allow(dead_code)]
pub fn request(method: &str, uri: &str, key: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", key))
        .body(Body::empty())
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
