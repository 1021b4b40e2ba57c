#![allow(dead_code)]

use client_lib::{config::Config, state::AppState};
use std::sync::Arc;
use storybook_core::{MemoryStorage, Session, SessionStore};
use tracing::info;
use wiremock::MockServer;

pub const TEST_TOKEN: &str = "test-token";

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct TestContext {
    pub server: MockServer,
    pub storage: Arc<MemoryStorage>,
    pub state: AppState,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_settings(&[]).await
    }

    /// Starts a mock backend and points a fresh `AppState` at it.
    pub async fn with_settings(settings: &[(&str, &str)]) -> Self {
        init_logging();
        let server = MockServer::start().await;
        info!("Mock server started at: {}", server.uri());

        let api_url = format!("{}/api", server.uri());
        let health_url = format!("{}/health", server.uri());
        let config = Config::from_lookup(|key| match key {
            "STORYBOOK_API_URL" => Some(api_url.clone()),
            "STORYBOOK_HEALTH_URL" => Some(health_url.clone()),
            "HEALTH_TIMEOUT_MS" => Some("500".to_string()),
            other => settings
                .iter()
                .find(|(k, _)| *k == other)
                .map(|(_, v)| v.to_string()),
        })
        .expect("test config is valid");

        let storage = Arc::new(MemoryStorage::new());
        let state = AppState::with_storage(config, storage.clone()).expect("state builds");

        Self {
            server,
            storage,
            state,
        }
    }

    /// Stores a session as if a login had already happened.
    pub async fn sign_in(&self) {
        SessionStore::new(self.storage.clone())
            .save(&Session {
                id: "user-1".to_string(),
                email: "mara@example.com".to_string(),
                name: "mara".to_string(),
                token: TEST_TOKEN.to_string(),
            })
            .await
            .expect("session saved");
    }
}
