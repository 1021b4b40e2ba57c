//! services/client/src/state.rs
//!
//! Defines the application's shared state: every adapter and store the CLI
//! commands use, wired together once at startup.

use crate::adapters::{FileStorage, HttpApiClient};
use crate::config::Config;
use crate::error::ClientError;
use std::sync::Arc;
use storybook_core::ports::KeyValueStorage;
use storybook_core::{LibraryStore, SessionManager, SessionStore, StoryGenerator};

/// The shared application state, created once at startup and passed to all commands.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub api: Arc<HttpApiClient>,
    pub sessions: SessionManager,
    pub generator: StoryGenerator,
    pub library: LibraryStore,
}

impl AppState {
    /// Builds the state with records kept under `config.data_dir`.
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(&config.data_dir));
        Self::with_storage(config, storage)
    }

    /// Builds the state over any storage, e.g. `MemoryStorage` in tests.
    pub fn with_storage(
        config: Config,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let session_store = SessionStore::new(storage.clone());
        let api = Arc::new(
            HttpApiClient::new(
                http,
                config.api_url.clone(),
                config.health_url.clone(),
                Arc::new(session_store.clone()),
            )
            .with_health_timeout(config.health_timeout),
        );

        let sessions = SessionManager::new(api.clone(), session_store);
        let generator = StoryGenerator::new(api.clone(), config.generation_options());
        let library = LibraryStore::new(storage);

        Ok(Self {
            config: Arc::new(config),
            api,
            sessions,
            generator,
            library,
        })
    }
}
