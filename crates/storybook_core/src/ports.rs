//! crates/storybook_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the client's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the HTTP backend and of where records are persisted.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::Gender;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (HTTP, filesystem).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// A required field of a request is missing. Never reaches the network.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// Missing or rejected credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),
    /// The backend answered with a non-success status.
    #[error("{message}")]
    Http { status: u16, message: String },
    /// The request never produced a response (connect failure, timeout).
    #[error("Network error: {0}")]
    Network(String),
    /// A response or stored record did not have the expected shape.
    #[error("Unexpected response shape: {0}")]
    Parse(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Generation was cancelled")]
    Cancelled,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Backend Contract Types
//=========================================================================================

/// Body of `POST /ai/generate-story` (and `POST /ai/generate-pdf`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryTextRequest {
    pub theme: String,
    pub art_style: String,
    pub character_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_gender: Option<Gender>,
    pub target_age: String,
}

/// The metadata and narrative returned by story-text generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedStory {
    pub id: Option<String>,
    pub title: String,
    pub content: String,
}

/// Body of `POST /ai/generate-illustration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IllustrationRequest {
    pub prompt: String,
    pub art_style: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedIllustration {
    pub image_url: String,
    pub prompt: String,
}

/// The user returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub token: String,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistent storage of serialized records under fixed keys.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: String) -> PortResult<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> PortResult<()>;
}

/// Supplies the bearer token attached to authenticated requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Option<String>;
}

/// The parts of the backend the generation workflow depends on.
#[async_trait]
pub trait StoryBackend: Send + Sync {
    /// Returns `true` only when the backend answered the health probe with success.
    async fn health_check(&self) -> bool;

    async fn generate_story(&self, request: &StoryTextRequest) -> PortResult<GeneratedStory>;

    async fn generate_illustration(
        &self,
        request: &IllustrationRequest,
    ) -> PortResult<GeneratedIllustration>;
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> PortResult<AuthenticatedUser>;

    async fn register(&self, email: &str, password: &str, username: &str) -> PortResult<()>;

    /// Tells the server the current token is no longer used.
    async fn logout(&self) -> PortResult<()>;
}
