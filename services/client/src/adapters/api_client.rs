//! services/client/src/adapters/api_client.rs
//!
//! This module contains the HTTP adapter for the storybook backend.
//! It implements the `StoryBackend` and `AuthService` ports from the `core` crate;
//! the resource endpoints (stories, chapters, ...) live in `resources.rs`.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use storybook_core::ports::{
    AuthService, AuthenticatedUser, GeneratedIllustration, GeneratedStory, IllustrationRequest,
    PortError, PortResult, StoryBackend, StoryTextRequest, TokenProvider,
};
use tracing::{debug, warn};

use super::events::EventLines;
use super::records::{
    ErrorBody, GenerateIllustrationResponse, GenerateStoryResponse, IllustrationStatus,
    LoginBody, LoginResponse, ProfileResponse, ProfileUpdate, RegisterBody, UserRecord,
};

const MISSING_TOKEN: &str = "Authentication token not found";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that talks to the storybook backend over HTTP.
#[derive(Clone)]
pub struct HttpApiClient {
    http: reqwest::Client,
    base_url: String,
    health_url: String,
    health_timeout: Duration,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpApiClient {
    /// Creates a new `HttpApiClient`.
    ///
    /// `base_url` is the API prefix (e.g. `http://localhost:8000/api`); the health
    /// probe uses its own URL because it lives outside that prefix.
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        health_url: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            health_url: health_url.into(),
            health_timeout: Duration::from_secs(3),
            tokens,
        }
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub(crate) fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn token(&self) -> PortResult<String> {
        self.tokens
            .bearer_token()
            .await
            .ok_or_else(|| PortError::Auth(MISSING_TOKEN.to_string()))
    }

    /// A request carrying the bearer token. Fails before any I/O when logged out.
    pub(crate) async fn authed(&self, method: Method, endpoint: &str) -> PortResult<RequestBuilder> {
        let token = self.token().await?;
        Ok(self
            .http
            .request(method, self.url(endpoint))
            .bearer_auth(token))
    }

    /// Sends a request, turning transport failures and non-success statuses into errors.
    pub(crate) async fn send(&self, request: RequestBuilder) -> PortResult<Response> {
        let response = request.send().await.map_err(network_error)?;
        debug!(status = response.status().as_u16(), url = %response.url(), "backend response");
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response, None).await)
        }
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> PortResult<T> {
        let request = self.authed(Method::GET, endpoint).await?;
        parse_json(self.send(request).await?).await
    }

    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> PortResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.authed(method, endpoint).await?;
        if let Some(body) = body {
            request = request.json(body);
        }
        parse_json(self.send(request).await?).await
    }

    /// Sends an authenticated request whose response body is not needed.
    pub(crate) async fn send_empty(&self, method: Method, endpoint: &str) -> PortResult<()> {
        let request = self.authed(method, endpoint).await?;
        self.send(request).await?;
        Ok(())
    }

    pub(crate) async fn send_for_bytes<B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> PortResult<Bytes>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.authed(method, endpoint).await?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request)
            .await?
            .bytes()
            .await
            .map_err(network_error)
    }

    //=====================================================================================
    // Auth
    //=====================================================================================

    pub async fn profile(&self) -> PortResult<UserRecord> {
        let response: ProfileResponse = self.get_json("/auth/profile").await?;
        Ok(response.into_inner())
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> PortResult<UserRecord> {
        let response: ProfileResponse = self
            .send_json(Method::PUT, "/auth/profile", Some(update))
            .await?;
        Ok(response.into_inner())
    }

    //=====================================================================================
    // AI Generation
    //=====================================================================================

    pub async fn illustration_status(&self, prediction_id: &str) -> PortResult<IllustrationStatus> {
        self.get_json(&format!("/ai/illustration-status/{}", prediction_id))
            .await
    }

    /// Generates a complete storybook PDF in one call and returns its bytes.
    pub async fn generate_pdf(&self, request: &StoryTextRequest) -> PortResult<Bytes> {
        self.send_for_bytes(Method::POST, "/ai/generate-pdf", Some(request))
            .await
    }

    /// Generates a whole storybook server-side, passing each progress event the
    /// server streams back to `on_event` as it arrives.
    pub async fn generate_storybook_with_progress<F>(
        &self,
        request: &StoryTextRequest,
        mut on_event: F,
    ) -> PortResult<()>
    where
        F: FnMut(serde_json::Value) + Send,
    {
        let builder = self
            .authed(Method::POST, "/ai/generate-storybook-with-progress")
            .await?
            .json(request);
        let response = self.send(builder).await?;

        let mut lines = EventLines::default();
        let mut body = response.bytes_stream();
        let mut received = 0usize;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(network_error)?;
            for event in lines.push(&chunk) {
                received += 1;
                on_event(event);
            }
        }
        if let Some(event) = lines.finish() {
            received += 1;
            on_event(event);
        }
        debug!(events = received, "Storybook progress stream ended.");
        Ok(())
    }

    /// Downloads a server-generated storybook. The story attributes, when given,
    /// are sent as query parameters so the server can rebuild a missing file.
    pub async fn download_storybook(
        &self,
        storybook_id: &str,
        story: Option<&StoryTextRequest>,
    ) -> PortResult<Bytes> {
        let mut request = self
            .authed(Method::GET, &format!("/ai/download-storybook/{}", storybook_id))
            .await?;
        if let Some(story) = story {
            request = request.query(&storybook_query(story));
        }

        let response = request.send().await.map_err(network_error)?;
        if !response.status().is_success() {
            return Err(error_from_response(response, Some("Failed to download storybook")).await);
        }
        response.bytes().await.map_err(network_error)
    }
}

/// Query pairs for a storybook download; empty attributes are left out.
fn storybook_query(story: &StoryTextRequest) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    for (key, value) in [
        ("theme", &story.theme),
        ("art_style", &story.art_style),
        ("character_name", &story.character_name),
    ] {
        if !value.trim().is_empty() {
            query.push((key, value.clone()));
        }
    }
    if let Some(age) = story.character_age.filter(|age| *age > 0) {
        query.push(("character_age", age.to_string()));
    }
    if let Some(gender) = story.character_gender {
        query.push(("character_gender", gender.to_string()));
    }
    if !story.target_age.trim().is_empty() {
        query.push(("target_age", story.target_age.clone()));
    }
    query
}

//=========================================================================================
// Response Helpers
//=========================================================================================

fn network_error(e: reqwest::Error) -> PortError {
    PortError::Network(e.to_string())
}

/// Parses a success body into `T`, reporting shape mismatches as `Parse`.
pub(crate) async fn parse_json<T: DeserializeOwned>(response: Response) -> PortResult<T> {
    let body = response.bytes().await.map_err(network_error)?;
    serde_json::from_slice(&body).map_err(|e| {
        PortError::Parse(format!("{}: {}", std::any::type_name::<T>(), e))
    })
}

/// Builds the error for a non-success response.
///
/// The server's `message` is used when present, then `fallback`, then a generic
/// status message. 401 becomes `Auth`; everything else is `Http`.
async fn error_from_response(response: Response, fallback: Option<&str>) -> PortError {
    let status = response.status();
    let server_message = response
        .bytes()
        .await
        .ok()
        .and_then(|body| serde_json::from_slice::<ErrorBody>(&body).ok())
        .and_then(ErrorBody::into_message);

    let message = server_message
        .or_else(|| fallback.map(str::to_string))
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));

    if status == StatusCode::UNAUTHORIZED {
        PortError::Auth(message)
    } else {
        PortError::Http {
            status: status.as_u16(),
            message,
        }
    }
}

//=========================================================================================
// `StoryBackend` Trait Implementation
//=========================================================================================

#[async_trait]
impl StoryBackend for HttpApiClient {
    async fn health_check(&self) -> bool {
        match self
            .http
            .get(&self.health_url)
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Health check failed: {}", e);
                false
            }
        }
    }

    async fn generate_story(&self, request: &StoryTextRequest) -> PortResult<GeneratedStory> {
        let response: GenerateStoryResponse = self
            .send_json(Method::POST, "/ai/generate-story", Some(request))
            .await?;
        Ok(GeneratedStory {
            id: response.story.id,
            title: response.story.title,
            content: response.story.content,
        })
    }

    async fn generate_illustration(
        &self,
        request: &IllustrationRequest,
    ) -> PortResult<GeneratedIllustration> {
        let response: GenerateIllustrationResponse = self
            .send_json(Method::POST, "/ai/generate-illustration", Some(request))
            .await?;
        let illustration = response.illustration;
        if illustration.image_url.trim().is_empty() {
            return Err(PortError::Parse(
                "illustration response has an empty image_url".to_string(),
            ));
        }
        Ok(GeneratedIllustration {
            image_url: illustration.image_url,
            prompt: illustration.prompt.unwrap_or_default(),
        })
    }
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for HttpApiClient {
    /// Logs in through the demo-login endpoint. Every failure is an `Auth` error.
    async fn login(&self, email: &str, password: &str) -> PortResult<AuthenticatedUser> {
        let request = self
            .http
            .post(self.url("/auth/demo-login"))
            .json(&LoginBody { email, password });

        let response = request
            .send()
            .await
            .map_err(|e| PortError::Auth(format!("Login failed: {}", e)))?;
        if !response.status().is_success() {
            let error = error_from_response(response, Some("Login failed")).await;
            return Err(match error {
                PortError::Http { message, .. } => PortError::Auth(message),
                other => other,
            });
        }

        let body: LoginResponse = parse_json(response).await?;
        if body.token.trim().is_empty() {
            return Err(PortError::Auth("Login response did not include a token".to_string()));
        }
        Ok(AuthenticatedUser {
            id: body.user.id,
            email: body.user.email,
            full_name: body.user.full_name,
            token: body.token,
        })
    }

    async fn register(&self, email: &str, password: &str, username: &str) -> PortResult<()> {
        let request = self
            .http
            .post(self.url("/auth/register"))
            .json(&RegisterBody {
                email,
                password,
                username,
            });

        let response = request.send().await.map_err(network_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response, Some("Registration failed")).await)
        }
    }

    async fn logout(&self) -> PortResult<()> {
        if let Err(e) = self.send_empty(Method::POST, "/auth/logout").await {
            warn!("Server-side logout failed: {}", e);
            return Err(e);
        }
        Ok(())
    }
}
