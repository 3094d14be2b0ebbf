//! HTTP client for the glue backend API.
//!
//! [`GlueApi`] is the seam commands are written against; [`ApiClient`] is
//! the reqwest-backed implementation. The client also serves as the fetch
//! collaborator for the polling streams in `glue-stream`.

use std::future::Future;
use std::time::Duration;

use glue_proto::{
    CreateDeployment, CreateGlue, Deployment, DeploymentId, DeploymentSnapshot, Glue, GlueId,
    LogPage, User,
};
use glue_stream::{DeploymentFetcher, LogFetcher, StreamResult};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

use crate::config::{validate_api_url, Settings};
use crate::error::CliError;

/// Operations the CLI performs against the backend.
pub trait GlueApi: DeploymentFetcher + LogFetcher {
    /// Returns the authenticated account.
    fn me(&self) -> impl Future<Output = Result<User, CliError>> + Send;

    /// Lists glues, including archived ones if requested.
    fn list_glues(
        &self,
        include_archived: bool,
    ) -> impl Future<Output = Result<Vec<Glue>, CliError>> + Send;

    /// Fetches one glue.
    fn get_glue(&self, id: &GlueId) -> impl Future<Output = Result<Glue, CliError>> + Send;

    /// Creates a glue.
    fn create_glue(
        &self,
        body: &CreateGlue,
    ) -> impl Future<Output = Result<Glue, CliError>> + Send;

    /// Archives a glue.
    fn archive_glue(&self, id: &GlueId) -> impl Future<Output = Result<Glue, CliError>> + Send;

    /// Replaces a glue's tags.
    fn set_tags(
        &self,
        id: &GlueId,
        tags: &[String],
    ) -> impl Future<Output = Result<Glue, CliError>> + Send;

    /// Uploads a new deployment.
    fn create_deployment(
        &self,
        id: &GlueId,
        body: &CreateDeployment,
    ) -> impl Future<Output = Result<Deployment, CliError>> + Send;

    /// Lists a glue's deployments, newest first.
    fn list_deployments(
        &self,
        id: &GlueId,
    ) -> impl Future<Output = Result<Vec<Deployment>, CliError>> + Send;

    /// Fetches a deployment with its build steps, or `None` if it does not exist.
    fn get_deployment(
        &self,
        id: &DeploymentId,
    ) -> impl Future<Output = Result<Option<DeploymentSnapshot>, CliError>> + Send;

    /// Fetches one page of logs.
    fn logs_page(
        &self,
        id: &GlueId,
        cursor: Option<&str>,
        limit: u32,
    ) -> impl Future<Output = Result<LogPage, CliError>> + Send;
}

#[derive(Serialize)]
struct TagsBody<'a> {
    tags: &'a [String],
}

/// reqwest-backed API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Creates a client for `api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(api_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, CliError> {
        let base = validate_api_url(api_url)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("glue-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CliError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, base, token })
    }

    /// Creates a client from resolved settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured URL is invalid.
    pub fn from_settings(settings: &Settings) -> Result<Self, CliError> {
        Self::new(
            &settings.config.api_url,
            settings.token.clone(),
            settings.config.request_timeout(),
        )
    }

    /// Returns a copy of this client using `token`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Bearer token sent with each request.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Builds an API URL from path segments, escaping each one.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry a path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, CliError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| CliError::Config(format!("api_url '{}' cannot be a base", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// WebSocket URL of a glue's dev session.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn dev_session_url(&self, id: &GlueId) -> Result<Url, CliError> {
        let mut url = self.endpoint(&["api", "glues", id.as_str(), "dev"])?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| CliError::Config(format!("cannot derive WebSocket URL from {url}")))?;
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        trace!(%method, %url, "request");
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, CliError> {
        let response = check_status(builder.send().await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| CliError::Protocol(format!("unexpected response body: {e}")))
    }
}

async fn check_status(response: Response) -> Result<Response, CliError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    debug!(status = status.as_u16(), %message, "API error");

    Err(match status.as_u16() {
        401 | 403 => CliError::Auth(message),
        404 => CliError::NotFound(message),
        code => CliError::Api {
            status: code,
            message,
        },
    })
}

/// Extracts a human-readable message from an error body.
fn error_message(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = ["message", "error"]
            .iter()
            .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        {
            return Some(msg.to_string());
        }
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl GlueApi for ApiClient {
    async fn me(&self) -> Result<User, CliError> {
        let url = self.endpoint(&["api", "me"])?;
        self.send(self.request(Method::GET, url)).await
    }

    async fn list_glues(&self, include_archived: bool) -> Result<Vec<Glue>, CliError> {
        let mut url = self.endpoint(&["api", "glues"])?;
        url.query_pairs_mut()
            .append_pair("archived", if include_archived { "true" } else { "false" });
        self.send(self.request(Method::GET, url)).await
    }

    async fn get_glue(&self, id: &GlueId) -> Result<Glue, CliError> {
        let url = self.endpoint(&["api", "glues", id.as_str()])?;
        self.send(self.request(Method::GET, url))
            .await
            .map_err(|e| not_found_as(e, || format!("glue {id}")))
    }

    async fn create_glue(&self, body: &CreateGlue) -> Result<Glue, CliError> {
        let url = self.endpoint(&["api", "glues"])?;
        self.send(self.request(Method::POST, url).json(body)).await
    }

    async fn archive_glue(&self, id: &GlueId) -> Result<Glue, CliError> {
        let url = self.endpoint(&["api", "glues", id.as_str(), "archive"])?;
        self.send(self.request(Method::POST, url))
            .await
            .map_err(|e| not_found_as(e, || format!("glue {id}")))
    }

    async fn set_tags(&self, id: &GlueId, tags: &[String]) -> Result<Glue, CliError> {
        let url = self.endpoint(&["api", "glues", id.as_str(), "tags"])?;
        self.send(self.request(Method::PUT, url).json(&TagsBody { tags }))
            .await
            .map_err(|e| not_found_as(e, || format!("glue {id}")))
    }

    async fn create_deployment(
        &self,
        id: &GlueId,
        body: &CreateDeployment,
    ) -> Result<Deployment, CliError> {
        let url = self.endpoint(&["api", "glues", id.as_str(), "deployments"])?;
        self.send(self.request(Method::POST, url).json(body))
            .await
            .map_err(|e| not_found_as(e, || format!("glue {id}")))
    }

    async fn list_deployments(&self, id: &GlueId) -> Result<Vec<Deployment>, CliError> {
        let url = self.endpoint(&["api", "glues", id.as_str(), "deployments"])?;
        self.send(self.request(Method::GET, url))
            .await
            .map_err(|e| not_found_as(e, || format!("glue {id}")))
    }

    async fn get_deployment(
        &self,
        id: &DeploymentId,
    ) -> Result<Option<DeploymentSnapshot>, CliError> {
        let mut url = self.endpoint(&["api", "deployments", id.as_str()])?;
        url.query_pairs_mut().append_pair("include", "steps");
        match self.send(self.request(Method::GET, url)).await {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(CliError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn logs_page(
        &self,
        id: &GlueId,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<LogPage, CliError> {
        let mut url = self.endpoint(&["api", "glues", id.as_str(), "logs"])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(cursor) = cursor {
                query.append_pair("cursor", cursor);
            }
            query.append_pair("limit", &limit.to_string());
        }
        self.send(self.request(Method::GET, url))
            .await
            .map_err(|e| not_found_as(e, || format!("glue {id}")))
    }
}

/// Replaces the body-derived message of a 404 with the missing resource.
fn not_found_as(err: CliError, what: impl FnOnce() -> String) -> CliError {
    match err {
        CliError::NotFound(_) => CliError::NotFound(what()),
        other => other,
    }
}

impl DeploymentFetcher for ApiClient {
    async fn fetch_deployment_with_logs(
        &self,
        id: &DeploymentId,
    ) -> StreamResult<Option<DeploymentSnapshot>> {
        self.get_deployment(id)
            .await
            .map_err(CliError::into_stream_error)
    }
}

impl LogFetcher for ApiClient {
    async fn fetch_logs(
        &self,
        glue_id: &GlueId,
        cursor: Option<&str>,
        limit: u32,
    ) -> StreamResult<LogPage> {
        self.logs_page(glue_id, cursor, limit)
            .await
            .map_err(CliError::into_stream_error)
    }
}
