//! HTTP request pipeline for the sandbox service.
//!
//! One long-lived client with two fixed stages: a request stage that
//! attaches the auth header from the token store, and a response stage
//! that passes success through and surfaces failure unmodified. The
//! pipeline reads the store; it never writes it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use reqwest::{RequestBuilder, Response};
use thiserror::Error;

use crate::store::TokenStore;

/// Header carrying the auth token to the sandbox service.
pub const AUTH_HEADER: &str = "x-auth";

/// Fixed timeout applied to every request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Errors surfaced by the request pipeline.
///
/// Neither kind is recovered locally: both propagate to the caller with
/// no retry, no backoff, and no reinterpretation.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Connection or timeout failure before a response was received.
    #[error("sandbox request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service responded outside the success range. Carries the
    /// original status and body, unmodified.
    #[error("sandbox service returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

/// HTTP client wrapper dispatching calls to the sandbox service.
///
/// Constructed once at startup and passed to consumers; there is no
/// module-level shared instance.
pub struct RequestPipeline {
    client: reqwest::Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
}

impl RequestPipeline {
    /// Build the pipeline with its long-lived HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` does not parse as an absolute URL
    /// or the underlying client cannot be constructed.
    pub fn new(base_url: &str, store: Arc<dyn TokenStore>) -> anyhow::Result<Self> {
        let parsed = url::Url::parse(base_url)
            .with_context(|| format!("invalid sandbox base URL: {base_url}"))?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_owned(),
            store,
        })
    }

    /// The configured service base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a GET request to a path relative to the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Transport`] on connection or timeout
    /// failure, [`RequestError::Status`] on a non-success response.
    pub async fn get(&self, path: &str) -> Result<Response, RequestError> {
        let request = self.attach_auth(self.client.get(self.endpoint(path)));
        check_response(request.send().await?).await
    }

    /// Send a POST request with a JSON body to a path relative to the
    /// base URL. The payload is forwarded uninterpreted.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Transport`] on connection or timeout
    /// failure, [`RequestError::Status`] on a non-success response.
    pub async fn post_json(
        &self,
        path: &str,
        payload: &serde_json::Value,
    ) -> Result<Response, RequestError> {
        let request = self.attach_auth(self.client.post(self.endpoint(path)).json(payload));
        check_response(request.send().await?).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Request stage: attach `x-auth` when a token is stored.
    ///
    /// The store is read at dispatch time, once per request. A login or
    /// logout between two in-flight requests affects only dispatches
    /// that happen after it.
    fn attach_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.store.get() {
            Some(token) => builder.header(AUTH_HEADER, token.as_str()),
            None => builder,
        }
    }
}

/// Response stage: pass success through, surface failure unmodified.
///
/// # Errors
///
/// Returns [`RequestError::Status`] with the original status and body
/// for any response outside the success range, [`RequestError::Transport`]
/// if the failure body cannot be read.
pub async fn check_response(response: Response) -> Result<Response, RequestError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await?;
    Err(RequestError::Status {
        status: status.as_u16(),
        body,
    })
}
