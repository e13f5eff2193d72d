//! Typed operations over the sandbox service's REST surface.
//!
//! Four thin endpoints, each a single pipeline call with no additional
//! logic — no validation, no retries, no caching. Payloads and responses
//! are opaque to the client and forwarded unchanged.

use reqwest::Response;
use serde_json::Value;

use crate::pipeline::{RequestError, RequestPipeline};

/// Client for the remote sandbox execution service.
pub struct SandboxClient {
    pipeline: RequestPipeline,
}

impl SandboxClient {
    /// Wrap a configured request pipeline.
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    /// GET `/` — service health check.
    ///
    /// # Errors
    ///
    /// Propagates the pipeline outcome unmodified.
    pub async fn health_check(&self) -> Result<Response, RequestError> {
        self.pipeline.get("/").await
    }

    /// POST `/run` — submit code for execution.
    ///
    /// The payload shape (language, code, stdin, execution parameters)
    /// is opaque to the client.
    ///
    /// # Errors
    ///
    /// Propagates the pipeline outcome unmodified.
    pub async fn run_code(&self, payload: &Value) -> Result<Response, RequestError> {
        self.pipeline.post_json("/run", payload).await
    }

    /// GET `/session/images` — list available execution images.
    ///
    /// # Errors
    ///
    /// Propagates the pipeline outcome unmodified.
    pub async fn session_images(&self) -> Result<Response, RequestError> {
        self.pipeline.get("/session/images").await
    }

    /// POST `/session/create` — create an execution session.
    ///
    /// The payload (image selection, resource limits) and the returned
    /// session identifier are opaque to the client.
    ///
    /// # Errors
    ///
    /// Propagates the pipeline outcome unmodified.
    pub async fn create_session(&self, payload: &Value) -> Result<Response, RequestError> {
        self.pipeline.post_json("/session/create", payload).await
    }
}
