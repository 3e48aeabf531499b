//! HTTP transport for the generation backend.
//!
//! ARCHITECTURAL RULE: the lifecycle controller never touches `reqwest`
//! directly. All backend calls go through the [`GenerateApi`] trait so tests
//! can substitute a scripted transport.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use thiserror::Error;

use crate::config::Config;

/// Path of the single backend endpoint this client talks to.
const GENERATE_EMAIL_PATH: &str = "/generate-email";

/// The user-attached resume file. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub file_name: String,
    /// MIME type as reported by the file picker.
    pub content_type: String,
    pub bytes: Bytes,
}

impl ResumeFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Raw settle of a backend call: HTTP status plus undecoded body.
/// Decoding (and the `parsing` progress stage) belongs to the controller.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failure (DNS, connect, TLS, aborted body).
/// Non-2xx statuses are NOT transport errors; they settle as [`RawResponse`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError(err.to_string())
    }
}

/// Seam between the lifecycle controller and the network.
#[async_trait]
pub trait GenerateApi: Send + Sync {
    /// Posts `job_url` + `resume` as multipart form data and returns the raw
    /// settle. Exactly one attempt; retry policy is the caller's concern.
    async fn generate_email(
        &self,
        job_url: &str,
        resume: &ResumeFile,
    ) -> Result<RawResponse, TransportError>;
}

/// Production transport backed by `reqwest`.
pub struct HttpGenerateApi {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGenerateApi {
    /// The overall deadline is enforced by the controller, so the client is
    /// built without a request timeout of its own.
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::builder()
                .build()
                .expect("Failed to build HTTP client"),
            endpoint: endpoint_url(&config.api_base_url),
        }
    }
}

fn endpoint_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), GENERATE_EMAIL_PATH)
}

#[async_trait]
impl GenerateApi for HttpGenerateApi {
    async fn generate_email(
        &self,
        job_url: &str,
        resume: &ResumeFile,
    ) -> Result<RawResponse, TransportError> {
        let part = Part::bytes(resume.bytes.to_vec())
            .file_name(resume.file_name.clone())
            .mime_str(&resume.content_type)?;
        let form = Form::new()
            .text("job_url", job_url.to_string())
            .part("resume", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(RawResponse { status, body })
    }
}
