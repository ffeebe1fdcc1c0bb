//! HTTP inference backend.
//!
//! Posts the image as `multipart/form-data` (field `theImage`) to the
//! inference route and decodes `{ "body": DetectedObject[] }`.
//!
//! The backend is responsible for:
//! - Building one request per call, with the image's file name and content type
//! - Classifying failures as status, transport, or decode errors
//!
//! The backend MUST NOT:
//! - Retry failed requests
//! - Parse error bodies of non-success responses
//! - Log image bytes

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{multipart, Client};
use std::time::Duration;
use url::Url;

use crate::detect::backend::{IdentifyError, InferenceBackend};
use crate::detect::result::{DetectedObject, InferenceResponse};
use crate::image_source::ImageSource;

/// Multipart field carrying the image bytes.
pub const IMAGE_FIELD: &str = "theImage";

/// Configuration for the HTTP backend.
#[derive(Clone, Debug)]
pub struct HttpBackendConfig {
    /// Full URL of the inference route (e.g. "http://127.0.0.1:3000/api").
    pub endpoint: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3000/api".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct HttpInferenceClient {
    endpoint: Url,
    client: Client,
}

impl HttpInferenceClient {
    pub fn new(config: HttpBackendConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .with_context(|| format!("parse inference endpoint {}", config.endpoint))?;
        match endpoint.scheme() {
            "http" | "https" => {}
            other => {
                return Err(anyhow!(
                    "unsupported endpoint scheme '{}'; expected http(s)",
                    other
                ))
            }
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("build http client")?;
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn form_for(image: &ImageSource) -> Result<multipart::Form, IdentifyError> {
        let part = multipart::Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name().to_string())
            .mime_str(image.content_type())
            .map_err(|e| IdentifyError::Transport(format!("invalid content type: {}", e)))?;
        Ok(multipart::Form::new().part(IMAGE_FIELD, part))
    }
}

impl InferenceBackend for HttpInferenceClient {
    fn name(&self) -> &'static str {
        "http"
    }

    fn identify(&self, image: &ImageSource) -> Result<Vec<DetectedObject>, IdentifyError> {
        let form = Self::form_for(image)?;
        log::debug!(
            "posting image {} ({} bytes) to {}",
            image.digest(),
            image.len(),
            self.endpoint
        );
        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .map_err(|e| IdentifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentifyError::Status(status.as_u16()));
        }

        let parsed: InferenceResponse = response
            .json()
            .map_err(|e| IdentifyError::Decode(e.to_string()))?;
        Ok(parsed.body)
    }
}
