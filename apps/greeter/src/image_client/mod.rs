/// Image generation: the [`ImageClient`] trait and its OpenAI Images adapter.
use async_trait::async_trait;
use base64::prelude::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::llm_client::provider_error;

pub mod mock;

pub use mock::MockImageClient;

const OPENAI_IMAGES_URL: &str = "https://api.openai.com/v1/images/generations";
const REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Image API returned no image data")]
    EmptyData,

    #[error("Invalid base64 image payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Image processing failed: {0}")]
    Codec(#[from] image::ImageError),
}

/// Renders a prompt into raw image bytes (PNG for the OpenAI adapter).
#[async_trait]
pub trait ImageClient: Send + Sync {
    async fn generate_image(&self, prompt: &str, size: &str) -> Result<Vec<u8>, ImageError>;
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: u8,
    quality: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiImageClient {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiImageClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ImageClient for OpenAiImageClient {
    async fn generate_image(&self, prompt: &str, size: &str) -> Result<Vec<u8>, ImageError> {
        debug!("Image prompt: {prompt}");

        let request = ImageRequest {
            model: &self.model,
            prompt,
            size,
            n: 1,
            quality: "auto",
        };

        let response = self
            .client
            .post(OPENAI_IMAGES_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message) = provider_error(response).await;
            return Err(ImageError::Api { status, message });
        }

        let body: ImageResponse = response.json().await?;
        decode_first_image(body)
    }
}

fn decode_first_image(body: ImageResponse) -> Result<Vec<u8>, ImageError> {
    let encoded = body
        .data
        .into_iter()
        .find_map(|d| d.b64_json)
        .ok_or(ImageError::EmptyData)?;
    Ok(BASE64_STANDARD.decode(encoded.as_bytes())?)
}
