use std::sync::Mutex;

use async_trait::async_trait;

use super::{ImageClient, ImageError};

/// Returns the same bytes for every prompt and records `(prompt, size)`.
pub struct MockImageClient {
    image: Vec<u8>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockImageClient {
    pub fn new(image: impl Into<Vec<u8>>) -> Self {
        Self {
            image: image.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for MockImageClient {
    fn default() -> Self {
        Self::new(b"mock image bytes".to_vec())
    }
}

#[async_trait]
impl ImageClient for MockImageClient {
    async fn generate_image(&self, prompt: &str, size: &str) -> Result<Vec<u8>, ImageError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((prompt.to_string(), size.to_string()));
        }
        Ok(self.image.clone())
    }
}
