//! Provider seam for the generative AI backend.
//!
//! The gateway only talks to these traits, so tests can swap in an
//! in-memory provider without a network.

pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a provider before the gateway applies its policy.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("prompt was blocked: {0}")]
    Blocked(String),

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("invalid image payload: {0}")]
    InvalidPayload(#[from] base64::DecodeError),
}

/// One conversation held open on the provider side.
#[async_trait]
pub trait ChatTransport: Send {
    /// Send one user turn and wait for the assistant turn.
    async fn send(&mut self, text: &str) -> Result<String, ProviderError>;
}

/// Parameters for a single image synthesis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub count: u32,
    pub mime_type: String,
    pub aspect_ratio: String,
}

impl ImageRequest {
    /// One square JPEG, the only shape the app asks for.
    pub fn square_jpeg(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            count: 1,
            mime_type: "image/jpeg".to_string(),
            aspect_ratio: "1:1".to_string(),
        }
    }
}

/// An image as the provider returned it, still base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderImage {
    pub bytes_base64: String,
    pub mime_type: Option<String>,
}

#[async_trait]
pub trait AiProvider: Send + Sync {
    fn start_chat(&self, system_instruction: &str) -> Box<dyn ChatTransport>;

    async fn generate_images(
        &self,
        request: &ImageRequest,
    ) -> Result<Vec<ProviderImage>, ProviderError>;
}
