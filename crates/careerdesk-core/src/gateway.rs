//! Mediates every call to the generative AI provider.
//!
//! Chat failures are folded into a friendly assistant reply so a conversation
//! never breaks visibly. Image failures are single-shot, so they come back as
//! an error with a user-presentable message.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::ai::{AiProvider, ChatTransport, ImageRequest, ProviderError};

pub const SYSTEM_INSTRUCTION: &str = "You are an AI assistant integrated into a web platform where companies can post jobs, and students can apply by uploading their resumes.
Your job is to assist with generating AI images, help users navigate the platform, and answer questions related to job applications and resume submissions.
Instructions for You:
1. Never allow access to AI image generation until the user is authenticated (This is handled by the app, but you should not offer to generate images if they claim they are not logged in).
2. Always respond in a friendly, helpful, and professional tone.
3. If a student asks how to apply, guide them to upload a resume and select the job they are interested in.
4. If a company asks how to post a job, guide them through the job posting form.
5. When asked for image generation, confirm the prompt and inform them to use the Image Generation tool on the platform.
6. If there’s an error, respond gracefully and suggest retrying.
You must always be helpful, accurate, and responsive at all times.";

pub const CHAT_FALLBACK: &str = "Sorry, I'm having trouble connecting. Please try again.";

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// What came back from one chat turn.
#[derive(Debug)]
pub enum ChatReply {
    Answer(String),
    /// The provider failed; the error is kept for logging only.
    Fallback(ProviderError),
}

impl ChatReply {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ChatReply::Fallback(_))
    }

    /// Text that goes into the transcript. Never the raw provider error.
    pub fn into_text(self) -> String {
        match self {
            ChatReply::Answer(text) => text,
            ChatReply::Fallback(_) => CHAT_FALLBACK.to_string(),
        }
    }
}

/// Both variants show the same message; they differ only in the logs.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Failed to generate image. Please check your prompt or try again later.")]
    NoImage,

    #[error("Failed to generate image. Please check your prompt or try again later.")]
    Failed(#[source] ProviderError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Opaque handle on a provider-side conversation.
pub struct ChatSessionHandle {
    id: u64,
    transport: Box<dyn ChatTransport>,
}

impl ChatSessionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl std::fmt::Debug for ChatSessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSessionHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct Gateway {
    provider: Arc<dyn AiProvider>,
    system_instruction: Arc<str>,
}

impl Gateway {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self {
            provider,
            system_instruction: Arc::from(SYSTEM_INSTRUCTION),
        }
    }

    pub fn create_chat_session(&self) -> ChatSessionHandle {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        tracing::info!(session = id, "chat session created");
        ChatSessionHandle {
            id,
            transport: self.provider.start_chat(&self.system_instruction),
        }
    }

    pub async fn send_chat_message(&self, session: &mut ChatSessionHandle, text: &str) -> ChatReply {
        match session.transport.send(text).await {
            Ok(reply) => ChatReply::Answer(reply),
            Err(e) => {
                tracing::warn!(session = session.id, error = %e, "chat turn failed, using fallback reply");
                ChatReply::Fallback(e)
            }
        }
    }

    pub async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ImageError> {
        let request = ImageRequest::square_jpeg(prompt);
        let images = self.provider.generate_images(&request).await.map_err(|e| {
            tracing::warn!(error = %e, "image generation failed");
            ImageError::Failed(e)
        })?;

        let first = images.into_iter().next().ok_or_else(|| {
            tracing::warn!("image generation returned no images");
            ImageError::NoImage
        })?;

        let bytes = STANDARD
            .decode(first.bytes_base64.as_bytes())
            .map_err(|e| ImageError::Failed(ProviderError::from(e)))?;

        Ok(GeneratedImage {
            bytes,
            mime_type: first.mime_type.unwrap_or(request.mime_type),
        })
    }
}
