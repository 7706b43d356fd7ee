//! Image request controller: one prompt, one in-flight generation.

use crate::gateway::{Gateway, GeneratedImage, ImageError};
use crate::session::MountId;

pub const EMPTY_PROMPT_ERROR: &str = "Please enter a prompt to generate an image.";
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageStatus {
    #[default]
    Idle,
    Loading,
    Ready,
}

/// Everything the image view renders. An error is shown whenever `error` is
/// set; a failed request leaves `status` at `Idle`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRequestState {
    pub prompt: String,
    pub status: ImageStatus,
    pub result: Option<GeneratedImage>,
    pub error: Option<String>,
}

pub struct PendingImage {
    mount: MountId,
    request: u64,
    gateway: Gateway,
    prompt: String,
}

impl PendingImage {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub async fn generate(self) -> ImageCompletion {
        let outcome = self.gateway.generate_image(&self.prompt).await;
        ImageCompletion {
            mount: self.mount,
            request: self.request,
            outcome,
        }
    }
}

pub struct ImageCompletion {
    mount: MountId,
    request: u64,
    outcome: Result<GeneratedImage, ImageError>,
}

pub struct ImageController {
    mount: MountId,
    gateway: Gateway,
    state: ImageRequestState,
    request_seq: u64,
}

impl ImageController {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            mount: MountId::next(),
            gateway,
            state: ImageRequestState::default(),
            request_seq: 0,
        }
    }

    pub fn state(&self) -> &ImageRequestState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state.status == ImageStatus::Loading
    }

    /// Sequence number of the latest accepted request (0 before the first).
    pub fn request_id(&self) -> u64 {
        self.request_seq
    }

    /// Validate and start a generation. `None` while loading (no-op) or when
    /// the prompt is blank (validation error set, nothing else touched).
    pub fn begin_submit(&mut self, prompt: &str) -> Option<PendingImage> {
        if self.is_loading() {
            return None;
        }

        if prompt.trim().is_empty() {
            self.state.error = Some(EMPTY_PROMPT_ERROR.to_string());
            return None;
        }

        self.request_seq += 1;
        self.state = ImageRequestState {
            prompt: prompt.to_string(),
            status: ImageStatus::Loading,
            result: None,
            error: None,
        };
        tracing::debug!(mount = ?self.mount, request = self.request_seq, "image request started");

        Some(PendingImage {
            mount: self.mount,
            request: self.request_seq,
            gateway: self.gateway.clone(),
            prompt: prompt.to_string(),
        })
    }

    pub fn complete(&mut self, completion: ImageCompletion) -> bool {
        if completion.mount != self.mount || completion.request != self.request_seq {
            tracing::debug!(
                request = completion.request,
                current = self.request_seq,
                "dropping stale image completion"
            );
            return false;
        }
        if !self.is_loading() {
            return false;
        }

        match completion.outcome {
            Ok(image) => {
                self.state.status = ImageStatus::Ready;
                self.state.result = Some(image);
            }
            Err(e) => self.fail(e.to_string()),
        }
        true
    }

    /// The in-flight request never came back.
    pub fn recover_lost_request(&mut self) {
        if self.is_loading() {
            tracing::error!(mount = ?self.mount, request = self.request_seq, "image request lost");
            self.fail(String::new());
        }
    }

    pub fn dismiss_error(&mut self) {
        self.state.error = None;
    }

    pub async fn submit(&mut self, prompt: &str) -> bool {
        match self.begin_submit(prompt) {
            Some(pending) => {
                let completion = pending.generate().await;
                self.complete(completion)
            }
            None => false,
        }
    }

    fn fail(&mut self, message: String) {
        self.state.status = ImageStatus::Idle;
        self.state.result = None;
        self.state.error = Some(if message.trim().is_empty() {
            UNEXPECTED_ERROR.to_string()
        } else {
            message
        });
    }
}
