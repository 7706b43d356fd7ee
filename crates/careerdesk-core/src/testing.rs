//! In-memory provider used by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::ai::{AiProvider, ChatTransport, ImageRequest, ProviderError, ProviderImage};

#[derive(Debug, Clone, Copy)]
pub(crate) enum ChatScript {
    Echo,
    Fail,
    /// Every second call fails.
    Alternate,
}

#[derive(Debug, Clone)]
pub(crate) enum ImageScript {
    Bytes(Vec<u8>),
    Raw(String),
    Empty,
    Fail,
}

pub(crate) struct FakeProvider {
    chat: ChatScript,
    images: ImageScript,
    chat_calls: Arc<AtomicUsize>,
    instructions: Mutex<Vec<String>>,
    image_requests: Mutex<Vec<ImageRequest>>,
}

impl FakeProvider {
    fn build(chat: ChatScript, images: ImageScript) -> Arc<Self> {
        Arc::new(Self {
            chat,
            images,
            chat_calls: Arc::new(AtomicUsize::new(0)),
            instructions: Mutex::new(Vec::new()),
            image_requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn echo() -> Arc<Self> {
        Self::build(ChatScript::Echo, ImageScript::Empty)
    }

    pub(crate) fn failing_chat() -> Arc<Self> {
        Self::build(ChatScript::Fail, ImageScript::Empty)
    }

    pub(crate) fn alternating_chat() -> Arc<Self> {
        Self::build(ChatScript::Alternate, ImageScript::Empty)
    }

    pub(crate) fn with_images(images: ImageScript) -> Arc<Self> {
        Self::build(ChatScript::Echo, images)
    }

    pub(crate) fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn system_instructions(&self) -> Vec<String> {
        self.instructions.lock().unwrap().clone()
    }

    pub(crate) fn image_requests(&self) -> Vec<ImageRequest> {
        self.image_requests.lock().unwrap().clone()
    }
}

struct FakeChat {
    script: ChatScript,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ChatTransport for FakeChat {
    async fn send(&mut self, text: &str) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let fail = match self.script {
            ChatScript::Echo => false,
            ChatScript::Fail => true,
            ChatScript::Alternate => call % 2 == 0,
        };
        if fail {
            Err(ProviderError::Api {
                status: 503,
                message: "model overloaded".to_string(),
            })
        } else {
            Ok(format!("echo: {}", text))
        }
    }
}

#[async_trait]
impl AiProvider for FakeProvider {
    fn start_chat(&self, system_instruction: &str) -> Box<dyn ChatTransport> {
        self.instructions
            .lock()
            .unwrap()
            .push(system_instruction.to_string());
        Box::new(FakeChat {
            script: self.chat,
            calls: self.chat_calls.clone(),
        })
    }

    async fn generate_images(
        &self,
        request: &ImageRequest,
    ) -> Result<Vec<ProviderImage>, ProviderError> {
        self.image_requests.lock().unwrap().push(request.clone());
        match &self.images {
            ImageScript::Bytes(bytes) => Ok(vec![ProviderImage {
                bytes_base64: STANDARD.encode(bytes),
                mime_type: None,
            }]),
            ImageScript::Raw(raw) => Ok(vec![ProviderImage {
                bytes_base64: raw.clone(),
                mime_type: Some("image/jpeg".to_string()),
            }]),
            ImageScript::Empty => Ok(Vec::new()),
            ImageScript::Fail => Err(ProviderError::Api {
                status: 400,
                message: "bad prompt".to_string(),
            }),
        }
    }
}
