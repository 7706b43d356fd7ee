use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{AiProvider, ChatTransport, ImageRequest, ProviderError, ProviderImage};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![GeminiPart {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: &'a GeminiContent,
    contents: &'a [GeminiContent],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Serialize)]
struct PredictInstance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputOptions<'a> {
    mime_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters<'a> {
    sample_count: u32,
    aspect_ratio: &'a str,
    output_options: OutputOptions<'a>,
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: Vec<PredictInstance<'a>>,
    parameters: PredictParameters<'a>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

/// Client for the Generative Language REST API (Gemini chat, Imagen images).
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_chat_model(mut self, model: &str) -> Self {
        self.chat_model = model.to_string();
        self
    }

    pub fn with_image_model(mut self, model: &str) -> Self {
        self.image_model = model.to_string();
        self
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    pub fn image_model(&self) -> &str {
        &self.image_model
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, model, method)
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: api_error_message(&text)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl AiProvider for GeminiClient {
    fn start_chat(&self, system_instruction: &str) -> Box<dyn ChatTransport> {
        Box::new(GeminiChat {
            client: self.clone(),
            system_instruction: GeminiContent::text(None, system_instruction),
            history: Vec::new(),
        })
    }

    async fn generate_images(
        &self,
        request: &ImageRequest,
    ) -> Result<Vec<ProviderImage>, ProviderError> {
        let body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: &request.prompt,
            }],
            parameters: PredictParameters {
                sample_count: request.count,
                aspect_ratio: &request.aspect_ratio,
                output_options: OutputOptions {
                    mime_type: &request.mime_type,
                },
            },
        };

        let url = self.model_url(&self.image_model, "predict");
        tracing::debug!(model = %self.image_model, "requesting image generation");
        let response: PredictResponse = self.post_json(&url, &body).await?;
        Ok(collect_images(response))
    }
}

/// A chat session; the provider is stateless so the history lives here.
struct GeminiChat {
    client: GeminiClient,
    system_instruction: GeminiContent,
    history: Vec<GeminiContent>,
}

#[async_trait]
impl ChatTransport for GeminiChat {
    async fn send(&mut self, text: &str) -> Result<String, ProviderError> {
        let user_turn = GeminiContent::text(Some("user"), text);
        let mut contents = self.history.clone();
        contents.push(user_turn.clone());

        let body = GenerateContentRequest {
            system_instruction: &self.system_instruction,
            contents: &contents,
        };
        let url = self
            .client
            .model_url(&self.client.chat_model, "generateContent");
        tracing::debug!(
            model = %self.client.chat_model,
            turns = contents.len(),
            "sending chat turn"
        );
        let response: GenerateContentResponse = self.client.post_json(&url, &body).await?;
        let reply = reply_text(&response)?;

        // History only grows on a usable reply
        self.history.push(user_turn);
        self.history.push(GeminiContent::text(Some("model"), &reply));
        Ok(reply)
    }
}

fn reply_text(response: &GenerateContentResponse) -> Result<String, ProviderError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_ref())
    {
        return Err(ProviderError::Blocked(reason.clone()));
    }

    let candidate = response
        .candidates
        .first()
        .ok_or(ProviderError::EmptyResponse)?;

    let text: String = candidate
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .collect();

    if !text.is_empty() {
        return Ok(text);
    }

    match candidate.finish_reason.as_deref() {
        Some(reason) if reason != "STOP" => Err(ProviderError::Blocked(reason.to_string())),
        _ => Err(ProviderError::EmptyResponse),
    }
}

fn collect_images(response: PredictResponse) -> Vec<ProviderImage> {
    response
        .predictions
        .into_iter()
        .filter_map(|p| {
            p.bytes_base64_encoded.map(|bytes| ProviderImage {
                bytes_base64: bytes,
                mime_type: p.mime_type,
            })
        })
        .collect()
}

fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .map(|e| e.error.message)
        .or_else(|| {
            let body = body.trim();
            if body.is_empty() {
                None
            } else if body.chars().count() > 300 {
                Some(format!("{}...", body.chars().take(300).collect::<String>()))
            } else {
                Some(body.to_string())
            }
        })
}
