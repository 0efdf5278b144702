use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::{ChatRequest, GenerateRequest, ModelBackend, TextStream};
use super::sse::SseDecoder;
use crate::error::GatewayError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    error: Option<GeminiErrorBody>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

impl GeminiContent {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![GeminiPart {
                text: Some(text.to_string()),
                thought: None,
            }],
        }
    }
}

/// HTTP client for the Gemini `generateContent` family of endpoints
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, base_url: &str) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn post(&self, url: &str, body: &GeminiRequest) -> Result<reqwest::Response, GatewayError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(GatewayError::MissingApiKey)?;

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api { status, body });
        }

        Ok(response)
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, GatewayError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, request.model
        );
        debug!(model = %request.model, "Gemini generate");

        let response = self.post(&url, &build_generate_body(&request)).await?;
        let body = response.text().await?;
        let parsed: GeminiResponse = serde_json::from_str(&body)?;
        require_text(response_text(parsed)?)
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<TextStream, GatewayError> {
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, request.model
        );
        debug!(
            model = %request.model,
            history = request.history.len(),
            thinking = request.thinking_budget.is_some(),
            "Gemini stream chat"
        );

        let response = self.post(&url, &build_chat_body(&request)).await?;
        let mut bytes = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            while let Some(read) = bytes.next().await {
                let chunk = match read {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!(error = %e, "Gemini stream read failed");
                        yield Err(GatewayError::Http(e));
                        return;
                    }
                };
                for payload in decoder.push(&chunk) {
                    match decode_event(&payload) {
                        Ok(Some(text)) => yield Ok(text),
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }
            if let Some(payload) = decoder.finish() {
                match decode_event(&payload) {
                    Ok(Some(text)) => yield Ok(text),
                    Ok(None) => {}
                    Err(e) => yield Err(e),
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

fn build_generate_body(request: &GenerateRequest) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent::text(Some("user"), &request.contents)],
        system_instruction: request
            .system_instruction
            .as_deref()
            .map(|s| GeminiContent::text(None, s)),
        generation_config: request.temperature.map(|temperature| GenerationConfig {
            temperature: Some(temperature),
            ..Default::default()
        }),
    }
}

fn build_chat_body(request: &ChatRequest) -> GeminiRequest {
    let mut contents: Vec<GeminiContent> = request
        .history
        .iter()
        .map(|turn| GeminiContent::text(Some(turn.role.as_str()), &turn.text))
        .collect();
    contents.push(GeminiContent::text(Some("user"), &request.message));

    GeminiRequest {
        contents,
        system_instruction: Some(GeminiContent::text(None, &request.system_instruction)),
        generation_config: request.thinking_budget.map(|budget| GenerationConfig {
            thinking_config: Some(ThinkingConfig {
                thinking_budget: budget,
            }),
            ..Default::default()
        }),
    }
}

/// Concatenate the visible text parts of the first candidate
fn response_text(response: GeminiResponse) -> Result<String, GatewayError> {
    if let Some(error) = response.error {
        return Err(GatewayError::Api {
            status: error.code,
            body: error.message,
        });
    }

    Ok(response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|p| p.thought != Some(true))
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default())
}

/// A whole generate call that produced no visible text is an error; callers
/// decide how to present it.
fn require_text(text: String) -> Result<String, GatewayError> {
    if text.trim().is_empty() {
        return Err(GatewayError::EmptyResponse);
    }
    Ok(text)
}

fn decode_event(payload: &str) -> Result<Option<String>, GatewayError> {
    let parsed: GeminiResponse = serde_json::from_str(payload)?;
    let text = response_text(parsed)?;
    Ok(if text.is_empty() { None } else { Some(text) })
}
