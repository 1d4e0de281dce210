use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::chart::ChartImage;
use crate::config::GeminiConfig;

/// Failures from the generative-AI service.
///
/// `Api` is reported to users as a Gemini API error; everything else is an
/// unknown error.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The service answered with a structured error (quota, invalid request, ...)
    #[error("{code} {status}. {message}")]
    Api {
        code: u16,
        status: String,
        message: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A multimodal model that can analyze a chart image.
#[async_trait]
pub trait ChartAnalyzer: Send + Sync {
    async fn generate_content(&self, image: &ChartImage, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            api_key: api_key.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl ChartAnalyzer for GeminiClient {
    async fn generate_content(&self, image: &ChartImage, prompt: &str) -> Result<String, LlmError> {
        let request = build_request(image, prompt, self.config.max_output_tokens);
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.effective_base_url(),
            self.config.model
        );

        debug!("Sending request to Gemini: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Gemini")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(parse_api_error(status, &error_body));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        extract_text(body)
    }
}

fn build_request(
    image: &ChartImage,
    prompt: &str,
    max_output_tokens: Option<u32>,
) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![
                Part {
                    inline_data: Some(InlineData {
                        mime_type: image.mime_type().to_string(),
                        data: general_purpose::STANDARD.encode(image.bytes()),
                    }),
                    ..Default::default()
                },
                Part {
                    text: Some(prompt.to_string()),
                    ..Default::default()
                },
            ],
        }],
        generation_config: max_output_tokens.map(|max_output_tokens| GenerationConfig {
            max_output_tokens,
        }),
    }
}

fn parse_api_error(status: reqwest::StatusCode, body: &str) -> LlmError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => LlmError::Api {
            code: envelope.error.code.unwrap_or(status.as_u16()),
            status: envelope
                .error
                .status
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("UNKNOWN").to_string()),
            message: envelope.error.message,
        },
        Err(_) => LlmError::Api {
            code: status.as_u16(),
            status: status.canonical_reason().unwrap_or("UNKNOWN").to_string(),
            message: body.trim().to_string(),
        },
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, LlmError> {
    let block_reason = response
        .prompt_feedback
        .and_then(|f| f.block_reason);

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = block_reason.unwrap_or_else(|| "no candidates".to_string());
        return Err(anyhow::anyhow!("Gemini returned no analysis ({})", reason).into());
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.trim().is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "empty response".to_string());
        return Err(anyhow::anyhow!("Gemini returned no analysis ({})", reason).into());
    }

    Ok(text)
}
