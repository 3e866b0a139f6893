//! Generative AI client
//!
//! Talks to the Gemini `generateContent` REST endpoint and serves both the suggestion
//! generator and the noise classifier. Every prompt asks for a JSON reply, which is parsed
//! from the first text part of the first candidate.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use errors::{NoiseError, NoiseResult};
use noise_core::{AudioSample, Classifier, ClassifierResult, Suggestion, SuggestionGenerator};

use crate::prompts;

const SERVICE: &str = "genai";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenAiConfig {
    pub base_url: String,
    pub model: String,
    /// Sent as `x-goog-api-key`; requests go out without it when unset
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            inline_data: None,
        }
    }

    fn audio(sample: &AudioSample) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: sample.mime_type.clone(),
                data: STANDARD.encode(&sample.data),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SuggestionsPayload {
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifierPayload {
    List(Vec<ClassifierResult>),
    Wrapped { results: Vec<ClassifierResult> },
}

// ============================================================================
// Client
// ============================================================================

#[derive(Clone)]
pub struct GenAiClient {
    config: GenAiConfig,
    client: Client,
}

impl GenAiClient {
    pub fn new(config: GenAiConfig) -> NoiseResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GenAiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn generate<T: DeserializeOwned>(&self, parts: Vec<Part>) -> NoiseResult<T> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(ref key) = self.config.api_key {
            request = request.header("x-goog-api-key", key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NoiseError::Timeout(SERVICE.to_string())
            } else {
                NoiseError::from(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!("Generative service returned {}", status);
            return Err(NoiseError::service(
                SERVICE,
                format!("HTTP {}: {}", status.as_u16(), truncate(&detail, 200)),
            ));
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(|e| NoiseError::invalid_response(SERVICE, e.to_string()))?;
        let text = first_text(&reply)
            .ok_or_else(|| NoiseError::invalid_response(SERVICE, "no text in response"))?;
        debug!("Generative reply: {} bytes", text.len());

        serde_json::from_str(strip_fences(text))
            .map_err(|e| NoiseError::invalid_response(SERVICE, e.to_string()))
    }
}

fn first_text(reply: &GenerateResponse) -> Option<&str> {
    reply
        .candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|c| c.parts.iter())
        .find_map(|p| p.text.as_deref())
}

/// Models occasionally wrap JSON in a markdown code fence
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => rest
            .trim_start_matches("json")
            .trim_end_matches("```")
            .trim(),
        None => trimmed,
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl SuggestionGenerator for GenAiClient {
    async fn suggest_general(&self) -> NoiseResult<Vec<Suggestion>> {
        let payload: SuggestionsPayload = self
            .generate(vec![Part::text(prompts::general_suggestions())])
            .await?;
        Ok(payload.suggestions)
    }

    async fn suggest_for_condition(
        &self,
        noise_type: &str,
        level: u8,
    ) -> NoiseResult<Vec<Suggestion>> {
        let payload: SuggestionsPayload = self
            .generate(vec![Part::text(prompts::condition_suggestions(
                noise_type, level,
            ))])
            .await?;
        Ok(payload.suggestions)
    }
}

#[async_trait]
impl Classifier for GenAiClient {
    async fn classify(&self, sample: &AudioSample) -> NoiseResult<Vec<ClassifierResult>> {
        if sample.is_empty() {
            return Err(NoiseError::AudioEncoding("empty audio sample".to_string()));
        }

        let payload: ClassifierPayload = self
            .generate(vec![Part::text(prompts::classification()), Part::audio(sample)])
            .await?;

        Ok(match payload {
            ClassifierPayload::List(results) | ClassifierPayload::Wrapped { results } => results,
        })
    }
}
