use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, error};

use common::error::ReasoningError;

use crate::reasoning::{FieldKind, OutputSchema, ReasoningRequest, ReasoningService};

fn get_gemini_base_url() -> String {
    env::var("GEMINI_BASE_URL")
        .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string())
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// Gemini `generateContent` with JSON output constrained by a response schema.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ReasoningError> {
        let client = Client::builder()
            .user_agent("tradebot/0.1.0")
            .timeout(timeout)
            .build()
            .map_err(|e| ReasoningError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: get_gemini_base_url(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

/// Translates our schema into Gemini's OpenAPI-style response schema.
pub(crate) fn to_gemini_schema(schema: &OutputSchema) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in &schema.fields {
        let property = match &field.kind {
            FieldKind::Text => json!({"type": "STRING"}),
            FieldKind::Number => json!({"type": "NUMBER"}),
            FieldKind::OneOf(values) => json!({"type": "STRING", "enum": values}),
        };
        properties.insert(field.name.to_string(), property);
        if field.required {
            required.push(field.name);
        }
    }

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": required,
        "propertyOrdering": schema.fields.iter().map(|f| f.name).collect::<Vec<_>>(),
    })
}

/// Pulls the JSON object out of the first candidate's text.
fn parse_candidate(response: GenerateContentResponse) -> Result<Value, ReasoningError> {
    let text = response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .find_map(|p| p.text)
        .ok_or(ReasoningError::EmptyResponse)?;

    let value: Value =
        serde_json::from_str(text.trim()).map_err(|e| ReasoningError::InvalidJson(e.to_string()))?;
    if !value.is_object() {
        return Err(ReasoningError::InvalidJson(format!(
            "expected an object, got {}",
            value
        )));
    }
    Ok(value)
}

#[async_trait]
impl ReasoningService for GeminiClient {
    async fn generate(&self, request: &ReasoningRequest) -> Result<Value, ReasoningError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: &request.system_instruction,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: to_gemini_schema(&request.schema),
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReasoningError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Gemini request failed: HTTP {}", status);
            return Err(ReasoningError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let decoded = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| ReasoningError::InvalidJson(e.to_string()))?;
        debug!("Gemini answered with {} candidates", decoded.candidates.len());

        parse_candidate(decoded)
    }
}
