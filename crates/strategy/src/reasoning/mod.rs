//! Boundary to the external structured-output inference service used for
//! both signal classification and risk evaluation.

use async_trait::async_trait;
use serde_json::Value;

use common::error::ReasoningError;

pub mod gemini;
pub mod scripted;

pub use gemini::GeminiClient;
pub use scripted::ScriptedReasoning;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Number,
    OneOf(Vec<&'static str>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// Shape of the JSON object the service must answer with, independent of
/// how a particular vendor encodes response schemas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputSchema {
    pub fields: Vec<SchemaField>,
}

impl OutputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.fields.push(SchemaField {
            name,
            kind,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.fields.push(SchemaField {
            name,
            kind,
            required: false,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningRequest {
    pub system_instruction: String,
    pub prompt: String,
    pub schema: OutputSchema,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Returns the JSON object produced for `request`.
    async fn generate(&self, request: &ReasoningRequest) -> Result<Value, ReasoningError>;
}
