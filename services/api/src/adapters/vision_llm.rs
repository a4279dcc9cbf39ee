//! services/api/src/adapters/vision_llm.rs
//!
//! This module contains the adapter for the image-understanding LLM.
//! It implements the `VisionAnalysisService` port from the `core` crate.

use std::sync::LazyLock;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessageContentPartImageArgs, ChatCompletionRequestMessageContentPartTextArgs,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrlArgs,
    },
    Client,
};
use async_trait::async_trait;
use carbon_lens_core::domain::{AnalyzedObject, Category};
use carbon_lens_core::ports::{PortError, PortResult, VisionAnalysisService};
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

const SYSTEM_INSTRUCTIONS: &str = "You are a sustainability assistant that identifies items in photos and estimates their carbon footprint. You answer with machine-readable JSON only.";

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("code fence pattern is valid"));

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `VisionAnalysisService` using an OpenAI-compatible vision model.
#[derive(Clone)]
pub struct OpenAiVisionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiVisionAdapter {
    /// Creates a new `OpenAiVisionAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// Response Parsing
//=========================================================================================

#[derive(Debug, Deserialize)]
struct RawObject {
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default, alias = "carbonKg", alias = "carbon")]
    carbon_kg: f64,
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VisionPayload {
    List(Vec<RawObject>),
    Wrapped { objects: Vec<RawObject> },
}

impl RawObject {
    fn into_domain(self) -> Option<AnalyzedObject> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        let carbon = if self.carbon_kg.is_finite() {
            Decimal::from_f64(self.carbon_kg).unwrap_or_default().round_dp(3)
        } else {
            Decimal::ZERO
        };
        let object = AnalyzedObject::new(name, Category::parse_lossy(&self.category), carbon);
        Some(match self.confidence {
            Some(confidence) => object.with_confidence(confidence),
            None => object,
        })
    }
}

/// Extracts the analyzed objects from the model's text answer.
///
/// Accepts a bare JSON array, an `{"objects": [...]}` wrapper, and either of
/// those inside a markdown code fence.
pub fn parse_objects(text: &str) -> PortResult<Vec<AnalyzedObject>> {
    let body = CODE_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text.trim(), |m| m.as_str());

    let payload: VisionPayload = serde_json::from_str(body)
        .map_err(|e| PortError::Unexpected(format!("Vision response was not valid JSON: {}", e)))?;
    let raw = match payload {
        VisionPayload::List(objects) | VisionPayload::Wrapped { objects } => objects,
    };
    Ok(raw.into_iter().filter_map(RawObject::into_domain).collect())
}

//=========================================================================================
// `VisionAnalysisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl VisionAnalysisService for OpenAiVisionAdapter {
    /// Sends the image as a data URL alongside the instruction and parses the JSON answer.
    async fn analyze(&self, image_base64: &str, instruction: &str) -> PortResult<Vec<AnalyzedObject>> {
        let image_url = ImageUrlArgs::default()
            .url(format!("data:image/jpeg;base64,{}", image_base64))
            .detail(ImageDetail::Auto)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(vec![
                    ChatCompletionRequestMessageContentPartTextArgs::default()
                        .text(instruction)
                        .build()
                        .map_err(|e| PortError::Unexpected(e.to_string()))?
                        .into(),
                    ChatCompletionRequestMessageContentPartImageArgs::default()
                        .image_url(image_url)
                        .build()
                        .map_err(|e| PortError::Unexpected(e.to_string()))?
                        .into(),
                ])
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unavailable(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Vision LLM response contained no text content.".to_string())
            })?;

        parse_objects(&content)
    }
}

//=========================================================================================
// Disabled Adapter
//=========================================================================================

/// Stands in when no API key is configured; every call reports `Unavailable`.
#[derive(Clone, Default)]
pub struct DisabledVisionAdapter;

#[async_trait]
impl VisionAnalysisService for DisabledVisionAdapter {
    async fn analyze(&self, _image_base64: &str, _instruction: &str) -> PortResult<Vec<AnalyzedObject>> {
        Err(PortError::Unavailable("OPENAI_API_KEY is not configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_bare_array() {
        let objects = parse_objects(
            r#"[{"name": "Banana", "category": "food", "carbon_kg": 0.11, "confidence": 0.93},
                {"name": "Plastic tray", "category": "packaging", "carbonKg": 0.05}]"#,
        )
        .unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].category, Category::Food);
        assert_eq!(objects[0].carbon_kg, Decimal::new(11, 2));
        assert_eq!(objects[0].confidence, Some(0.93));
        assert_eq!(objects[1].carbon_kg, Decimal::new(5, 2));
    }

    #[test]
    fn parses_fenced_and_wrapped_answers() {
        let text = "Here you go:\n```json\n{\"objects\": [{\"name\": \"Jeans\", \"category\": \"Apparel\", \"carbon\": 33.4}]}\n```";
        let objects = parse_objects(text).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].category, Category::Clothing);
        assert_eq!(objects[0].carbon_kg, Decimal::new(334, 1));
    }

    #[test]
    fn drops_nameless_items_and_clamps_values() {
        let objects = parse_objects(
            r#"[{"name": "  ", "carbon_kg": 1.0}, {"name": "Mystery", "category": "alien", "carbon_kg": -2, "confidence": 4.0}]"#,
        )
        .unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].category, Category::Other);
        assert_eq!(objects[0].carbon_kg, Decimal::ZERO);
        assert_eq!(objects[0].confidence, Some(1.0));
    }

    #[test]
    fn empty_array_is_valid_and_prose_is_an_error() {
        assert!(parse_objects("[]").unwrap().is_empty());
        assert!(matches!(parse_objects("I see a cat."), Err(PortError::Unexpected(_))));
    }
}
