//! Gemini-backed evaluator
//!
//! Implements the Evaluator capability over the generateContent REST API.
//! The judge is asked for a JSON object carrying the five rubric
//! dimensions; the reply text is scanned for the outermost JSON object
//! since models occasionally wrap it in prose.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::capability::{CapabilityError, Evaluator};
use crate::domain::{Payload, Score, ScoreSet};

/// Gemini API base URL
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default judge model
const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";

/// Environment variable holding the API key
const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Configuration for the Gemini evaluator
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub model: String,
    pub timeout: Duration,
    pub api_base: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
            api_base: GEMINI_API_BASE.to_string(),
        }
    }
}

impl GeminiConfig {
    /// Create a config with a specific judge model
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Evaluator speaking the Gemini generateContent API
pub struct GeminiEvaluator {
    client: Client,
    api_key: String,
    config: GeminiConfig,
}

impl GeminiEvaluator {
    /// Create an evaluator reading GOOGLE_API_KEY from the environment
    pub fn new(config: GeminiConfig) -> Result<Self, CapabilityError> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| CapabilityError::InvalidInput(format!("{} not set", API_KEY_ENV)))?;
        Self::with_api_key(api_key, config)
    }

    /// Create an evaluator with an explicit API key
    pub fn with_api_key(
        api_key: impl Into<String>,
        config: GeminiConfig,
    ) -> Result<Self, CapabilityError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(CapabilityError::Network)?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base, self.config.model
        )
    }

    /// Build the request body: rubric instructions followed by both
    /// payloads as parts (text inline, images as base64 inline_data)
    fn build_request(&self, left: &Payload, right: &Payload, rubric_id: &str) -> Value {
        let mut parts = vec![json!({ "text": instructions(rubric_id) })];
        parts.push(json!({ "text": "Item A (earlier):" }));
        parts.push(payload_part(left));
        parts.push(json!({ "text": "Item B (later):" }));
        parts.push(payload_part(right));

        json!({
            "contents": [{ "parts": parts }],
            "generationConfig": { "temperature": 0.0 }
        })
    }

    /// Pull the five-score JSON out of the response envelope
    fn parse_response(&self, body: Value) -> Result<ScoreSet, CapabilityError> {
        let mut text = String::new();
        let parts = body["candidates"][0]["content"]["parts"].as_array().ok_or_else(|| {
            CapabilityError::InvalidResponse("response has no candidate parts".to_string())
        })?;
        for part in parts {
            if let Some(t) = part["text"].as_str() {
                text.push_str(t);
            }
        }

        let json_str = extract_json_object(&text).ok_or_else(|| {
            CapabilityError::InvalidResponse("no JSON object in judge reply".to_string())
        })?;
        let wire: WireScoreSet = serde_json::from_str(json_str)
            .map_err(|e| CapabilityError::InvalidResponse(format!("bad score JSON: {}", e)))?;
        Ok(wire.into())
    }

    async fn send_request(&self, body: Value) -> Result<Value, CapabilityError> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CapabilityError::Timeout(self.config.timeout)
                } else {
                    CapabilityError::Network(e)
                }
            })?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(30);
            return Err(CapabilityError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(CapabilityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| CapabilityError::InvalidResponse(format!("non-JSON body: {}", e)))
    }
}

impl std::fmt::Debug for GeminiEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiEvaluator")
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Evaluator for GeminiEvaluator {
    async fn evaluate(
        &self,
        left: &Payload,
        right: &Payload,
        rubric_id: &str,
    ) -> Result<ScoreSet, CapabilityError> {
        let body = self.build_request(left, right, rubric_id);
        let response = self.send_request(body).await?;
        self.parse_response(response)
    }
}

/// One payload as a generateContent part
fn payload_part(payload: &Payload) -> Value {
    match payload {
        Payload::Text(text) => json!({ "text": text }),
        Payload::Image(bytes) => json!({
            "inline_data": {
                "mime_type": "image/png",
                "data": BASE64.encode(bytes)
            }
        }),
    }
}

/// Judge instructions for a rubric id
fn instructions(rubric_id: &str) -> String {
    let focus = match rubric_id {
        "cross-modal-v1" => "Item B was generated directly from Item A in a single \
             transformation step across modalities. Judge how faithfully B renders A.",
        "intra-text-v1" => "Both items are texts from different points of an iterative \
             transformation loop. Judge how much meaning survived between them.",
        "intra-image-v1" => "Both items are images from different points of an iterative \
             transformation loop. Judge how much visual meaning survived between them.",
        _ => "Judge the semantic correspondence between the two items.",
    };
    format!(
        "You are an expert judge of semantic correspondence between artifacts.\n{}\n\
         Score each dimension from 1.0 (no correspondence) to 10.0 (identical), one decimal.\n\
         Reply with exactly one JSON object of the form:\n\
         {{\"content_correspondence\": {{\"score\": 0.0, \"justification\": \"...\"}},\n\
          \"compositional_alignment\": {{\"score\": 0.0, \"justification\": \"...\"}},\n\
          \"fidelity_completeness\": {{\"score\": 0.0, \"justification\": \"...\"}},\n\
          \"stylistic_congruence\": {{\"score\": 0.0, \"justification\": \"...\"}},\n\
          \"semantic_intent\": {{\"score\": 0.0, \"justification\": \"...\"}}}}",
        focus
    )
}

/// Slice the outermost JSON object from free-form reply text
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[derive(Debug, Deserialize)]
struct WireScore {
    score: f64,
    justification: String,
}

#[derive(Debug, Deserialize)]
struct WireScoreSet {
    content_correspondence: WireScore,
    compositional_alignment: WireScore,
    fidelity_completeness: WireScore,
    stylistic_congruence: WireScore,
    semantic_intent: WireScore,
}

impl From<WireScore> for Score {
    fn from(w: WireScore) -> Self {
        Score::new(w.score, w.justification)
    }
}

impl From<WireScoreSet> for ScoreSet {
    fn from(w: WireScoreSet) -> Self {
        ScoreSet {
            content_correspondence: w.content_correspondence.into(),
            compositional_alignment: w.compositional_alignment.into(),
            fidelity_completeness: w.fidelity_completeness.into(),
            stylistic_congruence: w.stylistic_congruence.into(),
            semantic_intent: w.semantic_intent.into(),
        }
    }
}
