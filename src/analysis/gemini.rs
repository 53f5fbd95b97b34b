use anyhow::Context;
use axum::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::dto::CallAnalysis;
use crate::config::GeminiConfig;

/// Seam to the external LLM provider: an opaque collaborator that
/// either returns a `CallAnalysis` or fails.
#[async_trait]
pub trait TranscriptAnalyzer: Send + Sync {
    async fn analyze(&self, transcript: &str) -> anyhow::Result<CallAnalysis>;
}

pub struct GeminiAnalyzer {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiAnalyzer {
    /// Returns None when no API key is configured; the analysis
    /// endpoint then reports the service as unavailable while auth
    /// keeps working.
    pub fn from_config(config: &GeminiConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        Some(Self {
            http: reqwest::Client::new(),
            api_key,
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
        })
    }
}

fn build_prompt(transcript: &str) -> String {
    format!(
        r#"Analyze the following transcribed call conversation.
Based on the content, provide a detailed analysis covering the call's theme, sentiment,
identified problems, proposed solutions, any action items, and a final summary.

Return your response as a JSON object with this exact structure:
{{
  "theme": {{
    "classification": "string - category of the call",
    "reasoning": "string - why this classification was chosen"
  }},
  "sentiment": {{
    "polarity": "Positive|Negative|Neutral",
    "tones": ["array", "of", "emotional", "tones"]
  }},
  "problems": ["array", "of", "identified", "problems"],
  "solutions": ["array", "of", "proposed", "solutions"],
  "actionItems": ["array", "of", "next", "steps"],
  "summary": "string - concise paragraph summary"
}}

Transcript to analyze:
---
{transcript}
---
"#
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// Pulls the first candidate's text out of a generateContent response
/// and parses it as the fixed analysis shape.
fn parse_response(body: GenerateResponse) -> anyhow::Result<CallAnalysis> {
    let text = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text)
        .context("empty response from model")?;
    serde_json::from_str(&text).context("model returned malformed analysis JSON")
}

#[async_trait]
impl TranscriptAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, transcript: &str) -> anyhow::Result<CallAnalysis> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(transcript),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".into(),
            },
        };

        debug!(model = %self.model, transcript_len = transcript.len(), "calling gemini");
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("gemini request failed")?
            .error_for_status()
            .context("gemini returned an error status")?;

        let body: GenerateResponse = response
            .json()
            .await
            .context("gemini response was not valid JSON")?;
        parse_response(body)
    }
}
