use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub transcript: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis: CallAnalysis,
}

/// Structured analysis of a call transcript. The shape is fixed: the
/// model is prompted for exactly this JSON object and anything else is
/// treated as a provider failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallAnalysis {
    pub theme: Theme,
    pub sentiment: Sentiment,
    pub problems: Vec<String>,
    pub solutions: Vec<String>,
    pub action_items: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub classification: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentiment {
    pub polarity: Polarity,
    pub tones: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}
