use axum::{extract::State, routing::post, Router};
use tracing::{info, instrument};

use crate::{
    analysis::dto::{AnalyzeRequest, AnalyzeResponse},
    auth::extractors::AuthUser,
    error::ApiError,
    extract::Json,
    state::AppState,
};

pub fn analysis_routes() -> Router<AppState> {
    Router::new().route("/analysis", post(analyze))
}

#[instrument(skip(state, payload))]
async fn analyze(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let transcript = payload.transcript.trim();
    if transcript.is_empty() {
        return Err(ApiError::Validation("Transcript is required".into()));
    }

    let analyzer = state
        .analyzer
        .as_ref()
        .ok_or(ApiError::AnalyzerUnavailable)?;

    let analysis = analyzer.analyze(transcript).await?;
    info!(
        user_id = %claims.sub,
        transcript_len = transcript.len(),
        theme = %analysis.theme.classification,
        "transcript analyzed"
    );
    Ok(Json(AnalyzeResponse {
        success: true,
        analysis,
    }))
}
