use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod gemini;
pub mod handlers;

pub fn router() -> Router<AppState> {
    handlers::analysis_routes()
}
