//! Summarization proxy endpoint.
//!
//! Forwards a prompt plus a clamped engine result to the configured
//! upstream text-generation provider, or answers with the local
//! rule-based summary when no provider is configured. Upstream rejection
//! maps to 502, transport failure to 500; the caller treats either as a
//! silent degrade.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::config;
use crate::dialogue::types::Recommendation;
use crate::summarize::{Summary, SummarizeError};

#[derive(Deserialize)]
pub struct LlmRequest {
    pub prompt: Option<String>,
    #[serde(default)]
    pub engine_result: Recommendation,
}

/// `POST /api/llm` — produce a prose summary of a finished check.
pub async fn summarize(
    State(ctx): State<ApiContext>,
    Json(req): Json<LlmRequest>,
) -> Result<Json<Summary>, ApiError> {
    let prompt = req
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing prompt".into()))?;
    if prompt.chars().count() > config::MAX_PROMPT_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Prompt too long (max {} chars)",
            config::MAX_PROMPT_CHARS
        )));
    }

    let summary = ctx
        .summarizer
        .summarize(prompt, &req.engine_result)
        .await
        .map_err(|err| match err {
            SummarizeError::Upstream(status) => ApiError::Provider { status },
            SummarizeError::Transport(e) => ApiError::Internal(e.to_string()),
            SummarizeError::MalformedResponse => {
                ApiError::Internal("Summarizer returned no content".into())
            }
        })?;

    Ok(Json(summary))
}
