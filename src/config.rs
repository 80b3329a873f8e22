use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Remedia";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the intake server.
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

/// Upper bound on a summarization prompt, in characters.
pub const MAX_PROMPT_CHARS: usize = 2_000;

/// Upstream summarizer request timeout. A slow provider degrades to the
/// local summary; it never hangs a conversation.
pub const SUMMARY_TIMEOUT: Duration = Duration::from_secs(20);

pub fn default_log_filter() -> String {
    "remedia=info,tower_http=warn".to_string()
}

pub fn bind_address() -> String {
    std::env::var("REMEDIA_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string())
}

/// CORS origin allowed to call the API. `*` by default.
pub fn allowed_origin() -> String {
    std::env::var("REMEDIA_ALLOWED_ORIGIN").unwrap_or_else(|_| "*".to_string())
}

/// Directory of static demo front-end assets served at the root path.
pub fn assets_dir() -> String {
    std::env::var("REMEDIA_ASSETS_DIR").unwrap_or_else(|_| "public".to_string())
}

/// Base URL of the OpenAI-style completion endpoint used for summaries.
pub fn summarizer_base_url() -> String {
    std::env::var("REMEDIA_LLM_BASE_URL")
        .unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
}

/// API key for the summarizer. Absent key = local rule-based summaries.
pub fn summarizer_api_key() -> Option<String> {
    std::env::var("REMEDIA_LLM_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty())
}

pub fn summarizer_model() -> String {
    std::env::var("REMEDIA_LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string())
}
