//! Optional prose summaries of a finished check.
//!
//! When an upstream text-generation provider is configured, the client
//! forwards a clamped copy of the recommendation and sanitizes whatever
//! comes back. Without a provider (or on any failure) the caller falls
//! back to the deterministic rule-based summary — the conversation never
//! depends on this service.

use serde::Serialize;
use serde_json::json;

use crate::config;
use crate::dialogue::types::Recommendation;
use crate::sanitize::sanitize_html;

// Field caps applied before a recommendation leaves this process.
const MAX_LIST_ITEMS: usize = 6;
const MAX_TITLE_CHARS: usize = 200;
const MAX_NAME_CHARS: usize = 120;
const MAX_DOSAGE_CHARS: usize = 160;
const MAX_TEXT_CHARS: usize = 240;

const SYSTEM_PROMPT: &str =
    "You are a harmless summarisation assistant. Produce a short HTML summary strictly \
     using the provided engine result. Do not add new medical recommendations beyond it. \
     If the engine result contains flags, emphasise them.";

/// Truncate on a character boundary (multi-byte safe).
fn clamp_str(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect()
}

fn clamp_list(items: &[String], max_chars: usize) -> Vec<String> {
    items
        .iter()
        .take(MAX_LIST_ITEMS)
        .map(|item| clamp_str(item, max_chars))
        .collect()
}

/// Bound every field of a recommendation before using it in a prompt or
/// a summary. Oversized or hostile engine results cannot blow past this.
pub fn clamp_recommendation(rec: &Recommendation) -> Recommendation {
    Recommendation {
        title: clamp_str(&rec.title, MAX_TITLE_CHARS),
        advice: rec
            .advice
            .iter()
            .take(MAX_LIST_ITEMS)
            .map(|item| crate::dialogue::types::AdviceItem {
                name: clamp_str(&item.name, MAX_NAME_CHARS),
                dosage: item.dosage.as_deref().map(|d| clamp_str(d, MAX_DOSAGE_CHARS)),
                description: item
                    .description
                    .as_deref()
                    .map(|d| clamp_str(d, MAX_TEXT_CHARS)),
            })
            .collect(),
        cautions: clamp_list(&rec.cautions, MAX_TEXT_CHARS),
        flags: clamp_list(&rec.flags, MAX_TEXT_CHARS),
        warnings: clamp_list(&rec.warnings, MAX_TEXT_CHARS),
        self_care: clamp_list(&rec.self_care, MAX_TEXT_CHARS),
        administration: clamp_list(&rec.administration, MAX_TEXT_CHARS),
        storage: clamp_list(&rec.storage, MAX_TEXT_CHARS),
        general_timing: clamp_list(&rec.general_timing, MAX_TEXT_CHARS),
        trace: None,
    }
}

/// Deterministic HTML summary built from the recommendation alone.
pub fn summarize_locally(rec: &Recommendation) -> String {
    let mut lines: Vec<String> = Vec::new();
    if !rec.title.is_empty() {
        lines.push(format!("<p><strong>{}</strong></p>", rec.title));
    }
    if !rec.advice.is_empty() {
        lines.push("<p>Recommended options:</p><ul>".to_string());
        for item in &rec.advice {
            let dose = item
                .dosage
                .as_deref()
                .map(|d| format!(" (<em>{d}</em>)"))
                .unwrap_or_default();
            let desc = item
                .description
                .as_deref()
                .map(|d| format!(" — {d}"))
                .unwrap_or_default();
            lines.push(format!("<li>{}{dose}{desc}</li>", item.name));
        }
        lines.push("</ul>".to_string());
    }
    if !rec.flags.is_empty() {
        lines.push("<p><strong>Safety flags:</strong></p><ul>".to_string());
        lines.extend(rec.flags.iter().map(|f| format!("<li>{f}</li>")));
        lines.push("</ul>".to_string());
    }
    if !rec.warnings.is_empty() {
        lines.push("<p><strong>Warnings:</strong></p><ul>".to_string());
        lines.extend(rec.warnings.iter().map(|w| format!("<li>{w}</li>")));
        lines.push("</ul>".to_string());
    }
    if lines.is_empty() {
        lines.push(
            "<p>No additional summary available. Please review the full guidance above.</p>"
                .to_string(),
        );
    }
    lines.join("")
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("Summarizer returned status {0}")]
    Upstream(u16),

    #[error("Summarizer request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Summarizer response had no content")]
    MalformedResponse,
}

/// A produced summary plus where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub text: String,
    pub provider: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub struct SummaryClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl SummaryClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(config::SUMMARY_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            config::summarizer_base_url(),
            config::summarizer_api_key(),
            config::summarizer_model(),
        )
    }

    pub fn has_upstream(&self) -> bool {
        self.api_key.is_some()
    }

    /// Produce a summary for a finished check.
    ///
    /// Without an upstream key this resolves immediately with the local
    /// rule-based summary; with one, the upstream reply is sanitized
    /// before it is returned.
    pub async fn summarize(
        &self,
        prompt: &str,
        rec: &Recommendation,
    ) -> Result<Summary, SummarizeError> {
        let safe = clamp_recommendation(rec);

        let Some(key) = &self.api_key else {
            return Ok(Summary {
                text: summarize_locally(&safe),
                provider: "local",
                note: Some("Summarizer not configured; using rule-based summary.".to_string()),
            });
        };

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!(
                        "Prompt: {prompt}\n\nEngineResult: {}",
                        serde_json::to_string(&safe).unwrap_or_default()
                    )
                }
            ],
            "max_tokens": 512
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SummarizeError::Upstream(response.status().as_u16()));
        }

        let data: serde_json::Value = response.json().await?;
        let content = data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(SummarizeError::MalformedResponse)?;

        let text = sanitize_html(content);
        if text.is_empty() {
            return Err(SummarizeError::MalformedResponse);
        }
        Ok(Summary {
            text,
            provider: "openai",
            note: None,
        })
    }
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::types::AdviceItem;

    fn sample_recommendation() -> Recommendation {
        Recommendation {
            title: "Headache".into(),
            advice: vec![AdviceItem {
                name: "Paracetamol 500mg".into(),
                dosage: Some("1–2 tablets up to 4 times a day".into()),
                description: Some("First-line pain relief.".into()),
            }],
            flags: vec!["Sudden severe headache mentioned.".into()],
            ..Default::default()
        }
    }

    // ── Clamping ──

    #[test]
    fn clamp_caps_list_lengths_and_string_sizes() {
        let rec = Recommendation {
            title: "T".repeat(500),
            cautions: (0..20).map(|i| format!("caution {i}")).collect(),
            ..Default::default()
        };
        let clamped = clamp_recommendation(&rec);
        assert_eq!(clamped.title.chars().count(), 200);
        assert_eq!(clamped.cautions.len(), 6);
    }

    #[test]
    fn clamp_is_multibyte_safe() {
        let rec = Recommendation {
            title: "é".repeat(300),
            ..Default::default()
        };
        let clamped = clamp_recommendation(&rec);
        assert_eq!(clamped.title.chars().count(), 200);
    }

    #[test]
    fn clamp_drops_trace() {
        let rec = Recommendation {
            trace: Some(serde_json::json!({"steps": []})),
            ..Default::default()
        };
        assert!(clamp_recommendation(&rec).trace.is_none());
    }

    // ── Local summary ──

    #[test]
    fn local_summary_lists_advice_and_flags() {
        let html = summarize_locally(&sample_recommendation());
        assert!(html.contains("<strong>Headache</strong>"));
        assert!(html.contains("Paracetamol 500mg"));
        assert!(html.contains("Safety flags"));
    }

    #[test]
    fn local_summary_has_fallback_for_empty_result() {
        let html = summarize_locally(&Recommendation::default());
        assert!(html.contains("No additional summary available"));
    }

    // ── Client ──

    #[tokio::test]
    async fn without_key_summarize_resolves_locally() {
        let client = SummaryClient::new("http://127.0.0.1:9", None, "test-model");
        let summary = client
            .summarize("Summarise the guidance", &sample_recommendation())
            .await
            .unwrap();
        assert_eq!(summary.provider, "local");
        assert!(summary.note.is_some());
        assert!(summary.text.contains("Paracetamol"));
    }

    #[tokio::test]
    async fn with_key_but_unreachable_provider_is_an_error() {
        // Port 9 (discard) refuses connections; the client must surface a
        // transport error rather than hang or panic.
        let client =
            SummaryClient::new("http://127.0.0.1:9", Some("test-key".into()), "test-model");
        let result = client
            .summarize("Summarise the guidance", &sample_recommendation())
            .await;
        assert!(matches!(result, Err(SummarizeError::Transport(_))));
    }
}
