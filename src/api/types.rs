//! Shared state for the API layer.

use std::sync::Arc;

use crate::api::registry::SessionRegistry;
use crate::summarize::SummaryClient;

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub sessions: Arc<SessionRegistry>,
    pub summarizer: Arc<SummaryClient>,
}

impl ApiContext {
    pub fn new(summarizer: SummaryClient) -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new()),
            summarizer: Arc::new(summarizer),
        }
    }

    pub fn from_env() -> Self {
        Self::new(SummaryClient::from_env())
    }
}
