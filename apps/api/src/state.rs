use std::sync::Arc;

use crate::auth::Authenticator;
use crate::config::Config;
use crate::journal::store::EntryStore;
use crate::llm_client::AnswerSynthesizer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub entry_store: Arc<dyn EntryStore>,
    pub authenticator: Arc<dyn Authenticator>,
    /// `None` when `ANTHROPIC_API_KEY` is unset.
    pub synthesizer: Option<Arc<dyn AnswerSynthesizer>>,
}
