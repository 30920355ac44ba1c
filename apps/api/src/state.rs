use std::sync::Arc;

use crate::analysis::pipeline::ResponsePipeline;
use crate::analysis::prompts::PromptBuilder;
use crate::config::Config;
use crate::llm_client::CompletionBackend;

/// Shared application state injected into all route handlers via Axum extractors.
/// Immutable after startup; nothing here changes between requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub prompts: PromptBuilder,
    pub pipeline: ResponsePipeline,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            prompts: PromptBuilder::new(config.job_market.clone()),
            pipeline: ResponsePipeline::new(backend),
            config: Arc::new(config),
        }
    }
}
