use std::path::PathBuf;
use std::sync::Arc;

use devdash_core::config::{AiConfig, Config};
use devdash_core::store::{open_store, ProjectStore};
use gemini_agent::GeminiClient;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub config: Arc<Config>,
    pub store: Arc<dyn ProjectStore>,
    /// `None` when no API key is available; AI routes answer 503.
    pub ai: Option<GeminiClient>,
}

impl AppState {
    pub fn new(root: PathBuf, config: Config, store: Arc<dyn ProjectStore>) -> Self {
        let ai = gemini_from_config(&config.ai);
        Self {
            root,
            config: Arc::new(config),
            store,
            ai,
        }
    }

    /// Load `devdash.yaml` under `root` and open the configured store.
    pub async fn load(root: PathBuf) -> anyhow::Result<Self> {
        let config = Config::load(&root)?;
        let store = open_store(&config.store, &root).await?;
        Ok(Self::new(root, config, store))
    }

    pub fn with_ai(mut self, ai: Option<GeminiClient>) -> Self {
        self.ai = ai;
        self
    }
}

fn gemini_from_config(ai: &AiConfig) -> Option<GeminiClient> {
    let Some(key) = ai.api_key() else {
        tracing::warn!("{} not set; AI routes disabled", ai.api_key_env);
        return None;
    };
    let mut builder = GeminiClient::builder()
        .api_key(key)
        .model(&ai.model)
        .timeout(ai.timeout());
    if let Some(url) = &ai.base_url {
        builder = builder.base_url(url);
    }
    match builder.build() {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(error = %e, "AI client unavailable");
            None
        }
    }
}
