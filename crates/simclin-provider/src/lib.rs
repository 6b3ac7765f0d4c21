pub mod assistant;
pub mod openai;
pub mod openai_compat;
pub mod types;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use assistant::AssistantClient;
pub use openai::{OpenAiProvider, ProviderErrorKind};
pub use openai_compat::{custom, deepseek, groq, ollama, ollama_with_base, openrouter};
pub use types::*;

/// A chat-completion backend. Everything upstream (agents, engine) talks
/// to this trait, never to a concrete client.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, request: LlmRequest) -> Result<LlmResponse>;
    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

/// Which backend a [`ProviderConfig`] describes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    DeepSeek,
    Groq,
    Ollama,
    OpenRouter,
    Custom,
}

impl ProviderType {
    /// Ollama runs locally and ignores credentials.
    fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderType::Ollama)
    }
}

/// One configured provider instance, as it appears in config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Registry id, e.g. "openai" or "lab-ollama".
    pub id: String,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Overrides the backend's default endpoint. Required for `custom`.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn new(id: impl Into<String>, provider_type: ProviderType) -> Self {
        Self {
            id: id.into(),
            provider_type,
            api_key: None,
            base_url: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    fn key(&self) -> Result<String> {
        self.api_key
            .clone()
            .ok_or_else(|| anyhow!("provider '{}' requires api_key", self.id))
    }
}

/// Build the concrete client a [`ProviderConfig`] describes.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>> {
    if config.provider_type.requires_api_key() && config.api_key.is_none() {
        return Err(anyhow!("provider '{}' requires api_key", config.id));
    }
    let provider: Arc<dyn LlmProvider> = match config.provider_type {
        ProviderType::OpenAI => {
            let base = config
                .base_url
                .as_deref()
                .unwrap_or("https://api.openai.com/v1");
            Arc::new(OpenAiProvider::new(config.key()?, base))
        }
        ProviderType::DeepSeek => Arc::new(deepseek(config.key()?)),
        ProviderType::Groq => Arc::new(groq(config.key()?)),
        ProviderType::OpenRouter => Arc::new(openrouter(config.key()?)),
        ProviderType::Ollama => match config.base_url.as_deref() {
            Some(base) => Arc::new(ollama_with_base(base)),
            None => Arc::new(ollama()),
        },
        ProviderType::Custom => {
            let base = config
                .base_url
                .as_ref()
                .ok_or_else(|| anyhow!("provider '{}' requires base_url", config.id))?;
            Arc::new(custom(config.key()?, base.clone()))
        }
    };
    Ok(provider)
}

/// Instantiate and register every configured provider.
pub fn register_from_configs(
    registry: &mut ProviderRegistry,
    configs: &[ProviderConfig],
) -> Result<()> {
    for config in configs {
        let provider = create_provider(config)?;
        registry.register(&config.id, provider);
        tracing::info!(id = %config.id, kind = ?config.provider_type, "registered provider");
    }
    Ok(())
}

/// Providers keyed by id; agents resolve their backend here at startup.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<String>, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(id.into(), provider);
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn LlmProvider>> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("provider not found: {id}"))
    }

    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

/// Echoes the last user message back. Useful as a wiring smoke test.
pub struct StubProvider;

#[async_trait]
impl LlmProvider for StubProvider {
    async fn chat(&self, request: LlmRequest) -> Result<LlmResponse> {
        let user_text = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(LlmResponse {
            text: format!("[stub:{}] {}", request.model, user_text),
            input_tokens: None,
            output_tokens: None,
            stop_reason: Some("stop".into()),
        })
    }
}

/// Replays a fixed queue of responses (or errors), one per `chat` call.
/// Agents are tested against this instead of a live provider.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<Vec<Result<String, String>>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses),
        }
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(vec![Ok(text.into())])
    }

    pub fn failing(error: impl Into<String>) -> Self {
        Self::new(vec![Err(error.into())])
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat(&self, _request: LlmRequest) -> Result<LlmResponse> {
        let mut responses = self.responses.lock().expect("scripted provider poisoned");
        if responses.is_empty() {
            anyhow::bail!("scripted provider exhausted");
        }
        match responses.remove(0) {
            Ok(text) => Ok(LlmResponse {
                text,
                input_tokens: None,
                output_tokens: None,
                stop_reason: Some("stop".into()),
            }),
            Err(error) => Err(anyhow!(error)),
        }
    }
}
