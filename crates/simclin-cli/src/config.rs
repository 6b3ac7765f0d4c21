//! Runtime configuration. Environment variables are the primary source;
//! a YAML file can seed the same structure for local development.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use simclin_provider::{ProviderConfig, ProviderType};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ASSET_ROOT: &str = "assets/examenes";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider the agents talk to.
    pub provider: ProviderConfig,
    /// Model for case generation and feedback.
    #[serde(default = "default_model")]
    pub model: String,
    /// Cheaper model for per-turn patient and decision calls.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    /// OpenAI assistant id for the APS document-grounded case path.
    #[serde(default)]
    pub assistant_id: Option<String>,
    /// Hosted case archive.
    pub archive_url: String,
    pub archive_token: String,
    /// Bearer token clients must present on /api/update-anamnesis.
    pub anamnesis_token: String,
    /// Directory holding the exam image tree.
    #[serde(default = "default_asset_root")]
    pub asset_root: PathBuf,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_asset_root() -> PathBuf {
    PathBuf::from(DEFAULT_ASSET_ROOT)
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

impl Config {
    /// Build from `SIMCLIN_*` environment variables, failing fast on any
    /// missing required value.
    pub fn from_env() -> Result<Self> {
        let provider_type = match env::var("SIMCLIN_PROVIDER").as_deref() {
            Err(_) | Ok("openai") => ProviderType::OpenAI,
            Ok("deepseek") => ProviderType::DeepSeek,
            Ok("groq") => ProviderType::Groq,
            Ok("ollama") => ProviderType::Ollama,
            Ok("openrouter") => ProviderType::OpenRouter,
            Ok("custom") => ProviderType::Custom,
            Ok(other) => bail!("unknown SIMCLIN_PROVIDER: {other}"),
        };

        let mut provider = ProviderConfig::new("default", provider_type.clone());
        match env::var("SIMCLIN_API_KEY") {
            Ok(key) => provider = provider.with_api_key(key),
            // only ollama runs unauthenticated
            Err(_) if provider_type == ProviderType::Ollama => {}
            Err(_) => bail!("SIMCLIN_API_KEY is not set"),
        }
        if let Ok(base) = env::var("SIMCLIN_BASE_URL") {
            provider = provider.with_base_url(base);
        }

        Ok(Self {
            provider,
            model: env::var("SIMCLIN_MODEL").unwrap_or_else(|_| default_model()),
            chat_model: env::var("SIMCLIN_CHAT_MODEL").unwrap_or_else(|_| default_chat_model()),
            assistant_id: env::var("SIMCLIN_ASSISTANT_ID").ok(),
            archive_url: require("SIMCLIN_ARCHIVE_URL")?,
            archive_token: require("SIMCLIN_ARCHIVE_TOKEN")?,
            anamnesis_token: require("SIMCLIN_ANAMNESIS_TOKEN")?,
            asset_root: env::var("SIMCLIN_ASSET_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_asset_root()),
            bind_addr: env::var("SIMCLIN_BIND_ADDR").unwrap_or_else(|_| default_bind_addr()),
        })
    }

    pub fn from_yaml_file(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))
    }
}

fn require(name: &str) -> Result<String> {
    env::var(name).map_err(|_| anyhow::anyhow!("{name} is not set"))
}
