use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;
use simclin_agents::{CaseGenerator, DecisionAgent, ExamAgent, FeedbackAgent, PatientAgent};
use simclin_engine::{InMemoryStore, SimulationEngine};
use simclin_exams::ExamImageResolver;
use simclin_provider::{register_from_configs, AssistantClient, ProviderRegistry};
use simclin_server::archive::RestArchive;
use simclin_server::state::AppState;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Parser)]
#[command(name = "simclin", version, about = "clinical patient-encounter simulation service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP API server")]
    Serve {
        #[arg(long, help = "Bind address, overrides config")]
        addr: Option<String>,
        #[arg(long, help = "YAML config file (default: environment variables)")]
        config: Option<PathBuf>,
    },
    #[command(about = "Load and validate configuration, then exit")]
    Validate {
        #[arg(long, help = "YAML config file (default: environment variables)")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve { addr, config } => {
            let mut config = load_config(config)?;
            if let Some(addr) = addr {
                config.bind_addr = addr;
            }
            serve(config).await
        }
        Commands::Validate { config } => {
            let config = load_config(config)?;
            println!(
                "config ok: provider={} model={} bind={}",
                config.provider.id, config.model, config.bind_addr
            );
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_yaml_file(&path),
        None => Config::from_env(),
    }
}

async fn serve(config: Config) -> Result<()> {
    let mut registry = ProviderRegistry::new();
    register_from_configs(&mut registry, std::slice::from_ref(&config.provider))?;
    let provider = registry.get(&config.provider.id)?;

    let mut case_generator = CaseGenerator::new(provider.clone(), &config.model);
    if let Some(assistant_id) = &config.assistant_id {
        let api_key = config.provider.api_key.clone().unwrap_or_default();
        let assistant = AssistantClient::new(api_key, OPENAI_API_BASE, assistant_id);
        case_generator = case_generator.with_assistant(Arc::new(assistant));
        tracing::info!("APS case generation uses assistant {assistant_id}");
    }

    let resolver = Arc::new(ExamImageResolver::new(&config.asset_root));
    let engine = Arc::new(SimulationEngine::new(
        Arc::new(InMemoryStore::new()),
        case_generator,
        PatientAgent::new(provider.clone(), &config.chat_model),
        DecisionAgent::new(provider.clone(), &config.chat_model),
        ExamAgent::new(resolver.clone()),
        FeedbackAgent::new(provider.clone(), &config.model),
    ));

    let state = AppState {
        engine,
        patient: Arc::new(PatientAgent::new(provider.clone(), &config.chat_model)),
        exam: Arc::new(ExamAgent::new(resolver)),
        archive: Arc::new(RestArchive::new(&config.archive_url, &config.archive_token)),
        anamnesis_token: Arc::new(config.anamnesis_token.clone()),
    };

    simclin_server::serve(state, &config.bind_addr).await
}
