use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use greeter::config::{list_personas, Config, DEFAULT_CONFIG_DIR, DEFAULT_PERSONA};
use greeter::generation::pipeline;
use greeter::image_client::OpenAiImageClient;
use greeter::llm_client::OpenAiChatClient;
use greeter::records::SqliteRecordStore;
use greeter::state::AppState;
use greeter::storage::LocalStorageClient;

#[derive(Parser)]
#[command(name = "greeter")]
#[command(about = "Morning image and caption generator", long_about = None)]
#[command(version)]
struct Cli {
    /// Persona configuration to use (file name under personas/, without .yaml)
    #[arg(long, default_value = DEFAULT_PERSONA)]
    persona: String,

    /// Enable debug logging output
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding base.yaml and personas/
    #[arg(long, env = "GREETER_CONFIG_DIR", default_value = DEFAULT_CONFIG_DIR)]
    config_dir: PathBuf,

    /// Print the available personas and exit
    #[arg(long)]
    list_personas: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize structured logging
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={level}", env!("CARGO_CRATE_NAME")))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if cli.list_personas {
        for persona in list_personas(&cli.config_dir) {
            println!("{persona}");
        }
        return Ok(());
    }

    info!("Starting greeter v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration before any remote call
    let config = Config::load(Some(&cli.persona), &cli.config_dir)?;
    info!(
        "Persona '{}' ({}), records table {}",
        config.grandma.name,
        config.grandma.language,
        config.runs_table_name()
    );

    // Initialize collaborators
    let llm = OpenAiChatClient::new(
        config.llm.api_key.clone(),
        config.llm.model.clone(),
        config.llm.system_prompt.clone(),
    );
    info!("LLM client initialized (model: {})", llm.model());

    let image = OpenAiImageClient::new(config.image.api_key.clone(), config.image.model.clone());
    info!("Image client initialized (model: {})", image.model());

    let storage = LocalStorageClient::new(&config.image.storage_path)?;
    let records = SqliteRecordStore::open(&config.database.past_records_path).await?;

    let state = AppState {
        config: Arc::new(config),
        llm: Arc::new(llm),
        image: Arc::new(image),
        storage: Arc::new(storage),
        records: Arc::new(records),
    };

    let record = pipeline::run(&state).await?;
    info!("Done: {} → {}", record.phrase, record.image_path);

    Ok(())
}
