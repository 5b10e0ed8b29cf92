use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;

use chat_relay::application::errors::ChatError;
use chat_relay::application::services::ChatSystem;
use chat_relay::infrastructure::adapters::console::ConsoleAdapter;
use chat_relay::infrastructure::config::Config;
use chat_relay::infrastructure::storage::FileUserDirectory;

#[derive(Parser)]
#[command(name = "chat-relay")]
#[command(about = "Multi-user chat simulated in one process", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// User file (overrides config)
    #[arg(short, long)]
    users: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the console chat
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run_chat(&cli.config, cli.users),
        Commands::Version => {
            println!("chat-relay v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(&cli.config),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(config_path: &str) -> Config {
    if Path::new(config_path).exists() {
        Config::load(config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    }
}

fn run_chat(config_path: &str, users_override: Option<String>) -> Result<(), ChatError> {
    let mut config = load_config(config_path);
    if let Some(users) = users_override {
        config.directory.path = users.into();
    }

    tracing::info!("Starting {}", config.chat.name);

    let directory = Arc::new(FileUserDirectory::open(&config.directory.path)?);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| ChatError::Internal(format!("Failed to start runtime: {}", e)))?;

    rt.block_on(async {
        let system = ChatSystem::start(directory.clone(), config.dispatcher.delivery_timeout());
        let console = ConsoleAdapter::new(system.service().clone(), config.chat.prefix.clone());

        tokio::select! {
            _ = console.run() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
            }
        }

        let stats = system.dispatcher().stats();
        tracing::info!(
            "Routed {} envelopes ({} deliveries, {} dropped)",
            stats.routed, stats.delivered, stats.dropped
        );
        system.shutdown();
    });

    if config.directory.clear_on_exit {
        directory.clear()?;
    }
    Ok(())
}

fn init_config(config_path: &str) -> Result<(), ChatError> {
    if Path::new(config_path).exists() {
        println!("{} already exists, not overwriting", config_path);
        return Ok(());
    }

    let yaml = Config::default().to_yaml()?;
    std::fs::write(config_path, yaml)
        .map_err(|e| ChatError::Internal(format!("Failed to write {}: {}", config_path, e)))?;
    println!("Wrote default config to {}", config_path);
    Ok(())
}
