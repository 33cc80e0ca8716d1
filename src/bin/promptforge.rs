//! CLI front end for the prompt-refinement gateway.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use promptforge::store::{CredentialStore, FileStore, ProviderCredential};
use promptforge::{PromptGateway, PromptforgeError};

/// Promptforge prompt-refinement gateway
#[derive(Parser)]
#[command(name = "promptforge")]
#[command(version)]
#[command(about = "Turn a rough brief into a reusable LLM prompt")]
struct Args {
    /// Credential store path (default: ~/.promptforge/credentials.json)
    #[arg(long, env = "PROMPTFORGE_STORE")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Refine a brief into a prompt via the active provider
    Generate {
        /// The brief (or omit to read from stdin)
        brief: Option<String>,
        /// Theme label embedded in the canonical prompt
        #[arg(short, long, default_value = "general")]
        theme: String,
    },

    /// List catalog providers and their configured state
    Providers,

    /// Save an API key for a provider
    SetKey {
        /// Provider id (e.g. "openai", "gemini")
        provider: String,
        /// API key value
        key: String,
        /// Optional endpoint override
        #[arg(long)]
        endpoint: Option<String>,
        /// Optional model override
        #[arg(long)]
        model: Option<String>,
    },

    /// Set the active provider
    Use {
        /// Provider id
        provider: String,
    },

    /// Delete a provider's stored configuration
    Remove {
        /// Provider id
        provider: String,
    },
}

fn read_stdin_if_missing(value: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    match value {
        Some(value) => Ok(value),
        None => {
            if io::stdin().is_terminal() {
                return Err("no input given and stdin is a terminal".into());
            }
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer.trim().to_string())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let file_store = match args.store {
        Some(path) => FileStore::open(path)?,
        None => FileStore::open_default()?,
    };
    let store = Arc::new(CredentialStore::open(Box::new(file_store))?);

    match args.command {
        Command::Generate { brief, theme } => {
            let brief = read_stdin_if_missing(brief)?;
            let gateway = PromptGateway::new(store);
            let outcome = gateway.generate_refined_prompt(&brief, &theme).await;
            match outcome.error {
                None => {
                    println!("{}", outcome.text);
                    if let Some(usage) = outcome.usage {
                        eprintln!(
                            "tokens: {} prompt + {} completion = {}",
                            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
                        );
                    }
                }
                Some(failure) => {
                    eprintln!("error ({:?}): {}", failure.kind, failure.message);
                    std::process::exit(1);
                }
            }
        }

        Command::Providers => {
            let active = store.active_provider_id();
            for config in store.registry().list() {
                let marker = if config.id == active { "*" } else { " " };
                let configured = if store.is_configured(&config.id) {
                    "configured"
                } else {
                    "not configured"
                };
                println!(
                    "{marker} {:<12} {:<28} {configured}",
                    config.id, config.display_name
                );
            }
        }

        Command::SetKey {
            provider,
            key,
            endpoint,
            model,
        } => {
            if store.registry().get(&provider).is_none() {
                return Err(PromptforgeError::UnknownProvider(provider).into());
            }
            store.save_credential(ProviderCredential {
                provider_id: provider.clone(),
                api_key: key,
                custom_endpoint: endpoint.unwrap_or_default(),
                custom_model: model.unwrap_or_default(),
                is_active: false,
            })?;
            println!("saved configuration for {provider}");
        }

        Command::Use { provider } => {
            if store.registry().get(&provider).is_none() {
                return Err(PromptforgeError::UnknownProvider(provider).into());
            }
            store.set_active_provider(&provider)?;
            println!("active provider: {provider}");
        }

        Command::Remove { provider } => {
            store.remove_credential(&provider)?;
            println!("removed configuration for {provider}");
        }
    }

    Ok(())
}
