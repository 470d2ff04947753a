//! Command-line interface parsing and handling
//!
//! This module parses command-line arguments and dispatches into the chat
//! loop or one of the maintenance subcommands.

use std::error::Error;
use std::io::Write as _;

use clap::{Parser, Subcommand};

use crate::api::client::ReplicateClient;
use crate::auth::{validate_token_format, CredentialStore, TOKEN_ENV_VAR};
use crate::core::config::Config;
use crate::core::message::Transcript;
use crate::core::models::ModelKind;
use crate::core::session::ChatSession;
use crate::logging::TranscriptLog;
use crate::ui::run_chat;

#[derive(Parser)]
#[command(name = "causerie")]
#[command(about = "A terminal chat client for Replicate-hosted Llama 2 models")]
#[command(
    long_about = "Causerie streams conversations with Replicate-hosted Llama 2 models \
straight into your terminal.\n\n\
Authentication:\n\
  Use 'causerie auth' to store your Replicate API token in the system keyring.\n\n\
Environment Variables (fallback if no token stored):\n\
  REPLICATE_API_TOKEN    Your Replicate API token\n\n\
Session commands:\n\
  /clear            Start the conversation over\n\
  /quit             Exit the chat"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to chat with (llama2-7b, llama2-13b, or llama2-70b)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Append finished turns to the given log file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat session (default)
    Chat,
    /// Store an API token in the system keyring
    Auth,
    /// Remove the stored API token
    Deauth,
    /// List the available models
    Models,
    /// Set a configuration value, or show the configuration when no key is given
    Set {
        /// Configuration key (default-model, temperature, top-p, max-length, greeting)
        key: Option<String>,
        /// Value to set for the key
        value: Option<String>,
    },
    /// Remove a configuration value
    Unset {
        /// Configuration key to clear
        key: String,
    },
}

pub async fn run() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    match args.command {
        Some(Commands::Auth) => run_auth(),
        Some(Commands::Deauth) => run_deauth(),
        Some(Commands::Models) => {
            list_models();
            Ok(())
        }
        Some(Commands::Set { key, value }) => set_config(key.as_deref(), value.as_deref()),
        Some(Commands::Unset { key }) => unset_config(&key),
        Some(Commands::Chat) | None => start_chat(args.model, args.log).await,
    }
}

async fn start_chat(model: Option<String>, log_file: Option<String>) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let generation = config.generation_config(model.as_deref())?;
    generation.validate()?;

    let store = CredentialStore::new();
    let Some(token) = store.resolve_token()? else {
        return Err(format!(
            "No API token configured. Run `causerie auth` or set {TOKEN_ENV_VAR}."
        )
        .into());
    };
    validate_token_format(&token)?;

    let log = TranscriptLog::new(log_file)?;
    let transcript = match &config.greeting {
        Some(greeting) => Transcript::with_greeting(greeting.as_str()),
        None => Transcript::new(),
    };
    let session = ChatSession::with_transcript(generation, transcript);
    let client = ReplicateClient::new(token);

    run_chat(session, &client, log).await
}

fn run_auth() -> Result<(), Box<dyn Error>> {
    print!("Paste your Replicate API token: ");
    std::io::stdout().flush()?;

    let mut token = String::new();
    std::io::stdin().read_line(&mut token)?;
    let token = token.trim();

    let store = CredentialStore::new();
    store.store_token(token)?;
    println!("Token stored in the system keyring.");
    Ok(())
}

fn run_deauth() -> Result<(), Box<dyn Error>> {
    let store = CredentialStore::new();
    if store.remove_token()? {
        println!("Stored token removed.");
    } else {
        println!("No stored token to remove.");
    }
    Ok(())
}

fn list_models() {
    println!("Available models:");
    for model in ModelKind::ALL {
        println!(
            "  {:<12} {:<12} {}",
            model.as_str(),
            model.display_name(),
            model.version_id()
        );
    }
}

fn set_config(key: Option<&str>, value: Option<&str>) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;

    let Some(key) = key else {
        config.print_all();
        return Ok(());
    };
    let Some(value) = value else {
        return Err(format!("no value given for config key: {key}").into());
    };

    config.set(key, value)?;
    config.save()?;
    println!("Set {key} = {value}");
    Ok(())
}

fn unset_config(key: &str) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    config.unset(key)?;
    config.save()?;
    println!("Unset {key}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_chat() {
        let args = Args::try_parse_from(["causerie"]).expect("parses");
        assert!(args.command.is_none());
        assert!(args.model.is_none());
    }

    #[test]
    fn model_and_log_flags_parse() {
        let args = Args::try_parse_from(["causerie", "-m", "llama2-13b", "-l", "chat.log"])
            .expect("parses");
        assert_eq!(args.model.as_deref(), Some("llama2-13b"));
        assert_eq!(args.log.as_deref(), Some("chat.log"));
    }

    #[test]
    fn set_without_key_parses_as_show() {
        let args = Args::try_parse_from(["causerie", "set"]).expect("parses");
        match args.command {
            Some(Commands::Set { key, value }) => {
                assert!(key.is_none());
                assert!(value.is_none());
            }
            _ => panic!("expected set subcommand"),
        }
    }

    #[test]
    fn unset_requires_a_key() {
        assert!(Args::try_parse_from(["causerie", "unset"]).is_err());
        let args = Args::try_parse_from(["causerie", "unset", "greeting"]).expect("parses");
        assert!(matches!(args.command, Some(Commands::Unset { .. })));
    }
}
