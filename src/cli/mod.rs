//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod settings;

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::cli::settings::SettingRegistry;
use crate::core::app::App;
use crate::core::chat::HistoryLog;
use crate::core::config::Config;
use crate::core::storage::FileStore;
use crate::ui::chat_loop::run_chat;
use crate::ui::register::run_register;
use crate::ui::render;
use crate::utils::logging::init_tracing;

#[derive(Parser)]
#[command(name = "preinscription")]
#[command(about = "Terminal client for the pre-registration assistant")]
#[command(
    long_about = "Preinscription talks to the pre-registration service: chat with its \
assistant, or fill in and submit the four-step registration form.\n\n\
Chat commands:\n\
  /new              Start a new conversation\n\
  /history          Show recent messages\n\
  /use N            Put history entry N back in the composer (Enter sends it)\n\
  /quick KEY        Ask a canned question (programmes, documents, frais, ...)\n\
  /quit             Leave\n\n\
Registration:\n\
  field=value       Fill a field (e.g. nom=Dupont, acceptTerms=oui)\n\
  /suivant          Validate the step and continue\n\
  /precedent        Go back one step\n\
  /fichier SLOT P   Attach a file (photo, diplome, releve, cv; max 5 MB)\n\
  /envoyer          Submit from the last step\n\n\
Logging:\n\
  RUST_LOG          Diagnostic filter (default: warn)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server to talk to, instead of the configured base-url
    #[arg(short = 'u', long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Write diagnostics to this file instead of stderr
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Configuration file to use instead of the default location
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chat with the assistant (default)
    Chat,
    /// Fill in and submit the registration form
    Register,
    /// Show the most recent chat messages
    History {
        /// Delete the stored history instead
        #[arg(long)]
        clear: bool,
    },
    /// Session helpers
    Auth {
        #[command(subcommand)]
        action: AuthCommand,
    },
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

#[derive(Subcommand)]
pub enum AuthCommand {
    /// Report whether the session is authenticated
    Check,
    /// End the session
    Logout,
    /// Print the profile payload
    Profile,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn Error>> {
    let config = match path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

fn save_config(config: &Config, path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match path {
        Some(path) => config.save_to_path(path)?,
        None => config.save()?,
    }
    Ok(())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    let config_path = args.config.as_deref();
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let app = App::from_config(&config, args.base_url.as_deref())?;
            run_chat(app).await
        }
        Commands::Register => {
            let app = App::from_config(&config, args.base_url.as_deref())?;
            run_register(app).await
        }
        Commands::History { clear } => {
            let store = FileStore::new(config.storage_dir()?);
            let mut history = HistoryLog::new(Box::new(store), config.history_key());
            if clear {
                history.clear()?;
                println!("✅ Chat history cleared");
            } else {
                print!("{}", render::history(&history.recent()));
            }
            Ok(())
        }
        Commands::Auth { action } => {
            let mut app = App::from_config(&config, args.base_url.as_deref())?;
            match action {
                AuthCommand::Check => {
                    if app.is_authenticated().await {
                        println!("✅ Authenticated");
                    } else {
                        println!("Not authenticated");
                    }
                }
                AuthCommand::Logout => {
                    let ok = app.logout().await;
                    for toast in app.notifications.take_unseen() {
                        println!("{}", render::toast(&toast));
                    }
                    if !ok {
                        std::process::exit(1);
                    }
                }
                AuthCommand::Profile => {
                    let profile = app.profile().await;
                    println!("{}", serde_json::to_string_pretty(&profile)?);
                }
            }
            Ok(())
        }
        Commands::Set { key, value } => {
            let registry = SettingRegistry::new();
            let Some(key) = key else {
                print!("{}", registry.format_all(&config));
                return Ok(());
            };
            let mut config = config;
            let outcome = registry
                .get(&key)
                .and_then(|handler| handler.set(&value.join(" "), &mut config));
            match outcome {
                Ok(message) => {
                    save_config(&config, config_path)?;
                    println!("{message}");
                }
                Err(e) => {
                    eprintln!("❌ {e}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Commands::Unset { key } => {
            let registry = SettingRegistry::new();
            let mut config = config;
            match registry.get(&key) {
                Ok(handler) => {
                    let message = handler.unset(&mut config);
                    save_config(&config, config_path)?;
                    println!("{message}");
                }
                Err(e) => {
                    eprintln!("❌ {e}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
    }
}
