use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use helm_core::EntityKind;

/// Resolve and project agent/assistant selections for chat sessions.
#[derive(Parser)]
#[command(version, about, long_about = None, author)]
pub struct Cli {
    /// Path to the config file (defaults to the user config directory)
    #[arg(long, env = "HELM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Catalog files to load (repeatable, overrides the config file)
    #[arg(long = "catalog", value_name = "PATH")]
    pub catalogs: Vec<PathBuf>,

    /// Path to the last-used selection store
    #[arg(long, env = "HELM_STORE")]
    pub store: Option<PathBuf>,

    /// Session slot whose history is used
    #[arg(long, default_value = "0")]
    pub slot: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Resolve the default selection for a session
    Resolve {
        /// Endpoint the session talks to (e.g. 'agents', 'azureAssistants', 'openAI')
        #[arg(long)]
        endpoint: String,
        /// Agent already selected on the session
        #[arg(long)]
        agent_id: Option<String>,
        /// Assistant already selected on the session
        #[arg(long)]
        assistant_id: Option<String>,
        /// Model already selected on the session
        #[arg(long)]
        model: Option<String>,
        /// Applied spec id
        #[arg(long)]
        spec: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Replay a scenario file of timed session changes and print deliveries
    Simulate {
        /// Scenario file (TOML format)
        scenario: PathBuf,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Record an explicit pick as the last-used entity for the slot
    Remember {
        #[arg(value_enum)]
        kind: EntityArg,
        id: String,
    },
    /// List loaded catalog entries
    Catalog,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write the effective configuration to the config file
    Init,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityArg {
    Agent,
    Assistant,
}

impl From<EntityArg> for EntityKind {
    fn from(arg: EntityArg) -> Self {
        match arg {
            EntityArg::Agent => EntityKind::Agent,
            EntityArg::Assistant => EntityKind::Assistant,
        }
    }
}
