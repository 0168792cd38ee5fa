use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::SessionConfig;

#[derive(Parser, Debug)]
#[command(name = "agentdeck")]
#[command(about = "Set up and chat with a multi-agent backend", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, global = true)]
    pub url: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the backend session state
    State,
    /// Initialize the backend session
    Init {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Send one message and print the agents' reply
    Send {
        /// Message text
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Upload files into the session workplace
    Upload {
        /// Files to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Interactive chat; sets up the session first if needed
    Chat {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Show the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        write: bool,
    },
}

/// Setup form fields. Unset flags keep the configured defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Container to run the agents in
    #[arg(long)]
    pub container_name: Option<String>,
    /// Port the container exposes
    #[arg(long)]
    pub port: Option<u16>,
    /// Branch to pull the agent code from
    #[arg(long)]
    pub test_pull_name: Option<String>,
    /// Skip cloning the agent code into the workplace
    #[arg(long)]
    pub no_git_clone: bool,
    /// Run tools on the backend host instead of a container
    #[arg(long)]
    pub local_env: bool,
    /// Completion model for the agents
    #[arg(long)]
    pub model: Option<String>,
}

impl SessionArgs {
    pub fn apply(&self, config: &mut SessionConfig) {
        if let Some(container_name) = &self.container_name {
            config.container_name = container_name.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(test_pull_name) = &self.test_pull_name {
            config.test_pull_name = test_pull_name.clone();
        }
        if self.no_git_clone {
            config.git_clone = false;
        }
        if self.local_env {
            config.local_env = true;
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
    }
}

/// A line typed into the chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Message(String),
    Upload(Vec<PathBuf>),
    Refresh,
    Agents,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_chat_input(line: &str) -> ChatInput {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    // "//text" sends a message that starts with a slash
    if let Some(escaped) = line.strip_prefix("//") {
        return ChatInput::Message(format!("/{}", escaped));
    }
    let Some(command) = line.strip_prefix('/') else {
        return ChatInput::Message(line.to_string());
    };

    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or_default() {
        "upload" => ChatInput::Upload(parts.map(PathBuf::from).collect()),
        "refresh" => ChatInput::Refresh,
        "agents" => ChatInput::Agents,
        "help" => ChatInput::Help,
        "quit" | "exit" => ChatInput::Quit,
        other => ChatInput::Unknown(other.to_string()),
    }
}
