// agentdeck library
// Session state synchronization for multi-agent chat backends, plus the CLI on top of it

pub mod cli;
pub mod client;
pub mod core;
pub mod sync;
pub mod utils;

// Re-export commonly used types
pub use crate::client::{AgentClient, Backend, ClientError, FileUpload};
pub use crate::core::{Config, Message, Role, SessionConfig, SessionSnapshot};
pub use crate::sync::{Phase, SessionController, SessionView};

// Error handling
pub use anyhow::{Error, Result};
