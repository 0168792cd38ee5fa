pub mod commands;
pub mod handlers;

pub use commands::{parse_chat_input, ChatInput, Cli, Commands, SessionArgs};
