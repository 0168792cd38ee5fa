pub mod config;
pub mod message;
pub mod session;
pub mod wire;

pub use config::{BackendConfig, Config};
pub use message::{mentioned_agent, Message, Role};
pub use session::{SessionConfig, SessionSnapshot};
pub use wire::{ChatReply, InitAck, StateResponse, UploadReceipt};
