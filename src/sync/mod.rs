pub mod controller;
pub mod state;
pub mod store;

pub use controller::{SessionController, SessionView};
pub use state::{Activity, Event, Phase};
pub use store::{EntryStatus, SessionStore, TranscriptEntry};
