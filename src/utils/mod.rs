pub mod transcript;

pub use transcript::{new_entries, print_entries, print_session_summary, render_entry};
