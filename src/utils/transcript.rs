use crossterm::style::{Color, Stylize};

use crate::core::{Role, SessionSnapshot};
use crate::sync::{EntryStatus, TranscriptEntry};

fn role_color(role: &Role) -> Color {
    match role {
        Role::User => Color::Cyan,
        Role::Assistant => Color::Green,
        Role::System => Color::Yellow,
        Role::Tool => Color::Magenta,
        Role::Unknown(_) => Color::Grey,
    }
}

fn status_suffix(status: EntryStatus) -> &'static str {
    match status {
        EntryStatus::Confirmed => "",
        EntryStatus::Pending => " (sending...)",
        EntryStatus::Unconfirmed => " (not confirmed by backend)",
    }
}

/// Plain-text form of one transcript entry
pub fn render_entry(entry: &TranscriptEntry) -> String {
    format!(
        "[{}]{} {}",
        entry.message.role.label(),
        status_suffix(entry.status),
        entry.message.content
    )
}

/// Entries of `after` that were not already shown as the leading part of `before`.
///
/// The backend sends the whole history back on every turn, so the common
/// prefix is what the operator has already seen.
pub fn new_entries<'a>(
    before: &[TranscriptEntry],
    after: &'a [TranscriptEntry],
) -> &'a [TranscriptEntry] {
    let seen = before
        .iter()
        .zip(after)
        .take_while(|(old, new)| {
            old.status == EntryStatus::Confirmed && old.message == new.message
        })
        .count();
    &after[seen..]
}

pub fn print_entries(entries: &[TranscriptEntry]) {
    for entry in entries {
        // Tool-call turns carry no text
        if entry.message.content.trim().is_empty() {
            continue;
        }
        let label = format!("[{}]", entry.message.role.label())
            .with(role_color(&entry.message.role))
            .bold();
        let suffix = status_suffix(entry.status).dark_grey();
        println!("{}{} {}", label, suffix, entry.message.content);
    }
}

pub fn print_session_summary(snapshot: &SessionSnapshot) {
    if !snapshot.initialized {
        println!("Session: {}", "not initialized".yellow());
        return;
    }
    println!("Session: {}", "initialized".green());
    println!(
        "Current agent: {}",
        snapshot.current_agent.as_deref().unwrap_or("none")
    );
    if snapshot.available_agents.is_empty() {
        println!("Agents: none");
    } else {
        println!("Agents: {}", snapshot.available_agents.join(", "));
    }
    println!("Messages: {}", snapshot.messages.len());
}
