use crate::core::{Message, SessionConfig, SessionSnapshot};

/// How far the backend has vouched for a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Part of a list the backend returned
    Confirmed,
    /// Optimistic user turn, request still in flight
    Pending,
    /// Optimistic user turn whose request failed; kept until the next
    /// backend list replaces it
    Unconfirmed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub message: Message,
    pub status: EntryStatus,
}

/// Data the session view renders from.
///
/// Values are replaced whole. The only partial change allowed is appending
/// the optimistic user turn (and later marking it unconfirmed).
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    config: SessionConfig,
    snapshot: SessionSnapshot,
    optimistic: Vec<TranscriptEntry>,
    loading: bool,
    uploading: bool,
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn uploading(&self) -> bool {
        self.uploading
    }

    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
    }

    /// Install a backend-confirmed snapshot. Any client-side entries are dropped.
    pub fn set_snapshot(&mut self, snapshot: SessionSnapshot) {
        self.snapshot = snapshot;
        self.optimistic.clear();
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_uploading(&mut self, uploading: bool) {
        self.uploading = uploading;
    }

    pub fn append_optimistic(&mut self, message: Message) {
        self.optimistic.push(TranscriptEntry {
            message,
            status: EntryStatus::Pending,
        });
    }

    pub fn mark_unconfirmed(&mut self) {
        for entry in &mut self.optimistic {
            if entry.status == EntryStatus::Pending {
                entry.status = EntryStatus::Unconfirmed;
            }
        }
    }

    /// Everything the transcript shows, backend messages first
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.snapshot
            .messages
            .iter()
            .map(|message| TranscriptEntry {
                message: message.clone(),
                status: EntryStatus::Confirmed,
            })
            .chain(self.optimistic.iter().cloned())
            .collect()
    }
}
