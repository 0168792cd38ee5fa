use std::fmt;

use crate::client::ClientError;

/// Work the controller is waiting on while `Busy`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Sending,
    Uploading,
    Refreshing,
}

/// Where the session controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Uninitialized,
    /// Mount-time state fetch in flight
    Checking,
    Initializing,
    Ready,
    Busy(Activity),
}

/// Something that moves the controller between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    CheckState,
    SubmitConfig,
    InitFailed,
    StateLoaded { initialized: bool },
    StateFailed,
    SubmitMessage,
    SendResolved,
    SelectFiles,
    UploadResolved,
    Refresh,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Checking => "checking session state",
            Phase::Initializing => "initializing",
            Phase::Ready => "ready",
            Phase::Busy(Activity::Sending) => "sending",
            Phase::Busy(Activity::Uploading) => "uploading",
            Phase::Busy(Activity::Refreshing) => "refreshing",
        }
    }

    /// Waiting on the backend
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Phase::Checking | Phase::Initializing | Phase::Busy(_))
    }

    /// Phase after `event`, or the error to report when the event is not
    /// allowed from here.
    pub fn next(self, event: Event) -> Result<Phase, ClientError> {
        use Event::*;
        use Phase::*;

        let next = match (self, event) {
            (Uninitialized, CheckState) => Checking,
            (Uninitialized, SubmitConfig) => Initializing,

            (Checking, StateLoaded { initialized: true }) => Ready,
            (Checking, StateLoaded { initialized: false }) | (Checking, StateFailed) => {
                Uninitialized
            }

            (Initializing, InitFailed) => Uninitialized,
            (Initializing, StateLoaded { initialized: true }) => Ready,
            (Initializing, StateLoaded { initialized: false }) | (Initializing, StateFailed) => {
                Uninitialized
            }

            (Ready, SubmitMessage) => Busy(Activity::Sending),
            (Ready, SelectFiles) => Busy(Activity::Uploading),
            (Ready, Refresh) => Busy(Activity::Refreshing),

            (Busy(Activity::Sending), SendResolved) => Ready,
            (Busy(Activity::Uploading), UploadResolved) => Ready,
            (Busy(Activity::Refreshing), StateLoaded { initialized: true }) => Ready,
            (Busy(Activity::Refreshing), StateLoaded { initialized: false }) => Uninitialized,
            (Busy(Activity::Refreshing), StateFailed) => Ready,

            (phase, _) if phase.is_in_flight() => return Err(ClientError::Busy(phase.as_str())),
            (Uninitialized, _) => return Err(ClientError::NotInitialized),
            (Ready, CheckState) | (Ready, SubmitConfig) => {
                return Err(ClientError::AlreadyInitialized)
            }
            // Resolution events only arrive from the controller for calls it started
            (phase, event) => {
                tracing::warn!("Ignoring {:?} while {}", event, phase);
                return Err(ClientError::Busy(phase.as_str()));
            }
        };

        Ok(next)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
