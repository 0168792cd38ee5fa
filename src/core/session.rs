use serde::{Deserialize, Serialize};

use super::message::Message;
use super::wire::{ChatReply, StateResponse};

pub const DEFAULT_MODEL: &str = "gpt-4o-2024-08-06";

/// Environment the backend builds when a session is initialized.
///
/// Serialized as-is for `POST /api/init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub container_name: String,
    pub port: u16,
    pub test_pull_name: String,
    pub git_clone: bool,
    pub local_env: bool,
    pub model: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            container_name: "auto_agent".to_string(),
            port: 12347,
            test_pull_name: "autoagent_mirror".to_string(),
            git_clone: true,
            local_env: false,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Client-visible state of the backend session at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub initialized: bool,
    pub messages: Vec<Message>,
    pub available_agents: Vec<String>,
    pub current_agent: Option<String>,
}

impl SessionSnapshot {
    /// Snapshot after a successful chat turn: the backend's list replaces ours.
    pub fn after_chat(&self, reply: &ChatReply) -> Self {
        Self {
            initialized: true,
            messages: reply.messages.clone(),
            available_agents: self.available_agents.clone(),
            current_agent: Some(reply.agent_name.clone()),
        }
    }
}

impl From<StateResponse> for SessionSnapshot {
    fn from(state: StateResponse) -> Self {
        if !state.initialized {
            return Self::default();
        }

        let mut available_agents: Vec<String> = Vec::with_capacity(state.available_agents.len());
        for agent in state.available_agents {
            if !available_agents.contains(&agent) {
                available_agents.push(agent);
            }
        }

        Self {
            initialized: true,
            messages: state.messages,
            available_agents,
            current_agent: state.agent_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.container_name, "auto_agent");
        assert_eq!(config.port, 12347);
        assert_eq!(config.test_pull_name, "autoagent_mirror");
        assert!(config.git_clone);
        assert!(!config.local_env);
        assert_eq!(config.model, "gpt-4o-2024-08-06");
    }

    #[test]
    fn test_config_wire_keys() {
        let body = serde_json::to_value(SessionConfig::default()).unwrap();
        for key in [
            "container_name",
            "port",
            "test_pull_name",
            "git_clone",
            "local_env",
            "model",
        ] {
            assert!(body.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_uninitialized_state_ignores_payload() {
        let state: StateResponse = serde_json::from_str(
            r#"{"initialized":false,"messages":[{"role":"user","content":"stale"}],"agent_name":"x"}"#,
        )
        .unwrap();
        assert_eq!(SessionSnapshot::from(state), SessionSnapshot::default());
    }

    #[test]
    fn test_agents_deduplicated_in_order() {
        let state: StateResponse = serde_json::from_str(
            r#"{"initialized":true,"messages":[],"available_agents":["coder","browser","coder"],"agent_name":"coder"}"#,
        )
        .unwrap();
        let snapshot = SessionSnapshot::from(state);
        assert_eq!(snapshot.available_agents, vec!["coder", "browser"]);
        assert_eq!(snapshot.current_agent.as_deref(), Some("coder"));
    }
}
