use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Author of a conversation turn.
///
/// The backend sends an open string tag; anything we don't recognise is kept
/// verbatim in `Unknown` so it round-trips and still renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
    Unknown(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
            Role::Unknown(raw) => raw,
        }
    }

    /// Label shown next to a message in the transcript
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Assistant",
            Role::System => "System",
            Role::Tool => "Tool",
            Role::Unknown(_) => "Message",
        }
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        match raw {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "system" => Role::System,
            "tool" => Role::Tool,
            other => Role::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::from(raw.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    // Tool-call turns come back with `content: null`
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Agent addressed by an `@name` mention in `text`, if it names one of `agents`.
///
/// When several mentions match, the last one wins, which is how the backend
/// routes the turn.
pub fn mentioned_agent<'a>(text: &str, agents: &'a [String]) -> Option<&'a str> {
    text.split_whitespace()
        .filter_map(|word| word.strip_prefix('@'))
        .filter_map(|key| agents.iter().find(|agent| agent.as_str() == key))
        .last()
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_roles_parse() {
        let msg: Message = serde_json::from_str(r#"{"role":"tool","content":"ok"}"#).unwrap();
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.role.label(), "Tool");
    }

    #[test]
    fn test_unknown_role_falls_back() {
        let msg: Message =
            serde_json::from_str(r#"{"role":"function","content":"42"}"#).unwrap();
        assert_eq!(msg.role, Role::Unknown("function".to_string()));
        assert_eq!(msg.role.label(), "Message");
        assert_eq!(serde_json::to_value(&msg).unwrap()["role"], "function");
    }

    #[test]
    fn test_null_content_and_extra_fields() {
        let msg: Message = serde_json::from_str(
            r#"{"role":"assistant","content":null,"tool_calls":[{"id":"1"}],"sender":"coder"}"#,
        )
        .unwrap();
        assert_eq!(msg, Message::assistant(""));
    }

    #[test]
    fn test_mentioned_agent_last_match_wins() {
        let agents = vec!["coder".to_string(), "browser".to_string()];
        assert_eq!(
            mentioned_agent("@coder then @browser please", &agents),
            Some("browser")
        );
        assert_eq!(mentioned_agent("ask @nobody", &agents), None);
        assert_eq!(mentioned_agent("no mention", &agents), None);
    }
}
