use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::Message;

/// `GET /api/state`. An uninitialized backend only sends `initialized`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateResponse {
    pub initialized: bool,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub available_agents: Vec<String>,
    #[serde(default)]
    pub agent_name: Option<String>,
}

/// Acknowledgement body of `POST /api/init`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitAck {
    pub status: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Final answer extracted by the backend from the last turn
    #[serde(default)]
    pub response: String,
    pub agent_name: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default, rename = "uploaded_files")]
    pub uploaded: Vec<String>,
}

/// Human readable message from a structured error body.
///
/// Understands `{"detail": "..."}`, validation lists of the form
/// `{"detail": [{"loc": [..], "msg": ".."}]}` and `{"message": "..."}`.
pub fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    match value.get("detail") {
        Some(Value::String(detail)) if !detail.trim().is_empty() => {
            return Some(detail.clone());
        }
        Some(Value::Array(items)) => {
            let parts: Vec<String> = items.iter().filter_map(validation_item).collect();
            if !parts.is_empty() {
                return Some(parts.join("; "));
            }
        }
        _ => {}
    }

    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.trim().is_empty())
        .map(str::to_string)
}

fn validation_item(item: &Value) -> Option<String> {
    let msg = item.get("msg").and_then(Value::as_str)?;
    let field = item
        .get("loc")
        .and_then(Value::as_array)
        .and_then(|loc| loc.last())
        .map(|last| match last {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

    Some(match field {
        Some(field) => format!("{}: {}", field, msg),
        None => msg.to_string(),
    })
}
