#![allow(dead_code)]

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// A canned failure: status code plus raw body
#[derive(Debug, Clone)]
pub struct Failure {
    pub status: u16,
    pub body: String,
}

impl Failure {
    pub fn detail(status: u16, detail: &str) -> Self {
        Self {
            status,
            body: json!({ "detail": detail }).to_string(),
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct UploadedPart {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct MockInner {
    pub initialized: bool,
    pub messages: Vec<Value>,
    pub agents: Vec<String>,
    pub agent_name: String,
    pub reply: String,
    pub init_failure: Option<Failure>,
    pub chat_failure: Option<Failure>,
    pub last_init: Option<Value>,
    pub uploads: Vec<UploadedPart>,
    pub hits: Vec<&'static str>,
}

impl Default for MockInner {
    fn default() -> Self {
        Self {
            initialized: false,
            messages: Vec::new(),
            agents: vec!["coder".to_string(), "browser".to_string()],
            agent_name: "coder".to_string(),
            reply: "hi".to_string(),
            init_failure: None,
            chat_failure: None,
            last_init: None,
            uploads: Vec::new(),
            hits: Vec::new(),
        }
    }
}

/// In-process stand-in for the agent backend's `/api` routes.
#[derive(Clone, Default)]
pub struct MockBackend {
    pub inner: Arc<Mutex<MockInner>>,
}

impl MockBackend {
    pub fn with<F: FnOnce(&mut MockInner)>(self, edit: F) -> Self {
        edit(&mut self.inner.lock().unwrap());
        self
    }

    pub fn edit<F: FnOnce(&mut MockInner)>(&self, edit: F) {
        edit(&mut self.inner.lock().unwrap());
    }

    pub fn hits(&self, route: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .hits
            .iter()
            .filter(|hit| **hit == route)
            .count()
    }

    /// Serve on an ephemeral port, returning the base url
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/api/state", get(get_state))
            .route("/api/init", post(post_init))
            .route("/api/chat", post(post_chat))
            .route("/api/upload", post(post_upload))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

/// Base url of a port nothing listens on
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn fail(failure: Failure) -> Response {
    let status = StatusCode::from_u16(failure.status).unwrap();
    (status, failure.body).into_response()
}

async fn get_state(State(mock): State<MockBackend>) -> Response {
    let mut inner = mock.inner.lock().unwrap();
    inner.hits.push("state");
    if !inner.initialized {
        return Json(json!({ "initialized": false })).into_response();
    }
    Json(json!({
        "initialized": true,
        "agent_name": inner.agent_name,
        "messages": inner.messages,
        "available_agents": inner.agents,
    }))
    .into_response()
}

async fn post_init(State(mock): State<MockBackend>, Json(body): Json<Value>) -> Response {
    let mut inner = mock.inner.lock().unwrap();
    inner.hits.push("init");
    inner.last_init = Some(body);
    if let Some(failure) = inner.init_failure.clone() {
        return fail(failure);
    }
    inner.initialized = true;
    Json(json!({ "status": "success", "message": "Environment initialized" })).into_response()
}

async fn post_chat(State(mock): State<MockBackend>, Json(body): Json<Value>) -> Response {
    let mut inner = mock.inner.lock().unwrap();
    inner.hits.push("chat");
    if !inner.initialized {
        return fail(Failure::detail(400, "Session not initialized"));
    }
    if let Some(failure) = inner.chat_failure.clone() {
        return fail(failure);
    }

    let message = body["message"].as_str().unwrap_or_default().to_string();
    let reply = inner.reply.clone();
    inner.messages.push(json!({ "role": "user", "content": message }));
    inner.messages.push(json!({ "role": "assistant", "content": reply }));

    Json(json!({
        "response": reply,
        "agent_name": inner.agent_name,
        "messages": inner.messages,
    }))
    .into_response()
}

async fn post_upload(State(mock): State<MockBackend>, mut multipart: Multipart) -> Response {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap().to_vec();
        parts.push(UploadedPart {
            field: field_name,
            file_name,
            content_type,
            bytes,
        });
    }

    let mut inner = mock.inner.lock().unwrap();
    inner.hits.push("upload");
    if !inner.initialized {
        return fail(Failure::detail(400, "Session not initialized"));
    }
    let uploaded: Vec<String> = parts
        .iter()
        .map(|part| format!("File uploaded: /workplace/files/{}", part.file_name))
        .collect();
    inner.uploads.extend(parts);
    Json(json!({ "uploaded_files": uploaded })).into_response()
}
