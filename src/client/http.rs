use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use super::{Backend, ClientError, FileUpload};
use crate::core::wire::{error_detail, ChatRequest};
use crate::core::{
    BackendConfig, ChatReply, InitAck, SessionConfig, SessionSnapshot, StateResponse,
    UploadReceipt,
};

/// HTTP adapter for the backend's `/api` surface.
///
/// One request per call, no retries. Every failure comes back as a
/// [`ClientError`] with operator-readable text.
#[derive(Debug, Clone)]
pub struct AgentClient {
    base_url: Url,
    client: Client,
}

impl AgentClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };

        let mut url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("expected an http(s) url".to_string()));
        }
        // Keep any path prefix when joining endpoint paths onto it
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Network(format!("could not build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: url,
            client,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, ClientError> {
        Self::new(&config.url, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
                reason: e.to_string(),
            })
    }

    /// Current session state as the backend sees it
    pub async fn fetch_state(&self) -> Result<SessionSnapshot, ClientError> {
        let url = self.endpoint("api/state")?;
        tracing::debug!("Making GET request to: {}", url);

        let response = self.client.get(url).send().await.map_err(transport_error)?;
        let status = response.status();
        tracing::debug!("GET /api/state response status: {}", status);

        if !status.is_success() {
            return Err(ClientError::Network(
                failure_message("GET /api/state", response).await,
            ));
        }

        let state: StateResponse = decode("GET /api/state", response).await?;
        Ok(SessionSnapshot::from(state))
    }

    /// Ask the backend to build its environment and agents
    pub async fn init_session(&self, config: &SessionConfig) -> Result<InitAck, ClientError> {
        let url = self.endpoint("api/init")?;
        tracing::debug!("POST /api/init request body: {:?}", config);

        let response = self
            .client
            .post(url)
            .json(config)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        tracing::debug!("POST /api/init response status: {}", status);

        if !status.is_success() {
            let message = failure_message("POST /api/init", response).await;
            tracing::debug!("Session init rejected with status {}: {}", status, message);
            return Err(ClientError::Validation(message));
        }

        // The ack body is informational only
        let text = response.text().await.unwrap_or_default();
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }

    pub async fn send_message(&self, content: &str) -> Result<ChatReply, ClientError> {
        let url = self.endpoint("api/chat")?;
        tracing::debug!("POST /api/chat with {} chars", content.len());

        let response = self
            .client
            .post(url)
            .json(&ChatRequest { message: content })
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        tracing::debug!("POST /api/chat response status: {}", status);

        if !status.is_success() {
            return Err(ClientError::Network(
                failure_message("POST /api/chat", response).await,
            ));
        }

        decode("POST /api/chat", response).await
    }

    pub async fn upload_files(&self, files: Vec<FileUpload>) -> Result<UploadReceipt, ClientError> {
        let url = self.endpoint("api/upload")?;
        tracing::debug!("POST /api/upload with {} file(s)", files.len());

        let mut form = multipart::Form::new();
        for file in files {
            let part = multipart::Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.mime)
                .map_err(|e| ClientError::Network(format!("invalid upload content type: {}", e)))?;
            form = form.part("files", part);
        }

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        tracing::debug!("POST /api/upload response status: {}", status);

        if !status.is_success() {
            return Err(ClientError::Network(
                failure_message("POST /api/upload", response).await,
            ));
        }

        decode("POST /api/upload", response).await
    }
}

#[async_trait]
impl Backend for AgentClient {
    async fn fetch_state(&self) -> Result<SessionSnapshot, ClientError> {
        AgentClient::fetch_state(self).await
    }

    async fn init_session(&self, config: &SessionConfig) -> Result<InitAck, ClientError> {
        AgentClient::init_session(self, config).await
    }

    async fn send_message(&self, content: &str) -> Result<ChatReply, ClientError> {
        AgentClient::send_message(self, content).await
    }

    async fn upload_files(&self, files: Vec<FileUpload>) -> Result<UploadReceipt, ClientError> {
        AgentClient::upload_files(self, files).await
    }
}

fn transport_error(err: reqwest::Error) -> ClientError {
    ClientError::Network(format!("could not reach backend: {}", err))
}

async fn failure_message(endpoint: &str, response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error_detail(&body).unwrap_or_else(|| format!("{} failed with status {}", endpoint, status))
}

async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, ClientError> {
    let text = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&text).map_err(|e| {
        tracing::debug!("Failed to parse {} response: {}", endpoint, e);
        ClientError::Network(format!("unexpected response from {}: {}", endpoint, e))
    })
}
