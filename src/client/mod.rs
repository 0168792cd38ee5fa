pub mod error;
pub mod http;

use async_trait::async_trait;
use std::path::Path;

use crate::core::{ChatReply, InitAck, SessionConfig, SessionSnapshot, UploadReceipt};
pub use error::ClientError;
pub use http::AgentClient;

/// A file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .to_string();
        Self {
            file_name,
            bytes,
            mime,
        }
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

/// The four backend round trips the session controller depends on.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_state(&self) -> Result<SessionSnapshot, ClientError>;

    async fn init_session(&self, config: &SessionConfig) -> Result<InitAck, ClientError>;

    async fn send_message(&self, content: &str) -> Result<ChatReply, ClientError>;

    async fn upload_files(&self, files: Vec<FileUpload>) -> Result<UploadReceipt, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_guessed_from_name() {
        assert_eq!(FileUpload::new("notes.txt", vec![]).mime, "text/plain");
        assert_eq!(
            FileUpload::new("blob", vec![1, 2]).mime,
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_from_path_reads_bytes() {
        let path = std::env::temp_dir().join(format!("agentdeck-upload-{}.csv", std::process::id()));
        tokio::fs::write(&path, b"a,b\n1,2\n").await.unwrap();

        let upload = FileUpload::from_path(&path).await.unwrap();
        assert_eq!(upload.bytes, b"a,b\n1,2\n");
        assert_eq!(upload.mime, "text/csv");
        assert!(upload.file_name.ends_with(".csv"));

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
