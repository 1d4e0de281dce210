pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// How outgoing text should be rendered by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    Markdown,
}

/// A file stored on the messaging platform, resolved from a file id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub file_id: String,
    /// Platform-side path used for the download request
    pub path: String,
}

/// The operations the analysis flow needs from a messaging platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str, format: TextFormat) -> Result<()>;

    async fn get_file(&self, file_id: &str) -> Result<RemoteFile>;

    async fn download(&self, file: &RemoteFile) -> Result<Vec<u8>>;
}
