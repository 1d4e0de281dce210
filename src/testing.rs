//! In-memory `Messenger` and `ChartAnalyzer` doubles for flow and webhook tests.

use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::chart::{sample_png, ChartImage};
use crate::llm::{ChartAnalyzer, LlmError};
use crate::platform::{Messenger, RemoteFile, TextFormat};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    pub format: TextFormat,
}

pub struct MockMessenger {
    sent: Mutex<Vec<SentMessage>>,
    requested_files: Mutex<Vec<String>>,
    download: std::result::Result<Vec<u8>, String>,
    failing_format: Option<TextFormat>,
}

impl MockMessenger {
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            requested_files: Mutex::new(Vec::new()),
            download: Ok(bytes),
            failing_format: None,
        }
    }

    pub fn with_png() -> Self {
        Self::with_bytes(sample_png(4, 4))
    }

    pub fn failing_download(reason: &str) -> Self {
        Self {
            download: Err(reason.to_string()),
            ..Self::with_bytes(Vec::new())
        }
    }

    /// Make every send with the given format fail
    pub fn failing_format(mut self, format: TextFormat) -> Self {
        self.failing_format = Some(format);
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn requested_files(&self) -> Vec<String> {
        self.requested_files.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
        self.requested_files.lock().unwrap().clear();
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_message(&self, chat_id: i64, text: &str, format: TextFormat) -> Result<()> {
        if self.failing_format == Some(format) {
            bail!("Bad Request: can't parse entities");
        }
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            format,
        });
        Ok(())
    }

    async fn get_file(&self, file_id: &str) -> Result<RemoteFile> {
        self.requested_files
            .lock()
            .unwrap()
            .push(file_id.to_string());
        Ok(RemoteFile {
            file_id: file_id.to_string(),
            path: format!("photos/{}.jpg", file_id),
        })
    }

    async fn download(&self, _file: &RemoteFile) -> Result<Vec<u8>> {
        match &self.download {
            Ok(bytes) => Ok(bytes.clone()),
            Err(reason) => bail!("{}", reason),
        }
    }
}

enum Reply {
    Text(String),
    Api { code: u16, message: String },
    Fail(String),
}

pub struct MockAnalyzer {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
}

impl MockAnalyzer {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(Reply::Text(text.to_string()))
    }

    pub fn api_error(code: u16, message: &str) -> Self {
        Self::new(Reply::Api {
            code,
            message: message.to_string(),
        })
    }

    pub fn failing(message: &str) -> Self {
        Self::new(Reply::Fail(message.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChartAnalyzer for MockAnalyzer {
    async fn generate_content(&self, _image: &ChartImage, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Api { code, message } => Err(LlmError::Api {
                code: *code,
                status: "RESOURCE_EXHAUSTED".to_string(),
                message: message.clone(),
            }),
            Reply::Fail(message) => Err(anyhow::anyhow!("{}", message).into()),
        }
    }
}
