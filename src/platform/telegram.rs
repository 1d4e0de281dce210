use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileId, ParseMode};
use tracing::debug;

use crate::platform::{Messenger, RemoteFile, TextFormat};

/// Stay under Telegram's 4096 char message limit
const MAX_MESSAGE_LEN: usize = 4000;

const TRUNCATION_MARK: &str = "\n…";

/// Fit text into a single Telegram message, cutting long text at the last
/// newline or space that leaves a non-empty prefix.
fn fit_message(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }

    let mut end = max_len.saturating_sub(TRUNCATION_MARK.len());
    // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }

    let window = &text[..end];
    let cut = window
        .rfind('\n')
        .filter(|&pos| !window[..pos].trim().is_empty())
        .or_else(|| {
            window
                .rfind(' ')
                .filter(|&pos| !window[..pos].trim().is_empty())
        })
        .unwrap_or(end);

    format!("{}{}", window[..cut].trim_end(), TRUNCATION_MARK)
}

/// Telegram Bot API client backed by teloxide
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_message(&self, chat_id: i64, text: &str, format: TextFormat) -> Result<()> {
        let fitted = fit_message(text, MAX_MESSAGE_LEN);
        if fitted.len() != text.len() {
            debug!(
                "Truncated message for chat {} from {} to {} bytes",
                chat_id,
                text.len(),
                fitted.len()
            );
        }

        let request = self.bot.send_message(ChatId(chat_id), fitted);
        let sent = match format {
            TextFormat::Plain => request.await,
            // Legacy Markdown: model output rarely escapes MarkdownV2's reserved characters
            #[allow(deprecated)]
            TextFormat::Markdown => request.parse_mode(ParseMode::Markdown).await,
        };
        sent.with_context(|| format!("Failed to send message to chat {}", chat_id))?;
        Ok(())
    }

    async fn get_file(&self, file_id: &str) -> Result<RemoteFile> {
        let file = self
            .bot
            .get_file(FileId(file_id.to_string()))
            .await
            .with_context(|| format!("Failed to resolve Telegram file {}", file_id))?;

        Ok(RemoteFile {
            file_id: file_id.to_string(),
            path: file.path,
        })
    }

    async fn download(&self, file: &RemoteFile) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.bot
            .download_file(&file.path, &mut bytes)
            .await
            .with_context(|| format!("Failed to download Telegram file {}", file.file_id))?;

        debug!("Downloaded {} bytes for file {}", bytes.len(), file.file_id);
        Ok(bytes)
    }
}
