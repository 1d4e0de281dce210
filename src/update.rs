//! Inbound Telegram webhook update (only the fields the analysis flow reads)

use serde::Deserialize;

/// Telegram Update object (simplified)
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: Option<i64>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub edited_message: Option<Message>,
    #[serde(default)]
    pub channel_post: Option<Message>,
}

/// Telegram Message object (simplified)
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    /// Photo (array of sizes, ascending resolution)
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
}

/// Telegram Chat object
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Telegram photo size
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl PhotoSize {
    /// Short human-readable size, e.g. `1280x720, 98000 bytes`
    pub fn summary(&self) -> String {
        let resolution = match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            _ => "unknown resolution".to_string(),
        };
        match self.file_size {
            Some(size) => format!("{}, {} bytes", resolution, size),
            None => resolution,
        }
    }
}

impl Update {
    /// Deserialize a raw webhook body.
    pub fn parse(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// The message this update is about: a new message, an edit, or a channel post.
    pub fn effective_message(&self) -> Option<&Message> {
        self.message
            .as_ref()
            .or(self.edited_message.as_ref())
            .or(self.channel_post.as_ref())
    }

    pub fn chat_id(&self) -> Option<i64> {
        self.effective_message().map(|m| m.chat.id)
    }

    /// Photo variants of the effective message; empty when there are none.
    pub fn photos(&self) -> &[PhotoSize] {
        self.effective_message()
            .and_then(|m| m.photo.as_deref())
            .unwrap_or(&[])
    }
}

/// Pick the highest-resolution variant. Telegram orders sizes ascending,
/// so that is always the last entry.
pub fn largest_photo(photos: &[PhotoSize]) -> Option<&PhotoSize> {
    photos.last()
}
