use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::chart::ChartImage;
use crate::llm::{ChartAnalyzer, LlmError};
use crate::platform::{Messenger, TextFormat};
use crate::update::{largest_photo, PhotoSize, Update};

pub const PHOTO_REQUIRED_TEXT: &str = "Please send me a photo of a chart.";
pub const ANALYZING_TEXT: &str = "⏳ Analyzing the chart with Gemini AI...";
const RESULT_HEADER: &str = "✅ *GEMINI AI ANALYSIS RESULT*:";

/// Shared application state, read-only after startup
pub struct AppState {
    pub messenger: Option<Arc<dyn Messenger>>,
    pub analyzer: Option<Arc<dyn ChartAnalyzer>>,
    pub prompt: Arc<str>,
}

impl AppState {
    pub fn new(
        messenger: Option<Arc<dyn Messenger>>,
        analyzer: Option<Arc<dyn ChartAnalyzer>>,
        prompt: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            messenger,
            analyzer,
            prompt: prompt.into(),
        }
    }

    pub fn messenger_ready(&self) -> bool {
        self.messenger.is_some()
    }
}

/// How a photo-analysis flow ended
#[derive(Debug)]
pub enum FlowOutcome {
    /// The analysis was delivered to the chat
    Analyzed,
    /// The update had no photo; the user was asked for one
    PhotoMissing,
    /// The flow failed after acknowledging; the error was reported to the chat
    Failed(FlowError),
}

/// A failure after the acknowledgement was sent
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("photo download failed: {0:#}")]
    Download(anyhow::Error),

    #[error("Gemini API error: {0}")]
    AiService(LlmError),

    #[error("{0:#}")]
    Unknown(anyhow::Error),
}

impl From<LlmError> for FlowError {
    fn from(err: LlmError) -> Self {
        match err {
            err @ LlmError::Api { .. } => FlowError::AiService(err),
            LlmError::Other(e) => FlowError::Unknown(e),
        }
    }
}

impl FlowError {
    /// Text sent to the chat for this failure
    pub fn user_message(&self) -> String {
        match self {
            FlowError::AiService(e) => format!("❌ Gemini API error: {}", e),
            FlowError::Download(e) | FlowError::Unknown(e) => format!("❌ Unknown error: {:#}", e),
        }
    }
}

/// Run the photo-analysis flow for one update and report any failure to the chat.
///
/// Errors returned from here mean nothing user-visible could be delivered:
/// no messaging client, no chat to reply to, or a failed send of the
/// prompt, acknowledgement or error report.
pub async fn process_update(state: &AppState, update: &Update) -> Result<FlowOutcome> {
    let messenger = state
        .messenger
        .as_deref()
        .context("Telegram client is not configured (TELEGRAM_TOKEN is unset)")?;
    let chat_id = update.chat_id().context("Update carries no chat")?;

    let outcome = run_flow(state, messenger, chat_id, update.photos()).await?;

    if let FlowOutcome::Failed(err) = &outcome {
        warn!("Analysis for chat {} failed: {}", chat_id, err);
        messenger
            .send_message(chat_id, &err.user_message(), TextFormat::Plain)
            .await
            .context("Failed to report analysis error")?;
    }

    Ok(outcome)
}

async fn run_flow(
    state: &AppState,
    messenger: &dyn Messenger,
    chat_id: i64,
    photos: &[PhotoSize],
) -> Result<FlowOutcome> {
    let Some(photo) = largest_photo(photos) else {
        info!("Update for chat {} has no photo", chat_id);
        messenger
            .send_message(chat_id, PHOTO_REQUIRED_TEXT, TextFormat::Plain)
            .await?;
        return Ok(FlowOutcome::PhotoMissing);
    };

    info!(
        "Analyzing photo {} ({}; {} variants) for chat {}",
        photo.file_id,
        photo.summary(),
        photos.len(),
        chat_id
    );
    messenger
        .send_message(chat_id, ANALYZING_TEXT, TextFormat::Plain)
        .await?;

    let analysis = match analyze_photo(state, messenger, photo).await {
        Ok(text) => text,
        Err(err) => return Ok(FlowOutcome::Failed(err)),
    };

    let reply = format!("{}\n\n{}", RESULT_HEADER, analysis);
    if let Err(e) = messenger
        .send_message(chat_id, &reply, TextFormat::Markdown)
        .await
    {
        return Ok(FlowOutcome::Failed(FlowError::Unknown(e)));
    }

    info!("Analysis delivered to chat {} ({} chars)", chat_id, analysis.len());
    Ok(FlowOutcome::Analyzed)
}

async fn analyze_photo(
    state: &AppState,
    messenger: &dyn Messenger,
    photo: &PhotoSize,
) -> Result<String, FlowError> {
    let image = fetch_image(messenger, photo)
        .await
        .map_err(FlowError::Download)?;

    let analyzer = state.analyzer.as_deref().ok_or_else(|| {
        FlowError::Unknown(anyhow::anyhow!(
            "Gemini client is not configured (GEMINI_API_KEY is unset)"
        ))
    })?;

    Ok(analyzer.generate_content(&image, &state.prompt).await?)
}

async fn fetch_image(messenger: &dyn Messenger, photo: &PhotoSize) -> Result<ChartImage> {
    let file = messenger.get_file(&photo.file_id).await?;
    let bytes = messenger.download(&file).await?;
    let image = ChartImage::decode(bytes)?;

    let (width, height) = image.dimensions();
    debug!("Decoded {} chart {}x{}", image.mime_type(), width, height);
    Ok(image)
}
