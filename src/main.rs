mod bot;
mod chart;
mod config;
mod llm;
mod platform;
mod update;
mod webhook;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::config::Config;
use crate::llm::{ChartAnalyzer, GeminiClient};
use crate::platform::telegram::TelegramMessenger;
use crate::platform::Messenger;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chartsight=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    if let Some(path) = &config_path {
        info!("Loading configuration from: {}", path.display());
    }
    let config = Config::load(config_path.as_deref()).context("Failed to load configuration")?;
    let prompt = config.analysis_prompt()?;

    info!("Configuration loaded successfully");
    info!("  Model: {}", config.gemini.model);
    info!("  Bind address: {}", config.server.bind_address);
    info!("  Prompt: {} chars", prompt.len());

    let messenger: Option<Arc<dyn Messenger>> = match config.telegram_token() {
        Some(token) => Some(Arc::new(TelegramMessenger::new(token))),
        None => {
            warn!("TELEGRAM_TOKEN is not set; webhook updates will be rejected");
            None
        }
    };

    let analyzer: Option<Arc<dyn ChartAnalyzer>> = match config.gemini_api_key() {
        Some(key) => {
            let client = GeminiClient::new(config.gemini.clone(), key);
            info!("Gemini client ready (model {})", client.model());
            Some(Arc::new(client))
        }
        None => {
            warn!("GEMINI_API_KEY is not set; analyses will fail");
            None
        }
    };

    let state = Arc::new(AppState::new(messenger, analyzer, prompt));

    info!("Webhook is starting...");
    webhook::serve(state, &config.server.bind_address).await?;

    Ok(())
}
