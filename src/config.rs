use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: String::new(),
            max_output_tokens: None,
        }
    }
}

impl GeminiConfig {
    /// Returns the effective base_url: if the stored value is empty,
    /// fall back to the public Generative Language endpoint.
    pub fn effective_base_url(&self) -> &str {
        if self.base_url.is_empty() {
            "https://generativelanguage.googleapis.com/v1beta"
        } else {
            self.base_url.trim_end_matches('/')
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AnalysisConfig {
    /// Inline prompt text; overrides the built-in prompt
    #[serde(default)]
    pub prompt: Option<String>,
    /// File to read the prompt from; takes precedence over `prompt`
    #[serde(default)]
    pub prompt_file: Option<PathBuf>,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

pub const DEFAULT_ANALYSIS_PROMPT: &str = "You are an experienced financial analyst and technical trader. \
Study the attached price chart and write a concise technical analysis for a retail trader.\n\n\
Cover, where the chart allows it:\n\
1. Instrument and timeframe, if visible.\n\
2. The prevailing trend (up, down, sideways) and its strength.\n\
3. Key support and resistance levels with approximate prices.\n\
4. Notable chart or candlestick patterns.\n\
5. What the visible indicators (volume, moving averages, RSI, MACD, etc.) suggest.\n\
6. Likely scenarios: a bullish case, a bearish case, and the levels that would confirm each.\n\n\
Keep it under 300 words. Write each point on its own line starting with \"- \" \
and use single asterisks only in pairs for *bold* text. \
If the image is not a financial chart, say so briefly instead of guessing. \
End with a one-line reminder that this is not financial advice.";

impl Config {
    /// Load configuration from an explicit path, or from `config.toml` in the
    /// working directory when it exists, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Config::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay environment variables. Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = var("TELEGRAM_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(key) = var("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key);
        }
        if let Some(model) = var("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(port) = var("PORT") {
            self.server.bind_address = format!("0.0.0.0:{}", port.trim());
        }
    }

    pub fn telegram_token(&self) -> Option<&str> {
        self.telegram
            .bot_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }

    pub fn gemini_api_key(&self) -> Option<&str> {
        self.gemini
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
    }

    /// Resolve the analysis prompt: `prompt_file`, then `prompt`, then the built-in default.
    pub fn analysis_prompt(&self) -> Result<String> {
        if let Some(path) = &self.analysis.prompt_file {
            let prompt = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;
            let prompt = prompt.trim();
            if prompt.is_empty() {
                bail!("Prompt file is empty: {}", path.display());
            }
            return Ok(prompt.to_string());
        }

        Ok(self
            .analysis
            .prompt
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ANALYSIS_PROMPT.to_string()))
    }
}
