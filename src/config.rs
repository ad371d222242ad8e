use crate::error::DanmakuResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TOKEN_ENDPOINT: &str =
    "https://{area}.api.cognitive.microsoft.com/sts/v1.0/issuetoken";
pub const DEFAULT_SYNTHESIS_ENDPOINT: &str =
    "https://{area}.tts.speech.microsoft.com/cognitiveservices/v1";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Meta
    pub app_name: String,
    pub log_level: String,
    pub data_dir: String,
    pub rules_path: String,

    // Cognitive Services
    pub area_code: String,
    pub subscription_key: String,
    pub voice_name: String,
    pub token_endpoint: String,
    pub synthesis_endpoint: String,

    // Pipeline
    pub token_refresh_secs: u64,
    pub token_timeout_ms: u64,
    pub token_retry_attempts: usize,
    pub synthesis_timeout_ms: u64,
    pub delete_after_play: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "MagicalDanmaku".to_string(),
            log_level: "INFO".to_string(),
            data_dir: dirs::data_dir()
                .unwrap_or_default()
                .join("danmaku-voice")
                .to_string_lossy()
                .to_string(),
            rules_path: dirs::config_dir()
                .unwrap_or_default()
                .join("danmaku-voice/rules.json")
                .to_string_lossy()
                .to_string(),
            area_code: "".to_string(),
            subscription_key: "".to_string(),
            voice_name: "zh-CN-XiaoxiaoNeural".to_string(),
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            synthesis_endpoint: DEFAULT_SYNTHESIS_ENDPOINT.to_string(),
            token_refresh_secs: 9 * 60,
            token_timeout_ms: 10_000,
            token_retry_attempts: 0,
            synthesis_timeout_ms: 10_000,
            delete_after_play: true,
        }
    }
}

impl Config {
    /// Load config from file, or fall back to defaults
    pub fn load() -> DanmakuResult<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(config_path: &std::path::Path) -> DanmakuResult<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                // Graceful degradation: log warning and use defaults
                tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                let backup_path = config_path.with_extension("json.corrupt");
                let _ = std::fs::rename(config_path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> DanmakuResult<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> DanmakuResult<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Directory that receives synthesized audio artifacts
    pub fn tts_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("tts")
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.token_refresh_secs.max(1))
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_millis(self.synthesis_timeout_ms)
    }

    pub fn token_timeout(&self) -> Duration {
        Duration::from_millis(self.token_timeout_ms)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("danmaku-voice")
        .join("config.json")
}
