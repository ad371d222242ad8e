//! danmaku-voice Error Types
//!
//! Centralized error handling for the rule engine and the TTS pipeline.

use thiserror::Error;

/// Central error type for danmaku-voice
#[derive(Error, Debug)]
pub enum DanmakuError {
    /// Area code or subscription key is missing
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token endpoint returned no usable token
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Synthesis request could not be sent or its body not read
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Synthesis timed out after {0} ms")]
    Timeout(u64),

    #[error("Audio playback error: {0}")]
    Audio(String),

    #[error("Rule error: {0}")]
    Rule(String),

    #[error("Pipeline stopped")]
    PipelineClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias for danmaku-voice operations
pub type DanmakuResult<T> = Result<T, DanmakuError>;

impl From<regex::Error> for DanmakuError {
    fn from(err: regex::Error) -> Self {
        DanmakuError::Rule(err.to_string())
    }
}
