//! Chat datum types
//!
//! A `LiveDanmaku` is one incoming chat or event record. `ChatInput` is the
//! JSON-lines envelope read by the `listen` command.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One incoming chat/event record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveDanmaku {
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub uid: u64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub room_id: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Platform-specific payload carried through untouched
    #[serde(default)]
    pub extra: serde_json::Value,
}

impl LiveDanmaku {
    pub fn new(nickname: &str, uid: u64, text: &str) -> Self {
        Self {
            nickname: nickname.to_string(),
            uid,
            text: text.to_string(),
            room_id: String::new(),
            timestamp: Utc::now(),
            extra: serde_json::Value::Null,
        }
    }
}

/// Input envelope for the `listen` loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatInput {
    /// Ordinary chat message, matched against reply rules
    #[serde(rename = "danmaku")]
    Danmaku { danmaku: LiveDanmaku },

    /// Named platform event, matched against event rules
    #[serde(rename = "event")]
    Event { cmd: String, danmaku: LiveDanmaku },
}
