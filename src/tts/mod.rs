//! TTS (Text-to-Speech) Module
//!
//! Microsoft Cognitive Services speech: token handling, the speech queue and
//! the pipeline actor that drives synthesis and playback.

use crate::error::DanmakuResult;
use async_trait::async_trait;
use std::path::PathBuf;

pub mod azure;
pub mod pipeline;
pub mod queue;
pub mod token;

pub use azure::AzureSpeechService;
pub use pipeline::{Pipeline, PipelineStatus, TtsHandle};
pub use queue::{SpeechQueue, SpeechRequest};
pub use token::TokenManager;

/// HTTP response of a synthesis call. Non-200 replies still carry their body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl SynthesisReply {
    pub fn ok(body: Vec<u8>) -> Self {
        Self { status: 200, body }
    }
}

/// Remote speech service
#[async_trait]
pub trait SpeechService: Send + Sync + std::fmt::Debug {
    /// Exchange a subscription key for a bearer token
    async fn issue_token(&self, area: &str, subscription_key: &str) -> DanmakuResult<String>;

    /// Synthesize SSML. Transport failures are errors; HTTP failures are replies.
    async fn synthesize(&self, area: &str, token: &str, ssml: &str)
        -> DanmakuResult<SynthesisReply>;
}

/// Pipeline notifications, delivered over a broadcast channel
#[derive(Debug, Clone, PartialEq)]
pub enum TtsEvent {
    TokenRefreshed,
    /// Human-readable failure (auth, synthesis status, transport, playback)
    Error(String),
    SynthesisStarted { ssml: String },
    AudioSaved(PathBuf),
    PlaybackStarted(PathBuf),
    PlaybackFinished(PathBuf),
    /// An in-flight request completed, whatever its outcome
    QueueAdvanced { pending: usize },
}

/// Wrap plain text in a single-voice SSML document
pub fn build_ssml(text: &str, voice_name: &str) -> String {
    format!(
        "<speak version=\"1.0\" xmlns=\"http://www.w3.org/2001/10/synthesis\" xml:lang=\"{}\">\
         <voice name=\"{}\">{}</voice></speak>",
        voice_lang(voice_name),
        quick_xml::escape::escape(voice_name),
        quick_xml::escape::escape(text)
    )
}

/// `zh-CN-XiaoxiaoNeural` -> `zh-CN`
fn voice_lang(voice_name: &str) -> String {
    let parts: Vec<&str> = voice_name.splitn(3, '-').collect();
    if parts.len() == 3 {
        format!("{}-{}", parts[0], parts[1])
    } else {
        "en-US".to_string()
    }
}
