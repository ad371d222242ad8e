//! Mock Speech Service for Testing
//!
//! Records every call. Synthesis behavior is picked by markers in the SSML:
//! `HANG` never answers, `EMPTY` returns no body, `STATUS500` fails with a
//! body attached, `FAIL` is a transport error. Anything else succeeds with
//! `pcm:` followed by the SSML.

use async_trait::async_trait;
use danmaku_voice::error::{DanmakuError, DanmakuResult};
use danmaku_voice::tts::{SpeechService, SynthesisReply};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug)]
pub struct MockSpeechService {
    /// Token handed out; `None` makes every token request fail
    pub token: Mutex<Option<String>>,
    pub token_calls: Mutex<Vec<(String, String)>>,
    /// SSML of each synthesis call, in call order
    pub synth_calls: Mutex<Vec<String>>,
    pub tokens_seen: Mutex<Vec<String>>,
}

impl MockSpeechService {
    pub fn new() -> Self {
        Self {
            token: Mutex::new(Some("mock-token".to_string())),
            token_calls: Mutex::new(Vec::new()),
            synth_calls: Mutex::new(Vec::new()),
            tokens_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        let mock = Self::new();
        *mock.token.lock().unwrap() = None;
        mock
    }

    pub fn synthesized(&self) -> Vec<String> {
        self.synth_calls.lock().unwrap().clone()
    }

    pub fn token_call_count(&self) -> usize {
        self.token_calls.lock().unwrap().len()
    }
}

impl Default for MockSpeechService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechService for MockSpeechService {
    async fn issue_token(&self, area: &str, subscription_key: &str) -> DanmakuResult<String> {
        self.token_calls
            .lock()
            .unwrap()
            .push((area.to_string(), subscription_key.to_string()));
        self.token
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| DanmakuError::Auth("mock token endpoint refused".to_string()))
    }

    async fn synthesize(
        &self,
        _area: &str,
        token: &str,
        ssml: &str,
    ) -> DanmakuResult<SynthesisReply> {
        self.synth_calls.lock().unwrap().push(ssml.to_string());
        self.tokens_seen.lock().unwrap().push(token.to_string());

        if ssml.contains("HANG") {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if ssml.contains("EMPTY") {
            return Ok(SynthesisReply::ok(Vec::new()));
        }
        if ssml.contains("STATUS500") {
            return Ok(SynthesisReply {
                status: 500,
                body: b"partial".to_vec(),
            });
        }
        if ssml.contains("FAIL") {
            return Err(DanmakuError::Synthesis("connection reset".to_string()));
        }
        Ok(SynthesisReply::ok(format!("pcm:{}", ssml).into_bytes()))
    }
}
