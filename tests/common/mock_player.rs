//! Mock audio output that records every buffer it is asked to play

use async_trait::async_trait;
use danmaku_voice::audio::{AudioPlayer, PcmFormat};
use danmaku_voice::error::DanmakuResult;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MockPlayer {
    pub played: Mutex<Vec<(Vec<u8>, PcmFormat)>>,
    /// Panic instead of playing
    pub panic_on_play: bool,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panicking() -> Self {
        Self {
            panic_on_play: true,
            ..Self::default()
        }
    }

    pub fn play_count(&self) -> usize {
        self.played.lock().unwrap().len()
    }

    pub fn buffers(&self) -> Vec<Vec<u8>> {
        self.played
            .lock()
            .unwrap()
            .iter()
            .map(|(pcm, _)| pcm.clone())
            .collect()
    }
}

#[async_trait]
impl AudioPlayer for MockPlayer {
    async fn play_pcm(&self, pcm: Vec<u8>, format: PcmFormat) -> DanmakuResult<()> {
        if self.panic_on_play {
            panic!("mock output device vanished");
        }
        self.played.lock().unwrap().push((pcm, format));
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
