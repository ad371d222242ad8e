//! Audio playback module
//!
//! Plays stored PCM artifacts through an `AudioPlayer` backend and cleans up afterwards.

use crate::error::DanmakuResult;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

pub mod engine;

pub use engine::SoundEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    SignedInt,
    UnsignedInt,
}

/// Layout of a raw 16-bit PCM stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub sample_size: u16,
    pub channels: u16,
    pub byte_order: ByteOrder,
    pub sample_type: SampleType,
}

impl PcmFormat {
    /// Output format used for `raw-24khz-16bit-mono-pcm` artifacts
    pub const SPEECH: PcmFormat = PcmFormat {
        sample_rate: 24_000,
        sample_size: 16,
        channels: 1,
        byte_order: ByteOrder::LittleEndian,
        sample_type: SampleType::UnsignedInt,
    };

    fn word(&self, pair: &[u8]) -> [u8; 2] {
        match self.byte_order {
            ByteOrder::LittleEndian => [pair[0], pair[1]],
            ByteOrder::BigEndian => [pair[1], pair[0]],
        }
    }

    /// Decode as unsigned samples. A trailing odd byte is dropped.
    pub fn decode_unsigned(&self, bytes: &[u8]) -> Vec<u16> {
        bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes(self.word(pair)))
            .collect()
    }

    pub fn decode_signed(&self, bytes: &[u8]) -> Vec<i16> {
        bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes(self.word(pair)))
            .collect()
    }

    pub fn duration_ms(&self, byte_len: usize) -> u64 {
        let bytes_per_sec =
            self.sample_rate as u64 * self.channels as u64 * (self.sample_size as u64 / 8);
        if bytes_per_sec == 0 {
            return 0;
        }
        byte_len as u64 * 1000 / bytes_per_sec
    }
}

/// Output backend that plays a PCM buffer to completion
#[async_trait]
pub trait AudioPlayer: Send + Sync + std::fmt::Debug {
    /// Resolves once playback has finished
    async fn play_pcm(&self, pcm: Vec<u8>, format: PcmFormat) -> DanmakuResult<()>;

    fn name(&self) -> &str;
}

/// Plays audio artifacts one at a time and removes them afterwards
#[derive(Debug, Clone)]
pub struct PlaybackDriver {
    player: Arc<dyn AudioPlayer>,
    format: PcmFormat,
}

impl PlaybackDriver {
    pub fn new(player: Arc<dyn AudioPlayer>) -> Self {
        Self {
            player,
            format: PcmFormat::SPEECH,
        }
    }

    pub async fn play(&self, path: &Path, delete_after_play: bool) -> DanmakuResult<()> {
        let result = match tokio::fs::read(path).await {
            Ok(pcm) => {
                debug!(
                    "🔊 Playing {:?} (~{} ms) via {}",
                    path.file_name().unwrap_or_default(),
                    self.format.duration_ms(pcm.len()),
                    self.player.name()
                );
                self.player.play_pcm(pcm, self.format).await
            }
            Err(e) => Err(e.into()),
        };

        if delete_after_play {
            if let Err(e) = tokio::fs::remove_file(path).await {
                warn!("⚠️ Could not delete audio artifact {:?}: {}", path, e);
            }
        }
        result
    }
}
