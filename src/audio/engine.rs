//! Sound Engine for speech playback
//!
//! Uses a channel-based architecture to handle rodio's non-Send stream.
//! The engine spawns a dedicated audio thread that owns the playback infrastructure.

use super::{AudioPlayer, PcmFormat, SampleType};
use crate::error::{DanmakuError, DanmakuResult};
use async_trait::async_trait;
use rodio::buffer::SamplesBuffer;
use std::sync::mpsc;
use std::thread;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Commands sent to the audio thread
enum AudioCommand {
    PlayPcm {
        pcm: Vec<u8>,
        format: PcmFormat,
        done: oneshot::Sender<DanmakuResult<()>>,
    },
}

/// Thread-safe handle to the sound engine
#[derive(Clone)]
pub struct SoundEngine {
    sender: mpsc::Sender<AudioCommand>,
}

impl std::fmt::Debug for SoundEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundEngine").finish()
    }
}

impl SoundEngine {
    pub fn new() -> DanmakuResult<Self> {
        let (sender, receiver) = mpsc::channel::<AudioCommand>();

        thread::Builder::new()
            .name("danmaku-audio".to_string())
            .spawn(move || {
                Self::audio_thread(receiver);
            })?;

        Ok(Self { sender })
    }

    fn audio_thread(receiver: mpsc::Receiver<AudioCommand>) {
        use rodio::OutputStream;

        let output = match OutputStream::try_default() {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("🔇 Failed to initialize audio output: {}", e);
                None
            }
        };

        info!("🔊 Audio thread started");

        while let Ok(cmd) = receiver.recv() {
            match cmd {
                AudioCommand::PlayPcm { pcm, format, done } => {
                    let result = match &output {
                        Some((_stream, handle)) => Self::play_blocking(handle, &pcm, format),
                        None => Err(DanmakuError::Audio("no audio output device".to_string())),
                    };
                    if let Err(e) = &result {
                        error!("❌ Audio playback failed: {}", e);
                    }
                    let _ = done.send(result);
                }
            }
        }

        info!("🔇 Audio thread stopped");
    }

    fn play_blocking(
        handle: &rodio::OutputStreamHandle,
        pcm: &[u8],
        format: PcmFormat,
    ) -> DanmakuResult<()> {
        if format.sample_size != 16 {
            return Err(DanmakuError::Audio(format!(
                "unsupported sample size: {} bits",
                format.sample_size
            )));
        }

        // A fresh sink per artifact; dropping it releases the output resources.
        let sink = rodio::Sink::try_new(handle)
            .map_err(|e| DanmakuError::Audio(format!("Failed to create audio sink: {}", e)))?;

        match format.sample_type {
            SampleType::UnsignedInt => sink.append(SamplesBuffer::new(
                format.channels,
                format.sample_rate,
                format.decode_unsigned(pcm),
            )),
            SampleType::SignedInt => sink.append(SamplesBuffer::new(
                format.channels,
                format.sample_rate,
                format.decode_signed(pcm),
            )),
        }

        sink.sleep_until_end();
        debug!("🔊 Playback reached idle");
        Ok(())
    }
}

#[async_trait]
impl AudioPlayer for SoundEngine {
    async fn play_pcm(&self, pcm: Vec<u8>, format: PcmFormat) -> DanmakuResult<()> {
        let (done, finished) = oneshot::channel();
        self.sender
            .send(AudioCommand::PlayPcm { pcm, format, done })
            .map_err(|e| DanmakuError::Audio(format!("Audio thread disconnected: {}", e)))?;

        finished
            .await
            .map_err(|_| DanmakuError::Audio("Audio thread dropped the request".to_string()))?
    }

    fn name(&self) -> &str {
        "rodio"
    }
}
