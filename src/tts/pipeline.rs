//! Speech pipeline actor
//!
//! One task owns the token, the queue and the in-flight flag. Callers talk to
//! it through a cloneable [`TtsHandle`]. Each started request runs in its own
//! task (synthesis -> artifact -> playback) and reports back exactly once on a
//! completion channel, which releases the slot and starts the next request.

use super::{
    build_ssml, SpeechQueue, SpeechRequest, SpeechService, SynthesisReply, TokenManager, TtsEvent,
};
use crate::audio::{AudioPlayer, PlaybackDriver};
use crate::config::Config;
use crate::error::{DanmakuError, DanmakuResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

const EVENT_CAPACITY: usize = 64;
const IDLE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug)]
enum PipelineCommand {
    Speak(String),
    Clear,
    SetAreaCode(String),
    SetSubscriptionKey(String),
    RefreshToken,
    Status(oneshot::Sender<PipelineStatus>),
}

/// Snapshot of the pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStatus {
    pub pending: usize,
    pub in_flight: bool,
    pub has_token: bool,
    /// A token refresh has been attempted since the last credential change
    pub token_attempted: bool,
}

impl PipelineStatus {
    pub fn is_idle(&self) -> bool {
        self.pending == 0 && !self.in_flight
    }

    /// Requests are waiting but nothing can start until a token arrives
    pub fn is_stalled(&self) -> bool {
        self.pending > 0 && !self.in_flight && !self.has_token && self.token_attempted
    }
}

pub struct Pipeline {
    service: Arc<dyn SpeechService>,
    playback: PlaybackDriver,
    tokens: TokenManager,
    queue: SpeechQueue,
    token_attempted: bool,
    tts_dir: PathBuf,
    voice_name: String,
    synthesis_timeout: Duration,
    refresh_interval: Duration,
    delete_after_play: bool,
    events: broadcast::Sender<TtsEvent>,
}

impl Pipeline {
    /// Build the pipeline and create the artifact directory
    pub fn new(
        config: &Config,
        service: Arc<dyn SpeechService>,
        player: Arc<dyn AudioPlayer>,
    ) -> DanmakuResult<Self> {
        let tts_dir = config.tts_dir();
        std::fs::create_dir_all(&tts_dir)?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            service,
            playback: PlaybackDriver::new(player),
            tokens: TokenManager::new(&config.area_code, &config.subscription_key)
                .with_retries(config.token_retry_attempts),
            queue: SpeechQueue::new(),
            token_attempted: false,
            tts_dir,
            voice_name: config.voice_name.clone(),
            synthesis_timeout: config.synthesis_timeout(),
            refresh_interval: config.refresh_interval(),
            delete_after_play: config.delete_after_play,
            events,
        })
    }

    /// Start the actor. The first token refresh runs immediately.
    pub fn spawn(self) -> TtsHandle {
        let (commands, receiver) = mpsc::unbounded_channel();
        let handle = TtsHandle {
            commands,
            events: self.events.clone(),
            voice_name: self.voice_name.clone(),
        };
        tokio::spawn(self.run(receiver));
        handle
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<PipelineCommand>) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<()>();
        let mut refresh = tokio::time::interval(self.refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("🗣️ Speech pipeline started ({:?})", self.tts_dir);

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd, &done_tx).await,
                    None => break,
                },
                Some(()) = done_rx.recv() => {
                    self.queue.finish();
                    self.emit(TtsEvent::QueueAdvanced { pending: self.queue.len() });
                    self.start_next(&done_tx);
                }
                _ = refresh.tick() => self.refresh_token(&done_tx).await,
            }
        }

        info!("🗣️ Speech pipeline stopped");
    }

    async fn handle_command(&mut self, cmd: PipelineCommand, done_tx: &mpsc::UnboundedSender<()>) {
        match cmd {
            PipelineCommand::Speak(ssml) => {
                if self.queue.enqueue(SpeechRequest { ssml }) {
                    self.start_next(done_tx);
                }
            }
            PipelineCommand::Clear => {
                debug!("🧹 Clearing {} pending request(s)", self.queue.len());
                self.queue.clear();
            }
            PipelineCommand::SetAreaCode(area) => {
                self.tokens.set_area_code(&area);
                self.refresh_token(done_tx).await;
            }
            PipelineCommand::SetSubscriptionKey(key) => {
                self.tokens.set_subscription_key(&key);
                self.refresh_token(done_tx).await;
            }
            PipelineCommand::RefreshToken => self.refresh_token(done_tx).await,
            PipelineCommand::Status(reply) => {
                let _ = reply.send(PipelineStatus {
                    pending: self.queue.len(),
                    in_flight: self.queue.is_in_flight(),
                    has_token: self.tokens.has_token(),
                    token_attempted: self.token_attempted,
                });
            }
        }
    }

    async fn refresh_token(&mut self, done_tx: &mpsc::UnboundedSender<()>) {
        self.token_attempted = true;
        match self.tokens.refresh(self.service.as_ref()).await {
            Ok(()) => {
                self.emit(TtsEvent::TokenRefreshed);
                if !self.queue.is_in_flight() {
                    self.start_next(done_tx);
                }
            }
            // Missing credentials is an expected idle state
            Err(DanmakuError::Config(_)) => {}
            Err(e) => {
                warn!("❌ Could not get speech token: {}", e);
                self.emit(TtsEvent::Error(e.to_string()));
            }
        }
    }

    fn start_next(&mut self, done_tx: &mpsc::UnboundedSender<()>) {
        let Some(request) = self.queue.dequeue_and_start(self.tokens.has_token()) else {
            return;
        };

        let job = SpeechJob {
            service: self.service.clone(),
            playback: self.playback.clone(),
            area: self.tokens.area_code().to_string(),
            token: self.tokens.token().unwrap_or_default().to_string(),
            tts_dir: self.tts_dir.clone(),
            timeout: self.synthesis_timeout,
            delete_after_play: self.delete_after_play,
            events: self.events.clone(),
        };
        let done_tx = done_tx.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            // The slot is released even if a backend panics
            if let Err(e) = tokio::spawn(job.run(request)).await {
                error!("💥 Speech job aborted: {}", e);
                let _ = events.send(TtsEvent::Error(format!("speech job aborted: {}", e)));
            }
            let _ = done_tx.send(());
        });
    }

    fn emit(&self, event: TtsEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// One request's trip through synthesis and playback
struct SpeechJob {
    service: Arc<dyn SpeechService>,
    playback: PlaybackDriver,
    area: String,
    token: String,
    tts_dir: PathBuf,
    timeout: Duration,
    delete_after_play: bool,
    events: broadcast::Sender<TtsEvent>,
}

impl SpeechJob {
    async fn run(self, request: SpeechRequest) {
        let _ = self.events.send(TtsEvent::SynthesisStarted {
            ssml: request.ssml.clone(),
        });

        let synthesis = self
            .service
            .synthesize(&self.area, &self.token, &request.ssml);
        let reply = match tokio::time::timeout(self.timeout, synthesis).await {
            Err(_) => {
                let e = DanmakuError::Timeout(self.timeout.as_millis() as u64);
                warn!("⏱️ {}, skipping to next request", e);
                return;
            }
            Ok(Err(e)) => {
                error!("❌ Speech synthesis failed: {}", e);
                self.report(e.to_string());
                return;
            }
            Ok(Ok(reply)) => reply,
        };

        let SynthesisReply { status, body } = reply;
        if status != 200 {
            warn!("❌ Speech synthesis error code: {}", status);
            self.report(format!("error code: {}", status));
        }
        if body.is_empty() {
            debug!("Empty synthesis body, nothing to play");
            return;
        }

        let path = match save_artifact(&self.tts_dir, &body).await {
            Ok(path) => path,
            Err(e) => {
                error!("❌ Could not save speech audio: {}", e);
                self.report(e.to_string());
                return;
            }
        };
        let _ = self.events.send(TtsEvent::AudioSaved(path.clone()));

        let _ = self.events.send(TtsEvent::PlaybackStarted(path.clone()));
        if let Err(e) = self.playback.play(&path, self.delete_after_play).await {
            self.report(e.to_string());
        }
        let _ = self.events.send(TtsEvent::PlaybackFinished(path));
    }

    fn report(&self, message: String) {
        let _ = self.events.send(TtsEvent::Error(message));
    }
}

/// Write the response bytes verbatim to `{dir}/{epoch_millis}.mp3`
async fn save_artifact(dir: &Path, body: &[u8]) -> DanmakuResult<PathBuf> {
    let mut millis = chrono::Utc::now().timestamp_millis();
    let mut path = dir.join(format!("{}.mp3", millis));
    while tokio::fs::try_exists(&path).await.unwrap_or(false) {
        millis += 1;
        path = dir.join(format!("{}.mp3", millis));
    }
    tokio::fs::write(&path, body).await?;
    debug!("💾 Saved speech audio: {:?}", path);
    Ok(path)
}

/// Cloneable front end of a running [`Pipeline`]
#[derive(Debug, Clone)]
pub struct TtsHandle {
    commands: mpsc::UnboundedSender<PipelineCommand>,
    events: broadcast::Sender<TtsEvent>,
    voice_name: String,
}

impl TtsHandle {
    fn send(&self, cmd: PipelineCommand) -> DanmakuResult<()> {
        self.commands
            .send(cmd)
            .map_err(|_| DanmakuError::PipelineClosed)
    }

    pub fn speak_ssml(&self, ssml: &str) -> DanmakuResult<()> {
        self.send(PipelineCommand::Speak(ssml.to_string()))
    }

    /// Speak plain text with the configured voice
    pub fn speak_text(&self, text: &str) -> DanmakuResult<()> {
        self.speak_ssml(&build_ssml(text, &self.voice_name))
    }

    pub fn clear_queue(&self) -> DanmakuResult<()> {
        self.send(PipelineCommand::Clear)
    }

    pub fn set_area_code(&self, area: &str) -> DanmakuResult<()> {
        self.send(PipelineCommand::SetAreaCode(area.to_string()))
    }

    pub fn set_subscription_key(&self, key: &str) -> DanmakuResult<()> {
        self.send(PipelineCommand::SetSubscriptionKey(key.to_string()))
    }

    pub fn refresh_token(&self) -> DanmakuResult<()> {
        self.send(PipelineCommand::RefreshToken)
    }

    pub async fn status(&self) -> DanmakuResult<PipelineStatus> {
        let (reply, status) = oneshot::channel();
        self.send(PipelineCommand::Status(reply))?;
        status.await.map_err(|_| DanmakuError::PipelineClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TtsEvent> {
        self.events.subscribe()
    }

    /// Resolve once the queue has drained, or once it is stuck without a token.
    /// Returns the number of requests left unspoken.
    pub async fn wait_idle(&self) -> DanmakuResult<usize> {
        let mut events = self.subscribe();
        loop {
            let status = self.status().await?;
            if status.is_idle() {
                return Ok(0);
            }
            if status.is_stalled() {
                warn!("⚠️ No speech token, {} request(s) left unspoken", status.pending);
                return Ok(status.pending);
            }
            tokio::select! {
                event = events.recv() => {
                    if let Err(broadcast::error::RecvError::Closed) = event {
                        return Err(DanmakuError::PipelineClosed);
                    }
                }
                _ = tokio::time::sleep(IDLE_POLL) => {}
            }
        }
    }
}
