pub mod mock_player;
pub mod mock_speech;

use danmaku_voice::config::Config;
use danmaku_voice::tts::{TtsEvent, TtsHandle};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;

pub use mock_player::MockPlayer;
pub use mock_speech::MockSpeechService;

/// Config pointing at a private data dir with a short synthesis timeout
pub fn test_config(temp_dir: &TempDir) -> Config {
    Config {
        area_code: "eastasia".to_string(),
        subscription_key: "secret".to_string(),
        data_dir: temp_dir.path().to_string_lossy().to_string(),
        synthesis_timeout_ms: 200,
        ..Config::default()
    }
}

/// Same as [`test_config`] but without credentials
pub fn unconfigured(temp_dir: &TempDir) -> Config {
    Config {
        area_code: String::new(),
        subscription_key: String::new(),
        ..test_config(temp_dir)
    }
}

pub async fn wait_for_token(handle: &TtsHandle) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !handle.status().await.expect("pipeline alive").has_token {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("Timed out waiting for a speech token");
}

pub async fn wait_idle(handle: &TtsHandle) {
    let left = tokio::time::timeout(Duration::from_secs(5), handle.wait_idle())
        .await
        .expect("Timed out waiting for the queue to drain")
        .expect("pipeline alive");
    assert_eq!(left, 0, "queue stalled without a token");
}

/// Everything already delivered to `events`
pub fn drain(events: &mut broadcast::Receiver<TtsEvent>) -> Vec<TtsEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

pub async fn wait_for_event<F>(events: &mut broadcast::Receiver<TtsEvent>, pred: F) -> TtsEvent
where
    F: Fn(&TtsEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.expect("event stream open");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("Timed out waiting for pipeline event")
}
