//! Bearer token state for the speech service

use super::SpeechService;
use crate::error::{DanmakuError, DanmakuResult};
use chrono::{DateTime, Utc};
use tokio_retry::strategy::{jitter, FixedInterval};
use tokio_retry::Retry;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct TokenManager {
    area_code: String,
    subscription_key: String,
    token: String,
    last_refreshed: Option<DateTime<Utc>>,
    /// Extra attempts after a failed fetch; 0 means a single try
    retry_attempts: usize,
}

impl TokenManager {
    pub fn new(area_code: &str, subscription_key: &str) -> Self {
        Self {
            area_code: area_code.to_string(),
            subscription_key: subscription_key.to_string(),
            ..Self::default()
        }
    }

    pub fn with_retries(mut self, retry_attempts: usize) -> Self {
        self.retry_attempts = retry_attempts;
        self
    }

    /// Current token, `None` until the first successful refresh
    pub fn token(&self) -> Option<&str> {
        if self.token.is_empty() {
            None
        } else {
            Some(&self.token)
        }
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn area_code(&self) -> &str {
        &self.area_code
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    /// Changing a credential invalidates the held token
    pub fn set_area_code(&mut self, area_code: &str) {
        self.area_code = area_code.to_string();
        self.token.clear();
    }

    pub fn set_subscription_key(&mut self, subscription_key: &str) {
        self.subscription_key = subscription_key.to_string();
        self.token.clear();
    }

    /// Fetch a fresh token. On failure the previous token is kept.
    pub async fn refresh(&mut self, service: &dyn SpeechService) -> DanmakuResult<()> {
        if self.area_code.is_empty() || self.subscription_key.is_empty() {
            warn!("⚠️ Area code or subscription key not set, skipping token refresh");
            return Err(DanmakuError::Config(
                "area code or subscription key is empty".to_string(),
            ));
        }

        let area: &str = &self.area_code;
        let key: &str = &self.subscription_key;
        let strategy = FixedInterval::from_millis(500)
            .map(jitter)
            .take(self.retry_attempts);

        let token = Retry::start(strategy, move || service.issue_token(area, key)).await?;

        info!("🔑 Speech token refreshed for area '{}'", self.area_code);
        debug!("Speech token: {}", token);
        self.token = token;
        self.last_refreshed = Some(Utc::now());
        Ok(())
    }
}
