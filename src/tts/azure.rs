//! Microsoft Cognitive Services REST client

use super::{SpeechService, SynthesisReply};
use crate::config::Config;
use crate::error::{DanmakuError, DanmakuResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

const OUTPUT_FORMAT: &str = "raw-24khz-16bit-mono-pcm";

#[derive(Debug, Clone)]
pub struct AzureSpeechService {
    client: reqwest::Client,
    token_endpoint: String,
    synthesis_endpoint: String,
    token_timeout: Duration,
    user_agent: String,
}

impl AzureSpeechService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_endpoint: config.token_endpoint.clone(),
            synthesis_endpoint: config.synthesis_endpoint.clone(),
            token_timeout: config.token_timeout(),
            user_agent: config.app_name.clone(),
        }
    }

    fn url(template: &str, area: &str) -> String {
        template.replace("{area}", area)
    }
}

#[async_trait]
impl SpeechService for AzureSpeechService {
    async fn issue_token(&self, area: &str, subscription_key: &str) -> DanmakuResult<String> {
        let url = Self::url(&self.token_endpoint, area);
        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", subscription_key)
            .body(Vec::<u8>::new())
            .timeout(self.token_timeout)
            .send()
            .await
            .map_err(|e| DanmakuError::Auth(format!("token request to {} failed: {}", url, e)))?;

        let status = response.status();
        let token = response
            .text()
            .await
            .map_err(|e| DanmakuError::Auth(format!("token body unreadable: {}", e)))?;

        if !status.is_success() {
            warn!("❌ Token endpoint returned {}: {}", status, token);
            return Err(DanmakuError::Auth(format!(
                "token endpoint {} returned {}",
                url, status
            )));
        }
        if token.trim().is_empty() {
            return Err(DanmakuError::Auth(format!("empty token from {}", url)));
        }
        Ok(token.trim().to_string())
    }

    async fn synthesize(
        &self,
        area: &str,
        token: &str,
        ssml: &str,
    ) -> DanmakuResult<SynthesisReply> {
        let url = Self::url(&self.synthesis_endpoint, area);
        debug!("🌐 POST {} ({} bytes SSML)", url, ssml.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .body(ssml.as_bytes().to_vec())
            .send()
            .await
            .map_err(|e| DanmakuError::Synthesis(format!("request to {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| DanmakuError::Synthesis(format!("response body unreadable: {}", e)))?
            .to_vec();
        Ok(SynthesisReply { status, body })
    }
}
