//! Auto-reply rule
//!
//! Matches chat text against a regular expression and answers with a canned reply.

use super::{json_bool, json_str, RuleItem, RuleTrigger};
use crate::danmaku::LiveDanmaku;
use crate::error::DanmakuResult;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct ReplyRule {
    enabled: bool,
    /// Pattern text as entered, kept verbatim even when it fails to compile
    key: String,
    reply: String,
    key_re: Option<Regex>,
}

impl ReplyRule {
    pub fn new(key: &str, reply: &str) -> DanmakuResult<Self> {
        let mut rule = Self {
            enabled: true,
            reply: reply.to_string(),
            ..Self::default()
        };
        rule.set_key(key)?;
        Ok(rule)
    }

    /// Replace the matcher. An invalid pattern is stored but never matches.
    pub fn set_key(&mut self, key: &str) -> DanmakuResult<()> {
        self.key = key.to_string();
        self.key_re = None;
        if key.is_empty() {
            return Ok(());
        }
        self.key_re = Some(Regex::new(key)?);
        Ok(())
    }

    pub fn set_reply(&mut self, reply: &str) {
        self.reply = reply.to_string();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn reply(&self) -> &str {
        &self.reply
    }

    /// Entry point for every incoming chat message
    pub fn on_danmaku(&self, danmaku: &LiveDanmaku) -> Option<RuleTrigger> {
        if !self.enabled || self.key.is_empty() {
            return None;
        }
        self.trigger_if_match(&danmaku.text, danmaku)
    }

    pub fn trigger_if_match(&self, msg: &str, danmaku: &LiveDanmaku) -> Option<RuleTrigger> {
        let re = self.key_re.as_ref()?;
        if !re.is_match(msg) {
            return None;
        }
        debug!("💬 Auto-reply matched '{}' for: '{}'", self.key, msg);
        Some(RuleTrigger::new(&self.reply, danmaku, false))
    }

    /// Fire the reply on user request, regardless of the matcher
    pub fn trigger_manually(&self, danmaku: &LiveDanmaku) -> RuleTrigger {
        RuleTrigger::new(&self.reply, danmaku, true)
    }
}

impl RuleItem for ReplyRule {
    fn from_json(value: &Value) -> Self {
        let mut rule = Self {
            enabled: json_bool(value, "enabled"),
            reply: json_str(value, "reply"),
            ..Self::default()
        };
        if let Err(e) = rule.set_key(&json_str(value, "key")) {
            warn!("⚠️ Invalid auto-reply pattern '{}': {}", rule.key, e);
        }
        rule
    }

    fn to_json(&self) -> Value {
        json!({
            "enabled": self.enabled,
            "key": self.key,
            "reply": self.reply,
        })
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn title(&self) -> &str {
        &self.key
    }

    fn body(&self) -> &str {
        &self.reply
    }
}
