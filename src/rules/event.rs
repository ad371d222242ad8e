//! Event action rule
//!
//! Maps a named platform event (gift, follow, guard purchase, ...) to an action script.

use super::{json_bool, json_str, RuleItem, RuleTrigger};
use crate::danmaku::LiveDanmaku;
use serde_json::{json, Value};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventRule {
    enabled: bool,
    /// Event command key, compared literally
    event: String,
    action: String,
}

impl EventRule {
    pub fn new(event: &str, action: &str) -> Self {
        Self {
            enabled: true,
            event: event.to_string(),
            action: action.to_string(),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_event(&mut self, event: &str) {
        self.event = event.to_string();
    }

    pub fn set_action(&mut self, action: &str) {
        self.action = action.to_string();
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// Fire when `cmd` names this rule's event. A rule without an event never fires.
    pub fn trigger_cmd_event(&self, cmd: &str, danmaku: &LiveDanmaku) -> Option<RuleTrigger> {
        if self.event.is_empty() || cmd != self.event {
            return None;
        }
        self.trigger_action(danmaku)
    }

    pub fn trigger_action(&self, danmaku: &LiveDanmaku) -> Option<RuleTrigger> {
        if !self.enabled {
            return None;
        }
        debug!("⚡ Event '{}' fired", self.event);
        Some(RuleTrigger::new(&self.action, danmaku, false))
    }

    pub fn trigger_manually(&self, danmaku: &LiveDanmaku) -> RuleTrigger {
        RuleTrigger::new(&self.action, danmaku, true)
    }
}

impl RuleItem for EventRule {
    fn from_json(value: &Value) -> Self {
        Self {
            enabled: json_bool(value, "enabled"),
            event: json_str(value, "event"),
            action: json_str(value, "action"),
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "enabled": self.enabled,
            "event": self.event,
            "action": self.action,
        })
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn title(&self) -> &str {
        &self.event
    }

    fn body(&self) -> &str {
        &self.action
    }
}
