//! Chat rule engine
//!
//! Event and auto-reply rules that turn incoming chat data into triggers.
//! Rules persist as JSON records grouped under an application namespace.

use crate::danmaku::LiveDanmaku;
use crate::error::DanmakuResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

pub mod event;
pub mod reply;

pub use event::EventRule;
pub use reply::ReplyRule;

/// Common surface of a configurable rule
pub trait RuleItem: Sized {
    /// Build from a stored record. Missing or mistyped fields become empty/disabled.
    fn from_json(value: &Value) -> Self;

    fn to_json(&self) -> Value;

    fn is_enabled(&self) -> bool;

    /// Matcher text shown as the rule's heading
    fn title(&self) -> &str;

    fn body(&self) -> &str;
}

/// Emitted when a rule fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTrigger {
    pub text: String,
    pub datum: LiveDanmaku,
    /// True only when a user fired the rule by hand
    pub manual: bool,
}

impl RuleTrigger {
    pub fn new(text: &str, datum: &LiveDanmaku, manual: bool) -> Self {
        Self {
            text: text.to_string(),
            datum: datum.clone(),
            manual,
        }
    }
}

pub(crate) fn json_bool(value: &Value, field: &str) -> bool {
    value.get(field).and_then(Value::as_bool).unwrap_or(false)
}

pub(crate) fn json_str(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Namespace key for auto-reply records
pub fn auto_reply_key(app_name: &str) -> String {
    format!("{}:AutoReply", app_name)
}

/// Namespace key for event action records
pub fn event_action_key(app_name: &str) -> String {
    format!("{}:EventAction", app_name)
}

/// All configured rules for one application namespace
#[derive(Debug, Clone)]
pub struct RuleBook {
    app_name: String,
    pub replies: Vec<ReplyRule>,
    pub events: Vec<EventRule>,
}

impl RuleBook {
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            replies: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Run every reply rule against a chat message
    pub fn on_danmaku(&self, danmaku: &LiveDanmaku) -> Vec<RuleTrigger> {
        self.replies
            .iter()
            .filter_map(|rule| rule.on_danmaku(danmaku))
            .collect()
    }

    /// Run every event rule against a named event
    pub fn on_event(&self, cmd: &str, danmaku: &LiveDanmaku) -> Vec<RuleTrigger> {
        let triggers: Vec<RuleTrigger> = self
            .events
            .iter()
            .filter_map(|rule| rule.trigger_cmd_event(cmd, danmaku))
            .collect();
        if triggers.is_empty() {
            debug!("No event rule for '{}'", cmd);
        }
        triggers
    }

    pub fn from_json(app_name: &str, value: &Value) -> Self {
        let records = |key: String| -> Vec<Value> {
            value
                .get(&key)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default()
        };

        Self {
            app_name: app_name.to_string(),
            replies: records(auto_reply_key(app_name))
                .iter()
                .map(ReplyRule::from_json)
                .collect(),
            events: records(event_action_key(app_name))
                .iter()
                .map(EventRule::from_json)
                .collect(),
        }
    }

    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        root.insert(
            auto_reply_key(&self.app_name),
            Value::Array(self.replies.iter().map(RuleItem::to_json).collect()),
        );
        root.insert(
            event_action_key(&self.app_name),
            Value::Array(self.events.iter().map(RuleItem::to_json).collect()),
        );
        Value::Object(root)
    }

    /// Load rules from disk. A missing file yields an empty book.
    pub fn load(app_name: &str, path: &Path) -> DanmakuResult<Self> {
        if !path.exists() {
            info!("📭 No rule file at {:?}, starting empty", path);
            return Ok(Self::new(app_name));
        }
        let content = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content)?;
        let book = Self::from_json(app_name, &value);
        info!(
            "📜 Loaded {} auto-reply and {} event rules",
            book.replies.len(),
            book.events.len()
        );
        Ok(book)
    }

    pub fn save(&self, path: &Path) -> DanmakuResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&self.to_json())?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_namespace_keys() {
        assert_eq!(auto_reply_key("MagicalDanmaku"), "MagicalDanmaku:AutoReply");
        assert_eq!(event_action_key("MagicalDanmaku"), "MagicalDanmaku:EventAction");
    }

    #[test]
    fn test_book_fans_out() {
        let mut book = RuleBook::new("app");
        book.replies.push(ReplyRule::new("^hello", "hi there").unwrap());
        book.replies.push(ReplyRule::new("world", "hello world").unwrap());
        book.events.push(EventRule::new("SEND_GIFT", "thanks"));

        let datum = LiveDanmaku::new("viewer", 1, "hello world");
        let replies = book.on_danmaku(&datum);
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].text, "hi there");

        assert_eq!(book.on_event("SEND_GIFT", &datum).len(), 1);
        assert!(book.on_event("FOLLOW", &datum).is_empty());
    }

    #[test]
    fn test_book_ignores_other_namespaces() {
        let value = json!({
            "other:AutoReply": [{ "enabled": true, "key": "x", "reply": "y" }],
            "app:AutoReply": "not an array",
        });
        let book = RuleBook::from_json("app", &value);
        assert!(book.replies.is_empty());
        assert!(book.events.is_empty());
    }
}
