//! FIFO of pending speech requests with a single in-flight slot

use std::collections::VecDeque;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub ssml: String,
}

impl SpeechRequest {
    pub fn new(ssml: &str) -> Self {
        Self {
            ssml: ssml.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SpeechQueue {
    pending: VecDeque<SpeechRequest>,
    in_flight: bool,
}

impl SpeechQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail. Returns true when the caller should try to start the head.
    pub fn enqueue(&mut self, request: SpeechRequest) -> bool {
        self.pending.push_back(request);
        if self.in_flight {
            debug!("🗣️ SSML queued, pending: {}", self.pending.len());
            return false;
        }
        true
    }

    /// Pop the head and mark it in flight. The head stays put while no token is held.
    pub fn dequeue_and_start(&mut self, has_token: bool) -> Option<SpeechRequest> {
        if self.in_flight || self.pending.is_empty() {
            return None;
        }
        if !has_token {
            warn!("⚠️ No speech token yet, {} request(s) waiting", self.pending.len());
            return None;
        }
        let request = self.pending.pop_front()?;
        self.in_flight = true;
        Some(request)
    }

    /// Release the in-flight slot after success, error or timeout
    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    /// Drop everything pending; the in-flight request is left alone
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn head(&self) -> Option<&SpeechRequest> {
        self.pending.front()
    }
}
