//! danmaku-voice Library
//!
//! Chat rule matching and Microsoft Cognitive Services speech for live streams.

pub mod audio;
pub mod config;
pub mod danmaku;
pub mod error;
pub mod rules;
pub mod tts;
