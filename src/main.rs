//! danmaku-voice - chat auto-replies and spoken alerts for live streams

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use danmaku_voice::audio::{PlaybackDriver, SoundEngine};
use danmaku_voice::config::{self, Config};
use danmaku_voice::danmaku::ChatInput;
use danmaku_voice::rules::RuleBook;
use danmaku_voice::tts::{AzureSpeechService, Pipeline, TtsEvent, TtsHandle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the Cognitive Services area code
    #[arg(long)]
    area: Option<String>,

    /// Override the Cognitive Services subscription key
    #[arg(long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Speak text (or raw SSML) and exit once the queue drains
    Speak {
        text: String,

        /// Treat the input as SSML instead of plain text
        #[arg(long)]
        ssml: bool,

        /// Give up after this many seconds
        #[arg(long, default_value_t = 60)]
        wait_secs: u64,
    },

    /// Read JSON-lines chat input from stdin, print rule triggers and speak them
    Listen {
        /// Print triggers without speaking them
        #[arg(long)]
        mute: bool,
    },

    /// Play a stored speech artifact
    Play {
        file: PathBuf,

        /// Keep the file after playback
        #[arg(long)]
        keep: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    let mut config = Config::load_from(&config_path)
        .with_context(|| format!("loading config from {:?}", config_path))?;
    if let Some(area) = &args.area {
        config.area_code = area.clone();
    }
    if let Some(key) = &args.key {
        config.subscription_key = key.clone();
    }

    // Setup logging
    let level = if args.verbose {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("📺 danmaku-voice v{} starting...", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Speak {
            text,
            ssml,
            wait_secs,
        } => {
            let handle = start_pipeline(&config)?;
            if ssml {
                handle.speak_ssml(&text)?;
            } else {
                handle.speak_text(&text)?;
            }
            let left = tokio::time::timeout(Duration::from_secs(wait_secs), handle.wait_idle())
                .await
                .context("speech did not finish in time")??;
            if left > 0 {
                anyhow::bail!("no speech token (check area code and subscription key)");
            }
        }
        Command::Listen { mute } => listen(&config, mute).await?,
        Command::Play { file, keep } => {
            let driver = PlaybackDriver::new(Arc::new(SoundEngine::new()?));
            driver.play(&file, !keep).await?;
        }
    }

    Ok(())
}

fn start_pipeline(config: &Config) -> Result<TtsHandle> {
    let service = Arc::new(AzureSpeechService::new(config));
    let player = Arc::new(SoundEngine::new()?);
    let handle = Pipeline::new(config, service, player)?.spawn();

    let mut events = handle.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let TtsEvent::Error(message) = event {
                error!("🔇 TTS: {}", message);
            }
        }
    });

    Ok(handle)
}

async fn listen(config: &Config, mute: bool) -> Result<()> {
    let book = RuleBook::load(&config.app_name, &PathBuf::from(&config.rules_path))?;
    let handle = if mute {
        None
    } else {
        Some(start_pipeline(config)?)
    };

    info!("👂 Listening for chat input on stdin");
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let input: ChatInput = match serde_json::from_str(&line) {
            Ok(input) => input,
            Err(e) => {
                warn!("⚠️ Skipping malformed chat input: {}", e);
                continue;
            }
        };

        let triggers = match &input {
            ChatInput::Danmaku { danmaku } => book.on_danmaku(danmaku),
            ChatInput::Event { cmd, danmaku } => book.on_event(cmd, danmaku),
        };

        for trigger in triggers {
            println!("{}", serde_json::to_string(&trigger)?);
            if let Some(handle) = &handle {
                handle.speak_text(&trigger.text)?;
            }
        }
    }

    if let Some(handle) = handle {
        let left = handle.wait_idle().await?;
        if left > 0 {
            warn!("🔇 {} reply(s) dropped, no speech token", left);
        }
    }
    Ok(())
}
