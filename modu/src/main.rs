// Copyright 2026 The MODU Project
// SPDX-License-Identifier: Apache-2.0

use bytes::Bytes;
use clap::{Parser, Subcommand};
use modu::chat::{ChatError, Conversation, TracingNotifier};
use modu::client::ChatClient;
use modu::config::{self, ConfigError};
use modu::sse::{EventReader, StreamLimits, DEFAULT_MAX_RECORD_BYTES};
use modu::transcript::Transcript;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "modu-stream", about = "MODU chat stream client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a captured event-stream body and print the transcript it builds
    Replay {
        /// File holding the body; stdin when omitted
        path: Option<PathBuf>,

        /// Largest record accepted before the stream is rejected
        #[arg(long, default_value_t = DEFAULT_MAX_RECORD_BYTES)]
        max_record_bytes: usize,
    },

    /// Send a message and print the transcript once the reply completes
    Send {
        /// Path to the modu.yaml config file
        #[arg(long, default_value = "modu.yaml", env = "MODU_CONFIG")]
        config: PathBuf,

        /// Continue an existing conversation
        #[arg(long)]
        conversation: Option<String>,

        /// Address a specific bot
        #[arg(long)]
        bot: Option<String>,

        /// Message text
        text: String,
    },
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to load config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("failed to encode transcript: {0}")]
    Encode(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Replay {
            path,
            max_record_bytes,
        } => replay(path, max_record_bytes).await,
        Command::Send {
            config,
            conversation,
            bot,
            text,
        } => send(config, conversation, bot, text).await,
    };

    match result.and_then(|t| Ok(serde_json::to_string_pretty(&t)?)) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    }
}

async fn replay(path: Option<PathBuf>, max_record_bytes: usize) -> Result<Transcript, AppError> {
    let body = match path {
        Some(path) => tokio::fs::read(path).await?,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await?;
            buf
        }
    };
    tracing::info!(bytes = body.len(), "replaying captured stream");

    let limits = StreamLimits {
        max_record_bytes,
        ..StreamLimits::default()
    };
    let chunks = vec![Ok::<_, std::io::Error>(Bytes::from(body))];
    let reader = EventReader::spawn(tokio_stream::iter(chunks), limits);

    let mut conversation = Conversation::new(Arc::new(TracingNotifier));
    let summary = conversation.consume(reader).await?;
    tracing::info!(
        records = summary.records,
        applied = summary.applied,
        completed = summary.completed,
        "replay finished"
    );
    Ok(conversation.into_transcript())
}

async fn send(
    config_path: PathBuf,
    conversation_uid: Option<String>,
    bot_uid: Option<String>,
    text: String,
) -> Result<Transcript, AppError> {
    let source = config::FileSource::new(config_path);
    let config = config::load_config(&source)?;
    tracing::info!(
        version = %config.version,
        url = %config.server.chat_url(),
        "config loaded"
    );

    let client = ChatClient::from_config(&config);
    let transcript = conversation_uid
        .map(Transcript::with_conversation)
        .unwrap_or_default();

    let mut conversation = Conversation::with_transcript(transcript, Arc::new(TracingNotifier));
    if let Some(bot_uid) = bot_uid {
        conversation = conversation.with_bot(bot_uid);
    }

    let summary = conversation.send(&client, text).await?;
    tracing::info!(
        records = summary.records,
        errors = summary.errors,
        completed = summary.completed,
        "reply finished"
    );
    Ok(conversation.into_transcript())
}
