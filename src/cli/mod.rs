use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::SelectionMode;
use crate::output::formatters::TranscriptFormatter;

#[derive(Parser)]
#[command(
    name = "yt-transcripts",
    about = "YouTube Transcripts - Retrieve closed-caption transcripts for videos, playlists and channels",
    version,
    long_about = "A CLI tool for retrieving YouTube transcripts without a browser or API key. Lists the caption tracks of a video, selects one by language preference, and renders it as text, JSON, SRT or WebVTT. Playlists and channels are resolved through the YouTube Data API v3."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the caption tracks available for a video
    List {
        /// Video id or URL (watch, youtu.be, embed or shorts)
        #[arg(value_name = "VIDEO")]
        video: String,

        /// Netscape cookie file for age-restricted videos
        #[arg(long, value_name = "FILE")]
        cookies: Option<PathBuf>,
    },

    /// Fetch the transcript of a video
    Get {
        /// Video id or URL (watch, youtu.be, embed or shorts)
        #[arg(value_name = "VIDEO")]
        video: String,

        /// Preferred language codes, in order (defaults to the configured list)
        #[arg(short, long = "language", value_name = "CODE")]
        languages: Vec<String>,

        /// Which kind of track to accept
        #[arg(short, long, value_enum, default_value = "any")]
        mode: TrackMode,

        /// Machine-translate the selected track into this language
        #[arg(short, long, value_name = "CODE")]
        translate: Option<String>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Netscape cookie file for age-restricted videos
        #[arg(long, value_name = "FILE")]
        cookies: Option<PathBuf>,
    },

    /// Fetch transcripts for every video of a playlist
    Playlist {
        /// Playlist id or URL
        #[arg(value_name = "PLAYLIST")]
        playlist: String,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Fetch transcripts for every upload of a channel
    Channel {
        /// Channel name or id (UC...)
        #[arg(value_name = "CHANNEL")]
        channel: String,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Show or initialize the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List supported output formats
    Formats,
}

/// Options shared by playlist and channel commands
#[derive(clap::Args, Debug, Clone)]
pub struct BatchArgs {
    /// Preferred language codes, in order (defaults to the configured list)
    #[arg(short, long = "language", value_name = "CODE")]
    pub languages: Vec<String>,

    /// YouTube Data API v3 key
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Netscape cookie file sent with every page request
    #[arg(long, value_name = "FILE")]
    pub cookies: Option<PathBuf>,

    /// Keep going when a video fails instead of aborting the batch
    #[arg(long)]
    pub continue_on_error: bool,

    /// Only list the caption tracks of each video
    #[arg(long)]
    pub list_only: bool,

    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Directory receiving one `<video_id>.<ext>` file per transcript
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackMode {
    /// Manually created first, then automatically generated
    Any,
    /// Manually created tracks only
    Manual,
    /// Automatically generated tracks only
    Generated,
}

impl From<TrackMode> for SelectionMode {
    fn from(mode: TrackMode) -> Self {
        match mode {
            TrackMode::Any => SelectionMode::Any,
            TrackMode::Manual => SelectionMode::ManualOnly,
            TrackMode::Generated => SelectionMode::GeneratedOnly,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Plain text, one line per caption
    Text,
    /// Compact JSON array of {text, start, dur}
    Json,
    /// Indented JSON
    PrettyJson,
    /// SRT subtitle format
    Srt,
    /// WebVTT format
    Vtt,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::PrettyJson => write!(f, "pretty-json"),
            OutputFormat::Srt => write!(f, "srt"),
            OutputFormat::Vtt => write!(f, "vtt"),
        }
    }
}

impl From<OutputFormat> for TranscriptFormatter {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => TranscriptFormatter::Text,
            OutputFormat::Json => TranscriptFormatter::Json,
            OutputFormat::PrettyJson => TranscriptFormatter::PrettyJson,
            OutputFormat::Srt => TranscriptFormatter::Srt,
            OutputFormat::Vtt => TranscriptFormatter::WebVtt,
        }
    }
}
