//! YouTube Transcripts - retrieve closed-caption transcripts without a browser
//!
//! This library reads the caption-track list embedded in a video's watch page,
//! selects a track by language preference, downloads and parses its timed-text
//! document, and renders the result as JSON, SRT, WebVTT or plain text. Whole
//! playlists and channels are resolved through the YouTube Data API v3.

use std::path::PathBuf;

pub mod api;
pub mod batch;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod output;
pub mod transcript;
pub mod utils;

pub use api::TranscriptApi;
pub use batch::{BatchOutcome, TranscriptRequest};
pub use catalog::{CaptionTrack, SelectionMode, TranscriptCatalog, TranslationLanguage};
pub use cli::{Cli, Commands, OutputFormat};
pub use client::{ApiEndpoint, DefaultYoutubeClient, TransportError, YoutubeClient};
pub use config::Config;
pub use output::formatters::TranscriptFormatter;
pub use transcript::{Fragment, Transcript, TranscriptContent};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, TranscriptError>;

/// Every failure the retrieval pipeline can report.
///
/// Video-scoped variants render as
/// `Could not retrieve transcript for the video: <watch url>.\nReason: <reason>`.
#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("Invalid video id: {0}")]
    InvalidVideoId(String),

    #[error("Invalid language codes: {0}")]
    InvalidLanguageCodes(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Could not retrieve transcript for the video: https://www.youtube.com/watch?v={video_id}.\nReason: This video is no longer available.")]
    VideoUnavailable { video_id: String },

    #[error("Could not retrieve transcript for the video: https://www.youtube.com/watch?v={video_id}.\nReason: Transcripts are disabled for this video.")]
    CaptionsDisabled { video_id: String },

    #[error("Could not retrieve transcript for the video: https://www.youtube.com/watch?v={video_id}.\nReason: {reason}")]
    AgeOrRegionRestricted { video_id: String, reason: String },

    #[error("Could not retrieve transcript for the video: https://www.youtube.com/watch?v={video_id}.\nReason: YouTube is receiving too many requests from this IP and now requires solving a captcha to continue. Solve the captcha in a browser and export the cookies, use a different IP address, or wait until the block is lifted.")]
    RequestBlocked { video_id: String },

    #[error("Could not retrieve transcript for the video: https://www.youtube.com/watch?v={video_id}.\nReason: Failed to automatically give consent to saving cookies")]
    ConsentCookie { video_id: String },

    #[error("Could not retrieve transcript for the video: https://www.youtube.com/watch?v={video_id}.\nReason: Failed to load cookies from a file: {}. {reason}", .path.display())]
    Cookies {
        video_id: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Could not retrieve transcript for the video: https://www.youtube.com/watch?v={video_id}.\nReason: No transcripts were found for any of the requested language codes: {requested:?}. {available}")]
    NoSuitableTranscript {
        video_id: String,
        requested: Vec<String>,
        available: String,
    },

    #[error("Could not retrieve transcript for the video: https://www.youtube.com/watch?v={video_id}.\nReason: Cannot translate the '{language_code}' transcript to '{target}': {reason}")]
    TranslationUnavailable {
        video_id: String,
        language_code: String,
        target: String,
        reason: String,
    },

    #[error("Could not retrieve transcript for the video: https://www.youtube.com/watch?v={video_id}.\nReason: Failed to parse transcript content XML. {message}")]
    ContentParse { video_id: String, message: String },

    #[error("Could not retrieve transcript for the video: https://www.youtube.com/watch?v={video_id}.\nReason: Failed to parse transcript JSON. {message}")]
    UpstreamFormat { video_id: String, message: String },

    #[error("Request to YouTube failed{}: {source}", for_video(.video_id))]
    Transport {
        video_id: Option<String>,
        #[source]
        source: TransportError,
    },

    #[error("Could not find channel with the name: {0}")]
    ChannelNotFound(String),

    #[error("Failed to parse YouTube API response JSON: {0}")]
    Api(String),

    #[error("Retrieval cancelled for video {video_id}")]
    Cancelled { video_id: String },
}

impl TranscriptError {
    /// The video this failure belongs to, if it is scoped to one
    pub fn video_id(&self) -> Option<&str> {
        match self {
            TranscriptError::VideoUnavailable { video_id }
            | TranscriptError::CaptionsDisabled { video_id }
            | TranscriptError::AgeOrRegionRestricted { video_id, .. }
            | TranscriptError::RequestBlocked { video_id }
            | TranscriptError::ConsentCookie { video_id }
            | TranscriptError::Cookies { video_id, .. }
            | TranscriptError::NoSuitableTranscript { video_id, .. }
            | TranscriptError::TranslationUnavailable { video_id, .. }
            | TranscriptError::ContentParse { video_id, .. }
            | TranscriptError::UpstreamFormat { video_id, .. }
            | TranscriptError::Cancelled { video_id } => Some(video_id),
            TranscriptError::Transport { video_id, .. } => video_id.as_deref(),
            TranscriptError::InvalidVideoId(_)
            | TranscriptError::InvalidLanguageCodes(_)
            | TranscriptError::InvalidRequest(_)
            | TranscriptError::ChannelNotFound(_)
            | TranscriptError::Api(_) => None,
        }
    }

    pub(crate) fn transport(video_id: &str, source: TransportError) -> Self {
        TranscriptError::Transport {
            video_id: Some(video_id.to_string()),
            source,
        }
    }
}

fn for_video(video_id: &Option<String>) -> String {
    video_id
        .as_ref()
        .map(|id| format!(" for video {}", id))
        .unwrap_or_default()
}
