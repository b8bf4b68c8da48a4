use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub mod parser;

use crate::catalog::{CaptionTrack, TranslationLanguage};
use crate::client::YoutubeClient;
use crate::{Result, TranscriptError};

/// One timed caption line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,

    /// Offset from the start of the video, in seconds
    pub start: f64,

    /// Display duration in seconds
    #[serde(rename = "dur")]
    pub duration: f64,
}

impl Fragment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Fragments of one transcript, ordered by start time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranscriptContent {
    fragments: Vec<Fragment>,
}

impl TranscriptContent {
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn into_fragments(self) -> Vec<Fragment> {
        self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl IntoIterator for TranscriptContent {
    type Item = Fragment;
    type IntoIter = std::vec::IntoIter<Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.into_iter()
    }
}

/// A fetchable handle to one caption track, optionally translated
#[derive(Clone)]
pub struct Transcript {
    client: Arc<dyn YoutubeClient>,
    video_id: String,
    language: String,
    language_code: String,
    is_generated: bool,
    is_translatable: bool,
    translation_languages: Vec<TranslationLanguage>,
    base_url: String,
    translation_target: Option<String>,
}

impl Transcript {
    pub(crate) fn from_track(
        client: Arc<dyn YoutubeClient>,
        video_id: &str,
        track: &CaptionTrack,
    ) -> Self {
        Self {
            client,
            video_id: video_id.to_string(),
            language: track.language.clone(),
            language_code: track.language_code.clone(),
            is_generated: track.is_generated,
            is_translatable: track.is_translatable,
            translation_languages: track.translation_languages.clone(),
            base_url: track.base_url.clone(),
            translation_target: None,
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    pub fn is_generated(&self) -> bool {
        self.is_generated
    }

    pub fn is_translatable(&self) -> bool {
        self.is_translatable
    }

    pub fn translation_languages(&self) -> &[TranslationLanguage] {
        &self.translation_languages
    }

    /// Target language of a translated handle
    pub fn translation_target(&self) -> Option<&str> {
        self.translation_target.as_deref()
    }

    /// The URL `fetch` requests
    pub fn api_url(&self) -> String {
        match &self.translation_target {
            None => self.base_url.clone(),
            Some(target) => {
                let separator = if self.base_url.contains('?') { '&' } else { '?' };
                format!("{}{}tlang={}", self.base_url, separator, urlencoding::encode(target))
            }
        }
    }

    /// A handle that fetches this track machine-translated into `language_code`
    pub fn translate(&self, language_code: &str) -> Result<Transcript> {
        let unavailable = |reason: &str| TranscriptError::TranslationUnavailable {
            video_id: self.video_id.clone(),
            language_code: self.language_code.clone(),
            target: language_code.to_string(),
            reason: reason.to_string(),
        };

        if !self.is_translatable {
            return Err(unavailable("This transcript is not translatable."));
        }
        if !self
            .translation_languages
            .iter()
            .any(|l| l.language_code == language_code)
        {
            return Err(unavailable("This language is not available for translation."));
        }

        let mut translated = self.clone();
        translated.translation_target = Some(language_code.to_string());
        if let Some(target) = self
            .translation_languages
            .iter()
            .find(|l| l.language_code == language_code)
        {
            translated.language = target.language.clone();
        }
        Ok(translated)
    }

    /// Download and parse the timed-text document
    pub async fn fetch(&self) -> Result<TranscriptContent> {
        let url = self.api_url();
        let mut headers = HashMap::new();
        headers.insert("Accept-Language".to_string(), "en-US".to_string());

        tracing::debug!(
            "Fetching '{}' transcript for video {}",
            self.translation_target.as_deref().unwrap_or(&self.language_code),
            self.video_id
        );

        let body = self
            .client
            .get(&url, &headers)
            .await
            .map_err(|e| TranscriptError::transport(&self.video_id, e))?;

        let trimmed = body.trim();
        if trimmed.is_empty() || !trimmed.starts_with('<') {
            return Err(TranscriptError::ContentParse {
                video_id: self.video_id.clone(),
                message: "response body is not an XML document".to_string(),
            });
        }

        parser::parse_timed_text(&self.video_id, trimmed)
    }
}

impl std::fmt::Display for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}){}{}",
            self.language_code,
            self.language,
            if self.is_generated { " [generated]" } else { "" },
            if self.is_translatable { " [translatable]" } else { "" }
        )
    }
}

impl std::fmt::Debug for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcript")
            .field("video_id", &self.video_id)
            .field("language_code", &self.language_code)
            .field("is_generated", &self.is_generated)
            .field("translation_target", &self.translation_target)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
