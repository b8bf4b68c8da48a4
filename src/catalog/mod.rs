use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

pub mod extract;
pub mod page;
pub mod select;

pub use select::SelectionMode;

use crate::client::YoutubeClient;
use crate::transcript::Transcript;
use crate::Result;

/// One caption stream offered by a video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionTrack {
    /// Display name of the language ("English", "Deutsch (automatisch erzeugt)")
    pub language: String,

    /// Language code as reported by YouTube ("en", "pt-BR")
    pub language_code: String,

    /// Whether this track is speech-recognized rather than uploaded
    pub is_generated: bool,

    /// Whether YouTube offers machine translation of this track
    pub is_translatable: bool,

    /// Target languages for machine translation, empty when not translatable
    pub translation_languages: Vec<TranslationLanguage>,

    /// Timed-text URL of the track
    pub base_url: String,
}

/// A machine translation target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationLanguage {
    pub language_code: String,
    pub language: String,
}

/// All caption tracks a video offers, in page order
#[derive(Clone)]
pub struct TranscriptCatalog {
    video_id: String,
    tracks: Vec<CaptionTrack>,
    translation_languages: Vec<TranslationLanguage>,
    client: Arc<dyn YoutubeClient>,
}

impl TranscriptCatalog {
    /// Build a catalog, keeping only the first track per (language code, origin)
    pub fn new(
        video_id: impl Into<String>,
        tracks: Vec<CaptionTrack>,
        translation_languages: Vec<TranslationLanguage>,
        client: Arc<dyn YoutubeClient>,
    ) -> Self {
        let video_id = video_id.into();
        let mut seen = HashSet::new();
        let tracks = tracks
            .into_iter()
            .filter(|track| {
                let fresh = seen.insert((track.language_code.clone(), track.is_generated));
                if !fresh {
                    tracing::debug!(
                        "Dropping duplicate {} track '{}' for video {}",
                        if track.is_generated { "generated" } else { "manual" },
                        track.language_code,
                        video_id
                    );
                }
                fresh
            })
            .collect();

        Self {
            video_id,
            tracks,
            translation_languages,
            client,
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn tracks(&self) -> &[CaptionTrack] {
        &self.tracks
    }

    pub fn translation_languages(&self) -> &[TranslationLanguage] {
        &self.translation_languages
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Fetchable handles for every track, in page order
    pub fn transcripts(&self) -> impl Iterator<Item = Transcript> + '_ {
        self.tracks.iter().map(|track| self.handle(track))
    }

    /// Pick a track for the first matching language code, manual before generated
    pub fn find_transcript(&self, language_codes: &[&str]) -> Result<Transcript> {
        self.select(language_codes, SelectionMode::Any)
    }

    pub fn find_manual_transcript(&self, language_codes: &[&str]) -> Result<Transcript> {
        self.select(language_codes, SelectionMode::ManualOnly)
    }

    pub fn find_generated_transcript(&self, language_codes: &[&str]) -> Result<Transcript> {
        self.select(language_codes, SelectionMode::GeneratedOnly)
    }

    /// Select a track under the given mode
    pub fn select(&self, language_codes: &[&str], mode: SelectionMode) -> Result<Transcript> {
        let track = select::select_track(self, language_codes, mode)?;
        Ok(self.handle(track))
    }

    fn handle(&self, track: &CaptionTrack) -> Transcript {
        Transcript::from_track(self.client.clone(), &self.video_id, track)
    }

    fn codes(&self, generated: bool) -> BTreeSet<&str> {
        self.tracks
            .iter()
            .filter(|t| t.is_generated == generated)
            .map(|t| t.language_code.as_str())
            .collect()
    }
}

impl std::fmt::Display for TranscriptCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let translations: BTreeSet<&str> = self
            .translation_languages
            .iter()
            .map(|l| l.language_code.as_str())
            .collect();

        write!(
            f,
            "For video with ID ({}) transcripts are available in the following languages:\n\
             Manually created: {}\n\
             Automatically generated: {}\n\
             Available translation languages: {}",
            self.video_id,
            code_list(&self.codes(false)),
            code_list(&self.codes(true)),
            code_list(&translations)
        )
    }
}

/// `[de, en]`
fn code_list(codes: &BTreeSet<&str>) -> String {
    format!("[{}]", codes.iter().copied().collect::<Vec<_>>().join(", "))
}

impl std::fmt::Debug for TranscriptCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptCatalog")
            .field("video_id", &self.video_id)
            .field("tracks", &self.tracks)
            .field("translation_languages", &self.translation_languages)
            .finish_non_exhaustive()
    }
}
