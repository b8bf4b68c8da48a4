use serde::Deserialize;
use std::sync::Arc;

use super::{CaptionTrack, TranscriptCatalog, TranslationLanguage};
use crate::client::YoutubeClient;
use crate::{Result, TranscriptError};

const CAPTIONS_MARKER: &str = "\"captions\":";
const PLAYABILITY_MARKER: &str = "\"playabilityStatus\":";
const RECAPTCHA_MARKER: &str = "class=\"g-recaptcha\"";
const SRV3_SUFFIX: &str = "&fmt=srv3";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionsJson {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    caption_tracks: Option<Vec<CaptionTrackJson>>,
    #[serde(default)]
    translation_languages: Vec<TranslationLanguageJson>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrackJson {
    base_url: String,
    #[serde(default)]
    name: LocalizedText,
    language_code: String,
    kind: Option<String>,
    is_translatable: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationLanguageJson {
    language_code: String,
    #[serde(default)]
    language_name: LocalizedText,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalizedText {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

impl LocalizedText {
    fn into_text(self) -> String {
        self.simple_text
            .or_else(|| self.runs.into_iter().next().map(|run| run.text))
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
struct PlayabilityStatus {
    #[serde(default)]
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

/// Build the caption catalog embedded in a watch page.
///
/// `cookies_supplied` only changes the wording of restriction errors.
pub fn extract_catalog(
    client: Arc<dyn YoutubeClient>,
    video_id: &str,
    html: &str,
    cookies_supplied: bool,
) -> Result<TranscriptCatalog> {
    let Some(position) = html.find(CAPTIONS_MARKER) else {
        return Err(classify_missing_captions(video_id, html, cookies_supplied));
    };

    let json = &html[position + CAPTIONS_MARKER.len()..];
    let captions: CaptionsJson =
        first_json_value(json).map_err(|e| TranscriptError::UpstreamFormat {
            video_id: video_id.to_string(),
            message: e.to_string(),
        })?;

    // A renderer without a track list is how disabled captions appear
    let Some((caption_tracks, translation_languages)) = captions
        .player_captions_tracklist_renderer
        .and_then(|r| r.caption_tracks.map(|tracks| (tracks, r.translation_languages)))
    else {
        return Err(TranscriptError::CaptionsDisabled {
            video_id: video_id.to_string(),
        });
    };

    let translation_languages: Vec<TranslationLanguage> = translation_languages
        .into_iter()
        .map(|lang| TranslationLanguage {
            language_code: lang.language_code,
            language: lang.language_name.into_text(),
        })
        .collect();

    let tracks = caption_tracks
        .into_iter()
        .map(|track| {
            let is_translatable =
                track.is_translatable.unwrap_or(true) && !translation_languages.is_empty();
            CaptionTrack {
                language: track.name.into_text(),
                language_code: track.language_code,
                is_generated: track.kind.as_deref() == Some("asr"),
                is_translatable,
                translation_languages: if is_translatable {
                    translation_languages.clone()
                } else {
                    Vec::new()
                },
                base_url: track.base_url.replace(SRV3_SUFFIX, ""),
            }
        })
        .collect::<Vec<_>>();

    tracing::debug!("Found {} caption tracks for video {}", tracks.len(), video_id);

    Ok(TranscriptCatalog::new(video_id, tracks, translation_languages, client))
}

/// Decode only the first JSON value of `input`, ignoring whatever follows it
fn first_json_value<T: serde::de::DeserializeOwned>(input: &str) -> serde_json::Result<T> {
    let mut stream = serde_json::Deserializer::from_str(input).into_iter::<T>();
    match stream.next() {
        Some(value) => value,
        None => Err(serde::de::Error::custom("no JSON value after marker")),
    }
}

fn classify_missing_captions(
    video_id: &str,
    html: &str,
    cookies_supplied: bool,
) -> TranscriptError {
    let video_id = video_id.to_string();

    if html.contains(RECAPTCHA_MARKER) {
        return TranscriptError::RequestBlocked { video_id };
    }

    let Some(position) = html.find(PLAYABILITY_MARKER) else {
        return TranscriptError::VideoUnavailable { video_id };
    };

    // An unreadable status still means the page had no captions
    let status: PlayabilityStatus =
        first_json_value(&html[position + PLAYABILITY_MARKER.len()..]).unwrap_or_default();
    let reason = status.reason.unwrap_or_default();

    match status.status.as_str() {
        "ERROR" => TranscriptError::VideoUnavailable { video_id },
        "LOGIN_REQUIRED" if reason.contains("not a bot") => {
            TranscriptError::RequestBlocked { video_id }
        }
        "LOGIN_REQUIRED"
        | "AGE_CHECK_REQUIRED"
        | "AGE_VERIFICATION_REQUIRED"
        | "CONTENT_CHECK_REQUIRED" => {
            let mut reason = if reason.is_empty() {
                "This video is age-restricted and requires signing in.".to_string()
            } else {
                reason
            };
            if cookies_supplied {
                reason.push_str(
                    " The supplied cookies were not accepted; they may be expired or invalid.",
                );
            } else {
                reason.push_str(" Supplying cookies of a signed-in account may help.");
            }
            TranscriptError::AgeOrRegionRestricted { video_id, reason }
        }
        "UNPLAYABLE" if reason.to_lowercase().contains("country") => {
            TranscriptError::AgeOrRegionRestricted { video_id, reason }
        }
        "UNPLAYABLE" => TranscriptError::VideoUnavailable { video_id },
        _ => TranscriptError::CaptionsDisabled { video_id },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockYoutubeClient;

    fn client() -> Arc<dyn YoutubeClient> {
        Arc::new(MockYoutubeClient::new())
    }

    fn page(captions: &str) -> String {
        format!(
            "<html><script>var ytInitialPlayerResponse = {{\"playabilityStatus\":{{\"status\":\"OK\"}},\"captions\":{},\"videoDetails\":{{\"videoId\":\"abc123\"}}}};</script></html>",
            captions
        )
    }

    const RENDERER: &str = r#"{"playerCaptionsTracklistRenderer":{
        "captionTracks":[
            {"baseUrl":"https://www.youtube.com/api/timedtext?v=abc123&lang=en&fmt=srv3","name":{"simpleText":"English"},"languageCode":"en","isTranslatable":true},
            {"baseUrl":"https://www.youtube.com/api/timedtext?v=abc123&lang=en&kind=asr","name":{"runs":[{"text":"English (auto-generated)"}]},"languageCode":"en","kind":"asr","isTranslatable":true},
            {"baseUrl":"https://www.youtube.com/api/timedtext?v=abc123&lang=de","name":{"simpleText":"Deutsch"},"languageCode":"de","isTranslatable":false}
        ],
        "translationLanguages":[
            {"languageCode":"fr","languageName":{"simpleText":"French"}},
            {"languageCode":"es","languageName":{"simpleText":"Spanish"}}
        ]}}"#;

    #[test]
    fn test_extracts_tracks_in_page_order() {
        let catalog = extract_catalog(client(), "abc123", &page(RENDERER), false).unwrap();
        let tracks = catalog.tracks();

        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0].language, "English");
        assert!(!tracks[0].is_generated);
        assert_eq!(tracks[0].base_url, "https://www.youtube.com/api/timedtext?v=abc123&lang=en");
        assert_eq!(tracks[1].language, "English (auto-generated)");
        assert!(tracks[1].is_generated);
        assert_eq!(tracks[2].language_code, "de");
        assert_eq!(catalog.translation_languages().len(), 2);
    }

    #[test]
    fn test_translatable_requires_flag_and_languages() {
        let catalog = extract_catalog(client(), "abc123", &page(RENDERER), false).unwrap();
        let tracks = catalog.tracks();

        assert!(tracks[0].is_translatable);
        assert_eq!(tracks[0].translation_languages[0].language_code, "fr");
        assert!(!tracks[2].is_translatable);
        assert!(tracks[2].translation_languages.is_empty());

        let no_languages = r#"{"playerCaptionsTracklistRenderer":{"captionTracks":[
            {"baseUrl":"u","name":{"simpleText":"English"},"languageCode":"en"}]}}"#;
        let catalog = extract_catalog(client(), "abc123", &page(no_languages), false).unwrap();
        assert!(!catalog.tracks()[0].is_translatable);
    }

    #[test]
    fn test_empty_track_list_is_valid() {
        let catalog = extract_catalog(
            client(),
            "abc123",
            &page(r#"{"playerCaptionsTracklistRenderer":{"captionTracks":[]}}"#),
            false,
        )
        .unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_missing_renderer_means_disabled() {
        let err = extract_catalog(client(), "abc123", &page(r#"{"other":{}}"#), false).unwrap_err();
        assert!(matches!(err, TranscriptError::CaptionsDisabled { .. }));
    }

    #[test]
    fn test_renderer_without_track_list_means_disabled() {
        let captions = r#"{"playerCaptionsTracklistRenderer":{"translationLanguages":[]}}"#;
        let err = extract_catalog(client(), "abc123", &page(captions), false).unwrap_err();
        assert!(matches!(
            err,
            TranscriptError::CaptionsDisabled { video_id } if video_id == "abc123"
        ));
    }

    #[test]
    fn test_malformed_json_is_upstream_format() {
        let html = r#"<script>"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":</script>"#;
        let err = extract_catalog(client(), "abc123", html, false).unwrap_err();
        assert!(matches!(err, TranscriptError::UpstreamFormat { .. }));
    }

    #[test]
    fn test_recaptcha_page_is_blocked() {
        let html = r#"<form><div class="g-recaptcha" data-sitekey="x"></div></form>"#;
        let err = extract_catalog(client(), "abc123", html, false).unwrap_err();
        assert!(matches!(err, TranscriptError::RequestBlocked { .. }));
    }

    #[test]
    fn test_no_playability_means_unavailable() {
        let err = extract_catalog(client(), "abc123", "<html></html>", false).unwrap_err();
        assert!(matches!(err, TranscriptError::VideoUnavailable { .. }));
    }

    fn status_page(status: &str, reason: &str) -> String {
        format!(
            r#"<script>{{"playabilityStatus":{{"status":"{}","reason":"{}"}},"videoDetails":{{}}}}</script>"#,
            status, reason
        )
    }

    #[test]
    fn test_playability_classification() {
        let html = status_page("ERROR", "Video unavailable");
        let err = extract_catalog(client(), "abc123", &html, false).unwrap_err();
        assert!(matches!(err, TranscriptError::VideoUnavailable { .. }));

        let err = extract_catalog(
            client(),
            "abc123",
            &status_page("LOGIN_REQUIRED", "Sign in to confirm you're not a bot"),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, TranscriptError::RequestBlocked { .. }));

        let err = extract_catalog(
            client(),
            "abc123",
            &status_page(
                "UNPLAYABLE",
                "The uploader has not made this video available in your country",
            ),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, TranscriptError::AgeOrRegionRestricted { .. }));

        let html = status_page("UNPLAYABLE", "Private video");
        let err = extract_catalog(client(), "abc123", &html, false).unwrap_err();
        assert!(matches!(err, TranscriptError::VideoUnavailable { .. }));

        let err = extract_catalog(client(), "abc123", &status_page("OK", ""), false).unwrap_err();
        assert!(matches!(err, TranscriptError::CaptionsDisabled { .. }));
    }

    #[test]
    fn test_age_restriction_mentions_cookies() {
        let html = status_page("LOGIN_REQUIRED", "Sign in to confirm your age");

        match extract_catalog(client(), "abc123", &html, true).unwrap_err() {
            TranscriptError::AgeOrRegionRestricted { reason, .. } => {
                assert!(reason.starts_with("Sign in to confirm your age"));
                assert!(reason.contains("supplied cookies"));
            }
            other => panic!("unexpected error: {other}"),
        }

        match extract_catalog(client(), "abc123", &html, false).unwrap_err() {
            TranscriptError::AgeOrRegionRestricted { reason, .. } => {
                assert!(!reason.contains("supplied cookies"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
