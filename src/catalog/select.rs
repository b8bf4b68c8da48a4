use serde::{Deserialize, Serialize};

use super::{CaptionTrack, TranscriptCatalog};
use crate::{Result, TranscriptError};

/// Which track origins a selection may return
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    ManualOnly,
    GeneratedOnly,
    #[default]
    Any,
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionMode::ManualOnly => write!(f, "manual"),
            SelectionMode::GeneratedOnly => write!(f, "generated"),
            SelectionMode::Any => write!(f, "any"),
        }
    }
}

/// Pick a track by language preference.
///
/// In `Any` mode every requested code is tried against manual tracks before
/// any generated track is considered.
pub(crate) fn select_track<'a>(
    catalog: &'a TranscriptCatalog,
    language_codes: &[&str],
    mode: SelectionMode,
) -> Result<&'a CaptionTrack> {
    validate_codes(language_codes)?;

    let passes: &[bool] = match mode {
        SelectionMode::ManualOnly => &[false],
        SelectionMode::GeneratedOnly => &[true],
        SelectionMode::Any => &[false, true],
    };

    for &generated in passes {
        for code in language_codes {
            if let Some(track) = catalog
                .tracks()
                .iter()
                .find(|t| t.is_generated == generated && t.language_code == *code)
            {
                tracing::debug!(
                    "Selected {} track '{}' for video {}",
                    if generated { "generated" } else { "manual" },
                    track.language_code,
                    catalog.video_id()
                );
                return Ok(track);
            }
        }
    }

    Err(TranscriptError::NoSuitableTranscript {
        video_id: catalog.video_id().to_string(),
        requested: language_codes.iter().map(|c| c.to_string()).collect(),
        available: catalog.to_string(),
    })
}

pub(crate) fn validate_codes(language_codes: &[&str]) -> Result<()> {
    if language_codes.is_empty() {
        return Err(TranscriptError::InvalidLanguageCodes(
            "at least one language code is required".to_string(),
        ));
    }
    if language_codes.iter().any(|c| c.trim().is_empty()) {
        return Err(TranscriptError::InvalidLanguageCodes(format!(
            "language codes must not be blank: {:?}",
            language_codes
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{catalog, track};

    fn sample() -> TranscriptCatalog {
        catalog(vec![track("en", false), track("en", true), track("de", false)])
    }

    #[test]
    fn test_any_prefers_manual_for_earlier_code() {
        let catalog = sample();
        let chosen = select_track(&catalog, &["fr", "en"], SelectionMode::Any).unwrap();
        assert_eq!(chosen.language_code, "en");
        assert!(!chosen.is_generated);

        let again = select_track(&catalog, &["fr", "en"], SelectionMode::Any).unwrap();
        assert_eq!(again, chosen);
    }

    #[test]
    fn test_any_scans_all_manual_before_generated() {
        let catalog = catalog(vec![track("en", true), track("de", false)]);
        let chosen = select_track(&catalog, &["en", "de"], SelectionMode::Any).unwrap();
        assert_eq!(chosen.language_code, "de");
        assert!(!chosen.is_generated);
    }

    #[test]
    fn test_generated_only() {
        let catalog = sample();
        let chosen = select_track(&catalog, &["de", "en"], SelectionMode::GeneratedOnly).unwrap();
        assert_eq!(chosen.language_code, "en");
        assert!(chosen.is_generated);
    }

    #[test]
    fn test_manual_only_miss() {
        let catalog = catalog(vec![track("en", true)]);
        let err = select_track(&catalog, &["en"], SelectionMode::ManualOnly).unwrap_err();
        match err {
            TranscriptError::NoSuitableTranscript {
                video_id,
                requested,
                available,
            } => {
                assert_eq!(video_id, "abc123");
                assert_eq!(requested, vec!["en".to_string()]);
                assert!(available.contains("Automatically generated: [en]"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_or_blank_codes_rejected() {
        let catalog = sample();
        assert!(matches!(
            select_track(&catalog, &[], SelectionMode::Any),
            Err(TranscriptError::InvalidLanguageCodes(_))
        ));
        assert!(matches!(
            select_track(&catalog, &["en", "  "], SelectionMode::Any),
            Err(TranscriptError::InvalidLanguageCodes(_))
        ));
    }

    #[test]
    fn test_empty_catalog_has_no_match() {
        let catalog = catalog(Vec::new());
        assert!(matches!(
            select_track(&catalog, &["en"], SelectionMode::Any),
            Err(TranscriptError::NoSuitableTranscript { .. })
        ));
    }
}
