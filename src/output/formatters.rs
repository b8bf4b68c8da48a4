use serde::{Deserialize, Serialize};

use crate::transcript::{Fragment, TranscriptContent};

/// Renderings of a fetched transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptFormatter {
    Json,
    PrettyJson,
    Srt,
    WebVtt,
    Text,
}

impl TranscriptFormatter {
    pub fn format(&self, content: &TranscriptContent) -> String {
        match self {
            TranscriptFormatter::Json => {
                serde_json::to_string(content).unwrap_or_else(|_| "[]".to_string())
            }
            TranscriptFormatter::PrettyJson => {
                serde_json::to_string_pretty(content).unwrap_or_else(|_| "[]".to_string())
            }
            TranscriptFormatter::Text => visible(content)
                .map(|f| f.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            TranscriptFormatter::Srt => visible(content)
                .enumerate()
                .map(|(i, f)| format!("{}\n{}\n{}", i + 1, cue_timing(f, ','), f.text))
                .collect::<Vec<_>>()
                .join("\n\n"),
            TranscriptFormatter::WebVtt => {
                let cues = visible(content)
                    .map(|f| format!("{}\n{}", cue_timing(f, '.'), f.text))
                    .collect::<Vec<_>>()
                    .join("\n\n");
                format!("WEBVTT\n\n{}", cues)
            }
        }
    }

    /// File extension for saved transcripts
    pub fn extension(&self) -> &'static str {
        match self {
            TranscriptFormatter::Json | TranscriptFormatter::PrettyJson => "json",
            TranscriptFormatter::Srt => "srt",
            TranscriptFormatter::WebVtt => "vtt",
            TranscriptFormatter::Text => "txt",
        }
    }
}

fn visible(content: &TranscriptContent) -> impl Iterator<Item = &Fragment> {
    content.fragments().iter().filter(|f| !f.text.trim().is_empty())
}

fn cue_timing(fragment: &Fragment, ms_sep: char) -> String {
    let start = seconds_to_ms(fragment.start);
    let end = seconds_to_ms(fragment.start + fragment.duration);
    format!(
        "{} --> {}",
        format_timestamp(start, ms_sep),
        format_timestamp(end, ms_sep)
    )
}

fn seconds_to_ms(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

fn format_timestamp(ms: i64, ms_sep: char) -> String {
    let ms = ms.max(0);

    let total_seconds = ms / 1000;
    let milli = ms % 1000;
    let sec = total_seconds % 60;
    let total_minutes = total_seconds / 60;
    let min = total_minutes % 60;
    let hour = total_minutes / 60;

    format!("{hour:02}:{min:02}:{sec:02}{ms_sep}{milli:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TranscriptContent {
        TranscriptContent::new(vec![
            Fragment::new("Hey, this is just a test", 0.0, 1.54),
            Fragment::new("this is not the original transcript", 1.54, 4.16),
            Fragment::new("   ", 5.0, 0.5),
            Fragment::new("test & test, like this \"test\" he's testing", 5.7, 3.239),
        ])
    }

    #[test]
    fn test_timestamps() {
        assert_eq!(format_timestamp(0, ','), "00:00:00,000");
        assert_eq!(format_timestamp(3_723_004, '.'), "01:02:03.004");
        assert_eq!(format_timestamp(-5, ','), "00:00:00,000");
    }

    #[test]
    fn test_srt() {
        let expected = "1\n00:00:00,000 --> 00:00:01,540\nHey, this is just a test\n\n\
                        2\n00:00:01,540 --> 00:00:05,700\nthis is not the original transcript\n\n\
                        3\n00:00:05,700 --> 00:00:08,939\ntest & test, like this \"test\" he's testing";
        assert_eq!(TranscriptFormatter::Srt.format(&sample()), expected);
    }

    #[test]
    fn test_webvtt() {
        let expected = "WEBVTT\n\n\
                        00:00:00.000 --> 00:00:01.540\nHey, this is just a test\n\n\
                        00:00:01.540 --> 00:00:05.700\nthis is not the original transcript\n\n\
                        00:00:05.700 --> 00:00:08.939\ntest & test, like this \"test\" he's testing";
        assert_eq!(TranscriptFormatter::WebVtt.format(&sample()), expected);
    }

    #[test]
    fn test_text_skips_blank_fragments() {
        assert_eq!(
            TranscriptFormatter::Text.format(&sample()),
            "Hey, this is just a test\nthis is not the original transcript\ntest & test, like this \"test\" he's testing"
        );
    }

    #[test]
    fn test_json_keeps_every_fragment() {
        let json = TranscriptFormatter::Json.format(&sample());
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[0]["dur"], 1.54);
        assert!(!json.contains('\n'));

        let pretty = TranscriptFormatter::PrettyJson.format(&sample());
        assert!(pretty.contains("\n  {"));
        let reparsed: TranscriptContent = serde_json::from_str(&pretty).unwrap();
        assert_eq!(reparsed, sample());
    }

    #[test]
    fn test_empty_content() {
        let empty = TranscriptContent::default();
        assert_eq!(TranscriptFormatter::Json.format(&empty), "[]");
        assert_eq!(TranscriptFormatter::Srt.format(&empty), "");
        assert_eq!(TranscriptFormatter::WebVtt.format(&empty), "WEBVTT\n\n");
    }

    #[test]
    fn test_extensions() {
        assert_eq!(TranscriptFormatter::PrettyJson.extension(), "json");
        assert_eq!(TranscriptFormatter::WebVtt.extension(), "vtt");
        assert_eq!(TranscriptFormatter::Text.extension(), "txt");
    }
}
