use regex::Regex;
use std::sync::OnceLock;

use super::{Fragment, TranscriptContent};
use crate::{Result, TranscriptError};

fn html_tag_regex() -> &'static Regex {
    static HTML_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    HTML_TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]*>").expect("Failed to compile HTML tag regex"))
}

/// Parse a YouTube timed-text document (`<transcript><text start= dur=>..</text></transcript>`).
///
/// Fragment text has inline markup removed and entities decoded. Empty
/// fragments are kept. The result is stably ordered by start time.
pub fn parse_timed_text(video_id: &str, xml: &str) -> Result<TranscriptContent> {
    let parse_error = |message: String| TranscriptError::ContentParse {
        video_id: video_id.to_string(),
        message,
    };

    let document = roxmltree::Document::parse(xml).map_err(|e| parse_error(e.to_string()))?;
    let root = document.root_element();
    if root.tag_name().name() != "transcript" {
        return Err(parse_error(format!(
            "expected <transcript> root element, found <{}>",
            root.tag_name().name()
        )));
    }

    let mut fragments = Vec::new();
    for node in root.children().filter(|n| n.has_tag_name("text")) {
        let start = parse_seconds(node.attribute("start")).ok_or_else(|| {
            parse_error(format!("invalid start attribute: {:?}", node.attribute("start")))
        })?;

        let duration = match node.attribute("dur") {
            None => 0.0,
            Some(raw) => parse_seconds(Some(raw))
                .ok_or_else(|| parse_error(format!("invalid dur attribute: {:?}", raw)))?,
        };

        let raw_text: String = node
            .descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect();

        fragments.push(Fragment {
            text: clean_text(&raw_text),
            start,
            duration,
        });
    }

    // Vec::sort_by is stable, so equal starts keep document order
    fragments.sort_by(|a, b| a.start.total_cmp(&b.start));

    tracing::debug!("Parsed {} fragments for video {}", fragments.len(), video_id);
    Ok(TranscriptContent::new(fragments))
}

fn parse_seconds(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Strip inline markup and decode the entities YouTube escapes a second time
fn clean_text(raw: &str) -> String {
    let stripped = html_tag_regex().replace_all(raw, "");
    html_escape::decode_html_entities(&stripped).into_owned()
}
