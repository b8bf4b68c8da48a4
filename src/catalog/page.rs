use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::client::YoutubeClient;
use crate::{Result, TranscriptError};

pub const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

const CONSENT_ACTION: &str = "action=\"https://consent.youtube.com/s\"";
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

fn consent_value_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"name="v" value="(.*?)""#).expect("valid consent regex"))
}

fn base_headers() -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("Accept-Language".to_string(), "en-US".to_string());
    headers
}

/// Download the watch page, accepting the cookie consent wall when it appears
pub async fn fetch_video_page(client: &dyn YoutubeClient, video_id: &str) -> Result<String> {
    fetch_with_headers(client, video_id, base_headers()).await
}

/// Download the watch page as the account stored in a Netscape cookie file
pub async fn fetch_video_page_with_cookies(
    client: &dyn YoutubeClient,
    video_id: &str,
    cookies_path: &Path,
) -> Result<String> {
    let cookie_header = load_cookie_header(video_id, cookies_path).await?;
    let mut headers = base_headers();
    headers.insert("Cookie".to_string(), cookie_header);
    fetch_with_headers(client, video_id, headers).await
}

async fn fetch_with_headers(
    client: &dyn YoutubeClient,
    video_id: &str,
    mut headers: HashMap<String, String>,
) -> Result<String> {
    let url = format!("{}{}", WATCH_URL, video_id);
    let html = client
        .get(&url, &headers)
        .await
        .map_err(|e| TranscriptError::transport(video_id, e))?;

    if !html.contains(CONSENT_ACTION) {
        return Ok(html);
    }

    tracing::debug!("Consent page returned for video {}, retrying with consent cookie", video_id);

    let consent = consent_value_regex()
        .captures(&html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| TranscriptError::ConsentCookie {
            video_id: video_id.to_string(),
        })?;

    let cookie = match headers.get("Cookie") {
        Some(existing) => format!("{}; CONSENT=YES+{}", existing, consent),
        None => format!("CONSENT=YES+{}", consent),
    };
    headers.insert("Cookie".to_string(), cookie);

    let html = client
        .get(&url, &headers)
        .await
        .map_err(|e| TranscriptError::transport(video_id, e))?;

    if html.contains(CONSENT_ACTION) {
        return Err(TranscriptError::ConsentCookie {
            video_id: video_id.to_string(),
        });
    }

    Ok(html)
}

async fn load_cookie_header(video_id: &str, path: &Path) -> Result<String> {
    let cookies_error = |reason: String| TranscriptError::Cookies {
        video_id: video_id.to_string(),
        path: path.to_path_buf(),
        reason,
    };

    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| cookies_error(e.to_string()))?;

    let header = parse_netscape_cookies(&contents)
        .into_iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ");

    if header.is_empty() {
        return Err(cookies_error("No cookies found in the file.".to_string()));
    }

    tracing::debug!("Loaded cookies from {}", path.display());
    Ok(header)
}

/// `(name, value)` pairs from a Netscape-format cookie jar
pub fn parse_netscape_cookies(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let line = match line.strip_prefix(HTTP_ONLY_PREFIX) {
                Some(rest) => rest,
                None if line.is_empty() || line.starts_with('#') => return None,
                None => line,
            };

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 7 {
                return None;
            }
            Some((fields[5].to_string(), fields[6].to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockYoutubeClient, TransportError};
    use std::io::Write;

    const COOKIES: &str = "# Netscape HTTP Cookie File\n\
        \n\
        .youtube.com\tTRUE\t/\tTRUE\t0\tPREF\tf6=8\n\
        #HttpOnly_.youtube.com\tTRUE\t/\tTRUE\t0\tSID\tsecret\n\
        broken line\n";

    #[test]
    fn test_parse_netscape_cookies() {
        let cookies = parse_netscape_cookies(COOKIES);
        assert_eq!(
            cookies,
            vec![
                ("PREF".to_string(), "f6=8".to_string()),
                ("SID".to_string(), "secret".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_plain_page_is_returned() {
        let mut client = MockYoutubeClient::new();
        client
            .expect_get()
            .times(1)
            .returning(|url, headers| {
                assert_eq!(url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
                assert_eq!(headers.get("Accept-Language").map(String::as_str), Some("en-US"));
                Ok("<html>page</html>".to_string())
            });

        let html = fetch_video_page(&client, "dQw4w9WgXcQ").await.unwrap();
        assert_eq!(html, "<html>page</html>");
    }

    fn consent_form(inner: &str) -> String {
        format!(r#"<form action="https://consent.youtube.com/s">{}</form>"#, inner)
    }

    #[tokio::test]
    async fn test_consent_page_is_retried_with_cookie() {
        let mut client = MockYoutubeClient::new();
        client
            .expect_get()
            .times(2)
            .returning(|_, headers| match headers.get("Cookie") {
                None => Ok(consent_form(r#"<input name="v" value="cb.20210328-17-p0.en+FX+123">"#)),
                Some(cookie) => {
                    assert_eq!(cookie, "CONSENT=YES+cb.20210328-17-p0.en+FX+123");
                    Ok("<html>page</html>".to_string())
                }
            });

        let html = fetch_video_page(&client, "dQw4w9WgXcQ").await.unwrap();
        assert_eq!(html, "<html>page</html>");
    }

    #[tokio::test]
    async fn test_consent_without_value_fails() {
        let mut client = MockYoutubeClient::new();
        client
            .expect_get()
            .times(1)
            .returning(|_, _| Ok(consent_form("")));

        let err = fetch_video_page(&client, "dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, TranscriptError::ConsentCookie { .. }));
    }

    #[tokio::test]
    async fn test_consent_retry_still_blocked_fails() {
        let mut client = MockYoutubeClient::new();
        client
            .expect_get()
            .times(2)
            .returning(|_, _| Ok(consent_form(r#"<input name="v" value="x">"#)));

        let err = fetch_video_page(&client, "dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, TranscriptError::ConsentCookie { .. }));
    }

    #[tokio::test]
    async fn test_transport_error_carries_video_id() {
        let mut client = MockYoutubeClient::new();
        client.expect_get().returning(|url, _| {
            Err(TransportError::Forbidden {
                url: url.to_string(),
                status: 429,
            })
        });

        let err = fetch_video_page(&client, "dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, TranscriptError::Transport { .. }));
        assert_eq!(err.video_id(), Some("dQw4w9WgXcQ"));
    }

    #[tokio::test]
    async fn test_cookie_file_is_sent() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(COOKIES.as_bytes()).unwrap();

        let mut client = MockYoutubeClient::new();
        client.expect_get().times(1).returning(|_, headers| {
            assert_eq!(headers.get("Cookie").map(String::as_str), Some("PREF=f6=8; SID=secret"));
            Ok("<html>page</html>".to_string())
        });

        let html = fetch_video_page_with_cookies(&client, "dQw4w9WgXcQ", file.path())
            .await
            .unwrap();
        assert_eq!(html, "<html>page</html>");
    }

    #[tokio::test]
    async fn test_unusable_cookie_files() {
        let client = MockYoutubeClient::new();

        let missing = Path::new("/nonexistent/cookies.txt");
        let err = fetch_video_page_with_cookies(&client, "dQw4w9WgXcQ", missing)
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptError::Cookies { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"# Netscape HTTP Cookie File\n").unwrap();
        let err = fetch_video_page_with_cookies(&client, "dQw4w9WgXcQ", file.path())
            .await
            .unwrap_err();
        match err {
            TranscriptError::Cookies { reason, .. } => {
                assert_eq!(reason, "No cookies found in the file.")
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
