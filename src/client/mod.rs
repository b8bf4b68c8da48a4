use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use url::Url;

const YOUTUBE_API_V3_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// YouTube Data API v3 resources used for batch resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiEndpoint {
    PlaylistItems,
    Search,
    Channels,
}

impl ApiEndpoint {
    pub fn resource(&self) -> &'static str {
        match self {
            ApiEndpoint::PlaylistItems => "playlistItems",
            ApiEndpoint::Search => "search",
            ApiEndpoint::Channels => "channels",
        }
    }

    /// Full URL of the endpoint, without query parameters
    pub fn url(&self) -> String {
        format!("{}{}", YOUTUBE_API_V3_BASE_URL, self.resource())
    }
}

impl std::fmt::Display for ApiEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.resource())
    }
}

/// Classified transport failures
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("resource not found: {url}")]
    NotFound { url: String },

    #[error("request blocked with HTTP {status}: {url}")]
    Forbidden { url: String, status: u16 },

    #[error("malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
}

/// HTTP capability the retrieval pipeline runs on.
///
/// Implementations return the raw response body; they never interpret it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait YoutubeClient: Send + Sync {
    /// GET a YouTube URL (watch page or timed-text document) with extra headers
    async fn get(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<String, TransportError>;

    /// GET a Data API v3 endpoint with the given query parameters
    async fn get_api(
        &self,
        endpoint: ApiEndpoint,
        params: &HashMap<String, String>,
    ) -> Result<String, TransportError>;
}

/// `YoutubeClient` backed by reqwest
pub struct DefaultYoutubeClient {
    client: Client,
}

impl DefaultYoutubeClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Wrap an already configured reqwest client (proxies, timeouts, ...)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn send(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<String, TransportError> {
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        check_status(url, response.status())?;

        let bytes = response.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| TransportError::MalformedResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Default for DefaultYoutubeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl YoutubeClient for DefaultYoutubeClient {
    async fn get(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<String, TransportError> {
        self.send(url, headers).await
    }

    async fn get_api(
        &self,
        endpoint: ApiEndpoint,
        params: &HashMap<String, String>,
    ) -> Result<String, TransportError> {
        let url = endpoint_url(endpoint, params)?;
        self.send(url.as_str(), &HashMap::new()).await
    }
}

/// Build the request URL for a Data API call
pub fn endpoint_url(
    endpoint: ApiEndpoint,
    params: &HashMap<String, String>,
) -> Result<Url, TransportError> {
    // Sorted so the same call always produces the same URL
    let mut pairs: Vec<(&String, &String)> = params.iter().collect();
    pairs.sort();

    Url::parse_with_params(&endpoint.url(), pairs).map_err(|e| TransportError::MalformedResponse {
        url: endpoint.url(),
        reason: format!("invalid query parameters: {}", e),
    })
}

fn check_status(url: &str, status: StatusCode) -> Result<(), TransportError> {
    if status.is_success() {
        return Ok(());
    }

    let url = url.to_string();
    match status {
        StatusCode::NOT_FOUND => Err(TransportError::NotFound { url }),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => Err(TransportError::Forbidden {
            url,
            status: status.as_u16(),
        }),
        _ => Err(TransportError::Status {
            url,
            status: status.as_u16(),
        }),
    }
}
