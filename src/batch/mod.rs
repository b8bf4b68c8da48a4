use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

pub mod resolver;

use crate::{Result, TranscriptError};

/// Options shared by every video of a playlist or channel call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRequest {
    api_key: Option<String>,
    cookies_path: Option<PathBuf>,
    stop_on_error: bool,
}

impl TranscriptRequest {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Fetch every page as the account stored in this Netscape cookie file
    pub fn with_cookies(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookies_path = Some(path.into());
        self
    }

    /// `false` collects a result for every video instead of failing fast
    pub fn stop_on_error(mut self, stop_on_error: bool) -> Self {
        self.stop_on_error = stop_on_error;
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn cookies_path(&self) -> Option<&Path> {
        self.cookies_path.as_deref()
    }

    pub fn is_stop_on_error(&self) -> bool {
        self.stop_on_error
    }

    pub(crate) fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(TranscriptError::InvalidRequest(
                "a YouTube Data API key is required for playlist and channel retrieval".to_string(),
            )),
        }
    }
}

impl Default for TranscriptRequest {
    fn default() -> Self {
        Self {
            api_key: None,
            cookies_path: None,
            stop_on_error: true,
        }
    }
}

/// Per-video results of a batch run, in resolved order
#[derive(Debug)]
pub struct BatchOutcome<T> {
    entries: Vec<(String, Result<T>)>,
}

impl<T> BatchOutcome<T> {
    pub fn from_entries(entries: Vec<(String, Result<T>)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, video_id: &str) -> Option<&Result<T>> {
        self.entries
            .iter()
            .find(|(id, _)| id == video_id)
            .map(|(_, result)| result)
    }

    pub fn successes(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries
            .iter()
            .filter_map(|(id, result)| result.as_ref().ok().map(|value| (id.as_str(), value)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &TranscriptError)> {
        self.entries
            .iter()
            .filter_map(|(id, result)| result.as_ref().err().map(|err| (id.as_str(), err)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Result<T>)> {
        self.entries.iter().map(|(id, result)| (id.as_str(), result))
    }

    pub fn video_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// Split into successes and failures, both keyed by video id
    pub fn into_maps(self) -> (HashMap<String, T>, HashMap<String, TranscriptError>) {
        let mut ok = HashMap::new();
        let mut failed = HashMap::new();
        for (id, result) in self.entries {
            match result {
                Ok(value) => {
                    ok.insert(id, value);
                }
                Err(err) => {
                    failed.insert(id, err);
                }
            }
        }
        (ok, failed)
    }
}

impl<T> IntoIterator for BatchOutcome<T> {
    type Item = (String, Result<T>);
    type IntoIter = std::vec::IntoIter<(String, Result<T>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Run `job` for every id with at most `concurrency` in flight.
///
/// With `stop_on_error` the first failure cancels the remaining jobs and is
/// returned. Otherwise every id gets an entry, in input order.
pub(crate) async fn run<T, F, Fut>(
    video_ids: Vec<String>,
    stop_on_error: bool,
    concurrency: usize,
    job: F,
) -> Result<BatchOutcome<T>>
where
    F: Fn(String, CancellationToken) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let token = CancellationToken::new();
    let total = video_ids.len();

    let mut results = stream::iter(video_ids.clone())
        .map(|video_id| {
            let token = token.clone();
            let fut = job(video_id.clone(), token.clone());
            async move {
                let result = if token.is_cancelled() {
                    Err(TranscriptError::Cancelled {
                        video_id: video_id.clone(),
                    })
                } else {
                    cancellable(&token, &video_id, fut).await
                };
                (video_id, result)
            }
        })
        .buffer_unordered(concurrency.max(1));

    let mut by_id: HashMap<String, Result<T>> = HashMap::with_capacity(total);
    while let Some((video_id, result)) = results.next().await {
        match result {
            Err(err) if stop_on_error => {
                if !matches!(err, TranscriptError::Cancelled { .. }) {
                    tracing::debug!("Stopping batch after failure for video {}", video_id);
                    token.cancel();
                    return Err(err);
                }
            }
            Err(err) => {
                tracing::warn!("{}", err);
                by_id.insert(video_id, Err(err));
            }
            Ok(value) => {
                by_id.insert(video_id, Ok(value));
            }
        }
    }

    let entries = video_ids
        .into_iter()
        .filter_map(|id| by_id.remove(&id).map(|result| (id, result)))
        .collect();

    Ok(BatchOutcome::from_entries(entries))
}

/// Race `fut` against cancellation of `token`
pub(crate) async fn cancellable<T>(
    token: &CancellationToken,
    video_id: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(TranscriptError::Cancelled {
            video_id: video_id.to_string(),
        }),
        result = fut => result,
    }
}
