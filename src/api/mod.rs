use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::batch::{self, resolver::DataApi, BatchOutcome, TranscriptRequest};
use crate::catalog::{extract, page, select, TranscriptCatalog};
use crate::client::{DefaultYoutubeClient, YoutubeClient};
use crate::transcript::TranscriptContent;
use crate::utils;
use crate::{Result, TranscriptError};

/// Videos processed at once by batch calls unless configured otherwise
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Entry point for transcript retrieval
#[derive(Clone)]
pub struct TranscriptApi {
    client: Arc<dyn YoutubeClient>,
    concurrency: usize,
}

enum BatchSource<'a> {
    Playlist(&'a str),
    Channel(&'a str),
}

impl TranscriptApi {
    /// API backed by a default reqwest client
    pub fn new() -> Self {
        Self::with_client(Arc::new(DefaultYoutubeClient::new()))
    }

    pub fn with_client(client: Arc<dyn YoutubeClient>) -> Self {
        Self {
            client,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Bound on videos processed at once by batch calls (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Caption tracks available for a video
    pub async fn list_transcripts(&self, video_id: &str) -> Result<TranscriptCatalog> {
        load_catalog(self.client.clone(), video_id, None).await
    }

    /// Caption tracks available for a video, as seen by the cookie file's account
    pub async fn list_transcripts_with_cookies(
        &self,
        video_id: &str,
        cookies_path: &Path,
    ) -> Result<TranscriptCatalog> {
        load_catalog(self.client.clone(), video_id, Some(cookies_path)).await
    }

    /// Fetch the transcript in the first available language of `language_codes`
    pub async fn get_transcript(
        &self,
        video_id: &str,
        language_codes: &[&str],
    ) -> Result<TranscriptContent> {
        select::validate_codes(language_codes)?;
        let catalog = self.list_transcripts(video_id).await?;
        catalog.find_transcript(language_codes)?.fetch().await
    }

    pub async fn get_transcript_with_cookies(
        &self,
        video_id: &str,
        language_codes: &[&str],
        cookies_path: &Path,
    ) -> Result<TranscriptContent> {
        select::validate_codes(language_codes)?;
        let catalog = self.list_transcripts_with_cookies(video_id, cookies_path).await?;
        catalog.find_transcript(language_codes)?.fetch().await
    }

    /// Catalogs for every video of a playlist
    pub async fn list_transcripts_for_playlist(
        &self,
        playlist_id: &str,
        request: &TranscriptRequest,
    ) -> Result<BatchOutcome<TranscriptCatalog>> {
        self.list_batch(BatchSource::Playlist(playlist_id), request).await
    }

    /// Catalogs for every upload of a channel, given by name or id
    pub async fn list_transcripts_for_channel(
        &self,
        channel: &str,
        request: &TranscriptRequest,
    ) -> Result<BatchOutcome<TranscriptCatalog>> {
        self.list_batch(BatchSource::Channel(channel), request).await
    }

    /// Transcripts for every video of a playlist
    pub async fn get_transcripts_for_playlist(
        &self,
        playlist_id: &str,
        request: &TranscriptRequest,
        language_codes: &[&str],
    ) -> Result<BatchOutcome<TranscriptContent>> {
        self.get_batch(BatchSource::Playlist(playlist_id), request, language_codes)
            .await
    }

    /// Transcripts for every upload of a channel, given by name or id
    pub async fn get_transcripts_for_channel(
        &self,
        channel: &str,
        request: &TranscriptRequest,
        language_codes: &[&str],
    ) -> Result<BatchOutcome<TranscriptContent>> {
        self.get_batch(BatchSource::Channel(channel), request, language_codes)
            .await
    }

    async fn resolve(
        &self,
        source: BatchSource<'_>,
        request: &TranscriptRequest,
    ) -> Result<Vec<String>> {
        let api_key = request.require_api_key()?;
        let data_api = DataApi::new(self.client.as_ref(), api_key);
        match source {
            BatchSource::Playlist(id) => {
                tracing::info!("Resolving playlist: {}", id);
                data_api.playlist_video_ids(id).await
            }
            BatchSource::Channel(name) => {
                tracing::info!("Resolving channel: {}", name);
                data_api.channel_video_ids(name).await
            }
        }
    }

    async fn list_batch(
        &self,
        source: BatchSource<'_>,
        request: &TranscriptRequest,
    ) -> Result<BatchOutcome<TranscriptCatalog>> {
        let video_ids = self.resolve(source, request).await?;
        let cookies: Option<PathBuf> = request.cookies_path().map(Path::to_path_buf);
        let client = self.client.clone();

        let outcome = batch::run(
            video_ids,
            request.is_stop_on_error(),
            self.concurrency,
            |video_id, _token| {
                let client = client.clone();
                let cookies = cookies.clone();
                async move { load_catalog(client, &video_id, cookies.as_deref()).await }
            },
        )
        .await?;

        log_outcome(&outcome);
        Ok(outcome)
    }

    async fn get_batch(
        &self,
        source: BatchSource<'_>,
        request: &TranscriptRequest,
        language_codes: &[&str],
    ) -> Result<BatchOutcome<TranscriptContent>> {
        select::validate_codes(language_codes)?;
        let video_ids = self.resolve(source, request).await?;
        let codes: Vec<String> = language_codes.iter().map(|c| c.to_string()).collect();
        let cookies: Option<PathBuf> = request.cookies_path().map(Path::to_path_buf);
        let client = self.client.clone();

        let outcome = batch::run(
            video_ids,
            request.is_stop_on_error(),
            self.concurrency,
            |video_id, token| {
                let client = client.clone();
                let cookies = cookies.clone();
                let codes = codes.clone();
                async move {
                    let load = load_catalog(client, &video_id, cookies.as_deref());
                    let catalog = batch::cancellable(&token, &video_id, load).await?;
                    let codes: Vec<&str> = codes.iter().map(String::as_str).collect();
                    let transcript = catalog.find_transcript(&codes)?;
                    batch::cancellable(&token, &video_id, transcript.fetch()).await
                }
            },
        )
        .await?;

        log_outcome(&outcome);
        Ok(outcome)
    }
}

impl Default for TranscriptApi {
    fn default() -> Self {
        Self::new()
    }
}

async fn load_catalog(
    client: Arc<dyn YoutubeClient>,
    video_id: &str,
    cookies_path: Option<&Path>,
) -> Result<TranscriptCatalog> {
    if !utils::is_valid_video_id(video_id) {
        return Err(TranscriptError::InvalidVideoId(video_id.to_string()));
    }

    let html = match cookies_path {
        Some(path) => page::fetch_video_page_with_cookies(client.as_ref(), video_id, path).await?,
        None => page::fetch_video_page(client.as_ref(), video_id).await?,
    };

    extract::extract_catalog(client, video_id, &html, cookies_path.is_some())
}

fn log_outcome<T>(outcome: &BatchOutcome<T>) {
    tracing::info!(
        "Retrieved {} of {} videos ({} failed)",
        outcome.successes().count(),
        outcome.len(),
        outcome.failures().count()
    );
}
