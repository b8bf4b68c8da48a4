use serde::Deserialize;
use std::collections::{HashMap, HashSet};

use crate::client::{ApiEndpoint, YoutubeClient};
use crate::{Result, TranscriptError};

const MAX_RESULTS: &str = "50";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    channel_id: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

/// Resolves playlists and channels to video ids through the Data API v3
pub struct DataApi<'a> {
    client: &'a dyn YoutubeClient,
    api_key: &'a str,
}

impl<'a> DataApi<'a> {
    pub fn new(client: &'a dyn YoutubeClient, api_key: &'a str) -> Self {
        Self { client, api_key }
    }

    /// Every video id of a playlist, first occurrence order
    pub async fn playlist_video_ids(&self, playlist_id: &str) -> Result<Vec<String>> {
        let mut params = self.params(&[
            ("part", "snippet"),
            ("maxResults", MAX_RESULTS),
            ("playlistId", playlist_id),
        ]);

        let mut seen_ids = HashSet::new();
        let mut seen_tokens = HashSet::new();
        let mut video_ids = Vec::new();

        loop {
            let page: PlaylistItemsResponse = self
                .call(ApiEndpoint::PlaylistItems, &params, || {
                    format!("playlist JSON for the playlist: {}", playlist_id)
                })
                .await?;

            for id in page.items.into_iter().filter_map(|item| item.snippet.resource_id.video_id) {
                if seen_ids.insert(id.clone()) {
                    video_ids.push(id);
                }
            }

            match page.next_page_token {
                Some(token) if seen_tokens.insert(token.clone()) => {
                    params.insert("pageToken".to_string(), token);
                }
                _ => break,
            }
        }

        tracing::info!("Playlist {} contains {} videos", playlist_id, video_ids.len());
        Ok(video_ids)
    }

    /// Video ids of a channel's uploads playlist.
    ///
    /// `channel` is a channel id (`UC...`) or a channel name to search for.
    pub async fn channel_video_ids(&self, channel: &str) -> Result<Vec<String>> {
        let channel_id = if is_channel_id(channel) {
            channel.to_string()
        } else {
            self.search_channel_id(channel).await?
        };

        let uploads = self.uploads_playlist_id(&channel_id).await?;
        tracing::debug!("Channel {} uploads playlist: {}", channel_id, uploads);
        self.playlist_video_ids(&uploads).await
    }

    async fn search_channel_id(&self, name: &str) -> Result<String> {
        let params = self.params(&[("part", "snippet"), ("type", "channel"), ("q", name)]);
        let response: SearchResponse = self
            .call(ApiEndpoint::Search, &params, || format!("search JSON for the channel: {}", name))
            .await?;

        let mut first = None;
        for snippet in response.items.into_iter().map(|item| item.snippet) {
            if snippet.title == name {
                return Ok(snippet.channel_id);
            }
            first.get_or_insert(snippet);
        }

        first
            .map(|snippet| snippet.channel_id)
            .ok_or_else(|| TranscriptError::ChannelNotFound(name.to_string()))
    }

    async fn uploads_playlist_id(&self, channel_id: &str) -> Result<String> {
        let params = self.params(&[("part", "contentDetails"), ("id", channel_id)]);
        let response: ChannelsResponse = self
            .call(ApiEndpoint::Channels, &params, || {
                format!("channel JSON for the channel with id: {}", channel_id)
            })
            .await?;

        response
            .items
            .into_iter()
            .next()
            .map(|item| item.content_details.related_playlists.uploads)
            .ok_or_else(|| TranscriptError::ChannelNotFound(channel_id.to_string()))
    }

    fn params(&self, pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.insert("key".to_string(), self.api_key.to_string());
        params
    }

    async fn call<T, D>(
        &self,
        endpoint: ApiEndpoint,
        params: &HashMap<String, String>,
        describe: D,
    ) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        D: FnOnce() -> String,
    {
        let body = self
            .client
            .get_api(endpoint, params)
            .await
            .map_err(|source| TranscriptError::Transport {
                video_id: None,
                source,
            })?;

        serde_json::from_str(&body)
            .map_err(|e| TranscriptError::Api(format!("Could not parse {}. {}", describe(), e)))
    }
}

/// `UC` followed by the 22 characters of a channel id
pub fn is_channel_id(input: &str) -> bool {
    input.len() == 24
        && input.starts_with("UC")
        && input[2..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
