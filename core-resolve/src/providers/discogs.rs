//! Discogs API Client
//!
//! The credentialed, richest album catalog; first in the fallback chain.
//!
//! ## API Endpoints
//!
//! - **Search**: `https://api.discogs.com/database/search?barcode={code}&type=release`
//! - Title search uses `artist` + `release_title` params on the same endpoint.
//!
//! ## Authentication
//!
//! Every request carries `Authorization: Discogs key={key}, secret={secret}`.
//! With either half of the pair absent the client reports `NotConfigured`
//! without touching the network, and the chain moves on.
//!
//! ## User Agent Requirement
//!
//! Discogs requires all API clients to identify themselves with a proper
//! User-Agent header.

use crate::error::{ResolveError, Result};
use crate::model::{AlbumMetadata, MediaMetadata, ProviderId};
use crate::providers::{merge_genre_lists, split_artist_album, year_from_date, MetadataProvider};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Discogs API base URL
const DISCOGS_API_BASE: &str = "https://api.discogs.com";

/// Timeout for API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Discogs API client
pub struct DiscogsClient {
    http_client: Arc<dyn HttpClient>,
    credentials: Option<Credentials>,
    user_agent: String,
}

#[derive(Clone)]
struct Credentials {
    key: String,
    secret: String,
}

/// Discogs search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// One Discogs search result record
#[derive(Debug, Clone, Deserialize)]
struct SearchResult {
    title: String,
    #[serde(default)]
    year: Option<YearField>,
    #[serde(default)]
    label: Vec<String>,
    #[serde(default)]
    genre: Vec<String>,
    #[serde(default)]
    style: Vec<String>,
    #[serde(default)]
    cover_image: Option<String>,
}

/// Discogs serves `year` as an integer on some records and a date-like
/// string on others.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum YearField {
    Numeric(u16),
    Text(String),
}

impl YearField {
    fn as_year(&self) -> Option<u16> {
        match self {
            YearField::Numeric(year) => Some(*year),
            YearField::Text(text) => year_from_date(text),
        }
    }
}

impl DiscogsClient {
    /// Creates a new Discogs client. Credentials are only considered present
    /// when both the key and the secret are supplied.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        key: Option<String>,
        secret: Option<String>,
        user_agent: String,
    ) -> Self {
        let credentials = match (key, secret) {
            (Some(key), Some(secret)) => Some(Credentials { key, secret }),
            _ => None,
        };
        Self {
            http_client,
            credentials,
            user_agent,
        }
    }

    async fn search(&self, query_params: String, cancel: &CancellationToken) -> Result<MediaMetadata> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ResolveError::NotConfigured {
                provider: ProviderId::Discogs,
            })?;

        let url = format!("{}/database/search?{}&type=release", DISCOGS_API_BASE, query_params);
        debug!(url = %url, "Searching Discogs");

        let request = HttpRequest::new(HttpMethod::Get, url)
            .header(
                "Authorization",
                format!(
                    "Discogs key={}, secret={}",
                    credentials.key, credentials.secret
                ),
            )
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
            result = self.http_client.execute(request) => result,
        }
        .map_err(|e| ResolveError::Transient {
            provider: ProviderId::Discogs,
            reason: format!("request failed: {}", e),
        })?;

        if !response.is_success() {
            return Err(ResolveError::Transient {
                provider: ProviderId::Discogs,
                reason: format!("HTTP {}", response.status),
            });
        }

        let search: SearchResponse = response.json().map_err(|e| ResolveError::Transient {
            provider: ProviderId::Discogs,
            reason: format!("unparsable body: {}", e),
        })?;

        let first = search.results.first().ok_or(ResolveError::NoResults {
            provider: ProviderId::Discogs,
        })?;

        info!(title = %first.title, "Discogs match");
        Ok(MediaMetadata::Album(Self::map_result(first)))
    }

    fn map_result(result: &SearchResult) -> AlbumMetadata {
        let (artist, album) = split_artist_album(&result.title);

        AlbumMetadata {
            artist,
            album: Some(album),
            year: result.year.as_ref().and_then(YearField::as_year),
            label: result.label.first().cloned(),
            genres: merge_genre_lists(&result.genre, &result.style),
            cover_url: result.cover_image.clone().filter(|url| !url.is_empty()),
            source: ProviderId::Discogs,
        }
    }
}

#[async_trait]
impl MetadataProvider for DiscogsClient {
    fn id(&self) -> ProviderId {
        ProviderId::Discogs
    }

    async fn lookup_barcode(
        &self,
        barcode: &str,
        cancel: &CancellationToken,
    ) -> Result<MediaMetadata> {
        let params = format!("barcode={}", urlencoding::encode(barcode));
        self.search(params, cancel).await
    }

    async fn lookup_album_title(
        &self,
        artist: &str,
        album: &str,
        cancel: &CancellationToken,
    ) -> Result<MediaMetadata> {
        let params = format!(
            "artist={}&release_title={}",
            urlencoding::encode(artist),
            urlencoding::encode(album)
        );
        self.search(params, cancel).await
    }
}
