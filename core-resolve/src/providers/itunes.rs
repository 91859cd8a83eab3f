//! iTunes Search API Client
//!
//! The no-auth album fallback; second in the chain.
//!
//! ## API Endpoints
//!
//! - **Search**: `https://itunes.apple.com/search?term={barcode}&entity=album`
//!
//! No authentication. The service indexes barcodes as plain search terms,
//! which is why the chain retries it with the cleaned digit form when the
//! scanned text differs.

use crate::error::{ResolveError, Result};
use crate::model::{AlbumMetadata, MediaMetadata, ProviderId};
use crate::providers::{year_from_date, MetadataProvider};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// iTunes Search API base URL
const ITUNES_API_BASE: &str = "https://itunes.apple.com/search";

/// Timeout for API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Artwork URL size token served by the API, and the upgrade we substitute.
/// The API hands out 100x100 thumbnails; the same asset path serves larger
/// renditions by size token.
const ARTWORK_SMALL: &str = "100x100";
const ARTWORK_LARGE: &str = "600x600";

/// iTunes Search API client
pub struct ItunesClient {
    http_client: Arc<dyn HttpClient>,
    user_agent: String,
}

/// iTunes search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "resultCount", default)]
    result_count: u32,
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// One iTunes collection record
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    #[serde(default)]
    artist_name: Option<String>,
    #[serde(default)]
    collection_name: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    primary_genre_name: Option<String>,
    #[serde(default)]
    artwork_url_100: Option<String>,
}

impl ItunesClient {
    pub fn new(http_client: Arc<dyn HttpClient>, user_agent: String) -> Self {
        Self {
            http_client,
            user_agent,
        }
    }

    fn map_result(result: &SearchResult) -> AlbumMetadata {
        AlbumMetadata {
            artist: result.artist_name.clone(),
            album: result.collection_name.clone(),
            year: result
                .release_date
                .as_deref()
                .and_then(year_from_date),
            label: None,
            genres: result
                .primary_genre_name
                .clone()
                .into_iter()
                .collect(),
            cover_url: result
                .artwork_url_100
                .as_ref()
                .map(|url| url.replace(ARTWORK_SMALL, ARTWORK_LARGE)),
            source: ProviderId::Itunes,
        }
    }
}

#[async_trait]
impl MetadataProvider for ItunesClient {
    fn id(&self) -> ProviderId {
        ProviderId::Itunes
    }

    async fn lookup_barcode(
        &self,
        barcode: &str,
        cancel: &CancellationToken,
    ) -> Result<MediaMetadata> {
        let url = format!(
            "{}?term={}&entity=album",
            ITUNES_API_BASE,
            urlencoding::encode(barcode)
        );
        debug!(url = %url, "Searching iTunes");

        let request = HttpRequest::new(HttpMethod::Get, url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
            result = self.http_client.execute(request) => result,
        }
        .map_err(|e| ResolveError::Transient {
            provider: ProviderId::Itunes,
            reason: format!("request failed: {}", e),
        })?;

        if !response.is_success() {
            return Err(ResolveError::Transient {
                provider: ProviderId::Itunes,
                reason: format!("HTTP {}", response.status),
            });
        }

        let search: SearchResponse = response.json().map_err(|e| ResolveError::Transient {
            provider: ProviderId::Itunes,
            reason: format!("unparsable body: {}", e),
        })?;

        if search.result_count == 0 || search.results.is_empty() {
            return Err(ResolveError::NoResults {
                provider: ProviderId::Itunes,
            });
        }

        let first = &search.results[0];
        info!(
            artist = first.artist_name.as_deref().unwrap_or("?"),
            album = first.collection_name.as_deref().unwrap_or("?"),
            "iTunes match"
        );
        Ok(MediaMetadata::Album(Self::map_result(first)))
    }
}
