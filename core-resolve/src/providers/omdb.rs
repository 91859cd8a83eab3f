//! OMDb API Client
//!
//! The movie catalog. Lookup is by title (with optional year hint); there is
//! no barcode endpoint, so the barcode operation keeps its explicit
//! `NotImplemented` gap.
//!
//! ## API Endpoints
//!
//! - **Lookup**: `https://www.omdbapi.com/?apikey={key}&t={title}&y={year}`
//!
//! The body carries its own `Response: "True"|"False"` success flag, and
//! absent fields arrive as the literal string `"N/A"`.

use crate::error::{ResolveError, Result};
use crate::model::{MediaMetadata, MovieMetadata, MovieTitleQuery, ProviderId};
use crate::providers::{year_from_date, MetadataProvider};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// OMDb API base URL
const OMDB_API_BASE: &str = "https://www.omdbapi.com/";

/// Timeout for API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// OMDb API client
pub struct OmdbClient {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    user_agent: String,
}

/// OMDb lookup response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbResponse {
    response: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    director: Option<String>,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    plot: Option<String>,
    #[serde(default)]
    poster: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OMDb writes absent fields as the literal "N/A".
fn scrub_na(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty() && value != "N/A")
}

impl OmdbClient {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        api_key: Option<String>,
        user_agent: String,
    ) -> Self {
        Self {
            http_client,
            api_key,
            user_agent,
        }
    }

    fn map_response(response: OmdbResponse) -> MovieMetadata {
        MovieMetadata {
            title: response.title.unwrap_or_default(),
            year: response
                .year
                .as_deref()
                .and_then(year_from_date),
            director: scrub_na(response.director),
            genre: scrub_na(response.genre),
            plot: scrub_na(response.plot),
            poster_url: scrub_na(response.poster),
            source: ProviderId::Omdb,
        }
    }
}

#[async_trait]
impl MetadataProvider for OmdbClient {
    fn id(&self) -> ProviderId {
        ProviderId::Omdb
    }

    /// OMDb has no barcode index; this gap is deliberate and caller-visible.
    async fn lookup_barcode(
        &self,
        _barcode: &str,
        _cancel: &CancellationToken,
    ) -> Result<MediaMetadata> {
        Err(ResolveError::NotImplemented)
    }

    async fn lookup_movie_title(
        &self,
        query: &MovieTitleQuery,
        cancel: &CancellationToken,
    ) -> Result<MediaMetadata> {
        let api_key = self.api_key.as_ref().ok_or(ResolveError::NotConfigured {
            provider: ProviderId::Omdb,
        })?;

        let mut url = format!(
            "{}?apikey={}&t={}",
            OMDB_API_BASE,
            urlencoding::encode(api_key),
            urlencoding::encode(&query.title)
        );
        if let Some(year) = query.year {
            url.push_str(&format!("&y={}", year));
        }
        debug!(title = %query.title, "Querying OMDb");

        let request = HttpRequest::new(HttpMethod::Get, url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
            result = self.http_client.execute(request) => result,
        }
        .map_err(|e| ResolveError::Transient {
            provider: ProviderId::Omdb,
            reason: format!("request failed: {}", e),
        })?;

        if !response.is_success() {
            return Err(ResolveError::Transient {
                provider: ProviderId::Omdb,
                reason: format!("HTTP {}", response.status),
            });
        }

        let body: OmdbResponse = response.json().map_err(|e| ResolveError::Transient {
            provider: ProviderId::Omdb,
            reason: format!("unparsable body: {}", e),
        })?;

        if body.response != "True" {
            debug!(
                title = %query.title,
                reason = body.error.as_deref().unwrap_or("no match"),
                "OMDb returned no result"
            );
            return Err(ResolveError::NoResults {
                provider: ProviderId::Omdb,
            });
        }

        let movie = Self::map_response(body);

        // Lenient by design upstream: a director mismatch is logged but the
        // provider's answer is still returned.
        if let (Some(expected), Some(actual)) = (query.director.as_deref(), movie.director.as_deref()) {
            if !actual.eq_ignore_ascii_case(expected) {
                warn!(
                    expected = %expected,
                    actual = %actual,
                    title = %movie.title,
                    "Director mismatch on OMDb result"
                );
            }
        }

        info!(title = %movie.title, "OMDb match");
        Ok(MediaMetadata::Movie(movie))
    }
}
