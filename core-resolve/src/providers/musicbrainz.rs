//! MusicBrainz API Client
//!
//! The comprehensive last-resort album catalog. Barcode coverage is the
//! weakest of the chain, but when it hits, the release ids open the door to
//! the Cover Art Archive.
//!
//! ## API Endpoints
//!
//! - **Release search**: `https://musicbrainz.org/ws/2/release/?query=barcode:{code}&fmt=json`
//! - Cover art resolution happens against the Cover Art Archive via
//!   [`CoverArtResolver`].
//!
//! ## Rate Limiting
//!
//! MusicBrainz allows anonymous clients 1 request/second; every call here
//! (and every archive probe) goes through the shared [`RateGovernor`]
//! bucket.
//!
//! ## User Agent Requirement
//!
//! MusicBrainz requires all API clients to identify themselves with a proper
//! User-Agent header. Format: "ApplicationName/Version (Contact)".

use crate::coverart::CoverArtResolver;
use crate::error::{ResolveError, Result};
use crate::model::{AlbumMetadata, MediaMetadata, ProviderId, ReleaseCandidate};
use crate::providers::{year_from_date, MetadataProvider};
use crate::ratelimit::RateGovernor;
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// MusicBrainz API base URL
const MUSICBRAINZ_API_BASE: &str = "https://musicbrainz.org/ws/2";

/// Timeout for API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// MusicBrainz API client
pub struct MusicBrainzClient {
    http_client: Arc<dyn HttpClient>,
    governor: Arc<RateGovernor>,
    cover_art: CoverArtResolver,
    user_agent: String,
}

/// MusicBrainz release search response
#[derive(Debug, Deserialize)]
struct ReleaseSearchResponse {
    #[serde(default)]
    releases: Vec<Release>,
}

/// One release record from the search response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Release {
    id: String,
    title: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    artist_credit: Vec<ArtistCredit>,
    #[serde(default)]
    label_info: Vec<LabelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
struct ArtistCredit {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LabelInfo {
    #[serde(default)]
    label: Option<Label>,
}

#[derive(Debug, Clone, Deserialize)]
struct Label {
    name: String,
}

impl Release {
    fn into_candidate(self) -> ReleaseCandidate {
        ReleaseCandidate {
            id: self.id,
            title: self.title,
            date: self.date,
            artist_credits: self.artist_credit.into_iter().map(|c| c.name).collect(),
            labels: self
                .label_info
                .into_iter()
                .filter_map(|info| info.label.map(|l| l.name))
                .collect(),
        }
    }
}

impl MusicBrainzClient {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        governor: Arc<RateGovernor>,
        user_agent: String,
    ) -> Self {
        let cover_art = CoverArtResolver::new(
            Arc::clone(&http_client),
            Arc::clone(&governor),
            user_agent.clone(),
        );
        Self {
            http_client,
            governor,
            cover_art,
            user_agent,
        }
    }

    async fn search_releases(
        &self,
        barcode: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ReleaseCandidate>> {
        self.governor.wait(ProviderId::MusicBrainz, cancel).await?;

        let query = format!("barcode:{}", barcode);
        let url = format!(
            "{}/release/?query={}&fmt=json",
            MUSICBRAINZ_API_BASE,
            urlencoding::encode(&query)
        );
        debug!(url = %url, "Searching MusicBrainz");

        let request = HttpRequest::new(HttpMethod::Get, url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
            result = self.http_client.execute(request) => result,
        }
        .map_err(|e| ResolveError::Transient {
            provider: ProviderId::MusicBrainz,
            reason: format!("request failed: {}", e),
        })?;

        if response.status == 503 {
            // Maintenance window or throttling; treat as a miss for this probe.
            warn!("MusicBrainz service unavailable (503)");
            return Err(ResolveError::NoResults {
                provider: ProviderId::MusicBrainz,
            });
        }

        if !response.is_success() {
            return Err(ResolveError::Transient {
                provider: ProviderId::MusicBrainz,
                reason: format!("HTTP {}", response.status),
            });
        }

        let search: ReleaseSearchResponse =
            response.json().map_err(|e| ResolveError::Transient {
                provider: ProviderId::MusicBrainz,
                reason: format!("unparsable body: {}", e),
            })?;

        if search.releases.is_empty() {
            return Err(ResolveError::NoResults {
                provider: ProviderId::MusicBrainz,
            });
        }

        Ok(search
            .releases
            .into_iter()
            .map(Release::into_candidate)
            .collect())
    }

    fn map_candidate(candidate: &ReleaseCandidate, cover_url: Option<String>) -> AlbumMetadata {
        AlbumMetadata {
            artist: candidate.artist_credits.first().cloned(),
            album: Some(candidate.title.clone()),
            year: candidate.date.as_deref().and_then(year_from_date),
            label: candidate.labels.first().cloned(),
            // Release search results carry no genre data.
            genres: Vec::new(),
            cover_url,
            source: ProviderId::MusicBrainz,
        }
    }
}

#[async_trait]
impl MetadataProvider for MusicBrainzClient {
    fn id(&self) -> ProviderId {
        ProviderId::MusicBrainz
    }

    async fn lookup_barcode(
        &self,
        barcode: &str,
        cancel: &CancellationToken,
    ) -> Result<MediaMetadata> {
        let candidates = self.search_releases(barcode, cancel).await?;

        info!(
            releases = candidates.len(),
            title = %candidates[0].title,
            "MusicBrainz match"
        );

        // Probe every returned pressing for art, in result order.
        let release_ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
        let cover_url = self.cover_art.resolve(&release_ids, cancel).await?;

        Ok(MediaMetadata::Album(Self::map_candidate(
            &candidates[0],
            cover_url,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> ReleaseCandidate {
        ReleaseCandidate {
            id: "a2544ff8".to_string(),
            title: "The Dark Side of the Moon".to_string(),
            date: Some("1973-03-24".to_string()),
            artist_credits: vec!["Pink Floyd".to_string()],
            labels: vec!["Harvest".to_string()],
        }
    }

    #[test]
    fn test_map_candidate() {
        let album = MusicBrainzClient::map_candidate(
            &candidate(),
            Some("https://archive.example/front.jpg".to_string()),
        );

        assert_eq!(album.artist.as_deref(), Some("Pink Floyd"));
        assert_eq!(album.album.as_deref(), Some("The Dark Side of the Moon"));
        assert_eq!(album.year, Some(1973));
        assert_eq!(album.label.as_deref(), Some("Harvest"));
        assert!(album.genres.is_empty());
        assert_eq!(
            album.cover_url.as_deref(),
            Some("https://archive.example/front.jpg")
        );
        assert_eq!(album.source, ProviderId::MusicBrainz);
    }

    #[test]
    fn test_release_decoding_kebab_case() {
        let body = r#"{
            "releases": [{
                "id": "rel-1",
                "title": "Some Album",
                "date": "1994-10-04",
                "artist-credit": [{"name": "Some Artist"}],
                "label-info": [{"label": {"name": "Some Label"}}]
            }]
        }"#;

        let decoded: ReleaseSearchResponse = serde_json::from_str(body).unwrap();
        let candidate = decoded.releases.into_iter().next().unwrap().into_candidate();

        assert_eq!(candidate.id, "rel-1");
        assert_eq!(candidate.artist_credits, vec!["Some Artist"]);
        assert_eq!(candidate.labels, vec!["Some Label"]);
    }

    #[test]
    fn test_release_decoding_tolerates_missing_fields() {
        let body = r#"{"releases": [{"id": "rel-2", "title": "Bare"}]}"#;
        let decoded: ReleaseSearchResponse = serde_json::from_str(body).unwrap();
        let candidate = decoded.releases.into_iter().next().unwrap().into_candidate();

        assert!(candidate.date.is_none());
        assert!(candidate.artist_credits.is_empty());
        assert!(candidate.labels.is_empty());
    }
}
