//! Cover art recovery via the Cover Art Archive.
//!
//! A barcode search on MusicBrainz often returns several pressings of the
//! same album, and only some of them have art in the archive. The resolver
//! therefore probes every release candidate, in the order the search ranked
//! them, and stops at the first one that yields any image.
//!
//! Art failure is never fatal: a resolved record with no art is a success.

use crate::error::{ResolveError, Result};
use crate::model::ProviderId;
use crate::ratelimit::RateGovernor;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Cover Art Archive base URL
const COVERART_ARCHIVE_BASE: &str = "https://coverartarchive.org";

/// Timeout for archive probes
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves a cover-art URL for a list of candidate release ids.
///
/// Probes run through the MusicBrainz rate bucket: the archive shares that
/// service's rate contract.
pub struct CoverArtResolver {
    http_client: Arc<dyn HttpClient>,
    governor: Arc<RateGovernor>,
    user_agent: String,
}

/// Cover Art Archive release metadata
#[derive(Debug, Deserialize)]
struct ReleaseImages {
    #[serde(default)]
    images: Vec<ReleaseImage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReleaseImage {
    image: String,
    #[serde(default)]
    front: bool,
}

impl CoverArtResolver {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        governor: Arc<RateGovernor>,
        user_agent: String,
    ) -> Self {
        Self {
            http_client,
            governor,
            user_agent,
        }
    }

    /// Tries each candidate release id in the order supplied and returns the
    /// first cover-art URL found, or `None` once all candidates are
    /// exhausted.
    ///
    /// Per candidate: a direct front-asset probe first (cheap, follows the
    /// archive's redirect to the asset host), then the release metadata
    /// document looking for an image flagged "front", falling back to the
    /// first image listed.
    ///
    /// # Errors
    ///
    /// Only `Cancelled`. Upstream failures demote to the next candidate.
    pub async fn resolve(
        &self,
        release_ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        for release_id in release_ids {
            if cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }

            if let Some(url) = self.probe_front_asset(release_id, cancel).await? {
                debug!(release_id = %release_id, "Front cover asset found");
                return Ok(Some(url));
            }

            if let Some(url) = self.probe_release_images(release_id, cancel).await? {
                debug!(release_id = %release_id, "Cover found via release image listing");
                return Ok(Some(url));
            }
        }

        debug!(candidates = release_ids.len(), "No cover art for any candidate");
        Ok(None)
    }

    /// HEAD `/release/{id}/front`; a success means the redirect chain landed
    /// on the actual asset, whose URL we keep.
    async fn probe_front_asset(
        &self,
        release_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        self.governor.wait(ProviderId::MusicBrainz, cancel).await?;

        let url = format!("{}/release/{}/front", COVERART_ARCHIVE_BASE, release_id);
        let request = HttpRequest::new(HttpMethod::Head, url)
            .header("User-Agent", &self.user_agent)
            .timeout(REQUEST_TIMEOUT);

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
            result = self.http_client.execute(request) => result,
        };

        match response {
            Ok(response) if response.is_success() => Ok(Some(response.final_url)),
            Ok(response) => {
                debug!(
                    release_id = %release_id,
                    status = response.status,
                    "No direct front asset"
                );
                Ok(None)
            }
            Err(e) => {
                warn!(release_id = %release_id, error = %e, "Front asset probe failed");
                Ok(None)
            }
        }
    }

    /// GET `/release/{id}` and pick the image flagged "front", else the
    /// first image listed.
    async fn probe_release_images(
        &self,
        release_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        self.governor.wait(ProviderId::MusicBrainz, cancel).await?;

        let url = format!("{}/release/{}", COVERART_ARCHIVE_BASE, release_id);
        let request = HttpRequest::new(HttpMethod::Get, url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
            result = self.http_client.execute(request) => result,
        };

        let response = match response {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                debug!(
                    release_id = %release_id,
                    status = response.status,
                    "No image listing for release"
                );
                return Ok(None);
            }
            Err(e) => {
                warn!(release_id = %release_id, error = %e, "Image listing probe failed");
                return Ok(None);
            }
        };

        let listing: ReleaseImages = match response.json() {
            Ok(listing) => listing,
            Err(e) => {
                warn!(release_id = %release_id, error = %e, "Unparsable image listing");
                return Ok(None);
            }
        };

        let chosen = listing
            .images
            .iter()
            .find(|img| img.front)
            .or_else(|| listing.images.first());

        Ok(chosen.map(|img| img.image.clone()))
    }
}

