//! # Resolution Orchestrator
//!
//! Drives ordered fallback across the catalog providers and both barcode
//! forms, short-circuiting on the first success.
//!
//! ## Overview
//!
//! For album barcodes the chain is fixed by reliability: Discogs (richest,
//! credentialed) → iTunes (no auth) → MusicBrainz (comprehensive, weak
//! barcode support). Within one provider the original scanned text is tried
//! first, then the cleaned digit form when it differs. The orchestrator
//! never scores or merges results across providers; the first hit wins and
//! terminates the search.
//!
//! On total exhaustion the most recent concrete error is surfaced, so
//! callers can tell "not configured" from "network failure" from "no
//! results".
//!
//! ## Usage
//!
//! ```ignore
//! use core_resolve::{ProviderQuery, Resolver, ResolverConfig};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let resolver = Resolver::from_config(&ResolverConfig::from_env(), http_client);
//!
//! let cancel = CancellationToken::new();
//! let query = ProviderQuery::AlbumBarcode { barcode: "0724352910526".to_string() };
//! let metadata = resolver.resolve(query, &cancel).await?;
//! ```

use crate::barcode::BarcodeCandidate;
use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use crate::model::{MediaMetadata, ProviderId, ProviderQuery};
use crate::providers::{
    DiscogsClient, ItunesClient, MetadataProvider, MusicBrainzClient, OmdbClient,
};
use crate::ratelimit::RateGovernor;
use bridge_traits::http::HttpClient;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Walks the provider chain for one request at a time.
///
/// The only state shared across requests is the rate governor inside the
/// providers; everything else is created per resolution and dropped when it
/// returns.
pub struct Resolver {
    album_chain: Vec<Arc<dyn MetadataProvider>>,
    movie_provider: Arc<dyn MetadataProvider>,
}

impl Resolver {
    /// Wires the standard chain from configuration: Discogs → iTunes →
    /// MusicBrainz for albums, OMDb for movies, with the MusicBrainz rate
    /// contract (1 request/second) registered on a shared governor.
    pub fn from_config(config: &ResolverConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let governor = Arc::new(RateGovernor::new().with_bucket(
            ProviderId::MusicBrainz,
            1,
            Duration::from_secs(1),
        ));

        let discogs = Arc::new(DiscogsClient::new(
            Arc::clone(&http_client),
            config.discogs_key.clone(),
            config.discogs_secret.clone(),
            config.user_agent.clone(),
        ));
        let itunes = Arc::new(ItunesClient::new(
            Arc::clone(&http_client),
            config.user_agent.clone(),
        ));
        let musicbrainz = Arc::new(MusicBrainzClient::new(
            Arc::clone(&http_client),
            Arc::clone(&governor),
            config.user_agent.clone(),
        ));
        let omdb = Arc::new(OmdbClient::new(
            http_client,
            config.omdb_api_key.clone(),
            config.user_agent.clone(),
        ));

        Self {
            album_chain: vec![discogs, itunes, musicbrainz],
            movie_provider: omdb,
        }
    }

    /// Custom wiring; the album chain is walked in the order given.
    pub fn with_chain(
        album_chain: Vec<Arc<dyn MetadataProvider>>,
        movie_provider: Arc<dyn MetadataProvider>,
    ) -> Self {
        Self {
            album_chain,
            movie_provider,
        }
    }

    /// Resolves one query into one normalized record, or the typed failure
    /// left standing after the whole chain was exhausted.
    #[instrument(skip(self, cancel))]
    pub async fn resolve(
        &self,
        query: ProviderQuery,
        cancel: &CancellationToken,
    ) -> Result<MediaMetadata> {
        match query {
            ProviderQuery::AlbumBarcode { barcode } => {
                self.resolve_album_barcode(&barcode, cancel).await
            }
            ProviderQuery::AlbumTitle { artist, album } => {
                self.resolve_album_title(&artist, &album, cancel).await
            }
            // No provider path exists for movie barcodes; an explicit gap
            // rather than a degraded guess.
            ProviderQuery::MovieBarcode { .. } => Err(ResolveError::NotImplemented),
            ProviderQuery::MovieTitle(movie_query) => {
                self.movie_provider
                    .lookup_movie_title(&movie_query, cancel)
                    .await
            }
        }
    }

    async fn resolve_album_barcode(
        &self,
        raw: &str,
        cancel: &CancellationToken,
    ) -> Result<MediaMetadata> {
        let candidate = BarcodeCandidate::new(raw);
        let mut last_error: Option<ResolveError> = None;

        for provider in &self.album_chain {
            let mut forms = vec![candidate.original()];
            if candidate.is_distinct() {
                forms.push(candidate.cleaned());
            }

            for form in forms {
                if cancel.is_cancelled() {
                    return Err(ResolveError::Cancelled);
                }

                match provider.lookup_barcode(form, cancel).await {
                    Ok(found) => {
                        info!(provider = %provider.id(), "Barcode resolved");
                        return Ok(found);
                    }
                    Err(ResolveError::Cancelled) => return Err(ResolveError::Cancelled),
                    Err(error @ ResolveError::NotConfigured { .. }) => {
                        debug!(provider = %provider.id(), "Provider not configured, skipping");
                        last_error = Some(error);
                        // The cleaned form would be an identical no-op probe.
                        break;
                    }
                    Err(error) => {
                        debug!(provider = %provider.id(), form = %form, error = %error, "Lookup miss");
                        last_error = Some(error);
                    }
                }
            }
        }

        Err(last_error.unwrap_or(ResolveError::NotImplemented))
    }

    async fn resolve_album_title(
        &self,
        artist: &str,
        album: &str,
        cancel: &CancellationToken,
    ) -> Result<MediaMetadata> {
        let mut last_error: Option<ResolveError> = None;

        for provider in &self.album_chain {
            if cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }

            match provider.lookup_album_title(artist, album, cancel).await {
                Ok(found) => {
                    info!(provider = %provider.id(), "Title resolved");
                    return Ok(found);
                }
                Err(ResolveError::Cancelled) => return Err(ResolveError::Cancelled),
                // Providers without title search keep their default; not a
                // concrete outcome worth surfacing.
                Err(ResolveError::NotImplemented) => continue,
                Err(error) => {
                    debug!(provider = %provider.id(), error = %error, "Lookup miss");
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or(ResolveError::NotImplemented))
    }
}
