//! External Catalog Providers
//!
//! This module contains clients for the upstream catalog services:
//! - Discogs - credentialed, richest album catalog
//! - iTunes - no-auth album fallback
//! - MusicBrainz - comprehensive catalog, weak barcode support, rate limited
//! - OMDb - movie catalog
//!
//! Each client decodes its upstream JSON into its own typed response structs
//! at the boundary, then maps the first record into the shared normalized
//! shape. One bounded-timeout HTTP call per invocation; every failure mode
//! becomes a typed [`ResolveError`], never a panic.

pub mod discogs;
pub mod itunes;
pub mod musicbrainz;
pub mod omdb;

pub use discogs::DiscogsClient;
pub use itunes::ItunesClient;
pub use musicbrainz::MusicBrainzClient;
pub use omdb::OmdbClient;

use crate::error::{ResolveError, Result};
use crate::model::{MediaMetadata, MovieTitleQuery, ProviderId};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// One upstream catalog service.
///
/// The orchestrator holds an ordered list of these and walks it without ever
/// naming a concrete provider. Operations a given service does not offer keep
/// the `NotImplemented` default, which the orchestrator skips over.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Looks up one barcode form. Exactly one HTTP call.
    async fn lookup_barcode(
        &self,
        barcode: &str,
        cancel: &CancellationToken,
    ) -> Result<MediaMetadata>;

    /// Album lookup by artist/album pair. Only the richest catalog offers
    /// this.
    async fn lookup_album_title(
        &self,
        _artist: &str,
        _album: &str,
        _cancel: &CancellationToken,
    ) -> Result<MediaMetadata> {
        Err(ResolveError::NotImplemented)
    }

    /// Movie lookup by title, with optional director and year hints.
    async fn lookup_movie_title(
        &self,
        _query: &MovieTitleQuery,
        _cancel: &CancellationToken,
    ) -> Result<MediaMetadata> {
        Err(ResolveError::NotImplemented)
    }
}

/// Splits a combined `"Artist - Album"` title on the first `" - "`.
/// Without the separator the whole string is the album.
pub(crate) fn split_artist_album(title: &str) -> (Option<String>, String) {
    match title.split_once(" - ") {
        Some((artist, album)) => (Some(artist.trim().to_string()), album.trim().to_string()),
        None => (None, title.trim().to_string()),
    }
}

/// Merges two upstream list fields (e.g. genre + style) into one
/// order-preserving, duplicate-free list. First occurrence wins.
pub(crate) fn merge_genre_lists(primary: &[String], secondary: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(primary.len() + secondary.len());
    for genre in primary.iter().chain(secondary.iter()) {
        if !merged.iter().any(|existing| existing == genre) {
            merged.push(genre.clone());
        }
    }
    merged
}

/// Extracts a 4-digit year from the leading characters of a date-like string
/// (`"1973-03-01"`, `"1973"`, ...).
pub(crate) fn year_from_date(date: &str) -> Option<u16> {
    let head: String = date.trim().chars().take(4).collect();
    if head.len() == 4 && head.chars().all(|c| c.is_ascii_digit()) {
        head.parse().ok()
    } else {
        None
    }
}
