//! Normalized metadata shapes shared by every provider.
//!
//! Each provider decodes its own upstream JSON into private serde structs,
//! then maps the first record into these types. Everything here is created
//! fresh per resolution request and discarded when the orchestrator returns.

use serde::Serialize;
use std::fmt;

/// Identifies one upstream catalog service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProviderId {
    Discogs,
    Itunes,
    MusicBrainz,
    Omdb,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Discogs => "Discogs",
            ProviderId::Itunes => "iTunes",
            ProviderId::MusicBrainz => "MusicBrainz",
            ProviderId::Omdb => "OMDb",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized album metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumMetadata {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<u16>,
    pub label: Option<String>,
    /// Deduplicated, insertion-ordered.
    pub genres: Vec<String>,
    pub cover_url: Option<String>,
    pub source: ProviderId,
}

/// Normalized movie metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieMetadata {
    pub title: String,
    pub year: Option<u16>,
    pub director: Option<String>,
    pub genre: Option<String>,
    pub plot: Option<String>,
    pub poster_url: Option<String>,
    pub source: ProviderId,
}

/// The one shape every provider response is mapped into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MediaMetadata {
    Album(AlbumMetadata),
    Movie(MovieMetadata),
}

impl MediaMetadata {
    /// Provider the record came from.
    pub fn source(&self) -> ProviderId {
        match self {
            MediaMetadata::Album(album) => album.source,
            MediaMetadata::Movie(movie) => movie.source,
        }
    }
}

/// One resolution request, as handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderQuery {
    AlbumBarcode { barcode: String },
    AlbumTitle { artist: String, album: String },
    MovieBarcode { barcode: String },
    MovieTitle(MovieTitleQuery),
}

/// Movie lookup by title, with optional director and year hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieTitleQuery {
    pub title: String,
    pub director: Option<String>,
    pub year: Option<u16>,
}

/// One catalog entry representing a specific pressing/edition, used only
/// while probing for cover art and discarded after use.
#[derive(Debug, Clone)]
pub struct ReleaseCandidate {
    pub id: String,
    pub title: String,
    pub date: Option<String>,
    pub artist_credits: Vec<String>,
    pub labels: Vec<String>,
}
