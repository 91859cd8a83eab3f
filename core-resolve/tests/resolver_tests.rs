//! End-to-end chain tests with the standard wiring and a scripted network.
//!
//! These walk the real provider chain (Discogs → iTunes → MusicBrainz) the
//! way one resolution request would, asserting on the exact request
//! sequence the chain produces.

mod common;

use common::ScriptedHttpClient;
use core_resolve::{
    MediaMetadata, ProviderId, ProviderQuery, ResolveError, Resolver, ResolverConfig,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn scripted_resolver(
    config: &ResolverConfig,
    http: &Arc<ScriptedHttpClient>,
) -> Resolver {
    Resolver::from_config(
        config,
        Arc::clone(http) as Arc<dyn bridge_traits::http::HttpClient>,
    )
}

#[tokio::test(start_paused = true)]
async fn test_chain_walks_both_forms_and_falls_through_to_musicbrainz() {
    let http = Arc::new(ScriptedHttpClient::new());
    // Discogs is unconfigured: no traffic from it at all.
    // iTunes misses on the original scanned text, then on the cleaned form.
    http.push_json(200, r#"{"resultCount": 0, "results": []}"#);
    http.push_json(200, r#"{"resultCount": 0, "results": []}"#);
    // MusicBrainz misses on the original form...
    http.push_json(200, r#"{"releases": []}"#);
    // ...hits on the cleaned form...
    http.push_json(
        200,
        r#"{
            "releases": [{
                "id": "rel-1",
                "title": "The Dark Side of the Moon",
                "date": "1973-03-24",
                "artist-credit": [{"name": "Pink Floyd"}]
            }]
        }"#,
    );
    // ...and the archive serves the front asset.
    http.push_redirected(200, "https://archive.example/rel-1/front.jpg");

    let config = ResolverConfig::default();
    let resolver = scripted_resolver(&config, &http);

    let result = resolver
        .resolve(
            ProviderQuery::AlbumBarcode {
                barcode: "0724352910526".to_string(),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let album = match result {
        MediaMetadata::Album(album) => album,
        MediaMetadata::Movie(_) => panic!("expected an album"),
    };
    assert_eq!(album.source, ProviderId::MusicBrainz);
    assert_eq!(
        album.cover_url.as_deref(),
        Some("https://archive.example/rel-1/front.jpg")
    );

    let requests = http.requests();
    assert_eq!(requests.len(), 5);
    assert!(requests[0].url.contains("itunes") && requests[0].url.contains("term=0724352910526"));
    assert!(requests[1].url.contains("itunes") && requests[1].url.contains("term=724352910526"));
    assert!(requests[2].url.contains("musicbrainz") && requests[2].url.contains("0724352910526"));
    assert!(requests[3].url.contains("musicbrainz") && !requests[3].url.contains("0724"));
    assert!(requests[4].url.contains("coverartarchive"));
}

#[tokio::test(start_paused = true)]
async fn test_first_hit_stops_the_chain() {
    let http = Arc::new(ScriptedHttpClient::new());
    http.push_json(
        200,
        r#"{"results": [{"title": "Pink Floyd - Animals", "year": 1977}]}"#,
    );

    let config = ResolverConfig::default().with_discogs_credentials("key", "secret");
    let resolver = scripted_resolver(&config, &http);

    let result = resolver
        .resolve(
            ProviderQuery::AlbumBarcode {
                barcode: "724352910526".to_string(),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.source(), ProviderId::Discogs);
    // One request total: nothing after the hit.
    assert_eq!(http.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_surfaces_last_concrete_error() {
    let http = Arc::new(ScriptedHttpClient::new());
    // Barcode is already clean, so each provider is probed once.
    http.push_json(200, r#"{"resultCount": 0, "results": []}"#);
    http.push_status(500);

    let config = ResolverConfig::default();
    let resolver = scripted_resolver(&config, &http);

    let error = resolver
        .resolve(
            ProviderQuery::AlbumBarcode {
                barcode: "724352910526".to_string(),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        error,
        ResolveError::Transient {
            provider: ProviderId::MusicBrainz,
            reason: "HTTP 500".to_string(),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_pre_cancelled_request_makes_no_calls() {
    let http = Arc::new(ScriptedHttpClient::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let config = ResolverConfig::default().with_discogs_credentials("key", "secret");
    let resolver = scripted_resolver(&config, &http);

    let error = resolver
        .resolve(
            ProviderQuery::AlbumBarcode {
                barcode: "724352910526".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap_err();

    assert_eq!(error, ResolveError::Cancelled);
    assert_eq!(http.request_count(), 0);
}

#[tokio::test]
async fn test_movie_barcode_is_an_explicit_gap() {
    let http = Arc::new(ScriptedHttpClient::new());
    let config = ResolverConfig::default().with_omdb_api_key("omdb-key");
    let resolver = scripted_resolver(&config, &http);

    let error = resolver
        .resolve(
            ProviderQuery::MovieBarcode {
                barcode: "043396077164".to_string(),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(error, ResolveError::NotImplemented);
    assert_eq!(http.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_title_lookup_uses_discogs() {
    let http = Arc::new(ScriptedHttpClient::new());
    http.push_json(
        200,
        r#"{"results": [{"title": "Pink Floyd - Animals", "year": 1977}]}"#,
    );

    let config = ResolverConfig::default().with_discogs_credentials("key", "secret");
    let resolver = scripted_resolver(&config, &http);

    let result = resolver
        .resolve(
            ProviderQuery::AlbumTitle {
                artist: "Pink Floyd".to_string(),
                album: "Animals".to_string(),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.source(), ProviderId::Discogs);

    let requests = http.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.contains("release_title=Animals"));
}

#[tokio::test(start_paused = true)]
async fn test_title_lookup_without_discogs_is_exhausted_cleanly() {
    let http = Arc::new(ScriptedHttpClient::new());

    // Without Discogs credentials the only title-capable provider reports
    // NotConfigured; nothing else in the chain supports title search.
    let config = ResolverConfig::default();
    let resolver = scripted_resolver(&config, &http);

    let error = resolver
        .resolve(
            ProviderQuery::AlbumTitle {
                artist: "Pink Floyd".to_string(),
                album: "Animals".to_string(),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        error,
        ResolveError::NotConfigured {
            provider: ProviderId::Discogs
        }
    );
    assert_eq!(http.request_count(), 0);
}
