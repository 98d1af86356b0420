use chrono::NaiveDate;
use mockito::{Matcher, Server};
use serde_json::json;
use soundscribe::api::mock::MockCatalog;
use soundscribe::api::spotify::SpotifyClient;
use soundscribe::api::TrackCandidate;
use soundscribe::error::ResolutionFailure;
use soundscribe::resolver::TrackResolver;
use soundscribe::models::Song;
use std::sync::Arc;

fn song(name: &str, artist: &str) -> Song {
    Song {
        name: name.into(),
        artists: vec![artist.into()],
        release_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        spotify_uri: None,
    }
}

fn candidate(name: &str, artist: &str, uri: &str) -> TrackCandidate {
    TrackCandidate {
        uri: uri.into(),
        name: name.into(),
        artists: vec![artist.into()],
        release_date: NaiveDate::from_ymd_opt(2020, 1, 1),
    }
}

#[test]
fn one_failed_resolution_does_not_abort_siblings() {
    // only song A exists in the catalog
    let catalog = Arc::new(MockCatalog::with_tracks(vec![candidate(
        "A",
        "X",
        "spotify:track:a",
    )]));
    let resolver = TrackResolver::new(catalog, 4);

    let rt = tokio::runtime::Runtime::new().unwrap();
    let report = rt.block_on(resolver.resolve_all(vec![song("A", "X"), song("B", "Y")], "tok"));

    assert_eq!(report.resolved.len(), 1);
    assert_eq!(report.resolved[0].name, "A");
    assert_eq!(report.resolved[0].spotify_uri.as_deref(), Some("spotify:track:a"));

    assert_eq!(report.dropped.len(), 1);
    assert_eq!(report.dropped[0].song.name, "B");
    assert!(matches!(report.dropped[0].reason, ResolutionFailure::NoMatch));
}

#[test]
fn resolved_songs_keep_input_order_under_fanout() {
    let catalog = Arc::new(MockCatalog::with_tracks(vec![
        candidate("C", "Z", "spotify:track:c"),
        candidate("A", "X", "spotify:track:a"),
        candidate("B", "Y", "spotify:track:b"),
    ]));
    let resolver = TrackResolver::new(catalog, 3);

    let rt = tokio::runtime::Runtime::new().unwrap();
    let report = rt.block_on(resolver.resolve_all(
        vec![song("A", "X"), song("B", "Y"), song("C", "Z")],
        "tok",
    ));

    assert!(report.dropped.is_empty());
    let names: Vec<&str> = report.resolved.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    let uris: Vec<&str> = report
        .resolved
        .iter()
        .filter_map(|s| s.spotify_uri.as_deref())
        .collect();
    assert_eq!(uris, vec!["spotify:track:a", "spotify:track:b", "spotify:track:c"]);
}

#[test]
fn search_failure_drops_only_that_song() {
    // Create mock server outside of any tokio runtime
    let mut server = Server::new();

    let _m_search = server
        .mock("GET", Matcher::Regex(r"^/search.*".to_string()))
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"server"}"#)
        .create();

    let catalog = Arc::new(SpotifyClient::new(reqwest::Client::new(), server.url()));
    let resolver = TrackResolver::new(catalog, 2);

    let rt = tokio::runtime::Runtime::new().unwrap();
    let report = rt.block_on(resolver.resolve_all(vec![song("A", "X")], "tok"));
    assert!(report.resolved.is_empty());
    assert_eq!(report.dropped.len(), 1);
    assert!(matches!(
        report.dropped[0].reason,
        ResolutionFailure::SearchFailed(_)
    ));
}

#[test]
fn catalog_search_resolves_best_match_over_http() {
    let mut server = Server::new();

    let body = json!({
        "tracks": {
            "items": [
                {
                    "uri": "spotify:track:cover",
                    "name": "Hurt",
                    "artists": [{ "name": "Nine Inch Nails" }],
                    "album": { "release_date": "1994-03-08" },
                },
                {
                    "uri": "spotify:track:cash",
                    "name": "Hurt",
                    "artists": [{ "name": "Johnny Cash" }],
                    "album": { "release_date": "2002-11-04" },
                },
            ]
        }
    });
    let _m_search = server
        .mock("GET", Matcher::Regex(r"^/search.*".to_string()))
        .match_header("authorization", "Bearer tok")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create();

    let catalog = Arc::new(SpotifyClient::new(reqwest::Client::new(), server.url()));
    let resolver = TrackResolver::new(catalog, 1);

    let mut wanted = song("Hurt", "Johnny Cash");
    wanted.release_date = NaiveDate::from_ymd_opt(2002, 11, 4).unwrap();

    let rt = tokio::runtime::Runtime::new().unwrap();
    let resolved = rt.block_on(resolver.resolve(&wanted, "tok")).unwrap();
    assert_eq!(resolved.spotify_uri.as_deref(), Some("spotify:track:cash"));
}
