use chrono::NaiveDate;
use mockito::{Matcher, Server};
use serde_json::json;
use soundscribe::api::mock::MockCatalog;
use soundscribe::api::spotify::SpotifyClient;
use soundscribe::builder::PlaylistBuilder;
use soundscribe::error::{AddTracksError, PlaylistCreationError};
use soundscribe::models::{Song, Visibility};
use std::sync::Arc;

fn resolved_song(name: &str, artist: &str, uri: &str) -> Song {
    Song {
        name: name.into(),
        artists: vec![artist.into()],
        release_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        spotify_uri: Some(uri.into()),
    }
}

#[test]
fn private_playlist_created_and_tracks_added_in_order() {
    // Create mock server outside of any tokio runtime
    let mut server = Server::new();

    let _m_me = server
        .mock("GET", "/me")
        .match_header("authorization", "Bearer tok")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": "mock_user" }).to_string())
        .create();

    let _m_create = server
        .mock("POST", "/users/mock_user/playlists")
        .match_body(Matcher::PartialJson(json!({
            "name": "Rainy Afternoon",
            "public": false,
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "pl1",
                "owner": { "id": "mock_user" },
                "external_urls": { "spotify": "https://open.spotify.com/playlist/pl1" },
            })
            .to_string(),
        )
        .create();

    let _m_add = server
        .mock("POST", "/playlists/pl1/tracks")
        .match_body(Matcher::Json(json!({
            "uris": ["spotify:track:a", "spotify:track:b"],
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({ "snapshot_id": "s1" }).to_string())
        .create();

    let catalog = Arc::new(SpotifyClient::new(reqwest::Client::new(), server.url()));
    let builder = PlaylistBuilder::new(catalog);

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async move {
        let mut playlist = builder
            .create_playlist("Rainy Afternoon", Visibility::Private, "tok")
            .await
            .unwrap();
        assert_eq!(playlist.id, "pl1");
        assert_eq!(playlist.owner_id, "mock_user");
        assert_eq!(playlist.visibility, Visibility::Private);
        assert!(playlist.url.is_some());

        let songs = vec![
            resolved_song("A", "X", "spotify:track:a"),
            resolved_song("B", "Y", "spotify:track:b"),
        ];
        let added = builder.add_tracks(&mut playlist, &songs, "tok").await.unwrap();
        assert_eq!(added, vec!["spotify:track:a", "spotify:track:b"]);
        assert_eq!(playlist.track_uris, added);
    });
}

#[test]
fn unresolved_song_fails_before_any_network_call() {
    let catalog = Arc::new(MockCatalog::new());
    let builder = PlaylistBuilder::new(catalog.clone());

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async move {
        let mut playlist = builder
            .create_playlist("Test", Visibility::Private, "tok")
            .await
            .unwrap();
        let calls_before = catalog.calls().len();

        let songs = vec![
            resolved_song("A", "X", "spotify:track:a"),
            Song {
                name: "B".into(),
                artists: vec!["Y".into()],
                release_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                spotify_uri: None,
            },
        ];
        let err = builder.add_tracks(&mut playlist, &songs, "tok").await.unwrap_err();
        assert!(matches!(err, AddTracksError::MissingTrackUri { ref name } if name == "B"));

        // the invariant check happens before the catalog is touched
        assert_eq!(catalog.calls().len(), calls_before);
        assert!(playlist.track_uris.is_empty());
    });
}

#[test]
fn provider_error_during_creation_is_fatal() {
    let mut server = Server::new();

    let _m_me = server
        .mock("GET", "/me")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": "mock_user" }).to_string())
        .create();

    let _m_create = server
        .mock("POST", "/users/mock_user/playlists")
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "error": { "status": 403, "message": "Insufficient client scope" } })
                .to_string(),
        )
        .create();

    let catalog = Arc::new(SpotifyClient::new(reqwest::Client::new(), server.url()));
    let builder = PlaylistBuilder::new(catalog);

    let rt = tokio::runtime::Runtime::new().unwrap();
    let err = rt
        .block_on(builder.create_playlist("Nope", Visibility::Public, "tok"))
        .unwrap_err();
    assert!(matches!(err, PlaylistCreationError::Create(_)));
}
