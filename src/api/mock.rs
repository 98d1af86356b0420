use super::{Catalog, TrackCandidate};
use crate::error::ProviderError;
use crate::models::{Playlist, Visibility};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;
use tracing::info;

/// A simple mock catalog used in tests and when no real credentials are
/// present. Search results are programmable and every call is recorded so
/// tests can assert which network operations would have happened.
pub struct MockCatalog {
    tracks: Vec<TrackCandidate>,
    fail_add_tracks: bool,
    fail_create: bool,
    calls: Mutex<Vec<String>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::with_tracks(Vec::new())
    }

    pub fn with_tracks(tracks: Vec<TrackCandidate>) -> Self {
        Self {
            tracks,
            fail_add_tracks: false,
            fail_create: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_add_tracks(mut self) -> Self {
        self.fail_add_tracks = true;
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Calls made so far, in order, as `op:detail` strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn search_tracks(
        &self,
        query: &str,
        _access_token: &str,
    ) -> Result<Vec<TrackCandidate>, ProviderError> {
        self.record(format!("search:{}", query));
        info!("MockCatalog: search {}", query);
        let q = query.to_lowercase();
        // return the programmed tracks whose name appears in the query,
        // mimicking a provider that matches on track name
        Ok(self
            .tracks
            .iter()
            .filter(|t| q.contains(&t.name.to_lowercase()))
            .cloned()
            .collect())
    }

    async fn current_user_id(&self, _access_token: &str) -> Result<String, ProviderError> {
        self.record("me".into());
        info!("MockCatalog: current_user_id");
        Ok("mock_user".into())
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        visibility: Visibility,
        _access_token: &str,
    ) -> Result<Playlist, ProviderError> {
        self.record(format!("create:{}", name));
        info!("MockCatalog: create_playlist {}", name);
        if self.fail_create {
            return Err(ProviderError::Payload {
                payload: json!({ "error": { "status": 403, "message": "forbidden" } }),
            });
        }
        Ok(Playlist {
            id: format!("mock-playlist-{}", name),
            owner_id: user_id.to_string(),
            name: name.to_string(),
            visibility,
            url: None,
            track_uris: Vec::new(),
        })
    }

    async fn add_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
        _access_token: &str,
    ) -> Result<(), ProviderError> {
        self.record(format!("add:{}:{}", playlist_id, uris.join(",")));
        info!("MockCatalog: add_tracks {} -> {} tracks", playlist_id, uris.len());
        if self.fail_add_tracks {
            return Err(ProviderError::Payload {
                payload: json!({ "error": { "status": 500, "message": "add failed" } }),
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
