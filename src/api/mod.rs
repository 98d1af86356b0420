pub mod spotify;
pub mod mock;
pub mod auth;

use crate::error::ProviderError;
use crate::models::{Playlist, Visibility};
use chrono::NaiveDate;

/// One track as returned by the provider's catalog search, with the
/// metadata the resolver scores on.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackCandidate {
    pub uri: String,
    pub name: String,
    pub artists: Vec<String>,
    /// Providers report album release dates at varying precision; anything
    /// coarser than a full day is surfaced as None.
    pub release_date: Option<NaiveDate>,
}

/// Catalog trait: the provider operations the resolver and playlist builder
/// need. Implementations: spotify::SpotifyClient and mock::MockCatalog.
/// The access token is caller-supplied per call and never stored.
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Search the track catalog and return candidate matches in the
    /// provider's ranking order.
    async fn search_tracks(
        &self,
        query: &str,
        access_token: &str,
    ) -> Result<Vec<TrackCandidate>, ProviderError>;

    /// Identify the user the access token acts for.
    async fn current_user_id(&self, access_token: &str) -> Result<String, ProviderError>;

    /// Create an empty playlist owned by `user_id` and return it.
    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        visibility: Visibility,
        access_token: &str,
    ) -> Result<Playlist, ProviderError>;

    /// Append tracks to a playlist, preserving the given order.
    async fn add_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
        access_token: &str,
    ) -> Result<(), ProviderError>;

    /// Return the provider's name (for logging)
    fn name(&self) -> &str;
}
