use crate::api::Catalog;
use crate::error::{AddTracksError, PlaylistCreationError};
use crate::models::{Playlist, Song, Visibility};
use std::sync::Arc;
use tracing::info;

/// Creates a playlist for the authenticated user and appends resolved
/// tracks to it in input order.
pub struct PlaylistBuilder {
    catalog: Arc<dyn Catalog>,
}

impl PlaylistBuilder {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Resolve the acting user, then create the playlist scoped to them.
    /// A provider-reported failure at either step is fatal; no compensating
    /// deletion is attempted for anything the provider may have created.
    pub async fn create_playlist(
        &self,
        name: &str,
        visibility: Visibility,
        access_token: &str,
    ) -> Result<Playlist, PlaylistCreationError> {
        let user_id = self
            .catalog
            .current_user_id(access_token)
            .await
            .map_err(PlaylistCreationError::UserLookup)?;
        let playlist = self
            .catalog
            .create_playlist(&user_id, name, visibility, access_token)
            .await
            .map_err(PlaylistCreationError::Create)?;
        info!("created playlist {} for user {}", playlist.id, user_id);
        Ok(playlist)
    }

    /// Append the songs' track URIs to the playlist, preserving order.
    /// Every song must already be resolved; an unresolved song fails the
    /// call before any network traffic, guarding the resolver contract.
    pub async fn add_tracks(
        &self,
        playlist: &mut Playlist,
        songs: &[Song],
        access_token: &str,
    ) -> Result<Vec<String>, AddTracksError> {
        let mut uris = Vec::with_capacity(songs.len());
        for song in songs {
            match &song.spotify_uri {
                Some(uri) => uris.push(uri.clone()),
                None => {
                    return Err(AddTracksError::MissingTrackUri {
                        name: song.name.clone(),
                    })
                }
            }
        }
        self.catalog
            .add_tracks(&playlist.id, &uris, access_token)
            .await?;
        playlist.track_uris.extend(uris.iter().cloned());
        info!("added {} tracks to playlist {}", uris.len(), playlist.id);
        Ok(uris)
    }
}
