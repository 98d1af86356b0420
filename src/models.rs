use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A candidate or resolved track.
///
/// `spotify_uri` is `None` for songs parsed out of the model reply and is
/// populated only by the track resolver; the playlist builder rejects any
/// song that reaches it without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub name: String,
    /// Primary artist first; order is meaningful and duplicates are kept.
    pub artists: Vec<String>,
    /// Wire form is `YYYY-MM-DD` (chrono's serde default for NaiveDate).
    pub release_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify_uri: Option<String>,
}

impl Song {
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map(String::as_str).unwrap_or("")
    }

    pub fn with_uri(mut self, uri: String) -> Self {
        self.spotify_uri = Some(uri);
        self
    }
}

/// Recommendation payload surfaced to the routing collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongsResponse {
    pub songs: Vec<Song>,
}

/// Bearer credential returned by the token exchange. Passthrough value;
/// never persisted by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(format!("expected `public` or `private`, got `{}`", other)),
        }
    }
}

/// Provider-assigned playlist. Created once per pipeline run; membership is
/// appended in input order and never reordered or deduplicated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub track_uris: Vec<String>,
}
