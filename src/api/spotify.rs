use super::{Catalog, TrackCandidate};
use crate::error::ProviderError;
use crate::models::{Playlist, Visibility};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{json, Value};

/// How many search candidates to pull per song; the resolver scores and
/// picks among these.
const SEARCH_LIMIT: usize = 10;

const PLAYLIST_DESCRIPTION: &str = "Playlist created by soundscribe";

/// Spotify catalog client backed by the Spotify Web API.
/// The access token is supplied by the caller on every call; this client
/// holds no credential state. The base URL is injected so tests can point
/// it at a mock server.
pub struct SpotifyClient {
    client: Client,
    api_base: String,
}

impl SpotifyClient {
    pub fn new(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
        }
    }

    fn bearer(access_token: &str) -> String {
        format!("Bearer {}", access_token)
    }
}

/// Decode a provider response, turning non-success statuses and bodies that
/// carry an `error` field into typed failures with the payload preserved.
async fn recv_json(resp: reqwest::Response) -> Result<Value, ProviderError> {
    let status = resp.status();
    if !status.is_success() {
        let txt = resp.text().await.unwrap_or_default();
        if let Ok(v) = serde_json::from_str::<Value>(&txt) {
            if v.get("error").is_some() {
                return Err(ProviderError::Payload { payload: v });
            }
        }
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body: txt,
        });
    }
    let v: Value = resp.json().await?;
    if v.get("error").is_some() {
        return Err(ProviderError::Payload { payload: v });
    }
    Ok(v)
}

/// Spotify reports album release dates at day, month or year precision;
/// only full dates are usable for the resolver's date tie-break.
fn parse_release_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

#[async_trait]
impl Catalog for SpotifyClient {
    async fn search_tracks(
        &self,
        query: &str,
        access_token: &str,
    ) -> Result<Vec<TrackCandidate>, ProviderError> {
        let url = format!(
            "{}/search?q={}&type=track&limit={}",
            self.api_base,
            urlencoding::encode(query),
            SEARCH_LIMIT
        );
        let resp = self
            .client
            .get(&url)
            .header(AUTHORIZATION, Self::bearer(access_token))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let j = recv_json(resp).await?;

        let mut candidates = Vec::new();
        if let Some(items) = j["tracks"]["items"].as_array() {
            for item in items {
                let uri = match item["uri"].as_str() {
                    Some(u) => u.to_string(),
                    None => continue,
                };
                let name = item["name"].as_str().unwrap_or("").to_string();
                let artists = item["artists"]
                    .as_array()
                    .map(|a| {
                        a.iter()
                            .filter_map(|artist| artist["name"].as_str())
                            .map(|s| s.to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                let release_date = parse_release_date(item["album"]["release_date"].as_str());
                candidates.push(TrackCandidate {
                    uri,
                    name,
                    artists,
                    release_date,
                });
            }
        }
        debug!("search `{}` returned {} candidates", query, candidates.len());
        Ok(candidates)
    }

    async fn current_user_id(&self, access_token: &str) -> Result<String, ProviderError> {
        let url = format!("{}/me", self.api_base);
        let resp = self
            .client
            .get(&url)
            .header(AUTHORIZATION, Self::bearer(access_token))
            .send()
            .await?;
        let j = recv_json(resp).await?;
        j["id"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ProviderError::Malformed("user object has no id".into()))
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        visibility: Visibility,
        access_token: &str,
    ) -> Result<Playlist, ProviderError> {
        let url = format!(
            "{}/users/{}/playlists",
            self.api_base,
            url::form_urlencoded::byte_serialize(user_id.as_bytes()).collect::<String>()
        );
        let body = json!({
            "name": name,
            "public": visibility.is_public(),
            "description": PLAYLIST_DESCRIPTION,
        });
        let resp = self
            .client
            .post(&url)
            .header(AUTHORIZATION, Self::bearer(access_token))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let j = recv_json(resp).await?;
        let id = j["id"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ProviderError::Malformed("playlist object has no id".into()))?;
        let owner_id = j["owner"]["id"].as_str().unwrap_or(user_id).to_string();
        let url_field = j["external_urls"]["spotify"].as_str().map(|s| s.to_string());
        if url_field.is_none() {
            warn!("created playlist {} carries no external url", id);
        }
        Ok(Playlist {
            id,
            owner_id,
            name: name.to_string(),
            visibility,
            url: url_field,
            track_uris: Vec::new(),
        })
    }

    async fn add_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
        access_token: &str,
    ) -> Result<(), ProviderError> {
        let url = format!("{}/playlists/{}/tracks", self.api_base, playlist_id);
        let body = json!({ "uris": uris });
        let resp = self
            .client
            .post(&url)
            .header(AUTHORIZATION, Self::bearer(access_token))
            .json(&body)
            .send()
            .await?;
        recv_json(resp).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "spotify"
    }
}
