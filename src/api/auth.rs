use crate::config::Config;
use crate::error::AuthExchangeError;
use crate::models::AccessToken;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::info;
use url::Url;

/// Scopes needed to create and fill playlists on the user's behalf.
const SCOPES: &str = "playlist-modify-private playlist-modify-public";

/// Redirect path the routing collaborator serves; the provider sends the
/// authorization code back here.
const REDIRECT_PATH: &str = "/spotify-access-token";

/// Authorization-code exchange against the provider's accounts service.
/// Stateless per call: builds the login link and swaps a code for a bearer
/// token. Nothing is persisted.
pub struct OAuthExchange {
    client: Client,
    client_id: String,
    client_secret: String,
    auth_base: String,
    token_url: String,
    app_base: String,
}

impl OAuthExchange {
    pub fn new(
        client: Client,
        client_id: String,
        client_secret: String,
        auth_base: String,
        token_url: String,
        app_base: String,
    ) -> Self {
        Self {
            client,
            client_id,
            client_secret,
            auth_base,
            token_url,
            app_base,
        }
    }

    pub fn from_config(client: Client, cfg: &Config) -> Self {
        Self::new(
            client,
            cfg.spotify_client_id.clone(),
            cfg.spotify_client_secret.clone(),
            cfg.spotify_auth_base.clone(),
            cfg.spotify_token_url.clone(),
            cfg.app_base.clone(),
        )
    }

    fn redirect_uri(&self) -> String {
        format!("{}{}", self.app_base, REDIRECT_PATH)
    }

    /// Login link the user opens in a browser to start the code flow.
    pub fn authorization_link(&self) -> Result<String, url::ParseError> {
        let mut url = Url::parse(&format!("{}/authorize", self.auth_base))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("scope", SCOPES)
            .append_pair("redirect_uri", &self.redirect_uri());
        Ok(url.into())
    }

    /// Exchange an authorization code for an access token. A response body
    /// carrying an `error` field fails the exchange with the provider's
    /// payload preserved; no retry is made.
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken, AuthExchangeError> {
        let redirect_uri = self.redirect_uri();
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &redirect_uri),
        ];
        let auth_header = format!(
            "Basic {}",
            general_purpose::STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret))
        );
        let resp = self
            .client
            .post(&self.token_url)
            .header("Authorization", auth_header)
            .form(&params)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        let payload: Value = serde_json::from_str(&body).unwrap_or_else(|_| {
            json!({ "error": "invalid_response", "error_description": body })
        });
        if payload.get("error").is_some() || !status.is_success() {
            return Err(AuthExchangeError::Provider { payload });
        }
        let token: AccessToken = serde_json::from_value(payload)?;
        info!("exchanged authorization code for access token");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange() -> OAuthExchange {
        OAuthExchange::new(
            Client::new(),
            "cid".into(),
            "csecret".into(),
            "https://accounts.spotify.com".into(),
            "https://accounts.spotify.com/api/token".into(),
            "http://127.0.0.1:8000".into(),
        )
    }

    #[test]
    fn authorization_link_carries_code_flow_params() {
        let link = exchange().authorization_link().unwrap();
        let url = Url::parse(&link).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&("client_id".into(), "cid".into())));
        assert!(pairs.contains(&(
            "scope".into(),
            "playlist-modify-private playlist-modify-public".into()
        )));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://127.0.0.1:8000/spotify-access-token".into()
        )));
    }
}
