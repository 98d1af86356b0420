use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    #[serde(default = "default_auth_base")]
    pub spotify_auth_base: String,
    #[serde(default = "default_token_url")]
    pub spotify_token_url: String,
    #[serde(default = "default_api_base")]
    pub spotify_api_base: String,

    /// Public base URI of this application; the OAuth redirect URI is
    /// derived from it as `{app_base}/spotify-access-token`.
    #[serde(default = "default_app_base")]
    pub app_base: String,

    pub completion_api_key: String,
    #[serde(default = "default_completion_url")]
    pub completion_url: String,
    #[serde(default = "default_completion_model")]
    pub completion_model: String,

    /// Max concurrent catalog searches during track resolution.
    #[serde(default = "default_resolver_workers")]
    pub resolver_workers: usize,

    /// Per-request timeout for all outbound HTTP calls, in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_sec: u64,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_auth_base() -> String { "https://accounts.spotify.com".into() }
fn default_token_url() -> String { "https://accounts.spotify.com/api/token".into() }
fn default_api_base() -> String { "https://api.spotify.com/v1".into() }
fn default_app_base() -> String { "http://127.0.0.1:8000".into() }
fn default_completion_url() -> String { "https://api.openai.com/v1/chat/completions".into() }
fn default_completion_model() -> String { "gpt-4o-mini".into() }
fn default_resolver_workers() -> usize { 4 }
fn default_http_timeout() -> u64 { 30 }
fn default_log_dir() -> PathBuf { "/var/log/soundscribe".into() }

impl Config {
    pub fn from_path(path: &std::path::Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&s)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn minimal_config_gets_defaults() {
        let toml = r#"
spotify_client_id = "cid"
spotify_client_secret = "csecret"
completion_api_key = "sk-test"
"#;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(toml.as_bytes()).unwrap();
        let cfg = Config::from_path(f.path()).unwrap();
        assert_eq!(cfg.spotify_api_base, "https://api.spotify.com/v1");
        assert_eq!(cfg.spotify_token_url, "https://accounts.spotify.com/api/token");
        assert_eq!(cfg.resolver_workers, 4);
        assert_eq!(cfg.http_timeout_sec, 30);
    }

    #[test]
    fn missing_credentials_is_an_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"app_base = \"http://localhost\"").unwrap();
        assert!(Config::from_path(f.path()).is_err());
    }
}
