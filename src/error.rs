use thiserror::Error;

/// Failure talking to the completion endpoint itself, before any parsing.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion reply carried no choices")]
    NoChoices,
}

/// The whole generation batch fails together; the reply is one atomic blob,
/// so there is no partial-success path at this stage.
#[derive(Debug, Error)]
pub enum RecommendationParseError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("reply contains no JSON payload")]
    MissingJson,
    #[error("reply payload is not the expected JSON shape: {0}")]
    Json(#[from] serde_json::Error),
    #[error("song entry {index} is missing field `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("song entry {index} has an empty `{field}`")]
    EmptyField { index: usize, field: &'static str },
    #[error("song entry {index} has malformed release_date `{value}` (want YYYY-MM-DD)")]
    BadDate { index: usize, value: String },
}

/// Code-for-token exchange failure. The provider's error payload is carried
/// verbatim so callers can branch on kind instead of string content.
#[derive(Debug, Error)]
pub enum AuthExchangeError {
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider rejected the code exchange: {payload}")]
    Provider { payload: serde_json::Value },
    #[error("token payload was not a valid access token: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl AuthExchangeError {
    /// The provider's `error` code, when this is a provider rejection.
    pub fn provider_code(&self) -> Option<&str> {
        match self {
            AuthExchangeError::Provider { payload } => {
                payload.get("error").and_then(|v| v.as_str())
            }
            _ => None,
        }
    }
}

/// Failure of a single bearer-authenticated provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider error payload: {payload}")]
    Payload { payload: serde_json::Value },
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Per-song resolution failure. Never fatal to sibling songs.
#[derive(Debug, Error)]
pub enum ResolutionFailure {
    #[error("catalog search failed: {0}")]
    SearchFailed(#[from] ProviderError),
    #[error("no catalog match cleared the similarity threshold")]
    NoMatch,
}

#[derive(Debug, Error)]
pub enum PlaylistCreationError {
    #[error("user lookup failed: {0}")]
    UserLookup(#[source] ProviderError),
    #[error("playlist creation failed: {0}")]
    Create(#[source] ProviderError),
}

#[derive(Debug, Error)]
pub enum AddTracksError {
    /// Contract breach upstream: a song reached the builder unresolved.
    /// Raised before any network call is made.
    #[error("song `{name}` has no spotify uri")]
    MissingTrackUri { name: String },
    #[error("adding tracks failed: {0}")]
    Provider(#[from] ProviderError),
}
