use crate::api::spotify::SpotifyClient;
use crate::api::Catalog;
use crate::builder::PlaylistBuilder;
use crate::config::Config;
use crate::error::{AddTracksError, PlaylistCreationError, RecommendationParseError};
use crate::llm::{CompletionClient, OpenAiClient, RecommendationGenerator};
use crate::models::{Playlist, Song, Visibility};
use crate::resolver::{DroppedSong, ResolutionReport, TrackResolver};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Stage-tagged failure of one pipeline run. Every variant is terminal;
/// there is no retry or rollback transition.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Generation(#[from] RecommendationParseError),
    #[error("no candidate song could be resolved against the catalog")]
    NothingResolved { dropped: Vec<DroppedSong> },
    #[error(transparent)]
    PlaylistCreate(#[from] PlaylistCreationError),
    /// The playlist exists but is empty or partially populated; it is
    /// handed back so the caller can decide whether to retry or discard.
    #[error("tracks could not be added to playlist {}", .playlist.id)]
    AddTracks {
        playlist: Playlist,
        #[source]
        source: AddTracksError,
    },
}

/// Terminal success state of a run: the created playlist, the URIs added
/// to it in order, and the songs dropped during resolution.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub playlist: Playlist,
    pub added: Vec<String>,
    pub dropped: Vec<DroppedSong>,
}

/// One end-to-end execution path: text input -> candidate songs -> resolved
/// songs -> created playlist -> final membership. All state is scoped to a
/// single run; the only shared resource is the injected HTTP client.
pub struct Pipeline {
    generator: RecommendationGenerator,
    resolver: TrackResolver,
    builder: PlaylistBuilder,
}

impl Pipeline {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        catalog: Arc<dyn Catalog>,
        resolver_workers: usize,
    ) -> Self {
        Self {
            generator: RecommendationGenerator::new(completion),
            resolver: TrackResolver::new(catalog.clone(), resolver_workers),
            builder: PlaylistBuilder::new(catalog),
        }
    }

    /// Wire up the real upstreams from config, sharing one pooled HTTP
    /// client (safe for concurrent resolver workers) across components.
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let client = http_client(cfg)?;
        let completion = Arc::new(OpenAiClient::new(
            client.clone(),
            cfg.completion_url.clone(),
            cfg.completion_api_key.clone(),
            cfg.completion_model.clone(),
        ));
        let catalog = Arc::new(SpotifyClient::new(client, cfg.spotify_api_base.clone()));
        Ok(Self::new(completion, catalog, cfg.resolver_workers))
    }

    pub fn generator(&self) -> &RecommendationGenerator {
        &self.generator
    }

    /// Run the whole pipeline. Unresolvable songs are dropped and reported;
    /// they only fail the run when nothing at all resolves.
    pub async fn run(
        &self,
        text_input: &str,
        count: usize,
        name: &str,
        visibility: Visibility,
        access_token: &str,
    ) -> Result<PipelineOutcome, PipelineError> {
        let songs = self.generator.generate(text_input, count).await?;
        info!("generated {} candidate songs", songs.len());
        self.build_from_songs(songs, name, visibility, access_token)
            .await
    }

    /// Build a playlist from candidate songs the caller already has: resolve
    /// each against the catalog, then create and fill the playlist.
    pub async fn build_from_songs(
        &self,
        songs: Vec<Song>,
        name: &str,
        visibility: Visibility,
        access_token: &str,
    ) -> Result<PipelineOutcome, PipelineError> {
        let ResolutionReport { resolved, dropped } =
            self.resolver.resolve_all(songs, access_token).await;
        for d in &dropped {
            warn!("dropping `{}`: {}", d.song.name, d.reason);
        }
        if resolved.is_empty() {
            return Err(PipelineError::NothingResolved { dropped });
        }

        let mut playlist = self
            .builder
            .create_playlist(name, visibility, access_token)
            .await?;

        match self
            .builder
            .add_tracks(&mut playlist, &resolved, access_token)
            .await
        {
            Ok(added) => Ok(PipelineOutcome {
                playlist,
                added,
                dropped,
            }),
            Err(source) => Err(PipelineError::AddTracks { playlist, source }),
        }
    }
}

/// Shared outbound HTTP client; the per-request timeout wraps each upstream
/// call independently, since the pipeline itself never retries.
pub fn http_client(cfg: &Config) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.http_timeout_sec))
        .build()?;
    Ok(client)
}
