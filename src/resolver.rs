use crate::api::{Catalog, TrackCandidate};
use crate::error::ResolutionFailure;
use crate::models::Song;
use chrono::Datelike;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves candidate songs against the provider catalog, attaching the
/// canonical track URI to each match. Resolution is independent per song;
/// a failure drops that song alone and never aborts its siblings.
pub struct TrackResolver {
    catalog: Arc<dyn Catalog>,
    workers: usize,
}

/// A song that could not be resolved, with the reason it was dropped.
#[derive(Debug)]
pub struct DroppedSong {
    pub song: Song,
    pub reason: ResolutionFailure,
}

/// Outcome of a resolution pass: resolved songs in their original input
/// order, plus the per-song report of everything that was dropped.
#[derive(Debug, Default)]
pub struct ResolutionReport {
    pub resolved: Vec<Song>,
    pub dropped: Vec<DroppedSong>,
}

impl TrackResolver {
    pub fn new(catalog: Arc<dyn Catalog>, workers: usize) -> Self {
        Self { catalog, workers }
    }

    /// Resolve one song: search the catalog and pick the best-scoring
    /// candidate, or fail with `NoMatch` if nothing clears the threshold.
    pub async fn resolve(&self, song: &Song, access_token: &str) -> Result<Song, ResolutionFailure> {
        let query = build_query(song);
        let candidates = self.catalog.search_tracks(&query, access_token).await?;
        match pick_best(song, &candidates) {
            Some(best) => {
                debug!("resolved `{}` -> {}", song.name, best.uri);
                Ok(song.clone().with_uri(best.uri.clone()))
            }
            None => {
                warn!(
                    "no acceptable catalog match for `{}` ({} candidates)",
                    song.name,
                    candidates.len()
                );
                Err(ResolutionFailure::NoMatch)
            }
        }
    }

    /// Resolve a batch with bounded fan-out. `buffered` both limits the
    /// number of in-flight searches and yields results in input order, so
    /// the resolved sequence needs no re-sorting.
    pub async fn resolve_all(&self, songs: Vec<Song>, access_token: &str) -> ResolutionReport {
        let workers = self.workers.max(1);
        let outcomes: Vec<(Song, Result<Song, ResolutionFailure>)> = stream::iter(songs)
            .map(|song| async move {
                let outcome = self.resolve(&song, access_token).await;
                (song, outcome)
            })
            .buffered(workers)
            .collect()
            .await;

        let mut report = ResolutionReport::default();
        for (song, outcome) in outcomes {
            match outcome {
                Ok(resolved) => report.resolved.push(resolved),
                Err(reason) => report.dropped.push(DroppedSong { song, reason }),
            }
        }
        report
    }
}

/// Search query from name and primary artist, the provider's field syntax.
fn build_query(song: &Song) -> String {
    format!("track:{} artist:{}", song.name, song.primary_artist())
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Score one candidate against the song, or None when it fails the
/// similarity threshold.
///
/// Eligibility requires name overlap: an exact normalized match scores
/// highest, a containment either way is acceptable, anything else is out
/// regardless of artist or date. Eligible candidates are then ranked by
/// primary-artist containment and release-year distance.
fn score_candidate(song: &Song, candidate: &TrackCandidate) -> Option<i32> {
    let song_name = normalize(&song.name);
    let cand_name = normalize(&candidate.name);
    if cand_name.is_empty() || song_name.is_empty() {
        return None;
    }
    let mut score = if cand_name == song_name {
        100
    } else if cand_name.contains(&song_name) || song_name.contains(&cand_name) {
        60
    } else {
        return None;
    };

    let primary = normalize(song.primary_artist());
    if !primary.is_empty()
        && candidate.artists.iter().any(|a| {
            let a = normalize(a);
            a.contains(&primary) || primary.contains(&a)
        })
    {
        score += 30;
    }

    if let Some(date) = candidate.release_date {
        let gap = (date.year() - song.release_date.year()).abs();
        score += 10 - gap.min(10);
    }

    Some(score)
}

/// Best-scoring candidate; on equal scores the earlier candidate wins, so
/// the provider's own ranking is the final tie-break.
fn pick_best<'a>(song: &Song, candidates: &'a [TrackCandidate]) -> Option<&'a TrackCandidate> {
    let mut best: Option<(&TrackCandidate, i32)> = None;
    for candidate in candidates {
        if let Some(score) = score_candidate(song, candidate) {
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((candidate, score)),
            }
        }
    }
    best.map(|(c, _)| c)
}
