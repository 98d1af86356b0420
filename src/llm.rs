use crate::error::{CompletionError, RecommendationParseError};
use crate::models::Song;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// One-shot completion endpoint. Implementations make exactly one upstream
/// call per `complete`; no retry is performed at this seam.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

/// Chat-completions client for an OpenAI-compatible endpoint.
pub struct OpenAiClient {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(client: Client, url: String, api_key: String, model: String) -> Self {
        Self { client, url, api_key, model }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };
        let resp = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CompletionError::Status { status: status.as_u16(), body });
        }
        let parsed: ChatResponse = resp.json().await?;
        let choice = parsed.choices.into_iter().next().ok_or(CompletionError::NoChoices)?;
        Ok(choice.message.content)
    }
}

/// Turns free-text mood input into candidate songs via a single completion
/// call. Owns the contract between the model's free text and structured
/// `Song` records.
pub struct RecommendationGenerator {
    client: Arc<dyn CompletionClient>,
}

/// Wire shape of one song object inside the model reply. `artists` arrives
/// comma-joined, matching what the prompt asks for.
#[derive(Deserialize)]
struct RawSong {
    name: Option<String>,
    artists: Option<String>,
    release_date: Option<String>,
}

impl RecommendationGenerator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Ask for `count` songs capturing `text_input` and parse the reply.
    /// The reply is one atomic blob: any malformed entry fails the whole
    /// batch.
    pub async fn generate(
        &self,
        text_input: &str,
        count: usize,
    ) -> Result<Vec<Song>, RecommendationParseError> {
        let prompt = build_prompt(text_input, count);
        debug!("requesting {} song recommendations", count);
        let reply = self.client.complete(&prompt).await?;
        let songs = parse_songs(&reply)?;
        if songs.len() != count {
            warn!(
                "model returned {} songs where {} were requested",
                songs.len(),
                count
            );
        }
        Ok(songs)
    }
}

fn build_prompt(text_input: &str, count: usize) -> String {
    format!(
        "generate me a playlist of {count} songs that captures the feeling of this sentence: \
         {text_input}. reply with a JSON array of objects, each with the fields \"name\", \
         \"artists\" (all artists joined by commas, primary artist first) and \"release_date\" \
         (formatted YYYY-MM-DD), and say nothing else"
    )
}

/// Locate the JSON payload inside the reply without assuming a particular
/// Markdown fence shape. The slice from the first opening bracket to the
/// last closing bracket is handed to the JSON decoder, which then reports
/// any structural damage itself.
fn extract_json(reply: &str) -> Result<&str, RecommendationParseError> {
    let start = reply
        .find(|c| c == '[' || c == '{')
        .ok_or(RecommendationParseError::MissingJson)?;
    let end = reply
        .rfind(|c| c == ']' || c == '}')
        .ok_or(RecommendationParseError::MissingJson)?;
    if end < start {
        return Err(RecommendationParseError::MissingJson);
    }
    Ok(&reply[start..=end])
}

/// Split a comma-joined artist list, trimming each entry. Order is kept and
/// duplicates are not collapsed.
pub fn split_artists(raw: &str) -> Vec<String> {
    raw.split(',').map(|a| a.trim().to_string()).collect()
}

fn parse_songs(reply: &str) -> Result<Vec<Song>, RecommendationParseError> {
    let payload = extract_json(reply)?;
    let raw: Vec<RawSong> = serde_json::from_str(payload)?;
    let mut songs = Vec::with_capacity(raw.len());
    for (index, entry) in raw.into_iter().enumerate() {
        let name = entry
            .name
            .ok_or(RecommendationParseError::MissingField { index, field: "name" })?;
        if name.trim().is_empty() {
            return Err(RecommendationParseError::EmptyField { index, field: "name" });
        }
        let artists_raw = entry
            .artists
            .ok_or(RecommendationParseError::MissingField { index, field: "artists" })?;
        let artists = split_artists(&artists_raw);
        if artists.iter().any(|a| a.is_empty()) {
            return Err(RecommendationParseError::EmptyField { index, field: "artists" });
        }
        let date_raw = entry
            .release_date
            .ok_or(RecommendationParseError::MissingField { index, field: "release_date" })?;
        let release_date = NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d").map_err(|_| {
            RecommendationParseError::BadDate { index, value: date_raw.clone() }
        })?;
        songs.push(Song {
            name,
            artists,
            release_date,
            spotify_uri: None,
        });
    }
    Ok(songs)
}
