use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use soundscribe as lib;
use std::path::{Path, PathBuf};
use tracing::subscriber as tracing_subscriber_global;
use tracing_appender::rolling::RollingFileAppender;
use tracing_log::LogTracer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use lib::api::auth::OAuthExchange;
use lib::config::Config;
use lib::models::{SongsResponse, Visibility};
use lib::pipeline::{http_client, Pipeline, PipelineError};

#[derive(Parser)]
#[command(name = "soundscribe", version)]
struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate song recommendations for a mood sentence
    Recommend {
        /// Mood or sentiment text the playlist should capture
        #[arg(long)]
        text: String,

        /// Number of songs to request
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=300))]
        size: u32,
    },
    /// Print the Spotify login link that starts the authorization flow
    AuthLink,
    /// Exchange an authorization code for an access token
    ExchangeCode {
        #[arg(long)]
        code: String,
    },
    /// Run the full pipeline: recommend, resolve, create and fill a playlist
    Create {
        /// Mood or sentiment text the playlist should capture
        #[arg(long)]
        text: String,

        /// Number of songs to request
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=300))]
        size: u32,

        /// Name for the new playlist
        #[arg(long)]
        name: String,

        /// Playlist visibility: public or private
        #[arg(long, default_value = "private")]
        visibility: Visibility,

        /// Spotify access token obtained from exchange-code
        #[arg(long)]
        access_token: String,
    },
    /// Validate config file and exit
    ConfigValidate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // Resolve config path: explicit --config overrides; otherwise prefer
    // system-wide /etc/soundscribe/config.toml and fall back to a local
    // file for dev usage.
    let resolved_config_path: PathBuf = match &cli.config {
        Some(p) => p.clone(),
        None => {
            let etc_path = Path::new("/etc/soundscribe/config.toml");
            if etc_path.exists() {
                etc_path.to_path_buf()
            } else {
                PathBuf::from("soundscribe.toml")
            }
        }
    };

    let cfg = Config::from_path(&resolved_config_path)
        .with_context(|| format!("loading config from {}", resolved_config_path.display()))?;

    // Initialize log->tracing bridge and structured logging.
    // Logs go to both stderr and a daily-rotated file in cfg.log_dir,
    // keeping stdout clean for the JSON the commands print.
    let _ = LogTracer::init();
    let file_appender: RollingFileAppender =
        tracing_appender::rolling::daily(&cfg.log_dir, "soundscribe.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Honor RUST_LOG if set, otherwise default to info.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer().with_writer(non_blocking);
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer);

    tracing_subscriber_global::set_global_default(subscriber)
        .expect("failed to set global tracing subscriber");

    match cli.command {
        Commands::Recommend { text, size } => {
            let pipeline = Pipeline::from_config(&cfg)?;
            let songs = pipeline
                .generator()
                .generate(&text, size as usize)
                .await
                .with_context(|| "generating recommendations".to_string())?;
            let response = SongsResponse { songs };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::AuthLink => {
            let exchange = OAuthExchange::from_config(http_client(&cfg)?, &cfg);
            println!("{}", exchange.authorization_link()?);
        }
        Commands::ExchangeCode { code } => {
            let exchange = OAuthExchange::from_config(http_client(&cfg)?, &cfg);
            let token = exchange
                .exchange_code(&code)
                .await
                .with_context(|| "exchanging authorization code".to_string())?;
            println!("{}", serde_json::to_string_pretty(&token)?);
        }
        Commands::Create {
            text,
            size,
            name,
            visibility,
            access_token,
        } => {
            let pipeline = Pipeline::from_config(&cfg)?;
            match pipeline
                .run(&text, size as usize, &name, visibility, &access_token)
                .await
            {
                Ok(outcome) => {
                    let dropped: Vec<_> = outcome
                        .dropped
                        .iter()
                        .map(|d| json!({ "name": d.song.name, "reason": d.reason.to_string() }))
                        .collect();
                    let body = json!({
                        "message": "success",
                        "playlist": outcome.playlist,
                        "added": outcome.added,
                        "dropped": dropped,
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                // The playlist exists but could not be filled; hand its
                // reference back so the caller can retry or discard it.
                Err(PipelineError::AddTracks { playlist, source }) => {
                    let body = json!({
                        "message": "failure",
                        "playlist": playlist,
                        "error": source.to_string(),
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                    std::process::exit(1);
                }
                Err(e) => {
                    let body = json!({ "message": "failure", "error": e.to_string() });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                    std::process::exit(1);
                }
            }
        }
        Commands::ConfigValidate => {
            match Config::from_path(resolved_config_path.as_path()) {
                Ok(_) => println!("OK"),
                Err(e) => {
                    eprintln!("Config validation failed: {}", e);
                    std::process::exit(2);
                }
            }
        }
    }

    Ok(())
}
