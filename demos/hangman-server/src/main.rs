use std::time::Duration;

use hangroom::prelude::*;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BIND_VAR: &str = "HANGROOM_BIND";
const WORDS_VAR: &str = "HANGROOM_WORDS";
const IDLE_TIMEOUT_VAR: &str = "HANGROOM_IDLE_SECS";

/// Reads the word list from `path`, or falls back to the built-in list.
async fn load_words(path: Option<&str>) -> Result<WordList, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(WordList::default());
    };
    let text = tokio::fs::read_to_string(path).await?;
    let words = WordList::parse(&text)?;
    tracing::info!(path, count = words.len(), "loaded word list");
    Ok(words)
}

fn idle_timeout(raw: Option<&str>) -> Result<Duration, std::num::ParseIntError> {
    match raw {
        Some(secs) => Ok(Duration::from_secs(secs.trim().parse()?)),
        None => Ok(ServerConfig::default().idle_timeout),
    }
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let bind = std::env::var(BIND_VAR).unwrap_or_else(|_| ServerConfig::default().bind_addr);
    let words = load_words(std::env::var(WORDS_VAR).ok().as_deref()).await?;
    let idle = idle_timeout(std::env::var(IDLE_TIMEOUT_VAR).ok().as_deref())?;

    let server = HangroomServer::builder()
        .bind(&bind)
        .words(words)
        .idle_timeout(idle)
        .build()
        .await?;
    tracing::info!(addr = %server.local_addr()?, "hangman server ready");

    server.run().await?;
    Ok(())
}
