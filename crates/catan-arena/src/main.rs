//! Catan arena: runs a batch of bot games on one worker pool.

use catan_arena::Arena;
use catan_engine::GameConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn env_or<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let games: usize = env_or("ARENA_GAMES", 4);
    let workers: usize = env_or("ARENA_WORKERS", catan_engine::worker::DEFAULT_MAX_WORKERS);
    let config = GameConfig::from_env();
    let seed = config.seed();

    info!("Starting arena with {} games on {} workers", games, workers);

    let arena = Arena::new(workers, config)?;
    let summaries = arena.run(games, seed)?;
    for summary in &summaries {
        info!("{}", serde_json::to_string(summary)?);
    }

    let finished = summaries.iter().filter(|s| s.winner.is_some()).count();
    info!("Arena done: {}/{} games had a winner", finished, summaries.len());
    arena.shutdown();
    Ok(())
}
