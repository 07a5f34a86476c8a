//! Game configuration.
//!
//! Configuration can be created programmatically using [`GameConfig::new()`]
//! or by reading environment variables using [`GameConfig::from_env()`].
//!
//! # Environment Variables
//!
//! All values are optional. Unset or unparsable values fall back to the default.
//!
//! - `CATAN_MAX_PLAYERS`: seats before the game starts on its own (default: `4`)
//! - `CATAN_MAX_POINTS`: points needed to win (default: `10`)
//! - `CATAN_TURN_TIMEOUT_MS`: wall-clock limit for one turn (default: `240000`)
//! - `CATAN_GAME_TIMEOUT_MS`: wall-clock limit for the whole game (default: `1800000`)
//! - `CATAN_MAX_ROUNDS`: rounds before the game is called a stalemate (default: `2000`)
//! - `CATAN_KICK_AFTER_TIMEOUTS`: consecutive timeouts before a kick (default: `3`)
//! - `CATAN_SEED`: seed for dice and steals (default: from entropy)

use std::time::Duration;

/// Configuration for one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub(crate) max_players: usize,
    pub(crate) max_points: u32,
    pub(crate) turn_timeout: Duration,
    pub(crate) game_timeout: Duration,
    pub(crate) max_rounds: u32,
    pub(crate) kick_after_timeouts: u32,
    pub(crate) seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - Four players, ten points to win.
    /// - Turns time out after 240 seconds, games after 1800 seconds.
    /// - A game still running after 2000 rounds is a stalemate.
    /// - Three consecutive timeouts kick a player.
    pub fn new() -> Self {
        Self {
            max_players: 4,
            max_points: 10,
            turn_timeout: Duration::from_secs(240),
            game_timeout: Duration::from_secs(1800),
            max_rounds: 2000,
            kick_after_timeouts: 3,
            seed: None,
        }
    }

    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        fn get_env<T: std::str::FromStr>(var: &str) -> Option<T> {
            std::env::var(var).ok().and_then(|v| v.trim().parse().ok())
        }

        let defaults = Self::new();
        Self {
            max_players: get_env("CATAN_MAX_PLAYERS")
                .map(|n: usize| n.clamp(1, 4))
                .unwrap_or(defaults.max_players),
            max_points: get_env("CATAN_MAX_POINTS").unwrap_or(defaults.max_points),
            turn_timeout: get_env("CATAN_TURN_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.turn_timeout),
            game_timeout: get_env("CATAN_GAME_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.game_timeout),
            max_rounds: get_env("CATAN_MAX_ROUNDS").unwrap_or(defaults.max_rounds),
            kick_after_timeouts: get_env("CATAN_KICK_AFTER_TIMEOUTS")
                .unwrap_or(defaults.kick_after_timeouts),
            seed: get_env("CATAN_SEED"),
        }
    }

    /// Number of seats; the game starts once they are filled. Clamped to 1..=4.
    pub fn with_max_players(mut self, value: usize) -> Self {
        self.max_players = value.clamp(1, 4);
        self
    }

    pub fn with_max_points(mut self, value: u32) -> Self {
        self.max_points = value;
        self
    }

    pub fn with_turn_timeout(mut self, value: Duration) -> Self {
        self.turn_timeout = value;
        self
    }

    pub fn with_game_timeout(mut self, value: Duration) -> Self {
        self.game_timeout = value;
        self
    }

    pub fn with_max_rounds(mut self, value: u32) -> Self {
        self.max_rounds = value;
        self
    }

    pub fn with_kick_after_timeouts(mut self, value: u32) -> Self {
        self.kick_after_timeouts = value.max(1);
        self
    }

    /// Seed dice and steals for reproducible games
    pub fn with_seed(mut self, value: u64) -> Self {
        self.seed = Some(value);
        self
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn max_points(&self) -> u32 {
        self.max_points
    }

    pub fn turn_timeout(&self) -> Duration {
        self.turn_timeout
    }

    pub fn game_timeout(&self) -> Duration {
        self.game_timeout
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn kick_after_timeouts(&self) -> u32 {
        self.kick_after_timeouts
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::new();
        assert_eq!(config.max_players(), 4);
        assert_eq!(config.max_points(), 10);
        assert_eq!(config.turn_timeout(), Duration::from_secs(240));
        assert_eq!(config.game_timeout(), Duration::from_secs(1800));
        assert_eq!(config.max_rounds(), 2000);
        assert_eq!(config.kick_after_timeouts(), 3);
        assert_eq!(config.seed(), None);
    }

    #[test]
    fn test_builders_clamp() {
        let config = GameConfig::new()
            .with_max_players(9)
            .with_kick_after_timeouts(0)
            .with_seed(4);
        assert_eq!(config.max_players(), 4);
        assert_eq!(config.kick_after_timeouts(), 1);
        assert_eq!(config.seed(), Some(4));
    }
}
