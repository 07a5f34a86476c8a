//! Arena for running many bot games on one shared worker pool.
//!
//! Games are kept in a registry keyed by game id until they are removed, so
//! a host can look up any running game while the others keep playing.

use catan_engine::{
    Admin, Board, EventLog, GameConfig, GameError, GameState, Player, PlayerRef, RandomPlayer,
    SinglePurchasePlayer, WorkerPool,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error(transparent)]
    Engine(#[from] GameError),

    #[error("Game {0} not found")]
    GameNotFound(Uuid),

    #[error("Game runner thread panicked")]
    RunnerPanicked,
}

/// Outcome of one finished game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: Uuid,
    pub state: GameState,
    pub winner: Option<PlayerRef>,
    pub scores: Vec<(PlayerRef, u32)>,
    pub kicked_out: Vec<PlayerRef>,
    pub events: usize,
}

/// A game in the registry with its event log
struct ArenaGame {
    admin: Arc<Admin>,
    log: Arc<EventLog>,
}

/// Registry of running games sharing one worker pool
pub struct Arena {
    pool: WorkerPool,
    config: GameConfig,
    games: DashMap<Uuid, ArenaGame>,
}

impl Arena {
    pub fn new(workers: usize, config: GameConfig) -> Result<Self, ArenaError> {
        Ok(Self {
            pool: WorkerPool::new(workers)?,
            config,
            games: DashMap::new(),
        })
    }

    /// Start a bot game; seats alternate between the two reference bots
    pub fn create_game(&self, seed: Option<u64>) -> Result<Uuid, ArenaError> {
        let id = Uuid::new_v4();
        let (board, config) = match seed {
            Some(seed) => (Board::seeded(seed)?, self.config.clone().with_seed(seed)),
            None => (Board::standard()?, self.config.clone()),
        };
        let seats = config.max_players();
        let admin = Arc::new(Admin::new(board, config, &self.pool)?);
        let log = Arc::new(EventLog::new());
        admin.add_observer(log.clone());

        // Registered before seating, since the last seat starts the game
        self.games.insert(
            id,
            ArenaGame {
                admin: admin.clone(),
                log,
            },
        );

        for seat in 0..seats {
            let bot_seed = seed.map(|s| s.wrapping_add(seat as u64 + 1));
            let (bot, name): (Arc<dyn Player>, String) = if seat % 2 == 0 {
                let bot = match bot_seed {
                    Some(s) => SinglePurchasePlayer::with_seed(s),
                    None => SinglePurchasePlayer::new(),
                };
                (Arc::new(bot) as Arc<dyn Player>, format!("planner-{seat}"))
            } else {
                let bot = match bot_seed {
                    Some(s) => RandomPlayer::with_seed(s),
                    None => RandomPlayer::new(),
                };
                (Arc::new(bot) as Arc<dyn Player>, format!("random-{seat}"))
            };
            admin.register(bot, &name, None)?;
        }
        info!("Game {} created with {} bots", id, seats);
        Ok(id)
    }

    pub fn game(&self, id: Uuid) -> Option<Arc<Admin>> {
        self.games.get(&id).map(|g| g.admin.clone())
    }

    pub fn game_ids(&self) -> Vec<Uuid> {
        self.games.iter().map(|g| *g.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Block until a game ends and summarize it.
    ///
    /// Must be called from outside the worker pool.
    pub fn wait(&self, id: Uuid) -> Result<GameSummary, ArenaError> {
        let (admin, log) = {
            let game = self.games.get(&id).ok_or(ArenaError::GameNotFound(id))?;
            (game.admin.clone(), game.log.clone())
        };
        let state = admin.wait();
        Ok(GameSummary {
            id,
            state,
            winner: admin.winner(),
            scores: admin.scores(),
            kicked_out: admin.kicked_out(),
            events: log.len(),
        })
    }

    /// Event log of a game as JSON
    pub fn events_json(&self, id: Uuid) -> Result<String, ArenaError> {
        let game = self.games.get(&id).ok_or(ArenaError::GameNotFound(id))?;
        game.log
            .to_json()
            .map_err(|err| ArenaError::Engine(GameError::Corrupted(err.to_string())))
    }

    /// Stop a game and drop it from the registry
    pub fn remove(&self, id: Uuid) -> Result<(), ArenaError> {
        let (_, game) = self.games.remove(&id).ok_or(ArenaError::GameNotFound(id))?;
        if !game.admin.state().is_terminal() {
            warn!("Game {} removed while still running", id);
            game.admin.shutdown();
        }
        Ok(())
    }

    /// Run `count` games side by side and collect their summaries
    pub fn run(&self, count: usize, base_seed: Option<u64>) -> Result<Vec<GameSummary>, ArenaError> {
        let ids = (0..count)
            .map(|i| self.create_game(base_seed.map(|s| s.wrapping_add(i as u64 * 1000))))
            .collect::<Result<Vec<_>, _>>()?;

        thread::scope(|scope| {
            let runners: Vec<_> = ids
                .iter()
                .map(|id| scope.spawn(move || self.wait(*id)))
                .collect();
            runners
                .into_iter()
                .map(|runner| runner.join().map_err(|_| ArenaError::RunnerPanicked)?)
                .collect()
        })
    }

    /// Shut down every game still running
    pub fn shutdown(&self) {
        for game in self.games.iter() {
            game.admin.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn config() -> GameConfig {
        GameConfig::new()
            .with_max_players(2)
            .with_max_rounds(30)
            .with_turn_timeout(Duration::from_secs(10))
    }

    #[test]
    fn test_run_collects_every_game() {
        let arena = Arena::new(4, config()).unwrap();
        let summaries = arena.run(2, Some(9)).unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(arena.len(), 2);
        for summary in &summaries {
            assert!(summary.state.is_terminal());
            assert_eq!(summary.scores.len(), 2);
            assert!(summary.events > 0);
            assert!(arena.game(summary.id).is_some());
        }
    }

    #[test]
    fn test_remove_unknown_game() {
        let arena = Arena::new(1, config()).unwrap();
        let id = Uuid::new_v4();
        assert!(matches!(arena.remove(id), Err(ArenaError::GameNotFound(_))));
        assert!(matches!(arena.wait(id), Err(ArenaError::GameNotFound(_))));
    }

    #[test]
    fn test_summary_serializes() {
        let arena = Arena::new(2, config()).unwrap();
        let id = arena.create_game(Some(4)).unwrap();
        let summary = arena.wait(id).unwrap();
        let json = serde_json::to_string(&summary).unwrap();
        let back: GameSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);

        let events = EventLog::from_json(&arena.events_json(id).unwrap()).unwrap();
        assert_eq!(events.len(), summary.events);
        arena.remove(id).unwrap();
        assert!(arena.is_empty());
    }
}
