//! Game coordinator: seats, the shared table, and the game loop.
//!
//! This module contains:
//! - `Admin`, the public handle used to register players and run a game
//! - `Table`, the state shared between the admin and every `Turn`
//! - The game loop: snake-order setup, rounds, stalemate and timeouts
//!
//! # Locking
//!
//! The live board sits behind one `parking_lot::Mutex` on the table. Every
//! board mutation happens while holding it, and locks are always taken in
//! this order:
//!
//! 1. board
//! 2. turn
//! 3. seats (read)
//! 4. hands; holding several is only allowed under the board lock
//! 5. awards, winner, rng (leaf locks)
//!
//! No lock is held while calling into a `Player` or a `GameObserver`.
//! `Turn::force_done` takes the board lock before the turn lock, so a
//! worker that outlives its timeout can never mutate the board afterwards.

use crate::board::Board;
use crate::config::GameConfig;
use crate::dice::{Dice, RandomDice};
use crate::error::GameError;
use crate::observer::{GameEvent, GameObserver};
use crate::pieces::Color;
use crate::player::{Hand, Player, PlayerRef};
use crate::turn::{Turn, TurnKind};
use crate::worker::WorkerPool;
use parking_lot::{Mutex, RwLock};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    Waiting,
    Running,
    Finished,
    Stalemate,
    /// Stopped by a broken invariant or by `Admin::shutdown`
    Aborted,
}

impl GameState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GameState::Finished | GameState::Stalemate | GameState::Aborted
        )
    }
}

/// Current holders of the bonus cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Awards {
    pub(crate) longest_road: Option<Color>,
    pub(crate) largest_army: Option<Color>,
}

/// Largest army: a unique maximum of at least 3 played soldiers.
/// A tie at the top leaves the award unassigned, even for its last holder.
pub(crate) fn largest_army(soldiers: &[(Color, u32)]) -> Option<Color> {
    let max = soldiers.iter().map(|(_, n)| *n).max().unwrap_or(0);
    if max < 3 {
        return None;
    }
    let leaders: Vec<Color> = soldiers
        .iter()
        .filter(|(_, n)| *n == max)
        .map(|(c, _)| *c)
        .collect();
    match leaders.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

// ==================== Seats ====================

/// A registered player and the hand the engine keeps for them
pub(crate) struct Seat {
    pub(crate) index: usize,
    pub(crate) reference: PlayerRef,
    pub(crate) player: Arc<dyn Player>,
    pub(crate) hand: Mutex<Hand>,
    kicked: AtomicBool,
    timeouts: AtomicU32,
}

impl Seat {
    pub(crate) fn color(&self) -> Color {
        self.reference.color
    }

    pub(crate) fn is_kicked(&self) -> bool {
        self.kicked.load(Ordering::SeqCst)
    }

    fn kick(&self, reason: &str) {
        if !self.kicked.swap(true, Ordering::SeqCst) {
            warn!("Player {} kicked out: {}", self.reference.name, reason);
        }
    }
}

/// Lock two different hands in seat order, returning them as `(a, b)`
pub(crate) fn lock_pair<'a>(
    a: &'a Seat,
    b: &'a Seat,
) -> (
    parking_lot::MutexGuard<'a, Hand>,
    parking_lot::MutexGuard<'a, Hand>,
) {
    if a.index < b.index {
        let first = a.hand.lock();
        (first, b.hand.lock())
    } else {
        let first = b.hand.lock();
        (a.hand.lock(), first)
    }
}

// ==================== Table ====================

/// State shared by the admin, the game loop and every turn
pub(crate) struct Table {
    pub(crate) config: GameConfig,
    pub(crate) state: watch::Sender<GameState>,
    pub(crate) board: Mutex<Board>,
    seats: RwLock<Vec<Arc<Seat>>>,
    observers: RwLock<Vec<Arc<dyn GameObserver>>>,
    pub(crate) dice: Box<dyn Dice>,
    pub(crate) rng: Mutex<ChaCha8Rng>,
    awards: Mutex<Awards>,
    winner: Mutex<Option<PlayerRef>>,
    corrupted: AtomicBool,
    ended: AtomicBool,
    current_turn: Mutex<Option<Arc<Turn>>>,
}

impl Table {
    pub(crate) fn new(board: Board, config: GameConfig, dice: Box<dyn Dice>) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
            None => ChaCha8Rng::from_entropy(),
        };
        let (state, _) = watch::channel(GameState::Waiting);
        Self {
            config,
            state,
            board: Mutex::new(board),
            seats: RwLock::new(Vec::new()),
            observers: RwLock::new(Vec::new()),
            dice,
            rng: Mutex::new(rng),
            awards: Mutex::new(Awards::default()),
            winner: Mutex::new(None),
            corrupted: AtomicBool::new(false),
            ended: AtomicBool::new(false),
            current_turn: Mutex::new(None),
        }
    }

    pub(crate) fn game_state(&self) -> GameState {
        *self.state.borrow()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.game_state() == GameState::Running
    }

    pub(crate) fn seats(&self) -> Vec<Arc<Seat>> {
        self.seats.read().clone()
    }

    pub(crate) fn seat_of(&self, player: &PlayerRef) -> Option<Arc<Seat>> {
        self.seats
            .read()
            .iter()
            .find(|s| s.reference == *player)
            .cloned()
    }

    pub(crate) fn seat_by_color(&self, color: Color) -> Option<Arc<Seat>> {
        self.seats.read().iter().find(|s| s.color() == color).cloned()
    }

    /// Seat a new player, honouring the preferred color when it is free
    pub(crate) fn add_seat(
        &self,
        player: Arc<dyn Player>,
        name: &str,
        preferred: Option<Color>,
    ) -> Result<Arc<Seat>, GameError> {
        let mut seats = self.seats.write();
        if self.game_state() != GameState::Waiting || seats.len() >= self.config.max_players {
            return Err(GameError::AlreadyStarted);
        }
        let free: Vec<Color> = Color::ALL
            .into_iter()
            .filter(|c| seats.iter().all(|s| s.color() != *c))
            .collect();
        let color = match preferred.filter(|c| free.contains(c)) {
            Some(color) => color,
            None => *free
                .choose(&mut *self.rng.lock())
                .ok_or(GameError::AlreadyStarted)?,
        };
        let seat = Arc::new(Seat {
            index: seats.len(),
            reference: PlayerRef::new(name, color),
            player,
            hand: Mutex::new(Hand::new()),
            kicked: AtomicBool::new(false),
            timeouts: AtomicU32::new(0),
        });
        seats.push(seat.clone());
        Ok(seat)
    }

    pub(crate) fn add_observer(&self, observer: Arc<dyn GameObserver>) {
        self.observers.write().push(observer);
    }

    /// Deliver events to every observer; call with no locks held
    pub(crate) fn notify(&self, events: &[GameEvent]) {
        if events.is_empty() {
            return;
        }
        let observers = self.observers.read().clone();
        for event in events {
            for observer in &observers {
                event.dispatch(observer.as_ref());
            }
        }
    }

    /// Move to a terminal state unless already there
    pub(crate) fn finish(&self, next: GameState) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_terminal() {
                false
            } else {
                *state = next;
                true
            }
        })
    }

    pub(crate) fn mark_corrupted(&self, err: &GameError) {
        self.corrupted.store(true, Ordering::SeqCst);
        error!("Game corrupted, aborting: {}", err);
        self.finish(GameState::Aborted);
    }

    pub(crate) fn is_corrupted(&self) -> bool {
        self.corrupted.load(Ordering::SeqCst)
    }

    pub(crate) fn winner(&self) -> Option<PlayerRef> {
        self.winner.lock().clone()
    }

    fn score(&self, seat: &Seat, board: &Board, awards: &Awards) -> u32 {
        let color = seat.color();
        let mut score = board.points(color) + seat.hand.lock().victory_points();
        if awards.longest_road == Some(color) {
            score += 2;
        }
        if awards.largest_army == Some(color) {
            score += 2;
        }
        score
    }

    pub(crate) fn scores(&self, board: &Board) -> Vec<(PlayerRef, u32)> {
        let awards = *self.awards.lock();
        self.seats()
            .iter()
            .map(|s| (s.reference.clone(), self.score(s, board, &awards)))
            .collect()
    }

    /// Refresh award holders and look for a winner, acting seat first.
    ///
    /// Call with the board locked and no hand locked.
    pub(crate) fn update_standings(
        &self,
        actor: Option<&Seat>,
        board: &Board,
        events: &mut Vec<GameEvent>,
    ) {
        let seats = self.seats();
        let reference = |color: Color| {
            seats
                .iter()
                .find(|s| s.color() == color)
                .map(|s| s.reference.clone())
        };

        let road = board.longest_road_holder();
        let soldiers: Vec<(Color, u32)> = seats
            .iter()
            .map(|s| (s.color(), s.hand.lock().soldiers_played()))
            .collect();

        let awards = {
            let mut awards = self.awards.lock();
            if awards.longest_road != road {
                awards.longest_road = road;
                events.push(GameEvent::LongestRoad {
                    player: road.and_then(reference),
                });
            }
            let army = largest_army(&soldiers);
            if awards.largest_army != army {
                awards.largest_army = army;
                events.push(GameEvent::LargestArmy {
                    player: army.and_then(reference),
                });
            }
            *awards
        };

        if !self.is_running() || self.winner.lock().is_some() {
            return;
        }
        let mut order: Vec<&Seat> = actor.into_iter().collect();
        order.extend(
            seats
                .iter()
                .map(|s| s.as_ref())
                .filter(|s| actor.map_or(true, |a| a.index != s.index)),
        );
        for seat in order {
            let score = self.score(seat, board, &awards);
            if score >= self.config.max_points {
                *self.winner.lock() = Some(seat.reference.clone());
                self.finish(GameState::Finished);
                info!("Player {} wins with {} points", seat.reference.name, score);
                return;
            }
        }
    }

    /// Standings check at the top of a round; returns whether someone has won
    fn check_winner(&self) -> bool {
        let mut events = Vec::new();
        {
            let board = self.board.lock();
            self.update_standings(None, &board, &mut events);
        }
        self.notify(&events);
        self.winner().is_some()
    }

    fn force_current_turn_done(&self) {
        let turn = self.current_turn.lock().clone();
        if let Some(turn) = turn {
            turn.force_done();
        }
    }

    /// Broadcast the final scores once
    fn announce_end(&self) {
        if self.ended.swap(true, Ordering::SeqCst) {
            return;
        }
        let scores = self.scores(&self.board.lock());
        let winner = self.winner();
        info!(
            "Game over ({:?}), winner: {}",
            self.game_state(),
            winner.as_ref().map_or("none", |w| w.name.as_str())
        );
        self.notify(&[GameEvent::GameEnd { winner, scores }]);
    }
}

// ==================== Game Loop ====================

async fn run_game(table: Arc<Table>) {
    let limit = table.config.game_timeout;
    if tokio::time::timeout(limit, play(&table)).await.is_err() {
        warn!("Game timed out after {:?}", limit);
        table.finish(GameState::Stalemate);
        table.force_current_turn_done();
    }
    // A loop that stopped without a verdict counts as a stalemate
    table.finish(GameState::Stalemate);
    table.announce_end();
}

async fn play(table: &Arc<Table>) {
    let seats = table.seats();

    for seat in seats.iter().chain(seats.iter().rev()) {
        if !table.is_running() {
            return;
        }
        if !seat.is_kicked() {
            give_turn(table, seat, TurnKind::Setup).await;
        }
    }

    let mut round: u32 = 0;
    loop {
        if !table.is_running() || table.check_winner() {
            return;
        }
        round += 1;
        if round > table.config.max_rounds {
            info!("Stalemate after {} rounds", table.config.max_rounds);
            table.finish(GameState::Stalemate);
            return;
        }
        debug!("Starting round {}", round);

        for seat in &seats {
            if !table.is_running() || table.winner().is_some() {
                break;
            }
            if !seat.is_kicked() {
                give_turn(table, seat, TurnKind::Normal).await;
            }
        }

        if table.is_corrupted() {
            table.finish(GameState::Aborted);
            return;
        }
        if !table.is_running() {
            return;
        }
        if seats.iter().all(|s| s.is_kicked()) {
            info!("Stalemate: every player was kicked out");
            table.finish(GameState::Stalemate);
            return;
        }
        let stuck = {
            let board = table.board.lock();
            seats
                .iter()
                .filter(|s| !s.is_kicked())
                .all(|s| !board.can_build(s.color()))
        };
        if stuck {
            info!("Stalemate: no player can build after round {}", round);
            table.finish(GameState::Stalemate);
            return;
        }
    }
}

/// Run one turn on a worker thread under the turn timeout
async fn give_turn(table: &Arc<Table>, seat: &Arc<Seat>, kind: TurnKind) {
    let turn = Arc::new(Turn::new(table.clone(), seat.clone(), kind));
    turn.activate();
    *table.current_turn.lock() = Some(turn.clone());
    table.notify(&[GameEvent::GetTurn {
        player: seat.reference.clone(),
        kind,
    }]);

    let player = seat.player.clone();
    let worker_turn = turn.clone();
    let task = tokio::task::spawn_blocking(move || player.take_turn(&worker_turn));
    let name = &seat.reference.name;

    match tokio::time::timeout(table.config.turn_timeout, task).await {
        Ok(Ok(Ok(()))) => {
            seat.timeouts.store(0, Ordering::SeqCst);
        }
        Ok(Ok(Err(err))) => {
            warn!("Player {} failed during turn: {:#}", name, err);
            seat.kick("turn returned an error");
        }
        Ok(Err(join_err)) => {
            error!("Player {} turn worker died: {}", name, join_err);
            seat.kick("turn panicked");
        }
        Err(_) => {
            let count = seat.timeouts.fetch_add(1, Ordering::SeqCst) + 1;
            warn!(
                "Player {} timed out ({}/{})",
                name, count, table.config.kick_after_timeouts
            );
            if count >= table.config.kick_after_timeouts {
                seat.kick("too many timeouts");
            }
        }
    }

    turn.force_done();
    *table.current_turn.lock() = None;
}

// ==================== Admin ====================

/// Coordinates one game on a shared worker pool
pub struct Admin {
    table: Arc<Table>,
    handle: Handle,
    game: Mutex<Option<JoinHandle<()>>>,
}

impl Admin {
    /// Create a game on `board`, rolling dice seeded from the config
    pub fn new(board: Board, config: GameConfig, pool: &WorkerPool) -> Result<Self, GameError> {
        let dice: Box<dyn Dice> = match config.seed {
            Some(seed) => Box::new(RandomDice::new(seed)),
            None => Box::new(RandomDice::from_entropy()),
        };
        Self::build(board, config, pool, dice)
    }

    /// Create a game with an injected dice roller
    pub fn with_dice(
        board: Board,
        config: GameConfig,
        pool: &WorkerPool,
        dice: impl Dice + 'static,
    ) -> Result<Self, GameError> {
        Self::build(board, config, pool, Box::new(dice))
    }

    fn build(
        board: Board,
        config: GameConfig,
        pool: &WorkerPool,
        dice: Box<dyn Dice>,
    ) -> Result<Self, GameError> {
        Ok(Self {
            table: Arc::new(Table::new(board, config, dice)),
            handle: pool.handle()?,
            game: Mutex::new(None),
        })
    }

    pub fn add_observer(&self, observer: Arc<dyn GameObserver>) {
        self.table.add_observer(observer);
    }

    /// Seat a player; the game starts once every seat is taken
    pub fn register(
        &self,
        player: Arc<dyn Player>,
        name: &str,
        preferred: Option<Color>,
    ) -> Result<PlayerRef, GameError> {
        let seat = self.table.add_seat(player, name, preferred)?;
        info!("Player {} joined as {:?}", name, seat.color());
        self.table.notify(&[GameEvent::PlayerJoined {
            player: seat.reference.clone(),
        }]);
        if self.table.seats.read().len() >= self.table.config.max_players {
            self.start()?;
        }
        Ok(seat.reference.clone())
    }

    /// Start the game loop with whoever has registered
    pub fn start(&self) -> Result<(), GameError> {
        let players = self.players();
        if players.is_empty() {
            return Err(GameError::NoPlayers);
        }
        let started = self.table.state.send_if_modified(|state| {
            if *state == GameState::Waiting {
                *state = GameState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            return Err(GameError::AlreadyStarted);
        }

        info!("Game started with {} players", players.len());
        let layout = self.table.board.lock().layout();
        self.table
            .notify(&[GameEvent::GameStart { layout, players }]);
        let join = self.handle.spawn(run_game(self.table.clone()));
        *self.game.lock() = Some(join);
        Ok(())
    }

    /// Block until the game loop has ended.
    ///
    /// Must not be called from inside the worker pool's runtime.
    pub fn wait(&self) -> GameState {
        let join = self.game.lock().take();
        if let Some(join) = join {
            if let Err(err) = self.handle.block_on(join) {
                if err.is_panic() {
                    error!("Game loop panicked: {}", err);
                    self.table.finish(GameState::Aborted);
                }
            }
        }
        self.state()
    }

    /// Stop the game and finish the live turn
    pub fn shutdown(&self) {
        if self.table.finish(GameState::Aborted) {
            info!("Game shut down");
        }
        self.table.force_current_turn_done();
        if let Some(join) = self.game.lock().take() {
            join.abort();
            self.table.announce_end();
        }
    }

    pub fn state(&self) -> GameState {
        self.table.game_state()
    }

    /// Receiver that sees every state change
    pub fn subscribe(&self) -> watch::Receiver<GameState> {
        self.table.state.subscribe()
    }

    pub fn winner(&self) -> Option<PlayerRef> {
        self.table.winner()
    }

    pub fn scores(&self) -> Vec<(PlayerRef, u32)> {
        let board = self.table.board.lock();
        self.table.scores(&board)
    }

    pub fn kicked_out(&self) -> Vec<PlayerRef> {
        self.table
            .seats()
            .iter()
            .filter(|s| s.is_kicked())
            .map(|s| s.reference.clone())
            .collect()
    }

    pub fn players(&self) -> Vec<PlayerRef> {
        self.table
            .seats()
            .iter()
            .map(|s| s.reference.clone())
            .collect()
    }

    /// Copy of the live board
    pub fn board(&self) -> Board {
        self.table.board.lock().clone()
    }

    /// Copy of a player's hand
    pub fn hand(&self, player: &PlayerRef) -> Option<Hand> {
        self.table.seat_of(player).map(|s| s.hand.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::RandomPlayer;
    use crate::coord::HexCoordinate;
    use crate::observer::EventLog;
    use crate::player::SelectReason;
    use crate::resource::Resource;
    use std::time::Duration;

    struct Idle;

    impl Player for Idle {
        fn take_turn(&self, _turn: &Turn) -> anyhow::Result<()> {
            Ok(())
        }

        fn move_bandit(&self, _board: &Board, current: HexCoordinate) -> HexCoordinate {
            current
        }

        fn select_resource_cards(
            &self,
            cards: &[Resource],
            count: usize,
            _reason: SelectReason,
        ) -> Vec<Resource> {
            cards.iter().take(count).copied().collect()
        }

        fn select_player(&self, candidates: &[PlayerRef], _reason: SelectReason) -> PlayerRef {
            candidates[0].clone()
        }
    }

    #[test]
    fn test_largest_army() {
        use Color::*;
        assert_eq!(largest_army(&[(Red, 2), (Blue, 1)]), None);
        assert_eq!(largest_army(&[(Red, 3), (Blue, 1)]), Some(Red));
        assert_eq!(largest_army(&[(Red, 3), (Blue, 3)]), None);
        assert_eq!(largest_army(&[(Red, 3), (Blue, 4)]), Some(Blue));
        assert_eq!(largest_army(&[(Red, 4), (Blue, 4), (White, 2)]), None);
    }

    #[test]
    fn test_register_assigns_colors() {
        let pool = WorkerPool::new(2).unwrap();
        let config = GameConfig::new().with_max_players(3).with_seed(1);
        let admin = Admin::new(Board::seeded(1).unwrap(), config, &pool).unwrap();

        let a = admin.register(Arc::new(Idle), "a", Some(Color::Blue)).unwrap();
        let b = admin.register(Arc::new(Idle), "b", Some(Color::Blue)).unwrap();
        assert_eq!(a.color, Color::Blue);
        assert_ne!(b.color, Color::Blue);
        assert_eq!(admin.state(), GameState::Waiting);
        admin.shutdown();
    }

    #[test]
    fn test_register_after_start_is_rejected() {
        let pool = WorkerPool::new(2).unwrap();
        let config = GameConfig::new().with_max_players(1).with_max_rounds(1);
        let admin = Admin::new(Board::seeded(2).unwrap(), config, &pool).unwrap();
        admin.register(Arc::new(Idle), "solo", None).unwrap();
        assert!(matches!(
            admin.register(Arc::new(Idle), "late", None),
            Err(GameError::AlreadyStarted)
        ));
        assert!(admin.wait().is_terminal());
    }

    #[test]
    fn test_start_needs_players() {
        let pool = WorkerPool::new(2).unwrap();
        let admin = Admin::new(Board::seeded(2).unwrap(), GameConfig::new(), &pool).unwrap();
        assert!(matches!(admin.start(), Err(GameError::NoPlayers)));
    }

    #[test]
    fn test_idle_players_reach_stalemate() {
        let pool = WorkerPool::new(4).unwrap();
        let config = GameConfig::new()
            .with_max_players(2)
            .with_turn_timeout(Duration::from_secs(5));
        let admin = Admin::new(Board::seeded(4).unwrap(), config, &pool).unwrap();
        admin.register(Arc::new(Idle), "a", None).unwrap();
        admin.register(Arc::new(Idle), "b", None).unwrap();

        // Nobody placed anything during setup, so nobody can build
        assert_eq!(admin.wait(), GameState::Stalemate);
        assert!(admin.winner().is_none());
        assert!(admin.kicked_out().is_empty());
        pool.shutdown(Duration::from_secs(1));
    }

    /// Plays a normal setup, then hangs on every later turn
    struct SettlesThenHangs(RandomPlayer);

    impl Player for SettlesThenHangs {
        fn take_turn(&self, turn: &Turn) -> anyhow::Result<()> {
            match turn.kind() {
                TurnKind::Setup => self.0.take_turn(turn),
                TurnKind::Normal => {
                    std::thread::sleep(Duration::from_millis(400));
                    Ok(())
                }
            }
        }

        fn move_bandit(&self, board: &Board, current: HexCoordinate) -> HexCoordinate {
            self.0.move_bandit(board, current)
        }

        fn select_resource_cards(
            &self,
            cards: &[Resource],
            count: usize,
            reason: SelectReason,
        ) -> Vec<Resource> {
            self.0.select_resource_cards(cards, count, reason)
        }

        fn select_player(&self, candidates: &[PlayerRef], reason: SelectReason) -> PlayerRef {
            self.0.select_player(candidates, reason)
        }
    }

    #[test]
    fn test_kicked_builder_does_not_keep_game_alive() {
        let pool = WorkerPool::new(4).unwrap();
        let config = GameConfig::new()
            .with_max_players(2)
            .with_max_rounds(50)
            .with_kick_after_timeouts(1)
            .with_turn_timeout(Duration::from_millis(100))
            .with_seed(6);
        let admin = Admin::new(Board::seeded(6).unwrap(), config, &pool).unwrap();
        let log = Arc::new(EventLog::new());
        admin.add_observer(log.clone());
        let builder = admin
            .register(Arc::new(SettlesThenHangs(RandomPlayer::with_seed(6))), "builder", None)
            .unwrap();
        admin.register(Arc::new(Idle), "idle", None).unwrap();

        assert_eq!(admin.wait(), GameState::Stalemate);
        assert_eq!(admin.kicked_out(), vec![builder.clone()]);
        assert!(admin.board().can_build(builder.color));

        // Only the idle seat is left and it has nothing on the board
        let normal_turns = log
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::GetTurn { kind: TurnKind::Normal, .. }))
            .count();
        assert_eq!(normal_turns, 2);
        pool.shutdown(Duration::from_secs(1));
    }

    #[test]
    fn test_shutdown_aborts_waiting_game() {
        let pool = WorkerPool::new(2).unwrap();
        let admin = Admin::new(Board::seeded(2).unwrap(), GameConfig::new(), &pool).unwrap();
        admin.shutdown();
        assert_eq!(admin.state(), GameState::Aborted);
        assert!(matches!(
            admin.register(Arc::new(Idle), "late", None),
            Err(GameError::AlreadyStarted)
        ));
    }
}
