//! Game observers and the serializable event stream.
//!
//! This module contains:
//! - `GameObserver`, a push interface with no-op defaults
//! - `GameEvent`, one variant per observer method, with `dispatch` to replay it
//! - `EventLog`, an observer that records every event
//! - `BoardObserver`, which keeps a shadow board from placement events
//!
//! Observers only ever see successful state changes. They are called with
//! no engine locks held.

use crate::board::{Board, BoardLayout, BoardPlacements};
use crate::coord::{EdgeCoordinate, HexCoordinate, NodeCoordinate};
use crate::player::PlayerRef;
use crate::resource::Resource;
use crate::turn::TurnKind;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Receives game notifications
#[allow(unused_variables)]
pub trait GameObserver: Send + Sync {
    fn player_joined(&self, player: &PlayerRef) {}

    fn game_start(&self, layout: &BoardLayout, players: &[PlayerRef]) {}

    fn get_turn(&self, player: &PlayerRef, kind: TurnKind) {}

    fn player_rolled(&self, player: &PlayerRef, roll: (u8, u8)) {}

    fn player_received_cards(&self, player: &PlayerRef, cards: &[Resource]) {}

    fn player_stole_card(&self, thief: &PlayerRef, victim: &PlayerRef, resource: Resource) {}

    fn player_moved_bandit(&self, player: &PlayerRef, from: HexCoordinate, to: HexCoordinate) {}

    fn placed_road(&self, player: &PlayerRef, edge: EdgeCoordinate) {}

    fn placed_settlement(&self, player: &PlayerRef, node: NodeCoordinate) {}

    fn placed_city(&self, player: &PlayerRef, node: NodeCoordinate) {}

    fn player_has_longest_road(&self, player: Option<&PlayerRef>) {}

    fn player_has_largest_army(&self, player: Option<&PlayerRef>) {}

    fn game_end(&self, winner: Option<&PlayerRef>, scores: &[(PlayerRef, u32)]) {}
}

/// A recorded observer notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum GameEvent {
    PlayerJoined { player: PlayerRef },
    GameStart { layout: BoardLayout, players: Vec<PlayerRef> },
    GetTurn { player: PlayerRef, kind: TurnKind },
    PlayerRolled { player: PlayerRef, roll: (u8, u8) },
    PlayerReceivedCards { player: PlayerRef, cards: Vec<Resource> },
    PlayerStoleCard { thief: PlayerRef, victim: PlayerRef, resource: Resource },
    PlayerMovedBandit { player: PlayerRef, from: HexCoordinate, to: HexCoordinate },
    PlacedRoad { player: PlayerRef, edge: EdgeCoordinate },
    PlacedSettlement { player: PlayerRef, node: NodeCoordinate },
    PlacedCity { player: PlayerRef, node: NodeCoordinate },
    LongestRoad { player: Option<PlayerRef> },
    LargestArmy { player: Option<PlayerRef> },
    GameEnd { winner: Option<PlayerRef>, scores: Vec<(PlayerRef, u32)> },
}

impl GameEvent {
    /// Deliver this event to an observer
    pub fn dispatch(&self, observer: &dyn GameObserver) {
        match self {
            GameEvent::PlayerJoined { player } => observer.player_joined(player),
            GameEvent::GameStart { layout, players } => observer.game_start(layout, players),
            GameEvent::GetTurn { player, kind } => observer.get_turn(player, *kind),
            GameEvent::PlayerRolled { player, roll } => observer.player_rolled(player, *roll),
            GameEvent::PlayerReceivedCards { player, cards } => {
                observer.player_received_cards(player, cards)
            }
            GameEvent::PlayerStoleCard {
                thief,
                victim,
                resource,
            } => observer.player_stole_card(thief, victim, *resource),
            GameEvent::PlayerMovedBandit { player, from, to } => {
                observer.player_moved_bandit(player, *from, *to)
            }
            GameEvent::PlacedRoad { player, edge } => observer.placed_road(player, *edge),
            GameEvent::PlacedSettlement { player, node } => observer.placed_settlement(player, *node),
            GameEvent::PlacedCity { player, node } => observer.placed_city(player, *node),
            GameEvent::LongestRoad { player } => observer.player_has_longest_road(player.as_ref()),
            GameEvent::LargestArmy { player } => observer.player_has_largest_army(player.as_ref()),
            GameEvent::GameEnd { winner, scores } => observer.game_end(winner.as_ref(), scores),
        }
    }
}

// ==================== Event Log ====================

/// Records every notification in order
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<GameEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&*self.events.lock())
    }

    pub fn from_json(json: &str) -> Result<Vec<GameEvent>, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn push(&self, event: GameEvent) {
        self.events.lock().push(event);
    }
}

impl GameObserver for EventLog {
    fn player_joined(&self, player: &PlayerRef) {
        self.push(GameEvent::PlayerJoined {
            player: player.clone(),
        });
    }

    fn game_start(&self, layout: &BoardLayout, players: &[PlayerRef]) {
        self.push(GameEvent::GameStart {
            layout: layout.clone(),
            players: players.to_vec(),
        });
    }

    fn get_turn(&self, player: &PlayerRef, kind: TurnKind) {
        self.push(GameEvent::GetTurn {
            player: player.clone(),
            kind,
        });
    }

    fn player_rolled(&self, player: &PlayerRef, roll: (u8, u8)) {
        self.push(GameEvent::PlayerRolled {
            player: player.clone(),
            roll,
        });
    }

    fn player_received_cards(&self, player: &PlayerRef, cards: &[Resource]) {
        self.push(GameEvent::PlayerReceivedCards {
            player: player.clone(),
            cards: cards.to_vec(),
        });
    }

    fn player_stole_card(&self, thief: &PlayerRef, victim: &PlayerRef, resource: Resource) {
        self.push(GameEvent::PlayerStoleCard {
            thief: thief.clone(),
            victim: victim.clone(),
            resource,
        });
    }

    fn player_moved_bandit(&self, player: &PlayerRef, from: HexCoordinate, to: HexCoordinate) {
        self.push(GameEvent::PlayerMovedBandit {
            player: player.clone(),
            from,
            to,
        });
    }

    fn placed_road(&self, player: &PlayerRef, edge: EdgeCoordinate) {
        self.push(GameEvent::PlacedRoad {
            player: player.clone(),
            edge,
        });
    }

    fn placed_settlement(&self, player: &PlayerRef, node: NodeCoordinate) {
        self.push(GameEvent::PlacedSettlement {
            player: player.clone(),
            node,
        });
    }

    fn placed_city(&self, player: &PlayerRef, node: NodeCoordinate) {
        self.push(GameEvent::PlacedCity {
            player: player.clone(),
            node,
        });
    }

    fn player_has_longest_road(&self, player: Option<&PlayerRef>) {
        self.push(GameEvent::LongestRoad {
            player: player.cloned(),
        });
    }

    fn player_has_largest_army(&self, player: Option<&PlayerRef>) {
        self.push(GameEvent::LargestArmy {
            player: player.cloned(),
        });
    }

    fn game_end(&self, winner: Option<&PlayerRef>, scores: &[(PlayerRef, u32)]) {
        self.push(GameEvent::GameEnd {
            winner: winner.cloned(),
            scores: scores.to_vec(),
        });
    }
}

// ==================== Board Observer ====================

/// Shadow board rebuilt purely from notifications
#[derive(Debug, Default)]
pub struct BoardObserver {
    board: Mutex<Option<Board>>,
}

impl BoardObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a shadow board from a recorded stream
    pub fn replay(events: &[GameEvent]) -> Self {
        let observer = Self::new();
        for event in events {
            event.dispatch(&observer);
        }
        observer
    }

    /// Copy of the shadow board, once the game has started
    pub fn board(&self) -> Option<Board> {
        self.board.lock().clone()
    }

    pub fn placements(&self) -> Option<BoardPlacements> {
        self.board.lock().as_ref().map(Board::placements)
    }

    fn apply<F>(&self, what: &str, f: F)
    where
        F: FnOnce(&mut Board) -> Result<(), crate::error::GameError>,
    {
        let mut guard = self.board.lock();
        let Some(board) = guard.as_mut() else {
            warn!("Shadow board ignored {} before game start", what);
            return;
        };
        if let Err(err) = f(board) {
            warn!("Shadow board could not apply {}: {}", what, err);
        }
    }
}

impl GameObserver for BoardObserver {
    fn game_start(&self, layout: &BoardLayout, _players: &[PlayerRef]) {
        match Board::from_layout(layout) {
            Ok(board) => *self.board.lock() = Some(board),
            Err(err) => warn!("Shadow board could not load layout: {}", err),
        }
    }

    fn player_moved_bandit(&self, _player: &PlayerRef, _from: HexCoordinate, to: HexCoordinate) {
        self.apply("bandit move", |board| board.set_bandit(to));
    }

    fn placed_road(&self, player: &PlayerRef, edge: EdgeCoordinate) {
        self.apply("road", |board| board.place_road(player.color, edge).map(|_| ()));
    }

    fn placed_settlement(&self, player: &PlayerRef, node: NodeCoordinate) {
        self.apply("settlement", |board| {
            board.place_settlement(player.color, node).map(|_| ())
        });
    }

    fn placed_city(&self, player: &PlayerRef, node: NodeCoordinate) {
        self.apply("city", |board| board.place_city(player.color, node).map(|_| ()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::{BoardPiece, Color};
    use pretty_assertions::assert_eq;

    fn red() -> PlayerRef {
        PlayerRef::new("red", Color::Red)
    }

    #[test]
    fn test_event_log_json_round_trip() {
        let log = EventLog::new();
        log.player_joined(&red());
        log.player_rolled(&red(), (3, 4));
        log.player_received_cards(&red(), &[Resource::Ore, Resource::Ore]);
        log.game_end(Some(&red()), &[(red(), 10)]);

        let json = log.to_json().unwrap();
        assert!(json.contains(r#""type":"PlayerRolled""#));
        assert_eq!(EventLog::from_json(&json).unwrap(), log.events());
    }

    #[test]
    fn test_board_observer_tracks_placements() {
        let board = Board::seeded(3).unwrap();
        let shadow = BoardObserver::new();
        shadow.placed_road(&red(), EdgeCoordinate::at(2, 2, 0).unwrap());
        assert!(shadow.board().is_none());

        shadow.game_start(&board.layout(), &[red()]);
        let node = NodeCoordinate::at(2, 2, 0).unwrap();
        shadow.placed_settlement(&red(), node);
        shadow.placed_road(&red(), EdgeCoordinate::at(2, 2, 0).unwrap());
        shadow.placed_city(&red(), node);

        let placements = shadow.placements().unwrap();
        assert_eq!(placements.roads.len(), 1);
        assert_eq!(placements.buildings.len(), 1);
        assert_eq!(placements.buildings[0].1, BoardPiece::City(Color::Red));
        assert_eq!(placements.bandit, board.bandit_location());
    }

    #[test]
    fn test_replay_applies_bandit_moves() {
        let board = Board::seeded(5).unwrap();
        let from = board.bandit_location().unwrap();
        let to = board
            .tiles()
            .map(|h| h.coord)
            .find(|c| *c != from)
            .unwrap();
        let events = vec![
            GameEvent::GameStart {
                layout: board.layout(),
                players: vec![red()],
            },
            GameEvent::PlayerMovedBandit {
                player: red(),
                from,
                to,
            },
        ];
        let shadow = BoardObserver::replay(&events);
        assert_eq!(shadow.placements().unwrap().bandit, Some(to));
    }
}
