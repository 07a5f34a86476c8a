//! Player contract and per-player state owned by the engine.
//!
//! This module contains:
//! - `PlayerRef`, the only player value that crosses a serialization boundary
//! - The `Player` trait implemented by bots and remote proxies
//! - `Hand`, the cards a seated player holds

use crate::board::Board;
use crate::cards::{DevelopmentCard, OwnedCard};
use crate::coord::HexCoordinate;
use crate::pieces::Color;
use crate::resource::{Resource, ResourceHand};
use crate::trade::Quote;
use crate::turn::Turn;
use serde::{Deserialize, Serialize};

/// Public identity of a seated player
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerRef {
    pub name: String,
    pub color: Color,
}

impl PlayerRef {
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// Why the engine is asking a player to choose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectReason {
    /// Discard half the hand after a 7
    Discard,
    /// Pick a victim after moving the bandit
    Steal,
}

/// Decision-making side of a seated player.
///
/// Every method runs on a worker thread with no engine locks held. The
/// engine validates everything it gets back.
pub trait Player: Send + Sync {
    /// Play one turn through the validated `Turn` methods
    fn take_turn(&self, turn: &Turn) -> anyhow::Result<()>;

    /// Offer trades to `asker`, written from the asker's side
    fn get_user_quotes(
        &self,
        _asker: &PlayerRef,
        _want: &[Resource],
        _give: &[Resource],
    ) -> Vec<Quote> {
        Vec::new()
    }

    /// Where to move the bandit; `board` is a copy
    fn move_bandit(&self, board: &Board, current: HexCoordinate) -> HexCoordinate;

    /// Pick `count` of `cards`
    fn select_resource_cards(
        &self,
        cards: &[Resource],
        count: usize,
        reason: SelectReason,
    ) -> Vec<Resource>;

    /// Pick one of `candidates`
    fn select_player(&self, candidates: &[PlayerRef], reason: SelectReason) -> PlayerRef;
}

/// Cards held by a seated player
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    pub resources: ResourceHand,
    pub development_cards: Vec<OwnedCard>,
    /// Roads still to place for free from Road Building
    pub free_roads: u32,
}

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of an unplayed card of this kind
    pub fn playable(&self, card: DevelopmentCard) -> Option<usize> {
        self.development_cards
            .iter()
            .position(|c| c.card == card && !c.played)
    }

    /// Mark an unplayed card of this kind as played
    pub fn mark_played(&mut self, card: DevelopmentCard) -> bool {
        match self.playable(card) {
            Some(idx) => {
                self.development_cards[idx].played = true;
                true
            }
            None => false,
        }
    }

    /// Soldiers played so far (for Largest Army)
    pub fn soldiers_played(&self) -> u32 {
        self.development_cards
            .iter()
            .filter(|c| c.card == DevelopmentCard::Soldier && c.played)
            .count() as u32
    }

    /// Victory point cards owned, played or not
    pub fn victory_points(&self) -> u32 {
        self.development_cards
            .iter()
            .filter(|c| c.card == DevelopmentCard::VictoryPoint)
            .count() as u32
    }

    /// Unplayed development cards
    pub fn unplayed(&self) -> Vec<DevelopmentCard> {
        self.development_cards
            .iter()
            .filter(|c| !c.played)
            .map(|c| c.card)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(card: DevelopmentCard, played: bool) -> OwnedCard {
        OwnedCard { card, played }
    }

    #[test]
    fn test_mark_played() {
        let mut hand = Hand::new();
        hand.development_cards.push(owned(DevelopmentCard::Soldier, true));
        assert!(!hand.mark_played(DevelopmentCard::Soldier));

        hand.development_cards.push(owned(DevelopmentCard::Soldier, false));
        assert!(hand.mark_played(DevelopmentCard::Soldier));
        assert_eq!(hand.soldiers_played(), 2);
        assert!(hand.unplayed().is_empty());
    }

    #[test]
    fn test_victory_points_count_played_and_unplayed() {
        let mut hand = Hand::new();
        hand.development_cards.push(owned(DevelopmentCard::VictoryPoint, false));
        hand.development_cards.push(owned(DevelopmentCard::VictoryPoint, true));
        hand.development_cards.push(owned(DevelopmentCard::YearOfPlenty, false));
        assert_eq!(hand.victory_points(), 2);
    }

    #[test]
    fn test_player_ref_serializes() {
        let player = PlayerRef::new("ada", Color::Orange);
        let json = serde_json::to_string(&player).unwrap();
        assert_eq!(json, r#"{"name":"ada","color":"Orange"}"#);
        let back: PlayerRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, player);
    }
}
