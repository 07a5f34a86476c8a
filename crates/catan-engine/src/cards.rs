//! Development cards.

use serde::{Deserialize, Serialize};

/// Development card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DevelopmentCard {
    /// Move the bandit and steal, counts toward Largest Army
    Soldier,
    /// Place 2 roads for free
    RoadBuilding,
    /// All other players hand over every card of one resource
    ResourceMonopoly,
    /// Take any 2 resources from the bank
    YearOfPlenty,
    /// Worth 1 VP, counted at score time
    VictoryPoint,
}

impl DevelopmentCard {
    /// Create the standard development card deck (25 cards)
    pub fn standard_deck() -> Vec<DevelopmentCard> {
        let mut deck = Vec::with_capacity(25);

        // 14 Soldiers
        deck.extend(std::iter::repeat(DevelopmentCard::Soldier).take(14));

        // 5 Victory Points
        deck.extend(std::iter::repeat(DevelopmentCard::VictoryPoint).take(5));

        // 2 each of the rest
        deck.extend(std::iter::repeat(DevelopmentCard::RoadBuilding).take(2));
        deck.extend(std::iter::repeat(DevelopmentCard::YearOfPlenty).take(2));
        deck.extend(std::iter::repeat(DevelopmentCard::ResourceMonopoly).take(2));

        deck
    }
}

/// A development card held by a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedCard {
    pub card: DevelopmentCard,
    pub played: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_card_deck_composition() {
        let deck = DevelopmentCard::standard_deck();
        assert_eq!(deck.len(), 25);

        let count = |kind| deck.iter().filter(|c| **c == kind).count();
        assert_eq!(count(DevelopmentCard::Soldier), 14);
        assert_eq!(count(DevelopmentCard::VictoryPoint), 5);
        assert_eq!(count(DevelopmentCard::RoadBuilding), 2);
        assert_eq!(count(DevelopmentCard::YearOfPlenty), 2);
        assert_eq!(count(DevelopmentCard::ResourceMonopoly), 2);
    }
}
