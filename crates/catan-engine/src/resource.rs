//! Resource types and resource hands.
//!
//! This module contains:
//! - The five `Resource` kinds produced by hexes
//! - `ResourceHand` for managing resource counts
//! - Building costs

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Resource produced by a hex
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Resource {
    Ore,
    Wood,
    Sheep,
    Brick,
    Wheat,
}

impl Resource {
    /// All resource types
    pub const ALL: [Resource; 5] = [
        Resource::Ore,
        Resource::Wood,
        Resource::Sheep,
        Resource::Brick,
        Resource::Wheat,
    ];
}

/// A hand of resources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHand {
    pub ore: u32,
    pub wood: u32,
    pub sheep: u32,
    pub brick: u32,
    pub wheat: u32,
}

impl ResourceHand {
    /// Create an empty hand
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts
    pub fn with_amounts(ore: u32, wood: u32, sheep: u32, brick: u32, wheat: u32) -> Self {
        Self {
            ore,
            wood,
            sheep,
            brick,
            wheat,
        }
    }

    /// Create a hand with a single resource
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    /// Count the given cards into a hand
    pub fn from_cards(cards: &[Resource]) -> Self {
        let mut hand = Self::new();
        for card in cards {
            hand.add(*card, 1);
        }
        hand
    }

    /// Total number of resource cards
    pub fn total(&self) -> u32 {
        self.ore + self.wood + self.sheep + self.brick + self.wheat
    }

    /// Check if hand is empty
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get count of a specific resource
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Ore => self.ore,
            Resource::Wood => self.wood,
            Resource::Sheep => self.sheep,
            Resource::Brick => self.brick,
            Resource::Wheat => self.wheat,
        }
    }

    /// Set count of a specific resource
    pub fn set(&mut self, resource: Resource, count: u32) {
        match resource {
            Resource::Ore => self.ore = count,
            Resource::Wood => self.wood = count,
            Resource::Sheep => self.sheep = count,
            Resource::Brick => self.brick = count,
            Resource::Wheat => self.wheat = count,
        }
    }

    /// Add resources to hand
    pub fn add(&mut self, resource: Resource, amount: u32) {
        let current = self.get(resource);
        self.set(resource, current + amount);
    }

    /// Add another hand to this one
    pub fn add_hand(&mut self, other: &ResourceHand) {
        for resource in Resource::ALL {
            self.add(resource, other.get(resource));
        }
    }

    /// Check if can afford a cost
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        Resource::ALL
            .iter()
            .all(|r| self.get(*r) >= cost.get(*r))
    }

    /// Try to subtract, returning false if insufficient
    pub fn try_subtract(&mut self, cost: &ResourceHand) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for resource in Resource::ALL {
            let current = self.get(resource);
            self.set(resource, current - cost.get(resource));
        }
        true
    }

    /// Remove every card of one kind, returning how many were taken
    pub fn take_all(&mut self, resource: Resource) -> u32 {
        let count = self.get(resource);
        self.set(resource, 0);
        count
    }

    /// The hand as a flat list of cards, in `Resource::ALL` order
    pub fn cards(&self) -> Vec<Resource> {
        let mut cards = Vec::with_capacity(self.total() as usize);
        for resource in Resource::ALL {
            cards.extend(std::iter::repeat(resource).take(self.get(resource) as usize));
        }
        cards
    }

    /// Remove a random resource (for bandit stealing)
    pub fn steal_random<R: Rng>(&mut self, rng: &mut R) -> Option<Resource> {
        let resource = *self.cards().choose(rng)?;
        self.try_subtract(&ResourceHand::single(resource, 1));
        Some(resource)
    }
}

/// Building costs
pub mod costs {
    use super::ResourceHand;

    /// Cost to build a road: 1 brick, 1 wood
    pub fn road() -> ResourceHand {
        ResourceHand::with_amounts(0, 1, 0, 1, 0)
    }

    /// Cost to build a settlement: 1 brick, 1 wood, 1 sheep, 1 wheat
    pub fn settlement() -> ResourceHand {
        ResourceHand::with_amounts(0, 1, 1, 1, 1)
    }

    /// Cost to upgrade to city: 3 ore, 2 wheat
    pub fn city() -> ResourceHand {
        ResourceHand::with_amounts(3, 0, 0, 0, 2)
    }

    /// Cost to buy a development card: 1 ore, 1 sheep, 1 wheat
    pub fn development_card() -> ResourceHand {
        ResourceHand::with_amounts(1, 0, 1, 0, 1)
    }
}
