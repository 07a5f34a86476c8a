//! Dice rolling and roll probabilities.
//!
//! The [`Dice`] trait lets the admin roll with a seeded generator in real
//! games and with scripted rolls in tests.

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Number of two-dice combinations producing `sum`
pub fn ways(sum: u8) -> u32 {
    match sum {
        2..=7 => (sum - 1) as u32,
        8..=12 => (13 - sum) as u32,
        _ => 0,
    }
}

/// Probability of rolling `sum` with two dice
pub fn probability(sum: u8) -> f64 {
    ways(sum) as f64 / 36.0
}

/// Source of two-dice rolls
pub trait Dice: Send + Sync {
    fn roll(&self) -> (u8, u8);
}

/// Fair dice backed by a seeded ChaCha8 stream
pub struct RandomDice {
    rng: Mutex<ChaCha8Rng>,
}

impl RandomDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }
}

impl Dice for RandomDice {
    fn roll(&self) -> (u8, u8) {
        let mut rng = self.rng.lock();
        (rng.gen_range(1..=6), rng.gen_range(1..=6))
    }
}

/// Dice that replay a fixed script of rolls, cycling when exhausted.
///
/// An empty script always rolls (3, 4).
pub struct LoadedDice {
    rolls: Vec<(u8, u8)>,
    next: AtomicUsize,
}

impl LoadedDice {
    pub fn new(rolls: Vec<(u8, u8)>) -> Self {
        Self {
            rolls,
            next: AtomicUsize::new(0),
        }
    }
}

impl Dice for LoadedDice {
    fn roll(&self) -> (u8, u8) {
        if self.rolls.is_empty() {
            return (3, 4);
        }
        let i = self.next.fetch_add(1, Ordering::Relaxed);
        self.rolls[i % self.rolls.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ways_sum_to_36() {
        let total: u32 = (2..=12).map(ways).sum();
        assert_eq!(total, 36);
        assert_eq!(ways(7), 6);
        assert_eq!(ways(1), 0);
        assert_eq!(ways(13), 0);
    }

    #[test]
    fn test_probability() {
        assert!((probability(2) - 1.0 / 36.0).abs() < 1e-9);
        assert!((probability(8) - 5.0 / 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_random_dice_in_range() {
        let dice = RandomDice::new(11);
        for _ in 0..200 {
            let (a, b) = dice.roll();
            assert!((1..=6).contains(&a));
            assert!((1..=6).contains(&b));
        }
    }

    #[test]
    fn test_loaded_dice_cycle() {
        let dice = LoadedDice::new(vec![(3, 4), (6, 6)]);
        assert_eq!(dice.roll(), (3, 4));
        assert_eq!(dice.roll(), (6, 6));
        assert_eq!(dice.roll(), (3, 4));
    }
}
