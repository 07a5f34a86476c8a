//! Owned shuffled bag of items drawn without replacement.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A shuffled bag. Items are drawn from the front until it is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bag<T> {
    items: VecDeque<T>,
}

impl<T> Bag<T> {
    /// Shuffle `items` into a new bag
    pub fn shuffled<R: Rng>(mut items: Vec<T>, rng: &mut R) -> Self {
        items.shuffle(rng);
        Self {
            items: items.into(),
        }
    }

    /// A bag that yields `items` in the given order
    pub fn ordered(items: Vec<T>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Take the next item, if any
    pub fn draw(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Bag<T> {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }
}
