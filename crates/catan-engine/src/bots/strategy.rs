//! Pluggable decisions shared by the reference bots.

use crate::board::Board;
use crate::coord::{HexCoordinate, NodeCoordinate};
use crate::dice;
use crate::pieces::Color;
use rand::prelude::*;
use std::cmp::Ordering;

/// Picks the corner for an opening settlement
pub trait SetupStrategy: Send + Sync {
    fn choose_settlement(
        &self,
        board: &Board,
        spots: &[NodeCoordinate],
        rng: &mut StdRng,
    ) -> Option<NodeCoordinate>;
}

/// Picks where the bandit goes
pub trait BanditStrategy: Send + Sync {
    fn choose_hex(
        &self,
        board: &Board,
        me: Option<Color>,
        current: HexCoordinate,
        rng: &mut StdRng,
    ) -> HexCoordinate;
}

/// Summed roll probability of the producing hexes around a corner
pub fn corner_yield(board: &Board, spot: NodeCoordinate) -> f64 {
    let Some(id) = board.node_id(spot) else {
        return 0.0;
    };
    board
        .hexes_of_node(id)
        .iter()
        .filter(|h| h.resource.is_some())
        .map(|h| dice::probability(h.number))
        .sum()
}

fn other_hexes(board: &Board, current: HexCoordinate) -> Vec<HexCoordinate> {
    board
        .tiles()
        .map(|h| h.coord)
        .filter(|c| *c != current)
        .collect()
}

/// Any open corner
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSetup;

impl SetupStrategy for RandomSetup {
    fn choose_settlement(
        &self,
        _board: &Board,
        spots: &[NodeCoordinate],
        rng: &mut StdRng,
    ) -> Option<NodeCoordinate> {
        spots.choose(rng).copied()
    }
}

/// The corner with the best expected production
#[derive(Debug, Clone, Copy, Default)]
pub struct BestYieldSetup;

impl SetupStrategy for BestYieldSetup {
    fn choose_settlement(
        &self,
        board: &Board,
        spots: &[NodeCoordinate],
        _rng: &mut StdRng,
    ) -> Option<NodeCoordinate> {
        spots.iter().copied().max_by(|a, b| {
            corner_yield(board, *a)
                .partial_cmp(&corner_yield(board, *b))
                .unwrap_or(Ordering::Equal)
        })
    }
}

/// Any hex other than the current one
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomBandit;

impl BanditStrategy for RandomBandit {
    fn choose_hex(
        &self,
        board: &Board,
        _me: Option<Color>,
        current: HexCoordinate,
        rng: &mut StdRng,
    ) -> HexCoordinate {
        other_hexes(board, current)
            .choose(rng)
            .copied()
            .unwrap_or(current)
    }
}

/// The hex where opponents have the most buildings, never one of ours
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockLeader;

impl BanditStrategy for BlockLeader {
    fn choose_hex(
        &self,
        board: &Board,
        me: Option<Color>,
        current: HexCoordinate,
        rng: &mut StdRng,
    ) -> HexCoordinate {
        let candidates: Vec<(HexCoordinate, usize, f64)> = board
            .tiles()
            .filter(|h| h.coord != current)
            .filter_map(|h| {
                let colors = board.colors_on_hex(h.coord);
                if me.is_some_and(|c| colors.contains(&c)) {
                    return None;
                }
                Some((h.coord, colors.len(), dice::probability(h.number)))
            })
            .collect();

        let best = candidates
            .iter()
            .filter(|(_, opponents, _)| *opponents > 0)
            .max_by(|a, b| {
                a.1.cmp(&b.1)
                    .then(a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal))
            });
        match best {
            Some((coord, _, _)) => *coord,
            None => RandomBandit.choose_hex(board, me, current, rng),
        }
    }
}
