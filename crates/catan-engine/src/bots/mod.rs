//! Reference bot players.
//!
//! This module provides two bots built from injected strategies:
//! - `RandomPlayer`: random legal moves
//! - `SinglePurchasePlayer`: one purchase goal per turn, trading toward it
//!
//! Bots only act through `Turn`, so they are held to the same rules as
//! any other player.

mod random;
mod single_purchase;
mod strategy;

pub use random::RandomPlayer;
pub use single_purchase::SinglePurchasePlayer;
pub use strategy::{
    corner_yield, BanditStrategy, BestYieldSetup, BlockLeader, RandomBandit, RandomSetup,
    SetupStrategy,
};

use crate::board::Board;
use crate::cards::DevelopmentCard;
use crate::coord::{EdgeCoordinate, NodeCoordinate};
use crate::error::GameError;
use crate::pieces::{Color, PieceKind};
use crate::player::Hand;
use crate::resource::costs;
use crate::turn::Turn;
use parking_lot::Mutex;
use rand::prelude::*;
use tracing::debug;

/// A move a bot could make right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Move {
    Road(EdgeCoordinate),
    Settlement(NodeCoordinate),
    City(NodeCoordinate),
    BuyCard,
    Play(DevelopmentCard),
}

/// Every affordable move after the roll
pub(crate) fn legal_moves(board: &Board, hand: &Hand, color: Color) -> Vec<Move> {
    let stock = board.pieces_for_sale(color);
    let mut moves = Vec::new();

    if stock.remaining(PieceKind::Road) > 0
        && (hand.free_roads > 0 || hand.resources.can_afford(&costs::road()))
    {
        moves.extend(board.valid_road_spots(color, None).into_iter().map(Move::Road));
    }
    if stock.remaining(PieceKind::Settlement) > 0
        && hand.resources.can_afford(&costs::settlement())
    {
        moves.extend(board.valid_settlement_spots(color).into_iter().map(Move::Settlement));
    }
    if stock.remaining(PieceKind::City) > 0 && hand.resources.can_afford(&costs::city()) {
        moves.extend(board.valid_city_spots(color).into_iter().map(Move::City));
    }
    if board.development_cards_left() > 0
        && hand.resources.can_afford(&costs::development_card())
    {
        moves.push(Move::BuyCard);
    }
    for card in hand.unplayed() {
        if !moves.contains(&Move::Play(card)) {
            moves.push(Move::Play(card));
        }
    }
    moves
}

/// Opening turn: a settlement from the strategy, then a random touching road
pub(crate) fn play_setup(
    turn: &Turn,
    strategy: &dyn SetupStrategy,
    rng: &Mutex<StdRng>,
) -> Result<(), GameError> {
    let board = turn.board();
    let spots = board.valid_initial_settlement_spots();
    let choice = strategy.choose_settlement(&board, &spots, &mut rng.lock());
    let Some(spot) = choice else {
        return Ok(());
    };
    let placed = turn.place_settlement(spot)?;

    let roads = turn.board().valid_road_spots(turn.player().color, Some(placed));
    let road = roads.choose(&mut *rng.lock()).copied();
    if let Some(road) = road {
        turn.place_road(road)?;
    }
    turn.done()
}

/// Place any free roads left so the turn can end
pub(crate) fn place_free_roads(turn: &Turn, rng: &Mutex<StdRng>) -> Result<(), GameError> {
    while turn.hand().free_roads > 0 {
        let spots = turn.board().valid_road_spots(turn.player().color, None);
        let spot = spots.choose(&mut *rng.lock()).copied();
        match spot {
            Some(spot) => {
                turn.place_road(spot)?;
            }
            None => break,
        }
    }
    Ok(())
}

/// Rule violations end the bot's turn quietly; anything else is a real failure
pub(crate) fn finish_turn(turn: &Turn, result: Result<(), GameError>) -> anyhow::Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) if err.as_rule().is_some() => {
            debug!("Bot {} ended its turn early: {}", turn.player().name, err);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> Mutex<StdRng> {
    Mutex::new(match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    })
}
