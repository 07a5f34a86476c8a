//! Catan Engine - rules engine and turn coordinator for a hex-board
//! settlement-building and trading game
//!
//! This crate provides:
//! - Hex, edge and corner coordinates with canonical naming
//! - A board graph with building rules, production and Longest Road
//! - Validated turns for players, with dice, the bandit, trades and cards
//! - An `Admin` that seats players and runs games on a shared worker pool
//!
//! # Architecture
//!
//! Players never touch the board directly. Each turn hands the player a
//! [`Turn`] whose methods check every rule against the live board before
//! applying it. Turns run on worker threads under a timeout; a turn that
//! times out is fenced off so late calls can no longer change the game.
//!
//! # Modules
//!
//! - [`coord`]: Hex, edge and corner coordinates
//! - [`board`]: Board graph, legality checks and placements
//! - [`turn`]: The validated action surface handed to players
//! - [`admin`]: Seats, game loop and lifecycle
//! - [`observer`]: Game events, event log and replay
//! - [`bots`]: Reference players

pub mod admin;
pub mod bag;
pub mod board;
pub mod bots;
pub mod cards;
pub mod config;
pub mod coord;
pub mod dice;
pub mod error;
pub mod longest_road;
pub mod observer;
pub mod pieces;
pub mod player;
pub mod resource;
pub mod topology;
pub mod trade;
pub mod turn;
pub mod worker;

// Re-export commonly used types
pub use admin::{Admin, GameState};
pub use bag::Bag;
pub use board::{Board, BoardLayout, BoardPlacements};
pub use bots::{RandomPlayer, SinglePurchasePlayer};
pub use cards::{DevelopmentCard, OwnedCard};
pub use config::GameConfig;
pub use coord::{EdgeCoordinate, EdgeNumber, HexCoordinate, NodeCoordinate, NodeNumber};
pub use dice::{Dice, LoadedDice, RandomDice};
pub use error::{GameError, RuleViolation};
pub use observer::{BoardObserver, EventLog, GameEvent, GameObserver};
pub use pieces::{BoardPiece, Color, PieceKind, PiecesForSale, Port};
pub use player::{Hand, Player, PlayerRef, SelectReason};
pub use resource::{Resource, ResourceHand};
pub use topology::{Hex, Tile};
pub use trade::Quote;
pub use turn::{Action, Turn, TurnKind, TurnState};
pub use worker::WorkerPool;
