//! Player colors, board pieces, piece inventories and ports.

use crate::resource::{costs, Resource, ResourceHand};
use serde::{Deserialize, Serialize};

/// Player color. A game seats at most one player per color.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Color {
    Red,
    Blue,
    Orange,
    White,
}

impl Color {
    /// All seat colors
    pub const ALL: [Color; 4] = [Color::Red, Color::Blue, Color::Orange, Color::White];
}

/// Kind of piece, without an owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Road,
    Settlement,
    City,
}

/// A piece on the board, tagged with its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardPiece {
    Road(Color),
    Settlement(Color),
    City(Color),
}

impl BoardPiece {
    pub fn color(&self) -> Color {
        match self {
            BoardPiece::Road(c) | BoardPiece::Settlement(c) | BoardPiece::City(c) => *c,
        }
    }

    pub fn kind(&self) -> PieceKind {
        match self {
            BoardPiece::Road(_) => PieceKind::Road,
            BoardPiece::Settlement(_) => PieceKind::Settlement,
            BoardPiece::City(_) => PieceKind::City,
        }
    }

    /// Victory points the piece is worth on the board
    pub fn points(&self) -> u32 {
        match self {
            BoardPiece::Road(_) => 0,
            BoardPiece::Settlement(_) => 1,
            BoardPiece::City(_) => 2,
        }
    }

    /// Cards produced per matching roll
    pub fn yield_count(&self) -> u32 {
        self.points()
    }

    /// Purchase price
    pub fn price(&self) -> ResourceHand {
        match self {
            BoardPiece::Road(_) => costs::road(),
            BoardPiece::Settlement(_) => costs::settlement(),
            BoardPiece::City(_) => costs::city(),
        }
    }
}

/// Finite stock of pieces one color may still place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiecesForSale {
    roads: u32,
    settlements: u32,
    cities: u32,
}

impl Default for PiecesForSale {
    fn default() -> Self {
        Self {
            roads: 15,
            settlements: 5,
            cities: 4,
        }
    }
}

impl PiecesForSale {
    /// Pieces left of the given kind
    pub fn remaining(&self, kind: PieceKind) -> u32 {
        match kind {
            PieceKind::Road => self.roads,
            PieceKind::Settlement => self.settlements,
            PieceKind::City => self.cities,
        }
    }

    fn slot(&mut self, kind: PieceKind) -> &mut u32 {
        match kind {
            PieceKind::Road => &mut self.roads,
            PieceKind::Settlement => &mut self.settlements,
            PieceKind::City => &mut self.cities,
        }
    }

    /// Take one piece of the given kind, returning false when none are left
    pub fn take(&mut self, kind: PieceKind) -> bool {
        let slot = self.slot(kind);
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    /// Put a piece back (a settlement replaced by a city, a removed road)
    pub fn give_back(&mut self, kind: PieceKind) {
        *self.slot(kind) += 1;
    }
}

/// Port types for maritime trading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Port {
    /// 3:1 trade any resource
    Generic,
    /// 2:1 trade for a specific resource
    Specific(Resource),
}

impl Port {
    /// The exchange rate for this port
    pub fn rate(&self) -> u32 {
        match self {
            Port::Generic => 3,
            Port::Specific(_) => 2,
        }
    }

    /// Whether the port accepts `resource` as payment
    pub fn accepts(&self, resource: Resource) -> bool {
        match self {
            Port::Generic => true,
            Port::Specific(r) => *r == resource,
        }
    }
}
