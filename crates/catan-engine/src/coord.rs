//! Offset coordinate system for a flat-topped hex grid.
//!
//! This module provides the value types used to address the board:
//! - `HexCoordinate`: a tile position `(x, y)`
//! - `EdgeNumber` / `NodeNumber`: a side or corner around one hex, 0..=5
//! - `EdgeCoordinate` / `NodeCoordinate`: a side or corner named from one of
//!   the hexes touching it, printed as `(x,y,n)`
//!
//! Columns run along `x`, `y` grows downward and odd columns sit half a hex
//! lower than even ones, so the diagonal neighbours depend on the parity of `x`.
//!
//! Edges are numbered clockwise from the top: 0 up, 1 right-up, 2 right-down,
//! 3 down, 4 left-down, 5 left-up. Node `n` is the corner between edge `n` and
//! edge `n + 1`, so edge `e` runs from node `e - 1` to node `e`.

use crate::error::GameError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a hex tile on the grid
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct HexCoordinate {
    /// Column
    pub x: i32,
    /// Row (grows downward)
    pub y: i32,
}

impl HexCoordinate {
    /// Create a new hex coordinate
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn is_odd_column(&self) -> bool {
        self.x.rem_euclid(2) == 1
    }

    pub fn up(&self) -> Self {
        Self::new(self.x, self.y - 1)
    }

    pub fn down(&self) -> Self {
        Self::new(self.x, self.y + 1)
    }

    pub fn right_up(&self) -> Self {
        if self.is_odd_column() {
            Self::new(self.x + 1, self.y)
        } else {
            Self::new(self.x + 1, self.y - 1)
        }
    }

    pub fn right_down(&self) -> Self {
        if self.is_odd_column() {
            Self::new(self.x + 1, self.y + 1)
        } else {
            Self::new(self.x + 1, self.y)
        }
    }

    pub fn left_up(&self) -> Self {
        if self.is_odd_column() {
            Self::new(self.x - 1, self.y)
        } else {
            Self::new(self.x - 1, self.y - 1)
        }
    }

    pub fn left_down(&self) -> Self {
        if self.is_odd_column() {
            Self::new(self.x - 1, self.y + 1)
        } else {
            Self::new(self.x - 1, self.y)
        }
    }

    /// The hex sharing the given edge with this one
    pub fn neighbor(&self, edge: EdgeNumber) -> Self {
        match edge.value() {
            0 => self.up(),
            1 => self.right_up(),
            2 => self.right_down(),
            3 => self.down(),
            4 => self.left_down(),
            _ => self.left_up(),
        }
    }

    /// All six neighbours, indexed by edge number
    pub fn neighbors(&self) -> [HexCoordinate; 6] {
        EdgeNumber::ALL.map(|edge| self.neighbor(edge))
    }

    /// Pixel centre of the hex for a unit radius
    pub fn center(&self) -> (f64, f64) {
        let height = 3f64.sqrt();
        let offset = if self.is_odd_column() { 0.5 } else { 0.0 };
        (1.5 * self.x as f64, height * (self.y as f64 + offset))
    }
}

impl fmt::Display for HexCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// A side of a hex, 0..=5 clockwise from the top
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct EdgeNumber(u8);

impl EdgeNumber {
    /// All six sides in clockwise order
    pub const ALL: [EdgeNumber; 6] = [
        EdgeNumber(0),
        EdgeNumber(1),
        EdgeNumber(2),
        EdgeNumber(3),
        EdgeNumber(4),
        EdgeNumber(5),
    ];

    /// Create an edge number, failing outside 0..=5
    pub fn new(value: u8) -> Result<Self, GameError> {
        if value < 6 {
            Ok(Self(value))
        } else {
            Err(GameError::InvalidPosition(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn next(&self) -> Self {
        Self((self.0 + 1) % 6)
    }

    pub fn prev(&self) -> Self {
        Self((self.0 + 5) % 6)
    }

    pub fn opposite(&self) -> Self {
        Self((self.0 + 3) % 6)
    }

    /// The corner where this side starts (clockwise)
    pub fn prev_node(&self) -> NodeNumber {
        NodeNumber((self.0 + 5) % 6)
    }

    /// The corner where this side ends (clockwise)
    pub fn next_node(&self) -> NodeNumber {
        NodeNumber(self.0)
    }

    /// Both corners of this side
    pub fn nodes(&self) -> [NodeNumber; 2] {
        [self.prev_node(), self.next_node()]
    }
}

impl TryFrom<u8> for EdgeNumber {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EdgeNumber> for u8 {
    fn from(edge: EdgeNumber) -> Self {
        edge.0
    }
}

/// A corner of a hex, 0..=5 clockwise from the top-right corner
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct NodeNumber(u8);

impl NodeNumber {
    /// All six corners in clockwise order
    pub const ALL: [NodeNumber; 6] = [
        NodeNumber(0),
        NodeNumber(1),
        NodeNumber(2),
        NodeNumber(3),
        NodeNumber(4),
        NodeNumber(5),
    ];

    /// Create a node number, failing outside 0..=5
    pub fn new(value: u8) -> Result<Self, GameError> {
        if value < 6 {
            Ok(Self(value))
        } else {
            Err(GameError::InvalidPosition(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn next(&self) -> Self {
        Self((self.0 + 1) % 6)
    }

    pub fn prev(&self) -> Self {
        Self((self.0 + 5) % 6)
    }

    pub fn opposite(&self) -> Self {
        Self((self.0 + 3) % 6)
    }

    /// The side arriving at this corner (clockwise)
    pub fn prev_edge(&self) -> EdgeNumber {
        EdgeNumber(self.0)
    }

    /// The side leaving this corner (clockwise)
    pub fn next_edge(&self) -> EdgeNumber {
        EdgeNumber((self.0 + 1) % 6)
    }

    /// Both sides of this hex that meet at this corner
    pub fn edges(&self) -> [EdgeNumber; 2] {
        [self.prev_edge(), self.next_edge()]
    }
}

impl TryFrom<u8> for NodeNumber {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NodeNumber> for u8 {
    fn from(node: NodeNumber) -> Self {
        node.0
    }
}

/// A side named from one of the hexes touching it
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EdgeCoordinate {
    pub hex: HexCoordinate,
    pub edge: EdgeNumber,
}

impl EdgeCoordinate {
    pub fn new(hex: HexCoordinate, edge: EdgeNumber) -> Self {
        Self { hex, edge }
    }

    /// Build from raw parts, failing when `edge` is out of range
    pub fn at(x: i32, y: i32, edge: u8) -> Result<Self, GameError> {
        Ok(Self::new(HexCoordinate::new(x, y), EdgeNumber::new(edge)?))
    }

    /// The same side named from the hex on the other side
    pub fn mirrored(&self) -> Self {
        Self::new(self.hex.neighbor(self.edge), self.edge.opposite())
    }
}

impl fmt::Display for EdgeCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.hex.x, self.hex.y, self.edge.value())
    }
}

/// A corner named from one of the hexes touching it
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeCoordinate {
    pub hex: HexCoordinate,
    pub node: NodeNumber,
}

impl NodeCoordinate {
    pub fn new(hex: HexCoordinate, node: NodeNumber) -> Self {
        Self { hex, node }
    }

    /// Build from raw parts, failing when `node` is out of range
    pub fn at(x: i32, y: i32, node: u8) -> Result<Self, GameError> {
        Ok(Self::new(HexCoordinate::new(x, y), NodeNumber::new(node)?))
    }
}

impl fmt::Display for NodeCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.hex.x, self.hex.y, self.node.value())
    }
}
