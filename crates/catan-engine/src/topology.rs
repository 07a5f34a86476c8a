//! Board topology: hexes, shared edges and shared corners.
//!
//! Edges and nodes live in arenas owned by the [`Board`](crate::board::Board)
//! and are addressed by [`EdgeId`] / [`NodeId`]. Two hexes that share a side
//! hold the same `EdgeId` in their slots once the board has stitched them,
//! so id equality is physical identity.

use crate::coord::{EdgeNumber, HexCoordinate, NodeNumber};
use crate::error::GameError;
use crate::pieces::{BoardPiece, Color, Port};
use crate::resource::Resource;
use serde::{Deserialize, Serialize};

/// Handle into the board's edge arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub(crate) usize);

/// Handle into the board's node arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

/// An unplaced hex: resource and trigger number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    resource: Option<Resource>,
    number: u8,
}

impl Tile {
    /// A producing tile. The number must be 2..=12 and not 7.
    pub fn new(resource: Resource, number: u8) -> Result<Self, GameError> {
        if !(2..=12).contains(&number) || number == 7 {
            return Err(GameError::InvalidTile(format!(
                "{resource:?} tile cannot have number {number}"
            )));
        }
        Ok(Self {
            resource: Some(resource),
            number,
        })
    }

    /// The desert: no resource, number 0
    pub fn desert() -> Self {
        Self {
            resource: None,
            number: 0,
        }
    }

    pub fn resource(&self) -> Option<Resource> {
        self.resource
    }

    pub fn number(&self) -> u8 {
        self.number
    }
}

/// A placed tile with its six side and six corner slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hex {
    pub coord: HexCoordinate,
    pub resource: Option<Resource>,
    /// Dice sum that triggers production (0 for the desert)
    pub number: u8,
    pub has_bandit: bool,
    pub(crate) edges: [EdgeId; 6],
    pub(crate) nodes: [NodeId; 6],
}

impl Hex {
    pub(crate) fn new(coord: HexCoordinate, tile: Tile, edges: [EdgeId; 6], nodes: [NodeId; 6]) -> Self {
        Self {
            coord,
            resource: tile.resource,
            number: tile.number,
            has_bandit: false,
            edges,
            nodes,
        }
    }

    pub fn edge(&self, edge: EdgeNumber) -> EdgeId {
        self.edges[edge.index()]
    }

    pub fn node(&self, node: NodeNumber) -> NodeId {
        self.nodes[node.index()]
    }

    pub fn edges(&self) -> &[EdgeId; 6] {
        &self.edges
    }

    pub fn nodes(&self) -> &[NodeId; 6] {
        &self.nodes
    }

    /// Whether a roll of `sum` makes this hex produce
    pub fn produces_on(&self, sum: u8) -> bool {
        self.resource.is_some() && self.number == sum && !self.has_bandit
    }

    /// Swap the side slot holding `old` for `new`
    pub fn replace_edge(&mut self, old: EdgeId, new: EdgeId) -> Result<EdgeNumber, GameError> {
        let slot = self.edges.iter().position(|e| *e == old).ok_or_else(|| {
            GameError::Corrupted(format!("edge {old:?} is not on hex {}", self.coord))
        })?;
        self.edges[slot] = new;
        Ok(EdgeNumber::ALL[slot])
    }

    /// Swap the corner slot holding `old` for `new`
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) -> Result<NodeNumber, GameError> {
        let slot = self.nodes.iter().position(|n| *n == old).ok_or_else(|| {
            GameError::Corrupted(format!("node {old:?} is not on hex {}", self.coord))
        })?;
        self.nodes[slot] = new;
        Ok(NodeNumber::ALL[slot])
    }
}

/// One physical side, shared by up to two hexes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Edge {
    /// Every hex touching this side with its local edge number
    pub hexes: Vec<(HexCoordinate, EdgeNumber)>,
    pub road: Option<Color>,
}

impl Edge {
    pub(crate) fn owned_by(hex: HexCoordinate, edge: EdgeNumber) -> Self {
        Self {
            hexes: vec![(hex, edge)],
            road: None,
        }
    }

    /// Whether this side lies on the outside of the board
    pub fn is_coastal(&self) -> bool {
        self.hexes.len() == 1
    }
}

/// One physical corner, shared by up to three hexes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// Every hex touching this corner with its local node number
    pub hexes: Vec<(HexCoordinate, NodeNumber)>,
    pub building: Option<BoardPiece>,
    pub port: Option<Port>,
}

impl Node {
    pub(crate) fn owned_by(hex: HexCoordinate, node: NodeNumber) -> Self {
        Self {
            hexes: vec![(hex, node)],
            building: None,
            port: None,
        }
    }

    /// Owner of the settlement or city on this corner
    pub fn owner(&self) -> Option<Color> {
        self.building.map(|b| b.color())
    }
}
