//! Game board aggregate: hexes, stitched topology, pieces and the bandit.
//!
//! This module contains:
//! - `Board::add_hex` and the edge/corner stitching that keeps the graph
//!   fully shared after every insertion
//! - Standard 19-hex board generation with ports and a shuffled card bag
//! - Valid-move queries, card distribution and piece mutations
//! - Serializable snapshots (`BoardLayout`, `BoardPlacements`)
//!
//! The live board is shared behind a mutex by the admin (see
//! [`crate::admin`]). Bots receive clones for lookahead.

use crate::bag::Bag;
use crate::cards::DevelopmentCard;
use crate::coord::{EdgeCoordinate, EdgeNumber, HexCoordinate, NodeCoordinate, NodeNumber};
use crate::error::{GameError, RuleViolation};
use crate::longest_road::{self, RoadRun};
use crate::pieces::{BoardPiece, Color, PieceKind, PiecesForSale, Port};
use crate::resource::Resource;
use crate::topology::{Edge, EdgeId, Hex, Node, NodeId, Tile};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Column layout of the standard board: `(x, first y, last y)`
const STANDARD_COLUMNS: [(i32, i32, i32); 5] = [(0, 1, 3), (1, 0, 3), (2, 0, 4), (3, 0, 3), (4, 1, 3)];

/// Tiles and ports needed to rebuild an empty copy of a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLayout {
    pub hexes: Vec<(HexCoordinate, Tile)>,
    pub bandit: Option<HexCoordinate>,
    pub ports: Vec<(NodeCoordinate, Port)>,
}

/// Everything placed on a board, keyed by canonical coordinates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardPlacements {
    pub roads: Vec<(EdgeCoordinate, Color)>,
    pub buildings: Vec<(NodeCoordinate, BoardPiece)>,
    pub bandit: Option<HexCoordinate>,
}

/// The game board
#[derive(Debug, Clone, Default)]
pub struct Board {
    tiles: BTreeMap<HexCoordinate, Hex>,
    edges: Vec<Option<Edge>>,
    nodes: Vec<Option<Node>>,
    pieces: BTreeMap<Color, PiecesForSale>,
    development_cards: Bag<DevelopmentCard>,
    road_runs: OnceLock<Vec<RoadRun>>,
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the standard board layout with randomized tiles and numbers
    pub fn standard() -> Result<Self, GameError> {
        let mut rng = rand::thread_rng();
        Self::standard_with_rng(&mut rng)
    }

    /// Create the standard board from a seed
    pub fn seeded(seed: u64) -> Result<Self, GameError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::standard_with_rng(&mut rng)
    }

    /// Create the standard board layout with a provided RNG
    pub fn standard_with_rng<R: Rng>(rng: &mut R) -> Result<Self, GameError> {
        let coords: Vec<HexCoordinate> = STANDARD_COLUMNS
            .iter()
            .flat_map(|(x, first, last)| (*first..=*last).map(move |y| HexCoordinate::new(*x, y)))
            .collect();

        // 4 wood, 4 wheat, 4 sheep, 3 ore, 3 brick, 1 desert
        let mut tile_types: Vec<Option<Resource>> = Vec::with_capacity(19);
        for (resource, count) in [
            (Resource::Wood, 4),
            (Resource::Wheat, 4),
            (Resource::Sheep, 4),
            (Resource::Ore, 3),
            (Resource::Brick, 3),
        ] {
            tile_types.extend(std::iter::repeat(Some(resource)).take(count));
        }
        tile_types.push(None);
        tile_types.shuffle(rng);

        let numbers: Vec<u8> = vec![2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];
        let producing: Vec<HexCoordinate> = coords
            .iter()
            .zip(&tile_types)
            .filter(|(_, t)| t.is_some())
            .map(|(c, _)| *c)
            .collect();
        let numbers = assign_numbers_avoiding_adjacent_68(&producing, &numbers, rng);

        let mut board = Self::new();
        let mut next_number = numbers.into_iter();
        let mut desert = None;
        for (coord, tile_type) in coords.iter().zip(tile_types) {
            let tile = match tile_type {
                Some(resource) => {
                    let number = next_number.next().ok_or_else(|| {
                        GameError::Corrupted("ran out of number tokens".into())
                    })?;
                    Tile::new(resource, number)?
                }
                None => {
                    desert = Some(*coord);
                    Tile::desert()
                }
            };
            board.add_hex(*coord, tile)?;
        }
        if let Some(desert) = desert {
            board.set_bandit(desert)?;
        }

        board.add_standard_ports(rng);
        board.development_cards = Bag::shuffled(DevelopmentCard::standard_deck(), rng);
        Ok(board)
    }

    /// Rebuild an empty board (no pieces, no cards) from a layout
    pub fn from_layout(layout: &BoardLayout) -> Result<Self, GameError> {
        let mut board = Self::new();
        for (coord, tile) in &layout.hexes {
            board.add_hex(*coord, *tile)?;
        }
        if let Some(bandit) = layout.bandit {
            board.set_bandit(bandit)?;
        }
        for (coord, port) in &layout.ports {
            let id = board.resolve_node(*coord)?;
            board.node_mut(id)?.port = Some(*port);
        }
        Ok(board)
    }

    /// The tiles and ports of this board
    pub fn layout(&self) -> BoardLayout {
        let hexes = self
            .tiles
            .values()
            .map(|h| {
                let tile = match h.resource {
                    Some(r) => Tile::new(r, h.number).unwrap_or_else(|_| Tile::desert()),
                    None => Tile::desert(),
                };
                (h.coord, tile)
            })
            .collect();
        let mut ports: Vec<(NodeCoordinate, Port)> = self
            .live_nodes()
            .filter_map(|(id, node)| Some((self.node_coordinate(id)?, node.port?)))
            .collect();
        ports.sort_by_key(|(coord, _)| *coord);
        BoardLayout {
            hexes,
            bandit: self.bandit_location(),
            ports,
        }
    }

    // ==================== Topology ====================

    fn alloc_edge(&mut self, edge: Edge) -> EdgeId {
        self.edges.push(Some(edge));
        EdgeId(self.edges.len() - 1)
    }

    fn alloc_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(Some(node));
        NodeId(self.nodes.len() - 1)
    }

    fn tile_mut(&mut self, coord: HexCoordinate) -> Result<&mut Hex, GameError> {
        self.tiles
            .get_mut(&coord)
            .ok_or_else(|| GameError::Corrupted(format!("no hex at {coord}")))
    }

    fn edge_mut(&mut self, id: EdgeId) -> Result<&mut Edge, GameError> {
        self.edges
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| GameError::Corrupted(format!("dangling edge {id:?}")))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GameError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| GameError::Corrupted(format!("dangling node {id:?}")))
    }

    /// Place a tile at `coord` and stitch it to every existing neighbour
    pub fn add_hex(&mut self, coord: HexCoordinate, tile: Tile) -> Result<(), GameError> {
        if self.tiles.contains_key(&coord) {
            return Err(GameError::HexOccupied(coord.to_string()));
        }

        let edges = EdgeNumber::ALL.map(|e| self.alloc_edge(Edge::owned_by(coord, e)));
        let nodes = NodeNumber::ALL.map(|n| self.alloc_node(Node::owned_by(coord, n)));
        self.tiles.insert(coord, Hex::new(coord, tile, edges, nodes));

        for edge in EdgeNumber::ALL {
            let neighbor = coord.neighbor(edge);
            if self.tiles.contains_key(&neighbor) {
                self.stitch(coord, edge, neighbor)?;
            }
        }
        self.invalidate_roads();
        Ok(())
    }

    /// Share `neighbor`'s side and corners with the hex at `coord`
    fn stitch(
        &mut self,
        coord: HexCoordinate,
        edge: EdgeNumber,
        neighbor: HexCoordinate,
    ) -> Result<(), GameError> {
        let opposite = edge.opposite();
        let (their_edge, their_prev, their_next) = {
            let theirs = self.tile_mut(neighbor)?;
            (
                theirs.edge(opposite),
                theirs.node(opposite.prev_node()),
                theirs.node(opposite.next_node()),
            )
        };
        let (our_edge, our_prev, our_next) = {
            let ours = self.tile_mut(coord)?;
            (ours.edge(edge), ours.node(edge.prev_node()), ours.node(edge.next_node()))
        };

        if our_edge != their_edge {
            self.tile_mut(coord)?.replace_edge(our_edge, their_edge)?;
            self.edges[our_edge.0] = None;
            self.edge_mut(their_edge)?.hexes.push((coord, edge));
        }

        self.unify_nodes(our_prev, their_next)?;
        self.unify_nodes(our_next, their_prev)
    }

    /// Fold `old` into `keep`, rewriting every hex that pointed at `old`
    fn unify_nodes(&mut self, old: NodeId, keep: NodeId) -> Result<(), GameError> {
        if old == keep {
            return Ok(());
        }
        let discarded = self
            .nodes
            .get_mut(old.0)
            .and_then(Option::take)
            .ok_or_else(|| GameError::Corrupted(format!("dangling node {old:?}")))?;

        for (hex, _) in &discarded.hexes {
            self.tile_mut(*hex)?.replace_node(old, keep)?;
        }
        let kept = self.node_mut(keep)?;
        for entry in discarded.hexes {
            if !kept.hexes.contains(&entry) {
                kept.hexes.push(entry);
            }
        }
        kept.building = kept.building.or(discarded.building);
        kept.port = kept.port.or(discarded.port);
        Ok(())
    }

    // ==================== Query Methods ====================

    /// Get a hex by coordinate
    pub fn tile(&self, coord: HexCoordinate) -> Option<&Hex> {
        self.tiles.get(&coord)
    }

    /// All hexes in coordinate order
    pub fn tiles(&self) -> impl Iterator<Item = &Hex> {
        self.tiles.values()
    }

    pub fn hex_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0).and_then(Option::as_ref)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn live_edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EdgeId(i), e)))
    }

    pub(crate) fn live_nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeId(i), n)))
    }

    /// Resolve a side, also accepting the name used by a missing neighbour
    pub fn edge_id(&self, coord: EdgeCoordinate) -> Option<EdgeId> {
        self.tiles
            .get(&coord.hex)
            .map(|h| h.edge(coord.edge))
            .or_else(|| {
                let mirror = coord.mirrored();
                self.tiles.get(&mirror.hex).map(|h| h.edge(mirror.edge))
            })
    }

    /// Resolve a corner named from one of its hexes
    pub fn node_id(&self, coord: NodeCoordinate) -> Option<NodeId> {
        self.tiles.get(&coord.hex).map(|h| h.node(coord.node))
    }

    fn resolve_edge(&self, coord: EdgeCoordinate) -> Result<EdgeId, GameError> {
        self.edge_id(coord)
            .ok_or_else(|| RuleViolation::InvalidLocation(format!("no edge at {coord}")).into())
    }

    fn resolve_node(&self, coord: NodeCoordinate) -> Result<NodeId, GameError> {
        self.node_id(coord)
            .ok_or_else(|| RuleViolation::InvalidLocation(format!("no node at {coord}")).into())
    }

    /// Smallest coordinate naming this side
    pub fn edge_coordinate(&self, id: EdgeId) -> Option<EdgeCoordinate> {
        self.edge(id)?
            .hexes
            .iter()
            .min()
            .map(|(hex, e)| EdgeCoordinate::new(*hex, *e))
    }

    /// Smallest coordinate naming this corner
    pub fn node_coordinate(&self, id: NodeId) -> Option<NodeCoordinate> {
        self.node(id)?
            .hexes
            .iter()
            .min()
            .map(|(hex, n)| NodeCoordinate::new(*hex, *n))
    }

    /// The two corners at the ends of a side
    pub fn nodes_of_edge(&self, id: EdgeId) -> Vec<NodeId> {
        self.edge(id)
            .and_then(|edge| edge.hexes.first())
            .and_then(|(hex, e)| {
                let hex = self.tiles.get(hex)?;
                Some(vec![hex.node(e.prev_node()), hex.node(e.next_node())])
            })
            .unwrap_or_default()
    }

    /// Sides meeting at a corner
    pub fn edges_of_node(&self, id: NodeId) -> Vec<EdgeId> {
        let mut edges = BTreeSet::new();
        if let Some(node) = self.node(id) {
            for (coord, n) in &node.hexes {
                if let Some(hex) = self.tiles.get(coord) {
                    edges.insert(hex.edge(n.prev_edge()));
                    edges.insert(hex.edge(n.next_edge()));
                }
            }
        }
        edges.into_iter().collect()
    }

    /// Corners one side away
    pub fn adjacent_nodes(&self, id: NodeId) -> Vec<NodeId> {
        let mut nodes = BTreeSet::new();
        for edge in self.edges_of_node(id) {
            for other in self.nodes_of_edge(edge) {
                if other != id {
                    nodes.insert(other);
                }
            }
        }
        nodes.into_iter().collect()
    }

    /// Hexes touching a corner
    pub fn hexes_of_node(&self, id: NodeId) -> Vec<&Hex> {
        self.node(id)
            .map(|n| n.hexes.iter().filter_map(|(c, _)| self.tiles.get(c)).collect())
            .unwrap_or_default()
    }

    /// Where the bandit is, if anywhere
    pub fn bandit_location(&self) -> Option<HexCoordinate> {
        self.tiles.values().find(|h| h.has_bandit).map(|h| h.coord)
    }

    /// Colors with a settlement or city on a hex
    pub fn colors_on_hex(&self, coord: HexCoordinate) -> Vec<Color> {
        let mut colors = BTreeSet::new();
        if let Some(hex) = self.tiles.get(&coord) {
            for id in hex.nodes() {
                if let Some(owner) = self.node(*id).and_then(Node::owner) {
                    colors.insert(owner);
                }
            }
        }
        colors.into_iter().collect()
    }

    /// Ports reachable from this color's buildings
    pub fn ports_for(&self, color: Color) -> Vec<Port> {
        let mut ports: Vec<Port> = Vec::new();
        for (_, node) in self.live_nodes() {
            if let (Some(port), Some(owner)) = (node.port, node.owner()) {
                if owner == color && !ports.contains(&port) {
                    ports.push(port);
                }
            }
        }
        ports
    }

    /// Board points for a color (settlements 1, cities 2)
    pub fn points(&self, color: Color) -> u32 {
        self.live_nodes()
            .filter_map(|(_, n)| n.building)
            .filter(|b| b.color() == color)
            .map(|b| b.points())
            .sum()
    }

    /// Settlements of this color currently on the board
    pub fn settlement_count(&self, color: Color) -> usize {
        self.live_nodes()
            .filter(|(_, n)| n.building == Some(BoardPiece::Settlement(color)))
            .count()
    }

    /// Pieces this color may still place
    pub fn pieces_for_sale(&self, color: Color) -> PiecesForSale {
        self.pieces.get(&color).cloned().unwrap_or_default()
    }

    /// Cards left in the development deck
    pub fn development_cards_left(&self) -> usize {
        self.development_cards.len()
    }

    /// Replace the development deck
    pub fn set_development_cards(&mut self, cards: Bag<DevelopmentCard>) {
        self.development_cards = cards;
    }

    // ==================== Validation Methods ====================

    /// Empty corner with no building one side away
    fn satisfies_distance_rule(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.building.is_none())
            && self
                .adjacent_nodes(id)
                .iter()
                .all(|adj| self.node(*adj).is_some_and(|n| n.building.is_none()))
    }

    fn touches_road(&self, id: NodeId, color: Color) -> bool {
        self.edges_of_node(id)
            .iter()
            .any(|e| self.edge(*e).is_some_and(|e| e.road == Some(color)))
    }

    /// Corners open for a first settlement (no road needed)
    pub fn valid_initial_settlement_spots(&self) -> Vec<NodeCoordinate> {
        self.live_nodes()
            .filter(|(id, _)| self.satisfies_distance_rule(*id))
            .filter_map(|(id, _)| self.node_coordinate(id))
            .collect()
    }

    /// Corners where this color can build a settlement
    pub fn valid_settlement_spots(&self, color: Color) -> Vec<NodeCoordinate> {
        self.live_nodes()
            .filter(|(id, _)| self.satisfies_distance_rule(*id) && self.touches_road(*id, color))
            .filter_map(|(id, _)| self.node_coordinate(id))
            .collect()
    }

    /// Whether an empty side connects to this color's network
    fn is_connected_to_network(&self, id: EdgeId, color: Color) -> bool {
        self.nodes_of_edge(id).into_iter().any(|endpoint| {
            let owner = self.node(endpoint).and_then(Node::owner);
            if owner == Some(color) {
                return true;
            }
            // A road leading here counts unless another color has built on the corner
            owner.is_none()
                && self.edges_of_node(endpoint).iter().any(|other| {
                    *other != id && self.edge(*other).is_some_and(|e| e.road == Some(color))
                })
        })
    }

    /// Sides where this color can build a road, optionally touching one corner
    pub fn valid_road_spots(
        &self,
        color: Color,
        touching: Option<NodeCoordinate>,
    ) -> Vec<EdgeCoordinate> {
        let touching = match touching {
            Some(coord) => match self.node_id(coord) {
                Some(id) => Some(self.edges_of_node(id)),
                None => return Vec::new(),
            },
            None => None,
        };
        self.live_edges()
            .filter(|(id, edge)| edge.road.is_none() && self.is_connected_to_network(*id, color))
            .filter(|(id, _)| touching.as_ref().map_or(true, |edges| edges.contains(id)))
            .filter_map(|(id, _)| self.edge_coordinate(id))
            .collect()
    }

    /// Corners holding a settlement of this color
    pub fn valid_city_spots(&self, color: Color) -> Vec<NodeCoordinate> {
        self.live_nodes()
            .filter(|(_, n)| n.building == Some(BoardPiece::Settlement(color)))
            .filter_map(|(id, _)| self.node_coordinate(id))
            .collect()
    }

    /// Whether this color has any legal placement left
    pub fn can_build(&self, color: Color) -> bool {
        let stock = self.pieces_for_sale(color);
        (stock.remaining(PieceKind::Road) > 0 && !self.valid_road_spots(color, None).is_empty())
            || (stock.remaining(PieceKind::Settlement) > 0
                && !self.valid_settlement_spots(color).is_empty())
            || (stock.remaining(PieceKind::City) > 0 && !self.valid_city_spots(color).is_empty())
    }

    // ==================== Resource Distribution ====================

    /// Cards a color receives for a dice sum
    pub fn get_cards(&self, sum: u8, color: Color) -> Vec<Resource> {
        let mut cards = Vec::new();
        for hex in self.tiles.values().filter(|h| h.produces_on(sum)) {
            let Some(resource) = hex.resource else {
                continue;
            };
            for id in hex.nodes() {
                if let Some(building) = self.node(*id).and_then(|n| n.building) {
                    if building.color() == color {
                        cards.extend(
                            std::iter::repeat(resource).take(building.yield_count() as usize),
                        );
                    }
                }
            }
        }
        cards
    }

    // ==================== Mutation Methods ====================

    fn take_piece(&mut self, color: Color, kind: PieceKind) -> Result<(), GameError> {
        if self.pieces.entry(color).or_default().take(kind) {
            Ok(())
        } else {
            Err(RuleViolation::NoPiecesRemaining(kind).into())
        }
    }

    fn invalidate_roads(&mut self) {
        self.road_runs = OnceLock::new();
    }

    /// Put a road on an empty side
    pub fn place_road(&mut self, color: Color, coord: EdgeCoordinate) -> Result<EdgeCoordinate, GameError> {
        let id = self.resolve_edge(coord)?;
        if self.edge(id).is_some_and(|e| e.road.is_some()) {
            return Err(RuleViolation::InvalidLocation(format!("edge {coord} has a road")).into());
        }
        self.take_piece(color, PieceKind::Road)?;
        self.edge_mut(id)?.road = Some(color);
        self.invalidate_roads();
        self.edge_coordinate(id)
            .ok_or_else(|| GameError::Corrupted(format!("edge {coord} has no hexes")))
    }

    /// Take a road off the board, returning its color
    pub fn remove_road(&mut self, coord: EdgeCoordinate) -> Result<Option<Color>, GameError> {
        let id = self.resolve_edge(coord)?;
        let removed = self.edge_mut(id)?.road.take();
        if let Some(color) = removed {
            self.pieces.entry(color).or_default().give_back(PieceKind::Road);
            self.invalidate_roads();
        }
        Ok(removed)
    }

    /// Put a settlement on an empty corner
    pub fn place_settlement(
        &mut self,
        color: Color,
        coord: NodeCoordinate,
    ) -> Result<NodeCoordinate, GameError> {
        let id = self.resolve_node(coord)?;
        if self.node(id).is_some_and(|n| n.building.is_some()) {
            return Err(RuleViolation::InvalidLocation(format!("node {coord} is built on")).into());
        }
        let settlement = BoardPiece::Settlement(color);
        self.take_piece(color, settlement.kind())?;
        self.node_mut(id)?.building = Some(settlement);
        self.node_coordinate(id)
            .ok_or_else(|| GameError::Corrupted(format!("node {coord} has no hexes")))
    }

    /// Upgrade this color's settlement, returning the settlement to the pool
    pub fn place_city(&mut self, color: Color, coord: NodeCoordinate) -> Result<NodeCoordinate, GameError> {
        let id = self.resolve_node(coord)?;
        let replaced = BoardPiece::Settlement(color);
        if self.node(id).and_then(|n| n.building) != Some(replaced) {
            return Err(RuleViolation::InvalidLocation(format!(
                "node {coord} has no settlement of {color:?}"
            ))
            .into());
        }
        let city = BoardPiece::City(color);
        self.take_piece(color, city.kind())?;
        self.node_mut(id)?.building = Some(city);
        self.pieces.entry(color).or_default().give_back(replaced.kind());
        self.node_coordinate(id)
            .ok_or_else(|| GameError::Corrupted(format!("node {coord} has no hexes")))
    }

    /// Move the bandit, returning where it was
    pub fn move_bandit(&mut self, target: HexCoordinate) -> Result<HexCoordinate, GameError> {
        if !self.tiles.contains_key(&target) {
            return Err(RuleViolation::InvalidBanditMove(format!("no hex at {target}")).into());
        }
        let current = self
            .bandit_location()
            .ok_or_else(|| GameError::Corrupted("no bandit on the board".into()))?;
        if current == target {
            return Err(
                RuleViolation::InvalidBanditMove(format!("bandit is already on {target}")).into(),
            );
        }
        self.tile_mut(current)?.has_bandit = false;
        self.tile_mut(target)?.has_bandit = true;
        Ok(current)
    }

    /// Put the bandit on a hex, clearing it anywhere else
    pub fn set_bandit(&mut self, target: HexCoordinate) -> Result<(), GameError> {
        if !self.tiles.contains_key(&target) {
            return Err(RuleViolation::InvalidBanditMove(format!("no hex at {target}")).into());
        }
        for hex in self.tiles.values_mut() {
            hex.has_bandit = hex.coord == target;
        }
        Ok(())
    }

    /// Draw the next development card
    pub fn draw_development_card(&mut self) -> Option<DevelopmentCard> {
        self.development_cards.draw()
    }

    /// Put a port on a corner
    pub fn set_port(&mut self, coord: NodeCoordinate, port: Port) -> Result<(), GameError> {
        let id = self.resolve_node(coord)?;
        self.node_mut(id)?.port = Some(port);
        Ok(())
    }

    // ==================== Longest Road ====================

    fn road_runs(&self) -> &[RoadRun] {
        self.road_runs.get_or_init(|| longest_road::analyze(self))
    }

    /// Length of this color's longest road
    pub fn longest_road(&self, color: Color) -> usize {
        self.road_runs()
            .iter()
            .filter(|run| run.color == color)
            .map(|run| run.edges.len())
            .max()
            .unwrap_or(0)
    }

    /// The unique holder of the longest road; ties mean nobody
    pub fn longest_road_holder(&self) -> Option<Color> {
        longest_road::holder(self.road_runs())
    }

    pub fn has_longest_road(&self, color: Color) -> bool {
        self.longest_road_holder() == Some(color)
    }

    /// Longest same-color path through the component containing `coord`
    pub fn longest_road_from(&self, coord: EdgeCoordinate) -> Vec<EdgeCoordinate> {
        self.edge_id(coord)
            .map(|id| longest_road::longest_from(self, id))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| self.edge_coordinate(id))
            .collect()
    }

    // ==================== Snapshots ====================

    /// Roads, buildings and bandit keyed by canonical coordinates
    pub fn placements(&self) -> BoardPlacements {
        let mut roads: Vec<(EdgeCoordinate, Color)> = self
            .live_edges()
            .filter_map(|(id, e)| Some((self.edge_coordinate(id)?, e.road?)))
            .collect();
        roads.sort();
        let mut buildings: Vec<(NodeCoordinate, BoardPiece)> = self
            .live_nodes()
            .filter_map(|(id, n)| Some((self.node_coordinate(id)?, n.building?)))
            .collect();
        buildings.sort_by_key(|(coord, _)| *coord);
        BoardPlacements {
            roads,
            buildings,
            bandit: self.bandit_location(),
        }
    }

    // ==================== Ports ====================

    /// Put the standard 4 generic and 5 specific ports on spread-out coastal sides
    fn add_standard_ports<R: Rng>(&mut self, rng: &mut R) {
        let mut ports = vec![Port::Generic; 4];
        ports.extend(Resource::ALL.map(Port::Specific));
        ports.shuffle(rng);

        let coastal: Vec<EdgeId> = self
            .live_edges()
            .filter(|(_, e)| e.is_coastal())
            .map(|(id, _)| id)
            .collect();
        let selected = self.select_distributed_edges(&coastal, ports.len(), rng);

        for (edge, port) in selected.into_iter().zip(ports) {
            for node in self.nodes_of_edge(edge) {
                if let Some(node) = self.nodes.get_mut(node.0).and_then(Option::as_mut) {
                    node.port.get_or_insert(port);
                }
            }
        }
    }

    /// Midpoint of a side in unit-radius pixels
    fn edge_midpoint(&self, id: EdgeId) -> (f64, f64) {
        match self.edge(id).and_then(|e| e.hexes.first()) {
            Some((hex, e)) => {
                let (x1, y1) = hex.center();
                let (x2, y2) = hex.neighbor(*e).center();
                ((x1 + x2) / 2.0, (y1 + y2) / 2.0)
            }
            None => (0.0, 0.0),
        }
    }

    /// Greedily pick `count` sides, each as far as possible from those already picked
    fn select_distributed_edges<R: Rng>(
        &self,
        candidates: &[EdgeId],
        count: usize,
        rng: &mut R,
    ) -> Vec<EdgeId> {
        let mut available = candidates.to_vec();
        available.shuffle(rng);
        let mut selected: Vec<EdgeId> = Vec::with_capacity(count);

        while selected.len() < count && !available.is_empty() {
            let distance_to_selected = |candidate: &EdgeId| {
                let (x1, y1) = self.edge_midpoint(*candidate);
                selected
                    .iter()
                    .map(|s| {
                        let (x2, y2) = self.edge_midpoint(*s);
                        ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
                    })
                    .fold(f64::MAX, f64::min)
            };
            let taken: Vec<NodeId> = selected.iter().flat_map(|s| self.nodes_of_edge(*s)).collect();
            let mut best: Option<(usize, f64)> = None;
            for (idx, candidate) in available.iter().enumerate() {
                // Two ports never share a corner
                if self.nodes_of_edge(*candidate).iter().any(|n| taken.contains(n)) {
                    continue;
                }
                let distance = distance_to_selected(candidate);
                if best.map_or(true, |(_, d)| distance > d) {
                    best = Some((idx, distance));
                }
            }
            match best {
                Some((idx, _)) => selected.push(available.remove(idx)),
                None => break,
            }
        }
        selected
    }
}

/// Assign numbers to producing hexes, retrying shuffles to keep 6 and 8 apart
fn assign_numbers_avoiding_adjacent_68<R: Rng>(
    coords: &[HexCoordinate],
    numbers: &[u8],
    rng: &mut R,
) -> Vec<u8> {
    const MAX_ATTEMPTS: usize = 100;

    let mut shuffled = numbers.to_vec();
    for _ in 0..MAX_ATTEMPTS {
        shuffled.shuffle(rng);
        if is_valid_number_placement(coords, &shuffled) {
            return shuffled;
        }
    }
    // Rare: settle for the last shuffle
    shuffled
}

/// No 6 or 8 next to another 6 or 8
fn is_valid_number_placement(coords: &[HexCoordinate], numbers: &[u8]) -> bool {
    let by_coord: BTreeMap<HexCoordinate, u8> =
        coords.iter().copied().zip(numbers.iter().copied()).collect();
    by_coord.iter().all(|(coord, number)| {
        !matches!(number, 6 | 8)
            || coord
                .neighbors()
                .iter()
                .all(|n| !matches!(by_coord.get(n), Some(6 | 8)))
    })
}
