//! Longest-road analysis over the road subgraph of a board.
//!
//! Roads of one color form an undirected graph where two sides are
//! neighbours when they meet at a corner. The search:
//! - starts from every "end" side of a component (at most one neighbour of
//!   the same color), or from every side when the component is a pure loop
//! - walks depth first, leaving each side through the corner it did not
//!   enter by, and never reuses a side already on the current path
//! - keeps the first longest path found
//!
//! Buildings of other colors on an interior corner do not cut a road here.

use crate::board::Board;
use crate::pieces::Color;
use crate::topology::{EdgeId, NodeId};
use std::collections::BTreeSet;

/// The longest path found in one connected component of roads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadRun {
    pub color: Color,
    pub edges: Vec<EdgeId>,
}

fn road_color(board: &Board, edge: EdgeId) -> Option<Color> {
    board.edge(edge).and_then(|e| e.road)
}

/// Same-color roads meeting `edge` at `node`
fn roads_at(board: &Board, node: NodeId, edge: EdgeId, color: Color) -> Vec<EdgeId> {
    board
        .edges_of_node(node)
        .into_iter()
        .filter(|other| *other != edge && road_color(board, *other) == Some(color))
        .collect()
}

/// Same-color roads meeting `edge` at either end
fn road_neighbors(board: &Board, edge: EdgeId, color: Color) -> Vec<EdgeId> {
    let mut neighbors = BTreeSet::new();
    for node in board.nodes_of_edge(edge) {
        neighbors.extend(roads_at(board, node, edge, color));
    }
    neighbors.into_iter().collect()
}

/// All roads connected to `start`
fn component(board: &Board, start: EdgeId, color: Color) -> BTreeSet<EdgeId> {
    let mut seen = BTreeSet::from([start]);
    let mut stack = vec![start];
    while let Some(edge) = stack.pop() {
        for next in road_neighbors(board, edge, color) {
            if seen.insert(next) {
                stack.push(next);
            }
        }
    }
    seen
}

/// Roads leaving `edge` through the corner other than `entered_by`
fn opposite_edges(board: &Board, edge: EdgeId, entered_by: NodeId, color: Color) -> Vec<EdgeId> {
    board
        .nodes_of_edge(edge)
        .into_iter()
        .filter(|node| *node != entered_by)
        .flat_map(|node| roads_at(board, node, edge, color))
        .collect()
}

fn shared_node(board: &Board, a: EdgeId, b: EdgeId) -> Option<NodeId> {
    let a_nodes = board.nodes_of_edge(a);
    board
        .nodes_of_edge(b)
        .into_iter()
        .find(|node| a_nodes.contains(node))
}

/// Longest extension of `path` whose last side was entered through `entered_by`
fn extend(board: &Board, color: Color, path: &mut Vec<EdgeId>, entered_by: NodeId) -> Vec<EdgeId> {
    let Some(&current) = path.last() else {
        return Vec::new();
    };
    let mut best = path.clone();
    for next in opposite_edges(board, current, entered_by, color) {
        if path.contains(&next) {
            continue;
        }
        let Some(via) = shared_node(board, current, next) else {
            continue;
        };
        path.push(next);
        let candidate = extend(board, color, path, via);
        path.pop();
        if candidate.len() > best.len() {
            best = candidate;
        }
    }
    best
}

/// Longest path in the component of `start`
pub(crate) fn longest_from(board: &Board, start: EdgeId) -> Vec<EdgeId> {
    let Some(color) = road_color(board, start) else {
        return Vec::new();
    };
    longest_in(board, &component(board, start, color), color)
}

fn longest_in(board: &Board, component: &BTreeSet<EdgeId>, color: Color) -> Vec<EdgeId> {
    let ends: Vec<EdgeId> = component
        .iter()
        .copied()
        .filter(|edge| road_neighbors(board, *edge, color).len() <= 1)
        .collect();
    let starts: Vec<EdgeId> = if ends.is_empty() {
        component.iter().copied().collect()
    } else {
        ends
    };

    let mut best: Vec<EdgeId> = Vec::new();
    for start in starts {
        // Entering through one corner means leaving through the other
        for entered_by in board.nodes_of_edge(start) {
            let candidate = extend(board, color, &mut vec![start], entered_by);
            if candidate.len() > best.len() {
                best = candidate;
            }
        }
    }
    best
}

/// One run per connected road component on the board
pub(crate) fn analyze(board: &Board) -> Vec<RoadRun> {
    let mut unexamined: BTreeSet<EdgeId> = board
        .live_edges()
        .filter(|(_, e)| e.road.is_some())
        .map(|(id, _)| id)
        .collect();

    let mut runs = Vec::new();
    while let Some(start) = unexamined.pop_first() {
        let Some(color) = road_color(board, start) else {
            continue;
        };
        let members = component(board, start, color);
        let edges = longest_in(board, &members, color);
        for edge in &members {
            unexamined.remove(edge);
        }
        runs.push(RoadRun { color, edges });
    }
    runs
}

/// The color owning the single longest run; ties mean nobody
pub(crate) fn holder(runs: &[RoadRun]) -> Option<Color> {
    let longest = runs.iter().map(|r| r.edges.len()).max()?;
    if longest == 0 {
        return None;
    }
    let mut best = runs.iter().filter(|r| r.edges.len() == longest);
    match (best.next(), best.next()) {
        (Some(run), None) => Some(run.color),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{EdgeCoordinate, HexCoordinate, NodeCoordinate};
    use crate::resource::Resource;
    use crate::topology::Tile;

    fn edge(x: i32, y: i32, e: u8) -> EdgeCoordinate {
        EdgeCoordinate::at(x, y, e).unwrap()
    }

    fn board() -> Board {
        let mut board = Board::new();
        for x in 0..5 {
            for y in 0..5 {
                board
                    .add_hex(HexCoordinate::new(x, y), Tile::new(Resource::Ore, 5).unwrap())
                    .unwrap();
            }
        }
        board
    }

    fn place(board: &mut Board, color: Color, edges: &[EdgeCoordinate]) {
        for e in edges {
            board.place_road(color, *e).unwrap();
        }
    }

    #[test]
    fn test_single_road() {
        let mut b = board();
        place(&mut b, Color::Red, &[edge(2, 2, 0)]);
        assert_eq!(b.longest_road(Color::Red), 1);
        assert!(b.has_longest_road(Color::Red));
    }

    #[test]
    fn test_straight_path() {
        let mut b = board();
        // Four sides around the top of (2,2)
        place(&mut b, Color::Red, &[edge(2, 2, 4), edge(2, 2, 5), edge(2, 2, 0), edge(2, 2, 1)]);
        assert_eq!(b.longest_road(Color::Red), 4);
        assert_eq!(b.longest_road_from(edge(2, 2, 0)).len(), 4);
    }

    #[test]
    fn test_tie_means_nobody_holds() {
        let mut b = board();
        place(&mut b, Color::Red, &[edge(1, 1, 0), edge(1, 1, 1), edge(1, 1, 2)]);
        assert!(b.has_longest_road(Color::Red));

        place(&mut b, Color::Blue, &[edge(3, 3, 0), edge(3, 3, 1)]);
        assert!(b.has_longest_road(Color::Red));

        place(&mut b, Color::Blue, &[edge(3, 3, 2)]);
        assert_eq!(b.longest_road(Color::Blue), 3);
        assert_eq!(b.longest_road_holder(), None);
        for color in Color::ALL {
            assert!(!b.has_longest_road(color));
        }
    }

    #[test]
    fn test_loop_counts_every_side() {
        let mut b = board();
        place(
            &mut b,
            Color::Red,
            &[edge(2, 2, 0), edge(2, 2, 1), edge(2, 2, 2), edge(2, 2, 3), edge(2, 2, 4)],
        );
        assert_eq!(b.longest_road_from(edge(2, 2, 2)).len(), 5);

        // Close the ring
        place(&mut b, Color::Red, &[edge(2, 2, 5)]);
        assert_eq!(b.longest_road_from(edge(2, 2, 3)).len(), 6);

        // A spur off the top-right corner of (2,2), between (2,1) and (3,1)
        place(&mut b, Color::Red, &[edge(2, 1, 2)]);
        assert_eq!(b.longest_road_from(edge(2, 2, 3)).len(), 7);
        assert_eq!(b.longest_road(Color::Red), 7);
    }

    #[test]
    fn test_branch_takes_longer_arm() {
        let mut b = board();
        // Path along the top of (2,2) with a one-side branch at its top-right corner
        place(&mut b, Color::Red, &[edge(2, 2, 4), edge(2, 2, 5), edge(2, 2, 0), edge(2, 2, 1), edge(2, 1, 2)]);
        assert_eq!(b.longest_road(Color::Red), 4);
    }

    #[test]
    fn test_separate_components() {
        let mut b = board();
        place(&mut b, Color::Red, &[edge(0, 0, 3), edge(0, 0, 2)]);
        place(&mut b, Color::Red, &[edge(4, 4, 0)]);
        let runs = analyze(&b);
        assert_eq!(runs.len(), 2);
        assert_eq!(b.longest_road(Color::Red), 2);
    }

    #[test]
    fn test_opposing_settlement_does_not_cut_road() {
        let mut b = board();
        place(&mut b, Color::Red, &[edge(2, 2, 5), edge(2, 2, 0), edge(2, 2, 1)]);
        // Blue sits on the corner between sides 0 and 1
        b.place_settlement(Color::Blue, NodeCoordinate::at(2, 2, 0).unwrap())
            .unwrap();
        assert_eq!(b.longest_road(Color::Red), 3);
    }

    #[test]
    fn test_cache_refreshes_after_removal() {
        let mut b = board();
        place(&mut b, Color::Red, &[edge(2, 2, 0), edge(2, 2, 1)]);
        assert_eq!(b.longest_road(Color::Red), 2);
        b.remove_road(edge(2, 2, 1)).unwrap();
        assert_eq!(b.longest_road(Color::Red), 1);
    }
}
