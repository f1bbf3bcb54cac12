//! Board occupancy on top of the immutable [`CatanMap`] topology.
//!
//! Besides buildings and roads, the board keeps per-color connected components
//! (node sets reachable through that color's roads) so that buildable nodes,
//! buildable edges and longest-road lengths are cheap to maintain.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use smallvec::SmallVec;

use crate::coords::CubeCoord;
use crate::types::{BuildingKind, Color, Resource};

mod map;

pub use map::{
    CatanMap, EdgeId, LandTile, MapShuffleOverrides, MapTemplate, MapType, NodeId, Port,
    Production, Tile, TileId, TileTemplate, normalize_edge, number_probability,
};

/// Shortest road that qualifies for the longest-road title.
pub const MIN_LONGEST_ROAD: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("a building already exists at node {0}")]
    NodeOccupied(NodeId),
    #[error("node {0} is not buildable (distance rule or not connected)")]
    NodeNotBuildable(NodeId),
    #[error("edge {0:?} is not a land edge")]
    UnknownEdge(EdgeId),
    #[error("edge {0:?} already has a road")]
    EdgeOccupied(EdgeId),
    #[error("edge {0:?} is not connected to the road network")]
    EdgeNotConnected(EdgeId),
    #[error("no settlement of this color at node {0}")]
    NoSettlement(NodeId),
}

/// Longest-road bookkeeping after a build: who held the title before, who
/// holds it now, and every color's longest road length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoadUpdate {
    pub previous: Option<Color>,
    pub current: Option<Color>,
    pub lengths: [usize; 4],
}

impl RoadUpdate {
    pub fn length_of(&self, color: Color) -> usize {
        self.lengths[color.index()]
    }

    pub fn changed_hands(&self) -> bool {
        self.previous != self.current
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    pub map: Arc<CatanMap>,
    buildings: Vec<Option<(Color, BuildingKind)>>,
    roads: BTreeMap<EdgeId, Color>,
    /// Node sets per color. Sets may include unowned or enemy nodes at the
    /// ends of roads.
    components: [Vec<BTreeSet<NodeId>>; 4],
    board_buildable: BTreeSet<NodeId>,
    road_lengths: [usize; 4],
    /// Per color, entry `n - 1` is the road build at which that color first
    /// had a road of length `n`. Breaks ties when a split vacates the title.
    road_reached: [SmallVec<[u32; 16]>; 4],
    road_builds: u32,
    pub road_color: Option<Color>,
    pub road_length: usize,
    pub robber_coordinate: CubeCoord,
    edge_cache: [OnceCell<Vec<EdgeId>>; 4],
}

impl Board {
    pub fn new(map: Arc<CatanMap>) -> Self {
        Self {
            buildings: vec![None; map.num_nodes()],
            roads: BTreeMap::new(),
            components: Default::default(),
            board_buildable: map.land_nodes.clone(),
            road_lengths: [0; 4],
            road_reached: Default::default(),
            road_builds: 0,
            road_color: None,
            road_length: 0,
            robber_coordinate: map.robber_start(),
            edge_cache: Default::default(),
            map,
        }
    }

    pub fn build_settlement(
        &mut self,
        color: Color,
        node: NodeId,
        initial_build_phase: bool,
    ) -> Result<RoadUpdate, BoardError> {
        if self.get_node_color(node).is_some() {
            return Err(BoardError::NodeOccupied(node));
        }
        if self
            .buildable_node_ids(color, initial_build_phase)
            .binary_search(&node)
            .is_err()
        {
            return Err(BoardError::NodeNotBuildable(node));
        }

        self.buildings[node as usize] = Some((color, BuildingKind::Settlement));
        let previous = self.road_color;

        if initial_build_phase {
            self.components[color.index()].push(BTreeSet::from([node]));
        } else {
            self.cut_enemy_roads(color, node);
        }

        self.board_buildable.remove(&node);
        for neighbor in self.map.neighbors(node) {
            self.board_buildable.remove(neighbor);
        }
        self.invalidate_edge_cache();

        Ok(self.road_update(previous))
    }

    /// A settlement between two roads of one enemy color splits that
    /// enemy's component in two.
    fn cut_enemy_roads(&mut self, color: Color, node: NodeId) {
        let mut edges_by_color: BTreeMap<Color, Vec<EdgeId>> = BTreeMap::new();
        for edge in self.map.edges_of(node) {
            if let Some(owner) = self.get_edge_color(*edge) {
                edges_by_color.entry(owner).or_default().push(*edge);
            }
        }

        for (enemy, edges) in edges_by_color {
            if enemy == color || edges.len() != 2 {
                continue;
            }
            let a = other_end(edges[0], node);
            let c = other_end(edges[1], node);
            let a_nodes = self.bfs_walk(a, enemy);
            let c_nodes = self.bfs_walk(c, enemy);

            let components = &mut self.components[enemy.index()];
            if let Some(index) = components.iter().position(|set| set.contains(&node)) {
                components.remove(index);
            }
            components.push(a_nodes);
            components.push(c_nodes);

            let new_length = self.components[enemy.index()]
                .iter()
                .map(|component| self.longest_acyclic_path(component, enemy).len())
                .max()
                .unwrap_or(0);
            self.road_lengths[enemy.index()] = new_length;

            if self.road_color == Some(enemy) {
                self.reassign_longest_road(enemy);
            }
        }
    }

    /// Title after the holder's road was cut. The holder keeps it while still
    /// (possibly jointly) longest; otherwise it goes to whichever leader
    /// reached the leading length first, or to nobody below the minimum.
    fn reassign_longest_road(&mut self, holder: Color) {
        let max = self.road_lengths.iter().copied().max().unwrap_or(0);
        self.road_length = max;
        let holder_length = self.road_lengths[holder.index()];
        if holder_length == max && max >= MIN_LONGEST_ROAD {
            return;
        }
        if max < MIN_LONGEST_ROAD {
            self.road_color = None;
            return;
        }
        self.road_color = Color::ORDERED
            .into_iter()
            .filter(|c| self.road_lengths[c.index()] == max)
            .min_by_key(|c| {
                self.road_reached[c.index()]
                    .get(max - 1)
                    .copied()
                    .unwrap_or(u32::MAX)
            });
    }

    /// Nodes reachable from `start` over `color` roads; enemy nodes end the
    /// walk but are included.
    pub fn bfs_walk(&self, start: NodeId, color: Color) -> BTreeSet<NodeId> {
        let mut agenda = vec![start];
        let mut visited = BTreeSet::new();
        while let Some(node) = agenda.pop() {
            visited.insert(node);
            if self.is_enemy_node(node, color) {
                continue;
            }
            for &neighbor in self.map.neighbors(node) {
                if !visited.contains(&neighbor)
                    && self.get_edge_color((node, neighbor)) == Some(color)
                {
                    agenda.push(neighbor);
                }
            }
        }
        visited
    }

    pub fn build_road(&mut self, color: Color, edge: EdgeId) -> Result<RoadUpdate, BoardError> {
        let edge = normalize_edge(edge);
        if !self.map.is_land_edge(edge) {
            return Err(BoardError::UnknownEdge(edge));
        }
        if self.roads.contains_key(&edge) {
            return Err(BoardError::EdgeOccupied(edge));
        }
        if self.buildable_edges(color).binary_search(&edge).is_err() {
            return Err(BoardError::EdgeNotConnected(edge));
        }

        self.roads.insert(edge, color);
        let (a, b) = edge;
        let a_enemy = self.is_enemy_node(a, color);
        let b_enemy = self.is_enemy_node(b, color);
        let components = &mut self.components[color.index()];
        let a_index = components.iter().position(|set| set.contains(&a));
        let b_index = components.iter().position(|set| set.contains(&b));

        let index = match (a_index, b_index) {
            (None, Some(j)) => {
                if !a_enemy {
                    components[j].insert(a);
                }
                j
            }
            (Some(i), None) => {
                if !b_enemy {
                    components[i].insert(b);
                }
                i
            }
            (Some(i), Some(j)) if i != j => {
                let (low, high) = (i.min(j), i.max(j));
                let absorbed = components.remove(high);
                let mut merged = components.remove(low);
                merged.extend(absorbed);
                components.push(merged);
                components.len() - 1
            }
            (Some(i), Some(_)) => i,
            (None, None) => {
                components.push(BTreeSet::from([a, b]));
                components.len() - 1
            }
        };

        let previous = self.road_color;
        let candidate = self
            .longest_acyclic_path(&self.components[color.index()][index], color)
            .len();
        let slot = &mut self.road_lengths[color.index()];
        *slot = (*slot).max(candidate);
        self.road_builds += 1;
        let reached = &mut self.road_reached[color.index()];
        while reached.len() < candidate {
            reached.push(self.road_builds);
        }
        if candidate >= MIN_LONGEST_ROAD && candidate > self.road_length {
            self.road_color = Some(color);
            self.road_length = candidate;
        }
        self.invalidate_edge_cache();

        Ok(self.road_update(previous))
    }

    pub fn build_city(&mut self, color: Color, node: NodeId) -> Result<(), BoardError> {
        match self.buildings.get(node as usize).copied().flatten() {
            Some((owner, BuildingKind::Settlement)) if owner == color => {
                self.buildings[node as usize] = Some((color, BuildingKind::City));
                Ok(())
            }
            _ => Err(BoardError::NoSettlement(node)),
        }
    }

    /// Sorted node ids where `color` may settle.
    pub fn buildable_node_ids(&self, color: Color, initial_build_phase: bool) -> Vec<NodeId> {
        if initial_build_phase {
            return self.board_buildable.iter().copied().collect();
        }
        let reachable: BTreeSet<NodeId> = self.components[color.index()]
            .iter()
            .flatten()
            .copied()
            .collect();
        reachable
            .intersection(&self.board_buildable)
            .copied()
            .collect()
    }

    /// Sorted unowned edges touching the non-enemy nodes of `color`'s network.
    pub fn buildable_edges(&self, color: Color) -> &[EdgeId] {
        self.edge_cache[color.index()].get_or_init(|| {
            let mut expandable = BTreeSet::new();
            for node in self.components[color.index()].iter().flatten() {
                if self.is_enemy_node(*node, color) {
                    continue;
                }
                for edge in self.map.edges_of(*node) {
                    if !self.roads.contains_key(edge) {
                        expandable.insert(*edge);
                    }
                }
            }
            expandable.into_iter().collect()
        })
    }

    /// Longest simple path over `color`'s roads starting anywhere in
    /// `component`, never passing through enemy buildings.
    pub fn longest_acyclic_path(&self, component: &BTreeSet<NodeId>, color: Color) -> Vec<EdgeId> {
        let mut best = Vec::new();
        let mut path = Vec::new();
        for &start in component {
            self.extend_path(start, color, &mut path, &mut best);
        }
        best
    }

    fn extend_path(
        &self,
        node: NodeId,
        color: Color,
        path: &mut Vec<EdgeId>,
        best: &mut Vec<EdgeId>,
    ) {
        for &neighbor in self.map.neighbors(node) {
            let edge = normalize_edge((node, neighbor));
            if self.roads.get(&edge) != Some(&color)
                || self.is_enemy_node(neighbor, color)
                || path.contains(&edge)
            {
                continue;
            }
            path.push(edge);
            self.extend_path(neighbor, color, path, best);
            path.pop();
        }
        if path.len() > best.len() {
            best.clone_from(path);
        }
    }

    pub fn connected_components(&self, color: Color) -> &[BTreeSet<NodeId>] {
        &self.components[color.index()]
    }

    /// Longest path of every component of `color`.
    pub fn continuous_roads_by_player(&self, color: Color) -> Vec<Vec<EdgeId>> {
        self.components[color.index()]
            .iter()
            .map(|component| self.longest_acyclic_path(component, color))
            .collect()
    }

    pub fn road_length_of(&self, color: Color) -> usize {
        self.road_lengths[color.index()]
    }

    /// Port resources (`None` is the 3:1 port) touched by `color`'s buildings.
    pub fn player_port_resources(&self, color: Color) -> BTreeSet<Option<Resource>> {
        self.map
            .port_nodes
            .iter()
            .filter(|(_, nodes)| nodes.iter().any(|n| self.get_node_color(*n) == Some(color)))
            .map(|(resource, _)| *resource)
            .collect()
    }

    pub fn get_building(&self, node: NodeId) -> Option<(Color, BuildingKind)> {
        self.buildings.get(node as usize).copied().flatten()
    }

    pub fn get_node_color(&self, node: NodeId) -> Option<Color> {
        self.get_building(node).map(|(color, _)| color)
    }

    pub fn get_edge_color(&self, edge: EdgeId) -> Option<Color> {
        self.roads.get(&normalize_edge(edge)).copied()
    }

    pub fn is_enemy_node(&self, node: NodeId, color: Color) -> bool {
        matches!(self.get_node_color(node), Some(owner) if owner != color)
    }

    pub fn roads(&self) -> impl Iterator<Item = (EdgeId, Color)> + '_ {
        self.roads.iter().map(|(edge, color)| (*edge, *color))
    }

    /// Occupied nodes in id order.
    pub fn buildings(&self) -> impl Iterator<Item = (NodeId, Color, BuildingKind)> + '_ {
        self.buildings
            .iter()
            .enumerate()
            .filter_map(|(node, building)| building.map(|(c, k)| (node as NodeId, c, k)))
    }

    fn road_update(&self, previous: Option<Color>) -> RoadUpdate {
        RoadUpdate {
            previous,
            current: self.road_color,
            lengths: self.road_lengths,
        }
    }

    fn invalidate_edge_cache(&mut self) {
        self.edge_cache = Default::default();
    }
}

fn other_end(edge: EdgeId, node: NodeId) -> NodeId {
    if edge.0 == node { edge.1 } else { edge.0 }
}
