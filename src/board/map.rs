use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::{Display, EnumString};

use crate::coords::{CubeCoord, Direction};
use crate::types::{EdgeRef, NodeRef, Resource};

pub type NodeId = u16;
pub type EdgeId = (NodeId, NodeId);
pub type TileId = u16;

/// Per-resource expected yield, indexed by `Resource::index`.
pub type Production = [f64; 5];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandTile {
    pub id: TileId,
    pub coordinate: CubeCoord,
    pub resource: Option<Resource>,
    pub number: Option<u8>,
    pub nodes: [NodeId; 6],
    pub edges: [EdgeId; 6],
}

impl LandTile {
    pub fn node(&self, node_ref: NodeRef) -> NodeId {
        self.nodes[node_ref.index()]
    }

    pub fn is_desert(&self) -> bool {
        self.resource.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    pub id: u16,
    pub resource: Option<Resource>,
    pub direction: Direction,
    pub nodes: [NodeId; 6],
    pub edges: [EdgeId; 6],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Tile {
    Land(LandTile),
    Port(Port),
    Water {
        nodes: [NodeId; 6],
        edges: [EdgeId; 6],
    },
}

impl Tile {
    fn nodes(&self) -> &[NodeId; 6] {
        match self {
            Tile::Land(tile) => &tile.nodes,
            Tile::Port(port) => &port.nodes,
            Tile::Water { nodes, .. } => nodes,
        }
    }

    fn edges(&self) -> &[EdgeId; 6] {
        match self {
            Tile::Land(tile) => &tile.edges,
            Tile::Port(port) => &port.edges,
            Tile::Water { edges, .. } => edges,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TileTemplate {
    Land,
    Water,
    Port(Direction),
}

#[derive(Debug, Clone)]
pub struct MapTemplate {
    pub numbers: Vec<u8>,
    pub port_resources: Vec<Option<Resource>>,
    pub tile_resources: Vec<Option<Resource>>,
    pub topology: Vec<(CubeCoord, TileTemplate)>,
}

impl MapTemplate {
    pub fn base() -> &'static MapTemplate {
        &BASE_TEMPLATE
    }

    pub fn mini() -> &'static MapTemplate {
        &MINI_TEMPLATE
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum MapType {
    #[default]
    Base,
    Tournament,
    Mini,
}

/// Fixed arrangement replacing the shuffled template lists. Lists are consumed
/// from the back, like the shuffled ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapShuffleOverrides<'a> {
    pub numbers: Option<&'a [u8]>,
    pub port_resources: Option<&'a [Option<Resource>]>,
    pub tile_resources: Option<&'a [Option<Resource>]>,
}

/// Immutable topology of one game. Shared between state copies via `Arc`.
#[derive(Debug, Clone)]
pub struct CatanMap {
    pub tiles: BTreeMap<CubeCoord, Tile>,
    /// Indexed by tile id.
    pub land_tiles: Vec<LandTile>,
    pub land_nodes: BTreeSet<NodeId>,
    pub land_edges: Vec<EdgeId>,
    pub port_nodes: BTreeMap<Option<Resource>, BTreeSet<NodeId>>,
    pub ports_by_id: BTreeMap<u16, Port>,
    adjacent_tiles: Vec<SmallVec<[TileId; 3]>>,
    node_neighbors: Vec<SmallVec<[NodeId; 3]>>,
    node_edges: Vec<SmallVec<[EdgeId; 3]>>,
    node_production: Vec<Production>,
    coordinate_index: BTreeMap<CubeCoord, TileId>,
}

impl CatanMap {
    pub fn build_with_rng(map_type: MapType, rng: &mut impl rand::Rng) -> Self {
        match map_type {
            MapType::Base => Self::from_template_with_rng(
                MapTemplate::base(),
                MapShuffleOverrides::default(),
                rng,
            ),
            MapType::Mini => Self::from_template_with_rng(
                MapTemplate::mini(),
                MapShuffleOverrides::default(),
                rng,
            ),
            MapType::Tournament => Self::from_template_with_rng(
                MapTemplate::base(),
                MapShuffleOverrides {
                    numbers: Some(&TOURNAMENT_NUMBERS),
                    port_resources: Some(&TOURNAMENT_PORTS),
                    tile_resources: Some(&TOURNAMENT_TILES),
                },
                rng,
            ),
        }
    }

    pub fn from_template_with_rng(
        template: &MapTemplate,
        overrides: MapShuffleOverrides<'_>,
        rng: &mut impl rand::Rng,
    ) -> Self {
        let (tiles, num_nodes) = initialize_tiles(template, overrides, rng);
        Self::from_tiles(tiles, num_nodes)
    }

    fn from_tiles(tiles: BTreeMap<CubeCoord, Tile>, num_nodes: usize) -> Self {
        let mut land_tiles: Vec<LandTile> = tiles
            .values()
            .filter_map(|tile| match tile {
                Tile::Land(land) => Some(land.clone()),
                _ => None,
            })
            .collect();
        land_tiles.sort_by_key(|tile| tile.id);

        let coordinate_index = land_tiles
            .iter()
            .map(|tile| (tile.coordinate, tile.id))
            .collect();

        let land_nodes: BTreeSet<NodeId> = land_tiles
            .iter()
            .flat_map(|tile| tile.nodes.iter().copied())
            .collect();
        let land_edges: Vec<EdgeId> = land_tiles
            .iter()
            .flat_map(|tile| tile.edges.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut port_nodes: BTreeMap<Option<Resource>, BTreeSet<NodeId>> = BTreeMap::new();
        let mut ports_by_id = BTreeMap::new();
        for tile in tiles.values() {
            if let Tile::Port(port) = tile {
                let (first, second) = port_node_refs(port.direction);
                let entry = port_nodes.entry(port.resource).or_default();
                entry.insert(port.nodes[first.index()]);
                entry.insert(port.nodes[second.index()]);
                ports_by_id.insert(port.id, port.clone());
            }
        }

        let mut adjacent_tiles = vec![SmallVec::new(); num_nodes];
        for tile in &land_tiles {
            for node in tile.nodes {
                adjacent_tiles[node as usize].push(tile.id);
            }
        }

        let mut node_neighbors = vec![SmallVec::new(); num_nodes];
        let mut node_edges = vec![SmallVec::new(); num_nodes];
        for &(a, b) in &land_edges {
            node_neighbors[a as usize].push(b);
            node_neighbors[b as usize].push(a);
            node_edges[a as usize].push((a, b));
            node_edges[b as usize].push((a, b));
        }

        let node_production = adjacent_tiles
            .iter()
            .map(|tile_ids| {
                let mut production = [0.0; 5];
                for tile_id in tile_ids {
                    let tile = &land_tiles[*tile_id as usize];
                    if let (Some(resource), Some(number)) = (tile.resource, tile.number) {
                        production[resource.index()] += number_probability(number);
                    }
                }
                production
            })
            .collect();

        Self {
            tiles,
            land_tiles,
            land_nodes,
            land_edges,
            port_nodes,
            ports_by_id,
            adjacent_tiles,
            node_neighbors,
            node_edges,
            node_production,
            coordinate_index,
        }
    }

    /// Count of node ids, water corners included.
    pub fn num_nodes(&self) -> usize {
        self.node_neighbors.len()
    }

    pub fn land_tile_at(&self, coordinate: CubeCoord) -> Option<&LandTile> {
        self.coordinate_index
            .get(&coordinate)
            .map(|id| &self.land_tiles[*id as usize])
    }

    /// Where the robber starts: the desert, or the first land tile when the
    /// map has none.
    pub fn robber_start(&self) -> CubeCoord {
        self.land_tiles
            .iter()
            .find(|tile| tile.is_desert())
            .or_else(|| self.land_tiles.first())
            .map(|tile| tile.coordinate)
            .unwrap_or_default()
    }

    pub fn adjacent_tiles(&self, node: NodeId) -> impl Iterator<Item = &LandTile> + '_ {
        self.adjacent_tiles
            .get(node as usize)
            .into_iter()
            .flatten()
            .map(|id| &self.land_tiles[*id as usize])
    }

    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.node_neighbors
            .get(node as usize)
            .map(|n| n.as_slice())
            .unwrap_or(&[])
    }

    pub fn edges_of(&self, node: NodeId) -> &[EdgeId] {
        self.node_edges
            .get(node as usize)
            .map(|e| e.as_slice())
            .unwrap_or(&[])
    }

    pub fn node_production(&self, node: NodeId) -> &Production {
        static EMPTY: Production = [0.0; 5];
        self.node_production.get(node as usize).unwrap_or(&EMPTY)
    }

    pub fn is_land_edge(&self, edge: EdgeId) -> bool {
        self.land_edges.binary_search(&normalize_edge(edge)).is_ok()
    }
}

pub fn normalize_edge(edge: EdgeId) -> EdgeId {
    let (a, b) = edge;
    if a <= b { (a, b) } else { (b, a) }
}

/// Chance that two dice sum to `number`.
pub const fn number_probability(number: u8) -> f64 {
    let ways = match number {
        2 | 12 => 1,
        3 | 11 => 2,
        4 | 10 => 3,
        5 | 9 => 4,
        6 | 8 => 5,
        7 => 6,
        _ => 0,
    };
    ways as f64 / 36.0
}

const fn port_node_refs(direction: Direction) -> (NodeRef, NodeRef) {
    match direction {
        Direction::West => (NodeRef::NorthWest, NodeRef::SouthWest),
        Direction::NorthWest => (NodeRef::North, NodeRef::NorthWest),
        Direction::NorthEast => (NodeRef::NorthEast, NodeRef::North),
        Direction::East => (NodeRef::SouthEast, NodeRef::NorthEast),
        Direction::SouthEast => (NodeRef::South, NodeRef::SouthEast),
        Direction::SouthWest => (NodeRef::SouthWest, NodeRef::South),
    }
}

/// For a neighbor in `Direction`, which of our corners and side coincide with
/// which of theirs: `(ours, theirs)`.
const SHARED_BORDER: [(Direction, [(NodeRef, NodeRef); 2], (EdgeRef, EdgeRef)); 6] = [
    (
        Direction::East,
        [
            (NodeRef::NorthEast, NodeRef::NorthWest),
            (NodeRef::SouthEast, NodeRef::SouthWest),
        ],
        (EdgeRef::East, EdgeRef::West),
    ),
    (
        Direction::SouthEast,
        [
            (NodeRef::South, NodeRef::NorthWest),
            (NodeRef::SouthEast, NodeRef::North),
        ],
        (EdgeRef::SouthEast, EdgeRef::NorthWest),
    ),
    (
        Direction::SouthWest,
        [
            (NodeRef::South, NodeRef::NorthEast),
            (NodeRef::SouthWest, NodeRef::North),
        ],
        (EdgeRef::SouthWest, EdgeRef::NorthEast),
    ),
    (
        Direction::West,
        [
            (NodeRef::NorthWest, NodeRef::NorthEast),
            (NodeRef::SouthWest, NodeRef::SouthEast),
        ],
        (EdgeRef::West, EdgeRef::East),
    ),
    (
        Direction::NorthWest,
        [
            (NodeRef::North, NodeRef::SouthEast),
            (NodeRef::NorthWest, NodeRef::South),
        ],
        (EdgeRef::NorthWest, EdgeRef::SouthEast),
    ),
    (
        Direction::NorthEast,
        [
            (NodeRef::North, NodeRef::SouthWest),
            (NodeRef::NorthEast, NodeRef::South),
        ],
        (EdgeRef::NorthEast, EdgeRef::SouthWest),
    ),
];

fn initialize_tiles(
    template: &MapTemplate,
    overrides: MapShuffleOverrides<'_>,
    rng: &mut impl rand::Rng,
) -> (BTreeMap<CubeCoord, Tile>, usize) {
    let mut numbers = shuffled_or_fixed(&template.numbers, overrides.numbers, rng);
    let mut port_resources =
        shuffled_or_fixed(&template.port_resources, overrides.port_resources, rng);
    let mut tile_resources =
        shuffled_or_fixed(&template.tile_resources, overrides.tile_resources, rng);

    let mut tiles = BTreeMap::new();
    let mut node_autoinc: NodeId = 0;
    let mut land_autoinc: TileId = 0;
    let mut port_autoinc: u16 = 0;

    for &(coordinate, kind) in &template.topology {
        let (nodes, edges) = nodes_and_edges(&tiles, coordinate, &mut node_autoinc);
        let tile = match kind {
            TileTemplate::Land => {
                let resource = tile_resources.pop().flatten();
                let number = resource.and_then(|_| numbers.pop());
                land_autoinc += 1;
                Tile::Land(LandTile {
                    id: land_autoinc - 1,
                    coordinate,
                    resource,
                    number,
                    nodes,
                    edges,
                })
            }
            TileTemplate::Water => Tile::Water { nodes, edges },
            TileTemplate::Port(direction) => {
                port_autoinc += 1;
                Tile::Port(Port {
                    id: port_autoinc - 1,
                    resource: port_resources.pop().flatten(),
                    direction,
                    nodes,
                    edges,
                })
            }
        };
        tiles.insert(coordinate, tile);
    }

    (tiles, node_autoinc as usize)
}

fn shuffled_or_fixed<T: Clone>(
    template: &[T],
    fixed: Option<&[T]>,
    rng: &mut impl rand::Rng,
) -> Vec<T> {
    match fixed {
        Some(values) => values.to_vec(),
        None => {
            let mut values = template.to_vec();
            values.shuffle(rng);
            values
        }
    }
}

fn nodes_and_edges(
    tiles: &BTreeMap<CubeCoord, Tile>,
    coordinate: CubeCoord,
    node_autoinc: &mut NodeId,
) -> ([NodeId; 6], [EdgeId; 6]) {
    let mut nodes: [Option<NodeId>; 6] = [None; 6];
    let mut edges: [Option<EdgeId>; 6] = [None; 6];

    for (direction, corners, (our_side, their_side)) in SHARED_BORDER {
        let Some(neighbor) = tiles.get(&coordinate.neighbor(direction)) else {
            continue;
        };
        for (ours, theirs) in corners {
            nodes[ours.index()] = Some(neighbor.nodes()[theirs.index()]);
        }
        edges[our_side.index()] = Some(neighbor.edges()[their_side.index()]);
    }

    let nodes: [NodeId; 6] = std::array::from_fn(|i| match nodes[i] {
        Some(id) => id,
        None => {
            *node_autoinc += 1;
            *node_autoinc - 1
        }
    });
    let edges: [EdgeId; 6] = std::array::from_fn(|i| {
        edges[i].unwrap_or_else(|| {
            let (a, b) = EdgeRef::ALL[i].nodes();
            normalize_edge((nodes[a.index()], nodes[b.index()]))
        })
    });
    (nodes, edges)
}

static TOURNAMENT_NUMBERS: [u8; 18] = [10, 8, 3, 6, 2, 5, 10, 8, 4, 11, 12, 9, 5, 4, 9, 11, 3, 6];

static TOURNAMENT_PORTS: [Option<Resource>; 9] = [
    None,
    Some(Resource::Sheep),
    None,
    Some(Resource::Ore),
    Some(Resource::Wheat),
    None,
    Some(Resource::Wood),
    Some(Resource::Brick),
    None,
];

static TOURNAMENT_TILES: [Option<Resource>; 20] = [
    None,
    Some(Resource::Wood),
    Some(Resource::Sheep),
    Some(Resource::Sheep),
    Some(Resource::Wood),
    Some(Resource::Wheat),
    Some(Resource::Wood),
    Some(Resource::Wheat),
    Some(Resource::Brick),
    Some(Resource::Sheep),
    Some(Resource::Brick),
    Some(Resource::Sheep),
    Some(Resource::Wheat),
    Some(Resource::Wheat),
    Some(Resource::Ore),
    Some(Resource::Brick),
    Some(Resource::Ore),
    Some(Resource::Wood),
    Some(Resource::Ore),
    None,
];

static BASE_TEMPLATE: Lazy<MapTemplate> = Lazy::new(|| {
    use Resource::*;
    MapTemplate {
        numbers: vec![2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12],
        port_resources: vec![
            Some(Wood),
            Some(Brick),
            Some(Sheep),
            Some(Wheat),
            Some(Ore),
            None,
            None,
            None,
            None,
        ],
        tile_resources: [(Wood, 4), (Brick, 3), (Sheep, 4), (Wheat, 4), (Ore, 3)]
            .into_iter()
            .flat_map(|(resource, count)| std::iter::repeat(Some(resource)).take(count))
            .chain(std::iter::once(None))
            .collect(),
        topology: base_topology(),
    }
});

static MINI_TEMPLATE: Lazy<MapTemplate> = Lazy::new(|| MapTemplate {
    numbers: vec![3, 4, 5, 6, 8, 9, 10],
    port_resources: vec![],
    tile_resources: vec![
        Some(Resource::Wood),
        None,
        Some(Resource::Brick),
        Some(Resource::Sheep),
        Some(Resource::Wheat),
        Some(Resource::Wheat),
        Some(Resource::Ore),
    ],
    topology: base_topology()
        .into_iter()
        .take(19)
        .enumerate()
        .map(|(i, (coord, _))| (coord, if i < 7 { TileTemplate::Land } else { TileTemplate::Water }))
        .collect(),
});

fn base_topology() -> Vec<(CubeCoord, TileTemplate)> {
    use Direction::*;
    use TileTemplate::{Land, Port, Water};
    let land_and_ring: [(i32, i32, i32); 19] = [
        (0, 0, 0),
        (1, -1, 0),
        (0, -1, 1),
        (-1, 0, 1),
        (-1, 1, 0),
        (0, 1, -1),
        (1, 0, -1),
        (2, -2, 0),
        (1, -2, 1),
        (0, -2, 2),
        (-1, -1, 2),
        (-2, 0, 2),
        (-2, 1, 1),
        (-2, 2, 0),
        (-1, 2, -1),
        (0, 2, -2),
        (1, 1, -2),
        (2, 0, -2),
        (2, -1, -1),
    ];
    let outer: [((i32, i32, i32), TileTemplate); 18] = [
        ((3, -3, 0), Port(West)),
        ((2, -3, 1), Water),
        ((1, -3, 2), Port(NorthWest)),
        ((0, -3, 3), Water),
        ((-1, -2, 3), Port(NorthWest)),
        ((-2, -1, 3), Water),
        ((-3, 0, 3), Port(NorthEast)),
        ((-3, 1, 2), Water),
        ((-3, 2, 1), Port(East)),
        ((-3, 3, 0), Water),
        ((-2, 3, -1), Port(East)),
        ((-1, 3, -2), Water),
        ((0, 3, -3), Port(SouthEast)),
        ((1, 2, -3), Water),
        ((2, 1, -3), Port(SouthWest)),
        ((3, 0, -3), Water),
        ((3, -1, -2), Port(SouthWest)),
        ((3, -2, -1), Water),
    ];
    land_and_ring
        .into_iter()
        .map(|xyz| (xyz, Land))
        .chain(outer)
        .map(|((x, y, z), kind)| (CubeCoord::new(x, y, z), kind))
        .collect()
}
