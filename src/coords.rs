use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    East,
    SouthEast,
    SouthWest,
    West,
    NorthWest,
    NorthEast,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::East,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
        Direction::NorthEast,
    ];

    pub const fn unit_vector(self) -> CubeCoord {
        match self {
            Direction::NorthEast => CubeCoord { x: 1, y: 0, z: -1 },
            Direction::SouthWest => CubeCoord { x: -1, y: 0, z: 1 },
            Direction::NorthWest => CubeCoord { x: 0, y: 1, z: -1 },
            Direction::SouthEast => CubeCoord { x: 0, y: -1, z: 1 },
            Direction::East => CubeCoord { x: 1, y: -1, z: 0 },
            Direction::West => CubeCoord { x: -1, y: 1, z: 0 },
        }
    }
}

/// Hex position in cube coordinates; `x + y + z == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CubeCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CubeCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        debug_assert!(x + y + z == 0, "cube coordinates must sum to zero");
        Self { x, y, z }
    }

    pub fn add(self, other: CubeCoord) -> Self {
        CubeCoord::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn neighbor(self, direction: Direction) -> Self {
        self.add(direction.unit_vector())
    }

    pub fn neighbors(self) -> impl Iterator<Item = CubeCoord> {
        Direction::ALL.into_iter().map(move |dir| self.neighbor(dir))
    }

    /// Hex distance from the origin.
    pub fn ring(self) -> i32 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }
}

impl Default for CubeCoord {
    fn default() -> Self {
        CubeCoord::new(0, 0, 0)
    }
}

impl fmt::Display for CubeCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_vectors_sum_to_zero() {
        for dir in Direction::ALL {
            let v = dir.unit_vector();
            assert_eq!(v.x + v.y + v.z, 0, "{dir}");
        }
    }

    #[test]
    fn six_distinct_neighbors_on_first_ring() {
        let origin = CubeCoord::default();
        let neighbors: Vec<_> = origin.neighbors().collect();
        assert_eq!(neighbors.len(), 6);
        assert!(neighbors.iter().all(|n| n.ring() == 1));
        for (i, a) in neighbors.iter().enumerate() {
            for b in &neighbors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
