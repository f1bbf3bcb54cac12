use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Resource {
    Wood,
    Brick,
    Sheep,
    Wheat,
    Ore,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Wood,
        Resource::Brick,
        Resource::Sheep,
        Resource::Wheat,
        Resource::Ore,
    ];

    /// Slot of this resource inside a freqdeck.
    pub const fn index(self) -> usize {
        match self {
            Resource::Wood => 0,
            Resource::Brick => 1,
            Resource::Sheep => 2,
            Resource::Wheat => 3,
            Resource::Ore => 4,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DevelopmentCard {
    Knight,
    YearOfPlenty,
    Monopoly,
    RoadBuilding,
    VictoryPoint,
}

impl DevelopmentCard {
    pub const ALL: [DevelopmentCard; 5] = [
        DevelopmentCard::Knight,
        DevelopmentCard::YearOfPlenty,
        DevelopmentCard::Monopoly,
        DevelopmentCard::RoadBuilding,
        DevelopmentCard::VictoryPoint,
    ];

    pub const fn index(self) -> usize {
        match self {
            DevelopmentCard::Knight => 0,
            DevelopmentCard::YearOfPlenty => 1,
            DevelopmentCard::Monopoly => 2,
            DevelopmentCard::RoadBuilding => 3,
            DevelopmentCard::VictoryPoint => 4,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildingKind {
    Settlement,
    City,
    Road,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    Red,
    Blue,
    Orange,
    White,
}

impl Color {
    pub const ORDERED: [Color; 4] = [Color::Red, Color::Blue, Color::Orange, Color::White];

    pub const fn index(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Blue => 1,
            Color::Orange => 2,
            Color::White => 3,
        }
    }
}

/// Corner of a hexagon, in id-assignment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum NodeRef {
    North,
    NorthEast,
    SouthEast,
    South,
    SouthWest,
    NorthWest,
}

impl NodeRef {
    pub const ALL: [NodeRef; 6] = [
        NodeRef::North,
        NodeRef::NorthEast,
        NodeRef::SouthEast,
        NodeRef::South,
        NodeRef::SouthWest,
        NodeRef::NorthWest,
    ];

    pub const fn index(self) -> usize {
        match self {
            NodeRef::North => 0,
            NodeRef::NorthEast => 1,
            NodeRef::SouthEast => 2,
            NodeRef::South => 3,
            NodeRef::SouthWest => 4,
            NodeRef::NorthWest => 5,
        }
    }
}

/// Side of a hexagon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum EdgeRef {
    East,
    SouthEast,
    SouthWest,
    West,
    NorthWest,
    NorthEast,
}

impl EdgeRef {
    pub const ALL: [EdgeRef; 6] = [
        EdgeRef::East,
        EdgeRef::SouthEast,
        EdgeRef::SouthWest,
        EdgeRef::West,
        EdgeRef::NorthWest,
        EdgeRef::NorthEast,
    ];

    pub const fn index(self) -> usize {
        match self {
            EdgeRef::East => 0,
            EdgeRef::SouthEast => 1,
            EdgeRef::SouthWest => 2,
            EdgeRef::West => 3,
            EdgeRef::NorthWest => 4,
            EdgeRef::NorthEast => 5,
        }
    }

    /// The two corners bounding this side.
    pub const fn nodes(self) -> (NodeRef, NodeRef) {
        match self {
            EdgeRef::East => (NodeRef::NorthEast, NodeRef::SouthEast),
            EdgeRef::SouthEast => (NodeRef::SouthEast, NodeRef::South),
            EdgeRef::SouthWest => (NodeRef::South, NodeRef::SouthWest),
            EdgeRef::West => (NodeRef::SouthWest, NodeRef::NorthWest),
            EdgeRef::NorthWest => (NodeRef::NorthWest, NodeRef::North),
            EdgeRef::NorthEast => (NodeRef::North, NodeRef::NorthEast),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionPrompt {
    BuildInitialSettlement,
    BuildInitialRoad,
    PlayTurn,
    Discard,
    MoveRobber,
    DecideTrade,
    DecideAcceptees,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Roll,
    MoveRobber,
    Discard,
    BuildRoad,
    BuildSettlement,
    BuildCity,
    BuyDevelopmentCard,
    PlayKnightCard,
    PlayYearOfPlenty,
    PlayMonopoly,
    PlayRoadBuilding,
    MaritimeTrade,
    OfferTrade,
    AcceptTrade,
    RejectTrade,
    ConfirmTrade,
    CancelTrade,
    EndTurn,
}
