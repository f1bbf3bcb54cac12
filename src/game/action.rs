use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{EdgeId, NodeId};
use crate::coords::CubeCoord;
use crate::game::freqdeck::Freqdeck;
use crate::types::{ActionType, Color, DevelopmentCard, Resource};

/// A move by one seat. Outcome fields (dice, stolen card, drawn card,
/// discarded cards) are `None` in legal-action listings and filled in by the
/// applier, so the logged action replays exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameAction {
    pub color: Color,
    pub kind: ActionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeOffer {
    pub offering: Freqdeck,
    pub asking: Freqdeck,
}

impl TradeOffer {
    pub fn new(offering: Freqdeck, asking: Freqdeck) -> Self {
        Self { offering, asking }
    }

    /// Both sides non-empty and no kind on both sides.
    pub fn is_well_formed(&self) -> bool {
        !self.offering.is_empty()
            && !self.asking.is_empty()
            && self.offering.is_disjoint(&self.asking)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Roll(Option<(u8, u8)>),
    MoveRobber {
        coordinate: CubeCoord,
        victim: Option<Color>,
        resource: Option<Resource>,
    },
    Discard(Option<Vec<Resource>>),
    BuildRoad(EdgeId),
    BuildSettlement(NodeId),
    BuildCity(NodeId),
    BuyDevelopmentCard(Option<DevelopmentCard>),
    PlayKnightCard,
    PlayYearOfPlenty(Resource, Option<Resource>),
    PlayMonopoly(Resource),
    PlayRoadBuilding,
    /// Offered cards padded with `None` to four slots, then the asked kind.
    MaritimeTrade([Option<Resource>; 5]),
    OfferTrade(TradeOffer),
    AcceptTrade(TradeOffer),
    RejectTrade(TradeOffer),
    ConfirmTrade {
        offer: TradeOffer,
        partner: Color,
    },
    CancelTrade,
    EndTurn,
}

impl GameAction {
    pub fn new(color: Color, kind: ActionKind) -> Self {
        Self { color, kind }
    }

    pub fn action_type(&self) -> ActionType {
        match &self.kind {
            ActionKind::Roll(_) => ActionType::Roll,
            ActionKind::MoveRobber { .. } => ActionType::MoveRobber,
            ActionKind::Discard(_) => ActionType::Discard,
            ActionKind::BuildRoad(_) => ActionType::BuildRoad,
            ActionKind::BuildSettlement(_) => ActionType::BuildSettlement,
            ActionKind::BuildCity(_) => ActionType::BuildCity,
            ActionKind::BuyDevelopmentCard(_) => ActionType::BuyDevelopmentCard,
            ActionKind::PlayKnightCard => ActionType::PlayKnightCard,
            ActionKind::PlayYearOfPlenty(..) => ActionType::PlayYearOfPlenty,
            ActionKind::PlayMonopoly(_) => ActionType::PlayMonopoly,
            ActionKind::PlayRoadBuilding => ActionType::PlayRoadBuilding,
            ActionKind::MaritimeTrade(_) => ActionType::MaritimeTrade,
            ActionKind::OfferTrade(_) => ActionType::OfferTrade,
            ActionKind::AcceptTrade(_) => ActionType::AcceptTrade,
            ActionKind::RejectTrade(_) => ActionType::RejectTrade,
            ActionKind::ConfirmTrade { .. } => ActionType::ConfirmTrade,
            ActionKind::CancelTrade => ActionType::CancelTrade,
            ActionKind::EndTurn => ActionType::EndTurn,
        }
    }

    /// The action with every outcome field cleared; the form in which it
    /// appears among legal actions.
    pub fn skeleton(&self) -> GameAction {
        let kind = match &self.kind {
            ActionKind::Roll(_) => ActionKind::Roll(None),
            ActionKind::Discard(_) => ActionKind::Discard(None),
            ActionKind::BuyDevelopmentCard(_) => ActionKind::BuyDevelopmentCard(None),
            ActionKind::MoveRobber {
                coordinate, victim, ..
            } => ActionKind::MoveRobber {
                coordinate: *coordinate,
                victim: *victim,
                resource: None,
            },
            other => other.clone(),
        };
        GameAction::new(self.color, kind)
    }

    /// `rate` cards of `give` for one `ask`.
    pub fn maritime_trade(color: Color, give: Resource, rate: u8, ask: Resource) -> Self {
        let mut value = [None; 5];
        for slot in value.iter_mut().take(rate.min(4) as usize) {
            *slot = Some(give);
        }
        value[4] = Some(ask);
        GameAction::new(color, ActionKind::MaritimeTrade(value))
    }
}

/// Splits a maritime trade value into (offered kind, count, asked kind).
pub fn decode_maritime_trade(value: &[Option<Resource>; 5]) -> Option<(Resource, u8, Resource)> {
    let ask = value[4]?;
    let give = value[0]?;
    let mut count = 0;
    for slot in &value[..4] {
        match slot {
            Some(resource) if *resource == give => count += 1,
            Some(_) => return None,
            None => {}
        }
    }
    Some((give, count, ask))
}

impl fmt::Display for GameAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.action_type())?;
        match &self.kind {
            ActionKind::Roll(Some((a, b))) => write!(f, " {a}+{b}"),
            ActionKind::MoveRobber {
                coordinate,
                victim,
                resource,
            } => {
                write!(f, " {coordinate}")?;
                if let Some(victim) = victim {
                    write!(f, " from {victim}")?;
                }
                if let Some(resource) = resource {
                    write!(f, " ({resource})")?;
                }
                Ok(())
            }
            ActionKind::Discard(Some(cards)) => write!(f, " {cards:?}"),
            ActionKind::BuildRoad((a, b)) => write!(f, " ({a}, {b})"),
            ActionKind::BuildSettlement(node) | ActionKind::BuildCity(node) => {
                write!(f, " {node}")
            }
            ActionKind::BuyDevelopmentCard(Some(card)) => write!(f, " {card}"),
            ActionKind::PlayYearOfPlenty(first, second) => match second {
                Some(second) => write!(f, " {first} {second}"),
                None => write!(f, " {first}"),
            },
            ActionKind::PlayMonopoly(resource) => write!(f, " {resource}"),
            ActionKind::MaritimeTrade(value) => match decode_maritime_trade(value) {
                Some((give, count, ask)) => write!(f, " {count}x{give} -> {ask}"),
                None => Ok(()),
            },
            ActionKind::OfferTrade(offer)
            | ActionKind::AcceptTrade(offer)
            | ActionKind::RejectTrade(offer) => {
                write!(f, " {} for {}", offer.offering, offer.asking)
            }
            ActionKind::ConfirmTrade { offer, partner } => write!(
                f,
                " {} for {} with {partner}",
                offer.offering, offer.asking
            ),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maritime_trade_pads_with_none() {
        let action = GameAction::maritime_trade(Color::Red, Resource::Wood, 3, Resource::Ore);
        assert_eq!(
            action.kind,
            ActionKind::MaritimeTrade([
                Some(Resource::Wood),
                Some(Resource::Wood),
                Some(Resource::Wood),
                None,
                Some(Resource::Ore),
            ])
        );
        let ActionKind::MaritimeTrade(value) = action.kind else {
            unreachable!()
        };
        assert_eq!(
            decode_maritime_trade(&value),
            Some((Resource::Wood, 3, Resource::Ore))
        );
    }

    #[test]
    fn skeleton_clears_outcomes() {
        let rolled = GameAction::new(Color::Blue, ActionKind::Roll(Some((3, 4))));
        assert_eq!(rolled.skeleton().kind, ActionKind::Roll(None));
        let robbed = GameAction::new(
            Color::Blue,
            ActionKind::MoveRobber {
                coordinate: CubeCoord::new(1, -1, 0),
                victim: Some(Color::Red),
                resource: Some(Resource::Brick),
            },
        );
        assert_eq!(
            robbed.skeleton().kind,
            ActionKind::MoveRobber {
                coordinate: CubeCoord::new(1, -1, 0),
                victim: Some(Color::Red),
                resource: None,
            }
        );
    }

    #[test]
    fn malformed_offers_are_detected() {
        let wood = Freqdeck::single(Resource::Wood, 1);
        let ore = Freqdeck::single(Resource::Ore, 1);
        assert!(TradeOffer::new(wood, ore).is_well_formed());
        assert!(!TradeOffer::new(Freqdeck::zero(), ore).is_well_formed());
        assert!(!TradeOffer::new(wood, Freqdeck::zero()).is_well_formed());
        assert!(!TradeOffer::new(wood, wood).is_well_formed());
    }

    #[test]
    fn display_is_readable() {
        let action = GameAction::new(Color::White, ActionKind::BuildRoad((3, 12)));
        assert_eq!(action.to_string(), "WHITE BUILD_ROAD (3, 12)");
    }

    #[test]
    fn actions_serialize_as_json() {
        let action = GameAction::new(Color::Red, ActionKind::BuildSettlement(7));
        let json = serde_json::to_string(&action).unwrap();
        let back: GameAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }
}
