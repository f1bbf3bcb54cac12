//! State transitions. [`apply_action`] trusts its input (search code feeds it
//! actions taken from `legal_actions`); [`validate_then_apply`] checks the
//! action first and is the entry point for untrusted callers.

use log::trace;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::board::{NodeId, RoadUpdate, normalize_edge};
use crate::coords::CubeCoord;
use crate::types::{ActionPrompt, BuildingKind, Color, DevelopmentCard, Resource};

use super::action::{ActionKind, GameAction, TradeOffer, decode_maritime_trade};
use super::freqdeck::{COST_CITY, COST_DEVELOPMENT, COST_ROAD, COST_SETTLEMENT, Freqdeck};
use super::move_generation::road_building_possibilities;
use super::players::MIN_LARGEST_ARMY;
use super::state::{GameError, GameState};

/// Applies `action` and returns it fully specified (dice, drawn card, stolen
/// resource and discarded cards filled in).
pub fn apply_action(state: &mut GameState, action: GameAction) -> Result<GameAction, GameError> {
    let color = action.color;
    let seat = state
        .seat_of(color)
        .ok_or_else(|| GameError::illegal(&action))?;

    let kind = match action.kind {
        ActionKind::EndTurn => {
            state.players[seat].reset_for_new_turn();
            state.advance_turn(true);
            state.current_prompt = ActionPrompt::PlayTurn;
            ActionKind::EndTurn
        }
        ActionKind::BuildSettlement(node) => {
            if state.is_initial_build_phase {
                state.board.build_settlement(color, node, true)?;
                state.players[seat].settlements.push(node);
                if state.setup.is_second_round() {
                    grant_initial_resources(state, seat, node)?;
                }
                state.advance_setup();
            } else {
                if state.players[seat].settlements_available() == 0 {
                    return Err(GameError::illegal(&action));
                }
                if !state.players[seat].hand.contains(&COST_SETTLEMENT) {
                    return Err(GameError::InsufficientResources(color));
                }
                let update = state.board.build_settlement(color, node, false)?;
                charge(state, seat, &COST_SETTLEMENT)?;
                state.players[seat].settlements.push(node);
                maintain_longest_road(state, update);
            }
            ActionKind::BuildSettlement(node)
        }
        ActionKind::BuildRoad(edge) => {
            if state.is_initial_build_phase {
                let update = state.board.build_road(color, edge)?;
                state.players[seat].roads.push(normalize_edge(edge));
                maintain_longest_road(state, update);
                state.advance_setup();
            } else if state.is_road_building && state.free_roads_available > 0 {
                let update = state.board.build_road(color, edge)?;
                state.players[seat].roads.push(normalize_edge(edge));
                maintain_longest_road(state, update);
                state.free_roads_available -= 1;
                if state.free_roads_available == 0
                    || road_building_possibilities(state, color, false).is_empty()
                {
                    state.is_road_building = false;
                    state.free_roads_available = 0;
                }
            } else {
                if state.players[seat].roads_available() == 0 {
                    return Err(GameError::illegal(&action));
                }
                if !state.players[seat].hand.contains(&COST_ROAD) {
                    return Err(GameError::InsufficientResources(color));
                }
                let update = state.board.build_road(color, edge)?;
                charge(state, seat, &COST_ROAD)?;
                state.players[seat].roads.push(normalize_edge(edge));
                maintain_longest_road(state, update);
            }
            ActionKind::BuildRoad(edge)
        }
        ActionKind::BuildCity(node) => {
            if state.players[seat].cities_available() == 0 {
                return Err(GameError::illegal(&action));
            }
            if !state.players[seat].hand.contains(&COST_CITY) {
                return Err(GameError::InsufficientResources(color));
            }
            state.board.build_city(color, node)?;
            charge(state, seat, &COST_CITY)?;
            state.players[seat].upgrade_to_city(node);
            ActionKind::BuildCity(node)
        }
        ActionKind::BuyDevelopmentCard(requested) => {
            if !state.players[seat].hand.contains(&COST_DEVELOPMENT) {
                return Err(GameError::InsufficientResources(color));
            }
            let card = match requested {
                Some(card) => state.bank.take_development_card(card),
                None => state.bank.draw_development_card(),
            }
            .ok_or_else(|| GameError::illegal(&action))?;
            charge(state, seat, &COST_DEVELOPMENT)?;
            state.players[seat].buy_dev_card(card);
            ActionKind::BuyDevelopmentCard(Some(card))
        }
        ActionKind::Roll(dice) => {
            state.players[seat].has_rolled = true;
            let dice = match dice {
                Some(dice) => dice,
                None => (state.rng.gen_range(1..=6), state.rng.gen_range(1..=6)),
            };
            let number = dice.0 + dice.1;
            if number == 7 {
                match next_discarder(state, None) {
                    Some(discarder) => {
                        state.current_player_index = discarder;
                        state.current_prompt = ActionPrompt::Discard;
                        state.is_discarding = true;
                    }
                    None => {
                        state.current_prompt = ActionPrompt::MoveRobber;
                        state.is_moving_knight = true;
                    }
                }
            } else {
                yield_resources(state, number)?;
                state.current_prompt = ActionPrompt::PlayTurn;
            }
            ActionKind::Roll(Some(dice))
        }
        ActionKind::Discard(selection) => {
            let hand = state.players[seat].hand.to_listdeck();
            let discarded = match selection {
                Some(cards) => cards,
                None => {
                    let amount = hand.len() / 2;
                    let mut cards: Vec<Resource> = hand
                        .choose_multiple(&mut state.rng, amount)
                        .copied()
                        .collect();
                    cards.sort();
                    cards
                }
            };
            let bundle = Freqdeck::from_listdeck(discarded.iter().copied());
            state.players[seat].hand.subtract(&bundle)?;
            state.bank.receive(&bundle);

            match next_discarder(state, Some(state.current_player_index)) {
                Some(discarder) => state.current_player_index = discarder,
                None => {
                    state.current_player_index = state.current_turn_index;
                    state.current_prompt = ActionPrompt::MoveRobber;
                    state.is_discarding = false;
                    state.is_moving_knight = true;
                }
            }
            ActionKind::Discard(Some(discarded))
        }
        ActionKind::MoveRobber {
            coordinate,
            victim,
            resource,
        } => {
            if state.board.map.land_tile_at(coordinate).is_none() {
                return Err(GameError::illegal(&action));
            }
            let stolen = move_robber(state, seat, coordinate, victim, resource)?;
            state.is_moving_knight = false;
            state.current_prompt = ActionPrompt::PlayTurn;
            ActionKind::MoveRobber {
                coordinate,
                victim,
                resource: stolen,
            }
        }
        ActionKind::PlayKnightCard => {
            play_dev_card(state, seat, DevelopmentCard::Knight, &action)?;
            maintain_largest_army(state, seat);
            state.is_moving_knight = true;
            state.current_prompt = ActionPrompt::MoveRobber;
            ActionKind::PlayKnightCard
        }
        ActionKind::PlayYearOfPlenty(first, second) => {
            let cards = Freqdeck::from_listdeck(std::iter::once(first).chain(second));
            if !state.bank.resources().contains(&cards) {
                return Err(GameError::illegal(&action));
            }
            play_dev_card(state, seat, DevelopmentCard::YearOfPlenty, &action)?;
            state.bank.dispense(&cards)?;
            state.players[seat].hand.add(&cards);
            state.current_prompt = ActionPrompt::PlayTurn;
            ActionKind::PlayYearOfPlenty(first, second)
        }
        ActionKind::PlayMonopoly(resource) => {
            play_dev_card(state, seat, DevelopmentCard::Monopoly, &action)?;
            let mut stolen = 0u8;
            for (index, player) in state.players.iter_mut().enumerate() {
                if index == seat {
                    continue;
                }
                let amount = player.hand.get(resource);
                player.hand.draw(amount, resource)?;
                stolen += amount;
            }
            state.players[seat].hand.replenish(stolen, resource);
            state.current_prompt = ActionPrompt::PlayTurn;
            ActionKind::PlayMonopoly(resource)
        }
        ActionKind::PlayRoadBuilding => {
            play_dev_card(state, seat, DevelopmentCard::RoadBuilding, &action)?;
            state.is_road_building = true;
            state.free_roads_available = 2;
            state.current_prompt = ActionPrompt::PlayTurn;
            ActionKind::PlayRoadBuilding
        }
        ActionKind::MaritimeTrade(value) => {
            let (give, count, ask) =
                decode_maritime_trade(&value).ok_or(GameError::InvalidTrade("malformed"))?;
            let offering = Freqdeck::single(give, count);
            let asking = Freqdeck::single(ask, 1);
            if !state.players[seat].hand.contains(&offering) {
                return Err(GameError::InsufficientResources(color));
            }
            if !state.bank.resources().contains(&asking) {
                return Err(GameError::InvalidTrade("bank cannot supply the asked resource"));
            }
            state.players[seat].hand.subtract(&offering)?;
            state.bank.receive(&offering);
            state.bank.dispense(&asking)?;
            state.players[seat].hand.add(&asking);
            state.current_prompt = ActionPrompt::PlayTurn;
            ActionKind::MaritimeTrade(value)
        }
        ActionKind::OfferTrade(offer) => {
            state.current_trade = Some(offer);
            let offerer = state.current_turn_index;
            match next_responder(state, offerer, None) {
                Some(responder) => {
                    state.current_player_index = responder;
                    state.current_prompt = ActionPrompt::DecideTrade;
                }
                None => state.reset_trading_state(),
            }
            ActionKind::OfferTrade(offer)
        }
        ActionKind::AcceptTrade(offer) => {
            state.acceptees[seat] = true;
            respond_to_trade(state, seat);
            ActionKind::AcceptTrade(offer)
        }
        ActionKind::RejectTrade(offer) => {
            respond_to_trade(state, seat);
            ActionKind::RejectTrade(offer)
        }
        ActionKind::ConfirmTrade { offer, partner } => {
            confirm_trade(state, seat, offer, partner)?;
            state.reset_trading_state();
            ActionKind::ConfirmTrade { offer, partner }
        }
        ActionKind::CancelTrade => {
            state.reset_trading_state();
            ActionKind::CancelTrade
        }
    };

    let applied = GameAction::new(color, kind);
    trace!("{applied}");
    state.actions.push(applied.clone());
    state.refresh_playable_actions();
    Ok(applied)
}

/// Rejects anything not currently legal, then applies. OFFER_TRADE, which is
/// never enumerated, is checked against the trade rules instead. Outcome
/// fields supplied by the caller (replays) are checked for consistency.
pub fn validate_then_apply(
    state: &mut GameState,
    action: GameAction,
) -> Result<GameAction, GameError> {
    if state.is_finished() {
        return Err(GameError::GameFinished);
    }
    if action.color != state.current_color() {
        return Err(GameError::illegal(&action));
    }

    match &action.kind {
        ActionKind::OfferTrade(offer) => validate_offer(state, action.color, offer)?,
        _ => {
            let skeleton = action.skeleton();
            if !state.legal_actions().contains(&skeleton) {
                return Err(GameError::illegal(&action));
            }
            validate_outcome(state, &action)?;
        }
    }
    apply_action(state, action)
}

fn validate_offer(state: &GameState, color: Color, offer: &TradeOffer) -> Result<(), GameError> {
    if state.current_prompt != ActionPrompt::PlayTurn || state.is_road_building {
        return Err(GameError::InvalidTrade("offers are only made during a turn"));
    }
    if !state.current_player().has_rolled {
        return Err(GameError::InvalidTrade("must roll before trading"));
    }
    if offer.offering.is_empty() || offer.asking.is_empty() {
        return Err(GameError::InvalidTrade("cannot give cards away"));
    }
    if !offer.offering.is_disjoint(&offer.asking) {
        return Err(GameError::InvalidTrade("same resource on both sides"));
    }
    if !state
        .player(color)
        .is_some_and(|player| player.hand.contains(&offer.offering))
    {
        return Err(GameError::InsufficientResources(color));
    }
    Ok(())
}

fn validate_outcome(state: &GameState, action: &GameAction) -> Result<(), GameError> {
    let player = state.current_player();
    let consistent = match &action.kind {
        ActionKind::Roll(Some((a, b))) => (1..=6).contains(a) && (1..=6).contains(b),
        ActionKind::Discard(Some(cards)) => {
            cards.len() == player.hand.total() as usize / 2
                && player
                    .hand
                    .contains(&Freqdeck::from_listdeck(cards.iter().copied()))
        }
        ActionKind::BuyDevelopmentCard(Some(card)) => {
            state.bank.remaining_development_cards().get(*card) > 0
        }
        ActionKind::MoveRobber {
            victim: Some(victim),
            resource: Some(resource),
            ..
        } => state
            .player(*victim)
            .is_some_and(|p| p.hand.get(*resource) > 0),
        _ => true,
    };
    if consistent {
        Ok(())
    } else {
        Err(GameError::illegal(action))
    }
}

/// Moves `cost` from the seat's hand to the bank.
fn charge(state: &mut GameState, seat: usize, cost: &Freqdeck) -> Result<(), GameError> {
    let color = state.colors[seat];
    state.players[seat]
        .hand
        .subtract(cost)
        .map_err(|_| GameError::InsufficientResources(color))?;
    state.bank.receive(cost);
    Ok(())
}

/// One card per adjacent resource tile, for the second placement.
fn grant_initial_resources(
    state: &mut GameState,
    seat: usize,
    node: NodeId,
) -> Result<(), GameError> {
    let map = state.board.map.clone();
    for tile in map.adjacent_tiles(node) {
        if let Some(resource) = tile.resource {
            let card = Freqdeck::single(resource, 1);
            state.bank.dispense(&card)?;
            state.players[seat].hand.add(&card);
        }
    }
    Ok(())
}

/// Pays every building on non-robbed tiles showing `number`. A kind the bank
/// cannot fully cover is paid to nobody.
fn yield_resources(state: &mut GameState, number: u8) -> Result<(), GameError> {
    let mut payouts = vec![Freqdeck::zero(); state.colors.len()];
    let mut totals = Freqdeck::zero();
    for tile in &state.board.map.land_tiles {
        if tile.number != Some(number) || tile.coordinate == state.board.robber_coordinate {
            continue;
        }
        let Some(resource) = tile.resource else {
            continue;
        };
        for node in tile.nodes {
            let Some((owner, kind)) = state.board.get_building(node) else {
                continue;
            };
            let amount = match kind {
                BuildingKind::City => 2,
                _ => 1,
            };
            if let Some(seat) = state.seat_of(owner) {
                payouts[seat].replenish(amount, resource);
                totals.replenish(amount, resource);
            }
        }
    }

    let depleted: Vec<Resource> = totals
        .iter()
        .filter(|(resource, total)| !state.bank.resources().can_draw(*total, *resource))
        .map(|(resource, _)| resource)
        .collect();

    for (seat, mut payout) in payouts.into_iter().enumerate() {
        for resource in &depleted {
            let amount = payout.get(*resource);
            payout.draw(amount, *resource)?;
        }
        state.bank.dispense(&payout)?;
        state.players[seat].hand.add(&payout);
    }
    Ok(())
}

/// Next seat after `after` (or from seat 0) holding more than the discard
/// limit.
fn next_discarder(state: &GameState, after: Option<usize>) -> Option<usize> {
    let start = after.map_or(0, |seat| seat + 1);
    let limit = state.discard_limit();
    (start..state.players.len()).find(|seat| state.players[*seat].hand.total() > limit)
}

fn move_robber(
    state: &mut GameState,
    seat: usize,
    coordinate: CubeCoord,
    victim: Option<Color>,
    resource: Option<Resource>,
) -> Result<Option<Resource>, GameError> {
    state.board.robber_coordinate = coordinate;
    let Some(victim) = victim else {
        return Ok(None);
    };
    let Some(victim_seat) = state.seat_of(victim) else {
        return Ok(None);
    };
    let stolen = match resource {
        Some(resource) => Some(resource),
        None => state.players[victim_seat]
            .hand
            .to_listdeck()
            .choose(&mut state.rng)
            .copied(),
    };
    if let Some(resource) = stolen {
        state.players[victim_seat].hand.draw(1, resource)?;
        state.players[seat].hand.replenish(1, resource);
    }
    Ok(stolen)
}

fn play_dev_card(
    state: &mut GameState,
    seat: usize,
    card: DevelopmentCard,
    action: &GameAction,
) -> Result<(), GameError> {
    if !state.players[seat].can_play_dev_card(card) {
        return Err(GameError::illegal(action));
    }
    state.players[seat].play_dev_card(card)?;
    Ok(())
}

/// Moves the longest-road bonus if the title changed hands and records every
/// seat's road length.
fn maintain_longest_road(state: &mut GameState, update: RoadUpdate) {
    for player in state.players.iter_mut() {
        player.longest_road_length = update.length_of(player.color);
    }
    if !update.changed_hands() {
        return;
    }
    for player in state.players.iter_mut() {
        player.has_longest_road = Some(player.color) == update.current;
    }
}

/// Largest army: at least three knights, and strictly more than the holder.
fn maintain_largest_army(state: &mut GameState, seat: usize) {
    let size = state.players[seat].knights_played();
    if size < MIN_LARGEST_ARMY || state.players[seat].has_largest_army {
        return;
    }
    let holder_size = state
        .players
        .iter()
        .find(|player| player.has_largest_army)
        .map(|player| player.knights_played());
    if holder_size.is_none_or(|holder| size > holder) {
        for (index, player) in state.players.iter_mut().enumerate() {
            player.has_largest_army = index == seat;
        }
    }
}

/// Seat after `current` (in seating order) other than the offerer.
fn next_responder(state: &GameState, offerer: usize, current: Option<usize>) -> Option<usize> {
    let start = current.map_or(0, |seat| seat + 1);
    (start..state.colors.len()).find(|seat| *seat != offerer)
}

fn respond_to_trade(state: &mut GameState, seat: usize) {
    let offerer = state.current_turn_index;
    match next_responder(state, offerer, Some(seat)) {
        Some(responder) => state.current_player_index = responder,
        None if state.acceptees.iter().any(|accepted| *accepted) => {
            state.current_player_index = offerer;
            state.current_prompt = ActionPrompt::DecideAcceptees;
        }
        None => state.reset_trading_state(),
    }
}

fn confirm_trade(
    state: &mut GameState,
    seat: usize,
    offer: TradeOffer,
    partner: Color,
) -> Result<(), GameError> {
    let partner_seat = state
        .seat_of(partner)
        .ok_or(GameError::InvalidTrade("unknown partner"))?;
    if partner_seat == seat {
        return Err(GameError::InvalidTrade("cannot trade with yourself"));
    }
    if !offer.is_well_formed() {
        return Err(GameError::InvalidTrade("malformed offer"));
    }
    if !state.players[seat].hand.contains(&offer.offering) {
        return Err(GameError::InvalidTrade("offerer lacks the offered cards"));
    }
    if !state.players[partner_seat].hand.contains(&offer.asking) {
        return Err(GameError::InvalidTrade("partner lacks the asked cards"));
    }
    state.players[seat].hand.subtract(&offer.offering)?;
    state.players[seat].hand.add(&offer.asking);
    state.players[partner_seat].hand.subtract(&offer.asking)?;
    state.players[partner_seat].hand.add(&offer.offering);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::GameConfig;

    fn placed_state(num_players: usize) -> GameState {
        let mut state = GameState::new(GameConfig {
            num_players,
            ..GameConfig::default()
        })
        .unwrap();
        while state.is_initial_build_phase {
            let action = state.legal_actions()[0].clone();
            apply_action(&mut state, action).unwrap();
        }
        state
    }

    fn act(state: &mut GameState, kind: ActionKind) -> Result<GameAction, GameError> {
        let action = GameAction::new(state.current_color(), kind);
        validate_then_apply(state, action)
    }

    fn give(state: &mut GameState, seat: usize, counts: [u8; 5]) {
        let bundle = Freqdeck::from_counts(counts);
        state.bank.dispense(&bundle).unwrap();
        state.players[seat].hand.add(&bundle);
    }

    fn clear_hands(state: &mut GameState) {
        for seat in 0..state.players.len() {
            let hand = state.players[seat].hand;
            state.bank.receive(&hand);
            state.players[seat].hand = Freqdeck::zero();
        }
    }

    #[test]
    fn placement_grants_second_settlement_resources() {
        let state = placed_state(3);
        assert!(!state.is_initial_build_phase);
        assert_eq!(state.current_prompt, ActionPrompt::PlayTurn);
        assert_eq!(state.current_player_index, 0);
        assert_eq!(state.resource_totals(), [19; 5]);
        for player in &state.players {
            assert_eq!(player.settlements.len(), 2);
            assert_eq!(player.roads.len(), 2);
            let expected = state
                .board
                .map
                .adjacent_tiles(player.settlements[1])
                .filter(|tile| tile.resource.is_some())
                .count();
            assert_eq!(player.hand.total() as usize, expected);
        }
    }

    #[test]
    fn roll_pays_adjacent_buildings() {
        let mut state = placed_state(2);
        clear_hands(&mut state);
        let node = state.players[0].settlements[0];
        let tile = state
            .board
            .map
            .adjacent_tiles(node)
            .find(|tile| tile.number.is_some() && tile.coordinate != state.board.robber_coordinate)
            .cloned()
            .unwrap();
        let number = tile.number.unwrap();
        let dice = if number <= 7 { (1, number - 1) } else { (number - 6, 6) };

        let mut expected = [0u8; 5];
        for land in &state.board.map.land_tiles {
            if land.number != Some(number) {
                continue;
            }
            for node in land.nodes {
                if state.board.get_node_color(node) == Some(state.colors[0]) {
                    expected[land.resource.unwrap().index()] += 1;
                }
            }
        }

        let applied = act(&mut state, ActionKind::Roll(Some(dice))).unwrap();
        assert_eq!(applied.kind, ActionKind::Roll(Some(dice)));
        assert_eq!(state.players[0].hand.counts(), expected);
        assert!(state.players[0].hand.total() >= 1);
        assert_eq!(state.resource_totals(), [19; 5]);
    }

    #[test]
    fn depleted_bank_pays_nobody() {
        let mut state = placed_state(2);
        clear_hands(&mut state);
        let node = state.players[0].settlements[0];
        let tile = state
            .board
            .map
            .adjacent_tiles(node)
            .find(|tile| tile.number.is_some())
            .cloned()
            .unwrap();
        state.board.robber_coordinate = state
            .board
            .map
            .land_tiles
            .iter()
            .find(|t| t.number != tile.number)
            .unwrap()
            .coordinate;
        let resource = tile.resource.unwrap();
        let available = state.bank.available(resource);
        let drained = Freqdeck::single(resource, available);
        state.bank.dispense(&drained).unwrap();

        let number = tile.number.unwrap();
        let dice = if number <= 7 { (1, number - 1) } else { (number - 6, 6) };
        act(&mut state, ActionKind::Roll(Some(dice))).unwrap();
        assert!(state.players.iter().all(|p| p.hand.get(resource) == 0));
    }

    #[test]
    fn seven_walks_discarders_then_robber() {
        let mut state = placed_state(3);
        clear_hands(&mut state);
        give(&mut state, 1, [2, 2, 2, 2, 1]);
        give(&mut state, 2, [4, 4, 0, 0, 0]);

        act(&mut state, ActionKind::Roll(Some((3, 4)))).unwrap();
        assert_eq!(state.current_prompt, ActionPrompt::Discard);
        assert!(state.is_discarding);
        assert_eq!(state.current_player_index, 1);
        assert_eq!(state.legal_actions().len(), 1);

        let discarded = act(&mut state, ActionKind::Discard(None)).unwrap();
        let ActionKind::Discard(Some(cards)) = discarded.kind else {
            panic!("discard outcome missing");
        };
        assert_eq!(cards.len(), 4);
        assert_eq!(state.players[1].hand.total(), 5);
        assert_eq!(state.current_player_index, 2);

        let chosen = vec![Resource::Wood; 4];
        act(&mut state, ActionKind::Discard(Some(chosen))).unwrap();
        assert_eq!(state.players[2].hand.counts(), [0, 4, 0, 0, 0]);
        assert_eq!(state.current_player_index, 0);
        assert_eq!(state.current_prompt, ActionPrompt::MoveRobber);
        assert_eq!(state.resource_totals(), [19; 5]);
    }

    #[test]
    fn robber_steals_one_card() {
        let mut state = placed_state(2);
        clear_hands(&mut state);
        give(&mut state, 1, [0, 0, 3, 0, 0]);
        act(&mut state, ActionKind::Roll(Some((3, 4)))).unwrap();
        assert_eq!(state.current_prompt, ActionPrompt::MoveRobber);

        let victim = state.colors[1];
        let steal = state
            .legal_actions()
            .iter()
            .find(|a| matches!(a.kind, ActionKind::MoveRobber { victim: Some(v), .. } if v == victim))
            .cloned()
            .unwrap();
        let applied = validate_then_apply(&mut state, steal).unwrap();
        assert!(matches!(
            applied.kind,
            ActionKind::MoveRobber { resource: Some(Resource::Sheep), .. }
        ));
        assert_eq!(state.players[0].hand.counts(), [0, 0, 1, 0, 0]);
        assert_eq!(state.players[1].hand.total(), 2);
        assert_eq!(state.current_prompt, ActionPrompt::PlayTurn);
    }

    #[test]
    fn monopoly_collects_from_every_opponent() {
        let mut state = placed_state(3);
        clear_hands(&mut state);
        give(&mut state, 1, [0, 0, 0, 2, 1]);
        give(&mut state, 2, [0, 0, 0, 3, 0]);
        state.players[0].dev_cards.replenish(1, DevelopmentCard::Monopoly);
        state.players[0].has_rolled = true;
        state.refresh_playable_actions();

        act(&mut state, ActionKind::PlayMonopoly(Resource::Wheat)).unwrap();
        assert_eq!(state.players[0].hand.get(Resource::Wheat), 5);
        assert_eq!(state.players[1].hand.counts(), [0, 0, 0, 0, 1]);
        assert_eq!(state.players[2].hand.total(), 0);
        assert!(state.players[0].has_played_dev_card_this_turn);
        assert!(!state.players[0].can_play_dev_card(DevelopmentCard::Monopoly));
    }

    #[test]
    fn third_knight_takes_largest_army() {
        let mut state = placed_state(2);
        state.players[0]
            .played_dev_cards
            .replenish(2, DevelopmentCard::Knight);
        state.players[0].dev_cards.replenish(1, DevelopmentCard::Knight);
        state.refresh_playable_actions();

        act(&mut state, ActionKind::PlayKnightCard).unwrap();
        assert!(state.players[0].has_largest_army);
        assert_eq!(state.current_prompt, ActionPrompt::MoveRobber);
        assert_eq!(state.players[0].bonus_points(), 2);
    }

    #[test]
    fn road_building_grants_two_free_roads() {
        let mut state = placed_state(2);
        clear_hands(&mut state);
        state.players[0]
            .dev_cards
            .replenish(1, DevelopmentCard::RoadBuilding);
        state.players[0].has_rolled = true;
        state.refresh_playable_actions();

        act(&mut state, ActionKind::PlayRoadBuilding).unwrap();
        assert!(state.is_road_building);
        assert_eq!(state.free_roads_available, 2);
        for _ in 0..2 {
            assert!(
                state
                    .legal_actions()
                    .iter()
                    .all(|a| a.action_type() == crate::types::ActionType::BuildRoad)
            );
            let road = state.legal_actions()[0].clone();
            validate_then_apply(&mut state, road).unwrap();
        }
        assert!(!state.is_road_building);
        assert_eq!(state.players[0].roads.len(), 4);
        assert_eq!(state.players[0].hand.total(), 0);
    }

    #[test]
    fn maritime_trade_swaps_with_bank() {
        let mut state = placed_state(2);
        clear_hands(&mut state);
        give(&mut state, 0, [4, 0, 0, 0, 0]);
        state.players[0].has_rolled = true;
        state.refresh_playable_actions();

        let color = state.current_color();
        let rate = crate::game::move_generation::maritime_rates(&state, color)[0];
        let trade = GameAction::maritime_trade(color, Resource::Wood, rate, Resource::Ore);
        validate_then_apply(&mut state, trade).unwrap();
        assert_eq!(state.players[0].hand.get(Resource::Ore), 1);
        assert_eq!(state.players[0].hand.get(Resource::Wood), 4 - rate);
        assert_eq!(state.resource_totals(), [19; 5]);
    }

    #[test]
    fn domestic_trade_round() {
        let mut state = placed_state(3);
        clear_hands(&mut state);
        give(&mut state, 0, [2, 0, 0, 0, 0]);
        give(&mut state, 1, [0, 0, 0, 0, 1]);
        state.players[0].has_rolled = true;
        state.refresh_playable_actions();

        let offer = TradeOffer::new(
            Freqdeck::single(Resource::Wood, 2),
            Freqdeck::single(Resource::Ore, 1),
        );
        act(&mut state, ActionKind::OfferTrade(offer)).unwrap();
        assert_eq!(state.current_prompt, ActionPrompt::DecideTrade);
        assert_eq!(state.current_player_index, 1);

        act(&mut state, ActionKind::AcceptTrade(offer)).unwrap();
        assert_eq!(state.current_player_index, 2);
        assert!(
            !state
                .legal_actions()
                .contains(&GameAction::new(state.colors[2], ActionKind::AcceptTrade(offer)))
        );
        act(&mut state, ActionKind::RejectTrade(offer)).unwrap();
        assert_eq!(state.current_prompt, ActionPrompt::DecideAcceptees);
        assert_eq!(state.current_player_index, 0);

        let partner = state.colors[1];
        act(&mut state, ActionKind::ConfirmTrade { offer, partner }).unwrap();
        assert_eq!(state.players[0].hand.counts(), [0, 0, 0, 0, 1]);
        assert_eq!(state.players[1].hand.counts(), [2, 0, 0, 0, 0]);
        assert_eq!(state.current_prompt, ActionPrompt::PlayTurn);
        assert!(state.current_trade.is_none());
    }

    #[test]
    fn trade_rejected_by_all_resets() {
        let mut state = placed_state(2);
        clear_hands(&mut state);
        give(&mut state, 0, [1, 0, 0, 0, 0]);
        state.players[0].has_rolled = true;
        state.refresh_playable_actions();

        let offer = TradeOffer::new(
            Freqdeck::single(Resource::Wood, 1),
            Freqdeck::single(Resource::Brick, 1),
        );
        act(&mut state, ActionKind::OfferTrade(offer)).unwrap();
        act(&mut state, ActionKind::RejectTrade(offer)).unwrap();
        assert_eq!(state.current_prompt, ActionPrompt::PlayTurn);
        assert_eq!(state.current_player_index, 0);
        assert!(state.acceptees.iter().all(|a| !a));
    }

    #[test]
    fn offers_are_validated() {
        let mut state = placed_state(2);
        clear_hands(&mut state);
        let offer = TradeOffer::new(
            Freqdeck::single(Resource::Wood, 1),
            Freqdeck::single(Resource::Brick, 1),
        );
        assert!(matches!(
            act(&mut state, ActionKind::OfferTrade(offer)),
            Err(GameError::InvalidTrade(_))
        ));
        state.players[0].has_rolled = true;
        assert!(matches!(
            act(&mut state, ActionKind::OfferTrade(offer)),
            Err(GameError::InsufficientResources(_))
        ));
        let gift = TradeOffer::new(Freqdeck::single(Resource::Wood, 1), Freqdeck::zero());
        assert!(matches!(
            act(&mut state, ActionKind::OfferTrade(gift)),
            Err(GameError::InvalidTrade(_))
        ));
    }

    #[test]
    fn illegal_actions_are_rejected() {
        let mut state = placed_state(2);
        assert!(matches!(
            act(&mut state, ActionKind::EndTurn),
            Err(GameError::IllegalAction(_))
        ));
        let other = state.colors[1];
        assert!(matches!(
            validate_then_apply(&mut state, GameAction::new(other, ActionKind::Roll(None))),
            Err(GameError::IllegalAction(_))
        ));
        assert!(matches!(
            act(&mut state, ActionKind::Roll(Some((0, 7)))),
            Err(GameError::IllegalAction(_))
        ));
        assert!(state.action_log().iter().all(|a| a.action_type() != crate::types::ActionType::Roll));
    }

    #[test]
    fn end_turn_passes_and_matures_cards() {
        let mut state = placed_state(2);
        state.players[0].buy_dev_card(DevelopmentCard::Knight);
        let turns = state.num_turns;
        act(&mut state, ActionKind::Roll(Some((1, 1)))).unwrap();
        act(&mut state, ActionKind::EndTurn).unwrap();
        assert_eq!(state.current_player_index, 1);
        assert_eq!(state.num_turns, turns + 1);
        assert!(state.players[0].can_play_dev_card(DevelopmentCard::Knight));
        assert!(!state.players[0].has_rolled);
    }

    #[test]
    fn replayed_dev_card_draw_is_honoured() {
        let mut state = placed_state(2);
        clear_hands(&mut state);
        give(&mut state, 0, COST_DEVELOPMENT.counts());
        state.players[0].has_rolled = true;
        state.refresh_playable_actions();

        let points = state.players[0].total_points();
        act(
            &mut state,
            ActionKind::BuyDevelopmentCard(Some(DevelopmentCard::VictoryPoint)),
        )
        .unwrap();
        assert_eq!(state.players[0].total_points(), points + 1);
        assert_eq!(state.players[0].public_points(), points);
        assert_eq!(state.bank.development_deck_len(), 24);
    }

    #[test]
    fn rejected_placements_cost_nothing() {
        let mut state = placed_state(2);
        clear_hands(&mut state);
        give(&mut state, 0, [1, 1, 1, 1, 0]);
        let color = state.current_color();

        let reachable = state.board.buildable_node_ids(color, false);
        let node = state
            .board
            .map
            .land_nodes
            .iter()
            .copied()
            .find(|n| !reachable.contains(n))
            .unwrap();
        let settle = GameAction::new(color, ActionKind::BuildSettlement(node));
        assert!(apply_action(&mut state, settle).is_err());
        assert_eq!(state.players[0].hand.counts(), [1, 1, 1, 1, 0]);

        let connected = state.board.buildable_edges(color).to_vec();
        let edge = state
            .board
            .map
            .land_edges
            .iter()
            .copied()
            .find(|e| !connected.contains(e))
            .unwrap();
        let road = GameAction::new(color, ActionKind::BuildRoad(edge));
        assert!(apply_action(&mut state, road).is_err());
        assert_eq!(state.players[0].hand.counts(), [1, 1, 1, 1, 0]);
        assert_eq!(state.players[0].roads.len(), 2);
        assert_eq!(state.resource_totals(), [19; 5]);
    }

    #[test]
    fn robber_stays_on_land() {
        let mut state = placed_state(2);
        let color = state.current_color();
        let start = state.board.robber_coordinate;
        let offshore = GameAction::new(
            color,
            ActionKind::MoveRobber {
                coordinate: CubeCoord::new(9, -9, 0),
                victim: None,
                resource: None,
            },
        );
        assert!(matches!(
            apply_action(&mut state, offshore),
            Err(GameError::IllegalAction(_))
        ));
        assert_eq!(state.board.robber_coordinate, start);
    }
}
