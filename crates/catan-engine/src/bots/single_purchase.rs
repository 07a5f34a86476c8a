use super::{
    corner_yield, finish_turn, place_free_roads, play_setup, seeded_rng, BanditStrategy,
    BestYieldSetup, BlockLeader,
};
use crate::board::Board;
use crate::cards::DevelopmentCard;
use crate::coord::{EdgeCoordinate, HexCoordinate, NodeCoordinate};
use crate::error::GameError;
use crate::pieces::{Color, PieceKind};
use crate::player::{Player, PlayerRef, SelectReason};
use crate::resource::{costs, Resource, ResourceHand};
use crate::trade::Quote;
use crate::turn::{Turn, TurnKind};
use parking_lot::Mutex;
use rand::prelude::*;
use std::cmp::Ordering;
use tracing::debug;

/// Cards of one kind we are happy to trade away to others
const SURPLUS: u32 = 3;

/// Quote requests per turn
const MAX_TRADES: usize = 3;

/// The single purchase a turn works toward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Goal {
    City(NodeCoordinate),
    Settlement(NodeCoordinate),
    Road(EdgeCoordinate),
    DevelopmentCard,
}

impl Goal {
    fn cost(&self) -> ResourceHand {
        match self {
            Goal::City(_) => costs::city(),
            Goal::Settlement(_) => costs::settlement(),
            Goal::Road(_) => costs::road(),
            Goal::DevelopmentCard => costs::development_card(),
        }
    }
}

/// Bot that picks one purchase per turn and trades toward it.
///
/// Cities come first, then settlements, then roads that open up new
/// settlement spots, then development cards.
pub struct SinglePurchasePlayer {
    setup: BestYieldSetup,
    bandit: BlockLeader,
    rng: Mutex<StdRng>,
    me: Mutex<Option<PlayerRef>>,
    last_hand: Mutex<ResourceHand>,
}

impl Default for SinglePurchasePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl SinglePurchasePlayer {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::build(Some(seed))
    }

    fn build(seed: Option<u64>) -> Self {
        Self {
            setup: BestYieldSetup,
            bandit: BlockLeader,
            rng: seeded_rng(seed),
            me: Mutex::new(None),
            last_hand: Mutex::new(ResourceHand::new()),
        }
    }

    fn play_normal(&self, turn: &Turn) -> Result<(), GameError> {
        let color = turn.player().color;
        if turn.hand().playable(DevelopmentCard::Soldier).is_some() {
            turn.play_soldier()?;
        }
        turn.roll_dice()?;

        while turn.hand().playable(DevelopmentCard::VictoryPoint).is_some() {
            turn.play_victory_point()?;
        }
        if turn.hand().playable(DevelopmentCard::RoadBuilding).is_some()
            && !turn.board().valid_road_spots(color, None).is_empty()
        {
            turn.play_road_building()?;
            while turn.hand().free_roads > 0 {
                let Some(road) = best_road(&turn.board(), color) else {
                    break;
                };
                turn.place_road(road)?;
            }
        }

        if let Some(goal) = choose_goal(&turn.board(), color) {
            debug!("Bot {} is saving for {:?}", turn.player().name, goal);
            let cost = goal.cost();
            self.play_toward(turn, &cost)?;
            self.trade_toward(turn, &cost)?;
            if turn.hand().resources.can_afford(&cost) {
                self.buy(turn, goal)?;
            }
        }

        place_free_roads(turn, &self.rng)?;
        *self.last_hand.lock() = turn.hand().resources;
        turn.done()
    }

    /// Spend Year of Plenty or Monopoly on what the goal still needs
    fn play_toward(&self, turn: &Turn, cost: &ResourceHand) -> Result<(), GameError> {
        let hand = turn.hand();
        let short = shortfall(&hand.resources, cost);
        if short.is_empty() {
            return Ok(());
        }
        if hand.playable(DevelopmentCard::YearOfPlenty).is_some() {
            let first = short[0];
            let second = short.get(1).copied().unwrap_or(first);
            turn.play_year_of_plenty(first, second)?;
        } else if hand.playable(DevelopmentCard::ResourceMonopoly).is_some() {
            turn.play_resource_monopoly(short[0])?;
        }
        Ok(())
    }

    fn trade_toward(&self, turn: &Turn, cost: &ResourceHand) -> Result<(), GameError> {
        for _ in 0..MAX_TRADES {
            let hand = turn.hand().resources;
            if hand.can_afford(cost) {
                break;
            }
            let mut want = shortfall(&hand, cost);
            want.dedup();
            let give = spare(&hand, cost);
            if want.is_empty() || give.is_empty() {
                break;
            }

            let quotes = turn.request_quotes(&want, &give)?;
            let best = quotes
                .into_iter()
                .filter(|q| hand.get(q.give_type) >= cost.get(q.give_type) + q.give_num)
                .min_by(cheaper);
            let Some(quote) = best else {
                break;
            };
            turn.accept_quote(&quote)?;
        }
        Ok(())
    }

    fn buy(&self, turn: &Turn, goal: Goal) -> Result<(), GameError> {
        match goal {
            Goal::City(node) => turn.place_city(node).map(|_| ()),
            Goal::Settlement(node) => turn.place_settlement(node).map(|_| ()),
            Goal::Road(edge) => turn.place_road(edge).map(|_| ()),
            Goal::DevelopmentCard => turn.buy_development_card().map(|_| ()),
        }
    }
}

/// Fewer cards given per card received wins; players beat the bank on ties
fn cheaper(a: &Quote, b: &Quote) -> Ordering {
    (a.give_num * b.receive_num)
        .cmp(&(b.give_num * a.receive_num))
        .then(a.is_bank().cmp(&b.is_bank()))
}

/// One entry per missing card, most missing type first
fn shortfall(hand: &ResourceHand, cost: &ResourceHand) -> Vec<Resource> {
    let mut gaps: Vec<(Resource, u32)> = Resource::ALL
        .iter()
        .map(|&r| (r, cost.get(r).saturating_sub(hand.get(r))))
        .filter(|(_, gap)| *gap > 0)
        .collect();
    gaps.sort_by(|a, b| b.1.cmp(&a.1));
    gaps.into_iter()
        .flat_map(|(r, gap)| std::iter::repeat(r).take(gap as usize))
        .collect()
}

/// Types held beyond what the goal uses
fn spare(hand: &ResourceHand, cost: &ResourceHand) -> Vec<Resource> {
    Resource::ALL
        .iter()
        .copied()
        .filter(|&r| hand.get(r) > cost.get(r))
        .collect()
}

fn best_spot(board: &Board, spots: Vec<NodeCoordinate>) -> Option<NodeCoordinate> {
    spots.into_iter().max_by(|a, b| {
        corner_yield(board, *a)
            .partial_cmp(&corner_yield(board, *b))
            .unwrap_or(Ordering::Equal)
    })
}

/// The road that opens the most settlement spots, then the longest road
fn best_road(board: &Board, color: Color) -> Option<EdgeCoordinate> {
    board
        .valid_road_spots(color, None)
        .into_iter()
        .filter_map(|spot| {
            let mut lookahead = board.clone();
            lookahead.place_road(color, spot).ok()?;
            let score = (
                lookahead.valid_settlement_spots(color).len(),
                lookahead.longest_road(color),
            );
            Some((spot, score))
        })
        .max_by_key(|(_, score)| *score)
        .map(|(spot, _)| spot)
}

fn opens_settlement(board: &Board, color: Color, edge: EdgeCoordinate) -> bool {
    let mut lookahead = board.clone();
    lookahead.place_road(color, edge).is_ok()
        && !lookahead.valid_settlement_spots(color).is_empty()
}

fn choose_goal(board: &Board, color: Color) -> Option<Goal> {
    let stock = board.pieces_for_sale(color);
    if stock.remaining(PieceKind::City) > 0 {
        if let Some(node) = best_spot(board, board.valid_city_spots(color)) {
            return Some(Goal::City(node));
        }
    }
    if stock.remaining(PieceKind::Settlement) > 0 {
        if let Some(node) = best_spot(board, board.valid_settlement_spots(color)) {
            return Some(Goal::Settlement(node));
        }
    }
    let road = if stock.remaining(PieceKind::Road) > 0 {
        best_road(board, color)
    } else {
        None
    };
    if stock.remaining(PieceKind::Settlement) > 0 {
        if let Some(edge) = road.filter(|e| opens_settlement(board, color, *e)) {
            return Some(Goal::Road(edge));
        }
    }
    if board.development_cards_left() > 0 {
        return Some(Goal::DevelopmentCard);
    }
    road.map(Goal::Road)
}

impl Player for SinglePurchasePlayer {
    fn take_turn(&self, turn: &Turn) -> anyhow::Result<()> {
        *self.me.lock() = Some(turn.player().clone());
        let result = match turn.kind() {
            TurnKind::Setup => play_setup(turn, &self.setup, &self.rng),
            TurnKind::Normal => self.play_normal(turn),
        };
        *self.last_hand.lock() = turn.hand().resources;
        finish_turn(turn, result)
    }

    /// One-for-one offers of anything we hold plenty of
    fn get_user_quotes(&self, asker: &PlayerRef, want: &[Resource], give: &[Resource]) -> Vec<Quote> {
        let Some(me) = self.me.lock().clone() else {
            return Vec::new();
        };
        if me == *asker {
            return Vec::new();
        }
        let hand = self.last_hand.lock().clone();
        let mut quotes = Vec::new();
        for &offer in want {
            if hand.get(offer) < SURPLUS {
                continue;
            }
            for &take in give {
                if take != offer {
                    quotes.push(Quote::new(Some(me.clone()), offer, 1, take, 1));
                }
            }
        }
        quotes
    }

    fn move_bandit(&self, board: &Board, current: HexCoordinate) -> HexCoordinate {
        let me = self.me.lock().as_ref().map(|p| p.color);
        self.bandit
            .choose_hex(board, me, current, &mut self.rng.lock())
    }

    /// Discards come off the largest piles
    fn select_resource_cards(
        &self,
        cards: &[Resource],
        count: usize,
        reason: SelectReason,
    ) -> Vec<Resource> {
        if reason == SelectReason::Steal {
            let mut cards = cards.to_vec();
            cards.shuffle(&mut *self.rng.lock());
            cards.truncate(count);
            return cards;
        }
        let mut pile = ResourceHand::from_cards(cards);
        let mut chosen = Vec::with_capacity(count);
        while chosen.len() < count {
            let Some(&largest) = Resource::ALL.iter().max_by_key(|r| pile.get(**r)) else {
                break;
            };
            if pile.get(largest) == 0 {
                break;
            }
            pile.set(largest, pile.get(largest) - 1);
            chosen.push(largest);
        }
        chosen
    }

    fn select_player(&self, candidates: &[PlayerRef], _reason: SelectReason) -> PlayerRef {
        let me = self.me.lock().clone();
        let others: Vec<&PlayerRef> = candidates
            .iter()
            .filter(|c| Some(*c) != me.as_ref())
            .collect();
        match others.choose(&mut *self.rng.lock()) {
            Some(choice) => (*choice).clone(),
            None => candidates
                .first()
                .cloned()
                .unwrap_or_else(|| PlayerRef::new("", Color::Red)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Tile;
    use pretty_assertions::assert_eq;

    fn board() -> Board {
        let mut board = Board::new();
        for x in 0..3 {
            for y in 0..3 {
                board
                    .add_hex(HexCoordinate::new(x, y), Tile::new(Resource::Wheat, 6).unwrap())
                    .unwrap();
            }
        }
        board.set_bandit(HexCoordinate::new(0, 0)).unwrap();
        board
    }

    #[test]
    fn test_shortfall_lists_missing_cards() {
        let hand = ResourceHand::with_amounts(0, 0, 0, 0, 1);
        let short = shortfall(&hand, &costs::city());
        assert_eq!(
            short,
            vec![Resource::Ore, Resource::Ore, Resource::Ore, Resource::Wheat]
        );
        assert!(shortfall(&costs::road(), &costs::road()).is_empty());
    }

    #[test]
    fn test_spare_skips_goal_cards() {
        let hand = ResourceHand::with_amounts(0, 2, 3, 1, 0);
        assert_eq!(spare(&hand, &costs::road()), vec![Resource::Wood, Resource::Sheep]);
    }

    #[test]
    fn test_cheaper_prefers_better_rate() {
        let bank = Quote::new(None, Resource::Ore, 1, Resource::Wood, 4);
        let port = Quote::new(None, Resource::Ore, 1, Resource::Wood, 2);
        let player = Quote::new(
            Some(PlayerRef::new("p", Color::Blue)),
            Resource::Ore,
            1,
            Resource::Wood,
            2,
        );
        assert_eq!(cheaper(&port, &bank), Ordering::Less);
        assert_eq!(cheaper(&player, &port), Ordering::Less);
    }

    #[test]
    fn test_goal_prefers_city() {
        let mut board = board();
        let node = NodeCoordinate::at(1, 1, 0).unwrap();
        board.place_settlement(Color::Red, node).unwrap();
        assert!(matches!(choose_goal(&board, Color::Red), Some(Goal::City(_))));
    }

    #[test]
    fn test_best_road_extends_network() {
        let mut board = board();
        let node = NodeCoordinate::at(1, 1, 0).unwrap();
        board.place_settlement(Color::Red, node).unwrap();
        let road = best_road(&board, Color::Red).unwrap();
        assert!(board.valid_road_spots(Color::Red, None).contains(&road));
    }

    #[test]
    fn test_discard_from_largest_pile() {
        let bot = SinglePurchasePlayer::with_seed(1);
        let cards = [
            Resource::Ore,
            Resource::Ore,
            Resource::Ore,
            Resource::Wood,
            Resource::Wheat,
            Resource::Wheat,
        ];
        let mut chosen = bot.select_resource_cards(&cards, 3, SelectReason::Discard);
        chosen.sort();
        let mut expected = vec![Resource::Ore, Resource::Ore, Resource::Wheat];
        expected.sort();
        assert_eq!(chosen, expected);
    }

    #[test]
    fn test_quotes_only_from_plenty() {
        let bot = SinglePurchasePlayer::with_seed(1);
        let me = PlayerRef::new("bot", Color::Blue);
        *bot.me.lock() = Some(me.clone());
        *bot.last_hand.lock() = ResourceHand::with_amounts(3, 1, 0, 0, 0);
        let asker = PlayerRef::new("asker", Color::Red);

        let quotes = bot.get_user_quotes(
            &asker,
            &[Resource::Ore, Resource::Wood],
            &[Resource::Sheep],
        );
        assert_eq!(
            quotes,
            vec![Quote::new(Some(me), Resource::Ore, 1, Resource::Sheep, 1)]
        );
    }
}
