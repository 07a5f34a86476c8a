use super::{
    finish_turn, legal_moves, place_free_roads, play_setup, seeded_rng, BanditStrategy, Move,
    RandomBandit, RandomSetup, SetupStrategy,
};
use crate::board::Board;
use crate::cards::DevelopmentCard;
use crate::coord::HexCoordinate;
use crate::error::GameError;
use crate::pieces::Color;
use crate::player::{Player, PlayerRef, SelectReason};
use crate::resource::Resource;
use crate::turn::{Turn, TurnKind};
use parking_lot::Mutex;
use rand::prelude::*;

/// Upper bound on moves per turn
const MAX_MOVES: usize = 12;

/// Bot that plays random legal moves
pub struct RandomPlayer {
    setup: Box<dyn SetupStrategy>,
    bandit: Box<dyn BanditStrategy>,
    rng: Mutex<StdRng>,
    color: Mutex<Option<Color>>,
}

impl Default for RandomPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPlayer {
    pub fn new() -> Self {
        Self::with_strategies(Box::new(RandomSetup), Box::new(RandomBandit), None)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_strategies(Box::new(RandomSetup), Box::new(RandomBandit), Some(seed))
    }

    pub fn with_strategies(
        setup: Box<dyn SetupStrategy>,
        bandit: Box<dyn BanditStrategy>,
        seed: Option<u64>,
    ) -> Self {
        Self {
            setup,
            bandit,
            rng: seeded_rng(seed),
            color: Mutex::new(None),
        }
    }

    fn random_resource(&self) -> Resource {
        let idx = self.rng.lock().gen_range(0..Resource::ALL.len());
        Resource::ALL[idx]
    }

    fn play_normal(&self, turn: &Turn) -> Result<(), GameError> {
        let color = turn.player().color;
        let early_soldier = turn.hand().playable(DevelopmentCard::Soldier).is_some()
            && self.rng.lock().gen_bool(0.5);
        if early_soldier {
            turn.play_soldier()?;
        }
        turn.roll_dice()?;

        for _ in 0..MAX_MOVES {
            let moves = legal_moves(&turn.board(), &turn.hand(), color);
            let choice = {
                let mut rng = self.rng.lock();
                if rng.gen_bool(0.2) {
                    None
                } else {
                    moves.choose(&mut *rng).copied()
                }
            };
            let Some(choice) = choice else {
                break;
            };
            self.make_move(turn, choice)?;
        }

        place_free_roads(turn, &self.rng)?;
        turn.done()
    }

    fn make_move(&self, turn: &Turn, choice: Move) -> Result<(), GameError> {
        match choice {
            Move::Road(edge) => turn.place_road(edge).map(|_| ()),
            Move::Settlement(node) => turn.place_settlement(node).map(|_| ()),
            Move::City(node) => turn.place_city(node).map(|_| ()),
            Move::BuyCard => turn.buy_development_card().map(|_| ()),
            Move::Play(DevelopmentCard::Soldier) => turn.play_soldier(),
            Move::Play(DevelopmentCard::RoadBuilding) => turn.play_road_building(),
            Move::Play(DevelopmentCard::ResourceMonopoly) => {
                let resource = self.random_resource();
                turn.play_resource_monopoly(resource).map(|_| ())
            }
            Move::Play(DevelopmentCard::YearOfPlenty) => {
                let (first, second) = (self.random_resource(), self.random_resource());
                turn.play_year_of_plenty(first, second)
            }
            Move::Play(DevelopmentCard::VictoryPoint) => turn.play_victory_point(),
        }
    }
}

impl Player for RandomPlayer {
    fn take_turn(&self, turn: &Turn) -> anyhow::Result<()> {
        *self.color.lock() = Some(turn.player().color);
        let result = match turn.kind() {
            TurnKind::Setup => play_setup(turn, self.setup.as_ref(), &self.rng),
            TurnKind::Normal => self.play_normal(turn),
        };
        finish_turn(turn, result)
    }

    fn move_bandit(&self, board: &Board, current: HexCoordinate) -> HexCoordinate {
        let me = *self.color.lock();
        self.bandit
            .choose_hex(board, me, current, &mut self.rng.lock())
    }

    fn select_resource_cards(
        &self,
        cards: &[Resource],
        count: usize,
        _reason: SelectReason,
    ) -> Vec<Resource> {
        let mut cards = cards.to_vec();
        cards.shuffle(&mut *self.rng.lock());
        cards.truncate(count);
        cards
    }

    fn select_player(&self, candidates: &[PlayerRef], _reason: SelectReason) -> PlayerRef {
        match candidates.choose(&mut *self.rng.lock()) {
            Some(choice) => choice.clone(),
            // Never asked without candidates; the engine rejects this answer
            None => PlayerRef::new("", Color::Red),
        }
    }
}
