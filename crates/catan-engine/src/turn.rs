//! Turn state machine and validated player actions.
//!
//! A `Turn` is the only way a player changes the game. Each action:
//! - checks the game is running and the turn is still open
//! - validates its preconditions against the live board and the hands
//! - mutates under the locks documented in [`crate::admin`]
//! - records itself in the turn's audit list
//! - updates the award holders, looks for a winner, then notifies observers
//!
//! A rule violation ends the turn with `DoneWithError` and is returned to
//! the caller. Setup turns share the type and are told apart by `TurnKind`.

use crate::admin::{lock_pair, GameState, Seat, Table};
use crate::board::Board;
use crate::cards::{DevelopmentCard, OwnedCard};
use crate::coord::{EdgeCoordinate, HexCoordinate, NodeCoordinate};
use crate::error::{GameError, RuleViolation};
use crate::observer::GameEvent;
use crate::pieces::PieceKind;
use crate::player::{Hand, PlayerRef, SelectReason};
use crate::resource::{costs, Resource, ResourceHand};
use crate::trade::{self, Quote};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lifecycle of a single turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnState {
    Created,
    Active,
    RolledDice,
    Done,
    DoneWithError(String),
}

impl TurnState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Done | TurnState::DoneWithError(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnKind {
    Normal,
    /// Opening placement: one settlement, then one road touching it
    Setup,
}

/// Audit record of a successful action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    RollDice((u8, u8)),
    Discard(PlayerRef, Vec<Resource>),
    MoveBandit(HexCoordinate),
    Steal(PlayerRef),
    PlaceRoad(EdgeCoordinate),
    PlaceSettlement(NodeCoordinate),
    PlaceCity(NodeCoordinate),
    BuyDevelopmentCard,
    PlayCard(DevelopmentCard),
    RequestQuotes,
    AcceptQuote(Quote),
    Done,
}

#[derive(Debug)]
struct TurnInner {
    state: TurnState,
    actions: Vec<Action>,
    quotes: Vec<Quote>,
    setup_settlement: Option<NodeCoordinate>,
    setup_road: Option<EdgeCoordinate>,
}

/// One player's turn
pub struct Turn {
    table: Arc<Table>,
    seat: Arc<Seat>,
    kind: TurnKind,
    inner: Mutex<TurnInner>,
}

impl std::fmt::Debug for Turn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Turn")
            .field("player", &self.seat.reference)
            .field("kind", &self.kind)
            .field("state", &self.inner.lock().state)
            .finish()
    }
}

fn wrong_state(state: &TurnState) -> GameError {
    RuleViolation::WrongState(format!("{state:?}")).into()
}

fn require(inner: &TurnInner, allowed: &[TurnState]) -> Result<(), GameError> {
    if allowed.contains(&inner.state) {
        Ok(())
    } else {
        Err(wrong_state(&inner.state))
    }
}

fn canonical_edge(board: &Board, coord: EdgeCoordinate) -> Result<EdgeCoordinate, GameError> {
    board
        .edge_id(coord)
        .and_then(|id| board.edge_coordinate(id))
        .ok_or_else(|| RuleViolation::InvalidLocation(format!("no edge at {coord}")).into())
}

fn canonical_node(board: &Board, coord: NodeCoordinate) -> Result<NodeCoordinate, GameError> {
    board
        .node_id(coord)
        .and_then(|id| board.node_coordinate(id))
        .ok_or_else(|| RuleViolation::InvalidLocation(format!("no node at {coord}")).into())
}

fn ensure_stock(board: &Board, seat: &Seat, kind: PieceKind) -> Result<(), GameError> {
    if board.pieces_for_sale(seat.color()).remaining(kind) == 0 {
        Err(RuleViolation::NoPiecesRemaining(kind).into())
    } else {
        Ok(())
    }
}

fn pay(hand: &mut Hand, cost: &ResourceHand) -> Result<(), GameError> {
    if hand.resources.try_subtract(cost) {
        Ok(())
    } else {
        Err(GameError::Corrupted("payment failed after validation".into()))
    }
}

/// Whether `cards` can be taken out of `hand`
fn is_subset(cards: &[Resource], hand: &ResourceHand) -> bool {
    hand.can_afford(&ResourceHand::from_cards(cards))
}

impl Turn {
    pub(crate) fn new(table: Arc<Table>, seat: Arc<Seat>, kind: TurnKind) -> Self {
        Self {
            table,
            seat,
            kind,
            inner: Mutex::new(TurnInner {
                state: TurnState::Created,
                actions: Vec::new(),
                quotes: Vec::new(),
                setup_settlement: None,
                setup_road: None,
            }),
        }
    }

    // ==================== Queries ====================

    pub fn player(&self) -> &PlayerRef {
        &self.seat.reference
    }

    pub fn kind(&self) -> TurnKind {
        self.kind
    }

    pub fn state(&self) -> TurnState {
        self.inner.lock().state.clone()
    }

    pub fn actions(&self) -> Vec<Action> {
        self.inner.lock().actions.clone()
    }

    /// Quotes received by the last `request_quotes`
    pub fn quotes(&self) -> Vec<Quote> {
        self.inner.lock().quotes.clone()
    }

    /// Copy of the acting player's hand
    pub fn hand(&self) -> Hand {
        self.seat.hand.lock().clone()
    }

    /// Copy of the live board for lookahead
    pub fn board(&self) -> Board {
        self.table.board.lock().clone()
    }

    /// Other seated players still in the game
    pub fn opponents(&self) -> Vec<PlayerRef> {
        self.table
            .seats()
            .iter()
            .filter(|s| s.index != self.seat.index && !s.is_kicked())
            .map(|s| s.reference.clone())
            .collect()
    }

    // ==================== Lifecycle ====================

    pub(crate) fn activate(&self) {
        let mut inner = self.inner.lock();
        if inner.state == TurnState::Created {
            inner.state = TurnState::Active;
        }
    }

    /// Close the turn, waiting for any action that holds the board
    pub(crate) fn force_done(&self) {
        let _board = self.table.board.lock();
        let mut inner = self.inner.lock();
        if !inner.state.is_terminal() {
            inner.state = TurnState::Done;
        }
    }

    /// Run an action, ending the turn on a rule violation
    fn act<T>(&self, action: impl FnOnce() -> Result<T, GameError>) -> Result<T, GameError> {
        let result = action();
        if let Err(err) = &result {
            self.fail(err);
        }
        result
    }

    fn fail(&self, err: &GameError) {
        match err {
            GameError::Rule(RuleViolation::TurnFinished | RuleViolation::GameNotRunning) => {}
            err => {
                if err.is_fatal() {
                    self.table.mark_corrupted(err);
                }
                let mut inner = self.inner.lock();
                if !inner.state.is_terminal() {
                    warn!("Turn of {} ended with error: {}", self.seat.reference.name, err);
                    inner.state = TurnState::DoneWithError(err.to_string());
                }
            }
        }
    }

    fn check_open(&self, inner: &TurnInner) -> Result<(), GameError> {
        if self.table.game_state() != GameState::Running {
            return Err(RuleViolation::GameNotRunning.into());
        }
        if inner.state.is_terminal() {
            return Err(RuleViolation::TurnFinished.into());
        }
        Ok(())
    }

    fn check_not_setup(&self) -> Result<(), GameError> {
        match self.kind {
            TurnKind::Setup => Err(RuleViolation::NotAllowedInSetup.into()),
            TurnKind::Normal => Ok(()),
        }
    }

    /// Run `f` holding the board and turn locks, then update standings and
    /// notify observers after the locks are released.
    ///
    /// `f` must validate everything before its first mutation.
    fn with_board<T>(
        &self,
        f: impl FnOnce(&mut Board, &mut TurnInner, &mut Vec<GameEvent>) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let mut events = Vec::new();
        let value = {
            let mut board = self.table.board.lock();
            let mut inner = self.inner.lock();
            self.check_open(&inner)?;
            let value = f(&mut board, &mut inner, &mut events)?;
            self.table
                .update_standings(Some(&self.seat), &board, &mut events);
            value
        };
        self.table.notify(&events);
        Ok(value)
    }

    // ==================== Dice ====================

    /// Roll the dice; a 7 triggers discards and the bandit
    pub fn roll_dice(&self) -> Result<(u8, u8), GameError> {
        self.act(|| {
            self.check_not_setup()?;
            let roll = self.with_board(|board, inner, events| {
                require(inner, &[TurnState::Active])?;
                let roll = self.table.dice.roll();
                let sum = roll.0 + roll.1;
                inner.state = TurnState::RolledDice;
                inner.actions.push(Action::RollDice(roll));
                events.push(GameEvent::PlayerRolled {
                    player: self.seat.reference.clone(),
                    roll,
                });
                debug!("Player {} rolled {}", self.seat.reference.name, sum);

                if sum != 7 {
                    for seat in self.table.seats() {
                        let cards = board.get_cards(sum, seat.color());
                        if cards.is_empty() {
                            continue;
                        }
                        seat.hand
                            .lock()
                            .resources
                            .add_hand(&ResourceHand::from_cards(&cards));
                        events.push(GameEvent::PlayerReceivedCards {
                            player: seat.reference.clone(),
                            cards,
                        });
                    }
                }
                Ok(roll)
            })?;

            if roll.0 + roll.1 == 7 {
                self.discard_phase()?;
                self.move_bandit_and_steal()?;
            }
            Ok(roll)
        })
    }

    /// Everyone holding more than 7 cards gives back half
    fn discard_phase(&self) -> Result<(), GameError> {
        for seat in self.table.seats() {
            if seat.is_kicked() {
                continue;
            }
            let cards = seat.hand.lock().resources.cards();
            if cards.len() <= 7 {
                continue;
            }
            let count = cards.len() / 2;
            let chosen = seat
                .player
                .select_resource_cards(&cards, count, SelectReason::Discard);

            self.with_board(|_, inner, _| {
                let mut hand = seat.hand.lock();
                if chosen.len() != count || !is_subset(&chosen, &hand.resources) {
                    return Err(RuleViolation::InvalidDiscard {
                        expected: count,
                        got: chosen.len(),
                    }
                    .into());
                }
                pay(&mut hand, &ResourceHand::from_cards(&chosen))?;
                inner
                    .actions
                    .push(Action::Discard(seat.reference.clone(), chosen.clone()));
                debug!("Player {} discarded {} cards", seat.reference.name, count);
                Ok(())
            })?;
        }
        Ok(())
    }

    /// Ask the player where the bandit goes, move it, then steal
    fn move_bandit_and_steal(&self) -> Result<(), GameError> {
        let target = self.ask_bandit_target()?;
        let candidates = self.with_board(|board, inner, events| {
            let victims = self.relocate_bandit(board, target, events)?;
            inner.actions.push(Action::MoveBandit(target));
            Ok(victims)
        })?;
        self.steal_from_one(candidates)
    }

    /// Ask the player for a bandit target on a copy of the board, no locks held
    fn ask_bandit_target(&self) -> Result<HexCoordinate, GameError> {
        let (copy, current) = {
            let board = self.table.board.lock();
            let current = board
                .bandit_location()
                .ok_or_else(|| GameError::Corrupted("no bandit on the board".into()))?;
            (board.clone(), current)
        };
        Ok(self.seat.player.move_bandit(&copy, current))
    }

    /// Move the bandit and list the other players on the target with cards to steal
    fn relocate_bandit(
        &self,
        board: &mut Board,
        target: HexCoordinate,
        events: &mut Vec<GameEvent>,
    ) -> Result<Vec<PlayerRef>, GameError> {
        let from = board.move_bandit(target)?;
        events.push(GameEvent::PlayerMovedBandit {
            player: self.seat.reference.clone(),
            from,
            to: target,
        });
        Ok(board
            .colors_on_hex(target)
            .into_iter()
            .filter(|c| *c != self.seat.color())
            .filter_map(|c| self.table.seat_by_color(c))
            .filter(|s| !s.hand.lock().resources.is_empty())
            .map(|s| s.reference.clone())
            .collect())
    }

    /// Steal one random card, asking the player to pick when several can be robbed
    fn steal_from_one(&self, candidates: Vec<PlayerRef>) -> Result<(), GameError> {
        let victim = match candidates.as_slice() {
            [] => return Ok(()),
            [only] => only.clone(),
            _ => {
                let chosen = self
                    .seat
                    .player
                    .select_player(&candidates, SelectReason::Steal);
                if !candidates.contains(&chosen) {
                    return Err(RuleViolation::InvalidSelection.into());
                }
                chosen
            }
        };

        self.with_board(|_, inner, events| {
            let victim_seat = self
                .table
                .seat_of(&victim)
                .ok_or(RuleViolation::InvalidSelection)?;
            let (mut thief, mut robbed) = lock_pair(&self.seat, &victim_seat);
            let stolen = robbed
                .resources
                .steal_random(&mut *self.table.rng.lock());
            if let Some(resource) = stolen {
                thief.resources.add(resource, 1);
                inner.actions.push(Action::Steal(victim.clone()));
                events.push(GameEvent::PlayerStoleCard {
                    thief: self.seat.reference.clone(),
                    victim: victim.clone(),
                    resource,
                });
            }
            Ok(())
        })
    }

    // ==================== Building ====================

    /// Place a road; setup roads must touch the settlement just placed
    pub fn place_road(&self, coord: EdgeCoordinate) -> Result<EdgeCoordinate, GameError> {
        self.act(|| {
            self.with_board(|board, inner, events| {
                let color = self.seat.color();
                let canonical = canonical_edge(board, coord)?;
                let mut hand = self.seat.hand.lock();
                let mut paid = false;
                match self.kind {
                    TurnKind::Setup => {
                        require(inner, &[TurnState::Active])?;
                        let Some(settlement) = inner.setup_settlement else {
                            return Err(RuleViolation::InvalidLocation(
                                "place the setup settlement first".into(),
                            )
                            .into());
                        };
                        if inner.setup_road.is_some() {
                            return Err(RuleViolation::InvalidLocation(
                                "setup road already placed".into(),
                            )
                            .into());
                        }
                        if !board
                            .valid_road_spots(color, Some(settlement))
                            .contains(&canonical)
                        {
                            return Err(RuleViolation::InvalidLocation(format!(
                                "road at {coord} must touch {settlement}"
                            ))
                            .into());
                        }
                        ensure_stock(board, &self.seat, PieceKind::Road)?;
                    }
                    TurnKind::Normal => {
                        require(inner, &[TurnState::RolledDice])?;
                        if !board.valid_road_spots(color, None).contains(&canonical) {
                            return Err(RuleViolation::InvalidLocation(format!(
                                "cannot build a road at {coord}"
                            ))
                            .into());
                        }
                        ensure_stock(board, &self.seat, PieceKind::Road)?;
                        if hand.free_roads == 0 {
                            if !hand.resources.can_afford(&costs::road()) {
                                return Err(RuleViolation::CannotAfford.into());
                            }
                            paid = true;
                        }
                    }
                }

                let placed = board.place_road(color, canonical)?;
                if paid {
                    pay(&mut hand, &costs::road())?;
                } else if self.kind == TurnKind::Normal {
                    hand.free_roads -= 1;
                }
                if self.kind == TurnKind::Setup {
                    inner.setup_road = Some(placed);
                }
                inner.actions.push(Action::PlaceRoad(placed));
                events.push(GameEvent::PlacedRoad {
                    player: self.seat.reference.clone(),
                    edge: placed,
                });
                Ok(placed)
            })
        })
    }

    /// Place a settlement; the second setup settlement pays out its hexes
    pub fn place_settlement(&self, coord: NodeCoordinate) -> Result<NodeCoordinate, GameError> {
        self.act(|| {
            self.with_board(|board, inner, events| {
                let color = self.seat.color();
                let canonical = canonical_node(board, coord)?;
                let mut hand = self.seat.hand.lock();
                match self.kind {
                    TurnKind::Setup => {
                        require(inner, &[TurnState::Active])?;
                        if inner.setup_settlement.is_some() {
                            return Err(RuleViolation::InvalidLocation(
                                "setup settlement already placed".into(),
                            )
                            .into());
                        }
                        if !board.valid_initial_settlement_spots().contains(&canonical) {
                            return Err(RuleViolation::InvalidLocation(format!(
                                "cannot settle at {coord}"
                            ))
                            .into());
                        }
                        ensure_stock(board, &self.seat, PieceKind::Settlement)?;
                    }
                    TurnKind::Normal => {
                        require(inner, &[TurnState::RolledDice])?;
                        if !board.valid_settlement_spots(color).contains(&canonical) {
                            return Err(RuleViolation::InvalidLocation(format!(
                                "cannot settle at {coord}"
                            ))
                            .into());
                        }
                        ensure_stock(board, &self.seat, PieceKind::Settlement)?;
                        if !hand.resources.can_afford(&costs::settlement()) {
                            return Err(RuleViolation::CannotAfford.into());
                        }
                    }
                }

                let placed = board.place_settlement(color, canonical)?;
                inner.actions.push(Action::PlaceSettlement(placed));
                events.push(GameEvent::PlacedSettlement {
                    player: self.seat.reference.clone(),
                    node: placed,
                });

                match self.kind {
                    TurnKind::Normal => pay(&mut hand, &costs::settlement())?,
                    TurnKind::Setup => {
                        inner.setup_settlement = Some(placed);
                        if board.settlement_count(color) == 2 {
                            let id = board.node_id(placed).ok_or_else(|| {
                                GameError::Corrupted(format!("settlement {placed} vanished"))
                            })?;
                            let cards: Vec<Resource> = board
                                .hexes_of_node(id)
                                .iter()
                                .filter_map(|h| h.resource)
                                .collect();
                            if !cards.is_empty() {
                                hand.resources.add_hand(&ResourceHand::from_cards(&cards));
                                events.push(GameEvent::PlayerReceivedCards {
                                    player: self.seat.reference.clone(),
                                    cards,
                                });
                            }
                        }
                    }
                }
                Ok(placed)
            })
        })
    }

    /// Upgrade one of the player's settlements
    pub fn place_city(&self, coord: NodeCoordinate) -> Result<NodeCoordinate, GameError> {
        self.act(|| {
            self.check_not_setup()?;
            self.with_board(|board, inner, events| {
                require(inner, &[TurnState::RolledDice])?;
                let color = self.seat.color();
                let canonical = canonical_node(board, coord)?;
                if !board.valid_city_spots(color).contains(&canonical) {
                    return Err(RuleViolation::InvalidLocation(format!(
                        "no settlement of yours at {coord}"
                    ))
                    .into());
                }
                ensure_stock(board, &self.seat, PieceKind::City)?;
                let mut hand = self.seat.hand.lock();
                if !hand.resources.can_afford(&costs::city()) {
                    return Err(RuleViolation::CannotAfford.into());
                }

                let placed = board.place_city(color, canonical)?;
                pay(&mut hand, &costs::city())?;
                inner.actions.push(Action::PlaceCity(placed));
                events.push(GameEvent::PlacedCity {
                    player: self.seat.reference.clone(),
                    node: placed,
                });
                Ok(placed)
            })
        })
    }

    // ==================== Development Cards ====================

    pub fn buy_development_card(&self) -> Result<DevelopmentCard, GameError> {
        self.act(|| {
            self.check_not_setup()?;
            self.with_board(|board, inner, _| {
                require(inner, &[TurnState::RolledDice])?;
                let mut hand = self.seat.hand.lock();
                if !hand.resources.can_afford(&costs::development_card()) {
                    return Err(RuleViolation::CannotAfford.into());
                }
                let card = board
                    .draw_development_card()
                    .ok_or(RuleViolation::EmptyDeck)?;
                pay(&mut hand, &costs::development_card())?;
                hand.development_cards.push(OwnedCard {
                    card,
                    played: false,
                });
                inner.actions.push(Action::BuyDevelopmentCard);
                debug!("Player {} bought a development card", self.seat.reference.name);
                Ok(card)
            })
        })
    }

    /// Mark an owned card as played, in the allowed turn states
    fn play_card(
        &self,
        card: DevelopmentCard,
        allowed: &[TurnState],
        effect: impl FnOnce(&mut Board, &mut Hand, &mut Vec<GameEvent>) -> Result<(), GameError>,
    ) -> Result<(), GameError> {
        self.check_not_setup()?;
        self.with_board(|board, inner, events| {
            require(inner, allowed)?;
            let mut hand = self.seat.hand.lock();
            if hand.playable(card).is_none() {
                return Err(RuleViolation::NoSuchCard.into());
            }
            effect(board, &mut hand, events)?;
            hand.mark_played(card);
            inner.actions.push(Action::PlayCard(card));
            debug!("Player {} played {:?}", self.seat.reference.name, card);
            Ok(())
        })
    }

    /// Move the bandit and steal; allowed before rolling.
    /// The card stays unplayed when the bandit move is rejected.
    pub fn play_soldier(&self) -> Result<(), GameError> {
        const ALLOWED: &[TurnState] = &[TurnState::Active, TurnState::RolledDice];
        self.act(|| {
            // Only ask for a target when the card can be played at all
            self.check_not_setup()?;
            self.with_board(|_, inner, _| {
                require(inner, ALLOWED)?;
                match self.seat.hand.lock().playable(DevelopmentCard::Soldier) {
                    Some(_) => Ok(()),
                    None => Err(RuleViolation::NoSuchCard.into()),
                }
            })?;
            let target = self.ask_bandit_target()?;
            let mut candidates = Vec::new();
            self.play_card(DevelopmentCard::Soldier, ALLOWED, |board, _, events| {
                candidates = self.relocate_bandit(board, target, events)?;
                Ok(())
            })?;
            self.with_board(|_, inner, _| {
                inner.actions.push(Action::MoveBandit(target));
                Ok(())
            })?;
            self.steal_from_one(candidates)
        })
    }

    /// Grant up to two free roads
    pub fn play_road_building(&self) -> Result<(), GameError> {
        let color = self.seat.color();
        self.act(|| {
            self.play_card(
                DevelopmentCard::RoadBuilding,
                &[TurnState::RolledDice],
                |board, hand, _| {
                    let left = board.pieces_for_sale(color).remaining(PieceKind::Road);
                    hand.free_roads += left.min(2);
                    Ok(())
                },
            )
        })
    }

    /// Take every card of one resource from the other players
    pub fn play_resource_monopoly(&self, resource: Resource) -> Result<u32, GameError> {
        self.act(|| {
            let mut taken = 0;
            self.play_card(
                DevelopmentCard::ResourceMonopoly,
                &[TurnState::RolledDice],
                |_, hand, events| {
                    for seat in self.table.seats() {
                        if seat.index == self.seat.index {
                            continue;
                        }
                        taken += seat.hand.lock().resources.take_all(resource);
                    }
                    if taken > 0 {
                        hand.resources.add(resource, taken);
                        events.push(GameEvent::PlayerReceivedCards {
                            player: self.seat.reference.clone(),
                            cards: vec![resource; taken as usize],
                        });
                    }
                    Ok(())
                },
            )?;
            Ok(taken)
        })
    }

    /// Take two cards from the bank
    pub fn play_year_of_plenty(&self, first: Resource, second: Resource) -> Result<(), GameError> {
        self.act(|| {
            self.play_card(
                DevelopmentCard::YearOfPlenty,
                &[TurnState::RolledDice],
                |_, hand, events| {
                    hand.resources.add(first, 1);
                    hand.resources.add(second, 1);
                    events.push(GameEvent::PlayerReceivedCards {
                        player: self.seat.reference.clone(),
                        cards: vec![first, second],
                    });
                    Ok(())
                },
            )
        })
    }

    /// Reveal a victory point card; it scores whether played or not
    pub fn play_victory_point(&self) -> Result<(), GameError> {
        self.act(|| {
            self.play_card(
                DevelopmentCard::VictoryPoint,
                &[TurnState::RolledDice],
                |_, _, _| Ok(()),
            )
        })
    }

    // ==================== Trading ====================

    /// Collect bank and player quotes for trading `give` types into `want` types
    pub fn request_quotes(
        &self,
        want: &[Resource],
        give: &[Resource],
    ) -> Result<Vec<Quote>, GameError> {
        self.act(|| {
            self.check_not_setup()?;
            let want: Vec<Resource> = want.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
            let give: Vec<Resource> = give.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();

            let mut quotes = self.with_board(|board, inner, _| {
                require(inner, &[TurnState::RolledDice])?;
                if want.is_empty() || give.is_empty() {
                    return Err(RuleViolation::InvalidTrade("want and give must not be empty".into()).into());
                }
                let hand = self.seat.hand.lock();
                if let Some(missing) = give.iter().find(|r| hand.resources.get(**r) == 0) {
                    return Err(RuleViolation::InvalidTrade(format!("no {missing:?} to give")).into());
                }
                Ok(trade::bank_quotes(&want, &give, &board.ports_for(self.seat.color())))
            })?;

            for seat in self.table.seats() {
                if seat.index == self.seat.index || seat.is_kicked() {
                    continue;
                }
                let offered = seat
                    .player
                    .get_user_quotes(&self.seat.reference, &want, &give);
                for quote in offered {
                    let honest = quote.bidder.as_ref() == Some(&seat.reference)
                        && want.contains(&quote.receive_type)
                        && give.contains(&quote.give_type)
                        && quote.receive_type != quote.give_type
                        && quote.receive_num > 0
                        && quote.give_num > 0;
                    let affordable =
                        seat.hand.lock().resources.get(quote.receive_type) >= quote.receive_num;
                    if honest && affordable {
                        quotes.push(quote);
                    } else {
                        debug!("Dropped quote from {}: {:?}", seat.reference.name, quote);
                    }
                }
            }

            let quotes = trade::prune(quotes);
            let mut inner = self.inner.lock();
            self.check_open(&inner)?;
            inner.quotes = quotes.clone();
            inner.actions.push(Action::RequestQuotes);
            Ok(quotes)
        })
    }

    /// Execute a quote received this turn
    pub fn accept_quote(&self, quote: &Quote) -> Result<(), GameError> {
        self.act(|| {
            self.check_not_setup()?;
            self.with_board(|_, inner, _| {
                require(inner, &[TurnState::RolledDice])?;
                if !inner.quotes.contains(quote) {
                    return Err(RuleViolation::InvalidTrade("quote was not offered this turn".into()).into());
                }
                let gives = ResourceHand::single(quote.give_type, quote.give_num);
                let gets = ResourceHand::single(quote.receive_type, quote.receive_num);

                match &quote.bidder {
                    None => {
                        let mut hand = self.seat.hand.lock();
                        if !hand.resources.can_afford(&gives) {
                            return Err(RuleViolation::CannotAfford.into());
                        }
                        pay(&mut hand, &gives)?;
                        hand.resources.add_hand(&gets);
                    }
                    Some(bidder) => {
                        let other = self
                            .table
                            .seat_of(bidder)
                            .filter(|s| !s.is_kicked())
                            .ok_or_else(|| RuleViolation::InvalidTrade(format!("{} left the game", bidder.name)))?;
                        let (mut mine, mut theirs) = lock_pair(&self.seat, &other);
                        if !mine.resources.can_afford(&gives) {
                            return Err(RuleViolation::CannotAfford.into());
                        }
                        if !theirs.resources.can_afford(&gets) {
                            return Err(RuleViolation::InvalidTrade(format!(
                                "{} can no longer pay",
                                bidder.name
                            ))
                            .into());
                        }
                        pay(&mut mine, &gives)?;
                        pay(&mut theirs, &gets)?;
                        mine.resources.add_hand(&gets);
                        theirs.resources.add_hand(&gives);
                    }
                }
                inner.actions.push(Action::AcceptQuote(quote.clone()));
                debug!("Player {} accepted {:?}", self.seat.reference.name, quote);
                Ok(())
            })
        })
    }

    // ==================== Ending ====================

    /// End the turn; a finished turn is left as it is
    pub fn done(&self) -> Result<(), GameError> {
        if self.state().is_terminal() {
            return Ok(());
        }
        self.act(|| {
            self.with_board(|board, inner, _| {
                match self.kind {
                    TurnKind::Setup => {
                        if inner.setup_settlement.is_none() || inner.setup_road.is_none() {
                            return Err(RuleViolation::SetupIncomplete.into());
                        }
                    }
                    TurnKind::Normal => {
                        require(inner, &[TurnState::RolledDice])?;
                        let mut hand = self.seat.hand.lock();
                        if hand.free_roads > 0 {
                            // Credits with nowhere to go lapse
                            if board.valid_road_spots(self.seat.color(), None).is_empty() {
                                hand.free_roads = 0;
                            } else {
                                return Err(RuleViolation::UnplacedFreeRoads(hand.free_roads).into());
                            }
                        }
                    }
                }
                inner.state = TurnState::Done;
                inner.actions.push(Action::Done);
                Ok(())
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::Bag;
    use crate::config::GameConfig;
    use crate::dice::LoadedDice;
    use crate::pieces::{BoardPiece, Color, Port};
    use crate::player::Player;
    use crate::topology::Tile;
    use pretty_assertions::assert_eq;

    /// Scripted callbacks for bandit and discard decisions
    struct Puppet {
        bandit_to: HexCoordinate,
        discard_extra: bool,
        quotes: Vec<Quote>,
    }

    impl Puppet {
        fn new() -> Self {
            Self {
                bandit_to: HexCoordinate::new(1, 1),
                discard_extra: false,
                quotes: Vec::new(),
            }
        }
    }

    impl Player for Puppet {
        fn take_turn(&self, _turn: &Turn) -> anyhow::Result<()> {
            Ok(())
        }

        fn get_user_quotes(&self, _asker: &PlayerRef, _want: &[Resource], _give: &[Resource]) -> Vec<Quote> {
            self.quotes.clone()
        }

        fn move_bandit(&self, _board: &Board, _current: HexCoordinate) -> HexCoordinate {
            self.bandit_to
        }

        fn select_resource_cards(&self, cards: &[Resource], count: usize, _reason: SelectReason) -> Vec<Resource> {
            let take = if self.discard_extra { count + 1 } else { count };
            cards.iter().take(take).copied().collect()
        }

        fn select_player(&self, candidates: &[PlayerRef], _reason: SelectReason) -> PlayerRef {
            candidates[0].clone()
        }
    }

    /// 5x5 block of wheat 6 with a desert holding the bandit at (2,2)
    fn test_board() -> Board {
        let mut board = Board::new();
        for x in 0..5 {
            for y in 0..5 {
                let tile = if (x, y) == (2, 2) {
                    Tile::desert()
                } else {
                    Tile::new(Resource::Wheat, 6).unwrap()
                };
                board.add_hex(HexCoordinate::new(x, y), tile).unwrap();
            }
        }
        board.set_bandit(HexCoordinate::new(2, 2)).unwrap();
        board
    }

    fn table_with(dice: Vec<(u8, u8)>, players: Vec<Puppet>) -> (Arc<Table>, Vec<Arc<Seat>>) {
        let table = Arc::new(Table::new(
            test_board(),
            GameConfig::new().with_seed(9),
            Box::new(LoadedDice::new(dice)),
        ));
        let seats = players
            .into_iter()
            .zip(Color::ALL)
            .map(|(p, color)| table.add_seat(Arc::new(p), &format!("{color:?}"), Some(color)).unwrap())
            .collect();
        table.state.send_replace(GameState::Running);
        (table, seats)
    }

    fn turn(table: &Arc<Table>, seat: &Arc<Seat>, kind: TurnKind) -> Turn {
        let turn = Turn::new(table.clone(), seat.clone(), kind);
        turn.activate();
        turn
    }

    fn node(x: i32, y: i32, n: u8) -> NodeCoordinate {
        NodeCoordinate::at(x, y, n).unwrap()
    }

    fn edge(x: i32, y: i32, e: u8) -> EdgeCoordinate {
        EdgeCoordinate::at(x, y, e).unwrap()
    }

    fn give(seat: &Seat, cards: ResourceHand) {
        seat.hand.lock().resources.add_hand(&cards);
    }

    fn settle(table: &Table, color: Color, at: NodeCoordinate, road: EdgeCoordinate) {
        let mut board = table.board.lock();
        board.place_settlement(color, at).unwrap();
        board.place_road(color, road).unwrap();
    }

    #[test]
    fn test_setup_requires_settlement_then_touching_road() {
        let (table, seats) = table_with(vec![], vec![Puppet::new()]);
        let t = turn(&table, &seats[0], TurnKind::Setup);
        t.place_settlement(node(1, 1, 0)).unwrap();
        t.place_road(edge(1, 1, 1)).unwrap();
        t.done().unwrap();
        assert_eq!(t.state(), TurnState::Done);
        // The first settlement never pays
        assert!(t.hand().resources.is_empty());

        let second = turn(&table, &seats[0], TurnKind::Setup);
        let err = second.place_road(edge(3, 3, 0)).unwrap_err();
        assert!(matches!(err.as_rule(), Some(RuleViolation::InvalidLocation(_))));
        assert!(second.state().is_terminal());
    }

    #[test]
    fn test_second_setup_settlement_pays_touching_hexes() {
        let (table, seats) = table_with(vec![], vec![Puppet::new()]);
        let first = turn(&table, &seats[0], TurnKind::Setup);
        first.place_settlement(node(1, 1, 0)).unwrap();
        first.place_road(edge(1, 1, 1)).unwrap();
        first.done().unwrap();

        let second = turn(&table, &seats[0], TurnKind::Setup);
        second.place_settlement(node(3, 3, 3)).unwrap();
        assert_eq!(second.hand().resources.get(Resource::Wheat), 3);
        let err = second.place_road(edge(1, 1, 2)).unwrap_err();
        assert!(matches!(err.as_rule(), Some(RuleViolation::InvalidLocation(_))));
    }

    #[test]
    fn test_setup_forbids_rolling_and_cities() {
        let (table, seats) = table_with(vec![], vec![Puppet::new()]);
        let t = turn(&table, &seats[0], TurnKind::Setup);
        let err = t.roll_dice().unwrap_err();
        assert_eq!(err.as_rule(), Some(&RuleViolation::NotAllowedInSetup));
        assert!(t.state().is_terminal());

        let t = turn(&table, &seats[0], TurnKind::Setup);
        assert_eq!(
            t.buy_development_card().unwrap_err().as_rule(),
            Some(&RuleViolation::NotAllowedInSetup)
        );
    }

    #[test]
    fn test_setup_done_needs_both_pieces() {
        let (table, seats) = table_with(vec![], vec![Puppet::new()]);
        let t = turn(&table, &seats[0], TurnKind::Setup);
        t.place_settlement(node(1, 1, 0)).unwrap();
        assert_eq!(t.done().unwrap_err().as_rule(), Some(&RuleViolation::SetupIncomplete));
        assert!(matches!(t.state(), TurnState::DoneWithError(_)));
    }

    #[test]
    fn test_roll_distributes_cards() {
        let (table, seats) = table_with(vec![(2, 4)], vec![Puppet::new(), Puppet::new()]);
        settle(&table, Color::Red, node(1, 1, 0), edge(1, 1, 1));
        {
            let mut board = table.board.lock();
            board.place_settlement(Color::Blue, node(3, 3, 3)).unwrap();
            board.place_city(Color::Blue, node(3, 3, 3)).unwrap();
        }

        let t = turn(&table, &seats[0], TurnKind::Normal);
        assert_eq!(t.roll_dice().unwrap(), (2, 4));
        assert_eq!(t.state(), TurnState::RolledDice);
        assert_eq!(seats[0].hand.lock().resources.get(Resource::Wheat), 3);
        assert_eq!(seats[1].hand.lock().resources.get(Resource::Wheat), 6);

        // Rolling twice is a violation
        assert!(t.roll_dice().is_err());
        assert!(t.state().is_terminal());
    }

    #[test]
    fn test_seven_discards_then_moves_bandit_and_steals() {
        let (table, seats) = table_with(vec![(3, 4)], vec![Puppet::new(), Puppet::new()]);
        settle(&table, Color::Blue, node(1, 1, 0), edge(1, 1, 1));
        give(&seats[1], ResourceHand::with_amounts(3, 3, 3, 0, 0));
        give(&seats[0], ResourceHand::with_amounts(0, 0, 0, 1, 0));

        let t = turn(&table, &seats[0], TurnKind::Normal);
        t.roll_dice().unwrap();

        // Blue held 9, discarded 4, then lost one to the thief
        assert_eq!(seats[1].hand.lock().resources.total(), 4);
        assert_eq!(seats[0].hand.lock().resources.total(), 2);
        assert_eq!(table.board.lock().bandit_location(), Some(HexCoordinate::new(1, 1)));
        let actions = t.actions();
        assert!(matches!(actions[1], Action::Discard(..)));
        assert_eq!(actions[2], Action::MoveBandit(HexCoordinate::new(1, 1)));
        assert!(matches!(actions[3], Action::Steal(_)));
    }

    #[test]
    fn test_wrong_discard_is_charged_to_roller() {
        let mut greedy = Puppet::new();
        greedy.discard_extra = true;
        let (table, seats) = table_with(vec![(3, 4)], vec![Puppet::new(), greedy]);
        give(&seats[1], ResourceHand::with_amounts(8, 0, 0, 0, 0));

        let t = turn(&table, &seats[0], TurnKind::Normal);
        let err = t.roll_dice().unwrap_err();
        assert_eq!(
            err.as_rule(),
            Some(&RuleViolation::InvalidDiscard { expected: 4, got: 5 })
        );
        assert!(matches!(t.state(), TurnState::DoneWithError(_)));
        assert_eq!(seats[1].hand.lock().resources.total(), 8);
    }

    #[test]
    fn test_bandit_cannot_stay_put() {
        let mut stubborn = Puppet::new();
        stubborn.bandit_to = HexCoordinate::new(2, 2);
        let (table, seats) = table_with(vec![(3, 4)], vec![stubborn]);
        let t = turn(&table, &seats[0], TurnKind::Normal);
        let err = t.roll_dice().unwrap_err();
        assert!(matches!(err.as_rule(), Some(RuleViolation::InvalidBanditMove(_))));
    }

    #[test]
    fn test_building_needs_roll_and_cards() {
        let (table, seats) = table_with(vec![(1, 1)], vec![Puppet::new()]);
        settle(&table, Color::Red, node(1, 1, 0), edge(1, 1, 1));

        let early = turn(&table, &seats[0], TurnKind::Normal);
        assert!(matches!(
            early.place_road(edge(1, 1, 2)).unwrap_err().as_rule(),
            Some(RuleViolation::WrongState(_))
        ));

        let t = turn(&table, &seats[0], TurnKind::Normal);
        t.roll_dice().unwrap();
        assert_eq!(
            t.place_road(edge(1, 1, 2)).unwrap_err().as_rule(),
            Some(&RuleViolation::CannotAfford)
        );

        let t = turn(&table, &seats[0], TurnKind::Normal);
        t.roll_dice().unwrap();
        give(&seats[0], costs::road());
        let placed = t.place_road(edge(1, 1, 2)).unwrap();
        assert_eq!(t.actions().last(), Some(&Action::PlaceRoad(placed)));
        assert!(t.hand().resources.is_empty());

        // Not connected to anything red
        give(&seats[0], costs::road());
        assert!(matches!(
            t.place_road(edge(4, 4, 0)).unwrap_err().as_rule(),
            Some(RuleViolation::InvalidLocation(_))
        ));
        // The failed action did not charge
        assert_eq!(seats[0].hand.lock().resources, costs::road());
    }

    #[test]
    fn test_city_replaces_own_settlement() {
        let (table, seats) = table_with(vec![(1, 1)], vec![Puppet::new(), Puppet::new()]);
        settle(&table, Color::Red, node(1, 1, 0), edge(1, 1, 1));
        settle(&table, Color::Blue, node(3, 3, 0), edge(3, 3, 1));
        give(&seats[0], ResourceHand::with_amounts(6, 0, 0, 0, 4));

        let t = turn(&table, &seats[0], TurnKind::Normal);
        t.roll_dice().unwrap();
        t.place_city(node(1, 1, 0)).unwrap();
        let board = table.board.lock().clone();
        assert_eq!(board.points(Color::Red), 2);
        assert_eq!(board.pieces_for_sale(Color::Red).remaining(PieceKind::Settlement), 5);
        drop(board);

        let err = t.place_city(node(3, 3, 0)).unwrap_err();
        assert!(matches!(err.as_rule(), Some(RuleViolation::InvalidLocation(_))));
    }

    #[test]
    fn test_buy_development_card_draws_in_deck_order() {
        let (table, seats) = table_with(vec![(1, 1)], vec![Puppet::new()]);
        table.board.lock().set_development_cards(Bag::ordered(vec![
            DevelopmentCard::YearOfPlenty,
            DevelopmentCard::Soldier,
        ]));
        for _ in 0..3 {
            give(&seats[0], costs::development_card());
        }

        let t = turn(&table, &seats[0], TurnKind::Normal);
        t.roll_dice().unwrap();
        assert_eq!(t.buy_development_card().unwrap(), DevelopmentCard::YearOfPlenty);
        assert_eq!(t.buy_development_card().unwrap(), DevelopmentCard::Soldier);
        assert_eq!(t.actions().last(), Some(&Action::BuyDevelopmentCard));
        assert_eq!(table.board.lock().development_cards_left(), 0);

        // An empty deck charges nothing
        assert_eq!(
            t.buy_development_card().unwrap_err().as_rule(),
            Some(&RuleViolation::EmptyDeck)
        );
        let hand = seats[0].hand.lock();
        assert_eq!(hand.resources, costs::development_card());
        assert_eq!(
            hand.development_cards,
            vec![
                OwnedCard { card: DevelopmentCard::YearOfPlenty, played: false },
                OwnedCard { card: DevelopmentCard::Soldier, played: false },
            ]
        );
    }

    #[test]
    fn test_soldier_before_roll_and_largest_army() {
        let (table, seats) = table_with(vec![(1, 1)], vec![Puppet::new()]);
        seats[0].hand.lock().development_cards = vec![
            OwnedCard { card: DevelopmentCard::Soldier, played: true },
            OwnedCard { card: DevelopmentCard::Soldier, played: true },
            OwnedCard { card: DevelopmentCard::Soldier, played: false },
        ];

        let t = turn(&table, &seats[0], TurnKind::Normal);
        t.play_soldier().unwrap();
        assert_eq!(t.state(), TurnState::Active);
        assert_eq!(table.board.lock().bandit_location(), Some(HexCoordinate::new(1, 1)));
        assert_eq!(seats[0].hand.lock().soldiers_played(), 3);
        let scores = table.scores(&table.board.lock());
        assert_eq!(scores[0].1, 2);

        assert_eq!(t.play_soldier().unwrap_err().as_rule(), Some(&RuleViolation::NoSuchCard));
    }

    #[test]
    fn test_rejected_soldier_move_keeps_the_card() {
        let mut stubborn = Puppet::new();
        stubborn.bandit_to = HexCoordinate::new(2, 2);
        let (table, seats) = table_with(vec![(1, 1)], vec![stubborn]);
        seats[0].hand.lock().development_cards =
            vec![OwnedCard { card: DevelopmentCard::Soldier, played: false }];

        let t = turn(&table, &seats[0], TurnKind::Normal);
        let err = t.play_soldier().unwrap_err();
        assert!(matches!(err.as_rule(), Some(RuleViolation::InvalidBanditMove(_))));
        assert!(matches!(t.state(), TurnState::DoneWithError(_)));

        let hand = seats[0].hand.lock();
        assert!(hand.playable(DevelopmentCard::Soldier).is_some());
        assert_eq!(hand.soldiers_played(), 0);
        drop(hand);
        assert!(!t.actions().contains(&Action::PlayCard(DevelopmentCard::Soldier)));
        assert_eq!(table.board.lock().bandit_location(), Some(HexCoordinate::new(2, 2)));
    }

    #[test]
    fn test_tied_army_takes_the_award_from_its_holder() {
        let mut elsewhere = Puppet::new();
        elsewhere.bandit_to = HexCoordinate::new(3, 3);
        let (table, seats) = table_with(vec![], vec![Puppet::new(), elsewhere]);
        for seat in &seats {
            seat.hand.lock().development_cards = vec![
                OwnedCard { card: DevelopmentCard::Soldier, played: true },
                OwnedCard { card: DevelopmentCard::Soldier, played: true },
                OwnedCard { card: DevelopmentCard::Soldier, played: false },
            ];
        }

        turn(&table, &seats[0], TurnKind::Normal).play_soldier().unwrap();
        let scores = table.scores(&table.board.lock());
        assert_eq!(scores[0].1, 2);

        // Blue draws level at 3 and nobody holds the army any more
        turn(&table, &seats[1], TurnKind::Normal).play_soldier().unwrap();
        let scores = table.scores(&table.board.lock());
        assert_eq!(scores[0].1, 0);
        assert_eq!(scores[1].1, 0);
    }

    #[test]
    fn test_road_building_credits_must_be_used() {
        let (table, seats) = table_with(vec![(1, 1)], vec![Puppet::new()]);
        settle(&table, Color::Red, node(1, 1, 0), edge(1, 1, 1));
        seats[0].hand.lock().development_cards =
            vec![OwnedCard { card: DevelopmentCard::RoadBuilding, played: false }];

        let t = turn(&table, &seats[0], TurnKind::Normal);
        t.roll_dice().unwrap();
        t.play_road_building().unwrap();
        assert_eq!(t.hand().free_roads, 2);
        t.place_road(edge(1, 1, 2)).unwrap();
        assert_eq!(t.hand().free_roads, 1);

        let err = t.done().unwrap_err();
        assert_eq!(err.as_rule(), Some(&RuleViolation::UnplacedFreeRoads(1)));
    }

    #[test]
    fn test_monopoly_and_year_of_plenty() {
        let (table, seats) = table_with(vec![(1, 1)], vec![Puppet::new(), Puppet::new(), Puppet::new()]);
        give(&seats[1], ResourceHand::with_amounts(2, 1, 0, 0, 0));
        give(&seats[2], ResourceHand::with_amounts(3, 0, 0, 0, 0));
        seats[0].hand.lock().development_cards = vec![
            OwnedCard { card: DevelopmentCard::ResourceMonopoly, played: false },
            OwnedCard { card: DevelopmentCard::YearOfPlenty, played: false },
            OwnedCard { card: DevelopmentCard::VictoryPoint, played: false },
        ];

        let t = turn(&table, &seats[0], TurnKind::Normal);
        t.roll_dice().unwrap();
        assert_eq!(t.play_resource_monopoly(Resource::Ore).unwrap(), 5);
        assert_eq!(seats[1].hand.lock().resources, ResourceHand::with_amounts(0, 1, 0, 0, 0));

        t.play_year_of_plenty(Resource::Brick, Resource::Brick).unwrap();
        t.play_victory_point().unwrap();
        assert_eq!(t.hand().resources, ResourceHand::with_amounts(5, 0, 0, 2, 0));
        assert_eq!(t.hand().victory_points(), 1);
        t.done().unwrap();
    }

    #[test]
    fn test_quotes_are_filtered_and_accepted() {
        let cheat = Quote::new(
            Some(PlayerRef::new("Red", Color::Red)),
            Resource::Ore,
            1,
            Resource::Wood,
            1,
        );
        let fair = Quote::new(
            Some(PlayerRef::new("Blue", Color::Blue)),
            Resource::Ore,
            1,
            Resource::Wood,
            1,
        );
        let broke = Quote::new(
            Some(PlayerRef::new("Blue", Color::Blue)),
            Resource::Ore,
            5,
            Resource::Wood,
            1,
        );
        let mut trader = Puppet::new();
        trader.quotes = vec![cheat, fair.clone(), broke];
        let (table, seats) = table_with(vec![(1, 1)], vec![Puppet::new(), trader]);
        give(&seats[0], ResourceHand::with_amounts(0, 4, 0, 0, 0));
        give(&seats[1], ResourceHand::with_amounts(1, 0, 0, 0, 0));

        let t = turn(&table, &seats[0], TurnKind::Normal);
        t.roll_dice().unwrap();
        let quotes = t.request_quotes(&[Resource::Ore], &[Resource::Wood]).unwrap();
        // The 4:1 bank quote loses to the 1:1 offer
        assert_eq!(quotes, vec![fair.clone()]);

        t.accept_quote(&fair).unwrap();
        assert_eq!(seats[0].hand.lock().resources, ResourceHand::with_amounts(1, 3, 0, 0, 0));
        assert_eq!(seats[1].hand.lock().resources, ResourceHand::with_amounts(0, 1, 0, 0, 0));

        // Blue has no ore left to pay a second time
        let err = t.accept_quote(&fair).unwrap_err();
        assert!(matches!(err.as_rule(), Some(RuleViolation::InvalidTrade(_))));
    }

    #[test]
    fn test_bank_trade_uses_port_rate() {
        let (table, seats) = table_with(vec![(1, 1)], vec![Puppet::new()]);
        settle(&table, Color::Red, node(1, 1, 0), edge(1, 1, 1));
        table
            .board
            .lock()
            .set_port(node(1, 1, 0), Port::Specific(Resource::Wood))
            .unwrap();
        give(&seats[0], ResourceHand::with_amounts(0, 2, 0, 0, 0));

        let t = turn(&table, &seats[0], TurnKind::Normal);
        t.roll_dice().unwrap();
        let quotes = t.request_quotes(&[Resource::Brick], &[Resource::Wood]).unwrap();
        assert_eq!(quotes, vec![Quote::new(None, Resource::Brick, 1, Resource::Wood, 2)]);
        t.accept_quote(&quotes[0]).unwrap();
        assert_eq!(t.hand().resources, ResourceHand::single(Resource::Brick, 1));

        let unseen = Quote::new(None, Resource::Ore, 1, Resource::Wood, 1);
        assert!(t.accept_quote(&unseen).is_err());
    }

    #[test]
    fn test_request_quotes_needs_cards_to_give() {
        let (table, seats) = table_with(vec![(1, 1)], vec![Puppet::new()]);
        let t = turn(&table, &seats[0], TurnKind::Normal);
        t.roll_dice().unwrap();
        let err = t.request_quotes(&[Resource::Ore], &[Resource::Wood]).unwrap_err();
        assert!(matches!(err.as_rule(), Some(RuleViolation::InvalidTrade(_))));
    }

    #[test]
    fn test_forced_turn_rejects_late_actions() {
        let (table, seats) = table_with(vec![(1, 1)], vec![Puppet::new()]);
        settle(&table, Color::Red, node(1, 1, 0), edge(1, 1, 1));
        give(&seats[0], costs::road());

        let t = turn(&table, &seats[0], TurnKind::Normal);
        t.roll_dice().unwrap();
        t.force_done();
        assert_eq!(
            t.place_road(edge(1, 1, 2)).unwrap_err().as_rule(),
            Some(&RuleViolation::TurnFinished)
        );
        assert_eq!(t.state(), TurnState::Done);
        assert_eq!(table.board.lock().placements().roads.len(), 1);
        // done on a finished turn is a no-op
        t.done().unwrap();
    }

    #[test]
    fn test_winner_finishes_game() {
        let table = Arc::new(Table::new(
            test_board(),
            GameConfig::new().with_max_points(4),
            Box::new(LoadedDice::new(vec![(1, 1)])),
        ));
        let seat = table.add_seat(Arc::new(Puppet::new()), "solo", Some(Color::White)).unwrap();
        table.state.send_replace(GameState::Running);
        settle(&table, Color::White, node(1, 1, 0), edge(1, 1, 1));
        give(&seat, costs::settlement());
        give(&seat, costs::road());

        let t = turn(&table, &seat, TurnKind::Normal);
        t.roll_dice().unwrap();
        t.place_road(edge(1, 1, 2)).unwrap();
        t.place_settlement(node(1, 1, 2)).unwrap();
        assert_eq!(table.game_state(), GameState::Finished);
        assert_eq!(table.winner(), Some(seat.reference.clone()));
        let board = table.board.lock().clone();
        let id = board.node_id(node(1, 1, 2)).unwrap();
        assert_eq!(
            board.node(id).and_then(|n| n.building),
            Some(BoardPiece::Settlement(Color::White))
        );
        assert_eq!(
            t.done().unwrap_err().as_rule(),
            Some(&RuleViolation::GameNotRunning)
        );
    }
}
