use log::trace;
use rand::Rng;
use smallvec::SmallVec;

use crate::card::{Card, stackable};
use crate::error::{SortError, StackError};
use crate::game::Game;
use crate::rules::Rules;
use crate::stack::{FieldStack, TopCard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Playing,
    Win,
    Loss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    FieldToFoundation { from: usize },
    HandToFoundation { index: usize },
    FieldToField { from: usize, to: usize, count: usize },
    HandToField { index: usize, to: usize },
    Draw,
}

type Moves = SmallVec<[Move; 32]>;

/// Pluggable move-scoring policy. Higher wins; ties go to the move seen
/// first during enumeration, so a fixed state always picks the same move.
pub type ScoreFn = fn(&Game, &Move) -> i32;

/// Default policy: finish cards whenever possible, drain the hand over
/// rearranging the field, prefer field moves that uncover something, and
/// draw only as a last resort.
pub fn default_score(game: &Game, mv: &Move) -> i32 {
    match mv {
        Move::FieldToFoundation { .. } | Move::HandToFoundation { .. } => 10_000,
        Move::HandToField { .. } => 999,
        Move::FieldToField { from, count, .. } => {
            let src = &game.field[*from];
            if src.face_down() > 0 && *count == src.face_up() {
                50
            } else {
                1
            }
        }
        Move::Draw => 0,
    }
}

/// The move engine: enumerates legal moves for a game state, picks one by
/// score and applies it. One `Gamer` drives exactly one attempt.
pub struct Gamer {
    score: ScoreFn,
    last_move: Option<Move>,
    consecutive_draws: usize,
    moves_made: usize,
}

impl Default for Gamer {
    fn default() -> Self {
        Self::new()
    }
}

impl Gamer {
    pub fn new() -> Self {
        Self::with_scorer(default_score)
    }

    pub fn with_scorer(score: ScoreFn) -> Self {
        Self {
            score,
            last_move: None,
            consecutive_draws: 0,
            moves_made: 0,
        }
    }

    pub fn moves_made(&self) -> usize {
        self.moves_made
    }

    /// Drives the game to a terminal state. The observer fires once per
    /// iteration, before the move is chosen; its effects are ignored.
    pub fn play(
        &mut self,
        game: &mut Game,
        mut observer: Option<&mut dyn FnMut(&Game)>,
    ) -> Result<Outcome, StackError> {
        // A greedy policy with no backtracking can shuffle runs in circles;
        // cap the attempt instead of trying to prove progress.
        let move_limit = 32 + 16 * game.total_cards();
        loop {
            if let Some(f) = observer.as_mut() {
                f(game);
            }
            match self.step(game)? {
                Outcome::Playing => {
                    if self.moves_made >= move_limit {
                        trace!("move limit {move_limit} reached, counting as loss");
                        return Ok(Outcome::Loss);
                    }
                }
                outcome => return Ok(outcome),
            }
        }
    }

    /// One transition: enumerate, classify a dead position as a loss,
    /// otherwise apply the best candidate and re-check for a win.
    pub fn step(&mut self, game: &mut Game) -> Result<Outcome, StackError> {
        if game.is_won() {
            return Ok(Outcome::Win);
        }
        let moves = self.enumerate(game);
        let Some(best) = self.select(game, &moves) else {
            return Ok(Outcome::Loss);
        };
        trace!("move {}: {best:?}", self.moves_made + 1);
        self.apply(game, &best)?;
        self.moves_made += 1;
        if matches!(best, Move::Draw) {
            self.consecutive_draws += 1;
        } else {
            self.consecutive_draws = 0;
        }
        self.last_move = Some(best);
        if game.is_won() {
            Ok(Outcome::Win)
        } else {
            Ok(Outcome::Playing)
        }
    }

    fn select(&self, game: &Game, moves: &[Move]) -> Option<Move> {
        let mut best: Option<(Move, i32)> = None;
        for &mv in moves {
            let score = (self.score)(game, &mv);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((mv, score));
            }
        }
        best.map(|(mv, _)| mv)
    }

    /// Every candidate move for the current state. Foundation moves are
    /// only generated for the one card the foundation can legally take, so
    /// the out-of-order path stays unreachable.
    pub fn enumerate(&self, game: &Game) -> Moves {
        let mut moves = Moves::new();
        let needed = game.next_needed();

        for (i, stack) in game.field.iter().enumerate() {
            if let TopCard::Up(card) = stack.top_card()
                && Some(card) == needed
            {
                moves.push(Move::FieldToFoundation { from: i });
            }
        }
        for index in game.hand.reachable_indices() {
            if game.hand.peek(index) == needed {
                moves.push(Move::HandToFoundation { index });
            }
        }

        for from in 0..game.field.len() {
            let run = game.field[from].moveable_cards();
            if run.is_empty() {
                continue;
            }
            for to in 0..game.field.len() {
                if to == from {
                    continue;
                }
                match game.field[to].top_card() {
                    TopCard::Up(top) => {
                        for count in 1..=run.len() {
                            let landing = run[run.len() - count];
                            if stackable(top, landing) {
                                let mv = Move::FieldToField { from, to, count };
                                if !self.is_undo(&mv) {
                                    moves.push(mv);
                                }
                            }
                        }
                    }
                    TopCard::Empty => {
                        // Only worth an empty pile if it uncovers a card.
                        let src = &game.field[from];
                        if src.face_down() > 0 && run.len() == src.face_up() {
                            let mv = Move::FieldToField {
                                from,
                                to,
                                count: run.len(),
                            };
                            if !self.is_undo(&mv) {
                                moves.push(mv);
                            }
                        } else if src.face_up() > 1 {
                            let mv = Move::FieldToField { from, to, count: 1 };
                            if !self.is_undo(&mv) {
                                moves.push(mv);
                            }
                        }
                    }
                    TopCard::Hidden => {}
                }
            }
        }

        for index in game.hand.reachable_indices() {
            let Some(card) = game.hand.peek(index) else {
                continue;
            };
            for (to, stack) in game.field.iter().enumerate() {
                match stack.top_card() {
                    TopCard::Up(top) if stackable(top, card) => {
                        moves.push(Move::HandToField { index, to });
                    }
                    TopCard::Empty => {
                        moves.push(Move::HandToField { index, to });
                    }
                    _ => {}
                }
            }
        }

        if !game.deck.is_empty() && self.consecutive_draws <= draw_cycle(game) {
            moves.push(Move::Draw);
        }

        moves
    }

    /// True when `mv` would exactly reverse the previous move.
    fn is_undo(&self, mv: &Move) -> bool {
        let Some(Move::FieldToField { from, to, count }) = self.last_move else {
            return false;
        };
        *mv == Move::FieldToField {
            from: to,
            to: from,
            count,
        }
    }

    fn apply(&self, game: &mut Game, mv: &Move) -> Result<(), StackError> {
        match mv {
            Move::FieldToFoundation { from } => {
                let cards = game.field[*from].pull(1)?;
                game.foundation.push_to_top(&cards)
            }
            Move::HandToFoundation { index } => {
                let card = self.take_from_hand(game, *index)?;
                game.foundation.push(card)
            }
            Move::FieldToField { from, to, count } => {
                let (src, dest) = field_pair(&mut game.field, *from, *to);
                src.transfer_to(dest, *count)
            }
            Move::HandToField { index, to } => {
                let card = self.take_from_hand(game, *index)?;
                game.field[*to].push(&[card]);
                Ok(())
            }
            Move::Draw => game.hand.draw(&mut game.deck),
        }
    }

    fn take_from_hand(&self, game: &mut Game, index: usize) -> Result<Card, StackError> {
        game.hand.take(index).ok_or_else(|| StackError::Capacity {
            requested: index + 1,
            available: game.hand.num_cards(),
        })
    }
}

/// Disjoint mutable borrows of two distinct field piles.
fn field_pair(
    field: &mut [FieldStack],
    from: usize,
    to: usize,
) -> (&mut FieldStack, &mut FieldStack) {
    if from < to {
        let (head, tail) = field.split_at_mut(to);
        (&mut head[from], &mut tail[0])
    } else {
        let (head, tail) = field.split_at_mut(from);
        (&mut tail[0], &mut head[to])
    }
}

/// Draws that visit the whole deck once. Past this many consecutive draws
/// nothing new can surface, so drawing stops being a candidate.
fn draw_cycle(game: &Game) -> usize {
    let total = game.deck.num_cards() + game.hand.num_cards();
    let hand_size = game.rules().hand_size_max.max(1);
    total.div_ceil(hand_size) + 1
}

/// Sorts with the default rules and a fresh random source.
pub fn sort_sequence(data: &[Card]) -> Result<Vec<Card>, SortError> {
    sort_sequence_with(data, &Rules::default(), &mut rand::rng())
}

/// Plays up to `rules.max_retries` fresh deals and returns the foundation
/// of the first winning attempt. Never returns partially sorted data: all
/// losses surface as `ExhaustedRetries`.
pub fn sort_sequence_with<R: Rng + ?Sized>(
    data: &[Card],
    rules: &Rules,
    rng: &mut R,
) -> Result<Vec<Card>, SortError> {
    sort_attempts(data, rules, rng, None)
}

/// Same as `sort_sequence_with`, invoking `observer` once per move-loop
/// iteration of every attempt.
pub fn sort_sequence_observed<R: Rng + ?Sized>(
    data: &[Card],
    rules: &Rules,
    rng: &mut R,
    observer: &mut dyn FnMut(&Game),
) -> Result<Vec<Card>, SortError> {
    sort_attempts(data, rules, rng, Some(observer))
}

fn sort_attempts<R: Rng + ?Sized>(
    data: &[Card],
    rules: &Rules,
    rng: &mut R,
    mut observer: Option<&mut dyn FnMut(&Game)>,
) -> Result<Vec<Card>, SortError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let attempts = rules.max_retries.max(1);
    for attempt in 1..=attempts {
        let mut game = Game::deal(data, rules, rng)?;
        let mut gamer = Gamer::new();
        // Reborrow the observer through a fresh trait object per attempt;
        // a plain deref-reborrow would pin the borrow to the option's
        // lifetime and overlap across iterations.
        let outcome = match observer {
            Some(ref mut f) => {
                let mut relay = |game: &Game| f(game);
                gamer.play(&mut game, Some(&mut relay))?
            }
            None => gamer.play(&mut game, None)?,
        };
        match outcome {
            Outcome::Win => {
                trace!("won attempt {attempt} in {} moves", gamer.moves_made());
                return Ok(game.foundation.cards().to_vec());
            }
            Outcome::Loss => {
                trace!("lost attempt {attempt} after {} moves", gamer.moves_made());
            }
            // play only returns terminal outcomes
            Outcome::Playing => {}
        }
    }
    Err(SortError::ExhaustedRetries { attempts })
}
