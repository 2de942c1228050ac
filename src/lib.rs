//! Sorts a sequence of card symbols by playing a patience game with it:
//! shuffle, deal to the field, and move cards until the foundation holds
//! everything in ascending order. Unsolvable deals are detected and retried
//! with a fresh shuffle up to a bound.

pub mod card;
pub mod engine;
pub mod error;
pub mod game;
pub mod rules;
pub mod stack;

pub use crate::card::Card;
pub use crate::engine::{
    Gamer, Move, Outcome, sort_sequence, sort_sequence_observed, sort_sequence_with,
};
pub use crate::error::{SortError, StackError};
pub use crate::game::Game;
pub use crate::rules::{HandAccess, Rules};
